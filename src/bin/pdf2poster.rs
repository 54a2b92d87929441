//! CLI binary for pdf2poster.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PosterConfig` and writes the poster PNG.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2poster::{
    generate_to_file, inspect, ColorTheme, PipelineStage, PosterConfig, PosterProgressCallback,
    PosterStyle,
};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the seven pipeline stages, with
/// a per-stage log line and a sub-line per section summary.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the stage currently in flight (stages are sequential).
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(PipelineStage::COUNT as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:28.green/238}] {pos}/{len}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Poster");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }
}

impl PosterProgressCallback for CliProgressCallback {
    fn on_run_start(&self, input: &str) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating poster for {input}…"))
        ));
    }

    fn on_stage_start(&self, stage: PipelineStage) {
        *self.stage_started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(stage.label().to_string());
    }

    fn on_stage_complete(&self, stage: PipelineStage) {
        let elapsed_ms = self
            .stage_started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} {:<22} {}",
            green("✓"),
            stage.label(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_section_summarized(&self, name: &str, degraded: bool) {
        if degraded {
            self.bar.println(format!(
                "    {} {name}: placeholder text (section missing or summarizer failed)",
                cyan("⚠"),
            ));
        } else {
            self.bar
                .println(format!("    {} {name} summarized", green("✓")));
        }
    }

    fn on_run_complete(&self, _duration_ms: u64) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Poster for a local paper (writes poster_paper.png)
  pdf2poster paper.pdf

  # Fetch from arXiv by id; the QR code links to the abstract page
  pdf2poster 1710.06945 -o fsdr.png

  # Generate straight from a URL
  pdf2poster https://arxiv.org/pdf/1706.03762 -o attention.png

  # Dark theme, two columns, at most one figure
  pdf2poster paper.pdf --theme dark --columns 2 --max-figures 1

  # One batched summarizer call instead of one per section
  pdf2poster paper.pdf --batch

  # Inspect what the poster would use (no API key needed)
  pdf2poster --inspect paper.pdf

  # Print run statistics as JSON to stdout
  pdf2poster paper.pdf --stats-json

THEMES:
  light (default)   dark   sepia

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          API key for the summarizer endpoint
  PDF2POSTER_MODEL        Override chat model id (default: gpt-4o-mini)
  PDF2POSTER_API_BASE     Override the OpenAI-compatible base URL
  PDF2POSTER_FONT         Path to a regular .ttf face
  PDF2POSTER_FONT_BOLD    Path to a bold .ttf face

SETUP:
  1. Set API key:      export OPENAI_API_KEY=sk-...
  2. Make a poster:    pdf2poster 1710.06945

  Without a key the poster is still produced; every section summary
  degrades to bracketed placeholder text instead.

FONTS:
  The compositor needs a TrueType font. DejaVu Sans, Liberation Sans, and
  Free Sans are found automatically on most systems; point --font and
  --font-bold at specific .ttf files otherwise.
"#;

/// Turn an academic paper (PDF) into a 1920x1080 visual poster.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2poster",
    version,
    about = "Turn an academic paper (PDF) into a 1920x1080 visual poster",
    long_about = "Turn an academic paper into a single-image poster: section summaries from an \
OpenAI-compatible chat model, figures pulled straight out of the PDF, and a QR code linking \
back to the source. Accepts local files, HTTP/HTTPS URLs, and bare arXiv ids.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path, HTTP/HTTPS URL, or arXiv id (e.g. 1710.06945).
    input: String,

    /// Write the poster PNG to this path instead of poster_<stem>.png.
    #[arg(short, long, env = "PDF2POSTER_OUTPUT")]
    output: Option<PathBuf>,

    /// Poster color theme.
    #[arg(long, env = "PDF2POSTER_THEME", value_enum, default_value = "light")]
    theme: ThemeArg,

    /// Number of body columns (1-3).
    #[arg(long, env = "PDF2POSTER_COLUMNS", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..=3))]
    columns: u32,

    /// Maximum figures placed on the poster (largest by pixel area win).
    #[arg(long, env = "PDF2POSTER_MAX_FIGURES", default_value_t = 2)]
    max_figures: usize,

    /// Skip embedded images whose smaller dimension is below this (pixels).
    #[arg(long, env = "PDF2POSTER_MIN_FIGURE_DIM", default_value_t = 100,
          value_parser = clap::value_parser!(u32).range(16..=1024))]
    min_figure_dim: u32,

    /// Title override for the poster header.
    #[arg(long)]
    title: Option<String>,

    /// Author-line override, comma or semicolon separated.
    #[arg(long)]
    authors: Option<String>,

    /// QR-code link override (default: derived arXiv abs URL, if any).
    #[arg(long)]
    link: Option<String>,

    /// Chat model id for the summarizer.
    #[arg(long, env = "PDF2POSTER_MODEL")]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint.
    #[arg(
        long,
        env = "PDF2POSTER_API_BASE",
        long_help = "Base URL of an OpenAI-compatible endpoint (the path \
/v1/chat/completions is appended).\nWorks with OpenAI, vLLM, LiteLLM, Ollama's \
OpenAI-compatible server, etc."
    )]
    api_base_url: Option<String>,

    /// Summarize all sections in one structured request instead of one per section.
    #[arg(long, env = "PDF2POSTER_BATCH")]
    batch: bool,

    /// Path to a text file containing a custom summarizer system prompt.
    #[arg(long, env = "PDF2POSTER_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Path to a regular TrueType/OpenType face.
    #[arg(long, env = "PDF2POSTER_FONT")]
    font: Option<PathBuf>,

    /// Path to a bold TrueType/OpenType face.
    #[arg(long, env = "PDF2POSTER_FONT_BOLD")]
    font_bold: Option<PathBuf>,

    /// Print what the poster would use (metadata, sections, figures), no poster.
    #[arg(long)]
    inspect: bool,

    /// Print run statistics (or --inspect output) as JSON to stdout.
    #[arg(long)]
    stats_json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2POSTER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2POSTER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2POSTER_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2POSTER_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-summarizer-call timeout in seconds.
    #[arg(long, env = "PDF2POSTER_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ThemeArg {
    Light,
    Dark,
    Sepia,
}

impl From<ThemeArg> for ColorTheme {
    fn from(v: ThemeArg) -> Self {
        match v {
            ThemeArg::Light => ColorTheme::Light,
            ThemeArg::Dark => ColorTheme::Dark,
            ThemeArg::Sepia => ColorTheme::Sepia,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.stats_json && !cli.inspect;
    let filter = if cli.quiet || show_progress {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    // In verbose mode we always want all logs regardless of progress.
    let filter = if cli.verbose { "debug" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect {
        let config = build_config(&cli, None).await?;
        let info = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.stats_json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize document info")?
            );
        } else {
            println!("Input:        {}", cli.input);
            println!("Title:        {}", info.metadata.title);
            if !info.metadata.authors.is_empty() {
                println!("Authors:      {}", info.metadata.authors.join(", "));
            }
            if let Some(ref link) = info.metadata.link {
                println!("QR link:      {}", link);
            }
            println!("Pages:        {}", info.page_count);
            println!("PDF Version:  {}", info.pdf_version);
            println!("Text chars:   {}", info.chars_extracted);
            println!("Figures:      {}", info.figure_candidates);
            for err in &info.figure_errors {
                println!("  skipped:    {}", err);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<Arc<dyn PosterProgressCallback>> = if show_progress {
        let cb = CliProgressCallback::new();
        Some(cb as Arc<dyn PosterProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;
    let out_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    // ── Run ──────────────────────────────────────────────────────────────
    let stats = generate_to_file(&cli.input, &out_path, &config)
        .await
        .context("Poster generation failed")?;

    if cli.stats_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
        );
    }

    if !cli.quiet {
        let all_summarized = stats.sections_summarized == stats.sections_requested;
        eprintln!(
            "{}  {}  {}/{} sections summarized  {} figure{}  {}ms",
            if all_summarized { green("✔") } else { cyan("⚠") },
            bold(&out_path.display().to_string()),
            stats.sections_summarized,
            stats.sections_requested,
            stats.figures_placed,
            if stats.figures_placed == 1 { "" } else { "s" },
            stats.duration_ms,
        );
        if stats.figures_skipped() > 0 {
            eprintln!(
                "   {} embedded image(s) skipped — run with --inspect for details",
                stats.figures_skipped()
            );
        }
    }

    Ok(())
}

/// Map CLI args to `PosterConfig`.
async fn build_config(
    cli: &Cli,
    progress: Option<Arc<dyn PosterProgressCallback>>,
) -> Result<PosterConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let style = PosterStyle {
        font_path: cli.font.clone(),
        bold_font_path: cli.font_bold.clone(),
        ..PosterStyle::default()
    };

    let mut builder = PosterConfig::builder()
        .theme(cli.theme.clone().into())
        .columns(cli.columns)
        .max_figures(cli.max_figures)
        .min_figure_dim(cli.min_figure_dim)
        .batch_summaries(cli.batch)
        .style(style)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref url) = cli.api_base_url {
        builder = builder.api_base_url(url);
    }
    if let Some(ref title) = cli.title {
        builder = builder.title(title);
    }
    if let Some(ref authors) = cli.authors {
        builder = builder.authors(split_author_arg(authors));
    }
    if let Some(ref link) = cli.link {
        builder = builder.link(link);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Split `--authors "A. One, B. Two; C. Three"` into separate names.
fn split_author_arg(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Default output path: `poster_<stem>.png` next to the working directory,
/// where `<stem>` is the input's final path/URL segment without `.pdf`.
fn default_output_path(input: &str) -> PathBuf {
    let last = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let last = last.split(['?', '#']).next().unwrap_or(last);
    let stem = match last.len().checked_sub(4).and_then(|i| last.get(i..)) {
        Some(ext) if ext.eq_ignore_ascii_case(".pdf") => &last[..last.len() - 4],
        _ => last,
    };
    let stem = stem.trim();
    if stem.is_empty() {
        PathBuf::from("poster.png")
    } else {
        PathBuf::from(format!("poster_{stem}.png"))
    }
}
