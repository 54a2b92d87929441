//! Eager (whole-run) poster generation entry points.
//!
//! ## Why one eager driver and no streaming variant?
//!
//! A poster is a single fixed-size artifact, not a page stream. Every stage
//! wants the whole document at once (the segmenter scans the full linear
//! text, the compositor balances all columns together), so there is nothing
//! to deliver incrementally. The driver runs the stages in a fixed order and
//! prefers degradation over failure: missing sections and failed summaries
//! become sentinel text, undecodable figures are skipped, and only errors
//! that leave nothing to draw (unreadable input, missing font) abort the run.

use crate::config::PosterConfig;
use crate::error::PosterError;
use crate::output::{
    DocumentInfo, PaperMetadata, PosterOutput, PosterSpec, PosterStats, SummaryOutcome,
};
use crate::pipeline::layout::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::pipeline::summarize::{SectionInput, Summarizer};
use crate::pipeline::{compose, encode, extract, figures, input, segment};
use crate::progress::PipelineStage;
use lopdf::Document;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Generate a poster from a PDF file, URL, or arXiv identifier.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input` — Local file path, HTTP/HTTPS URL, or bare arXiv id
/// * `config` — Poster configuration
///
/// # Returns
/// `Ok(PosterOutput)` whenever a poster could be drawn, even if every
/// section summary degraded to a sentinel (check `output.summaries` or
/// `output.stats`).
///
/// # Errors
/// Returns `Err(PosterError)` only for fatal problems:
/// - Input not found / download failed / not a PDF
/// - Document unparsable, encrypted, or empty
/// - No usable font for the compositor
///
/// # Example
/// ```rust,no_run
/// use pdf2poster::{generate, PosterConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PosterConfig::default();
/// let output = generate("https://arxiv.org/pdf/1710.06945", &config).await?;
/// std::fs::write("poster.png", &output.png)?;
/// # Ok(())
/// # }
/// ```
pub async fn generate(
    input: impl AsRef<str>,
    config: &PosterConfig,
) -> Result<PosterOutput, PosterError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    info!("Starting poster run: {}", input);

    if let Some(ref cb) = config.progress {
        cb.on_run_start(input);
    }

    // ── Stage 1: Resolve input ───────────────────────────────────────────
    stage_start(config, PipelineStage::Resolve);
    let resolved = input::resolve_input(input, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();
    stage_done(config, PipelineStage::Resolve);

    // ── Stage 2: Extract text and metadata ───────────────────────────────
    stage_start(config, PipelineStage::Extract);
    let doc = extract::open_document(&pdf_path)?;
    let pages = doc.get_pages().len();
    let full_text = extract::extract_full_text(&doc);
    let metadata = resolve_metadata(input, &doc, config);
    info!(pages, chars = full_text.len(), "document loaded");
    stage_done(config, PipelineStage::Extract);

    // ── Stage 3: Locate sections ─────────────────────────────────────────
    stage_start(config, PipelineStage::Segment);
    let spans = segment::segment_all(&full_text, &config.sections, &config.boundary_keywords);
    let found = spans.iter().filter(|(_, s)| s.is_some()).count();
    debug!(requested = spans.len(), found, "section spans located");
    let inputs: Vec<SectionInput> = spans
        .iter()
        .map(|(name, span)| SectionInput {
            name: name.clone(),
            text: span
                .as_ref()
                .map(|s| s.slice(&full_text).to_string())
                .unwrap_or_default(),
        })
        .collect();
    stage_done(config, PipelineStage::Segment);

    // ── Stage 4: Extract figures ─────────────────────────────────────────
    stage_start(config, PipelineStage::Figures);
    let harvest = figures::extract_figures(&doc, config.min_figure_dim);
    let xobjects = harvest.candidates;
    let figure_candidates = harvest.figures.len();
    let figure_errors = harvest.errors;
    let selected = figures::select_figures(harvest.figures, config.max_figures);
    info!(
        xobjects,
        usable = figure_candidates,
        kept = selected.len(),
        errors = figure_errors.len(),
        "figure scan complete"
    );
    stage_done(config, PipelineStage::Figures);

    // ── Stage 5: Summarize sections ──────────────────────────────────────
    stage_start(config, PipelineStage::Summarize);
    let summarizer = Summarizer::new(config)?;
    let summaries = summarizer.summarize_sections(&inputs, &full_text).await;
    if let Some(ref cb) = config.progress {
        for summary in &summaries {
            cb.on_section_summarized(&summary.name, summary.is_degraded());
        }
    }
    stage_done(config, PipelineStage::Summarize);

    // ── Stage 6: Compose the poster ──────────────────────────────────────
    stage_start(config, PipelineStage::Compose);
    let spec = PosterSpec {
        metadata: metadata.clone(),
        summaries: summaries.clone(),
        figures: selected,
        theme: config.theme,
        columns: config.columns,
    };
    let composition = compose::compose_poster(&spec, &config.style)?;
    stage_done(config, PipelineStage::Compose);

    // ── Stage 7: Encode PNG ──────────────────────────────────────────────
    stage_start(config, PipelineStage::Encode);
    let png = encode::encode_png(&composition.canvas)?;
    stage_done(config, PipelineStage::Encode);

    // ── Stats ────────────────────────────────────────────────────────────
    let stats = PosterStats {
        pages,
        chars_extracted: full_text.len(),
        figure_candidates,
        figures_placed: composition.figures_placed,
        figure_errors,
        sections_requested: summaries.len(),
        sections_summarized: summaries.iter().filter(|s| !s.is_degraded()).count(),
        sections_not_found: summaries
            .iter()
            .filter(|s| s.outcome == SummaryOutcome::NotFound)
            .count(),
        sections_failed: summaries
            .iter()
            .filter(|s| s.outcome == SummaryOutcome::Failed)
            .count(),
        duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Poster complete: {}x{} with {}/{} sections summarized in {}ms",
        CANVAS_WIDTH, CANVAS_HEIGHT, stats.sections_summarized, stats.sections_requested,
        stats.duration_ms
    );

    if let Some(ref cb) = config.progress {
        cb.on_run_complete(stats.duration_ms);
    }

    Ok(PosterOutput {
        png,
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
        metadata,
        summaries,
        stats,
    })
}

/// Generate a poster and write the PNG directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &PosterConfig,
) -> Result<PosterStats, PosterError> {
    let output = generate(input, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PosterError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("png.tmp");
    tokio::fs::write(&tmp_path, &output.png)
        .await
        .map_err(|e| PosterError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| PosterError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Generate a poster from PDF bytes in memory.
///
/// Avoids the need for the caller to create a temporary file: the bytes are
/// written to a managed [`tempfile`] that is cleaned up automatically on
/// return or panic. This is the recommended API when PDF data comes from a
/// database, network stream, or upload buffer rather than a file on disk.
///
/// # Example
/// ```rust,no_run
/// use pdf2poster::{generate_from_bytes, PosterConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("paper.pdf")?;
/// let config = PosterConfig::default();
/// let output = generate_from_bytes(&bytes, &config).await?;
/// std::fs::write("poster.png", &output.png)?;
/// # Ok(())
/// # }
/// ```
pub async fn generate_from_bytes(
    bytes: &[u8],
    config: &PosterConfig,
) -> Result<PosterOutput, PosterError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| PosterError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| PosterError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `generate` returns
    generate(&path, config).await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input: impl AsRef<str>,
    config: &PosterConfig,
) -> Result<PosterOutput, PosterError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PosterError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(generate(input, config))
}

/// Report what a document would contribute to a poster without calling the
/// summarizer or drawing anything.
///
/// Runs the resolve, extract, and figure stages only; no API key is needed.
pub async fn inspect(
    input: impl AsRef<str>,
    config: &PosterConfig,
) -> Result<DocumentInfo, PosterError> {
    let input = input.as_ref();
    let resolved = input::resolve_input(input, config.download_timeout_secs).await?;
    let doc = extract::open_document(resolved.path())?;
    let full_text = extract::extract_full_text(&doc);
    let metadata = resolve_metadata(input, &doc, config);
    let harvest = figures::extract_figures(&doc, config.min_figure_dim);

    Ok(DocumentInfo {
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
        metadata,
        chars_extracted: full_text.len(),
        figure_candidates: harvest.figures.len(),
        figure_errors: harvest.errors,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn stage_start(config: &PosterConfig, stage: PipelineStage) {
    if let Some(ref cb) = config.progress {
        cb.on_stage_start(stage);
    }
}

fn stage_done(config: &PosterConfig, stage: PipelineStage) {
    if let Some(ref cb) = config.progress {
        cb.on_stage_complete(stage);
    }
}

/// Merge paper identity from the three places it can come from: caller
/// overrides win, then the document's Info dictionary, then a fallback
/// derived from the input itself.
fn resolve_metadata(input: &str, doc: &Document, config: &PosterConfig) -> PaperMetadata {
    let (doc_title, doc_authors) = extract::recover_metadata(doc);
    let title = config
        .title
        .clone()
        .or(doc_title)
        .unwrap_or_else(|| title_from_input(input));
    let authors = config.authors.clone().unwrap_or(doc_authors);
    let link = config.link.clone().or_else(|| input::derive_link(input));
    PaperMetadata {
        title,
        authors,
        link,
    }
}

/// Last-resort title: the final path or URL segment with any `.pdf`
/// extension removed. Query strings and fragments are stripped first so URL
/// inputs don't leak `?download=1` into the header.
fn title_from_input(input: &str) -> String {
    let last = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let last = last.split(['?', '#']).next().unwrap_or(last);
    let stem = match last.len().checked_sub(4).and_then(|i| last.get(i..)) {
        Some(ext) if ext.eq_ignore_ascii_case(".pdf") => &last[..last.len() - 4],
        _ => last,
    };
    let stem = stem.trim();
    if stem.is_empty() {
        "Untitled".to_string()
    } else {
        stem.to_string()
    }
}
