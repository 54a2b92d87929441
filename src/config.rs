//! Configuration types for paper-to-poster generation.
//!
//! All pipeline behaviour is controlled through [`PosterConfig`], built via
//! its [`PosterConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across calls, log them, and diff two runs to
//! understand why their posters differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::PosterError;
use crate::progress::PosterProgressCallback;
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for one paper-to-poster run.
///
/// Built via [`PosterConfig::builder()`] or using
/// [`PosterConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2poster::{ColorTheme, PosterConfig};
///
/// let config = PosterConfig::builder()
///     .theme(ColorTheme::Dark)
///     .columns(2)
///     .min_figure_dim(150)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PosterConfig {
    /// Logical sections to locate and summarize, in poster order.
    ///
    /// Each entry carries an ordered synonym list; the segmenter tries the
    /// synonyms in priority order and stops at the first heading hit, so put
    /// the most specific keyword first ("methodology" before "method").
    pub sections: Vec<SectionQuery>,

    /// Heading stems that terminate a section but are never summarized
    /// themselves ("conclusion", "reference", ...). Matched case-insensitively
    /// as substrings, so the stem "reference" also ends a span at
    /// "References" or "REFERENCES".
    pub boundary_keywords: Vec<String>,

    /// Minimum embedded-image dimension in pixels. Range: 16–1024. Default: 100.
    ///
    /// Papers embed dozens of tiny rasters: inline symbols, horizontal rules,
    /// publisher logos. Requiring both width and height to reach this
    /// threshold is what separates actual figures from that noise. 100 px
    /// catches essentially every real figure; raise it towards 150 for
    /// scanned documents full of small ornaments.
    pub min_figure_dim: u32,

    /// Maximum number of figures placed on the poster. Default: 2.
    ///
    /// Candidates are ranked by pixel area (largest first) before the cap is
    /// applied, then restored to document order for placement, so the cap
    /// keeps the most substantial figures rather than the first ones.
    pub max_figures: usize,

    /// Number of body columns on the canvas. Range: 1–3. Default: 3.
    ///
    /// Three columns suit the 1920x1080 landscape canvas; one column mimics
    /// the older portrait layout. Content is assigned greedily to the column
    /// with the lowest cursor, which keeps heights roughly balanced without
    /// true bin packing.
    pub columns: u32,

    /// Poster color palette. Default: [`ColorTheme::Light`].
    pub theme: ColorTheme,

    /// Typography and spacing parameters, including font file locations.
    pub style: PosterStyle,

    /// Maximum characters of section text sent per summarizer call.
    /// Range: 500–100 000. Default: 15 000.
    ///
    /// Chat-completion pricing and context limits are token-based, but the
    /// pipeline budgets in characters because that is what the segmenter
    /// produces. 15 000 chars (roughly 4k tokens) covers a full section of a
    /// typical paper without truncation; the text is cut hard at the budget
    /// before the request is built.
    pub summary_input_budget: usize,

    /// Chat model identifier. Default: "gpt-4o-mini".
    pub model: String,

    /// Base URL of the OpenAI-compatible endpoint. Default: "https://api.openai.com".
    pub api_base_url: String,

    /// API key. If `None`, the `OPENAI_API_KEY` environment variable is read
    /// at call time.
    pub api_key: Option<String>,

    /// Batch all sections into a single structured request. Default: false.
    ///
    /// One request instead of N cuts latency and cost for multi-section
    /// posters, at the price of a stricter contract: the model must return a
    /// JSON object keyed by section name. Missing keys degrade to the
    /// not-found sentinel per section; an unparsable response degrades every
    /// section at once. Leave it off when the endpoint is weak at strict
    /// JSON output.
    pub batch_summaries: bool,

    /// Custom system prompt. If `None`, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Title override; wins over anything recovered from the document.
    pub title: Option<String>,

    /// Author-list override; wins over anything recovered from the document.
    pub authors: Option<Vec<String>>,

    /// Link payload for the QR code; wins over the derived arXiv abs URL.
    /// `None` with no derivable link means no QR code is drawn.
    pub link: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-summarizer-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Optional stage-progress callback (spinners, logging, UI updates).
    pub progress: Option<Arc<dyn PosterProgressCallback>>,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            boundary_keywords: default_boundary_keywords(),
            min_figure_dim: 100,
            max_figures: 2,
            columns: 3,
            theme: ColorTheme::Light,
            style: PosterStyle::default(),
            summary_input_budget: 15_000,
            model: "gpt-4o-mini".to_string(),
            api_base_url: "https://api.openai.com".to_string(),
            api_key: None,
            batch_summaries: false,
            system_prompt: None,
            title: None,
            authors: None,
            link: None,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
            progress: None,
        }
    }
}

impl fmt::Debug for PosterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PosterConfig")
            .field("sections", &self.sections)
            .field("boundary_keywords", &self.boundary_keywords)
            .field("min_figure_dim", &self.min_figure_dim)
            .field("max_figures", &self.max_figures)
            .field("columns", &self.columns)
            .field("theme", &self.theme)
            .field("style", &self.style)
            .field("summary_input_budget", &self.summary_input_budget)
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("batch_summaries", &self.batch_summaries)
            .field("title", &self.title)
            .field("authors", &self.authors)
            .field("link", &self.link)
            .field(
                "progress",
                &self.progress.as_ref().map(|_| "<dyn PosterProgressCallback>"),
            )
            .finish()
    }
}

impl PosterConfig {
    /// Create a new builder for `PosterConfig`.
    pub fn builder() -> PosterConfigBuilder {
        PosterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// The default section set: the three blocks the poster summarizes,
/// with synonym keywords in priority order.
pub fn default_sections() -> Vec<SectionQuery> {
    vec![
        SectionQuery::new("Introduction", ["introduction"]),
        SectionQuery::new("Methodology", ["methodology", "methods", "method"]),
        SectionQuery::new("Results", ["results", "experiments", "evaluation"]),
    ]
}

/// Heading stems that end a span but are never summarized.
pub fn default_boundary_keywords() -> Vec<String> {
    ["conclusion", "discussion", "reference", "acknowledg", "appendix", "bibliograph"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Builder for [`PosterConfig`].
#[derive(Debug)]
pub struct PosterConfigBuilder {
    config: PosterConfig,
}

impl PosterConfigBuilder {
    /// Replace the whole section set.
    pub fn sections(mut self, sections: Vec<SectionQuery>) -> Self {
        self.config.sections = sections;
        self
    }

    /// Append one section query to the set.
    pub fn section(
        mut self,
        name: impl Into<String>,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.config.sections.push(SectionQuery::new(name, keywords));
        self
    }

    pub fn boundary_keywords(mut self, stems: Vec<String>) -> Self {
        self.config.boundary_keywords = stems;
        self
    }

    pub fn min_figure_dim(mut self, px: u32) -> Self {
        self.config.min_figure_dim = px.clamp(16, 1024);
        self
    }

    pub fn max_figures(mut self, n: usize) -> Self {
        self.config.max_figures = n.min(16);
        self
    }

    pub fn columns(mut self, n: u32) -> Self {
        self.config.columns = n.clamp(1, 3);
        self
    }

    pub fn theme(mut self, theme: ColorTheme) -> Self {
        self.config.theme = theme;
        self
    }

    pub fn style(mut self, style: PosterStyle) -> Self {
        self.config.style = style;
        self
    }

    pub fn summary_input_budget(mut self, chars: usize) -> Self {
        self.config.summary_input_budget = chars.clamp(500, 100_000);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn batch_summaries(mut self, v: bool) -> Self {
        self.config.batch_summaries = v;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.config.authors = Some(authors);
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.config.link = Some(link.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn PosterProgressCallback>) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PosterConfig, PosterError> {
        let c = &self.config;
        if c.columns < 1 || c.columns > 3 {
            return Err(PosterError::InvalidConfig(format!(
                "columns must be 1-3, got {}",
                c.columns
            )));
        }
        if c.api_base_url.is_empty() || !c.api_base_url.starts_with("http") {
            return Err(PosterError::InvalidConfig(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                c.api_base_url
            )));
        }
        for s in &c.sections {
            if s.keywords.is_empty() {
                return Err(PosterError::InvalidConfig(format!(
                    "section '{}' has no keywords",
                    s.name
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Section queries ──────────────────────────────────────────────────────

/// One logical section to locate: a display name plus its heading synonyms
/// in priority order.
///
/// The first synonym that matches wins; later synonyms are never consulted
/// once an earlier one hits, even if a later synonym would have produced a
/// more plausible span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionQuery {
    /// Display name used on the poster and in summarizer prompts.
    pub name: String,
    /// Heading keywords, most specific first. Matched case-insensitively.
    pub keywords: Vec<String>,
}

impl SectionQuery {
    pub fn new(
        name: impl Into<String>,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Color themes ─────────────────────────────────────────────────────────

/// Enumerated poster palettes.
///
/// A closed set rather than free-form colors: every palette has been checked
/// for contrast between text, accent bars, and the QR quiet zone. Parsing an
/// unknown name is a configuration error, not a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    /// White background, dark text, indigo accent. (default)
    #[default]
    Light,
    /// Near-black background, light text.
    Dark,
    /// Warm paper tones, brown accent.
    Sepia,
}

impl ColorTheme {
    /// Concrete colors for this theme.
    pub fn palette(&self) -> Palette {
        match self {
            ColorTheme::Light => Palette {
                background: Rgb([0xFF, 0xFF, 0xFF]),
                header: Rgb([0xF0, 0xF2, 0xF6]),
                title: Rgb([0x0E, 0x11, 0x17]),
                text: Rgb([0x31, 0x33, 0x3F]),
                accent: Rgb([0x4A, 0x6C, 0xFA]),
                accent_text: Rgb([0xFF, 0xFF, 0xFF]),
            },
            ColorTheme::Dark => Palette {
                background: Rgb([0x0E, 0x11, 0x17]),
                header: Rgb([0x26, 0x27, 0x30]),
                title: Rgb([0xFA, 0xFA, 0xFA]),
                text: Rgb([0xC9, 0xCD, 0xD3]),
                accent: Rgb([0x4A, 0x6C, 0xFA]),
                accent_text: Rgb([0xFF, 0xFF, 0xFF]),
            },
            ColorTheme::Sepia => Palette {
                background: Rgb([0xF4, 0xEC, 0xD8]),
                header: Rgb([0xE8, 0xDC, 0xC0]),
                title: Rgb([0x3B, 0x2F, 0x2F]),
                text: Rgb([0x5B, 0x46, 0x36]),
                accent: Rgb([0xA0, 0x52, 0x2D]),
                accent_text: Rgb([0xF4, 0xEC, 0xD8]),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTheme::Light => "light",
            ColorTheme::Dark => "dark",
            ColorTheme::Sepia => "sepia",
        }
    }
}

impl fmt::Display for ColorTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorTheme {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ColorTheme::Light),
            "dark" => Ok(ColorTheme::Dark),
            "sepia" => Ok(ColorTheme::Sepia),
            _ => Err(PosterError::UnknownTheme {
                name: s.to_string(),
            }),
        }
    }
}

/// Concrete colors resolved from a [`ColorTheme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb<u8>,
    /// Header band fill.
    pub header: Rgb<u8>,
    /// Title and author text.
    pub title: Rgb<u8>,
    /// Body (summary and caption) text.
    pub text: Rgb<u8>,
    /// Section heading bars.
    pub accent: Rgb<u8>,
    /// Heading text drawn on top of the accent bar.
    pub accent_text: Rgb<u8>,
}

// ── Poster style ─────────────────────────────────────────────────────────

/// Typography and spacing for the compositor.
///
/// The canvas itself is fixed at 1920x1080; these knobs control what happens
/// inside it. Font paths of `None` trigger a search of well-known system
/// locations at composition time; a miss there is a fatal
/// [`PosterError::FontAssetMissing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterStyle {
    /// Regular TTF/OTF face. `None` = search system font directories.
    pub font_path: Option<PathBuf>,
    /// Bold TTF/OTF face for the title and section headings.
    /// `None` = search system font directories.
    pub bold_font_path: Option<PathBuf>,

    /// Title size in pixels. Default: 48.
    pub title_px: f32,
    /// Author-line size in pixels. Default: 26.
    pub author_px: f32,
    /// Section-heading size in pixels. Default: 30.
    pub heading_px: f32,
    /// Summary body size in pixels. Default: 22.
    pub body_px: f32,
    /// Figure-caption size in pixels. Default: 20.
    pub caption_px: f32,

    /// Outer margin around the body area. Default: 40.
    pub margin: u32,
    /// Gap between adjacent columns. Default: 24.
    pub column_gap: u32,
    /// Header band height. Default: 180.
    pub header_height: u32,
    /// Extra pixels between wrapped lines (added to the glyph ascent).
    /// Default: 8.
    pub line_spacing: u32,
    /// Height of the accent bar behind each section heading. Default: 40.
    pub heading_bar_height: u32,
    /// Vertical gap after a completed section block. Default: 40.
    pub section_gap: u32,
    /// Vertical padding after a pasted figure + caption. Default: 24.
    pub figure_padding: u32,
    /// Rendered QR code edge length in pixels. Default: 140.
    pub qr_size: u32,
    /// Distance of the QR code from the canvas top-right corner. Default: 24.
    pub qr_margin: u32,
}

impl Default for PosterStyle {
    fn default() -> Self {
        Self {
            font_path: None,
            bold_font_path: None,
            title_px: 48.0,
            author_px: 26.0,
            heading_px: 30.0,
            body_px: 22.0,
            caption_px: 20.0,
            margin: 40,
            column_gap: 24,
            header_height: 180,
            line_spacing: 8,
            heading_bar_height: 40,
            section_gap: 40,
            figure_padding: 24,
            qr_size: 140,
            qr_margin: 24,
        }
    }
}
