//! # pdf2poster
//!
//! Turn an academic paper (PDF) into a 1920x1080 visual poster.
//!
//! ## Why this crate?
//!
//! Deciding whether a paper is worth reading means finding the few sections
//! that matter, the one figure worth a look, and a link back to the source.
//! This crate does that mechanically: it extracts the paper's linear text,
//! locates the Introduction / Methodology / Results sections by their
//! heading synonyms, asks an OpenAI-compatible model for three-sentence
//! summaries, pulls the embedded figures straight out of the PDF (no
//! rasterisation), and composes everything onto a single deterministic PNG
//! canvas with a QR code back to the paper.
//!
//! Degradation is data, not failure: a missing section or an unreachable
//! summarizer becomes bracketed sentinel text on the poster, and a poster
//! is produced whenever one can be drawn at all.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / URL / arXiv id
//!  │
//!  ├─ 1. Resolve    local file or download (arXiv ids become pdf URLs)
//!  ├─ 2. Extract    linear full text + Info-dict metadata (lopdf)
//!  ├─ 3. Segment    locate section spans by heading synonyms
//!  ├─ 4. Figures    decode embedded image XObjects, fix mirrored ones
//!  ├─ 5. Summarize  chat-completion calls, sentinel text on failure
//!  ├─ 6. Compose    1920x1080 canvas: header, QR, balanced columns
//!  └─ 7. Encode     deterministic PNG bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2poster::{generate, PosterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY from the environment
//!     let config = PosterConfig::default();
//!     let output = generate("1710.06945", &config).await?;
//!     std::fs::write("poster.png", &output.png)?;
//!     eprintln!(
//!         "{} sections summarized, {} figures placed",
//!         output.stats.sections_summarized, output.stats.figures_placed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2poster` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2poster = { version = "0.4", default-features = false }
//! ```
//!
//! ## Degraded Output
//!
//! | Condition | Poster text |
//! |-----------|-------------|
//! | Section heading never found in the text | `[No Results section found in the paper.]` |
//! | Summarizer call failed or returned junk | `[Results summary unavailable.]` |
//!
//! The bracketed text is drawn on the poster like any other summary. Check
//! [`SectionSummary::outcome`] or [`PosterStats`] to detect degradation
//! programmatically.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    default_boundary_keywords, default_sections, ColorTheme, Palette, PosterConfig,
    PosterConfigBuilder, PosterStyle, SectionQuery,
};
pub use error::{FigureError, PosterError};
pub use generate::{generate, generate_from_bytes, generate_sync, generate_to_file, inspect};
pub use output::{
    DocumentInfo, PaperMetadata, PosterOutput, PosterSpec, PosterStats, SectionSummary,
    SummaryOutcome,
};
pub use pipeline::compose::{compose_poster, find_system_font, Composition};
pub use pipeline::figures::ExtractedFigure;
pub use progress::{NoopProgressCallback, PipelineStage, PosterProgressCallback};
