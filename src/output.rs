//! Result and data-model types threaded between pipeline stages.
//!
//! There is deliberately no hidden staging state: each stage takes explicit
//! inputs and returns explicit values, and one [`PosterOutput`] carries
//! everything a caller might want after the run (PNG bytes, recovered
//! metadata, per-section outcomes, statistics). The shell that drives the
//! pipeline owns its own sequencing and never reaches into library state.

use crate::error::FigureError;
use crate::pipeline::figures::ExtractedFigure;
use serde::{Deserialize, Serialize};

/// Paper identity as it appears on the poster header.
///
/// Constructed once at the document-loading boundary (PDF Info dictionary,
/// arXiv identifier, or caller overrides) so downstream components never do
/// dual-path attribute lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    /// Display title. Falls back to the input file stem when the document
    /// offers nothing better.
    pub title: String,
    /// Ordered author names. May be empty; the compositor then omits the
    /// author line.
    pub authors: Vec<String>,
    /// Optional canonical link (arXiv abs URL for identifier inputs).
    /// `None` means no QR code on the poster.
    pub link: Option<String>,
}

impl PaperMetadata {
    /// Comma-joined author line, or `None` when there are no authors.
    pub fn author_line(&self) -> Option<String> {
        if self.authors.is_empty() {
            None
        } else {
            Some(self.authors.join(", "))
        }
    }
}

/// How a section's summary text came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryOutcome {
    /// The remote model produced the text.
    Summarized,
    /// The section heading was never found; text is the not-found sentinel.
    NotFound,
    /// The remote call failed; text is the failure sentinel.
    Failed,
}

/// One section's renderable summary.
///
/// `text` always holds something the compositor can draw: a real summary or
/// one of the deterministic sentinels. Degradation is data, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub name: String,
    pub text: String,
    pub outcome: SummaryOutcome,
}

impl SectionSummary {
    /// True when the text is a sentinel rather than model output.
    pub fn is_degraded(&self) -> bool {
        !matches!(self.outcome, SummaryOutcome::Summarized)
    }
}

/// Everything the compositor needs, assembled before it runs.
///
/// Immutable input to [`crate::pipeline::compose::compose_poster`]; identical
/// specs (plus identical font bytes) produce byte-identical bitmaps.
#[derive(Debug, Clone)]
pub struct PosterSpec {
    pub metadata: PaperMetadata,
    /// Section summaries in poster order.
    pub summaries: Vec<SectionSummary>,
    /// Figures to place, in document order.
    pub figures: Vec<ExtractedFigure>,
    pub theme: crate::config::ColorTheme,
    /// Body column count, 1-3.
    pub columns: u32,
}

/// Counters describing one completed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosterStats {
    /// Pages in the source document.
    pub pages: usize,
    /// Characters of linear full-text extracted.
    pub chars_extracted: usize,
    /// Figures that passed the dimension filter and decoded.
    pub figure_candidates: usize,
    /// Figures actually placed after the area-ranked cap.
    pub figures_placed: usize,
    /// Per-image failures that were skipped during extraction.
    pub figure_errors: Vec<FigureError>,
    pub sections_requested: usize,
    pub sections_summarized: usize,
    pub sections_not_found: usize,
    pub sections_failed: usize,
    /// Wall-clock time for the whole run.
    pub duration_ms: u64,
}

impl PosterStats {
    /// Count of embedded images skipped during extraction.
    pub fn figures_skipped(&self) -> usize {
        self.figure_errors.len()
    }
}

/// Final artifact of [`crate::generate`]: the encoded poster plus everything
/// recovered along the way.
#[derive(Debug, Clone)]
pub struct PosterOutput {
    /// PNG-encoded poster bitmap.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub metadata: PaperMetadata,
    pub summaries: Vec<SectionSummary>,
    pub stats: PosterStats,
}

/// What [`crate::inspect`] reports without touching the summarizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub pdf_version: String,
    pub metadata: PaperMetadata,
    pub chars_extracted: usize,
    /// Figures that would survive the current dimension filter.
    pub figure_candidates: usize,
    pub figure_errors: Vec<FigureError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_line_joins_with_commas() {
        let meta = PaperMetadata {
            title: "T".into(),
            authors: vec!["A. Author".into(), "B. Builder".into()],
            link: None,
        };
        assert_eq!(meta.author_line().as_deref(), Some("A. Author, B. Builder"));
    }

    #[test]
    fn author_line_empty_is_none() {
        let meta = PaperMetadata {
            title: "T".into(),
            authors: vec![],
            link: None,
        };
        assert_eq!(meta.author_line(), None);
    }

    #[test]
    fn degraded_flags() {
        let ok = SectionSummary {
            name: "Results".into(),
            text: "Fine.".into(),
            outcome: SummaryOutcome::Summarized,
        };
        let missing = SectionSummary {
            name: "Results".into(),
            text: "[No Results section found in the paper.]".into(),
            outcome: SummaryOutcome::NotFound,
        };
        assert!(!ok.is_degraded());
        assert!(missing.is_degraded());
    }

    #[test]
    fn stats_serialize_roundtrip() {
        let stats = PosterStats {
            pages: 12,
            chars_extracted: 34_000,
            figure_candidates: 3,
            figures_placed: 2,
            figure_errors: vec![],
            sections_requested: 3,
            sections_summarized: 2,
            sections_not_found: 1,
            sections_failed: 0,
            duration_ms: 1500,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: PosterStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pages, 12);
        assert_eq!(back.sections_not_found, 1);
    }
}
