//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn PosterProgressCallback>`] via
//! [`crate::config::PosterConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal spinner, a log, or a UI without the library
//! knowing anything about how the host application communicates. The trait is
//! `Send + Sync` so a callback can be shared with other tasks even though the
//! pipeline itself runs on a single logical thread.

use std::fmt;
use std::sync::Arc;

/// The stages of one poster run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Resolve the input (path, URL, or arXiv id) to a local PDF.
    Resolve,
    /// Extract linear full-text and paper metadata.
    Extract,
    /// Locate section spans in the full-text.
    Segment,
    /// Enumerate, decode, and orient embedded figures.
    Figures,
    /// Call the remote summarizer (the only network stage besides Resolve).
    Summarize,
    /// Lay out and draw the poster bitmap.
    Compose,
    /// Encode the bitmap to PNG.
    Encode,
}

impl PipelineStage {
    /// Human-readable label for spinners and logs.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Resolve => "Resolving input",
            PipelineStage::Extract => "Extracting text",
            PipelineStage::Segment => "Locating sections",
            PipelineStage::Figures => "Extracting figures",
            PipelineStage::Summarize => "Summarizing sections",
            PipelineStage::Compose => "Composing poster",
            PipelineStage::Encode => "Encoding PNG",
        }
    }

    /// Total number of stages in a run.
    pub const COUNT: usize = 7;
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the pipeline as it advances through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`; events for a
/// single run always arrive in order from one task.
pub trait PosterProgressCallback: Send + Sync {
    /// Called once before the first stage.
    fn on_run_start(&self, input: &str) {
        let _ = input;
    }

    /// Called when a stage begins.
    fn on_stage_start(&self, stage: PipelineStage) {
        let _ = stage;
    }

    /// Called when a stage finishes (successfully or after degrading).
    fn on_stage_complete(&self, stage: PipelineStage) {
        let _ = stage;
    }

    /// Called once per section as its summary lands.
    ///
    /// `degraded` is true when the text is a not-found or failure sentinel
    /// rather than model output.
    fn on_section_summarized(&self, name: &str, degraded: bool) {
        let _ = (name, degraded);
    }

    /// Called once after the final stage.
    fn on_run_complete(&self, duration_ms: u64) {
        let _ = duration_ms;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PosterProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PosterConfig`].
pub type ProgressCallback = Arc<dyn PosterProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        stages_started: Arc<AtomicUsize>,
        stages_completed: Arc<AtomicUsize>,
        degraded_sections: Arc<AtomicUsize>,
    }

    impl PosterProgressCallback for TrackingCallback {
        fn on_stage_start(&self, _stage: PipelineStage) {
            self.stages_started.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_complete(&self, _stage: PipelineStage) {
            self.stages_completed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_section_summarized(&self, _name: &str, degraded: bool) {
            if degraded {
                self.degraded_sections.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start("paper.pdf");
        cb.on_stage_start(PipelineStage::Resolve);
        cb.on_stage_complete(PipelineStage::Resolve);
        cb.on_section_summarized("Results", true);
        cb.on_run_complete(1234);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            stages_started: Arc::new(AtomicUsize::new(0)),
            stages_completed: Arc::new(AtomicUsize::new(0)),
            degraded_sections: Arc::new(AtomicUsize::new(0)),
        };

        tracker.on_stage_start(PipelineStage::Extract);
        tracker.on_stage_complete(PipelineStage::Extract);
        tracker.on_stage_start(PipelineStage::Summarize);
        tracker.on_section_summarized("Introduction", false);
        tracker.on_section_summarized("Results", true);
        tracker.on_stage_complete(PipelineStage::Summarize);

        assert_eq!(tracker.stages_started.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.stages_completed.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.degraded_sections.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoopProgressCallback>();

        let cb: Arc<dyn PosterProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_stage_start(PipelineStage::Compose);
        cb.on_run_complete(10);
    }

    #[test]
    fn stage_labels_are_distinct() {
        let stages = [
            PipelineStage::Resolve,
            PipelineStage::Extract,
            PipelineStage::Segment,
            PipelineStage::Figures,
            PipelineStage::Summarize,
            PipelineStage::Compose,
            PipelineStage::Encode,
        ];
        assert_eq!(stages.len(), PipelineStage::COUNT);
        for (i, a) in stages.iter().enumerate() {
            for b in &stages[i + 1..] {
                assert_ne!(a.label(), b.label());
            }
        }
    }
}
