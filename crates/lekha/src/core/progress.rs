//! Coarse progress milestones.
//!
//! The pipeline reports a handful of fixed checkpoints rather than fine-grained
//! percentages. Events reach the sink in milestone order; a repeated or regressing
//! milestone is dropped by [`ProgressTracker`]. Percentages never decrease but adjacent
//! passes of a very long catalog may share one.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fixed checkpoints of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    PreprocessingStarted,
    /// `index` is zero-based within `total` passes.
    PassStarted { index: usize, total: usize },
    ExtractionStarted,
    Complete,
}

impl Milestone {
    pub fn percent(&self) -> u8 {
        match self {
            Milestone::PreprocessingStarted => 5,
            Milestone::PassStarted { index, total } => {
                let total = (*total).max(1);
                let index = (*index).min(total - 1);
                (10 + (70 * index) / total) as u8
            }
            Milestone::ExtractionStarted => 85,
            Milestone::Complete => 100,
        }
    }

    /// Position in run order. Unlike `percent`, distinct for every pass.
    pub fn position(&self) -> (u8, usize) {
        match self {
            Milestone::PreprocessingStarted => (0, 0),
            Milestone::PassStarted { index, .. } => (1, *index),
            Milestone::ExtractionStarted => (2, 0),
            Milestone::Complete => (3, 0),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Milestone::PreprocessingStarted => "preprocessing-started".to_string(),
            Milestone::PassStarted { index, .. } => format!("pass-{}-started", index + 1),
            Milestone::ExtractionStarted => "extraction-started".to_string(),
            Milestone::Complete => "complete".to_string(),
        }
    }

    pub fn event(&self) -> ProgressEvent {
        ProgressEvent {
            stage: self.label(),
            percent: self.percent(),
        }
    }
}

/// `(stageLabel, percent)` pair delivered to a [`ProgressSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: String,
    pub percent: u8,
}

/// Append-only receiver of progress events. Has no influence on the run.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Collects every event it receives. Useful for tests and for the CLI's `--progress` output.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Forwards milestones to an optional sink, enforcing monotonic, de-duplicated delivery.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    sink: Option<Arc<dyn ProgressSink>>,
    last: Arc<Mutex<Option<(u8, usize)>>>,
}

impl ProgressTracker {
    pub fn new(sink: Option<Arc<dyn ProgressSink>>) -> Self {
        Self {
            sink,
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Emits `milestone` unless an equal or later milestone was already reported.
    pub fn report(&self, milestone: Milestone) {
        let event = milestone.event();
        let position = milestone.position();
        {
            let mut last = self.last.lock();
            if matches!(*last, Some(previous) if previous >= position) {
                tracing::trace!(stage = %event.stage, "suppressed non-increasing milestone");
                return;
            }
            *last = Some(position);
        }

        tracing::debug!(stage = %event.stage, percent = event.percent, "progress");
        if let Some(sink) = &self.sink {
            sink.on_progress(&event);
        }
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("has_sink", &self.sink.is_some())
            .field("last", &*self.last.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestone_percentages_increase() {
        let milestones = [
            Milestone::PreprocessingStarted,
            Milestone::PassStarted { index: 0, total: 3 },
            Milestone::PassStarted { index: 1, total: 3 },
            Milestone::PassStarted { index: 2, total: 3 },
            Milestone::ExtractionStarted,
            Milestone::Complete,
        ];
        let percents: Vec<u8> = milestones.iter().map(Milestone::percent).collect();
        assert!(percents.windows(2).all(|w| w[0] < w[1]), "{:?}", percents);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Milestone::PassStarted { index: 1, total: 2 }.label(), "pass-2-started");
        assert_eq!(Milestone::Complete.label(), "complete");
    }

    #[test]
    fn test_tracker_suppresses_duplicates_and_regressions() {
        let sink = RecordingSink::new();
        let tracker = ProgressTracker::new(Some(Arc::new(sink.clone())));

        tracker.report(Milestone::PreprocessingStarted);
        tracker.report(Milestone::PreprocessingStarted);
        tracker.report(Milestone::ExtractionStarted);
        tracker.report(Milestone::PassStarted { index: 0, total: 2 });
        tracker.report(Milestone::Complete);

        let stages: Vec<String> = sink.events().into_iter().map(|e| e.stage).collect();
        assert_eq!(stages, vec!["preprocessing-started", "extraction-started", "complete"]);
    }

    #[test]
    fn test_long_catalog_reports_every_pass() {
        let sink = RecordingSink::new();
        let tracker = ProgressTracker::new(Some(Arc::new(sink.clone())));

        let total = 150;
        for index in 0..total {
            tracker.report(Milestone::PassStarted { index, total });
        }
        tracker.report(Milestone::ExtractionStarted);

        let events = sink.events();
        assert_eq!(events.len(), total + 1);
        assert_eq!(events[total - 1].stage, "pass-150-started");
        assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert!(events[total - 1].percent < events[total].percent);
    }

    #[test]
    fn test_tracker_without_sink_is_noop() {
        let tracker = ProgressTracker::disabled();
        tracker.report(Milestone::Complete);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink = move |event: &ProgressEvent| seen_clone.lock().push(event.percent);
        let tracker = ProgressTracker::new(Some(Arc::new(sink)));
        tracker.report(Milestone::Complete);
        assert_eq!(*seen.lock(), vec![100]);
    }
}
