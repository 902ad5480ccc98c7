use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::report::StageReport;

/// Thread-safe progress reporting for pipeline runs.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations. `advance`
/// may be called from several worker threads at once.
pub trait ProgressReporter: Send + Sync {
    /// A stage has started. `total_items` is the number of frames found in
    /// its primary upstream, if known.
    fn begin_stage(&self, _stage: &str, _total_items: Option<usize>) {}

    /// One more frame of the current stage has been handled.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self, _report: &StageReport) {}
}

/// No-op progress reporter, used when the caller does not supply one.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Shared cancellation flag. Checked before each frame; frames already in
/// flight run to completion.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
