use crate::progress::ProgressReporter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop flag. Clones share the same flag; the caller cancels,
/// the worker polls at batch boundaries and during the inter-batch delay.
#[derive(Debug, Clone, Default)]
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

/// Everything a run borrows from its caller.
pub struct RunContext<'a> {
    pub cancel: CancelToken,
    pub reporter: &'a dyn ProgressReporter,
}

impl<'a> RunContext<'a> {
    pub fn new(cancel: CancelToken, reporter: &'a dyn ProgressReporter) -> Self {
        Self { cancel, reporter }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Sends a line to the reporter's log sink.
    pub fn log(&self, line: impl AsRef<str>) {
        self.reporter.on_log(line.as_ref());
    }
}
