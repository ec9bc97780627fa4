use crate::model::{BatchOutcome, RenameOutcome, Summary};
use std::sync::mpsc::Sender;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for reporting rename progress.
///
/// Called from the worker thread. CLI implements with indicatif, other
/// front ends can forward through [`ChannelReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_enumerated(&self, _total_files: usize, _total_batches: usize) {}
    fn on_batch_start(&self, _batch: usize, _total_batches: usize, _files: usize) {}
    fn on_batch_failed(&self, _batch: usize, _reason: &str) {}
    fn on_entry(&self, _outcome: &RenameOutcome) {}
    fn on_batch_complete(&self, _batch: usize, _outcome: &BatchOutcome) {}
    fn on_delay(&self, _delay: Duration) {}
    fn on_log(&self, _line: &str) {}
    fn on_run_complete(&self, _summary: &Summary) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Owned form of every [`ProgressReporter`] callback.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Enumerated { total_files: usize, total_batches: usize },
    BatchStarted { batch: usize, total_batches: usize, files: usize },
    BatchFailed { batch: usize, reason: String },
    Entry(RenameOutcome),
    BatchCompleted { batch: usize, outcome: BatchOutcome },
    Delay(Duration),
    Log(String),
    RunCompleted(Summary),
}

impl ProgressEvent {
    /// Replays the event on `reporter`, typically on the receiving side of
    /// a [`ChannelReporter`].
    pub fn dispatch(&self, reporter: &dyn ProgressReporter) {
        match self {
            ProgressEvent::Enumerated {
                total_files,
                total_batches,
            } => reporter.on_enumerated(*total_files, *total_batches),
            ProgressEvent::BatchStarted {
                batch,
                total_batches,
                files,
            } => reporter.on_batch_start(*batch, *total_batches, *files),
            ProgressEvent::BatchFailed { batch, reason } => reporter.on_batch_failed(*batch, reason),
            ProgressEvent::Entry(outcome) => reporter.on_entry(outcome),
            ProgressEvent::BatchCompleted { batch, outcome } => {
                reporter.on_batch_complete(*batch, outcome)
            }
            ProgressEvent::Delay(delay) => reporter.on_delay(*delay),
            ProgressEvent::Log(line) => reporter.on_log(line),
            ProgressEvent::RunCompleted(summary) => reporter.on_run_complete(summary),
        }
    }
}

/// Forwards progress over a channel so the consumer never runs on the
/// worker thread. Send errors (receiver gone) are ignored.
pub struct ChannelReporter {
    sender: Mutex<Sender<ProgressEvent>>,
}

impl ChannelReporter {
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }

    fn send(&self, event: ProgressEvent) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(event);
        }
    }
}

impl ProgressReporter for ChannelReporter {
    fn on_enumerated(&self, total_files: usize, total_batches: usize) {
        self.send(ProgressEvent::Enumerated {
            total_files,
            total_batches,
        });
    }

    fn on_batch_start(&self, batch: usize, total_batches: usize, files: usize) {
        self.send(ProgressEvent::BatchStarted {
            batch,
            total_batches,
            files,
        });
    }

    fn on_batch_failed(&self, batch: usize, reason: &str) {
        self.send(ProgressEvent::BatchFailed {
            batch,
            reason: reason.to_string(),
        });
    }

    fn on_entry(&self, outcome: &RenameOutcome) {
        self.send(ProgressEvent::Entry(outcome.clone()));
    }

    fn on_batch_complete(&self, batch: usize, outcome: &BatchOutcome) {
        self.send(ProgressEvent::BatchCompleted {
            batch,
            outcome: outcome.clone(),
        });
    }

    fn on_delay(&self, delay: Duration) {
        self.send(ProgressEvent::Delay(delay));
    }

    fn on_log(&self, line: &str) {
        self.send(ProgressEvent::Log(line.to_string()));
    }

    fn on_run_complete(&self, summary: &Summary) {
        self.send(ProgressEvent::RunCompleted(summary.clone()));
    }
}
