use crate::error::{Error, Result};
use crate::model::{Batch, BatchOutcome, FileEntry, Summary};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Granularity of cancellation checks while waiting between batches.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Splits entries into fixed-size batches and runs them one at a time with
/// a cancellable pause in between.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    batch_size: usize,
    delay: Duration,
}

impl BatchScheduler {
    pub fn new(batch_size: usize, delay: Duration) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidBatchSize);
        }
        Ok(Self { batch_size, delay })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn total_batches(&self, total_files: usize) -> usize {
        total_files.div_ceil(self.batch_size)
    }

    /// Runs `on_batch` for each batch in enumeration order.
    ///
    /// `cancel` is polled before every batch, before each pause and during
    /// it. A cancelled run returns what was accumulated so far with
    /// `cancelled` set. Batch failures are just outcomes; the scheduler
    /// always moves on to the next batch.
    pub fn run<F, C>(&self, entries: &[FileEntry], mut on_batch: F, cancel: C) -> Summary
    where
        F: FnMut(Batch<'_>) -> BatchOutcome,
        C: Fn() -> bool,
    {
        let start = Instant::now();
        let total = self.total_batches(entries.len());
        let mut summary = Summary {
            total_files: entries.len(),
            total_batches: total,
            ..Summary::default()
        };

        for (i, chunk) in entries.chunks(self.batch_size).enumerate() {
            if cancel() {
                info!("Cancelled before batch {}/{}", i + 1, total);
                summary.cancelled = true;
                break;
            }

            let batch = Batch {
                number: i + 1,
                total,
                entries: chunk,
            };
            let outcome = on_batch(batch);
            summary.accumulate(&outcome);

            let is_last = i + 1 == total;
            if is_last {
                break;
            }
            if cancel() {
                info!("Cancelled after batch {}/{}", i + 1, total);
                summary.cancelled = true;
                break;
            }
            if !self.delay.is_zero() {
                debug!("Waiting {:.1}s before next batch", self.delay.as_secs_f64());
                if cancellable_sleep(self.delay, &cancel) {
                    info!("Cancelled while waiting after batch {}/{}", i + 1, total);
                    summary.cancelled = true;
                    break;
                }
            }
        }

        summary.duration = start.elapsed();
        summary
    }
}

/// Free-function form of [`BatchScheduler::run`].
pub fn run<F, C>(
    entries: &[FileEntry],
    batch_size: usize,
    delay: Duration,
    on_batch: F,
    cancel: C,
) -> Result<Summary>
where
    F: FnMut(Batch<'_>) -> BatchOutcome,
    C: Fn() -> bool,
{
    Ok(BatchScheduler::new(batch_size, delay)?.run(entries, on_batch, cancel))
}

/// Sleeps for `duration` in short slices. Returns `true` as soon as
/// `cancel` reports a stop request.
pub fn cancellable_sleep<C: Fn() -> bool>(duration: Duration, cancel: &C) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(CANCEL_POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn entries(n: usize) -> Vec<FileEntry> {
        (0..n)
            .map(|i| FileEntry {
                absolute_path: PathBuf::from(format!("/f/{}.txt", i)),
                original_name: format!("{}.txt", i),
                relative_group: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        assert!(matches!(
            BatchScheduler::new(0, Duration::ZERO),
            Err(Error::InvalidBatchSize)
        ));
    }

    #[test]
    fn test_batches_are_contiguous_with_short_tail() {
        let files = entries(7);
        let mut seen: Vec<(usize, usize, Vec<String>)> = Vec::new();
        let summary = run(
            &files,
            3,
            Duration::ZERO,
            |batch| {
                seen.push((
                    batch.number,
                    batch.total,
                    batch.entries.iter().map(|e| e.original_name.clone()).collect(),
                ));
                BatchOutcome::new(batch.len())
            },
            || false,
        )
        .unwrap();

        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], (1, 3, vec!["0.txt".into(), "1.txt".into(), "2.txt".into()]));
        assert_eq!(seen[2], (3, 3, vec!["6.txt".into()]));
        assert_eq!(summary.processed, 7);
        assert_eq!(summary.batches_run, 3);
        assert!(!summary.cancelled);
    }

    #[test]
    fn test_cancel_before_first_batch() {
        let files = entries(3);
        let calls = Cell::new(0);
        let summary = run(
            &files,
            1,
            Duration::ZERO,
            |batch| {
                calls.set(calls.get() + 1);
                BatchOutcome::new(batch.len())
            },
            || true,
        )
        .unwrap();

        assert_eq!(calls.get(), 0);
        assert!(summary.cancelled);
        assert_eq!(summary.batches_run, 0);
    }

    #[test]
    fn test_batch_failure_does_not_stop_run() {
        let files = entries(4);
        let summary = run(
            &files,
            2,
            Duration::ZERO,
            |batch| {
                if batch.number == 1 {
                    BatchOutcome::failed(batch.len())
                } else {
                    BatchOutcome::new(batch.len())
                }
            },
            || false,
        )
        .unwrap();

        assert_eq!(summary.batches_run, 2);
        assert_eq!(summary.failed_batches, 1);
    }

    #[test]
    fn test_cancel_interrupts_delay() {
        let files = entries(2);
        let flag = Arc::new(AtomicBool::new(false));
        let setter = flag.clone();
        let start = Instant::now();

        let summary = run(
            &files,
            1,
            Duration::from_secs(30),
            |batch| {
                let setter = setter.clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(150));
                    setter.store(true, Ordering::SeqCst);
                });
                BatchOutcome::new(batch.len())
            },
            || flag.load(Ordering::SeqCst),
        )
        .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.batches_run, 1);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_no_delay_after_last_batch() {
        let files = entries(1);
        let start = Instant::now();
        let summary = run(
            &files,
            5,
            Duration::from_secs(30),
            |batch| BatchOutcome::new(batch.len()),
            || false,
        )
        .unwrap();

        assert_eq!(summary.batches_run, 1);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_empty_input_runs_nothing() {
        let summary = run(&[], 3, Duration::ZERO, |_| unreachable!(), || false).unwrap();
        assert_eq!(summary.total_batches, 0);
        assert_eq!(summary.batches_run, 0);
    }
}
