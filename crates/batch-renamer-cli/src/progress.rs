use batch_renamer_core::{BatchOutcome, ProgressReporter, RenameOutcome, Summary};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// CLI progress reporter using an indicatif progress bar.
///
/// Fed on the main thread from the worker's event channel. The bar counts
/// files; per-file outcomes are printed above it.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "  {spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} files {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("━╸─")
    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

fn outcome_line(outcome: &RenameOutcome) -> String {
    let text = outcome.to_string();
    match outcome {
        RenameOutcome::Renamed { .. } => format!("  {} {}", "✓".green(), text),
        RenameOutcome::Planned { .. } => format!("  {} {}", "→".cyan(), text),
        RenameOutcome::Skipped { .. } => format!("  {} {}", "-".yellow(), text.yellow()),
        RenameOutcome::Failed { .. } => format!("  {} {}", "✗".red(), text.red()),
        RenameOutcome::Unmapped { .. } => format!("  {} {}", "?".dimmed(), text.dimmed()),
    }
}

impl ProgressReporter for CliReporter {
    fn on_enumerated(&self, total_files: usize, _total_batches: usize) {
        let pb = ProgressBar::new(total_files as u64);
        pb.set_style(bar_style());
        pb.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_batch_start(&self, batch: usize, total_batches: usize, files: usize) {
        self.with_bar(|pb| {
            pb.set_message(format!("batch {}/{} ({} files)", batch, total_batches, files))
        });
    }

    fn on_batch_failed(&self, batch: usize, reason: &str) {
        let line = format!("  {} {}", "✗".red(), format!("batch {} failed: {}", batch, reason).red());
        self.with_bar(|pb| pb.println(line));
    }

    fn on_entry(&self, outcome: &RenameOutcome) {
        let line = outcome_line(outcome);
        self.with_bar(|pb| {
            pb.println(line);
            pb.inc(1);
        });
    }

    fn on_batch_complete(&self, _batch: usize, outcome: &BatchOutcome) {
        if outcome.batch_failed {
            self.with_bar(|pb| pb.inc(outcome.entries as u64));
        }
    }

    fn on_delay(&self, delay: Duration) {
        self.with_bar(|pb| {
            pb.set_message(format!(
                "waiting {:.1}s (q + Enter to stop)",
                delay.as_secs_f64()
            ))
        });
    }

    fn on_log(&self, line: &str) {
        let line = format!("  {}", line.cyan());
        let mut printed = false;
        self.with_bar(|pb| {
            pb.println(&line);
            printed = true;
        });
        if !printed {
            eprintln!("{}", line);
        }
    }

    fn on_run_complete(&self, _summary: &Summary) {
        self.finish_bar();
    }
}
