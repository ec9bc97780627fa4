use crate::error::Result;
use crate::model::RenameOutcome;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub timestamp: String,
    pub batch: usize,
    pub status: String,
    pub original_path: String,
    pub new_path: String,
    pub reason: String,
}

impl JournalRecord {
    pub fn from_outcome(batch: usize, outcome: &RenameOutcome) -> Self {
        let (new_path, reason) = match outcome {
            RenameOutcome::Renamed { to, .. } | RenameOutcome::Planned { to, .. } => {
                (to.to_string_lossy().into_owned(), String::new())
            }
            RenameOutcome::Skipped { reason, .. } | RenameOutcome::Failed { reason, .. } => {
                (String::new(), reason.clone())
            }
            RenameOutcome::Unmapped { .. } => (String::new(), "no name in reply".to_string()),
        };
        Self {
            timestamp: Utc::now().to_rfc3339(),
            batch,
            status: outcome.status().to_string(),
            original_path: outcome.source().to_string_lossy().into_owned(),
            new_path,
            reason,
        }
    }
}

/// CSV audit trail of a run, one row per entry outcome. Rows are flushed as
/// they are written so a cancelled run still leaves a usable journal.
pub struct Journal {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl Journal {
    /// Creates (or truncates) the journal at `path`, creating parent
    /// directories as needed.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let writer = csv::Writer::from_path(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&mut self, batch: usize, outcome: &RenameOutcome) -> Result<()> {
        self.writer
            .serialize(JournalRecord::from_outcome(batch, outcome))?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn read_journal(path: &Path) -> Result<Vec<JournalRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoSummary {
    pub reverted: usize,
    pub failed: usize,
}

/// Renames every `renamed` row of the journal back, newest first.
///
/// A row is only reverted when its new path still exists and its original
/// path is free; anything else is counted as failed and logged.
pub fn undo(journal_path: &Path, dry_run: bool) -> Result<UndoSummary> {
    let records = read_journal(journal_path)?;
    let mut summary = UndoSummary::default();

    for record in records.iter().rev().filter(|r| r.status == "renamed") {
        let current = Path::new(&record.new_path);
        let original = Path::new(&record.original_path);

        if fs::symlink_metadata(current).is_err() {
            warn!("Cannot undo {}: file no longer exists", current.display());
            summary.failed += 1;
            continue;
        }
        if fs::symlink_metadata(original).is_ok() {
            warn!(
                "Cannot undo {} -> {}: original path is occupied",
                current.display(),
                original.display()
            );
            summary.failed += 1;
            continue;
        }

        if dry_run {
            info!("Would restore {} -> {}", current.display(), original.display());
            summary.reverted += 1;
            continue;
        }

        match fs::rename(current, original) {
            Ok(()) => {
                info!("Restored {} -> {}", current.display(), original.display());
                summary.reverted += 1;
            }
            Err(err) => {
                warn!(
                    "Restore failed {} -> {}: {}",
                    current.display(),
                    original.display(),
                    err
                );
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
