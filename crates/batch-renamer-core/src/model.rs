use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One renameable file found during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub absolute_path: PathBuf,
    pub original_name: String,
    /// Directory path from the root to the file, `/`-separated; empty for
    /// files directly under the root.
    pub relative_group: String,
}

impl FileEntry {
    /// Name shown in prompts and logs, prefixed with the group when nested.
    pub fn display_name(&self) -> String {
        if self.relative_group.is_empty() {
            self.original_name.clone()
        } else {
            format!("{}/{}", self.relative_group, self.original_name)
        }
    }
}

/// A contiguous slice of the enumerated files, sent to the service in one
/// request. Entries are addressed 1..=len within the batch.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// 1-based position of this batch in the run.
    pub number: usize,
    pub total: usize,
    pub entries: &'a [FileEntry],
}

impl<'a> Batch<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by its 1-based batch-local index.
    pub fn get(&self, index: usize) -> Option<&'a FileEntry> {
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRename {
    pub entry: FileEntry,
    pub final_name: String,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}

impl ResolvedRename {
    pub fn skip(entry: FileEntry, reason: &str) -> Self {
        Self {
            final_name: entry.original_name.clone(),
            entry,
            skipped: true,
            skip_reason: Some(reason.to_string()),
        }
    }
}

/// What happened to a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed { from: PathBuf, to: PathBuf },
    /// Dry run: the rename that would have been performed.
    Planned { from: PathBuf, to: PathBuf },
    Skipped { path: PathBuf, reason: String },
    Failed { path: PathBuf, reason: String },
    /// The reply carried no usable name for this entry.
    Unmapped { path: PathBuf },
}

impl RenameOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            RenameOutcome::Renamed { .. } => "renamed",
            RenameOutcome::Planned { .. } => "planned",
            RenameOutcome::Skipped { .. } => "skipped",
            RenameOutcome::Failed { .. } => "failed",
            RenameOutcome::Unmapped { .. } => "unmapped",
        }
    }

    pub fn source(&self) -> &PathBuf {
        match self {
            RenameOutcome::Renamed { from, .. } | RenameOutcome::Planned { from, .. } => from,
            RenameOutcome::Skipped { path, .. }
            | RenameOutcome::Failed { path, .. }
            | RenameOutcome::Unmapped { path } => path,
        }
    }
}

impl fmt::Display for RenameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameOutcome::Renamed { from, to } => {
                write!(f, "renamed: {} -> {}", file_name(from), file_name(to))
            }
            RenameOutcome::Planned { from, to } => {
                write!(f, "would rename: {} -> {}", file_name(from), file_name(to))
            }
            RenameOutcome::Skipped { path, reason } => {
                write!(f, "skipped: {} ({})", file_name(path), reason)
            }
            RenameOutcome::Failed { path, reason } => {
                write!(f, "failed: {} ({})", file_name(path), reason)
            }
            RenameOutcome::Unmapped { path } => {
                write!(f, "not renamed: {} (no name in reply)", file_name(path))
            }
        }
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Per-batch tallies, accumulated into the run [`Summary`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub entries: usize,
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unmapped: usize,
    /// The batch failed as a whole (service error, timeout).
    pub batch_failed: bool,
}

impl BatchOutcome {
    pub fn new(entries: usize) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// A batch that produced nothing; every entry counts as unmapped.
    pub fn failed(entries: usize) -> Self {
        Self {
            entries,
            unmapped: entries,
            batch_failed: true,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &RenameOutcome) {
        match outcome {
            RenameOutcome::Renamed { .. } | RenameOutcome::Planned { .. } => self.renamed += 1,
            RenameOutcome::Skipped { .. } => self.skipped += 1,
            RenameOutcome::Failed { .. } => self.failed += 1,
            RenameOutcome::Unmapped { .. } => self.unmapped += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total_files: usize,
    pub total_batches: usize,
    pub batches_run: usize,
    pub failed_batches: usize,
    pub processed: usize,
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unmapped: usize,
    pub cancelled: bool,
    pub duration: Duration,
}

impl Summary {
    pub fn accumulate(&mut self, outcome: &BatchOutcome) {
        self.batches_run += 1;
        if outcome.batch_failed {
            self.failed_batches += 1;
        }
        self.processed += outcome.entries;
        self.renamed += outcome.renamed;
        self.skipped += outcome.skipped;
        self.failed += outcome.failed;
        self.unmapped += outcome.unmapped;
    }
}
