use crate::config::AppConfig;
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::generator::NameGenerator;
use crate::journal::Journal;
use crate::model::{Batch, BatchOutcome, FileEntry, RenameOutcome, Summary};
use crate::parser;
use crate::prompt;
use crate::rename;
use crate::scanner;
use crate::scheduler::BatchScheduler;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Everything a single run needs besides the generator.
#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub root: PathBuf,
    pub recursive: bool,
    pub batch_size: usize,
    pub keyword: Option<String>,
    pub delay: Duration,
    pub ignore_patterns: Vec<String>,
    pub journal_path: Option<PathBuf>,
    pub dry_run: bool,
}

impl RenameOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = AppConfig::default();
        Self {
            root: root.into(),
            recursive: defaults.recursive,
            batch_size: defaults.batch_size,
            keyword: None,
            delay: defaults.delay().unwrap_or_default(),
            ignore_patterns: Vec::new(),
            journal_path: None,
            dry_run: false,
        }
    }

    /// Builds options from a loaded configuration. `root` wins over
    /// `config.root_path`.
    pub fn from_config(config: &AppConfig, root: Option<PathBuf>) -> Result<Self> {
        let root = root
            .or_else(|| config.root_path.as_ref().map(PathBuf::from))
            .ok_or_else(|| Error::Other("No folder given to rename".to_string()))?;
        Ok(Self {
            root,
            recursive: config.recursive,
            batch_size: config.batch_size,
            keyword: config.keyword.clone(),
            delay: config.delay()?,
            ignore_patterns: config.ignore_patterns.clone(),
            journal_path: config.journal_path.as_ref().map(PathBuf::from),
            dry_run: config.dry_run,
        })
    }
}

pub struct RenameEngine<G: NameGenerator> {
    options: RenameOptions,
    generator: G,
}

impl<G: NameGenerator> RenameEngine<G> {
    pub fn new(options: RenameOptions, generator: G) -> Self {
        Self { options, generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Run the full rename pipeline:
    /// 1. Enumerate files under the root
    /// 2. For each batch: prompt, generate, parse
    /// 3. Resolve and apply each mapped entry, journaling every outcome
    ///
    /// Only setup problems are returned as errors. Batch and entry failures
    /// are counted in the returned [`Summary`].
    pub fn run(&self, ctx: &RunContext<'_>) -> Result<Summary> {
        let options = &self.options;
        if !options.root.is_dir() {
            return Err(Error::NotADirectory(options.root.clone()));
        }
        let scheduler = BatchScheduler::new(options.batch_size, options.delay)?;

        let mut journal = match &options.journal_path {
            Some(path) => Some(Journal::create(path)?),
            None => None,
        };

        info!(
            "Enumerating {} ({})",
            options.root.display(),
            if options.recursive { "recursive" } else { "top level only" }
        );
        let ignore_pattern_slices: Vec<&str> =
            options.ignore_patterns.iter().map(|s| s.as_str()).collect();
        let mut entries =
            scanner::enumerate(&options.root, options.recursive, &ignore_pattern_slices)?;
        if let Some(journal) = &journal {
            exclude_path(&mut entries, journal.path());
        }

        let total_batches = scheduler.total_batches(entries.len());
        info!(
            "Found {} files, {} batches of up to {}",
            entries.len(),
            total_batches,
            scheduler.batch_size()
        );
        ctx.reporter.on_enumerated(entries.len(), total_batches);
        ctx.log(format!(
            "Found {} files in {} batches",
            entries.len(),
            total_batches
        ));
        if options.dry_run {
            ctx.log("Dry run: no files will be renamed");
        }

        let summary = scheduler.run(
            &entries,
            |batch| {
                let outcome = self.process_batch(batch, ctx, journal.as_mut());
                ctx.reporter.on_batch_complete(batch.number, &outcome);
                if batch.number < batch.total && !ctx.is_cancelled() && !options.delay.is_zero()
                {
                    ctx.reporter.on_delay(options.delay);
                }
                outcome
            },
            || ctx.is_cancelled(),
        );

        if summary.cancelled {
            info!("Run stopped by user after {} batches", summary.batches_run);
            ctx.log("Stopped by user");
        }
        info!(
            "Run finished in {:.2}s: {} renamed, {} skipped, {} failed, {} not renamed",
            summary.duration.as_secs_f64(),
            summary.renamed,
            summary.skipped,
            summary.failed,
            summary.unmapped,
        );
        ctx.reporter.on_run_complete(&summary);
        Ok(summary)
    }

    fn process_batch(
        &self,
        batch: Batch<'_>,
        ctx: &RunContext<'_>,
        mut journal: Option<&mut Journal>,
    ) -> BatchOutcome {
        info!(
            "Processing batch {}/{} ({} files)",
            batch.number,
            batch.total,
            batch.len()
        );
        ctx.reporter
            .on_batch_start(batch.number, batch.total, batch.len());

        let request = prompt::build(&batch, self.options.keyword.as_deref());
        debug!("Prompt for batch {}:\n{}", batch.number, request.prompt);

        let reply = match self.generator.generate(&request) {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    "Batch {}/{} failed, first file {}: {}",
                    batch.number,
                    batch.total,
                    batch
                        .get(1)
                        .map(FileEntry::display_name)
                        .unwrap_or_default(),
                    e
                );
                let reason = e.to_string();
                ctx.reporter.on_batch_failed(batch.number, &reason);
                for entry in batch.entries {
                    let outcome = RenameOutcome::Unmapped {
                        path: entry.absolute_path.clone(),
                    };
                    write_journal(&mut journal, batch.number, &outcome);
                }
                return BatchOutcome::failed(batch.len());
            }
        };
        debug!("Reply for batch {}:\n{}", batch.number, reply);

        let mapping = parser::parse(&reply, batch.len());
        if mapping.is_empty() {
            warn!("No usable names in reply for batch {}", batch.number);
            ctx.log(format!("Batch {}: no usable names in reply", batch.number));
        }

        let mut outcome = BatchOutcome::new(batch.len());
        for (i, entry) in batch.entries.iter().enumerate() {
            let result = match mapping.get(i + 1) {
                Some(raw_name) => {
                    let resolved = rename::resolve(entry, raw_name);
                    rename::apply(&resolved, self.options.dry_run)
                }
                None => {
                    info!("No name in reply for {}", entry.display_name());
                    RenameOutcome::Unmapped {
                        path: entry.absolute_path.clone(),
                    }
                }
            };
            outcome.record(&result);
            ctx.reporter.on_entry(&result);
            write_journal(&mut journal, batch.number, &result);
        }
        outcome
    }
}

fn write_journal(journal: &mut Option<&mut Journal>, batch: usize, outcome: &RenameOutcome) {
    if let Some(journal) = journal.as_deref_mut() {
        if let Err(e) = journal.record(batch, outcome) {
            warn!(
                "Could not write journal row for {}: {}",
                outcome.source().display(),
                e
            );
        }
    }
}

/// Drops the journal file itself from the candidates when it lives inside
/// the folder being renamed.
fn exclude_path(entries: &mut Vec<FileEntry>, path: &Path) {
    let Ok(target) = fs::canonicalize(path) else {
        return;
    };
    entries.retain(|entry| {
        fs::canonicalize(&entry.absolute_path)
            .map(|p| p != target)
            .unwrap_or(true)
    });
}
