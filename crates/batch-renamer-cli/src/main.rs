mod commands;
mod logging;
mod progress;

use std::env;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, Context};
use batch_renamer_core::config::{self, AppConfig};
use batch_renamer_core::generator::KNOWN_MODELS;
use batch_renamer_core::journal;
use batch_renamer_core::{
    CancelToken, ChannelReporter, OpenAiCompatibleGenerator, RenameEngine, RenameOptions,
    RunContext, Summary,
};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, RunArgs};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{info, warn};

/// Fallback variable for the credential, as used by the default endpoint.
const FALLBACK_API_KEY_VAR: &str = "DASHSCOPE_API_KEY";

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => config::load_configuration_file(path)
            .with_context(|| format!("Error loading configuration from {}", path.display()))?,
        None => config::load_configuration().context("Error loading configuration")?,
    };

    match args.command {
        Some(Commands::Run(run_args)) => run_rename(config, &run_args)?,
        Some(Commands::Undo { journal, dry_run }) => run_undo(&journal, dry_run)?,
        Some(Commands::PrintConfig) => print_config(&config),
        Some(Commands::ListModels) => list_models(&config),
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_rename(mut config: AppConfig, args: &RunArgs) -> anyhow::Result<()> {
    args.apply_to(&mut config);
    if config.api_key.is_none() {
        config.api_key = env::var(FALLBACK_API_KEY_VAR).ok();
    }

    let generator = OpenAiCompatibleGenerator::from_config(&config).with_context(|| {
        format!(
            "Set RENAMER_API_KEY or {} in the environment or .env, or pass --api-key",
            FALLBACK_API_KEY_VAR
        )
    })?;
    let options = RenameOptions::from_config(&config, None)?;
    let dry_run = options.dry_run;

    info!(
        "Renaming files in {} with model {}",
        options.root.display(),
        generator.model()
    );
    eprintln!(
        "  Type {} and press Enter to stop after the current batch.",
        "q".bold()
    );

    let cancel = CancelToken::new();
    spawn_stop_watcher(cancel.clone());

    let (sender, receiver) = mpsc::channel();
    let worker_cancel = cancel.clone();
    let worker = thread::spawn(move || {
        let reporter = ChannelReporter::new(sender);
        let engine = RenameEngine::new(options, generator);
        engine.run(&RunContext::new(worker_cancel, &reporter))
    });

    let reporter = CliReporter::new();
    for event in receiver {
        event.dispatch(&reporter);
    }

    let summary = worker
        .join()
        .map_err(|_| anyhow!("Rename worker panicked"))?
        .context("Rename run failed")?;
    print_summary(&summary, dry_run);

    Ok(())
}

/// Cancels the run when `q` or `stop` is entered on stdin.
fn spawn_stop_watcher(cancel: CancelToken) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                return;
            };
            let command = line.trim().to_lowercase();
            if command == "q" || command == "stop" {
                warn!("Stop requested, finishing the current batch");
                cancel.cancel();
                return;
            }
        }
    });
}

fn print_summary(summary: &Summary, dry_run: bool) {
    println!();
    let renamed_label = if dry_run { "would be renamed" } else { "renamed" };
    println!(
        "{} {}, {} skipped, {} failed, {} not renamed",
        summary.renamed.to_string().green(),
        renamed_label,
        summary.skipped.to_string().yellow(),
        summary.failed.to_string().red(),
        summary.unmapped.to_string().dimmed(),
    );
    println!(
        "{} of {} files in {}/{} batches ({} failed) in {}",
        summary.processed,
        summary.total_files,
        summary.batches_run,
        summary.total_batches,
        summary.failed_batches,
        format!("{:.2}s", summary.duration.as_secs_f64()).green(),
    );
    if summary.cancelled {
        println!("{}", "Stopped before all batches were processed.".yellow());
    }
}

fn run_undo(journal_path: &Path, dry_run: bool) -> anyhow::Result<()> {
    info!("Undoing renames from {}", journal_path.display());
    let summary = journal::undo(journal_path, dry_run)
        .with_context(|| format!("Could not undo {}", journal_path.display()))?;

    let label = if dry_run { "would be restored" } else { "restored" };
    println!(
        "{} {}, {} could not be restored",
        summary.reverted.to_string().green(),
        label,
        summary.failed.to_string().red()
    );
    Ok(())
}

fn print_config(config: &AppConfig) {
    let unset = || "(not set)".to_string();
    println!("root_path:            {}", config.root_path.clone().unwrap_or_else(unset));
    println!("recursive:            {}", config.recursive);
    println!("batch_size:           {}", config.batch_size);
    println!("keyword:              {}", config.keyword.clone().unwrap_or_else(unset));
    println!("delay_secs:           {}", config.delay_secs);
    println!("model:                {}", config.model);
    println!("api_base:             {}", config.api_base);
    println!("api_key:              {}", config.masked_api_key().unwrap_or_else(unset));
    println!("temperature:          {}", config.temperature);
    println!("request_timeout_secs: {}", config.request_timeout_secs);
    println!("ignore_patterns:      {:?}", config.ignore_patterns);
    println!("journal_path:         {}", config.journal_path.clone().unwrap_or_else(unset));
    println!("dry_run:              {}", config.dry_run);
}

fn list_models(config: &AppConfig) {
    for (model, description) in KNOWN_MODELS {
        let marker = if *model == config.model { "*" } else { " " };
        println!("{} {:<12} {}", marker.green(), model.cyan(), description);
    }
}
