use batch_renamer_core::AppConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "batch-renamer")]
#[command(about = "Rename files in batches with names suggested by a language model", long_about = None)]
pub struct Cli {
    /// Read settings from this file instead of `Config.*` in the working directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rename the files in a folder
    Run(RunArgs),
    /// Reverse the renames recorded in a journal
    Undo {
        /// Journal written by a previous run
        journal: PathBuf,
        /// Only report what would be restored
        #[arg(long)]
        dry_run: bool,
    },
    /// Print configuration values
    PrintConfig,
    /// List the models offered by the default endpoint
    ListModels,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Folder whose files should be renamed (defaults to `root_path` from config)
    pub folder: Option<PathBuf>,
    /// Include files in subfolders
    #[arg(short, long)]
    pub recursive: bool,
    /// Files per request
    #[arg(short, long)]
    pub batch_size: Option<usize>,
    /// Build every name around this keyword instead of the original name
    #[arg(short, long)]
    pub keyword: Option<String>,
    /// Pause between batches, in seconds
    #[arg(long)]
    pub delay_secs: Option<f64>,
    /// Model id to ask for names
    #[arg(short, long)]
    pub model: Option<String>,
    /// API key (otherwise RENAMER_API_KEY or DASHSCOPE_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
    /// Ask for names and report them without renaming anything
    #[arg(long)]
    pub dry_run: bool,
    /// Write a CSV journal of every outcome to this path
    #[arg(long)]
    pub journal: Option<PathBuf>,
}

impl RunArgs {
    /// Layers the flags that were given on top of `config`.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(folder) = &self.folder {
            config.root_path = Some(folder.to_string_lossy().into_owned());
        }
        if self.recursive {
            config.recursive = true;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(keyword) = &self.keyword {
            config.keyword = Some(keyword.clone());
        }
        if let Some(delay_secs) = self.delay_secs {
            config.delay_secs = delay_secs;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if let Some(journal) = &self.journal {
            config.journal_path = Some(journal.to_string_lossy().into_owned());
        }
    }
}
