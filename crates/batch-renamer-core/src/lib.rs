pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod generator;
pub mod journal;
pub mod model;
pub mod parser;
pub mod progress;
pub mod prompt;
pub mod rename;
pub mod scanner;
pub mod scheduler;

pub use config::AppConfig;
pub use context::{CancelToken, RunContext};
pub use engine::{RenameEngine, RenameOptions};
pub use error::{Error, Result};
pub use generator::{NameGenerator, OpenAiCompatibleGenerator};
pub use model::{Batch, BatchOutcome, FileEntry, RenameOutcome, ResolvedRename, Summary};
pub use progress::{ChannelReporter, ProgressEvent, ProgressReporter, SilentReporter};
