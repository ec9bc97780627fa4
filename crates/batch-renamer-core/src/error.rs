use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("No API key configured for the generation service")]
    MissingCredential,

    #[error("Generation service error: {0}")]
    Generation(String),

    #[error("Journal error: {0}")]
    Journal(#[from] csv::Error),

    #[error("No free name for {} after {attempts} attempts", .target.display())]
    Collision { target: PathBuf, attempts: u32 },

    #[error("Run cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Generation(format!("request timed out: {}", err))
        } else {
            Error::Generation(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
