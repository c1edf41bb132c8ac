//! Error types for the livesweep-scan crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("No valid ranges found in {}", path.display())]
    NoRanges { path: PathBuf },

    #[error("Failed to persist results to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
