//! Errors that abort a generation run
//!
//! Everything else (malformed records, unreadable files, dependency cycles,
//! exhausted solver budgets) is logged and contained where it happens.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the generation pipeline
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IR path is not a valid directory: {0}")]
    InvalidIrDirectory(PathBuf),

    #[error("No valid IR data loaded from {0}")]
    NoInput(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, GenerateError>;

impl GenerateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
