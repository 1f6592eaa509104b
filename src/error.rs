//! Error types for bulk processing.
//!
//! Only run-level failures surface as [`BulkError`]. Remote API failures stay
//! inside the item that raised them and never reach this type.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("Filesystem error at '{}': {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BulkError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// True for errors detected before any filesystem work began.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<config::ConfigError> for BulkError {
    fn from(error: config::ConfigError) -> Self {
        BulkError::Configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BulkError>;
