//! Error types for the core domain.

use std::path::PathBuf;
use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load stock pages from {}: {source}", .path.display())]
    StockPages {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
