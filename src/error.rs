//! Error types for the taxocorpus crate

use thiserror::Error;

/// Result type for taxocorpus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for taxocorpus operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Category membership source error
    #[error("Source error: {0}")]
    Source(String),

    /// Page content error
    #[error("Content error: {0}")]
    Content(String),

    /// Persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
