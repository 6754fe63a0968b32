//! Error types for the source module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for category membership and page content requests
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP client error, including non-success status codes and timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error envelope
    #[error("API error: {code} - {info}")]
    Api {
        /// Machine-readable error code
        code: String,
        /// Human-readable description
        info: String,
    },

    /// The response did not have the expected shape
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// HTTP client could not be constructed
    #[error("Client setup error: {0}")]
    Setup(String),
}

impl From<SourceError> for CrateError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Http(e) => CrateError::Http(e),
            _ => CrateError::Source(err.to_string()),
        }
    }
}
