//! Error types for the content module

use crate::error::Error as CrateError;
use crate::source::SourceError;
use thiserror::Error;

/// Error type for page content operations
#[derive(Debug, Error)]
pub enum ContentError {
    /// The page could not be fetched
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// HTML parsing error
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),
}

impl From<ContentError> for CrateError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Source(e) => e.into(),
            ContentError::HtmlParse(_) => CrateError::Content(err.to_string()),
        }
    }
}
