//! # Source Configuration Module
//!
//! Connection settings for the encyclopedia API: endpoint, category namespace
//! prefix, page size for paginated listings, politeness controls.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://es.wikipedia.org/w/api.php";

/// Default namespace prefix of category titles
pub const DEFAULT_CATEGORY_PREFIX: &str = "Categoría:";

/// Largest listing page the API serves to regular clients
pub const MAX_PAGE_SIZE: u32 = 500;

/// Configuration for the API client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// API endpoint
    pub endpoint: String,

    /// Namespace prefix prepended to category labels in requests and stripped
    /// from subcategory titles in responses
    pub category_prefix: String,

    /// Number of members requested per listing page
    pub page_size: u32,

    /// User agent to use for requests
    pub user_agent: String,

    /// Request timeout in seconds, `None` waits indefinitely
    pub timeout_secs: Option<u64>,

    /// Client-side request budget per minute, `None` disables limiting
    pub requests_per_minute: Option<u32>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            category_prefix: DEFAULT_CATEGORY_PREFIX.to_string(),
            page_size: MAX_PAGE_SIZE,
            user_agent: format!("taxocorpus/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: Some(120),
            requests_per_minute: None,
        }
    }
}

impl SourceConfig {
    /// Get the timeout as a Duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Page size clamped to the range the API accepts
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SourceConfig =
            serde_json::from_str(r#"{"endpoint": "https://en.wikipedia.org/w/api.php", "category_prefix": "Category:"}"#)
                .unwrap();

        assert_eq!(config.category_prefix, "Category:");
        assert_eq!(config.page_size, MAX_PAGE_SIZE);
        assert_eq!(config.timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_page_size_is_clamped() {
        let config = SourceConfig {
            page_size: 5000,
            ..Default::default()
        };
        assert_eq!(config.effective_page_size(), MAX_PAGE_SIZE);

        let config = SourceConfig {
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_page_size(), 1);
    }
}
