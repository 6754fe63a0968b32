//! # Extraction Configuration Module
//!
//! Controls which parts of a rendered page become text blocks:
//!
//! - heading anchor ids whose sections are skipped entirely
//! - list item texts that end the enclosing list
//! - CSS selectors for elements dropped before extraction

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration for content extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Anchor ids of headings whose sections are skipped
    pub header_blacklist: BTreeSet<String>,

    /// List item texts at which the enclosing list is cut off
    pub list_truncation_markers: BTreeSet<String>,

    /// CSS selectors for elements to exclude, with everything inside them
    pub exclude_selectors: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            header_blacklist: [
                "Referencias",
                "Notas",
                "Bibliografía",
                "Véase_también",
                "Enlaces_externos",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            list_truncation_markers: BTreeSet::new(),
            exclude_selectors: vec![
                ".mw-editsection".to_string(),
                "#toc".to_string(),
                ".toc".to_string(),
                ".navbox".to_string(),
                "style".to_string(),
                "script".to_string(),
            ],
        }
    }
}

impl ExtractionConfig {
    /// Create a builder with default configuration
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::new()
    }
}

/// Builder for ExtractionConfig
#[derive(Debug, Default)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ExtractionConfig::default(),
        }
    }

    /// Set the heading anchor ids whose sections are skipped
    pub fn header_blacklist<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.header_blacklist = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the list item texts that cut off their list
    pub fn list_truncation_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.list_truncation_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the CSS selectors for elements to exclude
    pub fn exclude_selectors(mut self, selectors: Vec<String>) -> Self {
        self.config.exclude_selectors = selectors;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ExtractionConfig {
        self.config
    }
}
