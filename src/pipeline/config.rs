//! # Pipeline Configuration Module
//!
//! Everything a corpus run needs, supplied up front: seeds, traversal degree,
//! blacklist rules, extraction rules, output layout and source settings. A
//! configuration can be built in code with [`PipelineConfigBuilder`] or read
//! from a JSON file; absent fields take their defaults.
//!
//! ```json
//! {
//!   "seeds": ["Códigos jurídicos"],
//!   "degree": 1,
//!   "blacklists": { "*": { "exact": ["Sharia"], "substrings": ["por país"] } }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::category::{BlacklistRules, CategoryLabel, FilterMode, TaxonomyMode};
use crate::content::ExtractionConfig;
use crate::error::Error as CrateError;
use crate::source::SourceConfig;
use crate::storage::StorageConfig;

/// Error type for configuration loading and validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for CrateError {
    fn from(err: ConfigError) -> Self {
        CrateError::Config(err.to_string())
    }
}

/// Configuration of a corpus run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seed domains, each owning one taxonomy
    pub seeds: Vec<CategoryLabel>,

    /// Maximum depth expanded below each seed (inclusive)
    pub degree: usize,

    /// Whether blacklists also prune expansion
    pub filter_mode: FilterMode,

    /// Per-domain and wildcard blacklists
    pub blacklists: BlacklistRules,

    /// How overlapping taxonomies are materialized
    pub taxonomy_mode: TaxonomyMode,

    /// Section and list rules for content extraction
    pub extraction: ExtractionConfig,

    /// Directory for every artifact file
    pub output: PathBuf,

    /// First component of every artifact file name
    pub prefix: String,

    /// Encyclopedia endpoint and request settings
    pub source: SourceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let storage = StorageConfig::default();
        Self {
            seeds: Vec::new(),
            degree: 2,
            filter_mode: FilterMode::default(),
            blacklists: BlacklistRules::default(),
            taxonomy_mode: TaxonomyMode::default(),
            extraction: ExtractionConfig::default(),
            output: storage.base_path,
            prefix: storage.prefix,
            source: SourceConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Read a configuration from a JSON file
    pub async fn read_config(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&config)?)
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seeds.is_empty() {
            return Err(ConfigError::Invalid("at least one seed is required".into()));
        }
        if let Some(seed) = self.seeds.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("blank seed '{}'", seed)));
        }
        if self.prefix.is_empty() {
            return Err(ConfigError::Invalid("file name prefix is empty".into()));
        }
        Ok(())
    }

    /// Storage layout described by this configuration
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            base_path: self.output.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Set the seed domains
    pub fn seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CategoryLabel>,
    {
        self.config.seeds = seeds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the traversal degree
    pub fn degree(mut self, degree: usize) -> Self {
        self.config.degree = degree;
        self
    }

    pub fn filter_mode(mut self, filter_mode: FilterMode) -> Self {
        self.config.filter_mode = filter_mode;
        self
    }

    /// Set the blacklist rules
    pub fn blacklists(mut self, blacklists: BlacklistRules) -> Self {
        self.config.blacklists = blacklists;
        self
    }

    pub fn taxonomy_mode(mut self, taxonomy_mode: TaxonomyMode) -> Self {
        self.config.taxonomy_mode = taxonomy_mode;
        self
    }

    /// Set the content extraction rules
    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.config.extraction = extraction;
        self
    }

    /// Set the output directory
    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.config.output = output.into();
        self
    }

    /// Set the file name prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Set the source settings
    pub fn source(mut self, source: SourceConfig) -> Self {
        self.config.source = source;
        self
    }

    /// Build the configuration
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
