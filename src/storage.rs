//! # Artifact Storage
//!
//! Persists per-domain artifacts as JSON files under one output directory.
//! Every file is named `{prefix}_{kind}_{domain}_{degree}.json`, where the
//! domain is lowercased with spaces replaced by underscores, and holds a single
//! object keyed by the domain label:
//!
//! ```json
//! { "Códigos jurídicos": { "Códigos jurídicos": ["Código Civil"] } }
//! ```
//!
//! Taxonomy, blacklist and page files are rewritten on every run. Content files
//! are written once and never overwritten, and all of them together form the
//! page cache consulted before any content request.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::{io, str::FromStr};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::content::Corpus;
use crate::error::Error as CrateError;

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding every artifact file
    pub base_path: PathBuf,

    /// First component of every file name
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("data"),
            prefix: "wiki".to_string(),
        }
    }
}

/// Kind of a persisted artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Taxonomy,
    Blacklist,
    Pages,
    Content,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Taxonomy => "taxonomy",
            ArtifactKind::Blacklist => "blacklist",
            ArtifactKind::Pages => "pages",
            ArtifactKind::Content => "content",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "taxonomy" => Ok(ArtifactKind::Taxonomy),
            "blacklist" => Ok(ArtifactKind::Blacklist),
            "pages" => Ok(ArtifactKind::Pages),
            "content" => Ok(ArtifactKind::Content),
            other => Err(StorageError::UnknownKind(other.to_string())),
        }
    }
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown artifact kind: {0}")]
    UnknownKind(String),
}

impl From<StorageError> for CrateError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => CrateError::Io(e),
            StorageError::Json(e) => CrateError::Json(e),
            other => CrateError::Storage(other.to_string()),
        }
    }
}

type Result<T> = std::result::Result<T, StorageError>;

/// Lowercase a domain label and replace its spaces and path separators with
/// underscores
pub fn normalize_domain(domain: &str) -> String {
    domain
        .replace([' ', '/', '\\'], "_")
        .to_lowercase()
}

/// Storage manager for per-domain artifacts
#[derive(Debug, Clone, Default)]
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a storage with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// File name of one artifact
    pub fn file_name(&self, kind: ArtifactKind, domain: &str, degree: usize) -> String {
        format!(
            "{}_{}_{}_{}.json",
            self.config.prefix,
            kind,
            normalize_domain(domain),
            degree
        )
    }

    /// Full path of one artifact
    pub fn path(&self, kind: ArtifactKind, domain: &str, degree: usize) -> PathBuf {
        self.config.base_path.join(self.file_name(kind, domain, degree))
    }

    /// Whether the artifact file exists
    pub async fn exists(&self, kind: ArtifactKind, domain: &str, degree: usize) -> Result<bool> {
        Ok(fs::try_exists(self.path(kind, domain, degree)).await?)
    }

    /// Write `artifact` as `{domain: artifact}`, replacing any previous file
    pub async fn save<T: Serialize + ?Sized>(
        &self,
        kind: ArtifactKind,
        domain: &str,
        degree: usize,
        artifact: &T,
    ) -> Result<PathBuf> {
        let path = self.path(kind, domain, degree);
        fs::create_dir_all(&self.config.base_path).await?;

        let keyed = BTreeMap::from([(domain, artifact)]);
        fs::write(&path, serde_json::to_string_pretty(&keyed)?).await?;

        debug!("Saved {} of '{}' to {}", kind, domain, path.display());
        Ok(path)
    }

    /// Read the artifact stored under `domain`
    pub async fn load<T: DeserializeOwned>(
        &self,
        kind: ArtifactKind,
        domain: &str,
        degree: usize,
    ) -> Result<T> {
        let path = self.path(kind, domain, degree);
        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(path.display().to_string()));
        }
        read_keyed::<T>(&path)
            .await?
            .remove(domain)
            .ok_or_else(|| StorageError::NotFound(format!("'{}' in {}", domain, path.display())))
    }

    /// Write the corpus of `domain` unless its content file already exists
    ///
    /// Returns whether a file was written.
    pub async fn save_content(&self, domain: &str, degree: usize, corpus: &Corpus) -> Result<bool> {
        if self.exists(ArtifactKind::Content, domain, degree).await? {
            info!("Content of '{}' already saved, leaving it untouched", domain);
            return Ok(false);
        }
        self.save(ArtifactKind::Content, domain, degree, corpus).await?;
        Ok(true)
    }

    /// Merge every saved corpus into one cache keyed by page label
    ///
    /// Files that cannot be read or parsed are logged and skipped.
    pub async fn load_corpus_cache(&self) -> Result<Corpus> {
        let mut cache = Corpus::new();
        if !fs::try_exists(&self.config.base_path).await? {
            return Ok(cache);
        }

        let content_prefix = format!("{}_{}_", self.config.prefix, ArtifactKind::Content);
        let mut dir_entries = fs::read_dir(&self.config.base_path).await?;

        while let Some(entry) = dir_entries.next_entry().await? {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
                continue;
            };
            if !file_name.starts_with(&content_prefix) || !file_name.ends_with(".json") {
                continue;
            }

            match read_keyed::<Corpus>(&path).await {
                Ok(corpora) => {
                    for (_, corpus) in corpora {
                        cache.merge(corpus);
                    }
                }
                Err(e) => warn!("Failed to load cached content {}: {}", path.display(), e),
            }
        }

        info!("Loaded {} cached pages", cache.len());
        Ok(cache)
    }
}

async fn read_keyed<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>> {
    let json = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json)?)
}
