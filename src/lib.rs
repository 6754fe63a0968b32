//! # taxocorpus - Topic-Scoped Corpora from Encyclopedia Categories
//!
//! This crate builds a text corpus for a set of seed domains by walking the
//! category graph of a MediaWiki encyclopedia. Category discovery and
//! filtering are the core; page listing and content extraction are plumbing
//! around it.
//!
//! ## Features
//!
//! - Degree-bounded breadth-first category tree construction
//! - Exact and substring blacklists, per domain or for every domain
//! - Filtering while building or as a separate two-phase pass
//! - Per-domain taxonomies, copied or sharing entries between domains
//! - Paginated page enumeration that reports partial listings
//! - Section-aware content extraction from rendered pages
//! - Resumable runs: saved content is never fetched again
//! - Injected timing telemetry
//!
//! ## Example
//!
//! ```rust,no_run
//! use taxocorpus::category::{Blacklist, BlacklistRules};
//! use taxocorpus::pipeline::{Pipeline, PipelineConfig, Stage};
//! use taxocorpus::source::{MediaWikiClient, SourceConfig};
//! use taxocorpus::timing::TracingTelemetry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .seeds(["Códigos jurídicos"])
//!         .degree(1)
//!         .blacklists(BlacklistRules::global(Blacklist::new(["Sharia"], ["por país"])))
//!         .build();
//!
//!     let client = MediaWikiClient::new(SourceConfig::default())?;
//!     let report = Pipeline::new(&config, &client)
//!         .with_telemetry(&TracingTelemetry)
//!         .run(Stage::Content)
//!         .await?;
//!
//!     println!("Wrote {} files", report.files.len());
//!     Ok(())
//! }
//! ```

mod error;

pub mod category;
pub mod content;
pub mod pages;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod timing;

pub use error::{Error, Result};

/// Re-export of the types most runs need
pub mod prelude {
    pub use crate::category::{
        Blacklist, BlacklistRules, CategoryLabel, CategoryTree, FilterMode, Taxonomy, TaxonomyMode,
    };
    pub use crate::content::{Corpus, ExtractionConfig, PageContent, PageLabel};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::pipeline::{Pipeline, PipelineConfig, RunReport, Stage};
    pub use crate::source::{MediaWikiClient, MembershipSource, SourceConfig};
    pub use crate::timing::{Stopwatch, Telemetry, TracingTelemetry};
}
