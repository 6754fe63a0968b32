//! # Corpus Pipeline
//!
//! Drives a full run from seeds to saved artifacts:
//!
//! 1. expand every seed into one shared category tree
//! 2. filter the tree with each domain's effective blacklist
//! 3. extract each domain's taxonomy and save it with the blacklist partition
//! 4. enumerate the pages of every taxonomy category and save them
//! 5. collect page content, cache first, and save it unless already saved
//!
//! Each phase is timed with a [`Stopwatch`] and reported to the injected
//! [`Telemetry`]. A run can stop after any [`Stage`].

mod config;

pub use config::{ConfigError, PipelineConfig, PipelineConfigBuilder};

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::category::{
    partition_domain, BuildReport, CategoryTree, FilterMode, Partition, Taxonomy, TaxonomyExtractor,
    TreeBuilder,
};
use crate::content::{CollectReport, ContentCollector, ContentSource, Corpus};
use crate::error::Result;
use crate::pages::{CategoryPages, PageEnumerator, PagesReport};
use crate::source::MembershipSource;
use crate::storage::{ArtifactKind, Storage};
use crate::timing::{NoopTelemetry, Stopwatch, Telemetry};

/// Last phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Taxonomies and blacklist partitions
    Categories,
    /// Also the page lists of every taxonomy category
    Pages,
    /// Also the content of every listed page
    Content,
}

/// What happened to a domain's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOutcome {
    /// A content file already existed; nothing was fetched or written
    AlreadySaved,
    /// Content was collected and saved
    Collected(CollectReport),
}

/// Results for one seed domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    pub taxonomy: Taxonomy,
    pub partition: Partition,
    pub pages: Option<PagesReport>,
    pub content: Option<ContentOutcome>,
}

/// Results of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// The tree shared by every domain, before filtering
    pub tree: CategoryTree,

    pub build: BuildReport,

    /// One report per seed, in seed order
    pub domains: Vec<DomainReport>,

    /// Every file written
    pub files: Vec<PathBuf>,
}

impl RunReport {
    pub fn domain(&self, domain: &str) -> Option<&DomainReport> {
        self.domains.iter().find(|d| d.taxonomy.domain == domain)
    }
}

/// Runs the corpus phases against one source
pub struct Pipeline<'a, S> {
    config: &'a PipelineConfig,
    source: &'a S,
    storage: Storage,
    telemetry: &'a dyn Telemetry,
    progress: Option<ProgressStyle>,
}

impl<'a, S> Pipeline<'a, S>
where
    S: MembershipSource + ContentSource,
{
    pub fn new(config: &'a PipelineConfig, source: &'a S) -> Self {
        Self {
            config,
            source,
            storage: Storage::with_config(config.storage_config()),
            telemetry: &NoopTelemetry,
            progress: None,
        }
    }

    /// Report phase and request timings to `telemetry`
    pub fn with_telemetry(mut self, telemetry: &'a dyn Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Show page and content progress with `style`
    pub fn with_progress(mut self, style: ProgressStyle) -> Self {
        self.progress = Some(style);
        self
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Expand every seed into one tree
    ///
    /// In [`FilterMode::InPlace`] each seed is expanded with its own effective
    /// blacklist.
    #[instrument(skip(self), fields(degree = self.config.degree))]
    pub async fn build_tree(&self) -> (CategoryTree, BuildReport) {
        let mut builder =
            TreeBuilder::new(self.source, self.config.degree).with_telemetry(self.telemetry);

        for seed in &self.config.seeds {
            let blacklist = match self.config.filter_mode {
                FilterMode::InPlace => Some(self.config.blacklists.for_domain(seed)),
                FilterMode::Deferred => None,
            };
            let watch = Stopwatch::start();
            builder.expand(seed, blacklist.as_ref()).await;
            watch.stop_and_record(self.telemetry, "expand", seed);
        }

        builder.finish()
    }

    /// Filter `tree` per domain and extract each domain's taxonomy
    pub fn extract(&self, tree: &CategoryTree) -> Vec<(Taxonomy, Partition)> {
        let mut extractor = TaxonomyExtractor::new(self.config.taxonomy_mode);

        self.config
            .seeds
            .iter()
            .map(|domain| {
                let watch = Stopwatch::start();
                let partition =
                    partition_domain(tree, domain, &self.config.blacklists.for_domain(domain));
                watch.stop_and_record(self.telemetry, "filter", domain);

                let watch = Stopwatch::start();
                let taxonomy = extractor.extract(&partition.whitelist, domain);
                watch.stop_and_record(self.telemetry, "taxonomy", domain);

                (taxonomy, partition)
            })
            .collect()
    }

    /// Run every phase up to and including `stage`
    #[instrument(skip(self), fields(seeds = self.config.seeds.len(), degree = self.config.degree))]
    pub async fn run(&self, stage: Stage) -> Result<RunReport> {
        self.config.validate()?;
        let watch = Stopwatch::start();
        let degree = self.config.degree;

        let mut cache = if stage >= Stage::Content {
            self.storage.load_corpus_cache().await?
        } else {
            Corpus::new()
        };

        let (tree, build) = self.build_tree().await;
        let mut report = RunReport {
            build,
            ..Default::default()
        };

        for (taxonomy, partition) in self.extract(&tree) {
            let domain = taxonomy.domain.clone();
            report.files.push(
                self.storage
                    .save(ArtifactKind::Taxonomy, &domain, degree, &taxonomy.categories)
                    .await?,
            );
            report.files.push(
                self.storage
                    .save(ArtifactKind::Blacklist, &domain, degree, &partition.blacklist)
                    .await?,
            );

            let mut domain_report = DomainReport {
                taxonomy,
                partition,
                pages: None,
                content: None,
            };

            if stage >= Stage::Pages {
                let pages = self.enumerate(&domain_report.taxonomy).await;
                report.files.push(
                    self.storage
                        .save(ArtifactKind::Pages, &domain, degree, &pages.pages)
                        .await?,
                );

                if stage >= Stage::Content {
                    let outcome = self.collect(&domain, &pages.pages, &mut cache).await?;
                    if matches!(outcome, ContentOutcome::Collected(_)) {
                        report
                            .files
                            .push(self.storage.path(ArtifactKind::Content, &domain, degree));
                    }
                    domain_report.content = Some(outcome);
                }
                domain_report.pages = Some(pages);
            }

            report.domains.push(domain_report);
        }

        report.tree = tree;
        let elapsed = watch.stop_and_record(self.telemetry, "run", &self.config.seeds.join(", "));
        info!(
            "Run finished in {:.2} secs: {} domains, {} files written",
            elapsed.as_secs_f64(),
            report.domains.len(),
            report.files.len()
        );
        Ok(report)
    }

    async fn enumerate(&self, taxonomy: &Taxonomy) -> PagesReport {
        let mut enumerator = PageEnumerator::new(self.source).with_telemetry(self.telemetry);
        let progress = self.progress_bar(&taxonomy.domain);
        if let Some(bar) = &progress {
            enumerator = enumerator.with_progress(bar.clone());
        }

        let watch = Stopwatch::start();
        let pages = enumerator.enumerate(&taxonomy.labels()).await;
        watch.stop_and_record(self.telemetry, "enumerate", &taxonomy.domain);

        if let Some(bar) = progress {
            bar.finish_with_message("pages listed");
        }
        pages
    }

    async fn collect(
        &self,
        domain: &str,
        pages: &CategoryPages,
        cache: &mut Corpus,
    ) -> Result<ContentOutcome> {
        let degree = self.config.degree;
        if self.storage.exists(ArtifactKind::Content, domain, degree).await? {
            info!("Content of '{}' already saved, skipping", domain);
            return Ok(ContentOutcome::AlreadySaved);
        }

        let mut collector = ContentCollector::new(self.source, &self.config.extraction)
            .with_telemetry(self.telemetry);
        let progress = self.progress_bar(domain);
        if let Some(bar) = &progress {
            collector = collector.with_progress(bar.clone());
        }

        let watch = Stopwatch::start();
        let collected = collector.collect(&pages.page_labels(), cache).await;
        watch.stop_and_record(self.telemetry, "collect", domain);

        if let Some(bar) = progress {
            bar.finish_with_message("content collected");
        }

        self.storage.save_content(domain, degree, &collected.corpus).await?;
        Ok(ContentOutcome::Collected(collected))
    }

    fn progress_bar(&self, domain: &str) -> Option<ProgressBar> {
        self.progress.as_ref().map(|style| {
            ProgressBar::new(0)
                .with_style(style.clone())
                .with_prefix(domain.to_string())
        })
    }
}
