//! Cache-first corpus collection

use indicatif::ProgressBar;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};

use super::{extract_blocks, ContentError, ContentSource, Corpus, ExtractionConfig, PageContent, PageLabel};
use crate::timing::{NoopTelemetry, Stopwatch, Telemetry};

/// Outcome of collecting one domain's corpus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Content of every page that could be obtained
    pub corpus: Corpus,

    /// Pages fetched from the source
    pub fetched: usize,

    /// Pages served from the cache
    pub cached: usize,

    /// Pages that could not be fetched or parsed, with the reason
    pub failed: BTreeMap<PageLabel, String>,
}

/// Fetches and extracts page content, consulting a cache before every request
pub struct ContentCollector<'a, C> {
    source: &'a C,
    config: &'a ExtractionConfig,
    telemetry: &'a dyn Telemetry,
    progress: Option<ProgressBar>,
}

impl<'a, C: ContentSource> ContentCollector<'a, C> {
    pub fn new(source: &'a C, config: &'a ExtractionConfig) -> Self {
        Self {
            source,
            config,
            telemetry: &NoopTelemetry,
            progress: None,
        }
    }

    /// Report per-page fetch timings to `telemetry`
    pub fn with_telemetry(mut self, telemetry: &'a dyn Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Advance `progress` once per page
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Fetch and extract one page, bypassing any cache
    pub async fn fetch_page(&self, title: &str) -> Result<PageContent, ContentError> {
        let html = self.source.fetch_html(title).await?;
        extract_blocks(&html, self.config)
    }

    /// Collect the content of `pages`
    ///
    /// Pages present in `cache` are never requested. Freshly fetched pages
    /// are added to `cache` so later domains reuse them.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub async fn collect(&self, pages: &[PageLabel], cache: &mut Corpus) -> CollectReport {
        let mut report = CollectReport::default();
        let mut seen = HashSet::new();

        if let Some(progress) = &self.progress {
            progress.set_length(pages.len() as u64);
        }

        for page in pages {
            if let Some(progress) = &self.progress {
                progress.inc(1);
                progress.set_message(page.clone());
            }
            if !seen.insert(page.as_str()) {
                continue;
            }

            if let Some(content) = cache.get(page) {
                debug!("Using cached content for '{}'", page);
                report.corpus.insert(page.clone(), content.clone());
                report.cached += 1;
                continue;
            }

            let watch = Stopwatch::start();
            let result = self.fetch_page(page).await;
            watch.stop_and_record(self.telemetry, "content", page);

            match result {
                Ok(content) => {
                    report.fetched += 1;
                    cache.insert(page.clone(), content.clone());
                    report.corpus.insert(page.clone(), content);
                }
                Err(e) => {
                    warn!("Skipping page '{}': {}", page, e);
                    report.failed.insert(page.clone(), e.to_string());
                }
            }
        }

        info!(
            "Collected {} pages ({} fetched, {} cached, {} failed)",
            report.corpus.len(),
            report.fetched,
            report.cached,
            report.failed.len()
        );
        report
    }
}
