//! # Page Enumeration
//!
//! Lists the direct member pages of every category of a taxonomy. Pages are
//! not followed into subcategories; the taxonomy already names every category
//! whose pages belong to the domain.

use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, instrument, warn};

use crate::category::CategoryLabel;
use crate::content::PageLabel;
use crate::source::{ListingStatus, MemberKind, MembershipSource};
use crate::timing::{NoopTelemetry, Stopwatch, Telemetry};

/// Direct member pages of each category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryPages {
    entries: BTreeMap<CategoryLabel, Vec<PageLabel>>,
}

impl CategoryPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: impl Into<CategoryLabel>, pages: Vec<PageLabel>) {
        self.entries.insert(category.into(), pages);
    }

    pub fn get(&self, category: &str) -> Option<&[PageLabel]> {
        self.entries.get(category).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, CategoryLabel, Vec<PageLabel>> {
        self.entries.iter()
    }

    /// Every listed page once, in category order then listing order
    pub fn page_labels(&self) -> Vec<PageLabel> {
        let mut seen = HashSet::new();
        self.entries
            .values()
            .flatten()
            .filter(|page| seen.insert(page.as_str()))
            .cloned()
            .collect()
    }
}

/// Outcome of enumerating pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagesReport {
    pub pages: CategoryPages,

    /// Categories whose page listing ended early, with how it ended
    pub incomplete: BTreeMap<CategoryLabel, ListingStatus>,
}

/// Lists member pages category by category
pub struct PageEnumerator<'a, S> {
    source: &'a S,
    telemetry: &'a dyn Telemetry,
    progress: Option<ProgressBar>,
}

impl<'a, S: MembershipSource> PageEnumerator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            telemetry: &NoopTelemetry,
            progress: None,
        }
    }

    /// Report per-category listing timings to `telemetry`
    pub fn with_telemetry(mut self, telemetry: &'a dyn Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Advance `progress` once per category
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// List the pages of each of `categories`; repeated labels are listed once
    #[instrument(skip_all, fields(categories = categories.len()))]
    pub async fn enumerate(&self, categories: &[CategoryLabel]) -> PagesReport {
        let mut report = PagesReport::default();

        if let Some(progress) = &self.progress {
            progress.set_length(categories.len() as u64);
        }

        for category in categories {
            if let Some(progress) = &self.progress {
                progress.inc(1);
                progress.set_message(category.clone());
            }
            if report.pages.entries.contains_key(category) {
                continue;
            }

            let watch = Stopwatch::start();
            let listing = self.source.members(category, MemberKind::Page).await;
            watch.stop_and_record(self.telemetry, "pages", category);

            if !listing.is_complete() {
                warn!(
                    "Pages of '{}' may be incomplete: {}",
                    category,
                    listing.error().unwrap_or_default()
                );
                report.incomplete.insert(category.clone(), listing.status);
            }
            report.pages.insert(category.clone(), listing.members);
        }

        info!(
            "Listed pages of {} categories, {} distinct pages",
            report.pages.len(),
            report.pages.page_labels().len()
        );
        report
    }
}

/// List the pages of each of `categories` without telemetry
pub async fn enumerate_pages<S: MembershipSource>(source: &S, categories: &[CategoryLabel]) -> PagesReport {
    PageEnumerator::new(source).enumerate(categories).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::timing::RecordingTelemetry;

    fn labels(names: &[&str]) -> Vec<CategoryLabel> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_lists_direct_pages_only() {
        let source = MemorySource::new()
            .with_subcategories("Códigos jurídicos", ["Código Civil"])
            .with_pages("Códigos jurídicos", ["Código", "Codificación"])
            .with_pages("Código Civil", ["Código Civil de Chile"]);

        let report = enumerate_pages(&source, &labels(&["Códigos jurídicos"])).await;

        assert_eq!(
            report.pages.get("Códigos jurídicos").unwrap(),
            ["Código", "Codificación"]
        );
        assert!(report.pages.get("Código Civil").is_none());
        assert_eq!(source.calls("Códigos jurídicos", MemberKind::Subcategory), 0);
    }

    #[tokio::test]
    async fn test_repeated_categories_listed_once() {
        let source = MemorySource::new().with_pages("A", ["P"]);
        let report = enumerate_pages(&source, &labels(&["A", "A"])).await;

        assert_eq!(report.pages.len(), 1);
        assert_eq!(source.calls("A", MemberKind::Page), 1);
    }

    #[tokio::test]
    async fn test_partial_listing_kept_and_reported() {
        let pages: Vec<String> = (0..1000).map(|i| format!("Página {}", i)).collect();
        let source = MemorySource::new()
            .with_pages("Grande", pages)
            .with_page_size(500)
            .fail_after("Grande", MemberKind::Page, 1);

        let report = enumerate_pages(&source, &labels(&["Grande", "Vacía"])).await;

        assert_eq!(report.pages.get("Grande").unwrap().len(), 500);
        assert_eq!(report.pages.get("Vacía").unwrap().len(), 0);
        assert!(matches!(
            report.incomplete.get("Grande"),
            Some(ListingStatus::Partial { batches: 1, .. })
        ));
        assert!(!report.incomplete.contains_key("Vacía"));
    }

    #[tokio::test]
    async fn test_listing_timings_are_recorded() {
        let source = MemorySource::new().with_pages("A", ["P"]);
        let telemetry = RecordingTelemetry::new();

        PageEnumerator::new(&source)
            .with_telemetry(&telemetry)
            .enumerate(&labels(&["A", "B"]))
            .await;

        let subjects: Vec<_> = telemetry
            .for_operation("pages")
            .into_iter()
            .map(|e| e.subject)
            .collect();
        assert_eq!(subjects, vec!["A", "B"]);
    }

    #[test]
    fn test_page_labels_are_unique() {
        let mut pages = CategoryPages::new();
        pages.insert("A", labels(&["P1", "P2"]));
        pages.insert("B", labels(&["P2", "P3"]));

        assert_eq!(pages.page_labels(), labels(&["P1", "P2", "P3"]));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut pages = CategoryPages::new();
        pages.insert("A", labels(&["P1"]));

        assert_eq!(
            serde_json::to_value(&pages).unwrap(),
            serde_json::json!({"A": ["P1"]})
        );
    }
}
