//! Degree-bounded category tree construction
//!
//! The builder walks the category graph breadth-first from a seed. A category
//! at depth `d` (the seed is at depth 0) is expanded, meaning its direct
//! subcategories are fetched and recorded under its label, iff
//! `d <= max_degree`. The bound is inclusive for both filter modes, so
//! `max_degree == 0` records only the seed's own entry.
//!
//! The list of a category is recorded as fetched, before any child is
//! considered. In [`FilterMode::InPlace`] a blacklisted child is not expanded,
//! but it stays in its parent's list until the tree is filtered.
//!
//! Seeds expanded through one builder share a tree, and a recorded category is
//! never requested again. Each seed still walks its own bounded graph over the
//! recorded lists, so a category pruned by one seed's blacklist is expanded
//! when another seed reaches it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use tracing::{debug, info, instrument, warn};

use super::{Blacklist, CategoryLabel, CategoryTree};
use crate::source::{ListingStatus, MemberKind, MembershipSource};
use crate::timing::{NoopTelemetry, Stopwatch, Telemetry};

/// When blacklists are applied relative to tree construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Build the whole tree, then filter it in a separate pass
    #[default]
    Deferred,
    /// Skip expanding blacklisted subcategories while building
    InPlace,
}

/// What happened while building a tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Number of subcategory listings requested from the source
    pub requests: usize,

    /// Categories not expanded because a blacklist matched them
    pub pruned: BTreeSet<CategoryLabel>,

    /// Categories whose listing ended early, with how it ended
    pub incomplete: BTreeMap<CategoryLabel, ListingStatus>,
}

/// Builds a [`CategoryTree`] from one or more seeds
///
/// Seeds expanded through the same builder share one tree. A label already
/// recorded by an earlier seed is expanded again from its recorded list,
/// without another request.
pub struct TreeBuilder<'a, S> {
    source: &'a S,
    max_degree: usize,
    tree: CategoryTree,
    report: BuildReport,
    telemetry: &'a dyn Telemetry,
}

impl<'a, S: MembershipSource> TreeBuilder<'a, S> {
    /// Create a builder expanding categories up to depth `max_degree`
    pub fn new(source: &'a S, max_degree: usize) -> Self {
        Self {
            source,
            max_degree,
            tree: CategoryTree::new(),
            report: BuildReport::default(),
            telemetry: &NoopTelemetry,
        }
    }

    /// Report per-category fetch timings to `telemetry`
    pub fn with_telemetry(mut self, telemetry: &'a dyn Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Maximum expansion depth
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// The tree built so far
    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    /// The report so far
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Consume the builder
    pub fn finish(self) -> (CategoryTree, BuildReport) {
        (self.tree, self.report)
    }

    /// Expand `seed` into the tree
    ///
    /// With a `blacklist`, subcategories matching it are not expanded
    /// ([`FilterMode::InPlace`]); without one the whole bounded graph is
    /// recorded ([`FilterMode::Deferred`]).
    #[instrument(skip(self, blacklist), fields(max_degree = self.max_degree))]
    pub async fn expand(&mut self, seed: &str, blacklist: Option<&Blacklist>) {
        let mut queue = VecDeque::from([(seed.to_string(), 0usize)]);
        // Breadth-first, so the first time a label is queued is its shallowest.
        let mut queued = HashSet::from([seed.to_string()]);

        while let Some((label, depth)) = queue.pop_front() {
            let recorded = self.tree.get(&label).map(<[_]>::to_vec);
            let subcategories = match recorded {
                Some(subcategories) => subcategories,
                None => self.fetch(&label).await,
            };

            if depth >= self.max_degree {
                continue;
            }

            for subcategory in subcategories {
                if queued.contains(&subcategory) {
                    continue;
                }
                if let Some(rule) = blacklist.and_then(|b| b.find_match(&subcategory)) {
                    debug!("Not expanding '{}' ({:?})", subcategory, rule);
                    self.report.pruned.insert(subcategory);
                    continue;
                }
                queued.insert(subcategory.clone());
                queue.push_back((subcategory, depth + 1));
            }
        }

        info!(
            "Expanded '{}': {} categories recorded, {} requests",
            seed,
            self.tree.len(),
            self.report.requests
        );
    }

    /// Fetch and record the subcategories of `label`
    async fn fetch(&mut self, label: &str) -> Vec<CategoryLabel> {
        let watch = Stopwatch::start();
        let listing = self.source.members(label, MemberKind::Subcategory).await;
        watch.stop_and_record(self.telemetry, "subcategories", label);
        self.report.requests += 1;

        if !listing.is_complete() {
            warn!(
                "Subcategories of '{}' may be incomplete: {}",
                label,
                listing.error().unwrap_or_default()
            );
            self.report.incomplete.insert(label.to_string(), listing.status.clone());
        }

        self.tree.insert(label, listing.members);
        self.tree.get(label).map(<[_]>::to_vec).unwrap_or_default()
    }
}

/// Build the tree of `seed` up to `max_degree` without filtering
pub async fn expand<S: MembershipSource>(source: &S, seed: &str, max_degree: usize) -> CategoryTree {
    let mut builder = TreeBuilder::new(source, max_degree);
    builder.expand(seed, None).await;
    builder.finish().0
}

/// Build the tree of `seed` up to `max_degree`, skipping blacklisted branches
pub async fn expand_filtered<S: MembershipSource>(
    source: &S,
    seed: &str,
    max_degree: usize,
    blacklist: &Blacklist,
) -> CategoryTree {
    let mut builder = TreeBuilder::new(source, max_degree);
    builder.expand(seed, Some(blacklist)).await;
    builder.finish().0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::timing::RecordingTelemetry;

    fn legal_source() -> MemorySource {
        MemorySource::new()
            .with_subcategories("Root", ["A", "B"])
            .with_subcategories("A", ["A1", "A2"])
            .with_subcategories("B", ["B1"])
            .with_subcategories("A1", ["A1x"])
    }

    #[tokio::test]
    async fn test_degree_zero_records_only_seed() {
        let source = legal_source();
        let tree = expand(&source, "Root", 0).await;

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("Root").unwrap(), ["A", "B"]);
        assert!(!tree.contains("A"));
        assert_eq!(source.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_degree_bound_is_inclusive() {
        let source = legal_source();
        let tree = expand(&source, "Root", 1).await;

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get("A").unwrap(), ["A1", "A2"]);
        assert_eq!(tree.get("B").unwrap(), ["B1"]);
        assert!(!tree.contains("A1"));
    }

    #[tokio::test]
    async fn test_leaves_are_recorded_with_empty_lists() {
        let source = legal_source();
        let tree = expand(&source, "Root", 5).await;

        assert_eq!(tree.get("A1").unwrap(), ["A1x"]);
        assert_eq!(tree.get("A1x"), Some(&[][..]));
        assert_eq!(tree.get("B1"), Some(&[][..]));
    }

    #[tokio::test]
    async fn test_in_place_filter_skips_expansion_but_keeps_reference() {
        let source = legal_source();
        let blacklist = Blacklist::new(["A"], Vec::<String>::new());
        let tree = expand_filtered(&source, "Root", 3, &blacklist).await;

        assert_eq!(tree.get("Root").unwrap(), ["A", "B"]);
        assert!(!tree.contains("A"));
        assert!(tree.contains("B"));
        assert_eq!(source.calls("A", MemberKind::Subcategory), 0);
    }

    #[tokio::test]
    async fn test_in_place_filter_reports_pruned_labels() {
        let source = legal_source();
        let blacklist = Blacklist::new(Vec::<String>::new(), ["1"]);
        let mut builder = TreeBuilder::new(&source, 3);
        builder.expand("Root", Some(&blacklist)).await;

        let (tree, report) = builder.finish();
        assert!(tree.contains("A"));
        assert!(!tree.contains("A1"));
        assert_eq!(
            report.pruned.into_iter().collect::<Vec<_>>(),
            vec!["A1".to_string(), "B1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_cycles_terminate() {
        let source = MemorySource::new()
            .with_subcategories("A", ["B"])
            .with_subcategories("B", ["C"])
            .with_subcategories("C", ["A"]);
        let tree = expand(&source, "A", 100).await;

        assert_eq!(tree.len(), 3);
        assert_eq!(source.calls("A", MemberKind::Subcategory), 1);
        assert_eq!(source.total_calls(), 3);
    }

    #[tokio::test]
    async fn test_shared_descendant_is_fetched_once() {
        let source = MemorySource::new()
            .with_subcategories("Root", ["A", "B"])
            .with_subcategories("A", ["Shared"])
            .with_subcategories("B", ["Shared"]);
        let tree = expand(&source, "Root", 2).await;

        assert!(tree.contains("Shared"));
        assert_eq!(source.calls("Shared", MemberKind::Subcategory), 1);
    }

    #[tokio::test]
    async fn test_partial_listing_is_kept() {
        let members: Vec<String> = (0..500).map(|i| format!("Sub {i}")).collect();
        let source = MemorySource::new()
            .with_subcategories("Root", members)
            .with_page_size(500)
            .fail_after("Root", MemberKind::Subcategory, 1);

        let mut builder = TreeBuilder::new(&source, 0);
        builder.expand("Root", None).await;
        let (tree, report) = builder.finish();

        assert_eq!(tree.get("Root").unwrap().len(), 500);
        assert!(matches!(
            report.incomplete.get("Root"),
            Some(ListingStatus::Partial { batches: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_shallower_seed_reexpands_without_refetch() {
        let source = MemorySource::new()
            .with_subcategories("X", ["Y"])
            .with_subcategories("Y", ["Z"])
            .with_subcategories("Z", ["W"]);
        let mut builder = TreeBuilder::new(&source, 1);

        builder.expand("X", None).await;
        assert!(!builder.tree().contains("Z"));

        builder.expand("Y", None).await;
        assert!(builder.tree().contains("Z"));
        assert!(!builder.tree().contains("W"));
        assert_eq!(source.calls("Y", MemberKind::Subcategory), 1);
        assert_eq!(builder.report().requests, 3);
    }

    #[tokio::test]
    async fn test_label_pruned_for_one_seed_is_expanded_for_another() {
        let source = MemorySource::new()
            .with_subcategories("A", ["L"])
            .with_subcategories("B", ["L"])
            .with_subcategories("L", ["C"])
            .with_subcategories("C", ["D"]);
        let only_a = Blacklist::new(["C"], Vec::<String>::new());
        let mut builder = TreeBuilder::new(&source, 3);

        builder.expand("A", Some(&only_a)).await;
        assert!(!builder.tree().contains("C"));

        builder.expand("B", Some(&Blacklist::default())).await;
        assert_eq!(builder.tree().get("C").unwrap(), ["D"]);
        assert_eq!(builder.tree().get("D"), Some(&[][..]));
        assert_eq!(source.calls("L", MemberKind::Subcategory), 1);
        assert_eq!(source.calls("C", MemberKind::Subcategory), 1);
    }

    #[tokio::test]
    async fn test_fetch_timings_are_reported() {
        let source = legal_source();
        let telemetry = RecordingTelemetry::new();
        let mut builder = TreeBuilder::new(&source, 1).with_telemetry(&telemetry);
        builder.expand("Root", None).await;

        let subjects: Vec<_> = telemetry
            .for_operation("subcategories")
            .into_iter()
            .map(|e| e.subject)
            .collect();
        assert_eq!(subjects, vec!["Root", "A", "B"]);
    }
}
