//! Per-domain taxonomy extraction
//!
//! A taxonomy is the depth-first closure of one seed over an already built
//! tree: the seed's entry, then the entry of every listed subcategory that has
//! one, recursively. Labels without an entry end the recursion; nothing is
//! fetched.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use super::{CategoryLabel, CategoryTree};

/// How overlapping taxonomies are materialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyMode {
    /// Every taxonomy holds a full copy of the entries reachable from its
    /// domain
    #[default]
    Copy,
    /// An entry already held by an earlier domain's taxonomy is referenced by
    /// label instead of copied
    Shared,
}

/// Categories belonging to one seed domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    /// The seed domain
    pub domain: CategoryLabel,

    /// Entries reachable from the domain
    pub categories: CategoryTree,

    /// Labels whose entries live in another domain's taxonomy, mapped to that
    /// domain. Always empty in [`TaxonomyMode::Copy`].
    pub shared: BTreeMap<CategoryLabel, CategoryLabel>,
}

impl Taxonomy {
    /// Every category of the taxonomy, the domain first
    pub fn labels(&self) -> Vec<CategoryLabel> {
        let mut labels = vec![self.domain.clone()];
        labels.extend(
            self.categories
                .labels()
                .into_iter()
                .filter(|label| *label != self.domain),
        );
        labels
    }

    /// Whether `label` occurs in the taxonomy
    pub fn mentions(&self, label: &str) -> bool {
        self.domain == label || self.categories.mentions(label)
    }
}

/// Extract the closure of `domain` from `tree`
pub fn extract_taxonomy(tree: &CategoryTree, domain: &str) -> CategoryTree {
    let mut taxonomy = CategoryTree::new();
    let mut visited = HashSet::new();
    let mut stack = vec![domain];

    while let Some(label) = stack.pop() {
        if !visited.insert(label) {
            continue;
        }
        let Some(subcategories) = tree.get(label) else {
            continue;
        };
        taxonomy.insert(label, subcategories.iter().cloned());
        stack.extend(subcategories.iter().rev().map(String::as_str));
    }

    debug!("Taxonomy of '{}' has {} entries", domain, taxonomy.len());
    taxonomy
}

/// Extracts taxonomies one domain after another
///
/// In [`TaxonomyMode::Shared`] the extractor remembers which domain first
/// claimed each entry, so later domains reference it instead of copying it.
/// Domains may be extracted from different trees, e.g. trees filtered with
/// each domain's own blacklist.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyExtractor {
    mode: TaxonomyMode,
    owners: HashMap<CategoryLabel, CategoryLabel>,
}

impl TaxonomyExtractor {
    /// Create an extractor that has not claimed any entry yet
    pub fn new(mode: TaxonomyMode) -> Self {
        Self {
            mode,
            owners: HashMap::new(),
        }
    }

    /// How overlapping taxonomies are materialized
    pub fn mode(&self) -> TaxonomyMode {
        self.mode
    }

    /// Extract the taxonomy of `domain` from `tree`
    pub fn extract(&mut self, tree: &CategoryTree, domain: &str) -> Taxonomy {
        match self.mode {
            TaxonomyMode::Copy => Taxonomy {
                domain: domain.to_string(),
                categories: extract_taxonomy(tree, domain),
                shared: BTreeMap::new(),
            },
            TaxonomyMode::Shared => self.extract_shared(tree, domain),
        }
    }

    fn extract_shared(&mut self, tree: &CategoryTree, domain: &str) -> Taxonomy {
        let mut taxonomy = Taxonomy {
            domain: domain.to_string(),
            ..Default::default()
        };
        let mut visited = HashSet::new();
        let mut stack = vec![domain];

        while let Some(label) = stack.pop() {
            if !visited.insert(label) {
                continue;
            }
            let Some(subcategories) = tree.get(label) else {
                continue;
            };
            match self.owners.get(label) {
                Some(owner) if owner != domain => {
                    taxonomy.shared.insert(label.to_string(), owner.clone());
                    continue;
                }
                Some(_) => {}
                None => {
                    self.owners.insert(label.to_string(), domain.to_string());
                }
            }
            taxonomy.categories.insert(label, subcategories.iter().cloned());
            stack.extend(subcategories.iter().rev().map(String::as_str));
        }

        debug!(
            "Taxonomy of '{}' has {} entries, {} shared",
            domain,
            taxonomy.categories.len(),
            taxonomy.shared.len()
        );
        taxonomy
    }
}

/// Extract one taxonomy per domain from one tree, in the order given
pub fn extract_taxonomies(
    tree: &CategoryTree,
    domains: &[CategoryLabel],
    mode: TaxonomyMode,
) -> Vec<Taxonomy> {
    let mut extractor = TaxonomyExtractor::new(mode);
    domains
        .iter()
        .map(|domain| extractor.extract(tree, domain))
        .collect()
}
