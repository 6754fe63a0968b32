//! Adjacency-list representation of a category graph

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;

use super::CategoryLabel;

/// Mapping from a category label to its ordered direct subcategories
///
/// Entries are keyed by label, so recording the same category twice replaces
/// its previous list instead of merging the two. A recorded list never holds
/// the same subcategory twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
    entries: BTreeMap<CategoryLabel, Vec<CategoryLabel>>,
}

impl CategoryTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the subcategories of `label`, replacing any previous entry
    pub fn insert(
        &mut self,
        label: impl Into<CategoryLabel>,
        subcategories: impl IntoIterator<Item = CategoryLabel>,
    ) -> Option<Vec<CategoryLabel>> {
        let mut seen = BTreeSet::new();
        let unique = subcategories
            .into_iter()
            .filter(|s| seen.insert(s.clone()))
            .collect();
        self.entries.insert(label.into(), unique)
    }

    /// Subcategories recorded for `label`, if it was expanded
    pub fn get(&self, label: &str) -> Option<&[CategoryLabel]> {
        self.entries.get(label).map(Vec::as_slice)
    }

    /// Whether `label` has an entry
    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    /// Remove the entry for `label`
    pub fn remove(&mut self, label: &str) -> Option<Vec<CategoryLabel>> {
        self.entries.remove(label)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels that have an entry
    pub fn keys(&self) -> impl Iterator<Item = &CategoryLabel> {
        self.entries.keys()
    }

    /// Iterate over `(label, subcategories)` entries
    pub fn iter(&self) -> btree_map::Iter<'_, CategoryLabel, Vec<CategoryLabel>> {
        self.entries.iter()
    }

    pub(crate) fn lists_mut(&mut self) -> btree_map::ValuesMut<'_, CategoryLabel, Vec<CategoryLabel>> {
        self.entries.values_mut()
    }

    /// Every label mentioned by the tree, either as a key or as a listed
    /// subcategory, each exactly once
    pub fn labels(&self) -> Vec<CategoryLabel> {
        let mut seen = BTreeSet::new();
        let mut labels = Vec::new();
        for (label, subcategories) in &self.entries {
            for l in std::iter::once(label).chain(subcategories) {
                if seen.insert(l.as_str()) {
                    labels.push(l.clone());
                }
            }
        }
        labels
    }

    /// Whether `label` occurs anywhere in the tree
    pub fn mentions(&self, label: &str) -> bool {
        self.contains(label) || self.entries.values().any(|l| l.iter().any(|s| s == label))
    }
}

impl<'a> IntoIterator for &'a CategoryTree {
    type Item = (&'a CategoryLabel, &'a Vec<CategoryLabel>);
    type IntoIter = btree_map::Iter<'a, CategoryLabel, Vec<CategoryLabel>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<L, S, I> FromIterator<(L, I)> for CategoryTree
where
    L: Into<CategoryLabel>,
    S: Into<CategoryLabel>,
    I: IntoIterator<Item = S>,
{
    fn from_iter<T: IntoIterator<Item = (L, I)>>(iter: T) -> Self {
        let mut tree = CategoryTree::new();
        for (label, subcategories) in iter {
            tree.insert(label, subcategories.into_iter().map(Into::into));
        }
        tree
    }
}
