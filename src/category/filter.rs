//! Blacklist filtering of category trees
//!
//! Filtering runs in two phases. The first is a pure traversal: every listed
//! subcategory matching the blacklist is a removal root, and every label
//! reachable from a root through the tree's entries joins the removal set.
//! The second applies the set: removed entries are deleted and removed labels
//! are stripped from every surviving list.
//!
//! Labels that only appear as keys (seeds) are never tested against the
//! blacklist. When a domain is filtered with [`partition_domain`], only its own
//! closure is considered and the domain itself is never removed, even where
//! another seed lists it as a subcategory.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::{extract_taxonomy, Blacklist, BlacklistMatch, CategoryLabel, CategoryTree};

/// Why a category was removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// The label is blacklisted exactly
    Exact,
    /// The label contains a blacklisted fragment
    Substring(String),
    /// The label lies beneath a removed category
    Beneath(CategoryLabel),
}

/// Result of filtering a tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// The pruned tree
    pub whitelist: CategoryTree,

    /// Every removed category with the subcategory list it had before
    /// filtering; removed labels without an entry map to an empty list
    pub blacklist: CategoryTree,

    /// Why each removed category was removed
    pub reasons: BTreeMap<CategoryLabel, ExclusionReason>,
}

impl Partition {
    /// Whether `label` was removed
    pub fn is_removed(&self, label: &str) -> bool {
        self.reasons.contains_key(label)
    }
}

/// Compute every label removed by `blacklist`, with the reason for each
pub fn removal_set(
    tree: &CategoryTree,
    blacklist: &Blacklist,
) -> BTreeMap<CategoryLabel, ExclusionReason> {
    removals(tree, blacklist, None)
}

fn removals(
    tree: &CategoryTree,
    blacklist: &Blacklist,
    kept: Option<&str>,
) -> BTreeMap<CategoryLabel, ExclusionReason> {
    let is_kept = |label: &str| kept == Some(label);
    let mut reasons = BTreeMap::new();
    let mut stack: Vec<(&str, ExclusionReason)> = Vec::new();

    for (_, subcategories) in tree {
        for subcategory in subcategories.iter().filter(|s| !is_kept(s.as_str())) {
            match blacklist.find_match(subcategory) {
                Some(BlacklistMatch::Exact) => {
                    stack.push((subcategory.as_str(), ExclusionReason::Exact))
                }
                Some(BlacklistMatch::Substring(fragment)) => stack.push((
                    subcategory.as_str(),
                    ExclusionReason::Substring(fragment.to_string()),
                )),
                None => {}
            }
        }
    }

    // Direct matches take precedence over being beneath another match.
    let roots: BTreeSet<&str> = stack.iter().map(|(label, _)| *label).collect();

    while let Some((label, reason)) = stack.pop() {
        if reasons.contains_key(label) {
            continue;
        }
        reasons.insert(label.to_string(), reason);

        for child in tree.get(label).unwrap_or_default() {
            if !roots.contains(child.as_str()) && !is_kept(child.as_str()) {
                stack.push((child.as_str(), ExclusionReason::Beneath(label.to_string())));
            }
        }
    }

    reasons
}

/// Split `tree` into the categories kept and the categories removed by
/// `blacklist`
pub fn partition(tree: &CategoryTree, blacklist: &Blacklist) -> Partition {
    apply(tree, removal_set(tree, blacklist))
}

/// Split the closure of `domain` in `tree` into the categories kept and the
/// categories removed by `blacklist`; `domain` itself is always kept
pub fn partition_domain(tree: &CategoryTree, domain: &str, blacklist: &Blacklist) -> Partition {
    let closure = extract_taxonomy(tree, domain);
    let reasons = removals(&closure, blacklist, Some(domain));
    apply(&closure, reasons)
}

fn apply(tree: &CategoryTree, reasons: BTreeMap<CategoryLabel, ExclusionReason>) -> Partition {
    let mut whitelist = tree.clone();
    let mut removed = CategoryTree::new();

    for (label, reason) in &reasons {
        debug!("Removing '{}' ({:?})", label, reason);
        match whitelist.remove(label) {
            Some(subcategories) => {
                removed.insert(label.clone(), subcategories);
            }
            None => {
                info!("'{}' has no entry to remove", label);
                removed.insert(label.clone(), Vec::new());
            }
        }
    }

    for list in whitelist.lists_mut() {
        list.retain(|subcategory| !reasons.contains_key(subcategory));
    }

    info!(
        "Filter kept {} categories and removed {}",
        whitelist.len(),
        reasons.len()
    );

    Partition {
        whitelist,
        blacklist: removed,
        reasons,
    }
}

/// Remove every blacklisted category and everything beneath it from `tree`
pub fn filter(tree: &CategoryTree, blacklist: &Blacklist) -> CategoryTree {
    partition(tree, blacklist).whitelist
}
