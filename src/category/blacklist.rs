//! Category exclusion rules
//!
//! A [`Blacklist`] combines two independent rule sets: labels that are excluded
//! when they match exactly, and fragments that exclude any label containing
//! them. Matching is case-sensitive and unanchored.
//!
//! [`BlacklistRules`] scopes blacklists per seed domain, with a wildcard bucket
//! (`"*"`) that applies to every domain.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Key of the bucket that applies to every domain
pub const WILDCARD: &str = "*";

/// Which rule excluded a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlacklistMatch<'a> {
    /// The label equals a blacklisted label
    Exact,
    /// The label contains this blacklisted fragment
    Substring(&'a str),
}

/// Exact-match labels and substring fragments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blacklist {
    /// Labels excluded on exact match
    #[serde(default)]
    pub exact: BTreeSet<String>,

    /// Fragments excluding every label that contains them
    #[serde(default, deserialize_with = "non_empty_fragments")]
    pub substrings: BTreeSet<String>,
}

// An empty fragment is contained in every label.
fn non_empty_fragments<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let fragments = BTreeSet::<String>::deserialize(deserializer)?;
    Ok(fragments.into_iter().filter(|f| !f.is_empty()).collect())
}

impl Blacklist {
    /// Create a blacklist from exact labels and substring fragments
    pub fn new<E, S>(exact: E, substrings: S) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            exact: exact.into_iter().map(Into::into).collect(),
            substrings: substrings
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// Whether no rule is configured
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.substrings.is_empty()
    }

    /// Find the rule that excludes `label`, exact matches first
    pub fn find_match(&self, label: &str) -> Option<BlacklistMatch<'_>> {
        if self.exact.contains(label) {
            return Some(BlacklistMatch::Exact);
        }
        self.substrings
            .iter()
            .find(|fragment| label.contains(fragment.as_str()))
            .map(|fragment| BlacklistMatch::Substring(fragment.as_str()))
    }

    /// Whether `label` is excluded by either rule
    pub fn matches(&self, label: &str) -> bool {
        self.find_match(label).is_some()
    }

    /// Union of both blacklists
    pub fn union(&self, other: &Blacklist) -> Blacklist {
        Blacklist {
            exact: self.exact.union(&other.exact).cloned().collect(),
            substrings: self.substrings.union(&other.substrings).cloned().collect(),
        }
    }
}

/// Blacklists keyed by seed domain, plus the wildcard bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlacklistRules {
    buckets: BTreeMap<String, Blacklist>,
}

impl BlacklistRules {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules applying `blacklist` to every domain
    pub fn global(blacklist: Blacklist) -> Self {
        let mut rules = Self::new();
        rules.set_wildcard(blacklist);
        rules
    }

    /// Replace the blacklist of one domain
    pub fn set_domain(&mut self, domain: impl Into<String>, blacklist: Blacklist) {
        self.buckets.insert(domain.into(), blacklist);
    }

    /// Replace the wildcard blacklist
    pub fn set_wildcard(&mut self, blacklist: Blacklist) {
        self.buckets.insert(WILDCARD.to_string(), blacklist);
    }

    /// Merge `blacklist` into the wildcard bucket
    pub fn extend_wildcard(&mut self, blacklist: &Blacklist) {
        let merged = self.wildcard().union(blacklist);
        self.set_wildcard(merged);
    }

    /// The wildcard blacklist
    pub fn wildcard(&self) -> Blacklist {
        self.buckets.get(WILDCARD).cloned().unwrap_or_default()
    }

    /// Effective blacklist for `domain`: its own rules plus the wildcard rules
    pub fn for_domain(&self, domain: &str) -> Blacklist {
        let wildcard = self.wildcard();
        match self.buckets.get(domain) {
            Some(specific) if domain != WILDCARD => specific.union(&wildcard),
            _ => wildcard,
        }
    }
}
