//! In-memory membership and content source
//!
//! Serves subcategory and page listings from maps, splitting them into pages of
//! a configurable size so pagination failures can be scripted, and rendered
//! page HTML by title. Every request is counted, which lets callers check that
//! cached work is not fetched again.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Listing, MemberKind, MembershipSource, SourceError};
use crate::content::{ContentError, ContentSource};

type Key = (String, MemberKind);

/// Membership source backed by in-memory maps
#[derive(Debug)]
pub struct MemorySource {
    members: HashMap<Key, Vec<String>>,
    failures: HashMap<Key, usize>,
    page_size: usize,
    calls: Mutex<HashMap<Key, usize>>,
    html: HashMap<String, String>,
    html_calls: Mutex<HashMap<String, usize>>,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    /// Create an empty source; unknown categories have no members
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
            failures: HashMap::new(),
            page_size: usize::MAX,
            calls: Mutex::new(HashMap::new()),
            html: HashMap::new(),
            html_calls: Mutex::new(HashMap::new()),
        }
    }

    /// Set the direct subcategories of `category`
    pub fn with_subcategories<I, S>(mut self, category: &str, subcategories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members.insert(
            (category.to_string(), MemberKind::Subcategory),
            subcategories.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Set the direct member pages of `category`
    pub fn with_pages<I, S>(mut self, category: &str, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members.insert(
            (category.to_string(), MemberKind::Page),
            pages.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Set the rendered HTML of the page titled `title`
    pub fn with_html(mut self, title: &str, html: &str) -> Self {
        self.html.insert(title.to_string(), html.to_string());
        self
    }

    /// Serve listings in pages of `page_size` members
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make the listing of `category` fail after `batches` pages were served
    pub fn fail_after(mut self, category: &str, kind: MemberKind, batches: usize) -> Self {
        self.failures.insert((category.to_string(), kind), batches);
        self
    }

    /// Number of listing requests made for `category`
    pub fn calls(&self, category: &str, kind: MemberKind) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(&(category.to_string(), kind)).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of listing requests made in total
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    /// Number of content requests made for `title`
    pub fn html_calls(&self, title: &str) -> usize {
        self.html_calls
            .lock()
            .map(|calls| calls.get(title).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of content requests made in total
    pub fn total_html_calls(&self) -> usize {
        self.html_calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    fn record_call(&self, key: &Key) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(key.clone()).or_insert(0) += 1;
        }
    }
}

impl MembershipSource for MemorySource {
    async fn members(&self, category: &str, kind: MemberKind) -> Listing {
        let key = (category.to_string(), kind);
        self.record_call(&key);

        let all = self.members.get(&key).cloned().unwrap_or_default();
        match self.failures.get(&key) {
            None => Listing::complete(all),
            Some(&batches) => {
                let served = all
                    .into_iter()
                    .take(self.page_size.saturating_mul(batches))
                    .collect();
                Listing::interrupted(served, batches, "scripted failure")
            }
        }
    }
}

impl ContentSource for MemorySource {
    async fn fetch_html(&self, title: &str) -> Result<String, ContentError> {
        if let Ok(mut calls) = self.html_calls.lock() {
            *calls.entry(title.to_string()).or_insert(0) += 1;
        }
        self.html.get(title).cloned().ok_or_else(|| {
            SourceError::UnexpectedResponse(format!("page '{}' has no text", title)).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ListingStatus;

    #[tokio::test]
    async fn test_serves_members_and_counts_calls() {
        let source = MemorySource::new()
            .with_subcategories("A", ["B", "C"])
            .with_pages("A", ["Page"]);

        let listing = source.members("A", MemberKind::Subcategory).await;
        assert_eq!(listing, Listing::complete(vec!["B".into(), "C".into()]));

        let listing = source.members("A", MemberKind::Page).await;
        assert_eq!(listing.members, vec!["Page"]);

        let listing = source.members("Unknown", MemberKind::Subcategory).await;
        assert!(listing.members.is_empty());
        assert!(listing.is_complete());

        assert_eq!(source.calls("A", MemberKind::Subcategory), 1);
        assert_eq!(source.total_calls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_failure_keeps_served_pages() {
        let members: Vec<String> = (0..7).map(|i| format!("C{i}")).collect();
        let source = MemorySource::new()
            .with_subcategories("A", members)
            .with_page_size(3)
            .fail_after("A", MemberKind::Subcategory, 2);

        let listing = source.members("A", MemberKind::Subcategory).await;
        assert_eq!(listing.members.len(), 6);
        assert!(matches!(listing.status, ListingStatus::Partial { batches: 2, .. }));
    }

    #[tokio::test]
    async fn test_serves_html_and_counts_requests() {
        let source = MemorySource::new().with_html("Brocardo", "<p>Máxima</p>");

        assert_eq!(source.fetch_html("Brocardo").await.unwrap(), "<p>Máxima</p>");
        assert!(matches!(
            source.fetch_html("Perdida").await,
            Err(ContentError::Source(SourceError::UnexpectedResponse(_)))
        ));
        assert_eq!(source.html_calls("Brocardo"), 1);
        assert_eq!(source.total_html_calls(), 2);
        assert_eq!(source.total_calls(), 0);
    }
}
