//! # Category Membership Source
//!
//! The encyclopedia exposes category membership through a paginated list
//! protocol: a request names a category and a member type, and the response
//! carries one page of members plus an optional continuation token. This module
//! defines the [`MembershipSource`] seam used by the tree builder and the page
//! enumerator, the [`Listing`] result type, and two implementations:
//!
//! - [`MediaWikiClient`]: HTTP client for a MediaWiki `api.php` endpoint
//! - [`MemorySource`]: in-memory source with scripted failures and call counts
//!
//! ## Failure policy
//!
//! A failure while paginating never propagates to the caller. Pagination stops,
//! the members accumulated so far are returned, and the [`ListingStatus`] tells
//! whether the listing is complete, partial, or failed outright.

mod config;
mod error;
mod mediawiki;
mod memory;

pub use config::{DEFAULT_CATEGORY_PREFIX, DEFAULT_ENDPOINT, MAX_PAGE_SIZE, SourceConfig};
pub use error::SourceError;
pub use mediawiki::MediaWikiClient;
pub use memory::MemorySource;

use std::fmt;
use std::future::Future;

/// Member type filter of a membership request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Direct subcategories
    Subcategory,
    /// Direct member pages
    Page,
}

impl MemberKind {
    /// Value of the `cmtype` request parameter
    pub fn as_param(self) -> &'static str {
        match self {
            MemberKind::Subcategory => "subcat",
            MemberKind::Page => "page",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// How a listing ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingStatus {
    /// Every page was fetched
    Complete,
    /// Pagination stopped after `batches` pages because of `error`
    Partial {
        /// Number of pages received before the failure
        batches: usize,
        /// Description of the failure
        error: String,
    },
    /// The first request already failed
    Failed {
        /// Description of the failure
        error: String,
    },
}

/// Members of one category, in response order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Member labels accumulated before pagination ended
    pub members: Vec<String>,

    /// Whether pagination ran to completion
    pub status: ListingStatus,
}

impl Listing {
    /// A fully enumerated listing
    pub fn complete(members: Vec<String>) -> Self {
        Self {
            members,
            status: ListingStatus::Complete,
        }
    }

    /// A listing cut short by `error` after `batches` pages
    pub fn interrupted(members: Vec<String>, batches: usize, error: impl fmt::Display) -> Self {
        let error = error.to_string();
        let status = if batches == 0 {
            ListingStatus::Failed { error }
        } else {
            ListingStatus::Partial { batches, error }
        };
        Self { members, status }
    }

    /// Whether pagination ran to completion
    pub fn is_complete(&self) -> bool {
        self.status == ListingStatus::Complete
    }

    /// The failure that ended pagination, if any
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ListingStatus::Complete => None,
            ListingStatus::Partial { error, .. } | ListingStatus::Failed { error } => Some(error),
        }
    }
}

/// Source of category members
pub trait MembershipSource {
    /// List the direct members of `category` of the given kind
    ///
    /// Never fails: errors end pagination and are reported through
    /// [`Listing::status`].
    fn members(&self, category: &str, kind: MemberKind) -> impl Future<Output = Listing> + Send;
}

impl<T: MembershipSource + Sync> MembershipSource for &T {
    fn members(&self, category: &str, kind: MemberKind) -> impl Future<Output = Listing> + Send {
        (**self).members(category, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_listing_status() {
        let failed = Listing::interrupted(Vec::new(), 0, "connection refused");
        assert_eq!(
            failed.status,
            ListingStatus::Failed {
                error: "connection refused".to_string()
            }
        );
        assert_eq!(failed.error(), Some("connection refused"));

        let partial = Listing::interrupted(vec!["A".to_string()], 1, "timeout");
        assert!(matches!(partial.status, ListingStatus::Partial { batches: 1, .. }));
        assert!(!partial.is_complete());
    }

    #[test]
    fn test_member_kind_param() {
        assert_eq!(MemberKind::Subcategory.as_param(), "subcat");
        assert_eq!(MemberKind::Page.to_string(), "page");
    }
}
