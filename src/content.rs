//! # Page Content Module
//!
//! Fetches rendered pages and turns them into ordered, typed text blocks, then
//! accumulates them into a [`Corpus`] keyed by page label.
//!
//! ## Key Components
//!
//! - `Block` / `BlockKind`: one heading, paragraph, list item or definition term
//! - `PageContent`: the blocks of one page, in document order
//! - `Corpus`: page label to page content
//! - `ContentSource`: seam for fetching rendered HTML by page title
//! - `extract_blocks`: HTML to blocks, honoring `ExtractionConfig`
//! - `ContentCollector`: cache-first collection of a domain's corpus

mod collector;
mod config;
mod error;
mod extraction;

pub use collector::{CollectReport, ContentCollector};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::ContentError;
pub use extraction::extract_blocks;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::future::Future;

/// Title of a page
pub type PageLabel = String;

/// Kind of a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "h1")]
    H1,
    #[serde(rename = "h2")]
    H2,
    #[serde(rename = "h3")]
    H3,
    #[serde(rename = "h4")]
    H4,
    #[serde(rename = "h5")]
    H5,
    #[serde(rename = "h6")]
    H6,
    #[serde(rename = "p")]
    Paragraph,
    #[serde(rename = "li")]
    ListItem,
    #[serde(rename = "dt")]
    DefinitionTerm,
}

impl BlockKind {
    /// Heading kind for an element name such as `h2`
    pub fn heading(element_name: &str) -> Option<Self> {
        match element_name {
            "h1" => Some(Self::H1),
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            "h4" => Some(Self::H4),
            "h5" => Some(Self::H5),
            "h6" => Some(Self::H6),
            _ => None,
        }
    }

    /// Level 1–6 of a heading, `None` for other kinds
    pub fn heading_level(self) -> Option<u8> {
        match self {
            Self::H1 => Some(1),
            Self::H2 => Some(2),
            Self::H3 => Some(3),
            Self::H4 => Some(4),
            Self::H5 => Some(5),
            Self::H6 => Some(6),
            _ => None,
        }
    }
}

/// One text block of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "tag")]
    pub kind: BlockKind,
    pub text: String,
}

/// Blocks of one page, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageContent {
    blocks: Vec<Block>,
}

impl PageContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block, trimming its text; blank text is dropped
    pub fn push_text(&mut self, kind: BlockKind, text: impl AsRef<str>) {
        let text = text.as_ref().trim();
        if !text.is_empty() {
            self.blocks.push(Block {
                kind,
                text: text.to_string(),
            });
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Page contents keyed by page label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    pages: BTreeMap<PageLabel, PageContent>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page: impl Into<PageLabel>, content: PageContent) -> Option<PageContent> {
        self.pages.insert(page.into(), content)
    }

    pub fn get(&self, page: &str) -> Option<&PageContent> {
        self.pages.get(page)
    }

    pub fn contains(&self, page: &str) -> bool {
        self.pages.contains_key(page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, PageLabel, PageContent> {
        self.pages.iter()
    }

    /// Add every page of `other` not present yet; existing pages are kept
    pub fn merge(&mut self, other: Corpus) {
        for (page, content) in other.pages {
            self.pages.entry(page).or_insert(content);
        }
    }
}

/// Source of rendered page HTML
pub trait ContentSource {
    /// Fetch the rendered HTML of the page titled `title`
    fn fetch_html(&self, title: &str) -> impl Future<Output = Result<String, ContentError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_text_trims_and_drops_blank() {
        let mut content = PageContent::new();
        content.push_text(BlockKind::Paragraph, "  Texto \n");
        content.push_text(BlockKind::ListItem, " \n ");

        assert_eq!(content.len(), 1);
        assert_eq!(content.blocks()[0].text, "Texto");
    }

    #[test]
    fn test_block_serialization_uses_tags() {
        let mut content = PageContent::new();
        content.push_text(BlockKind::H2, "Historia");
        content.push_text(BlockKind::DefinitionTerm, "Aforismo");

        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"tag": "h2", "text": "Historia"},
                {"tag": "dt", "text": "Aforismo"}
            ])
        );
    }

    #[test]
    fn test_corpus_merge_keeps_existing_pages() {
        let mut first = PageContent::new();
        first.push_text(BlockKind::Paragraph, "primera");
        let mut second = PageContent::new();
        second.push_text(BlockKind::Paragraph, "segunda");

        let mut corpus = Corpus::new();
        corpus.insert("Brocardo", first.clone());

        let mut other = Corpus::new();
        other.insert("Brocardo", second.clone());
        other.insert("Aberratio ictus", second);
        corpus.merge(other);

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get("Brocardo"), Some(&first));
    }

    #[test]
    fn test_heading_kind_from_element_name() {
        assert_eq!(BlockKind::heading("h5"), Some(BlockKind::H5));
        assert_eq!(BlockKind::heading("p"), None);
        assert_eq!(BlockKind::Paragraph.heading_level(), None);
    }
}
