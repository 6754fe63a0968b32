//! Block extraction from rendered page HTML

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::{Block, BlockKind, ContentError, ExtractionConfig, PageContent};

/// Elements that become blocks, in document order
const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, dt";

/// Bracketed citation markers such as `[3]`
const CITATION_PATTERN: &str = r"\[\d+\]";

/// Extract the ordered text blocks of a rendered page
///
/// # Arguments
///
/// * `html` - The rendered page HTML
/// * `config` - Which sections, list tails and elements to leave out
///
/// # Returns
///
/// One block per heading, paragraph, list item and definition term, skipping
/// the sections of blacklisted headings and the tail of truncated lists
pub fn extract_blocks(html: &str, config: &ExtractionConfig) -> Result<PageContent, ContentError> {
    let document = Html::parse_fragment(html);

    let block_selector = Selector::parse(BLOCK_SELECTOR)
        .map_err(|e| ContentError::HtmlParse(format!("Failed to parse block selector: {}", e)))?;
    let citation = Regex::new(CITATION_PATTERN)
        .map_err(|e| ContentError::HtmlParse(format!("Failed to build citation pattern: {}", e)))?;

    let mut excluded = Vec::new();
    for selector_str in &config.exclude_selectors {
        match Selector::parse(selector_str) {
            Ok(selector) => excluded.push(selector),
            Err(e) => warn!("Failed to parse selector '{}': {}", selector_str, e),
        }
    }

    let mut blocks = PageContent::new();
    let mut skipping_section = false;
    let mut truncated_lists = HashSet::new();

    for element in document.select(&block_selector) {
        if is_excluded(&element, &excluded)
            || element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| is_excluded(&a, &excluded))
        {
            continue;
        }

        let name = element.value().name();

        if let Some(kind) = BlockKind::heading(name) {
            skipping_section = anchor_id(element)
                .is_some_and(|id| config.header_blacklist.contains(id));
            if skipping_section {
                debug!("Skipping section '{}'", anchor_id(element).unwrap_or_default());
                continue;
            }
            let text = element_text(element, &excluded);
            blocks.push_text(kind, citation.replace_all(&text, "").into_owned());
            continue;
        }

        if skipping_section {
            continue;
        }

        match name {
            "p" => blocks.push_text(BlockKind::Paragraph, element_text(element, &excluded)),
            "dt" => blocks.push_text(BlockKind::DefinitionTerm, element_text(element, &excluded)),
            "li" => {
                let lists: Vec<ElementRef> = element
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .filter(|a| matches!(a.value().name(), "ul" | "ol"))
                    .collect();
                let Some(list) = lists.first() else {
                    continue;
                };
                if lists.iter().any(|l| truncated_lists.contains(&l.id())) {
                    continue;
                }

                let text = element_text(element, &excluded);
                if config.list_truncation_markers.contains(text.trim()) {
                    truncated_lists.insert(list.id());
                    continue;
                }
                blocks.push_text(BlockKind::ListItem, text);
            }
            _ => {}
        }
    }

    Ok(blocks)
}

/// Anchor id of a heading: its own `id`, or the `id` of the `mw-headline`
/// span inside it
fn anchor_id(heading: ElementRef<'_>) -> Option<&str> {
    heading.value().id().or_else(|| {
        heading
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().classes().any(|c| c == "mw-headline"))
            .and_then(|e| e.value().id())
    })
}

fn is_excluded(element: &ElementRef<'_>, excluded: &[Selector]) -> bool {
    excluded.iter().any(|selector| selector.matches(element))
}

/// Text of an element, leaving out excluded descendants
fn element_text(element: ElementRef<'_>, excluded: &[Selector]) -> String {
    let mut text = String::new();
    collect_text(element, excluded, &mut text);
    text
}

fn collect_text(element: ElementRef<'_>, excluded: &[Selector], out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !is_excluded(&child_element, excluded) {
                collect_text(child_element, excluded, out);
            }
        }
    }
}
