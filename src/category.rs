//! # Category Discovery and Filtering
//!
//! This module turns seed domains into per-domain taxonomies. It is the core of
//! the corpus pipeline and is entirely in-memory apart from the subcategory
//! requests made by the builder.
//!
//! ## Key Components
//!
//! - `CategoryTree`: adjacency list from a category to its direct subcategories
//! - `TreeBuilder`: degree-bounded breadth-first expansion of seeds
//! - `Blacklist` / `BlacklistRules`: exact and substring exclusion rules
//! - `partition` / `filter`: two-phase removal of blacklisted branches
//! - `partition_domain`: the same removal over one domain's closure
//! - `extract_taxonomy`: closure of one domain over a built tree
//!
//! ## Flow
//!
//! Seeds are expanded into one shared tree, optionally skipping blacklisted
//! branches while expanding. The tree is then filtered with each domain's
//! effective blacklist, and the domain's taxonomy is extracted from the
//! filtered tree.

mod blacklist;
mod builder;
mod filter;
mod taxonomy;
mod tree;

pub use blacklist::{Blacklist, BlacklistMatch, BlacklistRules, WILDCARD};
pub use builder::{expand, expand_filtered, BuildReport, FilterMode, TreeBuilder};
pub use filter::{filter, partition, partition_domain, removal_set, ExclusionReason, Partition};
pub use taxonomy::{extract_taxonomies, extract_taxonomy, Taxonomy, TaxonomyExtractor, TaxonomyMode};
pub use tree::CategoryTree;

/// Label of a category, without the namespace prefix of the source protocol
pub type CategoryLabel = String;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn codes_source() -> MemorySource {
        MemorySource::new()
            .with_subcategories("Códigos jurídicos", ["Sharia", "Códigos por país", "Código Civil"])
            .with_subcategories("Sharia", ["Fiqh"])
            .with_subcategories("Códigos por país", ["Códigos de España"])
            .with_subcategories("Código Civil", Vec::<String>::new())
    }

    #[tokio::test]
    async fn test_deferred_and_in_place_modes_agree_after_filtering() {
        let blacklist = Blacklist::new(["Sharia"], ["por país"]);

        let deferred_source = codes_source();
        let deferred = filter(&expand(&deferred_source, "Códigos jurídicos", 2).await, &blacklist);

        let in_place_source = codes_source();
        let in_place = filter(
            &expand_filtered(&in_place_source, "Códigos jurídicos", 2, &blacklist).await,
            &blacklist,
        );

        assert_eq!(deferred, in_place);
        assert!(in_place_source.total_calls() < deferred_source.total_calls());
    }

    #[tokio::test]
    async fn test_in_place_domain_rules_do_not_hide_categories_from_other_seeds() {
        let source = || {
            MemorySource::new()
                .with_subcategories("A", ["L"])
                .with_subcategories("B", ["L"])
                .with_subcategories("L", ["C"])
                .with_subcategories("C", ["D"])
        };
        let mut rules = BlacklistRules::new();
        rules.set_domain("A", Blacklist::new(["C"], Vec::<String>::new()));

        let deferred_source = source();
        let mut deferred = TreeBuilder::new(&deferred_source, 3);
        let in_place_source = source();
        let mut in_place = TreeBuilder::new(&in_place_source, 3);
        for seed in ["A", "B"] {
            deferred.expand(seed, None).await;
            in_place.expand(seed, Some(&rules.for_domain(seed))).await;
        }
        let (deferred, _) = deferred.finish();
        let (in_place, _) = in_place.finish();

        for seed in ["A", "B"] {
            let blacklist = rules.for_domain(seed);
            assert_eq!(
                partition_domain(&deferred, seed, &blacklist),
                partition_domain(&in_place, seed, &blacklist)
            );
        }
        let b = partition_domain(&in_place, "B", &rules.for_domain("B"));
        assert_eq!(b.whitelist.get("C").unwrap(), ["D"]);
    }

    #[tokio::test]
    async fn test_taxonomy_of_filtered_tree_has_no_removed_category() {
        let source = codes_source();
        let tree = expand(&source, "Códigos jurídicos", 3).await;
        let blacklist = Blacklist::new(["Sharia"], ["por país"]);
        let partition = partition(&tree, &blacklist);
        let taxonomy = extract_taxonomy(&partition.whitelist, "Códigos jurídicos");

        assert!(!partition.blacklist.is_empty());
        for removed in partition.blacklist.keys() {
            assert!(!taxonomy.mentions(removed), "{} leaked", removed);
        }
        assert_eq!(taxonomy.get("Códigos jurídicos").unwrap(), ["Código Civil"]);
    }
}
