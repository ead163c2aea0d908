//! Outcome resolution strategies.
//!
//! Each resolver tries to find the outcomes supporting one requirement. The
//! linker asks them in priority order and keeps the first non-empty answer.

use crate::config::{MAX_SIMILAR_OUTCOMES, OUTCOME_SIMILARITY_THRESHOLD, PAGE_PROXIMITY_WINDOW};
use crate::types::{Catalog, CatalogItem};

use super::similarity::{jaccard, tokenize};
use super::table::CorrespondenceMapping;

/// Which resolution step produced a requirement's outcome links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    CorrespondenceTable,
    PageProximity,
    LexicalSimilarity,
    /// No step produced a link.
    None,
}

impl LinkStrategy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CorrespondenceTable => "correspondence_table",
            Self::PageProximity => "page_proximity",
            Self::LexicalSimilarity => "lexical_similarity",
            Self::None => "none",
        }
    }
}

/// A single step of the outcome fallback chain.
pub trait OutcomeResolver {
    /// Strategy reported when this resolver produces links.
    fn strategy(&self) -> LinkStrategy;

    /// Outcome ids for `requirement`, empty when this step finds nothing.
    fn resolve(&self, requirement: &CatalogItem, catalog: &Catalog) -> Vec<String>;
}

/// Authoritative lookup in a correspondence mapping.
pub struct TableResolver<'a> {
    mapping: &'a CorrespondenceMapping,
}

impl<'a> TableResolver<'a> {
    #[must_use]
    pub fn new(mapping: &'a CorrespondenceMapping) -> Self {
        Self { mapping }
    }
}

impl OutcomeResolver for TableResolver<'_> {
    fn strategy(&self) -> LinkStrategy {
        LinkStrategy::CorrespondenceTable
    }

    fn resolve(&self, requirement: &CatalogItem, _catalog: &Catalog) -> Vec<String> {
        self.mapping.outcomes(&requirement.id).to_vec()
    }
}

/// Whether two items sit within the page proximity window.
pub(crate) fn within_page_window(a: &CatalogItem, b: &CatalogItem) -> bool {
    a.page_or_zero().abs_diff(b.page_or_zero()) <= PAGE_PROXIMITY_WINDOW
}

/// Outcomes on the requirement's page or an adjacent one, sorted by id.
pub struct ProximityResolver;

impl OutcomeResolver for ProximityResolver {
    fn strategy(&self) -> LinkStrategy {
        LinkStrategy::PageProximity
    }

    fn resolve(&self, requirement: &CatalogItem, catalog: &Catalog) -> Vec<String> {
        let mut ids: Vec<String> = catalog
            .outcomes
            .iter()
            .filter(|outcome| within_page_window(requirement, outcome))
            .map(|outcome| outcome.id.clone())
            .collect();
        ids.sort();
        ids
    }
}

/// Outcomes whose text overlaps the requirement's text.
pub struct SimilarityResolver;

impl OutcomeResolver for SimilarityResolver {
    fn strategy(&self) -> LinkStrategy {
        LinkStrategy::LexicalSimilarity
    }

    fn resolve(&self, requirement: &CatalogItem, catalog: &Catalog) -> Vec<String> {
        let rad_tokens = tokenize(&requirement.text);
        if rad_tokens.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(&str, f64)> = catalog
            .outcomes
            .iter()
            .map(|outcome| (outcome.id.as_str(), jaccard(&rad_tokens, &tokenize(&outcome.text))))
            .filter(|(_, score)| *score > OUTCOME_SIMILARITY_THRESHOLD)
            .collect();

        // Stable: equal scores keep catalog order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(MAX_SIMILAR_OUTCOMES)
            .map(|(id, _)| id.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKind;

    fn outcome(id: &str, text: &str, page: u32) -> CatalogItem {
        CatalogItem::new(id, ItemKind::Outcome, text, page, (0, 3))
    }

    fn requirement(text: &str, page: u32) -> CatalogItem {
        CatalogItem::new("RAD1", ItemKind::Requirement, text, page, (0, 4))
    }

    #[test]
    fn test_table_resolver() {
        let mapping: CorrespondenceMapping = [("RAD1", vec!["PO2"])].into_iter().collect();
        let ids = TableResolver::new(&mapping).resolve(&requirement("x", 1), &Catalog::default());
        assert_eq!(ids, vec!["PO2"]);
    }

    #[test]
    fn test_proximity_window() {
        let catalog = Catalog {
            outcomes: vec![
                outcome("PO3", "", 4),
                outcome("PO2", "", 5),
                outcome("PO1", "", 6),
                outcome("PO9", "", 7),
            ],
            ..Default::default()
        };
        let ids = ProximityResolver.resolve(&requirement("x", 5), &catalog);
        assert_eq!(ids, vec!["PO1", "PO2", "PO3"]);
    }

    #[test]
    fn test_similarity_top_three_stable() {
        let catalog = Catalog {
            outcomes: vec![
                outcome("PO1", "car parking spaces", 1),
                outcome("PO2", "unrelated landscaping", 1),
                outcome("PO3", "parking spaces", 1),
                outcome("PO4", "car parking", 1),
                outcome("PO5", "parking", 1),
                outcome("PO6", "car parking spaces", 1),
            ],
            ..Default::default()
        };
        let ids = SimilarityResolver.resolve(&requirement("car parking spaces", 1), &catalog);
        assert_eq!(ids, vec!["PO1", "PO6", "PO3"]);
    }

    #[test]
    fn test_similarity_threshold_is_exclusive() {
        // 1 shared token of 10 distinct ones scores exactly 0.10
        let catalog = Catalog {
            outcomes: vec![outcome("PO1", "a b c d e f g h i shared", 1)],
            ..Default::default()
        };
        let ids = SimilarityResolver.resolve(&requirement("shared", 1), &catalog);
        assert!(ids.is_empty());
    }

    #[test]
    fn test_similarity_empty_requirement_text() {
        let catalog = Catalog {
            outcomes: vec![outcome("PO1", "anything", 1)],
            ..Default::default()
        };
        assert!(SimilarityResolver.resolve(&requirement("", 1), &catalog).is_empty());
    }
}
