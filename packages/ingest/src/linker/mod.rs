//! Cross-reference linking.
//!
//! Turns every requirement in a [`Catalog`] into a [`DecisionPoint`]. Outcome
//! links come from the first resolver in the chain that finds any:
//!
//! 1. correspondence table (caller mapping, or parsed from the layout)
//! 2. outcomes within one page of the requirement
//! 3. outcomes with lexically similar text
//!
//! Evidence is linked independently: it must be within one page AND share
//! enough tokens with the requirement.

mod resolver;
mod similarity;
mod table;

pub use resolver::{
    LinkStrategy, OutcomeResolver, ProximityResolver, SimilarityResolver, TableResolver,
};
pub use similarity::{jaccard, tokenize};
pub use table::{
    expand_outcome_tokens, parse_correspondence_table, parse_correspondence_table_with,
    CorrespondenceMapping,
};

use crate::config::EVIDENCE_OVERLAP_THRESHOLD;
use crate::observe::{PipelineEvent, PipelineObserver, Stage, TracingObserver};
use crate::types::{Catalog, CatalogItem, DecisionPoint, EvidenceDetail, Layout, OutcomeDetail};

use resolver::within_page_window;

/// Compliance question for a requirement.
///
/// Uses the first line of the context text (trailing colons removed) when
/// there is one.
///
/// # Examples
/// ```
/// use citycode_ingest::linker::format_question;
///
/// assert_eq!(
///     format_question("RAD1", "RAD1 Setbacks:\nBuildings are set back."),
///     "Does the development comply with RAD1 (RAD1 Setbacks)?"
/// );
/// assert_eq!(format_question("RAD2", ""), "Does the development comply with RAD2?");
/// ```
#[must_use]
pub fn format_question(rad_id: &str, rad_text: &str) -> String {
    let summary = rad_text
        .lines()
        .next()
        .map(|line| line.trim().trim_end_matches(':'))
        .unwrap_or_default();

    if summary.is_empty() {
        format!("Does the development comply with {rad_id}?")
    } else {
        format!("Does the development comply with {rad_id} ({summary})?")
    }
}

/// Evidence items near the requirement with enough token overlap, in catalog order.
fn related_evidence<'a>(requirement: &CatalogItem, catalog: &'a Catalog) -> Vec<&'a CatalogItem> {
    let rad_tokens = tokenize(&requirement.text);

    catalog
        .evidence
        .iter()
        .filter(|evidence| within_page_window(requirement, evidence))
        .filter(|evidence| {
            jaccard(&rad_tokens, &tokenize(&evidence.text)) >= EVIDENCE_OVERLAP_THRESHOLD
        })
        .collect()
}

/// Resolves requirements into decision points.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linker;

impl Linker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build one decision point per requirement, sorted by requirement id.
    ///
    /// A caller-supplied `mapping` replaces the correspondence table parsed
    /// from `layout`.
    pub fn link(
        &self,
        catalog: &Catalog,
        layout: &Layout,
        mapping: Option<&CorrespondenceMapping>,
        observer: &dyn PipelineObserver,
    ) -> Vec<DecisionPoint> {
        let parsed;
        let mapping = match mapping {
            Some(mapping) => mapping,
            None => {
                parsed = parse_correspondence_table_with(layout, observer);
                &parsed
            }
        };

        let table = TableResolver::new(mapping);
        let chain: [&dyn OutcomeResolver; 3] = [&table, &ProximityResolver, &SimilarityResolver];

        let mut decision_points: Vec<DecisionPoint> = catalog
            .requirements
            .iter()
            .map(|requirement| {
                let (strategy, po_links) = chain
                    .iter()
                    .map(|resolver| (resolver.strategy(), resolver.resolve(requirement, catalog)))
                    .find(|(_, ids)| !ids.is_empty())
                    .unwrap_or((LinkStrategy::None, Vec::new()));

                let po_details: Vec<OutcomeDetail> = po_links
                    .iter()
                    .filter_map(|id| catalog.outcomes.iter().find(|item| &item.id == id))
                    .map(OutcomeDetail::from)
                    .collect();

                let evidence = related_evidence(requirement, catalog);
                observer.on_event(&PipelineEvent::RequirementLinked {
                    rad_id: &requirement.id,
                    strategy,
                    outcomes: po_links.len(),
                    evidence: evidence.len(),
                });

                let ead_links = evidence.iter().map(|item| item.id.clone()).collect();
                let ead_details = evidence.into_iter().map(EvidenceDetail::from).collect();

                DecisionPoint::new(requirement, format_question(&requirement.id, &requirement.text))
                    .with_outcomes(po_links, po_details)
                    .with_evidence(ead_links, ead_details)
            })
            .collect();

        decision_points.sort_by(|a, b| a.rad_id.cmp(&b.rad_id));

        observer.on_event(&PipelineEvent::StageFinished {
            stage: Stage::Link,
            items: decision_points.len(),
        });

        decision_points
    }
}

/// Link a catalog using the layout's correspondence table, reporting through `tracing`.
pub fn link_items(catalog: &Catalog, layout: &Layout) -> Vec<DecisionPoint> {
    Linker::new().link(catalog, layout, None, &TracingObserver)
}
