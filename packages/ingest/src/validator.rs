//! Referential integrity audit of a wizard payload against its catalog.
//!
//! Problems are recorded, never raised: a report with issues is still a
//! successful validation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::builder::WizardPayload;
use crate::observe::{PipelineEvent, PipelineObserver, Stage};
use crate::types::{Catalog, ItemKind};

/// Issues grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssues {
    /// Requirements with no outcome links that are not flagged as having none.
    pub missing_links: Vec<String>,
    /// `wizard_rad_missing:<id>` or `<rad_id>-><linked_id>` references to unknown items.
    pub dangling_refs: Vec<String>,
    /// `<TYPE>:<id> missing span|page` for malformed catalog items.
    pub span_conflicts: Vec<String>,
    /// Ids used by more than one catalog item.
    pub duplicate_ids: Vec<String>,
}

impl ValidationIssues {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_links.is_empty()
            && self.dangling_refs.is_empty()
            && self.span_conflicts.is_empty()
            && self.duplicate_ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCounts {
    pub rad: usize,
    pub po: usize,
    pub ead: usize,
    pub decision_points: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    IssuesDetected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: ValidationIssues,
    pub counts: ValidationCounts,
    pub status: ValidationStatus,
}

impl ValidationReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == ValidationStatus::Ok
    }
}

fn ids(catalog: &Catalog, kind: ItemKind) -> HashSet<&str> {
    catalog.bucket(kind).iter().map(|item| item.id.as_str()).collect()
}

fn span_conflicts(catalog: &Catalog) -> Vec<String> {
    let mut conflicts = Vec::new();
    for item in catalog.iter() {
        if item.span.len() != 2 {
            conflicts.push(format!("{}:{} missing span", item.kind, item.id));
        }
        if item.page.is_none() {
            conflicts.push(format!("{}:{} missing page", item.kind, item.id));
        }
    }
    conflicts
}

fn duplicate_ids(catalog: &Catalog) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    for item in catalog.iter() {
        if !seen.insert(item.id.as_str()) {
            duplicates.insert(item.id.clone());
        }
    }
    duplicates.into_iter().collect()
}

/// Audit `wizard` against `catalog`.
#[must_use]
pub fn validate(wizard: &WizardPayload, catalog: &Catalog) -> ValidationReport {
    let rad_ids = ids(catalog, ItemKind::Requirement);
    let po_ids = ids(catalog, ItemKind::Outcome);
    let ead_ids = ids(catalog, ItemKind::Evidence);

    let mut missing_links = BTreeSet::new();
    let mut dangling_refs = BTreeSet::new();
    let mut decision_points = 0;

    for point in wizard.decision_points() {
        decision_points += 1;
        let rad_id = &point.rad_id;

        if point.po_links.is_empty() && !point.no_po_applicable {
            missing_links.insert(rad_id.clone());
        }

        for po_id in point.po_links.iter().filter(|id| !po_ids.contains(id.as_str())) {
            dangling_refs.insert(format!("{rad_id}->{po_id}"));
        }
        for ead_id in point.ead_links.iter().filter(|id| !ead_ids.contains(id.as_str())) {
            dangling_refs.insert(format!("{rad_id}->{ead_id}"));
        }

        if !rad_ids.contains(rad_id.as_str()) {
            dangling_refs.insert(format!("wizard_rad_missing:{rad_id}"));
        }
    }

    let issues = ValidationIssues {
        missing_links: missing_links.into_iter().collect(),
        dangling_refs: dangling_refs.into_iter().collect(),
        span_conflicts: span_conflicts(catalog),
        duplicate_ids: duplicate_ids(catalog),
    };

    let status = if issues.is_empty() {
        ValidationStatus::Ok
    } else {
        ValidationStatus::IssuesDetected
    };

    ValidationReport {
        issues,
        counts: ValidationCounts {
            rad: rad_ids.len(),
            po: po_ids.len(),
            ead: ead_ids.len(),
            decision_points,
        },
        status,
    }
}

/// Audit and report the issue count to `observer`.
pub fn validate_with(
    wizard: &WizardPayload,
    catalog: &Catalog,
    observer: &dyn PipelineObserver,
) -> ValidationReport {
    let report = validate(wizard, catalog);
    let issues = &report.issues;
    observer.on_event(&PipelineEvent::StageFinished {
        stage: Stage::Validate,
        items: issues.missing_links.len()
            + issues.dangling_refs.len()
            + issues.span_conflicts.len()
            + issues.duplicate_ids.len(),
    });
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{WizardChapter, WizardSection, WizardTitle};
    use crate::types::{CatalogItem, DecisionPoint, Jurisdiction};
    use pretty_assertions::assert_eq;

    fn wizard(points: Vec<DecisionPoint>) -> WizardPayload {
        WizardPayload {
            jurisdiction: Jurisdiction::default(),
            titles: vec![WizardTitle {
                title_number: 1,
                title_name: "Title 1".into(),
                chapters: vec![WizardChapter {
                    chapter_number: 1,
                    chapter_name: "Chapter 1".into(),
                    sections: vec![WizardSection {
                        section_id: "1.1.1".into(),
                        section_title: "Scope".into(),
                        breadcrumbs: Vec::new(),
                        topics: Vec::new(),
                        decision_points: points,
                        text: String::new(),
                        references: Vec::new(),
                        requires_documents: Vec::new(),
                        effective_date: None,
                        questions: Vec::new(),
                    }],
                }],
            }],
        }
    }

    fn rad(id: &str) -> CatalogItem {
        CatalogItem::new(id, ItemKind::Requirement, id, 1, (0, 4))
    }

    #[test]
    fn test_dangling_outcome() {
        let catalog = Catalog {
            requirements: vec![rad("RAD1")],
            ..Default::default()
        };
        let point = DecisionPoint::new(&rad("RAD1"), "q").with_outcomes(vec!["PO9".into()], Vec::new());

        let report = validate(&wizard(vec![point]), &catalog);
        assert_eq!(report.issues.dangling_refs, vec!["RAD1->PO9"]);
        assert_eq!(report.status, ValidationStatus::IssuesDetected);
        assert_eq!(
            serde_json::to_value(report.status).unwrap(),
            serde_json::json!("issues_detected")
        );
    }

    #[test]
    fn test_missing_requirement_and_evidence() {
        let point = DecisionPoint::new(&rad("RAD2"), "q").with_evidence(vec!["EAD1".into()], Vec::new());
        let report = validate(&wizard(vec![point]), &Catalog::default());
        assert_eq!(
            report.issues.dangling_refs,
            vec!["RAD2->EAD1", "wizard_rad_missing:RAD2"]
        );
    }

    #[test]
    fn test_missing_links_requires_cleared_flag() {
        let mut unflagged = DecisionPoint::new(&rad("RAD1"), "q");
        unflagged.no_po_applicable = false;
        let flagged = DecisionPoint::new(&rad("RAD2"), "q");
        let catalog = Catalog {
            requirements: vec![rad("RAD1"), rad("RAD2")],
            ..Default::default()
        };

        let report = validate(&wizard(vec![unflagged.clone(), flagged, unflagged]), &catalog);
        assert_eq!(report.issues.missing_links, vec!["RAD1"]);
        assert_eq!(report.counts.decision_points, 3);
    }

    #[test]
    fn test_span_conflicts_and_duplicates() {
        let mut no_span = CatalogItem::new("PO1", ItemKind::Outcome, "PO1", 1, (0, 3));
        no_span.span = vec![0];
        let mut no_page = CatalogItem::new("EAD1", ItemKind::Evidence, "EAD1", 1, (0, 4));
        no_page.page = None;
        let catalog = Catalog {
            requirements: vec![rad("RAD1"), rad("RAD1")],
            outcomes: vec![no_span],
            evidence: vec![no_page],
        };

        let report = validate(&wizard(Vec::new()), &catalog);
        assert_eq!(
            report.issues.span_conflicts,
            vec!["PO:PO1 missing span", "EAD:EAD1 missing page"]
        );
        assert_eq!(report.issues.duplicate_ids, vec!["RAD1"]);
        assert_eq!(report.counts.rad, 1);
        assert!(!report.is_ok());
    }

    #[test]
    fn test_clean_payload_is_ok() {
        let catalog = Catalog {
            requirements: vec![rad("RAD1")],
            outcomes: vec![CatalogItem::new("PO1", ItemKind::Outcome, "PO1", 1, (5, 8))],
            ..Default::default()
        };
        let point = DecisionPoint::new(&rad("RAD1"), "q").with_outcomes(vec!["PO1".into()], Vec::new());

        let report = validate(&wizard(vec![point]), &catalog);
        assert!(report.is_ok());
        assert_eq!(
            report.counts,
            ValidationCounts {
                rad: 1,
                po: 1,
                ead: 0,
                decision_points: 1
            }
        );
    }
}
