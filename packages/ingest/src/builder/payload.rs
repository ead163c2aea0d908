//! Wizard and guidance payload shapes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::config::SUMMARY_MAX_CHARS;
use crate::types::{DecisionPoint, Jurisdiction, OutcomeDetail, SectionQuestion};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FIRST_SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?[.!?])(?:\s|$)").expect("valid regex"));

/// Navigation-oriented tree: titles > chapters > sections > decision points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardPayload {
    pub jurisdiction: Jurisdiction,
    pub titles: Vec<WizardTitle>,
}

impl WizardPayload {
    /// Every decision point in tree order.
    pub fn decision_points(&self) -> impl Iterator<Item = &DecisionPoint> {
        self.sections().flat_map(|section| section.decision_points.iter())
    }

    /// Every section in tree order.
    pub fn sections(&self) -> impl Iterator<Item = &WizardSection> {
        self.titles
            .iter()
            .flat_map(|title| title.chapters.iter())
            .flat_map(|chapter| chapter.sections.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardTitle {
    pub title_number: u32,
    pub title_name: String,
    pub chapters: Vec<WizardChapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardChapter {
    pub chapter_number: u32,
    pub chapter_name: String,
    pub sections: Vec<WizardSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSection {
    pub section_id: String,
    pub section_title: String,
    pub breadcrumbs: Vec<String>,
    pub topics: Vec<String>,
    pub decision_points: Vec<DecisionPoint>,
    /// Short summary of the section body.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub requires_documents: Vec<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
    /// Plain questions from sections without requirements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<SectionQuestion>,
}

/// Retrieval-oriented flat list of self-contained entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidancePayload {
    pub jurisdiction: Jurisdiction,
    pub guidance: Vec<GuidanceEntry>,
    pub catalog_summary: CatalogSummary,
}

/// Number of catalog items per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    #[serde(rename = "RAD")]
    pub requirements: usize,
    #[serde(rename = "PO")]
    pub outcomes: usize,
    #[serde(rename = "EAD")]
    pub evidence: usize,
}

/// Where an entry sits in the code, repeated on every entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryContext {
    pub jurisdiction: Jurisdiction,
    pub title_number: u32,
    pub title_name: String,
    pub chapter_number: u32,
    pub chapter_name: String,
    pub section_id: String,
    pub section_title: String,
    pub breadcrumb: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry_type", rename_all = "snake_case")]
pub enum GuidanceEntry {
    /// Full body text of a section.
    Section {
        #[serde(flatten)]
        context: EntryContext,
        guidance: String,
    },

    /// A requirement with its outcome guidance.
    DecisionPoint {
        #[serde(flatten)]
        context: EntryContext,
        rad_id: String,
        question: String,
        rad_text: String,
        po_links: Vec<String>,
        po_details: Vec<OutcomeDetail>,
        guidance: String,
    },
}

impl GuidanceEntry {
    #[must_use]
    pub fn context(&self) -> &EntryContext {
        match self {
            Self::Section { context, .. } | Self::DecisionPoint { context, .. } => context,
        }
    }

    #[must_use]
    pub fn guidance(&self) -> &str {
        match self {
            Self::Section { guidance, .. } | Self::DecisionPoint { guidance, .. } => guidance,
        }
    }

    #[must_use]
    pub fn is_section(&self) -> bool {
        matches!(self, Self::Section { .. })
    }

    /// Entry for a decision point.
    ///
    /// The guidance text is the requirement text followed by one
    /// `PO_ID: text` paragraph per outcome with text.
    #[must_use]
    pub fn for_decision_point(context: EntryContext, point: &DecisionPoint) -> Self {
        let rad_text = point.rad_text.trim().to_string();

        let mut parts: Vec<String> = Vec::new();
        if !rad_text.is_empty() {
            parts.push(rad_text.clone());
        }
        parts.extend(point.po_details.iter().filter_map(|detail| {
            let text = detail.text.trim();
            (!text.is_empty()).then(|| format!("{}: {text}", detail.po_id))
        }));

        Self::DecisionPoint {
            context,
            rad_id: point.rad_id.clone(),
            question: point.question.clone(),
            rad_text,
            po_links: point.po_links.clone(),
            po_details: point.po_details.clone(),
            guidance: parts.join("\n\n"),
        }
    }
}

/// Summary of a section body: its first sentence, else its opening text.
///
/// Whitespace is collapsed and the result is capped at
/// [`SUMMARY_MAX_CHARS`] characters (with a trailing `...` when cut).
/// An empty body yields `title`.
#[must_use]
pub fn summarize(title: &str, body: &str) -> String {
    let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return title.to_string();
    }

    let summary = match FIRST_SENTENCE.captures(&normalized).and_then(|caps| caps.get(1)) {
        Some(sentence) => sentence.as_str().to_string(),
        None => normalized.chars().take(SUMMARY_MAX_CHARS).collect(),
    };

    if summary.chars().count() > SUMMARY_MAX_CHARS {
        let cut: String = summary.chars().take(SUMMARY_MAX_CHARS - 3).collect();
        format!("{}...", cut.trim_end())
    } else {
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogItem, ItemKind};
    use pretty_assertions::assert_eq;

    fn context() -> EntryContext {
        EntryContext {
            jurisdiction: Jurisdiction::new("Brisbane", "QLD", "v1"),
            title_number: 1,
            title_name: "Title 1".into(),
            chapter_number: 1,
            chapter_name: "Chapter 1".into(),
            section_id: "1.1.1".into(),
            section_title: "Scope".into(),
            breadcrumb: "Section 1.1.1: Scope".into(),
        }
    }

    #[test]
    fn test_summarize_first_sentence() {
        assert_eq!(
            summarize("Scope", "This code applies.   It has two parts."),
            "This code applies."
        );
    }

    #[test]
    fn test_summarize_without_sentence_end() {
        assert_eq!(summarize("Scope", "no terminal\npunctuation"), "no terminal punctuation");
    }

    #[test]
    fn test_summarize_empty_body_uses_title() {
        assert_eq!(summarize("Scope", "  \n "), "Scope");
    }

    #[test]
    fn test_summarize_caps_length() {
        let body = format!("{}.", "word ".repeat(100));
        let summary = summarize("t", &body);
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_decision_point_entry_guidance() {
        let rad = CatalogItem::new("RAD1", ItemKind::Requirement, " RAD1 Setbacks ", 1, (0, 4));
        let po1 = CatalogItem::new("PO1", ItemKind::Outcome, "PO1 Buildings are set back", 1, (5, 8));
        let po2 = CatalogItem::new("PO2", ItemKind::Outcome, "", 1, (9, 12));
        let point = DecisionPoint::new(&rad, "q").with_outcomes(
            vec!["PO1".into(), "PO2".into()],
            vec![(&po1).into(), (&po2).into()],
        );

        let entry = GuidanceEntry::for_decision_point(context(), &point);
        assert_eq!(
            entry.guidance(),
            "RAD1 Setbacks\n\nPO1: PO1 Buildings are set back"
        );
        assert!(!entry.is_section());
    }

    #[test]
    fn test_entry_serializes_flat_with_type_tag() {
        let entry = GuidanceEntry::Section {
            context: context(),
            guidance: "body".into(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["entry_type"], "section");
        assert_eq!(value["section_id"], "1.1.1");
        assert_eq!(value["jurisdiction"]["city"], "Brisbane");
        assert_eq!(value["guidance"], "body");
    }

    #[test]
    fn test_catalog_summary_keys() {
        let summary = CatalogSummary {
            requirements: 2,
            outcomes: 1,
            evidence: 0,
        };
        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            serde_json::json!({"RAD": 2, "PO": 1, "EAD": 0})
        );
    }
}
