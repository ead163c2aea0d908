//! Keyword-based metadata for sections.
//!
//! Derives topics, cross references, required documents and an effective
//! date from a section's heading and body. Also collects the text written
//! under each RAD/PO label line and, for sections without requirements,
//! any plain questions.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::catalog::normalize_id;
use crate::linker::expand_outcome_tokens;
use crate::observe::{PipelineEvent, PipelineObserver, Stage};
use crate::types::{DecisionPoint, Section, SectionQuestion};

/// Keyword → topic label.
const TOPIC_KEYWORDS: &[(&str, &str)] = &[
    ("fire", "Fire Safety"),
    ("electrical", "Electrical"),
    ("plumbing", "Plumbing"),
    ("permit", "Permitting"),
    ("energy", "Energy Efficiency"),
    ("access", "Accessibility"),
    ("structural", "Structural"),
];

/// Keyword → required document label.
const DOCUMENT_KEYWORDS: &[(&str, &str)] = &[
    ("application", "Application Form"),
    ("site plan", "Site Plan"),
    ("engineering", "Engineering Report"),
    ("inspection", "Inspection Report"),
    ("permit", "Permit Certificate"),
];

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"section\s+(?P<id>\d{1,2}\.\d{1,2}\.\d{1,3})").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static EFFECTIVE_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"effective\s+(?P<month>[a-z]+)\s+(?P<year>\d{4})").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static REQUIREMENT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<label>RAD\s*\d+)\b\s*[:.\-]?\s*(?P<rest>.*)$").expect("valid regex")
});

/// "PO4", "PO1-PO3, PO7", "PO2 - 4".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static OUTCOME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<label>PO\s*\d+(?:\s*[-\x{2013},]\s*(?:PO\s*)?\d+)*)\b\s*[:.\-]?\s*(?P<rest>.*)$",
    )
    .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static QUESTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:ead\s+)?question\s*[:\-]\s*(?P<body>.+)$").expect("valid regex")
});

const RESPONSE_OPTIONS: [&str; 2] = ["Yes", "No"];

fn keyword_labels(text: &str, table: &[(&str, &str)]) -> Vec<String> {
    table
        .iter()
        .filter(|(keyword, _)| text.contains(keyword))
        .map(|(_, label)| (*label).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

enum Label {
    Requirement(String),
    Outcomes(Vec<String>),
}

fn match_label(line: &str) -> Option<(Label, &str)> {
    if let Some(caps) = REQUIREMENT_LABEL.captures(line) {
        let label = Label::Requirement(normalize_id(caps.name("label")?.as_str()));
        return Some((label, caps.name("rest").map_or("", |m| m.as_str())));
    }
    let caps = OUTCOME_LABEL.captures(line)?;
    let label = Label::Outcomes(expand_outcome_tokens(caps.name("label")?.as_str()));
    Some((label, caps.name("rest").map_or("", |m| m.as_str())))
}

#[derive(Default)]
struct LabelledTexts {
    requirements: BTreeMap<String, String>,
    outcomes: BTreeMap<String, String>,
}

impl LabelledTexts {
    /// First text seen under a label wins.
    fn flush(&mut self, label: Label, buffer: &[&str]) {
        let content = buffer.join("\n");
        if content.is_empty() {
            return;
        }
        match label {
            Label::Requirement(id) => {
                self.requirements.entry(id).or_insert(content);
            }
            Label::Outcomes(ids) => {
                for id in ids {
                    self.outcomes.entry(id).or_insert_with(|| content.clone());
                }
            }
        }
    }
}

/// Text under each RAD/PO label line: the remainder of the label line plus
/// every following non-blank line up to the next label.
fn collect_labelled_texts(lines: &[String]) -> LabelledTexts {
    let mut texts = LabelledTexts::default();
    let mut current: Option<(Label, Vec<&str>)> = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match match_label(line) {
            Some((label, rest)) => {
                if let Some((previous, buffer)) = current.take() {
                    texts.flush(previous, &buffer);
                }
                let rest = rest.trim();
                let buffer = if rest.is_empty() { Vec::new() } else { vec![rest] };
                current = Some((label, buffer));
            }
            None => {
                if let Some((_, buffer)) = current.as_mut() {
                    buffer.push(line);
                }
            }
        }
    }

    if let Some((label, buffer)) = current {
        texts.flush(label, &buffer);
    }
    texts
}

/// "Question: ..." lines (a trailing "?" is added) and lines ending in "?".
fn question_text(line: &str) -> Option<String> {
    let line = line.trim();
    if let Some(caps) = QUESTION_PATTERN.captures(line) {
        let body = caps.name("body")?.as_str().trim();
        return match body {
            "" => None,
            _ if body.ends_with('?') => Some(body.to_string()),
            _ => Some(format!("{body}?")),
        };
    }
    line.ends_with('?').then(|| line.to_string())
}

fn section_questions(section: &Section) -> Vec<SectionQuestion> {
    let references = if section.references.is_empty() {
        std::iter::once(section.breadcrumb.clone())
            .filter(|b| !b.is_empty())
            .collect()
    } else {
        section.references.clone()
    };

    section
        .body_lines
        .iter()
        .filter_map(|line| question_text(line))
        .enumerate()
        .map(|(index, text)| SectionQuestion {
            question_id: format!("{}-q{}", section.section_id, index + 1),
            text,
            response_options: RESPONSE_OPTIONS.iter().map(|o| (*o).to_string()).collect(),
            references: references.clone(),
        })
        .collect()
}

/// Add derived metadata to one section.
#[must_use]
pub fn enrich_section(mut section: Section) -> Section {
    let combined = format!("{} {}", section.heading, section.body()).to_lowercase();

    section.topics = keyword_labels(&combined, TOPIC_KEYWORDS);
    section.requires_documents = keyword_labels(&combined, DOCUMENT_KEYWORDS);

    section.references = REFERENCE_PATTERN
        .captures_iter(&combined)
        .filter_map(|caps| caps.name("id"))
        .map(|id| id.as_str())
        .filter(|id| *id != section.section_id)
        .map(|id| format!("Section {id}"))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    section.effective_date = EFFECTIVE_DATE_PATTERN.captures(&combined).and_then(|caps| {
        let month = caps.name("month")?.as_str();
        let year = caps.name("year")?.as_str();
        Some(format!("{} {year}", title_case(month)))
    });

    let texts = collect_labelled_texts(&section.body_lines);
    section.questions = if texts.requirements.is_empty() {
        section_questions(&section)
    } else {
        Vec::new()
    };
    section.requirement_texts = texts.requirements;
    section.outcome_texts = texts.outcomes;

    section
}

fn longer_labelled(id: &str, collected: Option<&String>, current: &str) -> Option<String> {
    let labelled = format!("{id} {}", collected?);
    (labelled.chars().count() > current.trim().chars().count()).then_some(labelled)
}

/// Widen a decision point placed on `section` with the section's own text.
///
/// The requirement text and each outcome detail text are replaced by the
/// label-prefixed text collected under the same id in the section, when that
/// is longer. Catalog items only carry their own block, so this recovers
/// requirements and outcomes written over several lines.
#[must_use]
pub fn apply_section_texts(section: &Section, mut point: DecisionPoint) -> DecisionPoint {
    if let Some(text) = longer_labelled(
        &point.rad_id,
        section.requirement_texts.get(&point.rad_id),
        &point.rad_text,
    ) {
        point.rad_text = text;
    }
    for detail in &mut point.po_details {
        if let Some(text) =
            longer_labelled(&detail.po_id, section.outcome_texts.get(&detail.po_id), &detail.text)
        {
            detail.text = text;
        }
    }
    point
}

/// Add derived metadata to every section.
pub fn enrich_sections(sections: Vec<Section>, observer: &dyn PipelineObserver) -> Vec<Section> {
    let enriched: Vec<Section> = sections.into_iter().map(enrich_section).collect();
    observer.on_event(&PipelineEvent::StageFinished {
        stage: Stage::Enrich,
        items: enriched.len(),
    });
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, heading: &str, body: &[&str]) -> Section {
        Section {
            section_id: id.to_string(),
            heading: heading.to_string(),
            body_lines: body.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_topics_are_sorted_and_unique() {
        let enriched = enrich_section(section(
            "1.1.1",
            "Section 1.1.1 Fire access",
            &["A permit is required for fire separation.", "Fire doors"],
        ));
        assert_eq!(
            enriched.topics,
            vec!["Accessibility", "Fire Safety", "Permitting"]
        );
    }

    #[test]
    fn test_references_exclude_self() {
        let enriched = enrich_section(section(
            "1.1.1",
            "Section 1.1.1 Scope",
            &["Refer to Section 2.3.4 and section 1.1.1.", "See SECTION 2.3.4 again."],
        ));
        assert_eq!(enriched.references, vec!["Section 2.3.4"]);
    }

    #[test]
    fn test_required_documents() {
        let enriched = enrich_section(section(
            "1.1.1",
            "Section 1.1.1 Lodgement",
            &["Lodge an application with a site plan."],
        ));
        assert_eq!(
            enriched.requires_documents,
            vec!["Application Form", "Site Plan"]
        );
    }

    #[test]
    fn test_effective_date() {
        let enriched = enrich_section(section(
            "1.1.1",
            "Section 1.1.1 Scope",
            &["This section is effective March 2024."],
        ));
        assert_eq!(enriched.effective_date.as_deref(), Some("March 2024"));

        let plain = enrich_section(section("1.1.1", "Section 1.1.1 Scope", &["No dates."]));
        assert_eq!(plain.effective_date, None);
        assert!(plain.topics.is_empty());
    }

    #[test]
    fn test_labelled_texts_span_lines() {
        let enriched = enrich_section(section(
            "9.3.1",
            "Section 9.3.1 Accommodation",
            &[
                "Purpose statement.",
                "RAD1: Buildings are setback",
                "from every boundary.",
                "PO1-PO2 Setbacks protect amenity",
                "and privacy.",
                "RAD 2",
                "Parking is provided on site.",
                "PO3.",
            ],
        ));

        assert_eq!(
            enriched.requirement_texts.get("RAD1").map(String::as_str),
            Some("Buildings are setback\nfrom every boundary.")
        );
        assert_eq!(
            enriched.requirement_texts.get("RAD2").map(String::as_str),
            Some("Parking is provided on site.")
        );
        assert_eq!(
            enriched.outcome_texts.get("PO1").map(String::as_str),
            Some("Setbacks protect amenity\nand privacy.")
        );
        assert_eq!(enriched.outcome_texts.get("PO1"), enriched.outcome_texts.get("PO2"));
        assert!(!enriched.outcome_texts.contains_key("PO3"));
        assert!(enriched.questions.is_empty());
    }

    #[test]
    fn test_label_prefix_needs_a_number() {
        let enriched = enrich_section(section(
            "1.1.1",
            "Section 1.1.1 Scope",
            &["Policy applies to radius checks?", "Radial layouts are fine."],
        ));
        assert!(enriched.requirement_texts.is_empty());
        assert!(enriched.outcome_texts.is_empty());
        assert_eq!(enriched.questions.len(), 1);
    }

    #[test]
    fn test_questions_without_requirements() {
        let mut input = section(
            "4.2.1",
            "Section 4.2.1 Signage",
            &[
                "Question: Is the sign illuminated",
                "EAD question - Does it face a road?",
                "Is a permit displayed?",
                "Signs are limited to one per frontage.",
                "Question:   ",
            ],
        );
        input.breadcrumb = "Section 4.2.1: Signage".into();
        let enriched = enrich_section(input);

        let texts: Vec<&str> = enriched.questions.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Is the sign illuminated?",
                "Does it face a road?",
                "Is a permit displayed?"
            ]
        );
        assert_eq!(enriched.questions[0].question_id, "4.2.1-q1");
        assert_eq!(enriched.questions[2].question_id, "4.2.1-q3");
        assert_eq!(enriched.questions[0].response_options, vec!["Yes", "No"]);
        assert_eq!(enriched.questions[0].references, vec!["Section 4.2.1: Signage"]);
    }

    #[test]
    fn test_question_references_prefer_cross_references() {
        let enriched = enrich_section(section(
            "4.2.1",
            "Section 4.2.1 Signage",
            &["Does Section 4.1.1 apply?"],
        ));
        assert_eq!(enriched.questions[0].references, vec!["Section 4.1.1"]);
    }

    #[test]
    fn test_requirements_suppress_questions() {
        let enriched = enrich_section(section(
            "4.2.1",
            "Section 4.2.1 Signage",
            &["Is the sign illuminated?", "RAD4 Signs are not illuminated."],
        ));
        assert!(enriched.questions.is_empty());
        assert_eq!(enriched.requirement_texts.len(), 1);
    }

    #[test]
    fn test_apply_section_texts_widens_short_texts() {
        use crate::types::{CatalogItem, ItemKind, OutcomeDetail};

        let enriched = enrich_section(section(
            "9.3.1",
            "Section 9.3.1 Accommodation",
            &[
                "RAD1 Buildings are setback",
                "from every boundary.",
                "PO1 Amenity is protected.",
            ],
        ));

        let rad = CatalogItem::new(
            "RAD1",
            ItemKind::Requirement,
            "RAD1 Buildings are setback",
            1,
            (0, 4),
        );
        let po = CatalogItem::new("PO1", ItemKind::Outcome, "PO1 Amenity is protected.", 1, (0, 3));
        let point = DecisionPoint::new(&rad, "q?")
            .with_outcomes(vec!["PO1".into()], vec![OutcomeDetail::from(&po)]);

        let widened = apply_section_texts(&enriched, point);
        assert_eq!(widened.rad_text, "RAD1 Buildings are setback\nfrom every boundary.");
        assert_eq!(widened.po_details[0].text, "PO1 Amenity is protected.");
        assert_eq!(widened.question, "q?");

        let elsewhere = apply_section_texts(&Section::default(), widened.clone());
        assert_eq!(elsewhere, widened);
    }
}
