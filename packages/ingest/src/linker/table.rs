//! Correspondence-table parsing.
//!
//! A correspondence table is a run of layout blocks declaring which
//! performance outcomes satisfy which requirements:
//!
//! ```text
//! Corresponding PO            <- opens the table
//! PO1-PO3, PO7                <- current outcome set
//! RAD1                        <- RAD1 -> PO1, PO2, PO3, PO7
//! RAD2:                       <- RAD2 -> PO1, PO2, PO3, PO7
//! PO4                         <- new outcome set
//! RAD3                        <- RAD3 -> PO4
//! Where accepted ...          <- closes the table
//! ```

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use std::sync::LazyLock;

use crate::config::{
    MAX_OUTCOME_RANGE, TABLE_BLANK_RUN_LIMIT, TABLE_CLOSE_PHRASE, TABLE_OPEN_PHRASE,
};
use crate::observe::{PipelineEvent, PipelineObserver, TracingObserver};
use crate::types::Layout;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LIST_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*").expect("valid regex"));

/// Requirement id → ordered, unique outcome ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrespondenceMapping {
    entries: BTreeMap<String, Vec<String>>,
}

impl CorrespondenceMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind outcomes to a requirement, keeping first-seen order and dropping
    /// duplicates.
    pub fn bind<I, S>(&mut self, rad_id: impl Into<String>, outcomes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bound = self.entries.entry(rad_id.into()).or_default();
        let mut seen: HashSet<String> = bound.iter().cloned().collect();
        for outcome in outcomes {
            let outcome = outcome.into();
            if !outcome.is_empty() && seen.insert(outcome.clone()) {
                bound.push(outcome);
            }
        }
    }

    /// Outcomes bound to a requirement; empty when none.
    #[must_use]
    pub fn outcomes(&self, rad_id: &str) -> &[String] {
        self.entries.get(rad_id).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<K, V> FromIterator<(K, V)> for CorrespondenceMapping
where
    K: Into<String>,
    V: IntoIterator,
    V::Item: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut mapping = Self::new();
        for (rad_id, outcomes) in iter {
            mapping.bind(rad_id, outcomes);
        }
        mapping
    }
}

fn first_number(value: &str) -> Option<u64> {
    DIGITS.find(value).and_then(|m| m.as_str().parse().ok())
}

/// Expand an outcome list such as `"PO1-PO3, PO7"` into ids.
///
/// En dashes count as hyphens and ranges are inclusive. A range wider than
/// [`MAX_OUTCOME_RANGE`] keeps only its first id. When no part yields a number
/// the whole token, whitespace-stripped and upper-cased, is returned.
///
/// # Examples
/// ```
/// use citycode_ingest::linker::expand_outcome_tokens;
///
/// assert_eq!(expand_outcome_tokens("PO1-PO3"), vec!["PO1", "PO2", "PO3"]);
/// assert_eq!(expand_outcome_tokens("PO4,PO6"), vec!["PO4", "PO6"]);
/// ```
#[must_use]
pub fn expand_outcome_tokens(token: &str) -> Vec<String> {
    expand_with(token, &TracingObserver)
}

fn expand_with(token: &str, observer: &dyn PipelineObserver) -> Vec<String> {
    let token = token.replace('\u{2013}', "-");
    let mut ids = Vec::new();

    for part in LIST_SEPARATOR.split(&token) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((left, right)) = part.split_once('-') {
            if let (Some(from), Some(to)) = (first_number(left), first_number(right)) {
                let size = to.saturating_sub(from).saturating_add(1);
                if size <= MAX_OUTCOME_RANGE {
                    ids.extend((from..=to).map(|n| format!("PO{n}")));
                    continue;
                }
                observer.on_event(&PipelineEvent::OutcomeRangeRejected { token: part, size });
            }
        }

        if let Some(n) = first_number(part) {
            ids.push(format!("PO{n}"));
        }
    }

    if ids.is_empty() {
        ids.push(
            token
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_uppercase(),
        );
    }

    ids
}

/// Requirement id from the first token of a table row ("RAD2:" → "RAD2").
fn row_requirement_id(line: &str) -> Option<String> {
    let first = line.split_whitespace().next()?;
    let id = first
        .trim_end_matches([':', '.', ','])
        .to_uppercase();
    (!id.is_empty()).then_some(id)
}

/// Parse every correspondence table in the layout.
///
/// Requirement rows seen before any outcome row are ignored. Mappings from
/// several tables are merged.
#[must_use]
pub fn parse_correspondence_table(layout: &Layout) -> CorrespondenceMapping {
    parse_correspondence_table_with(layout, &TracingObserver)
}

/// [`parse_correspondence_table`] reporting rejected ranges to `observer`.
#[must_use]
pub fn parse_correspondence_table_with(
    layout: &Layout,
    observer: &dyn PipelineObserver,
) -> CorrespondenceMapping {
    let mut mapping = CorrespondenceMapping::new();
    let mut current: Option<Vec<String>> = None;
    let mut in_table = false;
    let mut blank_run = 0usize;

    for (_, block) in layout.blocks() {
        let text = block.text.trim();
        if text.is_empty() {
            blank_run += 1;
            if in_table && blank_run > TABLE_BLANK_RUN_LIMIT {
                in_table = false;
            }
            continue;
        }

        let lowered = text.to_lowercase();
        if lowered.contains(TABLE_OPEN_PHRASE) {
            in_table = true;
            blank_run = 0;
            continue;
        }

        if !in_table {
            continue;
        }

        blank_run = 0;
        if lowered.starts_with(TABLE_CLOSE_PHRASE) {
            in_table = false;
        } else if lowered.starts_with("po") {
            current = Some(expand_with(text, observer));
        } else if lowered.starts_with("rad") {
            if let (Some(outcomes), Some(rad_id)) = (&current, row_requirement_id(text)) {
                mapping.bind(rad_id, outcomes.iter().cloned());
            }
        }
    }

    mapping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::RecordingObserver;
    use crate::types::{Block, Page};

    fn layout(blocks: &[&str]) -> Layout {
        Layout::new(vec![Page::new(
            1,
            blocks.iter().map(|t| Block::new(*t)).collect(),
        )])
    }

    #[test]
    fn test_expand_range_and_list() {
        assert_eq!(
            expand_outcome_tokens("PO1-PO3, PO7"),
            vec!["PO1", "PO2", "PO3", "PO7"]
        );
        assert_eq!(expand_outcome_tokens("PO4,PO6"), vec!["PO4", "PO6"]);
        assert_eq!(expand_outcome_tokens("PO2 \u{2013} PO4"), vec!["PO2", "PO3", "PO4"]);
    }

    #[test]
    fn test_expand_fallback_token() {
        assert_eq!(expand_outcome_tokens("po n/a"), vec!["PON/A"]);
    }

    #[test]
    fn test_expand_reversed_range_is_empty_part() {
        assert_eq!(expand_outcome_tokens("PO5-PO3, PO9"), vec!["PO9"]);
    }

    #[test]
    fn test_parse_binds_rows_to_latest_outcomes() {
        let mapping = parse_correspondence_table(&layout(&[
            "RAD9 outside the table",
            "Column: Corresponding PO",
            "RAD8 before any outcome",
            "PO1-PO3, PO7",
            "RAD1",
            "rad2:",
            "PO4",
            "RAD3 Building height",
            "Where accepted development applies",
            "PO5",
            "RAD4",
        ]));

        assert_eq!(mapping.outcomes("RAD1"), ["PO1", "PO2", "PO3", "PO7"]);
        assert_eq!(mapping.outcomes("RAD2"), ["PO1", "PO2", "PO3", "PO7"]);
        assert_eq!(mapping.outcomes("RAD3"), ["PO4"]);
        assert!(mapping.outcomes("RAD4").is_empty());
        assert!(mapping.outcomes("RAD8").is_empty());
        assert!(mapping.outcomes("RAD9").is_empty());
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn test_blank_run_closes_table() {
        let mut blocks = vec!["Corresponding PO", "PO1"];
        blocks.extend(["", "", "", "", ""]);
        blocks.push("RAD1");
        blocks.extend(["", "", "", "", "", ""]);
        blocks.push("RAD2");
        let mapping = parse_correspondence_table(&layout(&blocks));

        assert_eq!(mapping.outcomes("RAD1"), ["PO1"]);
        assert!(mapping.outcomes("RAD2").is_empty());
    }

    #[test]
    fn test_duplicate_bindings_preserve_order() {
        let mapping = parse_correspondence_table(&layout(&[
            "Corresponding PO",
            "PO2, PO1",
            "RAD1",
            "PO1, PO3",
            "RAD1",
        ]));
        assert_eq!(mapping.outcomes("RAD1"), ["PO2", "PO1", "PO3"]);
    }

    #[test]
    fn test_mapping_from_iter() {
        let mapping: CorrespondenceMapping =
            [("RAD1", vec!["PO1", "PO1", "PO2"])].into_iter().collect();
        assert_eq!(mapping.outcomes("RAD1"), ["PO1", "PO2"]);
    }

    #[test]
    fn test_expand_oversized_range_keeps_first_id() {
        assert_eq!(expand_outcome_tokens("PO1-PO3000000"), vec!["PO1"]);
        assert_eq!(
            expand_outcome_tokens("PO1-PO99999999999, PO4"),
            vec!["PO1", "PO4"]
        );
    }

    #[test]
    fn test_expand_range_at_limit() {
        let ids = expand_outcome_tokens("PO1-PO500");
        assert_eq!(ids.len(), 500);
        assert_eq!(ids.last().map(String::as_str), Some("PO500"));

        assert_eq!(expand_outcome_tokens("PO1-PO501"), vec!["PO1"]);
    }

    #[test]
    fn test_parse_reports_rejected_range() {
        let observer = RecordingObserver::new();
        let mapping = parse_correspondence_table_with(
            &layout(&["Corresponding PO", "PO1-PO3000000", "RAD1"]),
            &observer,
        );

        assert_eq!(mapping.outcomes("RAD1"), ["PO1"]);
        assert!(observer.contains("outcome range PO1-PO3000000 spans 3000000 ids"));
    }
}
