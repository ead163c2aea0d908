//! Configuration constants and heading/identifier patterns.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{IngestError, Result};

/// Outcome candidates are searched within this many pages of a requirement.
pub const PAGE_PROXIMITY_WINDOW: u32 = 1;

/// Minimum Jaccard score (exclusive) for the lexical outcome fallback.
pub const OUTCOME_SIMILARITY_THRESHOLD: f64 = 0.10;

/// Maximum number of outcomes returned by the lexical fallback.
pub const MAX_SIMILAR_OUTCOMES: usize = 3;

/// Minimum Jaccard score (inclusive) for linking an evidence item.
pub const EVIDENCE_OVERLAP_THRESHOLD: f64 = 0.05;

/// A correspondence table closes after more than this many consecutive blank blocks.
pub const TABLE_BLANK_RUN_LIMIT: usize = 5;

/// Phrase that opens a correspondence table (matched lowercased, anywhere in the line).
pub const TABLE_OPEN_PHRASE: &str = "corresponding po";

/// Phrase that closes a correspondence table (matched lowercased, at line start).
pub const TABLE_CLOSE_PHRASE: &str = "where accepted";

/// Largest outcome range ("PO1-PO500") expanded in a correspondence table.
/// Wider ranges keep only their first id.
pub const MAX_OUTCOME_RANGE: u64 = 500;

/// Maximum number of characters submitted to the structured extractor.
pub const EXTRACTION_MAX_CHARS: usize = 6000;

/// Maximum length of the section summary in the wizard payload.
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Separator used to join breadcrumb levels.
pub const BREADCRUMB_SEPARATOR: &str = " > ";

/// Title heading: "Title 9 - Development Codes".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub(crate) static TITLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Title\s+(?P<num>\d+)\s*[-:.]?\s*(?P<name>.*)$").expect("valid regex")
});

/// Chapter heading: "Chapter 3: Assessment Benchmarks".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub(crate) static CHAPTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Chapter\s+(?P<num>\d+)\s*[-:.]?\s*(?P<name>.*)$").expect("valid regex")
});

/// Section heading: "Section 9.3.1 Accommodation activities" or "9.3.1 - Accommodation".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub(crate) static SECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Section\s+)?(?P<id>\d{1,2}\.\d{1,2}\.\d{1,3})\s+[-:]?\s*(?P<title>.+)$")
        .expect("valid regex")
});

/// Catalog identifier token: RAD12, PO 4, EAD3.1.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub(crate) static ITEM_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b((?:RAD|PO|EAD)\s*\d+[.\d]*)\b").expect("valid regex")
});

/// Bare dotted section id.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SECTION_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}\.\d{1,2}\.\d{1,3}$").expect("valid regex"));

/// Validate a dotted section id ("9.3.1").
///
/// # Examples
/// ```
/// use citycode_ingest::config::validate_section_id;
///
/// assert!(validate_section_id("9.3.1").is_ok());
/// assert!(validate_section_id("9.3").is_err());
/// assert!(validate_section_id("").is_err());
/// ```
pub fn validate_section_id(section_id: &str) -> Result<()> {
    if SECTION_ID_PATTERN.is_match(section_id) {
        Ok(())
    } else {
        Err(IngestError::MalformedInput(format!(
            "invalid section id '{section_id}', expected N.N.N (e.g. 9.3.1)"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_section_id() {
        assert!(validate_section_id("1.1.1").is_ok());
        assert!(validate_section_id("12.34.567").is_ok());
        assert!(validate_section_id("123.1.1").is_err());
        assert!(validate_section_id("1.1.1.1").is_err());
        assert!(validate_section_id("a.b.c").is_err());
    }

    #[test]
    fn test_section_pattern_optional_prefix() {
        let caps = SECTION_PATTERN.captures("Section 9.3.1 Accommodation").unwrap();
        assert_eq!(&caps["id"], "9.3.1");
        assert_eq!(&caps["title"], "Accommodation");

        let caps = SECTION_PATTERN.captures("9.3.2 - Car parking").unwrap();
        assert_eq!(&caps["id"], "9.3.2");
        assert_eq!(&caps["title"], "Car parking");
    }

    #[test]
    fn test_section_pattern_requires_title() {
        assert!(SECTION_PATTERN.captures("9.3.1").is_none());
        assert!(SECTION_PATTERN.captures("Section 9.3").is_none());
    }

    #[test]
    fn test_title_and_chapter_patterns() {
        let caps = TITLE_PATTERN.captures("TITLE 9 - Development Codes").unwrap();
        assert_eq!(&caps["num"], "9");
        assert_eq!(&caps["name"], "Development Codes");

        let caps = CHAPTER_PATTERN.captures("Chapter 3").unwrap();
        assert_eq!(&caps["num"], "3");
        assert_eq!(&caps["name"], "");
    }

    #[test]
    fn test_item_id_pattern() {
        let ids: Vec<_> = ITEM_ID_PATTERN
            .find_iter("See RAD1, po 4 and EAD3.1 but not RADIUS9")
            .map(|m| m.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["RAD1", "po 4", "EAD3.1"]);
    }
}
