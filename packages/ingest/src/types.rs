//! Core data types for the ingestion pipeline.
//!
//! These types describe the document layout consumed by the core, the
//! sections and catalog it derives, and the decision points that bundle a
//! requirement with its supporting items.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::BREADCRUMB_SEPARATOR;

/// Category of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    /// Requirement statement needing a compliance determination (RAD).
    #[serde(rename = "RAD")]
    Requirement,

    /// Performance-outcome statement (PO).
    #[serde(rename = "PO")]
    Outcome,

    /// Evidence/assessment entry (EAD).
    #[serde(rename = "EAD")]
    Evidence,
}

impl ItemKind {
    /// All kinds in catalog bucket order.
    pub const ALL: [ItemKind; 3] = [Self::Requirement, Self::Outcome, Self::Evidence];

    /// Identifier prefix, also used as the bucket key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requirement => "RAD",
            Self::Outcome => "PO",
            Self::Evidence => "EAD",
        }
    }

    /// Classify a normalized identifier by its prefix.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        let upper = id.trim().to_uppercase();
        if upper.starts_with("RAD") {
            Some(Self::Requirement)
        } else if upper.starts_with("PO") {
            Some(Self::Outcome)
        } else if upper.starts_with("EAD") {
            Some(Self::Evidence)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned text block of a layout page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Extractor-assigned identifier, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Text content of the block.
    #[serde(default)]
    pub text: String,

    /// Bounding box `[x0, y0, x1, y1]`.
    #[serde(default)]
    pub bbox: Vec<f64>,
}

impl Block {
    /// Create a block with the given text and an empty bounding box.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            bbox: Vec::new(),
        }
    }

    /// Set the bounding box.
    #[must_use]
    pub fn with_bbox(mut self, bbox: [f64; 4]) -> Self {
        self.bbox = bbox.to_vec();
        self
    }
}

/// A single page of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    #[serde(default = "default_page_number")]
    pub page_number: u32,

    /// Blocks in reading order.
    #[serde(default)]
    pub blocks: Vec<Block>,
}

fn default_page_number() -> u32 {
    1
}

impl Page {
    /// Create a page from blocks.
    #[must_use]
    pub fn new(page_number: u32, blocks: Vec<Block>) -> Self {
        Self {
            page_number,
            blocks,
        }
    }
}

/// Page/block layout of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Pages in document order.
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Layout {
    /// Create a layout from pages.
    #[must_use]
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Single-page layout with one block per line.
    ///
    /// Used when the document source offers no positional information.
    #[must_use]
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let blocks = lines
            .iter()
            .enumerate()
            .map(|(idx, line)| Block {
                id: Some(format!("block-{idx}")),
                text: line.as_ref().to_string(),
                bbox: vec![0.0, idx as f64, 0.0, (idx + 1) as f64],
            })
            .collect();
        Self::new(vec![Page::new(1, blocks)])
    }

    /// Iterate over `(page_number, block)` pairs in document order.
    pub fn blocks(&self) -> impl Iterator<Item = (u32, &Block)> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter().map(move |block| (page.page_number, block)))
    }
}

/// A catalog entry for a RAD, PO or EAD identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Normalized identifier (e.g. "RAD12").
    pub id: String,

    /// Full text of the block the identifier was found in.
    #[serde(default)]
    pub text: String,

    /// 1-based page number.
    #[serde(default)]
    pub page: Option<u32>,

    /// Half-open character span `[start, end]`, page-local.
    #[serde(default)]
    pub span: Vec<usize>,

    /// Item category.
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

impl CatalogItem {
    /// Create a catalog item.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: ItemKind,
        text: impl Into<String>,
        page: u32,
        span: (usize, usize),
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            page: Some(page),
            span: vec![span.0, span.1],
            kind,
        }
    }

    /// Page number, or 0 when absent.
    #[must_use]
    pub fn page_or_zero(&self) -> u32 {
        self.page.unwrap_or(0)
    }
}

/// Deduplicated, typed collection of all items found in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "RAD", default)]
    pub requirements: Vec<CatalogItem>,

    #[serde(rename = "PO", default)]
    pub outcomes: Vec<CatalogItem>,

    #[serde(rename = "EAD", default)]
    pub evidence: Vec<CatalogItem>,
}

impl Catalog {
    /// Items of one kind.
    #[must_use]
    pub fn bucket(&self, kind: ItemKind) -> &[CatalogItem] {
        match kind {
            ItemKind::Requirement => &self.requirements,
            ItemKind::Outcome => &self.outcomes,
            ItemKind::Evidence => &self.evidence,
        }
    }

    /// Mutable items of one kind.
    pub fn bucket_mut(&mut self, kind: ItemKind) -> &mut Vec<CatalogItem> {
        match kind {
            ItemKind::Requirement => &mut self.requirements,
            ItemKind::Outcome => &mut self.outcomes,
            ItemKind::Evidence => &mut self.evidence,
        }
    }

    /// Look up an item by kind and id.
    #[must_use]
    pub fn find(&self, kind: ItemKind, id: &str) -> Option<&CatalogItem> {
        self.bucket(kind).iter().find(|item| item.id == id)
    }

    /// Iterate over every item, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        ItemKind::ALL.into_iter().flat_map(|kind| self.bucket(kind).iter())
    }

    /// Total number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requirements.len() + self.outcomes.len() + self.evidence.len()
    }

    /// Whether the catalog holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A hierarchical code section produced by the segmenter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Dotted id, e.g. "9.3.1".
    pub section_id: String,

    /// Full heading, e.g. "Section 9.3.1 Accommodation activities".
    pub heading: String,

    /// Title fragment of the heading, e.g. "Accommodation activities".
    pub section_title: String,

    #[serde(default)]
    pub title_number: Option<u32>,

    #[serde(default)]
    pub title_name: Option<String>,

    #[serde(default)]
    pub chapter_number: Option<u32>,

    #[serde(default)]
    pub chapter_name: Option<String>,

    /// "Title N: name > Chapter N: name > Section ID: title".
    pub breadcrumb: String,

    /// The levels `breadcrumb` was joined from.
    #[serde(default)]
    pub breadcrumb_levels: Vec<String>,

    /// Non-heading lines in document order.
    #[serde(default)]
    pub body_lines: Vec<String>,

    #[serde(default)]
    pub topics: Vec<String>,

    #[serde(default)]
    pub references: Vec<String>,

    #[serde(default)]
    pub requires_documents: Vec<String>,

    #[serde(default)]
    pub effective_date: Option<String>,

    /// Body text following each RAD label line, keyed by requirement id.
    #[serde(default)]
    pub requirement_texts: BTreeMap<String, String>,

    /// Body text following each PO label line, keyed by outcome id.
    #[serde(default)]
    pub outcome_texts: BTreeMap<String, String>,

    /// Plain questions, only collected when the body has no RAD labels.
    #[serde(default)]
    pub questions: Vec<SectionQuestion>,

    #[serde(default)]
    pub decision_points: Vec<DecisionPoint>,
}

impl Section {
    /// Body text: body lines joined by newlines and trimmed.
    #[must_use]
    pub fn body(&self) -> String {
        self.body_lines.join("\n").trim().to_string()
    }

    /// Breadcrumb levels. Sections built without recorded levels fall back to
    /// splitting `breadcrumb` on the separator.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<String> {
        if !self.breadcrumb_levels.is_empty() {
            return self.breadcrumb_levels.clone();
        }
        if self.breadcrumb.is_empty() {
            return Vec::new();
        }
        self.breadcrumb
            .split(BREADCRUMB_SEPARATOR)
            .map(str::to_string)
            .collect()
    }
}

/// A yes/no question written directly in a section body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionQuestion {
    /// "<section id>-q<n>", numbered from 1.
    pub question_id: String,
    pub text: String,
    pub response_options: Vec<String>,
    /// Section cross references, or its breadcrumb when there are none.
    pub references: Vec<String>,
}

/// Detail record for a linked outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeDetail {
    pub po_id: String,
    pub text: String,
    pub page: Option<u32>,
    pub span: Vec<usize>,
}

impl From<&CatalogItem> for OutcomeDetail {
    fn from(item: &CatalogItem) -> Self {
        Self {
            po_id: item.id.clone(),
            text: item.text.clone(),
            page: item.page,
            span: item.span.clone(),
        }
    }
}

/// Detail record for a linked evidence item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceDetail {
    pub ead_id: String,
    pub text: String,
    pub page: Option<u32>,
    pub span: Vec<usize>,
}

impl From<&CatalogItem> for EvidenceDetail {
    fn from(item: &CatalogItem) -> Self {
        Self {
            ead_id: item.id.clone(),
            text: item.text.clone(),
            page: item.page,
            span: item.span.clone(),
        }
    }
}

/// Where in the source a requirement was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub page: Option<u32>,
    pub span: Vec<usize>,
}

/// A requirement bundled with its resolved outcome/evidence links.
///
/// `no_po_applicable` is true exactly when `po_links` is empty; the
/// constructors keep the two in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPoint {
    pub rad_id: String,
    pub rad_text: String,
    pub question: String,
    #[serde(default)]
    pub po_links: Vec<String>,
    #[serde(default)]
    pub po_details: Vec<OutcomeDetail>,
    #[serde(default)]
    pub ead_links: Vec<String>,
    #[serde(default)]
    pub ead_details: Vec<EvidenceDetail>,
    #[serde(default)]
    pub source_refs: Vec<SourceRef>,
    #[serde(default)]
    pub no_po_applicable: bool,
}

impl DecisionPoint {
    /// Create a decision point for a requirement with no links yet.
    #[must_use]
    pub fn new(requirement: &CatalogItem, question: impl Into<String>) -> Self {
        Self {
            rad_id: requirement.id.clone(),
            rad_text: requirement.text.clone(),
            question: question.into(),
            po_links: Vec::new(),
            po_details: Vec::new(),
            ead_links: Vec::new(),
            ead_details: Vec::new(),
            source_refs: vec![SourceRef {
                page: requirement.page,
                span: requirement.span.clone(),
            }],
            no_po_applicable: true,
        }
    }

    /// Set the outcome links; updates `no_po_applicable`.
    #[must_use]
    pub fn with_outcomes(mut self, links: Vec<String>, details: Vec<OutcomeDetail>) -> Self {
        self.no_po_applicable = links.is_empty();
        self.po_links = links;
        self.po_details = details;
        self
    }

    /// Set the evidence links.
    #[must_use]
    pub fn with_evidence(mut self, links: Vec<String>, details: Vec<EvidenceDetail>) -> Self {
        self.ead_links = links;
        self.ead_details = details;
        self
    }
}

/// Jurisdiction metadata stamped on every payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jurisdiction {
    pub city: String,
    pub state: String,
    pub version: String,
    /// UTC date (YYYY-MM-DD) the payload was built; set by the builder.
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub source_url: String,
}

impl Jurisdiction {
    /// Create jurisdiction metadata.
    #[must_use]
    pub fn new(city: impl Into<String>, state: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
            version: version.into(),
            last_updated: String::new(),
            source_url: String::new(),
        }
    }

    /// Set the source URL.
    #[must_use]
    pub fn with_source_url(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = source_url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_from_id() {
        assert_eq!(ItemKind::from_id("RAD12"), Some(ItemKind::Requirement));
        assert_eq!(ItemKind::from_id("po4"), Some(ItemKind::Outcome));
        assert_eq!(ItemKind::from_id("EAD3.1"), Some(ItemKind::Evidence));
        assert_eq!(ItemKind::from_id("AO1"), None);
    }

    #[test]
    fn test_item_kind_serializes_as_prefix() {
        let json = serde_json::to_string(&ItemKind::Evidence).unwrap();
        assert_eq!(json, "\"EAD\"");
    }

    #[test]
    fn test_layout_from_lines() {
        let layout = Layout::from_lines(&["first", "second"]);
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(layout.pages[0].page_number, 1);
        assert_eq!(layout.pages[0].blocks[1].text, "second");
        assert_eq!(layout.pages[0].blocks[1].bbox, vec![0.0, 1.0, 0.0, 2.0]);
        assert_eq!(layout.pages[0].blocks[1].id.as_deref(), Some("block-1"));
    }

    #[test]
    fn test_layout_deserialize_defaults() {
        let layout: Layout =
            serde_json::from_str(r#"{"pages":[{"blocks":[{"text":"RAD1"},{}]}]}"#).unwrap();
        assert_eq!(layout.pages[0].page_number, 1);
        assert_eq!(layout.pages[0].blocks[1].text, "");
    }

    #[test]
    fn test_catalog_serializes_buckets_by_prefix() {
        let mut catalog = Catalog::default();
        catalog
            .requirements
            .push(CatalogItem::new("RAD1", ItemKind::Requirement, "RAD1 text", 2, (0, 4)));

        let value = serde_json::to_value(&catalog).unwrap();
        assert_eq!(value["RAD"][0]["id"], "RAD1");
        assert_eq!(value["RAD"][0]["type"], "RAD");
        assert_eq!(value["RAD"][0]["span"], serde_json::json!([0, 4]));
        assert!(value["PO"].as_array().unwrap().is_empty());
        assert!(value["EAD"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_decision_point_flag_tracks_outcomes() {
        let rad = CatalogItem::new("RAD1", ItemKind::Requirement, "text", 1, (0, 4));
        let dp = DecisionPoint::new(&rad, "q?");
        assert!(dp.no_po_applicable);

        let dp = dp.with_outcomes(vec!["PO1".into()], Vec::new());
        assert!(!dp.no_po_applicable);

        let dp = dp.with_outcomes(Vec::new(), Vec::new());
        assert!(dp.no_po_applicable);
    }

    #[test]
    fn test_section_body_and_breadcrumbs() {
        let section = Section {
            section_id: "1.1.1".into(),
            breadcrumb: "Title 1 > Chapter 1 > Section 1.1.1: Scope".into(),
            body_lines: vec!["first".into(), "second".into()],
            ..Default::default()
        };
        assert_eq!(section.body(), "first\nsecond");
        assert_eq!(
            section.breadcrumbs(),
            vec!["Title 1", "Chapter 1", "Section 1.1.1: Scope"]
        );
    }
}
