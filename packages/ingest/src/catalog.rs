//! Item cataloging.
//!
//! Scans layout blocks for RAD/PO/EAD identifiers and collects them into a
//! deduplicated, sorted [`Catalog`]. The structured extractor may be used
//! instead of the regex scan; any failure falls back to the scan.

use std::collections::HashSet;

use crate::config::{EXTRACTION_MAX_CHARS, ITEM_ID_PATTERN};
use crate::extraction::{ExtractedItem, StructuredExtractor};
use crate::observe::{PipelineEvent, PipelineObserver, Stage, TracingObserver};
use crate::types::{Catalog, CatalogItem, ItemKind, Layout};

/// How identifiers are found.
#[derive(Clone, Copy, Default)]
pub enum CatalogStrategy<'a> {
    /// Regex token scan over every block.
    #[default]
    Regex,

    /// Ask a structured extractor, falling back to the regex scan.
    Structured(&'a dyn StructuredExtractor),
}

impl std::fmt::Debug for CatalogStrategy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Regex => f.write_str("Regex"),
            Self::Structured(_) => f.write_str("Structured"),
        }
    }
}

/// Normalize an identifier token: strip whitespace, upper-case.
#[must_use]
pub fn normalize_id(token: &str) -> String {
    token
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Builds catalogs from layouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cataloger;

impl Cataloger {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Catalog every identifier in `layout`.
    ///
    /// Never fails: extractor errors and empty extraction results are
    /// reported to the observer and the regex scan is used instead.
    pub fn catalog(
        &self,
        layout: &Layout,
        strategy: CatalogStrategy<'_>,
        observer: &dyn PipelineObserver,
    ) -> Catalog {
        let items = match strategy {
            CatalogStrategy::Regex => scan_layout(layout),
            CatalogStrategy::Structured(extractor) => {
                match extractor.extract(&extraction_text(layout)) {
                    Ok(extracted) if !extracted.is_empty() => {
                        extracted.into_iter().map(CatalogItem::from).collect()
                    }
                    Ok(_) => {
                        observer.on_event(&PipelineEvent::ExtractionFallback {
                            reason: "no items returned",
                        });
                        scan_layout(layout)
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        observer.on_event(&PipelineEvent::ExtractionFallback { reason: &reason });
                        scan_layout(layout)
                    }
                }
            }
        };

        let catalog = collect(items);

        for kind in ItemKind::ALL {
            observer.on_event(&PipelineEvent::ItemsCataloged {
                kind,
                count: catalog.bucket(kind).len(),
            });
        }
        observer.on_event(&PipelineEvent::StageFinished {
            stage: Stage::Catalog,
            items: catalog.len(),
        });

        catalog
    }
}

/// Catalog a layout with the regex scan, reporting through `tracing`.
pub fn catalog_items(layout: &Layout) -> Catalog {
    Cataloger::new().catalog(layout, CatalogStrategy::Regex, &TracingObserver)
}

impl From<ExtractedItem> for CatalogItem {
    fn from(item: ExtractedItem) -> Self {
        CatalogItem::new(item.id, item.kind, item.text, item.page, item.span)
    }
}

/// Regex scan of every block, in document order, duplicates included.
///
/// The span cursor restarts on every page; a blank block advances it by one
/// and any other block by its character count plus one.
fn scan_layout(layout: &Layout) -> Vec<CatalogItem> {
    let mut items = Vec::new();

    for page in &layout.pages {
        let mut cursor = 0usize;
        for block in &page.blocks {
            let text = block.text.trim();
            if text.is_empty() {
                cursor += 1;
                continue;
            }

            for m in ITEM_ID_PATTERN.find_iter(text) {
                let id = normalize_id(m.as_str());
                let Some(kind) = ItemKind::from_id(&id) else {
                    continue;
                };
                let start = cursor + text[..m.start()].chars().count();
                let end = cursor + text[..m.end()].chars().count();
                items.push(CatalogItem::new(id, kind, text, page.page_number, (start, end)));
            }

            cursor += text.chars().count() + 1;
        }
    }

    items
}

/// Deduplicate (first seen per id and kind wins) and sort buckets by page, then id.
fn collect(items: Vec<CatalogItem>) -> Catalog {
    let mut seen: HashSet<(ItemKind, String)> = HashSet::new();
    let mut catalog = Catalog::default();

    for item in items {
        if seen.insert((item.kind, item.id.clone())) {
            catalog.bucket_mut(item.kind).push(item);
        }
    }

    for kind in ItemKind::ALL {
        catalog
            .bucket_mut(kind)
            .sort_by(|a, b| (a.page_or_zero(), &a.id).cmp(&(b.page_or_zero(), &b.id)));
    }

    catalog
}

/// Page text submitted to the structured extractor.
///
/// Each page is preceded by a `--- Page N ---` marker; the result is cut at
/// [`EXTRACTION_MAX_CHARS`] characters.
#[must_use]
pub fn extraction_text(layout: &Layout) -> String {
    let text = layout
        .pages
        .iter()
        .map(|page| {
            let blocks: Vec<&str> = page.blocks.iter().map(|b| b.text.as_str()).collect();
            format!("--- Page {} ---\n{}", page.page_number, blocks.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    match text.char_indices().nth(EXTRACTION_MAX_CHARS) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}
