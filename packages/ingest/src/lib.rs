//! City Code Ingest - Turn municipal code documents into structured payloads.
//!
//! This crate takes the normalized lines and page/block layout of a
//! regulatory document and produces hierarchical sections, a catalog of
//! requirement (RAD), performance outcome (PO) and evidence (EAD) items,
//! decision points linking them, schema-validated wizard and guidance
//! payloads, and an integrity report.
//!
//! # Example
//!
//! ```
//! use citycode_ingest::{Jurisdiction, Layout, Pipeline};
//! use citycode_ingest::observe::NoopObserver;
//!
//! let lines = [
//!     "Title 1 General",
//!     "Chapter 1 Administration",
//!     "1.1.1 Scope",
//!     "RAD1 Setbacks apply to all buildings.",
//! ];
//! let layout = Layout::from_lines(&lines);
//!
//! let output = Pipeline::new()
//!     .with_observer(&NoopObserver)
//!     .run(&lines, &layout, &Jurisdiction::new("Brisbane", "QLD", "2025-01"))
//!     .unwrap();
//!
//! assert_eq!(output.payloads.wizard.titles.len(), 1);
//! assert!(output.report.is_ok());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants and heading/identifier patterns
//! - [`types`]: Core data types (Section, CatalogItem, DecisionPoint, Layout)
//! - [`error`]: Error types and Result alias
//! - [`observe`]: Injectable pipeline event reporting
//! - [`segmenter`]: Lines to titles/chapters/sections
//! - [`enricher`]: Topics, references, dates, labelled texts and questions per section
//! - [`catalog`]: RAD/PO/EAD identifier cataloging
//! - [`extraction`]: Optional structured-extraction service
//! - [`linker`]: Requirement to outcome/evidence resolution
//! - [`builder`]: Wizard and guidance payloads with schema checks
//! - [`validator`]: Referential integrity report
//! - [`pipeline`]: All stages wired together

pub mod builder;
pub mod catalog;
pub mod config;
pub mod enricher;
pub mod error;
pub mod extraction;
pub mod linker;
pub mod observe;
pub mod pipeline;
pub mod segmenter;
pub mod types;
pub mod validator;

// Re-export main entry points
pub use builder::{GuidancePayload, Payloads, SchemaBuilder, WizardPayload};
pub use catalog::catalog_items;
pub use enricher::enrich_sections;
pub use linker::link_items;
pub use pipeline::{Pipeline, PipelineOutput};
pub use segmenter::split_sections;
pub use validator::{validate, ValidationReport, ValidationStatus};

// Re-export commonly used items
pub use error::{IngestError, Result};
pub use types::{
    Block, Catalog, CatalogItem, DecisionPoint, ItemKind, Jurisdiction, Layout, Page, Section,
    SectionQuestion,
};
