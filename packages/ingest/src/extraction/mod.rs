//! Structured-extraction collaborator.
//!
//! An optional external service that reads concatenated page text and
//! reports RAD/PO/EAD identifiers. It is selected by configuration: when
//! [`ExtractionConfig::from_env`] fails the cataloger only uses its regex
//! scan.

mod client;
mod config;

#[cfg(test)]
pub use client::test_support::MockExtractor;
pub use client::{parse_extraction_response, AnthropicExtractor, ExtractedItem, StructuredExtractor};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
