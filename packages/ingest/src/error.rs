//! Error types for the ingestion core.
//!
//! Only [`IngestError::MalformedInput`] and [`IngestError::SchemaViolation`]
//! abort payload production. Extraction errors are returned by the
//! structured-extraction collaborator and recovered by the cataloger;
//! integrity problems never become errors and end up in the validation report.

use thiserror::Error;

/// Main error type for the ingestion library.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Input that cannot be turned into a payload (e.g. no sections, empty section id).
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An assembled payload does not satisfy its schema.
    #[error("Schema validation failed: {}", errors.join(", "))]
    SchemaViolation { errors: Vec<String> },

    /// An embedded schema could not be loaded or compiled.
    #[error("Schema load error: {0}")]
    SchemaLoad(String),

    /// Collaborator configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure talking to the extraction service.
    #[error("Extraction request failed: {0}")]
    ExtractionRequest(#[from] reqwest::Error),

    /// The extraction service answered with a non-success status.
    #[error("Extraction API error (status {status}): {message}")]
    ExtractionApi { status: u16, message: String },

    /// The extraction service answered with something we cannot use.
    #[error("Failed to parse extraction response: {0}")]
    ExtractionParse(String),

    /// JSON (de)serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Whether this error must stop artifact production.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput(_) | Self::SchemaViolation { .. } | Self::SchemaLoad(_)
        )
    }
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
