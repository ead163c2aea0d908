//! Error types for the command-line runner.

use thiserror::Error;

use citycode_ingest::IngestError;

/// Errors that can occur while loading inputs or writing outputs.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Layout parse error: {0}")]
    Layout(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
