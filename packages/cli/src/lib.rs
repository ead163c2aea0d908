//! Command-line runner for the city code ingestion pipeline.
//!
//! Loads document lines and an optional layout, runs
//! [`citycode_ingest::Pipeline`] and writes the catalog, decision points,
//! wizard and guidance payloads and validation report as JSON.

pub mod cli;
pub mod error;
pub mod input;
pub mod output;

pub use error::{CliError, Result};
