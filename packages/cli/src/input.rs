//! Loading of document lines and page layouts from disk.

use std::fs;
use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use citycode_ingest::Layout;

use crate::error::{CliError, Result};

/// Maximum size of an input file (16 MiB).
pub const MAX_INPUT_SIZE: u64 = 16 * 1024 * 1024;

fn read_input(path: &Path) -> Result<String> {
    tracing::debug!(path = %path.display(), "Reading input file");

    let metadata = fs::metadata(path)
        .map_err(|_| CliError::Input(format!("cannot access {}", path.display())))?;
    if !metadata.is_file() {
        return Err(CliError::Input(format!("{} is not a file", path.display())));
    }
    if metadata.len() > MAX_INPUT_SIZE {
        tracing::warn!(size = metadata.len(), max = MAX_INPUT_SIZE, "Input file exceeds size limit");
        return Err(CliError::Input(format!(
            "{} exceeds maximum size limit ({MAX_INPUT_SIZE} bytes)",
            path.display()
        )));
    }

    Ok(fs::read_to_string(path)?)
}

/// NFC-normalize and trim each line, dropping blank ones.
pub fn normalize_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.nfc().collect::<String>().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Load normalized, non-blank document lines.
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    let lines = normalize_lines(&read_input(path)?);
    if lines.is_empty() {
        return Err(CliError::Input(format!("{} has no text lines", path.display())));
    }
    Ok(lines)
}

/// Parse a layout document; `.yaml`/`.yml` files are read as YAML, anything
/// else as JSON.
pub fn parse_layout(content: &str, path: &Path) -> Result<Layout> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml_ng::from_str(content).map_err(|e| CliError::Layout(e.to_string()))
    } else {
        serde_json::from_str(content).map_err(|e| CliError::Layout(e.to_string()))
    }
}

/// Load the layout at `path`, or build a single-page layout from `lines`.
pub fn load_layout(path: Option<&Path>, lines: &[String]) -> Result<Layout> {
    match path {
        Some(path) => parse_layout(&read_input(path)?, path),
        None => {
            tracing::info!("No layout given; using one block per line on page 1");
            Ok(Layout::from_lines(lines))
        }
    }
}
