//! Writing pipeline artifacts as pretty-printed JSON.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use citycode_ingest::PipelineOutput;

use crate::error::Result;

/// Paths of every artifact written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    pub catalog: PathBuf,
    pub decision_points: PathBuf,
    pub wizard: PathBuf,
    pub guidance: PathBuf,
    pub validation: PathBuf,
}

impl WrittenArtifacts {
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [
            &self.catalog,
            &self.decision_points,
            &self.wizard,
            &self.guidance,
            &self.validation,
        ]
        .into_iter()
        .map(PathBuf::as_path)
    }
}

/// Serialize `value` to `path` through a temp file and rename.
fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("artifact.json");
    let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file)?;
        file.write_all(content.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&temp_file, path)?;
    tracing::debug!(path = %path.display(), "Wrote artifact");
    Ok(())
}

/// Write all artifacts of `output` under `output_dir`.
///
/// Payload files are prefixed with `stem`, usually the input file stem.
pub fn write_artifacts(
    output: &PipelineOutput,
    output_dir: &Path,
    stem: &str,
) -> Result<WrittenArtifacts> {
    fs::create_dir_all(output_dir)?;

    let written = WrittenArtifacts {
        catalog: output_dir.join("catalog.json"),
        decision_points: output_dir.join("decision_points.json"),
        wizard: output_dir.join(format!("{stem}_wizard.json")),
        guidance: output_dir.join(format!("{stem}_guidance.json")),
        validation: output_dir.join("validation.json"),
    };

    write_json(&output.catalog, &written.catalog)?;
    write_json(&output.decision_points, &written.decision_points)?;
    write_json(&output.payloads.wizard, &written.wizard)?;
    write_json(&output.payloads.guidance, &written.guidance)?;
    write_json(&output.report, &written.validation)?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use citycode_ingest::observe::NoopObserver;
    use citycode_ingest::{Jurisdiction, Layout, Pipeline};
    use tempfile::tempdir;

    fn run() -> PipelineOutput {
        let lines = [
            "Title 1 General",
            "Chapter 1 Administration",
            "1.1.1 Scope",
            "RAD1 Setbacks apply to all buildings.",
            "PO1 Setbacks maintain amenity.",
        ];
        Pipeline::new()
            .with_observer(&NoopObserver)
            .run(&lines, &Layout::from_lines(&lines), &Jurisdiction::new("Brisbane", "QLD", "v1"))
            .unwrap()
    }

    #[test]
    fn test_write_artifacts() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("out");

        let written = write_artifacts(&run(), &out, "code").unwrap();

        assert_eq!(written.wizard, out.join("code_wizard.json"));
        assert_eq!(written.guidance, out.join("code_guidance.json"));
        for path in written.iter() {
            assert!(path.exists(), "{} should exist", path.display());
        }

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written.validation).unwrap()).unwrap();
        assert_eq!(report["status"], "ok");

        let catalog: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written.catalog).unwrap()).unwrap();
        assert_eq!(catalog["RAD"][0]["id"], "RAD1");
        assert_eq!(catalog["PO"][0]["id"], "PO1");
    }

    #[test]
    fn test_no_temp_files_left() {
        let dir = tempdir().unwrap();
        write_artifacts(&run(), dir.path(), "code").unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_overwrites_existing_artifacts() {
        let dir = tempdir().unwrap();
        write_artifacts(&run(), dir.path(), "code").unwrap();
        let written = write_artifacts(&run(), dir.path(), "code").unwrap();
        assert!(written.decision_points.exists());
    }
}
