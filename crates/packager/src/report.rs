//! Run report.

use crate::compressor::{CompressOutcome, CompressionSummary};
use crate::generator::{GenerationOutcome, GenerationSummary};
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;

/// Everything a run did, per stage and per add-on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub repo_root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<CompressionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationSummary>,
}

impl RunReport {
    /// Number of add-ons that failed in either stage.
    pub fn failures(&self) -> usize {
        self.compression.as_ref().map_or(0, |c| c.failures())
            + self.generation.as_ref().map_or(0, |g| g.failures())
    }

    /// Human-readable summary.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Repository: {}", self.repo_root.display());

        if let Some(compression) = &self.compression {
            let _ = writeln!(out, "\nCompression:");
            if !compression.enabled {
                let _ = writeln!(out, "  disabled");
            }
            for entry in &compression.entries {
                let line = match (&entry.outcome, &entry.error) {
                    (_, Some(error)) => format!("failed: {}", error),
                    (Some(CompressOutcome::Packaged { archive, .. }), _) => {
                        format!("packaged {}", archive)
                    }
                    (Some(CompressOutcome::AlreadyReleased { archive }), _) => {
                        format!("up to date ({})", archive)
                    }
                    (Some(CompressOutcome::ManifestRestored { archive }), _) => {
                        format!("manifest restored from {}", archive)
                    }
                    (Some(CompressOutcome::Skipped), _) | (None, None) => "skipped".to_string(),
                };
                let _ = writeln!(out, "  {:<40} {}", entry.addon, line);
            }
        }

        if let Some(generation) = &self.generation {
            let _ = writeln!(out, "\nRepository manifest:");
            for entry in &generation.entries {
                match &entry.error {
                    Some(error) => {
                        let _ = writeln!(out, "  {:<40} excluded: {}", entry.addon, error);
                    }
                    None => {
                        let _ = writeln!(
                            out,
                            "  {:<40} added ({} assets extracted)",
                            entry.addon, entry.assets_extracted
                        );
                    }
                }
            }
            match &generation.outcome {
                GenerationOutcome::NothingToDo => {
                    let _ = writeln!(out, "  Could not find any add-ons, nothing written");
                }
                GenerationOutcome::Written {
                    manifest_path,
                    checksum,
                    addons,
                    ..
                } => {
                    let _ = writeln!(
                        out,
                        "  Wrote {} ({} add-ons, md5 {})",
                        manifest_path.display(),
                        addons.len(),
                        checksum
                    );
                }
            }
        }

        out
    }
}
