//! Stage one: build and curate release archives.

use crate::archive::{build_archive, ArchiveStats};
use crate::curate::{curate_release, CurationReport};
use crate::extract::ReleaseArchive;
use crate::layout::{scan_addon_dirs, AddonDir, DirectoryFilter};
use repoprep_common::{Error, Result};
use repoprep_manifest::scrape_version;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of compressing one add-on folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompressOutcome {
    /// Archive and manifest were both present; nothing changed.
    AlreadyReleased { archive: String },
    /// Archive present, manifest restored from it.
    ManifestRestored { archive: String },
    /// New archive built and the folder curated around it.
    Packaged {
        archive: String,
        version: String,
        stats: ArchiveStats,
        curation: CurationReport,
    },
    /// Neither archive nor manifest; nothing to package.
    Skipped,
}

/// One add-on's line in the stage summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressionEntry {
    pub addon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CompressOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Record of a completed compression stage.
///
/// The generator takes this as proof that stage one has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressionSummary {
    pub enabled: bool,
    pub entries: Vec<CompressionEntry>,
}

impl CompressionSummary {
    /// Stage one was switched off for this run.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            entries: Vec::new(),
        }
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.error.is_some()).count()
    }

    pub fn packaged(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, Some(CompressOutcome::Packaged { .. })))
            .count()
    }
}

/// Builds release archives for every add-on folder under a root.
pub struct Compressor {
    root: PathBuf,
    filter: DirectoryFilter,
}

impl Compressor {
    pub fn new(root: impl Into<PathBuf>, filter: DirectoryFilter) -> Self {
        Self {
            root: root.into(),
            filter,
        }
    }

    /// Process every add-on in scan order.
    ///
    /// Per add-on failures are logged and recorded; only a failure to list
    /// the repository root is returned as an error.
    pub fn run(&self) -> Result<CompressionSummary> {
        let mut entries = Vec::new();

        for addon in scan_addon_dirs(&self.root, &self.filter)? {
            let entry = match self.process(&addon) {
                Ok(outcome) => CompressionEntry {
                    addon: addon.name.clone(),
                    outcome: Some(outcome),
                    error: None,
                },
                Err(e) => {
                    warn!("Could not compress {}: {}", addon.path.display(), e);
                    CompressionEntry {
                        addon: addon.name.clone(),
                        outcome: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            entries.push(entry);
        }

        Ok(CompressionSummary {
            enabled: true,
            entries,
        })
    }

    /// Run the release state machine for one add-on folder.
    pub fn process(&self, addon: &AddonDir) -> Result<CompressOutcome> {
        let entries = addon.entries()?;
        let archive = addon.find_release_archive(&entries);
        let has_manifest = addon.has_manifest();

        match (archive, has_manifest) {
            (Some(archive), true) => {
                let name = file_name(&archive);
                self.check_stale(addon, &name);
                debug!("{} already released as {}", addon.name, name);
                Ok(CompressOutcome::AlreadyReleased { archive: name })
            }
            (Some(archive), false) => {
                ReleaseArchive::open(&archive)?.restore_manifest(addon)?;
                Ok(CompressOutcome::ManifestRestored {
                    archive: file_name(&archive),
                })
            }
            (None, true) => self.package(addon, &entries),
            (None, false) => {
                debug!("{} has no manifest, skipping", addon.name);
                Ok(CompressOutcome::Skipped)
            }
        }
    }

    fn package(&self, addon: &AddonDir, entries: &[String]) -> Result<CompressOutcome> {
        let text = std::fs::read_to_string(addon.manifest_path())?;
        let version = scrape_version(&text, &addon.name)?;
        info!(
            "Create compressed add-on release for -- {}  v{}",
            addon.name, version
        );

        let archive_name = addon.archive_name(&version);
        let staging = self.root.join(format!(".{}.partial", archive_name));
        let stats = build_archive(&addon.path, &staging)?;

        let final_path = addon.path.join(&archive_name);
        if let Err(e) = std::fs::rename(&staging, &final_path) {
            if let Err(cleanup) = std::fs::remove_file(&staging) {
                warn!("Failed to remove {}: {}", staging.display(), cleanup);
            }
            return Err(e.into());
        }

        let curation = curate_release(&addon.path, entries, &archive_name, &version)?;

        Ok(CompressOutcome::Packaged {
            archive: archive_name,
            version,
            stats,
            curation,
        })
    }

    /// Warn when the archive name's version differs from the manifest's.
    ///
    /// The archive is still treated as current.
    fn check_stale(&self, addon: &AddonDir, archive_name: &str) {
        let Some(archived) = addon.archive_version(archive_name) else {
            return;
        };
        let current = std::fs::read_to_string(addon.manifest_path())
            .map_err(Error::from)
            .and_then(|text| scrape_version(&text, &addon.name));

        match current {
            Ok(version) if version != archived => warn!(
                "{} declares version {} but {} is the existing release; delete it to rebuild",
                addon.manifest_path().display(),
                version,
                archive_name
            ),
            Ok(_) => {}
            Err(e) => debug!("Could not compare versions for {}: {}", addon.name, e),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
