//! Stage two: aggregate add-on manifests into `addons.xml` and its checksum.

use crate::compressor::CompressionSummary;
use crate::extract::ReleaseArchive;
use crate::layout::{scan_addon_dirs, AddonDir, DirectoryFilter};
use repoprep_common::fs::write_atomic;
use repoprep_common::hash::md5_reader;
use repoprep_common::{Result, REPOSITORY_CHECKSUM, REPOSITORY_MANIFEST};
use repoprep_manifest::{AddonManifest, ManifestSummary, RepositoryManifest};
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One add-on's line in the generation summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedEntry {
    pub addon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestSummary>,
    pub assets_extracted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What the generator wrote, if anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// No readable manifest was found; existing output was left alone.
    NothingToDo,
    Written {
        manifest_path: PathBuf,
        checksum_path: PathBuf,
        checksum: String,
        addons: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub entries: Vec<GeneratedEntry>,
    pub outcome: GenerationOutcome,
}

impl GenerationSummary {
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.error.is_some()).count()
    }
}

/// Builds the repository manifest from every add-on folder under a root.
pub struct Generator {
    root: PathBuf,
    filter: DirectoryFilter,
}

impl Generator {
    pub fn new(root: impl Into<PathBuf>, filter: DirectoryFilter) -> Self {
        Self {
            root: root.into(),
            filter,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(REPOSITORY_MANIFEST)
    }

    pub fn checksum_path(&self) -> PathBuf {
        self.root.join(REPOSITORY_CHECKSUM)
    }

    /// Aggregate all manifests and write `addons.xml` plus its checksum.
    ///
    /// Runs after the compression stage so release archives are in place
    /// for asset extraction. An add-on whose manifest cannot be read is
    /// excluded. Failing to write either output file is an error.
    pub fn run(&self, compressed: &CompressionSummary) -> Result<GenerationSummary> {
        if compressed.enabled {
            debug!(
                "Compression stage finished for {} add-ons",
                compressed.entries.len()
            );
        } else {
            debug!("Compression stage disabled");
        }

        let mut repository = RepositoryManifest::new();
        let mut entries = Vec::new();

        for addon in scan_addon_dirs(&self.root, &self.filter)? {
            match AddonManifest::from_path(&addon.manifest_path()) {
                Ok(manifest) => {
                    let assets_extracted = self.extract_assets(&addon, &manifest);
                    info!("Adding {}", addon.name);
                    entries.push(GeneratedEntry {
                        addon: addon.name.clone(),
                        manifest: Some(manifest.summary()),
                        assets_extracted,
                        error: None,
                    });
                    repository.push(manifest);
                }
                Err(e) => {
                    warn!("Excluding {} for {}", addon.manifest_path().display(), e);
                    entries.push(GeneratedEntry {
                        addon: addon.name.clone(),
                        manifest: None,
                        assets_extracted: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        if repository.is_empty() {
            info!("Could not find any add-ons, so nothing was written");
            return Ok(GenerationSummary {
                entries,
                outcome: GenerationOutcome::NothingToDo,
            });
        }

        let checksum = self.write_outputs(&repository)?;
        info!("Updated {} and {}", REPOSITORY_MANIFEST, REPOSITORY_CHECKSUM);

        Ok(GenerationSummary {
            entries,
            outcome: GenerationOutcome::Written {
                manifest_path: self.manifest_path(),
                checksum_path: self.checksum_path(),
                checksum,
                addons: repository.ids().into_iter().map(str::to_string).collect(),
            },
        })
    }

    /// Unpack declared assets from the add-on's release archive.
    ///
    /// Best effort: failures are logged and reported as zero extracted.
    fn extract_assets(&self, addon: &AddonDir, manifest: &AddonManifest) -> usize {
        let assets = manifest.assets();
        if assets.is_empty() {
            return 0;
        }

        let archive_path = match addon
            .entries()
            .map(|entries| addon.find_release_archive(&entries))
        {
            Ok(Some(path)) => path,
            Ok(None) => {
                debug!("{} has no release archive to extract assets from", addon.name);
                return 0;
            }
            Err(e) => {
                warn!("Could not list {}: {}", addon.path.display(), e);
                return 0;
            }
        };

        let result = ReleaseArchive::open(&archive_path)
            .and_then(|mut archive| archive.extract_assets(addon, &assets));

        match result {
            Ok(written) => written.len(),
            Err(e) => {
                warn!(
                    "Could not extract assets from {} because {}",
                    archive_path.display(),
                    e
                );
                0
            }
        }
    }

    /// Write the manifest, then hash the bytes on disk into the checksum file.
    fn write_outputs(&self, repository: &RepositoryManifest) -> Result<String> {
        let manifest_path = self.manifest_path();
        write_atomic(&manifest_path, &repository.to_bytes()?)?;

        let checksum = md5_reader(File::open(&manifest_path)?)?;
        write_atomic(&self.checksum_path(), checksum.as_bytes())?;
        Ok(checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoprep_common::hash::md5_bytes;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_manifest(root: &Path, id: &str, body: &str) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("addon.xml"),
            format!(r#"<addon id="{}" version="1.0">{}</addon>"#, id, body),
        )
        .unwrap();
    }

    #[test]
    fn test_two_addons_and_checksum() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "plugin.a", "");
        write_manifest(dir.path(), "plugin.b", "");

        let generator = Generator::new(dir.path(), DirectoryFilter::default());
        let summary = generator.run(&CompressionSummary::disabled()).unwrap();

        let text = std::fs::read_to_string(generator.manifest_path()).unwrap();
        let parsed = RepositoryManifest::parse(&text).unwrap();
        assert_eq!(parsed.ids(), vec!["plugin.a", "plugin.b"]);

        let checksum = std::fs::read_to_string(generator.checksum_path()).unwrap();
        assert_eq!(checksum, md5_bytes(text.as_bytes()));

        match summary.outcome {
            GenerationOutcome::Written { addons, checksum: reported, .. } => {
                assert_eq!(addons, vec!["plugin.a", "plugin.b"]);
                assert_eq!(reported, checksum);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_nothing_to_do_leaves_previous_output() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("no-manifest")).unwrap();
        std::fs::write(dir.path().join("addons.xml"), "previous").unwrap();

        let generator = Generator::new(dir.path(), DirectoryFilter::default());
        let summary = generator.run(&CompressionSummary::disabled()).unwrap();

        assert_eq!(summary.outcome, GenerationOutcome::NothingToDo);
        assert_eq!(summary.failures(), 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("addons.xml")).unwrap(),
            "previous"
        );
        assert!(!generator.checksum_path().exists());
    }

    #[test]
    fn test_broken_manifest_excluded() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "good", "");
        let broken = dir.path().join("broken");
        std::fs::create_dir(&broken).unwrap();
        std::fs::write(broken.join("addon.xml"), "<addon id=\"broken\"").unwrap();

        let generator = Generator::new(dir.path(), DirectoryFilter::default());
        let summary = generator.run(&CompressionSummary::disabled()).unwrap();

        assert_eq!(summary.failures(), 1);
        let broken_entry = summary.entries.iter().find(|e| e.addon == "broken").unwrap();
        assert!(broken_entry.error.as_ref().unwrap().contains("addon.xml"));

        let text = std::fs::read_to_string(generator.manifest_path()).unwrap();
        assert_eq!(RepositoryManifest::parse(&text).unwrap().ids(), vec!["good"]);
    }

    #[test]
    fn test_missing_asset_does_not_block_aggregation() {
        let dir = tempdir().unwrap();
        write_manifest(
            dir.path(),
            "sample",
            r#"<extension point="xbmc.addon.metadata"><assets><icon>icon.png</icon></assets></extension>"#,
        );
        std::fs::write(dir.path().join("sample/sample-1.0.zip"), "not a zip").unwrap();

        let generator = Generator::new(dir.path(), DirectoryFilter::default());
        let summary = generator.run(&CompressionSummary::disabled()).unwrap();

        assert_eq!(summary.failures(), 0);
        assert_eq!(summary.entries[0].assets_extracted, 0);
        assert!(generator.manifest_path().exists());
    }

    #[test]
    fn test_unwritable_output_is_fatal() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "sample", "");
        // A directory in place of the checksum file cannot be replaced.
        std::fs::create_dir_all(dir.path().join("addons.xml.md5/blocker")).unwrap();

        let generator = Generator::new(dir.path(), DirectoryFilter::default());
        assert!(generator.run(&CompressionSummary::disabled()).is_err());
    }
}
