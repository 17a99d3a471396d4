//! Pull individual entries out of a release archive.

use crate::layout::AddonDir;
use repoprep_common::{fs::write_atomic, Error, Result, ADDON_MANIFEST};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

/// An opened release archive.
pub struct ReleaseArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl ReleaseArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let archive = ZipArchive::new(File::open(path)?)?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Write each declared asset from the archive into the add-on folder.
    ///
    /// The archive entry for `resources/icon.png` of add-on `sample` is
    /// `sample/resources/icon.png`. Missing parent directories are created.
    /// The first failure stops the pass and is returned.
    pub fn extract_assets(&mut self, addon: &AddonDir, assets: &[String]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for asset in assets {
            let parts = asset_components(asset)?;
            let entry_name = format!("{}/{}", addon.name, parts.join("/"));
            let target = parts.iter().fold(addon.path.clone(), |path, part| path.join(part));

            let mut entry = match self.archive.by_name(&entry_name) {
                Ok(entry) => entry,
                Err(ZipError::FileNotFound) => {
                    return Err(Error::MissingArchiveEntry {
                        archive: self.path.clone(),
                        entry: entry_name,
                    })
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;

            debug!("Extracted {} to {}", entry_name, target.display());
            written.push(target);
        }

        Ok(written)
    }

    /// Restore `addon.xml` into the add-on folder from the archive.
    ///
    /// Prefers `<addon>/addon.xml`; otherwise the shallowest entry named
    /// `addon.xml` is used.
    pub fn restore_manifest(&mut self, addon: &AddonDir) -> Result<PathBuf> {
        let preferred = format!("{}/{}", addon.name, ADDON_MANIFEST);
        let entry_name = if self.archive.index_for_name(&preferred).is_some() {
            preferred
        } else {
            self.archive
                .file_names()
                .filter(|name| name.rsplit('/').next() == Some(ADDON_MANIFEST))
                .min_by_key(|name| name.matches('/').count())
                .map(str::to_string)
                .ok_or_else(|| Error::MissingArchiveEntry {
                    archive: self.path.clone(),
                    entry: preferred,
                })?
        };

        let mut content = Vec::new();
        self.archive
            .by_name(&entry_name)?
            .read_to_end(&mut content)?;

        let target = addon.manifest_path();
        write_atomic(&target, &content)?;
        info!(
            "Restored {} from {}",
            target.display(),
            self.path.display()
        );
        Ok(target)
    }
}

/// Normalized components of an asset path, `.` segments dropped.
///
/// Rejects paths that are absolute or climb out of the add-on folder.
fn asset_components(asset: &str) -> Result<Vec<&str>> {
    let unsafe_path = || Error::UnsafeAssetPath(asset.to_string());
    let mut parts = Vec::new();
    for component in Path::new(asset).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(unsafe_path)?),
            Component::CurDir => {}
            _ => return Err(unsafe_path()),
        }
    }
    if parts.is_empty() {
        return Err(unsafe_path());
    }
    Ok(parts)
}
