//! Repository layout: which folders are add-ons and what they contain.

use crate::config::DEFAULT_DENYLIST;
use repoprep_common::{fs::list_names, Result, ADDON_MANIFEST, ARCHIVE_EXTENSION};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Decides which entries under the repository root are add-on folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryFilter {
    denylist: Vec<String>,
}

impl DirectoryFilter {
    pub fn new(denylist: Vec<String>) -> Self {
        Self { denylist }
    }

    /// Hidden names (leading `.`), denylisted names and non-directories
    /// are rejected.
    pub fn accepts(&self, name: &str, path: &Path) -> bool {
        !name.starts_with('.') && !self.denylist.iter().any(|d| d == name) && path.is_dir()
    }
}

impl Default for DirectoryFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect())
    }
}

/// A folder directly under the repository root. Its name is the add-on id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonDir {
    pub name: String,
    pub path: PathBuf,
}

impl AddonDir {
    pub fn new(root: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: root.join(&name),
            name,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(ADDON_MANIFEST)
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest_path().is_file()
    }

    /// Names of the folder's immediate children, sorted.
    pub fn entries(&self) -> Result<Vec<String>> {
        Ok(list_names(&self.path)?)
    }

    /// Release archive file name for `version`.
    pub fn archive_name(&self, version: &str) -> String {
        format!("{}-{}.{}", self.name, version, ARCHIVE_EXTENSION)
    }

    /// Whether `file_name` looks like a release archive of this add-on.
    pub fn is_release_archive(&self, file_name: &str) -> bool {
        self.archive_version(file_name).is_some()
    }

    /// Version token encoded in a release archive name.
    pub fn archive_version<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_prefix(self.name.as_str())?
            .strip_prefix('-')?
            .strip_suffix(ARCHIVE_EXTENSION)?
            .strip_suffix('.')
            .filter(|v| !v.is_empty())
    }

    /// Current release archive among `entries`.
    ///
    /// When several match, the greatest name wins.
    pub fn find_release_archive(&self, entries: &[String]) -> Option<PathBuf> {
        entries
            .iter()
            .filter(|name| self.is_release_archive(name))
            .map(|name| self.path.join(name))
            .filter(|path| path.is_file())
            .max()
    }
}

/// Add-on folders under `root` in name order.
pub fn scan_addon_dirs(root: &Path, filter: &DirectoryFilter) -> Result<Vec<AddonDir>> {
    let mut addons = Vec::new();
    for name in list_names(root)? {
        let path = root.join(&name);
        if filter.accepts(&name, &path) {
            addons.push(AddonDir { name, path });
        } else {
            debug!("Skipping {}", path.display());
        }
    }
    Ok(addons)
}
