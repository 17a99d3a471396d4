//! Repository settings.

use crate::layout::DirectoryFilter;
use repoprep_common::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Folders under the repository root that are never treated as add-ons.
pub const DEFAULT_DENYLIST: [&str; 2] = ["downloads", "mediaserver"];

/// Settings for one repository run.
///
/// Loaded from an optional YAML file and then overridden by command-line
/// flags. Passed explicitly into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoSettings {
    /// Directory whose immediate children are add-on folders.
    #[serde(alias = "aggregate_repo_path")]
    pub repo_root: PathBuf,
    /// Build release archives before generating the manifest.
    pub compress_addons: bool,
    /// Folder names excluded from processing.
    pub denylist: Vec<String>,
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            compress_addons: true,
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RepoSettings {
    /// Default settings rooted at `repo_root`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            ..Default::default()
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load settings from a YAML file.
    ///
    /// A relative `repo_root` is resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut settings = Self::from_yaml_str(&text)?;
        if settings.repo_root.is_relative() {
            if let Some(parent) = path.parent() {
                settings.repo_root = parent.join(&settings.repo_root);
            }
        }
        Ok(settings)
    }

    pub fn filter(&self) -> DirectoryFilter {
        DirectoryFilter::new(self.denylist.clone())
    }
}
