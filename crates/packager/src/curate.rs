//! Release folder curation.
//!
//! Once a release archive sits in an add-on folder, everything except the
//! manifest, icon and fanart files, the changelog and the archive itself is
//! removed. The changelog is renamed to carry the version.

use repoprep_common::Result;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Name fragments of files kept as they are. Matching is case-sensitive.
const RETAINED_MARKERS: [&str; 3] = ["addon.xml", "fanart", "icon"];

/// Changelog detection ignores case (`changelog.txt`, `CHANGELOG.md`).
const CHANGELOG_MARKER: &str = "changelog";

/// What happens to one entry of the release folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    RemoveDir,
    Retain,
    RenameChangelog,
    Remove,
}

/// Files touched by a curation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurationReport {
    pub retained: Vec<String>,
    pub renamed: Vec<(String, String)>,
    pub removed: Vec<String>,
}

/// Versioned changelog file name.
pub fn changelog_name(version: &str) -> String {
    format!("changelog-{}.txt", version)
}

pub fn classify(name: &str, is_dir: bool, archive_name: &str) -> Disposition {
    if is_dir {
        Disposition::RemoveDir
    } else if name == archive_name || RETAINED_MARKERS.iter().any(|m| name.contains(m)) {
        Disposition::Retain
    } else if name.to_lowercase().contains(CHANGELOG_MARKER) {
        Disposition::RenameChangelog
    } else {
        Disposition::Remove
    }
}

/// Prune `folder` around its new archive.
///
/// Only names in `original_entries` (the listing taken before the archive
/// was built) are considered. Entries that vanished since are skipped.
pub fn curate_release(
    folder: &Path,
    original_entries: &[String],
    archive_name: &str,
    version: &str,
) -> Result<CurationReport> {
    let mut report = CurationReport::default();

    for name in original_entries {
        let path = folder.join(name);
        let Ok(metadata) = std::fs::symlink_metadata(&path) else {
            debug!("{} disappeared before curation", path.display());
            continue;
        };

        match classify(name, metadata.is_dir(), archive_name) {
            Disposition::RemoveDir => {
                std::fs::remove_dir_all(&path)?;
                report.removed.push(name.clone());
            }
            Disposition::Retain => report.retained.push(name.clone()),
            Disposition::RenameChangelog => {
                let renamed = changelog_name(version);
                std::fs::rename(&path, folder.join(&renamed))?;
                report.renamed.push((name.clone(), renamed));
            }
            Disposition::Remove => {
                std::fs::remove_file(&path)?;
                report.removed.push(name.clone());
            }
        }
    }

    info!(
        "Curated {}: kept {}, renamed {}, removed {}",
        folder.display(),
        report.retained.len(),
        report.renamed.len(),
        report.removed.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoprep_common::fs::list_names;
    use tempfile::tempdir;

    #[test]
    fn test_classify() {
        let archive = "sample-1.0.zip";
        assert_eq!(classify("addon.xml", false, archive), Disposition::Retain);
        assert_eq!(classify("icon.png", false, archive), Disposition::Retain);
        assert_eq!(classify("fanart.jpg", false, archive), Disposition::Retain);
        assert_eq!(classify(archive, false, archive), Disposition::Retain);
        assert_eq!(classify("changelog.txt", false, archive), Disposition::RenameChangelog);
        assert_eq!(classify("CHANGELOG.txt", false, archive), Disposition::RenameChangelog);
        assert_eq!(classify("Changelog.md", false, archive), Disposition::RenameChangelog);
        assert_eq!(classify("Icon.png", false, archive), Disposition::Remove);
        assert_eq!(classify("resources", true, archive), Disposition::RemoveDir);
        assert_eq!(classify("icons", true, archive), Disposition::RemoveDir);
        assert_eq!(classify("main.py", false, archive), Disposition::Remove);
    }

    #[test]
    fn test_curate_release_folder() {
        let dir = tempdir().unwrap();
        let folder = dir.path();
        for name in ["addon.xml", "old_screenshot.jpg", "CHANGELOG.txt", "icon.png"] {
            std::fs::write(folder.join(name), name).unwrap();
        }
        std::fs::create_dir_all(folder.join("resources/lib")).unwrap();
        std::fs::write(folder.join("resources/lib/main.py"), "").unwrap();

        let original = list_names(folder).unwrap();
        std::fs::write(folder.join("sample-1.2.3.zip"), "zip").unwrap();

        let report = curate_release(folder, &original, "sample-1.2.3.zip", "1.2.3").unwrap();

        assert_eq!(
            list_names(folder).unwrap(),
            vec![
                "addon.xml",
                "changelog-1.2.3.txt",
                "icon.png",
                "sample-1.2.3.zip"
            ]
        );
        assert_eq!(
            std::fs::read_to_string(folder.join("changelog-1.2.3.txt")).unwrap(),
            "CHANGELOG.txt"
        );
        assert_eq!(
            report.renamed,
            vec![("CHANGELOG.txt".to_string(), "changelog-1.2.3.txt".to_string())]
        );
        assert_eq!(report.removed, vec!["old_screenshot.jpg", "resources"]);
    }

    #[test]
    fn test_vanished_entry_skipped() {
        let dir = tempdir().unwrap();
        let original = vec!["gone.txt".to_string()];
        let report = curate_release(dir.path(), &original, "a-1.zip", "1").unwrap();
        assert_eq!(report, CurationReport::default());
    }
}
