//! Release archive construction.

use repoprep_common::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// What went into a freshly built archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveStats {
    pub files: usize,
    pub bytes: u64,
}

/// Package `source` recursively into a deflate-compressed zip at `dest`.
///
/// Entry names are relative to the parent of `source`, so the archive root
/// is the source folder's own name (`sample/addon.xml`). The source tree is
/// not modified. If any file cannot be read the partial archive at `dest`
/// is removed and the error returned.
pub fn build_archive(source: &Path, dest: &Path) -> Result<ArchiveStats> {
    let result = write_archive(source, dest);
    if result.is_err() && dest.exists() {
        if let Err(e) = std::fs::remove_file(dest) {
            warn!("Failed to remove partial archive {}: {}", dest.display(), e);
        }
    }
    result
}

fn write_archive(source: &Path, dest: &Path) -> Result<ArchiveStats> {
    let root_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| Error::Config(format!("Cannot archive {}", source.display())))?;

    let mut files = Vec::new();
    collect_files(source, &root_name, &mut files)?;

    let mut zip = ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut stats = ArchiveStats::default();

    for (path, entry_name) in &files {
        let mut input = File::open(path)?;
        zip.start_file(entry_name.as_str(), options)?;
        stats.bytes += io::copy(&mut input, &mut zip)?;
        stats.files += 1;
        debug!("Archived {}", entry_name);
    }

    zip.finish()?;
    Ok(stats)
}

/// Regular files below `dir` with their `/`-joined entry names, in name order.
fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<(PathBuf, String)>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = format!("{}/{}", prefix, entry.file_name().to_string_lossy());
        if entry.file_type()?.is_dir() {
            collect_files(&path, &name, out)?;
        } else if path.is_file() {
            out.push((path, name));
        }
    }
    Ok(())
}

/// Entry names of an existing archive, sorted.
pub fn list_entries(path: &Path) -> Result<Vec<String>> {
    let archive = ZipArchive::new(File::open(path)?)?;
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_entries_are_root_relative() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("sample");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("addon.xml"), "<addon/>").unwrap();
        std::fs::write(source.join("icon.png"), [0u8, 1, 2, 3]).unwrap();

        let dest = dir.path().join("out.zip");
        let stats = build_archive(&source, &dest).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.bytes, 12);
        assert_eq!(
            list_entries(&dest).unwrap(),
            vec!["sample/addon.xml", "sample/icon.png"]
        );
    }

    #[test]
    fn test_nested_directories_and_content() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("sample");
        std::fs::create_dir_all(source.join("resources/lib")).unwrap();
        std::fs::write(source.join("resources/lib/main.py"), "print('hi')").unwrap();
        std::fs::create_dir(source.join("empty")).unwrap();

        let dest = dir.path().join("out.zip");
        build_archive(&source, &dest).unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut entry = archive.by_name("sample/resources/lib/main.py").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "print('hi')");
        drop(entry);

        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_source_untouched() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("sample");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("addon.xml"), "x").unwrap();

        build_archive(&source, &dir.path().join("sample-1.0.zip")).unwrap();

        assert_eq!(
            repoprep_common::fs::list_names(&source).unwrap(),
            vec!["addon.xml"]
        );
    }

    #[test]
    fn test_missing_source_leaves_no_partial() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.zip");

        assert!(build_archive(&dir.path().join("missing"), &dest).is_err());
        assert!(!dest.exists());
    }
}
