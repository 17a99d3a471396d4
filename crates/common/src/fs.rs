//! Filesystem helpers.

#[cfg(unix)]
use std::fs::Permissions;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Mode for newly written output files, readable by a serving web server.
#[cfg(unix)]
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Write `data` to `path` without truncating an existing file first.
///
/// The bytes land in a temporary file next to `path` which is then renamed
/// over it, so readers see either the old content or the new content.
/// A replaced file keeps its mode; a new file gets `0644`.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    #[cfg(unix)]
    tmp.as_file().set_permissions(published_permissions(path))?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn published_permissions(path: &Path) -> Permissions {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o7777)
        .unwrap_or(DEFAULT_FILE_MODE);
    Permissions::from_mode(mode)
}

/// Names of the immediate children of `dir`, sorted.
pub fn list_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names)
}
