//! Common error types for repoprep.

use std::path::PathBuf;
use thiserror::Error;

/// Common error type for repoprep operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_yaml::Error),

    #[error("Manifest parse failed for {}: {reason}", .path.display())]
    ManifestParse { path: PathBuf, reason: String },

    #[error("No version found for add-on {addon}")]
    VersionNotFound { addon: String },

    #[error("Entry {entry} not found in archive {}", .archive.display())]
    MissingArchiveEntry { archive: PathBuf, entry: String },

    #[error("Refusing to extract asset outside the add-on folder: {0}")]
    UnsafeAssetPath(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using common Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(quick_xml::Error::InvalidAttr(e))
    }
}
