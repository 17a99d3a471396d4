//! Common utilities and types shared across repoprep crates.

pub mod error;
pub mod fs;
pub mod hash;

pub use error::{Error, Result};

/// File name of a single add-on's manifest document.
pub const ADDON_MANIFEST: &str = "addon.xml";

/// File name of the aggregated repository manifest.
pub const REPOSITORY_MANIFEST: &str = "addons.xml";

/// File name of the repository manifest checksum.
pub const REPOSITORY_CHECKSUM: &str = "addons.xml.md5";

/// Extension used for release archives.
pub const ARCHIVE_EXTENSION: &str = "zip";
