//! Manifest handling for repoprep.
//!
//! This crate reads add-on manifests (`addon.xml`), extracts their version
//! token, and builds the aggregated repository manifest (`addons.xml`).

pub mod manifest;
pub mod repository;
pub mod version;
pub mod xml;

pub use manifest::{AddonManifest, ManifestSummary, METADATA_POINT};
pub use repository::RepositoryManifest;
pub use version::scrape_version;
pub use xml::{Element, Node};
