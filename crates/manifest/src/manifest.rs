//! Add-on manifest (`addon.xml`) model.

use crate::xml::Element;
use repoprep_common::{Error, Result};
use serde::Serialize;
use std::path::Path;

/// Extension point holding display metadata such as assets.
pub const METADATA_POINT: &str = "xbmc.addon.metadata";

/// A parsed add-on manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonManifest {
    root: Element,
}

/// Fields of a manifest reported back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestSummary {
    pub id: Option<String>,
    pub version: Option<String>,
    pub assets: Vec<String>,
}

impl AddonManifest {
    /// Parse manifest text. The root element must be `<addon>`.
    pub fn parse(text: &str) -> Result<Self> {
        let root = Element::parse(text)?;
        if root.name != "addon" {
            return Err(Error::MalformedXml(format!(
                "root element is <{}>, expected <addon>",
                root.name
            )));
        }
        Ok(Self { root })
    }

    /// Read and parse the manifest at `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| Error::ManifestParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.root.attr("id")
    }

    pub fn version(&self) -> Option<&str> {
        self.root.attr("version")
    }

    /// Relative asset paths declared under the metadata extension.
    ///
    /// Empty entries are skipped.
    pub fn assets(&self) -> Vec<String> {
        let Some(assets) = self
            .root
            .child_with_attr("extension", "point", METADATA_POINT)
            .and_then(|metadata| metadata.child("assets"))
        else {
            return Vec::new();
        };

        assets
            .elements()
            .map(|asset| asset.text().trim().to_string())
            .filter(|path| !path.is_empty())
            .collect()
    }

    pub fn summary(&self) -> ManifestSummary {
        ManifestSummary {
            id: self.id().map(str::to_string),
            version: self.version().map(str::to_string),
            assets: self.assets(),
        }
    }

    pub fn into_root(self) -> Element {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_fields() {
        let manifest = AddonManifest::parse(
            r#"<addon id='sample' version='1.2.3'>
                <extension point="xbmc.addon.metadata">
                    <assets>
                        <icon>icon.png</icon>
                        <fanart>fanart.jpg</fanart>
                        <banner></banner>
                        <screenshot> resources/shot1.jpg </screenshot>
                    </assets>
                </extension>
            </addon>"#,
        )
        .unwrap();

        assert_eq!(manifest.id(), Some("sample"));
        assert_eq!(manifest.version(), Some("1.2.3"));
        assert_eq!(
            manifest.assets(),
            vec!["icon.png", "fanart.jpg", "resources/shot1.jpg"]
        );
    }

    #[test]
    fn test_no_metadata_means_no_assets() {
        let manifest = AddonManifest::parse(r#"<addon id="sample" version="1"/>"#).unwrap();
        assert!(manifest.assets().is_empty());
    }

    #[test]
    fn test_assets_ignored_outside_metadata_point() {
        let manifest = AddonManifest::parse(
            r#"<addon id="sample" version="1">
                <extension point="xbmc.python.script"><assets><icon>x.png</icon></assets></extension>
            </addon>"#,
        )
        .unwrap();
        assert!(manifest.assets().is_empty());
    }

    #[test]
    fn test_wrong_root_rejected() {
        assert!(AddonManifest::parse("<addons/>").is_err());
    }

    #[test]
    fn test_from_path_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addon.xml");
        std::fs::write(&path, "<addon id=").unwrap();

        let err = AddonManifest::from_path(&path).unwrap_err();
        assert!(matches!(err, Error::ManifestParse { .. }));
        assert!(err.to_string().contains("addon.xml"));
    }
}
