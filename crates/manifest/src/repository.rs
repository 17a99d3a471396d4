//! Repository-wide manifest (`addons.xml`).

use crate::manifest::AddonManifest;
use crate::xml::Element;
use repoprep_common::{Error, Result};

/// Root element name of the repository manifest.
pub const REPOSITORY_ROOT: &str = "addons";

/// Aggregated manifest holding one `<addon>` entry per add-on, in the
/// order they were pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryManifest {
    root: Element,
}

impl RepositoryManifest {
    pub fn new() -> Self {
        Self {
            root: Element::new(REPOSITORY_ROOT),
        }
    }

    /// Parse a previously written repository manifest.
    pub fn parse(text: &str) -> Result<Self> {
        let root = Element::parse(text)?;
        if root.name != REPOSITORY_ROOT {
            return Err(Error::MalformedXml(format!(
                "root element is <{}>, expected <{}>",
                root.name, REPOSITORY_ROOT
            )));
        }
        Ok(Self { root })
    }

    /// Append an add-on's root declaration.
    pub fn push(&mut self, manifest: AddonManifest) {
        self.root.push(manifest.into_root());
    }

    pub fn entries(&self) -> impl Iterator<Item = &Element> {
        self.root.elements()
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `id` of every entry, in order.
    pub fn ids(&self) -> Vec<&str> {
        self.entries().filter_map(|e| e.attr("id")).collect()
    }

    /// Serialized document bytes as written to disk.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.root.to_document()
    }
}

impl Default for RepositoryManifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn manifest(id: &str, version: &str) -> AddonManifest {
        AddonManifest::parse(&format!(
            r#"<addon id="{}" version="{}"><extension point="xbmc.addon.metadata"><summary>s</summary></extension></addon>"#,
            id, version
        ))
        .unwrap()
    }

    #[test]
    fn test_push_preserves_order() {
        let mut repo = RepositoryManifest::new();
        repo.push(manifest("b.addon", "1"));
        repo.push(manifest("a.addon", "2"));

        assert_eq!(repo.len(), 2);
        assert_eq!(repo.ids(), vec!["b.addon", "a.addon"]);
    }

    #[test]
    fn test_bytes_reparse() {
        let mut repo = RepositoryManifest::new();
        repo.push(manifest("first", "1.0"));
        repo.push(manifest("second", "2.0"));

        let bytes = repo.to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("<?xml"));
        assert!(text.contains("standalone=\"yes\""));
        assert!(text.ends_with("</addons>"));

        let parsed = RepositoryManifest::parse(&text).unwrap();
        assert_eq!(parsed.ids(), vec!["first", "second"]);
        assert_eq!(parsed, repo);
    }

    #[test]
    fn test_empty() {
        let repo = RepositoryManifest::default();
        assert!(repo.is_empty());
    }

    #[test]
    fn test_parse_rejects_single_addon() {
        assert!(RepositoryManifest::parse(r#"<addon id="x"/>"#).is_err());
    }
}
