//! Version extraction from raw manifest text.

use crate::xml::Element;
use regex::Regex;
use repoprep_common::{Error, Result};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Opening tag of an add-on declaration, attributes captured.
static ADDON_HEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<addon\b([^>]*)>").unwrap());

/// `id=` attribute with either quote style, or unquoted.
static ID_ATTR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bid\s*=\s*["']?([^"'\s>/]+)"#).unwrap());

/// `version=` attribute up to the next quote, whitespace or end of tag.
static VERSION_ATTR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bversion\s*=\s*["']?([^"'\s>/]+)"#).unwrap());

/// Extract the version of `addon_id` from its manifest text.
///
/// The document is parsed first and the `version` attribute of the
/// `<addon>` element whose `id` equals `addon_id` is returned. Text
/// scraping is used only when the document is not well-formed.
pub fn scrape_version(text: &str, addon_id: &str) -> Result<String> {
    let found = match Element::parse(text) {
        Ok(root) => version_from_tree(&root, addon_id),
        Err(e) => {
            warn!(
                "Manifest for {} is not well-formed ({}), scraping version from raw text",
                addon_id, e
            );
            version_from_text(text, addon_id)
        }
    };

    match found {
        Some(version) => {
            debug!("Found version {} for {}", version, addon_id);
            Ok(version)
        }
        None => Err(Error::VersionNotFound {
            addon: addon_id.to_string(),
        }),
    }
}

fn version_from_tree(root: &Element, addon_id: &str) -> Option<String> {
    root.descendants()
        .into_iter()
        .find(|e| e.name == "addon" && e.attr("id") == Some(addon_id))
        .and_then(|e| e.attr("version"))
        .and_then(|v| v.split_whitespace().next())
        .map(str::to_string)
}

/// Pattern-based scraping over the raw text of a malformed manifest.
pub fn version_from_text(text: &str, addon_id: &str) -> Option<String> {
    ADDON_HEADER_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .find(|header| {
            ID_ATTR_PATTERN
                .captures(header)
                .is_some_and(|id| &id[1] == addon_id)
        })
        .and_then(|header| VERSION_ATTR_PATTERN.captures(header))
        .map(|caps| caps[1].to_string())
}
