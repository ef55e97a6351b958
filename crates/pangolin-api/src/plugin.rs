// Plugin package inventory.
//
// Read once after authentication from `show plugins packages` and cached
// on the session. Only the plugin namespace consults it.

use crate::error::Error;
use crate::xml::{Element, as_bool};

/// One installable plugin package as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginPackage {
    pub name: String,
    pub version: String,
    pub installed: bool,
    pub downloaded: bool,
}

/// Parse the `<result>` of `show plugins packages`.
///
/// The device reports one entry per available package version; a plugin
/// counts as present when any of its entries is installed.
pub(crate) fn parse_inventory(result: &Element) -> Result<Vec<PluginPackage>, Error> {
    let entries = match result.find("plugins") {
        Some(plugins) => plugins.children_named("entry"),
        None => return Ok(Vec::new()),
    };

    let mut packages = Vec::new();
    for entry in entries {
        let name = entry
            .child_text("name")
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::Protocol {
                message: "plugin entry without a name".into(),
            })?;
        packages.push(PluginPackage {
            name: name.to_owned(),
            version: entry.child_text("version").unwrap_or_default().to_owned(),
            installed: flag(entry, "installed")?,
            downloaded: flag(entry, "downloaded")?,
        });
    }
    Ok(packages)
}

fn flag(entry: &Element, field: &str) -> Result<bool, Error> {
    match entry.child_text(field) {
        None | Some("") => Ok(false),
        Some(value) => as_bool(value),
    }
}
