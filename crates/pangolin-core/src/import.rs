// Administrative importers.
//
// Creating a network object is not enough to make it usable: interfaces
// and routing constructs must also be imported into a vsys, templates
// attached to stacks, and devices registered to device groups. Import
// targets are exclusive, so every import first unimports the same names
// everywhere else, and deletion unimports before removing the object.

use tracing::debug;

use pangolin_api::xpath::{as_member_xpath, vsys_xpath_prefix};
use pangolin_api::{Client, Element, Error, XPath};

/// Network constructs that require vsys membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VsysImport {
    Interface,
    VirtualRouter,
    VirtualWire,
    Vlan,
    LogicalRouter,
}

impl VsysImport {
    /// The node under `import/network` holding the member list.
    pub fn node(self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::VirtualRouter => "virtual-router",
            Self::VirtualWire => "virtual-wire",
            Self::Vlan => "vlan",
            Self::LogicalRouter => "logical-router",
        }
    }
}

/// Path to a vsys's import member list for one construct kind.
fn import_list(vsys: &str, kind: VsysImport) -> XPath {
    vsys_xpath_prefix(vsys).join(["import", "network", kind.node()])
}

/// Import names into a vsys.
///
/// The same name must never be imported into two vsys at once, so the
/// names are first unimported from every other vsys.
pub async fn import_vsys(
    client: &Client,
    kind: VsysImport,
    vsys: &str,
    names: &[&str],
) -> Result<(), Error> {
    if names.is_empty() {
        return Ok(());
    }
    unimport_except(client, kind, Some(vsys), names).await?;

    let xpath = vsys_xpath_prefix(vsys).join(["import", "network"]);
    debug!(vsys, kind = kind.node(), ?names, "importing into vsys");
    client.set(&xpath, &Element::members(kind.node(), names)).await
}

/// Remove names from a vsys's import list, or from every vsys when
/// none is given. Names that were never imported are ignored.
pub async fn unimport_vsys(
    client: &Client,
    kind: VsysImport,
    vsys: Option<&str>,
    names: &[&str],
) -> Result<(), Error> {
    match vsys {
        Some(vsys) => unimport_one(client, kind, vsys, names).await,
        None => unimport_except(client, kind, None, names).await,
    }
}

/// Unimport then delete: the removal-side pairing of the membership
/// invariant. `object_xpath` addresses the construct itself.
pub async fn unimport_then_delete(
    client: &Client,
    kind: VsysImport,
    names: &[&str],
    object_xpath: &XPath,
) -> Result<(), Error> {
    unimport_except(client, kind, None, names).await?;
    client.delete(object_xpath).await
}

async fn unimport_one(
    client: &Client,
    kind: VsysImport,
    vsys: &str,
    names: &[&str],
) -> Result<(), Error> {
    if names.is_empty() {
        return Ok(());
    }
    let mut xpath = import_list(vsys, kind);
    xpath.push(as_member_xpath(names));
    match client.delete(&xpath).await {
        Err(err) if err.is_object_not_found() => Ok(()),
        other => other,
    }
}

/// Unimport the names from every vsys except `keep` (all vsys when
/// `keep` is `None`). Membership is discovered from the live config so
/// only the vsys actually holding a name sees a delete.
async fn unimport_except(
    client: &Client,
    kind: VsysImport,
    keep: Option<&str>,
    names: &[&str],
) -> Result<(), Error> {
    let all = match client.get(&vsys_listing_xpath()).await {
        Ok(result) => result,
        Err(err) if err.is_object_not_found() => return Ok(()),
        Err(err) => return Err(err),
    };

    let vsys_entries = match all.find("vsys") {
        Some(container) => container.children_named("entry"),
        None => return Ok(()),
    };

    for entry in vsys_entries {
        let Some(vsys) = entry.attr_value("name") else {
            continue;
        };
        if keep == Some(vsys) {
            continue;
        }
        let imported: Vec<&str> = entry
            .find_path(&["import", "network", kind.node()])
            .map(|list| {
                list.children_named("member")
                    .map(|m| m.text.as_str())
                    .filter(|m| names.contains(m))
                    .collect()
            })
            .unwrap_or_default();
        if !imported.is_empty() {
            debug!(vsys, kind = kind.node(), ?imported, "unimporting from vsys");
            unimport_one(client, kind, vsys, &imported).await?;
        }
    }
    Ok(())
}

fn vsys_listing_xpath() -> XPath {
    // The parent of every vsys entry; one fetch covers all of them.
    vsys_xpath_prefix("x").parent()
}

// ── Panorama attachments ─────────────────────────────────────────────

/// Append templates to a template stack's ordered member list.
pub async fn assign_templates(
    client: &Client,
    stack: &str,
    templates: &[&str],
) -> Result<(), Error> {
    if templates.is_empty() {
        return Ok(());
    }
    let xpath = pangolin_api::xpath::template_xpath_prefix("", stack);
    client
        .set(&xpath, &Element::members("templates", templates))
        .await
}

/// Detach a template from a stack.
pub async fn remove_template(client: &Client, stack: &str, template: &str) -> Result<(), Error> {
    let mut xpath =
        pangolin_api::xpath::template_xpath_prefix("", stack).join(["templates"]);
    xpath.push(as_member_xpath(&[template]));
    match client.delete(&xpath).await {
        Err(err) if err.is_object_not_found() => Ok(()),
        other => other,
    }
}

/// Register device serials under a device group.
pub async fn assign_devices(
    client: &Client,
    device_group: &str,
    serials: &[&str],
) -> Result<(), Error> {
    if serials.is_empty() {
        return Ok(());
    }
    let xpath = pangolin_api::xpath::device_group_xpath_prefix(device_group);
    client
        .set(&xpath, &Element::entry_list("devices", serials))
        .await
}

/// Remove a device serial from a device group.
pub async fn remove_device(
    client: &Client,
    device_group: &str,
    serial: &str,
) -> Result<(), Error> {
    let xpath = pangolin_api::xpath::device_group_xpath_prefix(device_group)
        .join(["devices"])
        .entry(&[serial]);
    match client.delete(&xpath).await {
        Err(err) if err.is_object_not_found() => Ok(()),
        other => other,
    }
}
