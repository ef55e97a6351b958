// Administrative scopes.
//
// A firewall addresses objects under a vsys or its shared tree; a
// Panorama addresses them under device groups, templates, or its own
// shared tree. One scope value on the namespace covers the duality, so
// no object type needs parallel firewall/Panorama bindings.

use pangolin_api::XPath;
use pangolin_api::xpath::{
    LOCALHOST, as_entry_xpath, device_group_xpath_prefix, template_xpath_prefix,
    vsys_xpath_prefix,
};

/// Where in the configuration tree an object family lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// The shared tree (firewall or Panorama).
    Shared,
    /// A firewall virtual system; empty means `vsys1`.
    Vsys(String),
    /// A Panorama device group.
    DeviceGroup(String),
    /// Inside a Panorama template. Objects land in the template's
    /// shared tree unless a vsys is named.
    Template { name: String, vsys: Option<String> },
    /// Inside a Panorama template stack; same vsys rules as `Template`.
    TemplateStack { name: String, vsys: Option<String> },
}

impl Scope {
    /// The XPath prefix every object suffix is appended to.
    pub fn xpath_prefix(&self) -> XPath {
        match self {
            Self::Shared => XPath::from_segments(["config", "shared"]),
            Self::Vsys(vsys) => vsys_xpath_prefix(vsys),
            Self::DeviceGroup(dg) => device_group_xpath_prefix(dg),
            Self::Template { name, vsys } => {
                nested_device_config(template_xpath_prefix(name, ""), vsys.as_deref())
            }
            Self::TemplateStack { name, vsys } => {
                nested_device_config(template_xpath_prefix("", name), vsys.as_deref())
            }
        }
    }
}

/// Templates embed a whole device config tree; objects live under its
/// vsys entries or its shared node.
fn nested_device_config(prefix: XPath, vsys: Option<&str>) -> XPath {
    let base = prefix.join([
        "config".to_owned(),
        "devices".to_owned(),
        format!("entry[@name='{LOCALHOST}']"),
    ]);
    match vsys {
        Some(vsys) if !vsys.is_empty() => {
            base.join(["vsys".to_owned(), as_entry_xpath(&[vsys])])
        }
        _ => base.join(["shared"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firewall_scopes() {
        assert_eq!(Scope::Shared.xpath_prefix().to_string(), "/config/shared");
        assert_eq!(
            Scope::Vsys("vsys3".into()).xpath_prefix().to_string(),
            "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys3']"
        );
    }

    #[test]
    fn panorama_scopes() {
        assert_eq!(
            Scope::DeviceGroup("branch".into()).xpath_prefix().to_string(),
            "/config/devices/entry[@name='localhost.localdomain']/device-group/entry[@name='branch']"
        );
    }

    #[test]
    fn template_scope_nests_device_config() {
        let scope = Scope::Template {
            name: "dc-template".into(),
            vsys: Some("vsys1".into()),
        };
        assert_eq!(
            scope.xpath_prefix().to_string(),
            "/config/devices/entry[@name='localhost.localdomain']/template/entry[@name='dc-template']\
             /config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys1']"
        );
    }

    #[test]
    fn template_stack_without_vsys_uses_shared() {
        let scope = Scope::TemplateStack {
            name: "edge".into(),
            vsys: None,
        };
        assert_eq!(
            scope.xpath_prefix().to_string(),
            "/config/devices/entry[@name='localhost.localdomain']/template-stack/entry[@name='edge']\
             /config/devices/entry[@name='localhost.localdomain']/shared"
        );
    }
}
