// Address objects.
//
// The smallest real binding, and the reference for how a versioned
// container looks: two schema variants (tags arrived with the 9.0
// config split), raw-subtree preservation, all four value kinds.

use std::collections::BTreeMap;

use pangolin_api::{Element, Error, Version};

use crate::object::{PanObject, SchemaVariant, append_raw, collect_raw};

/// How an address object's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressKind {
    #[default]
    IpNetmask,
    IpRange,
    IpWildcard,
    Fqdn,
}

impl AddressKind {
    fn node(self) -> &'static str {
        match self {
            Self::IpNetmask => "ip-netmask",
            Self::IpRange => "ip-range",
            Self::IpWildcard => "ip-wildcard",
            Self::Fqdn => "fqdn",
        }
    }

    fn from_node(node: &str) -> Option<Self> {
        match node {
            "ip-netmask" => Some(Self::IpNetmask),
            "ip-range" => Some(Self::IpRange),
            "ip-wildcard" => Some(Self::IpWildcard),
            "fqdn" => Some(Self::Fqdn),
            _ => None,
        }
    }

    const ALL_NODES: [&'static str; 4] = ["ip-netmask", "ip-range", "ip-wildcard", "fqdn"];
}

/// One address object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    pub name: String,
    pub kind: AddressKind,
    pub value: String,
    pub description: Option<String>,
    /// Administrative tags; ignored by pre-9.0 schemas.
    pub tags: Vec<String>,
    /// Unmodeled subtrees, re-emitted verbatim.
    pub raw: BTreeMap<String, Element>,
}

impl Address {
    pub fn new(name: impl Into<String>, kind: AddressKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            ..Self::default()
        }
    }
}

impl PanObject for Address {
    const SUFFIX: &'static [&'static str] = &["address"];

    fn name(&self) -> &str {
        &self.name
    }

    fn variants() -> Vec<SchemaVariant<Self>> {
        vec![
            SchemaVariant {
                min_version: Version::new(9, 0, 0),
                marshal: marshal_v2,
                normalize: normalize_v2,
            },
            SchemaVariant {
                min_version: Version::new(6, 1, 0),
                marshal: marshal_v1,
                normalize: normalize_v1,
            },
        ]
    }
}

const KNOWN_V1: [&str; 5] = [
    "ip-netmask",
    "ip-range",
    "ip-wildcard",
    "fqdn",
    "description",
];
const KNOWN_V2: [&str; 6] = [
    "ip-netmask",
    "ip-range",
    "ip-wildcard",
    "fqdn",
    "description",
    "tag",
];

fn marshal_common(addr: &Address) -> Element {
    let mut entry = Element::new("entry")
        .attr("name", &addr.name)
        .text_child(addr.kind.node(), &addr.value);
    if let Some(ref description) = addr.description {
        entry = entry.text_child("description", description);
    }
    entry
}

fn marshal_v1(addr: &Address) -> Element {
    let mut entry = marshal_common(addr);
    append_raw(&mut entry, &addr.raw);
    entry
}

fn marshal_v2(addr: &Address) -> Element {
    let mut entry = marshal_common(addr);
    if !addr.tags.is_empty() {
        entry.push(Element::members("tag", &addr.tags));
    }
    append_raw(&mut entry, &addr.raw);
    entry
}

fn normalize_common(entry: &Element) -> Result<Address, Error> {
    let name = entry
        .attr_value("name")
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::Protocol {
            message: "address entry without a name".into(),
        })?;

    let value_node = entry
        .children
        .iter()
        .find(|c| AddressKind::ALL_NODES.contains(&c.name.as_str()));
    let (kind, value) = match value_node {
        Some(node) => (
            AddressKind::from_node(&node.name).unwrap_or_default(),
            node.text.clone(),
        ),
        None => (AddressKind::default(), String::new()),
    };

    Ok(Address {
        name: name.to_owned(),
        kind,
        value,
        description: entry.child_text("description").map(str::to_owned),
        tags: Vec::new(),
        raw: BTreeMap::new(),
    })
}

fn normalize_v1(entry: &Element) -> Result<Address, Error> {
    let mut addr = normalize_common(entry)?;
    addr.raw = collect_raw(entry, &KNOWN_V1);
    Ok(addr)
}

fn normalize_v2(entry: &Element) -> Result<Address, Error> {
    let mut addr = normalize_common(entry)?;
    addr.tags = entry
        .find("tag")
        .map(Element::member_values)
        .unwrap_or_default();
    addr.raw = collect_raw(entry, &KNOWN_V2);
    Ok(addr)
}
