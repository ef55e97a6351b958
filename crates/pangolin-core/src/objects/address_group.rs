// Address group objects.
//
// Static groups hold a member list; dynamic groups hold a tag-match
// filter. The device stores exactly one of the two subtrees.

use std::collections::BTreeMap;

use pangolin_api::{Element, Error, Version};

use crate::object::{PanObject, SchemaVariant, append_raw, collect_raw};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressGroup {
    pub name: String,
    /// Members of a static group; empty for dynamic groups.
    pub static_members: Vec<String>,
    /// Match filter of a dynamic group.
    pub dynamic_filter: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub raw: BTreeMap<String, Element>,
}

impl AddressGroup {
    /// A static group over the given member names.
    pub fn new_static(
        name: impl Into<String>,
        members: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            name: name.into(),
            static_members: members.into_iter().collect(),
            ..Self::default()
        }
    }

    /// A dynamic group over a tag-match filter.
    pub fn new_dynamic(name: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dynamic_filter: Some(filter.into()),
            ..Self::default()
        }
    }
}

impl PanObject for AddressGroup {
    const SUFFIX: &'static [&'static str] = &["address-group"];

    fn name(&self) -> &str {
        &self.name
    }

    fn variants() -> Vec<SchemaVariant<Self>> {
        vec![SchemaVariant {
            min_version: Version::new(6, 1, 0),
            marshal,
            normalize,
        }]
    }
}

const KNOWN: [&str; 5] = ["static", "dynamic", "description", "tag", "filter"];

fn marshal(group: &AddressGroup) -> Element {
    let mut entry = Element::new("entry").attr("name", &group.name);
    if let Some(ref filter) = group.dynamic_filter {
        entry = entry.child(Element::new("dynamic").text_child("filter", filter));
    } else {
        entry = entry.child(Element::members("static", &group.static_members));
    }
    if let Some(ref description) = group.description {
        entry = entry.text_child("description", description);
    }
    if !group.tags.is_empty() {
        entry = entry.child(Element::members("tag", &group.tags));
    }
    append_raw(&mut entry, &group.raw);
    entry
}

fn normalize(entry: &Element) -> Result<AddressGroup, Error> {
    let name = entry
        .attr_value("name")
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::Protocol {
            message: "address-group entry without a name".into(),
        })?;

    Ok(AddressGroup {
        name: name.to_owned(),
        static_members: entry
            .find("static")
            .map(Element::member_values)
            .unwrap_or_default(),
        dynamic_filter: entry
            .find("dynamic")
            .and_then(|d| d.child_text("filter"))
            .map(str::to_owned),
        description: entry.child_text("description").map(str::to_owned),
        tags: entry
            .find("tag")
            .map(Element::member_values)
            .unwrap_or_default(),
        raw: collect_raw(entry, &KNOWN),
    })
}
