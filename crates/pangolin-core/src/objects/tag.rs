// Administrative tag objects.

use std::collections::BTreeMap;

use pangolin_api::{Element, Error, Version};

use crate::object::{PanObject, SchemaVariant, append_raw, collect_raw};

/// One administrative tag. The color is the device's `colorN` token;
/// callers map display names themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    pub name: String,
    pub color: Option<String>,
    pub comments: Option<String>,
    pub raw: BTreeMap<String, Element>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl PanObject for Tag {
    const SUFFIX: &'static [&'static str] = &["tag"];

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

const KNOWN: [&str; 2] = ["color", "comments"];

fn marshal(tag: &Tag) -> Element {
    let mut entry = Element::new("entry").attr("name", &tag.name);
    if let Some(ref color) = tag.color {
        entry = entry.text_child("color", color);
    }
    if let Some(ref comments) = tag.comments {
        entry = entry.text_child("comments", comments);
    }
    append_raw(&mut entry, &tag.raw);
    entry
}

fn normalize(entry: &Element) -> Result<Tag, Error> {
    let name = entry
        .attr_value("name")
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::Protocol {
            message: "tag entry without a name".into(),
        })?;

    Ok(Tag {
        name: name.to_owned(),
        color: entry.child_text("color").map(str::to_owned),
        comments: entry.child_text("comments").map(str::to_owned),
        raw: collect_raw(entry, &KNOWN),
    })
}
