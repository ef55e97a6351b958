// XPath assembly for the configuration tree.
//
// The device addresses config nodes with a simplified XPath dialect:
// absolute paths from /config, `entry[@name='x']` selectors for named
// children, `member[text()='x']` for value lists, and disjunctive `or`
// inside a single predicate for multi-selection. Nothing else is valid,
// so paths are just ordered segment lists.

use std::fmt;

/// Hostname entry under `/config/devices`; constant on every release.
pub const LOCALHOST: &str = "localhost.localdomain";

/// An ordered sequence of XML path segments, rendered absolute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XPath {
    segments: Vec<String>,
}

impl XPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Append one segment.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Append segments (builder style).
    pub fn join<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }

    /// Append an entry selector for the given names (builder style).
    pub fn entry(mut self, names: &[&str]) -> Self {
        self.segments.push(as_entry_xpath(names));
        self
    }

    /// The path with the final segment removed.
    pub fn parent(&self) -> XPath {
        let mut segments = self.segments.clone();
        segments.pop();
        XPath { segments }
    }

    /// Final segment with any predicate stripped: the tag a bulk SET
    /// element takes its name from.
    pub fn final_tag(&self) -> Option<&str> {
        let last = self.segments.last()?;
        Some(last.split('[').next().unwrap_or(last))
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

// ── Selectors ────────────────────────────────────────────────────────

/// `entry[@name='a']`, or `entry[@name='a' or @name='b']` for several
/// names. The output depends only on the name list and its order.
pub fn as_entry_xpath(names: &[&str]) -> String {
    let preds: Vec<String> = names
        .iter()
        .map(|n| format!("@name={}", xpath_quote(n)))
        .collect();
    format!("entry[{}]", preds.join(" or "))
}

/// `member[text()='a']` analog for value lists.
pub fn as_member_xpath(values: &[&str]) -> String {
    let preds: Vec<String> = values
        .iter()
        .map(|v| format!("text()={}", xpath_quote(v)))
        .collect();
    format!("member[{}]", preds.join(" or "))
}

/// Quote a literal for a predicate. XPath 1.0 strings have no escape
/// sequence, so embedded apostrophes go through the concat() idiom.
fn xpath_quote(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    let parts: Vec<String> = value.split('\'').map(|p| format!("'{p}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

// ── Standard prefixes ────────────────────────────────────────────────

fn devices_entry() -> [String; 3] {
    [
        "config".into(),
        "devices".into(),
        format!("entry[@name='{LOCALHOST}']"),
    ]
}

/// Prefix for firewall vsys-scoped objects.
///
/// An empty vsys means the default `vsys1`; the pseudo-vsys `shared`
/// maps to the firewall's shared tree.
pub fn vsys_xpath_prefix(vsys: &str) -> XPath {
    if vsys == "shared" {
        return XPath::from_segments(["config", "shared"]);
    }
    let vsys = if vsys.is_empty() { "vsys1" } else { vsys };
    XPath::from_segments(devices_entry())
        .join(["vsys".to_owned(), as_entry_xpath(&[vsys])])
}

/// Prefix for Panorama device-group-scoped objects.
///
/// An empty device group maps to Panorama's shared tree.
pub fn device_group_xpath_prefix(device_group: &str) -> XPath {
    if device_group.is_empty() {
        return XPath::from_segments(["config", "shared"]);
    }
    XPath::from_segments(devices_entry()).join([
        "device-group".to_owned(),
        as_entry_xpath(&[device_group]),
    ])
}

/// Prefix for objects inside a Panorama template or template stack.
///
/// A non-empty `template` wins over `stack`. The returned path ends at
/// the template entry; the caller appends the nested device config path.
pub fn template_xpath_prefix(template: &str, stack: &str) -> XPath {
    let (node, name) = if template.is_empty() {
        ("template-stack", stack)
    } else {
        ("template", template)
    };
    XPath::from_segments(devices_entry()).join([node.to_owned(), as_entry_xpath(&[name])])
}

/// Prefix for the read-only predefined tree (threats, file types).
pub fn predefined_xpath_prefix() -> XPath {
    XPath::from_segments(["config", "predefined"])
}
