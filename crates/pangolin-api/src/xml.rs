// XML element tree for API payloads and responses.
//
// The management API exchanges small XML fragments whose shape varies per
// object type and release, so everything flows through one generic tree
// type rather than per-message serde structs. Parsing uses a quick-xml
// event loop; rendering is a straight string build with quick-xml escaping.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use crate::error::Error;

/// One XML element: name, attributes, character data, children.
///
/// Character data is the concatenation of non-whitespace text nodes.
/// Mixed content is not modeled; PAN-OS config never produces it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// An empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// An element holding only character data.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    // ── Builders ─────────────────────────────────────────────────────

    /// Add an attribute (builder style).
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Append a child (builder style).
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append a text-only child (builder style).
    pub fn text_child(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.child(Element::with_text(name, text))
    }

    /// Append a child in place.
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Value of the first attribute named `key`.
    pub fn attr_value(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First child with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Walk a path of child names from this element.
    pub fn find_path(&self, path: &[&str]) -> Option<&Element> {
        let mut cur = self;
        for name in path {
            cur = cur.find(name)?;
        }
        Some(cur)
    }

    /// Character data of the first child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.find(name).map(|c| c.text.as_str())
    }

    /// Character data at the end of a child-name path.
    pub fn text_at(&self, path: &[&str]) -> Option<&str> {
        self.find_path(path).map(|e| e.text.as_str())
    }

    /// All children with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// The `name` attribute values of all `entry` children, in order.
    pub fn entry_names(&self) -> Vec<String> {
        self.children_named("entry")
            .filter_map(|e| e.attr_value("name"))
            .map(str::to_owned)
            .collect()
    }

    // ── Member / entry list codecs ───────────────────────────────────

    /// `<tag><member>a</member><member>b</member></tag>` from a value list.
    ///
    /// Input order is preserved; PAN-OS treats most member lists as
    /// unordered but some (e.g. template stacks) are positional.
    pub fn members(tag: impl Into<String>, values: &[impl AsRef<str>]) -> Self {
        let mut elm = Element::new(tag);
        for v in values {
            elm.push(Element::with_text("member", v.as_ref()));
        }
        elm
    }

    /// Values of all `member` children, in document order.
    pub fn member_values(&self) -> Vec<String> {
        self.children_named("member")
            .map(|m| m.text.clone())
            .collect()
    }

    /// `<tag><entry name="a"/><entry name="b"/></tag>` from a name list.
    pub fn entry_list(tag: impl Into<String>, names: &[impl AsRef<str>]) -> Self {
        let mut elm = Element::new(tag);
        for n in names {
            elm.push(Element::new("entry").attr("name", n.as_ref()));
        }
        elm
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Serialize to an XML string (no declaration).
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v.as_str()));
            out.push('"');
        }
        if self.text.is_empty() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        out.push_str(&escape(self.text.as_str()));
        for child in &self.children {
            child.render_into(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    // ── Parsing ──────────────────────────────────────────────────────

    /// Parse a single-rooted XML document.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(input);
        // quick-xml 0.38 splits a text run around entity references (emitted
        // as separate `GeneralRef` events), so reader-side trimming would
        // strip the spaces adjacent to an entity. Accumulate each run in
        // `pending` and trim it as a whole at the next markup boundary,
        // reproducing the single-shot decode+unescape of earlier releases.
        reader.config_mut().trim_text(false);
        let mut buf = Vec::new();

        // Stack of open elements; the finished root pops out at Eof.
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        // Character data accumulated since the last markup boundary.
        let mut pending = String::new();

        let protocol = |message: String| Error::Protocol { message };

        loop {
            match reader
                .read_event_into(&mut buf)
                .map_err(|e| protocol(format!("XML parse error: {e}")))?
            {
                Event::Start(ref e) => {
                    flush_text(&mut stack, &mut pending);
                    if root.is_some() && stack.is_empty() {
                        return Err(protocol("multiple root elements".into()));
                    }
                    stack.push(element_from_tag(e)?);
                }
                Event::Empty(ref e) => {
                    flush_text(&mut stack, &mut pending);
                    let elm = element_from_tag(e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(elm),
                        None if root.is_none() => root = Some(elm),
                        None => return Err(protocol("multiple root elements".into())),
                    }
                }
                Event::End(_) => {
                    flush_text(&mut stack, &mut pending);
                    let done = stack
                        .pop()
                        .ok_or_else(|| protocol("unbalanced close tag".into()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(done),
                        None => root = Some(done),
                    }
                }
                Event::Text(ref t) => {
                    let text = t
                        .decode()
                        .map_err(|e| protocol(format!("bad character data: {e}")))?;
                    pending.push_str(&text);
                }
                Event::GeneralRef(ref r) => {
                    let name = r
                        .decode()
                        .map_err(|e| protocol(format!("bad character data: {e}")))?;
                    let resolved = quick_xml::escape::unescape(&format!("&{name};"))
                        .map_err(|e| protocol(format!("bad character data: {e}")))?
                        .into_owned();
                    pending.push_str(&resolved);
                }
                Event::CData(ref c) => {
                    flush_text(&mut stack, &mut pending);
                    let text = String::from_utf8_lossy(c).into_owned();
                    if let Some(open) = stack.last_mut() {
                        open.text.push_str(&text);
                    }
                }
                Event::Eof => {
                    flush_text(&mut stack, &mut pending);
                    break;
                }
                // Declarations, comments, PIs, doctypes carry no config data.
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(protocol("unclosed element".into()));
        }
        root.ok_or_else(|| protocol("empty document".into()))
    }
}

/// Append the accumulated character-data run to the open element, trimming
/// surrounding whitespace so indentation between elements is dropped while
/// meaningful text (including internal spaces) is preserved. Clears `pending`.
fn flush_text(stack: &mut [Element], pending: &mut String) {
    let trimmed = pending.trim();
    if !trimmed.is_empty() {
        if let Some(open) = stack.last_mut() {
            open.text.push_str(trimmed);
        }
    }
    pending.clear();
}

fn element_from_tag(tag: &quick_xml::events::BytesStart<'_>) -> Result<Element, Error> {
    let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
    let mut elm = Element::new(name);
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| Error::Protocol {
            message: format!("bad attribute: {e}"),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Protocol {
                message: format!("bad attribute value: {e}"),
            })?
            .into_owned();
        elm.attrs.push((key, value));
    }
    Ok(elm)
}

// ── Boolean convention ───────────────────────────────────────────────

/// The device's `yes`/`no` boolean convention.
pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Parse the device's `yes`/`no` boolean convention.
pub fn as_bool(value: &str) -> Result<bool, Error> {
    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(Error::Protocol {
            message: format!("expected yes/no, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn render_escapes_text_and_attrs() {
        let elm = Element::new("entry")
            .attr("name", "a\"b")
            .text_child("description", "x < y & z");
        assert_eq!(
            elm.render(),
            "<entry name=\"a&quot;b\"><description>x &lt; y &amp; z</description></entry>"
        );
    }

    #[test]
    fn render_self_closes_empty() {
        assert_eq!(Element::new("info").render(), "<info/>");
    }

    #[test]
    fn parse_round_trips() {
        let xml = "<entry name=\"h1\"><ip-netmask>1.1.1.1</ip-netmask><tag><member>a</member><member>b</member></tag></entry>";
        let elm = Element::parse(xml).unwrap();
        assert_eq!(elm.render(), xml);
    }

    #[test]
    fn parse_skips_declaration_and_whitespace() {
        let xml = "<?xml version=\"1.0\"?>\n<response status=\"success\">\n  <result>\n    <key>XYZ</key>\n  </result>\n</response>";
        let elm = Element::parse(xml).unwrap();
        assert_eq!(elm.attr_value("status"), Some("success"));
        assert_eq!(elm.text_at(&["result", "key"]), Some("XYZ"));
    }

    #[test]
    fn parse_unescapes_entities() {
        let elm = Element::parse("<msg>a &lt; b &amp; c</msg>").unwrap();
        assert_eq!(elm.text, "a < b & c");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Element::parse("not xml at all").is_err());
        assert!(Element::parse("<a><b></a>").is_err());
        assert!(Element::parse("").is_err());
    }

    #[test]
    fn member_codec_preserves_order() {
        let elm = Element::members("tag", &["b", "a", "c"]);
        assert_eq!(elm.member_values(), vec!["b", "a", "c"]);
        assert_eq!(
            elm.render(),
            "<tag><member>b</member><member>a</member><member>c</member></tag>"
        );
    }

    #[test]
    fn entry_list_codec() {
        let elm = Element::entry_list("devices", &["001", "002"]);
        assert_eq!(elm.entry_names(), vec!["001", "002"]);
        assert_eq!(
            elm.render(),
            "<devices><entry name=\"001\"/><entry name=\"002\"/></devices>"
        );
    }

    #[test]
    fn yes_no_codec() {
        assert_eq!(yes_no(true), "yes");
        assert_eq!(yes_no(false), "no");
        assert!(as_bool("yes").unwrap());
        assert!(!as_bool("no").unwrap());
        assert!(as_bool("true").is_err());
    }
}
