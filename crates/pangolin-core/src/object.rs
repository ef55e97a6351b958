// The versioned container contract.
//
// Every managed object type provides a family of schema variants, one
// per release range: a marshaler producing the on-wire `<entry>` and a
// normalizer producing the version-independent value. Dispatch walks an
// ordered table and the first satisfied gate wins, so adding a release
// means prepending a row.

use std::collections::BTreeMap;

use pangolin_api::{Element, Error, Version};

/// One schema variant of an object type.
///
/// Plain function pointers rather than trait objects: variants carry no
/// state, and the table form keeps a binding's version history readable
/// in one place.
pub struct SchemaVariant<O> {
    /// Lowest software release this variant covers.
    pub min_version: Version,
    /// Produce the on-wire `<entry>` element for one object.
    pub marshal: fn(&O) -> Element,
    /// Produce the normalized object from one `<entry>` element.
    pub normalize: fn(&Element) -> Result<O, Error>,
}

impl<O> std::fmt::Debug for SchemaVariant<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaVariant")
            .field("min_version", &self.min_version)
            .finish_non_exhaustive()
    }
}

impl<O> Clone for SchemaVariant<O> {
    fn clone(&self) -> Self {
        Self {
            min_version: self.min_version.clone(),
            marshal: self.marshal,
            normalize: self.normalize,
        }
    }
}

/// A configuration object type managed through the generic namespaces.
///
/// Implementations are plain-data entry structs. Fields that only some
/// releases support exist on every entry; a variant that does not know
/// a field ignores it when marshaling and leaves it at its default when
/// normalizing.
pub trait PanObject: Clone + Send + Sync + Sized + 'static {
    /// Path segments from the scope prefix to the object container
    /// (e.g. `["address"]`, `["rulebase", "security", "rules"]`).
    const SUFFIX: &'static [&'static str];

    /// The entry name, used as the last path element.
    fn name(&self) -> &str;

    /// Schema variants ordered newest gate first.
    fn variants() -> Vec<SchemaVariant<Self>>;
}

/// Select the schema variant for a device release: the first table row
/// whose gate is satisfied.
pub fn versioning<O: PanObject>(version: &Version) -> Result<SchemaVariant<O>, Error> {
    O::variants()
        .into_iter()
        .find(|v| version.gte(&v.min_version))
        .ok_or_else(|| Error::VersionMismatch {
            version: version.clone(),
        })
}

// ── Raw subtree preservation ─────────────────────────────────────────

/// Collect the child subtrees a normalizer does not model, keyed by
/// element name. Re-emitted verbatim at marshal time so that
/// read-modify-write never drops unmodeled config.
pub fn collect_raw(entry: &Element, known: &[&str]) -> BTreeMap<String, Element> {
    entry
        .children
        .iter()
        .filter(|c| !known.contains(&c.name.as_str()))
        .map(|c| (c.name.clone(), c.clone()))
        .collect()
}

/// Append preserved subtrees to a marshaled entry.
pub fn append_raw(entry: &mut Element, raw: &BTreeMap<String, Element>) {
    for subtree in raw.values() {
        entry.push(subtree.clone());
    }
}
