// Generic CRUD namespace.
//
// One `Namespace<O>` per object type and scope. All operations resolve
// the schema variant for the session's software release, build xpaths
// from the scope prefix plus the object suffix, and speak through the
// shared client. Retrieval verbs map a code-7 miss to an empty result
// for list shapes but preserve it for single-object fetches.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use pangolin_api::{Client, Element, Error, MoveWhere, XPath};

use crate::object::{PanObject, versioning};
use crate::scope::Scope;

/// Which retrieval verb to read with: `get` for the candidate config,
/// `show` for the resolved view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Show,
}

impl Verb {
    pub(crate) async fn fetch(
        self,
        client: &Client,
        xpath: &XPath,
    ) -> Result<Element, Error> {
        match self {
            Self::Get => client.get(xpath).await,
            Self::Show => client.show(xpath).await,
        }
    }
}

/// Generic CRUD facade over one object type in one scope.
pub struct Namespace<O: PanObject> {
    client: Arc<Client>,
    scope: Scope,
    _object: PhantomData<O>,
}

impl<O: PanObject> Namespace<O> {
    pub fn new(client: Arc<Client>, scope: Scope) -> Self {
        Self {
            client,
            scope,
            _object: PhantomData,
        }
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// The container path; with names, the entry-selector path.
    pub fn xpath(&self, names: &[&str]) -> XPath {
        let path = self.scope.xpath_prefix().join(O::SUFFIX.iter().copied());
        if names.is_empty() {
            path
        } else {
            path.entry(names)
        }
    }

    // ── Retrieval ────────────────────────────────────────────────────

    /// Names of all entries under the container. A missing container
    /// is an empty listing.
    pub async fn listing(&self, verb: Verb) -> Result<Vec<String>, Error> {
        let result = match verb.fetch(self.client(), &self.xpath(&[])).await {
            Ok(result) => result,
            Err(err) if err.is_object_not_found() => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        Ok(container_entries(&result, Self::container_tag())
            .filter_map(|e| e.attr_value("name"))
            .map(str::to_owned)
            .collect())
    }

    /// Fetch and normalize one entry. A miss stays an error here so
    /// callers can distinguish "absent" from "present but empty".
    pub async fn object(&self, verb: Verb, name: &str) -> Result<O, Error> {
        let variant = versioning::<O>(&self.client.versioning()?)?;
        let result = verb.fetch(self.client(), &self.xpath(&[name])).await?;
        let entry = container_entries(&result, Self::container_tag())
            .next()
            .ok_or_else(not_found)?;
        (variant.normalize)(entry)
    }

    /// Fetch and normalize every entry under the container.
    pub async fn objects(&self, verb: Verb) -> Result<Vec<O>, Error> {
        let variant = versioning::<O>(&self.client.versioning()?)?;
        let result = match verb.fetch(self.client(), &self.xpath(&[])).await {
            Ok(result) => result,
            Err(err) if err.is_object_not_found() => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        container_entries(&result, Self::container_tag())
            .map(|e| (variant.normalize)(e))
            .collect()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Create or merge entries.
    ///
    /// One entry goes to its own xpath; several are wrapped in a bulk
    /// element named after the penultimate xpath segment and sent to
    /// the container path in the given order. Name collisions inside
    /// the batch surface as the device's "object not unique".
    pub async fn set(&self, entries: &[O]) -> Result<(), Error> {
        let variant = versioning::<O>(&self.client.versioning()?)?;
        match entries {
            [] => Ok(()),
            [entry] => {
                let xpath = self.xpath(&[entry.name()]);
                self.client.set(&xpath, &(variant.marshal)(entry)).await
            }
            many => {
                let xpath = self.xpath(&[]);
                let mut bulk = Element::new(Self::container_tag());
                for entry in many {
                    bulk.push((variant.marshal)(entry));
                }
                debug!(count = many.len(), %xpath, "bulk set");
                self.client.set(&xpath, &bulk).await
            }
        }
    }

    /// Replace one entry wholesale.
    pub async fn edit(&self, entry: &O) -> Result<(), Error> {
        let variant = versioning::<O>(&self.client.versioning()?)?;
        let xpath = self.xpath(&[entry.name()]);
        self.client.edit(&xpath, &(variant.marshal)(entry)).await
    }

    /// Delete entries by name with one disjunctive selector.
    ///
    /// A single missing name surfaces the device's "not found"; in a
    /// batch the miss is tolerated, since the surviving names were
    /// removed.
    pub async fn delete(&self, names: &[&str]) -> Result<(), Error> {
        if names.is_empty() {
            return Ok(());
        }
        match self.client.delete(&self.xpath(names)).await {
            Err(err) if err.is_object_not_found() && names.len() > 1 => Ok(()),
            other => other,
        }
    }

    /// Delete entries, taking the names from full objects.
    pub async fn delete_objects(&self, entries: &[O]) -> Result<(), Error> {
        let names: Vec<&str> = entries.iter().map(PanObject::name).collect();
        self.delete(&names).await
    }

    /// Position a run of entries relative to an anchor: the first entry
    /// moves `where_` the anchor, each subsequent entry moves after its
    /// predecessor.
    ///
    /// Best effort past the first move: a failure on entry K leaves
    /// entries 1..K positioned and the rest untouched.
    pub async fn move_group(
        &self,
        where_: MoveWhere,
        anchor: Option<&str>,
        entries: &[O],
    ) -> Result<(), Error> {
        let Some(first) = entries.first() else {
            return Ok(());
        };
        self.client
            .move_entry(&self.xpath(&[first.name()]), where_, anchor)
            .await?;

        let mut prev = first.name();
        for entry in &entries[1..] {
            self.client
                .move_entry(&self.xpath(&[entry.name()]), MoveWhere::After, Some(prev))
                .await?;
            prev = entry.name();
        }
        Ok(())
    }

    /// The container tag: the last suffix segment, which every bulk
    /// element is named after.
    fn container_tag() -> &'static str {
        O::SUFFIX.last().expect("object suffix is never empty")
    }
}

/// Entries under a retrieval result: either wrapped in the container
/// tag (parent-path fetch) or directly under `<result>` (entry fetch).
fn container_entries<'a>(
    result: &'a Element,
    tag: &'a str,
) -> Box<dyn Iterator<Item = &'a Element> + 'a> {
    match result.find(tag) {
        Some(container) => Box::new(container.children_named("entry")),
        None => Box::new(result.children_named("entry")),
    }
}

fn not_found() -> Error {
    Error::Device {
        code: 7,
        message: "Object not found".into(),
    }
}
