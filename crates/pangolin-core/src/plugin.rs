// Plugin-gated namespace.
//
// Same CRUD contract as the standard namespace, but every operation is
// gated on the plugin inventory cached at session init. Absence and
// version shortfall are distinct errors so callers can tell "install
// it" from "upgrade it".

use std::sync::Arc;

use pangolin_api::{Client, Error, MoveWhere, Version};

use crate::namespace::{Namespace, Verb};
use crate::object::PanObject;
use crate::scope::Scope;

/// The plugin an object type's config subtree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginRequirement {
    pub name: &'static str,
    /// Lowest plugin release carrying the subtree.
    pub min_version: &'static str,
}

/// An object type that only exists when its plugin is installed.
pub trait PluginObject: PanObject {
    fn plugin() -> PluginRequirement;
}

/// CRUD facade for plugin-provided object types.
pub struct PluginNamespace<O: PluginObject> {
    inner: Namespace<O>,
}

impl<O: PluginObject> PluginNamespace<O> {
    pub fn new(client: Arc<Client>, scope: Scope) -> Self {
        Self {
            inner: Namespace::new(client, scope),
        }
    }

    /// Verify the required plugin against the cached inventory.
    fn check(&self) -> Result<(), Error> {
        let req = O::plugin();
        let inventory = self.inner.client().plugins()?;

        let installed = inventory
            .iter()
            .find(|p| p.name == req.name && p.installed)
            .ok_or_else(|| Error::PluginNotInstalled {
                name: req.name.to_owned(),
            })?;

        let have: Version =
            installed
                .version
                .parse()
                .map_err(|_| Error::PluginVersionMismatch {
                    name: req.name.to_owned(),
                    installed: installed.version.clone(),
                    required: req.min_version.to_owned(),
                })?;
        let need: Version = req.min_version.parse().map_err(|_| Error::Config {
            field: "plugin min_version".into(),
            reason: format!("unparsable version {:?}", req.min_version),
        })?;

        if !have.gte(&need) {
            return Err(Error::PluginVersionMismatch {
                name: req.name.to_owned(),
                installed: installed.version.clone(),
                required: req.min_version.to_owned(),
            });
        }
        Ok(())
    }

    pub async fn listing(&self, verb: Verb) -> Result<Vec<String>, Error> {
        self.check()?;
        self.inner.listing(verb).await
    }

    pub async fn object(&self, verb: Verb, name: &str) -> Result<O, Error> {
        self.check()?;
        self.inner.object(verb, name).await
    }

    pub async fn objects(&self, verb: Verb) -> Result<Vec<O>, Error> {
        self.check()?;
        self.inner.objects(verb).await
    }

    pub async fn set(&self, entries: &[O]) -> Result<(), Error> {
        self.check()?;
        self.inner.set(entries).await
    }

    pub async fn edit(&self, entry: &O) -> Result<(), Error> {
        self.check()?;
        self.inner.edit(entry).await
    }

    pub async fn delete(&self, names: &[&str]) -> Result<(), Error> {
        self.check()?;
        self.inner.delete(names).await
    }

    pub async fn delete_objects(&self, entries: &[O]) -> Result<(), Error> {
        self.check()?;
        self.inner.delete_objects(entries).await
    }

    pub async fn move_group(
        &self,
        where_: MoveWhere,
        anchor: Option<&str>,
        entries: &[O],
    ) -> Result<(), Error> {
        self.check()?;
        self.inner.move_group(where_, anchor, entries).await
    }
}
