// Session and verb dispatch.
//
// One `Client` per device. Construction validates the config and builds
// the shared transport; `initialize` performs keygen and discovery.
// After that the client is freely shared across tasks: discovered state
// is write-once behind RwLocks and every verb takes `&self`.

use std::path::Path;
use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::config::{ClientConfig, LogMask};
use crate::error::{self, Error};
use crate::plugin::{self, PluginPackage};
use crate::version::Version;
use crate::xml::Element;
use crate::xpath::XPath;

/// Positional modes for the config `move` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveWhere {
    Before,
    After,
    Top,
    Bottom,
}

impl MoveWhere {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    /// Before/after moves are relative and need a destination entry.
    fn needs_dst(self) -> bool {
        matches!(self, Self::Before | Self::After)
    }
}

/// Extra form fields a caller may attach to a request.
pub type Extras<'a> = &'a [(&'a str, String)];

/// Client for one PAN-OS firewall or Panorama.
///
/// Lifecycle: `new` (uninitialized) → `initialize` (API key, version,
/// plugin inventory discovered) → shared use. Discovery results are
/// immutable once written; re-keying means building a new client.
pub struct Client {
    transport: crate::transport::Transport,
    config: ClientConfig,
    api_key: RwLock<Option<SecretString>>,
    version: RwLock<Option<Version>>,
    plugins: RwLock<Vec<PluginPackage>>,
}

impl Client {
    /// Build an uninitialized client from a config.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        let transport = crate::transport::Transport::new(&config)?;
        let api_key = RwLock::new(config.api_key.clone());
        Ok(Self {
            transport,
            config,
            api_key,
            version: RwLock::new(None),
            plugins: RwLock::new(Vec::new()),
        })
    }

    /// Build an uninitialized client from a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::new(ClientConfig::from_file(path)?)
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Acquire an API key (unless pre-provisioned) and discover the
    /// software version and plugin inventory.
    ///
    /// Any failure leaves the session uninitialized; the call can be
    /// repeated after the cause is fixed.
    pub async fn initialize(&self) -> Result<(), Error> {
        if self.api_key.read().expect("api key lock").is_none() {
            self.keygen().await?;
        }

        let version = self.fetch_version().await?;
        debug!(%version, "discovered software version");

        let plugins = self.fetch_plugins().await?;
        debug!(count = plugins.len(), "discovered plugin inventory");

        *self.plugins.write().expect("plugins lock") = plugins;
        // Version written last: it is the initialized marker.
        *self.version.write().expect("version lock") = Some(version);
        Ok(())
    }

    /// POST `type=keygen` with the configured credentials and cache the
    /// returned API key.
    pub async fn keygen(&self) -> Result<(), Error> {
        let password = self.config.password.as_ref().ok_or_else(|| Error::Config {
            field: "password".into(),
            reason: "required for keygen".into(),
        })?;

        let fields = [
            ("type", "keygen".to_owned()),
            ("user", self.config.username.clone()),
            ("password", password.expose_secret().to_owned()),
        ];
        let body = self.transport.post(&fields, true).await?;
        let root = error::decode(&body)?;

        let key = root
            .text_at(&["result", "key"])
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Protocol {
                message: "keygen response without a key".into(),
            })?;

        *self.api_key.write().expect("api key lock") = Some(SecretString::from(key.to_owned()));
        debug!("API key acquired");
        Ok(())
    }

    /// The software version discovered at initialization.
    pub fn versioning(&self) -> Result<Version, Error> {
        self.version
            .read()
            .expect("version lock")
            .clone()
            .ok_or(Error::Uninitialized)
    }

    /// The plugin inventory discovered at initialization.
    pub fn plugins(&self) -> Result<Vec<PluginPackage>, Error> {
        if self.version.read().expect("version lock").is_none() {
            return Err(Error::Uninitialized);
        }
        Ok(self.plugins.read().expect("plugins lock").clone())
    }

    // ── Operational commands ─────────────────────────────────────────

    /// Run an operational command; returns the parsed `<response>`.
    pub async fn op(
        &self,
        cmd: &Element,
        vsys: Option<&str>,
        extras: Option<Extras<'_>>,
    ) -> Result<Element, Error> {
        if self.transport.logs(LogMask::OP) {
            debug!(cmd = %cmd.render(), "op");
        }
        let mut fields = vec![("type", "op".to_owned()), ("cmd", cmd.render())];
        if let Some(vsys) = vsys {
            fields.push(("vsys", vsys.to_owned()));
        }
        append_extras(&mut fields, extras);
        self.request(fields, false).await
    }

    // ── Config verbs ─────────────────────────────────────────────────

    /// `action=show`: the named subtree of the candidate config, raw.
    pub async fn show(&self, xpath: &XPath) -> Result<Element, Error> {
        self.retrieve("show", xpath).await
    }

    /// `action=get`: the named subtree, fully resolved.
    pub async fn get(&self, xpath: &XPath) -> Result<Element, Error> {
        self.retrieve("get", xpath).await
    }

    async fn retrieve(&self, action: &'static str, xpath: &XPath) -> Result<Element, Error> {
        if self.transport.logs(LogMask::QUERY) {
            debug!(%xpath, action, "config query");
        }
        let fields = vec![
            ("type", "config".to_owned()),
            ("action", action.to_owned()),
            ("xpath", xpath.to_string()),
        ];
        let root = self.request(fields, true).await?;
        Ok(root
            .find("result")
            .cloned()
            .unwrap_or_else(|| Element::new("result")))
    }

    /// `action=set`: append `element` under the xpath.
    pub async fn set(&self, xpath: &XPath, element: &Element) -> Result<(), Error> {
        self.mutate("set", xpath, Some(element), Vec::new()).await
    }

    /// `action=edit`: replace the subtree at the xpath with `element`.
    pub async fn edit(&self, xpath: &XPath, element: &Element) -> Result<(), Error> {
        self.mutate("edit", xpath, Some(element), Vec::new()).await
    }

    /// `action=delete`: remove the subtree at the xpath.
    pub async fn delete(&self, xpath: &XPath) -> Result<(), Error> {
        self.mutate("delete", xpath, None, Vec::new()).await
    }

    /// `action=move`: reposition the entry at the xpath.
    pub async fn move_entry(
        &self,
        xpath: &XPath,
        where_: MoveWhere,
        dst: Option<&str>,
    ) -> Result<(), Error> {
        let mut extra = vec![("where", where_.as_str().to_owned())];
        match dst {
            Some(dst) => extra.push(("dst", dst.to_owned())),
            None if where_.needs_dst() => {
                return Err(Error::Config {
                    field: "dst".into(),
                    reason: format!("required for where={}", where_.as_str()),
                });
            }
            None => {}
        }
        self.mutate("move", xpath, None, extra).await
    }

    /// `action=rename`: rename the entry at the xpath.
    pub async fn rename(&self, xpath: &XPath, newname: &str) -> Result<(), Error> {
        self.mutate("rename", xpath, None, vec![("newname", newname.to_owned())])
            .await
    }

    /// `action=clone`: copy `from` under the parent xpath as `newname`.
    pub async fn clone_entry(
        &self,
        xpath: &XPath,
        from: &XPath,
        newname: &str,
    ) -> Result<(), Error> {
        self.mutate(
            "clone",
            xpath,
            None,
            vec![("from", from.to_string()), ("newname", newname.to_owned())],
        )
        .await
    }

    async fn mutate(
        &self,
        action: &'static str,
        xpath: &XPath,
        element: Option<&Element>,
        extra: Vec<(&'static str, String)>,
    ) -> Result<(), Error> {
        if self.transport.logs(LogMask::ACTION) {
            debug!(%xpath, action, "config action");
        }
        let mut fields = vec![
            ("type", "config".to_owned()),
            ("action", action.to_owned()),
            ("xpath", xpath.to_string()),
        ];
        if let Some(element) = element {
            if self.transport.logs(LogMask::XML_OUT) {
                debug!(element = %element.render(), "outgoing element");
            }
            fields.push(("element", element.render()));
        }
        fields.extend(extra);
        self.request(fields, false).await?;
        Ok(())
    }

    // ── Commit ───────────────────────────────────────────────────────

    /// Dispatch a commit. Returns the job id, or `None` when the device
    /// reports there is nothing to commit (success code 19/20 with no
    /// job element).
    pub async fn commit(
        &self,
        cmd: &Element,
        action: Option<&str>,
        extras: Option<Extras<'_>>,
    ) -> Result<Option<u64>, Error> {
        if self.transport.logs(LogMask::OP) {
            debug!(cmd = %cmd.render(), ?action, "commit");
        }
        let mut fields = vec![("type", "commit".to_owned()), ("cmd", cmd.render())];
        if let Some(action) = action {
            fields.push(("action", action.to_owned()));
        }
        append_extras(&mut fields, extras);

        let root = self.request(fields, false).await?;
        match root.text_at(&["result", "job"]) {
            Some(id) if !id.is_empty() => {
                let id = id.parse().map_err(|_| Error::Protocol {
                    message: format!("commit returned non-numeric job id {id:?}"),
                })?;
                Ok(Some(id))
            }
            _ => Ok(None),
        }
    }

    // ── Export / import ──────────────────────────────────────────────

    /// `type=export`: fetch a file (configuration, certificates, ...).
    /// Returns the raw body; an XML error envelope is decoded first.
    pub async fn export(
        &self,
        category: &str,
        extras: Option<Extras<'_>>,
    ) -> Result<Vec<u8>, Error> {
        let mut fields = vec![
            ("type", "export".to_owned()),
            ("category", category.to_owned()),
            ("key", self.key()?),
        ];
        append_extras(&mut fields, extras);
        if let Some(target) = &self.config.target {
            fields.push(("target", target.clone()));
        }

        let body = self.transport.post(&fields, true).await?;
        // Exports are usually raw file content; only a well-formed
        // <response> envelope can carry an error.
        if let Ok(text) = std::str::from_utf8(&body) {
            if let Ok(root) = Element::parse(text) {
                if let Some(err) = error::device_error(&root) {
                    return Err(err);
                }
            }
        }
        Ok(body)
    }

    /// `type=import`: upload a file under the given category.
    pub async fn import(
        &self,
        category: &str,
        filename: &str,
        content: Vec<u8>,
        extras: Option<Extras<'_>>,
    ) -> Result<(), Error> {
        let mut params = vec![
            ("type", "import".to_owned()),
            ("category", category.to_owned()),
            ("key", self.key()?),
        ];
        append_extras(&mut params, extras);
        if let Some(target) = &self.config.target {
            params.push(("target", target.clone()));
        }

        let body = self
            .transport
            .post_file(&params, filename.to_owned(), content)
            .await?;
        error::decode(&body)?;
        Ok(())
    }

    // ── User-ID ──────────────────────────────────────────────────────

    /// `type=user-id`: push a user-id payload (login/logout events,
    /// group mappings, registered tags).
    pub async fn userid(&self, payload: &Element, vsys: Option<&str>) -> Result<(), Error> {
        if self.transport.logs(LogMask::UID) {
            debug!(payload = %payload.render(), "user-id");
        }
        let mut fields = vec![("type", "user-id".to_owned()), ("cmd", payload.render())];
        if let Some(vsys) = vsys {
            fields.push(("vsys", vsys.to_owned()));
        }
        self.request(fields, false).await?;
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────

    fn key(&self) -> Result<String, Error> {
        self.api_key
            .read()
            .expect("api key lock")
            .as_ref()
            .map(|k| k.expose_secret().to_owned())
            .ok_or(Error::Uninitialized)
    }

    /// Attach key + target, POST, decode the envelope.
    async fn request(
        &self,
        mut fields: Vec<(&str, String)>,
        idempotent: bool,
    ) -> Result<Element, Error> {
        fields.push(("key", self.key()?));
        if let Some(target) = &self.config.target {
            fields.push(("target", target.clone()));
        }

        let body = self.transport.post(&fields, idempotent).await?;
        let root = error::decode(&body)?;
        if self.transport.logs(LogMask::XML_IN) {
            debug!(response = %root.render(), "parsed response");
        }
        Ok(root)
    }

    async fn fetch_version(&self) -> Result<Version, Error> {
        let cmd = Element::new("show").child(Element::new("system").child(Element::new("info")));
        let root = self.op(&cmd, None, None).await?;
        let raw = root
            .text_at(&["result", "system", "sw-version"])
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Protocol {
                message: "system info response without sw-version".into(),
            })?;
        raw.parse()
    }

    async fn fetch_plugins(&self) -> Result<Vec<PluginPackage>, Error> {
        let cmd =
            Element::new("show").child(Element::new("plugins").child(Element::new("packages")));
        match self.op(&cmd, None, None).await {
            Ok(root) => {
                let result = root.find("result").cloned().unwrap_or_default();
                plugin::parse_inventory(&result)
            }
            // Platforms without plugin support reject the command
            // outright; that is an empty inventory, not a failure.
            Err(Error::Device { code: 1, .. }) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}

fn append_extras<'a>(fields: &mut Vec<(&'a str, String)>, extras: Option<Extras<'a>>) {
    if let Some(extras) = extras {
        for (k, v) in extras {
            fields.push((k, v.clone()));
        }
    }
}
