// License management.
//
// Thin wrappers over the `request license` op commands. Nothing is
// cached locally; every call reflects what the device reports now.

use pangolin_api::xml::as_bool;
use pangolin_api::{Client, Element, Error};

/// One license feature as reported by `request license info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    pub feature: String,
    pub description: String,
    pub serial: String,
    pub issued: String,
    pub expires: String,
    pub expired: bool,
}

/// Currently installed licenses.
pub async fn list(client: &Client) -> Result<Vec<License>, Error> {
    let cmd = request_cmd(Element::new("info"));
    let root = client.op(&cmd, None, None).await?;
    parse_licenses(&root)
}

/// Refresh licenses from the licensing server and report the result.
pub async fn fetch(client: &Client) -> Result<Vec<License>, Error> {
    let cmd = request_cmd(Element::new("fetch"));
    let root = client.op(&cmd, None, None).await?;
    parse_licenses(&root)
}

/// Activate an auth code on the device.
pub async fn activate(client: &Client, auth_code: &str) -> Result<(), Error> {
    let cmd = request_cmd(Element::new("fetch").text_child("auth-code", auth_code));
    client.op(&cmd, None, None).await?;
    Ok(())
}

fn request_cmd(inner: Element) -> Element {
    Element::new("request").child(Element::new("license").child(inner))
}

fn parse_licenses(root: &Element) -> Result<Vec<License>, Error> {
    let entries = match root.find_path(&["result", "licenses"]) {
        Some(licenses) => licenses.children_named("entry"),
        None => return Ok(Vec::new()),
    };

    let mut out = Vec::new();
    for entry in entries {
        let text = |field: &str| entry.child_text(field).unwrap_or_default().to_owned();
        let expired = match entry.child_text("expired") {
            None | Some("") => false,
            Some(value) => as_bool(value)?,
        };
        out.push(License {
            feature: text("feature"),
            description: text("description"),
            serial: text("serial"),
            issued: text("issued"),
            expires: text("expires"),
            expired,
        });
    }
    Ok(out)
}
