// Predefined data.
//
// Read-only views of the device's built-in threat and file-type
// catalogs under /config/predefined. These trees are large and flat,
// so the find_* helpers filter server responses with a caller-supplied
// regex instead of round-tripping per name.

use regex::Regex;

use pangolin_api::xml::as_bool;
use pangolin_api::xpath::predefined_xpath_prefix;
use pangolin_api::{Client, Element, Error};

use crate::namespace::Verb;

/// One predefined threat signature (vulnerability or phone-home).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threat {
    /// Numeric signature id; the entry name on the wire.
    pub name: String,
    pub threat_name: String,
}

/// One predefined file type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileType {
    pub name: String,
    pub full_name: String,
    /// Whether content inspection can identify the type.
    pub data_ident: bool,
}

/// All predefined threat signatures, vulnerability and phone-home
/// alike.
pub async fn threats(client: &Client, verb: Verb) -> Result<Vec<Threat>, Error> {
    let xpath = predefined_xpath_prefix().join(["threats"]);
    let result = verb.fetch(client, &xpath).await?;
    let Some(tree) = result.find("threats") else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for family in ["vulnerability", "phone-home"] {
        if let Some(container) = tree.find(family) {
            for entry in container.children_named("entry") {
                out.push(Threat {
                    name: entry.attr_value("name").unwrap_or_default().to_owned(),
                    threat_name: entry
                        .child_text("threatname")
                        .unwrap_or_default()
                        .to_owned(),
                });
            }
        }
    }
    Ok(out)
}

/// Threats whose id or name matches `pattern`.
pub async fn find_threats(
    client: &Client,
    verb: Verb,
    pattern: &str,
) -> Result<Vec<Threat>, Error> {
    let re = compile(pattern)?;
    let mut all = threats(client, verb).await?;
    all.retain(|t| re.is_match(&t.name) || re.is_match(&t.threat_name));
    Ok(all)
}

/// All predefined file types.
pub async fn file_types(client: &Client, verb: Verb) -> Result<Vec<FileType>, Error> {
    let xpath = predefined_xpath_prefix().join(["file-type"]);
    let result = verb.fetch(client, &xpath).await?;
    let Some(tree) = result.find("file-type") else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for entry in tree.children_named("entry") {
        let data_ident = match entry.child_text("data-ident") {
            None | Some("") => false,
            Some(value) => as_bool(value)?,
        };
        out.push(FileType {
            name: entry.attr_value("name").unwrap_or_default().to_owned(),
            full_name: entry.child_text("full-name").unwrap_or_default().to_owned(),
            data_ident,
        });
    }
    Ok(out)
}

/// File types whose name or full name matches `pattern`.
pub async fn find_file_types(
    client: &Client,
    verb: Verb,
    pattern: &str,
) -> Result<Vec<FileType>, Error> {
    let re = compile(pattern)?;
    let mut all = file_types(client, verb).await?;
    all.retain(|f| re.is_match(&f.name) || re.is_match(&f.full_name));
    Ok(all)
}

fn compile(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|e| Error::Config {
        field: "pattern".into(),
        reason: e.to_string(),
    })
}
