// pangolin-api: Async Rust client for the PAN-OS XML management API.
//
// Transport mechanics only: sessions, verbs, XML plumbing, error
// decoding, job tracking. Object schemas and CRUD namespaces live in
// pangolin-core.

pub mod client;
pub mod config;
pub mod error;
pub mod job;
pub mod plugin;
pub mod transport;
pub mod version;
pub mod xml;
pub mod xpath;

pub use client::{Client, Extras, MoveWhere};
pub use config::{ClientConfig, LogMask, Protocol};
pub use error::Error;
pub use job::{Job, JobState, wait_for_job};
pub use plugin::PluginPackage;
pub use version::Version;
pub use xml::Element;
pub use xpath::XPath;
