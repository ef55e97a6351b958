// pangolin-core: object layer for the PAN-OS XML API.
//
// Versioned schema containers, the generic CRUD namespaces (standard
// and plugin-gated), commit orchestration, administrative importers,
// and the small op-command helpers. Transport lives in pangolin-api.

pub mod audit;
pub mod commit;
pub mod import;
pub mod license;
pub mod namespace;
pub mod object;
pub mod objects;
pub mod plugin;
pub mod predefined;
pub mod scope;

pub use commit::{CommitPayload, FirewallCommit, PanoramaCommit, PanoramaPush, commit};
pub use namespace::{Namespace, Verb};
pub use object::{PanObject, SchemaVariant, versioning};
pub use plugin::{PluginNamespace, PluginObject, PluginRequirement};
pub use scope::Scope;
