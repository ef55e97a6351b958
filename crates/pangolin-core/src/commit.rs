// Commit orchestration.
//
// Builds the commit command variant the target accepts (firewall
// partial/full, Panorama partial/full, Panorama push-to-devices) and
// dispatches it. The returned job id hands off to the job tracker; a
// "nothing to commit" response is a clean no-op, not an error.

use tracing::debug;

use pangolin_api::xml::yes_no;
use pangolin_api::{Client, Element, Error, Extras};

/// A commit description that knows its own XML rendering.
pub trait CommitPayload {
    /// The `cmd` command tree.
    fn element(&self) -> Element;

    /// The `action` form field, when the variant needs one.
    fn action(&self) -> Option<&'static str> {
        None
    }
}

/// Commit the candidate configuration on a firewall.
#[derive(Debug, Clone, Default)]
pub struct FirewallCommit {
    pub description: Option<String>,
    /// Restrict the commit to these administrators' changes.
    pub admins: Vec<String>,
    pub exclude_device_and_network: bool,
    pub exclude_shared_objects: bool,
    pub exclude_policy_and_objects: bool,
    pub force: bool,
}

impl FirewallCommit {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    fn is_partial(&self) -> bool {
        !self.admins.is_empty()
            || self.exclude_device_and_network
            || self.exclude_shared_objects
            || self.exclude_policy_and_objects
    }
}

impl CommitPayload for FirewallCommit {
    fn element(&self) -> Element {
        let mut cmd = Element::new("commit");
        if let Some(ref description) = self.description {
            cmd = cmd.text_child("description", description);
        }
        if self.force {
            cmd = cmd.child(Element::new("force"));
        }
        if self.is_partial() {
            let mut partial = Element::new("partial");
            if !self.admins.is_empty() {
                partial.push(Element::members("admin", &self.admins));
            }
            if self.exclude_device_and_network {
                partial.push(Element::with_text("device-and-network", "excluded"));
            }
            if self.exclude_shared_objects {
                partial.push(Element::with_text("shared-object", "excluded"));
            }
            if self.exclude_policy_and_objects {
                partial.push(Element::with_text("policy-and-objects", "excluded"));
            }
            cmd = cmd.child(partial);
        }
        cmd
    }
}

/// Commit the candidate configuration on Panorama itself.
#[derive(Debug, Clone, Default)]
pub struct PanoramaCommit {
    pub description: Option<String>,
    pub admins: Vec<String>,
    pub device_groups: Vec<String>,
    pub templates: Vec<String>,
    pub template_stacks: Vec<String>,
    pub wildfire_appliances: Vec<String>,
    pub log_collectors: Vec<String>,
    pub log_collector_groups: Vec<String>,
    pub exclude_shared_objects: bool,
    pub force: bool,
}

impl PanoramaCommit {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    fn is_partial(&self) -> bool {
        !self.admins.is_empty()
            || !self.device_groups.is_empty()
            || !self.templates.is_empty()
            || !self.template_stacks.is_empty()
            || !self.wildfire_appliances.is_empty()
            || !self.log_collectors.is_empty()
            || !self.log_collector_groups.is_empty()
            || self.exclude_shared_objects
    }
}

impl CommitPayload for PanoramaCommit {
    fn element(&self) -> Element {
        let mut cmd = Element::new("commit");
        if let Some(ref description) = self.description {
            cmd = cmd.text_child("description", description);
        }
        if self.force {
            cmd = cmd.child(Element::new("force"));
        }
        if self.is_partial() {
            let mut partial = Element::new("partial");
            for (tag, values) in [
                ("admin", &self.admins),
                ("device-group", &self.device_groups),
                ("template", &self.templates),
                ("template-stack", &self.template_stacks),
                ("wildfire-appliance", &self.wildfire_appliances),
                ("log-collector", &self.log_collectors),
                ("log-collector-group", &self.log_collector_groups),
            ] {
                if !values.is_empty() {
                    partial.push(Element::members(tag, values));
                }
            }
            if self.exclude_shared_objects {
                partial.push(Element::with_text("shared-object", "excluded"));
            }
            cmd = cmd.child(partial);
        }
        cmd
    }
}

/// Push a device group's configuration out to its member firewalls
/// (the Panorama "commit-all" variant).
#[derive(Debug, Clone, Default)]
pub struct PanoramaPush {
    pub device_group: String,
    pub description: Option<String>,
    pub include_template: bool,
    pub force_template_values: bool,
}

impl PanoramaPush {
    pub fn new(device_group: impl Into<String>) -> Self {
        Self {
            device_group: device_group.into(),
            ..Self::default()
        }
    }
}

impl CommitPayload for PanoramaPush {
    fn element(&self) -> Element {
        let mut policy = Element::new("shared-policy").child(
            Element::new("device-group")
                .child(Element::new("entry").attr("name", &self.device_group)),
        );
        if let Some(ref description) = self.description {
            policy = policy.text_child("description", description);
        }
        if self.include_template {
            policy = policy.text_child("include-template", yes_no(true));
        }
        if self.force_template_values {
            policy = policy.text_child("force-template-values", yes_no(true));
        }
        Element::new("commit-all").child(policy)
    }

    fn action(&self) -> Option<&'static str> {
        Some("all")
    }
}

/// Dispatch a commit. `None` means the device had nothing to commit.
pub async fn commit(
    client: &Client,
    payload: &impl CommitPayload,
    extras: Option<Extras<'_>>,
) -> Result<Option<u64>, Error> {
    let job = client
        .commit(&payload.element(), payload.action(), extras)
        .await?;
    match job {
        Some(id) => debug!(id, "commit dispatched"),
        None => debug!("nothing to commit"),
    }
    Ok(job)
}
