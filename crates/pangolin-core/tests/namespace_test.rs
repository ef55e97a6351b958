// End-to-end namespace tests against a mocked device.

mod common;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pangolin_api::{Error, MoveWhere, Version};
use pangolin_core::objects::{Address, AddressKind};
use pangolin_core::{Namespace, PluginNamespace, PluginObject, PluginRequirement, Scope, Verb};

use common::{device_error, form_field, initialized_client, success};

const VSYS1_ADDRESS: &str =
    "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys1']/address";

fn address_ns(client: std::sync::Arc<pangolin_api::Client>) -> Namespace<Address> {
    Namespace::new(client, Scope::Vsys("vsys1".into()))
}

// ── Set ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn bulk_set_wraps_entries_in_container_tag() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    // Two entries: the xpath stops at /address and the element carries
    // both entries wrapped in the container tag.
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "set"))
        .and(form_field("xpath", VSYS1_ADDRESS))
        .and(form_field(
            "element",
            "<address>\
             <entry name=\"h1\"><ip-netmask>1.1.1.1</ip-netmask></entry>\
             <entry name=\"h2\"><ip-netmask>2.2.2.2</ip-netmask></entry>\
             </address>",
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    let ns = address_ns(client);
    ns.set(&[
        Address::new("h1", AddressKind::IpNetmask, "1.1.1.1"),
        Address::new("h2", AddressKind::IpNetmask, "2.2.2.2"),
    ])
    .await
    .unwrap();
}

#[tokio::test]
async fn single_set_targets_the_entry_xpath() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "set"))
        .and(form_field(
            "xpath",
            &format!("{VSYS1_ADDRESS}/entry[@name='h1']"),
        ))
        .and(form_field(
            "element",
            "<entry name=\"h1\"><ip-netmask>1.1.1.1</ip-netmask></entry>",
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    let ns = address_ns(client);
    ns.set(&[Address::new("h1", AddressKind::IpNetmask, "1.1.1.1")])
        .await
        .unwrap();
}

#[tokio::test]
async fn set_marshals_for_the_session_version() {
    let server = MockServer::start().await;
    // An 8.1 session: the tag field postdates it and must be omitted.
    let client = initialized_client(&server, "8.1.6", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "set"))
        .and(form_field(
            "element",
            "<entry name=\"h1\"><ip-netmask>1.1.1.1</ip-netmask></entry>",
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    let mut addr = Address::new("h1", AddressKind::IpNetmask, "1.1.1.1");
    addr.tags = vec!["prod".into()];
    address_ns(client).set(&[addr]).await.unwrap();
}

// ── Retrieval ───────────────────────────────────────────────────────

#[tokio::test]
async fn listing_maps_missing_container_to_empty() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "get"))
        .respond_with(device_error(7))
        .mount(&server)
        .await;

    let names = address_ns(client).listing(Verb::Get).await.unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn listing_returns_entry_names_in_order() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "get"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<response status="success"><result><address><entry name="b"/><entry name="a"/></address></result></response>"#,
        ))
        .mount(&server)
        .await;

    let names = address_ns(client).listing(Verb::Get).await.unwrap();
    assert_eq!(names, vec!["b", "a"]);
}

#[tokio::test]
async fn object_preserves_not_found() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "get"))
        .respond_with(device_error(7))
        .mount(&server)
        .await;

    let err = address_ns(client)
        .object(Verb::Get, "missing")
        .await
        .expect_err("single fetch keeps the miss");
    assert!(err.is_object_not_found());
}

#[tokio::test]
async fn objects_normalizes_every_entry() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "show"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<response status="success"><result><address><entry name="h1"><ip-netmask>1.1.1.1</ip-netmask></entry><entry name="web"><fqdn>web.example.com</fqdn><tag><member>prod</member></tag></entry></address></result></response>"#,
        ))
        .mount(&server)
        .await;

    let objects = address_ns(client).objects(Verb::Show).await.unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].kind, AddressKind::IpNetmask);
    assert_eq!(objects[1].kind, AddressKind::Fqdn);
    assert_eq!(objects[1].value, "web.example.com");
    assert_eq!(objects[1].tags, vec!["prod"]);
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_uses_disjunctive_selector() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "delete"))
        .and(form_field(
            "xpath",
            &format!("{VSYS1_ADDRESS}/entry[@name='h1' or @name='h2']"),
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    address_ns(client).delete(&["h1", "h2"]).await.unwrap();
}

#[tokio::test]
async fn single_delete_of_missing_name_stays_an_error() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "delete"))
        .respond_with(device_error(7))
        .mount(&server)
        .await;

    let err = address_ns(client)
        .delete(&["ghost"])
        .await
        .expect_err("single delete keeps the miss");
    assert!(err.is_object_not_found());
}

#[tokio::test]
async fn bulk_delete_tolerates_not_found() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "delete"))
        .respond_with(device_error(7))
        .mount(&server)
        .await;

    address_ns(client).delete(&["h1", "ghost"]).await.unwrap();
}

// ── Move group ──────────────────────────────────────────────────────

#[tokio::test]
async fn move_group_positions_first_then_chains() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "move"))
        .and(form_field("where", "before"))
        .and(form_field("dst", "anchor"))
        .and(form_field(
            "xpath",
            &format!("{VSYS1_ADDRESS}/entry[@name='r1']"),
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "move"))
        .and(form_field("where", "after"))
        .and(form_field("dst", "r1"))
        .and(form_field(
            "xpath",
            &format!("{VSYS1_ADDRESS}/entry[@name='r2']"),
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "move"))
        .and(form_field("where", "after"))
        .and(form_field("dst", "r2"))
        .and(form_field(
            "xpath",
            &format!("{VSYS1_ADDRESS}/entry[@name='r3']"),
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    let entries = [
        Address::new("r1", AddressKind::IpNetmask, "1.1.1.1"),
        Address::new("r2", AddressKind::IpNetmask, "2.2.2.2"),
        Address::new("r3", AddressKind::IpNetmask, "3.3.3.3"),
    ];
    address_ns(client)
        .move_group(MoveWhere::Before, Some("anchor"), &entries)
        .await
        .unwrap();
}

// ── Version gating ──────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_release_fails_before_any_request() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "6.0.0", "").await;

    let err = address_ns(client)
        .set(&[Address::new("h1", AddressKind::IpNetmask, "1.1.1.1")])
        .await
        .expect_err("no schema variant for 6.0");
    match err {
        Error::VersionMismatch { version } => assert_eq!(version, Version::new(6, 0, 0)),
        other => panic!("unexpected: {other:?}"),
    }
}

// ── Plugin gating ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct SdwanPath {
    name: String,
}

impl pangolin_core::PanObject for SdwanPath {
    const SUFFIX: &'static [&'static str] = &["sdwan", "path-quality-profile"];

    fn name(&self) -> &str {
        &self.name
    }

    fn variants() -> Vec<pangolin_core::SchemaVariant<Self>> {
        vec![pangolin_core::SchemaVariant {
            min_version: Version::new(9, 1, 0),
            marshal: |p| pangolin_api::Element::new("entry").attr("name", &p.name),
            normalize: |e| {
                Ok(SdwanPath {
                    name: e.attr_value("name").unwrap_or_default().to_owned(),
                })
            },
        }]
    }
}

impl PluginObject for SdwanPath {
    fn plugin() -> PluginRequirement {
        PluginRequirement {
            name: "sd_wan",
            min_version: "2.0.0",
        }
    }
}

const SDWAN_INSTALLED: &str = "<plugins><entry><name>sd_wan</name><version>2.0.2</version><installed>yes</installed><downloaded>yes</downloaded></entry></plugins>";
const SDWAN_OLD: &str = "<plugins><entry><name>sd_wan</name><version>1.0.4</version><installed>yes</installed><downloaded>yes</downloaded></entry></plugins>";

#[tokio::test]
async fn plugin_namespace_rejects_when_plugin_absent() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    let ns = PluginNamespace::<SdwanPath>::new(client, Scope::Vsys("vsys1".into()));
    let err = ns.listing(Verb::Get).await.expect_err("plugin missing");
    assert!(matches!(err, Error::PluginNotInstalled { name } if name == "sd_wan"));
}

#[tokio::test]
async fn plugin_namespace_rejects_stale_plugin() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", SDWAN_OLD).await;

    let ns = PluginNamespace::<SdwanPath>::new(client, Scope::Vsys("vsys1".into()));
    let err = ns.listing(Verb::Get).await.expect_err("plugin too old");
    match err {
        Error::PluginVersionMismatch {
            name,
            installed,
            required,
        } => {
            assert_eq!(name, "sd_wan");
            assert_eq!(installed, "1.0.4");
            assert_eq!(required, "2.0.0");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn plugin_namespace_operates_when_satisfied() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", SDWAN_INSTALLED).await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "get"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<response status="success"><result><path-quality-profile><entry name="voice"/></path-quality-profile></result></response>"#,
        ))
        .mount(&server)
        .await;

    let ns = PluginNamespace::<SdwanPath>::new(client, Scope::Vsys("vsys1".into()));
    assert_eq!(ns.listing(Verb::Get).await.unwrap(), vec!["voice"]);
}
