// Importer tests: vsys membership exclusivity and Panorama attachments.

mod common;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pangolin_core::import::{
    VsysImport, assign_devices, assign_templates, import_vsys, unimport_vsys,
};

use common::{device_error, form_field, initialized_client, success};

const VSYS_PARENT: &str = "/config/devices/entry[@name='localhost.localdomain']/vsys";

/// Two vsys, with ethernet1/3 currently imported into vsys2.
fn vsys_listing() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(
        r#"<response status="success"><result><vsys>
            <entry name="vsys1"><import><network>
                <interface><member>ethernet1/1</member></interface>
            </network></import></entry>
            <entry name="vsys2"><import><network>
                <interface><member>ethernet1/3</member></interface>
            </network></import></entry>
        </vsys></result></response>"#,
    )
}

#[tokio::test]
async fn import_unimports_from_other_vsys_first() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "get"))
        .and(form_field("xpath", VSYS_PARENT))
        .respond_with(vsys_listing())
        .expect(1)
        .mount(&server)
        .await;

    // The stale membership in vsys2 goes away first...
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "delete"))
        .and(form_field(
            "xpath",
            &format!(
                "{VSYS_PARENT}/entry[@name='vsys2']/import/network/interface/member[text()='ethernet1/3']"
            ),
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    // ...then the name lands in vsys1.
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "set"))
        .and(form_field(
            "xpath",
            &format!("{VSYS_PARENT}/entry[@name='vsys1']/import/network"),
        ))
        .and(form_field(
            "element",
            "<interface><member>ethernet1/3</member></interface>",
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    import_vsys(&client, VsysImport::Interface, "vsys1", &["ethernet1/3"])
        .await
        .unwrap();
}

#[tokio::test]
async fn unimport_everywhere_skips_clean_vsys() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "get"))
        .and(form_field("xpath", VSYS_PARENT))
        .respond_with(vsys_listing())
        .expect(1)
        .mount(&server)
        .await;

    // Only vsys2 holds ethernet1/3; exactly one delete goes out.
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "delete"))
        .and(form_field(
            "xpath",
            &format!(
                "{VSYS_PARENT}/entry[@name='vsys2']/import/network/interface/member[text()='ethernet1/3']"
            ),
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    unimport_vsys(&client, VsysImport::Interface, None, &["ethernet1/3"])
        .await
        .unwrap();
}

#[tokio::test]
async fn unimport_tolerates_never_imported_names() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "10.1.3", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "delete"))
        .respond_with(device_error(7))
        .mount(&server)
        .await;

    unimport_vsys(
        &client,
        VsysImport::Vlan,
        Some("vsys1"),
        &["never-imported"],
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn panorama_attachments_use_member_and_entry_lists() {
    let server = MockServer::start().await;
    let client = initialized_client(&server, "11.0.2", "").await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "set"))
        .and(form_field(
            "xpath",
            "/config/devices/entry[@name='localhost.localdomain']/template-stack/entry[@name='edge']",
        ))
        .and(form_field(
            "element",
            "<templates><member>base</member><member>dc</member></templates>",
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    assign_templates(&client, "edge", &["base", "dc"]).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(form_field("action", "set"))
        .and(form_field(
            "xpath",
            "/config/devices/entry[@name='localhost.localdomain']/device-group/entry[@name='branch']",
        ))
        .and(form_field(
            "element",
            "<devices><entry name=\"0070000001\"/></devices>",
        ))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    assign_devices(&client, "branch", &["0070000001"]).await.unwrap();
}
