// Shared wiremock scaffolding for namespace and commit tests.

use std::sync::Arc;

use secrecy::SecretString;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use pangolin_api::{Client, ClientConfig};

/// Matches one decoded form field exactly.
pub struct FormField {
    name: String,
    value: String,
}

pub fn form_field(name: &str, value: &str) -> FormField {
    FormField {
        name: name.to_owned(),
        value: value.to_owned(),
    }
}

impl Match for FormField {
    fn matches(&self, request: &Request) -> bool {
        url::form_urlencoded::parse(&request.body)
            .any(|(k, v)| k == self.name.as_str() && v == self.value.as_str())
    }
}

pub fn success() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(r#"<response status="success"/>"#)
}

pub fn device_error(code: u32) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        r#"<response status="error" code="{code}"><msg>error {code}</msg></response>"#
    ))
}

/// An initialized client against the mock server, reporting the given
/// software version and plugin inventory XML (inner `<plugins>` tree).
pub async fn initialized_client(server: &MockServer, version: &str, plugins: &str) -> Arc<Client> {
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("type=keygen"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<response status="success"><result><key>K</key></result></response>"#,
        ))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("system"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<response status="success"><result><system><sw-version>{version}</sw-version></system></result></response>"#
        )))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("plugins"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<response status="success"><result>{plugins}</result></response>"#
        )))
        .mount(server)
        .await;

    let addr = server.address();
    let mut config = ClientConfig::new(addr.ip().to_string());
    config.port = addr.port();
    config.protocol = pangolin_api::Protocol::Http;
    config.username = "admin".into();
    config.password = Some(SecretString::from("pw".to_owned()));

    let client = Client::new(config).expect("client config");
    client.initialize().await.expect("initialize");
    Arc::new(client)
}
