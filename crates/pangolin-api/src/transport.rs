// HTTP transport for the management API.
//
// One reqwest client per session, shared by every caller. All verbs go
// through a single form-encoded POST to /api/; file imports use the
// multipart variant. Idempotent reads get one retry on connection-level
// failures; mutating verbs never auto-retry.

use reqwest::multipart;
use tracing::{debug, trace};
use url::Url;

use crate::config::{ClientConfig, LogMask};
use crate::error::Error;

/// Form fields whose values must never reach the log output.
const ELIDED_FIELDS: [&str; 2] = ["password", "key"];

pub struct Transport {
    http: reqwest::Client,
    api_url: Url,
    logging: LogMask,
}

impl Transport {
    /// Build the shared client from a validated config.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout_duration())
            .user_agent(concat!("pangolin/", env!("CARGO_PKG_VERSION")));

        if !config.verify_certificate {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))?;

        let api_url = Url::parse(&format!(
            "{}://{}:{}/api/",
            config.protocol.scheme(),
            config.hostname,
            config.effective_port(),
        ))?;

        Ok(Self {
            http,
            api_url,
            logging: config.log_mask()?,
        })
    }

    /// The resolved API endpoint.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Whether a logging category is enabled.
    pub fn logs(&self, category: LogMask) -> bool {
        self.logging.contains(category)
    }

    /// POST a form-encoded request and return the raw body bytes.
    ///
    /// `idempotent` marks read verbs eligible for one retry when the
    /// connection drops before a response arrives.
    pub async fn post(
        &self,
        fields: &[(&str, String)],
        idempotent: bool,
    ) -> Result<Vec<u8>, Error> {
        if self.logs(LogMask::SEND) {
            debug!(fields = %render_fields(fields), "POST {}", self.api_url);
        }

        let body = match self.send(fields).await {
            Err(err) if idempotent && err.is_transient() => {
                trace!("read request hit a transient error, retrying once");
                self.send(fields).await?
            }
            other => other?,
        };

        if self.logs(LogMask::RECEIVE) {
            debug!(body = %String::from_utf8_lossy(&body), "received response");
        }
        Ok(body)
    }

    async fn send(&self, fields: &[(&str, String)]) -> Result<Vec<u8>, Error> {
        let resp = self
            .http
            .post(self.api_url.clone())
            .form(fields)
            .send()
            .await
            .map_err(Error::Transport)?;
        let body = resp.bytes().await.map_err(Error::Transport)?;
        Ok(body.to_vec())
    }

    /// POST a multipart file upload (the `import` verb). Non-file
    /// fields ride as query parameters, matching the device's API.
    pub async fn post_file(
        &self,
        params: &[(&str, String)],
        filename: String,
        content: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        let mut url = self.api_url.clone();
        {
            let mut query = url.query_pairs_mut();
            for (k, v) in params {
                query.append_pair(k, v);
            }
        }

        if self.logs(LogMask::SEND) {
            debug!(%filename, "POST (multipart) {}", self.api_url);
        }

        let part = multipart::Part::bytes(content).file_name(filename);
        let form = multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(Error::Transport)?;
        let body = resp.bytes().await.map_err(Error::Transport)?;

        if self.logs(LogMask::RECEIVE) {
            debug!(body = %String::from_utf8_lossy(&body), "received response");
        }
        Ok(body.to_vec())
    }
}

/// Render form fields for the send log with secret values elided.
fn render_fields(fields: &[(&str, String)]) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|(k, v)| {
            if ELIDED_FIELDS.contains(k) {
                format!("{k}=********")
            } else {
                format!("{k}={v}")
            }
        })
        .collect();
    parts.join("&")
}
