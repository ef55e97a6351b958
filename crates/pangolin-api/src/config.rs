// Client configuration.
//
// Describes how to reach one device: host, credentials, TLS and timeout
// tuning, logging categories. Built in code or loaded from a JSON file;
// `Client::new` validates before any connection is made. Credential
// fields hold `SecretString` so they never land in debug output.

use std::ops::BitOr;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::Error;

/// Ceiling for the connect/read timeout, matching the device's own
/// management-session limit.
const MAX_TIMEOUT_SECS: u64 = 60;

/// Wire protocol for the management API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// Connection settings for one firewall or Panorama.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Device hostname or address. Required.
    pub hostname: String,

    /// Administrator name for keygen. Required unless `api_key` is set.
    #[serde(default)]
    pub username: String,

    /// Administrator password for keygen.
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Pre-provisioned API key; bypasses keygen entirely.
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Management port. Zero means the protocol default.
    #[serde(default)]
    pub port: u16,

    /// `http` or `https`.
    #[serde(default)]
    pub protocol: Protocol,

    /// Verify the device's TLS certificate. Defaults to true; most
    /// appliances ship self-signed certs, so callers often disable it.
    #[serde(default = "default_verify")]
    pub verify_certificate: bool,

    /// Request timeout in seconds (default 10, maximum 60).
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Logging category names, OR-ed into the mask.
    #[serde(default)]
    pub logging: Vec<String>,

    /// Device serial for Panorama-proxied calls; sent as the `target`
    /// form field on every request when set.
    #[serde(default)]
    pub target: Option<String>,
}

fn default_verify() -> bool {
    true
}
fn default_timeout() -> u64 {
    10
}

impl ClientConfig {
    /// A config with defaults for everything but the hostname.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            username: String::new(),
            password: None,
            api_key: None,
            port: 0,
            protocol: Protocol::default(),
            verify_certificate: default_verify(),
            timeout: default_timeout(),
            logging: Vec::new(),
            target: None,
        }
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let body = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&body)?;
        Ok(config)
    }

    /// Check the invariants `Client::new` relies on.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |field: &str, reason: &str| Error::Config {
            field: field.into(),
            reason: reason.into(),
        };

        if self.hostname.is_empty() {
            return Err(invalid("hostname", "must not be empty"));
        }
        if self.api_key.is_none() && (self.username.is_empty() || self.password.is_none()) {
            return Err(invalid(
                "credentials",
                "username and password are required when no api_key is given",
            ));
        }
        if self.timeout == 0 {
            return Err(invalid("timeout", "must not be zero"));
        }
        if self.timeout > MAX_TIMEOUT_SECS {
            return Err(invalid("timeout", "must not exceed 60 seconds"));
        }
        self.log_mask()?;
        Ok(())
    }

    /// Effective management port.
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            self.protocol.default_port()
        } else {
            self.port
        }
    }

    /// The request timeout as a `Duration`.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Resolve the `logging` names into a bitmask.
    pub fn log_mask(&self) -> Result<LogMask, Error> {
        let mut mask = LogMask::NONE;
        for name in &self.logging {
            mask = mask | LogMask::from_name(name)?;
        }
        Ok(mask)
    }
}

// ── Logging categories ───────────────────────────────────────────────

/// Bitmask of API logging categories.
///
/// Mirrors the device SDK convention of per-category toggles rather
/// than levels; events are emitted through `tracing` at debug level
/// when their category is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogMask(u32);

impl LogMask {
    pub const NONE: LogMask = LogMask(0);
    /// Config retrieval verbs (show/get).
    pub const QUERY: LogMask = LogMask(1);
    /// Config mutation verbs (set/edit/delete/move/rename/clone).
    pub const ACTION: LogMask = LogMask(1 << 1);
    /// Operational commands and commits.
    pub const OP: LogMask = LogMask(1 << 2);
    /// User-id payloads.
    pub const UID: LogMask = LogMask(1 << 3);
    /// Parsed XML from responses.
    pub const XML_IN: LogMask = LogMask(1 << 4);
    /// Outgoing XML elements and command trees.
    pub const XML_OUT: LogMask = LogMask(1 << 5);
    /// Full outgoing form bodies (secrets elided).
    pub const SEND: LogMask = LogMask(1 << 6);
    /// Raw response bodies.
    pub const RECEIVE: LogMask = LogMask(1 << 7);

    pub fn contains(self, other: LogMask) -> bool {
        self.0 & other.0 == other.0
    }

    fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "query" => Ok(Self::QUERY),
            "action" => Ok(Self::ACTION),
            "op" => Ok(Self::OP),
            "uid" => Ok(Self::UID),
            "xml-in" => Ok(Self::XML_IN),
            "xml-out" => Ok(Self::XML_OUT),
            "send" => Ok(Self::SEND),
            "receive" => Ok(Self::RECEIVE),
            other => Err(Error::Config {
                field: "logging".into(),
                reason: format!("unknown category {other:?}"),
            }),
        }
    }
}

impl BitOr for LogMask {
    type Output = LogMask;

    fn bitor(self, rhs: LogMask) -> LogMask {
        LogMask(self.0 | rhs.0)
    }
}
