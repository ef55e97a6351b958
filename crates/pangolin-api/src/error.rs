// Error types and device response decoding.
//
// Every failure mode across the crate lands in one enum: transport,
// protocol (unparsable body), device-reported errors with their numeric
// code, schema/version dispatch, plugin gating, job outcomes, and
// cancellation. The core crate builds on the same type rather than
// wrapping it.

use thiserror::Error;

use crate::version::Version;
use crate::xml::Element;

/// Top-level error type for the `pangolin-api` crate.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (DNS, TCP, TLS handshake, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// Response body was not XML, or not the expected envelope.
    #[error("Malformed response: {message}")]
    Protocol { message: String },

    // ── Device ──────────────────────────────────────────────────────
    /// Error reported by the device's response envelope.
    #[error("Device error (code {code}): {message}")]
    Device { code: u32, message: String },

    // ── Versioning ──────────────────────────────────────────────────
    /// A version string the device sent could not be parsed.
    #[error("Invalid version string: {version:?}")]
    InvalidVersion { version: String },

    /// No schema variant covers the device's software release.
    #[error("No schema variant for PAN-OS {version}")]
    VersionMismatch { version: Version },

    // ── Plugins ─────────────────────────────────────────────────────
    /// A required plugin is absent or not installed.
    #[error("Plugin {name} is not installed")]
    PluginNotInstalled { name: String },

    /// A required plugin is installed but too old.
    #[error("Plugin {name} {installed} does not satisfy required {required}")]
    PluginVersionMismatch {
        name: String,
        installed: String,
        required: String,
    },

    // ── Jobs ────────────────────────────────────────────────────────
    /// An asynchronous job finished with result FAIL.
    #[error("Job {id} failed: {message}")]
    JobFailed { id: u64, message: String },

    /// Job polling was cancelled by the caller; the remote job keeps
    /// running.
    #[error("Operation cancelled")]
    Cancelled,

    // ── Session / configuration ─────────────────────────────────────
    /// The session has not completed `initialize()`.
    #[error("Session not initialized")]
    Uninitialized,

    /// Invalid client configuration.
    #[error("Invalid {field}: {reason}")]
    Config { field: String, reason: String },

    /// Config file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed.
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// `true` for device code 7: the addressed object does not exist.
    /// List operations treat this as an empty result.
    pub fn is_object_not_found(&self) -> bool {
        matches!(self, Self::Device { code: 7, .. })
    }

    /// `true` for connection-level failures worth one retry on
    /// idempotent reads.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// The device error code, if this is a device-reported error.
    pub fn device_code(&self) -> Option<u32> {
        match self {
            Self::Device { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Shorthand for a code-7 miss synthesized client-side (e.g. a GET
    /// that returned an empty container).
    pub(crate) fn object_not_found() -> Self {
        Self::Device {
            code: 7,
            message: canned_message(7).into(),
        }
    }
}

// ── Response envelope decoding ───────────────────────────────────────

/// Codes the device uses on successful responses.
const SUCCESS_CODES: [u32; 3] = [0, 19, 20];

/// Parse a response body and surface any device-reported error.
///
/// Returns the parsed `<response>` root on success so callers never
/// parse twice.
pub fn decode(body: &[u8]) -> Result<Element, Error> {
    let text = std::str::from_utf8(body).map_err(|_| Error::Protocol {
        message: "response body is not UTF-8".into(),
    })?;
    let root = Element::parse(text)?;
    match device_error(&root) {
        Some(err) => Err(err),
        None => Ok(root),
    }
}

/// Inspect a parsed `<response>` envelope for a failure.
///
/// `status` of `failed` or `error` marks an error unless `code` is one
/// of the success codes (0, 19, 20).
pub fn device_error(root: &Element) -> Option<Error> {
    let status = root.attr_value("status").unwrap_or_default();
    if status != "failed" && status != "error" {
        return None;
    }
    let code: u32 = root
        .attr_value("code")
        .and_then(|c| c.parse().ok())
        .unwrap_or(1);
    if SUCCESS_CODES.contains(&code) {
        return None;
    }

    let message =
        extract_message(root).unwrap_or_else(|| canned_message(code).to_owned());
    Some(Error::Device { code, message })
}

/// Message priority: `msg/line` entries joined by `" | "`, then `msg`
/// char data, then `result/msg`.
fn extract_message(root: &Element) -> Option<String> {
    if let Some(msg) = root.find("msg") {
        let lines: Vec<String> = msg
            .children_named("line")
            .map(|l| l.text.clone())
            .filter(|l| !l.is_empty())
            .collect();
        if !lines.is_empty() {
            return Some(lines.join(" | "));
        }
        if !msg.text.is_empty() {
            return Some(msg.text.clone());
        }
    }
    match root.text_at(&["result", "msg"]) {
        Some(text) if !text.is_empty() => Some(text.to_owned()),
        _ => None,
    }
}

/// Canonical messages keyed by device error code.
fn canned_message(code: u32) -> &'static str {
    match code {
        1 => "Unknown command",
        2..=5 | 11 => "Internal error",
        6 => "Bad Xpath",
        7 => "Object not found",
        8 => "Object not unique",
        10 => "Reference count not zero",
        12 => "Invalid object",
        14 => "Operation not possible",
        15 => "Operation denied",
        16 => "Unauthorized",
        17 => "Invalid command",
        18 => "Malformed command",
        22 => "Session timed out",
        _ => "Unspecified device error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_err(body: &str) -> Error {
        decode(body.as_bytes()).expect_err("expected an error")
    }

    #[test]
    fn success_statuses_pass() {
        assert!(decode(br#"<response status="success"/>"#).is_ok());
        assert!(decode(br#"<response status="success" code="19"><msg>no changes</msg></response>"#).is_ok());
        assert!(decode(br#"<response status="success" code="20"/>"#).is_ok());
    }

    #[test]
    fn error_status_with_success_code_passes() {
        assert!(decode(br#"<response status="error" code="19"/>"#).is_ok());
    }

    #[test]
    fn msg_lines_joined_with_pipes() {
        let err = decode_err(
            r#"<response status="error" code="12"><msg><line>first</line><line>second</line></msg></response>"#,
        );
        match err {
            Error::Device { code, message } => {
                assert_eq!(code, 12);
                assert_eq!(message, "first | second");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn msg_chardata_fallback() {
        let err =
            decode_err(r#"<response status="failed" code="6"><msg>bad path here</msg></response>"#);
        assert_eq!(err.to_string(), "Device error (code 6): bad path here");
    }

    #[test]
    fn result_msg_fallback() {
        let err = decode_err(
            r#"<response status="error" code="14"><result><msg>cannot do that</msg></result></response>"#,
        );
        match err {
            Error::Device { code, message } => {
                assert_eq!(code, 14);
                assert_eq!(message, "cannot do that");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn canned_table_covers_known_codes() {
        for (code, expected) in [
            (1, "Unknown command"),
            (2, "Internal error"),
            (5, "Internal error"),
            (6, "Bad Xpath"),
            (7, "Object not found"),
            (8, "Object not unique"),
            (10, "Reference count not zero"),
            (11, "Internal error"),
            (12, "Invalid object"),
            (14, "Operation not possible"),
            (15, "Operation denied"),
            (16, "Unauthorized"),
            (17, "Invalid command"),
            (18, "Malformed command"),
            (22, "Session timed out"),
        ] {
            let body = format!(r#"<response status="error" code="{code}"/>"#);
            match decode_err(&body) {
                Error::Device { code: c, message } => {
                    assert_eq!(c, code);
                    assert_eq!(message, expected);
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn missing_code_defaults_to_unknown_command() {
        let err = decode_err(r#"<response status="error"/>"#);
        assert_eq!(err.device_code(), Some(1));
    }

    #[test]
    fn not_found_predicate() {
        let err = decode_err(r#"<response status="error" code="7"/>"#);
        assert!(err.is_object_not_found());
        let other = decode_err(r#"<response status="error" code="8"/>"#);
        assert!(!other.is_object_not_found());
    }

    #[test]
    fn non_xml_is_protocol_error() {
        let err = decode_err("this is not xml");
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
