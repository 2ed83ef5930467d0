//! Response envelope decoding.
//!
//! Every response body is `{success, result, errors, messages}`. `errors` and
//! `messages` entries come either as plain strings or as lists of strings;
//! both forms are flattened into one ordered list.

use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::codec::CodecError;
use crate::error::Stage;

const PREVIEW_LIMIT: usize = 256;

/// Decoded response envelope.
///
/// `success == false` is a normal envelope, not an error: server-side
/// rejections come back here with their `errors` list.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub success: bool,
    pub result: Option<T>,
    pub errors: Vec<String>,
    pub messages: Vec<String>,
}

impl<T> Envelope<T> {
    /// Envelope for a response with no body.
    #[must_use]
    pub fn empty(success: bool) -> Self {
        Self {
            success,
            result: None,
            errors: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Converts the result, keeping the rest of the envelope.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Envelope<U>, E> {
        Ok(Envelope {
            success: self.success,
            result: self.result.map(f).transpose()?,
            errors: self.errors,
            messages: self.messages,
        })
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnvelopeError {
    /// Body is not JSON, not an object, or lacks `success`.
    #[error("malformed response envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("response envelope reports success but carries no result")]
    MissingResult,

    #[error("invalid result: {0}")]
    Result(#[from] CodecError),

    /// Non-2xx status whose body is not an envelope.
    #[error("unexpected HTTP status {status}: {preview}")]
    UnexpectedStatus { status: StatusCode, preview: String },
}

impl EnvelopeError {
    /// Stage this error is reported under.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            EnvelopeError::UnexpectedStatus { .. } => Stage::Transport,
            _ => Stage::Decode,
        }
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<MessageEntry>>,
    #[serde(default)]
    messages: Option<Vec<MessageEntry>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageEntry {
    Single(String),
    Group(Vec<String>),
}

fn flatten(entries: Option<Vec<MessageEntry>>) -> Vec<String> {
    let mut flat = Vec::new();
    for entry in entries.into_iter().flatten() {
        match entry {
            MessageEntry::Single(s) => flat.push(s),
            MessageEntry::Group(group) => flat.extend(group),
        }
    }
    flat
}

/// Decodes a response body into an envelope, typing `result` with
/// `decode_result`.
///
/// An empty (or whitespace-only) body on a 2xx status yields a successful
/// envelope whose `result` is `None`. On any other status it is an
/// [`EnvelopeError::UnexpectedStatus`].
///
/// # Errors
///
/// - [`EnvelopeError::UnexpectedStatus`] when the status is not 2xx and the
///   body is not an envelope.
/// - [`EnvelopeError::Malformed`] / [`EnvelopeError::MissingResult`] /
///   [`EnvelopeError::Result`] for envelopes that do not decode.
pub fn decode_envelope<T>(
    status: StatusCode,
    body: &[u8],
    decode_result: impl FnOnce(&Value) -> Result<T, CodecError>,
) -> Result<Envelope<T>, EnvelopeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        if status.is_success() {
            return Ok(Envelope::empty(true));
        }
        return Err(EnvelopeError::UnexpectedStatus {
            status,
            preview: String::new(),
        });
    }

    let raw: RawEnvelope = match serde_json::from_slice(body) {
        Ok(raw) => raw,
        Err(_) if !status.is_success() => {
            return Err(EnvelopeError::UnexpectedStatus {
                status,
                preview: preview(body),
            });
        }
        Err(e) => return Err(EnvelopeError::Malformed(e)),
    };

    let result = match raw.result {
        Some(json) => Some(decode_result(&json)?),
        None if raw.success => return Err(EnvelopeError::MissingResult),
        None => None,
    };

    Ok(Envelope {
        success: raw.success,
        result,
        errors: flatten(raw.errors),
        messages: flatten(raw.messages),
    })
}

fn preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    match trimmed.char_indices().nth(PREVIEW_LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_owned(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::codec::decode_value;
    use crate::value::{SettingValue, ValueShape};

    fn decode(status: StatusCode, body: &str) -> Result<Envelope<SettingValue>, EnvelopeError> {
        let decode_result = |json: &Value| decode_value(ValueShape::OffOn, json);
        decode_envelope(status, body.as_bytes(), decode_result)
    }

    #[test]
    fn decodes_successful_envelope() {
        let env = decode(
            StatusCode::OK,
            r#"{"result":"on","success":true,"errors":[],"messages":[]}"#,
        )
        .unwrap();
        assert!(env.success);
        assert_eq!(env.result, Some(SettingValue::Text("on".into())));
        assert!(env.errors.is_empty());
        assert!(env.messages.is_empty());
    }

    #[test]
    fn flat_and_nested_messages_normalize_identically() {
        let flat = decode(
            StatusCode::OK,
            r#"{"success":false,"errors":["a","b"],"messages":["m"]}"#,
        )
        .unwrap();
        let nested = decode(
            StatusCode::OK,
            r#"{"success":false,"errors":[["a"],"b"],"messages":[["m"]]}"#,
        )
        .unwrap();
        assert_eq!(flat, nested);
        assert_eq!(flat.errors, ["a", "b"]);
    }

    #[test]
    fn missing_lists_are_empty() {
        let env = decode(StatusCode::OK, r#"{"success":false}"#).unwrap();
        assert!(env.errors.is_empty());
        assert!(env.messages.is_empty());
        assert_eq!(env.result, None);
    }

    #[test]
    fn empty_body_follows_status() {
        let ok = decode(StatusCode::NO_CONTENT, "").unwrap();
        assert_eq!(ok, Envelope::empty(true));

        for status in [StatusCode::BAD_GATEWAY, StatusCode::SERVICE_UNAVAILABLE] {
            let err = decode(status, "  \n").unwrap_err();
            assert_eq!(err.stage(), Stage::Transport);
            let EnvelopeError::UnexpectedStatus {
                status: reported,
                preview,
            } = &err
            else {
                panic!("unexpected error: {err}");
            };
            assert_eq!(*reported, status);
            assert!(preview.is_empty());
        }
    }

    #[test]
    fn success_without_result_is_a_decode_error() {
        for body in [r#"{"success":true}"#, r#"{"success":true,"result":null}"#] {
            let err = decode(StatusCode::OK, body).unwrap_err();
            assert!(matches!(err, EnvelopeError::MissingResult), "{body}");
            assert_eq!(err.stage(), Stage::Decode);
        }
    }

    #[test]
    fn malformed_bodies() {
        for body in [
            "not json",
            "[1,2]",
            r#"{"result":"on"}"#,
            r#"{"success":"yes"}"#,
        ] {
            let err = decode(StatusCode::OK, body).unwrap_err();
            assert!(matches!(err, EnvelopeError::Malformed(_)), "{body}");
        }
    }

    #[test]
    fn result_errors_are_decode_errors() {
        let err = decode(StatusCode::OK, r#"{"success":true,"result":5}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::Result(_)));
        assert_eq!(err.stage(), Stage::Decode);
    }

    #[test]
    fn non_envelope_error_status_is_transport_failure() {
        let err = decode(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        match &err {
            EnvelopeError::UnexpectedStatus { status, preview } => {
                assert_eq!(*status, StatusCode::BAD_GATEWAY);
                assert_eq!(preview, "<html>bad gateway</html>");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.stage(), Stage::Transport);
    }

    #[test]
    fn error_status_with_envelope_is_decoded() {
        let env = decode(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"errors":["Invalid value for zone setting"],"messages":[]}"#,
        )
        .unwrap();
        assert!(!env.success);
        assert_eq!(env.errors, ["Invalid value for zone setting"]);
    }

    #[test]
    fn long_previews_are_truncated() {
        let body = "x".repeat(1000);
        let p = preview(body.as_bytes());
        assert_eq!(p.len(), PREVIEW_LIMIT + 3);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn try_map_keeps_lists() {
        let env = Envelope {
            success: true,
            result: Some(1),
            errors: vec!["e".to_owned()],
            messages: vec!["m".to_owned()],
        };
        let mapped: Envelope<String> = env.try_map(|n| Ok::<_, ()>(n.to_string())).unwrap();
        assert_eq!(mapped.result.as_deref(), Some("1"));
        assert_eq!(mapped.errors, ["e"]);
        assert_eq!(mapped.messages, ["m"]);
    }
}
