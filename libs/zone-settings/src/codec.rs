//! Shape-driven encoding and decoding of setting values.
//!
//! Encoding validates caller values against their [`ValueShape`] before any
//! request exists. Decoding is strict on types (a number sent as a string is
//! an error, never parsed) and fail-fast on records: the first missing or
//! mistyped sub-field aborts the whole decode.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::value::{Field, OFF_ON, SettingValue, ValueShape};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Value is outside the declared member set.
    #[error("'{path}': value '{value}' is not one of [{}]", .allowed.join(", "))]
    NotAllowed {
        path: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("'{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{path}': missing required field")]
    MissingField { path: String },

    /// Caller record carries a field the shape does not declare.
    #[error("'{path}': unknown field")]
    UnknownField { path: String },

    #[error("'{path}': {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CodecError {
    /// Dotted path of the offending value, e.g. `value.strict_transport_security.max_age`.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            CodecError::NotAllowed { path, .. }
            | CodecError::TypeMismatch { path, .. }
            | CodecError::MissingField { path }
            | CodecError::UnknownField { path }
            | CodecError::InvalidValue { path, .. } => Some(path),
            CodecError::Serialize(_) => None,
        }
    }
}

/// Encodes a caller value into its JSON form.
///
/// # Errors
///
/// Returns [`CodecError`] if the value does not fit `shape`.
pub fn encode_value(shape: ValueShape, value: &SettingValue) -> Result<Value, CodecError> {
    encode_at("value", shape, value)
}

/// Encodes a request body `{"<key>": <value>}`.
///
/// `None` means "no change intended": no body is produced at all.
///
/// # Errors
///
/// Returns [`CodecError`] if the value does not fit `shape` or cannot be serialized.
pub fn encode_body(
    key: &str,
    shape: ValueShape,
    value: Option<&SettingValue>,
) -> Result<Option<Bytes>, CodecError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let encoded = encode_at(key, shape, value)?;
    let mut body = Map::with_capacity(1);
    body.insert(key.to_owned(), encoded);
    let bytes = serde_json::to_vec(&Value::Object(body))?;
    Ok(Some(Bytes::from(bytes)))
}

/// Decodes a server value according to `shape`.
///
/// # Errors
///
/// Returns [`CodecError`] naming the first missing or mistyped element.
pub fn decode_value(shape: ValueShape, value: &Value) -> Result<SettingValue, CodecError> {
    decode_at("value", shape, value)
}

pub(crate) fn encode_at(
    path: &str,
    shape: ValueShape,
    value: &SettingValue,
) -> Result<Value, CodecError> {
    match (shape, value) {
        (ValueShape::OffOn, SettingValue::Text(s)) => {
            check_member(path, s, OFF_ON)?;
            Ok(Value::String(s.clone()))
        }
        (ValueShape::StringEnum(members), SettingValue::Text(s)) => {
            check_member(path, s, members)?;
            Ok(Value::String(s.clone()))
        }
        (ValueShape::Text, SettingValue::Text(s)) => Ok(Value::String(s.clone())),
        (ValueShape::Integer(allowed), SettingValue::Integer(i)) => {
            if !allowed.is_empty() && !allowed.contains(i) {
                return Err(CodecError::NotAllowed {
                    path: path.to_owned(),
                    value: i.to_string(),
                    allowed: allowed.iter().map(ToString::to_string).collect(),
                });
            }
            Ok(Value::from(*i))
        }
        (ValueShape::Float, SettingValue::Float(f)) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| CodecError::InvalidValue {
                path: path.to_owned(),
                reason: format!("{f} is not a finite number"),
            }),
        (ValueShape::Boolean, SettingValue::Boolean(b)) => Ok(Value::Bool(*b)),
        (ValueShape::StringList(members), SettingValue::List(items)) => {
            for (idx, item) in items.iter().enumerate() {
                check_member(&format!("{path}[{idx}]"), item, members)?;
            }
            Ok(Value::Array(items.iter().cloned().map(Value::String).collect()))
        }
        (ValueShape::Record(fields), SettingValue::Record(record)) => {
            encode_record(path, fields, record)
        }
        (shape, value) => Err(CodecError::TypeMismatch {
            path: path.to_owned(),
            expected: shape.kind(),
            found: value.kind(),
        }),
    }
}

fn encode_record(
    path: &str,
    fields: &[Field],
    record: &BTreeMap<String, SettingValue>,
) -> Result<Value, CodecError> {
    if let Some(unknown) = record
        .keys()
        .find(|key| !fields.iter().any(|f| f.name == key.as_str()))
    {
        return Err(CodecError::UnknownField {
            path: format!("{path}.{unknown}"),
        });
    }

    let mut out = Map::with_capacity(fields.len());
    for field in fields {
        let field_path = format!("{path}.{}", field.name);
        match record.get(field.name) {
            Some(value) => {
                out.insert(
                    field.name.to_owned(),
                    encode_at(&field_path, field.shape, value)?,
                );
            }
            None if field.required => return Err(CodecError::MissingField { path: field_path }),
            None => {}
        }
    }
    Ok(Value::Object(out))
}

fn check_member(path: &str, value: &str, members: &[&str]) -> Result<(), CodecError> {
    if members.contains(&value) {
        return Ok(());
    }
    Err(CodecError::NotAllowed {
        path: path.to_owned(),
        value: value.to_owned(),
        allowed: members.iter().map(|m| (*m).to_owned()).collect(),
    })
}

pub(crate) fn decode_at(
    path: &str,
    shape: ValueShape,
    json: &Value,
) -> Result<SettingValue, CodecError> {
    match shape {
        ValueShape::OffOn => decode_member(path, json, OFF_ON).map(SettingValue::Text),
        ValueShape::StringEnum(members) => {
            decode_member(path, json, members).map(SettingValue::Text)
        }
        ValueShape::Text => json
            .as_str()
            .map(|s| SettingValue::Text(s.to_owned()))
            .ok_or_else(|| mismatch(path, shape, json)),
        ValueShape::Integer(_) => json
            .as_i64()
            .map(SettingValue::Integer)
            .ok_or_else(|| mismatch(path, shape, json)),
        ValueShape::Float => json
            .as_f64()
            .map(SettingValue::Float)
            .ok_or_else(|| mismatch(path, shape, json)),
        ValueShape::Boolean => json
            .as_bool()
            .map(SettingValue::Boolean)
            .ok_or_else(|| mismatch(path, shape, json)),
        ValueShape::StringList(members) => {
            let items = json.as_array().ok_or_else(|| mismatch(path, shape, json))?;
            let mut decoded = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                decoded.push(decode_member(&format!("{path}[{idx}]"), item, members)?);
            }
            Ok(SettingValue::List(decoded))
        }
        ValueShape::Record(fields) => {
            let object = json.as_object().ok_or_else(|| mismatch(path, shape, json))?;
            decode_record(path, fields, object)
        }
    }
}

fn decode_record(
    path: &str,
    fields: &[Field],
    object: &Map<String, Value>,
) -> Result<SettingValue, CodecError> {
    let mut record = BTreeMap::new();
    for field in fields {
        let field_path = format!("{path}.{}", field.name);
        match object.get(field.name).filter(|v| !v.is_null()) {
            Some(value) => {
                record.insert(
                    field.name.to_owned(),
                    decode_at(&field_path, field.shape, value)?,
                );
            }
            None if field.required => return Err(CodecError::MissingField { path: field_path }),
            None => {}
        }
    }
    Ok(SettingValue::Record(record))
}

/// The server is authoritative for enum members: an unknown member is
/// surfaced as-is, only a non-string is rejected.
fn decode_member(path: &str, json: &Value, members: &[&str]) -> Result<String, CodecError> {
    let Some(s) = json.as_str() else {
        return Err(CodecError::TypeMismatch {
            path: path.to_owned(),
            expected: "enum string",
            found: json_kind(json),
        });
    };
    if !members.contains(&s) {
        tracing::warn!(
            path,
            value = s,
            "server returned a value outside the declared member set"
        );
    }
    Ok(s.to_owned())
}

fn mismatch(path: &str, shape: ValueShape, json: &Value) -> CodecError {
    CodecError::TypeMismatch {
        path: path.to_owned(),
        expected: shape.kind(),
        found: json_kind(json),
    }
}

pub(crate) fn json_kind(json: &Value) -> &'static str {
    match json {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    const STS: &[Field] = &[
        Field::required("enabled", ValueShape::Boolean),
        Field::required("max_age", ValueShape::Integer(&[])),
        Field::required("include_subdomains", ValueShape::Boolean),
        Field::required("nosniff", ValueShape::Boolean),
    ];
    const STRICT_TRANSPORT_SECURITY: Field =
        Field::required("strict_transport_security", ValueShape::Record(STS));
    const SECURITY_HEADER: ValueShape = ValueShape::Record(&[STRICT_TRANSPORT_SECURITY]);
    const MOBILE_REDIRECT: ValueShape = ValueShape::Record(&[
        Field::required("status", ValueShape::OffOn),
        Field::optional("mobile_subdomain", ValueShape::Text),
        Field::required("strip_uri", ValueShape::Boolean),
    ]);
    const CIPHERS: ValueShape =
        ValueShape::StringList(&["AES128-SHA", "AES256-SHA", "DES-CBC3-SHA"]);

    fn security_header_value() -> SettingValue {
        SettingValue::record([(
            "strict_transport_security",
            SettingValue::record([
                ("enabled", true.into()),
                ("max_age", 86_400_i64.into()),
                ("include_subdomains", false.into()),
                ("nosniff", true.into()),
            ]),
        )])
    }

    fn round_trip(shape: ValueShape, value: &SettingValue) -> SettingValue {
        let encoded = encode_value(shape, value).unwrap();
        // go through bytes, the way a real response would
        let bytes = serde_json::to_vec(&encoded).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        decode_value(shape, &parsed).unwrap()
    }

    #[test]
    fn every_shape_round_trips() {
        let cases = [
            (ValueShape::OffOn, SettingValue::from("on")),
            (ValueShape::StringEnum(&["1.0", "1.2"]), SettingValue::from("1.2")),
            (ValueShape::Text, SettingValue::from("m.example.com")),
            (ValueShape::Integer(&[300, 900]), SettingValue::from(900_i64)),
            (ValueShape::Integer(&[]), SettingValue::from(-7_i64)),
            (ValueShape::Float, SettingValue::from(100.5)),
            (ValueShape::Float, SettingValue::from(30.0)),
            (ValueShape::Boolean, SettingValue::from(false)),
            (CIPHERS, SettingValue::list(["DES-CBC3-SHA", "AES128-SHA"])),
            (CIPHERS, SettingValue::List(Vec::new())),
            (SECURITY_HEADER, security_header_value()),
            (
                MOBILE_REDIRECT,
                SettingValue::record([("status", "off".into()), ("strip_uri", true.into())]),
            ),
        ];
        for (shape, value) in &cases {
            assert_eq!(&round_trip(*shape, value), value, "shape {shape:?}");
        }
    }

    #[test]
    fn out_of_set_enum_is_rejected_with_legal_set() {
        let err = encode_value(ValueShape::OffOn, &"maybe".into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'value': value 'maybe' is not one of [off, on]"
        );

        let err = encode_value(CIPHERS, &SettingValue::list(["AES128-SHA", "RC4"])).unwrap_err();
        assert!(matches!(
            &err,
            CodecError::NotAllowed { path, value, .. } if path == "value[1]" && value == "RC4"
        ));

        let err = encode_value(ValueShape::Integer(&[300, 900]), &301_i64.into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'value': value '301' is not one of [300, 900]"
        );
    }

    #[test]
    fn missing_required_sub_field_is_named() {
        let value =
            SettingValue::record([("status", "on".into()), ("mobile_subdomain", "m".into())]);
        let err = encode_value(MOBILE_REDIRECT, &value).unwrap_err();
        assert!(matches!(err, CodecError::MissingField { .. }));
        assert_eq!(err.path(), Some("value.strip_uri"));
    }

    #[test]
    fn unknown_record_field_is_rejected_on_encode() {
        let value = SettingValue::record([
            ("status", "on".into()),
            ("strip_uri", true.into()),
            ("colour", "red".into()),
        ]);
        let err = encode_value(MOBILE_REDIRECT, &value).unwrap_err();
        assert_eq!(err.path(), Some("value.colour"));
    }

    #[test]
    fn mismatched_value_kind_is_rejected_on_encode() {
        let err = encode_value(ValueShape::Float, &30_i64.into()).unwrap_err();
        assert_eq!(err.to_string(), "'value': expected float, found integer");
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let err = encode_value(ValueShape::Float, &f64::NAN.into()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidValue { .. }));
    }

    #[test]
    fn body_uses_the_given_key() {
        let shape = ValueShape::StringEnum(&["active", "disabled"]);
        let body = encode_body("status", shape, Some(&"active".into()))
            .unwrap()
            .unwrap();
        assert_eq!(&body[..], br#"{"status":"active"}"#);
    }

    #[test]
    fn no_value_means_no_body() {
        assert!(encode_body("value", ValueShape::OffOn, None).unwrap().is_none());
    }

    #[test]
    fn numbers_sent_as_strings_are_not_coerced() {
        let err = decode_value(ValueShape::Integer(&[]), &json!("900")).unwrap_err();
        assert_eq!(err.to_string(), "'value': expected integer, found string");

        let err = decode_value(ValueShape::Integer(&[]), &json!(1.5)).unwrap_err();
        assert_eq!(err.to_string(), "'value': expected integer, found float");

        let err = decode_value(ValueShape::Boolean, &json!("true")).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn float_shape_accepts_integral_numbers() {
        assert_eq!(
            decode_value(ValueShape::Float, &json!(120)).unwrap(),
            SettingValue::Float(120.0)
        );
    }

    #[test]
    fn list_preserves_server_order() {
        let json = json!(["DES-CBC3-SHA", "AES256-SHA", "AES128-SHA"]);
        let decoded = decode_value(CIPHERS, &json).unwrap();
        assert_eq!(
            decoded.as_list().unwrap(),
            ["DES-CBC3-SHA", "AES256-SHA", "AES128-SHA"]
        );
    }

    #[test]
    fn record_decode_fails_on_first_bad_field() {
        let json = json!({
            "strict_transport_security": {
                "enabled": true,
                "max_age": "86400",
                "include_subdomains": "yes"
            }
        });
        let err = decode_value(SECURITY_HEADER, &json).unwrap_err();
        assert_eq!(err.path(), Some("value.strict_transport_security.max_age"));
    }

    #[test]
    fn record_decode_reports_missing_field() {
        let json = json!({"status": "on", "mobile_subdomain": null});
        let err = decode_value(MOBILE_REDIRECT, &json).unwrap_err();
        assert!(matches!(err, CodecError::MissingField { .. }));
        assert_eq!(err.path(), Some("value.strip_uri"));
    }

    #[test]
    fn record_decode_ignores_unknown_server_fields() {
        let json = json!({"status": "on", "strip_uri": false, "added_later": 1});
        let decoded = decode_value(MOBILE_REDIRECT, &json).unwrap();
        assert_eq!(decoded.as_record().unwrap().len(), 2);
    }

    #[test]
    #[traced_test]
    fn unknown_enum_member_from_server_is_surfaced_and_logged() {
        let decoded = decode_value(ValueShape::OffOn, &json!("auto")).unwrap();
        assert_eq!(decoded.as_str(), Some("auto"));
        assert!(logs_contain("outside the declared member set"));
    }

    #[test]
    fn enum_requires_a_string() {
        let err = decode_value(ValueShape::OffOn, &json!(true)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'value': expected enum string, found boolean"
        );
    }
}
