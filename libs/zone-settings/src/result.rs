//! Result structures carried in the `result` field of the envelope.

use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::codec::{CodecError, decode_at, json_kind};
use crate::descriptor::ResultKind;
use crate::value::{SettingValue, ValueShape};

const RESULT_PATH: &str = "result";

/// Result of most settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingResult {
    pub id: String,
    pub value: SettingValue,
    pub editable: Option<bool>,
    pub modified_on: Option<OffsetDateTime>,
}

/// Result of the CNAME flattening setting. Has no `editable` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct CnameFlatteningResult {
    pub id: String,
    pub value: SettingValue,
    pub modified_on: Option<OffsetDateTime>,
}

/// DNSSEC record for a zone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DnssecResult {
    pub status: String,
    pub flags: Option<i64>,
    pub algorithm: Option<String>,
    pub key_type: Option<String>,
    pub digest_type: Option<String>,
    pub digest_algorithm: Option<String>,
    pub digest: Option<String>,
    pub ds: Option<String>,
    pub key_tag: Option<i64>,
    pub public_key: Option<String>,
    pub modified_on: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRetentionResult {
    pub flag: bool,
}

/// A decoded result, one variant per [`ResultKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettingRecord {
    Standard(SettingResult),
    CnameFlattening(CnameFlatteningResult),
    Dnssec(DnssecResult),
    LogRetention(LogRetentionResult),
}

impl SettingRecord {
    /// Decodes the `result` JSON of an envelope.
    ///
    /// `shape` types the `value` field of the standard and CNAME flattening
    /// variants and the `status` field of the DNSSEC variant. Unknown server
    /// fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] with a `result.`-prefixed path when a field is
    /// missing or has the wrong type.
    pub fn decode(kind: ResultKind, shape: ValueShape, json: &Value) -> Result<Self, CodecError> {
        let reader = ObjectReader::new(json)?;
        let record = match kind {
            ResultKind::Standard => SettingRecord::Standard(SettingResult {
                id: reader.required_string("id")?,
                value: reader.required_value("value", shape)?,
                editable: reader
                    .optional_value("editable", ValueShape::Boolean)?
                    .and_then(|v| v.as_bool()),
                modified_on: reader.optional_timestamp("modified_on")?,
            }),
            ResultKind::CnameFlattening => {
                SettingRecord::CnameFlattening(CnameFlatteningResult {
                    id: reader.required_string("id")?,
                    value: reader.required_value("value", shape)?,
                    modified_on: reader.optional_timestamp("modified_on")?,
                })
            }
            ResultKind::Dnssec => SettingRecord::Dnssec(DnssecResult {
                status: reader
                    .required_value("status", shape)?
                    .as_str()
                    .map(str::to_owned)
                    .unwrap_or_default(),
                flags: reader.optional_i64("flags")?,
                algorithm: reader.optional_string("algorithm")?,
                key_type: reader.optional_string("key_type")?,
                digest_type: reader.optional_string("digest_type")?,
                digest_algorithm: reader.optional_string("digest_algorithm")?,
                digest: reader.optional_string("digest")?,
                ds: reader.optional_string("ds")?,
                key_tag: reader.optional_i64("key_tag")?,
                public_key: reader.optional_string("public_key")?,
                modified_on: reader.optional_timestamp("modified_on")?,
            }),
            ResultKind::LogRetention => SettingRecord::LogRetention(LogRetentionResult {
                flag: reader
                    .required_value("flag", ValueShape::Boolean)?
                    .as_bool()
                    .unwrap_or_default(),
            }),
        };
        Ok(record)
    }

    #[must_use]
    pub fn kind(&self) -> ResultKind {
        match self {
            SettingRecord::Standard(_) => ResultKind::Standard,
            SettingRecord::CnameFlattening(_) => ResultKind::CnameFlattening,
            SettingRecord::Dnssec(_) => ResultKind::Dnssec,
            SettingRecord::LogRetention(_) => ResultKind::LogRetention,
        }
    }

    /// The typed setting value, for variants that carry one.
    #[must_use]
    pub fn value(&self) -> Option<&SettingValue> {
        match self {
            SettingRecord::Standard(r) => Some(&r.value),
            SettingRecord::CnameFlattening(r) => Some(&r.value),
            SettingRecord::Dnssec(_) | SettingRecord::LogRetention(_) => None,
        }
    }

    #[must_use]
    pub fn into_standard(self) -> Option<SettingResult> {
        match self {
            SettingRecord::Standard(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_cname_flattening(self) -> Option<CnameFlatteningResult> {
        match self {
            SettingRecord::CnameFlattening(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_dnssec(self) -> Option<DnssecResult> {
        match self {
            SettingRecord::Dnssec(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_log_retention(self) -> Option<LogRetentionResult> {
        match self {
            SettingRecord::LogRetention(r) => Some(r),
            _ => None,
        }
    }
}

/// Field access over the `result` object with `result.<field>` error paths.
/// `null` is treated the same as an absent field.
struct ObjectReader<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> ObjectReader<'a> {
    fn new(json: &'a Value) -> Result<Self, CodecError> {
        json.as_object()
            .map(|object| Self { object })
            .ok_or_else(|| CodecError::TypeMismatch {
                path: RESULT_PATH.to_owned(),
                expected: "object",
                found: json_kind(json),
            })
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.object.get(name).filter(|v| !v.is_null())
    }

    fn path(name: &str) -> String {
        format!("{RESULT_PATH}.{name}")
    }

    fn required_value(&self, name: &str, shape: ValueShape) -> Result<SettingValue, CodecError> {
        let path = Self::path(name);
        match self.get(name) {
            Some(json) => decode_at(&path, shape, json),
            None => Err(CodecError::MissingField { path }),
        }
    }

    fn optional_value(
        &self,
        name: &str,
        shape: ValueShape,
    ) -> Result<Option<SettingValue>, CodecError> {
        self.get(name)
            .map(|json| decode_at(&Self::path(name), shape, json))
            .transpose()
    }

    fn required_string(&self, name: &str) -> Result<String, CodecError> {
        match self.required_value(name, ValueShape::Text)? {
            SettingValue::Text(s) => Ok(s),
            other => Err(CodecError::TypeMismatch {
                path: Self::path(name),
                expected: "string",
                found: other.kind(),
            }),
        }
    }

    fn optional_string(&self, name: &str) -> Result<Option<String>, CodecError> {
        Ok(self
            .optional_value(name, ValueShape::Text)?
            .and_then(|v| v.as_str().map(str::to_owned)))
    }

    fn optional_i64(&self, name: &str) -> Result<Option<i64>, CodecError> {
        Ok(self
            .optional_value(name, ValueShape::Integer(&[]))?
            .and_then(|v| v.as_i64()))
    }

    fn optional_timestamp(&self, name: &str) -> Result<Option<OffsetDateTime>, CodecError> {
        let Some(raw) = self.optional_string(name)? else {
            return Ok(None);
        };
        OffsetDateTime::parse(&raw, &Rfc3339)
            .map(Some)
            .map_err(|e| CodecError::InvalidValue {
                path: Self::path(name),
                reason: format!("invalid RFC 3339 timestamp '{raw}': {e}"),
            })
    }
}
