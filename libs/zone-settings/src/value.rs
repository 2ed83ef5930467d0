//! Value shapes and dynamically typed setting values.

use std::collections::BTreeMap;
use std::fmt;

/// Members of the `off`/`on` toggle used by most settings.
pub const OFF_ON: &[&str] = &["off", "on"];

/// Describes what a setting value looks like on the wire.
///
/// Shapes are static data: they drive both the encode step (validation of
/// caller values) and the decode step (typing of server values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// `"off"` or `"on"`.
    OffOn,
    /// 64-bit integer. A non-empty slice restricts the accepted values.
    Integer(&'static [i64]),
    /// 64-bit float.
    Float,
    /// JSON boolean.
    Boolean,
    /// Free-form string.
    Text,
    /// One string out of a fixed member set.
    StringEnum(&'static [&'static str]),
    /// Ordered list of strings, each from a fixed member set.
    StringList(&'static [&'static str]),
    /// Object with named sub-fields, each with its own shape.
    Record(&'static [Field]),
}

impl ValueShape {
    /// Human-readable kind, used in error messages.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            ValueShape::OffOn | ValueShape::StringEnum(_) => "enum string",
            ValueShape::Integer(_) => "integer",
            ValueShape::Float => "float",
            ValueShape::Boolean => "boolean",
            ValueShape::Text => "string",
            ValueShape::StringList(_) => "string list",
            ValueShape::Record(_) => "record",
        }
    }

    /// Declared member set for enum-like shapes.
    #[must_use]
    pub fn members(self) -> Option<&'static [&'static str]> {
        match self {
            ValueShape::OffOn => Some(OFF_ON),
            ValueShape::StringEnum(members) | ValueShape::StringList(members) => Some(members),
            _ => None,
        }
    }
}

/// A named sub-field of a [`ValueShape::Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub shape: ValueShape,
    pub required: bool,
}

impl Field {
    #[must_use]
    pub const fn required(name: &'static str, shape: ValueShape) -> Self {
        Self {
            name,
            shape,
            required: true,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, shape: ValueShape) -> Self {
        Self {
            name,
            shape,
            required: false,
        }
    }
}

/// `off`/`on` toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    Off,
    On,
}

impl Toggle {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Toggle::Off => "off",
            Toggle::On => "on",
        }
    }
}

impl From<bool> for Toggle {
    fn from(enabled: bool) -> Self {
        if enabled { Toggle::On } else { Toggle::Off }
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A setting value, typed according to some [`ValueShape`].
///
/// Enum-like shapes (`OffOn`, `StringEnum`) and free strings are all carried
/// as [`SettingValue::Text`]; the shape decides which strings are legal.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<String>),
    Record(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    /// Builds a record value from `(name, value)` pairs.
    #[must_use]
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SettingValue)>,
        K: Into<String>,
    {
        SettingValue::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds a list value.
    #[must_use]
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SettingValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Kind name, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SettingValue::Text(_) => "string",
            SettingValue::Integer(_) => "integer",
            SettingValue::Float(_) => "float",
            SettingValue::Boolean(_) => "boolean",
            SettingValue::List(_) => "string list",
            SettingValue::Record(_) => "record",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            SettingValue::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&BTreeMap<String, SettingValue>> {
        match self {
            SettingValue::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Looks up a sub-field of a record value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SettingValue> {
        self.as_record().and_then(|fields| fields.get(name))
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_owned())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl From<Toggle> for SettingValue {
    fn from(value: Toggle) -> Self {
        SettingValue::Text(value.as_str().to_owned())
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Boolean(value)
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(value: Vec<String>) -> Self {
        SettingValue::List(value)
    }
}
