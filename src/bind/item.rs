//! Wire form of a bound value.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::value::BodyValue;
use crate::utils::date::DateTimeUtc;

/// One `{Name, Value, Type}` entry of an action body.
///
/// Field names are PascalCase on the wire; lowercase spellings are accepted.
/// `Value` may arrive as any JSON scalar and is kept as text until bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyItem {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(
        rename = "Value",
        alias = "value",
        default,
        deserialize_with = "scalar_as_string"
    )]
    pub value: String,
    #[serde(rename = "Type", alias = "type", default)]
    pub kind: ValueKind,
}

impl BodyItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind,
        }
    }
}

fn scalar_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    use serde_json::Value;
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar value, found {other}"
        ))),
    }
}

/// Declared type of a body item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    String,
    #[serde(alias = "int64", alias = "int32", alias = "integer", alias = "number")]
    Int,
    #[serde(alias = "float64", alias = "float32", alias = "double")]
    Float,
    #[serde(alias = "boolean", alias = "checkbox")]
    Bool,
    Date,
    #[serde(alias = "datetime", alias = "datetime-local")]
    Time,
    /// Unrecognised type names; treated as `string`.
    #[serde(other)]
    Other,
}

impl ValueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String | Self::Other => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Time => "time",
        }
    }

    /// Parse raw text per this kind.
    ///
    /// An empty value of a non-string kind yields [`BodyValue::Empty`], which
    /// resets the destination field to its zero value.
    pub fn parse(self, raw: &str) -> Result<BodyValue, String> {
        if raw.is_empty() && !matches!(self, Self::String | Self::Other) {
            return Ok(BodyValue::Empty);
        }
        match self {
            Self::String | Self::Other => Ok(BodyValue::Str(raw.to_owned())),
            Self::Int => raw
                .trim()
                .parse::<i64>()
                .map(BodyValue::Int)
                .map_err(|e| e.to_string()),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .map(BodyValue::Float)
                .map_err(|e| e.to_string()),
            Self::Bool => parse_bool(raw).map(BodyValue::Bool),
            Self::Date => DateTimeUtc::parse_date(raw)
                .map(BodyValue::Time)
                .ok_or_else(|| "not a `YYYY-MM-DD` date".to_owned()),
            Self::Time => DateTimeUtc::parse(raw)
                .map(BodyValue::Time)
                .ok_or_else(|| "not a recognised date or time".to_owned()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(super) fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => Err(format!("`{other}` is not a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_body_items() {
        let json = r##"[
            {"Name": "Count", "Value": "5", "Type": "int"},
            {"name": "Label", "value": "hi"},
            {"Name": "Ratio", "Value": 0.25, "Type": "float64"},
            {"Name": "On", "Value": true, "Type": "checkbox"},
            {"Name": "Color", "Value": "#fff", "Type": "color"},
            {"Name": "Note", "Value": null}
        ]"##;
        let items: Vec<BodyItem> = serde_json::from_str(json).unwrap();

        assert_eq!(items[0], BodyItem::new("Count", "5", ValueKind::Int));
        assert_eq!(items[1], BodyItem::new("Label", "hi", ValueKind::String));
        assert_eq!(items[2].value, "0.25");
        assert_eq!(items[2].kind, ValueKind::Float);
        assert_eq!(items[3].value, "true");
        assert_eq!(items[3].kind, ValueKind::Bool);
        assert_eq!(items[4].kind, ValueKind::Other);
        assert_eq!(items[5].value, "");
    }

    #[test]
    fn test_nested_value_is_rejected() {
        let json = r#"[{"Name": "X", "Value": {"a": 1}}]"#;
        assert!(serde_json::from_str::<Vec<BodyItem>>(json).is_err());
    }

    #[test]
    fn test_serialize_pascal_case() {
        let json = serde_json::to_string(&BodyItem::new("Count", "1", ValueKind::Int)).unwrap();
        assert_eq!(json, r#"{"Name":"Count","Value":"1","Type":"int"}"#);
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!(ValueKind::Int.parse(" 12 "), Ok(BodyValue::Int(12)));
        assert_eq!(ValueKind::Int.parse(""), Ok(BodyValue::Empty));
        assert_eq!(ValueKind::String.parse(""), Ok(BodyValue::Str(String::new())));
        assert_eq!(ValueKind::Other.parse("x"), Ok(BodyValue::Str("x".into())));
        assert!(ValueKind::Int.parse("abc").is_err());
        assert!(ValueKind::Float.parse("1.5.2").is_err());
        assert!(ValueKind::Date.parse("soon").is_err());
    }

    #[test]
    fn test_date_rejects_time_part() {
        let day = DateTimeUtc::parse_date("2024-06-15").unwrap();
        assert_eq!(ValueKind::Date.parse("2024-06-15"), Ok(BodyValue::Time(day)));
        assert!(ValueKind::Date.parse("2024-06-15T14:30").is_err());
        assert!(ValueKind::Time.parse("2024-06-15T14:30").is_ok());
    }

    #[test]
    fn test_parse_bool_spellings() {
        for raw in ["true", "1", "on", "YES"] {
            assert_eq!(parse_bool(raw), Ok(true), "{raw}");
        }
        for raw in ["false", "0", "Off", "no"] {
            assert_eq!(parse_bool(raw), Ok(false), "{raw}");
        }
        assert!(parse_bool("maybe").is_err());
    }
}
