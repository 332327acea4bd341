use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value as JsonValue;

use crate::foundation::core::format_rfc3339;

/// A single typed cell of a tabular dataset.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// SQL `NULL` or an absent cell.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Duration(TimeDelta),
    /// Lookup failure for this cell (e.g. an unknown field name).
    Error(String),
}

impl FieldValue {
    /// Deterministic text projection used for join and group keys.
    ///
    /// Heterogeneous representations of the same logical key project to the same text, e.g. a
    /// timestamp and its RFC 3339 string.
    pub fn key_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Timestamp(t) => format_rfc3339(*t),
            Self::Duration(d) => duration_secs(*d).to_string(),
            Self::Error(e) => e.clone(),
        }
    }

    /// Numeric projection for scalar indicators and cell annotations.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Duration(d) => Some(duration_secs(*d)),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Duration(_) => "duration",
            Self::Error(_) => "error",
        }
    }

    /// JSON form written into chart documents.
    ///
    /// Timestamps use one fixed RFC 3339 layout and durations become seconds so the charting
    /// library sees uniform axes.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null | Self::Error(_) => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::Timestamp(t) => JsonValue::String(format_rfc3339(*t)),
            Self::Duration(d) => serde_json::Number::from_f64(duration_secs(*d))
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
        }
    }

    /// Build a value from a parsed YAML/JSON scalar. Nested structures become text.
    pub fn from_json(v: &JsonValue) -> Self {
        match v {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Null),
            },
            JsonValue::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

fn duration_secs(d: TimeDelta) -> f64 {
    d.num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| d.num_milliseconds() as f64 / 1_000.0)
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}
