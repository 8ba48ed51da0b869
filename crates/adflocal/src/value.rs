//! value representation
//!
//! An expression evaluates to one of three data types
//! - date-time (a point in time with a fixed utc offset)
//! - integer (signed, i64)
//! - string (utf-8)
//!
//! Additionally:
//! - there is no `null`, boolean or decimal result. Literals are either date references, integers or format strings.
//! - when written back into a document every value is coerced into a string (see [Value::coerce_to_string])
//!
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Serializer;

/// Point in time used for all date arithmetic
pub type Timestamp = DateTime<FixedOffset>;

/// All possible value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    DateTime(Timestamp),
    Integer(i64),
    String(String),
}

impl Value {
    /// String form used when an expression result replaces a document scalar
    ///
    /// Date-times are rendered as RFC 3339 with `Z` for utc and fractional seconds only when present.
    pub fn coerce_to_string(&self) -> String {
        match self {
            Value::DateTime(value) => value.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Integer(value) => value.to_string(),
            Value::String(value) => value.clone(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::DateTime(_) => "date-time",
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.coerce_to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::DateTime(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value.fixed_offset())
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::DateTime(_) => serializer.serialize_str(&self.coerce_to_string()),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::String(value) => serializer.serialize_str(value),
        }
    }
}

/// Parse a user supplied instant
///
/// Accepts RFC 3339 (`2017-01-01T00:00:00+01:00`), a naive date-time (`2017-01-01T00:00:00`) or a plain
/// date (`2017-01-01`). Naive inputs are taken as utc.
pub fn parse_timestamp(input: &str) -> Result<Timestamp, chrono::ParseError> {
    let input = input.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Ok(timestamp);
    }

    let naive = match NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => naive,
        Err(err) => match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            Ok(date) => date.and_time(chrono::NaiveTime::MIN),
            Err(_) => return Err(err),
        },
    };

    Ok(Utc.from_utc_datetime(&naive).fixed_offset())
}
