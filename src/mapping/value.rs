//! Host and wire value representations.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use uuid::Uuid;

use super::interval::NativeInterval;

/// A host-side value, as the hosting application hands it to the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    /// Exact decimal in plain notation (`-12.50`).
    Decimal(String),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Guid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Timestamp with no offset or zone.
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Interval(TimeDelta),
    Json(serde_json::Value),
}

impl Value {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short kind name for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Decimal(_) => "decimal",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Guid(_) => "guid",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::DateTimeOffset(_) => "datetimeoffset",
            Value::Interval(_) => "interval",
            Value::Json(_) => "json",
        }
    }

    /// Integer payload widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "'{}'", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Guid(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::Time(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::DateTimeOffset(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Interval(v) => write!(f, "{}", v),
            Value::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::DateTimeOffset(v)
    }
}

impl From<TimeDelta> for Value {
    fn from(v: TimeDelta) -> Self {
        Value::Interval(v)
    }
}

/// Direction of an infinity sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub fn as_f64(&self) -> f64 {
        match self {
            Sign::Positive => f64::INFINITY,
            Sign::Negative => f64::NEG_INFINITY,
        }
    }
}

/// A value in the shape a provider driver sends or receives it.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact numeric as text.
    Numeric(String),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// A UTC instant.
    TimestampTz(DateTime<Utc>),
    /// Timestamp text carrying its own offset (`2024-01-01 10:00:00+02:00`).
    TimestampText(String),
    Interval(NativeInterval),
    /// Provider `infinity` / `-infinity` sentinel.
    Infinity(Sign),
}

impl NativeValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Null => write!(f, "NULL"),
            NativeValue::Bool(v) => write!(f, "{}", v),
            NativeValue::Int(v) => write!(f, "{}", v),
            NativeValue::Float(v) => write!(f, "{}", v),
            NativeValue::Numeric(v) => write!(f, "{}", v),
            NativeValue::Text(v) => write!(f, "'{}'", v),
            NativeValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            NativeValue::Uuid(v) => write!(f, "{}", v),
            NativeValue::Date(v) => write!(f, "{}", v),
            NativeValue::Time(v) => write!(f, "{}", v),
            NativeValue::Timestamp(v) => write!(f, "{}", v),
            NativeValue::TimestampTz(v) => write!(f, "{}", v.to_rfc3339()),
            NativeValue::TimestampText(v) => write!(f, "{}", v),
            NativeValue::Interval(v) => write!(f, "{}", v),
            NativeValue::Infinity(Sign::Positive) => write!(f, "infinity"),
            NativeValue::Infinity(Sign::Negative) => write!(f, "-infinity"),
        }
    }
}

/// One row of wire values, addressed by 0-based ordinal.
pub trait NativeRow {
    fn value_at(&self, ordinal: usize) -> Option<&NativeValue>;
    fn width(&self) -> usize;
}

impl NativeRow for [NativeValue] {
    fn value_at(&self, ordinal: usize) -> Option<&NativeValue> {
        self.get(ordinal)
    }

    fn width(&self) -> usize {
        self.len()
    }
}

impl NativeRow for Vec<NativeValue> {
    fn value_at(&self, ordinal: usize) -> Option<&NativeValue> {
        self.get(ordinal)
    }

    fn width(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int32(0).is_null());
        assert!(NativeValue::Null.is_null());
    }

    #[test]
    fn test_from_implementations() {
        let v: Value = 42i32.into();
        assert_eq!(v, Value::Int32(42));
        let v: Value = "Robert".into();
        assert_eq!(v, Value::String("Robert".into()));
        assert_eq!(Value::Int16(7).as_i64(), Some(7));
        assert_eq!(Value::Double(7.0).as_i64(), None);
    }

    #[test]
    fn test_sign() {
        assert_eq!(Sign::Positive.as_f64(), f64::INFINITY);
        assert_eq!(Sign::Negative.as_f64(), f64::NEG_INFINITY);
        assert_eq!(NativeValue::Infinity(Sign::Negative).to_string(), "-infinity");
    }
}
