//! SQLite wire conversions.
//!
//! SQLite stores five storage classes only. Temporal values and GUIDs are
//! written as text in the same formats the dialect uses for literals, so a
//! value bound as a parameter and a value written as a literal compare
//! equal inside the database.

use super::convert::{bind_common, decode_common, interval_micros, mismatch};
use super::options::MappingOptions;
use super::temporal::{parse_date, parse_datetime, parse_datetimeoffset, parse_time};
use super::value::{NativeValue, Value};
use super::TypeMapper;
use crate::error::{Error, Result};
use crate::sql::dialect::helpers::{date_text, datetime_text, datetimeoffset_text, time_text};
use crate::sql::dialect::Dialect;
use crate::sql::types::ValueType;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteMapper;

impl TypeMapper for SqliteMapper {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn bind(&self, _options: &MappingOptions, ty: &ValueType, value: &Value) -> Result<NativeValue> {
        if let Some(bound) = bind_common(ty, value) {
            return bound;
        }

        match (ty, value) {
            (ValueType::Boolean, Value::Bool(b)) => Ok(NativeValue::Int(*b as i64)),
            (ValueType::Guid, Value::Guid(g)) => Ok(NativeValue::Text(g.hyphenated().to_string())),
            (ValueType::Date, Value::Date(d)) => Ok(NativeValue::Text(date_text(*d))),
            (ValueType::Time, Value::Time(t)) => Ok(NativeValue::Text(time_text(*t))),
            (ValueType::DateTime, Value::DateTime(dt)) => Ok(NativeValue::Text(datetime_text(*dt))),
            (ValueType::DateTimeOffset, Value::DateTimeOffset(dto)) => {
                Ok(NativeValue::Text(datetimeoffset_text(dto)))
            }
            (ValueType::Interval, _) => interval_micros(ty, value).map(NativeValue::Int),
            _ => Err(mismatch(ty, value)),
        }
    }

    fn decode(
        &self,
        _options: &MappingOptions,
        ty: &ValueType,
        native: &NativeValue,
    ) -> Result<Value> {
        if let Some(decoded) = decode_common(ty, native) {
            return decoded;
        }

        let unrecognized = || Error::unrecognized(native, ty);
        let text = match native {
            NativeValue::Text(s) => s,
            _ => return Err(unrecognized()),
        };
        let parsed = match ty {
            ValueType::Date => parse_date(text).map(Value::Date),
            ValueType::Time => parse_time(text).map(Value::Time),
            ValueType::DateTime => parse_datetime(text).map(Value::DateTime),
            ValueType::DateTimeOffset => parse_datetimeoffset(text).map(Value::DateTimeOffset),
            _ => None,
        };
        parsed.ok_or_else(unrecognized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn opts() -> MappingOptions {
        MappingOptions::default()
    }

    #[test]
    fn test_temporal_as_text() {
        let m = SqliteMapper;
        let dt = NaiveDate::from_ymd_opt(1958, 12, 8)
            .unwrap()
            .and_hms_milli_opt(0, 0, 0, 250)
            .unwrap();
        let native = m.bind(&opts(), &ValueType::DateTime, &Value::DateTime(dt)).unwrap();
        assert_eq!(native, NativeValue::Text("1958-12-08 00:00:00.250000".into()));
        assert_eq!(
            m.decode(&opts(), &ValueType::DateTime, &native).unwrap(),
            Value::DateTime(dt)
        );
    }

    #[test]
    fn test_interval_and_bool() {
        let m = SqliteMapper;
        let d = TimeDelta::days(-45);
        let native = m.bind(&opts(), &ValueType::Interval, &Value::Interval(d)).unwrap();
        assert_eq!(
            m.decode(&opts(), &ValueType::Interval, &native).unwrap(),
            Value::Interval(d)
        );
        assert_eq!(
            m.bind(&opts(), &ValueType::Boolean, &Value::Bool(false)).unwrap(),
            NativeValue::Int(0)
        );
    }

    #[test]
    fn test_garbage_text_unrecognized() {
        let m = SqliteMapper;
        let err = m
            .decode(&opts(), &ValueType::Date, &NativeValue::Text("someday".into()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unrecognized native value 'someday' for DATE"
        );
    }
}
