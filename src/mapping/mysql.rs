//! MySQL wire conversions.
//!
//! MySQL has no boolean or UUID column types and no offset-carrying
//! timestamp: booleans travel as `TINYINT(1)`, GUIDs as `CHAR(36)`, and
//! offset values are normalised to UTC before they are written.

use chrono::{NaiveDate, NaiveDateTime};

use super::convert::{bind_common, decode_common, interval_micros, mismatch};
use super::options::{utc, MappingOptions};
use super::temporal::{parse_date, parse_datetime, parse_time};
use super::value::{NativeValue, Value};
use super::TypeMapper;
use crate::error::{Error, Result};
use crate::sql::dialect::Dialect;
use crate::sql::types::ValueType;

/// Earliest date `DATE` and `DATETIME` accept.
fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1000, 1, 1).unwrap_or_default()
}

fn check_date(ty: &ValueType, date: NaiveDate) -> Result<()> {
    if date < earliest_date() {
        return Err(Error::out_of_range(date, ty));
    }
    Ok(())
}

fn check_datetime(ty: &ValueType, dt: NaiveDateTime) -> Result<NaiveDateTime> {
    check_date(ty, dt.date()).map(|_| dt)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlMapper;

impl TypeMapper for MySqlMapper {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn bind(&self, _options: &MappingOptions, ty: &ValueType, value: &Value) -> Result<NativeValue> {
        if let Some(bound) = bind_common(ty, value) {
            return bound;
        }

        match (ty, value) {
            (ValueType::Boolean, Value::Bool(b)) => Ok(NativeValue::Int(*b as i64)),
            (ValueType::Guid, Value::Guid(g)) => Ok(NativeValue::Text(g.hyphenated().to_string())),
            (ValueType::Date, Value::Date(d)) => check_date(ty, *d).map(|_| NativeValue::Date(*d)),
            (ValueType::Time, Value::Time(t)) => Ok(NativeValue::Time(*t)),
            (ValueType::DateTime, Value::DateTime(dt)) => {
                check_datetime(ty, *dt).map(NativeValue::Timestamp)
            }
            (ValueType::DateTimeOffset, Value::DateTimeOffset(dto)) => {
                check_datetime(ty, dto.naive_utc()).map(NativeValue::Timestamp)
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
        match (ty, native) {
            (ValueType::Date, NativeValue::Date(d)) => Ok(Value::Date(*d)),
            (ValueType::Date, NativeValue::Text(s)) => {
                parse_date(s).map(Value::Date).ok_or_else(unrecognized)
            }
            (ValueType::Time, NativeValue::Time(t)) => Ok(Value::Time(*t)),
            (ValueType::Time, NativeValue::Text(s)) => {
                parse_time(s).map(Value::Time).ok_or_else(unrecognized)
            }
            (ValueType::DateTime, NativeValue::Timestamp(dt)) => Ok(Value::DateTime(*dt)),
            (ValueType::DateTime, NativeValue::Text(s)) => {
                parse_datetime(s).map(Value::DateTime).ok_or_else(unrecognized)
            }
            // stored as UTC wall time
            (ValueType::DateTimeOffset, NativeValue::Timestamp(dt)) => {
                Ok(Value::DateTimeOffset(dt.and_utc().with_timezone(&utc())))
            }
            (ValueType::DateTimeOffset, NativeValue::Text(s)) => parse_datetime(s)
                .map(|dt| Value::DateTimeOffset(dt.and_utc().with_timezone(&utc())))
                .ok_or_else(unrecognized),
            _ => Err(unrecognized()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn opts() -> MappingOptions {
        MappingOptions::default()
    }

    #[test]
    fn test_bool_as_tinyint() {
        let m = MySqlMapper;
        assert_eq!(
            m.bind(&opts(), &ValueType::Boolean, &Value::Bool(true)).unwrap(),
            NativeValue::Int(1)
        );
        assert_eq!(
            m.decode(&opts(), &ValueType::Boolean, &NativeValue::Int(0)).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_datetime_lower_bound() {
        let m = MySqlMapper;
        let early = NaiveDate::from_ymd_opt(999, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let err = m
            .bind(&opts(), &ValueType::DateTime, &Value::DateTime(early))
            .unwrap_err();
        assert!(matches!(err, Error::ValueOutOfRange { .. }));

        let ok = NaiveDate::from_ymd_opt(1000, 1, 1).unwrap();
        assert!(m.bind(&opts(), &ValueType::Date, &Value::Date(ok)).is_ok());
    }

    #[test]
    fn test_offset_normalised_to_utc() {
        let m = MySqlMapper;
        let dto = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .unwrap();
        let native = m
            .bind(&opts(), &ValueType::DateTimeOffset, &Value::DateTimeOffset(dto))
            .unwrap();
        assert_eq!(
            native,
            NativeValue::Timestamp(
                NaiveDate::from_ymd_opt(2024, 6, 1)
                    .unwrap()
                    .and_hms_opt(11, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(
            m.decode(&opts(), &ValueType::DateTimeOffset, &native).unwrap(),
            Value::DateTimeOffset(dto)
        );
    }

    #[test]
    fn test_guid_as_text() {
        let m = MySqlMapper;
        let g = uuid::Uuid::from_u128(0x1234);
        let native = m.bind(&opts(), &ValueType::Guid, &Value::Guid(g)).unwrap();
        assert_eq!(native, NativeValue::Text(g.hyphenated().to_string()));
        assert_eq!(
            m.decode(&opts(), &ValueType::Guid, &native).unwrap(),
            Value::Guid(g)
        );
    }
}
