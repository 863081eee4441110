//! SQL Server wire conversions.

use chrono::{FixedOffset, Offset};

use super::convert::{bind_common, decode_common, interval_micros, mismatch};
use super::options::MappingOptions;
use super::temporal::{parse_date, parse_datetime, parse_datetimeoffset, parse_time};
use super::value::{NativeValue, Value};
use super::TypeMapper;
use crate::error::{Error, Result};
use crate::sql::dialect::helpers::datetimeoffset_text;
use crate::sql::dialect::Dialect;
use crate::sql::types::ValueType;

/// `DATETIMEOFFSET` accepts offsets within ±14:00.
const MAX_OFFSET_SECONDS: i32 = 14 * 3600;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerMapper;

impl TypeMapper for SqlServerMapper {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn bind(&self, _options: &MappingOptions, ty: &ValueType, value: &Value) -> Result<NativeValue> {
        // TINYINT is unsigned
        if *ty == ValueType::Int8 {
            if let Some(i) = value.as_i64().filter(|i| *i < 0) {
                return Err(Error::out_of_range(i, "TINYINT"));
            }
        }
        if let Some(bound) = bind_common(ty, value) {
            return bound;
        }

        match (ty, value) {
            (ValueType::Boolean, Value::Bool(b)) => Ok(NativeValue::Bool(*b)),
            (ValueType::Guid, Value::Guid(g)) => Ok(NativeValue::Uuid(*g)),
            (ValueType::Date, Value::Date(d)) => Ok(NativeValue::Date(*d)),
            (ValueType::Time, Value::Time(t)) => Ok(NativeValue::Time(*t)),
            (ValueType::DateTime, Value::DateTime(dt)) => Ok(NativeValue::Timestamp(*dt)),
            (ValueType::DateTimeOffset, Value::DateTimeOffset(dto)) => {
                check_offset(dto.offset().fix())?;
                Ok(NativeValue::TimestampText(datetimeoffset_text(dto)))
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
            (ValueType::DateTimeOffset, NativeValue::TimestampText(s))
            | (ValueType::DateTimeOffset, NativeValue::Text(s)) => parse_datetimeoffset(s)
                .map(Value::DateTimeOffset)
                .ok_or_else(unrecognized),
            (ValueType::DateTimeOffset, NativeValue::TimestampTz(instant)) => Ok(
                Value::DateTimeOffset(instant.with_timezone(&instant.offset().fix())),
            ),
            _ => Err(unrecognized()),
        }
    }
}

fn check_offset(offset: FixedOffset) -> Result<()> {
    if offset.local_minus_utc().abs() > MAX_OFFSET_SECONDS {
        return Err(Error::out_of_range(offset, "DATETIMEOFFSET"));
    }
    Ok(())
}
