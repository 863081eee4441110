//! PostgreSQL wire conversions.
//!
//! Postgres is the only provider with native `infinity` sentinels and a
//! true `timestamptz`, so both process-wide switches land here:
//!
//! - infinity aliasing maps the host temporal bounds to `±infinity`
//! - legacy timestamp mode writes `timestamptz` values with their own offset
//!   and reads them back in the session zone instead of UTC

use chrono::{TimeZone, Utc};

use super::convert::{bind_common, decode_common, mismatch};
use super::options::{utc, MappingOptions};
use super::temporal::{bound_for, infinity_sign, parse_datetime, parse_datetimeoffset};
use super::value::{NativeValue, Value};
use super::{NativeInterval, TypeMapper};
use crate::error::{Error, Result};
use crate::sql::dialect::helpers::datetimeoffset_text;
use crate::sql::dialect::Dialect;
use crate::sql::types::ValueType;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresMapper;

impl TypeMapper for PostgresMapper {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn bind(&self, options: &MappingOptions, ty: &ValueType, value: &Value) -> Result<NativeValue> {
        if let Some(bound) = bind_common(ty, value) {
            return bound;
        }

        if matches!(ty, ValueType::Date | ValueType::DateTime | ValueType::DateTimeOffset)
            && options.infinity_aliasing
        {
            if let Some(sign) = infinity_sign(value) {
                return Ok(NativeValue::Infinity(sign));
            }
        }

        match (ty, value) {
            (ValueType::Boolean, Value::Bool(b)) => Ok(NativeValue::Bool(*b)),
            (ValueType::Guid, Value::Guid(g)) => Ok(NativeValue::Uuid(*g)),
            (ValueType::Date, Value::Date(d)) => Ok(NativeValue::Date(*d)),
            (ValueType::Time, Value::Time(t)) => Ok(NativeValue::Time(*t)),
            (ValueType::DateTime, Value::DateTime(dt)) => Ok(NativeValue::Timestamp(*dt)),
            // an offset value only fits a plain timestamp column when the
            // caller opted into the old lenient behaviour
            (ValueType::DateTime, Value::DateTimeOffset(dto)) if options.legacy_timestamps => {
                Ok(NativeValue::Timestamp(dto.naive_local()))
            }
            (ValueType::DateTimeOffset, Value::DateTimeOffset(dto)) => {
                if options.legacy_timestamps {
                    Ok(NativeValue::TimestampText(datetimeoffset_text(dto)))
                } else {
                    Ok(NativeValue::TimestampTz(dto.with_timezone(&Utc)))
                }
            }
            (ValueType::DateTimeOffset, Value::DateTime(dt)) if options.legacy_timestamps => {
                let local = options
                    .session_offset
                    .from_local_datetime(dt)
                    .single()
                    .ok_or_else(|| Error::out_of_range(dt, ty))?;
                Ok(NativeValue::TimestampText(datetimeoffset_text(&local)))
            }
            (ValueType::Interval, Value::Interval(d)) => {
                Ok(NativeValue::Interval(NativeInterval::from_duration(*d)?))
            }
            _ => Err(mismatch(ty, value)),
        }
    }

    fn decode(
        &self,
        options: &MappingOptions,
        ty: &ValueType,
        native: &NativeValue,
    ) -> Result<Value> {
        if let NativeValue::Infinity(sign) = native {
            if !options.infinity_aliasing {
                return Err(Error::unrecognized(native, ty));
            }
            return bound_for(ty, *sign).ok_or_else(|| Error::unrecognized(native, ty));
        }
        if let Some(decoded) = decode_common(ty, native) {
            return decoded;
        }

        let unrecognized = || Error::unrecognized(native, ty);
        match (ty, native) {
            (ValueType::Date, NativeValue::Date(d)) => Ok(Value::Date(*d)),
            (ValueType::Time, NativeValue::Time(t)) => Ok(Value::Time(*t)),
            (ValueType::DateTime, NativeValue::Timestamp(dt)) => Ok(Value::DateTime(*dt)),
            (ValueType::DateTime, NativeValue::Text(s)) => {
                parse_datetime(s).map(Value::DateTime).ok_or_else(unrecognized)
            }
            (ValueType::DateTimeOffset, NativeValue::TimestampTz(instant)) => {
                let zone = if options.legacy_timestamps {
                    options.session_offset
                } else {
                    utc()
                };
                Ok(Value::DateTimeOffset(instant.with_timezone(&zone)))
            }
            (ValueType::DateTimeOffset, NativeValue::TimestampText(s))
            | (ValueType::DateTimeOffset, NativeValue::Text(s)) => {
                let parsed = parse_datetimeoffset(s).ok_or_else(unrecognized)?;
                let zone = if options.legacy_timestamps {
                    options.session_offset
                } else {
                    utc()
                };
                Ok(Value::DateTimeOffset(parsed.with_timezone(&zone)))
            }
            _ => Err(unrecognized()),
        }
    }
}
