//! Conversions every provider shares.
//!
//! Each function returns `None` when the declared type needs provider
//! specific handling (booleans on the bind side, temporal values, GUIDs).

use chrono::TimeDelta;
use uuid::Uuid;

use super::interval::HOST_INTERVAL_MAX_MICROS;
use super::value::{NativeValue, Value};
use crate::error::{Error, Result};
use crate::sql::types::{Length, ValueType};

pub(crate) fn mismatch(ty: &ValueType, value: &Value) -> Error {
    Error::TypeMismatch {
        expected: ty.to_string(),
        found: value.kind().to_string(),
    }
}

pub(crate) fn bind_common(ty: &ValueType, value: &Value) -> Option<Result<NativeValue>> {
    if value.is_null() {
        return Some(Ok(NativeValue::Null));
    }
    let bound = match ty {
        ValueType::Int8 | ValueType::Int16 | ValueType::Int32 | ValueType::Int64 => value
            .as_i64()
            .ok_or_else(|| mismatch(ty, value))
            .and_then(|i| check_int_range(ty, i))
            .map(NativeValue::Int),
        ValueType::Decimal(precision, scale) => bind_decimal(ty, *precision, *scale, value),
        ValueType::Float | ValueType::Double => bind_float(ty, value),
        ValueType::Char(_) | ValueType::VarChar(_) | ValueType::Text => match value {
            Value::String(s) => check_length(ty, s.chars().count(), s)
                .map(|_| NativeValue::Text(s.clone())),
            _ => Err(mismatch(ty, value)),
        },
        ValueType::Binary(_) | ValueType::VarBinary(_) => match value {
            Value::Bytes(b) => {
                check_length(ty, b.len(), &format!("<{} bytes>", b.len()))
                    .map(|_| NativeValue::Bytes(b.clone()))
            }
            _ => Err(mismatch(ty, value)),
        },
        ValueType::Json => match value {
            Value::Json(j) => Ok(NativeValue::Text(j.to_string())),
            Value::String(s) => serde_json::from_str::<serde_json::Value>(s)
                .map(|_| NativeValue::Text(s.clone()))
                .map_err(|_| mismatch(ty, value)),
            _ => Err(mismatch(ty, value)),
        },
        _ => return None,
    };
    Some(bound)
}

pub(crate) fn decode_common(ty: &ValueType, native: &NativeValue) -> Option<Result<Value>> {
    if native.is_null() {
        return Some(Ok(Value::Null));
    }
    let unrecognized = || Error::unrecognized(native, ty);
    let decoded = match ty {
        ValueType::Boolean => match native {
            NativeValue::Bool(b) => Ok(Value::Bool(*b)),
            NativeValue::Int(0) => Ok(Value::Bool(false)),
            NativeValue::Int(1) => Ok(Value::Bool(true)),
            _ => Err(unrecognized()),
        },
        ValueType::Int8 | ValueType::Int16 | ValueType::Int32 | ValueType::Int64 => {
            let wide = match native {
                NativeValue::Int(i) => Ok(*i),
                NativeValue::Numeric(s) | NativeValue::Text(s) => {
                    s.trim().parse::<i64>().map_err(|_| unrecognized())
                }
                NativeValue::Bool(b) => Ok(*b as i64),
                _ => Err(unrecognized()),
            };
            wide.and_then(|i| narrow(ty, i))
        }
        ValueType::Decimal(_, _) => match native {
            NativeValue::Numeric(s) => Ok(Value::Decimal(s.clone())),
            NativeValue::Int(i) => Ok(Value::Decimal(i.to_string())),
            NativeValue::Float(f) if f.is_finite() => {
                Ok(Value::Decimal(ryu::Buffer::new().format_finite(*f).to_string()))
            }
            NativeValue::Text(s) if parse_decimal(s).is_some() => Ok(Value::Decimal(s.clone())),
            _ => Err(unrecognized()),
        },
        ValueType::Float => match native {
            NativeValue::Float(f) => Ok(Value::Float(*f as f32)),
            NativeValue::Int(i) => Ok(Value::Float(*i as f32)),
            NativeValue::Numeric(s) => s.parse::<f32>().map(Value::Float).map_err(|_| unrecognized()),
            _ => Err(unrecognized()),
        },
        ValueType::Double => match native {
            NativeValue::Float(f) => Ok(Value::Double(*f)),
            NativeValue::Int(i) => Ok(Value::Double(*i as f64)),
            NativeValue::Numeric(s) => s.parse::<f64>().map(Value::Double).map_err(|_| unrecognized()),
            _ => Err(unrecognized()),
        },
        ValueType::Char(_) | ValueType::VarChar(_) | ValueType::Text => match native {
            NativeValue::Text(s) => Ok(Value::String(s.clone())),
            _ => Err(unrecognized()),
        },
        ValueType::Binary(_) | ValueType::VarBinary(_) => match native {
            NativeValue::Bytes(b) => Ok(Value::Bytes(b.clone())),
            _ => Err(unrecognized()),
        },
        ValueType::Guid => match native {
            NativeValue::Uuid(u) => Ok(Value::Guid(*u)),
            NativeValue::Text(s) => Uuid::parse_str(s).map(Value::Guid).map_err(|_| unrecognized()),
            NativeValue::Bytes(b) => Uuid::from_slice(b).map(Value::Guid).map_err(|_| unrecognized()),
            _ => Err(unrecognized()),
        },
        ValueType::Json => match native {
            NativeValue::Text(s) => serde_json::from_str(s)
                .map(Value::Json)
                .map_err(|_| unrecognized()),
            _ => Err(unrecognized()),
        },
        ValueType::Interval => match native {
            NativeValue::Interval(iv) => iv.to_duration().map(Value::Interval),
            NativeValue::Int(us) if us.abs() <= HOST_INTERVAL_MAX_MICROS => {
                Ok(Value::Interval(TimeDelta::microseconds(*us)))
            }
            NativeValue::Int(us) => Err(Error::out_of_range(us, ty)),
            _ => Err(unrecognized()),
        },
        _ => return None,
    };
    Some(decoded)
}

/// Host interval as whole microseconds, for providers that store `BIGINT`.
pub(crate) fn interval_micros(ty: &ValueType, value: &Value) -> Result<i64> {
    match value {
        Value::Interval(d) => super::interval::round_to_micros(*d)
            .filter(|us| us.abs() <= HOST_INTERVAL_MAX_MICROS)
            .ok_or_else(|| Error::out_of_range(d, ty)),
        _ => Err(mismatch(ty, value)),
    }
}

fn check_int_range(ty: &ValueType, i: i64) -> Result<i64> {
    let (min, max) = match ty {
        ValueType::Int8 => (i8::MIN as i64, i8::MAX as i64),
        ValueType::Int16 => (i16::MIN as i64, i16::MAX as i64),
        ValueType::Int32 => (i32::MIN as i64, i32::MAX as i64),
        _ => (i64::MIN, i64::MAX),
    };
    if i < min || i > max {
        return Err(Error::out_of_range(i, ty));
    }
    Ok(i)
}

fn narrow(ty: &ValueType, i: i64) -> Result<Value> {
    let value = match ty {
        ValueType::Int8 => i8::try_from(i).map(Value::Int8).ok(),
        ValueType::Int16 => i16::try_from(i).map(Value::Int16).ok(),
        ValueType::Int32 => i32::try_from(i).map(Value::Int32).ok(),
        _ => Some(Value::Int64(i)),
    };
    value.ok_or_else(|| Error::out_of_range(i, ty))
}

fn check_length(ty: &ValueType, len: usize, shown: &str) -> Result<()> {
    if let Some(Length::Fixed(max)) = ty.length() {
        if len > max as usize {
            return Err(Error::out_of_range(format!("'{}'", shown), ty));
        }
    }
    Ok(())
}

fn bind_float(ty: &ValueType, value: &Value) -> Result<NativeValue> {
    let f = match value {
        Value::Float(f) => *f as f64,
        Value::Double(f) => *f,
        other => other.as_i64().ok_or_else(|| mismatch(ty, value))? as f64,
    };
    if *ty == ValueType::Float && f.is_finite() && f.abs() > f32::MAX as f64 {
        return Err(Error::out_of_range(f, ty));
    }
    Ok(NativeValue::Float(f))
}

fn bind_decimal(ty: &ValueType, precision: u8, scale: u8, value: &Value) -> Result<NativeValue> {
    let text = match value {
        Value::Decimal(s) => s.trim().trim_start_matches('+').to_string(),
        other => other.as_i64().ok_or_else(|| mismatch(ty, value))?.to_string(),
    };
    let (int_digits, frac_digits) = parse_decimal(&text).ok_or_else(|| Error::TypeMismatch {
        expected: ty.to_string(),
        found: format!("'{}'", text),
    })?;
    if frac_digits > scale as usize || int_digits > precision.saturating_sub(scale) as usize {
        return Err(Error::out_of_range(&text, ty));
    }
    Ok(NativeValue::Numeric(text))
}

/// Significant integer digits and fraction digits of a plain decimal.
pub(crate) fn parse_decimal(text: &str) -> Option<(usize, usize)> {
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let significant = int_part.trim_start_matches('0').len();
    Some((significant, frac_part.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_narrowing() {
        let err = bind_common(&ValueType::Int16, &Value::Int64(70_000)).unwrap().unwrap_err();
        assert!(matches!(err, Error::ValueOutOfRange { .. }));
        let ok = bind_common(&ValueType::Int16, &Value::Int32(-5)).unwrap().unwrap();
        assert_eq!(ok, NativeValue::Int(-5));
    }

    #[test]
    fn test_decimal_precision_and_scale() {
        let ty = ValueType::Decimal(5, 2);
        assert_eq!(
            bind_common(&ty, &Value::Decimal("123.45".into())).unwrap().unwrap(),
            NativeValue::Numeric("123.45".into())
        );
        assert!(matches!(
            bind_common(&ty, &Value::Decimal("1234.5".into())).unwrap(),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            bind_common(&ty, &Value::Decimal("1.234".into())).unwrap(),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            bind_common(&ty, &Value::Decimal("1.2.3".into())).unwrap(),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_char_length() {
        let ty = ValueType::VarChar(Length::Fixed(3));
        assert!(bind_common(&ty, &Value::String("abc".into())).unwrap().is_ok());
        assert!(matches!(
            bind_common(&ty, &Value::String("abcd".into())).unwrap(),
            Err(Error::ValueOutOfRange { .. })
        ));
        // counted in characters, not bytes
        assert!(bind_common(&ty, &Value::String("äöü".into())).unwrap().is_ok());
    }

    #[test]
    fn test_kind_mismatch() {
        let err = bind_common(&ValueType::Int32, &Value::String("1".into()))
            .unwrap()
            .unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected INTEGER, found string");
    }

    #[test]
    fn test_provider_specific_types_fall_through() {
        assert!(bind_common(&ValueType::Boolean, &Value::Bool(true)).is_none());
        assert!(bind_common(&ValueType::DateTime, &Value::Int32(1)).is_none());
        assert!(decode_common(&ValueType::Date, &NativeValue::Int(1)).is_none());
    }

    #[test]
    fn test_decode_narrowing_and_unknown() {
        assert_eq!(
            decode_common(&ValueType::Int8, &NativeValue::Int(12)).unwrap().unwrap(),
            Value::Int8(12)
        );
        assert!(matches!(
            decode_common(&ValueType::Int8, &NativeValue::Int(300)).unwrap(),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            decode_common(&ValueType::Text, &NativeValue::Int(1)).unwrap(),
            Err(Error::UnrecognizedNativeValue { .. })
        ));
    }

    #[test]
    fn test_decode_decimal_from_float() {
        assert_eq!(
            decode_common(&ValueType::Decimal(10, 2), &NativeValue::Float(12.5))
                .unwrap()
                .unwrap(),
            Value::Decimal("12.5".into())
        );
    }
}
