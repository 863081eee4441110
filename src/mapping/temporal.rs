//! Host temporal bounds, infinity aliasing, and date-part evaluation.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
};

use super::options::{utc, MappingOptions};
use super::value::{Sign, Value};
use crate::error::{Error, Result};
use crate::sql::function::DatePart;
use crate::sql::types::ValueType;

/// Earliest host date (0001-01-01).
pub fn date_min() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or_default()
}

/// Latest host date (9999-12-31).
pub fn date_max() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or_default()
}

/// Earliest host timestamp (0001-01-01 00:00:00).
pub fn datetime_min() -> NaiveDateTime {
    date_min().and_time(NaiveTime::MIN)
}

/// Latest host timestamp (9999-12-31 23:59:59.999999).
pub fn datetime_max() -> NaiveDateTime {
    let end = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN);
    date_max().and_time(end)
}

pub fn datetimeoffset_min() -> DateTime<FixedOffset> {
    utc().from_utc_datetime(&datetime_min())
}

pub fn datetimeoffset_max() -> DateTime<FixedOffset> {
    utc().from_utc_datetime(&datetime_max())
}

/// The infinity a host value aliases, if it sits on a host bound.
pub fn infinity_sign(value: &Value) -> Option<Sign> {
    let (is_min, is_max) = match value {
        Value::Date(d) => (*d == date_min(), *d == date_max()),
        Value::DateTime(dt) => (*dt == datetime_min(), *dt == datetime_max()),
        Value::DateTimeOffset(dto) => {
            let utc = dto.naive_utc();
            (utc == datetime_min(), utc == datetime_max())
        }
        _ => (false, false),
    };
    if is_min {
        Some(Sign::Negative)
    } else if is_max {
        Some(Sign::Positive)
    } else {
        None
    }
}

/// The host bound an infinity sentinel reads back as.
pub fn bound_for(ty: &ValueType, sign: Sign) -> Option<Value> {
    let positive = sign == Sign::Positive;
    match ty {
        ValueType::Date => Some(Value::Date(if positive { date_max() } else { date_min() })),
        ValueType::DateTime => Some(Value::DateTime(if positive {
            datetime_max()
        } else {
            datetime_min()
        })),
        ValueType::DateTimeOffset => Some(Value::DateTimeOffset(if positive {
            datetimeoffset_max()
        } else {
            datetimeoffset_min()
        })),
        _ => None,
    }
}

/// Evaluate a date part of a host temporal value.
///
/// With infinity aliasing on, the host bounds yield `+inf` / `-inf` the way
/// the provider evaluates `EXTRACT` on `infinity`. Otherwise the numeric
/// part is returned (`datetime_min()` has year 1).
pub fn date_part(options: &MappingOptions, value: &Value, part: DatePart) -> Result<f64> {
    if options.infinity_aliasing {
        if let Some(sign) = infinity_sign(value) {
            return Ok(sign.as_f64());
        }
    }
    let (date, time) = match value {
        Value::Date(d) => (Some(*d), NaiveTime::MIN),
        Value::DateTime(dt) => (Some(dt.date()), dt.time()),
        Value::DateTimeOffset(dto) => (Some(dto.date_naive()), dto.time()),
        Value::Time(t) => (None, *t),
        other => {
            return Err(Error::TypeMismatch {
                expected: "temporal value".into(),
                found: other.kind().into(),
            })
        }
    };

    let from_date = |f: fn(NaiveDate) -> f64| {
        date.map(f).ok_or_else(|| Error::TypeMismatch {
            expected: format!("value with a {:?} component", part),
            found: value.kind().into(),
        })
    };

    match part {
        DatePart::Year => from_date(|d| d.year() as f64),
        DatePart::Quarter => from_date(|d| ((d.month0() / 3) + 1) as f64),
        DatePart::Month => from_date(|d| d.month() as f64),
        DatePart::Day => from_date(|d| d.day() as f64),
        DatePart::DayOfWeek => from_date(|d| d.weekday().num_days_from_sunday() as f64),
        DatePart::DayOfYear => from_date(|d| d.ordinal() as f64),
        DatePart::Hour => Ok(time.hour() as f64),
        DatePart::Minute => Ok(time.minute() as f64),
        DatePart::Second => Ok(time.second() as f64),
        DatePart::Millisecond => Ok((time.nanosecond() / 1_000_000) as f64),
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M:%S%.f").ok()
}

/// Parse `YYYY-MM-DD HH:MM:SS[.f]`, also accepting a `T` separator or a
/// bare date.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| parse_date(text).map(|d| d.and_time(NaiveTime::MIN)))
}

/// Parse timestamp text carrying an offset (`+02`, `+0200`, `+02:00` or `Z`).
pub fn parse_datetimeoffset(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    let owned;
    let text = match text.strip_suffix('Z') {
        Some(rest) => {
            owned = format!("{}+00:00", rest);
            owned.as_str()
        }
        None => text,
    };
    DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z")
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%#z"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(datetime_min().to_string(), "0001-01-01 00:00:00");
        assert_eq!(datetime_max().to_string(), "9999-12-31 23:59:59.999999");
        assert_eq!(datetimeoffset_max().offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_infinity_sign() {
        assert_eq!(
            infinity_sign(&Value::DateTime(datetime_max())),
            Some(Sign::Positive)
        );
        assert_eq!(infinity_sign(&Value::Date(date_min())), Some(Sign::Negative));
        assert_eq!(infinity_sign(&Value::Int32(0)), None);
        let plus2 = FixedOffset::east_opt(7200).unwrap();
        let shifted = datetimeoffset_max().with_timezone(&plus2);
        assert_eq!(
            infinity_sign(&Value::DateTimeOffset(shifted)),
            Some(Sign::Positive)
        );
    }

    #[test]
    fn test_date_part_aliasing() {
        let on = MappingOptions::default();
        let off = MappingOptions::default().with_infinity_aliasing(false);
        let min = Value::DateTime(datetime_min());

        assert_eq!(date_part(&on, &min, DatePart::Year).unwrap(), f64::NEG_INFINITY);
        assert_eq!(date_part(&off, &min, DatePart::Year).unwrap(), 1.0);
        assert_eq!(
            date_part(&on, &Value::Date(date_max()), DatePart::Day).unwrap(),
            f64::INFINITY
        );
    }

    #[test]
    fn test_date_part_values() {
        let opts = MappingOptions::default();
        let dt = parse_datetime("2024-05-17 13:45:30.250").unwrap();
        let v = Value::DateTime(dt);
        assert_eq!(date_part(&opts, &v, DatePart::Quarter).unwrap(), 2.0);
        assert_eq!(date_part(&opts, &v, DatePart::DayOfWeek).unwrap(), 5.0);
        assert_eq!(date_part(&opts, &v, DatePart::Millisecond).unwrap(), 250.0);
        assert!(date_part(&opts, &Value::Time(dt.time()), DatePart::Year).is_err());
    }

    #[test]
    fn test_parse_offsets() {
        let a = parse_datetimeoffset("2024-01-01 10:00:00+02").unwrap();
        let b = parse_datetimeoffset("2024-01-01T08:00:00Z").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.offset().local_minus_utc(), 7200);
        assert!(parse_datetimeoffset("yesterday").is_none());
    }
}
