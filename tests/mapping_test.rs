//! Integration tests for provider type mapping: intervals, temporal
//! bounds, infinity sentinels and session time zones.

use chrono::{FixedOffset, NaiveDate, TimeDelta, TimeZone};

use lattice::mapping::interval::{interval_max, interval_min};
use lattice::mapping::switches;
use lattice::mapping::temporal::{date_max, date_min, datetime_max, datetime_min};
use lattice::mapping::{
    mapper_for, resolve_timezone, MappingOptions, NativeInterval, NativeValue, Sign, Value,
};
use lattice::model::TableRef;
use lattice::sql::{lit_datetime, Compiler, Select, Statement, ValueType};
use lattice::{Dialect, Error};

fn round_trip(dialect: Dialect, d: TimeDelta) -> TimeDelta {
    let mapper = mapper_for(dialect);
    let options = MappingOptions::default();
    let native = mapper
        .bind(&options, &ValueType::Interval, &Value::Interval(d))
        .unwrap();
    match mapper.decode(&options, &ValueType::Interval, &native).unwrap() {
        Value::Interval(back) => back,
        other => panic!("expected interval, got {:?}", other),
    }
}

// ============================================================================
// Intervals
// ============================================================================

#[test]
fn test_interval_round_trip_every_provider() {
    let samples = [
        TimeDelta::zero(),
        TimeDelta::milliseconds(1),
        TimeDelta::microseconds(123_456),
        TimeDelta::days(3 * 365) + TimeDelta::hours(7) + TimeDelta::seconds(59),
        -(TimeDelta::days(400) + TimeDelta::milliseconds(250)),
        interval_max(),
        interval_min(),
    ];
    for dialect in [Dialect::Postgres, Dialect::SqlServer, Dialect::Sqlite] {
        for d in samples {
            assert_eq!(round_trip(dialect, d), d, "{} {:?}", dialect, d);
        }
    }
}

#[test]
fn test_interval_fields_and_total_milliseconds() {
    let d = TimeDelta::days(95) + TimeDelta::milliseconds(1_250);
    let native = NativeInterval::from_duration(d).unwrap();
    assert_eq!((native.months, native.days), (3, 5));
    assert_eq!(native.microseconds, 1_250_000);
    assert_eq!(native.total_milliseconds(), d.num_milliseconds());

    let negated = NativeInterval::from_duration(-d).unwrap();
    assert_eq!((negated.months, negated.days), (-3, -5));
    assert_eq!(negated.total_milliseconds(), -d.num_milliseconds());
}

#[test]
fn test_interval_beyond_host_range() {
    let err = NativeInterval::new(i32::MAX, 0, 0).to_duration().unwrap_err();
    assert!(matches!(err, Error::ValueOutOfRange { .. }));

    let mapper = mapper_for(Dialect::Postgres);
    let err = mapper
        .decode(
            &MappingOptions::default(),
            &ValueType::Interval,
            &NativeValue::Interval(NativeInterval::new(i32::MIN, 0, 0)),
        )
        .unwrap_err();
    assert!(matches!(err, Error::ValueOutOfRange { .. }));
}

// ============================================================================
// Temporal bounds and infinity
// ============================================================================

#[test]
fn test_postgres_infinity_aliasing() {
    let mapper = mapper_for(Dialect::Postgres);
    let on = MappingOptions::default();

    let cases = [
        (ValueType::Date, Value::Date(date_max()), Sign::Positive),
        (ValueType::Date, Value::Date(date_min()), Sign::Negative),
        (ValueType::DateTime, Value::DateTime(datetime_max()), Sign::Positive),
        (ValueType::DateTime, Value::DateTime(datetime_min()), Sign::Negative),
    ];
    for (ty, value, sign) in cases {
        let native = mapper.bind(&on, &ty, &value).unwrap();
        assert_eq!(native, NativeValue::Infinity(sign));
        assert_eq!(mapper.decode(&on, &ty, &native).unwrap(), value);
    }
}

#[test]
fn test_postgres_without_aliasing() {
    let mapper = mapper_for(Dialect::Postgres);
    let off = MappingOptions::default().with_infinity_aliasing(false);

    let native = mapper
        .bind(&off, &ValueType::DateTime, &Value::DateTime(datetime_max()))
        .unwrap();
    assert_eq!(native, NativeValue::Timestamp(datetime_max()));

    let err = mapper
        .decode(&off, &ValueType::Date, &NativeValue::Infinity(Sign::Positive))
        .unwrap_err();
    assert!(matches!(err, Error::UnrecognizedNativeValue { .. }));
}

#[test]
fn test_ordinary_dates_are_untouched() {
    let mapper = mapper_for(Dialect::Postgres);
    let day = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let native = mapper
        .bind(&MappingOptions::default(), &ValueType::Date, &Value::Date(day))
        .unwrap();
    assert_eq!(native, NativeValue::Date(day));
}

#[test]
fn test_switches_feed_current_options() {
    // the only test in this binary that touches process-wide state
    let before = switches::snapshot();
    let bound: Statement = Select::from_table(TableRef::new("main", "T"))
        .column(lit_datetime(datetime_max()))
        .into();
    switches::set_infinity_conversions(true);
    let following = Compiler::new(Dialect::Postgres);
    let pinned = Compiler::new(Dialect::Postgres).with_options(MappingOptions::default());
    assert!(following.compile(&bound).unwrap().sql.contains("TIMESTAMP 'infinity'"));

    switches::set_infinity_conversions(false);
    switches::set_legacy_timestamp_behavior(true);
    let options = MappingOptions::current();
    assert!(!options.infinity_aliasing);
    assert!(options.legacy_timestamps);

    // switches are read when compiling, not when the compiler is built
    assert!(following
        .compile(&bound)
        .unwrap()
        .sql
        .contains("TIMESTAMP '9999-12-31 23:59:59.999999'"));
    assert!(pinned.compile(&bound).unwrap().sql.contains("TIMESTAMP 'infinity'"));

    switches::set_infinity_conversions(before.infinity_conversions);
    switches::set_legacy_timestamp_behavior(before.legacy_timestamp_behavior);
    assert_eq!(switches::snapshot(), before);
}

// ============================================================================
// Legacy timestamps and session zones
// ============================================================================

#[test]
fn test_legacy_timestamptz_keeps_offset() {
    let mapper = mapper_for(Dialect::Postgres);
    let plus_two = resolve_timezone("<+02>-02").unwrap();
    let value = Value::DateTimeOffset(
        plus_two
            .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
            .single()
            .unwrap(),
    );

    let legacy = MappingOptions::default()
        .with_legacy_timestamps(true)
        .with_session_offset(plus_two);
    match mapper.bind(&legacy, &ValueType::DateTimeOffset, &value).unwrap() {
        NativeValue::TimestampText(text) => assert!(text.ends_with("+02:00"), "{}", text),
        other => panic!("expected offset text, got {:?}", other),
    }

    let modern = MappingOptions::default();
    assert!(matches!(
        mapper.bind(&modern, &ValueType::DateTimeOffset, &value).unwrap(),
        NativeValue::TimestampTz(_)
    ));
}

#[test]
fn test_timezone_spellings_agree() {
    let east_five = FixedOffset::east_opt(5 * 3600);
    assert_eq!(resolve_timezone("<+05>-05"), east_five);
    assert_eq!(resolve_timezone("Etc/GMT-5"), east_five);
    assert_eq!(resolve_timezone("+05:00"), east_five);
    assert_eq!(resolve_timezone("UTC+5"), east_five);
    assert_eq!(resolve_timezone("not a zone"), None);
}
