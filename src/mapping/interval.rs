//! Host duration <-> provider interval fields.
//!
//! A host duration is decomposed into months, days, and microseconds using
//! a fixed 30-day month. Months are counted first, then remaining whole
//! days, then the sub-day remainder. Every component carries the sign of
//! the original duration, so negation is symmetric and
//! `to_duration(from_duration(d)) == d` for every microsecond-aligned `d`
//! inside the host range.

use chrono::TimeDelta;
use std::fmt;

use crate::error::{Error, Result};

pub const MICROS_PER_MILLI: i64 = 1_000;
pub const MICROS_PER_SECOND: i64 = 1_000_000;
pub const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;
pub const DAYS_PER_MONTH: i64 = 30;
pub const MICROS_PER_MONTH: i64 = DAYS_PER_MONTH * MICROS_PER_DAY;

/// Largest host duration in microseconds (922 337 203 685.477580 s).
pub const HOST_INTERVAL_MAX_MICROS: i64 = 922_337_203_685_477_580;

/// Largest representable host duration.
pub fn interval_max() -> TimeDelta {
    TimeDelta::microseconds(HOST_INTERVAL_MAX_MICROS)
}

/// Smallest representable host duration.
pub fn interval_min() -> TimeDelta {
    TimeDelta::microseconds(-HOST_INTERVAL_MAX_MICROS)
}

/// Provider-native interval fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeInterval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

impl NativeInterval {
    pub fn new(months: i32, days: i32, microseconds: i64) -> Self {
        Self {
            months,
            days,
            microseconds,
        }
    }

    /// Decompose a host duration.
    ///
    /// Sub-microsecond precision is rounded half away from zero. Durations
    /// outside the host range fail with `ValueOutOfRange`.
    pub fn from_duration(duration: TimeDelta) -> Result<Self> {
        let total = round_to_micros(duration)
            .filter(|us| us.abs() <= HOST_INTERVAL_MAX_MICROS)
            .ok_or_else(|| Error::out_of_range(format_duration(duration), "interval"))?;

        let sign = total.signum();
        let magnitude = total.abs();

        let months = magnitude / MICROS_PER_MONTH;
        let rest = magnitude % MICROS_PER_MONTH;
        let days = rest / MICROS_PER_DAY;
        let micros = rest % MICROS_PER_DAY;

        Ok(Self {
            months: (sign * months) as i32,
            days: (sign * days) as i32,
            microseconds: sign * micros,
        })
    }

    /// Total microseconds, or `None` on overflow.
    pub fn total_microseconds(&self) -> Option<i64> {
        (self.months as i64)
            .checked_mul(MICROS_PER_MONTH)?
            .checked_add((self.days as i64).checked_mul(MICROS_PER_DAY)?)?
            .checked_add(self.microseconds)
    }

    /// Reconstruct the host duration.
    pub fn to_duration(&self) -> Result<TimeDelta> {
        self.total_microseconds()
            .filter(|us| us.abs() <= HOST_INTERVAL_MAX_MICROS)
            .map(TimeDelta::microseconds)
            .ok_or_else(|| Error::out_of_range(self, "interval"))
    }

    /// Whole milliseconds, truncated toward zero, computed from the fields.
    pub fn total_milliseconds(&self) -> i64 {
        let months_ms = self.months as i64 * (MICROS_PER_MONTH / MICROS_PER_MILLI);
        let days_ms = self.days as i64 * (MICROS_PER_DAY / MICROS_PER_MILLI);
        months_ms + days_ms + self.microseconds / MICROS_PER_MILLI
    }

    /// PostgreSQL interval input text, e.g. `-1 months -2 days -3 microseconds`.
    pub fn to_postgres_text(&self) -> String {
        format!(
            "{} months {} days {} microseconds",
            self.months, self.days, self.microseconds
        )
    }
}

impl fmt::Display for NativeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mons {} days {} us",
            self.months, self.days, self.microseconds
        )
    }
}

/// Round a duration to whole microseconds, half away from zero.
pub fn round_to_micros(duration: TimeDelta) -> Option<i64> {
    let secs = duration.num_seconds();
    // subsec_nanos has the sign of the duration
    let nanos = duration.subsec_nanos() as i64;
    let mut micros = nanos / 1_000;
    let rem = nanos % 1_000;
    if rem >= 500 {
        micros += 1;
    } else if rem <= -500 {
        micros -= 1;
    }
    secs.checked_mul(MICROS_PER_SECOND)?.checked_add(micros)
}

fn format_duration(duration: TimeDelta) -> String {
    format!("{}s", duration.num_seconds())
}
