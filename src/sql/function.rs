//! Portable function names and date parts.
//!
//! A portable function is resolved to native SQL by each dialect at compile
//! time (`SqlDialect::emit_function`). A dialect with no translation reports
//! `UnsupportedFeature` instead of guessing.

use std::fmt;

/// Function names with a fixed meaning across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortableFunction {
    /// `(datetime, years)`
    DateTimeAddYears,
    /// `(datetime, months)`
    DateTimeAddMonths,
    /// `(datetime, interval)`
    DateTimeAddInterval,
    /// `(year, month, day)` to a timestamp at midnight.
    DateTimeConstruct,
    /// `(datetime)` truncated to midnight.
    DateTimeTruncate,
    /// `(interval)` to whole milliseconds, months counted as 30 days.
    IntervalToMilliseconds,
    /// `(milliseconds)` to an interval.
    IntervalConstruct,
    CurrentDate,
    CurrentTimestamp,
    CharLength,
    /// `(string, start, length)`, 1-based.
    Substring,
    Lower,
    Upper,
    Trim,
    Coalesce,
    Abs,
    /// `(number)` or `(number, digits)`.
    Round,
}

/// Accepted argument counts for a portable function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exactly(k) => n == k,
            Arity::Range(lo, hi) => n >= lo && n <= hi,
            Arity::AtLeast(k) => n >= k,
        }
    }
}

impl PortableFunction {
    pub fn arity(&self) -> Arity {
        use PortableFunction::*;
        match self {
            DateTimeAddYears | DateTimeAddMonths | DateTimeAddInterval => Arity::Exactly(2),
            DateTimeConstruct => Arity::Exactly(3),
            DateTimeTruncate | IntervalToMilliseconds | IntervalConstruct => Arity::Exactly(1),
            CurrentDate | CurrentTimestamp => Arity::Exactly(0),
            CharLength | Lower | Upper | Trim | Abs => Arity::Exactly(1),
            Substring => Arity::Range(2, 3),
            Coalesce => Arity::AtLeast(1),
            Round => Arity::Range(1, 2),
        }
    }
}

impl fmt::Display for PortableFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Parts extractable from a temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePart {
    Year,
    Quarter,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    /// 0 = Sunday.
    DayOfWeek,
    DayOfYear,
}

impl DatePart {
    /// Keyword used by `EXTRACT(<part> FROM ...)`.
    pub fn extract_keyword(&self) -> &'static str {
        match self {
            DatePart::Year => "YEAR",
            DatePart::Quarter => "QUARTER",
            DatePart::Month => "MONTH",
            DatePart::Day => "DAY",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
            DatePart::Second => "SECOND",
            DatePart::Millisecond => "MILLISECOND",
            DatePart::DayOfWeek => "DOW",
            DatePart::DayOfYear => "DOY",
        }
    }
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        assert!(PortableFunction::DateTimeConstruct.arity().accepts(3));
        assert!(!PortableFunction::DateTimeConstruct.arity().accepts(2));
        assert!(PortableFunction::Substring.arity().accepts(2));
        assert!(PortableFunction::Substring.arity().accepts(3));
        assert!(!PortableFunction::Substring.arity().accepts(4));
        assert!(PortableFunction::Coalesce.arity().accepts(5));
        assert!(!PortableFunction::Coalesce.arity().accepts(0));
        assert!(PortableFunction::CurrentDate.arity().accepts(0));
    }
}
