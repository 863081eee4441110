//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features:
//! - ANSI identifier quoting (`"`)
//! - Native boolean type (true/false)
//! - `$n` placeholders
//! - Native INTERVAL type and `infinity` timestamp sentinels
//! - `#` for bitwise XOR
//! - Cursors are opened by DECLARE (no OPEN statement)

use chrono::{DateTime, FixedOffset};

use super::helpers::{self, Part};
use super::{Feature, SqlDialect};
use crate::error::Result;
use crate::mapping::NativeInterval;
use crate::sql::function::{DatePart, PortableFunction};
use crate::sql::token::TokenStream;
use crate::sql::types::ValueType;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn placeholder(&self, ordinal: usize) -> String {
        format!("${}", ordinal)
    }

    fn emit_limit_offset(
        &self,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<TokenStream> {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    fn bitwise_xor_operator(&self) -> &'static str {
        "#"
    }

    fn supports(&self, feature: Feature) -> bool {
        !matches!(
            feature,
            Feature::CursorOpen
                | Feature::UniquePredicate
                | Feature::MatchPredicate
                | Feature::ForeignKeyMatchPartial
                | Feature::SchemePartitioning
        )
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_postgres(name)
    }

    fn emit_function(&self, func: PortableFunction, args: &[TokenStream]) -> Option<TokenStream> {
        use PortableFunction::*;
        let ts = match func {
            DateTimeAddYears => helpers::seq(&[
                Part::Sql("("),
                Part::Arg(&args[0]),
                Part::Sql(" + ("),
                Part::Arg(&args[1]),
                Part::Sql(") * INTERVAL '1 year')"),
            ]),
            DateTimeAddMonths => helpers::seq(&[
                Part::Sql("("),
                Part::Arg(&args[0]),
                Part::Sql(" + ("),
                Part::Arg(&args[1]),
                Part::Sql(") * INTERVAL '1 month')"),
            ]),
            DateTimeAddInterval => helpers::seq(&[
                Part::Sql("("),
                Part::Arg(&args[0]),
                Part::Sql(" + "),
                Part::Arg(&args[1]),
                Part::Sql(")"),
            ]),
            DateTimeConstruct => helpers::seq(&[
                Part::Sql("MAKE_TIMESTAMP("),
                Part::Arg(&args[0]),
                Part::Sql(", "),
                Part::Arg(&args[1]),
                Part::Sql(", "),
                Part::Arg(&args[2]),
                Part::Sql(", 0, 0, 0)"),
            ]),
            DateTimeTruncate => helpers::seq(&[
                Part::Sql("DATE_TRUNC('day', "),
                Part::Arg(&args[0]),
                Part::Sql(")"),
            ]),
            IntervalToMilliseconds => interval_to_milliseconds(&args[0]),
            IntervalConstruct => helpers::seq(&[
                Part::Sql("(("),
                Part::Arg(&args[0]),
                Part::Sql(") * INTERVAL '1 millisecond')"),
            ]),
            CurrentDate => helpers::seq(&[Part::Sql("CURRENT_DATE")]),
            CurrentTimestamp => helpers::seq(&[Part::Sql("LOCALTIMESTAMP")]),
            CharLength => helpers::call("CHAR_LENGTH", args),
            Substring => helpers::call("SUBSTRING", args),
            Lower => helpers::call("LOWER", args),
            Upper => helpers::call("UPPER", args),
            Trim => helpers::call("TRIM", args),
            Coalesce => helpers::call("COALESCE", args),
            Abs => helpers::call("ABS", args),
            Round => helpers::call("ROUND", args),
        };
        Some(ts)
    }

    fn emit_extract(&self, part: DatePart, expr: &TokenStream) -> Option<TokenStream> {
        let ts = match part {
            DatePart::Millisecond => helpers::seq(&[
                Part::Sql("(CAST(FLOOR(EXTRACT(MILLISECONDS FROM "),
                Part::Arg(expr),
                Part::Sql(")) AS INTEGER) % 1000)"),
            ]),
            _ => helpers::seq(&[
                Part::Sql("EXTRACT("),
                Part::Sql(part.extract_keyword()),
                Part::Sql(" FROM "),
                Part::Arg(expr),
                Part::Sql(")"),
            ]),
        };
        Some(ts)
    }

    fn emit_data_type(&self, ty: &ValueType) -> String {
        helpers::emit_data_type_postgres(ty)
    }

    fn format_datetimeoffset_literal(&self, dt: &DateTime<FixedOffset>) -> String {
        format!("TIMESTAMPTZ '{}'", helpers::datetimeoffset_text(dt))
    }

    fn format_interval_literal(&self, interval: &NativeInterval) -> Result<String> {
        Ok(format!("INTERVAL '{}'", interval.to_postgres_text()))
    }

    fn format_infinity_literal(&self, ty: &ValueType, positive: bool) -> Option<String> {
        let sentinel = if positive { "infinity" } else { "-infinity" };
        match ty {
            ValueType::Date => Some(format!("DATE '{}'", sentinel)),
            ValueType::DateTime => Some(format!("TIMESTAMP '{}'", sentinel)),
            ValueType::DateTimeOffset => Some(format!("TIMESTAMPTZ '{}'", sentinel)),
            _ => None,
        }
    }

    fn format_bytes_literal(&self, bytes: &[u8]) -> String {
        format!("DECODE('{}', 'hex')", helpers::hex(bytes))
    }

    fn format_guid_literal(&self, guid: &uuid::Uuid) -> String {
        format!("UUID '{}'", guid.hyphenated())
    }
}

/// Whole milliseconds of an interval, months counted as 30 days.
fn interval_to_milliseconds(i: &TokenStream) -> TokenStream {
    let field = |unit: &'static str, factor: &'static str| {
        helpers::seq(&[
            Part::Sql("EXTRACT("),
            Part::Sql(unit),
            Part::Sql(" FROM "),
            Part::Arg(i),
            Part::Sql(")"),
            Part::Sql(factor),
        ])
    };
    let years = field("YEAR", " * 12");
    let months = field("MONTH", "");
    let days = field("DAY", " * 86400000");
    let hours = field("HOUR", " * 3600000");
    let minutes = field("MINUTE", " * 60000");
    let seconds = field("SECOND", " * 1000");

    helpers::seq(&[
        Part::Sql("CAST(TRUNC(("),
        Part::Arg(&years),
        Part::Sql(" + "),
        Part::Arg(&months),
        Part::Sql(") * 2592000000 + "),
        Part::Arg(&days),
        Part::Sql(" + "),
        Part::Arg(&hours),
        Part::Sql(" + "),
        Part::Arg(&minutes),
        Part::Sql(" + "),
        Part::Arg(&seconds),
        Part::Sql(") AS BIGINT)"),
    ])
}
