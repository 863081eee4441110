//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - Boolean is TINYINT(1), returns 1/0
//! - `||` is logical OR by default (use CONCAT())
//! - Backslash escapes inside string literals
//! - LIMIT is mandatory before OFFSET
//! - No sequences, cursors only inside stored programs
//! - No interval type: durations are BIGINT microseconds

use chrono::{DateTime, FixedOffset, Utc};

use super::helpers::{self, Part};
use super::{Feature, SqlDialect};
use crate::error::Result;
use crate::sql::function::{DatePart, PortableFunction};
use crate::sql::token::TokenStream;
use crate::sql::types::ValueType;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn placeholder(&self, _ordinal: usize) -> String {
        "?".into()
    }

    fn emit_limit_offset(
        &self,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<TokenStream> {
        helpers::emit_limit_offset_required(limit, offset, "18446744073709551615")
    }

    fn supports_concat_operator(&self) -> bool {
        false
    }

    fn supports(&self, feature: Feature) -> bool {
        !matches!(
            feature,
            Feature::Cursors
                | Feature::ScrollCursors
                | Feature::CursorOpen
                | Feature::UniquePredicate
                | Feature::MatchPredicate
                | Feature::Sequences
                | Feature::PartialIndexes
                | Feature::FillFactor
                | Feature::DeferrableConstraints
                | Feature::ForeignKeyMatch
                | Feature::ForeignKeyMatchPartial
                | Feature::SchemePartitioning
                | Feature::InfinityLiterals
        )
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_mysql(name)
    }

    fn emit_function(&self, func: PortableFunction, args: &[TokenStream]) -> Option<TokenStream> {
        use PortableFunction::*;
        let ts = match func {
            DateTimeAddYears => helpers::seq(&[
                Part::Sql("DATE_ADD("),
                Part::Arg(&args[0]),
                Part::Sql(", INTERVAL ("),
                Part::Arg(&args[1]),
                Part::Sql(") YEAR)"),
            ]),
            DateTimeAddMonths => helpers::seq(&[
                Part::Sql("DATE_ADD("),
                Part::Arg(&args[0]),
                Part::Sql(", INTERVAL ("),
                Part::Arg(&args[1]),
                Part::Sql(") MONTH)"),
            ]),
            DateTimeAddInterval => helpers::seq(&[
                Part::Sql("DATE_ADD("),
                Part::Arg(&args[0]),
                Part::Sql(", INTERVAL ("),
                Part::Arg(&args[1]),
                Part::Sql(") MICROSECOND)"),
            ]),
            DateTimeConstruct => helpers::seq(&[
                Part::Sql("TIMESTAMP(MAKEDATE("),
                Part::Arg(&args[0]),
                Part::Sql(", 1) + INTERVAL ("),
                Part::Arg(&args[1]),
                Part::Sql(") - 1 MONTH + INTERVAL ("),
                Part::Arg(&args[2]),
                Part::Sql(") - 1 DAY)"),
            ]),
            DateTimeTruncate => helpers::seq(&[
                Part::Sql("TIMESTAMP(DATE("),
                Part::Arg(&args[0]),
                Part::Sql("))"),
            ]),
            IntervalToMilliseconds => helpers::seq(&[
                Part::Sql("(("),
                Part::Arg(&args[0]),
                Part::Sql(") DIV 1000)"),
            ]),
            IntervalConstruct => helpers::seq(&[
                Part::Sql("(("),
                Part::Arg(&args[0]),
                Part::Sql(") * 1000)"),
            ]),
            CurrentDate => helpers::seq(&[Part::Sql("CURRENT_DATE()")]),
            CurrentTimestamp => helpers::seq(&[Part::Sql("NOW(6)")]),
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
            DatePart::DayOfWeek => helpers::seq(&[
                Part::Sql("(DAYOFWEEK("),
                Part::Arg(expr),
                Part::Sql(") - 1)"),
            ]),
            DatePart::DayOfYear => helpers::call("DAYOFYEAR", std::slice::from_ref(expr)),
            DatePart::Millisecond => helpers::seq(&[
                Part::Sql("(EXTRACT(MICROSECOND FROM "),
                Part::Arg(expr),
                Part::Sql(") DIV 1000)"),
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
        helpers::emit_data_type_mysql(ty)
    }

    fn emit_identity(&self, start: i64, increment: i64) -> TokenStream {
        helpers::emit_identity_mysql(start, increment)
    }

    fn format_datetimeoffset_literal(&self, dt: &DateTime<FixedOffset>) -> String {
        // stored as UTC
        let utc = dt.with_timezone(&Utc).naive_utc();
        format!("TIMESTAMP '{}'", helpers::datetime_text(utc))
    }
}
