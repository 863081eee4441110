//! SQLite SQL dialect.
//!
//! SQLite is dynamically typed; temporal values are stored as ISO-8601 text
//! and manipulated with `STRFTIME`. Differences from ANSI:
//! - `?NNN` numbered placeholders
//! - Booleans are integers 1/0
//! - LIMIT is mandatory before OFFSET (`LIMIT -1` for unbounded)
//! - No sequences, cursors, TRUNCATE, or ALTER ... CONSTRAINT
//! - DDL cannot qualify the table in CREATE INDEX or REFERENCES

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use super::helpers::{self, Part};
use super::{Feature, SqlDialect};
use crate::error::Result;
use crate::sql::function::{DatePart, PortableFunction};
use crate::sql::token::TokenStream;
use crate::sql::types::ValueType;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

/// Text format produced by SQLite's own date arithmetic.
const STRFTIME_DATETIME: &str = "'%Y-%m-%d %H:%M:%f'";

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn placeholder(&self, ordinal: usize) -> String {
        format!("?{}", ordinal)
    }

    fn emit_limit_offset(
        &self,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<TokenStream> {
        helpers::emit_limit_offset_required(limit, offset, "-1")
    }

    fn supports(&self, feature: Feature) -> bool {
        matches!(
            feature,
            Feature::RowConstructor
                | Feature::PartialIndexes
                | Feature::ExpressionIndexes
                | Feature::DeferrableConstraints
                | Feature::DropColumn
                | Feature::RenameColumn
        )
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_sqlite(name)
    }

    fn emit_function(&self, func: PortableFunction, args: &[TokenStream]) -> Option<TokenStream> {
        use PortableFunction::*;
        let ts = match func {
            DateTimeAddYears => helpers::seq(&[
                Part::Sql("STRFTIME("),
                Part::Sql(STRFTIME_DATETIME),
                Part::Sql(", "),
                Part::Arg(&args[0]),
                Part::Sql(", ("),
                Part::Arg(&args[1]),
                Part::Sql(") || ' years')"),
            ]),
            DateTimeAddMonths => helpers::seq(&[
                Part::Sql("STRFTIME("),
                Part::Sql(STRFTIME_DATETIME),
                Part::Sql(", "),
                Part::Arg(&args[0]),
                Part::Sql(", ("),
                Part::Arg(&args[1]),
                Part::Sql(") || ' months')"),
            ]),
            // interval is INTEGER microseconds
            DateTimeAddInterval => helpers::seq(&[
                Part::Sql("STRFTIME("),
                Part::Sql(STRFTIME_DATETIME),
                Part::Sql(", "),
                Part::Arg(&args[0]),
                Part::Sql(", (("),
                Part::Arg(&args[1]),
                Part::Sql(") / 1000000.0) || ' seconds')"),
            ]),
            DateTimeConstruct => helpers::seq(&[
                Part::Sql("PRINTF('%04d-%02d-%02d 00:00:00.000', "),
                Part::Arg(&args[0]),
                Part::Sql(", "),
                Part::Arg(&args[1]),
                Part::Sql(", "),
                Part::Arg(&args[2]),
                Part::Sql(")"),
            ]),
            DateTimeTruncate => helpers::seq(&[
                Part::Sql("STRFTIME("),
                Part::Sql(STRFTIME_DATETIME),
                Part::Sql(", "),
                Part::Arg(&args[0]),
                Part::Sql(", 'start of day')"),
            ]),
            IntervalToMilliseconds => helpers::seq(&[
                Part::Sql("(("),
                Part::Arg(&args[0]),
                Part::Sql(") / 1000)"),
            ]),
            IntervalConstruct => helpers::seq(&[
                Part::Sql("(("),
                Part::Arg(&args[0]),
                Part::Sql(") * 1000)"),
            ]),
            CurrentDate => helpers::seq(&[Part::Sql("DATE('now')")]),
            CurrentTimestamp => helpers::seq(&[
                Part::Sql("STRFTIME("),
                Part::Sql(STRFTIME_DATETIME),
                Part::Sql(", 'now')"),
            ]),
            CharLength => helpers::call("LENGTH", args),
            Substring => helpers::call("SUBSTR", args),
            Lower => helpers::call("LOWER", args),
            Upper => helpers::call("UPPER", args),
            Trim => helpers::call("TRIM", args),
            Coalesce => {
                // COALESCE needs two arguments in SQLite
                if args.len() == 1 {
                    args[0].clone()
                } else {
                    helpers::call("COALESCE", args)
                }
            }
            Abs => helpers::call("ABS", args),
            Round => helpers::call("ROUND", args),
        };
        Some(ts)
    }

    fn emit_extract(&self, part: DatePart, expr: &TokenStream) -> Option<TokenStream> {
        let format = match part {
            DatePart::Year => "'%Y'",
            DatePart::Month => "'%m'",
            DatePart::Day => "'%d'",
            DatePart::Hour => "'%H'",
            DatePart::Minute => "'%M'",
            DatePart::Second => "'%S'",
            DatePart::DayOfWeek => "'%w'",
            DatePart::DayOfYear => "'%j'",
            DatePart::Quarter | DatePart::Millisecond => return None,
        };
        Some(helpers::seq(&[
            Part::Sql("CAST(STRFTIME("),
            Part::Sql(format),
            Part::Sql(", "),
            Part::Arg(expr),
            Part::Sql(") AS INTEGER)"),
        ]))
    }

    fn emit_data_type(&self, ty: &ValueType) -> String {
        helpers::emit_data_type_sqlite(ty)
    }

    fn emit_identity(&self, _start: i64, _increment: i64) -> TokenStream {
        // rowid aliasing through INTEGER PRIMARY KEY
        TokenStream::new()
    }

    fn format_date_literal(&self, date: NaiveDate) -> String {
        format!("'{}'", helpers::date_text(date))
    }

    fn format_time_literal(&self, time: NaiveTime) -> String {
        format!("'{}'", helpers::time_text(time))
    }

    fn format_datetime_literal(&self, dt: NaiveDateTime) -> String {
        format!("'{}'", helpers::datetime_text(dt))
    }

    fn format_datetimeoffset_literal(&self, dt: &DateTime<FixedOffset>) -> String {
        format!("'{}'", helpers::datetimeoffset_text(dt))
    }
}
