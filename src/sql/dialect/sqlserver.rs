//! SQL Server (T-SQL) dialect.
//!
//! T-SQL has significant differences from ANSI:
//! - Square bracket identifier quoting (`[name]`)
//! - `@pN` named placeholders
//! - No native boolean in expressions (BIT 1/0)
//! - OFFSET FETCH for pagination (requires ORDER BY)
//! - N'...' prefix for Unicode strings
//! - String concatenation with `+`
//! - DATEPART/DATEADD instead of EXTRACT and interval arithmetic
//! - No interval type: durations are BIGINT microseconds

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use super::helpers::{self, Part};
use super::{Feature, SqlDialect};
use crate::error::Result;
use crate::sql::function::{DatePart, PortableFunction};
use crate::sql::token::TokenStream;
use crate::sql::types::ValueType;

/// SQL Server dialect.
#[derive(Debug, Clone, Copy)]
pub struct SqlServer;

impl SqlDialect for SqlServer {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        // N prefix only where it matters
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn placeholder(&self, ordinal: usize) -> String {
        format!("@p{}", ordinal)
    }

    fn emit_limit_offset(
        &self,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<TokenStream> {
        helpers::emit_limit_offset_tsql(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn concat_operator(&self) -> &'static str {
        "+"
    }

    fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::Cursors | Feature::ScrollCursors | Feature::CursorOpen => true,
            Feature::UniquePredicate | Feature::MatchPredicate => false,
            Feature::QuantifiedComparison => true,
            Feature::RowConstructor => false,
            Feature::BitwiseXor => true,
            Feature::IntersectAll | Feature::ExceptAll => false,
            Feature::Sequences | Feature::Schemas => true,
            Feature::PartialIndexes => true,
            Feature::ExpressionIndexes => false,
            Feature::FillFactor => true,
            Feature::IndexMethod => false,
            Feature::DeferrableConstraints => false,
            Feature::ForeignKeyMatch | Feature::ForeignKeyMatchPartial => false,
            Feature::AlterColumnDefault
            | Feature::AddConstraint
            | Feature::DropConstraint
            | Feature::DropColumn
            | Feature::RenameColumn => true,
            Feature::MultiActionAlter => false,
            Feature::Truncate => true,
            Feature::HashPartitioning => false,
            Feature::SchemePartitioning => true,
            Feature::InfinityLiterals => false,
        }
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_sqlserver(name)
    }

    fn emit_function(&self, func: PortableFunction, args: &[TokenStream]) -> Option<TokenStream> {
        use PortableFunction::*;
        let ts = match func {
            DateTimeAddYears => helpers::seq(&[
                Part::Sql("DATEADD(year, "),
                Part::Arg(&args[1]),
                Part::Sql(", "),
                Part::Arg(&args[0]),
                Part::Sql(")"),
            ]),
            DateTimeAddMonths => helpers::seq(&[
                Part::Sql("DATEADD(month, "),
                Part::Arg(&args[1]),
                Part::Sql(", "),
                Part::Arg(&args[0]),
                Part::Sql(")"),
            ]),
            // interval is BIGINT microseconds; DATEADD takes an INT, so add
            // whole seconds then the remainder
            DateTimeAddInterval => helpers::seq(&[
                Part::Sql("DATEADD(microsecond, ("),
                Part::Arg(&args[1]),
                Part::Sql(") % 1000000, DATEADD(second, ("),
                Part::Arg(&args[1]),
                Part::Sql(") / 1000000, "),
                Part::Arg(&args[0]),
                Part::Sql("))"),
            ]),
            DateTimeConstruct => helpers::seq(&[
                Part::Sql("DATETIME2FROMPARTS("),
                Part::Arg(&args[0]),
                Part::Sql(", "),
                Part::Arg(&args[1]),
                Part::Sql(", "),
                Part::Arg(&args[2]),
                Part::Sql(", 0, 0, 0, 0, 7)"),
            ]),
            DateTimeTruncate => helpers::seq(&[
                Part::Sql("CAST(CAST("),
                Part::Arg(&args[0]),
                Part::Sql(" AS DATE) AS DATETIME2)"),
            ]),
            IntervalToMilliseconds => helpers::seq(&[
                Part::Sql("(("),
                Part::Arg(&args[0]),
                Part::Sql(") / 1000)"),
            ]),
            IntervalConstruct => helpers::seq(&[
                Part::Sql("(CAST("),
                Part::Arg(&args[0]),
                Part::Sql(" AS BIGINT) * 1000)"),
            ]),
            CurrentDate => helpers::seq(&[Part::Sql("CAST(SYSDATETIME() AS DATE)")]),
            CurrentTimestamp => helpers::seq(&[Part::Sql("SYSDATETIME()")]),
            CharLength => helpers::call("LEN", args),
            Substring => {
                if args.len() == 2 {
                    // SUBSTRING requires a length
                    let mut full = args.to_vec();
                    full.push(helpers::call("LEN", &args[..1]));
                    helpers::call("SUBSTRING", &full)
                } else {
                    helpers::call("SUBSTRING", args)
                }
            }
            Lower => helpers::call("LOWER", args),
            Upper => helpers::call("UPPER", args),
            Trim => {
                let inner = helpers::call("RTRIM", args);
                helpers::call("LTRIM", &[inner])
            }
            Coalesce => helpers::call("COALESCE", args),
            Abs => helpers::call("ABS", args),
            Round => {
                if args.len() == 1 {
                    let mut full = args.to_vec();
                    full.push(helpers::seq(&[Part::Sql("0")]));
                    helpers::call("ROUND", &full)
                } else {
                    helpers::call("ROUND", args)
                }
            }
        };
        Some(ts)
    }

    fn emit_extract(&self, part: DatePart, expr: &TokenStream) -> Option<TokenStream> {
        let name = match part {
            DatePart::Year => "year",
            DatePart::Quarter => "quarter",
            DatePart::Month => "month",
            DatePart::Day => "day",
            DatePart::Hour => "hour",
            DatePart::Minute => "minute",
            DatePart::Second => "second",
            DatePart::Millisecond => "millisecond",
            DatePart::DayOfYear => "dayofyear",
            // DATEPART(weekday) depends on DATEFIRST; normalize to 0 = Sunday
            DatePart::DayOfWeek => {
                return Some(helpers::seq(&[
                    Part::Sql("((DATEPART(weekday, "),
                    Part::Arg(expr),
                    Part::Sql(") + @@DATEFIRST - 1) % 7)"),
                ]))
            }
        };
        Some(helpers::seq(&[
            Part::Sql("DATEPART("),
            Part::Sql(name),
            Part::Sql(", "),
            Part::Arg(expr),
            Part::Sql(")"),
        ]))
    }

    fn emit_data_type(&self, ty: &ValueType) -> String {
        helpers::emit_data_type_sqlserver(ty)
    }

    fn emit_identity(&self, start: i64, increment: i64) -> TokenStream {
        helpers::emit_identity_sqlserver(start, increment)
    }

    fn format_date_literal(&self, date: NaiveDate) -> String {
        format!("CAST('{}' AS DATE)", helpers::date_text(date))
    }

    fn format_time_literal(&self, time: NaiveTime) -> String {
        format!("CAST('{}' AS TIME)", helpers::time_text(time))
    }

    fn format_datetime_literal(&self, dt: NaiveDateTime) -> String {
        format!("CAST('{}' AS DATETIME2)", helpers::datetime_text(dt))
    }

    fn format_datetimeoffset_literal(&self, dt: &DateTime<FixedOffset>) -> String {
        format!(
            "CAST('{}' AS DATETIMEOFFSET)",
            helpers::datetimeoffset_text(dt)
        )
    }

    fn format_bytes_literal(&self, bytes: &[u8]) -> String {
        format!("0x{}", helpers::hex(bytes))
    }

    fn format_guid_literal(&self, guid: &uuid::Uuid) -> String {
        format!("CAST('{}' AS UNIQUEIDENTIFIER)", guid.hyphenated())
    }
}
