//! ANSI SQL dialect - base reference implementation.
//!
//! This provides the ANSI SQL standard behavior as a reference. It is the
//! only dialect that renders the `UNIQUE` and `MATCH` predicates, and it is
//! the default comparison dialect for expression equality.

use super::helpers;
use super::{Feature, SqlDialect};
use crate::sql::function::{DatePart, PortableFunction};
use crate::sql::token::TokenStream;

/// ANSI SQL dialect (reference implementation).
#[derive(Debug, Clone, Copy)]
pub struct Ansi;

impl SqlDialect for Ansi {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        if b {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    fn placeholder(&self, _ordinal: usize) -> String {
        "?".into()
    }

    fn supports(&self, feature: Feature) -> bool {
        !matches!(
            feature,
            Feature::BitwiseXor
                | Feature::PartialIndexes
                | Feature::ExpressionIndexes
                | Feature::FillFactor
                | Feature::IndexMethod
                | Feature::MultiActionAlter
                | Feature::HashPartitioning
                | Feature::SchemePartitioning
                | Feature::InfinityLiterals
        )
    }

    fn emit_function(&self, func: PortableFunction, args: &[TokenStream]) -> Option<TokenStream> {
        use PortableFunction::*;
        let ts = match func {
            CurrentDate => helpers::seq(&[helpers::Part::Sql("CURRENT_DATE")]),
            CurrentTimestamp => helpers::seq(&[helpers::Part::Sql("LOCALTIMESTAMP")]),
            CharLength => helpers::call("CHAR_LENGTH", args),
            Lower => helpers::call("LOWER", args),
            Upper => helpers::call("UPPER", args),
            Trim => helpers::call("TRIM", args),
            Coalesce => helpers::call("COALESCE", args),
            Abs => helpers::call("ABS", args),
            Substring => {
                let mut ts = TokenStream::new();
                ts.raw("SUBSTRING(")
                    .append(&args[0])
                    .raw(" FROM ")
                    .append(&args[1]);
                if let Some(len) = args.get(2) {
                    ts.raw(" FOR ").append(len);
                }
                ts.rparen();
                ts
            }
            // no standard spelling
            DateTimeAddYears | DateTimeAddMonths | DateTimeAddInterval | DateTimeConstruct
            | DateTimeTruncate | IntervalToMilliseconds | IntervalConstruct | Round => {
                return None
            }
        };
        Some(ts)
    }

    fn emit_extract(&self, part: DatePart, expr: &TokenStream) -> Option<TokenStream> {
        match part {
            DatePart::Year
            | DatePart::Month
            | DatePart::Day
            | DatePart::Hour
            | DatePart::Minute
            | DatePart::Second => Some(helpers::seq(&[
                helpers::Part::Sql("EXTRACT("),
                helpers::Part::Sql(part.extract_keyword()),
                helpers::Part::Sql(" FROM "),
                helpers::Part::Arg(expr),
                helpers::Part::Sql(")"),
            ])),
            _ => None,
        }
    }
}
