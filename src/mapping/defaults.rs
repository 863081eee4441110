//! Catalog default-value text -> expression.
//!
//! Providers report column defaults as SQL text in their own spelling
//! (`(0)`, `((1))`, `'abc'::character varying`, `N'x'`, `CURRENT_TIMESTAMP`).
//! Literals and the current-time functions are recognised; anything else is
//! kept verbatim as [`Expr::Native`]. This is the one tolerant path in the
//! crate: it never fails.

use once_cell::sync::Lazy;
use regex::Regex;

use super::temporal::{parse_date, parse_datetime, parse_datetimeoffset, parse_time};
use crate::sql::dialect::Dialect;
use crate::sql::expr::{
    lit_bool, lit_bytes, lit_date, lit_datetime, lit_datetimeoffset, lit_decimal, lit_float,
    lit_int, lit_null, lit_str, lit_time, portable, Expr,
};
use crate::sql::function::PortableFunction;
use crate::sql::types::ValueType;

static PG_CAST_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"::(?:"[^"]+"|[A-Za-z_][A-Za-z0-9_ ]*)(?:\(\d+(?:,\s*\d+)?\))?(?:\[\])?$"#)
        .unwrap()
});

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());

static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?(?:\d+\.\d*|\.\d+)$").unwrap());

static HEX_BLOB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[xX]'([0-9a-fA-F]*)'|0[xX]([0-9a-fA-F]*))$").unwrap());

/// Decode a default-value text reported by `dialect` for a column of `ty`.
pub fn decode_default(dialect: Dialect, ty: &ValueType, text: &str) -> Expr {
    match decode_literal(dialect, ty, text) {
        Some(expr) => expr,
        None => {
            tracing::warn!(
                dialect = %dialect,
                column_type = %ty,
                default = text,
                "default value kept as native SQL"
            );
            Expr::Native(text.trim().to_string())
        }
    }
}

fn decode_literal(dialect: Dialect, ty: &ValueType, text: &str) -> Option<Expr> {
    let mut body = strip_outer_parens(text.trim());
    if dialect == Dialect::Postgres {
        while let Some(m) = PG_CAST_SUFFIX.find(body) {
            body = strip_outer_parens(body[..m.start()].trim_end());
        }
    }
    if body.is_empty() {
        return None;
    }

    let upper = body.to_ascii_uppercase();
    match upper.as_str() {
        "NULL" => return Some(lit_null()),
        "TRUE" => return Some(lit_bool(true)),
        "FALSE" => return Some(lit_bool(false)),
        "CURRENT_TIMESTAMP" | "NOW()" | "GETDATE()" | "SYSDATETIME()" | "LOCALTIMESTAMP" => {
            return Some(portable(PortableFunction::CurrentTimestamp, vec![]))
        }
        "CURRENT_DATE" => return Some(portable(PortableFunction::CurrentDate, vec![])),
        _ => {}
    }

    if INTEGER.is_match(body) {
        let n: i64 = body.parse().ok()?;
        return Some(match (ty, n) {
            (ValueType::Boolean, 0) => lit_bool(false),
            (ValueType::Boolean, 1) => lit_bool(true),
            (ValueType::Decimal(_, _), _) => lit_decimal(body.trim_start_matches('+')),
            _ => lit_int(n),
        });
    }

    if DECIMAL.is_match(body) {
        return match ty {
            ValueType::Decimal(_, _) => Some(lit_decimal(body.trim_start_matches('+'))),
            _ => body.parse::<f64>().ok().map(lit_float),
        };
    }

    if let Some(caps) = HEX_BLOB.captures(body) {
        let digits = caps.get(1).or_else(|| caps.get(2))?.as_str();
        return decode_hex(digits).map(|b| lit_bytes(&b));
    }

    let quoted = body
        .strip_prefix(['N', 'n'])
        .filter(|rest| rest.starts_with('\''))
        .unwrap_or(body);
    if let Some(s) = unquote(quoted) {
        return Some(typed_string(ty, s));
    }

    None
}

/// Interpret a string literal according to the column type.
fn typed_string(ty: &ValueType, s: String) -> Expr {
    let typed = match ty {
        ValueType::Date => parse_date(&s).map(lit_date),
        ValueType::Time => parse_time(&s).map(lit_time),
        ValueType::DateTime => parse_datetime(&s).map(lit_datetime),
        ValueType::DateTimeOffset => parse_datetimeoffset(&s).map(lit_datetimeoffset),
        _ => None,
    };
    typed.unwrap_or_else(|| lit_str(&s))
}

/// Remove balanced parentheses wrapping the whole text: `((0))` -> `0`.
pub(crate) fn strip_outer_parens(mut text: &str) -> &str {
    while text.starts_with('(') && text.ends_with(')') && wraps_whole(text) {
        text = text[1..text.len() - 1].trim();
    }
    text
}

fn wraps_whole(text: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let last = text.len() - 1;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 && i != last {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// `'it''s'` -> `it's`. `None` unless the text is exactly one literal.
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            // a lone quote ends the literal early: not a single literal
            if chars.next() != Some('\'') {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

fn decode_hex(digits: &str) -> Option<Vec<u8>> {
    if digits.len() % 2 != 0 {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn decode(dialect: Dialect, ty: ValueType, text: &str) -> Expr {
        decode_default(dialect, &ty, text)
    }

    #[test]
    fn test_nested_parens() {
        assert_eq!(decode(Dialect::SqlServer, ValueType::Int32, "((0))"), lit_int(0));
        assert_eq!(decode(Dialect::SqlServer, ValueType::Boolean, "((1))"), lit_bool(true));
        assert_eq!(decode(Dialect::Sqlite, ValueType::Double, "(-1.5)"), lit_float(-1.5));
    }

    #[test]
    fn test_postgres_casts() {
        assert_eq!(
            decode(Dialect::Postgres, ValueType::VarChar(crate::sql::types::Length::Fixed(10)), "'abc'::character varying"),
            lit_str("abc")
        );
        assert_eq!(
            decode(Dialect::Postgres, ValueType::Decimal(10, 2), "(0)::numeric(10,2)"),
            lit_decimal("0")
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(decode(Dialect::SqlServer, ValueType::Text, "(N'it''s')"), lit_str("it's"));
        assert_eq!(
            decode(Dialect::Sqlite, ValueType::Date, "'2024-02-29'"),
            lit_date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        // not a single literal
        assert!(matches!(
            decode(Dialect::Sqlite, ValueType::Text, "'a' || 'b'"),
            Expr::Native(_)
        ));
    }

    #[test]
    fn test_current_time_functions() {
        assert_eq!(
            decode(Dialect::Sqlite, ValueType::DateTime, "CURRENT_TIMESTAMP"),
            portable(PortableFunction::CurrentTimestamp, vec![])
        );
        assert_eq!(
            decode(Dialect::SqlServer, ValueType::DateTime, "(getdate())"),
            portable(PortableFunction::CurrentTimestamp, vec![])
        );
    }

    #[test]
    fn test_blobs() {
        assert_eq!(decode(Dialect::Sqlite, ValueType::VarBinary(crate::sql::types::Length::Max), "X'0aff'"), lit_bytes(&[0x0a, 0xff]));
        assert_eq!(decode(Dialect::SqlServer, ValueType::Binary(2), "(0x0102)"), lit_bytes(&[1, 2]));
    }

    #[test]
    fn test_unparsable_degrades_to_native() {
        assert_eq!(
            decode(Dialect::Postgres, ValueType::Int64, "nextval('orders_id_seq'::regclass)"),
            Expr::Native("nextval('orders_id_seq'::regclass)".into())
        );
        assert_eq!(
            decode(Dialect::Sqlite, ValueType::Text, "  lower(hex(randomblob(16)))  "),
            Expr::Native("lower(hex(randomblob(16)))".into())
        );
    }

    #[test]
    fn test_strip_outer_parens() {
        assert_eq!(strip_outer_parens("((a))"), "a");
        assert_eq!(strip_outer_parens("(a) + (b)"), "(a) + (b)");
        assert_eq!(strip_outer_parens("('(')"), "'('");
    }
}
