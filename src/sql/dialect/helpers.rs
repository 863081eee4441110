//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use super::super::token::{Token, TokenStream};
use crate::error::{Error, Result};
use crate::sql::types::{Length, ValueType};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, SQLite, ANSI
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote identifier with square brackets.
/// Used by: SQL Server
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with N prefix for Unicode (SQL Server).
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

/// Quote string for MySQL, which treats backslash as an escape character
/// under the default SQL mode.
pub fn quote_string_backslash(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as literal true/false.
/// Used by: Postgres
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format boolean as numeric 1/0.
/// Used by: SQL Server, MySQL, SQLite
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Row counts travel as signed integers. A count above `i64::MAX` would
/// wrap negative, which SQLite reads as "no limit".
fn row_count(n: u64, clause: &str) -> Result<i64> {
    i64::try_from(n).map_err(|_| Error::out_of_range(n, clause))
}

/// Emit LIMIT ... OFFSET ... (standard SQL).
/// Used by: Postgres
pub fn emit_limit_offset_standard(
    limit: Option<u64>,
    offset: Option<u64>,
) -> Result<TokenStream> {
    let mut ts = TokenStream::new();

    if let Some(lim) = limit {
        ts.push(Token::Limit)
            .space()
            .push(Token::LitInt(row_count(lim, "LIMIT")?));
    }

    if let Some(off) = offset {
        if limit.is_some() {
            ts.space();
        }
        ts.push(Token::Offset)
            .space()
            .push(Token::LitInt(row_count(off, "OFFSET")?));
    }

    Ok(ts)
}

/// Emit LIMIT ... OFFSET ... where OFFSET is only legal after a LIMIT.
/// `unbounded` is the dialect's spelling of "no limit".
/// Used by: MySQL (`18446744073709551615`), SQLite (`-1`)
pub fn emit_limit_offset_required(
    limit: Option<u64>,
    offset: Option<u64>,
    unbounded: &str,
) -> Result<TokenStream> {
    let mut ts = TokenStream::new();

    match (limit, offset) {
        (Some(lim), _) => {
            ts.push(Token::Limit)
                .space()
                .push(Token::LitInt(row_count(lim, "LIMIT")?));
        }
        (None, Some(_)) => {
            ts.push(Token::Limit).space().raw(unbounded);
        }
        (None, None) => return Ok(ts),
    }

    if let Some(off) = offset {
        ts.space()
            .push(Token::Offset)
            .space()
            .push(Token::LitInt(row_count(off, "OFFSET")?));
    }

    Ok(ts)
}

/// Emit OFFSET ... ROWS FETCH NEXT ... ROWS ONLY (SQL Server style).
/// Note: Requires ORDER BY clause in SQL Server
pub fn emit_limit_offset_tsql(
    limit: Option<u64>,
    offset: Option<u64>,
) -> Result<TokenStream> {
    let mut ts = TokenStream::new();

    let off = offset.unwrap_or(0);
    ts.push(Token::Offset)
        .space()
        .push(Token::LitInt(row_count(off, "OFFSET")?))
        .space()
        .push(Token::Rows);

    if let Some(lim) = limit {
        ts.space()
            .push(Token::Fetch)
            .space()
            .push(Token::Next)
            .space()
            .push(Token::LitInt(row_count(lim, "LIMIT")?))
            .space()
            .push(Token::Rows)
            .space()
            .push(Token::Only);
    }

    Ok(ts)
}

/// Emit OFFSET ... ROWS FETCH FIRST ... ROWS ONLY (SQL:2008).
pub fn emit_limit_offset_fetch_first(
    limit: Option<u64>,
    offset: Option<u64>,
) -> Result<TokenStream> {
    let mut ts = TokenStream::new();

    if let Some(off) = offset {
        ts.push(Token::Offset)
            .space()
            .push(Token::LitInt(row_count(off, "OFFSET")?))
            .space()
            .push(Token::Rows);
    }

    if let Some(lim) = limit {
        if offset.is_some() {
            ts.space();
        }
        ts.push(Token::Fetch)
            .space()
            .push(Token::First)
            .space()
            .push(Token::LitInt(row_count(lim, "LIMIT")?))
            .space()
            .push(Token::Rows)
            .space()
            .push(Token::Only);
    }

    Ok(ts)
}

// =============================================================================
// Function Remapping
// =============================================================================

/// Remap functions for Postgres dialect.
pub fn remap_function_postgres(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "NVL" => Some("COALESCE"),
        "IFNULL" => Some("COALESCE"),
        "ISNULL" => Some("COALESCE"),
        "LEN" => Some("LENGTH"),
        "GETDATE" => Some("NOW"),
        _ => None,
    }
}

/// Remap functions for MySQL dialect.
pub fn remap_function_mysql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "NVL" => Some("IFNULL"),
        "ISNULL" => Some("IFNULL"),
        "SUBSTR" => Some("SUBSTRING"),
        "LEN" => Some("CHAR_LENGTH"),
        "GETDATE" => Some("NOW"),
        _ => None,
    }
}

/// Remap functions for SQL Server dialect.
pub fn remap_function_sqlserver(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LENGTH" => Some("LEN"),
        "CHAR_LENGTH" => Some("LEN"),
        "SUBSTR" => Some("SUBSTRING"),
        "NOW" => Some("SYSDATETIME"),
        "NVL" => Some("ISNULL"),
        "IFNULL" => Some("ISNULL"),
        _ => None,
    }
}

/// Remap functions for SQLite dialect.
pub fn remap_function_sqlite(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "SUBSTRING" => Some("SUBSTR"),
        "LEN" => Some("LENGTH"),
        "CHAR_LENGTH" => Some("LENGTH"),
        "NVL" => Some("IFNULL"),
        "ISNULL" => Some("IFNULL"),
        _ => None,
    }
}

// =============================================================================
// Function Emission
// =============================================================================

/// `NAME(arg, arg, ...)`
pub fn call(name: &str, args: &[TokenStream]) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.raw(name).parenthesized(args.iter());
    ts
}

/// `(tokens)`
pub fn paren(inner: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.lparen().append(inner).rparen();
    ts
}

/// Concatenate raw fragments and token streams in order.
pub fn seq(parts: &[Part<'_>]) -> TokenStream {
    let mut ts = TokenStream::new();
    for part in parts {
        match part {
            Part::Sql(s) => {
                ts.raw(*s);
            }
            Part::Arg(a) => {
                ts.append(a);
            }
        }
    }
    ts
}

/// A piece of an emitted function template.
pub enum Part<'a> {
    Sql(&'a str),
    Arg(&'a TokenStream),
}

// =============================================================================
// Data Type Emission
// =============================================================================

/// Emit data type for ANSI SQL.
pub fn emit_data_type_ansi(ty: &ValueType) -> String {
    match ty {
        ValueType::Boolean => "BOOLEAN".into(),
        ValueType::Int8 | ValueType::Int16 => "SMALLINT".into(),
        ValueType::Int32 => "INTEGER".into(),
        ValueType::Int64 => "BIGINT".into(),
        ValueType::Decimal(precision, scale) => format!("NUMERIC({}, {})", precision, scale),
        ValueType::Float => "REAL".into(),
        ValueType::Double => "DOUBLE PRECISION".into(),
        ValueType::Char(n) => format!("CHAR({})", n),
        ValueType::VarChar(Length::Fixed(n)) => format!("VARCHAR({})", n),
        ValueType::VarChar(Length::Max) | ValueType::Text | ValueType::Json => {
            "CHARACTER LARGE OBJECT".into()
        }
        ValueType::Binary(n) => format!("BINARY({})", n),
        ValueType::VarBinary(Length::Fixed(n)) => format!("VARBINARY({})", n),
        ValueType::VarBinary(Length::Max) => "BINARY LARGE OBJECT".into(),
        ValueType::DateTime => "TIMESTAMP".into(),
        ValueType::DateTimeOffset => "TIMESTAMP WITH TIME ZONE".into(),
        ValueType::Date => "DATE".into(),
        ValueType::Time => "TIME".into(),
        ValueType::Interval => "BIGINT".into(),
        ValueType::Guid => "CHAR(36)".into(),
    }
}

/// Emit data type for Postgres.
pub fn emit_data_type_postgres(ty: &ValueType) -> String {
    match ty {
        ValueType::Boolean => "BOOLEAN".into(),
        ValueType::Int8 | ValueType::Int16 => "SMALLINT".into(),
        ValueType::Int32 => "INTEGER".into(),
        ValueType::Int64 => "BIGINT".into(),
        ValueType::Decimal(precision, scale) => format!("NUMERIC({}, {})", precision, scale),
        ValueType::Float => "REAL".into(),
        ValueType::Double => "DOUBLE PRECISION".into(),
        ValueType::Char(n) => format!("CHAR({})", n),
        ValueType::VarChar(Length::Fixed(n)) => format!("VARCHAR({})", n),
        ValueType::VarChar(Length::Max) => "VARCHAR".into(),
        ValueType::Text => "TEXT".into(),
        // no fixed-width binary type
        ValueType::Binary(_) | ValueType::VarBinary(_) => "BYTEA".into(),
        ValueType::DateTime => "TIMESTAMP".into(),
        ValueType::DateTimeOffset => "TIMESTAMPTZ".into(),
        ValueType::Date => "DATE".into(),
        ValueType::Time => "TIME".into(),
        ValueType::Interval => "INTERVAL".into(),
        ValueType::Guid => "UUID".into(),
        ValueType::Json => "JSONB".into(),
    }
}

/// Emit data type for SQL Server.
pub fn emit_data_type_sqlserver(ty: &ValueType) -> String {
    match ty {
        ValueType::Boolean => "BIT".into(),
        ValueType::Int8 => "TINYINT".into(),
        ValueType::Int16 => "SMALLINT".into(),
        ValueType::Int32 => "INT".into(),
        ValueType::Int64 => "BIGINT".into(),
        ValueType::Decimal(precision, scale) => format!("DECIMAL({}, {})", precision, scale),
        ValueType::Float => "REAL".into(),
        ValueType::Double => "FLOAT".into(),
        ValueType::Char(n) => format!("NCHAR({})", n),
        ValueType::VarChar(len) => format!("NVARCHAR({})", len),
        ValueType::Text | ValueType::Json => "NVARCHAR(MAX)".into(),
        ValueType::Binary(n) => format!("BINARY({})", n),
        ValueType::VarBinary(len) => format!("VARBINARY({})", len),
        ValueType::DateTime => "DATETIME2".into(),
        ValueType::DateTimeOffset => "DATETIMEOFFSET".into(),
        ValueType::Date => "DATE".into(),
        ValueType::Time => "TIME".into(),
        // microseconds
        ValueType::Interval => "BIGINT".into(),
        ValueType::Guid => "UNIQUEIDENTIFIER".into(),
    }
}

/// Emit data type for MySQL.
pub fn emit_data_type_mysql(ty: &ValueType) -> String {
    match ty {
        ValueType::Boolean => "TINYINT(1)".into(),
        ValueType::Int8 => "TINYINT".into(),
        ValueType::Int16 => "SMALLINT".into(),
        ValueType::Int32 => "INT".into(),
        ValueType::Int64 => "BIGINT".into(),
        ValueType::Decimal(precision, scale) => format!("DECIMAL({}, {})", precision, scale),
        ValueType::Float => "FLOAT".into(),
        ValueType::Double => "DOUBLE".into(),
        ValueType::Char(n) => format!("CHAR({})", n),
        ValueType::VarChar(Length::Fixed(n)) => format!("VARCHAR({})", n),
        ValueType::VarChar(Length::Max) | ValueType::Text => "LONGTEXT".into(),
        ValueType::Binary(n) => format!("BINARY({})", n),
        ValueType::VarBinary(Length::Fixed(n)) => format!("VARBINARY({})", n),
        ValueType::VarBinary(Length::Max) => "LONGBLOB".into(),
        ValueType::DateTime => "DATETIME(6)".into(),
        // no offset-carrying type; stored as UTC
        ValueType::DateTimeOffset => "DATETIME(6)".into(),
        ValueType::Date => "DATE".into(),
        ValueType::Time => "TIME(6)".into(),
        ValueType::Interval => "BIGINT".into(),
        ValueType::Guid => "CHAR(36)".into(),
        ValueType::Json => "JSON".into(),
    }
}

/// Emit data type for SQLite.
///
/// SQLite keeps the declared type text verbatim, so every spelling here
/// parses back to the same `ValueType` through `ValueType::parse`.
pub fn emit_data_type_sqlite(ty: &ValueType) -> String {
    match ty {
        ValueType::Boolean => "BOOLEAN".into(),
        ValueType::Int8 => "TINYINT".into(),
        ValueType::Int16 => "SMALLINT".into(),
        ValueType::Int32 => "INTEGER".into(),
        ValueType::Int64 => "BIGINT".into(),
        ValueType::Decimal(precision, scale) => format!("NUMERIC({}, {})", precision, scale),
        ValueType::Float => "REAL".into(),
        ValueType::Double => "DOUBLE".into(),
        ValueType::Char(n) => format!("CHAR({})", n),
        ValueType::VarChar(Length::Fixed(n)) => format!("VARCHAR({})", n),
        ValueType::VarChar(Length::Max) => "NVARCHAR".into(),
        ValueType::Text => "TEXT".into(),
        ValueType::Binary(n) => format!("BINARY({})", n),
        ValueType::VarBinary(Length::Fixed(n)) => format!("VARBINARY({})", n),
        ValueType::VarBinary(Length::Max) => "BLOB".into(),
        ValueType::DateTime => "DATETIME".into(),
        ValueType::DateTimeOffset => "DATETIMEOFFSET".into(),
        ValueType::Date => "DATE".into(),
        ValueType::Time => "TIME".into(),
        ValueType::Interval => "INTERVAL".into(),
        ValueType::Guid => "UUID".into(),
        ValueType::Json => "JSON".into(),
    }
}

// =============================================================================
// Identity / Auto-Increment
// =============================================================================

/// Emit identity for Postgres and ANSI (GENERATED BY DEFAULT AS IDENTITY).
pub fn emit_identity_standard(start: i64, increment: i64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Raw(format!(
        "GENERATED BY DEFAULT AS IDENTITY (START WITH {} INCREMENT BY {})",
        start, increment
    )));
    ts
}

/// Emit identity for SQL Server (IDENTITY(start, increment)).
pub fn emit_identity_sqlserver(start: i64, increment: i64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Raw(format!("IDENTITY({}, {})", start, increment)));
    ts
}

/// Emit identity for MySQL (AUTO_INCREMENT).
pub fn emit_identity_mysql(_start: i64, _increment: i64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Raw("AUTO_INCREMENT".into()));
    ts
}

// =============================================================================
// Temporal Literals
// =============================================================================

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S%.6f";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
pub const DATETIME_OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";

pub fn date_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn time_text(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn datetime_text(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub fn datetimeoffset_text(dt: &DateTime<FixedOffset>) -> String {
    dt.format(DATETIME_OFFSET_FORMAT).to_string()
}

/// Lowercase hex encoding.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::Dialect;

    #[test]
    fn test_limit_offset_required() {
        let ts = emit_limit_offset_required(None, Some(5), "-1").unwrap();
        assert_eq!(ts.serialize(Dialect::Sqlite), "LIMIT -1 OFFSET 5");
        let ts = emit_limit_offset_required(Some(10), None, "-1").unwrap();
        assert_eq!(ts.serialize(Dialect::Sqlite), "LIMIT 10");
        assert!(emit_limit_offset_required(None, None, "-1")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_row_counts_beyond_i64_are_rejected() {
        let err = emit_limit_offset_required(Some(u64::MAX), None, "-1").unwrap_err();
        assert!(matches!(err, Error::ValueOutOfRange { .. }));
        let err = emit_limit_offset_standard(None, Some(i64::MAX as u64 + 1)).unwrap_err();
        assert!(matches!(err, Error::ValueOutOfRange { .. }));
        assert!(emit_limit_offset_tsql(Some(u64::MAX), Some(0)).is_err());
        assert!(emit_limit_offset_fetch_first(Some(u64::MAX), None).is_err());

        let ts = emit_limit_offset_standard(Some(i64::MAX as u64), None).unwrap();
        assert_eq!(
            ts.serialize(Dialect::Postgres),
            format!("LIMIT {}", i64::MAX)
        );
    }

    #[test]
    fn test_sqlite_types_parse_back() {
        let types = [
            ValueType::Boolean,
            ValueType::Int8,
            ValueType::Int16,
            ValueType::Int32,
            ValueType::Int64,
            ValueType::Decimal(10, 2),
            ValueType::Float,
            ValueType::Double,
            ValueType::Char(3),
            ValueType::VarChar(Length::Fixed(40)),
            ValueType::VarChar(Length::Max),
            ValueType::Text,
            ValueType::Binary(16),
            ValueType::VarBinary(Length::Fixed(8)),
            ValueType::VarBinary(Length::Max),
            ValueType::DateTime,
            ValueType::DateTimeOffset,
            ValueType::Date,
            ValueType::Time,
            ValueType::Interval,
            ValueType::Guid,
            ValueType::Json,
        ];
        for ty in types {
            let spelled = emit_data_type_sqlite(&ty);
            assert_eq!(ValueType::parse(&spelled), Some(ty), "{}", spelled);
        }
    }

    #[test]
    fn test_temporal_text() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_micro_opt(10, 5, 0, 120)
            .unwrap();
        assert_eq!(datetime_text(dt), "2024-03-01 10:05:00.000120");
        assert_eq!(hex(&[0x01, 0xab]), "01ab");
    }
}
