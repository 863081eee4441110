//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each dialect implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting: `"` (ANSI/PG/SQLite), `` ` `` (MySQL), `[]` (SQL Server)
//! - Placeholders: `$n`, `@pn`, `?`, `?n`
//! - Pagination: LIMIT/OFFSET vs OFFSET FETCH
//! - Boolean literals: true/false vs 1/0
//! - String concatenation: `||` vs `+` vs CONCAT()
//! - Date parts, interval literals, portable functions
//!
//! # Usage
//!
//! ```ignore
//! use lattice::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("user");  // "user"
//! ```
//!
//! # Capability Matrix
//!
//! | Feature | PostgreSQL | SQL Server | MySQL | SQLite | ANSI |
//! |---------|-----------|------------|-------|--------|------|
//! | Cursors | ✓ (no OPEN) | ✓ | ❌ | ❌ | ✓ |
//! | UNIQUE / MATCH predicate | ❌ | ❌ | ❌ | ❌ | ✓ |
//! | Quantified comparison | ✓ | ✓ | ✓ | ❌ | ✓ |
//! | Row constructor | ✓ | ❌ | ✓ | ✓ | ✓ |
//! | INTERSECT/EXCEPT ALL | ✓ | ❌ | ✓ | ❌ | ✓ |
//! | Sequences | ✓ | ✓ | ❌ | ❌ | ✓ |
//! | Partial indexes | ✓ | ✓ | ❌ | ✓ | ❌ |
//! | Expression indexes | ✓ | ❌ | ✓ | ✓ | ❌ |
//! | Deferrable constraints | ✓ | ❌ | ❌ | ✓ | ✓ |
//! | ALTER ... ADD/DROP CONSTRAINT | ✓ | ✓ | ✓ | ❌ | ✓ |
//! | Infinity literals | ✓ | ❌ | ❌ | ❌ | ❌ |
//!
//! Legend: ✓ = supported, ❌ = not supported
//!
//! The compiler asks `supports(Feature)` (or `require(Feature)`) before
//! rendering any of these; a miss is reported as `UnsupportedFeature`.

mod ansi;
pub mod helpers;
mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

pub use ansi::Ansi;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use sqlserver::SqlServer;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::function::{DatePart, PortableFunction};
use super::token::TokenStream;
use super::types::ValueType;
use crate::error::{Error, Result};
use crate::mapping::NativeInterval;

/// Constructs whose availability differs between dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Cursors,
    ScrollCursors,
    /// Explicit `OPEN`; Postgres opens a cursor at `DECLARE`.
    CursorOpen,
    UniquePredicate,
    MatchPredicate,
    QuantifiedComparison,
    RowConstructor,
    BitwiseXor,
    IntersectAll,
    ExceptAll,
    Sequences,
    Schemas,
    PartialIndexes,
    ExpressionIndexes,
    FillFactor,
    IndexMethod,
    DeferrableConstraints,
    ForeignKeyMatch,
    ForeignKeyMatchPartial,
    AlterColumnDefault,
    AddConstraint,
    DropConstraint,
    DropColumn,
    RenameColumn,
    /// Several actions in one `ALTER TABLE`.
    MultiActionAlter,
    Truncate,
    HashPartitioning,
    /// Partition functions and schemes mapped to filegroups.
    SchemePartitioning,
    InfinityLiterals,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Feature::Cursors => "cursors",
            Feature::ScrollCursors => "scrollable cursors",
            Feature::CursorOpen => "OPEN cursor",
            Feature::UniquePredicate => "UNIQUE predicate",
            Feature::MatchPredicate => "MATCH predicate",
            Feature::QuantifiedComparison => "quantified comparison (ALL/ANY/SOME)",
            Feature::RowConstructor => "row constructor",
            Feature::BitwiseXor => "bitwise XOR",
            Feature::IntersectAll => "INTERSECT ALL",
            Feature::ExceptAll => "EXCEPT ALL",
            Feature::Sequences => "sequences",
            Feature::Schemas => "schemas",
            Feature::PartialIndexes => "partial indexes",
            Feature::ExpressionIndexes => "expression indexes",
            Feature::FillFactor => "index fill factor",
            Feature::IndexMethod => "index method",
            Feature::DeferrableConstraints => "deferrable constraints",
            Feature::ForeignKeyMatch => "foreign key MATCH",
            Feature::ForeignKeyMatchPartial => "foreign key MATCH PARTIAL",
            Feature::AlterColumnDefault => "ALTER COLUMN default",
            Feature::AddConstraint => "ADD CONSTRAINT",
            Feature::DropConstraint => "DROP CONSTRAINT",
            Feature::DropColumn => "DROP COLUMN",
            Feature::RenameColumn => "RENAME COLUMN",
            Feature::MultiActionAlter => "multi-action ALTER TABLE",
            Feature::Truncate => "TRUNCATE",
            Feature::HashPartitioning => "hash partitioning",
            Feature::SchemePartitioning => "partition schemes",
            Feature::InfinityLiterals => "infinity literals",
        };
        f.write_str(s)
    }
}

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: fmt::Debug + Send + Sync {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    ///
    /// - ANSI/PostgreSQL/SQLite: `"identifier"`
    /// - MySQL: `` `identifier` ``
    /// - SQL Server: `[identifier]`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// Single quotes with `''` for escaping.
    /// Override for Unicode prefix (SQL Server N'...').
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    ///
    /// - PostgreSQL: `true`/`false`
    /// - MySQL/SQL Server/SQLite: `1`/`0`
    fn format_bool(&self, b: bool) -> &'static str;

    /// Placeholder for the parameter at `ordinal` (1-based).
    fn placeholder(&self, ordinal: usize) -> String;

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Emit LIMIT/OFFSET or equivalent pagination clause.
    fn emit_limit_offset(
        &self,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<TokenStream> {
        helpers::emit_limit_offset_fetch_first(limit, offset)
    }

    /// Whether this dialect requires ORDER BY for OFFSET/LIMIT.
    ///
    /// SQL Server requires ORDER BY when using OFFSET FETCH.
    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// String concatenation operator.
    ///
    /// - ANSI/PostgreSQL/SQLite: `||`
    /// - SQL Server: `+`
    fn concat_operator(&self) -> &'static str {
        "||"
    }

    /// Whether this dialect supports a concat operator at all.
    ///
    /// MySQL uses `||` as logical OR by default; concatenation goes
    /// through `CONCAT()`.
    fn supports_concat_operator(&self) -> bool {
        true
    }

    /// Bitwise XOR operator.
    fn bitwise_xor_operator(&self) -> &'static str {
        "^"
    }

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// Whether this dialect can render `feature`.
    fn supports(&self, feature: Feature) -> bool;

    /// Fail with `UnsupportedFeature` when `feature` is unavailable.
    fn require(&self, feature: Feature) -> Result<()> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(Error::unsupported(feature.to_string(), self.name()))
        }
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Remap a native function name for this dialect.
    ///
    /// Returns `Some(new_name)` if the function should be remapped, `None` to
    /// keep the original. The input is matched case-insensitively.
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }

    /// Translate a portable function call. `None` means the dialect has no
    /// translation. Argument counts are validated before this is called.
    fn emit_function(&self, func: PortableFunction, args: &[TokenStream]) -> Option<TokenStream>;

    /// Extract a date part. `None` means the part is unsupported.
    fn emit_extract(&self, part: DatePart, expr: &TokenStream) -> Option<TokenStream>;

    // =========================================================================
    // DDL Support
    // =========================================================================

    /// Emit a data type for this dialect.
    fn emit_data_type(&self, ty: &ValueType) -> String {
        helpers::emit_data_type_ansi(ty)
    }

    /// Emit identity/auto-increment syntax.
    fn emit_identity(&self, start: i64, increment: i64) -> TokenStream {
        helpers::emit_identity_standard(start, increment)
    }

    // =========================================================================
    // Literals
    // =========================================================================

    fn format_date_literal(&self, date: NaiveDate) -> String {
        format!("DATE '{}'", helpers::date_text(date))
    }

    fn format_time_literal(&self, time: NaiveTime) -> String {
        format!("TIME '{}'", helpers::time_text(time))
    }

    fn format_datetime_literal(&self, dt: NaiveDateTime) -> String {
        format!("TIMESTAMP '{}'", helpers::datetime_text(dt))
    }

    fn format_datetimeoffset_literal(&self, dt: &DateTime<FixedOffset>) -> String {
        format!(
            "TIMESTAMP WITH TIME ZONE '{}'",
            helpers::datetimeoffset_text(dt)
        )
    }

    /// Interval literal. Dialects without an interval type store
    /// microseconds in a BIGINT.
    fn format_interval_literal(&self, interval: &NativeInterval) -> Result<String> {
        interval
            .total_microseconds()
            .map(|us| us.to_string())
            .ok_or_else(|| Error::out_of_range(interval, "interval"))
    }

    /// Native infinity sentinel for a temporal type, when the dialect has one.
    fn format_infinity_literal(&self, ty: &ValueType, positive: bool) -> Option<String> {
        let _ = (ty, positive);
        None
    }

    fn format_bytes_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", helpers::hex(bytes))
    }

    fn format_guid_literal(&self, guid: &Uuid) -> String {
        self.quote_string(&guid.hyphenated().to_string())
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    SqlServer,
    MySql,
    Sqlite,
    /// Reference rendering of standard SQL. Used for comparisons and docs.
    Ansi,
}

impl Dialect {
    /// All dialects, in declaration order.
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgres,
        Dialect::SqlServer,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::Ansi,
    ];

    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::SqlServer => &SqlServer,
            Dialect::MySql => &MySql,
            Dialect::Sqlite => &Sqlite,
            Dialect::Ansi => &Ansi,
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlserver" | "mssql" | "tsql" => Ok(Dialect::SqlServer),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "ansi" => Ok(Dialect::Ansi),
            other => Err(format!("unknown dialect '{}'", other)),
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn placeholder(&self, ordinal: usize) -> String {
        self.dialect().placeholder(ordinal)
    }

    fn emit_limit_offset(
        &self,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<TokenStream> {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        self.dialect().requires_order_by_for_offset()
    }

    fn concat_operator(&self) -> &'static str {
        self.dialect().concat_operator()
    }

    fn supports_concat_operator(&self) -> bool {
        self.dialect().supports_concat_operator()
    }

    fn bitwise_xor_operator(&self) -> &'static str {
        self.dialect().bitwise_xor_operator()
    }

    fn supports(&self, feature: Feature) -> bool {
        self.dialect().supports(feature)
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.dialect().remap_function(name)
    }

    fn emit_function(&self, func: PortableFunction, args: &[TokenStream]) -> Option<TokenStream> {
        self.dialect().emit_function(func, args)
    }

    fn emit_extract(&self, part: DatePart, expr: &TokenStream) -> Option<TokenStream> {
        self.dialect().emit_extract(part, expr)
    }

    fn emit_data_type(&self, ty: &ValueType) -> String {
        self.dialect().emit_data_type(ty)
    }

    fn emit_identity(&self, start: i64, increment: i64) -> TokenStream {
        self.dialect().emit_identity(start, increment)
    }

    fn format_date_literal(&self, date: NaiveDate) -> String {
        self.dialect().format_date_literal(date)
    }

    fn format_time_literal(&self, time: NaiveTime) -> String {
        self.dialect().format_time_literal(time)
    }

    fn format_datetime_literal(&self, dt: NaiveDateTime) -> String {
        self.dialect().format_datetime_literal(dt)
    }

    fn format_datetimeoffset_literal(&self, dt: &DateTime<FixedOffset>) -> String {
        self.dialect().format_datetimeoffset_literal(dt)
    }

    fn format_interval_literal(&self, interval: &NativeInterval) -> Result<String> {
        self.dialect().format_interval_literal(interval)
    }

    fn format_infinity_literal(&self, ty: &ValueType, positive: bool) -> Option<String> {
        self.dialect().format_infinity_literal(ty, positive)
    }

    fn format_bytes_literal(&self, bytes: &[u8]) -> String {
        self.dialect().format_bytes_literal(bytes)
    }

    fn format_guid_literal(&self, guid: &Uuid) -> String {
        self.dialect().format_guid_literal(guid)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::token::Token;

    fn arg(name: &str) -> TokenStream {
        TokenStream::from(Token::Ident(name.into()))
    }

    #[test]
    fn test_dialect_display() {
        assert_eq!(Dialect::Postgres.to_string(), "postgres");
        assert_eq!(Dialect::SqlServer.to_string(), "sqlserver");
        assert_eq!(Dialect::MySql.to_string(), "mysql");
        assert_eq!(Dialect::Sqlite.to_string(), "sqlite");
        assert_eq!(Dialect::Ansi.to_string(), "ansi");
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("PostgreSQL".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert_eq!("mssql".parse::<Dialect>(), Ok(Dialect::SqlServer));
        assert!("oracle".parse::<Dialect>().is_err());
        for d in Dialect::ALL {
            assert_eq!(d.to_string().parse::<Dialect>(), Ok(d));
        }
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Dialect::Postgres.quote_identifier("users"), "\"users\"");
        assert_eq!(Dialect::SqlServer.quote_identifier("users"), "[users]");
        assert_eq!(Dialect::MySql.quote_identifier("users"), "`users`");
        assert_eq!(Dialect::Sqlite.quote_identifier("users"), "\"users\"");
    }

    #[test]
    fn test_quote_identifier_escaping() {
        assert_eq!(
            Dialect::Postgres.quote_identifier("weird\"name"),
            "\"weird\"\"name\""
        );
        assert_eq!(
            Dialect::SqlServer.quote_identifier("weird]name"),
            "[weird]]name]"
        );
        assert_eq!(
            Dialect::MySql.quote_identifier("weird`name"),
            "`weird``name`"
        );
    }

    #[test]
    fn test_format_bool() {
        assert_eq!(Dialect::Postgres.format_bool(false), "false");
        assert_eq!(Dialect::SqlServer.format_bool(true), "1");
        assert_eq!(Dialect::MySql.format_bool(false), "0");
        assert_eq!(Dialect::Sqlite.format_bool(true), "1");
        assert_eq!(Dialect::Ansi.format_bool(true), "TRUE");
    }

    #[test]
    fn test_concat_operator() {
        assert_eq!(Dialect::Postgres.concat_operator(), "||");
        assert_eq!(Dialect::Sqlite.concat_operator(), "||");
        assert_eq!(Dialect::SqlServer.concat_operator(), "+");
        assert!(!Dialect::MySql.supports_concat_operator());
    }

    #[test]
    fn test_require_reports_dialect() {
        let err = Dialect::Sqlite.require(Feature::Truncate).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TRUNCATE is not supported by the sqlite dialect"
        );
        assert!(Dialect::Postgres.require(Feature::Truncate).is_ok());
    }

    #[test]
    fn test_capability_matrix() {
        assert!(Dialect::Ansi.supports(Feature::UniquePredicate));
        for d in [
            Dialect::Postgres,
            Dialect::SqlServer,
            Dialect::MySql,
            Dialect::Sqlite,
        ] {
            assert!(!d.supports(Feature::UniquePredicate), "{}", d);
            assert!(!d.supports(Feature::MatchPredicate), "{}", d);
        }
        assert!(Dialect::Postgres.supports(Feature::Cursors));
        assert!(!Dialect::Postgres.supports(Feature::CursorOpen));
        assert!(Dialect::SqlServer.supports(Feature::CursorOpen));
        assert!(!Dialect::MySql.supports(Feature::Cursors));
        assert!(!Dialect::Sqlite.supports(Feature::Sequences));
        assert!(Dialect::Postgres.supports(Feature::InfinityLiterals));
        assert!(!Dialect::SqlServer.supports(Feature::InfinityLiterals));
    }

    #[test]
    fn test_remap_function_case_insensitive() {
        assert_eq!(Dialect::SqlServer.remap_function("length"), Some("LEN"));
        assert_eq!(Dialect::SqlServer.remap_function("LENGTH"), Some("LEN"));
        assert_eq!(Dialect::SqlServer.remap_function("Length"), Some("LEN"));
        assert_eq!(Dialect::Postgres.remap_function("CUSTOM_FUNC"), None);
    }

    #[test]
    fn test_extract_per_dialect() {
        let x = arg("d");
        let render = |d: Dialect, part| d.emit_extract(part, &x).map(|ts| ts.serialize(d));

        assert_eq!(
            render(Dialect::Postgres, DatePart::Year).as_deref(),
            Some("EXTRACT(YEAR FROM \"d\")")
        );
        assert_eq!(
            render(Dialect::SqlServer, DatePart::DayOfYear).as_deref(),
            Some("DATEPART(dayofyear, [d])")
        );
        assert_eq!(
            render(Dialect::Sqlite, DatePart::Month).as_deref(),
            Some("CAST(STRFTIME('%m', \"d\") AS INTEGER)")
        );
        assert_eq!(render(Dialect::Sqlite, DatePart::Millisecond), None);
        assert_eq!(render(Dialect::Ansi, DatePart::DayOfWeek), None);
    }

    #[test]
    fn test_add_months_per_dialect() {
        let args = [arg("d"), arg("n")];
        let render = |d: Dialect| {
            d.emit_function(PortableFunction::DateTimeAddMonths, &args)
                .map(|ts| ts.serialize(d))
        };

        assert_eq!(
            render(Dialect::Postgres).as_deref(),
            Some("(\"d\" + (\"n\") * INTERVAL '1 month')")
        );
        assert_eq!(
            render(Dialect::SqlServer).as_deref(),
            Some("DATEADD(month, [n], [d])")
        );
        assert_eq!(
            render(Dialect::MySql).as_deref(),
            Some("DATE_ADD(`d`, INTERVAL (`n`) MONTH)")
        );
        assert_eq!(
            render(Dialect::Sqlite).as_deref(),
            Some("STRFTIME('%Y-%m-%d %H:%M:%f', \"d\", (\"n\") || ' months')")
        );
    }

    #[test]
    fn test_interval_literal() {
        let i = NativeInterval::new(1, 2, 3);
        assert_eq!(
            Dialect::Postgres.format_interval_literal(&i).unwrap(),
            "INTERVAL '1 months 2 days 3 microseconds'"
        );
        assert_eq!(
            Dialect::SqlServer.format_interval_literal(&i).unwrap(),
            (2_592_000_000_000i64 + 172_800_000_000 + 3).to_string()
        );
    }

    #[test]
    fn test_infinity_literal_only_on_postgres() {
        assert_eq!(
            Dialect::Postgres
                .format_infinity_literal(&ValueType::DateTime, false)
                .as_deref(),
            Some("TIMESTAMP '-infinity'")
        );
        assert_eq!(
            Dialect::SqlServer.format_infinity_literal(&ValueType::DateTime, true),
            None
        );
    }
}
