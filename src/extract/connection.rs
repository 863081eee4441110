//! Minimal synchronous connection abstraction used by extraction,
//! round-trip application and result verification.

use std::path::Path;
use std::time::Duration;

use rusqlite::types::{Value as SqliteValue, ValueRef};

use crate::error::{Error, Result};
use crate::mapping::{NativeRow, NativeValue, Sign};
use crate::sql::dialect::helpers::{date_text, datetime_text, datetimeoffset_text, time_text};
use crate::sql::dialect::Dialect;

/// A live provider connection.
///
/// Parameters are positional and match the dialect's placeholders in order.
pub trait Connection {
    fn dialect(&self) -> Dialect;

    /// Run a statement that returns rows.
    fn query(&mut self, sql: &str, params: &[NativeValue]) -> Result<RowSet>;

    /// Run a statement and return the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[NativeValue]) -> Result<u64>;

    /// Run several parameterless statements separated by `;`.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;
}

/// Fully materialised result of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<NativeValue>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<NativeValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, compared case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }
}

/// One row of a [`RowSet`], addressable by ordinal or column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [NativeValue],
}

impl<'a> Row<'a> {
    pub fn get(&self, name: &str) -> Option<&'a NativeValue> {
        let i = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))?;
        self.values.get(i)
    }

    /// Text value of a column. NULL and missing columns read as `None`.
    pub fn text(&self, name: &str) -> Option<&'a str> {
        match self.get(name)? {
            NativeValue::Text(s) | NativeValue::Numeric(s) => Some(s),
            _ => None,
        }
    }

    /// Required text value.
    pub fn require_text(&self, name: &str) -> Result<&'a str> {
        self.text(name)
            .ok_or_else(|| Error::Database(format!("catalog column '{}' is missing or NULL", name)))
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            NativeValue::Int(n) => Some(*n),
            NativeValue::Bool(b) => Some(*b as i64),
            NativeValue::Numeric(s) | NativeValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean flag; providers report these as bools, integers or `YES`/`NO`.
    pub fn flag(&self, name: &str) -> bool {
        match self.get(name) {
            Some(NativeValue::Bool(b)) => *b,
            Some(NativeValue::Int(n)) => *n != 0,
            Some(NativeValue::Text(s)) => {
                matches!(s.to_ascii_uppercase().as_str(), "YES" | "Y" | "TRUE" | "T" | "1")
            }
            _ => false,
        }
    }
}

impl NativeRow for Row<'_> {
    fn value_at(&self, ordinal: usize) -> Option<&NativeValue> {
        self.values.get(ordinal)
    }

    fn width(&self) -> usize {
        self.values.len()
    }
}

/// SQLite connection over `rusqlite`.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_connection(rusqlite::Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(rusqlite::Connection::open_in_memory()?))
    }

    /// Open the target of a `connection_string` setting. `:memory:` opens
    /// a private in-memory database.
    pub fn open_target(target: &str) -> Result<Self> {
        if target == ":memory:" {
            Self::open_in_memory()
        } else {
            Self::open(target)
        }
    }

    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Fail with `OperationTimeout` instead of waiting longer than
    /// `timeout` for a lock.
    pub fn with_busy_timeout(self, timeout: Duration) -> Result<Self> {
        self.conn.busy_timeout(timeout)?;
        Ok(self)
    }

    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&mut self, sql: &str, params: &[NativeValue]) -> Result<RowSet> {
        let args = to_sqlite_params(params)?;
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query(rusqlite::params_from_iter(args.iter()))?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_sqlite_value(row.get_ref(i)?));
            }
            rows.push(values);
        }
        tracing::trace!(rows = rows.len(), "sqlite query");
        Ok(RowSet { columns, rows })
    }

    fn execute(&mut self, sql: &str, params: &[NativeValue]) -> Result<u64> {
        let args = to_sqlite_params(params)?;
        let affected = self
            .conn
            .execute(sql, rusqlite::params_from_iter(args.iter()))?;
        Ok(affected as u64)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

fn to_sqlite_params(params: &[NativeValue]) -> Result<Vec<SqliteValue>> {
    params.iter().map(to_sqlite_value).collect()
}

fn to_sqlite_value(value: &NativeValue) -> Result<SqliteValue> {
    Ok(match value {
        NativeValue::Null => SqliteValue::Null,
        NativeValue::Bool(b) => SqliteValue::Integer(*b as i64),
        NativeValue::Int(n) => SqliteValue::Integer(*n),
        NativeValue::Float(f) => SqliteValue::Real(*f),
        NativeValue::Numeric(s) | NativeValue::Text(s) | NativeValue::TimestampText(s) => {
            SqliteValue::Text(s.clone())
        }
        NativeValue::Bytes(b) => SqliteValue::Blob(b.clone()),
        NativeValue::Uuid(u) => SqliteValue::Text(u.hyphenated().to_string()),
        NativeValue::Date(d) => SqliteValue::Text(date_text(*d)),
        NativeValue::Time(t) => SqliteValue::Text(time_text(*t)),
        NativeValue::Timestamp(ts) => SqliteValue::Text(datetime_text(*ts)),
        NativeValue::TimestampTz(ts) => SqliteValue::Text(datetimeoffset_text(&ts.fixed_offset())),
        NativeValue::Interval(iv) => SqliteValue::Integer(
            iv.total_microseconds()
                .ok_or_else(|| Error::out_of_range(iv, "sqlite interval"))?,
        ),
        NativeValue::Infinity(Sign::Positive) => SqliteValue::Real(f64::INFINITY),
        NativeValue::Infinity(Sign::Negative) => SqliteValue::Real(f64::NEG_INFINITY),
    })
}

fn from_sqlite_value(value: ValueRef<'_>) -> NativeValue {
    match value {
        ValueRef::Null => NativeValue::Null,
        ValueRef::Integer(n) => NativeValue::Int(n),
        ValueRef::Real(f) => NativeValue::Float(f),
        ValueRef::Text(t) => NativeValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => NativeValue::Bytes(b.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_roundtrip() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a INTEGER, b TEXT, c BLOB, d REAL)")
            .unwrap();
        let n = conn
            .execute(
                "INSERT INTO t VALUES (?1, ?2, ?3, ?4)",
                &[
                    NativeValue::Int(7),
                    NativeValue::Text("x".into()),
                    NativeValue::Bytes(vec![1, 2]),
                    NativeValue::Null,
                ],
            )
            .unwrap();
        assert_eq!(n, 1);

        let rows = conn.query("SELECT a, b, c, d FROM t", &[]).unwrap();
        assert_eq!(rows.columns, vec!["a", "b", "c", "d"]);
        assert_eq!(
            rows.rows[0],
            vec![
                NativeValue::Int(7),
                NativeValue::Text("x".into()),
                NativeValue::Bytes(vec![1, 2]),
                NativeValue::Null,
            ]
        );

        let row = rows.iter().next().unwrap();
        assert_eq!(row.int("A"), Some(7));
        assert_eq!(row.text("b"), Some("x"));
        assert_eq!(row.text("d"), None);
        assert_eq!(row.width(), 4);
    }

    #[test]
    fn test_flag_spellings() {
        let rows = RowSet::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![
                NativeValue::Text("YES".into()),
                NativeValue::Int(0),
                NativeValue::Bool(true),
            ]],
        );
        let row = rows.iter().next().unwrap();
        assert!(row.flag("a"));
        assert!(!row.flag("b"));
        assert!(row.flag("c"));
        assert!(!row.flag("missing"));
    }

    #[test]
    fn test_syntax_error_is_not_timeout() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        let err = conn.execute_batch("CREAT TABLE").unwrap_err();
        assert!(matches!(err, Error::Sqlite(_)));
        assert!(!err.is_timeout());
    }
}
