//! Reading a live database back into a [`Catalog`].
//!
//! An [`Extractor`] queries a provider's system catalog over a
//! [`Connection`] and rebuilds the model: schemas, tables with their
//! columns, constraints and indexes, sequences and views. Anything the
//! extractor sees but cannot represent is listed in the
//! [`ExtractionReport`] instead of failing the whole extraction.
//!
//! # Example
//!
//! ```ignore
//! use lattice::extract::{Extractor, SqliteConnection, SqliteExtractor};
//!
//! let mut conn = SqliteConnection::open("hr.db")?;
//! let catalog = SqliteExtractor::new().extract(&mut conn)?;
//! ```

mod connection;
mod postgres;
mod sqlite;

pub use connection::{Connection, Row, RowSet, SqliteConnection};
pub use postgres::PostgresExtractor;
pub use sqlite::SqliteExtractor;

use rusqlite::ErrorCode;

use crate::error::{Error, Result};
use crate::model::Catalog;
use crate::sql::dialect::Dialect;

/// Objects that were present in the database but are not part of the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// One entry per skipped object, e.g. `trigger "audit_employee"`.
    pub not_extracted: Vec<String>,
}

impl ExtractionReport {
    pub(crate) fn skip(&mut self, kind: &str, name: &str, reason: &str) {
        tracing::debug!(kind, name, reason, "object not extracted");
        self.not_extracted
            .push(format!("{} \"{}\" ({})", kind, name, reason));
    }

    pub fn is_complete(&self) -> bool {
        self.not_extracted.is_empty()
    }
}

/// Rebuilds a catalog from a live database.
pub trait Extractor {
    /// Dialect of the connections this extractor understands.
    fn dialect(&self) -> Dialect;

    /// Extract the model and report what was left out.
    fn extract_with_report(&self, conn: &mut dyn Connection)
        -> Result<(Catalog, ExtractionReport)>;

    fn extract(&self, conn: &mut dyn Connection) -> Result<Catalog> {
        self.extract_with_report(conn).map(|(catalog, _)| catalog)
    }
}

/// Reject a connection whose dialect does not match the extractor.
pub(crate) fn check_dialect(extractor: &dyn Extractor, conn: &dyn Connection) -> Result<()> {
    if extractor.dialect() != conn.dialect() {
        return Err(Error::InvalidStatement(format!(
            "{} extractor cannot read a {} connection",
            extractor.dialect(),
            conn.dialect()
        )));
    }
    Ok(())
}

/// Map a SQLite driver error onto the crate taxonomy. Lock waits that ran
/// out their busy timeout and interrupted statements are timeouts.
pub fn classify_sqlite_error(err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, detail)
            if matches!(
                e.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::OperationInterrupted
            ) =>
        {
            Error::OperationTimeout(detail.clone().unwrap_or_else(|| e.to_string()))
        }
        _ => Error::Sqlite(err),
    }
}

/// Map a provider error code onto the crate taxonomy.
///
/// `code` is the Postgres SQLSTATE or the SQL Server error number as text.
/// Statement timeouts (`57014` on Postgres, `-2` on SQL Server) become
/// [`Error::OperationTimeout`]; every other code is a plain
/// [`Error::Database`].
pub fn classify_error(dialect: Dialect, code: &str, message: impl Into<String>) -> Error {
    let message = message.into();
    let timeout = match dialect {
        Dialect::Postgres => code == "57014",
        Dialect::SqlServer => code == "-2",
        _ => false,
    };
    if timeout {
        Error::OperationTimeout(message)
    } else {
        Error::Database(format!("{} ({})", message, code))
    }
}

/// Split `text` at top-level commas, ignoring commas inside parentheses,
/// quotes and bracketed identifiers.
pub(crate) fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut current = String::new();
    for c in text.chars() {
        match quote {
            Some(q) => {
                if c == q || (q == '[' && c == ']') {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' | '[' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth -= 1,
                ',' if depth == 0 => {
                    parts.push(current.trim().to_string());
                    current.clear();
                    continue;
                }
                _ => {}
            },
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Body of the parenthesised group opening at byte `open` of `text`, or
/// `None` when the parentheses never balance.
pub(crate) fn balanced_group(text: &str, open: usize) -> Option<&str> {
    let mut depth = 0i32;
    let mut in_string = false;
    for (i, c) in text[open..].char_indices() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open + 1..open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove identifier quoting of any dialect: `"a""b"`, `[a]`, `` `a` ``.
pub(crate) fn unquote_identifier(ident: &str) -> String {
    let ident = ident.trim();
    if let Some(inner) = ident.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        inner.replace("\"\"", "\"")
    } else if let Some(inner) = ident.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        inner.replace("]]", "]")
    } else if let Some(inner) = ident.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        inner.replace("``", "`")
    } else {
        ident.to_string()
    }
}
