//! Cursor statements: DECLARE, OPEN, FETCH, CLOSE.
//!
//! Postgres opens a cursor as part of DECLARE and has no OPEN statement;
//! SQL Server and ANSI open it explicitly. MySQL and SQLite have no
//! client-visible cursors at all.

use super::dialect::{Dialect, Feature, SqlDialect};
use super::expr::RenderContext;
use super::query::QueryExpr;
use super::token::{Token, TokenStream};
use crate::error::Result;

/// DECLARE CURSOR statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "cursor statements have no effect until compiled"]
pub struct DeclareCursor {
    pub name: String,
    pub query: Box<QueryExpr>,
    /// Allow fetching in any direction.
    pub scroll: bool,
}

impl DeclareCursor {
    pub fn new(name: impl Into<String>, query: impl Into<QueryExpr>) -> Self {
        Self {
            name: name.into(),
            query: Box::new(query.into()),
            scroll: false,
        }
    }

    pub fn scroll(mut self) -> Self {
        self.scroll = true;
        self
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let dialect = cx.dialect;
        dialect.require(Feature::Cursors)?;
        let mut ts = TokenStream::new();
        ts.push(Token::Declare).space().ident(self.name.clone()).space();
        if self.scroll {
            dialect.require(Feature::ScrollCursors)?;
            ts.push(Token::Scroll).space();
        }
        ts.push(Token::Cursor)
            .space()
            .push(Token::For)
            .newline()
            .append(&self.query.to_tokens(cx)?);
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

/// OPEN statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "cursor statements have no effect until compiled"]
pub struct OpenCursor {
    pub name: String,
}

impl OpenCursor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        cx.dialect.require(Feature::CursorOpen)?;
        let mut ts = TokenStream::new();
        ts.push(Token::Open).space().ident(self.name.clone());
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

/// Row a FETCH moves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchDirection {
    #[default]
    Next,
    Prior,
    First,
    Last,
    Absolute(i64),
    Relative(i64),
}

impl FetchDirection {
    /// Only `Next` works on a forward-only cursor.
    pub fn needs_scroll(&self) -> bool {
        !matches!(self, FetchDirection::Next)
    }
}

/// FETCH statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "cursor statements have no effect until compiled"]
pub struct FetchCursor {
    pub name: String,
    pub direction: FetchDirection,
}

impl FetchCursor {
    pub fn new(name: impl Into<String>, direction: FetchDirection) -> Self {
        Self {
            name: name.into(),
            direction,
        }
    }

    pub fn next(name: impl Into<String>) -> Self {
        Self::new(name, FetchDirection::Next)
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let dialect = cx.dialect;
        dialect.require(Feature::Cursors)?;
        if self.direction.needs_scroll() {
            dialect.require(Feature::ScrollCursors)?;
        }
        let mut ts = TokenStream::new();
        ts.push(Token::Fetch).space();
        match self.direction {
            FetchDirection::Next => ts.push(Token::Next),
            FetchDirection::Prior => ts.push(Token::Prior),
            FetchDirection::First => ts.push(Token::First),
            FetchDirection::Last => ts.push(Token::Last),
            FetchDirection::Absolute(n) => ts
                .push(Token::Absolute)
                .space()
                .push(Token::LitInt(n)),
            FetchDirection::Relative(n) => ts
                .push(Token::Relative)
                .space()
                .push(Token::LitInt(n)),
        };
        ts.space()
            .push(Token::From)
            .space()
            .ident(self.name.clone());
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

/// CLOSE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "cursor statements have no effect until compiled"]
pub struct CloseCursor {
    pub name: String,
}

impl CloseCursor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        cx.dialect.require(Feature::Cursors)?;
        let mut ts = TokenStream::new();
        ts.push(Token::Close).space().ident(self.name.clone());
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::TableRef;
    use crate::sql::expr::col;
    use crate::sql::query::Select;

    fn query() -> Select {
        Select::from_table(TableRef::new("main", "Employee")).column(col("Name"))
    }

    #[test]
    fn test_declare_scroll_cursor() {
        let declare = DeclareCursor::new("emp", query()).scroll();
        let sql = declare.to_sql(Dialect::Postgres).unwrap();
        assert!(sql.starts_with("DECLARE \"emp\" SCROLL CURSOR FOR\nSELECT"));

        let sql = declare.to_sql(Dialect::SqlServer).unwrap();
        assert!(sql.starts_with("DECLARE [emp] SCROLL CURSOR FOR\nSELECT"));
    }

    #[test]
    fn test_cursors_rejected_without_support() {
        let err = DeclareCursor::new("emp", query())
            .to_sql(Dialect::MySql)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { .. }));
        assert_eq!(
            err.to_string(),
            "cursors is not supported by the mysql dialect"
        );
    }

    #[test]
    fn test_open_only_where_separate() {
        assert_eq!(
            OpenCursor::new("emp").to_sql(Dialect::SqlServer).unwrap(),
            "OPEN [emp]"
        );
        assert!(OpenCursor::new("emp").to_sql(Dialect::Postgres).is_err());
    }

    #[test]
    fn test_fetch_directions() {
        assert_eq!(
            FetchCursor::next("emp").to_sql(Dialect::Postgres).unwrap(),
            "FETCH NEXT FROM \"emp\""
        );
        assert_eq!(
            FetchCursor::new("emp", FetchDirection::Absolute(5))
                .to_sql(Dialect::SqlServer)
                .unwrap(),
            "FETCH ABSOLUTE 5 FROM [emp]"
        );
        assert_eq!(
            CloseCursor::new("emp").to_sql(Dialect::Ansi).unwrap(),
            "CLOSE \"emp\""
        );
    }
}
