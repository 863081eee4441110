//! DML (Data Manipulation Language) support.
//!
//! This module provides types and builders for generating DML statements
//! (INSERT, UPDATE, DELETE) across different SQL dialects.
//!
//! # Examples
//!
//! ```ignore
//! use lattice::model::TableRef;
//! use lattice::sql::dml::{Delete, Insert, Update};
//! use lattice::sql::expr::{col, lit_int, lit_str, ExprExt};
//!
//! let users = TableRef::new("main", "users");
//!
//! // INSERT
//! let insert = Insert::into(users.clone())
//!     .value("name", lit_str("Alice"))
//!     .value("email", lit_str("alice@example.com"));
//!
//! // UPDATE
//! let update = Update::table(users.clone())
//!     .set("status", lit_str("active"))
//!     .filter(col("id").eq(lit_int(1)));
//!
//! // DELETE
//! let delete = Delete::from(users).filter(col("status").eq(lit_str("inactive")));
//! ```

use super::dialect::Dialect;
use super::expr::{Expr, ExprExt, RenderContext};
use super::query::QueryExpr;
use super::token::{Token, TokenStream};
use crate::error::{Error, Result};
use crate::model::TableRef;

pub(crate) fn table_token(table: &TableRef) -> Token {
    Token::QualifiedIdent {
        schema: Some(table.schema.clone()),
        name: table.name.clone(),
    }
}

// ============================================================================
// INSERT
// ============================================================================

/// Where inserted rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// One or more rows, each aligned with `Insert::columns`.
    Values(Vec<Vec<Expr>>),
    Query(Box<QueryExpr>),
}

/// INSERT statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until compiled"]
pub struct Insert {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub source: InsertSource,
}

impl Insert {
    /// Create a new INSERT statement.
    pub fn into(table: TableRef) -> Self {
        Self {
            table,
            columns: Vec::new(),
            source: InsertSource::Values(Vec::new()),
        }
    }

    /// Set the columns to insert.
    pub fn columns(mut self, cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = cols.into_iter().map(|c| c.into()).collect();
        self
    }

    /// Add a row of values aligned with `columns`.
    pub fn values(mut self, vals: impl IntoIterator<Item = impl Into<Expr>>) -> Self {
        let row = vals.into_iter().map(|v| v.into()).collect();
        match &mut self.source {
            InsertSource::Values(rows) => rows.push(row),
            InsertSource::Query(_) => self.source = InsertSource::Values(vec![row]),
        }
        self
    }

    /// Assign one column of a single-row insert. Assigning the same column
    /// again replaces the earlier value.
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Expr>) -> Self {
        let column = column.into();
        let value = value.into();
        if !matches!(self.source, InsertSource::Values(_)) {
            self.source = InsertSource::Values(Vec::new());
        }
        let position = self.columns.iter().position(|c| *c == column);
        if let InsertSource::Values(rows) = &mut self.source {
            if rows.is_empty() {
                rows.push(Vec::new());
            }
            let row = &mut rows[0];
            match position {
                Some(i) if i < row.len() => row[i] = value,
                _ => {
                    self.columns.push(column);
                    row.push(value);
                }
            }
        }
        self
    }

    /// Insert the rows of a query.
    pub fn from_select(mut self, query: impl Into<QueryExpr>) -> Self {
        self.source = InsertSource::Query(Box::new(query.into()));
        self
    }

    /// Value expressions in row order.
    pub fn expressions(&self) -> Vec<&Expr> {
        match &self.source {
            InsertSource::Values(rows) => rows.iter().flatten().collect(),
            InsertSource::Query(_) => Vec::new(),
        }
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let mut ts = TokenStream::new();

        ts.push(Token::Insert).space().push(Token::Into).space();
        ts.push(table_token(&self.table));

        if !self.columns.is_empty() {
            ts.space().ident_list(&self.columns);
        }

        match &self.source {
            InsertSource::Query(query) => {
                ts.newline().append(&query.to_tokens(cx)?);
            }
            InsertSource::Values(rows) => {
                if rows.is_empty() || self.columns.is_empty() {
                    return Err(Error::InvalidStatement(format!(
                        "INSERT into {} has no values",
                        self.table
                    )));
                }
                ts.space().push(Token::Values);
                for (row_idx, row) in rows.iter().enumerate() {
                    if row.len() != self.columns.len() {
                        return Err(Error::InvalidStatement(format!(
                            "INSERT row {} has {} values for {} columns",
                            row_idx + 1,
                            row.len(),
                            self.columns.len()
                        )));
                    }
                    if row_idx > 0 {
                        ts.comma();
                    }
                    let rendered = row
                        .iter()
                        .map(|v| v.to_tokens(cx))
                        .collect::<Result<Vec<_>>>()?;
                    ts.space().parenthesized(&rendered);
                }
            }
        }

        Ok(ts)
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until compiled"]
pub struct Update {
    pub table: TableRef,
    pub set: Vec<(String, Expr)>,
    pub filter: Option<Expr>,
}

impl Update {
    /// Create a new UPDATE statement.
    pub fn table(table: TableRef) -> Self {
        Self {
            table,
            set: Vec::new(),
            filter: None,
        }
    }

    /// Set a column to a value. Setting the same column again replaces the
    /// earlier assignment.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Expr>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.set.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.set.push((column, value)),
        }
        self
    }

    /// Add WHERE clause. Repeated calls are ANDed together.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    pub fn expressions(&self) -> Vec<&Expr> {
        self.set
            .iter()
            .map(|(_, e)| e)
            .chain(self.filter.iter())
            .collect()
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        if self.set.is_empty() {
            return Err(Error::InvalidStatement(format!(
                "UPDATE of {} assigns no columns",
                self.table
            )));
        }

        let mut ts = TokenStream::new();
        ts.push(Token::Update).space().push(table_token(&self.table));

        ts.newline().push(Token::Set).space();
        for (i, (col, expr)) in self.set.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.push(Token::Ident(col.clone()))
                .space()
                .push(Token::Eq)
                .space()
                .append(&expr.to_tokens(cx)?);
        }

        if let Some(filter) = &self.filter {
            ts.newline()
                .push(Token::Where)
                .space()
                .append(&filter.to_tokens(cx)?);
        }

        Ok(ts)
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// DELETE
// ============================================================================

/// DELETE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until compiled"]
pub struct Delete {
    pub table: TableRef,
    pub filter: Option<Expr>,
}

impl Delete {
    /// Create a new DELETE statement.
    pub fn from(table: TableRef) -> Self {
        Self {
            table,
            filter: None,
        }
    }

    /// Add WHERE clause. Repeated calls are ANDed together.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    pub fn expressions(&self) -> Vec<&Expr> {
        self.filter.iter().collect()
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Delete)
            .space()
            .push(Token::From)
            .space()
            .push(table_token(&self.table));

        if let Some(filter) = &self.filter {
            ts.newline()
                .push(Token::Where)
                .space()
                .append(&filter.to_tokens(cx)?);
        }

        Ok(ts)
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// Tests
// ============================================================================
