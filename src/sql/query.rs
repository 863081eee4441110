//! Query builder - construct SELECT statements and set operations with a
//! fluent API.

use super::dialect::{Feature, SqlDialect};
use super::expr::{Expr, ExprExt, RenderContext};
use super::token::{Token, TokenStream};
use crate::error::Result;
use crate::model::TableRef;

// =============================================================================
// Select Expression (column with optional alias)
// =============================================================================

/// A SELECT list item: expression with optional alias.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let mut ts = self.expr.to_tokens(cx)?;
        if let Some(alias) = &self.alias {
            ts.space()
                .push(Token::As)
                .space()
                .push(Token::Ident(alias.clone()));
        }
        Ok(ts)
    }
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        SelectExpr::new(expr)
    }
}

// =============================================================================
// Table Source
// =============================================================================

/// Something rows are read from: a model table or a nested query.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Table {
        table: TableRef,
        alias: Option<String>,
    },
    Query {
        query: Box<QueryExpr>,
        alias: String,
    },
}

impl TableSource {
    pub fn table(schema: &str, name: &str) -> Self {
        TableSource::Table {
            table: TableRef::new(schema, name),
            alias: None,
        }
    }

    /// A derived table. Every provider requires the alias.
    pub fn query(query: impl Into<QueryExpr>, alias: &str) -> Self {
        TableSource::Query {
            query: Box::new(query.into()),
            alias: alias.into(),
        }
    }

    /// Set the alias of a table source.
    pub fn with_alias(self, name: &str) -> Self {
        match self {
            TableSource::Table { table, .. } => TableSource::Table {
                table,
                alias: Some(name.into()),
            },
            TableSource::Query { query, .. } => TableSource::Query {
                query,
                alias: name.into(),
            },
        }
    }

    /// Name column references use to qualify this source.
    pub fn exposed_name(&self) -> &str {
        match self {
            TableSource::Table { table, alias } => alias.as_deref().unwrap_or(&table.name),
            TableSource::Query { alias, .. } => alias,
        }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        match self {
            TableSource::Table { table, alias } => {
                ts.push(Token::QualifiedIdent {
                    schema: Some(table.schema.clone()),
                    name: table.name.clone(),
                });
                if let Some(a) = alias {
                    ts.space().push(Token::As).space().ident(a.clone());
                }
            }
            TableSource::Query { query, alias } => {
                ts.lparen();
                ts.append(&query.to_tokens(cx)?);
                ts.rparen();
                ts.space().push(Token::As).space().ident(alias.clone());
            }
        }
        Ok(ts)
    }
}

impl From<TableRef> for TableSource {
    fn from(table: TableRef) -> Self {
        TableSource::Table { table, alias: None }
    }
}

// =============================================================================
// Joins
// =============================================================================

/// Type of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub source: TableSource,
    pub on: Option<Expr>,
}

impl Join {
    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let mut ts = TokenStream::new();

        match self.join_type {
            JoinType::Inner => ts.push(Token::Inner),
            JoinType::Left => ts.push(Token::Left),
            JoinType::Right => ts.push(Token::Right),
            JoinType::Full => ts.push(Token::Full).space().push(Token::Outer),
            JoinType::Cross => ts.push(Token::Cross),
        };

        ts.space().push(Token::Join).space();
        ts.append(&self.source.to_tokens(cx)?);

        if let Some(on) = &self.on {
            ts.space().push(Token::On).space();
            ts.append(&on.to_tokens(cx)?);
        }

        Ok(ts)
    }
}

// =============================================================================
// ORDER BY
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// An ORDER BY expression.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub dir: SortDir,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Desc,
        }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let mut ts = self.expr.to_tokens(cx)?;
        // ASC is the default everywhere; only DESC is spelled out
        if self.dir == SortDir::Desc {
            ts.space().push(Token::Desc);
        }
        Ok(ts)
    }
}

// =============================================================================
// Select
// =============================================================================

/// A single SELECT block.
#[derive(Debug, Clone, PartialEq, Default)]
#[must_use = "builders have no effect until used"]
pub struct Select {
    /// Empty means `*`.
    pub columns: Vec<SelectExpr>,
    pub distinct: bool,
    pub from: Option<TableSource>,
    pub joins: Vec<Join>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Select {
    /// A SELECT with no FROM clause.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(source: impl Into<TableSource>) -> Self {
        Self {
            from: Some(source.into()),
            ..Self::default()
        }
    }

    pub fn from(mut self, source: impl Into<TableSource>) -> Self {
        self.from = Some(source.into());
        self
    }

    pub fn column(mut self, expr: impl Into<SelectExpr>) -> Self {
        self.columns.push(expr.into());
        self
    }

    pub fn column_as(self, expr: Expr, alias: &str) -> Self {
        self.column(SelectExpr::new(expr).with_alias(alias))
    }

    pub fn columns(mut self, exprs: Vec<impl Into<SelectExpr>>) -> Self {
        self.columns.extend(exprs.into_iter().map(Into::into));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn join(mut self, join_type: JoinType, source: impl Into<TableSource>, on: Expr) -> Self {
        self.joins.push(Join {
            join_type,
            source: source.into(),
            on: Some(on),
        });
        self
    }

    pub fn inner_join(self, source: impl Into<TableSource>, on: Expr) -> Self {
        self.join(JoinType::Inner, source, on)
    }

    pub fn left_join(self, source: impl Into<TableSource>, on: Expr) -> Self {
        self.join(JoinType::Left, source, on)
    }

    pub fn right_join(self, source: impl Into<TableSource>, on: Expr) -> Self {
        self.join(JoinType::Right, source, on)
    }

    pub fn full_join(self, source: impl Into<TableSource>, on: Expr) -> Self {
        self.join(JoinType::Full, source, on)
    }

    pub fn cross_join(mut self, source: impl Into<TableSource>) -> Self {
        self.joins.push(Join {
            join_type: JoinType::Cross,
            source: source.into(),
            on: None,
        });
        self
    }

    /// Add a WHERE condition. Repeated calls are ANDed together.
    pub fn filter(mut self, condition: Expr) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }

    /// Add a HAVING condition. Repeated calls are ANDed together.
    pub fn having(mut self, condition: Expr) -> Self {
        self.having = Some(match self.having {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    pub fn order_by(mut self, expr: Expr, ascending: bool) -> Self {
        self.order_by.push(if ascending {
            OrderByExpr::asc(expr)
        } else {
            OrderByExpr::desc(expr)
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn union(self, other: impl Into<QueryExpr>) -> QueryExpr {
        QueryExpr::from(self).union(other)
    }

    pub fn union_all(self, other: impl Into<QueryExpr>) -> QueryExpr {
        QueryExpr::from(self).union_all(other)
    }

    pub fn intersect(self, other: impl Into<QueryExpr>) -> QueryExpr {
        QueryExpr::from(self).intersect(other)
    }

    pub fn intersect_all(self, other: impl Into<QueryExpr>) -> QueryExpr {
        QueryExpr::from(self).intersect_all(other)
    }

    pub fn except(self, other: impl Into<QueryExpr>) -> QueryExpr {
        QueryExpr::from(self).except(other)
    }

    pub fn except_all(self, other: impl Into<QueryExpr>) -> QueryExpr {
        QueryExpr::from(self).except_all(other)
    }

    /// Sources this block reads from, FROM first, then joins in order.
    pub fn sources(&self) -> impl Iterator<Item = &TableSource> {
        self.from
            .iter()
            .chain(self.joins.iter().map(|j| &j.source))
    }

    /// Every expression of this block, in clause order. Subquery bodies and
    /// nested sources are not entered.
    pub fn expressions(&self) -> Vec<&Expr> {
        let mut out: Vec<&Expr> = self.columns.iter().map(|c| &c.expr).collect();
        out.extend(self.joins.iter().filter_map(|j| j.on.as_ref()));
        out.extend(self.filter.iter());
        out.extend(self.group_by.iter());
        out.extend(self.having.iter());
        out.extend(self.order_by.iter().map(|o| &o.expr));
        out
    }

    fn has_ordering(&self) -> bool {
        !self.order_by.is_empty() || self.limit.is_some() || self.offset.is_some()
    }

    /// Convert to token stream for the context's dialect.
    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let dialect = cx.dialect;
        let mut ts = TokenStream::new();

        // SELECT
        ts.push(Token::Select);
        if self.distinct {
            ts.space().push(Token::Distinct);
        }

        // Columns
        if self.columns.is_empty() {
            ts.newline().indent(1).push(Token::Star);
        }
        for (i, select_expr) in self.columns.iter().enumerate() {
            if i == 0 {
                ts.newline().indent(1);
            } else {
                ts.comma().newline().indent(1);
            }
            ts.append(&select_expr.to_tokens(cx)?);
        }

        // FROM
        if let Some(from) = &self.from {
            ts.newline().push(Token::From).space();
            ts.append(&from.to_tokens(cx)?);
        }

        // JOINs
        for join in &self.joins {
            ts.newline();
            ts.append(&join.to_tokens(cx)?);
        }

        // WHERE
        if let Some(where_clause) = &self.filter {
            ts.newline().push(Token::Where).space();
            ts.append(&where_clause.to_tokens(cx)?);
        }

        // GROUP BY
        if !self.group_by.is_empty() {
            ts.newline().push(Token::GroupBy).space();
            let rendered = self
                .group_by
                .iter()
                .map(|e| e.to_tokens(cx))
                .collect::<Result<Vec<_>>>()?;
            ts.comma_separated(&rendered);
        }

        // HAVING
        if let Some(having) = &self.having {
            ts.newline().push(Token::Having).space();
            ts.append(&having.to_tokens(cx)?);
        }

        // ORDER BY
        let paginated = self.limit.is_some() || self.offset.is_some();
        if !self.order_by.is_empty() {
            ts.newline().push(Token::OrderBy).space();
            let rendered = self
                .order_by
                .iter()
                .map(|o| o.to_tokens(cx))
                .collect::<Result<Vec<_>>>()?;
            ts.comma_separated(&rendered);
        } else if paginated && dialect.requires_order_by_for_offset() {
            // OFFSET FETCH is only legal after ORDER BY. Row order is
            // unspecified with this placeholder.
            ts.newline()
                .push(Token::OrderBy)
                .space()
                .lparen()
                .push(Token::Select)
                .space()
                .push(Token::Null)
                .rparen();
        }

        // LIMIT / OFFSET
        if paginated {
            ts.newline();
            ts.append(&dialect.emit_limit_offset(self.limit, self.offset)?);
        }

        Ok(ts)
    }
}

impl From<Select> for QueryExpr {
    fn from(select: Select) -> Self {
        QueryExpr::Select(Box::new(select))
    }
}

// =============================================================================
// Set Operations (UNION, INTERSECT, EXCEPT)
// =============================================================================

/// Type of set operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpType {
    Union,
    Intersect,
    Except,
}

/// A query: one SELECT block or a set operation over two queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    Select(Box<Select>),
    SetOp {
        left: Box<QueryExpr>,
        op: SetOpType,
        all: bool,
        right: Box<QueryExpr>,
    },
}

impl QueryExpr {
    fn set_op(self, op: SetOpType, all: bool, right: impl Into<QueryExpr>) -> Self {
        QueryExpr::SetOp {
            left: Box::new(self),
            op,
            all,
            right: Box::new(right.into()),
        }
    }

    pub fn union(self, other: impl Into<QueryExpr>) -> Self {
        self.set_op(SetOpType::Union, false, other)
    }

    pub fn union_all(self, other: impl Into<QueryExpr>) -> Self {
        self.set_op(SetOpType::Union, true, other)
    }

    pub fn intersect(self, other: impl Into<QueryExpr>) -> Self {
        self.set_op(SetOpType::Intersect, false, other)
    }

    pub fn intersect_all(self, other: impl Into<QueryExpr>) -> Self {
        self.set_op(SetOpType::Intersect, true, other)
    }

    pub fn except(self, other: impl Into<QueryExpr>) -> Self {
        self.set_op(SetOpType::Except, false, other)
    }

    pub fn except_all(self, other: impl Into<QueryExpr>) -> Self {
        self.set_op(SetOpType::Except, true, other)
    }

    /// The SELECT blocks of this query, left to right.
    pub fn selects(&self) -> Vec<&Select> {
        match self {
            QueryExpr::Select(s) => vec![s],
            QueryExpr::SetOp { left, right, .. } => {
                let mut out = left.selects();
                out.extend(right.selects());
                out
            }
        }
    }

    /// Convert to token stream for the context's dialect.
    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        match self {
            QueryExpr::Select(select) => select.to_tokens(cx),
            QueryExpr::SetOp {
                left,
                op,
                all,
                right,
            } => {
                if *all {
                    match op {
                        SetOpType::Intersect => cx.dialect.require(Feature::IntersectAll)?,
                        SetOpType::Except => cx.dialect.require(Feature::ExceptAll)?,
                        SetOpType::Union => {}
                    }
                }

                let mut ts = TokenStream::new();
                // Set operations are left-associative, so a nested left
                // operand needs no grouping.
                ts.append(&set_operand(left, !matches!(**left, QueryExpr::SetOp { .. }), cx)?);
                ts.newline();
                ts.push(match op {
                    SetOpType::Union => Token::Union,
                    SetOpType::Intersect => Token::Intersect,
                    SetOpType::Except => Token::Except,
                });
                if *all {
                    ts.space().push(Token::All);
                }
                ts.newline();
                ts.append(&set_operand(right, true, cx)?);
                Ok(ts)
            }
        }
    }

    /// Generate SQL with default mapping options.
    pub fn to_sql(&self, dialect: super::dialect::Dialect) -> Result<String> {
        Ok(self.to_tokens(&RenderContext::new(dialect))?.serialize(dialect))
    }
}

/// Render one side of a set operation.
///
/// Operands with their own ORDER BY or pagination, and nested set
/// operations on the right, are wrapped in a derived table: SQLite rejects
/// parenthesized compound operands, and the derived form reads the same
/// everywhere.
fn set_operand(query: &QueryExpr, may_wrap: bool, cx: &RenderContext) -> Result<TokenStream> {
    let needs_wrap = match query {
        QueryExpr::Select(s) => s.has_ordering(),
        QueryExpr::SetOp { .. } => true,
    };
    if !(may_wrap && needs_wrap) {
        return query.to_tokens(cx);
    }
    let mut ts = TokenStream::new();
    ts.push(Token::Select)
        .space()
        .push(Token::Star)
        .space()
        .push(Token::From)
        .space()
        .lparen();
    ts.append(&query.to_tokens(cx)?);
    ts.rparen()
        .space()
        .push(Token::As)
        .space()
        .ident("set_operand");
    Ok(ts)
}

// =============================================================================
// Tests
// =============================================================================
