//! The closed set of statements the compiler accepts.

use super::cursor::{CloseCursor, DeclareCursor, FetchCursor, OpenCursor};
use super::ddl::{
    AlterAction, AlterSequence, AlterTable, CreateIndex, CreatePartitionFunction,
    CreatePartitionSchema, CreateSchema, CreateSequence, CreateTable, CreateView, DropObject,
    DropTarget, Rename, Truncate,
};
use super::dialect::Dialect;
use super::dml::{Delete, Insert, InsertSource, Update};
use super::expr::{Expr, RenderContext};
use super::query::{QueryExpr, Select, TableSource};
use super::token::TokenStream;
use crate::error::Result;
use crate::model::{ColumnIdentity, Constraint, IndexTarget, SequenceRef, TableRef, ViewDefinition};

/// Any statement the compiler can render.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Query(QueryExpr),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    CreateTable(CreateTable),
    CreateIndex(CreateIndex),
    CreateSequence(CreateSequence),
    AlterSequence(AlterSequence),
    CreateView(CreateView),
    CreateSchema(CreateSchema),
    CreatePartitionFunction(CreatePartitionFunction),
    CreatePartitionSchema(CreatePartitionSchema),
    AlterTable(AlterTable),
    Drop(DropObject),
    Rename(Rename),
    Truncate(Truncate),
    DeclareCursor(DeclareCursor),
    OpenCursor(OpenCursor),
    FetchCursor(FetchCursor),
    CloseCursor(CloseCursor),
}

macro_rules! statement_from {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Statement {
                fn from(stmt: $ty) -> Self {
                    Statement::$variant(stmt)
                }
            }
        )*
    };
}

statement_from! {
    QueryExpr => Query,
    Insert => Insert,
    Update => Update,
    Delete => Delete,
    CreateTable => CreateTable,
    CreateIndex => CreateIndex,
    CreateSequence => CreateSequence,
    AlterSequence => AlterSequence,
    CreateView => CreateView,
    CreateSchema => CreateSchema,
    CreatePartitionFunction => CreatePartitionFunction,
    CreatePartitionSchema => CreatePartitionSchema,
    AlterTable => AlterTable,
    DropObject => Drop,
    Rename => Rename,
    Truncate => Truncate,
    DeclareCursor => DeclareCursor,
    OpenCursor => OpenCursor,
    FetchCursor => FetchCursor,
    CloseCursor => CloseCursor,
}

impl From<Select> for Statement {
    fn from(select: Select) -> Self {
        Statement::Query(select.into())
    }
}

impl Statement {
    /// Leading keywords, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Query(_) => "SELECT",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::CreateTable(_) => "CREATE TABLE",
            Statement::CreateIndex(_) => "CREATE INDEX",
            Statement::CreateSequence(_) => "CREATE SEQUENCE",
            Statement::AlterSequence(_) => "ALTER SEQUENCE",
            Statement::CreateView(_) => "CREATE VIEW",
            Statement::CreateSchema(_) => "CREATE SCHEMA",
            Statement::CreatePartitionFunction(_) => "CREATE PARTITION FUNCTION",
            Statement::CreatePartitionSchema(_) => "CREATE PARTITION SCHEME",
            Statement::AlterTable(_) => "ALTER TABLE",
            Statement::Drop(_) => "DROP",
            Statement::Rename(_) => "RENAME",
            Statement::Truncate(_) => "TRUNCATE",
            Statement::DeclareCursor(_) => "DECLARE CURSOR",
            Statement::OpenCursor(_) => "OPEN",
            Statement::FetchCursor(_) => "FETCH",
            Statement::CloseCursor(_) => "CLOSE",
        }
    }

    /// Whether this statement changes structure rather than data.
    pub fn is_ddl(&self) -> bool {
        !matches!(
            self,
            Statement::Query(_)
                | Statement::Insert(_)
                | Statement::Update(_)
                | Statement::Delete(_)
                | Statement::DeclareCursor(_)
                | Statement::OpenCursor(_)
                | Statement::FetchCursor(_)
                | Statement::CloseCursor(_)
        )
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        match self {
            Statement::Query(s) => s.to_tokens(cx),
            Statement::Insert(s) => s.to_tokens(cx),
            Statement::Update(s) => s.to_tokens(cx),
            Statement::Delete(s) => s.to_tokens(cx),
            Statement::CreateTable(s) => s.to_tokens(cx),
            Statement::CreateIndex(s) => s.to_tokens(cx),
            Statement::CreateSequence(s) => s.to_tokens(cx),
            Statement::AlterSequence(s) => s.to_tokens(cx),
            Statement::CreateView(s) => s.to_tokens(cx),
            Statement::CreateSchema(s) => s.to_tokens(cx),
            Statement::CreatePartitionFunction(s) => s.to_tokens(cx),
            Statement::CreatePartitionSchema(s) => s.to_tokens(cx),
            Statement::AlterTable(s) => s.to_tokens(cx),
            Statement::Drop(s) => s.to_tokens(cx),
            Statement::Rename(s) => s.to_tokens(cx),
            Statement::Truncate(s) => s.to_tokens(cx),
            Statement::DeclareCursor(s) => s.to_tokens(cx),
            Statement::OpenCursor(s) => s.to_tokens(cx),
            Statement::FetchCursor(s) => s.to_tokens(cx),
            Statement::CloseCursor(s) => s.to_tokens(cx),
        }
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }

    /// Every model relation the statement reads or writes, including those
    /// reached through subqueries, sorted and without duplicates.
    pub fn tables(&self) -> Vec<TableRef> {
        let mut out = Vec::new();
        match self {
            Statement::Query(q) => collect_query(q, &mut out),
            Statement::Insert(s) => {
                out.push(s.table.clone());
                match &s.source {
                    InsertSource::Values(rows) => {
                        for e in rows.iter().flatten() {
                            collect_expr(e, &mut out);
                        }
                    }
                    InsertSource::Query(q) => collect_query(q, &mut out),
                }
            }
            Statement::Update(s) => {
                out.push(s.table.clone());
                for (_, e) in &s.set {
                    collect_expr(e, &mut out);
                }
                if let Some(f) = &s.filter {
                    collect_expr(f, &mut out);
                }
            }
            Statement::Delete(s) => {
                out.push(s.table.clone());
                if let Some(f) = &s.filter {
                    collect_expr(f, &mut out);
                }
            }
            Statement::CreateTable(s) => {
                out.push(s.table.clone());
                for c in &s.constraints {
                    if let Constraint::ForeignKey(fk) = c {
                        out.push(fk.referenced_table.clone());
                    }
                }
            }
            Statement::CreateIndex(s) => out.push(s.table.clone()),
            Statement::CreateView(s) => {
                out.push(s.view.clone());
                if let ViewDefinition::Query(q) = &s.definition {
                    collect_query(q, &mut out);
                }
            }
            Statement::AlterTable(s) => {
                out.push(s.table.clone());
                for action in &s.actions {
                    if let AlterAction::AddConstraint(Constraint::ForeignKey(fk)) = action {
                        out.push(fk.referenced_table.clone());
                    }
                }
            }
            Statement::Drop(s) => match &s.target {
                DropTarget::Table(t) | DropTarget::View(t) => out.push(t.clone()),
                DropTarget::Index { table, .. } => out.push(table.clone()),
                _ => {}
            },
            Statement::Rename(s) => out.push(s.table.clone()),
            Statement::Truncate(s) => out.push(s.table.clone()),
            Statement::DeclareCursor(s) => collect_query(&s.query, &mut out),
            Statement::CreateSequence(_)
            | Statement::AlterSequence(_)
            | Statement::CreateSchema(_)
            | Statement::CreatePartitionFunction(_)
            | Statement::CreatePartitionSchema(_)
            | Statement::OpenCursor(_)
            | Statement::FetchCursor(_)
            | Statement::CloseCursor(_) => {}
        }
        out.sort();
        out.dedup();
        out
    }

    /// Sequences a statement depends on through column definitions.
    pub fn sequences(&self) -> Vec<SequenceRef> {
        let columns = match self {
            Statement::CreateTable(s) => s.columns.iter().collect::<Vec<_>>(),
            Statement::AlterTable(s) => s
                .actions
                .iter()
                .filter_map(|a| match a {
                    AlterAction::AddColumn(c) => Some(c),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        let mut out: Vec<SequenceRef> = columns
            .into_iter()
            .filter_map(|c| match &c.identity {
                Some(ColumnIdentity::Sequence(seq)) => Some(seq.clone()),
                _ => None,
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Expressions an index or check refers to by column, for statements
    /// that define them.
    pub(crate) fn definition_expressions(&self) -> Vec<&Expr> {
        match self {
            Statement::CreateTable(s) => s
                .constraints
                .iter()
                .filter_map(|c| match c {
                    Constraint::Check { condition, .. } => Some(condition),
                    _ => None,
                })
                .collect(),
            Statement::CreateIndex(s) => {
                let mut out: Vec<&Expr> = s
                    .index
                    .columns
                    .iter()
                    .filter_map(|c| match &c.target {
                        IndexTarget::Expression(e) => Some(e),
                        IndexTarget::Column(_) => None,
                    })
                    .collect();
                out.extend(s.index.filter.iter());
                out
            }
            _ => Vec::new(),
        }
    }
}

fn collect_query(query: &QueryExpr, out: &mut Vec<TableRef>) {
    for select in query.selects() {
        for source in select.sources() {
            match source {
                TableSource::Table { table, .. } => out.push(table.clone()),
                TableSource::Query { query, .. } => collect_query(query, out),
            }
        }
        for expr in select.expressions() {
            collect_expr(expr, out);
        }
    }
}

fn collect_expr(expr: &Expr, out: &mut Vec<TableRef>) {
    expr.walk(&mut |e| {
        if let Some(q) = e.subquery() {
            collect_query(q, out);
        }
    });
}

/// An ordered list of statements run as one script.
#[derive(Debug, Clone, PartialEq, Default)]
#[must_use = "batches have no effect until compiled"]
pub struct Batch {
    pub statements: Vec<Statement>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: impl Into<Statement>) {
        self.statements.push(statement.into());
    }

    pub fn with(mut self, statement: impl Into<Statement>) -> Self {
        self.push(statement);
        self
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }

    /// The whole batch as one script, each statement terminated by `;`.
    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        let cx = RenderContext::new(dialect);
        let mut script = String::new();
        for statement in &self.statements {
            script.push_str(&statement.to_tokens(&cx)?.serialize(dialect));
            script.push_str(";\n");
        }
        Ok(script)
    }
}

impl From<Vec<Statement>> for Batch {
    fn from(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

impl IntoIterator for Batch {
    type Item = Statement;
    type IntoIter = std::vec::IntoIter<Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}
