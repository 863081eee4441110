//! DDL (Data Definition Language) support.
//!
//! Statements here render model definitions (columns, constraints,
//! indexes, sequences, views) for one dialect. Anything the dialect cannot
//! express fails with [`Error::UnsupportedFeature`]; nothing is silently
//! approximated.
//!
//! # Examples
//!
//! ```ignore
//! use lattice::model::{Column, Constraint, TableRef};
//! use lattice::sql::ddl::{CreateTable, Truncate};
//! use lattice::sql::types::ValueType;
//! use lattice::sql::Dialect;
//!
//! let users = TableRef::new("main", "users");
//! let create = CreateTable::new(users.clone())
//!     .column(Column::new("id", ValueType::Int64).not_null())
//!     .column(Column::new("name", ValueType::VarChar(255.into())))
//!     .constraint(Constraint::primary_key("pk_users", &["id"]));
//!
//! let sql = create.to_sql(Dialect::Postgres)?;
//! let sql = Truncate::table(users).to_sql(Dialect::SqlServer)?;
//! ```

use super::dialect::{Dialect, Feature, SqlDialect};
use super::dml::table_token;
use super::expr::{Expr, Literal, RenderContext, UnaryOperator};
use super::token::{Token, TokenStream};
use crate::error::{Error, Result};
use crate::model::{
    BoundarySide, Column, ColumnIdentity, Constraint, Deferrability, ForeignKey, Index,
    IndexTarget, MatchType, PartitionDescriptor, PartitionFunction, PartitionMethod,
    PartitionSchema, ReferentialAction, SequenceDescriptor, SequenceRef, SortDirection, Table,
    TableRef, ViewDefinition,
};

// ============================================================================
// Shared rendering
// ============================================================================

/// SQLite resolves REFERENCES and CREATE INDEX targets inside the schema of
/// the statement itself and rejects a qualifier there.
fn referenced_table_token(table: &TableRef, dialect: Dialect) -> Token {
    match dialect {
        Dialect::Sqlite => Token::Ident(table.name.clone()),
        _ => table_token(table),
    }
}

/// Name of the default constraint SQL Server keeps for a column.
pub(crate) fn default_constraint_name(table: &TableRef, column: &str) -> String {
    format!("DF_{}_{}", table.name, column)
}

fn is_plain_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(_) => true,
        Expr::Unary {
            op: UnaryOperator::Minus,
            expr,
        } => matches!(
            **expr,
            Expr::Literal(Literal::Int(_) | Literal::Float(_) | Literal::Decimal(_))
        ),
        _ => false,
    }
}

/// `DEFAULT <expr>`. Anything beyond a literal is parenthesized, which every
/// dialect accepts and SQLite and MySQL require.
fn default_tokens(expr: &Expr, cx: &RenderContext) -> Result<TokenStream> {
    let mut ts = TokenStream::new();
    ts.push(Token::Default).space();
    if is_plain_literal(expr) {
        ts.append(&expr.to_tokens(cx)?);
    } else {
        ts.lparen().append(&expr.to_tokens(cx)?).rparen();
    }
    Ok(ts)
}

fn sequence_default_tokens(sequence: &SequenceRef, cx: &RenderContext) -> Result<TokenStream> {
    let dialect = cx.dialect;
    dialect.require(Feature::Sequences)?;
    let mut ts = TokenStream::new();
    ts.push(Token::Default).space();
    match dialect {
        Dialect::Postgres => {
            let qualified = table_token(sequence).serialize(dialect);
            ts.raw(format!("nextval({})", dialect.quote_string(&qualified)));
        }
        _ => {
            ts.raw("NEXT VALUE FOR").space().push(table_token(sequence));
        }
    }
    Ok(ts)
}

/// Renders one column definition.
///
/// `table` names the owning table; SQL Server uses it to name the column's
/// default constraint. `inline_key` carries the primary key name when an
/// SQLite identity column has to declare the key inline.
fn column_def_tokens(
    column: &Column,
    table: &TableRef,
    cx: &RenderContext,
    inline_key: Option<&str>,
) -> Result<TokenStream> {
    let dialect = cx.dialect;
    let mut ts = TokenStream::new();
    ts.ident(column.name.clone()).space();

    let identity = match &column.identity {
        Some(ColumnIdentity::Identity { start, increment }) => Some((*start, *increment)),
        _ => None,
    };

    if identity.is_some() && dialect == Dialect::Sqlite {
        let key = inline_key.ok_or_else(|| {
            Error::unsupported(
                format!("identity column {} outside a single-column primary key", column.name),
                dialect.name(),
            )
        })?;
        // rowid aliasing only happens for the exact type name INTEGER
        ts.raw("INTEGER");
        if !column.nullable {
            ts.space().push(Token::Not).space().push(Token::Null);
        }
        ts.space()
            .push(Token::Constraint)
            .space()
            .ident(key)
            .space()
            .push(Token::Primary)
            .space()
            .push(Token::Key)
            .space()
            .raw("AUTOINCREMENT");
        return Ok(ts);
    }

    ts.raw(dialect.emit_data_type(&column.value_type));

    if let Some((start, increment)) = identity {
        let identity_ts = dialect.emit_identity(start, increment);
        if !identity_ts.is_empty() {
            ts.space().append(&identity_ts);
        }
    }

    if !column.nullable {
        ts.space().push(Token::Not).space().push(Token::Null);
    }

    let default = match (&column.identity, &column.default) {
        (Some(ColumnIdentity::Sequence(_)), Some(_)) => {
            return Err(Error::InvalidStatement(format!(
                "column {} has both a default and a sequence",
                column.name
            )));
        }
        (Some(ColumnIdentity::Sequence(seq)), None) => Some(sequence_default_tokens(seq, cx)?),
        (_, Some(expr)) => Some(default_tokens(expr, cx)?),
        _ => None,
    };
    if let Some(default) = default {
        ts.space();
        if dialect == Dialect::SqlServer {
            ts.push(Token::Constraint)
                .space()
                .ident(default_constraint_name(table, &column.name))
                .space();
        }
        ts.append(&default);
    }

    Ok(ts)
}

fn action_token(action: ReferentialAction) -> Token {
    match action {
        ReferentialAction::NoAction => Token::NoAction,
        ReferentialAction::Cascade => Token::Cascade,
        ReferentialAction::SetNull => Token::SetNull,
        ReferentialAction::SetDefault => Token::SetDefault,
        ReferentialAction::Restrict => Token::Restrict,
    }
}

fn foreign_key_tokens(fk: &ForeignKey, cx: &RenderContext) -> Result<TokenStream> {
    let dialect = cx.dialect;
    let mut ts = TokenStream::new();
    ts.push(Token::Foreign)
        .space()
        .push(Token::Key)
        .space()
        .ident_list(&fk.columns)
        .space()
        .push(Token::References)
        .space()
        .push(referenced_table_token(&fk.referenced_table, dialect))
        .space()
        .ident_list(&fk.referenced_columns);

    match fk.match_type {
        MatchType::None => {}
        MatchType::Full => {
            dialect.require(Feature::ForeignKeyMatch)?;
            ts.space().push(Token::Match).space().push(Token::Full);
        }
        MatchType::Partial => {
            dialect.require(Feature::ForeignKeyMatchPartial)?;
            ts.space().push(Token::Match).space().push(Token::Partial);
        }
    }

    for (keyword, action) in [("ON DELETE", fk.on_delete), ("ON UPDATE", fk.on_update)] {
        if action == ReferentialAction::NoAction {
            continue;
        }
        if action == ReferentialAction::Restrict && dialect == Dialect::SqlServer {
            return Err(Error::unsupported(
                format!("{} RESTRICT", keyword),
                dialect.name(),
            ));
        }
        ts.space().raw(keyword).space().push(action_token(action));
    }

    match fk.deferrability {
        Deferrability::NotDeferrable => {}
        Deferrability::InitiallyImmediate => {
            dialect.require(Feature::DeferrableConstraints)?;
            ts.space()
                .push(Token::Deferrable)
                .space()
                .push(Token::InitiallyImmediate);
        }
        Deferrability::InitiallyDeferred => {
            dialect.require(Feature::DeferrableConstraints)?;
            ts.space()
                .push(Token::Deferrable)
                .space()
                .push(Token::InitiallyDeferred);
        }
    }

    Ok(ts)
}

/// `CONSTRAINT <name> <body>` as used inside CREATE TABLE and ADD CONSTRAINT.
pub(crate) fn constraint_tokens(constraint: &Constraint, cx: &RenderContext) -> Result<TokenStream> {
    let mut ts = TokenStream::new();
    ts.push(Token::Constraint)
        .space()
        .ident(constraint.name())
        .space();
    match constraint {
        Constraint::PrimaryKey { columns, .. } => {
            ts.push(Token::Primary)
                .space()
                .push(Token::Key)
                .space()
                .ident_list(columns);
        }
        Constraint::Unique { columns, .. } => {
            ts.push(Token::Unique).space().ident_list(columns);
        }
        Constraint::Check { condition, .. } => {
            ts.push(Token::Check)
                .space()
                .lparen()
                .append(&condition.to_tokens(cx)?)
                .rparen();
        }
        Constraint::ForeignKey(fk) => {
            ts.append(&foreign_key_tokens(fk, cx)?);
        }
    }
    Ok(ts)
}

fn partition_tokens(partitioning: &PartitionDescriptor, cx: &RenderContext) -> Result<TokenStream> {
    let dialect = cx.dialect;
    let mut ts = TokenStream::new();
    let column = vec![partitioning.column.clone()];
    match &partitioning.method {
        PartitionMethod::Hash { partitions } => {
            dialect.require(Feature::HashPartitioning)?;
            ts.raw("PARTITION BY HASH").space().ident_list(&column);
            if dialect == Dialect::MySql {
                ts.space().raw(format!("PARTITIONS {}", partitions));
            }
        }
        PartitionMethod::Range { schema } | PartitionMethod::List { schema } => {
            let kind = match partitioning.method {
                PartitionMethod::Range { .. } => "RANGE",
                _ => "LIST",
            };
            match dialect {
                Dialect::SqlServer if kind == "RANGE" => {
                    ts.push(Token::On)
                        .space()
                        .ident(schema.clone())
                        .space()
                        .ident_list(&column);
                }
                Dialect::Postgres => {
                    ts.raw(format!("PARTITION BY {}", kind))
                        .space()
                        .ident_list(&column);
                }
                _ => {
                    return Err(Error::unsupported(
                        format!("{} partitioning", kind),
                        dialect.name(),
                    ))
                }
            }
        }
    }
    Ok(ts)
}

// ============================================================================
// CREATE TABLE
// ============================================================================

/// CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateTable {
    pub table: TableRef,
    pub columns: Vec<Column>,
    pub constraints: Vec<Constraint>,
    pub partitioning: Option<PartitionDescriptor>,
}

impl CreateTable {
    /// Create a new CREATE TABLE statement.
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            columns: Vec::new(),
            constraints: Vec::new(),
            partitioning: None,
        }
    }

    /// The definition of a model table. Indexes are separate statements.
    pub fn from_table(table: &Table) -> Self {
        Self {
            table: table.reference().clone(),
            columns: table.columns().to_vec(),
            constraints: table.constraints().cloned().collect(),
            partitioning: table.partitioning().cloned(),
        }
    }

    /// Add a column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a table constraint.
    pub fn constraint(mut self, constraint: impl Into<Constraint>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn partition_by(mut self, partitioning: PartitionDescriptor) -> Self {
        self.partitioning = Some(partitioning);
        self
    }

    /// Primary key declared inline with an SQLite identity column.
    fn inline_key_for(&self, column: &Column) -> Option<&str> {
        match self.constraints.iter().find(|c| matches!(c, Constraint::PrimaryKey { .. })) {
            Some(pk) if pk.columns().len() == 1 && pk.columns()[0] == column.name => Some(pk.name()),
            _ => None,
        }
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        if self.columns.is_empty() {
            return Err(Error::InvalidStatement(format!(
                "CREATE TABLE {} has no columns",
                self.table
            )));
        }

        let dialect = cx.dialect;
        let mut inline_key = None;
        let mut items = Vec::with_capacity(self.columns.len() + self.constraints.len());
        for column in &self.columns {
            let key = match (&column.identity, dialect) {
                (Some(ColumnIdentity::Identity { .. }), Dialect::Sqlite) => {
                    let key = self.inline_key_for(column);
                    inline_key = key;
                    key
                }
                _ => None,
            };
            items.push(column_def_tokens(column, &self.table, cx, key)?);
        }
        for constraint in &self.constraints {
            if inline_key == Some(constraint.name()) {
                continue;
            }
            items.push(constraint_tokens(constraint, cx)?);
        }

        let mut ts = TokenStream::new();
        ts.push(Token::Create)
            .space()
            .push(Token::Table)
            .space()
            .push(table_token(&self.table))
            .space()
            .parenthesized(&items);

        if let Some(partitioning) = &self.partitioning {
            ts.space().append(&partition_tokens(partitioning, cx)?);
        }

        Ok(ts)
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// CREATE INDEX
// ============================================================================

/// CREATE INDEX statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateIndex {
    pub table: TableRef,
    pub index: Index,
}

impl CreateIndex {
    pub fn new(table: TableRef, index: Index) -> Self {
        Self { table, index }
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let dialect = cx.dialect;
        let index = &self.index;
        if index.columns.is_empty() {
            return Err(Error::InvalidStatement(format!(
                "index {} has no columns",
                index.name
            )));
        }

        let mut ts = TokenStream::new();
        ts.push(Token::Create).space();
        if index.unique {
            ts.push(Token::Unique).space();
        }
        ts.push(Token::Index).space();

        // SQLite qualifies the index instead of the table
        if dialect == Dialect::Sqlite {
            ts.push(Token::QualifiedIdent {
                schema: Some(self.table.schema.clone()),
                name: index.name.clone(),
            });
        } else {
            ts.ident(index.name.clone());
        }
        ts.space()
            .push(Token::On)
            .space()
            .push(referenced_table_token(&self.table, dialect));

        let method = match &index.method {
            Some(method) => {
                dialect.require(Feature::IndexMethod)?;
                Some(method)
            }
            None => None,
        };
        if let (Some(method), Dialect::Postgres) = (method, dialect) {
            ts.space().push(Token::Using).space().raw(method.as_str());
        }

        let mut keys = Vec::with_capacity(index.columns.len());
        for column in &index.columns {
            let mut key = TokenStream::new();
            match &column.target {
                IndexTarget::Column(name) => {
                    key.ident(name.clone());
                }
                IndexTarget::Expression(expr) => {
                    dialect.require(Feature::ExpressionIndexes)?;
                    key.lparen().append(&expr.to_tokens(cx)?).rparen();
                }
            }
            if column.direction == SortDirection::Descending {
                key.space().push(Token::Desc);
            }
            keys.push(key);
        }
        ts.space().parenthesized(&keys);

        if let (Some(method), Dialect::MySql) = (method, dialect) {
            let name = method.as_str().to_ascii_uppercase();
            if name != "BTREE" && name != "HASH" {
                return Err(Error::unsupported(
                    format!("index method {}", method.as_str()),
                    dialect.name(),
                ));
            }
            ts.space().push(Token::Using).space().raw(name);
        }

        if let Some(fill) = index.fill_factor {
            dialect.require(Feature::FillFactor)?;
            if dialect == Dialect::Postgres {
                ts.space().raw(format!("WITH (fillfactor = {})", fill));
            }
        }

        if let Some(filter) = &index.filter {
            dialect.require(Feature::PartialIndexes)?;
            ts.space()
                .push(Token::Where)
                .space()
                .append(&filter.to_tokens(cx)?);
        }

        if let (Some(fill), Dialect::SqlServer) = (index.fill_factor, dialect) {
            ts.space().raw(format!("WITH (FILLFACTOR = {})", fill));
        }

        Ok(ts)
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// SEQUENCES
// ============================================================================

fn sequence_bounds(descriptor: &SequenceDescriptor, ts: &mut TokenStream, explicit_absence: bool) {
    match descriptor.min {
        Some(min) => {
            ts.space().push(Token::MinValue).space().push(Token::LitInt(min));
        }
        None if explicit_absence => {
            ts.space().raw("NO MINVALUE");
        }
        None => {}
    }
    match descriptor.max {
        Some(max) => {
            ts.space().push(Token::MaxValue).space().push(Token::LitInt(max));
        }
        None if explicit_absence => {
            ts.space().raw("NO MAXVALUE");
        }
        None => {}
    }
    if descriptor.cyclic {
        ts.space().push(Token::Cycle);
    } else if explicit_absence {
        ts.space().push(Token::NoCycle);
    }
}

/// CREATE SEQUENCE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateSequence {
    pub sequence: SequenceRef,
    pub descriptor: SequenceDescriptor,
}

impl CreateSequence {
    pub fn new(sequence: SequenceRef, descriptor: SequenceDescriptor) -> Self {
        Self {
            sequence,
            descriptor,
        }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        cx.dialect.require(Feature::Sequences)?;
        self.descriptor.validate()?;
        let mut ts = TokenStream::new();
        ts.push(Token::Create)
            .space()
            .push(Token::Sequence)
            .space()
            .push(table_token(&self.sequence))
            .space()
            .push(Token::StartWith)
            .space()
            .push(Token::LitInt(self.descriptor.start))
            .space()
            .push(Token::IncrementBy)
            .space()
            .push(Token::LitInt(self.descriptor.increment));
        sequence_bounds(&self.descriptor, &mut ts, false);
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

/// ALTER SEQUENCE statement. Every numeric property is restated.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct AlterSequence {
    pub sequence: SequenceRef,
    pub descriptor: SequenceDescriptor,
    /// Value the next call returns.
    pub restart: Option<i64>,
}

impl AlterSequence {
    pub fn new(sequence: SequenceRef, descriptor: SequenceDescriptor) -> Self {
        Self {
            sequence,
            descriptor,
            restart: None,
        }
    }

    pub fn restart(mut self, value: i64) -> Self {
        self.restart = Some(value);
        self
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        cx.dialect.require(Feature::Sequences)?;
        let mut ts = TokenStream::new();
        ts.push(Token::Alter)
            .space()
            .push(Token::Sequence)
            .space()
            .push(table_token(&self.sequence));
        if let Some(restart) = self.restart {
            ts.space()
                .push(Token::Restart)
                .space()
                .raw("WITH")
                .space()
                .push(Token::LitInt(restart));
        }
        ts.space()
            .push(Token::IncrementBy)
            .space()
            .push(Token::LitInt(self.descriptor.increment));
        sequence_bounds(&self.descriptor, &mut ts, true);
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// VIEWS AND SCHEMAS
// ============================================================================

/// CREATE VIEW statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateView {
    pub view: TableRef,
    pub definition: ViewDefinition,
}

impl CreateView {
    pub fn new(view: TableRef, definition: impl Into<ViewDefinition>) -> Self {
        Self {
            view,
            definition: definition.into(),
        }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Create)
            .space()
            .push(Token::View)
            .space()
            .push(table_token(&self.view))
            .space()
            .push(Token::As)
            .newline();
        match &self.definition {
            ViewDefinition::Query(query) => {
                ts.append(&query.to_tokens(cx)?);
            }
            ViewDefinition::Native(sql) => {
                ts.raw(sql.trim());
            }
        }
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

/// CREATE SCHEMA statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateSchema {
    pub name: String,
}

impl CreateSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        cx.dialect.require(Feature::Schemas)?;
        let mut ts = TokenStream::new();
        ts.push(Token::Create)
            .space()
            .push(Token::Schema)
            .space()
            .ident(self.name.clone());
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// PARTITION FUNCTIONS AND SCHEMES
// ============================================================================

/// CREATE PARTITION FUNCTION statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreatePartitionFunction {
    pub function: PartitionFunction,
}

impl CreatePartitionFunction {
    pub fn new(function: PartitionFunction) -> Self {
        Self { function }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let dialect = cx.dialect;
        dialect.require(Feature::SchemePartitioning)?;
        let side = match self.function.boundary_side {
            BoundarySide::Left => "LEFT",
            BoundarySide::Right => "RIGHT",
        };
        let boundaries = self
            .function
            .boundaries
            .iter()
            .map(|b| b.to_tokens(cx))
            .collect::<Result<Vec<_>>>()?;

        let mut ts = TokenStream::new();
        ts.raw("CREATE PARTITION FUNCTION")
            .space()
            .ident(self.function.name.clone())
            .space()
            .lparen()
            .raw(dialect.emit_data_type(&self.function.input_type))
            .rparen()
            .space()
            .raw(format!("AS RANGE {} FOR VALUES", side))
            .space()
            .parenthesized(&boundaries);
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

/// CREATE PARTITION SCHEME statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreatePartitionSchema {
    pub schema: PartitionSchema,
}

impl CreatePartitionSchema {
    pub fn new(schema: PartitionSchema) -> Self {
        Self { schema }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        cx.dialect.require(Feature::SchemePartitioning)?;
        let mut ts = TokenStream::new();
        ts.raw("CREATE PARTITION SCHEME")
            .space()
            .ident(self.schema.name.clone())
            .space()
            .raw("AS PARTITION")
            .space()
            .ident(self.schema.function.clone())
            .space()
            .push(Token::To)
            .space()
            .ident_list(&self.schema.filegroups);
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// ALTER TABLE
// ============================================================================

/// A single change applied by ALTER TABLE.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn(Column),
    DropColumn(String),
    SetDefault { column: String, default: Expr },
    DropDefault { column: String },
    AddConstraint(Constraint),
    DropConstraint(String),
}

impl AlterAction {
    fn to_tokens(&self, table: &TableRef, cx: &RenderContext) -> Result<TokenStream> {
        let dialect = cx.dialect;
        let mut ts = TokenStream::new();
        match self {
            AlterAction::AddColumn(column) => {
                ts.push(Token::Add).space();
                if dialect != Dialect::SqlServer {
                    ts.push(Token::Column).space();
                }
                ts.append(&column_def_tokens(column, table, cx, None)?);
            }
            AlterAction::DropColumn(column) => {
                dialect.require(Feature::DropColumn)?;
                ts.push(Token::Drop)
                    .space()
                    .push(Token::Column)
                    .space()
                    .ident(column.clone());
            }
            AlterAction::SetDefault { column, default } => {
                dialect.require(Feature::AlterColumnDefault)?;
                if dialect == Dialect::SqlServer {
                    ts.push(Token::Add)
                        .space()
                        .push(Token::Constraint)
                        .space()
                        .ident(default_constraint_name(table, column))
                        .space()
                        .append(&default_tokens(default, cx)?)
                        .space()
                        .push(Token::For)
                        .space()
                        .ident(column.clone());
                } else {
                    ts.push(Token::Alter)
                        .space()
                        .push(Token::Column)
                        .space()
                        .ident(column.clone())
                        .space()
                        .push(Token::Set)
                        .space()
                        .append(&default_tokens(default, cx)?);
                }
            }
            AlterAction::DropDefault { column } => {
                dialect.require(Feature::AlterColumnDefault)?;
                if dialect == Dialect::SqlServer {
                    ts.push(Token::Drop)
                        .space()
                        .push(Token::Constraint)
                        .space()
                        .ident(default_constraint_name(table, column));
                } else {
                    ts.push(Token::Alter)
                        .space()
                        .push(Token::Column)
                        .space()
                        .ident(column.clone())
                        .space()
                        .push(Token::Drop)
                        .space()
                        .push(Token::Default);
                }
            }
            AlterAction::AddConstraint(constraint) => {
                dialect.require(Feature::AddConstraint)?;
                ts.push(Token::Add)
                    .space()
                    .append(&constraint_tokens(constraint, cx)?);
            }
            AlterAction::DropConstraint(name) => {
                dialect.require(Feature::DropConstraint)?;
                ts.push(Token::Drop)
                    .space()
                    .push(Token::Constraint)
                    .space()
                    .ident(name.clone());
            }
        }
        Ok(ts)
    }
}

/// ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct AlterTable {
    pub table: TableRef,
    pub actions: Vec<AlterAction>,
}

impl AlterTable {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            actions: Vec::new(),
        }
    }

    pub fn action(mut self, action: AlterAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn add_column(self, column: Column) -> Self {
        self.action(AlterAction::AddColumn(column))
    }

    pub fn drop_column(self, column: impl Into<String>) -> Self {
        self.action(AlterAction::DropColumn(column.into()))
    }

    pub fn set_default(self, column: impl Into<String>, default: Expr) -> Self {
        self.action(AlterAction::SetDefault {
            column: column.into(),
            default,
        })
    }

    pub fn drop_default(self, column: impl Into<String>) -> Self {
        self.action(AlterAction::DropDefault {
            column: column.into(),
        })
    }

    pub fn add_constraint(self, constraint: impl Into<Constraint>) -> Self {
        self.action(AlterAction::AddConstraint(constraint.into()))
    }

    pub fn drop_constraint(self, name: impl Into<String>) -> Self {
        self.action(AlterAction::DropConstraint(name.into()))
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        if self.actions.is_empty() {
            return Err(Error::InvalidStatement(format!(
                "ALTER TABLE {} has no actions",
                self.table
            )));
        }
        if self.actions.len() > 1 {
            cx.dialect.require(Feature::MultiActionAlter)?;
        }

        let actions = self
            .actions
            .iter()
            .map(|a| a.to_tokens(&self.table, cx))
            .collect::<Result<Vec<_>>>()?;

        let mut ts = TokenStream::new();
        ts.push(Token::Alter)
            .space()
            .push(Token::Table)
            .space()
            .push(table_token(&self.table))
            .space()
            .comma_separated(&actions);
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// DROP
// ============================================================================

/// Object removed by a DROP statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Table(TableRef),
    View(TableRef),
    Index { table: TableRef, name: String },
    Sequence(SequenceRef),
    Schema(String),
    PartitionFunction(String),
    PartitionSchema(String),
}

/// DROP statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct DropObject {
    pub target: DropTarget,
    pub if_exists: bool,
}

impl DropObject {
    pub fn new(target: DropTarget) -> Self {
        Self {
            target,
            if_exists: false,
        }
    }

    pub fn table(table: TableRef) -> Self {
        Self::new(DropTarget::Table(table))
    }

    pub fn view(view: TableRef) -> Self {
        Self::new(DropTarget::View(view))
    }

    pub fn index(table: TableRef, name: impl Into<String>) -> Self {
        Self::new(DropTarget::Index {
            table,
            name: name.into(),
        })
    }

    pub fn sequence(sequence: SequenceRef) -> Self {
        Self::new(DropTarget::Sequence(sequence))
    }

    pub fn schema(name: impl Into<String>) -> Self {
        Self::new(DropTarget::Schema(name.into()))
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let dialect = cx.dialect;
        let mut ts = TokenStream::new();
        ts.push(Token::Drop).space();

        let kind = match &self.target {
            DropTarget::Table(_) => "TABLE",
            DropTarget::View(_) => "VIEW",
            DropTarget::Index { .. } => "INDEX",
            DropTarget::Sequence(_) => {
                dialect.require(Feature::Sequences)?;
                "SEQUENCE"
            }
            DropTarget::Schema(_) => {
                dialect.require(Feature::Schemas)?;
                "SCHEMA"
            }
            DropTarget::PartitionFunction(_) => {
                dialect.require(Feature::SchemePartitioning)?;
                "PARTITION FUNCTION"
            }
            DropTarget::PartitionSchema(_) => {
                dialect.require(Feature::SchemePartitioning)?;
                "PARTITION SCHEME"
            }
        };
        ts.raw(kind).space();
        if self.if_exists {
            ts.raw("IF EXISTS").space();
        }

        match &self.target {
            DropTarget::Table(t) | DropTarget::View(t) | DropTarget::Sequence(t) => {
                ts.push(table_token(t));
            }
            DropTarget::Index { table, name } => match dialect {
                Dialect::SqlServer | Dialect::MySql => {
                    ts.ident(name.clone())
                        .space()
                        .push(Token::On)
                        .space()
                        .push(table_token(table));
                }
                _ => {
                    ts.push(Token::QualifiedIdent {
                        schema: Some(table.schema.clone()),
                        name: name.clone(),
                    });
                }
            },
            DropTarget::Schema(name)
            | DropTarget::PartitionFunction(name)
            | DropTarget::PartitionSchema(name) => {
                ts.ident(name.clone());
            }
        }
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// RENAME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameTarget {
    Table { new_name: String },
    Column { column: String, new_name: String },
}

/// Renames a table, or a column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct Rename {
    pub table: TableRef,
    pub target: RenameTarget,
}

impl Rename {
    pub fn table(table: TableRef, new_name: impl Into<String>) -> Self {
        Self {
            table,
            target: RenameTarget::Table {
                new_name: new_name.into(),
            },
        }
    }

    pub fn column(table: TableRef, column: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            table,
            target: RenameTarget::Column {
                column: column.into(),
                new_name: new_name.into(),
            },
        }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let dialect = cx.dialect;
        if matches!(self.target, RenameTarget::Column { .. }) {
            dialect.require(Feature::RenameColumn)?;
        }

        let mut ts = TokenStream::new();
        if dialect == Dialect::SqlServer {
            let (object, new_name, kind) = match &self.target {
                RenameTarget::Table { new_name } => (self.table.to_string(), new_name, None),
                RenameTarget::Column { column, new_name } => (
                    format!("{}.{}", self.table, column),
                    new_name,
                    Some("COLUMN"),
                ),
            };
            ts.raw("EXEC sp_rename")
                .space()
                .push(Token::LitString(object))
                .comma()
                .space()
                .push(Token::LitString(new_name.clone()));
            if let Some(kind) = kind {
                ts.comma().space().push(Token::LitString(kind.into()));
            }
            return Ok(ts);
        }

        match &self.target {
            RenameTarget::Table { new_name } if dialect == Dialect::MySql => {
                let renamed = TableRef::new(self.table.schema.clone(), new_name.clone());
                ts.push(Token::Rename)
                    .space()
                    .push(Token::Table)
                    .space()
                    .push(table_token(&self.table))
                    .space()
                    .push(Token::To)
                    .space()
                    .push(table_token(&renamed));
            }
            RenameTarget::Table { new_name } => {
                ts.push(Token::Alter)
                    .space()
                    .push(Token::Table)
                    .space()
                    .push(table_token(&self.table))
                    .space()
                    .push(Token::Rename)
                    .space()
                    .push(Token::To)
                    .space()
                    .ident(new_name.clone());
            }
            RenameTarget::Column { column, new_name } => {
                ts.push(Token::Alter)
                    .space()
                    .push(Token::Table)
                    .space()
                    .push(table_token(&self.table))
                    .space()
                    .push(Token::Rename)
                    .space()
                    .push(Token::Column)
                    .space()
                    .ident(column.clone())
                    .space()
                    .push(Token::To)
                    .space()
                    .ident(new_name.clone());
            }
        }
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

// ============================================================================
// TRUNCATE
// ============================================================================

/// TRUNCATE TABLE statement.
///
/// ```ignore
/// use lattice::model::TableRef;
/// use lattice::sql::ddl::Truncate;
/// use lattice::sql::Dialect;
///
/// let sql = Truncate::table(TableRef::new("dbo", "staging")).to_sql(Dialect::SqlServer)?;
/// assert_eq!(sql, "TRUNCATE TABLE [dbo].[staging]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct Truncate {
    pub table: TableRef,
}

impl Truncate {
    pub fn table(table: TableRef) -> Self {
        Self { table }
    }

    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        cx.dialect.require(Feature::Truncate)?;
        let mut ts = TokenStream::new();
        ts.push(Token::Truncate)
            .space()
            .push(Token::Table)
            .space()
            .push(table_token(&self.table));
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&dialect.into())?.serialize(dialect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IndexColumn, IndexMethod};
    use crate::sql::expr::{col, func, lit_int, lit_str, portable, ExprExt};
    use crate::sql::function::PortableFunction;
    use crate::sql::query::Select;
    use crate::sql::test_utils::validate_sql;
    use crate::sql::types::{Length, ValueType};

    fn employee() -> TableRef {
        TableRef::new("main", "Employee")
    }

    fn employee_table() -> CreateTable {
        CreateTable::new(employee())
            .column(Column::new("Id", ValueType::Int64).not_null().identity(1, 1))
            .column(Column::new("Name", ValueType::VarChar(Length::Fixed(100))).not_null())
            .column(Column::new("Salary", ValueType::Decimal(10, 2)).default_value(lit_int(0)))
            .constraint(Constraint::primary_key("PK_Employee", &["Id"]))
    }

    #[test]
    fn test_create_table_postgres() {
        let sql = employee_table().to_sql(Dialect::Postgres).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE \"main\".\"Employee\" (\"Id\" BIGINT GENERATED BY DEFAULT AS IDENTITY (START WITH 1 INCREMENT BY 1) NOT NULL, \"Name\" VARCHAR(100) NOT NULL, \"Salary\" NUMERIC(10, 2) DEFAULT 0, CONSTRAINT \"PK_Employee\" PRIMARY KEY (\"Id\"))"
        );
        validate_sql(&sql, Dialect::Postgres).unwrap();
    }

    #[test]
    fn test_create_table_sqlserver_names_defaults() {
        let sql = employee_table().to_sql(Dialect::SqlServer).unwrap();
        assert!(sql.contains("[Id] BIGINT IDENTITY(1, 1) NOT NULL"));
        assert!(sql.contains("[Salary] DECIMAL(10, 2) CONSTRAINT [DF_Employee_Salary] DEFAULT 0"));
    }

    #[test]
    fn test_create_table_sqlite_identity_inlines_key() {
        let sql = employee_table().to_sql(Dialect::Sqlite).unwrap();
        assert!(sql.contains(
            "\"Id\" INTEGER NOT NULL CONSTRAINT \"PK_Employee\" PRIMARY KEY AUTOINCREMENT"
        ));
        assert_eq!(sql.matches("PRIMARY KEY").count(), 1);
    }

    #[test]
    fn test_sqlite_identity_requires_single_column_key() {
        let create = CreateTable::new(employee())
            .column(Column::new("Id", ValueType::Int64).identity(1, 1))
            .column(Column::new("Other", ValueType::Int64));
        let err = create.to_sql(Dialect::Sqlite).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_expression_default_is_parenthesized() {
        let create = CreateTable::new(employee()).column(
            Column::new("Hired", ValueType::DateTime)
                .default_value(portable(PortableFunction::CurrentTimestamp, vec![])),
        );
        let sql = create.to_sql(Dialect::Postgres).unwrap();
        assert!(sql.contains("\"Hired\" TIMESTAMP DEFAULT (LOCALTIMESTAMP)"));
    }

    #[test]
    fn test_foreign_key_rendering() {
        let fk = ForeignKey::new("FK_Emp_Dept", &["DeptId"], TableRef::new("main", "Dept"), &["Id"])
            .on_delete(ReferentialAction::Cascade)
            .deferrable(Deferrability::InitiallyDeferred);
        let create = CreateTable::new(employee())
            .column(Column::new("DeptId", ValueType::Int32))
            .constraint(fk.clone());

        let sql = create.to_sql(Dialect::Postgres).unwrap();
        assert!(sql.contains(
            "CONSTRAINT \"FK_Emp_Dept\" FOREIGN KEY (\"DeptId\") REFERENCES \"main\".\"Dept\" (\"Id\") ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED"
        ));

        let sql = create.to_sql(Dialect::Sqlite).unwrap();
        assert!(sql.contains("REFERENCES \"Dept\" (\"Id\")"));

        let err = create.to_sql(Dialect::SqlServer).unwrap_err();
        assert_eq!(
            err.to_string(),
            "deferrable constraints is not supported by the sqlserver dialect"
        );
    }

    #[test]
    fn test_restrict_rejected_on_sqlserver() {
        let fk = ForeignKey::new("FK", &["DeptId"], TableRef::new("main", "Dept"), &["Id"])
            .on_update(ReferentialAction::Restrict);
        let create = CreateTable::new(employee())
            .column(Column::new("DeptId", ValueType::Int32))
            .constraint(fk);
        assert!(create.to_sql(Dialect::SqlServer).is_err());
        assert!(create
            .to_sql(Dialect::MySql)
            .unwrap()
            .contains("ON UPDATE RESTRICT"));
    }

    #[test]
    fn test_check_constraint() {
        let create = CreateTable::new(employee())
            .column(Column::new("Salary", ValueType::Int32))
            .constraint(Constraint::check("CK_Salary", col("Salary").gte(lit_int(0))));
        let sql = create.to_sql(Dialect::MySql).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE `main`.`Employee` (`Salary` INT, CONSTRAINT `CK_Salary` CHECK (`Salary` >= 0))"
        );
    }

    #[test]
    fn test_partitioning() {
        let create = CreateTable::new(employee())
            .column(Column::new("Id", ValueType::Int64))
            .partition_by(PartitionDescriptor::new(
                "Id",
                PartitionMethod::Hash { partitions: 4 },
            ));
        assert!(create
            .to_sql(Dialect::Postgres)
            .unwrap()
            .ends_with(") PARTITION BY HASH (\"Id\")"));
        assert!(create
            .to_sql(Dialect::MySql)
            .unwrap()
            .ends_with(") PARTITION BY HASH (`Id`) PARTITIONS 4"));
        assert!(create.to_sql(Dialect::SqlServer).is_err());

        let ranged = create.clone().partition_by(PartitionDescriptor::new(
            "Id",
            PartitionMethod::Range {
                schema: "ps_Id".into(),
            },
        ));
        assert!(ranged
            .to_sql(Dialect::SqlServer)
            .unwrap()
            .ends_with(") ON [ps_Id] ([Id])"));
        assert!(ranged.to_sql(Dialect::Sqlite).is_err());
    }

    #[test]
    fn test_create_index() {
        let index = Index::on_columns("IX_Employee_Name", &["Name"])
            .unique()
            .filter(col("Active").eq(lit_int(1)));
        let create = CreateIndex::new(employee(), index);

        let sql = create.to_sql(Dialect::Postgres).unwrap();
        assert_eq!(
            sql,
            "CREATE UNIQUE INDEX \"IX_Employee_Name\" ON \"main\".\"Employee\" (\"Name\") WHERE \"Active\" = 1"
        );
        validate_sql(&sql, Dialect::Postgres).unwrap();

        let sql = create.to_sql(Dialect::Sqlite).unwrap();
        assert_eq!(
            sql,
            "CREATE UNIQUE INDEX \"main\".\"IX_Employee_Name\" ON \"Employee\" (\"Name\") WHERE \"Active\" = 1"
        );

        let err = create.to_sql(Dialect::MySql).unwrap_err();
        assert_eq!(
            err.to_string(),
            "partial indexes is not supported by the mysql dialect"
        );
    }

    #[test]
    fn test_index_options_per_dialect() {
        let index = Index::new(
            "IX_Lower",
            vec![
                IndexColumn::expression(func("LOWER", vec![col("Name")])),
                IndexColumn::column("Id").desc(),
            ],
        )
        .method(IndexMethod::BTree)
        .fill_factor(80);
        let create = CreateIndex::new(employee(), index);
        assert_eq!(
            create.to_sql(Dialect::Postgres).unwrap(),
            "CREATE INDEX \"IX_Lower\" ON \"main\".\"Employee\" USING btree ((LOWER(\"Name\")), \"Id\" DESC) WITH (fillfactor = 80)"
        );
        assert!(create.to_sql(Dialect::SqlServer).is_err());

        let plain = CreateIndex::new(
            employee(),
            Index::on_columns("IX_Name", &["Name"]).fill_factor(70),
        );
        assert_eq!(
            plain.to_sql(Dialect::SqlServer).unwrap(),
            "CREATE INDEX [IX_Name] ON [main].[Employee] ([Name]) WITH (FILLFACTOR = 70)"
        );
    }

    #[test]
    fn test_sequences() {
        let seq = SequenceRef::new("main", "EmployeeSeq");
        let create = CreateSequence::new(seq.clone(), SequenceDescriptor::new(100, 5).max(1000));
        assert_eq!(
            create.to_sql(Dialect::Postgres).unwrap(),
            "CREATE SEQUENCE \"main\".\"EmployeeSeq\" START WITH 100 INCREMENT BY 5 MAXVALUE 1000"
        );
        assert_eq!(
            create.to_sql(Dialect::Sqlite).unwrap_err().to_string(),
            "sequences is not supported by the sqlite dialect"
        );

        let alter = AlterSequence::new(seq, SequenceDescriptor::new(1, 2).cyclic()).restart(50);
        assert_eq!(
            alter.to_sql(Dialect::SqlServer).unwrap(),
            "ALTER SEQUENCE [main].[EmployeeSeq] RESTART WITH 50 INCREMENT BY 2 NO MINVALUE NO MAXVALUE CYCLE"
        );
    }

    #[test]
    fn test_sequence_backed_column() {
        let seq = SequenceRef::new("main", "EmployeeSeq");
        let create = CreateTable::new(employee())
            .column(Column::new("Id", ValueType::Int64).not_null().sequence(seq));
        assert!(create
            .to_sql(Dialect::Postgres)
            .unwrap()
            .contains("DEFAULT nextval('\"main\".\"EmployeeSeq\"')"));
        assert!(create
            .to_sql(Dialect::SqlServer)
            .unwrap()
            .contains("DEFAULT NEXT VALUE FOR [main].[EmployeeSeq]"));
    }

    #[test]
    fn test_create_view() {
        let query = Select::from_table(employee())
            .column(col("Name"))
            .filter(col("Salary").gt(lit_int(1000)));
        let view = CreateView::new(TableRef::new("main", "Wealthy"), query);
        let sql = view.to_sql(Dialect::Postgres).unwrap();
        assert!(sql.starts_with("CREATE VIEW \"main\".\"Wealthy\" AS\nSELECT"));
        validate_sql(&sql, Dialect::Postgres).unwrap();

        let native = CreateView::new(
            TableRef::new("main", "Raw"),
            ViewDefinition::Native("SELECT 1".into()),
        );
        assert_eq!(
            native.to_sql(Dialect::Sqlite).unwrap(),
            "CREATE VIEW \"main\".\"Raw\" AS\nSELECT 1"
        );
    }

    #[test]
    fn test_alter_table_actions() {
        let alter = AlterTable::new(employee()).add_column(
            Column::new("Email", ValueType::VarChar(Length::Fixed(200))).default_value(lit_str("")),
        );
        assert_eq!(
            alter.to_sql(Dialect::Postgres).unwrap(),
            "ALTER TABLE \"main\".\"Employee\" ADD COLUMN \"Email\" VARCHAR(200) DEFAULT ''"
        );
        assert_eq!(
            alter.to_sql(Dialect::SqlServer).unwrap(),
            "ALTER TABLE [main].[Employee] ADD [Email] NVARCHAR(200) CONSTRAINT [DF_Employee_Email] DEFAULT ''"
        );

        let multi = AlterTable::new(employee())
            .drop_column("Email")
            .drop_constraint("CK_Salary");
        assert_eq!(
            multi.to_sql(Dialect::Postgres).unwrap(),
            "ALTER TABLE \"main\".\"Employee\" DROP COLUMN \"Email\", DROP CONSTRAINT \"CK_Salary\""
        );
        assert!(multi.to_sql(Dialect::SqlServer).is_err());
        assert!(AlterTable::new(employee()).to_sql(Dialect::Postgres).is_err());
    }

    #[test]
    fn test_alter_defaults() {
        let set = AlterTable::new(employee()).set_default("Salary", lit_int(10));
        assert_eq!(
            set.to_sql(Dialect::Postgres).unwrap(),
            "ALTER TABLE \"main\".\"Employee\" ALTER COLUMN \"Salary\" SET DEFAULT 10"
        );
        assert_eq!(
            set.to_sql(Dialect::SqlServer).unwrap(),
            "ALTER TABLE [main].[Employee] ADD CONSTRAINT [DF_Employee_Salary] DEFAULT 10 FOR [Salary]"
        );
        assert!(set.to_sql(Dialect::Sqlite).is_err());

        let drop = AlterTable::new(employee()).drop_default("Salary");
        assert_eq!(
            drop.to_sql(Dialect::SqlServer).unwrap(),
            "ALTER TABLE [main].[Employee] DROP CONSTRAINT [DF_Employee_Salary]"
        );
    }

    #[test]
    fn test_add_constraint_unsupported_on_sqlite() {
        let alter =
            AlterTable::new(employee()).add_constraint(Constraint::unique("UQ_Name", &["Name"]));
        assert_eq!(
            alter.to_sql(Dialect::Sqlite).unwrap_err().to_string(),
            "ADD CONSTRAINT is not supported by the sqlite dialect"
        );
        assert_eq!(
            alter.to_sql(Dialect::Postgres).unwrap(),
            "ALTER TABLE \"main\".\"Employee\" ADD CONSTRAINT \"UQ_Name\" UNIQUE (\"Name\")"
        );
    }

    #[test]
    fn test_drop_statements() {
        assert_eq!(
            DropObject::table(employee())
                .if_exists()
                .to_sql(Dialect::Postgres)
                .unwrap(),
            "DROP TABLE IF EXISTS \"main\".\"Employee\""
        );
        assert_eq!(
            DropObject::index(employee(), "IX_Name")
                .to_sql(Dialect::SqlServer)
                .unwrap(),
            "DROP INDEX [IX_Name] ON [main].[Employee]"
        );
        assert_eq!(
            DropObject::index(employee(), "IX_Name")
                .to_sql(Dialect::Sqlite)
                .unwrap(),
            "DROP INDEX \"main\".\"IX_Name\""
        );
        assert!(DropObject::schema("hr").to_sql(Dialect::Sqlite).is_err());
    }

    #[test]
    fn test_rename() {
        let rename = Rename::column(employee(), "Name", "FullName");
        assert_eq!(
            rename.to_sql(Dialect::Postgres).unwrap(),
            "ALTER TABLE \"main\".\"Employee\" RENAME COLUMN \"Name\" TO \"FullName\""
        );
        assert_eq!(
            rename.to_sql(Dialect::SqlServer).unwrap(),
            "EXEC sp_rename 'main.Employee.Name', 'FullName', 'COLUMN'"
        );

        let rename = Rename::table(employee(), "Staff");
        assert_eq!(
            rename.to_sql(Dialect::MySql).unwrap(),
            "RENAME TABLE `main`.`Employee` TO `main`.`Staff`"
        );
        assert_eq!(
            rename.to_sql(Dialect::Sqlite).unwrap(),
            "ALTER TABLE \"main\".\"Employee\" RENAME TO \"Staff\""
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(
            Truncate::table(employee()).to_sql(Dialect::SqlServer).unwrap(),
            "TRUNCATE TABLE [main].[Employee]"
        );
        assert_eq!(
            Truncate::table(employee())
                .to_sql(Dialect::Sqlite)
                .unwrap_err()
                .to_string(),
            "TRUNCATE is not supported by the sqlite dialect"
        );
    }

    #[test]
    fn test_partition_function_and_scheme() {
        let function = PartitionFunction::new(
            "pf_Id",
            ValueType::Int32,
            vec![Literal::Int(1000), Literal::Int(2000)],
            BoundarySide::Right,
        );
        assert_eq!(
            CreatePartitionFunction::new(function)
                .to_sql(Dialect::SqlServer)
                .unwrap(),
            "CREATE PARTITION FUNCTION [pf_Id] (INT) AS RANGE RIGHT FOR VALUES (1000, 2000)"
        );
        let scheme = PartitionSchema::new("ps_Id", "pf_Id", &["PRIMARY", "fg2", "fg3"]);
        assert_eq!(
            CreatePartitionSchema::new(scheme.clone())
                .to_sql(Dialect::SqlServer)
                .unwrap(),
            "CREATE PARTITION SCHEME [ps_Id] AS PARTITION [pf_Id] TO ([PRIMARY], [fg2], [fg3])"
        );
        assert!(CreatePartitionSchema::new(scheme)
            .to_sql(Dialect::Postgres)
            .is_err());
    }
}
