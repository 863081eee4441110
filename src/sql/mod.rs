//! SQL generation module.
//!
//! This module provides a type-safe statement graph that compiles to
//! multi-dialect SQL. It includes:
//!
//! - [`types`] - Provider-independent scalar types
//! - [`expr`] - Expression AST and builder DSL
//! - [`query`] - SELECT query builder and set operations
//! - [`dml`] - Data Manipulation Language (INSERT, UPDATE, DELETE)
//! - [`ddl`] - Data Definition Language (CREATE, ALTER, DROP, RENAME, TRUNCATE)
//! - [`cursor`] - Cursor DECLARE, OPEN, FETCH, CLOSE
//! - [`statement`] - The statement enum and batches
//! - [`binder`] - Column-reference binding against a catalog
//! - [`compiler`] - Rendering with parameter slots
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod binder;
pub mod compiler;
pub mod cursor;
pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod expr;
pub mod function;
pub mod query;
pub mod statement;
pub mod token;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use compiler::{CompiledStatement, Compiler, ParameterSlot};
pub use dialect::{Dialect, Feature, SqlDialect};
pub use expr::{
    cast, col, exists, extract, func, lit_bool, lit_date, lit_datetime, lit_decimal, lit_float,
    lit_int, lit_null, lit_str, native, param, param_value, portable, row, star, table_col,
    BinaryOperator, Expr, ExprExt, Literal, Parameter, RenderContext, UnaryOperator,
};
pub use function::{DatePart, PortableFunction};
pub use query::{JoinType, OrderByExpr, QueryExpr, Select, SelectExpr, SortDir, TableSource};
pub use statement::{Batch, Statement};
pub use token::{Token, TokenStream};
pub use types::{Length, ValueType};

// Re-export DDL types
pub use ddl::{
    AlterAction, AlterSequence, AlterTable, CreateIndex, CreatePartitionFunction,
    CreatePartitionSchema, CreateSchema, CreateSequence, CreateTable, CreateView, DropObject,
    DropTarget, Rename, RenameTarget, Truncate,
};

// Re-export DML types
pub use dml::{Delete, Insert, InsertSource, Update};

pub use cursor::{CloseCursor, DeclareCursor, FetchCursor, FetchDirection, OpenCursor};
