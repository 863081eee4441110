//! # Lattice
//!
//! A portable database schema model that compiles to multi-dialect SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Model (Catalog graph)                    │
//! │   (schemas, tables, columns, constraints, indexes,       │
//! │    sequences, views, partitioning)                       │
//! └─────────────────────────────────────────────────────────┘
//!            │                                 ▲
//!            ▼ [statement DSL + binder]        │ [extract]
//! ┌──────────────────────────────┐   ┌──────────────────────┐
//! │   Statement / Expr graph      │   │   Live database      │
//! └──────────────────────────────┘   └──────────────────────┘
//!            │                                 ▲
//!            ▼ [compiler + dialect]            │ [mapping]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SQL text + typed parameter slots                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`compare`] diffs two catalogs and builds creation or migration
//! scripts; [`verify`] checks that compiled SQL returns the same result
//! shape as hand-written SQL.

pub mod compare;
pub mod config;
pub mod error;
pub mod extract;
pub mod mapping;
pub mod model;
pub mod sql;
pub mod telemetry;
pub mod verify;

// Re-export SQL submodules at crate level
pub use sql::ddl;
pub use sql::dialect;
pub use sql::dml;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compare::{apply, compare, migration_script, CompareOptions, Difference};
    pub use crate::dialect::{Dialect, Feature, SqlDialect};
    pub use crate::error::{Error, Result};
    pub use crate::expr::{
        // Constructors
        cast,
        col,
        count_star,
        func,
        lit_bool,
        lit_date,
        lit_datetime,
        lit_decimal,
        lit_float,
        lit_int,
        lit_null,
        lit_str,
        native,
        param,
        param_value,
        portable,
        star,
        table_col,
        // Types
        BinaryOperator,
        Expr,
        ExprExt,
        Literal,
        UnaryOperator,
    };
    pub use crate::extract::{Connection, Extractor, SqliteConnection, SqliteExtractor};
    pub use crate::mapping::{mapper_for, MappingOptions, NativeValue, Value};
    pub use crate::model::{
        Catalog, Column, Constraint, ForeignKey, Index, IndexColumn, ReferentialAction,
        SequenceDescriptor, TableRef,
    };
    pub use crate::query::{OrderByExpr, QueryExpr, Select, SelectExpr, SortDir, TableSource};
    pub use crate::sql::{
        Batch, CompiledStatement, Compiler, CreateTable, Delete, Insert, Statement, Update,
        ValueType,
    };
}

// Also export at crate root for convenience
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use model::Catalog;
pub use sql::{Compiler, Statement};
