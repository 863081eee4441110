//! Host values <-> provider wire values.
//!
//! A [`TypeMapper`] converts a host [`Value`] into the [`NativeValue`] a
//! provider driver sends for a parameter of a given [`ValueType`], and back.
//! Every call takes a [`MappingOptions`] context; nothing here reads global
//! state except [`MappingOptions::current`], which snapshots the
//! process-wide [`switches`] at the moment it is called.
//!
//! # Example
//!
//! ```ignore
//! use lattice::mapping::{mapper_for, MappingOptions, Value};
//! use lattice::sql::{Dialect, ValueType};
//!
//! let mapper = mapper_for(Dialect::Postgres);
//! let native = mapper.bind(&MappingOptions::default(), &ValueType::Int32, &Value::Int32(7))?;
//! ```

pub mod defaults;
pub(crate) mod convert;
pub mod interval;
mod mysql;
mod options;
mod postgres;
mod sqlite;
mod sqlserver;
pub mod switches;
pub mod temporal;
pub mod timezone;
mod value;

pub use interval::NativeInterval;
pub use mysql::MySqlMapper;
pub use options::MappingOptions;
pub use postgres::PostgresMapper;
pub use sqlite::SqliteMapper;
pub use sqlserver::SqlServerMapper;
pub use temporal::date_part;
pub use timezone::resolve_timezone;
pub use value::{NativeRow, NativeValue, Sign, Value};

use std::fmt;

use crate::error::{Error, Result};
use crate::sql::dialect::Dialect;
use crate::sql::expr::Expr;
use crate::sql::types::ValueType;

/// Per-provider conversion between host values and wire values.
pub trait TypeMapper: fmt::Debug + Send + Sync {
    /// Dialect whose driver this mapper feeds.
    fn dialect(&self) -> Dialect;

    /// Convert a host value for a parameter declared as `ty`.
    fn bind(&self, options: &MappingOptions, ty: &ValueType, value: &Value) -> Result<NativeValue>;

    /// Convert a wire value read from a column declared as `ty`.
    fn decode(&self, options: &MappingOptions, ty: &ValueType, native: &NativeValue)
        -> Result<Value>;

    /// Read the value at `ordinal` (0-based) of a row.
    fn read(
        &self,
        options: &MappingOptions,
        row: &dyn NativeRow,
        ordinal: usize,
        ty: &ValueType,
    ) -> Result<Value> {
        let native = row
            .value_at(ordinal)
            .ok_or_else(|| Error::not_found("column ordinal", ordinal.to_string()))?;
        self.decode(options, ty, native)
    }

    /// Turn a catalog default-value text into an expression.
    ///
    /// Never fails: text that cannot be parsed becomes `Expr::Native`.
    fn decode_default(&self, ty: &ValueType, text: &str) -> Expr {
        defaults::decode_default(self.dialect(), ty, text)
    }
}

/// The mapper for a dialect. ANSI has no driver and borrows the Postgres
/// conversions.
pub fn mapper_for(dialect: Dialect) -> &'static dyn TypeMapper {
    match dialect {
        Dialect::Postgres | Dialect::Ansi => &PostgresMapper,
        Dialect::SqlServer => &SqlServerMapper,
        Dialect::MySql => &MySqlMapper,
        Dialect::Sqlite => &SqliteMapper,
    }
}

/// Bind with the process-wide switches as they are right now.
pub fn bind_current(mapper: &dyn TypeMapper, ty: &ValueType, value: &Value) -> Result<NativeValue> {
    mapper.bind(&MappingOptions::current(), ty, value)
}

/// Decode with the process-wide switches as they are right now.
pub fn decode_current(
    mapper: &dyn TypeMapper,
    ty: &ValueType,
    native: &NativeValue,
) -> Result<Value> {
    mapper.decode(&MappingOptions::current(), ty, native)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapper_for_dialect() {
        assert_eq!(mapper_for(Dialect::Postgres).dialect(), Dialect::Postgres);
        assert_eq!(mapper_for(Dialect::SqlServer).dialect(), Dialect::SqlServer);
        assert_eq!(mapper_for(Dialect::MySql).dialect(), Dialect::MySql);
        assert_eq!(mapper_for(Dialect::Sqlite).dialect(), Dialect::Sqlite);
    }

    #[test]
    fn test_read_missing_ordinal() {
        let row = vec![NativeValue::Int(1)];
        let err = SqliteMapper
            .read(&MappingOptions::default(), &row, 3, &ValueType::Int32)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_read_by_ordinal() {
        let row = vec![NativeValue::Int(1), NativeValue::Text("x".into())];
        let v = SqliteMapper
            .read(&MappingOptions::default(), &row, 1, &ValueType::Text)
            .unwrap();
        assert_eq!(v, Value::String("x".into()));
    }
}
