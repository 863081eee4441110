//! Result-shape equivalence between compiled and hand-written SQL.
//!
//! Test harnesses run a compiled statement and the native SQL it is meant
//! to replace against the same connection and compare what comes back:
//! row count, field count and field names.

use std::fmt;

use crate::error::{Error, Result};
use crate::extract::{Connection, RowSet};
use crate::mapping::{mapper_for, MappingOptions};
use crate::sql::compiler::CompiledStatement;

/// Shape of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultShape {
    pub rows: usize,
    pub fields: usize,
    pub field_names: Vec<String>,
}

impl ResultShape {
    pub fn of(rows: &RowSet) -> Self {
        Self {
            rows: rows.len(),
            fields: rows.columns.len(),
            field_names: rows.columns.clone(),
        }
    }
}

impl fmt::Display for ResultShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows x {} fields [{}]",
            self.rows,
            self.fields,
            self.field_names.join(", ")
        )
    }
}

/// Outcome of [`check_equivalence`].
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceReport {
    pub compiled: ResultShape,
    pub native: ResultShape,
    /// Whether the row values matched too, in order.
    pub same_values: bool,
}

impl EquivalenceReport {
    /// Same row count, field count and field names.
    pub fn is_equivalent(&self) -> bool {
        self.compiled == self.native
    }
}

/// Execute `compiled` (with its bound parameter values) and `native_sql`
/// on `conn` and compare the results.
///
/// Every parameter slot of `compiled` must carry a value. Result sets are
/// materialised and released before this returns, on success and on error.
pub fn check_equivalence(
    conn: &mut dyn Connection,
    compiled: &CompiledStatement,
    native_sql: &str,
) -> Result<EquivalenceReport> {
    if conn.dialect() != compiled.dialect {
        return Err(Error::InvalidStatement(format!(
            "statement compiled for {} cannot run on a {} connection",
            compiled.dialect,
            conn.dialect()
        )));
    }

    let options = MappingOptions::current();
    let mapper = mapper_for(compiled.dialect);
    let arguments = compiled
        .parameters
        .iter()
        .map(|slot| {
            let value = slot.value.as_ref().ok_or_else(|| {
                Error::InvalidStatement(format!("parameter '{}' has no value", slot.name))
            })?;
            mapper.bind(&options, &slot.value_type, value)
        })
        .collect::<Result<Vec<_>>>()?;

    let compiled_rows = conn.query(&compiled.sql, &arguments)?;
    let native_rows = conn.query(native_sql, &[])?;

    let report = EquivalenceReport {
        compiled: ResultShape::of(&compiled_rows),
        native: ResultShape::of(&native_rows),
        same_values: compiled_rows.rows == native_rows.rows,
    };
    tracing::debug!(
        compiled = %report.compiled,
        native = %report.native,
        equivalent = report.is_equivalent(),
        "checked result equivalence"
    );
    Ok(report)
}
