//! Statement compiler: renders a [`Statement`] for one dialect and collects
//! its parameter slots.
//!
//! # Example
//!
//! ```ignore
//! use lattice::sql::{Compiler, Dialect};
//!
//! let compiled = Compiler::new(Dialect::Postgres).compile(&statement)?;
//! println!("{}", compiled.sql);
//! ```

use sha2::{Digest, Sha256};

use super::binder;
use super::dialect::{Dialect, SqlDialect};
use super::expr::RenderContext;
use super::statement::{Batch, Statement};
use super::types::ValueType;
use crate::error::{Error, Result};
use crate::mapping::{mapper_for, MappingOptions, NativeValue, Value};
use crate::model::Catalog;

/// One placeholder of a compiled statement, in textual order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSlot {
    /// 1-based position, matching the placeholder number.
    pub ordinal: usize,
    pub name: String,
    pub value_type: ValueType,
    pub value: Option<Value>,
}

/// Rendered SQL plus everything needed to execute it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub dialect: Dialect,
    pub sql: String,
    pub parameters: Vec<ParameterSlot>,
    /// SHA-256 of dialect name and SQL text, lowercase hex.
    pub fingerprint: String,
}

impl CompiledStatement {
    fn new(dialect: Dialect, sql: String, parameters: Vec<ParameterSlot>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(dialect.name().as_bytes());
        hasher.update(b"\n");
        hasher.update(sql.as_bytes());
        let fingerprint = format!("{:x}", hasher.finalize());
        Self {
            dialect,
            sql,
            parameters,
            fingerprint,
        }
    }
}

/// Compiles statements for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    dialect: Dialect,
    /// Pinned options; `None` reads the process-wide switches on every call.
    options: Option<MappingOptions>,
}

impl Compiler {
    /// A compiler following the process-wide mapping switches.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            options: None,
        }
    }

    /// Pin the mapping options, ignoring later switch changes.
    pub fn with_options(mut self, options: MappingOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Options the next call will use.
    pub fn options(&self) -> MappingOptions {
        self.options.unwrap_or_else(MappingOptions::current)
    }

    /// Render `statement` without consulting a model.
    pub fn compile(&self, statement: &Statement) -> Result<CompiledStatement> {
        let cx = RenderContext::new(self.dialect).with_options(self.options());
        let tokens = statement.to_tokens(&cx)?;
        let parameters = tokens
            .parameters()
            .into_iter()
            .enumerate()
            .map(|(i, p)| ParameterSlot {
                ordinal: i + 1,
                name: p.name.clone(),
                value_type: p.value_type.clone(),
                value: p.value.clone(),
            })
            .collect::<Vec<_>>();
        let sql = tokens.serialize(self.dialect);

        tracing::debug!(
            dialect = %self.dialect,
            kind = statement.kind(),
            parameters = parameters.len(),
            "compiled statement"
        );
        Ok(CompiledStatement::new(self.dialect, sql, parameters))
    }

    /// Bind `statement` against `catalog`, compile it, then freeze every
    /// model table it touches.
    ///
    /// Nothing is frozen when binding or rendering fails.
    pub fn compile_bound(
        &self,
        statement: &Statement,
        catalog: &mut Catalog,
    ) -> Result<CompiledStatement> {
        binder::bind(statement, catalog)?;
        let compiled = self.compile(statement)?;
        for table in statement.tables() {
            if catalog.table(&table).is_some() {
                catalog.freeze_table(&table)?;
            }
        }
        Ok(compiled)
    }

    /// Compile each statement of a batch, stopping at the first failure.
    pub fn compile_batch(&self, batch: &Batch) -> Result<Vec<CompiledStatement>> {
        batch.iter().map(|s| self.compile(s)).collect()
    }

    /// Convert the slot values of `compiled` to wire values, in ordinal
    /// order. Every slot must carry a value.
    pub fn arguments(&self, compiled: &CompiledStatement) -> Result<Vec<NativeValue>> {
        let mapper = mapper_for(self.dialect);
        let options = self.options();
        compiled
            .parameters
            .iter()
            .map(|slot| {
                let value = slot.value.as_ref().ok_or_else(|| {
                    Error::InvalidStatement(format!("parameter '{}' has no value", slot.name))
                })?;
                mapper.bind(&options, &slot.value_type, value)
            })
            .collect()
    }
}
