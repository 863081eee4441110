use std::collections::BTreeMap;

use super::constraint::Constraint;
use super::index::Index;
use super::partition::PartitionDescriptor;
use super::{SequenceRef, TableRef};
use crate::sql::expr::Expr;
use crate::sql::types::ValueType;

/// How a column produces values on insert when none is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnIdentity {
    /// Provider-native identity / auto-increment.
    Identity { start: i64, increment: i64 },
    /// Default drawn from a catalog sequence.
    Sequence(SequenceRef),
}

/// A table column. Position within the owning table is significant.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct Column {
    pub name: String,
    pub value_type: ValueType,
    pub nullable: bool,
    pub default: Option<Expr>,
    pub identity: Option<ColumnIdentity>,
    pub(super) table: Option<TableRef>,
}

impl Column {
    /// A nullable column with no default.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            nullable: true,
            default: None,
            identity: None,
            table: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn default_value(mut self, expr: Expr) -> Self {
        self.default = Some(expr);
        self
    }

    pub fn identity(mut self, start: i64, increment: i64) -> Self {
        self.identity = Some(ColumnIdentity::Identity { start, increment });
        self
    }

    pub fn sequence(mut self, sequence: SequenceRef) -> Self {
        self.identity = Some(ColumnIdentity::Sequence(sequence));
        self
    }

    /// Owning table. `None` until the column is added to one.
    pub fn table(&self) -> Option<&TableRef> {
        self.table.as_ref()
    }
}

/// A table: ordered columns plus named constraints and indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub(super) reference: TableRef,
    pub(super) columns: Vec<Column>,
    pub(super) constraints: BTreeMap<String, Constraint>,
    pub(super) indexes: BTreeMap<String, Index>,
    pub(super) partitioning: Option<PartitionDescriptor>,
    pub(super) frozen: bool,
}

impl Table {
    pub(super) fn new(reference: TableRef) -> Self {
        Self {
            reference,
            columns: Vec::new(),
            constraints: BTreeMap::new(),
            indexes: BTreeMap::new(),
            partitioning: None,
            frozen: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn schema(&self) -> &str {
        &self.reference.schema
    }

    pub fn reference(&self) -> &TableRef {
        &self.reference
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Constraints ordered by name.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.get(name)
    }

    pub fn primary_key(&self) -> Option<&Constraint> {
        self.constraints
            .values()
            .find(|c| matches!(c, Constraint::PrimaryKey { .. }))
    }

    /// Indexes ordered by name.
    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.values()
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.get(name)
    }

    pub fn partitioning(&self) -> Option<&PartitionDescriptor> {
        self.partitioning.as_ref()
    }

    /// Whether this table itself was frozen. Ancestors may still lock it;
    /// see [`super::Catalog::is_table_frozen`].
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Tables this one references through foreign keys, excluding itself.
    pub fn referenced_tables(&self) -> Vec<&TableRef> {
        let mut refs: Vec<&TableRef> = self
            .constraints
            .values()
            .filter_map(|c| match c {
                Constraint::ForeignKey(fk) if fk.referenced_table != self.reference => {
                    Some(&fk.referenced_table)
                }
                _ => None,
            })
            .collect();
        refs.sort();
        refs.dedup();
        refs
    }

    /// Members of this table that mention `column`, as `kind 'name'` labels.
    pub(super) fn dependents_of_column(&self, column: &str) -> Vec<String> {
        let mut found = Vec::new();
        for c in self.constraints.values() {
            let local = match c {
                Constraint::PrimaryKey { columns, .. } | Constraint::Unique { columns, .. } => {
                    columns.iter().any(|n| n == column)
                }
                Constraint::ForeignKey(fk) => {
                    fk.columns.iter().any(|n| n == column)
                        || (fk.referenced_table == self.reference
                            && fk.referenced_columns.iter().any(|n| n == column))
                }
                Constraint::Check { .. } => c.condition_columns().contains(&column),
            };
            if local {
                found.push(format!("constraint '{}'", c.name()));
            }
        }
        for index in self.indexes.values() {
            if index.referenced_columns().contains(&column) {
                found.push(format!("index '{}'", index.name));
            }
        }
        if let Some(p) = &self.partitioning {
            if p.column == column {
                found.push("partitioning".to_string());
            }
        }
        found
    }
}
