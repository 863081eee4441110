//! In-memory model of database structural metadata.
//!
//! A [`Catalog`] owns schemas; schemas own tables, views and sequences;
//! tables own their columns, constraints, indexes and partitioning. Every
//! named collection is an ordered map so iteration (and therefore generated
//! SQL) is deterministic.
//!
//! Cross-entity references are by name only ([`TableRef`], [`SequenceRef`],
//! partition schema and function names) and are validated against the owning
//! catalog whenever an entity is inserted or removed. Table members are
//! mutated through a [`TableMut`] handle, which keeps the whole catalog in
//! view so references into other tables can be checked.
//!
//! Freezing is monotonic: once a catalog, schema or table is frozen every
//! mutator on it (or on anything below it) fails with `ModelLocked` and
//! leaves the model as it was.
//!
//! # Example
//!
//! ```ignore
//! use lattice::model::{Catalog, Column, Constraint};
//! use lattice::sql::types::ValueType;
//!
//! let mut catalog = Catalog::new("hr", "main");
//! let employee = catalog.create_table("main", "Employee")?;
//! let mut t = catalog.table_mut(&employee)?;
//! t.add_column(Column::new("Id", ValueType::Int32).not_null())?;
//! t.add_constraint(Constraint::primary_key("PK_Employee", &["Id"]))?;
//! ```

mod catalog;
mod constraint;
mod index;
mod partition;
mod schema;
mod sequence;
mod table;
mod view;

pub use catalog::{Catalog, TableMut};
pub use constraint::{Constraint, Deferrability, ForeignKey, MatchType, ReferentialAction};
pub use index::{Index, IndexColumn, IndexMethod, IndexTarget, SortDirection};
pub use partition::{
    BoundarySide, PartitionDescriptor, PartitionFunction, PartitionMethod, PartitionSchema,
};
pub use schema::Schema;
pub use sequence::{Sequence, SequenceDescriptor};
pub use table::{Column, ColumnIdentity, Table};
pub use view::{View, ViewDefinition};

use std::fmt;

/// Schema-qualified name of a model object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub schema: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Non-owning reference to a table.
pub type TableRef = QualifiedName;

/// Non-owning reference to a sequence.
pub type SequenceRef = QualifiedName;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_ordering() {
        let mut refs = vec![
            TableRef::new("sales", "Order"),
            TableRef::new("main", "Employee"),
            TableRef::new("main", "Department"),
        ];
        refs.sort();
        let shown: Vec<_> = refs.iter().map(|r| r.to_string()).collect();
        assert_eq!(shown, vec!["main.Department", "main.Employee", "sales.Order"]);
    }
}
