use crate::sql::expr::Literal;
use crate::sql::types::ValueType;

/// Which partition a boundary value itself belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundarySide {
    #[default]
    Left,
    Right,
}

/// Maps values of one type onto numbered partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionFunction {
    pub name: String,
    pub input_type: ValueType,
    pub boundaries: Vec<Literal>,
    pub boundary_side: BoundarySide,
}

impl PartitionFunction {
    pub fn new(
        name: impl Into<String>,
        input_type: ValueType,
        boundaries: Vec<Literal>,
        boundary_side: BoundarySide,
    ) -> Self {
        Self {
            name: name.into(),
            input_type,
            boundaries,
            boundary_side,
        }
    }
}

/// Places the partitions of a function onto filegroups, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionSchema {
    pub name: String,
    pub function: String,
    pub filegroups: Vec<String>,
}

impl PartitionSchema {
    pub fn new(name: impl Into<String>, function: impl Into<String>, filegroups: &[&str]) -> Self {
        Self {
            name: name.into(),
            function: function.into(),
            filegroups: filegroups.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionMethod {
    Hash { partitions: u32 },
    /// Values listed by the named partition schema's function.
    List { schema: String },
    /// Ranges bounded by the named partition schema's function.
    Range { schema: String },
}

/// How a table is partitioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescriptor {
    pub column: String,
    pub method: PartitionMethod,
}

impl PartitionDescriptor {
    pub fn new(column: impl Into<String>, method: PartitionMethod) -> Self {
        Self {
            column: column.into(),
            method,
        }
    }

    /// Partition schema this descriptor depends on, if any.
    pub fn partition_schema(&self) -> Option<&str> {
        match &self.method {
            PartitionMethod::Hash { .. } => None,
            PartitionMethod::List { schema } | PartitionMethod::Range { schema } => Some(schema),
        }
    }
}
