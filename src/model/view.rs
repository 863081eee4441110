use super::TableRef;
use crate::sql::query::{QueryExpr, Select};

/// Body of a view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewDefinition {
    Query(Box<QueryExpr>),
    /// Provider SQL kept verbatim, as read back from a live database.
    Native(String),
}

impl From<QueryExpr> for ViewDefinition {
    fn from(query: QueryExpr) -> Self {
        ViewDefinition::Query(Box::new(query))
    }
}

impl From<Select> for ViewDefinition {
    fn from(select: Select) -> Self {
        ViewDefinition::Query(Box::new(select.into()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub(super) reference: TableRef,
    pub definition: ViewDefinition,
}

impl View {
    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn reference(&self) -> &TableRef {
        &self.reference
    }
}
