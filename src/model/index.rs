use super::TableRef;
use crate::error::{Error, Result};
use crate::sql::expr::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Access method hint. Providers that cannot honour it reject it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexMethod {
    BTree,
    Hash,
    Gin,
    Gist,
    FullText,
    Other(String),
}

impl IndexMethod {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "btree" => IndexMethod::BTree,
            "hash" => IndexMethod::Hash,
            "gin" => IndexMethod::Gin,
            "gist" => IndexMethod::Gist,
            "fulltext" => IndexMethod::FullText,
            _ => IndexMethod::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            IndexMethod::BTree => "btree",
            IndexMethod::Hash => "hash",
            IndexMethod::Gin => "gin",
            IndexMethod::Gist => "gist",
            IndexMethod::FullText => "fulltext",
            IndexMethod::Other(s) => s,
        }
    }
}

/// What an index key is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexTarget {
    Column(String),
    Expression(Expr),
}

/// One key of an index: a column or an expression, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexColumn {
    pub target: IndexTarget,
    pub direction: SortDirection,
}

impl IndexColumn {
    /// Build from optional parts, as extraction sees them. Exactly one of
    /// `column` and `expression` must be given.
    pub fn try_new(
        column: Option<&str>,
        expression: Option<Expr>,
        direction: SortDirection,
    ) -> Result<Self> {
        let target = match (column, expression) {
            (Some(c), None) => IndexTarget::Column(c.to_string()),
            (None, Some(e)) => IndexTarget::Expression(e),
            _ => return Err(Error::InvalidIndexColumn),
        };
        Ok(Self { target, direction })
    }

    pub fn column(name: impl Into<String>) -> Self {
        Self {
            target: IndexTarget::Column(name.into()),
            direction: SortDirection::Ascending,
        }
    }

    pub fn expression(expr: Expr) -> Self {
        Self {
            target: IndexTarget::Expression(expr),
            direction: SortDirection::Ascending,
        }
    }

    #[must_use]
    pub fn desc(mut self) -> Self {
        self.direction = SortDirection::Descending;
        self
    }

    pub fn column_name(&self) -> Option<&str> {
        match &self.target {
            IndexTarget::Column(c) => Some(c),
            IndexTarget::Expression(_) => None,
        }
    }
}

/// A table index.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct Index {
    pub name: String,
    pub columns: Vec<IndexColumn>,
    pub unique: bool,
    /// Percentage, 1..=100.
    pub fill_factor: Option<u8>,
    /// Partial index predicate.
    pub filter: Option<Expr>,
    pub method: Option<IndexMethod>,
    pub(super) table: Option<TableRef>,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: Vec<IndexColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
            unique: false,
            fill_factor: None,
            filter: None,
            method: None,
            table: None,
        }
    }

    /// Index over plain ascending columns.
    pub fn on_columns(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(name, columns.iter().map(|c| IndexColumn::column(*c)).collect())
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn fill_factor(mut self, percent: u8) -> Self {
        self.fill_factor = Some(percent);
        self
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filter = Some(predicate);
        self
    }

    pub fn method(mut self, method: IndexMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Owning table. `None` until the index is added to one.
    pub fn table(&self) -> Option<&TableRef> {
        self.table.as_ref()
    }

    /// Plain column keys, in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| c.column_name())
    }

    /// Every column the index depends on: plain keys, columns inside key
    /// expressions and columns of the filter predicate.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for key in &self.columns {
            match &key.target {
                IndexTarget::Column(c) => out.push(c.as_str()),
                IndexTarget::Expression(e) => out.extend(e.columns().into_iter().map(|(_, c)| c)),
            }
        }
        if let Some(filter) = &self.filter {
            out.extend(filter.columns().into_iter().map(|(_, c)| c));
        }
        out
    }

    pub(super) fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::InvalidModel(format!(
                "index '{}' has no columns",
                self.name
            )));
        }
        if let Some(ff) = self.fill_factor {
            if !(1..=100).contains(&ff) {
                return Err(Error::InvalidModel(format!(
                    "index '{}' fill factor {} is outside 1..=100",
                    self.name, ff
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::col;

    #[test]
    fn test_referenced_columns_include_expressions() {
        use crate::sql::expr::{lit_int, ExprExt};
        let index = Index::new(
            "IX_T",
            vec![
                IndexColumn::column("a"),
                IndexColumn::expression(col("b").add(lit_int(1))),
            ],
        )
        .filter(col("c").gt(lit_int(0)));
        assert_eq!(index.referenced_columns(), vec!["a", "b", "c"]);
        assert_eq!(index.column_names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_index_column_exclusivity() {
        assert!(matches!(
            IndexColumn::try_new(Some("a"), Some(col("a")), SortDirection::Ascending),
            Err(Error::InvalidIndexColumn)
        ));
        assert!(matches!(
            IndexColumn::try_new(None, None, SortDirection::Ascending),
            Err(Error::InvalidIndexColumn)
        ));
        let ok = IndexColumn::try_new(Some("a"), None, SortDirection::Descending).unwrap();
        assert_eq!(ok.column_name(), Some("a"));
        assert_eq!(ok.direction, SortDirection::Descending);
    }

    #[test]
    fn test_fill_factor_bounds() {
        assert!(Index::on_columns("ix", &["a"]).fill_factor(0).validate().is_err());
        assert!(Index::on_columns("ix", &["a"]).fill_factor(100).validate().is_ok());
        assert!(Index::new("ix", vec![]).validate().is_err());
    }
}
