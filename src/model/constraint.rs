use std::fmt;

use super::TableRef;
use crate::sql::expr::Expr;

/// Action taken on dependent rows when a referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
        })
    }
}

impl ReferentialAction {
    /// Parse the spelling providers report (`CASCADE`, `SET NULL`, `a`, `c`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NO ACTION" | "NO_ACTION" | "A" => Some(ReferentialAction::NoAction),
            "CASCADE" | "C" => Some(ReferentialAction::Cascade),
            "SET NULL" | "SET_NULL" | "N" => Some(ReferentialAction::SetNull),
            "SET DEFAULT" | "SET_DEFAULT" | "D" => Some(ReferentialAction::SetDefault),
            "RESTRICT" | "R" => Some(ReferentialAction::Restrict),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deferrability {
    #[default]
    NotDeferrable,
    InitiallyImmediate,
    InitiallyDeferred,
}

/// How multi-column foreign keys treat partially-null rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchType {
    /// Provider default (`MATCH SIMPLE`).
    #[default]
    None,
    Full,
    Partial,
}

/// A foreign key. Both column lists are non-empty and of equal length.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: TableRef,
    pub referenced_columns: Vec<String>,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
    pub deferrability: Deferrability,
    pub match_type: MatchType,
}

impl ForeignKey {
    pub fn new(
        name: impl Into<String>,
        columns: &[&str],
        referenced_table: TableRef,
        referenced_columns: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_table,
            referenced_columns: referenced_columns.iter().map(|c| c.to_string()).collect(),
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
            deferrability: Deferrability::NotDeferrable,
            match_type: MatchType::None,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn deferrable(mut self, deferrability: Deferrability) -> Self {
        self.deferrability = deferrability;
        self
    }

    pub fn match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = match_type;
        self
    }
}

/// A table constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    PrimaryKey { name: String, columns: Vec<String> },
    Unique { name: String, columns: Vec<String> },
    ForeignKey(ForeignKey),
    Check { name: String, condition: Expr },
}

impl Constraint {
    pub fn primary_key(name: impl Into<String>, columns: &[&str]) -> Self {
        Constraint::PrimaryKey {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Constraint::Unique {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn check(name: impl Into<String>, condition: Expr) -> Self {
        Constraint::Check {
            name: name.into(),
            condition,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Constraint::PrimaryKey { name, .. }
            | Constraint::Unique { name, .. }
            | Constraint::Check { name, .. } => name,
            Constraint::ForeignKey(fk) => &fk.name,
        }
    }

    /// Local key columns. Empty for CHECK.
    pub fn columns(&self) -> &[String] {
        match self {
            Constraint::PrimaryKey { columns, .. } | Constraint::Unique { columns, .. } => columns,
            Constraint::ForeignKey(fk) => &fk.columns,
            Constraint::Check { .. } => &[],
        }
    }

    /// Columns the CHECK condition mentions. Empty for the other kinds.
    pub fn condition_columns(&self) -> Vec<&str> {
        match self {
            Constraint::Check { condition, .. } => {
                condition.columns().into_iter().map(|(_, c)| c).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::PrimaryKey { .. } => "primary key",
            Constraint::Unique { .. } => "unique constraint",
            Constraint::ForeignKey(_) => "foreign key",
            Constraint::Check { .. } => "check constraint",
        }
    }

    /// Whether this is a primary or unique key over exactly `columns`.
    pub(super) fn is_key_on(&self, columns: &[String]) -> bool {
        match self {
            Constraint::PrimaryKey { columns: c, .. } | Constraint::Unique { columns: c, .. } => {
                c == columns
            }
            _ => false,
        }
    }
}

impl From<ForeignKey> for Constraint {
    fn from(fk: ForeignKey) -> Self {
        Constraint::ForeignKey(fk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referential_action_parse() {
        assert_eq!(ReferentialAction::parse("set null"), Some(ReferentialAction::SetNull));
        assert_eq!(ReferentialAction::parse("c"), Some(ReferentialAction::Cascade));
        assert_eq!(ReferentialAction::parse("bogus"), None);
    }

    #[test]
    fn test_constraint_accessors() {
        let fk: Constraint = ForeignKey::new(
            "FK_Employee_Manager",
            &["ManagerId"],
            TableRef::new("main", "Employee"),
            &["Id"],
        )
        .on_delete(ReferentialAction::SetNull)
        .into();
        assert_eq!(fk.name(), "FK_Employee_Manager");
        assert_eq!(fk.columns(), ["ManagerId".to_string()]);
        assert_eq!(fk.kind(), "foreign key");
    }
}
