//! Column-reference binding against a catalog.
//!
//! The binder checks that every column a statement names resolves to one
//! of the sources in scope: the FROM and JOIN sources of the enclosing
//! SELECT block, then those of outer blocks for correlated subqueries. It
//! also catches ALTER TABLE constraint additions that collide with each
//! other or with the bound model.
//!
//! Views and derived tables without a nameable select list are opaque and
//! accept any column.

use std::collections::BTreeSet;

use super::ddl::AlterAction;
use super::dml::InsertSource;
use super::expr::Expr;
use super::query::{QueryExpr, Select, TableSource};
use super::statement::Statement;
use crate::error::{Error, Result};
use crate::model::{Catalog, Constraint, ForeignKey, IndexTarget, TableRef, ViewDefinition};

/// Check `statement` against `catalog`.
pub fn bind(statement: &Statement, catalog: &Catalog) -> Result<()> {
    Binder::new(catalog, statement.kind()).statement(statement)
}

#[derive(Debug)]
struct Source {
    name: String,
    /// `None` when the columns are unknown.
    columns: Option<Vec<String>>,
}

impl Source {
    fn has(&self, column: &str) -> bool {
        self.columns
            .as_ref()
            .map_or(true, |cols| cols.iter().any(|c| c == column))
    }
}

struct Binder<'a> {
    catalog: &'a Catalog,
    statement: &'static str,
    scopes: Vec<Vec<Source>>,
}

impl<'a> Binder<'a> {
    fn new(catalog: &'a Catalog, statement: &'static str) -> Self {
        Self {
            catalog,
            statement,
            scopes: Vec::new(),
        }
    }

    fn unbound(&self, column: String) -> Error {
        Error::UnboundColumnReference {
            column,
            statement: self.statement.to_string(),
        }
    }

    fn statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Query(q) => self.query(q),
            Statement::DeclareCursor(c) => self.query(&c.query),
            Statement::CreateView(v) => match &v.definition {
                ViewDefinition::Query(q) => self.query(q),
                ViewDefinition::Native(_) => Ok(()),
            },
            Statement::Insert(insert) => {
                let target = self.relation(&insert.table, None)?;
                for column in &insert.columns {
                    if !target.has(column) {
                        return Err(self.unbound(column.clone()));
                    }
                }
                match &insert.source {
                    InsertSource::Values(rows) => {
                        // VALUES rows see no columns
                        self.scopes.push(Vec::new());
                        for expr in rows.iter().flatten() {
                            self.expr(expr, &[])?;
                        }
                        self.scopes.pop();
                        Ok(())
                    }
                    InsertSource::Query(q) => self.query(q),
                }
            }
            Statement::Update(update) => {
                let target = self.relation(&update.table, None)?;
                for (column, _) in &update.set {
                    if !target.has(column) {
                        return Err(self.unbound(column.clone()));
                    }
                }
                self.scopes.push(vec![target]);
                for (_, value) in &update.set {
                    self.expr(value, &[])?;
                }
                if let Some(filter) = &update.filter {
                    self.expr(filter, &[])?;
                }
                self.scopes.pop();
                Ok(())
            }
            Statement::Delete(delete) => {
                let target = self.relation(&delete.table, None)?;
                self.scopes.push(vec![target]);
                if let Some(filter) = &delete.filter {
                    self.expr(filter, &[])?;
                }
                self.scopes.pop();
                Ok(())
            }
            Statement::CreateTable(create) => {
                let source = Source {
                    name: create.table.name.clone(),
                    columns: Some(create.columns.iter().map(|c| c.name.clone()).collect()),
                };
                for constraint in &create.constraints {
                    for column in constraint.columns() {
                        if !source.has(column) {
                            return Err(self.unbound(column.clone()));
                        }
                    }
                }
                self.scopes.push(vec![source]);
                for expr in statement.definition_expressions() {
                    self.expr(expr, &[])?;
                }
                self.scopes.pop();
                Ok(())
            }
            Statement::CreateIndex(create) => {
                let target = self.relation(&create.table, None)?;
                for column in &create.index.columns {
                    if let IndexTarget::Column(name) = &column.target {
                        if !target.has(name) {
                            return Err(self.unbound(name.clone()));
                        }
                    }
                }
                self.scopes.push(vec![target]);
                for expr in statement.definition_expressions() {
                    self.expr(expr, &[])?;
                }
                self.scopes.pop();
                Ok(())
            }
            Statement::AlterTable(alter) => self.alter_table(&alter.table, &alter.actions),
            _ => Ok(()),
        }
    }

    /// Constraint additions must not collide by name or add a second
    /// primary key, and every column they name must exist in the table as
    /// altered so far. Unknown tables are left to the database.
    fn alter_table(&self, table: &TableRef, actions: &[AlterAction]) -> Result<()> {
        let existing = self.catalog.table(table);
        let mut columns: BTreeSet<String> = existing
            .map(|t| t.columns().iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default();
        let mut names: BTreeSet<String> = existing
            .map(|t| t.constraints().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let mut primary_key = existing
            .and_then(|t| t.primary_key())
            .map(|pk| pk.name().to_string());

        for action in actions {
            match action {
                AlterAction::AddColumn(column) => {
                    columns.insert(column.name.clone());
                }
                AlterAction::DropConstraint(name) => {
                    names.remove(name);
                    if primary_key.as_deref() == Some(name.as_str()) {
                        primary_key = None;
                    }
                }
                AlterAction::AddConstraint(constraint) => {
                    let name = constraint.name();
                    let second_key =
                        matches!(constraint, Constraint::PrimaryKey { .. }) && primary_key.is_some();
                    if !names.insert(name.to_string()) || second_key {
                        return Err(Error::DuplicateConstraint {
                            name: name.to_string(),
                            table: table.to_string(),
                        });
                    }
                    if matches!(constraint, Constraint::PrimaryKey { .. }) {
                        primary_key = Some(name.to_string());
                    }
                    if existing.is_none() {
                        continue;
                    }
                    let mentioned = constraint
                        .columns()
                        .iter()
                        .map(String::as_str)
                        .chain(constraint.condition_columns());
                    for column in mentioned {
                        if !columns.contains(column) {
                            return Err(self.unbound(column.to_string()));
                        }
                    }
                    if let Constraint::ForeignKey(fk) = constraint {
                        self.referenced_columns(table, &columns, fk)?;
                    }
                }
                AlterAction::SetDefault { column, .. }
                | AlterAction::DropDefault { column }
                | AlterAction::DropColumn(column) => {
                    if existing.is_some() && !columns.contains(column) {
                        return Err(self.unbound(column.clone()));
                    }
                    if matches!(action, AlterAction::DropColumn(_)) {
                        columns.remove(column);
                    }
                }
            }
        }
        Ok(())
    }

    /// Referenced columns of a foreign key must exist in its target.
    fn referenced_columns(
        &self,
        table: &TableRef,
        columns: &BTreeSet<String>,
        fk: &ForeignKey,
    ) -> Result<()> {
        let target: BTreeSet<String> = if &fk.referenced_table == table {
            columns.clone()
        } else {
            match self.catalog.table(&fk.referenced_table) {
                Some(t) => t.columns().iter().map(|c| c.name.clone()).collect(),
                None => {
                    return Err(Error::not_found("table", fk.referenced_table.to_string()));
                }
            }
        };
        match fk.referenced_columns.iter().find(|c| !target.contains(*c)) {
            Some(missing) => Err(self.unbound(format!("{}.{}", fk.referenced_table.name, missing))),
            None => Ok(()),
        }
    }

    /// Columns of a model relation. Views are opaque.
    fn relation(&self, table: &TableRef, alias: Option<&str>) -> Result<Source> {
        let columns = if let Some(t) = self.catalog.table(table) {
            Some(t.columns().iter().map(|c| c.name.clone()).collect())
        } else if self.catalog.view(table).is_some() {
            None
        } else {
            return Err(Error::not_found("table", table.to_string()));
        };
        Ok(Source {
            name: alias.unwrap_or(&table.name).to_string(),
            columns,
        })
    }

    fn query(&mut self, query: &QueryExpr) -> Result<()> {
        for select in query.selects() {
            self.select(select)?;
        }
        Ok(())
    }

    fn select(&mut self, select: &Select) -> Result<()> {
        let mut sources = Vec::new();
        for source in select.sources() {
            match source {
                TableSource::Table { table, alias } => {
                    sources.push(self.relation(table, alias.as_deref())?);
                }
                TableSource::Query { query, alias } => {
                    self.query(query)?;
                    sources.push(Source {
                        name: alias.clone(),
                        columns: derived_columns(query),
                    });
                }
            }
        }

        let aliases: Vec<String> = select
            .columns
            .iter()
            .filter_map(|c| c.alias.clone())
            .collect();

        self.scopes.push(sources);
        let result = self.select_body(select, &aliases);
        self.scopes.pop();
        result
    }

    fn select_body(&mut self, select: &Select, aliases: &[String]) -> Result<()> {
        for c in &select.columns {
            self.expr(&c.expr, &[])?;
        }
        for join in &select.joins {
            if let Some(on) = &join.on {
                self.expr(on, &[])?;
            }
        }
        if let Some(filter) = &select.filter {
            self.expr(filter, &[])?;
        }
        for g in &select.group_by {
            self.expr(g, &[])?;
        }
        if let Some(having) = &select.having {
            self.expr(having, aliases)?;
        }
        for o in &select.order_by {
            self.expr(&o.expr, aliases)?;
        }
        Ok(())
    }

    /// Resolve the column references of `expr`, then bind its subqueries
    /// with the current scopes visible.
    fn expr(&mut self, expr: &Expr, aliases: &[String]) -> Result<()> {
        let mut columns = Vec::new();
        let mut stars = Vec::new();
        let mut subqueries = Vec::new();
        expr.walk(&mut |e| {
            match e {
                Expr::Column { table, column } => columns.push((table.as_deref(), column.as_str())),
                Expr::Star { table: Some(t) } => stars.push(t.as_str()),
                _ => {}
            }
            if let Some(q) = e.subquery() {
                subqueries.push(q);
            }
        });

        for (qualifier, column) in columns {
            self.resolve(qualifier, column, aliases)?;
        }
        for qualifier in stars {
            let known = self
                .scopes
                .iter()
                .rev()
                .any(|scope| scope.iter().any(|s| s.name == qualifier));
            if !known {
                return Err(self.unbound(format!("{}.*", qualifier)));
            }
        }
        for q in subqueries {
            self.query(q)?;
        }
        Ok(())
    }

    fn resolve(&self, qualifier: Option<&str>, column: &str, aliases: &[String]) -> Result<()> {
        for scope in self.scopes.iter().rev() {
            match qualifier {
                Some(q) => {
                    if let Some(source) = scope.iter().find(|s| s.name == q) {
                        if source.has(column) {
                            return Ok(());
                        }
                        return Err(self.unbound(format!("{}.{}", q, column)));
                    }
                }
                None => {
                    if scope.iter().any(|s| s.has(column)) {
                        return Ok(());
                    }
                }
            }
        }
        if qualifier.is_none() && aliases.iter().any(|a| a == column) {
            return Ok(());
        }
        Err(self.unbound(match qualifier {
            Some(q) => format!("{}.{}", q, column),
            None => column.to_string(),
        }))
    }
}

/// Output column names of a derived table, when every item has one.
fn derived_columns(query: &QueryExpr) -> Option<Vec<String>> {
    let first = query.selects().into_iter().next()?;
    if first.columns.is_empty() {
        return None;
    }
    first
        .columns
        .iter()
        .map(|c| match (&c.alias, &c.expr) {
            (Some(alias), _) => Some(alias.clone()),
            (None, Expr::Column { column, .. }) => Some(column.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use crate::sql::ddl::AlterTable;
    use crate::sql::dml::Update;
    use crate::sql::expr::{col, exists, lit_int, table_col, ExprExt};
    use crate::sql::types::ValueType;

    fn catalog() -> (Catalog, TableRef, TableRef) {
        let mut catalog = Catalog::new("hr", "main");
        let emp = catalog.create_table("main", "Employee").unwrap();
        let dept = catalog.create_table("main", "Dept").unwrap();
        {
            let mut t = catalog.table_mut(&dept).unwrap();
            t.add_column(Column::new("Id", ValueType::Int32).not_null())
                .unwrap();
            t.add_constraint(Constraint::primary_key("PK_Dept", &["Id"]))
                .unwrap();
        }
        {
            let mut t = catalog.table_mut(&emp).unwrap();
            t.add_column(Column::new("Id", ValueType::Int32).not_null())
                .unwrap();
            t.add_column(Column::new("DeptId", ValueType::Int32)).unwrap();
        }
        (catalog, emp, dept)
    }

    #[test]
    fn test_resolves_joined_and_correlated_columns() {
        let (catalog, emp, dept) = catalog();
        let correlated = Select::from_table(TableSource::from(dept.clone()).with_alias("d"))
            .column(col("Id"))
            .filter(table_col("d", "Id").eq(table_col("e", "DeptId")));
        let query = Select::from_table(TableSource::from(emp).with_alias("e"))
            .column(table_col("e", "Id"))
            .filter(exists(correlated));
        bind(&query.into(), &catalog).unwrap();
    }

    #[test]
    fn test_unknown_column_is_unbound() {
        let (catalog, emp, _) = catalog();
        let query = Select::from_table(emp).column(col("Salary"));
        let err = bind(&query.into(), &catalog).unwrap_err();
        assert_eq!(
            err.to_string(),
            "column 'Salary' does not resolve to any source of SELECT"
        );
    }

    #[test]
    fn test_qualifier_must_name_a_source() {
        let (catalog, emp, _) = catalog();
        let query = Select::from_table(emp).column(table_col("x", "Id"));
        assert!(matches!(
            bind(&query.into(), &catalog),
            Err(Error::UnboundColumnReference { .. })
        ));
    }

    #[test]
    fn test_update_target_columns() {
        let (catalog, emp, _) = catalog();
        let ok = Update::table(emp.clone())
            .set("DeptId", lit_int(2))
            .filter(col("Id").eq(lit_int(1)));
        bind(&ok.into(), &catalog).unwrap();

        let bad = Update::table(emp).set("Missing", lit_int(2));
        assert!(bind(&bad.into(), &catalog).is_err());
    }

    #[test]
    fn test_alter_duplicate_constraints() {
        let (catalog, _, dept) = catalog();
        let twice = AlterTable::new(dept.clone())
            .add_constraint(Constraint::unique("UQ_Id", &["Id"]))
            .add_constraint(Constraint::unique("UQ_Id", &["Id"]));
        assert!(matches!(
            bind(&twice.into(), &catalog),
            Err(Error::DuplicateConstraint { .. })
        ));

        let existing =
            AlterTable::new(dept).add_constraint(Constraint::primary_key("PK_Dept", &["Id"]));
        let err = bind(&existing.into(), &catalog).unwrap_err();
        assert_eq!(
            err.to_string(),
            "constraint 'PK_Dept' conflicts with an existing constraint on main.Dept"
        );
    }

    #[test]
    fn test_alter_second_primary_key() {
        let (catalog, _, dept) = catalog();
        let second =
            AlterTable::new(dept.clone()).add_constraint(Constraint::primary_key("PK_Other", &["Id"]));
        assert!(matches!(
            bind(&second.into(), &catalog),
            Err(Error::DuplicateConstraint { .. })
        ));

        let replaced = AlterTable::new(dept)
            .drop_constraint("PK_Dept")
            .add_constraint(Constraint::primary_key("PK_Other", &["Id"]));
        bind(&replaced.into(), &catalog).unwrap();

        let (catalog, emp, _) = self::catalog();
        let both = AlterTable::new(emp)
            .add_constraint(Constraint::primary_key("PK_A", &["Id"]))
            .add_constraint(Constraint::primary_key("PK_B", &["DeptId"]));
        assert!(matches!(
            bind(&both.into(), &catalog),
            Err(Error::DuplicateConstraint { .. })
        ));
    }

    #[test]
    fn test_alter_constraint_columns_resolve() {
        let (catalog, emp, dept) = catalog();
        let missing = AlterTable::new(emp.clone()).add_constraint(Constraint::unique("UQ", &["Nope"]));
        let err = bind(&missing.into(), &catalog).unwrap_err();
        assert!(matches!(err, Error::UnboundColumnReference { ref column, .. } if column == "Nope"));

        let check = AlterTable::new(emp.clone())
            .add_constraint(Constraint::check("CK", col("Nope").gt(lit_int(0))));
        assert!(bind(&check.into(), &catalog).is_err());

        let bad_target = AlterTable::new(emp.clone()).add_constraint(
            Into::<Constraint>::into(ForeignKey::new("FK_Dept", &["DeptId"], dept.clone(), &["Code"])),
        );
        assert!(matches!(
            bind(&bad_target.into(), &catalog),
            Err(Error::UnboundColumnReference { .. })
        ));

        // a column added earlier in the same statement is visible
        let added = AlterTable::new(emp.clone())
            .add_column(Column::new("Code", ValueType::Text))
            .add_constraint(Constraint::unique("UQ_Code", &["Code"]))
            .add_constraint(Into::<Constraint>::into(ForeignKey::new("FK_Dept", &["DeptId"], dept, &["Id"])));
        bind(&added.into(), &catalog).unwrap();

        let dropped = AlterTable::new(emp)
            .drop_column("DeptId")
            .add_constraint(Constraint::unique("UQ_Dept", &["DeptId"]));
        assert!(bind(&dropped.into(), &catalog).is_err());
    }

    #[test]
    fn test_order_by_alias() {
        let (catalog, emp, _) = catalog();
        let query = Select::from_table(emp)
            .column_as(col("Id").add(lit_int(1)), "Next")
            .order_by(col("Next"), true);
        bind(&query.into(), &catalog).unwrap();
    }
}
