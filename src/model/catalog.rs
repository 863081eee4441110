use std::collections::BTreeMap;

use super::constraint::Constraint;
use super::index::Index;
use super::partition::{PartitionDescriptor, PartitionFunction, PartitionMethod, PartitionSchema};
use super::schema::Schema;
use super::sequence::{Sequence, SequenceDescriptor};
use super::table::{Column, ColumnIdentity, Table};
use super::view::{View, ViewDefinition};
use super::{SequenceRef, TableRef};
use crate::error::{Error, Result};
use crate::sql::expr::Expr;

fn table_label(table: &TableRef) -> String {
    format!("table {}", table)
}

fn schema_label(schema: &str) -> String {
    format!("schema '{}'", schema)
}

/// Root of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    name: String,
    default_schema: String,
    schemas: BTreeMap<String, Schema>,
    partition_functions: BTreeMap<String, PartitionFunction>,
    partition_schemas: BTreeMap<String, PartitionSchema>,
    frozen: bool,
}

impl Catalog {
    /// An empty catalog with its default schema already created.
    pub fn new(name: impl Into<String>, default_schema: impl Into<String>) -> Self {
        let default_schema = default_schema.into();
        let mut schemas = BTreeMap::new();
        schemas.insert(default_schema.clone(), Schema::new(default_schema.clone()));
        Self {
            name: name.into(),
            default_schema,
            schemas,
            partition_functions: BTreeMap::new(),
            partition_schemas: BTreeMap::new(),
            frozen: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn default_schema(&self) -> &Schema {
        // created in `new`, and `remove_schema` refuses to drop it
        &self.schemas[&self.default_schema]
    }

    pub fn default_schema_name(&self) -> &str {
        &self.default_schema
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    pub fn table(&self, table: &TableRef) -> Option<&Table> {
        self.schemas.get(&table.schema)?.tables.get(&table.name)
    }

    /// All tables ordered by schema, then name.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.schemas.values().flat_map(|s| s.tables.values())
    }

    pub fn view(&self, view: &TableRef) -> Option<&View> {
        self.schemas.get(&view.schema)?.views.get(&view.name)
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.schemas.values().flat_map(|s| s.views.values())
    }

    pub fn sequence(&self, sequence: &SequenceRef) -> Option<&Sequence> {
        self.schemas.get(&sequence.schema)?.sequences.get(&sequence.name)
    }

    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.schemas.values().flat_map(|s| s.sequences.values())
    }

    pub fn partition_function(&self, name: &str) -> Option<&PartitionFunction> {
        self.partition_functions.get(name)
    }

    pub fn partition_functions(&self) -> impl Iterator<Item = &PartitionFunction> {
        self.partition_functions.values()
    }

    pub fn partition_schema(&self, name: &str) -> Option<&PartitionSchema> {
        self.partition_schemas.get(name)
    }

    pub fn partition_schemas(&self) -> impl Iterator<Item = &PartitionSchema> {
        self.partition_schemas.values()
    }

    // =========================================================================
    // Freezing
    // =========================================================================

    /// Freeze the whole catalog. Irreversible.
    pub fn freeze(&mut self) {
        self.frozen = true;
        for schema in self.schemas.values_mut() {
            schema.freeze();
        }
    }

    pub fn freeze_schema(&mut self, name: &str) -> Result<()> {
        self.schemas
            .get_mut(name)
            .ok_or_else(|| Error::not_found("schema", name))?
            .freeze();
        Ok(())
    }

    pub fn freeze_table(&mut self, table: &TableRef) -> Result<()> {
        self.schemas
            .get_mut(&table.schema)
            .and_then(|s| s.tables.get_mut(&table.name))
            .ok_or_else(|| Error::not_found("table", table.to_string()))?
            .frozen = true;
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether the table is locked by itself or by any ancestor.
    pub fn is_table_frozen(&self, table: &TableRef) -> bool {
        self.frozen
            || self
                .schemas
                .get(&table.schema)
                .map(|s| s.frozen || s.tables.get(&table.name).is_some_and(|t| t.frozen))
                .unwrap_or(false)
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.frozen {
            return Err(Error::locked(format!("catalog '{}'", self.name)));
        }
        Ok(())
    }

    fn ensure_schema_unlocked(&self, schema: &str) -> Result<&Schema> {
        self.ensure_unlocked()?;
        let s = self
            .schemas
            .get(schema)
            .ok_or_else(|| Error::not_found("schema", schema))?;
        if s.frozen {
            return Err(Error::locked(schema_label(schema)));
        }
        Ok(s)
    }

    fn ensure_table_unlocked(&self, table: &TableRef) -> Result<&Table> {
        let t = self
            .ensure_schema_unlocked(&table.schema)?
            .tables
            .get(&table.name)
            .ok_or_else(|| Error::not_found("table", table.to_string()))?;
        if t.frozen {
            return Err(Error::locked(table_label(table)));
        }
        Ok(t)
    }

    // =========================================================================
    // Schemas
    // =========================================================================

    pub fn create_schema(&mut self, name: &str) -> Result<()> {
        self.ensure_unlocked()?;
        if self.schemas.contains_key(name) {
            return Err(Error::duplicate("schema", name, format!("catalog '{}'", self.name)));
        }
        self.schemas.insert(name.to_string(), Schema::new(name));
        Ok(())
    }

    /// Remove a schema and everything in it. Fails while objects in other
    /// schemas still reference it.
    pub fn remove_schema(&mut self, name: &str) -> Result<()> {
        let schema = self.ensure_schema_unlocked(name)?;
        if let Some(frozen) = schema.tables().find(|t| t.is_frozen()) {
            return Err(Error::locked(table_label(frozen.reference())));
        }
        if name == self.default_schema {
            return Err(Error::InvalidModel(format!(
                "default schema '{}' cannot be removed",
                name
            )));
        }
        for table in self.tables().filter(|t| t.schema() != name) {
            for c in table.constraints() {
                if let Constraint::ForeignKey(fk) = c {
                    if fk.referenced_table.schema == name {
                        return Err(Error::integrity(
                            schema_label(name),
                            format!("referenced by foreign key '{}' on {}", fk.name, table_label(table.reference())),
                        ));
                    }
                }
            }
            for column in table.columns() {
                if let Some(ColumnIdentity::Sequence(seq)) = &column.identity {
                    if seq.schema == name {
                        return Err(Error::integrity(
                            schema_label(name),
                            format!(
                                "sequence {} is used by column '{}' of {}",
                                seq,
                                column.name,
                                table_label(table.reference())
                            ),
                        ));
                    }
                }
            }
        }
        self.schemas.remove(name);
        Ok(())
    }

    // =========================================================================
    // Tables, views, sequences
    // =========================================================================

    pub fn create_table(&mut self, schema: &str, name: &str) -> Result<TableRef> {
        let s = self.ensure_schema_unlocked(schema)?;
        if s.has_object(name) {
            return Err(Error::duplicate("table", name, schema_label(schema)));
        }
        let reference = TableRef::new(schema, name);
        if let Some(s) = self.schemas.get_mut(schema) {
            s.tables
                .insert(name.to_string(), Table::new(reference.clone()));
        }
        Ok(reference)
    }

    /// Remove a table. Fails while foreign keys of other tables reference it.
    pub fn remove_table(&mut self, table: &TableRef) -> Result<()> {
        self.ensure_table_unlocked(table)?;
        for other in self.tables().filter(|t| t.reference() != table) {
            for c in other.constraints() {
                if let Constraint::ForeignKey(fk) = c {
                    if &fk.referenced_table == table {
                        return Err(Error::integrity(
                            table_label(table),
                            format!(
                                "referenced by foreign key '{}' on {}",
                                fk.name,
                                table_label(other.reference())
                            ),
                        ));
                    }
                }
            }
        }
        if let Some(s) = self.schemas.get_mut(&table.schema) {
            s.tables.remove(&table.name);
        }
        Ok(())
    }

    pub fn create_view(
        &mut self,
        schema: &str,
        name: &str,
        definition: impl Into<ViewDefinition>,
    ) -> Result<TableRef> {
        let s = self.ensure_schema_unlocked(schema)?;
        if s.has_object(name) {
            return Err(Error::duplicate("view", name, schema_label(schema)));
        }
        let reference = TableRef::new(schema, name);
        let view = View {
            reference: reference.clone(),
            definition: definition.into(),
        };
        if let Some(s) = self.schemas.get_mut(schema) {
            s.views.insert(name.to_string(), view);
        }
        Ok(reference)
    }

    pub fn remove_view(&mut self, view: &TableRef) -> Result<()> {
        let s = self.ensure_schema_unlocked(&view.schema)?;
        if !s.views.contains_key(&view.name) {
            return Err(Error::not_found("view", view.to_string()));
        }
        if let Some(s) = self.schemas.get_mut(&view.schema) {
            s.views.remove(&view.name);
        }
        Ok(())
    }

    pub fn create_sequence(
        &mut self,
        schema: &str,
        name: &str,
        descriptor: SequenceDescriptor,
    ) -> Result<SequenceRef> {
        let s = self.ensure_schema_unlocked(schema)?;
        if s.has_object(name) {
            return Err(Error::duplicate("sequence", name, schema_label(schema)));
        }
        descriptor.validate()?;
        let reference = SequenceRef::new(schema, name);
        let sequence = Sequence {
            reference: reference.clone(),
            descriptor,
        };
        if let Some(s) = self.schemas.get_mut(schema) {
            s.sequences.insert(name.to_string(), sequence);
        }
        Ok(reference)
    }

    /// Remove a sequence. Fails while a column draws its values from it.
    pub fn remove_sequence(&mut self, sequence: &SequenceRef) -> Result<()> {
        let s = self.ensure_schema_unlocked(&sequence.schema)?;
        if !s.sequences.contains_key(&sequence.name) {
            return Err(Error::not_found("sequence", sequence.to_string()));
        }
        for table in self.tables() {
            for column in table.columns() {
                if column.identity == Some(ColumnIdentity::Sequence(sequence.clone())) {
                    return Err(Error::integrity(
                        format!("sequence {}", sequence),
                        format!(
                            "used by column '{}' of {}",
                            column.name,
                            table_label(table.reference())
                        ),
                    ));
                }
            }
        }
        if let Some(s) = self.schemas.get_mut(&sequence.schema) {
            s.sequences.remove(&sequence.name);
        }
        Ok(())
    }

    // =========================================================================
    // Partitioning
    // =========================================================================

    pub fn create_partition_function(&mut self, function: PartitionFunction) -> Result<()> {
        self.ensure_unlocked()?;
        if self.partition_functions.contains_key(&function.name) {
            return Err(Error::duplicate(
                "partition function",
                function.name,
                format!("catalog '{}'", self.name),
            ));
        }
        self.partition_functions
            .insert(function.name.clone(), function);
        Ok(())
    }

    pub fn remove_partition_function(&mut self, name: &str) -> Result<()> {
        self.ensure_unlocked()?;
        if !self.partition_functions.contains_key(name) {
            return Err(Error::not_found("partition function", name));
        }
        if let Some(ps) = self.partition_schemas.values().find(|ps| ps.function == name) {
            return Err(Error::integrity(
                format!("partition function '{}'", name),
                format!("used by partition schema '{}'", ps.name),
            ));
        }
        self.partition_functions.remove(name);
        Ok(())
    }

    /// Add a partition schema. Its function must already exist.
    pub fn create_partition_schema(&mut self, schema: PartitionSchema) -> Result<()> {
        self.ensure_unlocked()?;
        if self.partition_schemas.contains_key(&schema.name) {
            return Err(Error::duplicate(
                "partition schema",
                schema.name,
                format!("catalog '{}'", self.name),
            ));
        }
        if !self.partition_functions.contains_key(&schema.function) {
            return Err(Error::integrity(
                format!("partition schema '{}'", schema.name),
                format!("partition function '{}' does not exist", schema.function),
            ));
        }
        if schema.filegroups.is_empty() {
            return Err(Error::InvalidModel(format!(
                "partition schema '{}' has no filegroups",
                schema.name
            )));
        }
        self.partition_schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    pub fn remove_partition_schema(&mut self, name: &str) -> Result<()> {
        self.ensure_unlocked()?;
        if !self.partition_schemas.contains_key(name) {
            return Err(Error::not_found("partition schema", name));
        }
        if let Some(t) = self
            .tables()
            .find(|t| t.partitioning().and_then(|p| p.partition_schema()) == Some(name))
        {
            return Err(Error::integrity(
                format!("partition schema '{}'", name),
                format!("used by {}", table_label(t.reference())),
            ));
        }
        self.partition_schemas.remove(name);
        Ok(())
    }

    // =========================================================================
    // Table members
    // =========================================================================

    /// Mutable handle on a table's members.
    pub fn table_mut(&mut self, table: &TableRef) -> Result<TableMut<'_>> {
        if self.table(table).is_none() {
            return Err(Error::not_found("table", table.to_string()));
        }
        Ok(TableMut {
            catalog: self,
            table: table.clone(),
        })
    }

    fn table_entry(&mut self, table: &TableRef) -> Result<&mut Table> {
        self.schemas
            .get_mut(&table.schema)
            .and_then(|s| s.tables.get_mut(&table.name))
            .ok_or_else(|| Error::not_found("table", table.to_string()))
    }

    /// Foreign keys anywhere in the catalog that point at `table`, with the
    /// table that owns each one.
    fn foreign_keys_into<'a>(
        &'a self,
        table: &'a TableRef,
    ) -> impl Iterator<Item = (&'a Table, &'a super::ForeignKey)> + 'a {
        self.tables().flat_map(move |owner| {
            owner.constraints().filter_map(move |c| match c {
                Constraint::ForeignKey(fk) if &fk.referenced_table == table => Some((owner, fk)),
                _ => None,
            })
        })
    }
}

/// A table plus the catalog it lives in.
///
/// Every mutator validates against the whole catalog first and changes
/// nothing when it fails.
#[derive(Debug)]
pub struct TableMut<'a> {
    catalog: &'a mut Catalog,
    table: TableRef,
}

impl TableMut<'_> {
    pub fn reference(&self) -> &TableRef {
        &self.table
    }

    fn current(&self) -> Result<&Table> {
        self.catalog.ensure_table_unlocked(&self.table)
    }

    fn entry(&mut self) -> Result<&mut Table> {
        self.catalog.table_entry(&self.table)
    }

    fn missing_column(&self, column: &str) -> Error {
        Error::integrity(
            table_label(&self.table),
            format!("column '{}' does not exist", column),
        )
    }

    /// Append a column.
    pub fn add_column(&mut self, mut column: Column) -> Result<()> {
        let table = self.current()?;
        if table.has_column(&column.name) {
            return Err(Error::duplicate(
                "column",
                column.name,
                table_label(&self.table),
            ));
        }
        if let Some(ColumnIdentity::Sequence(seq)) = &column.identity {
            if self.catalog.sequence(seq).is_none() {
                return Err(Error::integrity(
                    format!("column '{}' of {}", column.name, table_label(&self.table)),
                    format!("sequence {} does not exist", seq),
                ));
            }
        }
        column.table = Some(self.table.clone());
        self.entry()?.columns.push(column);
        Ok(())
    }

    /// Remove a column no constraint, index or partitioning depends on.
    pub fn remove_column(&mut self, name: &str) -> Result<()> {
        let table = self.current()?;
        if !table.has_column(name) {
            return Err(Error::not_found("column", format!("{}.{}", self.table, name)));
        }
        let mut dependents = table.dependents_of_column(name);
        for (owner, fk) in self.catalog.foreign_keys_into(&self.table) {
            if owner.reference() != &self.table && fk.referenced_columns.iter().any(|c| c == name)
            {
                dependents.push(format!(
                    "foreign key '{}' on {}",
                    fk.name,
                    table_label(owner.reference())
                ));
            }
        }
        if !dependents.is_empty() {
            return Err(Error::integrity(
                format!("column '{}' of {}", name, table_label(&self.table)),
                format!("referenced by {}", dependents.join(", ")),
            ));
        }
        self.entry()?.columns.retain(|c| c.name != name);
        Ok(())
    }

    pub fn set_default(&mut self, column: &str, default: Expr) -> Result<()> {
        let table = self.current()?;
        if !table.has_column(column) {
            return Err(Error::not_found("column", format!("{}.{}", self.table, column)));
        }
        if let Some(c) = self.entry()?.columns.iter_mut().find(|c| c.name == column) {
            c.default = Some(default);
        }
        Ok(())
    }

    pub fn drop_default(&mut self, column: &str) -> Result<()> {
        let table = self.current()?;
        if !table.has_column(column) {
            return Err(Error::not_found("column", format!("{}.{}", self.table, column)));
        }
        if let Some(c) = self.entry()?.columns.iter_mut().find(|c| c.name == column) {
            c.default = None;
        }
        Ok(())
    }

    /// Add a constraint after checking names, key shape and every column it
    /// mentions.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<()> {
        let table = self.current()?;
        let name = constraint.name().to_string();
        if table.constraints.contains_key(&name) {
            return Err(Error::duplicate(
                "constraint",
                name,
                table_label(&self.table),
            ));
        }
        if matches!(constraint, Constraint::PrimaryKey { .. }) && table.primary_key().is_some() {
            return Err(Error::DuplicateConstraint {
                name,
                table: self.table.to_string(),
            });
        }
        if !matches!(constraint, Constraint::Check { .. }) && constraint.columns().is_empty() {
            return Err(Error::InvalidModel(format!(
                "{} '{}' has no columns",
                constraint.kind(),
                name
            )));
        }
        if let Some(missing) = constraint.columns().iter().find(|c| !table.has_column(c)) {
            return Err(self.missing_column(missing));
        }
        if let Some(missing) = constraint
            .condition_columns()
            .into_iter()
            .find(|c| !table.has_column(c))
        {
            return Err(self.missing_column(missing));
        }

        if let Constraint::ForeignKey(fk) = &constraint {
            if fk.columns.len() != fk.referenced_columns.len() {
                return Err(Error::InvalidModel(format!(
                    "foreign key '{}' has {} columns but references {}",
                    name,
                    fk.columns.len(),
                    fk.referenced_columns.len()
                )));
            }
            let target = self.catalog.table(&fk.referenced_table).ok_or_else(|| {
                Error::integrity(
                    format!("foreign key '{}' on {}", name, table_label(&self.table)),
                    format!("referenced {} does not exist", table_label(&fk.referenced_table)),
                )
            })?;
            if let Some(missing) = fk
                .referenced_columns
                .iter()
                .find(|c| !target.has_column(c))
            {
                return Err(Error::integrity(
                    format!("foreign key '{}' on {}", name, table_label(&self.table)),
                    format!(
                        "referenced column '{}' does not exist in {}",
                        missing,
                        table_label(&fk.referenced_table)
                    ),
                ));
            }
        }

        self.entry()?.constraints.insert(name, constraint);
        Ok(())
    }

    /// Remove a constraint. A key still targeted by a foreign key (and not
    /// duplicated by another key) cannot be removed.
    pub fn remove_constraint(&mut self, name: &str) -> Result<()> {
        let table = self.current()?;
        let constraint = table.constraint(name).ok_or_else(|| {
            Error::not_found("constraint", format!("{} on {}", name, self.table))
        })?;
        let key_columns = match constraint {
            Constraint::PrimaryKey { columns, .. } | Constraint::Unique { columns, .. } => {
                Some(columns.clone())
            }
            _ => None,
        };
        if let Some(cols) = key_columns {
            let other_key = table
                .constraints()
                .any(|c| c.name() != name && c.is_key_on(&cols));
            if !other_key {
                if let Some((owner, fk)) = self
                    .catalog
                    .foreign_keys_into(&self.table)
                    .find(|(_, fk)| fk.referenced_columns == cols)
                {
                    return Err(Error::integrity(
                        format!("constraint '{}' on {}", name, table_label(&self.table)),
                        format!(
                            "referenced by foreign key '{}' on {}",
                            fk.name,
                            table_label(owner.reference())
                        ),
                    ));
                }
            }
        }
        self.entry()?.constraints.remove(name);
        Ok(())
    }

    /// Add an index. Index names are unique across the whole schema.
    pub fn add_index(&mut self, mut index: Index) -> Result<()> {
        let table = self.current()?;
        index.validate()?;
        if let Some(missing) = index
            .referenced_columns()
            .into_iter()
            .find(|c| !table.has_column(c))
        {
            return Err(self.missing_column(missing));
        }
        let schema = self
            .catalog
            .schema(&self.table.schema)
            .ok_or_else(|| Error::not_found("schema", self.table.schema.clone()))?;
        if schema.index(&index.name).is_some() {
            return Err(Error::duplicate(
                "index",
                index.name,
                schema_label(&self.table.schema),
            ));
        }
        index.table = Some(self.table.clone());
        self.entry()?.indexes.insert(index.name.clone(), index);
        Ok(())
    }

    pub fn remove_index(&mut self, name: &str) -> Result<()> {
        let table = self.current()?;
        if table.index(name).is_none() {
            return Err(Error::not_found("index", format!("{} on {}", name, self.table)));
        }
        self.entry()?.indexes.remove(name);
        Ok(())
    }

    pub fn set_partitioning(&mut self, descriptor: PartitionDescriptor) -> Result<()> {
        let table = self.current()?;
        if !table.has_column(&descriptor.column) {
            return Err(self.missing_column(&descriptor.column));
        }
        match &descriptor.method {
            PartitionMethod::Hash { partitions } if *partitions == 0 => {
                return Err(Error::InvalidModel(
                    "hash partitioning needs at least one partition".into(),
                ));
            }
            PartitionMethod::Hash { .. } => {}
            PartitionMethod::List { schema } | PartitionMethod::Range { schema } => {
                if self.catalog.partition_schema(schema).is_none() {
                    return Err(Error::integrity(
                        format!("partitioning of {}", table_label(&self.table)),
                        format!("partition schema '{}' does not exist", schema),
                    ));
                }
            }
        }
        self.entry()?.partitioning = Some(descriptor);
        Ok(())
    }

    pub fn clear_partitioning(&mut self) -> Result<()> {
        self.current()?;
        self.entry()?.partitioning = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForeignKey;
    use crate::sql::expr::{col, lit_int, ExprExt};
    use crate::sql::types::ValueType;

    fn catalog_with_employee() -> (Catalog, TableRef) {
        let mut catalog = Catalog::new("hr", "main");
        let t = catalog.create_table("main", "Employee").unwrap();
        let mut tm = catalog.table_mut(&t).unwrap();
        tm.add_column(Column::new("Id", ValueType::Int32).not_null())
            .unwrap();
        tm.add_column(Column::new("ManagerId", ValueType::Int32))
            .unwrap();
        tm.add_constraint(Constraint::primary_key("PK_Employee", &["Id"]))
            .unwrap();
        (catalog, t)
    }

    #[test]
    fn test_default_schema_exists() {
        let catalog = Catalog::new("hr", "dbo");
        assert_eq!(catalog.default_schema().name(), "dbo");
        assert!(catalog.schema("dbo").is_some());
    }

    #[test]
    fn test_back_reference_set_on_add() {
        let (catalog, t) = catalog_with_employee();
        let table = catalog.table(&t).unwrap();
        assert_eq!(table.column("Id").unwrap().table(), Some(&t));
    }

    #[test]
    fn test_duplicate_names() {
        let (mut catalog, t) = catalog_with_employee();
        assert!(matches!(
            catalog.create_table("main", "Employee"),
            Err(Error::DuplicateName { .. })
        ));
        let err = catalog
            .table_mut(&t)
            .unwrap()
            .add_column(Column::new("Id", ValueType::Int64))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName { kind: "column", .. }));
    }

    #[test]
    fn test_second_primary_key_rejected() {
        let (mut catalog, t) = catalog_with_employee();
        let err = catalog
            .table_mut(&t)
            .unwrap()
            .add_constraint(Constraint::primary_key("PK_Other", &["ManagerId"]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateConstraint { .. }));
    }

    #[test]
    fn test_foreign_key_validation() {
        let (mut catalog, t) = catalog_with_employee();
        let mut tm = catalog.table_mut(&t).unwrap();

        let bad_len = ForeignKey::new("FK_x", &["ManagerId"], t.clone(), &["Id", "Id"]);
        assert!(matches!(
            tm.add_constraint(bad_len.into()),
            Err(Error::InvalidModel(_))
        ));

        let bad_table = ForeignKey::new(
            "FK_x",
            &["ManagerId"],
            TableRef::new("main", "Nope"),
            &["Id"],
        );
        assert!(matches!(
            tm.add_constraint(bad_table.into()),
            Err(Error::ReferentialIntegrityViolation { .. })
        ));

        let self_ref = ForeignKey::new("FK_Manager", &["ManagerId"], t.clone(), &["Id"]);
        tm.add_constraint(self_ref.into()).unwrap();
        assert!(catalog.table(&t).unwrap().constraint("FK_Manager").is_some());
    }

    #[test]
    fn test_remove_referenced_entities() {
        let (mut catalog, employee) = catalog_with_employee();
        let dept = catalog.create_table("main", "Department").unwrap();
        {
            let mut tm = catalog.table_mut(&dept).unwrap();
            tm.add_column(Column::new("HeadId", ValueType::Int32))
                .unwrap();
            tm.add_constraint(
                ForeignKey::new("FK_Dept_Head", &["HeadId"], employee.clone(), &["Id"]).into(),
            )
            .unwrap();
        }

        let err = catalog.remove_table(&employee).unwrap_err();
        assert!(err.to_string().contains("FK_Dept_Head"), "{}", err);

        let err = catalog
            .table_mut(&employee)
            .unwrap()
            .remove_column("Id")
            .unwrap_err();
        assert!(matches!(err, Error::ReferentialIntegrityViolation { .. }));

        let err = catalog
            .table_mut(&employee)
            .unwrap()
            .remove_constraint("PK_Employee")
            .unwrap_err();
        assert!(err.to_string().contains("FK_Dept_Head"), "{}", err);

        // dependent first, then the target
        catalog
            .table_mut(&dept)
            .unwrap()
            .remove_constraint("FK_Dept_Head")
            .unwrap();
        catalog.remove_table(&employee).unwrap();
        assert!(catalog.table(&employee).is_none());
    }

    #[test]
    fn test_freeze_is_monotonic_and_atomic() {
        let (mut catalog, t) = catalog_with_employee();
        catalog.freeze_table(&t).unwrap();

        let before = catalog.clone();
        let err = catalog
            .table_mut(&t)
            .unwrap()
            .add_column(Column::new("Name", ValueType::Text))
            .unwrap_err();
        assert!(matches!(err, Error::ModelLocked { .. }));
        assert_eq!(err.to_string(), "table main.Employee is frozen and cannot be modified");
        assert_eq!(catalog, before);

        // other tables in the schema are still mutable
        catalog.create_table("main", "Other").unwrap();

        catalog.freeze_schema("main").unwrap();
        assert!(matches!(
            catalog.create_table("main", "Third"),
            Err(Error::ModelLocked { .. })
        ));
        catalog.create_schema("audit").unwrap();

        catalog.freeze();
        assert!(catalog.is_frozen());
        assert!(matches!(
            catalog.create_schema("late"),
            Err(Error::ModelLocked { .. })
        ));
    }

    #[test]
    fn test_index_namespace_is_schema_wide() {
        let (mut catalog, employee) = catalog_with_employee();
        let other = catalog.create_table("main", "Other").unwrap();
        catalog
            .table_mut(&other)
            .unwrap()
            .add_column(Column::new("Id", ValueType::Int32))
            .unwrap();
        catalog
            .table_mut(&employee)
            .unwrap()
            .add_index(Index::on_columns("IX_Id", &["Id"]))
            .unwrap();
        let err = catalog
            .table_mut(&other)
            .unwrap()
            .add_index(Index::on_columns("IX_Id", &["Id"]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName { kind: "index", .. }));
        assert_eq!(catalog.default_schema().indexes().count(), 1);
        assert_eq!(
            catalog.default_schema().index("IX_Id").unwrap().table(),
            Some(&employee)
        );
    }

    #[test]
    fn test_sequence_dependency() {
        let (mut catalog, t) = catalog_with_employee();
        let seq = catalog
            .create_sequence("main", "EmployeeSeq", SequenceDescriptor::default())
            .unwrap();
        catalog
            .table_mut(&t)
            .unwrap()
            .add_column(Column::new("BadgeNo", ValueType::Int64).sequence(seq.clone()))
            .unwrap();
        assert!(matches!(
            catalog.remove_sequence(&seq),
            Err(Error::ReferentialIntegrityViolation { .. })
        ));

        let missing = SequenceRef::new("main", "Nope");
        assert!(catalog
            .table_mut(&t)
            .unwrap()
            .add_column(Column::new("X", ValueType::Int64).sequence(missing))
            .is_err());
    }

    #[test]
    fn test_partitioning_references() {
        let (mut catalog, t) = catalog_with_employee();
        let err = catalog
            .table_mut(&t)
            .unwrap()
            .set_partitioning(PartitionDescriptor::new(
                "Id",
                PartitionMethod::Range {
                    schema: "ps_ids".into(),
                },
            ))
            .unwrap_err();
        assert!(matches!(err, Error::ReferentialIntegrityViolation { .. }));

        assert!(catalog
            .create_partition_schema(PartitionSchema::new("ps_ids", "pf_ids", &["PRIMARY"]))
            .is_err());
        catalog
            .create_partition_function(PartitionFunction::new(
                "pf_ids",
                ValueType::Int32,
                vec![crate::sql::expr::Literal::Int(1000)],
                crate::model::BoundarySide::Right,
            ))
            .unwrap();
        catalog
            .create_partition_schema(PartitionSchema::new("ps_ids", "pf_ids", &["PRIMARY"]))
            .unwrap();
        catalog
            .table_mut(&t)
            .unwrap()
            .set_partitioning(PartitionDescriptor::new(
                "Id",
                PartitionMethod::Range {
                    schema: "ps_ids".into(),
                },
            ))
            .unwrap();

        assert!(catalog.remove_partition_function("pf_ids").is_err());
        assert!(catalog.remove_partition_schema("ps_ids").is_err());
        assert!(catalog
            .table_mut(&t)
            .unwrap()
            .remove_column("Id")
            .is_err());
    }

    #[test]
    fn test_defaults_and_checks() {
        let (mut catalog, t) = catalog_with_employee();
        let mut tm = catalog.table_mut(&t).unwrap();
        tm.set_default("ManagerId", lit_int(0)).unwrap();
        tm.add_constraint(Constraint::check("CK_Id", col("Id").gt(lit_int(0))))
            .unwrap();
        assert!(tm.set_default("Nope", lit_int(0)).is_err());
        tm.drop_default("ManagerId").unwrap();
        assert!(catalog
            .table(&t)
            .unwrap()
            .column("ManagerId")
            .unwrap()
            .default
            .is_none());
    }

    #[test]
    fn test_remove_schema() {
        let mut catalog = Catalog::new("hr", "main");
        assert!(catalog.remove_schema("main").is_err());
        catalog.create_schema("audit").unwrap();
        let log = catalog.create_table("audit", "Log").unwrap();
        let main_t = catalog.create_table("main", "Entry").unwrap();
        catalog
            .table_mut(&log)
            .unwrap()
            .add_column(Column::new("Id", ValueType::Int32))
            .unwrap();
        {
            let mut tm = catalog.table_mut(&main_t).unwrap();
            tm.add_column(Column::new("LogId", ValueType::Int32))
                .unwrap();
            tm.add_constraint(ForeignKey::new("FK_Log", &["LogId"], log, &["Id"]).into())
                .unwrap();
        }
        assert!(matches!(
            catalog.remove_schema("audit"),
            Err(Error::ReferentialIntegrityViolation { .. })
        ));
    }

    #[test]
    fn test_tables_ordered() {
        let mut catalog = Catalog::new("db", "main");
        catalog.create_schema("a").unwrap();
        catalog.create_table("main", "Zed").unwrap();
        catalog.create_table("main", "Alpha").unwrap();
        catalog.create_table("a", "Mid").unwrap();
        let names: Vec<_> = catalog.tables().map(|t| t.reference().to_string()).collect();
        assert_eq!(names, vec!["a.Mid", "main.Alpha", "main.Zed"]);
    }
}
