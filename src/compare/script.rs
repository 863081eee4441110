//! DDL batches built from a catalog or from a list of differences.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::{Difference, DifferenceKind, EntityPath};
use crate::error::{Error, Result};
use crate::model::{Catalog, Constraint, SequenceRef, Table, TableRef};
use crate::sql::ddl::{
    AlterSequence, AlterTable, CreateIndex, CreatePartitionFunction, CreatePartitionSchema,
    CreateSchema, CreateSequence, CreateTable, CreateView, DropObject, DropTarget,
};
use crate::sql::dialect::{Dialect, Feature, SqlDialect};
use crate::sql::statement::Batch;

/// Order `tables` so every table comes after the tables its foreign keys
/// reference. Self references are ignored; references to tables outside
/// the slice are assumed to exist already. `None` on a cycle.
fn creation_order<'a>(tables: &[&'a Table]) -> Option<Vec<&'a Table>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..tables.len()).map(|i| graph.add_node(i)).collect();
    let position: HashMap<&TableRef, usize> = tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.reference(), i))
        .collect();

    for (i, table) in tables.iter().enumerate() {
        for referenced in table.referenced_tables() {
            if let Some(&j) = position.get(referenced) {
                graph.add_edge(nodes[j], nodes[i], ());
            }
        }
    }

    toposort(&graph, None)
        .ok()
        .map(|order| order.into_iter().map(|n| tables[graph[n]]).collect())
}

/// CREATE TABLE statements for `tables`, dependency ordered. When the
/// foreign keys form a cycle the tables are created bare and every foreign
/// key is added afterwards.
fn create_tables(batch: &mut Batch, tables: &[&Table], dialect: Dialect) -> Result<()> {
    match creation_order(tables) {
        Some(ordered) => {
            for table in ordered {
                batch.push(CreateTable::from_table(table));
            }
        }
        None => {
            dialect.require(Feature::AddConstraint)?;
            tracing::debug!(tables = tables.len(), "foreign key cycle, deferring constraints");
            let mut deferred = Vec::new();
            for table in tables {
                let mut create = CreateTable::from_table(table);
                create
                    .constraints
                    .retain(|c| !matches!(c, Constraint::ForeignKey(_)));
                batch.push(create);
                for constraint in table.constraints() {
                    if let Constraint::ForeignKey(fk) = constraint {
                        deferred.push(
                            AlterTable::new(table.reference().clone()).add_constraint(fk.clone()),
                        );
                    }
                }
            }
            for alter in deferred {
                batch.push(alter);
            }
        }
    }
    Ok(())
}

/// The creation script for a whole catalog: schemas, sequences,
/// partitioning objects, tables in foreign-key order, indexes, views.
pub fn apply(catalog: &Catalog, dialect: Dialect) -> Result<Batch> {
    let mut batch = Batch::new();

    for schema in catalog.schemas() {
        if schema.name() != catalog.default_schema_name() {
            batch.push(CreateSchema::new(schema.name()));
        }
    }
    for sequence in catalog.sequences() {
        batch.push(CreateSequence::new(
            sequence.reference().clone(),
            sequence.descriptor,
        ));
    }
    for function in catalog.partition_functions() {
        batch.push(CreatePartitionFunction::new(function.clone()));
    }
    for schema in catalog.partition_schemas() {
        batch.push(CreatePartitionSchema::new(schema.clone()));
    }

    let tables: Vec<&Table> = catalog.tables().collect();
    create_tables(&mut batch, &tables, dialect)?;

    for table in &tables {
        for index in table.indexes() {
            batch.push(CreateIndex::new(table.reference().clone(), index.clone()));
        }
    }
    for view in catalog.views() {
        batch.push(CreateView::new(
            view.reference().clone(),
            view.definition.clone(),
        ));
    }

    tracing::debug!(%dialect, statements = batch.len(), "built creation script");
    Ok(batch)
}

/// Differences sorted into what has to be created, dropped or altered.
#[derive(Default)]
struct Plan {
    create_schemas: BTreeSet<String>,
    drop_schemas: BTreeSet<String>,
    create_sequences: BTreeSet<SequenceRef>,
    alter_sequences: BTreeSet<SequenceRef>,
    drop_sequences: BTreeSet<SequenceRef>,
    create_functions: BTreeSet<String>,
    drop_functions: BTreeSet<String>,
    create_partition_schemas: BTreeSet<String>,
    drop_partition_schemas: BTreeSet<String>,
    create_tables: BTreeSet<TableRef>,
    drop_tables: BTreeSet<TableRef>,
    add_columns: BTreeSet<(TableRef, String)>,
    drop_columns: BTreeSet<(TableRef, String)>,
    defaults: BTreeSet<(TableRef, String)>,
    add_constraints: BTreeSet<(TableRef, String)>,
    drop_constraints: BTreeSet<(TableRef, String)>,
    add_indexes: BTreeSet<(TableRef, String)>,
    drop_indexes: BTreeSet<(TableRef, String)>,
    create_views: BTreeSet<TableRef>,
    drop_views: BTreeSet<TableRef>,
}

impl Plan {
    fn from_differences(differences: &[Difference], dialect: Dialect) -> Result<Self> {
        let mut plan = Plan::default();
        for diff in differences {
            let missing = diff.is_missing();
            let extra = diff.is_extra();
            let changed = !missing && !extra;
            match &diff.path {
                EntityPath::Schema(name) => {
                    if missing {
                        plan.create_schemas.insert(name.clone());
                    } else if extra {
                        plan.drop_schemas.insert(name.clone());
                    }
                }
                EntityPath::Sequence(seq) => {
                    let target = match diff.kind {
                        DifferenceKind::Missing => &mut plan.create_sequences,
                        DifferenceKind::Extra => &mut plan.drop_sequences,
                        DifferenceKind::Changed { .. } => &mut plan.alter_sequences,
                    };
                    target.insert(seq.clone());
                }
                EntityPath::PartitionFunction(name) => {
                    if !extra {
                        plan.create_functions.insert(name.clone());
                    }
                    if !missing {
                        plan.drop_functions.insert(name.clone());
                    }
                }
                EntityPath::PartitionSchema(name) => {
                    if !extra {
                        plan.create_partition_schemas.insert(name.clone());
                    }
                    if !missing {
                        plan.drop_partition_schemas.insert(name.clone());
                    }
                }
                EntityPath::Table(table) => match &diff.kind {
                    DifferenceKind::Missing => {
                        plan.create_tables.insert(table.clone());
                    }
                    DifferenceKind::Extra => {
                        plan.drop_tables.insert(table.clone());
                    }
                    DifferenceKind::Changed { attribute, .. } => {
                        return Err(Error::unsupported(
                            format!("changing {} of table {}", attribute, table),
                            dialect.name(),
                        ));
                    }
                },
                EntityPath::Column { table, column } => {
                    let key = (table.clone(), column.clone());
                    match &diff.kind {
                        DifferenceKind::Missing => {
                            plan.add_columns.insert(key);
                        }
                        DifferenceKind::Extra => {
                            plan.drop_columns.insert(key);
                        }
                        DifferenceKind::Changed { attribute, .. } if attribute == "default" => {
                            plan.defaults.insert(key);
                        }
                        DifferenceKind::Changed { attribute, .. } => {
                            return Err(Error::unsupported(
                                format!("changing {} of column {}.{}", attribute, table, column),
                                dialect.name(),
                            ));
                        }
                    }
                }
                EntityPath::Constraint { table, name } => {
                    let key = (table.clone(), name.clone());
                    if !extra {
                        plan.add_constraints.insert(key.clone());
                    }
                    if !missing {
                        plan.drop_constraints.insert(key);
                    }
                }
                EntityPath::Index { table, name } => {
                    let key = (table.clone(), name.clone());
                    if !extra {
                        plan.add_indexes.insert(key.clone());
                    }
                    if !missing {
                        plan.drop_indexes.insert(key);
                    }
                }
                EntityPath::Partitioning(table) => {
                    return Err(Error::unsupported(
                        format!("repartitioning table {}", table),
                        dialect.name(),
                    ));
                }
                EntityPath::View(view) => {
                    if !extra {
                        plan.create_views.insert(view.clone());
                    }
                    if changed || extra {
                        plan.drop_views.insert(view.clone());
                    }
                }
            }
        }

        // members of tables being created or dropped go with the table
        let whole: BTreeSet<&TableRef> = plan.create_tables.iter().chain(&plan.drop_tables).collect();
        plan.add_columns.retain(|(t, _)| !whole.contains(t));
        plan.drop_columns.retain(|(t, _)| !whole.contains(t));
        plan.defaults.retain(|(t, _)| !whole.contains(t));
        plan.add_constraints.retain(|(t, _)| !plan.create_tables.contains(t));
        plan.drop_constraints.retain(|(t, _)| !plan.drop_tables.contains(t));
        plan.add_indexes.retain(|(t, _)| !plan.create_tables.contains(t));
        plan.drop_indexes.retain(|(t, _)| !plan.drop_tables.contains(t));

        // fail before any statement is built rather than at render time
        if !plan.add_constraints.is_empty() {
            dialect.require(Feature::AddConstraint)?;
        }
        if !plan.drop_constraints.is_empty() {
            dialect.require(Feature::DropConstraint)?;
        }
        if !plan.drop_columns.is_empty() {
            dialect.require(Feature::DropColumn)?;
        }
        Ok(plan)
    }
}

fn lookup_table<'a>(catalog: &'a Catalog, table: &TableRef) -> Result<&'a Table> {
    catalog
        .table(table)
        .ok_or_else(|| Error::not_found("table", table.to_string()))
}

fn lookup_constraint<'a>(catalog: &'a Catalog, table: &TableRef, name: &str) -> Result<&'a Constraint> {
    lookup_table(catalog, table)?
        .constraint(name)
        .ok_or_else(|| Error::not_found("constraint", format!("{}.{}", table, name)))
}

/// The statements that reconcile `actual` with `expected`, given the
/// differences [`super::compare`] reported between them.
///
/// Changed constraints, indexes, views and partitioning objects are dropped
/// and recreated. Changing a column's type, nullability or identity, the
/// column order of a table, or a table's partitioning needs a table
/// rebuild and fails with `UnsupportedFeature`.
pub fn migration_script(
    expected: &Catalog,
    actual: &Catalog,
    differences: &[Difference],
    dialect: Dialect,
) -> Result<Batch> {
    let plan = Plan::from_differences(differences, dialect)?;
    let mut batch = Batch::new();

    for view in &plan.drop_views {
        batch.push(DropObject::view(view.clone()));
    }

    for schema in &plan.create_schemas {
        batch.push(CreateSchema::new(schema.clone()));
    }

    for seq in &plan.create_sequences {
        let sequence = expected
            .sequence(seq)
            .ok_or_else(|| Error::not_found("sequence", seq.to_string()))?;
        batch.push(CreateSequence::new(seq.clone(), sequence.descriptor));
    }
    for seq in &plan.alter_sequences {
        let wanted = expected
            .sequence(seq)
            .ok_or_else(|| Error::not_found("sequence", seq.to_string()))?;
        let mut alter = AlterSequence::new(seq.clone(), wanted.descriptor);
        if let Some(current) = actual.sequence(seq) {
            if current.descriptor.start != wanted.descriptor.start {
                alter = alter.restart(wanted.descriptor.start);
            }
        }
        batch.push(alter);
    }

    // partitioning objects: drop dependents first, recreate functions first
    for name in &plan.drop_partition_schemas {
        batch.push(DropObject::new(DropTarget::PartitionSchema(name.clone())));
    }
    for name in &plan.drop_functions {
        batch.push(DropObject::new(DropTarget::PartitionFunction(name.clone())));
    }
    for name in &plan.create_functions {
        let function = expected
            .partition_function(name)
            .ok_or_else(|| Error::not_found("partition function", name.clone()))?;
        batch.push(CreatePartitionFunction::new(function.clone()));
    }
    for name in &plan.create_partition_schemas {
        let schema = expected
            .partition_schema(name)
            .ok_or_else(|| Error::not_found("partition schema", name.clone()))?;
        batch.push(CreatePartitionSchema::new(schema.clone()));
    }

    // foreign keys go first so nothing they guard blocks the other drops
    let (fk_drops, other_drops): (Vec<_>, Vec<_>) =
        plan.drop_constraints.iter().partition(|(table, name)| {
            matches!(
                lookup_constraint(actual, table, name),
                Ok(Constraint::ForeignKey(_))
            )
        });
    for (table, name) in fk_drops.into_iter().chain(other_drops) {
        batch.push(AlterTable::new(table.clone()).drop_constraint(name.clone()));
    }
    for (table, name) in &plan.drop_indexes {
        batch.push(DropObject::index(table.clone(), name.clone()));
    }
    for (table, column) in &plan.drop_columns {
        batch.push(AlterTable::new(table.clone()).drop_column(column.clone()));
    }

    // new columns in the expected table's declared order
    for table in expected.tables() {
        for column in table.columns() {
            let key = (table.reference().clone(), column.name.clone());
            if plan.add_columns.contains(&key) {
                batch.push(AlterTable::new(key.0).add_column(column.clone()));
            } else if plan.defaults.contains(&key) {
                let alter = AlterTable::new(key.0);
                batch.push(match &column.default {
                    Some(default) => alter.set_default(key.1, default.clone()),
                    None => alter.drop_default(key.1),
                });
            }
        }
    }

    let new_tables = plan
        .create_tables
        .iter()
        .map(|t| lookup_table(expected, t))
        .collect::<Result<Vec<_>>>()?;
    create_tables(&mut batch, &new_tables, dialect)?;
    for table in &new_tables {
        for index in table.indexes() {
            batch.push(CreateIndex::new(table.reference().clone(), index.clone()));
        }
    }

    let mut foreign_keys = Vec::new();
    for (table, name) in &plan.add_constraints {
        let constraint = lookup_constraint(expected, table, name)?;
        let alter = AlterTable::new(table.clone()).add_constraint(constraint.clone());
        if matches!(constraint, Constraint::ForeignKey(_)) {
            foreign_keys.push(alter);
        } else {
            batch.push(alter);
        }
    }
    for (table, name) in &plan.add_indexes {
        let index = lookup_table(expected, table)?
            .index(name)
            .ok_or_else(|| Error::not_found("index", format!("{}.{}", table, name)))?;
        batch.push(CreateIndex::new(table.clone(), index.clone()));
    }
    for alter in foreign_keys {
        batch.push(alter);
    }

    // referencing tables are dropped before the tables they reference
    let doomed = plan
        .drop_tables
        .iter()
        .map(|t| lookup_table(actual, t))
        .collect::<Result<Vec<_>>>()?;
    match creation_order(&doomed) {
        Some(order) => {
            for table in order.into_iter().rev() {
                batch.push(DropObject::table(table.reference().clone()));
            }
        }
        None => {
            for table in &doomed {
                for constraint in table.constraints() {
                    if let Constraint::ForeignKey(fk) = constraint {
                        batch.push(
                            AlterTable::new(table.reference().clone())
                                .drop_constraint(fk.name.clone()),
                        );
                    }
                }
            }
            for table in &doomed {
                batch.push(DropObject::table(table.reference().clone()));
            }
        }
    }
    for seq in &plan.drop_sequences {
        batch.push(DropObject::sequence(seq.clone()));
    }
    for schema in &plan.drop_schemas {
        batch.push(DropObject::schema(schema.clone()));
    }

    for view in &plan.create_views {
        let definition = expected
            .view(view)
            .ok_or_else(|| Error::not_found("view", view.to_string()))?;
        batch.push(CreateView::new(view.clone(), definition.definition.clone()));
    }

    tracing::debug!(
        %dialect,
        differences = differences.len(),
        statements = batch.len(),
        "built migration script"
    );
    Ok(batch)
}
