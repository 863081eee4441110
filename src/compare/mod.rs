//! Structural comparison of two catalogs.
//!
//! [`compare`] walks an expected and an actual [`Catalog`] and reports every
//! entity that is missing, extra or changed. Named collections are matched
//! by name; table columns, key column lists and index key lists are
//! order-sensitive. Expressions are compared by their rendered SQL in the
//! comparison dialect, after whitespace and redundant outer parentheses
//! are normalised, so a check written with the DSL matches the same check
//! read back from a database as native text.
//!
//! [`script::migration_script`] turns the differences into a batch that
//! moves the actual catalog to the expected one, and [`script::apply`]
//! builds the creation script for a whole catalog.

pub mod script;

pub use script::{apply, migration_script};

use std::collections::BTreeMap;
use std::fmt;

use crate::mapping::defaults::strip_outer_parens;
use crate::model::{
    Catalog, ColumnIdentity, Constraint, Index, IndexTarget, PartitionDescriptor, PartitionMethod,
    SequenceDescriptor, SequenceRef, SortDirection, Table, TableRef, ViewDefinition,
};
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::expr::{Expr, RenderContext};

/// Knobs for [`compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompareOptions {
    /// Dialect used to render expressions and data types before comparing.
    pub dialect: Dialect,
    /// Skip view definitions entirely.
    pub ignore_views: bool,
}

impl CompareOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ignore_views: false,
        }
    }

    pub fn ignore_views(mut self) -> Self {
        self.ignore_views = true;
        self
    }
}

/// Location of a difference in the model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityPath {
    Schema(String),
    Table(TableRef),
    Column { table: TableRef, column: String },
    Constraint { table: TableRef, name: String },
    Index { table: TableRef, name: String },
    Partitioning(TableRef),
    Sequence(SequenceRef),
    View(TableRef),
    PartitionFunction(String),
    PartitionSchema(String),
}

impl EntityPath {
    /// Table the path belongs to, for table members and tables themselves.
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            EntityPath::Table(t)
            | EntityPath::Column { table: t, .. }
            | EntityPath::Constraint { table: t, .. }
            | EntityPath::Index { table: t, .. }
            | EntityPath::Partitioning(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityPath::Schema(name) => write!(f, "schema {}", name),
            EntityPath::Table(t) => write!(f, "table {}", t),
            EntityPath::Column { table, column } => write!(f, "column {}.{}", table, column),
            EntityPath::Constraint { table, name } => write!(f, "constraint {}.{}", table, name),
            EntityPath::Index { table, name } => write!(f, "index {}.{}", table, name),
            EntityPath::Partitioning(t) => write!(f, "partitioning of {}", t),
            EntityPath::Sequence(s) => write!(f, "sequence {}", s),
            EntityPath::View(v) => write!(f, "view {}", v),
            EntityPath::PartitionFunction(name) => write!(f, "partition function {}", name),
            EntityPath::PartitionSchema(name) => write!(f, "partition schema {}", name),
        }
    }
}

/// What differs at a path.
///
/// `Missing` means the entity exists only in the expected catalog and
/// `Extra` only in the actual one. In `Changed`, `before` is the actual
/// value and `after` the expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DifferenceKind {
    Missing,
    Extra,
    Changed {
        attribute: String,
        before: String,
        after: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    pub path: EntityPath,
    pub kind: DifferenceKind,
}

impl Difference {
    pub fn is_missing(&self) -> bool {
        matches!(self.kind, DifferenceKind::Missing)
    }

    pub fn is_extra(&self) -> bool {
        matches!(self.kind, DifferenceKind::Extra)
    }

    /// Name of the changed attribute, if this is a change.
    pub fn attribute(&self) -> Option<&str> {
        match &self.kind {
            DifferenceKind::Changed { attribute, .. } => Some(attribute),
            _ => None,
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DifferenceKind::Missing => write!(f, "missing {}", self.path),
            DifferenceKind::Extra => write!(f, "extra {}", self.path),
            DifferenceKind::Changed {
                attribute,
                before,
                after,
            } => write!(f, "{} {}: {} -> {}", self.path, attribute, before, after),
        }
    }
}

/// Compare `actual` against `expected`.
///
/// Both catalogs are frozen first; comparing is a read of two stable
/// models. An empty result means the catalogs are structurally equal.
pub fn compare(
    expected: &mut Catalog,
    actual: &mut Catalog,
    options: &CompareOptions,
) -> Vec<Difference> {
    expected.freeze();
    actual.freeze();

    let mut comparer = Comparer {
        options,
        cx: RenderContext::new(options.dialect),
        differences: Vec::new(),
    };
    comparer.catalogs(expected, actual);

    let differences = comparer.differences;
    tracing::debug!(
        dialect = %options.dialect,
        differences = differences.len(),
        missing = differences.iter().filter(|d| d.is_missing()).count(),
        extra = differences.iter().filter(|d| d.is_extra()).count(),
        "compared catalogs"
    );
    differences
}

struct Comparer<'o> {
    options: &'o CompareOptions,
    cx: RenderContext,
    differences: Vec<Difference>,
}

/// Match two named collections. Returns the pairs present on both sides;
/// one-sided entries are reported through `path`.
fn pair_up<'a, K: Ord + Clone, V>(
    differences: &mut Vec<Difference>,
    expected: BTreeMap<K, &'a V>,
    mut actual: BTreeMap<K, &'a V>,
    path: impl Fn(&K) -> EntityPath,
) -> Vec<(&'a V, &'a V)> {
    let mut pairs = Vec::new();
    for (key, e) in expected {
        match actual.remove(&key) {
            Some(a) => pairs.push((e, a)),
            None => differences.push(Difference {
                path: path(&key),
                kind: DifferenceKind::Missing,
            }),
        }
    }
    for key in actual.keys() {
        differences.push(Difference {
            path: path(key),
            kind: DifferenceKind::Extra,
        });
    }
    pairs
}

impl Comparer<'_> {
    fn changed(&mut self, path: &EntityPath, attribute: &str, expected: String, actual: String) {
        if expected != actual {
            self.differences.push(Difference {
                path: path.clone(),
                kind: DifferenceKind::Changed {
                    attribute: attribute.to_string(),
                    before: actual,
                    after: expected,
                },
            });
        }
    }

    fn catalogs(&mut self, expected: &Catalog, actual: &Catalog) {
        pair_up(
            &mut self.differences,
            expected.schemas().map(|s| (s.name().to_string(), s)).collect(),
            actual.schemas().map(|s| (s.name().to_string(), s)).collect(),
            |name| EntityPath::Schema(name.clone()),
        );

        for (e, a) in pair_up(
            &mut self.differences,
            expected.partition_functions().map(|f| (f.name.clone(), f)).collect(),
            actual.partition_functions().map(|f| (f.name.clone(), f)).collect(),
            |name| EntityPath::PartitionFunction(name.clone()),
        ) {
            let path = EntityPath::PartitionFunction(e.name.clone());
            self.changed(&path, "input type", self.data_type(e), self.data_type(a));
            let bounds = |f: &crate::model::PartitionFunction| {
                f.boundaries
                    .iter()
                    .map(|b| self.render(&Expr::Literal(b.clone())))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let (eb, ab) = (bounds(e), bounds(a));
            self.changed(&path, "boundaries", eb, ab);
            self.changed(
                &path,
                "boundary side",
                format!("{:?}", e.boundary_side),
                format!("{:?}", a.boundary_side),
            );
        }

        for (e, a) in pair_up(
            &mut self.differences,
            expected.partition_schemas().map(|s| (s.name.clone(), s)).collect(),
            actual.partition_schemas().map(|s| (s.name.clone(), s)).collect(),
            |name| EntityPath::PartitionSchema(name.clone()),
        ) {
            let path = EntityPath::PartitionSchema(e.name.clone());
            self.changed(&path, "function", e.function.clone(), a.function.clone());
            self.changed(
                &path,
                "filegroups",
                e.filegroups.join(", "),
                a.filegroups.join(", "),
            );
        }

        for (e, a) in pair_up(
            &mut self.differences,
            expected.sequences().map(|s| (s.reference().clone(), s)).collect(),
            actual.sequences().map(|s| (s.reference().clone(), s)).collect(),
            |r| EntityPath::Sequence(r.clone()),
        ) {
            let path = EntityPath::Sequence(e.reference().clone());
            self.sequence(&path, &e.descriptor, &a.descriptor);
        }

        for (e, a) in pair_up(
            &mut self.differences,
            expected.tables().map(|t| (t.reference().clone(), t)).collect(),
            actual.tables().map(|t| (t.reference().clone(), t)).collect(),
            |r| EntityPath::Table(r.clone()),
        ) {
            self.table(e, a);
        }

        if !self.options.ignore_views {
            for (e, a) in pair_up(
                &mut self.differences,
                expected.views().map(|v| (v.reference().clone(), v)).collect(),
                actual.views().map(|v| (v.reference().clone(), v)).collect(),
                |r| EntityPath::View(r.clone()),
            ) {
                let path = EntityPath::View(e.reference().clone());
                let (ed, ad) = (self.view_text(&e.definition), self.view_text(&a.definition));
                self.changed(&path, "definition", ed, ad);
            }
        }
    }

    fn sequence(&mut self, path: &EntityPath, e: &SequenceDescriptor, a: &SequenceDescriptor) {
        let bound = |b: Option<i64>| b.map_or_else(|| "default".to_string(), |v| v.to_string());
        self.changed(path, "start", e.start.to_string(), a.start.to_string());
        self.changed(path, "increment", e.increment.to_string(), a.increment.to_string());
        self.changed(path, "min", bound(e.min), bound(a.min));
        self.changed(path, "max", bound(e.max), bound(a.max));
        self.changed(path, "cycle", e.cyclic.to_string(), a.cyclic.to_string());
    }

    fn table(&mut self, expected: &Table, actual: &Table) {
        let table = expected.reference().clone();

        let mut common = Vec::new();
        for column in expected.columns() {
            let path = EntityPath::Column {
                table: table.clone(),
                column: column.name.clone(),
            };
            let Some(other) = actual.column(&column.name) else {
                self.differences.push(Difference {
                    path,
                    kind: DifferenceKind::Missing,
                });
                continue;
            };
            common.push(column.name.as_str());

            self.changed(
                &path,
                "type",
                self.options.dialect.emit_data_type(&column.value_type),
                self.options.dialect.emit_data_type(&other.value_type),
            );
            self.changed(
                &path,
                "nullable",
                column.nullable.to_string(),
                other.nullable.to_string(),
            );
            let (ed, ad) = (
                self.optional_expr(column.default.as_ref()),
                self.optional_expr(other.default.as_ref()),
            );
            self.changed(&path, "default", ed, ad);
            self.changed(
                &path,
                "identity",
                describe_identity(column.identity.as_ref()),
                describe_identity(other.identity.as_ref()),
            );
        }
        for column in actual.columns() {
            if !expected.has_column(&column.name) {
                self.differences.push(Difference {
                    path: EntityPath::Column {
                        table: table.clone(),
                        column: column.name.clone(),
                    },
                    kind: DifferenceKind::Extra,
                });
            }
        }

        let actual_order: Vec<&str> = actual
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .filter(|n| common.contains(n))
            .collect();
        self.changed(
            &EntityPath::Table(table.clone()),
            "column order",
            common.join(", "),
            actual_order.join(", "),
        );

        for (e, a) in pair_up(
            &mut self.differences,
            expected.constraints().map(|c| (c.name().to_string(), c)).collect(),
            actual.constraints().map(|c| (c.name().to_string(), c)).collect(),
            |name| EntityPath::Constraint {
                table: table.clone(),
                name: name.clone(),
            },
        ) {
            let path = EntityPath::Constraint {
                table: table.clone(),
                name: e.name().to_string(),
            };
            if e.kind() != a.kind() {
                self.changed(&path, "kind", e.kind().to_string(), a.kind().to_string());
                continue;
            }
            for ((attribute, ev), (_, av)) in self
                .constraint_attributes(e)
                .into_iter()
                .zip(self.constraint_attributes(a))
            {
                self.changed(&path, attribute, ev, av);
            }
        }

        for (e, a) in pair_up(
            &mut self.differences,
            expected.indexes().map(|i| (i.name.clone(), i)).collect(),
            actual.indexes().map(|i| (i.name.clone(), i)).collect(),
            |name| EntityPath::Index {
                table: table.clone(),
                name: name.clone(),
            },
        ) {
            let path = EntityPath::Index {
                table: table.clone(),
                name: e.name.clone(),
            };
            for ((attribute, ev), (_, av)) in self
                .index_attributes(e)
                .into_iter()
                .zip(self.index_attributes(a))
            {
                self.changed(&path, attribute, ev, av);
            }
        }

        self.changed(
            &EntityPath::Partitioning(table),
            "method",
            describe_partitioning(expected.partitioning()),
            describe_partitioning(actual.partitioning()),
        );
    }

    fn constraint_attributes(&self, constraint: &Constraint) -> Vec<(&'static str, String)> {
        match constraint {
            Constraint::PrimaryKey { columns, .. } | Constraint::Unique { columns, .. } => {
                vec![("columns", columns.join(", "))]
            }
            Constraint::Check { condition, .. } => vec![("condition", self.render(condition))],
            Constraint::ForeignKey(fk) => vec![
                ("columns", fk.columns.join(", ")),
                ("references", fk.referenced_table.to_string()),
                ("referenced columns", fk.referenced_columns.join(", ")),
                ("on delete", fk.on_delete.to_string()),
                ("on update", fk.on_update.to_string()),
                ("deferrability", format!("{:?}", fk.deferrability)),
                ("match", format!("{:?}", fk.match_type)),
            ],
        }
    }

    fn index_attributes(&self, index: &Index) -> Vec<(&'static str, String)> {
        let keys = index
            .columns
            .iter()
            .map(|key| {
                let target = match &key.target {
                    IndexTarget::Column(name) => name.clone(),
                    IndexTarget::Expression(expr) => format!("({})", self.render(expr)),
                };
                match key.direction {
                    SortDirection::Ascending => target,
                    SortDirection::Descending => format!("{} DESC", target),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        vec![
            ("unique", index.unique.to_string()),
            ("columns", keys),
            ("filter", self.optional_expr(index.filter.as_ref())),
            (
                "fill factor",
                index
                    .fill_factor
                    .map_or_else(|| "default".to_string(), |f| f.to_string()),
            ),
            (
                "method",
                index
                    .method
                    .as_ref()
                    .map_or_else(|| "default".to_string(), |m| m.as_str().to_string()),
            ),
        ]
    }

    fn data_type(&self, function: &crate::model::PartitionFunction) -> String {
        self.options.dialect.emit_data_type(&function.input_type)
    }

    fn optional_expr(&self, expr: Option<&Expr>) -> String {
        expr.map_or_else(|| "none".to_string(), |e| self.render(e))
    }

    /// Rendered, normalised SQL of an expression. Expressions the dialect
    /// cannot render fall back to their debug form, which still compares
    /// equal for identical trees.
    fn render(&self, expr: &Expr) -> String {
        match expr.to_tokens(&self.cx) {
            Ok(ts) => normalize_sql(&ts.serialize(self.options.dialect)),
            Err(err) => {
                tracing::debug!(error = %err, "expression not renderable for comparison");
                format!("{:?}", expr)
            }
        }
    }

    fn view_text(&self, definition: &ViewDefinition) -> String {
        match definition {
            ViewDefinition::Native(text) => normalize_sql(text),
            ViewDefinition::Query(query) => match query.to_tokens(&self.cx) {
                Ok(ts) => normalize_sql(&ts.serialize(self.options.dialect)),
                Err(_) => format!("{:?}", query),
            },
        }
    }
}

fn describe_identity(identity: Option<&ColumnIdentity>) -> String {
    match identity {
        None => "none".to_string(),
        Some(ColumnIdentity::Identity { start, increment }) => {
            format!("identity({}, {})", start, increment)
        }
        Some(ColumnIdentity::Sequence(seq)) => format!("sequence {}", seq),
    }
}

fn describe_partitioning(partitioning: Option<&PartitionDescriptor>) -> String {
    match partitioning {
        None => "none".to_string(),
        Some(p) => match &p.method {
            PartitionMethod::Hash { partitions } => {
                format!("hash({}) into {}", p.column, partitions)
            }
            PartitionMethod::List { schema } => format!("list({}) on {}", p.column, schema),
            PartitionMethod::Range { schema } => format!("range({}) on {}", p.column, schema),
        },
    }
}

/// Collapse whitespace, drop a trailing `;` and strip parentheses that
/// wrap the whole text.
pub fn normalize_sql(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_end_matches(';').trim_end();
    let mut body = strip_outer_parens(trimmed).to_string();
    // "( a )" and "(a)" render the same after the strip above
    body = body.replace("( ", "(").replace(" )", ")");
    body
}
