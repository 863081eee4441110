//! Postgres catalog extraction over `information_schema` and `pg_catalog`.
//!
//! Column lists come back as comma-joined `quote_ident` output so names
//! containing commas survive the trip.

use once_cell::sync::Lazy;
use regex::Regex;

use super::connection::{Connection, Row};
use super::{
    balanced_group, check_dialect, split_top_level, unquote_identifier, ExtractionReport,
    Extractor,
};
use crate::error::Result;
use crate::mapping::defaults::strip_outer_parens;
use crate::mapping::mapper_for;
use crate::model::{
    Catalog, Column, Constraint, Deferrability, ForeignKey, Index, IndexColumn, IndexMethod,
    MatchType, ReferentialAction, SequenceDescriptor, SequenceRef, SortDirection, TableRef,
    ViewDefinition,
};
use crate::sql::dialect::Dialect;
use crate::sql::expr::Expr;
use crate::sql::types::ValueType;

const SCHEMAS_SQL: &str = r#"
SELECT n.nspname AS schema_name
FROM pg_catalog.pg_namespace n
WHERE n.nspname NOT LIKE 'pg\_%'
  AND n.nspname <> 'information_schema'
ORDER BY n.nspname
"#;

const SEQUENCES_SQL: &str = r#"
SELECT s.schemaname AS sequence_schema, s.sequencename AS sequence_name,
       s.start_value, s.increment_by, s.min_value, s.max_value, s.cycle
FROM pg_catalog.pg_sequences s
WHERE s.schemaname NOT LIKE 'pg\_%'
  AND s.schemaname <> 'information_schema'
  AND NOT EXISTS (
      SELECT 1 FROM pg_catalog.pg_depend d
      WHERE d.objid = (quote_ident(s.schemaname) || '.' || quote_ident(s.sequencename))::regclass
        AND d.deptype IN ('a', 'i'))
ORDER BY s.schemaname, s.sequencename
"#;

const TABLES_SQL: &str = r#"
SELECT n.nspname AS table_schema, c.relname AS table_name, c.relkind AS table_kind
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind IN ('r', 'p')
  AND NOT c.relispartition
  AND n.nspname NOT LIKE 'pg\_%'
  AND n.nspname <> 'information_schema'
ORDER BY n.nspname, c.relname
"#;

const COLUMNS_SQL: &str = r#"
SELECT n.nspname AS table_schema, c.relname AS table_name, a.attname AS column_name,
       format_type(a.atttypid, a.atttypmod) AS data_type,
       a.attnotnull AS not_null,
       pg_get_expr(d.adbin, d.adrelid) AS column_default,
       a.attidentity AS identity_kind,
       s.seqstart AS identity_start, s.seqincrement AS identity_increment
FROM pg_catalog.pg_attribute a
JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
LEFT JOIN pg_catalog.pg_sequence s
       ON a.attidentity <> ''
      AND s.seqrelid = pg_get_serial_sequence(
              quote_ident(n.nspname) || '.' || quote_ident(c.relname), a.attname)::regclass
WHERE c.relkind IN ('r', 'p')
  AND NOT c.relispartition
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND n.nspname NOT LIKE 'pg\_%'
  AND n.nspname <> 'information_schema'
ORDER BY n.nspname, c.relname, a.attnum
"#;

const CONSTRAINTS_SQL: &str = r#"
SELECT n.nspname AS table_schema, t.relname AS table_name,
       c.conname AS constraint_name, c.contype AS constraint_type,
       array_to_string(ARRAY(
           SELECT quote_ident(a.attname)
           FROM unnest(c.conkey) WITH ORDINALITY k(attnum, ord)
           JOIN pg_catalog.pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = k.attnum
           ORDER BY k.ord), ',') AS columns,
       rn.nspname AS ref_schema, rt.relname AS ref_table,
       array_to_string(ARRAY(
           SELECT quote_ident(a.attname)
           FROM unnest(c.confkey) WITH ORDINALITY k(attnum, ord)
           JOIN pg_catalog.pg_attribute a ON a.attrelid = c.confrelid AND a.attnum = k.attnum
           ORDER BY k.ord), ',') AS ref_columns,
       c.confupdtype AS on_update, c.confdeltype AS on_delete, c.confmatchtype AS match_type,
       c.condeferrable AS is_deferrable, c.condeferred AS is_deferred,
       pg_get_expr(c.conbin, c.conrelid) AS check_clause
FROM pg_catalog.pg_constraint c
JOIN pg_catalog.pg_class t ON t.oid = c.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
LEFT JOIN pg_catalog.pg_class rt ON rt.oid = c.confrelid
LEFT JOIN pg_catalog.pg_namespace rn ON rn.oid = rt.relnamespace
WHERE c.contype IN ('p', 'u', 'f', 'c', 'x')
  AND n.nspname NOT LIKE 'pg\_%'
  AND n.nspname <> 'information_schema'
ORDER BY n.nspname, t.relname, c.contype, c.conname
"#;

const INDEXES_SQL: &str = r#"
SELECT n.nspname AS table_schema, t.relname AS table_name, i.relname AS index_name,
       ix.indisunique AS is_unique, am.amname AS method,
       pg_get_indexdef(ix.indexrelid) AS definition,
       pg_get_expr(ix.indpred, ix.indrelid) AS filter,
       array_to_string(i.reloptions, ',') AS options
FROM pg_catalog.pg_index ix
JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid
JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
JOIN pg_catalog.pg_am am ON am.oid = i.relam
WHERE t.relkind IN ('r', 'p')
  AND n.nspname NOT LIKE 'pg\_%'
  AND n.nspname <> 'information_schema'
  AND NOT EXISTS (
      SELECT 1 FROM pg_catalog.pg_constraint c
      WHERE c.conindid = ix.indexrelid AND c.contype IN ('p', 'u', 'x'))
ORDER BY n.nspname, t.relname, i.relname
"#;

const VIEWS_SQL: &str = r#"
SELECT v.schemaname AS view_schema, v.viewname AS view_name, v.definition
FROM pg_catalog.pg_views v
WHERE v.schemaname NOT LIKE 'pg\_%'
  AND v.schemaname <> 'information_schema'
ORDER BY v.schemaname, v.viewname
"#;

static NEXTVAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^nextval\('((?:[^']|'')+)'(?:::regclass)?\)$"#).unwrap());

static USING_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bUSING\s+\w+\s*\(").unwrap());

static PLAIN_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?:"(?:[^"]|"")+"|[a-z_][a-z0-9_$]*)$"#).unwrap());

static KEY_OPTIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\s+NULLS\s+(?:FIRST|LAST))?(?:\s+(ASC|DESC))?(?:\s+NULLS\s+(?:FIRST|LAST))?\s*$")
        .unwrap()
});

/// Extracts a catalog from a Postgres database.
#[derive(Debug, Clone)]
pub struct PostgresExtractor {
    catalog_name: String,
    default_schema: String,
}

impl Default for PostgresExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PostgresExtractor {
    pub fn new() -> Self {
        Self {
            catalog_name: "postgres".to_string(),
            default_schema: "public".to_string(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.catalog_name = name.into();
        self
    }

    /// Schema that becomes the catalog's default schema.
    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }
}

impl Extractor for PostgresExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn extract_with_report(
        &self,
        conn: &mut dyn Connection,
    ) -> Result<(Catalog, ExtractionReport)> {
        check_dialect(self, &*conn)?;
        let mut catalog = Catalog::new(self.catalog_name.clone(), self.default_schema.clone());
        let mut report = ExtractionReport::default();

        for row in conn.query(SCHEMAS_SQL, &[])?.iter() {
            let schema = row.require_text("schema_name")?;
            if catalog.schema(schema).is_none() {
                catalog.create_schema(schema)?;
            }
        }

        // sequences first: columns may draw their defaults from them
        for row in conn.query(SEQUENCES_SQL, &[])?.iter() {
            let schema = row.require_text("sequence_schema")?;
            let name = row.require_text("sequence_name")?;
            catalog.create_sequence(schema, name, sequence_descriptor(&row))?;
        }

        let tables = conn.query(TABLES_SQL, &[])?;
        for row in tables.iter() {
            let schema = row.require_text("table_schema")?;
            let name = row.require_text("table_name")?;
            catalog.create_table(schema, name)?;
            if row.text("table_kind") == Some("p") {
                report.skip(
                    "partitioning",
                    &format!("{}.{}", schema, name),
                    "native partitioning is not modelled",
                );
            }
        }

        self.extract_columns(conn, &mut catalog, &mut report)?;
        self.extract_constraints(conn, &mut catalog, &mut report)?;
        self.extract_indexes(conn, &mut catalog, &mut report)?;

        for row in conn.query(VIEWS_SQL, &[])?.iter() {
            let schema = row.require_text("view_schema")?;
            let name = row.require_text("view_name")?;
            let body = row
                .text("definition")
                .unwrap_or_default()
                .trim()
                .trim_end_matches(';')
                .trim_end()
                .to_string();
            catalog.create_view(schema, name, ViewDefinition::Native(body))?;
        }

        tracing::debug!(
            tables = tables.len(),
            skipped = report.not_extracted.len(),
            "postgres extraction finished"
        );
        Ok((catalog, report))
    }
}

impl PostgresExtractor {
    fn extract_columns(
        &self,
        conn: &mut dyn Connection,
        catalog: &mut Catalog,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        let mapper = mapper_for(Dialect::Postgres);
        for row in conn.query(COLUMNS_SQL, &[])?.iter() {
            let table = TableRef::new(
                row.require_text("table_schema")?,
                row.require_text("table_name")?,
            );
            let name = row.require_text("column_name")?;
            let declared = row.require_text("data_type")?;
            let value_type = match ValueType::parse(declared) {
                Some(ty) => ty,
                None => {
                    report.skip(
                        "column type",
                        &format!("{}.{}", table, name),
                        &format!("'{}' read as TEXT", declared),
                    );
                    ValueType::Text
                }
            };

            let mut column = Column::new(name, value_type).nullable(!row.flag("not_null"));
            let identity = row.text("identity_kind").filter(|k| !k.is_empty());
            if identity.is_some() {
                column = column.identity(
                    row.int("identity_start").unwrap_or(1),
                    row.int("identity_increment").unwrap_or(1),
                );
            } else if let Some(text) = row.text("column_default") {
                match NEXTVAL.captures(text.trim()).and_then(|c| c.get(1)) {
                    Some(target) => {
                        let sequence = parse_regclass(&target.as_str().replace("''", "'"), &table);
                        if catalog.sequence(&sequence).is_some() {
                            column = column.sequence(sequence);
                        } else {
                            // owned by a serial column; keep the default text
                            column = column.default_value(Expr::Native(text.trim().to_string()));
                        }
                    }
                    None => {
                        column = column.default_value(mapper.decode_default(&value_type, text));
                    }
                }
            }
            catalog.table_mut(&table)?.add_column(column)?;
            tracing::trace!(table = %table, column = name, "extracted column");
        }
        Ok(())
    }

    fn extract_constraints(
        &self,
        conn: &mut dyn Connection,
        catalog: &mut Catalog,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        let rows = conn.query(CONSTRAINTS_SQL, &[])?;
        // keys before foreign keys, which may target them
        let mut foreign_keys = Vec::new();
        for row in rows.iter() {
            let table = TableRef::new(
                row.require_text("table_schema")?,
                row.require_text("table_name")?,
            );
            let name = row.require_text("constraint_name")?.to_string();
            let columns = ident_list(row.text("columns").unwrap_or_default());
            let constraint = match row.require_text("constraint_type")? {
                "p" => Constraint::PrimaryKey { name, columns },
                "u" => Constraint::Unique { name, columns },
                "c" => {
                    let clause = row.require_text("check_clause")?;
                    Constraint::check(name, Expr::Native(strip_outer_parens(clause).to_string()))
                }
                "f" => {
                    foreign_keys.push((table, foreign_key(&row, name, columns)?));
                    continue;
                }
                _ => {
                    report.skip("constraint", &name, "exclusion constraints are not modelled");
                    continue;
                }
            };
            catalog.table_mut(&table)?.add_constraint(constraint)?;
        }
        for (table, fk) in foreign_keys {
            catalog.table_mut(&table)?.add_constraint(fk.into())?;
        }
        Ok(())
    }

    fn extract_indexes(
        &self,
        conn: &mut dyn Connection,
        catalog: &mut Catalog,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        for row in conn.query(INDEXES_SQL, &[])?.iter() {
            let table = TableRef::new(
                row.require_text("table_schema")?,
                row.require_text("table_name")?,
            );
            let name = row.require_text("index_name")?;
            let definition = row.require_text("definition")?;

            let Some(columns) = index_columns(definition) else {
                report.skip("index", name, "definition could not be read");
                continue;
            };
            let mut index = Index::new(name, columns);
            if row.flag("is_unique") {
                index = index.unique();
            }
            match row.text("method") {
                None | Some("btree") => {}
                Some(method) => index = index.method(IndexMethod::parse(method)),
            }
            if let Some(ff) = row
                .text("options")
                .unwrap_or_default()
                .split(',')
                .find_map(|o| o.trim().strip_prefix("fillfactor="))
                .and_then(|v| v.parse::<u8>().ok())
            {
                index = index.fill_factor(ff);
            }
            if let Some(filter) = row.text("filter") {
                index = index.filter(Expr::Native(strip_outer_parens(filter).to_string()));
            }
            catalog.table_mut(&table)?.add_index(index)?;
        }
        Ok(())
    }
}

/// Postgres reports its default bounds explicitly; map them back to "unset".
fn sequence_descriptor(row: &Row<'_>) -> SequenceDescriptor {
    let increment = row.int("increment_by").unwrap_or(1);
    let mut descriptor = SequenceDescriptor::new(row.int("start_value").unwrap_or(1), increment);
    let (default_min, default_max) = if increment > 0 {
        (1, i64::MAX)
    } else {
        (i64::MIN, -1)
    };
    if let Some(min) = row.int("min_value").filter(|m| *m != default_min) {
        descriptor = descriptor.min(min);
    }
    if let Some(max) = row.int("max_value").filter(|m| *m != default_max) {
        descriptor = descriptor.max(max);
    }
    if row.flag("cycle") {
        descriptor = descriptor.cyclic();
    }
    descriptor
}

fn foreign_key(row: &Row<'_>, name: String, columns: Vec<String>) -> Result<ForeignKey> {
    let referenced_table = TableRef::new(row.require_text("ref_schema")?, row.require_text("ref_table")?);
    let action = |column: &str| {
        row.text(column)
            .and_then(ReferentialAction::parse)
            .unwrap_or_default()
    };
    let deferrability = match (row.flag("is_deferrable"), row.flag("is_deferred")) {
        (false, _) => Deferrability::NotDeferrable,
        (true, false) => Deferrability::InitiallyImmediate,
        (true, true) => Deferrability::InitiallyDeferred,
    };
    Ok(ForeignKey {
        name,
        columns,
        referenced_table,
        referenced_columns: ident_list(row.text("ref_columns").unwrap_or_default()),
        on_delete: action("on_delete"),
        on_update: action("on_update"),
        deferrability,
        match_type: match row.text("match_type") {
            Some("f") => MatchType::Full,
            Some("p") => MatchType::Partial,
            _ => MatchType::None,
        },
    })
}

/// `"Id","Dept Name"` -> `["Id", "Dept Name"]`.
fn ident_list(text: &str) -> Vec<String> {
    split_top_level(text)
        .iter()
        .map(|c| unquote_identifier(c))
        .collect()
}

/// `"main"."Seq"` or `Seq` (resolved against the owning table's schema).
fn parse_regclass(text: &str, owner: &TableRef) -> SequenceRef {
    let parts = split_qualified(text);
    match parts.as_slice() {
        [schema, name] => SequenceRef::new(schema.clone(), name.clone()),
        _ => SequenceRef::new(owner.schema.clone(), unquote_identifier(text)),
    }
}

fn split_qualified(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in text.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            '.' if !quoted => parts.push(unquote_identifier(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    parts.push(unquote_identifier(&current));
    parts
}

/// Key columns of a `pg_get_indexdef` definition.
fn index_columns(definition: &str) -> Option<Vec<IndexColumn>> {
    let open = USING_GROUP.find(definition)?.end() - 1;
    let body = balanced_group(definition, open)?;
    let columns = split_top_level(body)
        .iter()
        .map(|item| {
            let direction = match KEY_OPTIONS
                .captures(item)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_ascii_uppercase())
            {
                Some(d) if d == "DESC" => SortDirection::Descending,
                _ => SortDirection::Ascending,
            };
            let key = KEY_OPTIONS.replace(item, "");
            let column = if PLAIN_IDENT.is_match(&key) {
                IndexColumn::column(unquote_identifier(&key))
            } else {
                IndexColumn::expression(Expr::Native(strip_outer_parens(&key).to_string()))
            };
            IndexColumn { direction, ..column }
        })
        .collect();
    Some(columns)
}
