//! SQLite catalog extraction.
//!
//! Structure comes from `sqlite_master` and the table-valued pragmas.
//! SQLite keeps no constraint names and no CHECK bodies in its pragmas, so
//! both are recovered from the stored `CREATE TABLE` text.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::connection::{Connection, RowSet};
use super::{
    balanced_group, check_dialect, split_top_level, unquote_identifier, ExtractionReport,
    Extractor,
};
use crate::error::Result;
use crate::mapping::defaults::strip_outer_parens;
use crate::mapping::mapper_for;
use crate::model::{
    Catalog, Column, Constraint, Deferrability, ForeignKey, Index, IndexColumn, MatchType,
    ReferentialAction, SortDirection, TableRef, ViewDefinition,
};
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::expr::Expr;
use crate::sql::types::ValueType;

const IDENT: &str = r#"(?:"(?:[^"]|"")*"|\[[^\]]*\]|`(?:[^`]|``)*`|[A-Za-z_][A-Za-z0-9_$]*)"#;

static CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:\bCONSTRAINT\s+({IDENT})\s+)?\b(PRIMARY\s+KEY|UNIQUE|FOREIGN\s+KEY|CHECK)\b"
    ))
    .unwrap()
});

static TABLE_LEVEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:CONSTRAINT|PRIMARY|UNIQUE|FOREIGN|CHECK)\b").unwrap());

static AUTOINCREMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bAUTOINCREMENT\b").unwrap());

static LEADING_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("^{IDENT}")).unwrap());

static INDEX_ON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?is)\bON\s+{IDENT}(?:\s*\.\s*{IDENT})?\s*\(")).unwrap()
});

static WHERE_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)^\s*WHERE\s+(.*?)\s*;?\s*$").unwrap());

static KEY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\s+COLLATE\s+\w+)?(?:\s+(?:ASC|DESC))?\s*$").unwrap());

static VIEW_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*CREATE\s+(?:TEMP(?:ORARY)?\s+)?VIEW\s+(?:IF\s+NOT\s+EXISTS\s+)?{IDENT}(?:\s*\.\s*{IDENT})?(?:\s*\([^)]*\))?\s+AS\s+(.*?)\s*;?\s*$"
    ))
    .unwrap()
});

/// Extracts a catalog from a SQLite database. Everything lands in the
/// `main` schema.
#[derive(Debug, Clone)]
pub struct SqliteExtractor {
    catalog_name: String,
}

impl Default for SqliteExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteExtractor {
    pub fn new() -> Self {
        Self {
            catalog_name: "main".to_string(),
        }
    }

    /// Name given to the extracted catalog.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.catalog_name = name.into();
        self
    }
}

/// A constraint clause found in stored table DDL.
#[derive(Debug, Clone, PartialEq)]
struct Clause {
    name: Option<String>,
    kind: ClauseKind,
    columns: Vec<String>,
    body: Option<String>,
    deferrability: Deferrability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClauseKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
}

struct TableSource {
    name: String,
    sql: String,
    clauses: Vec<Clause>,
}

struct IndexSource {
    name: String,
    table: String,
    sql: String,
}

impl Extractor for SqliteExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn extract_with_report(
        &self,
        conn: &mut dyn Connection,
    ) -> Result<(Catalog, ExtractionReport)> {
        check_dialect(self, &*conn)?;
        let mut catalog = Catalog::new(self.catalog_name.clone(), "main");
        let mut report = ExtractionReport::default();

        let objects = conn.query(
            "SELECT type, name, tbl_name, sql FROM sqlite_master \
             WHERE name NOT LIKE 'sqlite_%' ORDER BY type, name",
            &[],
        )?;

        let mut tables = Vec::new();
        let mut indexes = Vec::new();
        let mut views = Vec::new();
        for row in objects.iter() {
            let kind = row.require_text("type")?;
            let name = row.require_text("name")?.to_string();
            let sql = row.text("sql").unwrap_or_default().to_string();
            match kind {
                "table" => {
                    let clauses = parse_clauses(&sql);
                    tables.push(TableSource { name, sql, clauses });
                }
                "index" => indexes.push(IndexSource {
                    name,
                    table: row.require_text("tbl_name")?.to_string(),
                    sql,
                }),
                "view" => views.push((name, sql)),
                other => report.skip(other, &name, "not part of the model"),
            }
        }

        for table in &tables {
            self.extract_table(conn, &mut catalog, &mut report, table)?;
        }
        // foreign keys only once every target table exists
        for table in &tables {
            self.extract_foreign_keys(conn, &mut catalog, table)?;
        }
        for index in &indexes {
            self.extract_index(conn, &mut catalog, &mut report, index)?;
        }
        for (name, sql) in views {
            match VIEW_BODY.captures(&sql).and_then(|c| c.get(1)) {
                Some(body) => {
                    let definition = ViewDefinition::Native(body.as_str().to_string());
                    catalog.create_view("main", &name, definition)?;
                }
                None => report.skip("view", &name, "definition could not be read"),
            }
        }

        tracing::debug!(
            tables = tables.len(),
            skipped = report.not_extracted.len(),
            "sqlite extraction finished"
        );
        Ok((catalog, report))
    }
}

impl SqliteExtractor {
    fn pragma(&self, conn: &mut dyn Connection, pragma: &str, object: &str) -> Result<RowSet> {
        let sql = format!(
            "PRAGMA {}({})",
            pragma,
            Dialect::Sqlite.quote_identifier(object)
        );
        conn.query(&sql, &[])
    }

    fn extract_table(
        &self,
        conn: &mut dyn Connection,
        catalog: &mut Catalog,
        report: &mut ExtractionReport,
        source: &TableSource,
    ) -> Result<()> {
        let reference = catalog.create_table("main", &source.name)?;
        let info = self.pragma(conn, "table_info", &source.name)?;
        let autoincrement = AUTOINCREMENT.is_match(&source.sql);
        let mapper = mapper_for(Dialect::Sqlite);

        let mut key: Vec<(i64, String)> = Vec::new();
        let mut columns = Vec::new();
        for row in info.iter() {
            let name = row.require_text("name")?.to_string();
            let declared = row.text("type").unwrap_or_default();
            let pk_position = row.int("pk").unwrap_or(0);
            if pk_position > 0 {
                key.push((pk_position, name.clone()));
            }

            let mut value_type = match ValueType::parse(declared) {
                Some(ty) => ty,
                None => {
                    report.skip(
                        "column type",
                        &format!("{}.{}", source.name, name),
                        &format!("'{}' read as TEXT", declared),
                    );
                    ValueType::Text
                }
            };
            let mut column = Column::new(name, value_type).nullable(!row.flag("notnull"));
            if let Some(text) = row.text("dflt_value") {
                column = column.default_value(mapper.decode_default(&value_type, text));
            }
            if autoincrement && pk_position > 0 && declared.eq_ignore_ascii_case("INTEGER") {
                // rowid aliases are 64-bit whatever the declared name
                value_type = ValueType::Int64;
                column.value_type = value_type;
                column = column.identity(1, 1);
            }
            columns.push(column);
        }

        let column_count = columns.len();
        {
            let mut t = catalog.table_mut(&reference)?;
            for column in columns {
                t.add_column(column)?;
            }
        }

        if !key.is_empty() {
            key.sort();
            let key: Vec<String> = key.into_iter().map(|(_, c)| c).collect();
            let name = source
                .find(ClauseKind::PrimaryKey, &key)
                .and_then(|c| c.name.clone())
                .unwrap_or_else(|| format!("PK_{}", source.name));
            catalog.table_mut(&reference)?.add_constraint(Constraint::PrimaryKey {
                name,
                columns: key,
            })?;
        }

        let list = self.pragma(conn, "index_list", &source.name)?;
        let mut generated = 0;
        for row in list.iter() {
            if row.text("origin") != Some("u") {
                continue;
            }
            let index_name = row.require_text("name")?.to_string();
            let columns = self.index_columns(conn, &index_name)?;
            let name = match source
                .find(ClauseKind::Unique, &columns)
                .and_then(|c| c.name.clone())
            {
                Some(name) => name,
                None => {
                    generated += 1;
                    format!("UQ_{}_{}", source.name, generated)
                }
            };
            catalog
                .table_mut(&reference)?
                .add_constraint(Constraint::Unique { name, columns })?;
        }

        let mut unnamed_checks = 0;
        for clause in source.clauses.iter().filter(|c| c.kind == ClauseKind::Check) {
            let Some(body) = &clause.body else { continue };
            let name = match &clause.name {
                Some(name) => name.clone(),
                None => {
                    unnamed_checks += 1;
                    format!("CK_{}_{}", source.name, unnamed_checks)
                }
            };
            catalog
                .table_mut(&reference)?
                .add_constraint(Constraint::check(name, Expr::Native(body.trim().to_string())))?;
        }

        tracing::debug!(table = %reference, columns = column_count, "extracted table");
        Ok(())
    }

    /// Key columns of an index, in key order.
    fn index_columns(&self, conn: &mut dyn Connection, index: &str) -> Result<Vec<String>> {
        let info = self.pragma(conn, "index_info", index)?;
        let mut keyed: Vec<(i64, String)> = info
            .iter()
            .filter_map(|r| Some((r.int("seqno")?, r.text("name")?.to_string())))
            .collect();
        keyed.sort();
        Ok(keyed.into_iter().map(|(_, c)| c).collect())
    }

    fn extract_foreign_keys(
        &self,
        conn: &mut dyn Connection,
        catalog: &mut Catalog,
        source: &TableSource,
    ) -> Result<()> {
        let list = self.pragma(conn, "foreign_key_list", &source.name)?;

        // id -> rows in seq order
        let mut groups: BTreeMap<i64, Vec<ForeignKeyRow>> = BTreeMap::new();
        for row in list.iter() {
            groups
                .entry(row.int("id").unwrap_or(0))
                .or_default()
                .push(ForeignKeyRow {
                    seq: row.int("seq").unwrap_or(0),
                    table: row.require_text("table")?.to_string(),
                    from: row.require_text("from")?.to_string(),
                    to: row.text("to").map(str::to_string),
                    on_update: row.text("on_update").unwrap_or("NO ACTION").to_string(),
                    on_delete: row.text("on_delete").unwrap_or("NO ACTION").to_string(),
                    match_type: row.text("match").unwrap_or("NONE").to_string(),
                });
        }

        let reference = TableRef::new("main", source.name.clone());
        for (id, mut rows) in groups {
            rows.sort_by_key(|r| r.seq);
            let first = &rows[0];
            let target = TableRef::new("main", first.table.clone());
            let columns: Vec<String> = rows.iter().map(|r| r.from.clone()).collect();

            // omitted target columns mean the target's primary key
            let referenced: Vec<String> = if rows.iter().all(|r| r.to.is_some()) {
                rows.iter().filter_map(|r| r.to.clone()).collect()
            } else {
                catalog
                    .table(&target)
                    .and_then(|t| t.primary_key())
                    .map(|pk| pk.columns().to_vec())
                    .unwrap_or_default()
            };

            let clause = source.find(ClauseKind::ForeignKey, &columns);
            let name = clause
                .and_then(|c| c.name.clone())
                .unwrap_or_else(|| format!("FK_{}_{}", source.name, id));
            let fk = ForeignKey {
                name,
                columns,
                referenced_table: target,
                referenced_columns: referenced,
                on_delete: ReferentialAction::parse(&first.on_delete).unwrap_or_default(),
                on_update: ReferentialAction::parse(&first.on_update).unwrap_or_default(),
                deferrability: clause.map(|c| c.deferrability).unwrap_or_default(),
                match_type: match first.match_type.to_ascii_uppercase().as_str() {
                    "FULL" => MatchType::Full,
                    "PARTIAL" => MatchType::Partial,
                    _ => MatchType::None,
                },
            };
            catalog.table_mut(&reference)?.add_constraint(fk.into())?;
        }
        Ok(())
    }

    fn extract_index(
        &self,
        conn: &mut dyn Connection,
        catalog: &mut Catalog,
        report: &mut ExtractionReport,
        source: &IndexSource,
    ) -> Result<()> {
        // constraint-backed indexes carry no stored SQL
        if source.sql.is_empty() {
            return Ok(());
        }
        let reference = TableRef::new("main", source.table.clone());
        if catalog.table(&reference).is_none() {
            report.skip("index", &source.name, "table was not extracted");
            return Ok(());
        }

        let Some(open) = INDEX_ON.find(&source.sql).map(|m| m.end() - 1) else {
            report.skip("index", &source.name, "definition could not be read");
            return Ok(());
        };
        let Some(body) = balanced_group(&source.sql, open) else {
            report.skip("index", &source.name, "definition could not be read");
            return Ok(());
        };
        let written = split_top_level(body);
        let rest = &source.sql[open + body.len() + 2..];

        let info = self.pragma(conn, "index_xinfo", &source.name)?;
        let mut keys: Vec<(i64, i64, Option<String>, bool)> = info
            .iter()
            .filter(|r| r.flag("key"))
            .map(|r| {
                (
                    r.int("seqno").unwrap_or(0),
                    r.int("cid").unwrap_or(-1),
                    r.text("name").map(str::to_string),
                    r.flag("desc"),
                )
            })
            .collect();
        keys.sort_by_key(|k| k.0);

        let mut columns = Vec::with_capacity(keys.len());
        for (position, (_, cid, name, desc)) in keys.into_iter().enumerate() {
            let column = match (cid, name) {
                (cid, Some(name)) if cid >= 0 => IndexColumn::column(name),
                _ => {
                    let Some(text) = written.get(position) else {
                        report.skip("index", &source.name, "expression key could not be read");
                        return Ok(());
                    };
                    let trimmed = KEY_SUFFIX.replace(text, "");
                    IndexColumn::expression(Expr::Native(strip_outer_parens(&trimmed).to_string()))
                }
            };
            columns.push(IndexColumn {
                direction: if desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                },
                ..column
            });
        }

        let unique = source
            .sql
            .trim_start()
            .get(..13)
            .is_some_and(|p| p.eq_ignore_ascii_case("CREATE UNIQUE"));
        let mut index = Index::new(source.name.clone(), columns);
        if unique {
            index = index.unique();
        }
        if let Some(filter) = WHERE_CLAUSE.captures(rest).and_then(|c| c.get(1)) {
            index = index.filter(Expr::Native(filter.as_str().to_string()));
        }
        catalog.table_mut(&reference)?.add_index(index)?;
        Ok(())
    }
}

struct ForeignKeyRow {
    seq: i64,
    table: String,
    from: String,
    to: Option<String>,
    on_update: String,
    on_delete: String,
    match_type: String,
}

impl TableSource {
    /// The clause of `kind` over exactly `columns`.
    fn find(&self, kind: ClauseKind, columns: &[String]) -> Option<&Clause> {
        self.clauses
            .iter()
            .find(|c| c.kind == kind && c.columns == columns)
    }
}

/// Every PRIMARY KEY, UNIQUE, FOREIGN KEY and CHECK clause of a
/// `CREATE TABLE` statement, with its name when one was given.
fn parse_clauses(sql: &str) -> Vec<Clause> {
    let Some(open) = sql.find('(') else {
        return Vec::new();
    };
    let Some(body) = balanced_group(sql, open) else {
        return Vec::new();
    };

    let mut clauses = Vec::new();
    for item in split_top_level(body) {
        let table_level = TABLE_LEVEL.is_match(&item);
        let owner = if table_level {
            None
        } else {
            LEADING_IDENT
                .find(&item)
                .map(|m| unquote_identifier(m.as_str()))
        };

        for caps in CLAUSE.captures_iter(&item) {
            let Some(whole) = caps.get(0) else { continue };
            let kind = match caps[2].to_ascii_uppercase().split_whitespace().next() {
                Some("PRIMARY") => ClauseKind::PrimaryKey,
                Some("UNIQUE") => ClauseKind::Unique,
                Some("FOREIGN") => ClauseKind::ForeignKey,
                _ => ClauseKind::Check,
            };
            let after = &item[whole.end()..];
            let rest_start = whole.end() + (after.len() - after.trim_start().len());
            let group = if item[rest_start..].starts_with('(') {
                balanced_group(&item, rest_start)
            } else {
                None
            };

            let columns = match (kind, group, &owner) {
                (ClauseKind::Check, _, _) => Vec::new(),
                (_, Some(list), _) => split_top_level(list)
                    .iter()
                    .filter_map(|c| LEADING_IDENT.find(c).map(|m| unquote_identifier(m.as_str())))
                    .collect(),
                (_, None, Some(column)) => vec![column.clone()],
                (_, None, None) => Vec::new(),
            };

            let upper = item.to_ascii_uppercase();
            let deferrability = if kind != ClauseKind::ForeignKey
                || upper.contains("NOT DEFERRABLE")
                || !upper.contains("DEFERRABLE")
            {
                Deferrability::NotDeferrable
            } else if upper.contains("INITIALLY DEFERRED") {
                Deferrability::InitiallyDeferred
            } else {
                Deferrability::InitiallyImmediate
            };

            clauses.push(Clause {
                name: caps.get(1).map(|m| unquote_identifier(m.as_str())),
                kind,
                columns,
                body: if kind == ClauseKind::Check {
                    group.map(str::to_string)
                } else {
                    None
                },
                deferrability,
            });
        }
    }
    clauses
}
