//! Round-trip tests against SQLite: a model applied to an empty database
//! and extracted again must compare equal to itself, and a migration
//! script must bring a database in line with a changed model.

use lattice::compare::{apply, compare, migration_script, CompareOptions, Difference};
use lattice::extract::{Connection, Extractor, SqliteConnection, SqliteExtractor};
use lattice::model::{
    Catalog, Column, Constraint, ForeignKey, Index, IndexColumn, ReferentialAction, TableRef,
};
use lattice::sql::{col, lit_bool, lit_int, lit_str, ExprExt, Length, Select, ValueType};
use lattice::Dialect;

fn department() -> TableRef {
    TableRef::new("main", "Department")
}

fn employee() -> TableRef {
    TableRef::new("main", "Employee")
}

/// Department <- Employee with defaults, keys, a check, a partial index
/// and a view: everything SQLite can hold and report back.
fn model() -> Catalog {
    let mut catalog = Catalog::new("hr", "main");

    let dept = catalog.create_table("main", "Department").unwrap();
    {
        let mut t = catalog.table_mut(&dept).unwrap();
        t.add_column(Column::new("Id", ValueType::Int64).not_null().identity(1, 1))
            .unwrap();
        t.add_column(Column::new("Name", ValueType::VarChar(Length::Fixed(50))).not_null())
            .unwrap();
        t.add_column(
            Column::new("Active", ValueType::Boolean)
                .not_null()
                .default_value(lit_bool(true)),
        )
        .unwrap();
        t.add_constraint(Constraint::primary_key("PK_Department", &["Id"]))
            .unwrap();
        t.add_constraint(Constraint::unique("UQ_Department_Name", &["Name"]))
            .unwrap();
    }

    let emp = catalog.create_table("main", "Employee").unwrap();
    {
        let mut t = catalog.table_mut(&emp).unwrap();
        t.add_column(Column::new("Id", ValueType::Int64).not_null().identity(1, 1))
            .unwrap();
        t.add_column(Column::new("DepartmentId", ValueType::Int64))
            .unwrap();
        t.add_column(
            Column::new("Salary", ValueType::Int32)
                .not_null()
                .default_value(lit_int(0)),
        )
        .unwrap();
        t.add_column(Column::new("Email", ValueType::Text).default_value(lit_str("")))
            .unwrap();
        t.add_constraint(Constraint::primary_key("PK_Employee", &["Id"]))
            .unwrap();
        t.add_constraint(
            ForeignKey::new(
                "FK_Employee_Department",
                &["DepartmentId"],
                dept.clone(),
                &["Id"],
            )
            .on_delete(ReferentialAction::Cascade)
            .into(),
        )
        .unwrap();
        t.add_constraint(Constraint::check(
            "CK_Employee_Salary",
            col("Salary").gte(lit_int(0)),
        ))
        .unwrap();
        t.add_index(
            Index::new(
                "IX_Employee_Salary",
                vec![IndexColumn::column("Salary").desc()],
            )
            .filter(col("Salary").gt(lit_int(0))),
        )
        .unwrap();
        t.add_index(Index::on_columns("IX_Employee_Department", &["DepartmentId"]))
            .unwrap();
    }

    catalog
        .create_view(
            "main",
            "DepartmentNames",
            Select::from_table(dept).column(col("Name")),
        )
        .unwrap();
    catalog
}

fn applied(catalog: &Catalog) -> SqliteConnection {
    lattice::telemetry::init_for_tests();
    let mut conn = SqliteConnection::open_in_memory().unwrap();
    let script = apply(catalog, Dialect::Sqlite).unwrap();
    conn.execute_batch(&script.to_sql(Dialect::Sqlite).unwrap())
        .unwrap();
    conn
}

fn shown(diffs: &[Difference]) -> Vec<String> {
    diffs.iter().map(|d| d.to_string()).collect()
}

#[test]
fn test_apply_then_extract_compares_equal() {
    let mut expected = model();
    let mut conn = applied(&expected);

    let (mut actual, report) = SqliteExtractor::new()
        .extract_with_report(&mut conn)
        .unwrap();
    assert!(report.is_complete(), "{:?}", report.not_extracted);

    let diffs = compare(&mut expected, &mut actual, &CompareOptions::new(Dialect::Sqlite));
    assert!(diffs.is_empty(), "{:#?}", shown(&diffs));
}

#[test]
fn test_extracted_objects() {
    let mut conn = applied(&model());
    let catalog = SqliteExtractor::new().extract(&mut conn).unwrap();

    let emp = catalog.table(&employee()).unwrap();
    let names: Vec<_> = emp.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Id", "DepartmentId", "Salary", "Email"]);
    assert!(emp.column("Id").unwrap().identity.is_some());
    assert_eq!(emp.referenced_tables(), vec![&department()]);
    assert!(emp.index("IX_Employee_Salary").unwrap().filter.is_some());
    assert!(catalog
        .view(&TableRef::new("main", "DepartmentNames"))
        .is_some());
}

#[test]
fn test_live_differences_are_reported() {
    let mut expected = model();
    let mut conn = applied(&expected);
    conn.execute_batch(
        "DROP INDEX \"IX_Employee_Department\";
         CREATE TABLE \"Scratch\" (\"X\" INTEGER);",
    )
    .unwrap();

    let mut actual = SqliteExtractor::new().extract(&mut conn).unwrap();
    let diffs = compare(&mut expected, &mut actual, &CompareOptions::new(Dialect::Sqlite));
    assert_eq!(
        shown(&diffs),
        vec![
            "missing index main.Employee.IX_Employee_Department",
            "extra table main.Scratch",
        ]
    );
}

#[test]
fn test_views_can_be_ignored() {
    let mut expected = model();
    let mut conn = applied(&expected);
    conn.execute_batch("DROP VIEW \"DepartmentNames\";").unwrap();
    let mut actual = SqliteExtractor::new().extract(&mut conn).unwrap();

    let strict = compare(&mut expected, &mut actual, &CompareOptions::new(Dialect::Sqlite));
    assert_eq!(shown(&strict), vec!["missing view main.DepartmentNames"]);

    let lenient = CompareOptions::new(Dialect::Sqlite).ignore_views();
    assert!(compare(&mut expected, &mut actual, &lenient).is_empty());
}

#[test]
fn test_migration_brings_database_in_line() {
    let mut conn = applied(&model());

    let mut expected = model();
    expected
        .table_mut(&employee())
        .unwrap()
        .add_column(Column::new("Title", ValueType::Text))
        .unwrap();
    let project = expected.create_table("main", "Project").unwrap();
    {
        let mut t = expected.table_mut(&project).unwrap();
        t.add_column(Column::new("Id", ValueType::Int64).not_null().identity(1, 1))
            .unwrap();
        t.add_column(Column::new("DepartmentId", ValueType::Int64).not_null())
            .unwrap();
        t.add_constraint(Constraint::primary_key("PK_Project", &["Id"]))
            .unwrap();
        t.add_constraint(
            ForeignKey::new(
                "FK_Project_Department",
                &["DepartmentId"],
                department(),
                &["Id"],
            )
            .into(),
        )
        .unwrap();
    }

    let options = CompareOptions::new(Dialect::Sqlite);
    let mut actual = SqliteExtractor::new().extract(&mut conn).unwrap();
    let diffs = compare(&mut expected, &mut actual, &options);
    assert_eq!(
        shown(&diffs),
        vec!["missing column main.Employee.Title", "missing table main.Project"]
    );

    let script = migration_script(&expected, &actual, &diffs, Dialect::Sqlite).unwrap();
    conn.execute_batch(&script.to_sql(Dialect::Sqlite).unwrap())
        .unwrap();

    let mut migrated = SqliteExtractor::new().extract(&mut conn).unwrap();
    let remaining = compare(&mut expected, &mut migrated, &options);
    assert!(remaining.is_empty(), "{:#?}", shown(&remaining));
}

#[test]
fn test_migration_refuses_what_sqlite_cannot_alter() {
    let mut conn = applied(&model());
    let mut expected = model();
    expected
        .table_mut(&department())
        .unwrap()
        .add_constraint(Constraint::unique("UQ_Department_Active", &["Name", "Active"]))
        .unwrap();

    let mut actual = SqliteExtractor::new().extract(&mut conn).unwrap();
    let diffs = compare(&mut expected, &mut actual, &CompareOptions::new(Dialect::Sqlite));
    assert_eq!(diffs.len(), 1);
    assert!(diffs[0].is_missing());
    assert!(migration_script(&expected, &actual, &diffs, Dialect::Sqlite).is_err());
}
