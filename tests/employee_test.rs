//! End-to-end scenario on an in-memory SQLite database: build the model,
//! create it, load rows through compiled inserts, then check a compiled
//! query against the hand-written SQL it replaces.

use chrono::NaiveDate;

use lattice::compare::apply;
use lattice::extract::{Connection, SqliteConnection};
use lattice::mapping::{mapper_for, MappingOptions, Value};
use lattice::model::{Catalog, Column, Constraint, TableRef};
use lattice::sql::{
    col, param_value, CompiledStatement, Compiler, ExprExt, Insert, Length, Select, Statement,
    ValueType,
};
use lattice::verify::check_equivalence;
use lattice::Dialect;

const NATIVE: &str = "SELECT \"EmployeeId\",\"FirstName\",\"LastName\",\"BirthDate\" \
                      FROM \"Employee\" WHERE \"FirstName\" = 'Robert' ORDER BY \"LastName\"";

fn employee() -> TableRef {
    TableRef::new("main", "Employee")
}

fn model() -> Catalog {
    let mut catalog = Catalog::new("northwind", "main");
    let emp = catalog.create_table("main", "Employee").unwrap();
    let mut t = catalog.table_mut(&emp).unwrap();
    t.add_column(
        Column::new("EmployeeId", ValueType::Int64)
            .not_null()
            .identity(1, 1),
    )
    .unwrap();
    t.add_column(Column::new("FirstName", ValueType::VarChar(Length::Fixed(10))).not_null())
        .unwrap();
    t.add_column(Column::new("LastName", ValueType::VarChar(Length::Fixed(20))).not_null())
        .unwrap();
    t.add_column(Column::new("BirthDate", ValueType::Date))
        .unwrap();
    t.add_constraint(Constraint::primary_key("PK_Employee", &["EmployeeId"]))
        .unwrap();
    catalog
}

fn seeded() -> SqliteConnection {
    lattice::telemetry::init_for_tests();
    let mut conn = SqliteConnection::open_in_memory().unwrap();
    let script = apply(&model(), Dialect::Sqlite).unwrap();
    conn.execute_batch(&script.to_sql(Dialect::Sqlite).unwrap())
        .unwrap();

    let compiler = Compiler::new(Dialect::Sqlite);
    let people = [
        ("Nancy", "Davolio", (1948, 12, 8)),
        ("Robert", "King", (1960, 5, 29)),
        ("Andrew", "Fuller", (1952, 2, 19)),
        ("Robert", "Brown", (1971, 1, 3)),
    ];
    for (first, last, (y, m, d)) in people {
        let birth = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let insert: Statement = Insert::into(employee())
            .value("FirstName", param_value("first", ValueType::Text, first))
            .value("LastName", param_value("last", ValueType::Text, last))
            .value("BirthDate", param_value("birth", ValueType::Date, birth))
            .into();
        let compiled = compiler.compile(&insert).unwrap();
        let args = compiler.arguments(&compiled).unwrap();
        assert_eq!(conn.execute(&compiled.sql, &args).unwrap(), 1);
    }
    conn
}

fn roberts(catalog: &mut Catalog) -> CompiledStatement {
    let query: Statement = Select::from_table(employee())
        .columns(vec![
            col("EmployeeId"),
            col("FirstName"),
            col("LastName"),
            col("BirthDate"),
        ])
        .filter(col("FirstName").eq(param_value("first", ValueType::Text, "Robert")))
        .order_by(col("LastName"), true)
        .into();
    Compiler::new(Dialect::Sqlite)
        .compile_bound(&query, catalog)
        .unwrap()
}

#[test]
fn test_compiled_query_matches_native_sql() {
    let mut conn = seeded();
    let mut catalog = model();
    let compiled = roberts(&mut catalog);
    assert_eq!(compiled.parameters.len(), 1);
    assert!(compiled.sql.contains("WHERE \"FirstName\" = ?1"), "{}", compiled.sql);

    let report = check_equivalence(&mut conn, &compiled, NATIVE).unwrap();
    assert!(report.is_equivalent(), "{:?}", report);
    assert!(report.same_values);
    assert_eq!(
        report.compiled.to_string(),
        "2 rows x 4 fields [EmployeeId, FirstName, LastName, BirthDate]"
    );
}

#[test]
fn test_rows_decode_to_host_values() {
    let mut conn = seeded();
    let mut catalog = model();
    let compiled = roberts(&mut catalog);
    let compiler = Compiler::new(Dialect::Sqlite);
    let rows = conn
        .query(&compiled.sql, &compiler.arguments(&compiled).unwrap())
        .unwrap();

    let mapper = mapper_for(Dialect::Sqlite);
    let options = MappingOptions::default();
    let decoded: Vec<(Value, Value)> = rows
        .iter()
        .map(|row| {
            (
                mapper.read(&options, &row, 2, &ValueType::Text).unwrap(),
                mapper.read(&options, &row, 3, &ValueType::Date).unwrap(),
            )
        })
        .collect();
    assert_eq!(
        decoded,
        vec![
            (
                Value::String("Brown".into()),
                Value::Date(NaiveDate::from_ymd_opt(1971, 1, 3).unwrap())
            ),
            (
                Value::String("King".into()),
                Value::Date(NaiveDate::from_ymd_opt(1960, 5, 29).unwrap())
            ),
        ]
    );
}

#[test]
fn test_different_projection_is_not_equivalent() {
    let mut conn = seeded();
    let mut catalog = model();
    let compiled = roberts(&mut catalog);
    let report = check_equivalence(
        &mut conn,
        &compiled,
        "SELECT \"EmployeeId\",\"LastName\" FROM \"Employee\" WHERE \"FirstName\" = 'Robert'",
    )
    .unwrap();
    assert!(!report.is_equivalent());
    assert_eq!(report.native.fields, 2);
}

#[test]
fn test_query_freezes_the_model() {
    let mut catalog = model();
    roberts(&mut catalog);
    assert!(catalog.is_table_frozen(&employee()));
    assert!(catalog
        .table_mut(&employee())
        .and_then(|mut t| t.add_column(Column::new("Title", ValueType::Text)))
        .is_err());
}
