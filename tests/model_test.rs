//! Integration tests for catalog construction: freezing, referential
//! integrity, name uniqueness and index keys.

use lattice::model::{
    BoundarySide, Catalog, Column, Constraint, ForeignKey, Index, IndexColumn, PartitionDescriptor,
    PartitionFunction, PartitionMethod, PartitionSchema, SequenceDescriptor, SequenceRef,
    SortDirection, TableRef,
};
use lattice::sql::{col, lit_int, ExprExt, Literal, Select, ValueType};
use lattice::Error;

/// `hr` catalog: Department <- Employee, with a named sequence.
fn hr() -> Catalog {
    let mut catalog = Catalog::new("hr", "main");
    let seq = catalog
        .create_sequence("main", "EmployeeNo", SequenceDescriptor::new(1000, 1))
        .unwrap();

    let dept = catalog.create_table("main", "Department").unwrap();
    {
        let mut t = catalog.table_mut(&dept).unwrap();
        t.add_column(Column::new("Id", ValueType::Int32).not_null())
            .unwrap();
        t.add_column(Column::new("Name", ValueType::Text).not_null())
            .unwrap();
        t.add_constraint(Constraint::primary_key("PK_Department", &["Id"]))
            .unwrap();
    }

    let emp = catalog.create_table("main", "Employee").unwrap();
    {
        let mut t = catalog.table_mut(&emp).unwrap();
        t.add_column(
            Column::new("Id", ValueType::Int64)
                .not_null()
                .sequence(seq),
        )
        .unwrap();
        t.add_column(Column::new("DepartmentId", ValueType::Int32))
            .unwrap();
        t.add_column(Column::new("Salary", ValueType::Int32).default_value(lit_int(0)))
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
            .into(),
        )
        .unwrap();
        t.add_index(Index::new(
            "IX_Employee_Salary",
            vec![IndexColumn::column("Salary").desc()],
        ))
        .unwrap();
    }
    catalog
}

fn employee() -> TableRef {
    TableRef::new("main", "Employee")
}

fn department() -> TableRef {
    TableRef::new("main", "Department")
}

// ============================================================================
// Freezing
// ============================================================================

#[test]
fn test_frozen_table_rejects_mutation() {
    let mut catalog = hr();
    catalog.freeze_table(&employee()).unwrap();

    let err = catalog
        .table_mut(&employee())
        .and_then(|mut t| t.add_column(Column::new("Bonus", ValueType::Int32)))
        .unwrap_err();
    assert!(matches!(err, Error::ModelLocked { .. }));
    assert!(catalog.table(&employee()).unwrap().column("Bonus").is_none());

    // siblings stay editable
    catalog
        .table_mut(&department())
        .and_then(|mut t| t.add_column(Column::new("Code", ValueType::Text)))
        .unwrap();
}

#[test]
fn test_frozen_schema_locks_its_tables() {
    let mut catalog = hr();
    catalog.freeze_schema("main").unwrap();
    assert!(catalog.is_table_frozen(&department()));
    assert!(matches!(
        catalog.create_table("main", "Project"),
        Err(Error::ModelLocked { .. })
    ));
    // another schema is unaffected
    catalog.create_schema("audit").unwrap();
    catalog.create_table("audit", "Log").unwrap();
}

#[test]
fn test_schema_holding_frozen_table_cannot_be_removed() {
    let mut catalog = hr();
    catalog.create_schema("audit").unwrap();
    let log = catalog.create_table("audit", "Log").unwrap();
    catalog.freeze_table(&log).unwrap();

    assert!(matches!(
        catalog.remove_schema("audit"),
        Err(Error::ModelLocked { .. })
    ));
    assert!(catalog.table(&log).is_some());

    catalog.create_schema("scratch").unwrap();
    catalog.create_table("scratch", "Tmp").unwrap();
    catalog.remove_schema("scratch").unwrap();
}

#[test]
fn test_catalog_freeze_is_final() {
    let mut catalog = hr();
    catalog.freeze();
    assert!(catalog.is_frozen());
    assert!(catalog.is_table_frozen(&employee()));
    assert!(matches!(
        catalog.create_schema("sales"),
        Err(Error::ModelLocked { .. })
    ));
    // freezing again changes nothing
    catalog.freeze();
    assert!(catalog.is_frozen());
}

// ============================================================================
// Referential integrity
// ============================================================================

#[test]
fn test_referenced_table_cannot_be_removed() {
    let mut catalog = hr();
    let err = catalog.remove_table(&department()).unwrap_err();
    assert!(matches!(err, Error::ReferentialIntegrityViolation { .. }));
    assert!(catalog.table(&department()).is_some());

    catalog
        .table_mut(&employee())
        .unwrap()
        .remove_constraint("FK_Employee_Department")
        .unwrap();
    catalog.remove_table(&department()).unwrap();
}

#[test]
fn test_foreign_key_targets_must_exist() {
    let mut catalog = hr();
    let mut t = catalog.table_mut(&employee()).unwrap();

    let missing_table = ForeignKey::new(
        "FK_Employee_Project",
        &["DepartmentId"],
        TableRef::new("main", "Project"),
        &["Id"],
    );
    assert!(matches!(
        t.add_constraint(missing_table.into()),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));

    let missing_column = ForeignKey::new(
        "FK_Employee_Department_Code",
        &["DepartmentId"],
        department(),
        &["Code"],
    );
    assert!(matches!(
        t.add_constraint(missing_column.into()),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));
}

#[test]
fn test_columns_in_use_cannot_be_removed() {
    let mut catalog = hr();
    let mut t = catalog.table_mut(&employee()).unwrap();
    // index key
    assert!(matches!(
        t.remove_column("Salary"),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));
    // foreign key column
    assert!(matches!(
        t.remove_column("DepartmentId"),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));
    t.remove_index("IX_Employee_Salary").unwrap();
    t.remove_column("Salary").unwrap();
}

#[test]
fn test_columns_used_by_expressions_cannot_be_removed() {
    let mut catalog = hr();
    let mut t = catalog.table_mut(&employee()).unwrap();
    t.add_column(Column::new("Bonus", ValueType::Int32)).unwrap();
    t.add_column(Column::new("Grade", ValueType::Int32)).unwrap();
    t.add_constraint(Constraint::check("CK_Employee_Bonus", col("Bonus").gt(lit_int(0))))
        .unwrap();
    t.add_index(Index::new(
        "IX_Employee_Grade",
        vec![IndexColumn::expression(col("Grade").add(lit_int(1)))],
    ))
    .unwrap();
    t.add_index(
        Index::on_columns("IX_Employee_Dept_Paid", &["DepartmentId"])
            .filter(col("Salary").gt(lit_int(0))),
    )
    .unwrap();

    for (column, holder) in [
        ("Bonus", "CK_Employee_Bonus"),
        ("Grade", "IX_Employee_Grade"),
        ("Salary", "IX_Employee_Dept_Paid"),
    ] {
        let err = t.remove_column(column).unwrap_err();
        assert!(
            matches!(err, Error::ReferentialIntegrityViolation { .. }),
            "{}",
            column
        );
        assert!(err.to_string().contains(holder), "{}", err);
    }

    t.remove_constraint("CK_Employee_Bonus").unwrap();
    t.remove_column("Bonus").unwrap();
    t.remove_index("IX_Employee_Grade").unwrap();
    t.remove_column("Grade").unwrap();
}

#[test]
fn test_expressions_must_name_existing_columns() {
    let mut catalog = hr();
    let before = catalog.clone();
    let mut t = catalog.table_mut(&employee()).unwrap();
    assert!(matches!(
        t.add_constraint(Constraint::check("CK_Ghost", col("Nope").gt(lit_int(0)))),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));
    assert!(matches!(
        t.add_index(Index::new(
            "IX_Ghost",
            vec![IndexColumn::expression(col("Nope").add(lit_int(1)))],
        )),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));
    assert!(matches!(
        t.add_index(Index::on_columns("IX_Ghost_Filter", &["Salary"]).filter(col("Nope").gt(lit_int(0)))),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));
    assert_eq!(catalog, before);
}

#[test]
fn test_sequence_in_use_cannot_be_removed() {
    let mut catalog = hr();
    let seq = SequenceRef::new("main", "EmployeeNo");
    assert!(matches!(
        catalog.remove_sequence(&seq),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));
}

#[test]
fn test_partitioning_needs_existing_schema() {
    let mut catalog = hr();
    let by_salary = PartitionDescriptor::new(
        "Salary",
        PartitionMethod::Range {
            schema: "PS_Salary".into(),
        },
    );
    assert!(catalog
        .table_mut(&employee())
        .unwrap()
        .set_partitioning(by_salary.clone())
        .is_err());

    catalog
        .create_partition_function(PartitionFunction::new(
            "PF_Salary",
            ValueType::Int32,
            vec![Literal::Int(1_000), Literal::Int(10_000)],
            BoundarySide::Right,
        ))
        .unwrap();
    catalog
        .create_partition_schema(PartitionSchema::new(
            "PS_Salary",
            "PF_Salary",
            &["fg1", "fg2", "fg3"],
        ))
        .unwrap();
    catalog
        .table_mut(&employee())
        .unwrap()
        .set_partitioning(by_salary)
        .unwrap();

    assert!(matches!(
        catalog.remove_partition_schema("PS_Salary"),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));
    assert!(matches!(
        catalog.remove_partition_function("PF_Salary"),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));
}

// ============================================================================
// Names
// ============================================================================

#[test]
fn test_tables_and_views_share_a_namespace() {
    let mut catalog = hr();
    let names = Select::from_table(department()).column(col("Name"));
    assert!(matches!(
        catalog.create_view("main", "Employee", names.clone()),
        Err(Error::DuplicateName { .. })
    ));
    catalog.create_view("main", "DepartmentNames", names).unwrap();
    assert!(matches!(
        catalog.create_table("main", "DepartmentNames"),
        Err(Error::DuplicateName { .. })
    ));
}

#[test]
fn test_duplicate_members() {
    let mut catalog = hr();
    let mut t = catalog.table_mut(&department()).unwrap();
    assert!(matches!(
        t.add_column(Column::new("Name", ValueType::Text)),
        Err(Error::DuplicateName { .. })
    ));
    assert!(matches!(
        t.add_constraint(Constraint::primary_key("PK_Other", &["Name"])),
        Err(Error::DuplicateConstraint { .. })
    ));
    // index names are unique across the schema, not just the table
    assert!(matches!(
        t.add_index(Index::on_columns("IX_Employee_Salary", &["Name"])),
        Err(Error::DuplicateName { .. })
    ));
}

#[test]
fn test_failed_mutation_changes_nothing() {
    let mut catalog = hr();
    let before = catalog.clone();
    let mut t = catalog.table_mut(&department()).unwrap();
    assert!(t
        .add_constraint(Constraint::unique("UQ_Missing", &["Budget"]))
        .is_err());
    assert!(t.remove_column("Id").is_err());
    assert!(t.set_default("Budget", lit_int(0)).is_err());
    assert_eq!(catalog, before);
}

// ============================================================================
// Indexes
// ============================================================================

#[test]
fn test_index_column_is_column_or_expression() {
    assert!(matches!(
        IndexColumn::try_new(Some("Salary"), Some(col("Salary")), SortDirection::Ascending),
        Err(Error::InvalidIndexColumn)
    ));
    assert!(matches!(
        IndexColumn::try_new(None, None, SortDirection::Ascending),
        Err(Error::InvalidIndexColumn)
    ));
    let key = IndexColumn::try_new(None, Some(col("Salary")), SortDirection::Descending).unwrap();
    assert_eq!(key.column_name(), None);
    assert_eq!(key.direction, SortDirection::Descending);
}

#[test]
fn test_index_keys_must_exist() {
    let mut catalog = hr();
    let mut t = catalog.table_mut(&employee()).unwrap();
    assert!(matches!(
        t.add_index(Index::on_columns("IX_Employee_Bonus", &["Bonus"])),
        Err(Error::ReferentialIntegrityViolation { .. })
    ));
    assert!(matches!(
        t.add_index(Index::new("IX_Empty", vec![])),
        Err(Error::InvalidModel(_))
    ));
    t.add_index(Index::on_columns("IX_Employee_Department", &["DepartmentId"]))
        .unwrap();
    assert_eq!(
        catalog.table(&employee()).unwrap().index("IX_Employee_Department").unwrap().table(),
        Some(&employee())
    );
}

#[test]
fn test_sequence_bounds_validated() {
    let mut catalog = Catalog::new("c", "main");
    assert!(matches!(
        catalog.create_sequence("main", "S", SequenceDescriptor::new(1, 0)),
        Err(Error::InvalidModel(_))
    ));
    assert!(matches!(
        catalog.create_sequence("main", "S", SequenceDescriptor::new(5, 1).max(3)),
        Err(Error::InvalidModel(_))
    ));
    catalog
        .create_sequence("main", "S", SequenceDescriptor::new(5, -1).min(0).cyclic())
        .unwrap();
}
