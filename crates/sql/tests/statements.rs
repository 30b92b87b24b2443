mod common;

use common::*;
use emberlink_common::{ColumnConfig, ColumnOptions, ForeignTableConfig, ServerOptions, TableOptions};
use emberlink_sql::{
    build_delete, build_insert, build_select, build_update, classify, ColumnSelection,
    PushdownContext, RelationDescriptor, RelationSource, RetrievedAttr, SqlGenError,
};

#[test]
fn test_select_with_pushed_conditions() {
    let rel = employee();
    let ctx = PushdownContext::new(&rel, 30000);
    let partition = classify(vec![scenario_a(), udf("my_func", vec![col(COL1)])], &ctx);

    let selection = ColumnSelection::new()
        .with_columns([COL1, LAST_NAME])
        .with_row_identity();
    let stmt = build_select(&ctx, &selection, &partition.remote).unwrap();

    assert_eq!(
        stmt.text(),
        "SELECT col1, \"LastName\", rdb$db_key FROM employee \
         WHERE (((col1 = 5) AND (col2 IN (1, 2, 3))))"
    );
    assert_eq!(
        stmt.retrieved(),
        &[
            RetrievedAttr::Column(COL1),
            RetrievedAttr::Column(LAST_NAME),
            RetrievedAttr::RowIdentity
        ]
    );
    assert!(stmt.retrieves_row_identity());
}

#[test]
fn test_select_implicit_boolean_targets() {
    let rel = employee();
    let selection = ColumnSelection::new().with_columns([ACTIVE, IS_MANAGER]);

    let old = PushdownContext::new(&rel, 20500).with_implicit_bool(true);
    let stmt = build_select(&old, &selection, &[]).unwrap();
    assert_eq!(
        stmt.text(),
        "SELECT CASE WHEN active <> 0 THEN 1 ELSE active END AS active, is_manager FROM employee"
    );

    let new = PushdownContext::new(&rel, 30000).with_implicit_bool(true);
    let stmt = build_select(&new, &selection, &[]).unwrap();
    assert_eq!(stmt.text(), "SELECT active <> 0, is_manager FROM employee");

    let off = PushdownContext::new(&rel, 30000);
    let stmt = build_select(&off, &selection, &[]).unwrap();
    assert_eq!(stmt.text(), "SELECT active, is_manager FROM employee");
}

#[test]
fn test_insert_with_returning() {
    let rel = employee();
    let ctx = PushdownContext::new(&rel, 20500).with_implicit_bool(true);
    let stmt = build_insert(
        &ctx,
        &[COL1, LAST_NAME, ACTIVE],
        &ColumnSelection::new().with_columns([COL1, ACTIVE]),
    )
    .unwrap();

    assert_eq!(
        stmt.text(),
        "INSERT INTO employee (col1, \"LastName\", active)\n VALUES (?, ?, ?) RETURNING col1, active"
    );
    assert_eq!(
        stmt.retrieved(),
        &[RetrievedAttr::Column(COL1), RetrievedAttr::Column(ACTIVE)]
    );
}

#[test]
fn test_update_and_delete() {
    let rel = employee();
    let ctx = PushdownContext::new(&rel, 30000);

    let update = build_update(&ctx, &[COL2, SALARY], &ColumnSelection::new()).unwrap();
    assert_eq!(
        update.text(),
        "UPDATE employee SET col2 = ?, salary = ? WHERE rdb$db_key = ?"
    );
    assert!(update.retrieved().is_empty());

    let delete = build_delete(&ctx, &ColumnSelection::new().with_column(COL1)).unwrap();
    assert_eq!(
        delete.text(),
        "DELETE FROM employee WHERE rdb$db_key = ? RETURNING col1"
    );
    assert_eq!(delete.retrieved(), &[RetrievedAttr::Column(COL1)]);
}

#[test]
fn test_unknown_target_column() {
    let rel = employee();
    let ctx = PushdownContext::new(&rel, 30000);
    assert!(matches!(
        build_update(&ctx, &[99], &ColumnSelection::new()),
        Err(SqlGenError::ColumnNotFound { attnum: 99, .. })
    ));
}

#[test]
fn test_query_backed_relation() {
    let rel = employee().with_source(RelationSource::Query(
        "SELECT * FROM employee WHERE dept_no = 600".to_string(),
    ));
    let ctx = PushdownContext::new(&rel, 30000);

    let stmt = build_select(&ctx, &ColumnSelection::new().with_column(COL1), &[]).unwrap();
    assert_eq!(
        stmt.text(),
        "SELECT col1 FROM ( SELECT * FROM employee WHERE dept_no = 600 )"
    );

    assert!(matches!(
        build_delete(&ctx, &ColumnSelection::new()),
        Err(SqlGenError::NotUpdatable(_))
    ));
    assert!(matches!(
        build_select(&ctx, &ColumnSelection::new().with_row_identity(), &[]),
        Err(SqlGenError::NotUpdatable(_))
    ));
}

#[test]
fn test_read_only_relation() {
    let rel = employee().with_updatable(false);
    let ctx = PushdownContext::new(&rel, 30000);
    assert!(matches!(
        build_insert(&ctx, &[COL1], &ColumnSelection::new()),
        Err(SqlGenError::NotUpdatable(name)) if name == "employee"
    ));
}

fn column(name: &str, data_type: &str, options: ColumnOptions) -> ColumnConfig {
    ColumnConfig {
        name: name.to_string(),
        data_type: data_type.to_string(),
        options,
    }
}

#[test]
fn test_relation_from_config() {
    let mut server = ServerOptions::new("/srv/employee.fdb");
    server.quote_identifiers = true;

    let table = ForeignTableConfig {
        name: "emp".to_string(),
        server: "fb".to_string(),
        options: TableOptions {
            table_name: Some("EMPLOYEE".to_string()),
            quote_identifier: Some(false),
            ..Default::default()
        },
        columns: vec![
            column("emp_no", "smallint", ColumnOptions::default()),
            column(
                "full_name",
                "varchar",
                ColumnOptions {
                    column_name: Some("FULL_NAME".to_string()),
                    quote_identifier: Some(true),
                    ..Default::default()
                },
            ),
        ],
    };

    let rel = RelationDescriptor::from_config(10, &server, &table).unwrap();
    let ctx = PushdownContext::for_server(&rel, &server, 30000);
    let stmt = build_select(&ctx, &ColumnSelection::new().with_whole_row(), &[]).unwrap();
    assert_eq!(stmt.text(), "SELECT emp_no, \"FULL_NAME\" FROM \"EMPLOYEE\"");
}

#[test]
fn test_column_quoting_resolved_from_config() {
    let mut server = ServerOptions::new("/srv/employee.fdb");
    server.quote_identifiers = true;

    let table = ForeignTableConfig {
        name: "emp".to_string(),
        server: "fb".to_string(),
        options: TableOptions::default(),
        columns: vec![
            column("emp_no", "smallint", ColumnOptions::default()),
            column(
                "dept_no",
                "smallint",
                ColumnOptions {
                    quote_identifier: Some(false),
                    ..Default::default()
                },
            ),
        ],
    };

    let rel = RelationDescriptor::from_config(11, &server, &table).unwrap();
    let quoting: Vec<_> = rel.columns().iter().map(|c| c.quote_identifier).collect();
    assert_eq!(quoting, vec![Some(true), Some(false)]);

    let ctx = PushdownContext::for_server(&rel, &server, 30000);
    let stmt = build_select(&ctx, &ColumnSelection::new().with_whole_row(), &[]).unwrap();
    assert_eq!(stmt.text(), "SELECT \"emp_no\", dept_no FROM \"emp\"");
}
