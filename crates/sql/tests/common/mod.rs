#![allow(dead_code)]

use emberlink_sql::expr::{FunctionCall, RelationId};
use emberlink_sql::{ColumnDescriptor, DataType, Datum, Expr, RelationDescriptor};

pub const EMPLOYEE: RelationId = 1;
pub const OTHER: RelationId = 2;

pub const COL1: i16 = 1;
pub const COL2: i16 = 2;
pub const LAST_NAME: i16 = 3;
pub const HIRE_DATE: i16 = 4;
pub const SALARY: i16 = 5;
pub const ACTIVE: i16 = 6;
pub const IS_MANAGER: i16 = 7;

/// `employee` with one column of each shape the compiler cares about.
///
/// `active` carries the column-level implicit boolean option, `is_manager`
/// does not, and `last_name` maps to a mixed-case remote name.
pub fn employee() -> RelationDescriptor {
    RelationDescriptor::new(EMPLOYEE, "employee")
        .with_column(ColumnDescriptor::new(COL1, "col1", DataType::Int4))
        .with_column(ColumnDescriptor::new(COL2, "col2", DataType::Int4))
        .with_column(
            ColumnDescriptor::new(LAST_NAME, "last_name", DataType::Varchar)
                .with_remote_name("LastName"),
        )
        .with_column(ColumnDescriptor::new(HIRE_DATE, "hire_date", DataType::Date))
        .with_column(ColumnDescriptor::new(SALARY, "salary", DataType::Numeric))
        .with_column(ColumnDescriptor::new(ACTIVE, "active", DataType::Bool).with_implicit_bool())
        .with_column(ColumnDescriptor::new(IS_MANAGER, "is_manager", DataType::Bool))
}

pub fn col(attnum: i16) -> Expr {
    Expr::column(EMPLOYEE, attnum)
}

pub fn ints(values: &[i64]) -> Vec<Option<Datum>> {
    values.iter().map(|v| Some(Datum::Int(*v))).collect()
}

pub fn udf(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function(FunctionCall {
        name: name.to_string(),
        builtin: false,
        args,
        result_type: DataType::Int4,
        implicit_cast: false,
    })
}

/// `(col1 = 5) AND (col2 IN (1, 2, 3))`
pub fn scenario_a() -> Expr {
    Expr::and(vec![
        Expr::binary("=", col(COL1), Expr::int4(5)),
        Expr::in_list(col(COL2), DataType::Int4, ints(&[1, 2, 3]), false),
    ])
}
