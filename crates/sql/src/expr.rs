//! Expression tree handed over by the local planner.
//!
//! This is the single node taxonomy shared by the classifier and the
//! renderer. Adding a variant forces both `classify` and `render` to grow a
//! matching arm.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub type RelationId = u32;
pub type AttrNumber = i16;

/// Local data types the pushdown layer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Text,
    Char,
    Bpchar,
    Varchar,
    Name,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Date,
    Time,
    Timestamp,
    Bool,
    Oid,
    Bit,
    Varbit,
    Bytea,
    /// Any other local type
    Other,
}

impl DataType {
    /// Parse a local type name as written in configuration.
    pub fn from_name(name: &str) -> DataType {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => DataType::Text,
            "char" | "\"char\"" => DataType::Char,
            "bpchar" | "character" => DataType::Bpchar,
            "varchar" | "character varying" => DataType::Varchar,
            "name" => DataType::Name,
            "int2" | "smallint" => DataType::Int2,
            "int4" | "int" | "integer" => DataType::Int4,
            "int8" | "bigint" => DataType::Int8,
            "float4" | "real" => DataType::Float4,
            "float8" | "double precision" => DataType::Float8,
            "numeric" | "decimal" => DataType::Numeric,
            "date" => DataType::Date,
            "time" | "time without time zone" => DataType::Time,
            "timestamp" | "timestamp without time zone" => DataType::Timestamp,
            "bool" | "boolean" => DataType::Bool,
            "oid" => DataType::Oid,
            "bit" => DataType::Bit,
            "varbit" | "bit varying" => DataType::Varbit,
            "bytea" => DataType::Bytea,
            _ => DataType::Other,
        }
    }

    /// Whether values of this type can be written as remote literals.
    ///
    /// Booleans are excluded: they depend on the remote version and the
    /// implicit boolean setting of the column they are compared with.
    pub fn is_remote_representable(&self) -> bool {
        matches!(
            self,
            DataType::Text
                | DataType::Char
                | DataType::Bpchar
                | DataType::Varchar
                | DataType::Name
                | DataType::Int2
                | DataType::Int4
                | DataType::Int8
                | DataType::Float4
                | DataType::Float8
                | DataType::Numeric
                | DataType::Date
                | DataType::Time
                | DataType::Timestamp
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::Int2 | DataType::Int4 | DataType::Int8)
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::Text | DataType::Char | DataType::Bpchar | DataType::Varchar | DataType::Name
        )
    }
}

/// A typed, non-NULL literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Int(i64),
    Float(f64),
    /// Canonical decimal text
    Numeric(String),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Bool(bool),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub data_type: DataType,
    /// `None` is SQL NULL
    pub value: Option<Datum>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    pub relation: RelationId,
    pub attnum: AttrNumber,
    /// Non-zero for references to an outer query
    pub levels_up: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorRef {
    pub name: String,
    /// Part of the local engine's built-in catalog
    pub builtin: bool,
}

impl OperatorRef {
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            builtin: true,
        }
    }

    pub fn user_defined(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            builtin: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolTestKind {
    IsTrue,
    IsNotTrue,
    IsFalse,
    IsNotFalse,
    IsUnknown,
    IsNotUnknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub element_type: DataType,
    pub elements: Vec<Option<Datum>>,
}

/// Right-hand side of a quantified comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayOperand {
    Literal(ArrayLiteral),
    /// Computed set, e.g. a subquery or an array-valued expression
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub builtin: bool,
    pub args: Vec<Expr>,
    pub result_type: DataType,
    /// Coercion inserted by the local planner rather than written by the user
    pub implicit_cast: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Literal),
    UnaryOp {
        op: OperatorRef,
        operand: Box<Expr>,
    },
    BinaryOp {
        op: OperatorRef,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Bool {
        op: BoolOp,
        args: Vec<Expr>,
    },
    NullTest {
        arg: Box<Expr>,
        negated: bool,
    },
    BooleanTest {
        arg: Box<Expr>,
        test: BoolTestKind,
    },
    /// `left op ANY(array)` when `use_or`, `left op ALL(array)` otherwise
    ScalarArrayOp {
        op: OperatorRef,
        use_or: bool,
        left: Box<Expr>,
        right: ArrayOperand,
    },
    Function(FunctionCall),
    Relabel {
        arg: Box<Expr>,
        result_type: DataType,
        implicit: bool,
    },
    /// Externally supplied parameter value
    Param { id: u32, data_type: DataType },
    SubQuery { sql: String },
}

impl Expr {
    pub fn column(relation: RelationId, attnum: AttrNumber) -> Expr {
        Expr::Column(ColumnRef {
            relation,
            attnum,
            levels_up: 0,
        })
    }

    pub fn literal(data_type: DataType, value: Datum) -> Expr {
        Expr::Literal(Literal {
            data_type,
            value: Some(value),
        })
    }

    pub fn null(data_type: DataType) -> Expr {
        Expr::Literal(Literal {
            data_type,
            value: None,
        })
    }

    pub fn int4(v: i32) -> Expr {
        Expr::literal(DataType::Int4, Datum::Int(v.into()))
    }

    pub fn text(v: impl Into<String>) -> Expr {
        Expr::literal(DataType::Text, Datum::Text(v.into()))
    }

    pub fn boolean(v: bool) -> Expr {
        Expr::literal(DataType::Bool, Datum::Bool(v))
    }

    pub fn binary(op: &str, left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp {
            op: OperatorRef::builtin(op),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: &str, operand: Expr) -> Expr {
        Expr::UnaryOp {
            op: OperatorRef::builtin(op),
            operand: Box::new(operand),
        }
    }

    pub fn and(args: Vec<Expr>) -> Expr {
        Expr::Bool {
            op: BoolOp::And,
            args,
        }
    }

    pub fn or(args: Vec<Expr>) -> Expr {
        Expr::Bool {
            op: BoolOp::Or,
            args,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(arg: Expr) -> Expr {
        Expr::Bool {
            op: BoolOp::Not,
            args: vec![arg],
        }
    }

    pub fn is_null(arg: Expr) -> Expr {
        Expr::NullTest {
            arg: Box::new(arg),
            negated: false,
        }
    }

    pub fn is_not_null(arg: Expr) -> Expr {
        Expr::NullTest {
            arg: Box::new(arg),
            negated: true,
        }
    }

    pub fn bool_test(arg: Expr, test: BoolTestKind) -> Expr {
        Expr::BooleanTest {
            arg: Box::new(arg),
            test,
        }
    }

    /// `left IN (elements)`, or `left NOT IN (elements)` when `negated`
    pub fn in_list(
        left: Expr,
        element_type: DataType,
        elements: Vec<Option<Datum>>,
        negated: bool,
    ) -> Expr {
        Expr::ScalarArrayOp {
            op: OperatorRef::builtin(if negated { "<>" } else { "=" }),
            use_or: !negated,
            left: Box::new(left),
            right: ArrayOperand::Literal(ArrayLiteral {
                element_type,
                elements,
            }),
        }
    }

    pub fn call(name: &str, args: Vec<Expr>, result_type: DataType) -> Expr {
        Expr::Function(FunctionCall {
            name: name.to_string(),
            builtin: true,
            args,
            result_type,
            implicit_cast: false,
        })
    }

    pub fn implicit_relabel(arg: Expr, result_type: DataType) -> Expr {
        Expr::Relabel {
            arg: Box::new(arg),
            result_type,
            implicit: true,
        }
    }

    /// Calls `f` on every column reference in the tree.
    pub fn visit_columns<F: FnMut(&ColumnRef)>(&self, f: &mut F) {
        match self {
            Expr::Column(c) => f(c),
            Expr::Literal(_) | Expr::Param { .. } | Expr::SubQuery { .. } => {}
            Expr::UnaryOp { operand, .. } => operand.visit_columns(f),
            Expr::BinaryOp { left, right, .. } => {
                left.visit_columns(f);
                right.visit_columns(f);
            }
            Expr::Bool { args, .. } => args.iter().for_each(|a| a.visit_columns(f)),
            Expr::Function(call) => call.args.iter().for_each(|a| a.visit_columns(f)),
            Expr::NullTest { arg, .. }
            | Expr::BooleanTest { arg, .. }
            | Expr::Relabel { arg, .. } => arg.visit_columns(f),
            Expr::ScalarArrayOp { left, right, .. } => {
                left.visit_columns(f);
                if let ArrayOperand::Expr(e) = right {
                    e.visit_columns(f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(DataType::from_name("INTEGER"), DataType::Int4);
        assert_eq!(DataType::from_name("character varying"), DataType::Varchar);
        assert_eq!(DataType::from_name("boolean"), DataType::Bool);
        assert_eq!(DataType::from_name("jsonb"), DataType::Other);
    }

    #[test]
    fn test_representable_types() {
        assert!(DataType::Numeric.is_remote_representable());
        assert!(DataType::Timestamp.is_remote_representable());
        assert!(!DataType::Bool.is_remote_representable());
        assert!(!DataType::Oid.is_remote_representable());
        assert!(!DataType::Bytea.is_remote_representable());
    }

    #[test]
    fn test_visit_columns() {
        let e = Expr::and(vec![
            Expr::binary("=", Expr::column(1, 2), Expr::int4(1)),
            Expr::is_null(Expr::column(1, 4)),
        ]);
        let mut seen = Vec::new();
        e.visit_columns(&mut |c| seen.push(c.attnum));
        assert_eq!(seen, vec![2, 4]);
    }
}
