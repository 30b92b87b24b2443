//! Expression Classifier
//!
//! Decides whether an expression tree can be evaluated by the remote engine.
//! The walk is a closed allow-list: every `Expr` variant has an arm here and a
//! matching arm in `render`, and anything not explicitly accepted stays local.

use crate::capability::{Arity, FunctionEntry, OperatorEntry, MAX_IN_LIST_ELEMENTS};
use crate::error::SqlGenError;
use crate::expr::{
    ArrayOperand, BoolOp, ColumnRef, DataType, Datum, Expr, FunctionCall, Literal, OperatorRef,
};
use crate::relation::{ColumnDescriptor, PushdownContext};
use crate::render::literal_text;

/// Position of a sub-expression relative to its parent.
///
/// Implicit boolean columns are stored as integers remotely, so the text a
/// boolean column produces depends on where it appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Standalone condition: WHERE clause or boolean connective argument
    Predicate,
    /// Argument to an operator, function or IN list
    Operand,
    /// Argument to IS [NOT] NULL or a three-valued boolean test
    TestArgument,
}

/// Split of a condition list into what the remote engine evaluates and what
/// stays local.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub remote: Vec<Expr>,
    pub local: Vec<Expr>,
}

/// Partition top-level (implicitly AND-ed) conditions.
pub fn classify(conditions: Vec<Expr>, ctx: &PushdownContext<'_>) -> Partition {
    if ctx.disable_pushdowns {
        tracing::debug!(
            target: "pushdown",
            relation = %ctx.relation.local_name,
            conditions = conditions.len(),
            "Pushdowns disabled for server; evaluating all conditions locally"
        );
        return Partition {
            remote: Vec::new(),
            local: conditions,
        };
    }

    let (remote, local): (Vec<_>, Vec<_>) = conditions
        .into_iter()
        .partition(|cond| is_delegable(cond, ctx));

    tracing::debug!(
        target: "pushdown",
        relation = %ctx.relation.local_name,
        remote = remote.len(),
        local = local.len(),
        "Classified conditions"
    );

    Partition { remote, local }
}

/// Whether `expr` can be rendered for and evaluated by the remote engine.
pub fn is_delegable(expr: &Expr, ctx: &PushdownContext<'_>) -> bool {
    match check(expr, Slot::Predicate, ctx) {
        Ok(()) => true,
        Err(reason) => {
            tracing::debug!(
                target: "pushdown",
                relation = %ctx.relation.local_name,
                remote_version = ctx.remote_version,
                %reason,
                "Expression not delegable"
            );
            false
        }
    }
}

fn check(expr: &Expr, slot: Slot, ctx: &PushdownContext<'_>) -> Result<(), String> {
    match expr {
        Expr::Column(column) => check_column(column, slot, ctx),

        Expr::Literal(literal) => literal_text(literal, ctx)
            .map(|_| ())
            .map_err(|e| e.to_string()),

        Expr::UnaryOp { op, operand } => {
            operator_entry(op, Arity::Unary, ctx).map_err(|e| e.to_string())?;
            check(operand, Slot::Operand, ctx)
        }

        Expr::BinaryOp { op, left, right } => {
            if implicit_bool_comparison(op, left, right, ctx).is_some() {
                return Ok(());
            }
            operator_entry(op, Arity::Binary, ctx).map_err(|e| e.to_string())?;
            check(left, Slot::Operand, ctx)?;
            check(right, Slot::Operand, ctx)
        }

        Expr::Bool { op, args } => {
            match (op, args.len()) {
                (_, 0) => return Err("boolean connective without arguments".to_string()),
                (BoolOp::Not, n) if n != 1 => {
                    return Err(format!("NOT with {} arguments", n));
                }
                _ => {}
            }
            args.iter().try_for_each(|arg| check(arg, Slot::Predicate, ctx))
        }

        Expr::NullTest { arg, .. } => check(arg, Slot::TestArgument, ctx),

        Expr::BooleanTest { arg, .. } => match boolean_test_mode(arg, ctx) {
            Ok(BooleanTestMode::Implicit) => Ok(()),
            Ok(BooleanTestMode::Native) => check(arg, Slot::TestArgument, ctx),
            Err(e) => Err(e.to_string()),
        },

        Expr::ScalarArrayOp {
            op,
            use_or,
            left,
            right,
        } => {
            if !op.builtin {
                return Err(format!("user-defined operator '{}' in IN list", op.name));
            }
            if !is_membership_shape(op, *use_or) {
                return Err(format!(
                    "quantified comparison '{} {}' is not IN / NOT IN",
                    op.name,
                    if *use_or { "ANY" } else { "ALL" }
                ));
            }
            let ArrayOperand::Literal(array) = right else {
                return Err("IN list over a computed set".to_string());
            };
            if !array.element_type.is_remote_representable() {
                return Err(format!("IN list of {:?}", array.element_type));
            }
            if array.elements.is_empty() {
                return Err(SqlGenError::EmptyInList.to_string());
            }
            if array.elements.len() > MAX_IN_LIST_ELEMENTS {
                return Err(format!(
                    "IN list has {} elements, remote limit is {}",
                    array.elements.len(),
                    MAX_IN_LIST_ELEMENTS
                ));
            }
            for element in &array.elements {
                literal_text(
                    &Literal {
                        data_type: array.element_type,
                        value: element.clone(),
                    },
                    ctx,
                )
                .map_err(|e| e.to_string())?;
            }
            check(left, Slot::Operand, ctx)
        }

        Expr::Function(call) => check_function(call, slot, ctx),

        Expr::Relabel { arg, implicit, .. } => {
            if !implicit {
                return Err("explicit cast".to_string());
            }
            check(arg, slot, ctx)
        }

        Expr::Param { .. } => Err("external parameter".to_string()),

        Expr::SubQuery { .. } => Err("subquery".to_string()),
    }
}

fn check_column(column: &ColumnRef, slot: Slot, ctx: &PushdownContext<'_>) -> Result<(), String> {
    let desc = ctx.relation.resolve(column).map_err(|e| e.to_string())?;
    if desc.data_type != DataType::Bool {
        return Ok(());
    }
    if ctx.is_implicit_bool(desc) {
        return match slot {
            Slot::Predicate | Slot::TestArgument => Ok(()),
            Slot::Operand => Err(
                SqlGenError::MixedBooleanForms(desc.local_name.clone()).to_string(),
            ),
        };
    }
    if ctx.supports_native_bool() {
        Ok(())
    } else {
        Err(SqlGenError::UnsupportedType(DataType::Bool).to_string())
    }
}

fn check_function(call: &FunctionCall, slot: Slot, ctx: &PushdownContext<'_>) -> Result<(), String> {
    if !call.result_type.is_remote_representable() {
        return Err(format!(
            "function '{}' returns {:?}",
            call.name, call.result_type
        ));
    }

    if call.implicit_cast {
        let Some((first, rest)) = call.args.split_first() else {
            return Err(format!("implicit cast '{}' without arguments", call.name));
        };
        check(first, slot, ctx)?;
        return rest.iter().try_for_each(|arg| check(arg, Slot::Operand, ctx));
    }

    function_entry(call, ctx).map_err(|e| e.to_string())?;
    call.args
        .iter()
        .try_for_each(|arg| check(arg, Slot::Operand, ctx))
}

/// Only `= ANY` (IN) and `<> ALL` (NOT IN).
pub(crate) fn is_membership_shape(op: &OperatorRef, use_or: bool) -> bool {
    (op.name == "=" && use_or) || (op.name == "<>" && !use_or)
}

/// Capability entry for an operator application.
pub(crate) fn operator_entry<'c>(
    op: &OperatorRef,
    arity: Arity,
    ctx: &PushdownContext<'c>,
) -> Result<&'c OperatorEntry, SqlGenError> {
    let missing = || SqlGenError::MissingOperator {
        name: op.name.clone(),
        version: ctx.remote_version,
    };
    if !op.builtin {
        return Err(missing());
    }
    ctx.capabilities
        .lookup_operator(&op.name, arity, ctx.remote_version)
        .ok_or_else(missing)
}

/// Capability entry for a function call, with its argument restrictions applied.
pub(crate) fn function_entry<'c>(
    call: &FunctionCall,
    ctx: &PushdownContext<'c>,
) -> Result<&'c FunctionEntry, SqlGenError> {
    let missing = || SqlGenError::MissingFunction {
        name: call.name.clone(),
        version: ctx.remote_version,
    };
    if !call.builtin {
        return Err(missing());
    }
    let entry = ctx
        .capabilities
        .lookup_function(&call.name, ctx.remote_version)
        .ok_or_else(missing)?;

    if !entry.args.accepts(call.args.len()) {
        return Err(SqlGenError::UnsupportedExpr(format!(
            "{} with {} arguments",
            entry.name,
            call.args.len()
        )));
    }
    for &idx in entry.integer_literal_args {
        if let Some(arg) = call.args.get(idx) {
            if !is_integer_literal(arg) {
                return Err(SqlGenError::UnsupportedExpr(format!(
                    "{} argument {} must be an integer literal",
                    entry.name,
                    idx + 1
                )));
            }
        }
    }
    Ok(entry)
}

fn is_integer_literal(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Literal(Literal {
            data_type,
            value: Some(Datum::Int(_)),
        }) if data_type.is_integer()
    )
}

/// `col = <bool literal>` or `col <> <bool literal>` on an implicit boolean column.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoolComparison<'e, 'r> {
    pub column: &'r ColumnDescriptor,
    pub literal: &'e Literal,
    pub column_first: bool,
}

pub(crate) fn implicit_bool_comparison<'e, 'r>(
    op: &OperatorRef,
    left: &'e Expr,
    right: &'e Expr,
    ctx: &PushdownContext<'r>,
) -> Option<BoolComparison<'e, 'r>> {
    if !op.builtin || !(op.name == "=" || op.name == "<>") {
        return None;
    }

    let (column, literal, column_first) = match (left, right) {
        (Expr::Column(c), Expr::Literal(l)) => (c, l, true),
        (Expr::Literal(l), Expr::Column(c)) => (c, l, false),
        _ => return None,
    };

    if literal.data_type != DataType::Bool
        || !matches!(literal.value, None | Some(Datum::Bool(_)))
    {
        return None;
    }

    let desc = ctx.relation.resolve(column).ok()?;
    ctx.is_implicit_bool(desc).then_some(BoolComparison {
        column: desc,
        literal,
        column_first,
    })
}

/// Look through no-op relabels and implicit casts to the underlying node.
pub(crate) fn strip_implicit(mut expr: &Expr) -> &Expr {
    loop {
        match expr {
            Expr::Relabel {
                arg,
                implicit: true,
                ..
            } => expr = &**arg,
            Expr::Function(FunctionCall {
                implicit_cast: true,
                args,
                ..
            }) if !args.is_empty() => expr = &args[0],
            _ => return expr,
        }
    }
}

/// How a three-valued boolean test is written for its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BooleanTestMode {
    /// `IS TRUE` / `IS FALSE` against a native boolean
    Native,
    /// Integer comparisons against an implicit boolean column
    Implicit,
}

pub(crate) fn boolean_test_mode(
    arg: &Expr,
    ctx: &PushdownContext<'_>,
) -> Result<BooleanTestMode, SqlGenError> {
    if let Expr::Column(column) = strip_implicit(arg) {
        let desc = ctx.relation.resolve(column)?;
        if ctx.is_implicit_bool(desc) {
            return Ok(BooleanTestMode::Implicit);
        }
        if desc.data_type != DataType::Bool {
            return Err(SqlGenError::UnsupportedExpr(format!(
                "boolean test on {:?} column '{}'",
                desc.data_type, desc.local_name
            )));
        }
    }
    if ctx.supports_native_bool() {
        Ok(BooleanTestMode::Native)
    } else {
        Err(SqlGenError::UnsupportedType(DataType::Bool))
    }
}
