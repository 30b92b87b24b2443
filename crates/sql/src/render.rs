//! Remote SQL Renderer
//!
//! Emits remote-dialect text for trees accepted by `classify::is_delegable`.
//! Every composite node is fully parenthesized so the output never depends on
//! the remote engine's operator precedence. Reaching a shape the classifier
//! would have rejected is an error, and nothing is partially rendered.

use crate::capability::{Arity, FunctionRule, OperatorRule, MAX_IN_LIST_ELEMENTS};
use crate::classify::{
    boolean_test_mode, function_entry, implicit_bool_comparison, is_membership_shape,
    operator_entry, strip_implicit, BooleanTestMode, Slot,
};
use crate::error::SqlGenError;
use crate::expr::{
    ArrayOperand, BoolOp, BoolTestKind, ColumnRef, DataType, Datum, Expr, FunctionCall, Literal,
    OperatorRef,
};
use crate::quote::quote_literal;
use crate::relation::PushdownContext;

/// Render an accepted predicate tree.
pub fn render(expr: &Expr, ctx: &PushdownContext<'_>) -> Result<String, SqlGenError> {
    let sql = ExprRenderer::new(ctx).expr(expr, Slot::Predicate)?;
    tracing::debug!(
        target: "render",
        relation = %ctx.relation.local_name,
        %sql,
        "Rendered remote expression"
    );
    Ok(sql)
}

/// Remote text for a literal value. `NULL` for a structurally null value.
pub(crate) fn literal_text(
    literal: &Literal,
    ctx: &PushdownContext<'_>,
) -> Result<String, SqlGenError> {
    let Some(value) = &literal.value else {
        return Ok("NULL".to_string());
    };
    datum_text(literal.data_type, value, ctx)
}

fn datum_text(
    data_type: DataType,
    value: &Datum,
    ctx: &PushdownContext<'_>,
) -> Result<String, SqlGenError> {
    if data_type == DataType::Bool {
        return match value {
            Datum::Bool(b) if ctx.supports_native_bool() => {
                Ok(if *b { "TRUE" } else { "FALSE" }.to_string())
            }
            Datum::Bool(_) => Err(SqlGenError::UnsupportedType(DataType::Bool)),
            other => Err(mismatch(data_type, other)),
        };
    }
    if !data_type.is_remote_representable() {
        return Err(SqlGenError::UnsupportedType(data_type));
    }

    match value {
        Datum::Int(v)
            if data_type.is_integer()
                || matches!(
                    data_type,
                    DataType::Numeric | DataType::Float4 | DataType::Float8
                ) =>
        {
            Ok(v.to_string())
        }
        Datum::Float(v)
            if v.is_finite()
                && matches!(
                    data_type,
                    DataType::Numeric | DataType::Float4 | DataType::Float8
                ) =>
        {
            Ok(v.to_string())
        }
        Datum::Numeric(text) if data_type == DataType::Numeric && is_decimal_text(text) => {
            Ok(text.clone())
        }
        Datum::Text(text) if data_type.is_string() => Ok(quote_literal(text)),
        Datum::Date(d) if data_type == DataType::Date => Ok(d.format("'%Y-%m-%d'").to_string()),
        Datum::Time(t) if data_type == DataType::Time => {
            Ok(t.format("'%H:%M:%S%.f'").to_string())
        }
        Datum::Timestamp(ts) if data_type == DataType::Timestamp => {
            Ok(ts.format("'%Y-%m-%d %H:%M:%S%.f'").to_string())
        }
        other => Err(mismatch(data_type, other)),
    }
}

fn mismatch(data_type: DataType, value: &Datum) -> SqlGenError {
    SqlGenError::UnsupportedValue(format!("{:?} as {:?}", value, data_type))
}

/// `-?digits[.digits][(e|E)[+-]digits]`
fn is_decimal_text(text: &str) -> bool {
    fn digits(s: &str) -> usize {
        s.bytes().take_while(u8::is_ascii_digit).count()
    }

    let rest = text.strip_prefix('-').unwrap_or(text);
    let whole = digits(rest);
    if whole == 0 {
        return false;
    }
    let mut rest = &rest[whole..];

    if let Some(fraction) = rest.strip_prefix('.') {
        let n = digits(fraction);
        if n == 0 {
            return false;
        }
        rest = &fraction[n..];
    }

    if let Some(exponent) = rest.strip_prefix(['e', 'E']) {
        let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        let n = digits(exponent);
        if n == 0 {
            return false;
        }
        rest = &exponent[n..];
    }

    rest.is_empty()
}

/// 1 / 0 for a boolean compared against an implicit boolean column.
fn implicit_bool_literal(literal: &Literal) -> &'static str {
    match literal.value {
        Some(Datum::Bool(true)) => "1",
        Some(Datum::Bool(false)) => "0",
        _ => "NULL",
    }
}

struct ExprRenderer<'c, 'a> {
    ctx: &'c PushdownContext<'a>,
}

impl<'c, 'a> ExprRenderer<'c, 'a> {
    fn new(ctx: &'c PushdownContext<'a>) -> Self {
        Self { ctx }
    }

    fn expr(&self, expr: &Expr, slot: Slot) -> Result<String, SqlGenError> {
        match expr {
            Expr::Column(column) => self.column(column, slot),

            Expr::Literal(literal) => literal_text(literal, self.ctx),

            Expr::UnaryOp { op, operand } => {
                let entry = operator_entry(op, Arity::Unary, self.ctx)?;
                let operand = self.expr(operand, Slot::Operand)?;
                match entry.rule {
                    // Spaced so a negative operand never forms a `--` comment.
                    OperatorRule::Prefix(symbol) => Ok(format!("({} {})", symbol, operand)),
                    _ => Err(SqlGenError::UnsupportedExpr(format!(
                        "unary operator {}",
                        op.name
                    ))),
                }
            }

            Expr::BinaryOp { op, left, right } => self.binary(op, left, right),

            Expr::Bool { op, args } => self.connective(*op, args),

            Expr::NullTest { arg, negated } => {
                let arg = self.expr(arg, Slot::TestArgument)?;
                Ok(if *negated {
                    format!("({} IS NOT NULL)", arg)
                } else {
                    format!("({} IS NULL)", arg)
                })
            }

            Expr::BooleanTest { arg, test } => self.boolean_test(arg, *test),

            Expr::ScalarArrayOp {
                op,
                use_or,
                left,
                right,
            } => self.membership(op, *use_or, left, right),

            Expr::Function(call) => self.function(call, slot),

            Expr::Relabel {
                arg,
                result_type,
                implicit,
            } => {
                if !implicit {
                    return Err(SqlGenError::ExplicitCast(*result_type));
                }
                self.expr(arg, slot)
            }

            Expr::Param { id, .. } => Err(SqlGenError::UnsupportedExpr(format!(
                "parameter ${}",
                id
            ))),

            Expr::SubQuery { .. } => Err(SqlGenError::UnsupportedExpr("subquery".to_string())),
        }
    }

    fn column(&self, column: &ColumnRef, slot: Slot) -> Result<String, SqlGenError> {
        let relation = self.ctx.relation;
        let desc = relation.resolve(column)?;
        let name = relation.column_sql(desc);

        if desc.data_type != DataType::Bool {
            return Ok(name);
        }
        if self.ctx.is_implicit_bool(desc) {
            return match slot {
                Slot::Predicate => Ok(format!("({} <> 0)", name)),
                Slot::TestArgument => Ok(name),
                Slot::Operand => Err(SqlGenError::MixedBooleanForms(desc.local_name.clone())),
            };
        }
        if self.ctx.supports_native_bool() {
            Ok(name)
        } else {
            Err(SqlGenError::UnsupportedType(DataType::Bool))
        }
    }

    fn binary(&self, op: &OperatorRef, left: &Expr, right: &Expr) -> Result<String, SqlGenError> {
        if let Some(cmp) = implicit_bool_comparison(op, left, right, self.ctx) {
            let column = self.ctx.relation.column_sql(cmp.column);
            let value = implicit_bool_literal(cmp.literal);
            return Ok(if cmp.column_first {
                format!("({} {} {})", column, op.name, value)
            } else {
                format!("({} {} {})", value, op.name, column)
            });
        }

        let entry = operator_entry(op, Arity::Binary, self.ctx)?;
        let l = self.expr(left, Slot::Operand)?;
        let r = self.expr(right, Slot::Operand)?;

        match entry.rule {
            OperatorRule::Infix(symbol) => Ok(format!("({} {} {})", l, symbol, r)),
            OperatorRule::Function(name) => Ok(format!("({}({}, {}))", name, l, r)),
            OperatorRule::CaseInsensitiveLike { negated } => Ok(format!(
                "(LOWER({}) {}LIKE LOWER({}))",
                l,
                if negated { "NOT " } else { "" },
                r
            )),
            OperatorRule::Prefix(_) => Err(SqlGenError::UnsupportedExpr(format!(
                "binary operator {}",
                op.name
            ))),
        }
    }

    fn connective(&self, op: BoolOp, args: &[Expr]) -> Result<String, SqlGenError> {
        let parts = args
            .iter()
            .map(|arg| self.expr(arg, Slot::Predicate))
            .collect::<Result<Vec<_>, _>>()?;

        match (op, parts.as_slice()) {
            (_, []) => Err(SqlGenError::UnsupportedExpr(
                "boolean connective without arguments".to_string(),
            )),
            (BoolOp::Not, [only]) => Ok(format!("(NOT {})", only)),
            (BoolOp::Not, _) => Err(SqlGenError::UnsupportedExpr(format!(
                "NOT with {} arguments",
                parts.len()
            ))),
            (BoolOp::And, _) => Ok(format!("({})", parts.join(" AND "))),
            (BoolOp::Or, _) => Ok(format!("({})", parts.join(" OR "))),
        }
    }

    fn boolean_test(&self, arg: &Expr, test: BoolTestKind) -> Result<String, SqlGenError> {
        match boolean_test_mode(arg, self.ctx)? {
            BooleanTestMode::Implicit => {
                let Expr::Column(column) = strip_implicit(arg) else {
                    return Err(SqlGenError::UnsupportedExpr(
                        "implicit boolean test on a non-column".to_string(),
                    ));
                };
                let desc = self.ctx.relation.resolve(column)?;
                let c = self.ctx.relation.column_sql(desc);
                Ok(match test {
                    BoolTestKind::IsTrue => format!("({} <> 0)", c),
                    BoolTestKind::IsNotTrue => format!("(({} = 0) OR ({} IS NULL))", c, c),
                    BoolTestKind::IsFalse => format!("({} = 0)", c),
                    BoolTestKind::IsNotFalse => format!("(({} <> 0) OR ({} IS NULL))", c, c),
                    BoolTestKind::IsUnknown => format!("({} IS NULL)", c),
                    BoolTestKind::IsNotUnknown => format!("({} IS NOT NULL)", c),
                })
            }
            BooleanTestMode::Native => {
                let a = self.expr(arg, Slot::TestArgument)?;
                Ok(match test {
                    BoolTestKind::IsTrue => format!("({} IS TRUE)", a),
                    BoolTestKind::IsNotTrue => format!("(({} IS FALSE) OR ({} IS NULL))", a, a),
                    BoolTestKind::IsFalse => format!("({} IS FALSE)", a),
                    BoolTestKind::IsNotFalse => format!("(({} IS TRUE) OR ({} IS NULL))", a, a),
                    BoolTestKind::IsUnknown => format!("({} IS NULL)", a),
                    BoolTestKind::IsNotUnknown => format!("({} IS NOT NULL)", a),
                })
            }
        }
    }

    fn membership(
        &self,
        op: &OperatorRef,
        use_or: bool,
        left: &Expr,
        right: &ArrayOperand,
    ) -> Result<String, SqlGenError> {
        if !op.builtin || !is_membership_shape(op, use_or) {
            return Err(SqlGenError::UnsupportedExpr(format!(
                "quantified comparison {}",
                op.name
            )));
        }
        let ArrayOperand::Literal(array) = right else {
            return Err(SqlGenError::UnsupportedExpr(
                "IN list over a computed set".to_string(),
            ));
        };
        if array.elements.is_empty() {
            return Err(SqlGenError::EmptyInList);
        }
        if array.elements.len() > MAX_IN_LIST_ELEMENTS {
            return Err(SqlGenError::UnsupportedValue(format!(
                "IN list with {} elements",
                array.elements.len()
            )));
        }

        let elements = array
            .elements
            .iter()
            .map(|element| match element {
                Some(value) => datum_text(array.element_type, value, self.ctx),
                None => Ok("NULL".to_string()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let left = self.expr(left, Slot::Operand)?;
        let keyword = if use_or { "IN" } else { "NOT IN" };
        Ok(format!("({} {} ({}))", left, keyword, elements.join(", ")))
    }

    fn function(&self, call: &FunctionCall, slot: Slot) -> Result<String, SqlGenError> {
        if !call.result_type.is_remote_representable() {
            return Err(SqlGenError::UnsupportedType(call.result_type));
        }
        if call.implicit_cast {
            let first = call.args.first().ok_or_else(|| {
                SqlGenError::UnsupportedExpr(format!("implicit cast {} without arguments", call.name))
            })?;
            return self.expr(first, slot);
        }

        let entry = function_entry(call, self.ctx)?;
        let args = call
            .args
            .iter()
            .map(|arg| self.expr(arg, Slot::Operand))
            .collect::<Result<Vec<_>, _>>()?;

        match (entry.rule, args.as_slice()) {
            (FunctionRule::PassThrough, _) => Ok(format!(
                "{}({})",
                entry.name.to_ascii_uppercase(),
                args.join(", ")
            )),
            (FunctionRule::Rename(name), _) => Ok(format!("{}({})", name, args.join(", "))),
            (FunctionRule::RenameByArity { unary, otherwise }, _) => {
                let name = if args.len() == 1 { unary } else { otherwise };
                Ok(format!("{}({})", name, args.join(", ")))
            }
            (FunctionRule::Concat, _) => Ok(format!("({})", args.join(" || "))),
            (FunctionRule::Position, [string, substring]) => {
                Ok(format!("POSITION({} IN {})", substring, string))
            }
            (FunctionRule::Substring, [string, start]) => {
                Ok(format!("SUBSTRING({} FROM {})", string, start))
            }
            (FunctionRule::Substring, [string, start, count]) => {
                Ok(format!("SUBSTRING({} FROM {} FOR {})", string, start, count))
            }
            (FunctionRule::Trim(side), [string]) => {
                Ok(format!("TRIM({} FROM {})", side.keyword(), string))
            }
            (FunctionRule::Trim(side), [string, characters]) => Ok(format!(
                "TRIM({} {} FROM {})",
                side.keyword(),
                characters,
                string
            )),
            (rule, _) => Err(SqlGenError::UnsupportedExpr(format!(
                "{:?} with {} arguments",
                rule,
                args.len()
            ))),
        }
    }
}
