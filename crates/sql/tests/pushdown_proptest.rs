mod common;

use common::*;
use emberlink_sql::expr::BoolTestKind;
use emberlink_sql::{is_delegable, render, DataType, Datum, Expr, PushdownContext, SqlGenError};
use proptest::prelude::*;

fn arb_version() -> impl Strategy<Value = i32> {
    prop_oneof![
        Just(10500),
        Just(20000),
        Just(20100),
        Just(20500),
        Just(30000),
        Just(40000),
    ]
}

fn arb_bool_test() -> impl Strategy<Value = BoolTestKind> {
    prop_oneof![
        Just(BoolTestKind::IsTrue),
        Just(BoolTestKind::IsNotTrue),
        Just(BoolTestKind::IsFalse),
        Just(BoolTestKind::IsNotFalse),
        Just(BoolTestKind::IsUnknown),
        Just(BoolTestKind::IsNotUnknown),
    ]
}

fn arb_operand() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (1i16..=7).prop_map(col),
        any::<i32>().prop_map(Expr::int4),
        "[a-zA-Z' ]{0,12}".prop_map(|s| Expr::text(s)),
        Just(Expr::null(DataType::Int4)),
        any::<bool>().prop_map(Expr::boolean),
        (1i16..=7).prop_map(|attnum| udf("my_func", vec![col(attnum)])),
        (1i16..=7).prop_map(|attnum| Expr::call("upper", vec![col(attnum)], DataType::Text)),
        (1i16..=7).prop_map(|attnum| Expr::call("abs", vec![col(attnum)], DataType::Int4)),
        Just(Expr::SubQuery {
            sql: "SELECT 1".to_string()
        }),
    ]
}

fn arb_predicate() -> impl Strategy<Value = Expr> {
    let op = prop_oneof![
        Just("="),
        Just("<>"),
        Just("<"),
        Just(">="),
        Just("~~"),
        Just("~~*"),
        Just("<<"),
        Just("@@"),
    ];
    let leaf = prop_oneof![
        (op, arb_operand(), arb_operand()).prop_map(|(op, l, r)| Expr::binary(op, l, r)),
        arb_operand().prop_map(Expr::is_null),
        ((1i16..=7), arb_bool_test()).prop_map(|(attnum, test)| Expr::bool_test(col(attnum), test)),
        ((1i16..=7), proptest::collection::vec(any::<i32>(), 0..4), any::<bool>()).prop_map(
            |(attnum, values, negated)| {
                let values: Vec<Option<Datum>> =
                    values.into_iter().map(|v| Some(Datum::Int(v.into()))).collect();
                Expr::in_list(col(attnum), DataType::Int4, values, negated)
            }
        ),
        (1i16..=7).prop_map(col),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 1..3).prop_map(Expr::and),
            proptest::collection::vec(inner.clone(), 1..3).prop_map(Expr::or),
            inner.prop_map(Expr::not),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_delegable_trees_render(
        expr in arb_predicate(),
        version in arb_version(),
        implicit in any::<bool>(),
    ) {
        let rel = employee();
        let ctx = PushdownContext::new(&rel, version).with_implicit_bool(implicit);
        if is_delegable(&expr, &ctx) {
            let sql = render(&expr, &ctx);
            prop_assert!(sql.is_ok(), "{:?} -> {:?}", expr, sql);
            prop_assert!(!sql.unwrap().is_empty());
        }
    }

    #[test]
    fn test_render_is_idempotent(expr in arb_predicate(), version in arb_version()) {
        let rel = employee();
        let ctx = PushdownContext::new(&rel, version).with_implicit_bool(true);
        if is_delegable(&expr, &ctx) {
            prop_assert_eq!(render(&expr, &ctx).ok(), render(&expr, &ctx).ok());
        }
    }

    #[test]
    fn test_user_defined_function_poisons_tree(expr in arb_predicate(), version in arb_version()) {
        let rel = employee();
        let ctx = PushdownContext::new(&rel, version);
        let poisoned = Expr::and(vec![expr, Expr::binary("=", udf("my_func", vec![]), Expr::int4(1))]);
        prop_assert!(!is_delegable(&poisoned, &ctx));
    }

    #[test]
    fn test_string_literal_quotes_doubled(value in "[a-z' ]{0,16}") {
        let rel = employee();
        let ctx = PushdownContext::new(&rel, 30000);
        let expr = Expr::binary("=", col(LAST_NAME), Expr::text(value.clone()));
        let sql = render(&expr, &ctx).unwrap();

        let quoted = format!("'{}'", value.replace('\'', "''"));
        prop_assert_eq!(sql, format!("(\"LastName\" = {})", quoted.clone()));

        // A single token: every interior quote is part of a doubled pair.
        let interior = &quoted[1..quoted.len() - 1];
        prop_assert_eq!(interior.matches('\'').count(), 2 * value.matches('\'').count());
        prop_assert!(!interior.replace("''", "").contains('\''));
    }

    #[test]
    fn test_implicit_not_tests_expand_to_or(test in arb_bool_test()) {
        let rel = employee();
        let ctx = PushdownContext::new(&rel, 20500).with_implicit_bool(true);
        let sql = render(&Expr::bool_test(col(ACTIVE), test), &ctx).unwrap();
        let expands = matches!(test, BoolTestKind::IsNotTrue | BoolTestKind::IsNotFalse);
        prop_assert_eq!(sql.contains(" OR "), expands);
    }

    #[test]
    fn test_empty_in_list_never_rendered(attnum in 1i16..=5, negated in any::<bool>()) {
        let rel = employee();
        let ctx = PushdownContext::new(&rel, 30000);
        let expr = Expr::in_list(col(attnum), DataType::Int4, vec![], negated);
        prop_assert!(!is_delegable(&expr, &ctx));
        prop_assert!(matches!(render(&expr, &ctx), Err(SqlGenError::EmptyInList)));
    }
}
