use chrono::TimeDelta;
use rust_decimal::Decimal;

use super::expr::Expression;
use super::func::fn_remote;
use super::numeric::{FractionalKind, NumericKind};
use super::{CancellationToken, EvalConfig, InMemoryContext, RemoteContext, RemoteEval};
use crate::error::{ArithmeticKind, EvalError};
use crate::schema::{DynamicValue, PrimitiveValue, Schema, TimeUnit};

/// An expression that fails loudly if the evaluator ever reaches it.
fn divergent() -> Expression {
    Expression::variable("$unbound-probe", Schema::BOOL)
}

#[test]
fn test_boolean_operators() {
    let engine = RemoteEval::new();

    let expr = Expression::and(Expression::remote(true), Expression::remote(false));
    assert_eq!(engine.evaluate_typed::<bool>(&expr).unwrap(), false);

    let expr = Expression::or(Expression::remote(false), Expression::remote(false));
    assert_eq!(engine.evaluate_typed::<bool>(&expr).unwrap(), false);

    let expr = Expression::not(Expression::remote(true));
    assert_eq!(engine.evaluate_typed::<bool>(&expr).unwrap(), false);
}

#[test]
fn test_short_circuit() {
    let engine = RemoteEval::new();

    // The divergent side would fail with Unbound if it were evaluated
    let expr = Expression::and(Expression::remote(false), divergent());
    assert_eq!(engine.evaluate_typed::<bool>(&expr).unwrap(), false);

    let expr = Expression::or(Expression::remote(true), divergent());
    assert_eq!(engine.evaluate_typed::<bool>(&expr).unwrap(), true);
}

#[test]
fn test_branch_takes_one_arm() {
    let engine = RemoteEval::new();

    let expr = Expression::branch(
        Expression::remote(false),
        Expression::remote(1i32),
        Expression::remote(12i32),
    );
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 12);

    let expr = Expression::branch(
        Expression::remote(true),
        Expression::remote(1i32),
        Expression::remote(12i32),
    );
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 1);
}

#[test]
fn test_branch_unevaluated_arm_has_no_effect() {
    let engine = RemoteEval::new();
    let expr = Expression::branch(
        Expression::remote(true),
        Expression::remote(10i32),
        Expression::div(
            Expression::remote(1i32),
            Expression::remote(0i32),
            NumericKind::Int,
        ),
    );
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 10);
}

#[test]
fn test_branch_arm_schema_mismatch() {
    let engine = RemoteEval::new();
    let expr = Expression::branch(
        Expression::remote(true),
        Expression::remote(1i32),
        Expression::remote("twelve"),
    );
    assert!(matches!(
        engine.evaluate(&expr),
        Err(EvalError::TypeMismatch { .. })
    ));
}

#[test]
fn test_numeric_add() {
    let engine = RemoteEval::new();
    let expr = Expression::add(
        Expression::remote(40i64),
        Expression::remote(2i64),
        NumericKind::Long,
    );
    assert_eq!(engine.evaluate_typed::<i64>(&expr).unwrap(), 42);
}

#[test]
fn test_numeric_mod_is_modulo() {
    let engine = RemoteEval::new();
    let expr = Expression::modulo(
        Expression::remote(17i32),
        Expression::remote(5i32),
        NumericKind::Int,
    );
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 2);
}

#[test]
fn test_divide_by_zero_is_classified() {
    let engine = RemoteEval::new();
    let expr = Expression::div(
        Expression::remote(1i32),
        Expression::remote(0i32),
        NumericKind::Int,
    );
    assert_eq!(
        engine.evaluate(&expr),
        Err(EvalError::Arithmetic(ArithmeticKind::DivideByZero))
    );
}

#[test]
fn test_decimal_arithmetic() {
    let engine = RemoteEval::new();
    let expr = Expression::mul(
        Expression::remote(Decimal::new(15, 1)),
        Expression::remote(Decimal::from(2)),
        NumericKind::BigDecimal,
    );
    assert_eq!(
        engine.evaluate_typed::<Decimal>(&expr).unwrap(),
        Decimal::from(3)
    );
}

#[test]
fn test_fractional_atan() {
    let engine = RemoteEval::new();
    let expr = Expression::atan(Expression::remote(0.0f64), FractionalKind::Double);
    assert_eq!(engine.evaluate_typed::<f64>(&expr).unwrap(), 0.0);
}

#[test]
fn test_equal_compares_value_and_schema() {
    let engine = RemoteEval::new();

    let expr = Expression::equal(Expression::remote(3i32), Expression::remote(3i32));
    assert_eq!(engine.evaluate_typed::<bool>(&expr).unwrap(), true);

    // Same payload, different numeric schema: unequal, not an error
    let expr = Expression::equal(Expression::remote(3i32), Expression::remote(3i64));
    assert_eq!(engine.evaluate_typed::<bool>(&expr).unwrap(), false);
}

#[test]
fn test_less_than_equal_requires_matching_schemas() {
    let engine = RemoteEval::new();

    let expr = Expression::less_than_equal(Expression::remote(3i32), Expression::remote(3i32));
    assert_eq!(engine.evaluate_typed::<bool>(&expr).unwrap(), true);

    let expr = Expression::less_than_equal(Expression::remote("a"), Expression::remote(1i32));
    assert!(matches!(
        engine.evaluate(&expr),
        Err(EvalError::TypeMismatch { .. })
    ));
}

#[test]
fn test_fold_sums_a_list() {
    let engine = RemoteEval::new();
    let pair_schema = Schema::pair(Schema::INT, Schema::INT);
    let body = fn_remote(pair_schema, |acc_and_elem| {
        Expression::add(
            Expression::tuple_access(acc_and_elem.clone(), 0),
            Expression::tuple_access(acc_and_elem, 1),
            NumericKind::Int,
        )
    });
    let expr = Expression::fold(
        Expression::remote(vec![1i32, 2, 3, 4]),
        Expression::remote(0i32),
        body,
    );
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 10);
}

#[test]
fn test_iterate_counts_to_ten() {
    let engine = RemoteEval::new();
    let step = fn_remote(Schema::INT, |x| {
        Expression::add(x, Expression::remote(1i32), NumericKind::Int)
    });
    let predicate = fn_remote(Schema::INT, |x| {
        Expression::less_than_equal(x, Expression::remote(9i32))
    });
    let expr = Expression::iterate(Expression::remote(0i32), step, predicate);
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 10);
}

#[test]
fn test_iterate_bound_diverges() {
    let engine = RemoteEval::with_config(EvalConfig::new().with_iteration_limit(Some(5)));
    let step = fn_remote(Schema::INT, |x| x);
    let predicate = fn_remote(Schema::INT, |_| Expression::remote(true));
    let expr = Expression::iterate(Expression::remote(0i32), step, predicate);
    assert_eq!(engine.evaluate(&expr), Err(EvalError::IterationDiverged(5)));
}

#[test]
fn test_closure_discipline() {
    let engine = RemoteEval::new();

    let increment = fn_remote(Schema::INT, |x| {
        Expression::add(x, Expression::remote(1i32), NumericKind::Int)
    });
    let a = increment.clone().apply(Expression::remote(1i32));
    let b = increment.apply(Expression::remote(41i32));
    assert_eq!(engine.evaluate_typed::<i32>(&a).unwrap(), 2);
    assert_eq!(engine.evaluate_typed::<i32>(&b).unwrap(), 42);

    // A body that ignores its input gives identical results
    let constant = fn_remote(Schema::INT, |_| Expression::remote(7i32));
    let a = constant.clone().apply(Expression::remote(1i32));
    let b = constant.apply(Expression::remote(2i32));
    assert_eq!(
        engine.evaluate_typed::<i32>(&a).unwrap(),
        engine.evaluate_typed::<i32>(&b).unwrap()
    );
}

#[test]
fn test_apply_argument_schema_mismatch() {
    let engine = RemoteEval::new();
    let func = fn_remote(Schema::INT, |x| x);
    let expr = func.apply(Expression::remote("not an int"));
    assert!(matches!(
        engine.evaluate(&expr),
        Err(EvalError::TypeMismatch { .. })
    ));
}

#[test]
fn test_unbound_variable() {
    let engine = RemoteEval::new();
    let expr = Expression::variable("$missing", Schema::INT);
    assert_eq!(
        engine.evaluate(&expr),
        Err(EvalError::Unbound("$missing".to_string()))
    );
}

#[test]
fn test_variable_resolves_from_context() {
    let engine = RemoteEval::new();
    let mut ctx = InMemoryContext::new();
    ctx.set_variable("$v_input".to_string(), DynamicValue::int(99));
    let expr = Expression::variable("$v_input", Schema::INT);
    assert_eq!(engine.evaluate_typed_in::<i32>(&expr, &mut ctx).unwrap(), 99);
}

#[test]
fn test_tuple_access() {
    let engine = RemoteEval::new();
    let tuple = Expression::tuple3(
        Expression::remote("a"),
        Expression::remote(2i32),
        Expression::remote(true),
    );
    let expr = Expression::tuple_access(tuple.clone(), 1);
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 2);

    let expr = Expression::tuple_access(tuple, 3);
    assert_eq!(engine.evaluate(&expr), Err(EvalError::IndexOutOfRange(3)));
}

#[test]
fn test_tuple_access_across_arities() {
    let engine = RemoteEval::new();
    let items: Vec<Expression> = (0..22).map(|n: i32| Expression::remote(n)).collect();
    let tuple = Expression::tuple_n(items).unwrap();
    for index in [0usize, 1, 10, 21] {
        let expr = Expression::tuple_access(tuple.clone(), index);
        assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), index as i32);
    }
}

#[test]
fn test_cons_prepends() {
    let engine = RemoteEval::new();
    let expr = Expression::cons(Expression::remote(vec![2i32, 3]), Expression::remote(1i32));
    assert_eq!(
        engine.evaluate_typed::<Vec<i32>>(&expr).unwrap(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_uncons() {
    let engine = RemoteEval::new();

    let expr = Expression::uncons(Expression::remote(vec![1i32, 2, 3]));
    let result = engine
        .evaluate_typed::<Option<(i32, Vec<i32>)>>(&expr)
        .unwrap();
    assert_eq!(result, Some((1, vec![2, 3])));

    let expr = Expression::uncons(Expression::remote(Vec::<i32>::new()));
    let result = engine
        .evaluate_typed::<Option<(i32, Vec<i32>)>>(&expr)
        .unwrap();
    assert_eq!(result, None);
}

#[test]
fn test_either_fold_and_swap() {
    let engine = RemoteEval::new();

    let left = Expression::either_left(Expression::remote(5i32), Schema::STRING);
    let on_left = fn_remote(Schema::INT, |x| {
        Expression::add(x, Expression::remote(1i32), NumericKind::Int)
    });
    let on_right = fn_remote(Schema::STRING, |_| Expression::remote(0i32));
    let expr = Expression::fold_either(left.clone(), on_left, on_right);
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 6);

    let swapped = Expression::swap_either(left);
    let result = engine.evaluate(&swapped).unwrap();
    assert_eq!(result.schema, Schema::either(Schema::STRING, Schema::INT));
    assert_eq!(result.value, DynamicValue::right(DynamicValue::int(5)));
}

#[test]
fn test_flat_map_either_passes_left_through() {
    let engine = RemoteEval::new();
    let left = Expression::either_left(Expression::remote("boom"), Schema::INT);
    let func = fn_remote(Schema::INT, |x| {
        Expression::either_right(Schema::STRING, x)
    });
    let expr = Expression::flat_map_either(left, func, Schema::STRING, Schema::INT);
    let result = engine.evaluate(&expr).unwrap();
    assert_eq!(result.schema, Schema::either(Schema::STRING, Schema::INT));
    assert_eq!(result.value, DynamicValue::left(DynamicValue::string("boom")));
}

#[test]
fn test_flat_map_either_maps_right() {
    let engine = RemoteEval::new();
    let right = Expression::either_right(Schema::STRING, Expression::remote(20i32));
    let func = fn_remote(Schema::INT, |x| {
        Expression::either_right(
            Schema::STRING,
            Expression::add(x, Expression::remote(1i32), NumericKind::Int),
        )
    });
    let expr = Expression::flat_map_either(right, func, Schema::STRING, Schema::INT);
    let result = engine.evaluate(&expr).unwrap();
    assert_eq!(result.value, DynamicValue::right(DynamicValue::int(21)));
}

#[test]
fn test_option_operators() {
    let engine = RemoteEval::new();

    let some = Expression::some_value(Expression::remote(4i32));
    let if_some = fn_remote(Schema::INT, |x| {
        Expression::mul(x, Expression::remote(10i32), NumericKind::Int)
    });
    let expr = Expression::fold_option(some.clone(), Expression::remote(0i32), if_some.clone());
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 40);

    let expr = Expression::fold_option(
        Expression::none(Schema::INT),
        Expression::remote(0i32),
        if_some,
    );
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 0);

    let expr = Expression::zip_option(some.clone(), Expression::some_value(Expression::remote("x")));
    let result = engine
        .evaluate_typed::<Option<(i32, String)>>(&expr)
        .unwrap();
    assert_eq!(result, Some((4, "x".to_string())));

    let expr = Expression::zip_option(some.clone(), Expression::none(Schema::STRING));
    let result = engine
        .evaluate_typed::<Option<(i32, String)>>(&expr)
        .unwrap();
    assert_eq!(result, None);

    let expr = Expression::option_contains(some, Expression::remote(4i32));
    assert_eq!(engine.evaluate_typed::<bool>(&expr).unwrap(), true);
}

#[test]
fn test_try_success_and_failure() {
    let engine = RemoteEval::new();

    let expr = Expression::try_success(Expression::remote(3i32));
    let result = engine.evaluate(&expr).unwrap();
    assert_eq!(
        result.value,
        DynamicValue::Enum {
            case: "Success".to_string(),
            value: Box::new(DynamicValue::int(3)),
        }
    );

    let throwable = Expression::literal(
        DynamicValue::Primitive(PrimitiveValue::Throwable("boom".to_string())),
        Schema::Primitive(crate::schema::StandardType::Throwable),
    );
    let expr = Expression::try_failure(throwable, Schema::INT);
    let result = engine.evaluate(&expr).unwrap();
    assert_eq!(
        result.value,
        DynamicValue::Enum {
            case: "Failure".to_string(),
            value: Box::new(DynamicValue::Primitive(PrimitiveValue::Throwable(
                "boom".to_string()
            ))),
        }
    );
}

#[test]
fn test_instant_arithmetic() {
    let engine = RemoteEval::new();
    let expr = Expression::instant_plus_duration(
        Expression::instant_from_long(Expression::remote(1_000i64)),
        Expression::duration_from_long(Expression::remote(60i64)),
    );
    let tuple = Expression::instant_to_tuple(expr);
    assert_eq!(
        engine.evaluate_typed::<(i64, i64)>(&tuple).unwrap(),
        (1_060, 0)
    );
}

#[test]
fn test_instant_longs_round_trip() {
    let engine = RemoteEval::new();
    let expr = Expression::instant_to_tuple(Expression::instant_from_longs(
        Expression::remote(123i64),
        Expression::remote(456_000i64),
    ));
    assert_eq!(
        engine.evaluate_typed::<(i64, i64)>(&expr).unwrap(),
        (123, 456_000)
    );
}

#[test]
fn test_duration_longs_round_trip() {
    let engine = RemoteEval::new();
    let expr = Expression::duration_to_longs(Expression::duration_from_longs(
        Expression::remote(5i64),
        Expression::remote(1_500_000_000i64),
    ));
    // The nano adjustment normalizes into the seconds
    assert_eq!(
        engine.evaluate_typed::<(i64, i64)>(&expr).unwrap(),
        (6, 500_000_000)
    );
}

#[test]
fn test_duration_from_big_decimal_splits() {
    let engine = RemoteEval::new();
    let expr = Expression::duration_to_longs(Expression::duration_from_big_decimal(
        Expression::remote(Decimal::new(25, 1)),
    ));
    assert_eq!(
        engine.evaluate_typed::<(i64, i64)>(&expr).unwrap(),
        (2, 500_000_000)
    );
}

#[test]
fn test_duration_parsing_and_arithmetic() {
    let engine = RemoteEval::new();
    let expr = Expression::duration_minus(
        Expression::duration_from_string(Expression::remote("PT1H")),
        Expression::duration_from_string(Expression::remote("PT30M")),
    );
    assert_eq!(
        engine.evaluate_typed::<TimeDelta>(&expr).unwrap(),
        TimeDelta::minutes(30)
    );

    let expr = Expression::duration_from_string(Expression::remote("one hour"));
    assert!(matches!(engine.evaluate(&expr), Err(EvalError::Parse(_))));
}

#[test]
fn test_instant_parsing() {
    let engine = RemoteEval::new();
    let expr = Expression::instant_to_tuple(Expression::instant_from_string(Expression::remote(
        "1970-01-01T00:16:40Z",
    )));
    assert_eq!(
        engine.evaluate_typed::<(i64, i64)>(&expr).unwrap(),
        (1_000, 0)
    );

    let expr = Expression::instant_from_string(Expression::remote("yesterday"));
    assert!(matches!(engine.evaluate(&expr), Err(EvalError::Parse(_))));
}

#[test]
fn test_instant_truncate() {
    let engine = RemoteEval::new();
    let instant = Expression::instant_from_longs(
        Expression::remote(125i64),
        Expression::remote(999i64),
    );
    let expr = Expression::instant_to_tuple(Expression::instant_truncate(
        instant.clone(),
        Expression::remote(TimeUnit::Minutes),
    ));
    assert_eq!(
        engine.evaluate_typed::<(i64, i64)>(&expr).unwrap(),
        (120, 0)
    );

    let expr = Expression::instant_truncate(instant, Expression::remote(TimeUnit::Months));
    assert!(matches!(
        engine.evaluate(&expr),
        Err(EvalError::EvaluationFailed(_))
    ));
}

#[test]
fn test_duration_from_amount() {
    let engine = RemoteEval::new();
    let expr = Expression::duration_from_amount(
        Expression::remote(3i64),
        Expression::remote(TimeUnit::Hours),
    );
    assert_eq!(
        engine.evaluate_typed::<TimeDelta>(&expr).unwrap(),
        TimeDelta::hours(3)
    );

    let expr = Expression::duration_from_amount(
        Expression::remote(3i64),
        Expression::remote(TimeUnit::Years),
    );
    assert!(matches!(
        engine.evaluate(&expr),
        Err(EvalError::EvaluationFailed(_))
    ));
}

#[test]
fn test_string_length() {
    let engine = RemoteEval::new();
    let expr = Expression::length(Expression::remote("blueprint"));
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 9);
}

#[test]
fn test_lazy_defers_and_evaluates() {
    let engine = RemoteEval::new();
    let expr = Expression::lazy(|| {
        Expression::add(
            Expression::remote(20i32),
            Expression::remote(22i32),
            NumericKind::Int,
        )
    });
    assert_eq!(expr.schema(), Schema::INT);
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 42);
}

#[test]
fn test_nested_carries_blueprint_as_data() {
    let engine = RemoteEval::new();
    let inner = Expression::remote(7i32);
    let expr = Expression::nested(inner.clone());
    let result = engine.evaluate(&expr).unwrap();
    match result.value {
        DynamicValue::Primitive(PrimitiveValue::String(encoded)) => {
            let decoded: Expression = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, inner);
        }
        other => panic!("expected an encoded blueprint, got {other:?}"),
    }
}

#[test]
fn test_schema_stability() {
    let engine = RemoteEval::new();
    let exprs = vec![
        Expression::remote(1i32),
        Expression::add(
            Expression::remote(1i64),
            Expression::remote(2i64),
            NumericKind::Long,
        ),
        Expression::and(Expression::remote(true), Expression::remote(true)),
        Expression::tuple3(
            Expression::remote("a"),
            Expression::remote(2i32),
            Expression::remote(true),
        ),
        Expression::some_value(Expression::remote(1i32)),
        Expression::either_left(Expression::remote(1i32), Schema::STRING),
        Expression::uncons(Expression::remote(vec![1i32])),
        Expression::duration_from_long(Expression::remote(1i64)),
        Expression::try_success(Expression::remote(1i32)),
    ];
    for expr in exprs {
        let result = engine.evaluate(&expr).unwrap();
        assert_eq!(expr.schema(), result.schema, "schema drifted for {expr:?}");
        result.validate().unwrap();
    }
}

#[test]
fn test_cancellation_aborts_evaluation() {
    let token = CancellationToken::new();
    let engine = RemoteEval::new().with_cancellation(token.clone());

    let expr = Expression::remote(1i32);
    assert!(engine.evaluate(&expr).is_ok());

    token.cancel();
    assert_eq!(engine.evaluate(&expr), Err(EvalError::Cancelled));
}

#[test]
fn test_cancellation_stops_iteration() {
    let token = CancellationToken::new();
    let engine = RemoteEval::new().with_cancellation(token.clone());

    // Cancel before entering an otherwise unbounded loop
    token.cancel();
    let step = fn_remote(Schema::INT, |x| x);
    let predicate = fn_remote(Schema::INT, |_| Expression::remote(true));
    let expr = Expression::iterate(Expression::remote(0i32), step, predicate);
    assert_eq!(engine.evaluate(&expr), Err(EvalError::Cancelled));
}

#[test]
fn test_recursion_limit() {
    let engine = RemoteEval::with_config(EvalConfig::new().with_recursion_limit(4));
    let mut expr = Expression::remote(true);
    for _ in 0..8 {
        expr = Expression::not(expr);
    }
    assert!(matches!(
        engine.evaluate(&expr),
        Err(EvalError::EvaluationFailed(_))
    ));
}
