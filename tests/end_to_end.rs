//! End-to-end scenarios through the public API: build a blueprint,
//! ship it through the wire codec, evaluate it on the "other side".

use remote_eval_rs::rexpr::codec;
use remote_eval_rs::{
    fn_remote, register_transform, DynamicValue, EvalError, Expression, IntoDynamic, NumericKind,
    PrimitiveValue, RemoteContext, RemoteEval, Schema, SchemaAndValue, SharedContext,
};

/// Encode, decode, and check the round trip left the blueprint intact.
fn ship(expr: Expression) -> Expression {
    let bytes = codec::to_bytes(&expr).unwrap();
    let decoded: Expression = codec::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, expr);
    decoded
}

#[test]
fn boolean_blueprint_ships_and_evaluates() {
    let engine = RemoteEval::new();
    let expr = ship(Expression::and(
        Expression::remote(true),
        Expression::remote(false),
    ));
    assert_eq!(engine.evaluate_typed::<bool>(&expr).unwrap(), false);
}

#[test]
fn branch_blueprint_ships_and_evaluates() {
    let engine = RemoteEval::new();
    let expr = ship(Expression::branch(
        Expression::remote(false),
        Expression::remote(1i32),
        Expression::remote(12i32),
    ));
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 12);
}

#[test]
fn fold_blueprint_ships_and_evaluates() {
    let engine = RemoteEval::new();
    let body = fn_remote(Schema::pair(Schema::INT, Schema::INT), |pair| {
        Expression::add(
            Expression::tuple_access(pair.clone(), 0),
            Expression::tuple_access(pair, 1),
            NumericKind::Int,
        )
    });
    let expr = ship(Expression::fold(
        Expression::remote(vec![1i32, 2, 3, 4]),
        Expression::remote(0i32),
        body,
    ));
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 10);
}

#[test]
fn iterate_blueprint_ships_and_evaluates() {
    let engine = RemoteEval::new();
    let step = fn_remote(Schema::INT, |x| {
        Expression::add(x, Expression::remote(1i32), NumericKind::Int)
    });
    let predicate = fn_remote(Schema::INT, |x| {
        Expression::less_than_equal(x, Expression::remote(9i32))
    });
    let expr = ship(Expression::iterate(Expression::remote(0i32), step, predicate));
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 10);
}

#[test]
fn time_blueprint_ships_and_evaluates() {
    let engine = RemoteEval::new();
    let expr = ship(Expression::instant_to_tuple(Expression::instant_plus_duration(
        Expression::instant_from_long(Expression::remote(1_000i64)),
        Expression::duration_from_long(Expression::remote(60i64)),
    )));
    assert_eq!(
        engine.evaluate_typed::<(i64, i64)>(&expr).unwrap(),
        (1_060, 0)
    );
}

#[test]
fn tuple_blueprint_ships_and_evaluates() {
    let engine = RemoteEval::new();
    let expr = ship(Expression::tuple_access(
        Expression::tuple3(
            Expression::remote("a"),
            Expression::remote(2i32),
            Expression::remote(true),
        ),
        1,
    ));
    assert_eq!(engine.evaluate_typed::<i32>(&expr).unwrap(), 2);
}

#[test]
fn literal_value_round_trips_through_evaluation() {
    let engine = RemoteEval::new();
    let value = (7i64, Some("order".to_string()));
    let expr = Expression::remote(value.clone());

    let result = engine.evaluate(&expr).unwrap();
    assert_eq!(
        result,
        SchemaAndValue::new(
            <(i64, Option<String>)>::schema(),
            value.clone().into_dynamic()
        )
    );
    let narrowed = engine
        .evaluate_typed::<(i64, Option<String>)>(&expr)
        .unwrap();
    assert_eq!(narrowed, value);
}

#[test]
fn bindings_persist_in_a_shared_context() {
    let engine = RemoteEval::new();
    let mut writer = SharedContext::new();
    writer.set_variable("$v_order_total".to_string(), DynamicValue::long(250));

    // A clone of the context models the process that resumes the workflow
    let mut reader = writer.clone();
    let expr = Expression::add(
        Expression::variable("$v_order_total", Schema::LONG),
        Expression::remote(50i64),
        NumericKind::Long,
    );
    assert_eq!(
        engine.evaluate_typed_in::<i64>(&expr, &mut reader).unwrap(),
        300
    );
}

#[test]
fn registered_transform_applies_during_narrowing() {
    register_transform(
        "doubled-long",
        |value| match value {
            DynamicValue::Primitive(PrimitiveValue::Long(n)) => {
                Ok(DynamicValue::long(n * 2))
            }
            other => Ok(other),
        },
        |value| match value {
            DynamicValue::Primitive(PrimitiveValue::Long(n)) => {
                Ok(DynamicValue::long(n / 2))
            }
            other => Ok(other),
        },
    );

    let engine = RemoteEval::new();
    let expr = Expression::literal(
        DynamicValue::long(10),
        Schema::Transform {
            name: "doubled-long".to_string(),
            inner: Box::new(Schema::LONG),
        },
    );
    assert_eq!(engine.evaluate_typed::<i64>(&expr).unwrap(), 5);
}

#[test]
fn unbound_variable_surfaces_to_the_caller() {
    let engine = RemoteEval::new();
    let expr = Expression::variable("$v_gone", Schema::INT);
    assert_eq!(
        engine.evaluate(&expr),
        Err(EvalError::Unbound("$v_gone".to_string()))
    );
}

#[test]
fn function_blueprints_reuse_nothing_across_builds() {
    let f = fn_remote(Schema::INT, |x| x);
    let g = fn_remote(Schema::INT, |x| x);
    assert_ne!(f.input_name, g.input_name);

    // Both still evaluate independently after shipping
    let engine = RemoteEval::new();
    let a = ship(f.apply(Expression::remote(1i32)));
    let b = ship(g.apply(Expression::remote(2i32)));
    assert_eq!(engine.evaluate_typed::<i32>(&a).unwrap(), 1);
    assert_eq!(engine.evaluate_typed::<i32>(&b).unwrap(), 2);
}
