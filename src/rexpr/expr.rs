//! The remote expression algebra
//!
//! An [`Expression`] is an immutable, serializable blueprint for a
//! computation. It never embeds host code: operators carry their
//! operand subexpressions, the auxiliary constants evaluation needs
//! (numeric instance selectors, missing-side schemas, indices) and
//! enough schema information to answer [`Expression::schema`] without
//! evaluating. Subexpressions are reference-shared, so cloning a
//! blueprint is cheap and never deep-copies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::func::EvaluatedFunction;
use super::lazy::LazyExpr;
use super::numeric::{FractionalKind, NumericKind};
use crate::error::{EvalError, EvalResult};
use crate::schema::{DynamicValue, IntoDynamic, Schema, StandardType};

/// Transform name under which `Nested` carries a blueprint as data.
pub const NESTED_TRANSFORM: &str = "expression";

/// Failure side of a `Try` expression: the throwable to evaluate plus
/// the schema of the success side it stands in for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryFailure {
    pub throwable: Arc<Expression>,
    pub success_schema: Schema,
}

/// A serializable computation blueprint.
///
/// The variant set is closed; each variant's name is its stable wire
/// case name. Expressions encode as `{ "case": <name>, "value":
/// <fields> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "case", content = "value")]
pub enum Expression {
    // Leaves
    Literal {
        value: DynamicValue,
        schema: Schema,
    },
    Ignore,
    Variable {
        name: String,
        schema: Schema,
    },
    Nested {
        expr: Arc<Expression>,
    },

    // Binding
    Function {
        func: EvaluatedFunction,
    },
    Apply {
        func: EvaluatedFunction,
        arg: Arc<Expression>,
    },

    // Numeric operators
    Add {
        numeric: NumericKind,
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Sub {
        numeric: NumericKind,
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Mul {
        numeric: NumericKind,
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Div {
        numeric: NumericKind,
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Mod {
        numeric: NumericKind,
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Pow {
        numeric: NumericKind,
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Root {
        numeric: NumericKind,
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Log {
        numeric: NumericKind,
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Min {
        numeric: NumericKind,
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Max {
        numeric: NumericKind,
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Neg {
        numeric: NumericKind,
        expr: Arc<Expression>,
    },
    Abs {
        numeric: NumericKind,
        expr: Arc<Expression>,
    },
    Floor {
        numeric: NumericKind,
        expr: Arc<Expression>,
    },
    Ceil {
        numeric: NumericKind,
        expr: Arc<Expression>,
    },
    Round {
        numeric: NumericKind,
        expr: Arc<Expression>,
    },

    // Fractional operators
    Sin {
        fractional: FractionalKind,
        expr: Arc<Expression>,
    },
    Cos {
        fractional: FractionalKind,
        expr: Arc<Expression>,
    },
    Tan {
        fractional: FractionalKind,
        expr: Arc<Expression>,
    },
    Asin {
        fractional: FractionalKind,
        expr: Arc<Expression>,
    },
    Acos {
        fractional: FractionalKind,
        expr: Arc<Expression>,
    },
    Atan {
        fractional: FractionalKind,
        expr: Arc<Expression>,
    },

    // Boolean operators
    And {
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Or {
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    Not {
        expr: Arc<Expression>,
    },

    // Comparison
    Equal {
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    LessThanEqual {
        left: Arc<Expression>,
        right: Arc<Expression>,
    },

    // Control
    Branch {
        cond: Arc<Expression>,
        if_true: Arc<Expression>,
        if_false: Arc<Expression>,
    },

    // Iteration
    Iterate {
        initial: Arc<Expression>,
        step: EvaluatedFunction,
        predicate: EvaluatedFunction,
    },

    // Either
    EitherLeft {
        value: Arc<Expression>,
        right_schema: Schema,
    },
    EitherRight {
        left_schema: Schema,
        value: Arc<Expression>,
    },
    FlatMapEither {
        either: Arc<Expression>,
        func: EvaluatedFunction,
        left_schema: Schema,
        right_schema: Schema,
    },
    FoldEither {
        either: Arc<Expression>,
        on_left: EvaluatedFunction,
        on_right: EvaluatedFunction,
    },
    SwapEither {
        either: Arc<Expression>,
    },

    // Option
    SomeValue {
        value: Arc<Expression>,
    },
    FoldOption {
        option: Arc<Expression>,
        if_none: Arc<Expression>,
        if_some: EvaluatedFunction,
    },
    ZipOption {
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    OptionContains {
        option: Arc<Expression>,
        value: Arc<Expression>,
    },

    // Try
    Try {
        result: Result<Arc<Expression>, TryFailure>,
    },

    // Tuples
    Tuple {
        items: Vec<Arc<Expression>>,
    },
    TupleAccess {
        tuple: Arc<Expression>,
        index: usize,
    },

    // Lists
    Cons {
        list: Arc<Expression>,
        head: Arc<Expression>,
    },
    UnCons {
        list: Arc<Expression>,
    },
    Fold {
        list: Arc<Expression>,
        initial: Arc<Expression>,
        body: EvaluatedFunction,
    },

    // Time: instants
    InstantFromLong {
        seconds: Arc<Expression>,
    },
    InstantFromLongs {
        seconds: Arc<Expression>,
        nanos: Arc<Expression>,
    },
    InstantFromMilli {
        millis: Arc<Expression>,
    },
    InstantFromString {
        value: Arc<Expression>,
    },
    InstantToTuple {
        instant: Arc<Expression>,
    },
    InstantPlusDuration {
        instant: Arc<Expression>,
        duration: Arc<Expression>,
    },
    InstantMinusDuration {
        instant: Arc<Expression>,
        duration: Arc<Expression>,
    },
    InstantTruncate {
        instant: Arc<Expression>,
        unit: Arc<Expression>,
    },

    // Time: durations
    DurationFromString {
        value: Arc<Expression>,
    },
    DurationBetweenInstants {
        start: Arc<Expression>,
        end: Arc<Expression>,
    },
    DurationFromBigDecimal {
        seconds: Arc<Expression>,
    },
    DurationFromLong {
        seconds: Arc<Expression>,
    },
    DurationFromLongs {
        seconds: Arc<Expression>,
        nano_adjustment: Arc<Expression>,
    },
    DurationFromAmount {
        amount: Arc<Expression>,
        unit: Arc<Expression>,
    },
    DurationToLongs {
        duration: Arc<Expression>,
    },
    DurationToLong {
        duration: Arc<Expression>,
    },
    DurationPlus {
        left: Arc<Expression>,
        right: Arc<Expression>,
    },
    DurationMinus {
        left: Arc<Expression>,
        right: Arc<Expression>,
    },

    // Strings
    Length {
        expr: Arc<Expression>,
    },

    // Laziness
    Lazy(Arc<LazyExpr>),
}

impl Expression {
    /// Schema of this expression's result, computed without evaluating.
    ///
    /// For every expression that evaluates successfully, this equals the
    /// schema component of the evaluation result up to structural
    /// equality. Expressions whose result shape depends on an operand
    /// with no statically known schema answer `Fail`.
    pub fn schema(&self) -> Schema {
        match self {
            Expression::Literal { schema, .. } => schema.clone(),
            Expression::Ignore => Schema::UNIT,
            Expression::Variable { schema, .. } => schema.clone(),
            Expression::Nested { .. } => Schema::Transform {
                name: NESTED_TRANSFORM.to_string(),
                inner: Box::new(Schema::STRING),
            },

            Expression::Function { func } => func.body.schema(),
            Expression::Apply { func, .. } => func.body.schema(),

            Expression::Add { numeric, .. }
            | Expression::Sub { numeric, .. }
            | Expression::Mul { numeric, .. }
            | Expression::Div { numeric, .. }
            | Expression::Mod { numeric, .. }
            | Expression::Pow { numeric, .. }
            | Expression::Root { numeric, .. }
            | Expression::Log { numeric, .. }
            | Expression::Min { numeric, .. }
            | Expression::Max { numeric, .. }
            | Expression::Neg { numeric, .. }
            | Expression::Abs { numeric, .. }
            | Expression::Floor { numeric, .. }
            | Expression::Ceil { numeric, .. }
            | Expression::Round { numeric, .. } => numeric.schema(),

            Expression::Sin { fractional, .. }
            | Expression::Cos { fractional, .. }
            | Expression::Tan { fractional, .. }
            | Expression::Asin { fractional, .. }
            | Expression::Acos { fractional, .. }
            | Expression::Atan { fractional, .. } => fractional.schema(),

            Expression::And { .. }
            | Expression::Or { .. }
            | Expression::Not { .. }
            | Expression::Equal { .. }
            | Expression::LessThanEqual { .. }
            | Expression::OptionContains { .. } => Schema::BOOL,

            Expression::Branch { if_true, .. } => if_true.schema(),
            Expression::Iterate { initial, .. } => initial.schema(),

            Expression::EitherLeft { value, right_schema } => {
                Schema::either(value.schema(), right_schema.clone())
            }
            Expression::EitherRight { left_schema, value } => {
                Schema::either(left_schema.clone(), value.schema())
            }
            Expression::FlatMapEither {
                left_schema,
                right_schema,
                ..
            } => Schema::either(left_schema.clone(), right_schema.clone()),
            Expression::FoldEither { on_left, .. } => on_left.body.schema(),
            Expression::SwapEither { either } => match either.schema().resolved() {
                Schema::Either(left, right) => Schema::either(*right.clone(), *left.clone()),
                _ => Schema::Fail("SwapEither over a non-either expression".to_string()),
            },

            Expression::SomeValue { value } => Schema::option(value.schema()),
            Expression::FoldOption { if_none, .. } => if_none.schema(),
            Expression::ZipOption { left, right } => {
                match (left.schema().resolved(), right.schema().resolved()) {
                    (Schema::Option(a), Schema::Option(b)) => {
                        Schema::option(Schema::pair(*a.clone(), *b.clone()))
                    }
                    _ => Schema::Fail("ZipOption over non-option expressions".to_string()),
                }
            }

            Expression::Try { result } => {
                let success = match result {
                    Ok(expr) => expr.schema(),
                    Err(failure) => failure.success_schema.clone(),
                };
                try_schema(success)
            }

            Expression::Tuple { items } => {
                Schema::tuple_of(items.iter().map(|item| item.schema()).collect())
            }
            Expression::TupleAccess { tuple, index } => {
                let schema = tuple.schema();
                match schema.tuple_leaves().get(*index) {
                    Some(leaf) => (*leaf).clone(),
                    None => Schema::Fail(format!("tuple index {index} out of range")),
                }
            }

            Expression::Cons { list, .. } => list.schema(),
            Expression::UnCons { list } => match list.schema().resolved() {
                Schema::Sequence(elem) => Schema::option(Schema::pair(
                    *elem.clone(),
                    Schema::sequence(*elem.clone()),
                )),
                _ => Schema::Fail("UnCons over a non-list expression".to_string()),
            },
            Expression::Fold { initial, .. } => initial.schema(),

            Expression::InstantFromLong { .. }
            | Expression::InstantFromLongs { .. }
            | Expression::InstantFromMilli { .. }
            | Expression::InstantFromString { .. }
            | Expression::InstantPlusDuration { .. }
            | Expression::InstantMinusDuration { .. }
            | Expression::InstantTruncate { .. } => Schema::INSTANT,

            Expression::DurationFromString { .. }
            | Expression::DurationBetweenInstants { .. }
            | Expression::DurationFromBigDecimal { .. }
            | Expression::DurationFromLong { .. }
            | Expression::DurationFromLongs { .. }
            | Expression::DurationFromAmount { .. }
            | Expression::DurationPlus { .. }
            | Expression::DurationMinus { .. } => Schema::DURATION,

            Expression::InstantToTuple { .. } | Expression::DurationToLongs { .. } => {
                Schema::pair(Schema::LONG, Schema::LONG)
            }
            Expression::DurationToLong { .. } => Schema::LONG,

            Expression::Length { .. } => Schema::INT,

            Expression::Lazy(lazy) => lazy.forced().schema(),
        }
    }

    /// Lift a host value into a literal expression.
    pub fn remote<V: IntoDynamic>(value: V) -> Expression {
        Expression::Literal {
            value: value.into_dynamic(),
            schema: V::schema(),
        }
    }

    /// Literal from an already-built dynamic value and its schema.
    pub fn literal(value: DynamicValue, schema: Schema) -> Expression {
        Expression::Literal { value, schema }
    }

    pub fn variable(name: impl Into<String>, schema: Schema) -> Expression {
        Expression::Variable {
            name: name.into(),
            schema,
        }
    }

    /// The `None` literal of an option over `elem_schema`.
    pub fn none(elem_schema: Schema) -> Expression {
        Expression::Literal {
            value: DynamicValue::NoneValue,
            schema: Schema::option(elem_schema),
        }
    }

    pub fn nested(expr: Expression) -> Expression {
        Expression::Nested {
            expr: Arc::new(expr),
        }
    }

    pub fn lazy(thunk: impl Fn() -> Expression + Send + Sync + 'static) -> Expression {
        Expression::Lazy(Arc::new(LazyExpr::new(thunk)))
    }

    pub fn apply(func: EvaluatedFunction, arg: Expression) -> Expression {
        func.apply(arg)
    }
}

/// Result schema of a `Try`: a two-case enum over failure and success.
pub(crate) fn try_schema(success: Schema) -> Schema {
    let mut cases = indexmap::IndexMap::new();
    cases.insert(
        "Failure".to_string(),
        Schema::Primitive(StandardType::Throwable),
    );
    cases.insert("Success".to_string(), success);
    Schema::Enum {
        name: "Try".to_string(),
        cases,
    }
}

macro_rules! binary_numeric_builder {
    ($name:ident, $variant:ident) => {
        impl Expression {
            pub fn $name(left: Expression, right: Expression, numeric: NumericKind) -> Expression {
                Expression::$variant {
                    numeric,
                    left: Arc::new(left),
                    right: Arc::new(right),
                }
            }
        }
    };
}

binary_numeric_builder!(add, Add);
binary_numeric_builder!(sub, Sub);
binary_numeric_builder!(mul, Mul);
binary_numeric_builder!(div, Div);
binary_numeric_builder!(modulo, Mod);
binary_numeric_builder!(pow, Pow);
binary_numeric_builder!(root, Root);
binary_numeric_builder!(log, Log);
binary_numeric_builder!(min, Min);
binary_numeric_builder!(max, Max);

macro_rules! unary_numeric_builder {
    ($name:ident, $variant:ident) => {
        impl Expression {
            pub fn $name(expr: Expression, numeric: NumericKind) -> Expression {
                Expression::$variant {
                    numeric,
                    expr: Arc::new(expr),
                }
            }
        }
    };
}

unary_numeric_builder!(neg, Neg);
unary_numeric_builder!(abs, Abs);
unary_numeric_builder!(floor, Floor);
unary_numeric_builder!(ceil, Ceil);
unary_numeric_builder!(round, Round);

macro_rules! fractional_builder {
    ($name:ident, $variant:ident) => {
        impl Expression {
            pub fn $name(expr: Expression, fractional: FractionalKind) -> Expression {
                Expression::$variant {
                    fractional,
                    expr: Arc::new(expr),
                }
            }
        }
    };
}

fractional_builder!(sin, Sin);
fractional_builder!(cos, Cos);
fractional_builder!(tan, Tan);
fractional_builder!(asin, Asin);
fractional_builder!(acos, Acos);
fractional_builder!(atan, Atan);

impl Expression {
    pub fn and(left: Expression, right: Expression) -> Expression {
        Expression::And {
            left: Arc::new(left),
            right: Arc::new(right),
        }
    }

    pub fn or(left: Expression, right: Expression) -> Expression {
        Expression::Or {
            left: Arc::new(left),
            right: Arc::new(right),
        }
    }

    pub fn not(expr: Expression) -> Expression {
        Expression::Not {
            expr: Arc::new(expr),
        }
    }

    pub fn equal(left: Expression, right: Expression) -> Expression {
        Expression::Equal {
            left: Arc::new(left),
            right: Arc::new(right),
        }
    }

    pub fn less_than_equal(left: Expression, right: Expression) -> Expression {
        Expression::LessThanEqual {
            left: Arc::new(left),
            right: Arc::new(right),
        }
    }

    pub fn branch(cond: Expression, if_true: Expression, if_false: Expression) -> Expression {
        Expression::Branch {
            cond: Arc::new(cond),
            if_true: Arc::new(if_true),
            if_false: Arc::new(if_false),
        }
    }

    pub fn iterate(
        initial: Expression,
        step: EvaluatedFunction,
        predicate: EvaluatedFunction,
    ) -> Expression {
        Expression::Iterate {
            initial: Arc::new(initial),
            step,
            predicate,
        }
    }

    pub fn either_left(value: Expression, right_schema: Schema) -> Expression {
        Expression::EitherLeft {
            value: Arc::new(value),
            right_schema,
        }
    }

    pub fn either_right(left_schema: Schema, value: Expression) -> Expression {
        Expression::EitherRight {
            left_schema,
            value: Arc::new(value),
        }
    }

    pub fn flat_map_either(
        either: Expression,
        func: EvaluatedFunction,
        left_schema: Schema,
        right_schema: Schema,
    ) -> Expression {
        Expression::FlatMapEither {
            either: Arc::new(either),
            func,
            left_schema,
            right_schema,
        }
    }

    pub fn fold_either(
        either: Expression,
        on_left: EvaluatedFunction,
        on_right: EvaluatedFunction,
    ) -> Expression {
        Expression::FoldEither {
            either: Arc::new(either),
            on_left,
            on_right,
        }
    }

    pub fn swap_either(either: Expression) -> Expression {
        Expression::SwapEither {
            either: Arc::new(either),
        }
    }

    pub fn some_value(value: Expression) -> Expression {
        Expression::SomeValue {
            value: Arc::new(value),
        }
    }

    pub fn fold_option(
        option: Expression,
        if_none: Expression,
        if_some: EvaluatedFunction,
    ) -> Expression {
        Expression::FoldOption {
            option: Arc::new(option),
            if_none: Arc::new(if_none),
            if_some,
        }
    }

    pub fn zip_option(left: Expression, right: Expression) -> Expression {
        Expression::ZipOption {
            left: Arc::new(left),
            right: Arc::new(right),
        }
    }

    pub fn option_contains(option: Expression, value: Expression) -> Expression {
        Expression::OptionContains {
            option: Arc::new(option),
            value: Arc::new(value),
        }
    }

    pub fn try_success(expr: Expression) -> Expression {
        Expression::Try {
            result: Ok(Arc::new(expr)),
        }
    }

    pub fn try_failure(throwable: Expression, success_schema: Schema) -> Expression {
        Expression::Try {
            result: Err(TryFailure {
                throwable: Arc::new(throwable),
                success_schema,
            }),
        }
    }

    /// Tuple expression over an arbitrary component list.
    ///
    /// Arity must be between 2 and 22; the fixed-arity builders below
    /// are correct by construction.
    pub fn tuple_n(items: Vec<Expression>) -> EvalResult<Expression> {
        if items.len() < 2 || items.len() > 22 {
            return Err(EvalError::BadShape(format!(
                "tuple arity {} is outside 2..=22",
                items.len()
            )));
        }
        Ok(Expression::Tuple {
            items: items.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn tuple_access(tuple: Expression, index: usize) -> Expression {
        Expression::TupleAccess {
            tuple: Arc::new(tuple),
            index,
        }
    }

    pub fn cons(list: Expression, head: Expression) -> Expression {
        Expression::Cons {
            list: Arc::new(list),
            head: Arc::new(head),
        }
    }

    pub fn uncons(list: Expression) -> Expression {
        Expression::UnCons {
            list: Arc::new(list),
        }
    }

    pub fn fold(list: Expression, initial: Expression, body: EvaluatedFunction) -> Expression {
        Expression::Fold {
            list: Arc::new(list),
            initial: Arc::new(initial),
            body,
        }
    }

    pub fn length(expr: Expression) -> Expression {
        Expression::Length {
            expr: Arc::new(expr),
        }
    }
}

macro_rules! tuple_builder {
    ($name:ident, $($arg:ident),+) => {
        impl Expression {
            pub fn $name($($arg: Expression),+) -> Expression {
                Expression::Tuple {
                    items: vec![$(Arc::new($arg)),+],
                }
            }
        }
    };
}

tuple_builder!(tuple2, a, b);
tuple_builder!(tuple3, a, b, c);
tuple_builder!(tuple4, a, b, c, d);
tuple_builder!(tuple5, a, b, c, d, e);
tuple_builder!(tuple6, a, b, c, d, e, f);
tuple_builder!(tuple7, a, b, c, d, e, f, g);
tuple_builder!(tuple8, a, b, c, d, e, f, g, h);
tuple_builder!(tuple9, a, b, c, d, e, f, g, h, i);
tuple_builder!(tuple10, a, b, c, d, e, f, g, h, i, j);
tuple_builder!(tuple11, a, b, c, d, e, f, g, h, i, j, k);
tuple_builder!(tuple12, a, b, c, d, e, f, g, h, i, j, k, l);
tuple_builder!(tuple13, a, b, c, d, e, f, g, h, i, j, k, l, m);
tuple_builder!(tuple14, a, b, c, d, e, f, g, h, i, j, k, l, m, n);
tuple_builder!(tuple15, a, b, c, d, e, f, g, h, i, j, k, l, m, n, o);
tuple_builder!(tuple16, a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p);
tuple_builder!(tuple17, a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p, q);
tuple_builder!(tuple18, a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p, q, r);
tuple_builder!(tuple19, a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p, q, r, s);
tuple_builder!(tuple20, a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p, q, r, s, t);
tuple_builder!(tuple21, a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p, q, r, s, t, u);
tuple_builder!(tuple22, a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p, q, r, s, t, u, v);

macro_rules! time_builder {
    ($name:ident, $variant:ident, $($field:ident),+) => {
        impl Expression {
            pub fn $name($($field: Expression),+) -> Expression {
                Expression::$variant {
                    $($field: Arc::new($field)),+
                }
            }
        }
    };
}

time_builder!(instant_from_long, InstantFromLong, seconds);
time_builder!(instant_from_longs, InstantFromLongs, seconds, nanos);
time_builder!(instant_from_milli, InstantFromMilli, millis);
time_builder!(instant_from_string, InstantFromString, value);
time_builder!(instant_to_tuple, InstantToTuple, instant);
time_builder!(instant_plus_duration, InstantPlusDuration, instant, duration);
time_builder!(instant_minus_duration, InstantMinusDuration, instant, duration);
time_builder!(instant_truncate, InstantTruncate, instant, unit);
time_builder!(duration_from_string, DurationFromString, value);
time_builder!(duration_between_instants, DurationBetweenInstants, start, end);
time_builder!(duration_from_big_decimal, DurationFromBigDecimal, seconds);
time_builder!(duration_from_long, DurationFromLong, seconds);
time_builder!(duration_from_longs, DurationFromLongs, seconds, nano_adjustment);
time_builder!(duration_from_amount, DurationFromAmount, amount, unit);
time_builder!(duration_to_longs, DurationToLongs, duration);
time_builder!(duration_to_long, DurationToLong, duration);
time_builder!(duration_plus, DurationPlus, left, right);
time_builder!(duration_minus, DurationMinus, left, right);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_schema_is_carried() {
        let expr = Expression::remote(5i32);
        assert_eq!(expr.schema(), Schema::INT);
    }

    #[test]
    fn tuple_schema_right_nests() {
        let expr = Expression::tuple3(
            Expression::remote("a"),
            Expression::remote(2i32),
            Expression::remote(true),
        );
        assert_eq!(
            expr.schema(),
            Schema::pair(Schema::STRING, Schema::pair(Schema::INT, Schema::BOOL))
        );
    }

    #[test]
    fn tuple_access_schema_picks_leaf() {
        let expr = Expression::tuple_access(
            Expression::tuple3(
                Expression::remote("a"),
                Expression::remote(2i32),
                Expression::remote(true),
            ),
            1,
        );
        assert_eq!(expr.schema(), Schema::INT);
    }

    #[test]
    fn tuple_arity_is_bounded() {
        assert!(Expression::tuple_n(vec![Expression::remote(1i32)]).is_err());
        let items: Vec<Expression> = (0..23).map(|n: i32| Expression::remote(n)).collect();
        assert!(Expression::tuple_n(items).is_err());
    }

    #[test]
    fn either_schemas_carry_the_missing_side() {
        let expr = Expression::either_left(Expression::remote(1i32), Schema::STRING);
        assert_eq!(expr.schema(), Schema::either(Schema::INT, Schema::STRING));

        let swapped = Expression::swap_either(expr);
        assert_eq!(swapped.schema(), Schema::either(Schema::STRING, Schema::INT));
    }

    #[test]
    fn branch_schema_follows_true_arm() {
        let expr = Expression::branch(
            Expression::remote(true),
            Expression::remote(1i64),
            Expression::remote(2i64),
        );
        assert_eq!(expr.schema(), Schema::LONG);
    }

    #[test]
    fn uncons_schema_is_head_and_tail() {
        let expr = Expression::uncons(Expression::remote(vec![1i32, 2, 3]));
        assert_eq!(
            expr.schema(),
            Schema::option(Schema::pair(Schema::INT, Schema::sequence(Schema::INT)))
        );
    }
}
