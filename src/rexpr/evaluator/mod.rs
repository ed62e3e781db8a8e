//! Expression evaluator
//!
//! ## Design Principles
//! 1. **Structural recursion**: one dispatch over the expression tree,
//!    with operator families implemented in sibling modules
//! 2. **Schema preservation**: every result is a `SchemaAndValue` whose
//!    schema matches the expression's static schema
//! 3. **Classified failures**: everything maps into `EvalError`; the
//!    evaluator is total over well-formed, closed expressions
//!
//! Bindings flow through the [`RemoteContext`]; subexpression results
//! stay local. Evaluation order is strict left-to-right except for the
//! documented short-circuits (`And`, `Or`, `Branch`, the fold arms).

pub mod comparison;
pub mod either_option;
pub mod lists;
pub mod logical;
pub mod numeric_ops;
pub mod time_ops;
pub mod tuples;

use std::sync::Arc;

use super::cancellation::CancellationToken;
use super::config::EvalConfig;
use super::context::RemoteContext;
use super::expr::{Expression, NESTED_TRANSFORM};
use super::func::EvaluatedFunction;
use super::numeric::{FractionalOp, NumericBinOp, NumericUnOp};
use crate::error::{EvalError, EvalResult};
use crate::schema::typed::narrow;
use crate::schema::{DynamicValue, FromDynamic, PrimitiveValue, Schema, SchemaAndValue};

/// Evaluator for remote expressions.
pub struct Evaluator {
    config: EvalConfig,
    cancellation: Option<CancellationToken>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            config: EvalConfig::default(),
            cancellation: None,
        }
    }

    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a cancellation token checked at every expression node.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate an expression to its schema-tagged dynamic result.
    pub fn eval_dynamic(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
    ) -> EvalResult<SchemaAndValue> {
        tracing::debug!(schema = %expr.schema(), "evaluating expression");
        let result = self.eval_at(expr, ctx, 0);
        match &result {
            Ok(out) => tracing::debug!(schema = %out.schema, "evaluation finished"),
            Err(err) => tracing::debug!(%err, "evaluation failed"),
        }
        result
    }

    /// Evaluate and narrow the result into a host value.
    pub fn eval_typed<A: FromDynamic>(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
    ) -> EvalResult<A> {
        let result = self.eval_dynamic(expr, ctx)?;
        narrow(&result.value, &result.schema)
    }

    pub(crate) fn eval_at(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        if depth > self.config.recursion_limit {
            return Err(EvalError::EvaluationFailed(
                "recursion limit exceeded".to_string(),
            ));
        }
        if let Some(token) = &self.cancellation {
            token.check_cancelled()?;
        }

        match expr {
            Expression::Literal { value, schema } => {
                Ok(SchemaAndValue::new(schema.clone(), value.clone()))
            }
            Expression::Ignore => Ok(SchemaAndValue::new(Schema::UNIT, DynamicValue::unit())),
            Expression::Variable { name, schema } => {
                let value = ctx
                    .get_variable(name)
                    .ok_or_else(|| EvalError::Unbound(name.clone()))?;
                Ok(SchemaAndValue::new(schema.clone(), value))
            }
            Expression::Nested { expr } => self.eval_nested(expr),

            Expression::Function { func } => self.eval_at(&func.body, ctx, depth + 1),
            Expression::Apply { func, arg } => self.eval_apply(func, arg, ctx, depth),

            Expression::Add { numeric, left, right } => {
                self.eval_numeric_binary(*numeric, NumericBinOp::Add, left, right, ctx, depth)
            }
            Expression::Sub { numeric, left, right } => {
                self.eval_numeric_binary(*numeric, NumericBinOp::Sub, left, right, ctx, depth)
            }
            Expression::Mul { numeric, left, right } => {
                self.eval_numeric_binary(*numeric, NumericBinOp::Mul, left, right, ctx, depth)
            }
            Expression::Div { numeric, left, right } => {
                self.eval_numeric_binary(*numeric, NumericBinOp::Div, left, right, ctx, depth)
            }
            Expression::Mod { numeric, left, right } => {
                self.eval_numeric_binary(*numeric, NumericBinOp::Mod, left, right, ctx, depth)
            }
            Expression::Pow { numeric, left, right } => {
                self.eval_numeric_binary(*numeric, NumericBinOp::Pow, left, right, ctx, depth)
            }
            Expression::Root { numeric, left, right } => {
                self.eval_numeric_binary(*numeric, NumericBinOp::Root, left, right, ctx, depth)
            }
            Expression::Log { numeric, left, right } => {
                self.eval_numeric_binary(*numeric, NumericBinOp::Log, left, right, ctx, depth)
            }
            Expression::Min { numeric, left, right } => {
                self.eval_numeric_binary(*numeric, NumericBinOp::Min, left, right, ctx, depth)
            }
            Expression::Max { numeric, left, right } => {
                self.eval_numeric_binary(*numeric, NumericBinOp::Max, left, right, ctx, depth)
            }
            Expression::Neg { numeric, expr } => {
                self.eval_numeric_unary(*numeric, NumericUnOp::Neg, expr, ctx, depth)
            }
            Expression::Abs { numeric, expr } => {
                self.eval_numeric_unary(*numeric, NumericUnOp::Abs, expr, ctx, depth)
            }
            Expression::Floor { numeric, expr } => {
                self.eval_numeric_unary(*numeric, NumericUnOp::Floor, expr, ctx, depth)
            }
            Expression::Ceil { numeric, expr } => {
                self.eval_numeric_unary(*numeric, NumericUnOp::Ceil, expr, ctx, depth)
            }
            Expression::Round { numeric, expr } => {
                self.eval_numeric_unary(*numeric, NumericUnOp::Round, expr, ctx, depth)
            }

            Expression::Sin { fractional, expr } => {
                self.eval_fractional(*fractional, FractionalOp::Sin, expr, ctx, depth)
            }
            Expression::Cos { fractional, expr } => {
                self.eval_fractional(*fractional, FractionalOp::Cos, expr, ctx, depth)
            }
            Expression::Tan { fractional, expr } => {
                self.eval_fractional(*fractional, FractionalOp::Tan, expr, ctx, depth)
            }
            Expression::Asin { fractional, expr } => {
                self.eval_fractional(*fractional, FractionalOp::Asin, expr, ctx, depth)
            }
            Expression::Acos { fractional, expr } => {
                self.eval_fractional(*fractional, FractionalOp::Acos, expr, ctx, depth)
            }
            Expression::Atan { fractional, expr } => {
                self.eval_fractional(*fractional, FractionalOp::Atan, expr, ctx, depth)
            }

            Expression::And { left, right } => self.eval_and(left, right, ctx, depth),
            Expression::Or { left, right } => self.eval_or(left, right, ctx, depth),
            Expression::Not { expr } => self.eval_not(expr, ctx, depth),

            Expression::Equal { left, right } => self.eval_equal(left, right, ctx, depth),
            Expression::LessThanEqual { left, right } => {
                self.eval_less_than_equal(left, right, ctx, depth)
            }

            Expression::Branch {
                cond,
                if_true,
                if_false,
            } => self.eval_branch(cond, if_true, if_false, ctx, depth),
            Expression::Iterate {
                initial,
                step,
                predicate,
            } => self.eval_iterate(initial, step, predicate, ctx, depth),

            Expression::EitherLeft { value, right_schema } => {
                self.eval_either_left(value, right_schema, ctx, depth)
            }
            Expression::EitherRight { left_schema, value } => {
                self.eval_either_right(left_schema, value, ctx, depth)
            }
            Expression::FlatMapEither {
                either,
                func,
                left_schema,
                right_schema,
            } => self.eval_flat_map_either(either, func, left_schema, right_schema, ctx, depth),
            Expression::FoldEither {
                either,
                on_left,
                on_right,
            } => self.eval_fold_either(either, on_left, on_right, ctx, depth),
            Expression::SwapEither { either } => self.eval_swap_either(either, ctx, depth),

            Expression::SomeValue { value } => self.eval_some(value, ctx, depth),
            Expression::FoldOption {
                option,
                if_none,
                if_some,
            } => self.eval_fold_option(option, if_none, if_some, ctx, depth),
            Expression::ZipOption { left, right } => self.eval_zip_option(left, right, ctx, depth),
            Expression::OptionContains { option, value } => {
                self.eval_option_contains(option, value, ctx, depth)
            }

            Expression::Try { result } => self.eval_try(result, ctx, depth),

            Expression::Tuple { items } => self.eval_tuple(items, ctx, depth),
            Expression::TupleAccess { tuple, index } => {
                self.eval_tuple_access(tuple, *index, ctx, depth)
            }

            Expression::Cons { list, head } => self.eval_cons(list, head, ctx, depth),
            Expression::UnCons { list } => self.eval_uncons(list, ctx, depth),
            Expression::Fold {
                list,
                initial,
                body,
            } => self.eval_list_fold(list, initial, body, ctx, depth),

            Expression::InstantFromLong { seconds } => {
                self.eval_instant_from_long(seconds, ctx, depth)
            }
            Expression::InstantFromLongs { seconds, nanos } => {
                self.eval_instant_from_longs(seconds, nanos, ctx, depth)
            }
            Expression::InstantFromMilli { millis } => {
                self.eval_instant_from_milli(millis, ctx, depth)
            }
            Expression::InstantFromString { value } => {
                self.eval_instant_from_string(value, ctx, depth)
            }
            Expression::InstantToTuple { instant } => {
                self.eval_instant_to_tuple(instant, ctx, depth)
            }
            Expression::InstantPlusDuration { instant, duration } => {
                self.eval_instant_shift(instant, duration, true, ctx, depth)
            }
            Expression::InstantMinusDuration { instant, duration } => {
                self.eval_instant_shift(instant, duration, false, ctx, depth)
            }
            Expression::InstantTruncate { instant, unit } => {
                self.eval_instant_truncate(instant, unit, ctx, depth)
            }
            Expression::DurationFromString { value } => {
                self.eval_duration_from_string(value, ctx, depth)
            }
            Expression::DurationBetweenInstants { start, end } => {
                self.eval_duration_between(start, end, ctx, depth)
            }
            Expression::DurationFromBigDecimal { seconds } => {
                self.eval_duration_from_big_decimal(seconds, ctx, depth)
            }
            Expression::DurationFromLong { seconds } => {
                self.eval_duration_from_long(seconds, ctx, depth)
            }
            Expression::DurationFromLongs {
                seconds,
                nano_adjustment,
            } => self.eval_duration_from_longs(seconds, nano_adjustment, ctx, depth),
            Expression::DurationFromAmount { amount, unit } => {
                self.eval_duration_from_amount(amount, unit, ctx, depth)
            }
            Expression::DurationToLongs { duration } => {
                self.eval_duration_to_longs(duration, ctx, depth)
            }
            Expression::DurationToLong { duration } => {
                self.eval_duration_to_long(duration, ctx, depth)
            }
            Expression::DurationPlus { left, right } => {
                self.eval_duration_combine(left, right, true, ctx, depth)
            }
            Expression::DurationMinus { left, right } => {
                self.eval_duration_combine(left, right, false, ctx, depth)
            }

            Expression::Length { expr } => self.eval_length(expr, ctx, depth),

            Expression::Lazy(lazy) => self.eval_at(lazy.forced(), ctx, depth + 1),
        }
    }

    /// Evaluate the argument, bind it to the function's input, then
    /// evaluate the body.
    fn eval_apply(
        &self,
        func: &EvaluatedFunction,
        arg: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let arg_schema = arg.schema();
        if !arg_schema.is_fail() && !func.input_schema.is_fail() && arg_schema != func.input_schema {
            return Err(EvalError::type_mismatch(&func.input_schema, &arg_schema));
        }
        let arg_value = self.eval_at(arg, ctx, depth + 1)?;
        ctx.set_variable(func.input_name.clone(), arg_value.value);
        self.eval_at(&func.body, ctx, depth + 1)
    }

    /// Evaluate exactly one arm; the schemas of both arms must agree.
    fn eval_branch(
        &self,
        cond: &Expression,
        if_true: &Expression,
        if_false: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let true_schema = if_true.schema();
        let false_schema = if_false.schema();
        if !true_schema.is_fail() && !false_schema.is_fail() && true_schema != false_schema {
            return Err(EvalError::type_mismatch(&true_schema, &false_schema));
        }
        if self.eval_bool(cond, ctx, depth)? {
            self.eval_at(if_true, ctx, depth + 1)
        } else {
            self.eval_at(if_false, ctx, depth + 1)
        }
    }

    /// Imperative tail loop: `x = initial; while pred(x) { x = step(x) }`.
    fn eval_iterate(
        &self,
        initial: &Expression,
        step: &EvaluatedFunction,
        predicate: &EvaluatedFunction,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let mut current = self.eval_at(initial, ctx, depth + 1)?;
        let mut steps: u64 = 0;
        loop {
            if let Some(token) = &self.cancellation {
                token.check_cancelled()?;
            }
            ctx.set_variable(predicate.input_name.clone(), current.value.clone());
            if !self.eval_bool(&predicate.body, ctx, depth)? {
                tracing::debug!(steps, "iteration converged");
                return Ok(current);
            }
            ctx.set_variable(step.input_name.clone(), current.value.clone());
            current = self.eval_at(&step.body, ctx, depth + 1)?;
            steps += 1;
            if let Some(limit) = self.config.iteration_limit {
                if steps >= limit {
                    return Err(EvalError::IterationDiverged(steps));
                }
            }
        }
    }

    /// A nested blueprint evaluates to its own encoding, carried as a
    /// string under the reserved `expression` transform schema.
    fn eval_nested(&self, expr: &Arc<Expression>) -> EvalResult<SchemaAndValue> {
        let encoded = serde_json::to_string(expr.as_ref())
            .map_err(|e| EvalError::EvaluationFailed(format!("nested encoding failed: {e}")))?;
        Ok(SchemaAndValue::new(
            Schema::Transform {
                name: NESTED_TRANSFORM.to_string(),
                inner: Box::new(Schema::STRING),
            },
            DynamicValue::string(encoded),
        ))
    }

    fn eval_length(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let value = self.eval_at(expr, ctx, depth + 1)?;
        match value.value {
            DynamicValue::Primitive(PrimitiveValue::String(s)) => Ok(SchemaAndValue::new(
                Schema::INT,
                DynamicValue::int(s.chars().count() as i32),
            )),
            other => Err(EvalError::type_mismatch("String", other.kind_name())),
        }
    }

    /// Evaluate a subexpression down to a primitive payload.
    pub(super) fn eval_primitive(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<PrimitiveValue> {
        let result = self.eval_at(expr, ctx, depth + 1)?;
        match result.value {
            DynamicValue::Primitive(p) => Ok(p),
            other => Err(EvalError::BadShape(format!(
                "expected a primitive value, got {}",
                other.kind_name()
            ))),
        }
    }

    /// Evaluate a subexpression down to a boolean.
    pub(super) fn eval_bool(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<bool> {
        let result = self.eval_at(expr, ctx, depth + 1)?;
        result
            .value
            .as_bool()
            .ok_or_else(|| EvalError::type_mismatch("Bool", result.value.kind_name()))
    }

    pub(super) fn bool_result(&self, value: bool) -> SchemaAndValue {
        SchemaAndValue::new(Schema::BOOL, DynamicValue::bool(value))
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
