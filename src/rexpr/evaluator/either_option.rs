use std::sync::Arc;

use super::Evaluator;
use crate::error::{EvalError, EvalResult};
use crate::rexpr::context::RemoteContext;
use crate::rexpr::expr::{try_schema, Expression, TryFailure};
use crate::rexpr::func::EvaluatedFunction;
use crate::schema::{DynamicValue, PrimitiveValue, Schema, SchemaAndValue};

impl Evaluator {
    pub(super) fn eval_either_left(
        &self,
        value: &Expression,
        right_schema: &Schema,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let inner = self.eval_at(value, ctx, depth + 1)?;
        Ok(SchemaAndValue::new(
            Schema::either(inner.schema, right_schema.clone()),
            DynamicValue::left(inner.value),
        ))
    }

    pub(super) fn eval_either_right(
        &self,
        left_schema: &Schema,
        value: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let inner = self.eval_at(value, ctx, depth + 1)?;
        Ok(SchemaAndValue::new(
            Schema::either(left_schema.clone(), inner.schema),
            DynamicValue::right(inner.value),
        ))
    }

    /// A left passes through untouched; a right payload is bound and the
    /// function body must itself produce an either.
    pub(super) fn eval_flat_map_either(
        &self,
        either: &Expression,
        func: &EvaluatedFunction,
        left_schema: &Schema,
        right_schema: &Schema,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let schema = Schema::either(left_schema.clone(), right_schema.clone());
        let value = self.eval_at(either, ctx, depth + 1)?;
        match value.value {
            DynamicValue::Left(inner) => {
                Ok(SchemaAndValue::new(schema, DynamicValue::Left(inner)))
            }
            DynamicValue::Right(inner) => {
                ctx.set_variable(func.input_name.clone(), *inner);
                let mapped = self.eval_at(&func.body, ctx, depth + 1)?;
                match mapped.value {
                    value @ (DynamicValue::Left(_) | DynamicValue::Right(_)) => {
                        Ok(SchemaAndValue::new(schema, value))
                    }
                    other => Err(EvalError::BadShape(format!(
                        "FlatMapEither body produced {}, expected an either",
                        other.kind_name()
                    ))),
                }
            }
            other => Err(EvalError::BadShape(format!(
                "FlatMapEither over {}, expected an either",
                other.kind_name()
            ))),
        }
    }

    /// Apply whichever arm matches the evaluated side.
    pub(super) fn eval_fold_either(
        &self,
        either: &Expression,
        on_left: &EvaluatedFunction,
        on_right: &EvaluatedFunction,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let left_result = on_left.body.schema();
        let right_result = on_right.body.schema();
        if !left_result.is_fail() && !right_result.is_fail() && left_result != right_result {
            return Err(EvalError::type_mismatch(&left_result, &right_result));
        }
        let value = self.eval_at(either, ctx, depth + 1)?;
        match value.value {
            DynamicValue::Left(inner) => {
                ctx.set_variable(on_left.input_name.clone(), *inner);
                self.eval_at(&on_left.body, ctx, depth + 1)
            }
            DynamicValue::Right(inner) => {
                ctx.set_variable(on_right.input_name.clone(), *inner);
                self.eval_at(&on_right.body, ctx, depth + 1)
            }
            other => Err(EvalError::BadShape(format!(
                "FoldEither over {}, expected an either",
                other.kind_name()
            ))),
        }
    }

    pub(super) fn eval_swap_either(
        &self,
        either: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let value = self.eval_at(either, ctx, depth + 1)?;
        let schema = match value.schema.resolved() {
            Schema::Either(left, right) => Schema::either(*right.clone(), *left.clone()),
            other => {
                return Err(EvalError::BadShape(format!(
                    "SwapEither over schema {other}, expected an either"
                )))
            }
        };
        let swapped = match value.value {
            DynamicValue::Left(inner) => DynamicValue::Right(inner),
            DynamicValue::Right(inner) => DynamicValue::Left(inner),
            other => {
                return Err(EvalError::BadShape(format!(
                    "SwapEither over {}, expected an either",
                    other.kind_name()
                )))
            }
        };
        Ok(SchemaAndValue::new(schema, swapped))
    }

    pub(super) fn eval_some(
        &self,
        value: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let inner = self.eval_at(value, ctx, depth + 1)?;
        Ok(SchemaAndValue::new(
            Schema::option(inner.schema),
            DynamicValue::some(inner.value),
        ))
    }

    /// Standard option fold; exactly one arm is evaluated.
    pub(super) fn eval_fold_option(
        &self,
        option: &Expression,
        if_none: &Expression,
        if_some: &EvaluatedFunction,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let none_schema = if_none.schema();
        let some_schema = if_some.body.schema();
        if !none_schema.is_fail() && !some_schema.is_fail() && none_schema != some_schema {
            return Err(EvalError::type_mismatch(&none_schema, &some_schema));
        }
        let value = self.eval_at(option, ctx, depth + 1)?;
        match value.value {
            DynamicValue::NoneValue => self.eval_at(if_none, ctx, depth + 1),
            DynamicValue::SomeValue(inner) => {
                ctx.set_variable(if_some.input_name.clone(), *inner);
                self.eval_at(&if_some.body, ctx, depth + 1)
            }
            other => Err(EvalError::BadShape(format!(
                "FoldOption over {}, expected an option",
                other.kind_name()
            ))),
        }
    }

    /// `Some((a, b))` iff both sides are present, else `None`.
    pub(super) fn eval_zip_option(
        &self,
        left: &Expression,
        right: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let lhs = self.eval_at(left, ctx, depth + 1)?;
        let rhs = self.eval_at(right, ctx, depth + 1)?;
        let (left_elem, right_elem) = match (lhs.schema.resolved(), rhs.schema.resolved()) {
            (Schema::Option(a), Schema::Option(b)) => (*a.clone(), *b.clone()),
            (a, b) => {
                return Err(EvalError::BadShape(format!(
                    "ZipOption over schemas {a} and {b}, expected options"
                )))
            }
        };
        let schema = Schema::option(Schema::pair(left_elem, right_elem));
        let value = match (lhs.value, rhs.value) {
            (DynamicValue::SomeValue(a), DynamicValue::SomeValue(b)) => {
                DynamicValue::some(DynamicValue::Tuple(a, b))
            }
            (DynamicValue::NoneValue, _) | (_, DynamicValue::NoneValue) => DynamicValue::NoneValue,
            (a, b) => {
                return Err(EvalError::BadShape(format!(
                    "ZipOption over {} and {}, expected options",
                    a.kind_name(),
                    b.kind_name()
                )))
            }
        };
        Ok(SchemaAndValue::new(schema, value))
    }

    /// `Some(x)` containing `v` iff `x == v`.
    pub(super) fn eval_option_contains(
        &self,
        option: &Expression,
        value: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let option_value = self.eval_at(option, ctx, depth + 1)?;
        let probe = self.eval_at(value, ctx, depth + 1)?;
        let contained = match option_value.value {
            DynamicValue::SomeValue(inner) => *inner == probe.value,
            DynamicValue::NoneValue => false,
            other => {
                return Err(EvalError::BadShape(format!(
                    "OptionContains over {}, expected an option",
                    other.kind_name()
                )))
            }
        };
        Ok(self.bool_result(contained))
    }

    /// A `Try` evaluates to a `Success`/`Failure` tagged value.
    pub(super) fn eval_try(
        &self,
        result: &Result<Arc<Expression>, TryFailure>,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        match result {
            Ok(expr) => {
                let success = self.eval_at(expr, ctx, depth + 1)?;
                Ok(SchemaAndValue::new(
                    try_schema(success.schema),
                    DynamicValue::Enum {
                        case: "Success".to_string(),
                        value: Box::new(success.value),
                    },
                ))
            }
            Err(TryFailure {
                throwable,
                success_schema,
            }) => {
                let failure = self.eval_at(throwable, ctx, depth + 1)?;
                match failure.value {
                    value @ DynamicValue::Primitive(PrimitiveValue::Throwable(_)) => {
                        Ok(SchemaAndValue::new(
                            try_schema(success_schema.clone()),
                            DynamicValue::Enum {
                                case: "Failure".to_string(),
                                value: Box::new(value),
                            },
                        ))
                    }
                    other => Err(EvalError::BadShape(format!(
                        "Try failure side produced {}, expected a throwable",
                        other.kind_name()
                    ))),
                }
            }
        }
    }
}
