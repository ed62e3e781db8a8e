use super::Evaluator;
use crate::error::{EvalError, EvalResult};
use crate::rexpr::context::RemoteContext;
use crate::rexpr::expr::Expression;
use crate::rexpr::func::EvaluatedFunction;
use crate::schema::{DynamicValue, Schema, SchemaAndValue};

impl Evaluator {
    fn eval_sequence(
        &self,
        list: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<(Schema, Vec<DynamicValue>)> {
        let result = self.eval_at(list, ctx, depth + 1)?;
        match result.value {
            DynamicValue::Sequence(items) => Ok((result.schema, items)),
            other => Err(EvalError::BadShape(format!(
                "expected a list, got {}",
                other.kind_name()
            ))),
        }
    }

    /// Prepend `head` to the list. The head is the second operand.
    pub(super) fn eval_cons(
        &self,
        list: &Expression,
        head: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let (schema, mut items) = self.eval_sequence(list, ctx, depth)?;
        let head = self.eval_at(head, ctx, depth + 1)?;
        items.insert(0, head.value);
        Ok(SchemaAndValue::new(schema, DynamicValue::Sequence(items)))
    }

    /// `Some((head, tail))` for a non-empty list, else `None`.
    pub(super) fn eval_uncons(
        &self,
        list: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let (schema, mut items) = self.eval_sequence(list, ctx, depth)?;
        let elem = match schema.resolved() {
            Schema::Sequence(elem) => *elem.clone(),
            other => {
                return Err(EvalError::BadShape(format!(
                    "UnCons over schema {other}, expected a list"
                )))
            }
        };
        let result_schema = Schema::option(Schema::pair(
            elem.clone(),
            Schema::sequence(elem),
        ));
        let value = if items.is_empty() {
            DynamicValue::NoneValue
        } else {
            let head = items.remove(0);
            DynamicValue::some(DynamicValue::pair(head, DynamicValue::Sequence(items)))
        };
        Ok(SchemaAndValue::new(result_schema, value))
    }

    /// Left fold: the body receives `(accumulator, element)` as a pair.
    ///
    /// The loop is imperative, so accumulating over a long list does not
    /// grow the evaluation stack.
    pub(super) fn eval_list_fold(
        &self,
        list: &Expression,
        initial: &Expression,
        body: &EvaluatedFunction,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let (_, items) = self.eval_sequence(list, ctx, depth)?;
        let initial = self.eval_at(initial, ctx, depth + 1)?;
        let acc_schema = initial.schema;
        let mut acc_value = initial.value;
        for item in items {
            if let Some(token) = &self.cancellation {
                token.check_cancelled()?;
            }
            ctx.set_variable(
                body.input_name.clone(),
                DynamicValue::pair(acc_value, item),
            );
            acc_value = self.eval_at(&body.body, ctx, depth + 1)?.value;
        }
        Ok(SchemaAndValue::new(acc_schema, acc_value))
    }
}
