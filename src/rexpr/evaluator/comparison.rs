use super::Evaluator;
use crate::error::{EvalError, EvalResult};
use crate::rexpr::context::RemoteContext;
use crate::rexpr::expr::Expression;
use crate::schema::{ordering, SchemaAndValue};

impl Evaluator {
    /// Equality is value equality under structurally equal schemas;
    /// mismatched schemas compare as unequal, not as an error.
    pub(super) fn eval_equal(
        &self,
        left: &Expression,
        right: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let lhs = self.eval_at(left, ctx, depth + 1)?;
        let rhs = self.eval_at(right, ctx, depth + 1)?;
        let equal = lhs.schema == rhs.schema && lhs.value == rhs.value;
        Ok(self.bool_result(equal))
    }

    /// Ordering comparison under the schema's default total order;
    /// mismatched schemas are a type error here.
    pub(super) fn eval_less_than_equal(
        &self,
        left: &Expression,
        right: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let lhs = self.eval_at(left, ctx, depth + 1)?;
        let rhs = self.eval_at(right, ctx, depth + 1)?;
        if lhs.schema != rhs.schema {
            return Err(EvalError::type_mismatch(&lhs.schema, &rhs.schema));
        }
        let ordering = ordering::compare(&lhs.schema, &lhs.value, &rhs.value).ok_or_else(|| {
            EvalError::BadShape(format!(
                "values of schema {} admit no ordering",
                lhs.schema
            ))
        })?;
        Ok(self.bool_result(ordering != std::cmp::Ordering::Greater))
    }
}
