use super::Evaluator;
use crate::error::EvalResult;
use crate::rexpr::context::RemoteContext;
use crate::rexpr::expr::Expression;
use crate::schema::SchemaAndValue;

impl Evaluator {
    /// `And` short-circuits: a false left operand skips the right.
    pub(super) fn eval_and(
        &self,
        left: &Expression,
        right: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        if !self.eval_bool(left, ctx, depth)? {
            return Ok(self.bool_result(false));
        }
        let rhs = self.eval_bool(right, ctx, depth)?;
        Ok(self.bool_result(rhs))
    }

    /// `Or` short-circuits: a true left operand skips the right.
    pub(super) fn eval_or(
        &self,
        left: &Expression,
        right: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        if self.eval_bool(left, ctx, depth)? {
            return Ok(self.bool_result(true));
        }
        let rhs = self.eval_bool(right, ctx, depth)?;
        Ok(self.bool_result(rhs))
    }

    pub(super) fn eval_not(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let value = self.eval_bool(expr, ctx, depth)?;
        Ok(self.bool_result(!value))
    }
}
