use super::Evaluator;
use crate::error::EvalResult;
use crate::rexpr::context::RemoteContext;
use crate::rexpr::expr::Expression;
use crate::rexpr::numeric::{FractionalKind, FractionalOp, NumericBinOp, NumericKind, NumericUnOp};
use crate::schema::{DynamicValue, SchemaAndValue};

impl Evaluator {
    /// Evaluate a binary operator of the numeric family.
    ///
    /// Both operands must carry the instance's primitive type; the
    /// result schema is the instance's schema.
    pub(super) fn eval_numeric_binary(
        &self,
        kind: NumericKind,
        op: NumericBinOp,
        left: &Expression,
        right: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let lhs = self.eval_primitive(left, ctx, depth)?;
        let rhs = self.eval_primitive(right, ctx, depth)?;
        let value = kind.apply_binary(op, &lhs, &rhs)?;
        Ok(SchemaAndValue::new(
            kind.schema(),
            DynamicValue::Primitive(value),
        ))
    }

    pub(super) fn eval_numeric_unary(
        &self,
        kind: NumericKind,
        op: NumericUnOp,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let operand = self.eval_primitive(expr, ctx, depth)?;
        let value = kind.apply_unary(op, &operand)?;
        Ok(SchemaAndValue::new(
            kind.schema(),
            DynamicValue::Primitive(value),
        ))
    }

    pub(super) fn eval_fractional(
        &self,
        kind: FractionalKind,
        op: FractionalOp,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let operand = self.eval_primitive(expr, ctx, depth)?;
        let value = kind.apply(op, &operand)?;
        Ok(SchemaAndValue::new(
            kind.schema(),
            DynamicValue::Primitive(value),
        ))
    }
}
