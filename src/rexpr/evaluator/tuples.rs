use std::sync::Arc;

use super::Evaluator;
use crate::error::{EvalError, EvalResult};
use crate::rexpr::context::RemoteContext;
use crate::rexpr::expr::Expression;
use crate::schema::{DynamicValue, Schema, SchemaAndValue};

impl Evaluator {
    /// Evaluate the components left-to-right and fold them into the
    /// canonical right-nested pair encoding.
    pub(super) fn eval_tuple(
        &self,
        items: &[Arc<Expression>],
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        if items.len() < 2 || items.len() > 22 {
            return Err(EvalError::BadShape(format!(
                "tuple arity {} is outside 2..=22",
                items.len()
            )));
        }
        let mut schemas = Vec::with_capacity(items.len());
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            let result = self.eval_at(item, ctx, depth + 1)?;
            schemas.push(result.schema);
            values.push(result.value);
        }
        Ok(SchemaAndValue::new(
            Schema::tuple_of(schemas),
            DynamicValue::tuple_of(values),
        ))
    }

    /// Descend the right-nested pair tree counting leaves from the left.
    pub(super) fn eval_tuple_access(
        &self,
        tuple: &Expression,
        index: usize,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let result = self.eval_at(tuple, ctx, depth + 1)?;
        let value_leaves = result.value.tuple_leaves();
        let schema_leaves = result.schema.tuple_leaves();
        match (value_leaves.get(index), schema_leaves.get(index)) {
            (Some(value), Some(schema)) => {
                Ok(SchemaAndValue::new((*schema).clone(), (*value).clone()))
            }
            _ => Err(EvalError::IndexOutOfRange(index)),
        }
    }
}
