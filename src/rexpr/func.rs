//! Serializable one-argument functions
//!
//! A function value never captures host code: at construction the host
//! closure is applied once to a freshly-named variable, and only the
//! resulting body expression is kept. The pair `(input, body)` is plain
//! data and travels on the wire like any other expression.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::context::next_fresh_name;
use super::expr::Expression;
use crate::schema::Schema;

/// The compiled form of a one-argument function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedFunction {
    pub input_name: String,
    pub input_schema: Schema,
    pub body: Arc<Expression>,
}

impl EvaluatedFunction {
    /// Compile a host closure into a serializable function.
    ///
    /// The closure runs exactly once, against a variable minted from the
    /// process name supply; it is gone by the time this returns.
    pub fn new(input_schema: Schema, f: impl FnOnce(Expression) -> Expression) -> Self {
        let input_name = next_fresh_name();
        let body = f(Expression::Variable {
            name: input_name.clone(),
            schema: input_schema.clone(),
        });
        Self {
            input_name,
            input_schema,
            body: Arc::new(body),
        }
    }

    /// The variable expression the body references.
    pub fn input_variable(&self) -> Expression {
        Expression::Variable {
            name: self.input_name.clone(),
            schema: self.input_schema.clone(),
        }
    }

    /// Apply this function to an argument expression.
    pub fn apply(self, arg: Expression) -> Expression {
        Expression::Apply {
            func: self,
            arg: Arc::new(arg),
        }
    }

    /// Schema of the function's result.
    pub fn result_schema(&self) -> Schema {
        self.body.schema()
    }
}

/// Build a serializable function from a host closure.
///
/// This is the function-builder of the public constructor surface:
/// `fn_remote(s, |x| body(x))` yields an `EvaluatedFunction` whose body
/// references a fresh variable of schema `s`.
pub fn fn_remote(
    input_schema: Schema,
    f: impl FnOnce(Expression) -> Expression,
) -> EvaluatedFunction {
    EvaluatedFunction::new(input_schema, f)
}
