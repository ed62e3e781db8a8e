//! Remote expression core
//!
//! This module provides the serializable expression algebra and its
//! evaluator:
//! - Blueprints are immutable trees of operators over schema-tagged
//!   values; they never embed host code
//! - Functions are compiled into `(fresh variable, body)` pairs at
//!   construction, so closures serialize like any other expression
//! - Evaluation reduces a blueprint to a `SchemaAndValue` under a
//!   variable-binding context, with every failure classified

pub mod cancellation;
pub mod codec;
pub mod config;
pub mod context;
pub mod evaluator;
pub mod expr;
pub mod func;
pub mod lazy;
pub mod numeric;

#[cfg(test)]
mod tests;

pub use cancellation::CancellationToken;
pub use config::EvalConfig;
pub use context::{next_fresh_name, InMemoryContext, RemoteContext, SharedContext};
pub use evaluator::Evaluator;
pub use expr::Expression;
pub use func::{fn_remote, EvaluatedFunction};
pub use lazy::LazyExpr;
pub use numeric::{FractionalKind, NumericKind};

use crate::error::EvalResult;
use crate::schema::{FromDynamic, SchemaAndValue};

/// Engine facade combining an evaluator with per-call context handling.
pub struct RemoteEval {
    evaluator: Evaluator,
}

impl RemoteEval {
    /// Create a new engine with default configuration
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    /// Create a new engine with custom configuration
    pub fn with_config(config: EvalConfig) -> Self {
        Self {
            evaluator: Evaluator::new().with_config(config),
        }
    }

    /// Attach a cancellation token to all evaluations run by this engine
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.evaluator = Evaluator::new()
            .with_config(*self.evaluator.config())
            .with_cancellation(token);
        self
    }

    /// Evaluate a closed expression in a fresh in-memory context.
    pub fn evaluate(&self, expr: &Expression) -> EvalResult<SchemaAndValue> {
        let mut ctx = InMemoryContext::new();
        self.evaluator.eval_dynamic(expr, &mut ctx)
    }

    /// Evaluate against a caller-supplied context.
    pub fn evaluate_in(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
    ) -> EvalResult<SchemaAndValue> {
        self.evaluator.eval_dynamic(expr, ctx)
    }

    /// Evaluate and narrow the result into a host value.
    pub fn evaluate_typed<A: FromDynamic>(&self, expr: &Expression) -> EvalResult<A> {
        let mut ctx = InMemoryContext::new();
        self.evaluator.eval_typed(expr, &mut ctx)
    }

    /// Evaluate against a caller-supplied context and narrow the result.
    pub fn evaluate_typed_in<A: FromDynamic>(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
    ) -> EvalResult<A> {
        self.evaluator.eval_typed(expr, ctx)
    }
}

impl Default for RemoteEval {
    fn default() -> Self {
        Self::new()
    }
}
