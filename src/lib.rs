//! Remote Eval RS - Serializable expression core for distributed workflows
//!
//! This library implements a remote expression language whose values are
//! blueprints for computations:
//! - Blueprints ship across machines, persist, replay, and evaluate on
//!   any host; they never embed host code
//! - Every value and every expression carries schema information that
//!   drives evaluation, ordering, and the wire encoding
//! - Closures are compiled into fresh-variable/body pairs at
//!   construction, so functions serialize like plain data

pub mod error;
pub mod rexpr;
pub mod schema;

// Re-export main types for convenience
pub use error::{ArithmeticKind, EvalError, EvalResult};
pub use rexpr::{
    fn_remote, CancellationToken, EvalConfig, EvaluatedFunction, Evaluator, Expression,
    FractionalKind, InMemoryContext, NumericKind, RemoteContext, RemoteEval, SharedContext,
};
pub use schema::{
    register_transform, DynamicValue, FromDynamic, IntoDynamic, PrimitiveValue, Schema,
    SchemaAndValue, StandardType, TimeUnit,
};
