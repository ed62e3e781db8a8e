//! Deferred expression construction
//!
//! `Lazy` is the one mechanism for building finite representations of
//! self-referential expressions: the thunk runs at most once per
//! expression instance, and the forced body is what equality, schema
//! queries and serialization observe. Decoded blueprints arrive already
//! forced.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::expr::Expression;

type Thunk = Box<dyn Fn() -> Expression + Send + Sync>;

/// A deferred subexpression, forced at most once.
pub struct LazyExpr {
    cell: OnceCell<Expression>,
    // Invariant: `thunk` is `None` only when `cell` is already filled.
    thunk: Option<Thunk>,
}

impl LazyExpr {
    pub fn new(thunk: impl Fn() -> Expression + Send + Sync + 'static) -> Self {
        Self {
            cell: OnceCell::new(),
            thunk: Some(Box::new(thunk)),
        }
    }

    /// Wrap an already-constructed expression (the decoded form).
    pub fn from_expression(expr: Expression) -> Self {
        Self {
            cell: OnceCell::with_value(expr),
            thunk: None,
        }
    }

    /// Force the thunk, caching the result for this instance.
    pub fn forced(&self) -> &Expression {
        self.cell.get_or_init(|| match &self.thunk {
            Some(f) => f(),
            None => Expression::Ignore,
        })
    }
}

impl std::fmt::Debug for LazyExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cell.get() {
            Some(expr) => f.debug_tuple("LazyExpr").field(expr).finish(),
            None => f.write_str("LazyExpr(<deferred>)"),
        }
    }
}

impl PartialEq for LazyExpr {
    fn eq(&self, other: &Self) -> bool {
        self.forced() == other.forced()
    }
}

impl Serialize for LazyExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.forced().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LazyExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Expression::deserialize(deserializer).map(LazyExpr::from_expression)
    }
}
