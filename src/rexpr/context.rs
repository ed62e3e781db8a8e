//! Variable-binding contexts
//!
//! A [`RemoteContext`] is the one stateful service an evaluation
//! depends on: a name-to-value mapping plus access to the process-wide
//! fresh-name supply. One context is owned by one evaluation at a time;
//! sibling evaluations use independent contexts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use dashmap::DashMap;

use crate::schema::DynamicValue;

static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Mint a process-unique variable name.
///
/// Names are never reused within a process lifetime, which is what
/// makes compiled closures safe to nest and re-apply.
pub fn next_fresh_name() -> String {
    let n = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("$v_{n}")
}

/// Binding service consumed by the evaluator.
pub trait RemoteContext {
    /// Look up a binding; an absent name is not an error at this level.
    fn get_variable(&self, name: &str) -> Option<DynamicValue>;

    /// Store or overwrite a binding. Each call is atomic per binding.
    fn set_variable(&mut self, name: String, value: DynamicValue);

    /// Mint a fresh variable name from the process supply.
    fn fresh_name(&mut self) -> String {
        next_fresh_name()
    }
}

/// Plain in-memory context for a single evaluation.
#[derive(Debug, Default)]
pub struct InMemoryContext {
    bindings: AHashMap<String, DynamicValue>,
}

impl InMemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl RemoteContext for InMemoryContext {
    fn get_variable(&self, name: &str) -> Option<DynamicValue> {
        let value = self.bindings.get(name).cloned();
        tracing::trace!(variable = name, found = value.is_some(), "context read");
        value
    }

    fn set_variable(&mut self, name: String, value: DynamicValue) {
        tracing::trace!(variable = %name, "context write");
        self.bindings.insert(name, value);
    }
}

/// Clone-shareable context backed by a concurrent map.
///
/// Models the externalized key-value store used by an orchestrator to
/// persist bindings: clones see each other's writes. The evaluator
/// itself still drives one evaluation per context at a time.
#[derive(Debug, Clone, Default)]
pub struct SharedContext {
    bindings: Arc<DashMap<String, DynamicValue>>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RemoteContext for SharedContext {
    fn get_variable(&self, name: &str) -> Option<DynamicValue> {
        let value = self.bindings.get(name).map(|entry| entry.value().clone());
        tracing::trace!(variable = name, found = value.is_some(), "shared context read");
        value
    }

    fn set_variable(&mut self, name: String, value: DynamicValue) {
        tracing::trace!(variable = %name, "shared context write");
        self.bindings.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_store_and_overwrite() {
        let mut ctx = InMemoryContext::new();
        assert!(ctx.get_variable("x").is_none());

        ctx.set_variable("x".to_string(), DynamicValue::int(1));
        assert_eq!(ctx.get_variable("x"), Some(DynamicValue::int(1)));

        ctx.set_variable("x".to_string(), DynamicValue::int(2));
        assert_eq!(ctx.get_variable("x"), Some(DynamicValue::int(2)));
    }

    #[test]
    fn fresh_names_are_unique_across_contexts() {
        let mut a = InMemoryContext::new();
        let mut b = InMemoryContext::new();
        let mut names: Vec<String> = Vec::new();
        for _ in 0..16 {
            names.push(a.fresh_name());
            names.push(b.fresh_name());
        }
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
        assert!(names.iter().all(|n| n.starts_with("$v_")));
    }

    #[test]
    fn shared_context_clones_see_writes() {
        let mut original = SharedContext::new();
        let clone = original.clone();
        original.set_variable("shared".to_string(), DynamicValue::bool(true));
        assert_eq!(clone.get_variable("shared"), Some(DynamicValue::bool(true)));
    }
}
