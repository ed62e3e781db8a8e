//! Named schema transforms
//!
//! A `Schema::Transform` layers a semantic bijection over its inner
//! schema. The functions themselves never travel on the wire: only the
//! transform's name is serialized, and the receiving process re-resolves
//! the functions from this registry before narrowing. Registration is
//! process-wide and idempotent per name (last registration wins).

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use super::DynamicValue;
use crate::error::EvalResult;

type TransformFn = Arc<dyn Fn(DynamicValue) -> EvalResult<DynamicValue> + Send + Sync>;

/// The two directions of a registered bijection.
///
/// `wrap` lifts an inner-schema value into the transformed reading;
/// `unwrap` undoes it. Both operate on dynamic values so the registry
/// stays independent of host types.
#[derive(Clone)]
pub struct SchemaTransform {
    pub wrap: TransformFn,
    pub unwrap: TransformFn,
}

impl std::fmt::Debug for SchemaTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaTransform").finish_non_exhaustive()
    }
}

static REGISTRY: Lazy<DashMap<String, SchemaTransform>> = Lazy::new(DashMap::new);

/// Register the bijection behind a transform name.
pub fn register_transform<W, U>(name: impl Into<String>, wrap: W, unwrap: U)
where
    W: Fn(DynamicValue) -> EvalResult<DynamicValue> + Send + Sync + 'static,
    U: Fn(DynamicValue) -> EvalResult<DynamicValue> + Send + Sync + 'static,
{
    let name = name.into();
    tracing::debug!(transform = %name, "registering schema transform");
    REGISTRY.insert(
        name,
        SchemaTransform {
            wrap: Arc::new(wrap),
            unwrap: Arc::new(unwrap),
        },
    );
}

/// Resolve a transform by name, if the process has registered one.
pub fn lookup_transform(name: &str) -> Option<SchemaTransform> {
    REGISTRY.get(name).map(|entry| entry.value().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PrimitiveValue;

    #[test]
    fn registered_transform_resolves_by_name() {
        register_transform(
            "negated-int-test",
            |value| match value {
                DynamicValue::Primitive(PrimitiveValue::Int(n)) => Ok(DynamicValue::int(-n)),
                other => Ok(other),
            },
            |value| match value {
                DynamicValue::Primitive(PrimitiveValue::Int(n)) => Ok(DynamicValue::int(-n)),
                other => Ok(other),
            },
        );

        let transform = lookup_transform("negated-int-test").unwrap();
        let wrapped = (transform.wrap)(DynamicValue::int(3)).unwrap();
        assert_eq!(wrapped, DynamicValue::int(-3));
        let unwrapped = (transform.unwrap)(wrapped).unwrap();
        assert_eq!(unwrapped, DynamicValue::int(3));
    }

    #[test]
    fn unknown_transform_is_absent() {
        assert!(lookup_transform("never-registered").is_none());
    }
}
