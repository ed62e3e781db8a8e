//! Schema model for remote values
//!
//! A [`Schema`] describes the shape of a value independently of any host
//! type. Schemas drive three things in the core:
//! - well-formedness checks of [`DynamicValue`](crate::schema::DynamicValue) trees
//! - the default total ordering used by comparison operators
//! - the wire encoding of values and of schemas themselves (the schema
//!   tree is itself serializable, so expressions can carry it)

pub mod dynamic;
pub mod ordering;
pub mod transform;
pub mod typed;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use dynamic::{check_value, DynamicValue, PrimitiveValue, SchemaAndValue};
pub use transform::{lookup_transform, register_transform, SchemaTransform};
pub use typed::{FromDynamic, IntoDynamic};

/// Closed set of primitive type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardType {
    Unit,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    BigInt,
    Float,
    Double,
    BigDecimal,
    Char,
    String,
    Instant,
    Duration,
    TimeUnit,
    Throwable,
    Uri,
}

impl std::fmt::Display for StandardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Units of time, mirroring the closed set carried by temporal operators.
///
/// Units up to `Days` have an exact duration and are accepted by
/// `DurationFromAmount` and `InstantTruncate`; coarser units are
/// estimated and rejected by those operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Nanos,
    Micros,
    Millis,
    Seconds,
    Minutes,
    Hours,
    HalfDays,
    Days,
    Weeks,
    Months,
    Years,
    Decades,
    Centuries,
    Millennia,
    Eras,
    Forever,
}

impl TimeUnit {
    /// Exact span of one unit, when the unit has one.
    pub fn exact_delta(&self) -> Option<chrono::TimeDelta> {
        use chrono::TimeDelta;
        match self {
            TimeUnit::Nanos => Some(TimeDelta::nanoseconds(1)),
            TimeUnit::Micros => Some(TimeDelta::microseconds(1)),
            TimeUnit::Millis => Some(TimeDelta::milliseconds(1)),
            TimeUnit::Seconds => Some(TimeDelta::seconds(1)),
            TimeUnit::Minutes => Some(TimeDelta::minutes(1)),
            TimeUnit::Hours => Some(TimeDelta::hours(1)),
            TimeUnit::HalfDays => Some(TimeDelta::hours(12)),
            TimeUnit::Days => Some(TimeDelta::hours(24)),
            _ => None,
        }
    }
}

/// Structural description of a value's shape.
///
/// Tuples of arity above two are right-nested pairs; `Transform` layers
/// a named, registry-resolved bijection over its inner schema without
/// changing the wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Schema {
    Primitive(StandardType),
    Option(Box<Schema>),
    Either(Box<Schema>, Box<Schema>),
    Tuple(Box<Schema>, Box<Schema>),
    Sequence(Box<Schema>),
    Map(Box<Schema>, Box<Schema>),
    Set(Box<Schema>),
    Record {
        name: String,
        fields: IndexMap<String, Schema>,
    },
    Enum {
        name: String,
        cases: IndexMap<String, Schema>,
    },
    Transform {
        name: String,
        inner: Box<Schema>,
    },
    Fail(String),
}

impl Schema {
    pub const UNIT: Schema = Schema::Primitive(StandardType::Unit);
    pub const BOOL: Schema = Schema::Primitive(StandardType::Bool);
    pub const INT: Schema = Schema::Primitive(StandardType::Int);
    pub const LONG: Schema = Schema::Primitive(StandardType::Long);
    pub const STRING: Schema = Schema::Primitive(StandardType::String);
    pub const INSTANT: Schema = Schema::Primitive(StandardType::Instant);
    pub const DURATION: Schema = Schema::Primitive(StandardType::Duration);

    pub fn option(inner: Schema) -> Schema {
        Schema::Option(Box::new(inner))
    }

    pub fn either(left: Schema, right: Schema) -> Schema {
        Schema::Either(Box::new(left), Box::new(right))
    }

    pub fn pair(first: Schema, second: Schema) -> Schema {
        Schema::Tuple(Box::new(first), Box::new(second))
    }

    pub fn sequence(elem: Schema) -> Schema {
        Schema::Sequence(Box::new(elem))
    }

    /// Canonical right-nested tuple schema over two or more components.
    ///
    /// `tuple_of([a, b, c])` is `Tuple(a, Tuple(b, c))`. A single
    /// component collapses to itself; an empty list has no shape and
    /// yields `Fail`.
    pub fn tuple_of(components: Vec<Schema>) -> Schema {
        let mut iter = components.into_iter().rev();
        match iter.next() {
            None => Schema::Fail("empty tuple".to_string()),
            Some(last) => iter.fold(last, |acc, s| Schema::pair(s, acc)),
        }
    }

    /// Strip `Transform` layers down to the underlying structural schema.
    pub fn resolved(&self) -> &Schema {
        let mut schema = self;
        while let Schema::Transform { inner, .. } = schema {
            schema = inner;
        }
        schema
    }

    /// Leaves of the right-nested pair tree, counted from the left.
    ///
    /// For non-tuple schemas the schema itself is the single leaf.
    pub fn tuple_leaves(&self) -> Vec<&Schema> {
        let mut leaves = Vec::new();
        collect_schema_leaves(self.resolved(), &mut leaves);
        leaves
    }

    /// Whether this schema is the `Fail` sentinel.
    pub fn is_fail(&self) -> bool {
        matches!(self.resolved(), Schema::Fail(_))
    }
}

fn collect_schema_leaves<'a>(schema: &'a Schema, out: &mut Vec<&'a Schema>) {
    match schema.resolved() {
        Schema::Tuple(a, b) => {
            collect_schema_leaves(a, out);
            collect_schema_leaves(b, out);
        }
        other => out.push(other),
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Schema::Primitive(t) => write!(f, "{t}"),
            Schema::Option(inner) => write!(f, "Option<{inner}>"),
            Schema::Either(l, r) => write!(f, "Either<{l}, {r}>"),
            Schema::Tuple(a, b) => write!(f, "({a}, {b})"),
            Schema::Sequence(e) => write!(f, "List<{e}>"),
            Schema::Map(k, v) => write!(f, "Map<{k}, {v}>"),
            Schema::Set(e) => write!(f, "Set<{e}>"),
            Schema::Record { name, .. } => write!(f, "record {name}"),
            Schema::Enum { name, .. } => write!(f, "enum {name}"),
            Schema::Transform { name, inner } => write!(f, "{name}({inner})"),
            Schema::Fail(msg) => write!(f, "<no schema: {msg}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_of_right_nests() {
        let schema = Schema::tuple_of(vec![Schema::INT, Schema::BOOL, Schema::STRING]);
        assert_eq!(
            schema,
            Schema::pair(Schema::INT, Schema::pair(Schema::BOOL, Schema::STRING))
        );
        assert_eq!(schema.tuple_leaves().len(), 3);
    }

    #[test]
    fn resolved_strips_transform_layers() {
        let schema = Schema::Transform {
            name: "wrapper".to_string(),
            inner: Box::new(Schema::Transform {
                name: "inner-wrapper".to_string(),
                inner: Box::new(Schema::INT),
            }),
        };
        assert_eq!(schema.resolved(), &Schema::INT);
    }

    #[test]
    fn structural_equality_ignores_nothing_but_shape() {
        let a = Schema::either(Schema::INT, Schema::STRING);
        let b = Schema::either(Schema::INT, Schema::STRING);
        let c = Schema::either(Schema::STRING, Schema::INT);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_is_compact() {
        let schema = Schema::option(Schema::pair(Schema::INT, Schema::STRING));
        assert_eq!(schema.to_string(), "Option<(Int, String)>");
    }
}
