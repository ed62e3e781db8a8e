//! Schema-tagged runtime values
//!
//! [`DynamicValue`] is the shape-compatible mirror of [`Schema`] and the
//! carrier of every evaluation result. A value is well-formed against a
//! schema when its tree matches the schema tree after stripping
//! `Transform` layers; [`check_value`] enforces that.

use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Schema, StandardType, TimeUnit};
use crate::error::{EvalError, EvalResult};

/// Serde representation for `chrono::TimeDelta` as a `(seconds, nanos)` pair.
mod serde_duration {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(delta: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seconds = delta.num_seconds();
        let mut nanos = delta.subsec_nanos();
        if nanos < 0 {
            seconds -= 1;
            nanos += 1_000_000_000;
        }
        (seconds, nanos).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let (seconds, nanos) = <(i64, i32)>::deserialize(deserializer)?;
        TimeDelta::new(seconds, nanos as u32)
            .ok_or_else(|| serde::de::Error::custom("duration out of range"))
    }
}

/// A primitive payload paired (implicitly) with its [`StandardType`] tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveValue {
    Unit,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    BigInt(BigInt),
    Float(f32),
    Double(f64),
    BigDecimal(Decimal),
    Char(char),
    String(String),
    Instant(DateTime<Utc>),
    Duration(#[serde(with = "serde_duration")] TimeDelta),
    TimeUnit(TimeUnit),
    Throwable(String),
    Uri(String),
}

impl PrimitiveValue {
    /// The tag this payload carries.
    pub fn standard_type(&self) -> StandardType {
        match self {
            PrimitiveValue::Unit => StandardType::Unit,
            PrimitiveValue::Bool(_) => StandardType::Bool,
            PrimitiveValue::Byte(_) => StandardType::Byte,
            PrimitiveValue::Short(_) => StandardType::Short,
            PrimitiveValue::Int(_) => StandardType::Int,
            PrimitiveValue::Long(_) => StandardType::Long,
            PrimitiveValue::BigInt(_) => StandardType::BigInt,
            PrimitiveValue::Float(_) => StandardType::Float,
            PrimitiveValue::Double(_) => StandardType::Double,
            PrimitiveValue::BigDecimal(_) => StandardType::BigDecimal,
            PrimitiveValue::Char(_) => StandardType::Char,
            PrimitiveValue::String(_) => StandardType::String,
            PrimitiveValue::Instant(_) => StandardType::Instant,
            PrimitiveValue::Duration(_) => StandardType::Duration,
            PrimitiveValue::TimeUnit(_) => StandardType::TimeUnit,
            PrimitiveValue::Throwable(_) => StandardType::Throwable,
            PrimitiveValue::Uri(_) => StandardType::Uri,
        }
    }
}

/// A tree-shaped runtime value mirroring the shape of its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DynamicValue {
    Primitive(PrimitiveValue),
    SomeValue(Box<DynamicValue>),
    NoneValue,
    Left(Box<DynamicValue>),
    Right(Box<DynamicValue>),
    Tuple(Box<DynamicValue>, Box<DynamicValue>),
    Sequence(Vec<DynamicValue>),
    Map(Vec<(DynamicValue, DynamicValue)>),
    Set(Vec<DynamicValue>),
    Record {
        name: String,
        fields: IndexMap<String, DynamicValue>,
    },
    Enum {
        case: String,
        value: Box<DynamicValue>,
    },
}

impl DynamicValue {
    pub fn unit() -> DynamicValue {
        DynamicValue::Primitive(PrimitiveValue::Unit)
    }

    pub fn bool(b: bool) -> DynamicValue {
        DynamicValue::Primitive(PrimitiveValue::Bool(b))
    }

    pub fn int(n: i32) -> DynamicValue {
        DynamicValue::Primitive(PrimitiveValue::Int(n))
    }

    pub fn long(n: i64) -> DynamicValue {
        DynamicValue::Primitive(PrimitiveValue::Long(n))
    }

    pub fn string(s: impl Into<String>) -> DynamicValue {
        DynamicValue::Primitive(PrimitiveValue::String(s.into()))
    }

    pub fn pair(first: DynamicValue, second: DynamicValue) -> DynamicValue {
        DynamicValue::Tuple(Box::new(first), Box::new(second))
    }

    /// Canonical right-nested tuple over two or more components.
    pub fn tuple_of(components: Vec<DynamicValue>) -> DynamicValue {
        let mut iter = components.into_iter().rev();
        match iter.next() {
            None => DynamicValue::unit(),
            Some(last) => iter.fold(last, |acc, v| DynamicValue::pair(v, acc)),
        }
    }

    pub fn some(value: DynamicValue) -> DynamicValue {
        DynamicValue::SomeValue(Box::new(value))
    }

    pub fn left(value: DynamicValue) -> DynamicValue {
        DynamicValue::Left(Box::new(value))
    }

    pub fn right(value: DynamicValue) -> DynamicValue {
        DynamicValue::Right(Box::new(value))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Primitive(PrimitiveValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Short shape label for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DynamicValue::Primitive(p) => match p.standard_type() {
                StandardType::Unit => "Unit",
                StandardType::Bool => "Bool",
                StandardType::Byte => "Byte",
                StandardType::Short => "Short",
                StandardType::Int => "Int",
                StandardType::Long => "Long",
                StandardType::BigInt => "BigInt",
                StandardType::Float => "Float",
                StandardType::Double => "Double",
                StandardType::BigDecimal => "BigDecimal",
                StandardType::Char => "Char",
                StandardType::String => "String",
                StandardType::Instant => "Instant",
                StandardType::Duration => "Duration",
                StandardType::TimeUnit => "TimeUnit",
                StandardType::Throwable => "Throwable",
                StandardType::Uri => "Uri",
            },
            DynamicValue::SomeValue(_) => "Some",
            DynamicValue::NoneValue => "None",
            DynamicValue::Left(_) => "Left",
            DynamicValue::Right(_) => "Right",
            DynamicValue::Tuple(..) => "Tuple",
            DynamicValue::Sequence(_) => "Sequence",
            DynamicValue::Map(_) => "Map",
            DynamicValue::Set(_) => "Set",
            DynamicValue::Record { .. } => "Record",
            DynamicValue::Enum { .. } => "Enum",
        }
    }

    /// Leaves of the right-nested pair tree, counted from the left.
    pub fn tuple_leaves(&self) -> SmallVec<[&DynamicValue; 8]> {
        let mut leaves = SmallVec::new();
        collect_value_leaves(self, &mut leaves);
        leaves
    }
}

fn collect_value_leaves<'a>(value: &'a DynamicValue, out: &mut SmallVec<[&'a DynamicValue; 8]>) {
    match value {
        DynamicValue::Tuple(a, b) => {
            collect_value_leaves(a, out);
            collect_value_leaves(b, out);
        }
        other => out.push(other),
    }
}

/// Check that `value` is well-formed against `schema`.
///
/// `Transform` layers are stripped before the structural walk; a
/// mismatch anywhere in the tree yields `BadShape`.
pub fn check_value(value: &DynamicValue, schema: &Schema) -> EvalResult<()> {
    let schema = schema.resolved();
    match (value, schema) {
        (DynamicValue::Primitive(p), Schema::Primitive(t)) => {
            if p.standard_type() == *t {
                Ok(())
            } else {
                Err(EvalError::BadShape(format!(
                    "primitive {} does not match schema {t}",
                    p.standard_type()
                )))
            }
        }
        (DynamicValue::SomeValue(inner), Schema::Option(elem)) => check_value(inner, elem),
        (DynamicValue::NoneValue, Schema::Option(_)) => Ok(()),
        (DynamicValue::Left(inner), Schema::Either(left, _)) => check_value(inner, left),
        (DynamicValue::Right(inner), Schema::Either(_, right)) => check_value(inner, right),
        (DynamicValue::Tuple(a, b), Schema::Tuple(sa, sb)) => {
            check_value(a, sa)?;
            check_value(b, sb)
        }
        (DynamicValue::Sequence(items), Schema::Sequence(elem)) => {
            items.iter().try_for_each(|item| check_value(item, elem))
        }
        (DynamicValue::Map(entries), Schema::Map(key, val)) => entries.iter().try_for_each(|(k, v)| {
            check_value(k, key)?;
            check_value(v, val)
        }),
        (DynamicValue::Set(items), Schema::Set(elem)) => {
            items.iter().try_for_each(|item| check_value(item, elem))
        }
        (DynamicValue::Record { name, fields }, Schema::Record { name: sname, fields: sfields }) => {
            if name != sname || fields.len() != sfields.len() {
                return Err(EvalError::BadShape(format!(
                    "record {name} does not match schema record {sname}"
                )));
            }
            for (field, field_schema) in sfields {
                let field_value = fields.get(field).ok_or_else(|| {
                    EvalError::BadShape(format!("record {name} is missing field {field}"))
                })?;
                check_value(field_value, field_schema)?;
            }
            Ok(())
        }
        (DynamicValue::Enum { case, value }, Schema::Enum { name, cases }) => {
            let case_schema = cases.get(case).ok_or_else(|| {
                EvalError::BadShape(format!("enum {name} has no case {case}"))
            })?;
            check_value(value, case_schema)
        }
        (value, Schema::Fail(msg)) => Err(EvalError::BadShape(format!(
            "{} checked against failed schema: {msg}",
            value.kind_name()
        ))),
        (value, schema) => Err(EvalError::BadShape(format!(
            "{} does not match schema {schema}",
            value.kind_name()
        ))),
    }
}

/// The uniform evaluation result: a value paired with its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaAndValue {
    pub schema: Schema,
    pub value: DynamicValue,
}

impl SchemaAndValue {
    pub fn new(schema: Schema, value: DynamicValue) -> Self {
        Self { schema, value }
    }

    /// Verify the value against its carried schema.
    pub fn validate(&self) -> EvalResult<()> {
        check_value(&self.value, &self.schema)
    }
}
