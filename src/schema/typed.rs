//! Lifting host values into dynamic values and narrowing them back
//!
//! [`IntoDynamic`] pairs a host type with its schema and dynamic
//! encoding; [`FromDynamic`] recovers the host value, failing with a
//! classified error on shape mismatch. [`narrow`] additionally honours
//! `Transform` layers by resolving the named bijection from the
//! process registry before descending.

use chrono::{DateTime, TimeDelta, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;

use super::{lookup_transform, DynamicValue, PrimitiveValue, Schema, StandardType, TimeUnit};
use crate::error::{EvalError, EvalResult};

/// Host values that know their schema and dynamic encoding.
pub trait IntoDynamic {
    fn schema() -> Schema;
    fn into_dynamic(self) -> DynamicValue;
}

/// Host values recoverable from a dynamic encoding.
pub trait FromDynamic: Sized {
    fn from_dynamic(value: &DynamicValue) -> EvalResult<Self>;
}

/// Narrow a value through a schema, applying registered transforms.
pub fn narrow<A: FromDynamic>(value: &DynamicValue, schema: &Schema) -> EvalResult<A> {
    if let Schema::Transform { name, inner } = schema {
        if let Some(transform) = lookup_transform(name) {
            let unwrapped = (transform.unwrap)(value.clone())?;
            return narrow(&unwrapped, inner);
        }
        return narrow(value, inner);
    }
    A::from_dynamic(value)
}

macro_rules! primitive_dynamic {
    ($ty:ty, $variant:ident) => {
        impl IntoDynamic for $ty {
            fn schema() -> Schema {
                Schema::Primitive(StandardType::$variant)
            }
            fn into_dynamic(self) -> DynamicValue {
                DynamicValue::Primitive(PrimitiveValue::$variant(self))
            }
        }
        impl FromDynamic for $ty {
            fn from_dynamic(value: &DynamicValue) -> EvalResult<Self> {
                match value {
                    DynamicValue::Primitive(PrimitiveValue::$variant(v)) => Ok(v.clone()),
                    other => Err(EvalError::type_mismatch(
                        stringify!($variant),
                        other.kind_name(),
                    )),
                }
            }
        }
    };
}

primitive_dynamic!(bool, Bool);
primitive_dynamic!(i8, Byte);
primitive_dynamic!(i16, Short);
primitive_dynamic!(i32, Int);
primitive_dynamic!(i64, Long);
primitive_dynamic!(BigInt, BigInt);
primitive_dynamic!(f32, Float);
primitive_dynamic!(f64, Double);
primitive_dynamic!(Decimal, BigDecimal);
primitive_dynamic!(char, Char);
primitive_dynamic!(String, String);
primitive_dynamic!(DateTime<Utc>, Instant);
primitive_dynamic!(TimeDelta, Duration);
primitive_dynamic!(TimeUnit, TimeUnit);

impl IntoDynamic for () {
    fn schema() -> Schema {
        Schema::UNIT
    }
    fn into_dynamic(self) -> DynamicValue {
        DynamicValue::unit()
    }
}

impl FromDynamic for () {
    fn from_dynamic(value: &DynamicValue) -> EvalResult<Self> {
        match value {
            DynamicValue::Primitive(PrimitiveValue::Unit) => Ok(()),
            other => Err(EvalError::type_mismatch("Unit", other.kind_name())),
        }
    }
}

impl IntoDynamic for &str {
    fn schema() -> Schema {
        Schema::STRING
    }
    fn into_dynamic(self) -> DynamicValue {
        DynamicValue::string(self)
    }
}

impl<T: IntoDynamic> IntoDynamic for Option<T> {
    fn schema() -> Schema {
        Schema::option(T::schema())
    }
    fn into_dynamic(self) -> DynamicValue {
        match self {
            Some(v) => DynamicValue::some(v.into_dynamic()),
            None => DynamicValue::NoneValue,
        }
    }
}

impl<T: FromDynamic> FromDynamic for Option<T> {
    fn from_dynamic(value: &DynamicValue) -> EvalResult<Self> {
        match value {
            DynamicValue::SomeValue(inner) => Ok(Some(T::from_dynamic(inner)?)),
            DynamicValue::NoneValue => Ok(None),
            other => Err(EvalError::type_mismatch("Option", other.kind_name())),
        }
    }
}

impl<T: IntoDynamic, E: IntoDynamic> IntoDynamic for Result<T, E> {
    fn schema() -> Schema {
        Schema::either(E::schema(), T::schema())
    }
    fn into_dynamic(self) -> DynamicValue {
        match self {
            Ok(v) => DynamicValue::right(v.into_dynamic()),
            Err(e) => DynamicValue::left(e.into_dynamic()),
        }
    }
}

impl<T: FromDynamic, E: FromDynamic> FromDynamic for Result<T, E> {
    fn from_dynamic(value: &DynamicValue) -> EvalResult<Self> {
        match value {
            DynamicValue::Right(inner) => Ok(Ok(T::from_dynamic(inner)?)),
            DynamicValue::Left(inner) => Ok(Err(E::from_dynamic(inner)?)),
            other => Err(EvalError::type_mismatch("Either", other.kind_name())),
        }
    }
}

impl<T: IntoDynamic> IntoDynamic for Vec<T> {
    fn schema() -> Schema {
        Schema::sequence(T::schema())
    }
    fn into_dynamic(self) -> DynamicValue {
        DynamicValue::Sequence(self.into_iter().map(IntoDynamic::into_dynamic).collect())
    }
}

impl<T: FromDynamic> FromDynamic for Vec<T> {
    fn from_dynamic(value: &DynamicValue) -> EvalResult<Self> {
        match value {
            DynamicValue::Sequence(items) => items.iter().map(T::from_dynamic).collect(),
            other => Err(EvalError::type_mismatch("Sequence", other.kind_name())),
        }
    }
}

impl<A: IntoDynamic, B: IntoDynamic> IntoDynamic for (A, B) {
    fn schema() -> Schema {
        Schema::pair(A::schema(), B::schema())
    }
    fn into_dynamic(self) -> DynamicValue {
        DynamicValue::pair(self.0.into_dynamic(), self.1.into_dynamic())
    }
}

impl<A: FromDynamic, B: FromDynamic> FromDynamic for (A, B) {
    fn from_dynamic(value: &DynamicValue) -> EvalResult<Self> {
        match value {
            DynamicValue::Tuple(a, b) => Ok((A::from_dynamic(a)?, B::from_dynamic(b)?)),
            other => Err(EvalError::type_mismatch("Tuple", other.kind_name())),
        }
    }
}

impl<A: IntoDynamic, B: IntoDynamic, C: IntoDynamic> IntoDynamic for (A, B, C) {
    fn schema() -> Schema {
        Schema::tuple_of(vec![A::schema(), B::schema(), C::schema()])
    }
    fn into_dynamic(self) -> DynamicValue {
        DynamicValue::tuple_of(vec![
            self.0.into_dynamic(),
            self.1.into_dynamic(),
            self.2.into_dynamic(),
        ])
    }
}

impl<A: FromDynamic, B: FromDynamic, C: FromDynamic> FromDynamic for (A, B, C) {
    fn from_dynamic(value: &DynamicValue) -> EvalResult<Self> {
        let (a, rest) = match value {
            DynamicValue::Tuple(a, rest) => (A::from_dynamic(a)?, &**rest),
            other => return Err(EvalError::type_mismatch("Tuple", other.kind_name())),
        };
        let (b, c) = <(B, C)>::from_dynamic(rest)?;
        Ok((a, b, c))
    }
}

impl<A: IntoDynamic, B: IntoDynamic, C: IntoDynamic, D: IntoDynamic> IntoDynamic for (A, B, C, D) {
    fn schema() -> Schema {
        Schema::tuple_of(vec![A::schema(), B::schema(), C::schema(), D::schema()])
    }
    fn into_dynamic(self) -> DynamicValue {
        DynamicValue::tuple_of(vec![
            self.0.into_dynamic(),
            self.1.into_dynamic(),
            self.2.into_dynamic(),
            self.3.into_dynamic(),
        ])
    }
}

impl<A: FromDynamic, B: FromDynamic, C: FromDynamic, D: FromDynamic> FromDynamic for (A, B, C, D) {
    fn from_dynamic(value: &DynamicValue) -> EvalResult<Self> {
        let (a, rest) = match value {
            DynamicValue::Tuple(a, rest) => (A::from_dynamic(a)?, &**rest),
            other => return Err(EvalError::type_mismatch("Tuple", other.kind_name())),
        };
        let (b, c, d) = <(B, C, D)>::from_dynamic(rest)?;
        Ok((a, b, c, d))
    }
}
