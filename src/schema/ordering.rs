//! Default total ordering over well-formed dynamic values
//!
//! Every non-`Fail` schema induces a total order on the values that are
//! well-formed against it: numerics and temporals by value, strings and
//! sequences lexicographically, `None < Some`, `Left < Right`, enums by
//! case position then payload, records field-by-field in declaration
//! order. [`compare`] returns `None` when either side is not
//! well-formed against the schema, leaving the error classification to
//! the caller.

use std::cmp::Ordering;

use super::{DynamicValue, PrimitiveValue, Schema};

/// Compare two values under `schema`'s default ordering.
pub fn compare(schema: &Schema, left: &DynamicValue, right: &DynamicValue) -> Option<Ordering> {
    match (schema.resolved(), left, right) {
        (Schema::Primitive(_), DynamicValue::Primitive(a), DynamicValue::Primitive(b)) => {
            compare_primitive(a, b)
        }
        (Schema::Option(elem), a, b) => match (a, b) {
            (DynamicValue::NoneValue, DynamicValue::NoneValue) => Some(Ordering::Equal),
            (DynamicValue::NoneValue, DynamicValue::SomeValue(_)) => Some(Ordering::Less),
            (DynamicValue::SomeValue(_), DynamicValue::NoneValue) => Some(Ordering::Greater),
            (DynamicValue::SomeValue(a), DynamicValue::SomeValue(b)) => compare(elem, a, b),
            _ => None,
        },
        (Schema::Either(ls, rs), a, b) => match (a, b) {
            (DynamicValue::Left(a), DynamicValue::Left(b)) => compare(ls, a, b),
            (DynamicValue::Right(a), DynamicValue::Right(b)) => compare(rs, a, b),
            (DynamicValue::Left(_), DynamicValue::Right(_)) => Some(Ordering::Less),
            (DynamicValue::Right(_), DynamicValue::Left(_)) => Some(Ordering::Greater),
            _ => None,
        },
        (Schema::Tuple(sa, sb), DynamicValue::Tuple(a1, a2), DynamicValue::Tuple(b1, b2)) => {
            match compare(sa, a1, b1)? {
                Ordering::Equal => compare(sb, a2, b2),
                other => Some(other),
            }
        }
        (Schema::Sequence(elem), DynamicValue::Sequence(a), DynamicValue::Sequence(b))
        | (Schema::Set(elem), DynamicValue::Set(a), DynamicValue::Set(b)) => {
            compare_elementwise(elem, a, b)
        }
        (Schema::Map(ks, vs), DynamicValue::Map(a), DynamicValue::Map(b)) => {
            for ((ak, av), (bk, bv)) in a.iter().zip(b.iter()) {
                match compare(ks, ak, bk)? {
                    Ordering::Equal => {}
                    other => return Some(other),
                }
                match compare(vs, av, bv)? {
                    Ordering::Equal => {}
                    other => return Some(other),
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        (
            Schema::Record { fields, .. },
            DynamicValue::Record { fields: af, .. },
            DynamicValue::Record { fields: bf, .. },
        ) => {
            for (field, field_schema) in fields {
                let a = af.get(field)?;
                let b = bf.get(field)?;
                match compare(field_schema, a, b)? {
                    Ordering::Equal => {}
                    other => return Some(other),
                }
            }
            Some(Ordering::Equal)
        }
        (
            Schema::Enum { cases, .. },
            DynamicValue::Enum { case: ac, value: av },
            DynamicValue::Enum { case: bc, value: bv },
        ) => {
            let ai = cases.get_index_of(ac)?;
            let bi = cases.get_index_of(bc)?;
            match ai.cmp(&bi) {
                Ordering::Equal => compare(cases.get_index(ai)?.1, av, bv),
                other => Some(other),
            }
        }
        _ => None,
    }
}

fn compare_elementwise(
    elem: &Schema,
    left: &[DynamicValue],
    right: &[DynamicValue],
) -> Option<Ordering> {
    for (a, b) in left.iter().zip(right.iter()) {
        match compare(elem, a, b)? {
            Ordering::Equal => {}
            other => return Some(other),
        }
    }
    Some(left.len().cmp(&right.len()))
}

fn compare_primitive(left: &PrimitiveValue, right: &PrimitiveValue) -> Option<Ordering> {
    use PrimitiveValue as P;
    match (left, right) {
        (P::Unit, P::Unit) => Some(Ordering::Equal),
        (P::Bool(a), P::Bool(b)) => Some(a.cmp(b)),
        (P::Byte(a), P::Byte(b)) => Some(a.cmp(b)),
        (P::Short(a), P::Short(b)) => Some(a.cmp(b)),
        (P::Int(a), P::Int(b)) => Some(a.cmp(b)),
        (P::Long(a), P::Long(b)) => Some(a.cmp(b)),
        (P::BigInt(a), P::BigInt(b)) => Some(a.cmp(b)),
        (P::Float(a), P::Float(b)) => Some(a.total_cmp(b)),
        (P::Double(a), P::Double(b)) => Some(a.total_cmp(b)),
        (P::BigDecimal(a), P::BigDecimal(b)) => Some(a.cmp(b)),
        (P::Char(a), P::Char(b)) => Some(a.cmp(b)),
        (P::String(a), P::String(b)) => Some(a.cmp(b)),
        (P::Instant(a), P::Instant(b)) => Some(a.cmp(b)),
        (P::Duration(a), P::Duration(b)) => Some(a.cmp(b)),
        (P::TimeUnit(a), P::TimeUnit(b)) => Some(a.cmp(b)),
        (P::Throwable(a), P::Throwable(b)) => Some(a.cmp(b)),
        (P::Uri(a), P::Uri(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_order_by_value() {
        assert_eq!(
            compare(&Schema::INT, &DynamicValue::int(3), &DynamicValue::int(7)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn none_sorts_before_some() {
        let schema = Schema::option(Schema::INT);
        assert_eq!(
            compare(
                &schema,
                &DynamicValue::NoneValue,
                &DynamicValue::some(DynamicValue::int(0))
            ),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn tuples_order_lexicographically() {
        let schema = Schema::pair(Schema::INT, Schema::STRING);
        let a = DynamicValue::pair(DynamicValue::int(1), DynamicValue::string("z"));
        let b = DynamicValue::pair(DynamicValue::int(1), DynamicValue::string("a"));
        assert_eq!(compare(&schema, &a, &b), Some(Ordering::Greater));
    }

    #[test]
    fn left_sorts_before_right() {
        let schema = Schema::either(Schema::INT, Schema::INT);
        assert_eq!(
            compare(
                &schema,
                &DynamicValue::left(DynamicValue::int(100)),
                &DynamicValue::right(DynamicValue::int(0))
            ),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn mismatched_shapes_do_not_order() {
        assert_eq!(
            compare(&Schema::INT, &DynamicValue::int(1), &DynamicValue::string("1")),
            None
        );
    }

    #[test]
    fn sequences_order_by_prefix_then_length() {
        let schema = Schema::sequence(Schema::INT);
        let short = DynamicValue::Sequence(vec![DynamicValue::int(1)]);
        let long = DynamicValue::Sequence(vec![DynamicValue::int(1), DynamicValue::int(2)]);
        assert_eq!(compare(&schema, &short, &long), Some(Ordering::Less));
    }
}
