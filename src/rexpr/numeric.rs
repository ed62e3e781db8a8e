//! Closed numeric and fractional instances
//!
//! Numeric polymorphism in expressions is driven by a selector enum, not
//! by open trait objects: the selector is part of the wire format, so
//! the instance set is fixed. Each instance packs the arithmetic for one
//! primitive type and knows its result schema.

use num_bigint::BigInt;
use num_integer::Roots;
use num_traits::{Signed, ToPrimitive, Zero};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::error::{ArithmeticKind, EvalError, EvalResult};
use crate::schema::{PrimitiveValue, Schema, StandardType};

/// Selector for the numeric instance an operator was constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericKind {
    Int,
    Long,
    Short,
    BigInt,
    Float,
    Double,
    BigDecimal,
}

/// Binary operations provided by every numeric instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericBinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Root,
    Log,
    Min,
    Max,
}

/// Unary operations provided by every numeric instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericUnOp {
    Neg,
    Abs,
    Floor,
    Ceil,
    Round,
}

fn overflow() -> EvalError {
    EvalError::Arithmetic(ArithmeticKind::Overflow)
}

fn divide_by_zero() -> EvalError {
    EvalError::Arithmetic(ArithmeticKind::DivideByZero)
}

fn domain_error() -> EvalError {
    EvalError::Arithmetic(ArithmeticKind::DomainError)
}

macro_rules! int_instance {
    ($fn_bin:ident, $fn_un:ident, $ty:ty, $variant:ident) => {
        fn $fn_bin(op: NumericBinOp, a: $ty, b: $ty) -> EvalResult<$ty> {
            match op {
                NumericBinOp::Add => a.checked_add(b).ok_or_else(overflow),
                NumericBinOp::Sub => a.checked_sub(b).ok_or_else(overflow),
                NumericBinOp::Mul => a.checked_mul(b).ok_or_else(overflow),
                NumericBinOp::Div => {
                    if b == 0 {
                        Err(divide_by_zero())
                    } else {
                        a.checked_div(b).ok_or_else(overflow)
                    }
                }
                NumericBinOp::Mod => {
                    if b == 0 {
                        Err(divide_by_zero())
                    } else {
                        a.checked_rem(b).ok_or_else(overflow)
                    }
                }
                NumericBinOp::Pow => {
                    let exp = u32::try_from(b).map_err(|_| domain_error())?;
                    a.checked_pow(exp).ok_or_else(overflow)
                }
                NumericBinOp::Root => {
                    if b <= 0 || (a < 0 && b % 2 == 0) {
                        return Err(domain_error());
                    }
                    let root = (a as f64).abs().powf(1.0 / b as f64).round();
                    let signed = if a < 0 { -root } else { root };
                    if signed < <$ty>::MIN as f64 || signed > <$ty>::MAX as f64 {
                        return Err(overflow());
                    }
                    Ok(signed as $ty)
                }
                NumericBinOp::Log => {
                    if a <= 0 || b <= 0 || b == 1 {
                        return Err(domain_error());
                    }
                    Ok(((a as f64).ln() / (b as f64).ln()).floor() as $ty)
                }
                NumericBinOp::Min => Ok(a.min(b)),
                NumericBinOp::Max => Ok(a.max(b)),
            }
        }

        fn $fn_un(op: NumericUnOp, a: $ty) -> EvalResult<$ty> {
            match op {
                NumericUnOp::Neg => a.checked_neg().ok_or_else(overflow),
                NumericUnOp::Abs => a.checked_abs().ok_or_else(overflow),
                // Integer values are already whole numbers.
                NumericUnOp::Floor | NumericUnOp::Ceil | NumericUnOp::Round => Ok(a),
            }
        }
    };
}

int_instance!(short_binary, short_unary, i16, Short);
int_instance!(int_binary, int_unary, i32, Int);
int_instance!(long_binary, long_unary, i64, Long);

macro_rules! float_instance {
    ($fn_bin:ident, $fn_un:ident, $ty:ty) => {
        fn $fn_bin(op: NumericBinOp, a: $ty, b: $ty) -> EvalResult<$ty> {
            match op {
                NumericBinOp::Add => Ok(a + b),
                NumericBinOp::Sub => Ok(a - b),
                NumericBinOp::Mul => Ok(a * b),
                NumericBinOp::Div => Ok(a / b),
                NumericBinOp::Mod => Ok(a % b),
                NumericBinOp::Pow => Ok(a.powf(b)),
                NumericBinOp::Root => {
                    if b == 0.0 {
                        Err(domain_error())
                    } else {
                        Ok(a.powf(1.0 / b))
                    }
                }
                NumericBinOp::Log => {
                    if a <= 0.0 || b <= 0.0 || b == 1.0 {
                        Err(domain_error())
                    } else {
                        Ok(a.log(b))
                    }
                }
                NumericBinOp::Min => Ok(a.min(b)),
                NumericBinOp::Max => Ok(a.max(b)),
            }
        }

        fn $fn_un(op: NumericUnOp, a: $ty) -> EvalResult<$ty> {
            match op {
                NumericUnOp::Neg => Ok(-a),
                NumericUnOp::Abs => Ok(a.abs()),
                NumericUnOp::Floor => Ok(a.floor()),
                NumericUnOp::Ceil => Ok(a.ceil()),
                NumericUnOp::Round => Ok(a.round()),
            }
        }
    };
}

float_instance!(float_binary, float_unary, f32);
float_instance!(double_binary, double_unary, f64);

fn bigint_binary(op: NumericBinOp, a: &BigInt, b: &BigInt) -> EvalResult<BigInt> {
    match op {
        NumericBinOp::Add => Ok(a + b),
        NumericBinOp::Sub => Ok(a - b),
        NumericBinOp::Mul => Ok(a * b),
        NumericBinOp::Div => {
            if b.is_zero() {
                Err(divide_by_zero())
            } else {
                Ok(a / b)
            }
        }
        NumericBinOp::Mod => {
            if b.is_zero() {
                Err(divide_by_zero())
            } else {
                Ok(a % b)
            }
        }
        NumericBinOp::Pow => {
            let exp = b.to_u32().ok_or_else(domain_error)?;
            Ok(a.pow(exp))
        }
        NumericBinOp::Root => {
            let n = b.to_u32().filter(|n| *n > 0).ok_or_else(domain_error)?;
            if a.is_negative() && n % 2 == 0 {
                return Err(domain_error());
            }
            Ok(a.nth_root(n))
        }
        NumericBinOp::Log => {
            let x = a.to_f64().ok_or_else(overflow)?;
            let base = b.to_f64().ok_or_else(overflow)?;
            if x <= 0.0 || base <= 0.0 || base == 1.0 {
                return Err(domain_error());
            }
            Ok(BigInt::from((x.ln() / base.ln()).floor() as i64))
        }
        NumericBinOp::Min => Ok(a.min(b).clone()),
        NumericBinOp::Max => Ok(a.max(b).clone()),
    }
}

fn bigint_unary(op: NumericUnOp, a: &BigInt) -> EvalResult<BigInt> {
    match op {
        NumericUnOp::Neg => Ok(-a),
        NumericUnOp::Abs => Ok(a.abs()),
        NumericUnOp::Floor | NumericUnOp::Ceil | NumericUnOp::Round => Ok(a.clone()),
    }
}

fn decimal_binary(op: NumericBinOp, a: Decimal, b: Decimal) -> EvalResult<Decimal> {
    match op {
        NumericBinOp::Add => a.checked_add(b).ok_or_else(overflow),
        NumericBinOp::Sub => a.checked_sub(b).ok_or_else(overflow),
        NumericBinOp::Mul => a.checked_mul(b).ok_or_else(overflow),
        NumericBinOp::Div => {
            if b.is_zero() {
                Err(divide_by_zero())
            } else {
                a.checked_div(b).ok_or_else(overflow)
            }
        }
        NumericBinOp::Mod => {
            if b.is_zero() {
                Err(divide_by_zero())
            } else {
                a.checked_rem(b).ok_or_else(overflow)
            }
        }
        NumericBinOp::Pow => a.checked_powd(b).ok_or_else(domain_error),
        NumericBinOp::Root => {
            if b.is_zero() {
                return Err(domain_error());
            }
            let inv = Decimal::ONE.checked_div(b).ok_or_else(overflow)?;
            a.checked_powd(inv).ok_or_else(domain_error)
        }
        NumericBinOp::Log => {
            if a <= Decimal::ZERO || b <= Decimal::ZERO || b == Decimal::ONE {
                return Err(domain_error());
            }
            let num = a.checked_ln().ok_or_else(domain_error)?;
            let den = b.checked_ln().ok_or_else(domain_error)?;
            num.checked_div(den).ok_or_else(overflow)
        }
        NumericBinOp::Min => Ok(a.min(b)),
        NumericBinOp::Max => Ok(a.max(b)),
    }
}

fn decimal_unary(op: NumericUnOp, a: Decimal) -> EvalResult<Decimal> {
    match op {
        NumericUnOp::Neg => Ok(-a),
        NumericUnOp::Abs => Ok(a.abs()),
        NumericUnOp::Floor => Ok(a.floor()),
        NumericUnOp::Ceil => Ok(a.ceil()),
        NumericUnOp::Round => Ok(a.round()),
    }
}

impl NumericKind {
    pub fn standard_type(&self) -> StandardType {
        match self {
            NumericKind::Int => StandardType::Int,
            NumericKind::Long => StandardType::Long,
            NumericKind::Short => StandardType::Short,
            NumericKind::BigInt => StandardType::BigInt,
            NumericKind::Float => StandardType::Float,
            NumericKind::Double => StandardType::Double,
            NumericKind::BigDecimal => StandardType::BigDecimal,
        }
    }

    pub fn schema(&self) -> Schema {
        Schema::Primitive(self.standard_type())
    }

    fn mismatch(&self, actual: &PrimitiveValue) -> EvalError {
        EvalError::type_mismatch(self.standard_type(), actual.standard_type())
    }

    /// Apply a binary operation to two operands of this instance's type.
    pub fn apply_binary(
        &self,
        op: NumericBinOp,
        left: &PrimitiveValue,
        right: &PrimitiveValue,
    ) -> EvalResult<PrimitiveValue> {
        use PrimitiveValue as P;
        match (self, left, right) {
            (NumericKind::Short, P::Short(a), P::Short(b)) => {
                short_binary(op, *a, *b).map(P::Short)
            }
            (NumericKind::Int, P::Int(a), P::Int(b)) => int_binary(op, *a, *b).map(P::Int),
            (NumericKind::Long, P::Long(a), P::Long(b)) => long_binary(op, *a, *b).map(P::Long),
            (NumericKind::BigInt, P::BigInt(a), P::BigInt(b)) => {
                bigint_binary(op, a, b).map(P::BigInt)
            }
            (NumericKind::Float, P::Float(a), P::Float(b)) => {
                float_binary(op, *a, *b).map(P::Float)
            }
            (NumericKind::Double, P::Double(a), P::Double(b)) => {
                double_binary(op, *a, *b).map(P::Double)
            }
            (NumericKind::BigDecimal, P::BigDecimal(a), P::BigDecimal(b)) => {
                decimal_binary(op, *a, *b).map(P::BigDecimal)
            }
            (_, P::Short(_) | P::Int(_) | P::Long(_) | P::BigInt(_) | P::Float(_) | P::Double(_) | P::BigDecimal(_), other) => {
                Err(self.mismatch(other))
            }
            (_, other, _) => Err(self.mismatch(other)),
        }
    }

    /// Apply a unary operation to an operand of this instance's type.
    pub fn apply_unary(&self, op: NumericUnOp, value: &PrimitiveValue) -> EvalResult<PrimitiveValue> {
        use PrimitiveValue as P;
        match (self, value) {
            (NumericKind::Short, P::Short(a)) => short_unary(op, *a).map(P::Short),
            (NumericKind::Int, P::Int(a)) => int_unary(op, *a).map(P::Int),
            (NumericKind::Long, P::Long(a)) => long_unary(op, *a).map(P::Long),
            (NumericKind::BigInt, P::BigInt(a)) => bigint_unary(op, a).map(P::BigInt),
            (NumericKind::Float, P::Float(a)) => float_unary(op, *a).map(P::Float),
            (NumericKind::Double, P::Double(a)) => double_unary(op, *a).map(P::Double),
            (NumericKind::BigDecimal, P::BigDecimal(a)) => decimal_unary(op, *a).map(P::BigDecimal),
            (_, other) => Err(self.mismatch(other)),
        }
    }
}

/// Selector for the fractional instance a trigonometric operator was
/// constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FractionalKind {
    Float,
    Double,
    BigDecimal,
}

/// Operations provided by every fractional instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractionalOp {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
}

impl FractionalOp {
    fn apply_f64(&self, x: f64) -> f64 {
        match self {
            FractionalOp::Sin => x.sin(),
            FractionalOp::Cos => x.cos(),
            FractionalOp::Tan => x.tan(),
            FractionalOp::Asin => x.asin(),
            FractionalOp::Acos => x.acos(),
            FractionalOp::Atan => x.atan(),
        }
    }
}

impl FractionalKind {
    pub fn standard_type(&self) -> StandardType {
        match self {
            FractionalKind::Float => StandardType::Float,
            FractionalKind::Double => StandardType::Double,
            FractionalKind::BigDecimal => StandardType::BigDecimal,
        }
    }

    pub fn schema(&self) -> Schema {
        Schema::Primitive(self.standard_type())
    }

    /// Apply a trigonometric operation to an operand of this instance's type.
    pub fn apply(&self, op: FractionalOp, value: &PrimitiveValue) -> EvalResult<PrimitiveValue> {
        use PrimitiveValue as P;
        match (self, value) {
            (FractionalKind::Float, P::Float(a)) => Ok(P::Float(op.apply_f64(*a as f64) as f32)),
            (FractionalKind::Double, P::Double(a)) => Ok(P::Double(op.apply_f64(*a))),
            (FractionalKind::BigDecimal, P::BigDecimal(a)) => {
                let x = a.to_f64().ok_or_else(overflow)?;
                let result = op.apply_f64(x);
                if result.is_nan() {
                    return Err(domain_error());
                }
                Decimal::from_f64_retain(result)
                    .map(P::BigDecimal)
                    .ok_or_else(overflow)
            }
            (kind, other) => Err(EvalError::type_mismatch(
                kind.standard_type(),
                other.standard_type(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_add_and_overflow() {
        let kind = NumericKind::Int;
        let sum = kind
            .apply_binary(NumericBinOp::Add, &PrimitiveValue::Int(2), &PrimitiveValue::Int(3))
            .unwrap();
        assert_eq!(sum, PrimitiveValue::Int(5));

        let err = kind
            .apply_binary(
                NumericBinOp::Add,
                &PrimitiveValue::Int(i32::MAX),
                &PrimitiveValue::Int(1),
            )
            .unwrap_err();
        assert_eq!(err, EvalError::Arithmetic(ArithmeticKind::Overflow));
    }

    #[test]
    fn mod_is_modulo_not_add() {
        let result = NumericKind::Int
            .apply_binary(NumericBinOp::Mod, &PrimitiveValue::Int(17), &PrimitiveValue::Int(5))
            .unwrap();
        assert_eq!(result, PrimitiveValue::Int(2));
    }

    #[test]
    fn integer_division_by_zero_is_classified() {
        let err = NumericKind::Long
            .apply_binary(NumericBinOp::Div, &PrimitiveValue::Long(1), &PrimitiveValue::Long(0))
            .unwrap_err();
        assert_eq!(err, EvalError::Arithmetic(ArithmeticKind::DivideByZero));
    }

    #[test]
    fn int_root_rounds_to_nearest() {
        let result = NumericKind::Int
            .apply_binary(NumericBinOp::Root, &PrimitiveValue::Int(27), &PrimitiveValue::Int(3))
            .unwrap();
        assert_eq!(result, PrimitiveValue::Int(3));
    }

    #[test]
    fn log_domain_errors() {
        let err = NumericKind::Double
            .apply_binary(
                NumericBinOp::Log,
                &PrimitiveValue::Double(-1.0),
                &PrimitiveValue::Double(10.0),
            )
            .unwrap_err();
        assert_eq!(err, EvalError::Arithmetic(ArithmeticKind::DomainError));
    }

    #[test]
    fn bigint_arithmetic_does_not_overflow() {
        let big = BigInt::from(i64::MAX);
        let result = NumericKind::BigInt
            .apply_binary(
                NumericBinOp::Mul,
                &PrimitiveValue::BigInt(big.clone()),
                &PrimitiveValue::BigInt(big.clone()),
            )
            .unwrap();
        assert_eq!(result, PrimitiveValue::BigInt(&big * &big));
    }

    #[test]
    fn mismatched_operand_is_type_error() {
        let err = NumericKind::Int
            .apply_binary(NumericBinOp::Add, &PrimitiveValue::Int(1), &PrimitiveValue::Long(2))
            .unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn fractional_sin_on_double() {
        let result = FractionalKind::Double
            .apply(FractionalOp::Sin, &PrimitiveValue::Double(0.0))
            .unwrap();
        assert_eq!(result, PrimitiveValue::Double(0.0));
    }

    #[test]
    fn fractional_asin_out_of_domain_on_decimal() {
        let err = FractionalKind::BigDecimal
            .apply(FractionalOp::Asin, &PrimitiveValue::BigDecimal(Decimal::from(2)))
            .unwrap_err();
        assert_eq!(err, EvalError::Arithmetic(ArithmeticKind::DomainError));
    }
}
