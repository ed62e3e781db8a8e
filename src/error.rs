use thiserror::Error;

/// Classification for arithmetic failures raised by the numeric instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticKind {
    /// Integer or decimal division by zero.
    DivideByZero,
    /// The result does not fit the numeric instance.
    Overflow,
    /// The operand is outside the operation's domain (log of a
    /// non-positive number, even root of a negative number, ...).
    DomainError,
}

impl std::fmt::Display for ArithmeticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArithmeticKind::DivideByZero => write!(f, "divide by zero"),
            ArithmeticKind::Overflow => write!(f, "overflow"),
            ArithmeticKind::DomainError => write!(f, "domain error"),
        }
    }
}

/// Unified failure type surfaced by evaluation, narrowing and decoding.
///
/// Every failure inside the core maps into one of these variants; the
/// caller never sees an internal panic or an unclassified error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A variable referenced by the expression is not bound in the context.
    #[error("variable `{0}` is not bound in the remote context")]
    Unbound(String),

    /// A schema did not match during narrowing or comparison.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Tuple access past the tuple's arity.
    #[error("tuple index {0} is out of range")]
    IndexOutOfRange(usize),

    /// A dynamic value did not match its carrying schema.
    #[error("malformed dynamic value: {0}")]
    BadShape(String),

    /// Divide-by-zero, overflow or a domain error in a numeric operation.
    #[error("arithmetic error: {0}")]
    Arithmetic(ArithmeticKind),

    /// Instant or duration parsing failed.
    #[error("parse error: {0}")]
    Parse(String),

    /// `Iterate` exceeded the configured iteration bound.
    #[error("iteration diverged after {0} steps")]
    IterationDiverged(u64),

    /// The evaluation was aborted through its cancellation token.
    #[error("evaluation cancelled")]
    Cancelled,

    /// Catch-all with a human-readable reason; used only when none of
    /// the other variants fits.
    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),
}

impl EvalError {
    /// Build a `TypeMismatch` from two displayable schema descriptions.
    pub fn type_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        EvalError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
