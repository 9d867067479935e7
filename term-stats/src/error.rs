//! Error types for the term-stats aggregation engine.
//!
//! All failures in this crate are local to a single aggregation call and are
//! represented by [`StatsError`]. None of them are transient, so callers should
//! never retry: they either fix the input (out-of-domain parameters, unsupported
//! types) or fix the calling code (invariant violations).

use thiserror::Error;

/// The main error type for statistical kernels and aggregators.
#[derive(Error, Debug)]
pub enum StatsError {
    /// A caller broke a precondition of a kernel, e.g. a nullable type or an
    /// unresolved generic number kind reached code that requires a concrete one.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// The operation does not support values of the given type.
    #[error("Unable to compute the {operation} for {value_type}: {reason}")]
    UnsupportedType {
        /// Name of the operation (e.g. "mean", "cumSum")
        operation: String,
        /// Rendered type that was rejected
        value_type: String,
        /// What is supported instead
        reason: String,
    },

    /// A parameter is outside of its mathematical domain.
    #[error("Out of domain: {0}")]
    OutOfDomain(String),

    /// An order statistic was requested outside of the data.
    #[error("Index out of bounds: k = {index}, size = {len}")]
    IndexOutOfBounds {
        /// The requested (0-based) index
        index: usize,
        /// Number of elements available
        len: usize,
    },

    /// A value does not match the declared element type of its column.
    #[error("Type mismatch in column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the column
        column: String,
        /// Rendered declared type
        expected: String,
        /// Kind of the offending value
        found: String,
    },

    /// An exact reduction exceeded the representable range.
    #[error("Numeric overflow: {0}")]
    Overflow(String),

    /// Invalid configuration values.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// A type alias for `Result<T, StatsError>`.
pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    /// Creates an invariant violation error with the given message.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Creates an unsupported type error for `operation` on `value_type`.
    pub fn unsupported(
        operation: impl Into<String>,
        value_type: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedType {
            operation: operation.into(),
            value_type: value_type.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an out of domain error with the given message.
    pub fn out_of_domain(msg: impl Into<String>) -> Self {
        Self::OutOfDomain(msg.into())
    }

    /// Creates an overflow error with the given message.
    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::Overflow(msg.into())
    }

    /// Creates a type mismatch error for a value found in `column`.
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates a configuration error with the given message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns true for errors caused by programming mistakes rather than data.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}

/// Converts serde_json errors to StatsError.
impl From<serde_json::Error> for StatsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
