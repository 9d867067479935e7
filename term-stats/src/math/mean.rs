//! Arithmetic mean kernel.

use tracing::instrument;

use super::{ensure_non_nullable, primitive_f64s, unresolved_number};
use crate::error::{Result, StatsError};
use crate::types::{Value, ValueKind, ValueType};

/// Computes the arithmetic mean of a non-nullable sequence of primitive numbers.
///
/// The result is always a Double. An empty sequence, or one where every value
/// was skipped, yields NaN. A NaN element makes the result NaN unless
/// `skip_nan` is set.
///
/// # Errors
///
/// Big numbers and non-numeric kinds are rejected with
/// [`StatsError::UnsupportedType`].
#[instrument(skip(values), fields(count = values.len()))]
pub fn mean(values: &[Value], value_type: ValueType, skip_nan: bool) -> Result<f64> {
    ensure_non_nullable(value_type, "mean")?;

    match value_type.kind {
        ValueKind::Nothing => Ok(f64::NAN),
        ValueKind::Byte
        | ValueKind::Short
        | ValueKind::Int
        | ValueKind::Long
        | ValueKind::Float
        | ValueKind::Double => {
            let numbers = primitive_f64s(values, value_type, "mean")?;
            Ok(mean_of_f64s(&numbers, skip_nan))
        }
        ValueKind::BigInteger | ValueKind::BigDecimal => Err(StatsError::unsupported(
            "mean",
            value_type,
            "only primitive numbers are supported",
        )),
        ValueKind::Number => Err(unresolved_number(value_type, "mean")),
        ValueKind::String
        | ValueKind::Boolean
        | ValueKind::Date
        | ValueKind::DateTime
        | ValueKind::Any => Err(StatsError::unsupported(
            "mean",
            value_type,
            "only primitive numbers are supported",
        )),
    }
}

pub(crate) fn mean_of_f64s(values: &[f64], skip_nan: bool) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for &value in values {
        if value.is_nan() {
            if skip_nan {
                continue;
            }
            return f64::NAN;
        }
        total += value;
        count += 1;
    }
    if count == 0 {
        f64::NAN
    } else {
        total / count as f64
    }
}

/// Result type of [`mean`]: Double for every numeric input, `None` otherwise.
pub fn mean_return_type(value_type: ValueType) -> Option<ValueType> {
    if value_type.kind.is_primitive_number()
        || matches!(value_type.kind, ValueKind::Number | ValueKind::Nothing)
    {
        Some(ValueType::of(ValueKind::Double))
    } else {
        None
    }
}
