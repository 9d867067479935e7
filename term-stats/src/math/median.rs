//! Median kernel.

use super::quantile::{quantile, quantile_return_type, QuantileEstimationMethod};
use crate::error::Result;
use crate::types::{Value, ValueKind, ValueType};

fn median_method(kind: ValueKind) -> QuantileEstimationMethod {
    if kind.is_primitive_number() || kind == ValueKind::Number {
        QuantileEstimationMethod::R7
    } else {
        QuantileEstimationMethod::R3
    }
}

/// Computes the median of a non-nullable sequence.
///
/// For primitive numbers the result is a Double, averaging the two middle
/// elements of an even-length sample. Other self-comparable kinds return an
/// element of the sample; for even lengths, the lower of the two middle ones.
///
/// ```rust
/// use term_stats::math::median;
/// use term_stats::types::{Value, ValueKind, ValueType};
///
/// let values: Vec<Value> = [1, 2, 3, 4].into_iter().map(Value::Int).collect();
/// let result = median(&values, ValueType::of(ValueKind::Int), false).unwrap();
/// assert_eq!(result, Some(Value::Double(2.5)));
/// ```
pub fn median(values: &[Value], value_type: ValueType, skip_nan: bool) -> Result<Option<Value>> {
    quantile(values, value_type, 0.5, skip_nan, median_method(value_type.kind))
}

/// Result type of [`median`].
pub fn median_return_type(value_type: ValueType, is_empty: bool) -> Option<ValueType> {
    quantile_return_type(value_type, median_method(value_type.kind), is_empty)
}
