//! Percentile kernel.

use super::quantile::{quantile, quantile_return_type, QuantileEstimationMethod};
use crate::error::{Result, StatsError};
use crate::types::{Value, ValueKind, ValueType};

/// Estimation method for primitive numbers unless configured otherwise.
pub const DEFAULT_NUMERIC_METHOD: QuantileEstimationMethod = QuantileEstimationMethod::R8;

/// Estimation method for other self-comparable kinds unless configured otherwise.
pub const DEFAULT_COMPARABLE_METHOD: QuantileEstimationMethod = QuantileEstimationMethod::R3;

pub(crate) fn method_for(
    kind: ValueKind,
    numeric: QuantileEstimationMethod,
    comparable: QuantileEstimationMethod,
) -> QuantileEstimationMethod {
    if kind.is_primitive_number() || kind == ValueKind::Number {
        numeric
    } else {
        comparable
    }
}

pub(crate) fn ensure_percentile(percentile: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(StatsError::out_of_domain(format!(
            "percentile must be in range [0, 100], got {percentile}"
        )));
    }
    Ok(percentile / 100.0)
}

/// Computes the `percentile`-th percentile (`0..=100`) of a non-nullable
/// sequence.
///
/// Primitive numbers are interpolated with R8 and yield a Double; other
/// self-comparable kinds use the nearest observation (R3).
pub fn percentile(
    values: &[Value],
    value_type: ValueType,
    percentile: f64,
    skip_nan: bool,
) -> Result<Option<Value>> {
    percentile_with(
        values,
        value_type,
        percentile,
        skip_nan,
        DEFAULT_NUMERIC_METHOD,
        DEFAULT_COMPARABLE_METHOD,
    )
}

/// Like [`percentile`] with explicit estimation methods for numbers and for
/// other self-comparable kinds.
pub fn percentile_with(
    values: &[Value],
    value_type: ValueType,
    percentile: f64,
    skip_nan: bool,
    numeric: QuantileEstimationMethod,
    comparable: QuantileEstimationMethod,
) -> Result<Option<Value>> {
    let p = ensure_percentile(percentile)?;
    let method = method_for(value_type.kind, numeric, comparable);
    quantile(values, value_type, p, skip_nan, method)
}

/// Result type of [`percentile`].
pub fn percentile_return_type(value_type: ValueType, is_empty: bool) -> Option<ValueType> {
    let method = method_for(
        value_type.kind,
        DEFAULT_NUMERIC_METHOD,
        DEFAULT_COMPARABLE_METHOD,
    );
    quantile_return_type(value_type, method, is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i32]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn test_first_quartile() {
        let result = percentile(&ints(&[5, 2, 8, 1, 9]), ValueType::of(ValueKind::Int), 25.0, false)
            .unwrap()
            .and_then(|v| v.as_f64())
            .unwrap();
        assert!((result - 1.666_666_7).abs() < 1e-6);
    }

    #[test]
    fn test_extremes() {
        let values = ints(&[5, 2, 8, 1, 9]);
        let ty = ValueType::of(ValueKind::Int);
        assert_eq!(percentile(&values, ty, 0.0, false).unwrap(), Some(Value::Double(1.0)));
        assert_eq!(percentile(&values, ty, 100.0, false).unwrap(), Some(Value::Double(9.0)));
    }

    #[test]
    fn test_comparables() {
        let values: Vec<Value> = ["e", "b", "d", "a", "c"].into_iter().map(Value::from).collect();
        let ty = ValueType::of(ValueKind::String);
        assert_eq!(percentile(&values, ty, 50.0, false).unwrap(), Some(Value::from("c")));
        assert_eq!(percentile(&values, ty, 100.0, false).unwrap(), Some(Value::from("e")));
    }

    #[test]
    fn test_explicit_methods() {
        let values = ints(&[5, 2, 8, 1, 9]);
        let ty = ValueType::of(ValueKind::Int);
        let result = percentile_with(
            &values,
            ty,
            50.0,
            false,
            QuantileEstimationMethod::R1,
            QuantileEstimationMethod::R1,
        )
        .unwrap();
        assert_eq!(result, Some(Value::Int(5)));
    }

    #[test]
    fn test_empty_and_out_of_range() {
        assert_eq!(percentile(&[], ValueType::nothing(), 50.0, false).unwrap(), None);
        let err = percentile(&ints(&[1]), ValueType::of(ValueKind::Int), 101.0, false).unwrap_err();
        assert!(matches!(err, StatsError::OutOfDomain(_)));
    }
}
