//! Variance and standard deviation kernels.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

use super::{ensure_non_nullable, kind_mismatch, primitive_f64s, unresolved_number};
use crate::error::{Result, StatsError};
use crate::types::{Value, ValueKind, ValueType};

/// Two-pass summary of a sample: the count, mean and sum of squared
/// deviations from that mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    /// Number of values that took part in the computation.
    pub count: usize,
    /// Arithmetic mean, NaN for an empty sample.
    pub mean: f64,
    /// Sum of `(x - mean)^2` over the sample.
    pub sum_of_squared_deviations: f64,
}

impl BasicStats {
    /// Computes the summary of `values`.
    ///
    /// With `skip_nan`, NaN elements are excluded from both passes; otherwise
    /// a NaN poisons the mean and every derived statistic.
    pub fn from_f64s(values: &[f64], skip_nan: bool) -> Self {
        let mut count = 0usize;
        let mut total = 0.0;
        for &value in values {
            if value.is_nan() {
                if skip_nan {
                    continue;
                }
                return Self {
                    count: values.len(),
                    mean: f64::NAN,
                    sum_of_squared_deviations: f64::NAN,
                };
            }
            total += value;
            count += 1;
        }
        if count == 0 {
            return Self {
                count,
                mean: f64::NAN,
                sum_of_squared_deviations: f64::NAN,
            };
        }

        let mean = total / count as f64;
        let sum_of_squared_deviations = values
            .iter()
            .filter(|value| !value.is_nan())
            .map(|value| (value - mean).powi(2))
            .sum();

        Self {
            count,
            mean,
            sum_of_squared_deviations,
        }
    }

    /// Variance with `ddof` delta degrees of freedom. NaN when `count <= ddof`.
    pub fn variance(&self, ddof: usize) -> f64 {
        if self.count <= ddof {
            return f64::NAN;
        }
        self.sum_of_squared_deviations / (self.count - ddof) as f64
    }

    /// Standard deviation with `ddof` delta degrees of freedom.
    pub fn std(&self, ddof: usize) -> f64 {
        self.variance(ddof).sqrt()
    }
}

/// Computes the variance of a non-nullable sequence of numbers.
///
/// Primitive numbers go through [`BasicStats`]. BigInteger and BigDecimal
/// values are reduced with exact decimal arithmetic and only the final result
/// is converted to `f64`.
#[instrument(skip(values), fields(count = values.len()))]
pub fn variance(values: &[Value], value_type: ValueType, skip_nan: bool, ddof: usize) -> Result<f64> {
    ensure_non_nullable(value_type, "variance")?;

    match value_type.kind {
        ValueKind::Nothing => Ok(f64::NAN),
        ValueKind::Byte
        | ValueKind::Short
        | ValueKind::Int
        | ValueKind::Long
        | ValueKind::Float
        | ValueKind::Double => {
            let numbers = primitive_f64s(values, value_type, "variance")?;
            Ok(BasicStats::from_f64s(&numbers, skip_nan).variance(ddof))
        }
        ValueKind::BigInteger | ValueKind::BigDecimal => {
            let decimals = big_decimals(values, value_type)?;
            exact_variance(&decimals, ddof)
        }
        ValueKind::Number => Err(unresolved_number(value_type, "variance")),
        ValueKind::String
        | ValueKind::Boolean
        | ValueKind::Date
        | ValueKind::DateTime
        | ValueKind::Any => Err(StatsError::unsupported(
            "variance",
            value_type,
            "only numbers are supported",
        )),
    }
}

/// Computes the standard deviation, `sqrt(variance)`.
///
/// # Example
///
/// ```rust
/// use term_stats::math::std;
/// use term_stats::types::{Value, ValueKind, ValueType};
///
/// let values: Vec<Value> = [2, 4, 4, 4, 5, 5, 7, 9].into_iter().map(Value::Int).collect();
/// let result = std(&values, ValueType::of(ValueKind::Int), false, 1).unwrap();
/// assert!((result - 2.138).abs() < 1e-3);
/// ```
pub fn std(values: &[Value], value_type: ValueType, skip_nan: bool, ddof: usize) -> Result<f64> {
    variance(values, value_type, skip_nan, ddof).map(f64::sqrt)
}

/// Result type of [`std`] and [`variance`]: Double for numbers.
pub fn std_return_type(value_type: ValueType) -> Option<ValueType> {
    if value_type.kind.is_number() || value_type.is_nothing() {
        Some(ValueType::of(ValueKind::Double))
    } else {
        None
    }
}

fn big_decimals(values: &[Value], value_type: ValueType) -> Result<Vec<Decimal>> {
    values
        .iter()
        .map(|value| match value {
            Value::BigDecimal(v) if value_type.kind == ValueKind::BigDecimal => Ok(*v),
            Value::BigInteger(v) if value_type.kind == ValueKind::BigInteger => {
                Decimal::from_str(&v.to_string()).map_err(|_| {
                    StatsError::overflow(format!("BigInteger {v} exceeds the decimal range"))
                })
            }
            other => Err(kind_mismatch(other, value_type, "variance")),
        })
        .collect()
}

fn exact_variance(values: &[Decimal], ddof: usize) -> Result<f64> {
    let count = values.len();
    if count <= ddof {
        return Ok(f64::NAN);
    }
    let overflow = || StatsError::overflow("exact variance exceeded the decimal range");

    let mut total = Decimal::ZERO;
    for value in values {
        total = total.checked_add(*value).ok_or_else(overflow)?;
    }
    let mean = total
        .checked_div(Decimal::from(count))
        .ok_or_else(overflow)?;

    let mut squares = Decimal::ZERO;
    for value in values {
        let deviation = value.checked_sub(mean).ok_or_else(overflow)?;
        let square = deviation.checked_mul(deviation).ok_or_else(overflow)?;
        squares = squares.checked_add(square).ok_or_else(overflow)?;
    }
    let variance = squares
        .checked_div(Decimal::from(count - ddof))
        .ok_or_else(overflow)?;

    variance.to_f64().ok_or_else(overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn ints(values: &[i32]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn test_sample_std() {
        let values = ints(&[2, 4, 4, 4, 5, 5, 7, 9]);
        let result = std(&values, ValueType::of(ValueKind::Int), false, 1).unwrap();
        assert!((result - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn test_population_std() {
        let values = ints(&[2, 4, 4, 4, 5, 5, 7, 9]);
        let result = std(&values, ValueType::of(ValueKind::Int), false, 0).unwrap();
        assert!((result - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_count_not_above_ddof_is_nan() {
        let values = ints(&[5]);
        assert!(std(&values, ValueType::of(ValueKind::Int), false, 1)
            .unwrap()
            .is_nan());
        assert!(std(&[], ValueType::nothing(), false, 1).unwrap().is_nan());
    }

    #[test]
    fn test_nan_handling() {
        let values = vec![
            Value::Double(1.0),
            Value::Double(f64::NAN),
            Value::Double(3.0),
        ];
        let ty = ValueType::of(ValueKind::Double);
        assert!(variance(&values, ty, false, 1).unwrap().is_nan());
        assert!((variance(&values, ty, true, 1).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_basic_stats() {
        let stats = BasicStats::from_f64s(&[1.0, 2.0, 3.0, 4.0], false);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.sum_of_squared_deviations, 5.0);
        assert!((stats.variance(1) - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_big_decimal_variance() {
        let values: Vec<Value> = ["1.5", "2.5", "3.5"]
            .into_iter()
            .map(|s| Value::BigDecimal(Decimal::from_str(s).unwrap()))
            .collect();
        let result = variance(&values, ValueType::of(ValueKind::BigDecimal), false, 1).unwrap();
        assert!((result - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_big_integer_std() {
        let values: Vec<Value> = [2, 4, 4, 4, 5, 5, 7, 9]
            .into_iter()
            .map(|v| Value::BigInteger(BigInt::from(v)))
            .collect();
        let result = std(&values, ValueType::of(ValueKind::BigInteger), false, 0).unwrap();
        assert!((result - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_unsupported_kinds() {
        let values = vec![Value::from("x")];
        let err = std(&values, ValueType::of(ValueKind::String), false, 1).unwrap_err();
        assert!(matches!(err, StatsError::UnsupportedType { .. }));

        let err = std(&ints(&[1]), ValueType::of(ValueKind::Number), false, 1).unwrap_err();
        assert!(err.is_invariant_violation());
    }
}
