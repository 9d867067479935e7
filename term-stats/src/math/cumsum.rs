//! Cumulative sum kernel.
//!
//! Unlike the other kernels, the cumulative sum keeps the shape of its input,
//! so it accepts nullable sequences and applies its own missing-value policy:
//!
//! - without `skip_nan`, every position from the first null or NaN onwards
//!   becomes NaN (Float and Double) or null (integral kinds);
//! - with `skip_nan`, accumulation continues with the next valid element.
//!   A NaN position repeats the running sum; a null position of an integral
//!   kind stays null.

use num_traits::{Float, WrappingAdd, Zero};
use tracing::{debug, instrument};

use super::kind_mismatch;
use crate::error::{Result, StatsError};
use crate::lattice::{convert, kinds_of, unify, UnifyOptions};
use crate::types::{Value, ValueKind, ValueType};

const OPERATION: &str = "cumulative sum";

/// Computes the running sum of `values`.
///
/// The output has the same length as the input. Byte and Short accumulate as
/// Int. Mixed primitive numbers are unified first.
///
/// ```rust
/// use term_stats::math::cum_sum;
/// use term_stats::types::{Value, ValueKind, ValueType};
///
/// let values = vec![Some(Value::Double(1.0)), Some(Value::Double(2.0)), Some(Value::Double(f64::NAN)), Some(Value::Double(4.0))];
/// let sums = cum_sum(&values, ValueType::of(ValueKind::Double), true).unwrap();
/// assert_eq!(sums[3], Some(Value::Double(7.0)));
/// ```
#[instrument(skip(values), fields(count = values.len()))]
pub fn cum_sum(
    values: &[Option<Value>],
    value_type: ValueType,
    skip_nan: bool,
) -> Result<Vec<Option<Value>>> {
    match value_type.kind {
        ValueKind::Double => floating(values, value_type, skip_nan, as_double, Value::Double),
        ValueKind::Float => floating(values, value_type, skip_nan, as_float, Value::Float),
        ValueKind::Byte => integral(values, value_type, skip_nan, byte_as_int, Value::Int),
        ValueKind::Short => integral(values, value_type, skip_nan, short_as_int, Value::Int),
        ValueKind::Int => integral(values, value_type, skip_nan, as_int, Value::Int),
        ValueKind::Long => integral(values, value_type, skip_nan, as_long, Value::Long),
        ValueKind::BigInteger | ValueKind::BigDecimal => Err(StatsError::unsupported(
            OPERATION,
            value_type,
            "only primitive numbers are supported",
        )),
        ValueKind::Number => {
            let present: Vec<Value> = values.iter().flatten().cloned().collect();
            let unified = unify(kinds_of(&present)?, UnifyOptions::PrimitivesOnly)?;
            debug!(unified = %unified, "unified mixed numbers for the cumulative sum");
            let converted = values
                .iter()
                .map(|value| value.as_ref().map(|v| convert(v, unified)).transpose())
                .collect::<Result<Vec<_>>>()?;
            cum_sum(
                &converted,
                ValueType::of(unified.into()).with_nullability(value_type.nullable),
                skip_nan,
            )
        }
        ValueKind::Nothing => Ok(values.to_vec()),
        ValueKind::String
        | ValueKind::Boolean
        | ValueKind::Date
        | ValueKind::DateTime
        | ValueKind::Any => Err(StatsError::unsupported(
            OPERATION,
            value_type,
            "only primitive numbers are supported",
        )),
    }
}

/// Result type of [`cum_sum`] for a given input type.
///
/// Floating results are never nullable since missing positions become NaN.
/// Integral results keep the nullability of the input.
pub fn cum_sum_return_type(value_type: ValueType, _skip_nan: bool) -> Result<ValueType> {
    match value_type.kind {
        ValueKind::Byte | ValueKind::Short | ValueKind::Int => {
            Ok(ValueType::of(ValueKind::Int).with_nullability(value_type.nullable))
        }
        ValueKind::Long => Ok(ValueType::of(ValueKind::Long).with_nullability(value_type.nullable)),
        ValueKind::Float | ValueKind::Double => Ok(value_type.non_null()),
        ValueKind::Nothing | ValueKind::Number => Ok(value_type),
        ValueKind::BigInteger
        | ValueKind::BigDecimal
        | ValueKind::String
        | ValueKind::Boolean
        | ValueKind::Date
        | ValueKind::DateTime
        | ValueKind::Any => Err(StatsError::unsupported(
            OPERATION,
            value_type,
            "only primitive numbers are supported",
        )),
    }
}

fn as_double(value: &Value) -> Option<f64> {
    match value {
        Value::Double(v) => Some(*v),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f32> {
    match value {
        Value::Float(v) => Some(*v),
        _ => None,
    }
}

fn byte_as_int(value: &Value) -> Option<i32> {
    match value {
        Value::Byte(v) => Some(i32::from(*v)),
        _ => None,
    }
}

fn short_as_int(value: &Value) -> Option<i32> {
    match value {
        Value::Short(v) => Some(i32::from(*v)),
        _ => None,
    }
}

fn as_int(value: &Value) -> Option<i32> {
    match value {
        Value::Int(v) => Some(*v),
        _ => None,
    }
}

fn as_long(value: &Value) -> Option<i64> {
    match value {
        Value::Long(v) => Some(*v),
        _ => None,
    }
}

fn extract<T>(
    value: &Option<Value>,
    value_type: ValueType,
    read: fn(&Value) -> Option<T>,
) -> Result<Option<T>> {
    match value {
        None if value_type.nullable => Ok(None),
        None => Err(StatsError::invariant(format!(
            "encountered a null in {OPERATION} for non-nullable type {value_type}"
        ))),
        Some(v) => read(v)
            .map(Some)
            .ok_or_else(|| kind_mismatch(v, value_type, OPERATION)),
    }
}

fn floating<T: Float>(
    values: &[Option<Value>],
    value_type: ValueType,
    skip_nan: bool,
    read: fn(&Value) -> Option<T>,
    wrap: fn(T) -> Value,
) -> Result<Vec<Option<Value>>> {
    let mut total = T::zero();
    let mut poisoned = false;
    let mut output = Vec::with_capacity(values.len());

    for value in values {
        let current = extract(value, value_type, read)?.filter(|v| !v.is_nan());
        let next = match current {
            _ if poisoned => T::nan(),
            Some(v) => {
                total = total + v;
                total
            }
            None if skip_nan => total,
            None => {
                poisoned = true;
                T::nan()
            }
        };
        output.push(Some(wrap(next)));
    }
    Ok(output)
}

fn integral<T: Copy + WrappingAdd + Zero>(
    values: &[Option<Value>],
    value_type: ValueType,
    skip_nan: bool,
    read: fn(&Value) -> Option<T>,
    wrap: fn(T) -> Value,
) -> Result<Vec<Option<Value>>> {
    let mut total = T::zero();
    let mut poisoned = false;
    let mut output = Vec::with_capacity(values.len());

    for value in values {
        let next = match extract(value, value_type, read)? {
            _ if poisoned => None,
            Some(v) => {
                total = total.wrapping_add(&v);
                Some(wrap(total))
            }
            None if skip_nan => None,
            None => {
                poisoned = true;
                None
            }
        };
        output.push(next);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doubles(values: &[f64]) -> Vec<Option<Value>> {
        values.iter().map(|v| Some(Value::Double(*v))).collect()
    }

    fn unwrap_doubles(values: Vec<Option<Value>>) -> Vec<f64> {
        values
            .into_iter()
            .map(|v| match v {
                Some(Value::Double(d)) => d,
                other => panic!("expected a Double, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_nan_propagates_without_skip() {
        let result = cum_sum(&doubles(&[1.0, 2.0, f64::NAN, 4.0]), ValueType::of(ValueKind::Double), false)
            .unwrap();
        let result = unwrap_doubles(result);
        assert_eq!(&result[..2], &[1.0, 3.0]);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn test_nan_skipped() {
        let result = cum_sum(&doubles(&[1.0, 2.0, f64::NAN, 4.0]), ValueType::of(ValueKind::Double), true)
            .unwrap();
        assert_eq!(unwrap_doubles(result), vec![1.0, 3.0, 3.0, 7.0]);
    }

    #[test]
    fn test_nullable_floats_become_nan() {
        let values = vec![Some(Value::Float(1.0)), None, Some(Value::Float(2.0))];
        let result = cum_sum(&values, ValueType::nullable_of(ValueKind::Float), false).unwrap();
        assert_eq!(result[0], Some(Value::Float(1.0)));
        assert!(result[1].as_ref().is_some_and(Value::is_nan));
        assert!(result[2].as_ref().is_some_and(Value::is_nan));
    }

    #[test]
    fn test_integral_nulls() {
        let values = vec![Some(Value::Short(1)), Some(Value::Short(2)), None, Some(Value::Short(4))];
        let ty = ValueType::nullable_of(ValueKind::Short);

        let propagated = cum_sum(&values, ty, false).unwrap();
        assert_eq!(propagated, vec![Some(Value::Int(1)), Some(Value::Int(3)), None, None]);

        let skipped = cum_sum(&values, ty, true).unwrap();
        assert_eq!(
            skipped,
            vec![Some(Value::Int(1)), Some(Value::Int(3)), None, Some(Value::Int(7))]
        );
    }

    #[test]
    fn test_skipped_leading_null_stays_null() {
        let values = vec![None, Some(Value::Int(1)), None, Some(Value::Int(2))];
        let result = cum_sum(&values, ValueType::nullable_of(ValueKind::Int), true).unwrap();
        assert_eq!(result, vec![None, Some(Value::Int(1)), None, Some(Value::Int(3))]);
        assert_eq!(
            cum_sum_return_type(ValueType::nullable_of(ValueKind::Int), true).unwrap(),
            ValueType::nullable_of(ValueKind::Int)
        );
    }

    #[test]
    fn test_mixed_numbers() {
        let values = vec![Some(Value::Int(1)), Some(Value::Long(2)), Some(Value::Byte(3))];
        let result = cum_sum(&values, ValueType::of(ValueKind::Number), false).unwrap();
        assert_eq!(
            result,
            vec![Some(Value::Long(1)), Some(Value::Long(3)), Some(Value::Long(6))]
        );
    }

    #[test]
    fn test_empty_and_unsupported() {
        let nulls = vec![None, None];
        let result = cum_sum(&nulls, ValueType::nullable_of(ValueKind::Nothing), false).unwrap();
        assert_eq!(result, nulls);

        let big = vec![Some(Value::BigInteger(1.into()))];
        assert!(cum_sum(&big, ValueType::of(ValueKind::BigInteger), false).is_err());
    }

    #[test]
    fn test_null_in_non_nullable_type() {
        let values = vec![Some(Value::Int(1)), None];
        let err = cum_sum(&values, ValueType::of(ValueKind::Int), false).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_return_type() {
        assert_eq!(
            cum_sum_return_type(ValueType::nullable_of(ValueKind::Byte), false).unwrap(),
            ValueType::nullable_of(ValueKind::Int)
        );
        assert_eq!(
            cum_sum_return_type(ValueType::nullable_of(ValueKind::Long), true).unwrap(),
            ValueType::nullable_of(ValueKind::Long)
        );
        assert_eq!(
            cum_sum_return_type(ValueType::nullable_of(ValueKind::Double), false).unwrap(),
            ValueType::of(ValueKind::Double)
        );
        assert!(cum_sum_return_type(ValueType::of(ValueKind::String), false).is_err());
    }
}
