//! Minimum and maximum kernels.
//!
//! Both work over any self-comparable kind, not only numbers.

use std::cmp::Ordering;
use tracing::{debug, instrument};

use super::{ensure_non_nullable, kind_mismatch};
use crate::error::{Result, StatsError};
use crate::lattice::{convert_all, kinds_of, unify, UnifyOptions};
use crate::types::{Value, ValueKind, ValueType};

/// Returns the smallest element, or `None` for an empty sequence.
///
/// For Float and Double sequences a NaN element is returned as the result
/// unless `skip_nan` is set, in which case NaN elements are ignored.
#[instrument(skip(values), fields(count = values.len()))]
pub fn min(values: &[Value], value_type: ValueType, skip_nan: bool) -> Result<Option<Value>> {
    extreme(values, value_type, skip_nan, "min", Ordering::Less)
}

/// Returns the largest element, or `None` for an empty sequence.
///
/// NaN handling matches [`min`].
#[instrument(skip(values), fields(count = values.len()))]
pub fn max(values: &[Value], value_type: ValueType, skip_nan: bool) -> Result<Option<Value>> {
    extreme(values, value_type, skip_nan, "max", Ordering::Greater)
}

/// Result type of [`min`] and [`max`].
///
/// The input kind is preserved; the result is nullable when the input is
/// empty. Mixed numbers are only known after unification.
pub fn min_max_return_type(value_type: ValueType, is_empty: bool) -> Option<ValueType> {
    if value_type.is_nothing() {
        return Some(ValueType::nullable_of(ValueKind::Nothing));
    }
    if value_type.kind.is_self_comparable() {
        Some(value_type.with_nullability(is_empty))
    } else {
        None
    }
}

fn extreme(
    values: &[Value],
    value_type: ValueType,
    skip_nan: bool,
    operation: &str,
    wanted: Ordering,
) -> Result<Option<Value>> {
    ensure_non_nullable(value_type, operation)?;

    if value_type.is_nothing() {
        return match values.first() {
            None => Ok(None),
            Some(value) => Err(kind_mismatch(value, value_type, operation)),
        };
    }

    if value_type.kind == ValueKind::Number {
        let unified = unify(kinds_of(values)?, UnifyOptions::Default)?;
        debug!(operation, unified = %unified, "unifying mixed numbers");
        let converted = convert_all(values, unified)?;
        return extreme(
            &converted,
            ValueType::of(unified.into()),
            skip_nan,
            operation,
            wanted,
        );
    }

    if !value_type.kind.is_self_comparable() {
        return Err(StatsError::unsupported(
            operation,
            value_type,
            "values are not mutually comparable",
        ));
    }

    if let Some(value) = values.iter().find(|value| value.kind() != value_type.kind) {
        return Err(kind_mismatch(value, value_type, operation));
    }

    if value_type.kind.can_be_nan() && !skip_nan {
        if let Some(nan) = values.iter().find(|value| value.is_nan()) {
            return Ok(Some(nan.clone()));
        }
    }

    let best = values
        .iter()
        .filter(|value| !value.is_nan())
        .reduce(|best, value| {
            if value.total_cmp(best) == wanted {
                value
            } else {
                best
            }
        });
    Ok(best.cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_min_max_ints() {
        let values: Vec<Value> = [3, 1, 4, 1, 5].into_iter().map(Value::Int).collect();
        let ty = ValueType::of(ValueKind::Int);
        assert_eq!(min(&values, ty, false).unwrap(), Some(Value::Int(1)));
        assert_eq!(max(&values, ty, false).unwrap(), Some(Value::Int(5)));
    }

    #[test]
    fn test_min_max_strings_and_dates() {
        let words: Vec<Value> = ["pear", "apple", "fig"].into_iter().map(Value::from).collect();
        let ty = ValueType::of(ValueKind::String);
        assert_eq!(min(&words, ty, false).unwrap(), Some(Value::from("apple")));
        assert_eq!(max(&words, ty, false).unwrap(), Some(Value::from("pear")));

        let dates: Vec<Value> = [(2024, 3, 1), (2023, 12, 31)]
            .into_iter()
            .map(|(y, m, d)| Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap()))
            .collect();
        let latest = max(&dates, ValueType::of(ValueKind::Date), false).unwrap();
        assert_eq!(
            latest,
            Some(Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );
    }

    #[test]
    fn test_nan_poisons_unless_skipped() {
        let values = vec![Value::Double(2.0), Value::Double(f64::NAN), Value::Double(-1.0)];
        let ty = ValueType::of(ValueKind::Double);

        let poisoned = min(&values, ty, false).unwrap().unwrap();
        assert!(poisoned.is_nan());
        assert_eq!(min(&values, ty, true).unwrap(), Some(Value::Double(-1.0)));
        assert_eq!(max(&values, ty, true).unwrap(), Some(Value::Double(2.0)));
    }

    #[test]
    fn test_only_nan_skipped_is_none() {
        let values = vec![Value::Float(f32::NAN)];
        assert_eq!(min(&values, ValueType::of(ValueKind::Float), true).unwrap(), None);
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(min(&[], ValueType::nothing(), false).unwrap(), None);
        assert_eq!(max(&[], ValueType::of(ValueKind::Int), false).unwrap(), None);
    }

    #[test]
    fn test_mixed_numbers_are_unified() {
        let values = vec![Value::Int(3), Value::Double(2.5), Value::Byte(7)];
        let result = max(&values, ValueType::of(ValueKind::Number), false).unwrap();
        assert_eq!(result, Some(Value::Double(7.0)));
    }

    #[test]
    fn test_rejects_incomparable() {
        let values = vec![Value::Int(1), Value::from("a")];
        let err = min(&values, ValueType::of(ValueKind::Any), false).unwrap_err();
        assert!(matches!(err, StatsError::UnsupportedType { .. }));
    }

    #[test]
    fn test_return_type() {
        let int = ValueType::of(ValueKind::Int);
        assert_eq!(min_max_return_type(int, false), Some(int));
        assert_eq!(
            min_max_return_type(int, true),
            Some(ValueType::nullable_of(ValueKind::Int))
        );
        assert_eq!(min_max_return_type(ValueType::of(ValueKind::Number), false), None);
    }
}
