//! Quantile estimation.
//!
//! Four of the Hyndman & Fan sample quantile definitions are provided. R1 and
//! R3 select an existing element and therefore work for any self-comparable
//! kind. R7 and R8 interpolate linearly between the two neighbouring order
//! statistics and require primitive numbers.
//!
//! # Example
//!
//! ```rust
//! use term_stats::math::{quantile, QuantileEstimationMethod};
//! use term_stats::types::{Value, ValueKind, ValueType};
//!
//! let values: Vec<Value> = [5, 2, 8, 1, 9].into_iter().map(Value::Int).collect();
//! let q = quantile(&values, ValueType::of(ValueKind::Int), 0.25, false, QuantileEstimationMethod::R8)
//!     .unwrap()
//!     .unwrap();
//! assert!((q.as_f64().unwrap() - 1.6667).abs() < 1e-3);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::{instrument, warn};

use super::quickselect::{quickselect_by, quickselect_f64};
use super::{ensure_non_nullable, ensure_probability, kind_mismatch, primitive_f64s};
use crate::error::{Result, StatsError};
use crate::lattice::{convert_all, kinds_of, unify, UnifyOptions};
use crate::types::{Value, ValueKind, ValueType};

/// Sample quantile definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantileEstimationMethod {
    /// Inverse of the empirical distribution function.
    R1,
    /// Nearest observation.
    R3,
    /// Linear interpolation of the modes of the order statistics.
    R7,
    /// Linear interpolation of the approximate medians of the order
    /// statistics; approximately median-unbiased.
    R8,
}

impl QuantileEstimationMethod {
    /// Returns `true` for the methods that return an existing element.
    pub fn is_selecting(self) -> bool {
        matches!(self, Self::R1 | Self::R3)
    }

    /// Returns `true` for the methods that interpolate between elements.
    pub fn is_interpolating(self) -> bool {
        !self.is_selecting()
    }

    /// Returns the 1-based index of the `p`-quantile in a sorted sample of
    /// `count` elements, clamped to `[1, count]`.
    ///
    /// For selecting methods the index is a whole number.
    pub fn index_for_quantile(self, p: f64, count: usize) -> f64 {
        let n = count as f64;
        let index = match self {
            Self::R1 => (p * n).ceil(),
            Self::R3 => (n * p).round(),
            Self::R7 => (n - 1.0) * p + 1.0,
            Self::R8 => (n + 1.0 / 3.0) * p + 1.0 / 3.0,
        };
        index.clamp(1.0, n.max(1.0))
    }
}

impl fmt::Display for QuantileEstimationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::R1 => "R1",
            Self::R3 => "R3",
            Self::R7 => "R7",
            Self::R8 => "R8",
        };
        f.write_str(name)
    }
}

/// Resolved 0-based position(s) of a quantile in sorted order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantileIndex {
    /// The quantile is the element at this rank.
    Selecting(usize),
    /// The quantile lies `fraction` of the way from rank `lower` to `upper`.
    Interpolating {
        lower: usize,
        upper: usize,
        fraction: f64,
    },
}

/// Resolves the rank(s) of the `p`-quantile for a sample of `count` elements.
///
/// Returns `Ok(None)` for an empty sample.
pub fn index_of_quantile(
    p: f64,
    count: usize,
    method: QuantileEstimationMethod,
) -> Result<Option<QuantileIndex>> {
    ensure_probability(p, "quantile")?;
    if count == 0 {
        return Ok(None);
    }
    let h = method.index_for_quantile(p, count);
    let rank = |index: f64| (index as usize).clamp(1, count) - 1;
    Ok(Some(if method.is_selecting() {
        QuantileIndex::Selecting(rank(h))
    } else {
        QuantileIndex::Interpolating {
            lower: rank(h.floor()),
            upper: rank(h.ceil()),
            fraction: h - h.floor(),
        }
    }))
}

/// Computes the `p`-quantile of a non-nullable sequence.
///
/// - An empty sequence yields `None`.
/// - A single element keeps its own kind for selecting methods, so an Int
///   element yields an Int and a String yields a String, as
///   [`quantile_return_type`] predicts. Interpolating methods always yield
///   Double, including for a single element.
/// - Without `skip_nan`, a NaN element makes the result NaN: Double for
///   interpolating methods, of the element kind for selecting ones.
/// - Mixed primitive numbers (`Number`) are unified first.
///
/// # Errors
///
/// - [`StatsError::OutOfDomain`] when `p` is outside `[0, 1]`.
/// - [`StatsError::UnsupportedType`] for big numbers, incomparable kinds, and
///   non-numeric kinds with an interpolating method.
#[instrument(skip(values), fields(count = values.len()))]
pub fn quantile(
    values: &[Value],
    value_type: ValueType,
    p: f64,
    skip_nan: bool,
    method: QuantileEstimationMethod,
) -> Result<Option<Value>> {
    ensure_probability(p, "quantile")?;
    ensure_non_nullable(value_type, "quantile")?;

    match value_type.kind {
        ValueKind::Nothing => {
            return match values.first() {
                None => Ok(None),
                Some(value) => Err(kind_mismatch(value, value_type, "quantile")),
            };
        }
        ValueKind::Number => {
            let unified = unify(kinds_of(values)?, UnifyOptions::PrimitivesOnly)?;
            let converted = convert_all(values, unified)?;
            return quantile(
                &converted,
                ValueType::of(unified.into()),
                p,
                skip_nan,
                method,
            );
        }
        ValueKind::BigInteger | ValueKind::BigDecimal => {
            return Err(StatsError::unsupported(
                "quantile",
                value_type,
                "only primitive numbers are supported",
            ));
        }
        kind if !kind.is_self_comparable() => {
            return Err(StatsError::unsupported(
                "quantile",
                value_type,
                "only primitive numbers or self-comparables are supported",
            ));
        }
        kind if method.is_interpolating() && !kind.is_primitive_number() => {
            return Err(StatsError::unsupported(
                "quantile",
                value_type,
                format!("estimation method {method} requires primitive numbers"),
            ));
        }
        _ => {}
    }

    if let Some(value) = values.iter().find(|value| value.kind() != value_type.kind) {
        return Err(kind_mismatch(value, value_type, "quantile"));
    }

    if value_type.kind.can_be_nan() && !skip_nan {
        if let Some(nan) = values.iter().find(|value| value.is_nan()) {
            return Ok(Some(if method.is_selecting() {
                nan.clone()
            } else {
                Value::Double(f64::NAN)
            }));
        }
    }

    let sample: Vec<Value> = values
        .iter()
        .filter(|value| !value.is_nan())
        .cloned()
        .collect();

    let Some(index) = index_of_quantile(p, sample.len(), method)? else {
        return Ok(None);
    };

    match index {
        QuantileIndex::Selecting(rank) => {
            quickselect_by(&sample, rank, |a, b| a.total_cmp(b)).map(Some)
        }
        QuantileIndex::Interpolating {
            lower,
            upper,
            fraction,
        } => {
            if value_type.kind == ValueKind::Long && sample.len() > 1 {
                warn!(
                    method = %method,
                    "Converting Longs to Doubles to calculate the quantile, loss of precision may occur"
                );
            }
            let numbers = primitive_f64s(&sample, value_type, "quantile")?;
            let low = quickselect_f64(&numbers, lower)?;
            if upper == lower {
                return Ok(Some(Value::Double(low)));
            }
            let high = quickselect_f64(&numbers, upper)?;
            Ok(Some(Value::Double(low + (high - low) * fraction)))
        }
    }
}

/// Returns the position in `values` of the element the selecting `method`
/// picks as the `p`-quantile.
///
/// Nulls are ignored but still count towards positions. Equal elements are
/// ordered by position. Without `skip_nan`, the position of the first NaN is
/// returned when one is present. Returns `None` when there is nothing to
/// select from.
pub fn position_of_quantile(
    values: &[Option<Value>],
    value_type: ValueType,
    p: f64,
    skip_nan: bool,
    method: QuantileEstimationMethod,
) -> Result<Option<usize>> {
    ensure_probability(p, "quantile")?;
    let kind = value_type.kind;
    if kind != ValueKind::Nothing
        && kind != ValueKind::Number
        && !kind.is_self_comparable()
    {
        return Err(StatsError::unsupported(
            "quantile",
            value_type,
            "only primitive numbers or self-comparables are supported",
        ));
    }
    if method.is_interpolating() {
        return Err(StatsError::unsupported(
            "quantile position",
            value_type,
            format!("estimation method {method} does not select an existing element"),
        ));
    }

    if !skip_nan {
        if let Some(position) = values
            .iter()
            .position(|value| value.as_ref().is_some_and(Value::is_nan))
        {
            return Ok(Some(position));
        }
    }

    let indexed: Vec<(usize, &Value)> = values
        .iter()
        .enumerate()
        .filter_map(|(position, value)| value.as_ref().map(|v| (position, v)))
        .filter(|(_, value)| !value.is_nan())
        .collect();

    match index_of_quantile(p, indexed.len(), method)? {
        Some(QuantileIndex::Selecting(rank)) => {
            let (position, _) = quickselect_by(&indexed, rank, |a, b| {
                match a.1.total_cmp(b.1) {
                    Ordering::Equal => a.0.cmp(&b.0),
                    ordering => ordering,
                }
            })?;
            Ok(Some(position))
        }
        Some(QuantileIndex::Interpolating { .. }) | None => Ok(None),
    }
}

/// Result type of [`quantile`] with `method` for a given input type.
pub fn quantile_return_type(
    value_type: ValueType,
    method: QuantileEstimationMethod,
    is_empty: bool,
) -> Option<ValueType> {
    let kind = value_type.kind;
    if kind == ValueKind::Nothing {
        return Some(ValueType::nullable_of(ValueKind::Nothing));
    }
    if kind.is_big_number() {
        return None;
    }
    if method.is_interpolating() {
        return (kind.is_primitive_number() || kind == ValueKind::Number)
            .then(|| ValueType::of(ValueKind::Double).with_nullability(is_empty));
    }
    kind.is_self_comparable()
        .then(|| value_type.with_nullability(is_empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use QuantileEstimationMethod::{R1, R3, R7, R8};

    fn ints(values: &[i32]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    fn as_f64(value: Option<Value>) -> f64 {
        value.and_then(|v| v.as_f64()).unwrap()
    }

    const INT: ValueType = ValueType::of(ValueKind::Int);

    #[test]
    fn test_index_for_quantile() {
        assert_eq!(R1.index_for_quantile(0.5, 4), 2.0);
        assert_eq!(R1.index_for_quantile(0.0, 4), 1.0);
        assert_eq!(R3.index_for_quantile(0.5, 5), 3.0);
        assert_eq!(R7.index_for_quantile(0.5, 4), 2.5);
        assert!((R8.index_for_quantile(0.25, 5) - 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(R8.index_for_quantile(1.0, 3), 3.0);
    }

    #[test]
    fn test_index_of_quantile() {
        assert_eq!(index_of_quantile(0.5, 0, R7).unwrap(), None);
        assert_eq!(
            index_of_quantile(0.5, 5, R1).unwrap(),
            Some(QuantileIndex::Selecting(2))
        );
        assert_eq!(
            index_of_quantile(0.5, 4, R7).unwrap(),
            Some(QuantileIndex::Interpolating {
                lower: 1,
                upper: 2,
                fraction: 0.5
            })
        );
        assert!(index_of_quantile(1.5, 4, R7).is_err());
    }

    #[test]
    fn test_r8_first_quartile() {
        let values = ints(&[5, 2, 8, 1, 9]);
        let q = quantile(&values, INT, 0.25, false, R8).unwrap();
        assert!((as_f64(q) - 1.666_666_7).abs() < 1e-6);
    }

    #[test]
    fn test_r7_even_median() {
        let values = ints(&[4, 1, 3, 2]);
        assert_eq!(quantile(&values, INT, 0.5, false, R7).unwrap(), Some(Value::Double(2.5)));
    }

    #[test]
    fn test_selecting_keeps_kind() {
        let values = ints(&[4, 1, 3, 2, 5]);
        assert_eq!(quantile(&values, INT, 0.5, false, R1).unwrap(), Some(Value::Int(3)));
        assert_eq!(quantile(&values, INT, 0.0, false, R3).unwrap(), Some(Value::Int(1)));
        assert_eq!(quantile(&values, INT, 1.0, false, R1).unwrap(), Some(Value::Int(5)));
    }

    #[test]
    fn test_strings_with_selecting_method() {
        let values: Vec<Value> = ["c", "a", "b"].into_iter().map(Value::from).collect();
        let ty = ValueType::of(ValueKind::String);
        assert_eq!(quantile(&values, ty, 0.5, false, R3).unwrap(), Some(Value::from("b")));

        let err = quantile(&values, ty, 0.5, false, R7).unwrap_err();
        assert!(matches!(err, StatsError::UnsupportedType { .. }));
    }

    #[test]
    fn test_single_element() {
        let values = ints(&[7]);
        assert_eq!(quantile(&values, INT, 0.3, false, R8).unwrap(), Some(Value::Double(7.0)));
        assert_eq!(quantile(&values, INT, 0.3, false, R1).unwrap(), Some(Value::Int(7)));
        assert_eq!(quantile_return_type(INT, R1, false), Some(INT));

        let text = [Value::from("kiwi")];
        let string = ValueType::of(ValueKind::String);
        assert_eq!(quantile(&text, string, 0.9, false, R3).unwrap(), Some(Value::from("kiwi")));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(quantile(&[], ValueType::nothing(), 0.5, false, R8).unwrap(), None);
        assert_eq!(quantile(&[], INT, 0.5, false, R1).unwrap(), None);
    }

    #[test]
    fn test_nan_propagation() {
        let values = vec![Value::Float(1.0), Value::Float(f32::NAN), Value::Float(3.0)];
        let ty = ValueType::of(ValueKind::Float);

        let interpolated = quantile(&values, ty, 0.5, false, R7).unwrap().unwrap();
        assert!(matches!(interpolated, Value::Double(v) if v.is_nan()));

        let selected = quantile(&values, ty, 0.5, false, R3).unwrap().unwrap();
        assert!(matches!(selected, Value::Float(v) if v.is_nan()));

        let skipped = quantile(&values, ty, 0.5, true, R7).unwrap();
        assert_eq!(skipped, Some(Value::Double(2.0)));
    }

    #[test]
    fn test_mixed_numbers_are_unified() {
        let values = vec![Value::Int(1), Value::Double(2.0), Value::Long(3)];
        let result = quantile(&values, ValueType::of(ValueKind::Number), 0.5, false, R7).unwrap();
        assert_eq!(result, Some(Value::Double(2.0)));
    }

    #[test]
    fn test_rejects_invalid_input() {
        let values = ints(&[1, 2]);
        assert!(matches!(
            quantile(&values, INT, -0.1, false, R7).unwrap_err(),
            StatsError::OutOfDomain(_)
        ));
        assert!(quantile(&values, ValueType::nullable_of(ValueKind::Int), 0.5, false, R7)
            .unwrap_err()
            .is_invariant_violation());

        let big = vec![Value::BigInteger(1.into())];
        assert!(quantile(&big, ValueType::of(ValueKind::BigInteger), 0.5, false, R1).is_err());
    }

    #[test]
    fn test_position_of_quantile() {
        let values = vec![Some(Value::Int(30)), None, Some(Value::Int(10)), Some(Value::Int(20))];
        let ty = ValueType::nullable_of(ValueKind::Int);
        assert_eq!(position_of_quantile(&values, ty, 0.5, false, R3).unwrap(), Some(3));
        assert_eq!(position_of_quantile(&values, ty, 0.0, false, R1).unwrap(), Some(2));
        assert_eq!(position_of_quantile(&values, ty, 1.0, false, R1).unwrap(), Some(0));
        assert!(position_of_quantile(&values, ty, 0.5, false, R7).is_err());
    }

    #[test]
    fn test_position_of_quantile_ties_and_nan() {
        let tied = vec![Some(Value::Int(1)), Some(Value::Int(1)), Some(Value::Int(1))];
        assert_eq!(position_of_quantile(&tied, INT, 0.5, false, R3).unwrap(), Some(1));

        let with_nan = vec![Some(Value::Double(1.0)), Some(Value::Double(f64::NAN))];
        let ty = ValueType::of(ValueKind::Double);
        assert_eq!(position_of_quantile(&with_nan, ty, 0.5, false, R1).unwrap(), Some(1));
        assert_eq!(position_of_quantile(&with_nan, ty, 0.5, true, R1).unwrap(), Some(0));

        let empty: Vec<Option<Value>> = vec![None];
        assert_eq!(
            position_of_quantile(&empty, ValueType::nullable_of(ValueKind::Nothing), 0.5, false, R1)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_return_type() {
        assert_eq!(
            quantile_return_type(INT, R8, false),
            Some(ValueType::of(ValueKind::Double))
        );
        assert_eq!(quantile_return_type(INT, R1, true), Some(ValueType::nullable_of(ValueKind::Int)));
        assert_eq!(quantile_return_type(ValueType::of(ValueKind::Number), R3, false), None);
        assert_eq!(quantile_return_type(ValueType::of(ValueKind::String), R7, false), None);
    }
}
