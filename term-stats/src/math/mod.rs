//! Statistical kernels.
//!
//! Every kernel is a pure function over a non-nullable sequence and its
//! resolved element type. Nulls must be filtered by the caller (the
//! [aggregators](crate::aggregators) do this); a nullable type reaching a
//! kernel is an invariant violation. Dispatch happens on
//! [`ValueKind`](crate::types::ValueKind) with exhaustive matches.
//!
//! | kernel       | input kinds                          | empty input |
//! |--------------|--------------------------------------|-------------|
//! | `sum`        | numbers                              | `0.0`       |
//! | `mean`       | primitive numbers                    | `NaN`       |
//! | `std`, `var` | numbers                              | `NaN`       |
//! | `min`, `max` | self-comparable                      | `None`      |
//! | `median`     | self-comparable                      | `None`      |
//! | `percentile` | self-comparable                      | `None`      |
//! | `cum_sum`    | primitive numbers (nullable allowed) | empty       |

pub mod cumsum;
pub mod mean;
pub mod median;
pub mod min_max;
pub mod percentile;
pub mod quantile;
pub mod quickselect;
pub mod sum;
pub mod variance;

pub use cumsum::{cum_sum, cum_sum_return_type};
pub use mean::{mean, mean_return_type};
pub use median::{median, median_return_type};
pub use min_max::{max, min, min_max_return_type};
pub use percentile::{percentile, percentile_return_type, percentile_with};
pub use quantile::{
    index_of_quantile, position_of_quantile, quantile, quantile_return_type, QuantileEstimationMethod,
    QuantileIndex,
};
pub use quickselect::{quickselect, quickselect_by};
pub use sum::{sum, sum_return_type};
pub use variance::{std, std_return_type, variance, BasicStats};

use crate::error::{Result, StatsError};
use crate::types::{Value, ValueType};

pub(crate) fn ensure_non_nullable(value_type: ValueType, operation: &str) -> Result<()> {
    if value_type.nullable {
        return Err(StatsError::invariant(format!(
            "encountered nullable type {value_type} in {operation}; nulls must be filtered first"
        )));
    }
    Ok(())
}

pub(crate) fn kind_mismatch(value: &Value, value_type: ValueType, operation: &str) -> StatsError {
    StatsError::invariant(format!(
        "encountered a {} value in {operation} over {value_type}",
        value.kind()
    ))
}

pub(crate) fn unresolved_number(value_type: ValueType, operation: &str) -> StatsError {
    StatsError::invariant(format!(
        "{operation} received the unresolved type {value_type}; unify the numbers first"
    ))
}

/// Converts primitive numbers to `f64`, rejecting values of another kind.
pub(crate) fn primitive_f64s(
    values: &[Value],
    value_type: ValueType,
    operation: &str,
) -> Result<Vec<f64>> {
    values
        .iter()
        .map(|value| {
            if value.kind() != value_type.kind {
                return Err(kind_mismatch(value, value_type, operation));
            }
            value
                .as_f64()
                .ok_or_else(|| kind_mismatch(value, value_type, operation))
        })
        .collect()
}

pub(crate) fn ensure_probability(p: f64, operation: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(StatsError::out_of_domain(format!(
            "{operation} probability must be in range [0, 1], got {p}"
        )));
    }
    Ok(())
}
