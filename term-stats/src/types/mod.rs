//! Value and type model shared by kernels and aggregators.

pub mod kind;
pub mod value;

pub use kind::{ValueKind, ValueType};
pub use value::Value;

/// Splits off nulls according to the declared type.
///
/// Returns the non-null values together with the non-nullable type. A
/// non-nullable declaration that still contains a null is an invariant
/// violation of the caller.
pub(crate) fn strip_nulls(
    values: &[Option<Value>],
    value_type: ValueType,
    operation: &str,
) -> crate::error::Result<(Vec<Value>, ValueType)> {
    if !value_type.nullable && values.iter().any(Option::is_none) {
        return Err(crate::error::StatsError::invariant(format!(
            "encountered a null in {operation} for non-nullable type {value_type}"
        )));
    }
    let non_null = values.iter().flatten().cloned().collect();
    Ok((non_null, value_type.non_null()))
}
