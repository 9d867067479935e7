//! Sum kernel.

use num_bigint::BigInt;
use rust_decimal::Decimal;
use tracing::instrument;

use super::{ensure_non_nullable, kind_mismatch, unresolved_number};
use crate::error::{Result, StatsError};
use crate::types::{Value, ValueKind, ValueType};

/// Sums a non-nullable sequence of numbers.
///
/// Byte, Short and Int are accumulated as Int, other kinds keep their own
/// representation. Integral sums wrap on overflow like the primitive types do;
/// BigDecimal sums fail with [`StatsError::Overflow`] instead. An empty
/// sequence of an unknown kind (`Nothing`) sums to `Double(0.0)`.
///
/// With `skip_nan`, NaN elements of Float and Double sequences are ignored;
/// otherwise a single NaN makes the result NaN.
#[instrument(skip(values), fields(count = values.len()))]
pub fn sum(values: &[Value], value_type: ValueType, skip_nan: bool) -> Result<Value> {
    ensure_non_nullable(value_type, "sum")?;

    match value_type.kind {
        ValueKind::Nothing => match values.first() {
            None => Ok(Value::Double(0.0)),
            Some(value) => Err(kind_mismatch(value, value_type, "sum")),
        },
        ValueKind::Byte | ValueKind::Short | ValueKind::Int => {
            let mut total: i32 = 0;
            for value in values {
                let v = match value {
                    Value::Byte(v) if value_type.kind == ValueKind::Byte => i32::from(*v),
                    Value::Short(v) if value_type.kind == ValueKind::Short => i32::from(*v),
                    Value::Int(v) if value_type.kind == ValueKind::Int => *v,
                    other => return Err(kind_mismatch(other, value_type, "sum")),
                };
                total = total.wrapping_add(v);
            }
            Ok(Value::Int(total))
        }
        ValueKind::Long => {
            let mut total: i64 = 0;
            for value in values {
                match value {
                    Value::Long(v) => total = total.wrapping_add(*v),
                    other => return Err(kind_mismatch(other, value_type, "sum")),
                }
            }
            Ok(Value::Long(total))
        }
        ValueKind::Float => {
            let mut total: f32 = 0.0;
            for value in values {
                match value {
                    Value::Float(v) if skip_nan && v.is_nan() => {}
                    Value::Float(v) => total += *v,
                    other => return Err(kind_mismatch(other, value_type, "sum")),
                }
            }
            Ok(Value::Float(total))
        }
        ValueKind::Double => {
            let mut total: f64 = 0.0;
            for value in values {
                match value {
                    Value::Double(v) if skip_nan && v.is_nan() => {}
                    Value::Double(v) => total += *v,
                    other => return Err(kind_mismatch(other, value_type, "sum")),
                }
            }
            Ok(Value::Double(total))
        }
        ValueKind::BigInteger => {
            let mut total = BigInt::from(0);
            for value in values {
                match value {
                    Value::BigInteger(v) => total += v,
                    other => return Err(kind_mismatch(other, value_type, "sum")),
                }
            }
            Ok(Value::BigInteger(total))
        }
        ValueKind::BigDecimal => {
            let mut total = Decimal::ZERO;
            for value in values {
                match value {
                    Value::BigDecimal(v) => {
                        total = total.checked_add(*v).ok_or_else(|| {
                            StatsError::overflow(format!("BigDecimal sum overflowed adding {v}"))
                        })?;
                    }
                    other => return Err(kind_mismatch(other, value_type, "sum")),
                }
            }
            Ok(Value::BigDecimal(total))
        }
        ValueKind::Number => Err(unresolved_number(value_type, "sum")),
        ValueKind::String
        | ValueKind::Boolean
        | ValueKind::Date
        | ValueKind::DateTime
        | ValueKind::Any => Err(StatsError::unsupported(
            "sum",
            value_type,
            "only numbers are supported",
        )),
    }
}

/// Result type of [`sum`] for a given input type.
///
/// Returns `None` when the result can only be known after unifying the values.
pub fn sum_return_type(value_type: ValueType) -> Option<ValueType> {
    let kind = match value_type.kind {
        ValueKind::Byte | ValueKind::Short | ValueKind::Int => ValueKind::Int,
        ValueKind::Nothing => ValueKind::Double,
        kind @ (ValueKind::Long
        | ValueKind::Float
        | ValueKind::Double
        | ValueKind::BigInteger
        | ValueKind::BigDecimal) => kind,
        ValueKind::Number
        | ValueKind::String
        | ValueKind::Boolean
        | ValueKind::Date
        | ValueKind::DateTime
        | ValueKind::Any => return None,
    };
    Some(ValueType::of(kind))
}
