//! Numeric type lattice.
//!
//! Distinct numeric representations are unified into the least common kind
//! that can represent all of them:
//!
//! ```text
//! Byte, Short -> Int -> Long        (integral branch)
//! Float -> Double                    (floating branch, absorbs integral kinds)
//! BigInteger, BigDecimal             (isolated, never mixed implicitly)
//! ```
//!
//! `Nothing` is the identity element: it describes an empty sequence and
//! disappears from any unification with a real kind.

use num_bigint::BigInt;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StatsError};
use crate::types::{Value, ValueKind, ValueType};

/// Concrete numeric kinds known to the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    /// Kind of an empty sequence.
    Nothing,
}

impl NumericKind {
    /// Returns `true` for the integral primitive kinds.
    pub fn is_integral(self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    /// Returns `true` for Float and Double.
    pub fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Returns `true` for BigInteger and BigDecimal.
    pub fn is_big(self) -> bool {
        matches!(self, Self::BigInteger | Self::BigDecimal)
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", ValueKind::from(*self))
    }
}

/// How [`unify`] treats big numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnifyOptions {
    /// Big numbers are allowed on their own but never mixed with other kinds.
    #[default]
    Default,
    /// Big numbers are excluded entirely; their presence is an error.
    PrimitivesOnly,
}

fn render_kinds(kinds: &[NumericKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Computes the least common numeric kind of `kinds`.
///
/// The result does not depend on the order of the input. An empty input, or
/// one consisting of `Nothing` only, yields `Nothing`.
///
/// # Errors
///
/// Returns [`StatsError::UnsupportedType`] when big numbers are mixed with any
/// other kind, or when they appear at all under [`UnifyOptions::PrimitivesOnly`].
pub fn unify<I>(kinds: I, options: UnifyOptions) -> Result<NumericKind>
where
    I: IntoIterator<Item = NumericKind>,
{
    let mut present: Vec<NumericKind> = kinds
        .into_iter()
        .filter(|kind| *kind != NumericKind::Nothing)
        .collect();
    present.sort_unstable();
    present.dedup();

    let Some(&widest) = present.last() else {
        return Ok(NumericKind::Nothing);
    };

    if present.iter().any(|kind| kind.is_big()) {
        if options == UnifyOptions::PrimitivesOnly {
            return Err(StatsError::unsupported(
                "number unification",
                render_kinds(&present),
                "only primitive numbers are supported",
            ));
        }
        if present.len() > 1 {
            return Err(StatsError::unsupported(
                "number unification",
                render_kinds(&present),
                "big numbers cannot be mixed with other number kinds",
            ));
        }
        return Ok(widest);
    }

    if present.len() == 1 {
        return Ok(widest);
    }

    // `present` is sorted narrow to wide and holds at least two primitive kinds.
    Ok(match widest {
        NumericKind::Double | NumericKind::Float | NumericKind::Long => widest,
        _ => NumericKind::Int,
    })
}

/// Unifies declared value types.
///
/// Returns `Ok(None)` when any of the types is not a concrete numeric kind
/// (e.g. the generic `Number`), in which case the values themselves have to be
/// inspected. The result is nullable if any input is.
pub fn unify_value_types(types: &[ValueType], options: UnifyOptions) -> Result<Option<ValueType>> {
    let mut kinds = Vec::with_capacity(types.len());
    for ty in types {
        match ty.kind.numeric() {
            Some(kind) => kinds.push(kind),
            None => return Ok(None),
        }
    }
    let nullable = types.iter().any(|ty| ty.nullable);
    let unified = unify(kinds, options)?;
    Ok(Some(ValueType::of(unified.into()).with_nullability(nullable)))
}

/// Returns `true` when unifying `kinds` into `target` turns Long values into
/// floating ones, which may lose precision.
pub fn widens_long_to_floating(kinds: &[NumericKind], target: NumericKind) -> bool {
    target.is_floating() && kinds.contains(&NumericKind::Long)
}

fn conversion_error(value: &Value, target: NumericKind) -> StatsError {
    StatsError::unsupported(
        "number conversion",
        value.kind(),
        format!("cannot convert {value} to {target} without loss"),
    )
}

/// Converts a single numeric value into `target`.
///
/// Only widening conversions allowed by the lattice succeed; narrowing or
/// non-numeric input is rejected.
pub fn convert(value: &Value, target: NumericKind) -> Result<Value> {
    if value.kind().numeric() == Some(target) {
        return Ok(value.clone());
    }
    let converted = match (target, value) {
        (NumericKind::Short, Value::Byte(v)) => Some(Value::Short(i16::from(*v))),
        (NumericKind::Int, Value::Byte(v)) => Some(Value::Int(i32::from(*v))),
        (NumericKind::Int, Value::Short(v)) => Some(Value::Int(i32::from(*v))),
        (NumericKind::Long, Value::Byte(v)) => Some(Value::Long(i64::from(*v))),
        (NumericKind::Long, Value::Short(v)) => Some(Value::Long(i64::from(*v))),
        (NumericKind::Long, Value::Int(v)) => Some(Value::Long(i64::from(*v))),
        (NumericKind::Float, Value::Byte(v)) => Some(Value::Float(f32::from(*v))),
        (NumericKind::Float, Value::Short(v)) => Some(Value::Float(f32::from(*v))),
        (NumericKind::Float, Value::Int(v)) => Some(Value::Float(*v as f32)),
        (NumericKind::Float, Value::Long(v)) => Some(Value::Float(*v as f32)),
        (NumericKind::Double, v) if v.kind().is_primitive_number() => v.as_f64().map(Value::Double),
        (NumericKind::BigInteger, Value::Byte(v)) => Some(Value::BigInteger(BigInt::from(*v))),
        (NumericKind::BigInteger, Value::Short(v)) => Some(Value::BigInteger(BigInt::from(*v))),
        (NumericKind::BigInteger, Value::Int(v)) => Some(Value::BigInteger(BigInt::from(*v))),
        (NumericKind::BigInteger, Value::Long(v)) => Some(Value::BigInteger(BigInt::from(*v))),
        (NumericKind::BigDecimal, Value::Byte(v)) => Some(Value::BigDecimal(Decimal::from(*v))),
        (NumericKind::BigDecimal, Value::Short(v)) => Some(Value::BigDecimal(Decimal::from(*v))),
        (NumericKind::BigDecimal, Value::Int(v)) => Some(Value::BigDecimal(Decimal::from(*v))),
        (NumericKind::BigDecimal, Value::Long(v)) => Some(Value::BigDecimal(Decimal::from(*v))),
        (NumericKind::BigDecimal, Value::Float(v)) => {
            Decimal::from_f32(*v).map(Value::BigDecimal)
        }
        (NumericKind::BigDecimal, Value::Double(v)) => {
            Decimal::from_f64(*v).map(Value::BigDecimal)
        }
        (NumericKind::BigDecimal, Value::BigInteger(v)) => {
            Decimal::from_str(&v.to_string()).ok().map(Value::BigDecimal)
        }
        _ => None,
    };
    converted.ok_or_else(|| conversion_error(value, target))
}

/// Converts every value into `target`.
///
/// Skips the conversion entirely when all values already have the target kind.
pub fn convert_all(values: &[Value], target: NumericKind) -> Result<Vec<Value>> {
    if values
        .iter()
        .all(|value| value.kind().numeric() == Some(target))
    {
        return Ok(values.to_vec());
    }
    values.iter().map(|value| convert(value, target)).collect()
}

/// Collects the numeric kinds of runtime values.
///
/// Fails for non-numeric values.
pub fn kinds_of(values: &[Value]) -> Result<Vec<NumericKind>> {
    let mut kinds: Vec<NumericKind> = Vec::new();
    for value in values {
        let kind = value.kind().numeric().ok_or_else(|| {
            StatsError::unsupported(
                "number unification",
                value.kind(),
                "only numbers can be unified",
            )
        })?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}
