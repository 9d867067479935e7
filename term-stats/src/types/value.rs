//! Runtime values flowing through the statistical kernels.

use chrono::{NaiveDate, NaiveDateTime};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

use super::kind::{ValueKind, ValueType};

/// A single non-null element of a sequence.
///
/// Missing values are modelled as `Option<Value>` by the sequences themselves,
/// so a `Value` is never null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInteger(BigInt),
    BigDecimal(Decimal),
    String(String),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Byte(_) => ValueKind::Byte,
            Value::Short(_) => ValueKind::Short,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::BigInteger(_) => ValueKind::BigInteger,
            Value::BigDecimal(_) => ValueKind::BigDecimal,
            Value::String(_) => ValueKind::String,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
        }
    }

    /// Returns `true` for Float and Double NaN.
    pub fn is_nan(&self) -> bool {
        match self {
            Value::Float(v) => v.is_nan(),
            Value::Double(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Returns `true` for any numeric value.
    pub fn is_number(&self) -> bool {
        self.kind().is_number()
    }

    /// Converts a numeric value to `f64`.
    ///
    /// Big numbers outside of the `f64` range and non-numeric values yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Byte(v) => Some(f64::from(*v)),
            Value::Short(v) => Some(f64::from(*v)),
            Value::Int(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::BigInteger(v) => v.to_f64(),
            Value::BigDecimal(v) => v.to_f64(),
            Value::String(_) | Value::Boolean(_) | Value::Date(_) | Value::DateTime(_) => None,
        }
    }

    /// Orders two values.
    ///
    /// Values of the same kind use their natural order; floating NaN sorts
    /// after every other number. Primitive numbers of different kinds are
    /// compared by magnitude. Otherwise, values are ordered by kind so that the
    /// result is total and deterministic.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Byte(a), Value::Byte(b)) => a.cmp(b),
            (Value::Short(a), Value::Short(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Long(a), Value::Long(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b)),
            (Value::Double(a), Value::Double(b)) => {
                a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b))
            }
            (Value::BigInteger(a), Value::BigInteger(b)) => a.cmp(b),
            (Value::BigDecimal(a), Value::BigDecimal(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (a, b) if a.kind().is_primitive_number() && b.kind().is_primitive_number() => {
                match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or_else(|| x.total_cmp(&y)),
                    _ => kind_rank(a.kind()).cmp(&kind_rank(b.kind())),
                }
            }
            (a, b) => kind_rank(a.kind()).cmp(&kind_rank(b.kind())),
        }
    }
}

fn kind_rank(kind: ValueKind) -> u8 {
    match kind {
        ValueKind::Byte => 0,
        ValueKind::Short => 1,
        ValueKind::Int => 2,
        ValueKind::Long => 3,
        ValueKind::Float => 4,
        ValueKind::Double => 5,
        ValueKind::BigInteger => 6,
        ValueKind::BigDecimal => 7,
        ValueKind::Number => 8,
        ValueKind::String => 9,
        ValueKind::Boolean => 10,
        ValueKind::Date => 11,
        ValueKind::DateTime => 12,
        ValueKind::Nothing => 13,
        ValueKind::Any => 14,
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let (a, b) = (self.kind(), other.kind());
        if a == b || (a.is_primitive_number() && b.is_primitive_number()) {
            if self.is_nan() || other.is_nan() {
                return None;
            }
            Some(self.total_cmp(other))
        } else {
            None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::BigInteger(v) => write!(f, "{v}"),
            Value::BigDecimal(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_value! {
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    BigInt => BigInteger,
    Decimal => BigDecimal,
    String => String,
    bool => Boolean,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl ValueType {
    /// Infers the element type of `values` by inspecting every element.
    ///
    /// This is the heavy path used only when no declared type is available.
    pub fn infer<'a, I>(values: I) -> ValueType
    where
        I: IntoIterator<Item = &'a Option<Value>>,
    {
        let mut has_null = false;
        let kinds = values.into_iter().filter_map(|value| {
            if value.is_none() {
                has_null = true;
            }
            value.as_ref().map(|v| ValueType::of(v.kind()))
        });
        let inferred = ValueType::common(kinds.collect::<Vec<_>>());
        debug!(inferred = %inferred, "inferred element type from runtime values");
        inferred.with_nullability(has_null)
    }

    /// Infers the element type of non-null `values` by inspecting every element.
    pub fn infer_non_null<'a, I>(values: I) -> ValueType
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let inferred =
            ValueType::common(values.into_iter().map(|v| ValueType::of(v.kind())).collect::<Vec<_>>());
        debug!(inferred = %inferred, "inferred element type from runtime values");
        inferred
    }
}
