//! Semantic element types of value sequences.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lattice::NumericKind;

/// The concrete category of the elements of a sequence.
///
/// Primitive numbers, big numbers and the comparable scalar kinds map one to
/// one onto [`Value`](super::Value) variants. The remaining kinds describe
/// sequences rather than single values:
///
/// - [`ValueKind::Number`]: mixed numeric kinds whose common kind has not been
///   resolved yet.
/// - [`ValueKind::Nothing`]: the sequence has no (non-null) elements.
/// - [`ValueKind::Any`]: mixed, mutually incomparable kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    /// Generic, unresolved number.
    Number,
    String,
    Boolean,
    Date,
    DateTime,
    /// Empty sequence.
    Nothing,
    /// Mixed or otherwise unsupported values.
    Any,
}

impl ValueKind {
    /// Returns `true` for Byte, Short, Int, Long, Float and Double.
    pub fn is_primitive_number(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Int | Self::Long | Self::Float | Self::Double
        )
    }

    /// Returns `true` for BigInteger and BigDecimal.
    pub fn is_big_number(self) -> bool {
        matches!(self, Self::BigInteger | Self::BigDecimal)
    }

    /// Returns `true` for any numeric kind, including the generic [`ValueKind::Number`].
    pub fn is_number(self) -> bool {
        self.is_primitive_number() || self.is_big_number() || self == Self::Number
    }

    /// Returns `true` when two values of this kind can always be ordered.
    ///
    /// The generic `Number` kind is not self-comparable until it is unified.
    pub fn is_self_comparable(self) -> bool {
        self.is_primitive_number()
            || self.is_big_number()
            || matches!(
                self,
                Self::String | Self::Boolean | Self::Date | Self::DateTime
            )
    }

    /// Returns `true` when elements of this kind may be NaN.
    pub fn can_be_nan(self) -> bool {
        matches!(self, Self::Float | Self::Double | Self::Number)
    }

    /// Maps this kind onto the numeric lattice, if it is a concrete number kind.
    pub fn numeric(self) -> Option<NumericKind> {
        match self {
            Self::Byte => Some(NumericKind::Byte),
            Self::Short => Some(NumericKind::Short),
            Self::Int => Some(NumericKind::Int),
            Self::Long => Some(NumericKind::Long),
            Self::Float => Some(NumericKind::Float),
            Self::Double => Some(NumericKind::Double),
            Self::BigInteger => Some(NumericKind::BigInteger),
            Self::BigDecimal => Some(NumericKind::BigDecimal),
            Self::Nothing => Some(NumericKind::Nothing),
            Self::Number
            | Self::String
            | Self::Boolean
            | Self::Date
            | Self::DateTime
            | Self::Any => None,
        }
    }

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::BigInteger => "BigInteger",
            Self::BigDecimal => "BigDecimal",
            Self::Number => "Number",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::Nothing => "Nothing",
            Self::Any => "Any",
        }
    }
}

impl From<NumericKind> for ValueKind {
    fn from(kind: NumericKind) -> Self {
        match kind {
            NumericKind::Byte => Self::Byte,
            NumericKind::Short => Self::Short,
            NumericKind::Int => Self::Int,
            NumericKind::Long => Self::Long,
            NumericKind::Float => Self::Float,
            NumericKind::Double => Self::Double,
            NumericKind::BigInteger => Self::BigInteger,
            NumericKind::BigDecimal => Self::BigDecimal,
            NumericKind::Nothing => Self::Nothing,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A kind plus a nullability flag: the declared element type of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueType {
    /// Element kind.
    pub kind: ValueKind,
    /// Whether the sequence may contain nulls.
    pub nullable: bool,
}

impl ValueType {
    /// Creates a non-nullable type of `kind`.
    pub const fn of(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// Creates a nullable type of `kind`.
    pub const fn nullable_of(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// The type of an empty sequence.
    pub const fn nothing() -> Self {
        Self::of(ValueKind::Nothing)
    }

    /// Returns a copy with the given nullability.
    pub fn with_nullability(self, nullable: bool) -> Self {
        Self {
            kind: self.kind,
            nullable,
        }
    }

    /// Returns the non-nullable version of this type.
    pub fn non_null(self) -> Self {
        self.with_nullability(false)
    }

    /// Returns `true` when this type describes an empty sequence.
    pub fn is_nothing(self) -> bool {
        self.kind == ValueKind::Nothing
    }

    /// Computes the common supertype of several declared types.
    ///
    /// `Nothing` is the identity. Identical kinds are kept, differing numeric
    /// kinds collapse into the generic `Number` kind (the numeric lattice
    /// resolves those later) and anything else becomes `Any`.
    pub fn common<I>(types: I) -> Self
    where
        I: IntoIterator<Item = ValueType>,
    {
        let mut nullable = false;
        let mut kind: Option<ValueKind> = None;

        for ty in types {
            nullable |= ty.nullable;
            if ty.kind == ValueKind::Nothing {
                continue;
            }
            kind = Some(match kind {
                None => ty.kind,
                Some(current) if current == ty.kind => current,
                Some(current) if current.is_number() && ty.kind.is_number() => ValueKind::Number,
                Some(_) => ValueKind::Any,
            });
        }

        Self {
            kind: kind.unwrap_or(ValueKind::Nothing),
            nullable,
        }
    }
}

impl From<ValueKind> for ValueType {
    fn from(kind: ValueKind) -> Self {
        Self::of(kind)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}
