//! A named sequence of values with its declared element type.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::math::{cum_sum, cum_sum_return_type};
use crate::types::{Value, ValueKind, ValueType};

/// The unit of input for aggregation: values plus their declared type.
///
/// The declared type is trusted by the aggregators; use [`Column::infer`] when
/// no type information is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<Option<Value>>,
    value_type: ValueType,
}

impl Column {
    /// Creates a column with a declared element type.
    ///
    /// # Errors
    ///
    /// - An invariant violation when a null is present but the type is not
    ///   nullable.
    /// - [`StatsError::TypeMismatch`] when a value does not belong to the
    ///   declared kind.
    pub fn new(
        name: impl Into<String>,
        values: Vec<Option<Value>>,
        value_type: ValueType,
    ) -> Result<Self> {
        let name = name.into();
        if !value_type.nullable && values.iter().any(Option::is_none) {
            return Err(StatsError::invariant(format!(
                "column '{name}' declared as {value_type} contains nulls"
            )));
        }
        if let Some(value) = values
            .iter()
            .flatten()
            .find(|value| !matches_kind(value, value_type.kind))
        {
            return Err(StatsError::type_mismatch(name, value_type, value.kind()));
        }
        Ok(Self {
            name,
            values,
            value_type,
        })
    }

    /// Creates a column of non-null values with a declared element type.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::TypeMismatch`] when a value does not belong to
    /// the declared kind.
    pub fn from_values<I, V>(
        name: impl Into<String>,
        values: I,
        value_type: ValueType,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(|v| Some(v.into())).collect();
        Self::new(name, values, value_type.non_null())
    }

    /// Creates a column by inspecting every value to find its type.
    pub fn infer(name: impl Into<String>, values: Vec<Option<Value>>) -> Self {
        let name = name.into();
        let value_type = ValueType::infer(&values);
        debug!(column = %name, value_type = %value_type, "inferred column type");
        Self {
            name,
            values,
            value_type,
        }
    }

    /// Column name, carried through to derived columns.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Number of rows, nulls included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the column has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null rows.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Returns the running sum of this column as a new column of the same
    /// name and length.
    pub fn cum_sum(&self, skip_nan: bool) -> Result<Column> {
        let values = cum_sum(&self.values, self.value_type, skip_nan)?;
        let value_type = cum_sum_return_type(self.value_type, skip_nan)?;
        Ok(Column {
            name: self.name.clone(),
            values,
            value_type,
        })
    }
}

/// Whether `value` may appear in a column of kind `kind`.
fn matches_kind(value: &Value, kind: ValueKind) -> bool {
    match kind {
        ValueKind::Any => true,
        ValueKind::Number => value.is_number(),
        kind => value.kind() == kind,
    }
}
