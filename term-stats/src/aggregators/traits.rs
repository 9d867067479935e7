//! Core aggregation traits.

use std::fmt::Debug;

use crate::column::Column;
use crate::error::Result;
use crate::types::{Value, ValueType};

/// A single-collection statistic.
///
/// Kernels receive non-null values together with their resolved, non-nullable
/// type. They never see the generic `Number` kind when called through an
/// [`Aggregator`].
///
/// # Example
///
/// ```rust
/// use term_stats::aggregators::{Kernel, TwoStepAggregator, Aggregator};
/// use term_stats::error::Result;
/// use term_stats::types::{Value, ValueKind, ValueType};
///
/// #[derive(Debug, Clone)]
/// struct CountKernel;
///
/// impl Kernel for CountKernel {
///     fn name(&self) -> &str {
///         "count"
///     }
///
///     fn apply(&self, values: &[Value], _value_type: ValueType) -> Result<Option<Value>> {
///         Ok(Some(Value::Long(values.len() as i64)))
///     }
///
///     fn return_type(&self, _value_type: ValueType, _is_empty: bool) -> Option<ValueType> {
///         Some(ValueType::of(ValueKind::Long))
///     }
/// }
///
/// let count = TwoStepAggregator::new(CountKernel, CountKernel, false);
/// let values = vec![Some(Value::Int(1)), None, Some(Value::Int(3))];
/// let result = count.aggregate(&values, ValueType::nullable_of(ValueKind::Int)).unwrap();
/// assert_eq!(result, Some(Value::Long(2)));
/// ```
pub trait Kernel: Send + Sync + Debug {
    /// Returns the name of this statistic.
    fn name(&self) -> &str;

    /// Computes the statistic. `None` means the input was vacuous.
    fn apply(&self, values: &[Value], value_type: ValueType) -> Result<Option<Value>>;

    /// Maps an input type to the result type without looking at any data.
    ///
    /// Returns `None` when the result type can only be known at runtime.
    fn return_type(&self, value_type: ValueType, is_empty: bool) -> Option<ValueType>;
}

/// Strategy that applies kernels to one or several collections.
///
/// Implementations are immutable and can be shared between threads.
pub trait Aggregator: Send + Sync + Debug {
    /// Returns the name of this aggregator.
    fn name(&self) -> &str;

    /// Whether the result has the same type as the input.
    fn preserves_type(&self) -> bool;

    /// Aggregates a single collection with its declared type.
    ///
    /// Nulls are dropped when `value_type` is nullable.
    fn aggregate(&self, values: &[Option<Value>], value_type: ValueType) -> Result<Option<Value>>;

    /// Aggregates several collections into one result.
    fn aggregate_columns(&self, columns: &[Column]) -> Result<Option<Value>>;

    /// Predicts the result type of [`Aggregator::aggregate`].
    fn predict_return_type(&self, value_type: ValueType, is_empty: bool) -> Option<ValueType>;

    /// Predicts the result type of [`Aggregator::aggregate_columns`] from the
    /// declared column types.
    fn predict_return_type_for_columns(
        &self,
        value_types: &[ValueType],
        all_empty: bool,
    ) -> Option<ValueType>;

    /// Aggregates a single column.
    fn aggregate_column(&self, column: &Column) -> Result<Option<Value>> {
        self.aggregate(column.values(), column.value_type())
    }

    /// Aggregates values whose exact type is not known.
    ///
    /// `value_types`, when given, must cover the kinds of all values; otherwise
    /// every value is inspected.
    fn aggregate_calculating_type(
        &self,
        values: &[Option<Value>],
        value_types: Option<&[ValueType]>,
    ) -> Result<Option<Value>> {
        let value_type = match value_types {
            Some(types) if !types.is_empty() => ValueType::common(types.iter().copied()),
            _ => ValueType::infer(values),
        };
        let nullable = value_type.nullable || values.iter().any(Option::is_none);
        self.aggregate(values, value_type.with_nullability(nullable))
    }
}
