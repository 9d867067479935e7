//! Aggregation over the concatenation of all collections.

use tracing::instrument;

use super::traits::{Aggregator, Kernel};
use super::{common_type, conform};
use crate::column::Column;
use crate::error::Result;
use crate::lattice::UnifyOptions;
use crate::types::{strip_nulls, Value, ValueType};

/// Aggregator that flattens several collections into one before applying its
/// kernel.
///
/// ```text
/// [Column<V?>] -> [V] (nulls dropped) -> kernel([V], common type) -> R?
/// ```
#[derive(Debug, Clone)]
pub struct FlatteningAggregator<K> {
    kernel: K,
    preserves_type: bool,
}

impl<K: Kernel> FlatteningAggregator<K> {
    /// Wraps `kernel`; `preserves_type` is reported by [`Aggregator::preserves_type`].
    pub fn new(kernel: K, preserves_type: bool) -> Self {
        Self {
            kernel,
            preserves_type,
        }
    }

    /// The wrapped kernel.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    fn apply(&self, values: Vec<Value>, value_type: ValueType) -> Result<Option<Value>> {
        let (values, value_type) = conform(values, value_type, UnifyOptions::Default)?;
        self.kernel.apply(&values, value_type)
    }
}

impl<K: Kernel> Aggregator for FlatteningAggregator<K> {
    fn name(&self) -> &str {
        self.kernel.name()
    }

    fn preserves_type(&self) -> bool {
        self.preserves_type
    }

    #[instrument(skip(self, values), fields(aggregator = %self.name(), count = values.len()))]
    fn aggregate(&self, values: &[Option<Value>], value_type: ValueType) -> Result<Option<Value>> {
        let (values, value_type) = strip_nulls(values, value_type, self.name())?;
        self.apply(values, value_type)
    }

    #[instrument(skip(self, columns), fields(aggregator = %self.name(), columns = columns.len()))]
    fn aggregate_columns(&self, columns: &[Column]) -> Result<Option<Value>> {
        let types: Vec<ValueType> = columns.iter().map(Column::value_type).collect();
        let value_type = common_type(&types, UnifyOptions::Default)?;

        let mut flattened = Vec::with_capacity(columns.iter().map(Column::len).sum());
        for column in columns {
            let (values, _) = strip_nulls(column.values(), column.value_type(), self.name())?;
            flattened.extend(values);
        }

        self.apply(flattened, value_type)
    }

    fn predict_return_type(&self, value_type: ValueType, is_empty: bool) -> Option<ValueType> {
        self.kernel.return_type(value_type.non_null(), is_empty)
    }

    fn predict_return_type_for_columns(
        &self,
        value_types: &[ValueType],
        all_empty: bool,
    ) -> Option<ValueType> {
        let value_type = common_type(value_types, UnifyOptions::Default).ok()?;
        self.kernel.return_type(value_type, all_empty)
    }
}
