//! Per-collection aggregation followed by a combining step.

use tracing::{debug, instrument};

use super::traits::{Aggregator, Kernel};
use super::{common_type, conform};
use crate::column::Column;
use crate::error::Result;
use crate::lattice::UnifyOptions;
use crate::types::{strip_nulls, Value, ValueType};

/// Aggregator that applies `step_one` to each collection and `step_two` to
/// the per-collection results.
///
/// ```text
/// [Column<V?>] -> step_one([V], column type) per column -> [R] (nulls dropped)
///              -> step_two([R], common result type) -> R?
/// ```
#[derive(Debug, Clone)]
pub struct TwoStepAggregator<K1, K2> {
    step_one: K1,
    step_two: K2,
    preserves_type: bool,
}

impl<K1: Kernel, K2: Kernel> TwoStepAggregator<K1, K2> {
    /// Applies `step_one` per column and `step_two` to the partial results.
    pub fn new(step_one: K1, step_two: K2, preserves_type: bool) -> Self {
        Self {
            step_one,
            step_two,
            preserves_type,
        }
    }
}

impl<K: Kernel + Clone> TwoStepAggregator<K, K> {
    /// Uses the same kernel for both steps and preserves the input type.
    pub fn preserving(kernel: K) -> Self {
        Self::new(kernel.clone(), kernel, true)
    }
}

/// Runs `aggregate` on every column and pairs each result with its type.
///
/// The type comes from `return_type` when it is statically known; otherwise
/// it is read off the result itself.
pub(crate) fn step_one_results<A, F>(
    columns: &[Column],
    mut aggregate: A,
    return_type: F,
) -> Result<(Vec<Value>, Vec<ValueType>)>
where
    A: FnMut(&Column) -> Result<Option<Value>>,
    F: Fn(ValueType, bool) -> Option<ValueType>,
{
    let mut results = Vec::with_capacity(columns.len());
    let mut types = Vec::with_capacity(columns.len());
    for column in columns {
        let Some(result) = aggregate(column)? else {
            continue;
        };
        let result_type = return_type(column.value_type().non_null(), column.is_empty())
            .filter(|ty| ty.kind.numeric().is_some() || ty.kind.is_self_comparable())
            .unwrap_or_else(|| {
                debug!(column = %column.name(), "calculating the result type at runtime");
                ValueType::of(result.kind())
            });
        results.push(result);
        types.push(result_type.non_null());
    }
    Ok((results, types))
}

impl<K1: Kernel, K2: Kernel> Aggregator for TwoStepAggregator<K1, K2> {
    fn name(&self) -> &str {
        self.step_one.name()
    }

    fn preserves_type(&self) -> bool {
        self.preserves_type
    }

    #[instrument(skip(self, values), fields(aggregator = %self.name(), count = values.len()))]
    fn aggregate(&self, values: &[Option<Value>], value_type: ValueType) -> Result<Option<Value>> {
        let (values, value_type) = strip_nulls(values, value_type, self.name())?;
        let (values, value_type) = conform(values, value_type, UnifyOptions::Default)?;
        self.step_one.apply(&values, value_type)
    }

    #[instrument(skip(self, columns), fields(aggregator = %self.name(), columns = columns.len()))]
    fn aggregate_columns(&self, columns: &[Column]) -> Result<Option<Value>> {
        let (results, types) = step_one_results(
            columns,
            |column| self.aggregate_column(column),
            |ty, empty| self.step_one.return_type(ty, empty),
        )?;
        let result_type = common_type(&types, UnifyOptions::Default)?;
        let (results, result_type) = conform(results, result_type, UnifyOptions::Default)?;
        self.step_two.apply(&results, result_type)
    }

    fn predict_return_type(&self, value_type: ValueType, is_empty: bool) -> Option<ValueType> {
        self.step_one.return_type(value_type.non_null(), is_empty)
    }

    fn predict_return_type_for_columns(
        &self,
        value_types: &[ValueType],
        all_empty: bool,
    ) -> Option<ValueType> {
        let step_one_types = value_types
            .iter()
            .map(|ty| self.step_one.return_type(ty.non_null(), all_empty))
            .collect::<Option<Vec<_>>>()?;
        let common = common_type(&step_one_types, UnifyOptions::Default).ok()?;
        self.step_two.return_type(common, all_empty)
    }
}
