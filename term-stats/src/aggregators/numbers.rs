//! Two-step aggregation for numbers of possibly different kinds.

use tracing::{instrument, warn};

use super::traits::{Aggregator, Kernel};
use super::two_step::step_one_results;
use crate::column::Column;
use crate::error::{Result, StatsError};
use crate::lattice::{
    convert_all, kinds_of, unify, unify_value_types, widens_long_to_floating, NumericKind,
    UnifyOptions,
};
use crate::types::{strip_nulls, Value, ValueKind, ValueType};

/// Two-step aggregator for numeric kernels.
///
/// Values of mixed numeric kinds are converted to their unified kind before
/// the kernel runs. When all inputs already share a kind, the unification is
/// skipped. Results of several columns are unified the same way before the
/// kernel combines them.
///
/// ```text
/// [Column<Number?>] -> kernel([N], unified column kind) per column -> [R]
///                   -> kernel([R], unified result kind) -> R?
/// ```
#[derive(Debug, Clone)]
pub struct NumbersUnifyingAggregator<K> {
    kernel: K,
    options: UnifyOptions,
}

impl<K: Kernel> NumbersUnifyingAggregator<K> {
    /// Creates an aggregator that accepts primitive numbers only.
    pub fn new(kernel: K) -> Self {
        Self::with_options(kernel, UnifyOptions::PrimitivesOnly)
    }

    /// Creates an aggregator with explicit unification options.
    ///
    /// With [`UnifyOptions::Default`], big numbers are accepted as long as they
    /// are not mixed with other kinds.
    pub fn with_options(kernel: K, options: UnifyOptions) -> Self {
        Self { kernel, options }
    }

    fn ensure_supported(&self, value_type: ValueType) -> Result<()> {
        let supported = match value_type.kind {
            ValueKind::Nothing => true,
            kind if kind.is_primitive_number() => true,
            kind if kind.is_big_number() => self.options == UnifyOptions::Default,
            _ => false,
        };
        if supported {
            Ok(())
        } else {
            Err(StatsError::unsupported(
                self.kernel.name(),
                value_type,
                "only primitive numbers are supported",
            ))
        }
    }

    fn unified_kind(&self, kinds: &[NumericKind]) -> Result<NumericKind> {
        let unified = match kinds {
            [single] => *single,
            _ => unify(kinds.iter().copied(), self.options)?,
        };
        if widens_long_to_floating(kinds, unified) {
            warn!(
                aggregator = %self.kernel.name(),
                "Number unification of Long -> {unified} happened during aggregation. Loss of precision may have occurred"
            );
        }
        Ok(unified)
    }

    fn aggregate_unified(&self, values: &[Value], kinds: &[NumericKind]) -> Result<Option<Value>> {
        let unified = self.unified_kind(kinds)?;
        let value_type = ValueType::of(unified.into());
        self.ensure_supported(value_type)?;
        if kinds.len() <= 1 {
            return self.kernel.apply(values, value_type);
        }
        let converted = convert_all(values, unified)?;
        self.kernel.apply(&converted, value_type)
    }
}

impl<K: Kernel> Aggregator for NumbersUnifyingAggregator<K> {
    fn name(&self) -> &str {
        self.kernel.name()
    }

    fn preserves_type(&self) -> bool {
        false
    }

    #[instrument(skip(self, values), fields(aggregator = %self.name(), count = values.len()))]
    fn aggregate(&self, values: &[Option<Value>], value_type: ValueType) -> Result<Option<Value>> {
        let (values, value_type) = strip_nulls(values, value_type, self.name())?;
        if value_type.kind == ValueKind::Number {
            let kinds = kinds_of(&values)?;
            return self.aggregate_unified(&values, &kinds);
        }
        self.ensure_supported(value_type)?;
        self.kernel.apply(&values, value_type)
    }

    #[instrument(skip(self, columns), fields(aggregator = %self.name(), columns = columns.len()))]
    fn aggregate_columns(&self, columns: &[Column]) -> Result<Option<Value>> {
        let (results, types) = step_one_results(
            columns,
            |column| self.aggregate_column(column),
            |ty, empty| self.kernel.return_type(ty, empty),
        )?;
        let wrapped: Vec<Option<Value>> = results.into_iter().map(Some).collect();
        self.aggregate_calculating_type(&wrapped, Some(&types))
    }

    /// Unifies the kinds given by `value_types`, or found by inspecting every
    /// value when they are absent, then aggregates the converted values.
    fn aggregate_calculating_type(
        &self,
        values: &[Option<Value>],
        value_types: Option<&[ValueType]>,
    ) -> Result<Option<Value>> {
        let present: Vec<Value> = values.iter().flatten().cloned().collect();
        let declared: Option<Vec<NumericKind>> = value_types
            .filter(|types| !types.is_empty())
            .and_then(|types| types.iter().map(|ty| ty.kind.numeric()).collect());

        let mut kinds = match declared {
            Some(kinds) => kinds,
            None => kinds_of(&present)?,
        };
        kinds.sort_unstable();
        kinds.dedup();
        self.aggregate_unified(&present, &kinds)
    }

    fn predict_return_type(&self, value_type: ValueType, is_empty: bool) -> Option<ValueType> {
        self.kernel.return_type(value_type.non_null(), is_empty)
    }

    fn predict_return_type_for_columns(
        &self,
        value_types: &[ValueType],
        all_empty: bool,
    ) -> Option<ValueType> {
        let step_one_types = value_types
            .iter()
            .map(|ty| self.kernel.return_type(ty.non_null(), all_empty))
            .collect::<Option<Vec<_>>>()?;
        unify_value_types(&step_one_types, self.options)
            .ok()
            .flatten()
            .map(ValueType::non_null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregators::kernels::{MeanKernel, SumKernel};
    use num_bigint::BigInt;

    #[test]
    fn test_sum_of_mixed_values() {
        let sum = NumbersUnifyingAggregator::new(SumKernel::default());
        let values = vec![Some(Value::Int(1)), None, Some(Value::Double(2.5))];
        let result = sum
            .aggregate(&values, ValueType::nullable_of(ValueKind::Number))
            .unwrap();
        assert_eq!(result, Some(Value::Double(3.5)));
    }

    #[test]
    fn test_sum_across_columns() {
        let sum = NumbersUnifyingAggregator::new(SumKernel::default());
        let columns = [
            Column::from_values("a", [1i8, 2], ValueType::of(ValueKind::Byte)).unwrap(),
            Column::from_values("b", [10i64, 20], ValueType::of(ValueKind::Long)).unwrap(),
        ];
        assert_eq!(sum.aggregate_columns(&columns).unwrap(), Some(Value::Long(33)));
    }

    #[test]
    fn test_mean_of_column_means() {
        let mean = NumbersUnifyingAggregator::new(MeanKernel::default());
        let columns = [
            Column::from_values("a", [1, 2, 3], ValueType::of(ValueKind::Int)).unwrap(),
            Column::from_values("b", [10.0f64], ValueType::of(ValueKind::Double)).unwrap(),
        ];
        assert_eq!(mean.aggregate_columns(&columns).unwrap(), Some(Value::Double(6.0)));
    }

    #[test]
    fn test_big_numbers() {
        let values = vec![Some(Value::BigInteger(BigInt::from(5)))];
        let ty = ValueType::of(ValueKind::BigInteger);

        let primitives_only = NumbersUnifyingAggregator::new(SumKernel::default());
        assert!(matches!(
            primitives_only.aggregate(&values, ty).unwrap_err(),
            StatsError::UnsupportedType { .. }
        ));

        let sum = NumbersUnifyingAggregator::with_options(SumKernel::default(), UnifyOptions::Default);
        assert_eq!(
            sum.aggregate(&values, ty).unwrap(),
            Some(Value::BigInteger(BigInt::from(5)))
        );
    }

    #[test]
    fn test_rejects_non_numbers() {
        let sum = NumbersUnifyingAggregator::new(SumKernel::default());
        let values = vec![Some(Value::from("a"))];
        assert!(sum.aggregate(&values, ValueType::of(ValueKind::String)).is_err());
    }

    #[test]
    fn test_empty_input() {
        let sum = NumbersUnifyingAggregator::new(SumKernel::default());
        assert_eq!(
            sum.aggregate(&[], ValueType::nothing()).unwrap(),
            Some(Value::Double(0.0))
        );
        assert_eq!(
            sum.aggregate_calculating_type(&[], None).unwrap(),
            Some(Value::Double(0.0))
        );
    }

    #[test]
    fn test_predict_return_type_for_columns() {
        let sum = NumbersUnifyingAggregator::new(SumKernel::default());
        let types = [ValueType::of(ValueKind::Short), ValueType::nullable_of(ValueKind::Float)];
        assert_eq!(
            sum.predict_return_type_for_columns(&types, false),
            Some(ValueType::of(ValueKind::Float))
        );

        let mean = NumbersUnifyingAggregator::new(MeanKernel::default());
        assert_eq!(
            mean.predict_return_type_for_columns(&types, false),
            Some(ValueType::of(ValueKind::Double))
        );
    }
}
