//! [`Kernel`] implementations backed by the functions in [`crate::math`].

use serde::{Deserialize, Serialize};

use super::traits::Kernel;
use crate::error::Result;
use crate::math::{
    self, mean_return_type, min_max_return_type, quantile_return_type, std_return_type,
    sum_return_type, QuantileEstimationMethod,
};
use crate::math::percentile::{
    ensure_percentile, method_for, DEFAULT_COMPARABLE_METHOD, DEFAULT_NUMERIC_METHOD,
};
use crate::types::{Value, ValueType};

/// Sum of a sequence, widening integers as `math::sum` does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumKernel {
    pub skip_nan: bool,
}

impl Kernel for SumKernel {
    fn name(&self) -> &str {
        "sum"
    }

    fn apply(&self, values: &[Value], value_type: ValueType) -> Result<Option<Value>> {
        math::sum(values, value_type, self.skip_nan).map(Some)
    }

    fn return_type(&self, value_type: ValueType, _is_empty: bool) -> Option<ValueType> {
        sum_return_type(value_type)
    }
}

/// Arithmetic mean of a sequence, always Double.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeanKernel {
    pub skip_nan: bool,
}

impl Kernel for MeanKernel {
    fn name(&self) -> &str {
        "mean"
    }

    fn apply(&self, values: &[Value], value_type: ValueType) -> Result<Option<Value>> {
        math::mean(values, value_type, self.skip_nan).map(|mean| Some(Value::Double(mean)))
    }

    fn return_type(&self, value_type: ValueType, _is_empty: bool) -> Option<ValueType> {
        mean_return_type(value_type)
    }
}

/// Standard deviation with `ddof` delta degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdKernel {
    pub skip_nan: bool,
    /// Subtracted from the element count in the divisor.
    pub ddof: usize,
}

impl Default for StdKernel {
    fn default() -> Self {
        Self {
            skip_nan: false,
            ddof: 1,
        }
    }
}

impl Kernel for StdKernel {
    fn name(&self) -> &str {
        "std"
    }

    fn apply(&self, values: &[Value], value_type: ValueType) -> Result<Option<Value>> {
        math::std(values, value_type, self.skip_nan, self.ddof).map(|std| Some(Value::Double(std)))
    }

    fn return_type(&self, value_type: ValueType, _is_empty: bool) -> Option<ValueType> {
        std_return_type(value_type)
    }
}

/// Smallest element of a comparable sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinKernel {
    pub skip_nan: bool,
}

impl Kernel for MinKernel {
    fn name(&self) -> &str {
        "min"
    }

    fn apply(&self, values: &[Value], value_type: ValueType) -> Result<Option<Value>> {
        math::min(values, value_type, self.skip_nan)
    }

    fn return_type(&self, value_type: ValueType, is_empty: bool) -> Option<ValueType> {
        min_max_return_type(value_type, is_empty)
    }
}

/// Largest element of a comparable sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxKernel {
    pub skip_nan: bool,
}

impl Kernel for MaxKernel {
    fn name(&self) -> &str {
        "max"
    }

    fn apply(&self, values: &[Value], value_type: ValueType) -> Result<Option<Value>> {
        math::max(values, value_type, self.skip_nan)
    }

    fn return_type(&self, value_type: ValueType, is_empty: bool) -> Option<ValueType> {
        min_max_return_type(value_type, is_empty)
    }
}

/// Median, interpolated for numbers and selected for other comparables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedianKernel {
    pub skip_nan: bool,
}

impl Kernel for MedianKernel {
    fn name(&self) -> &str {
        "median"
    }

    fn apply(&self, values: &[Value], value_type: ValueType) -> Result<Option<Value>> {
        math::median(values, value_type, self.skip_nan)
    }

    fn return_type(&self, value_type: ValueType, is_empty: bool) -> Option<ValueType> {
        math::median_return_type(value_type, is_empty)
    }
}

/// Percentile in `0..=100` with configurable estimation methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileKernel {
    percentile: f64,
    pub skip_nan: bool,
    /// Method used for primitive numbers.
    pub numeric_method: QuantileEstimationMethod,
    /// Method used for other self-comparable kinds.
    pub comparable_method: QuantileEstimationMethod,
}

impl PercentileKernel {
    /// Creates a kernel for `percentile` with the default estimation methods.
    ///
    /// # Errors
    ///
    /// Returns an out of domain error when `percentile` is outside `[0, 100]`.
    pub fn new(percentile: f64) -> Result<Self> {
        ensure_percentile(percentile)?;
        Ok(Self {
            percentile,
            skip_nan: false,
            numeric_method: DEFAULT_NUMERIC_METHOD,
            comparable_method: DEFAULT_COMPARABLE_METHOD,
        })
    }

    /// Sets whether NaN elements are skipped.
    pub fn with_skip_nan(mut self, skip_nan: bool) -> Self {
        self.skip_nan = skip_nan;
        self
    }

    /// Replaces the estimation methods for numbers and comparables.
    pub fn with_methods(
        mut self,
        numeric: QuantileEstimationMethod,
        comparable: QuantileEstimationMethod,
    ) -> Self {
        self.numeric_method = numeric;
        self.comparable_method = comparable;
        self
    }

    /// The percentile in `[0, 100]`.
    pub fn percentile(&self) -> f64 {
        self.percentile
    }
}

impl Kernel for PercentileKernel {
    fn name(&self) -> &str {
        "percentile"
    }

    fn apply(&self, values: &[Value], value_type: ValueType) -> Result<Option<Value>> {
        math::percentile_with(
            values,
            value_type,
            self.percentile,
            self.skip_nan,
            self.numeric_method,
            self.comparable_method,
        )
    }

    fn return_type(&self, value_type: ValueType, is_empty: bool) -> Option<ValueType> {
        let method = method_for(value_type.kind, self.numeric_method, self.comparable_method);
        quantile_return_type(value_type, method, is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueKind;

    #[test]
    fn test_kernel_names() {
        assert_eq!(SumKernel::default().name(), "sum");
        assert_eq!(StdKernel::default().name(), "std");
        assert_eq!(PercentileKernel::new(10.0).unwrap().name(), "percentile");
    }

    #[test]
    fn test_std_kernel_default_ddof() {
        let kernel = StdKernel::default();
        assert_eq!(kernel.ddof, 1);
        let values: Vec<Value> = [1.0, 3.0].into_iter().map(Value::Double).collect();
        let result = kernel.apply(&values, ValueType::of(ValueKind::Double)).unwrap();
        let Some(Value::Double(std)) = result else {
            panic!("expected a Double")
        };
        assert!((std - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_kernel_validates() {
        assert!(PercentileKernel::new(-1.0).is_err());
        let kernel = PercentileKernel::new(50.0)
            .unwrap()
            .with_methods(QuantileEstimationMethod::R1, QuantileEstimationMethod::R1);
        assert_eq!(
            kernel.return_type(ValueType::of(ValueKind::Int), false),
            Some(ValueType::of(ValueKind::Int))
        );
    }

    #[test]
    fn test_mean_kernel_wraps_double() {
        let values = vec![Value::Int(2), Value::Int(4)];
        let result = MeanKernel::default()
            .apply(&values, ValueType::of(ValueKind::Int))
            .unwrap();
        assert_eq!(result, Some(Value::Double(3.0)));
    }
}
