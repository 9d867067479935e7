//! Memoized construction of the preconfigured aggregators.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::flattening::FlatteningAggregator;
use super::kernels::{
    MaxKernel, MeanKernel, MedianKernel, MinKernel, PercentileKernel, StdKernel, SumKernel,
};
use super::numbers::NumbersUnifyingAggregator;
use super::traits::Aggregator;
use super::two_step::TwoStepAggregator;
use crate::config::StatsConfig;
use crate::error::Result;
use crate::lattice::UnifyOptions;
use crate::logging::LogConfig;
use crate::math::QuantileEstimationMethod;

static GLOBAL_REGISTRY: Lazy<AggregatorRegistry> = Lazy::new(AggregatorRegistry::new);

/// Returns the process-wide registry with the default configuration.
pub fn global_registry() -> &'static AggregatorRegistry {
    &GLOBAL_REGISTRY
}

/// Identity of a preconfigured aggregator: its statistic plus parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregatorKey {
    Min {
        skip_nan: bool,
    },
    Max {
        skip_nan: bool,
    },
    Sum {
        skip_nan: bool,
    },
    Mean {
        skip_nan: bool,
    },
    Std {
        skip_nan: bool,
        ddof: usize,
    },
    Median {
        skip_nan: bool,
    },
    Percentile {
        /// Bit pattern of the percentile, so that the key stays hashable.
        /// Every distinct value is a separate cache entry.
        percentile_bits: u64,
        skip_nan: bool,
        numeric: QuantileEstimationMethod,
        comparable: QuantileEstimationMethod,
    },
}

/// Cache of aggregators keyed by [`AggregatorKey`].
///
/// Aggregators are stateless, so one instance per key is shared by all
/// callers. Lookups take a read lock; construction happens under the write
/// lock, so every key is built at most once per registry.
///
/// There is no eviction: entries live until [`AggregatorRegistry::clear`]
/// or the registry is dropped. Fixed statistics add a handful of keys, but
/// each distinct percentile adds one more, so the cache grows without bound
/// when percentiles come from unbounded user input.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use term_stats::aggregators::{Aggregator, AggregatorRegistry};
/// use term_stats::types::{Value, ValueKind, ValueType};
///
/// let registry = AggregatorRegistry::new();
/// let mean = registry.mean(true);
/// assert!(Arc::ptr_eq(&mean, &registry.mean(true)));
///
/// let values = vec![Some(Value::Double(1.0)), Some(Value::Double(f64::NAN)), Some(Value::Double(3.0))];
/// let result = mean.aggregate(&values, ValueType::of(ValueKind::Double)).unwrap();
/// assert_eq!(result, Some(Value::Double(2.0)));
/// ```
#[derive(Debug, Default)]
pub struct AggregatorRegistry {
    config: StatsConfig,
    log_config: LogConfig,
    cache: RwLock<HashMap<AggregatorKey, Arc<dyn Aggregator>>>,
}

impl AggregatorRegistry {
    /// Creates a registry with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose `default_*` accessors follow `config`.
    pub fn with_config(config: StatsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Sets the logging behaviour of cache lookups and construction.
    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// The configuration behind the `default_*` accessors.
    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Number of aggregators constructed so far.
    pub fn cached_count(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drops all cached aggregators.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn get_or_build<F>(&self, key: AggregatorKey, build: F) -> Arc<dyn Aggregator>
    where
        F: FnOnce() -> Arc<dyn Aggregator>,
    {
        if let Some(found) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            crate::log_cache!(self.log_config, key = ?key, "aggregator cache hit");
            return Arc::clone(found);
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let aggregator = cache.entry(key).or_insert_with(|| {
            crate::perf_debug!(self.log_config, key = ?key, "constructing aggregator");
            build()
        });
        Arc::clone(aggregator)
    }

    /// Minimum of comparables, propagating NaN. Keeps the widest input kind.
    pub fn min(&self) -> Arc<dyn Aggregator> {
        self.min_with(false)
    }

    /// Minimum, skipping NaN when `skip_nan` is set.
    pub fn min_with(&self, skip_nan: bool) -> Arc<dyn Aggregator> {
        self.get_or_build(AggregatorKey::Min { skip_nan }, || {
            Arc::new(TwoStepAggregator::preserving(MinKernel { skip_nan }))
        })
    }

    /// Maximum of comparables, propagating NaN. Keeps the widest input kind.
    pub fn max(&self) -> Arc<dyn Aggregator> {
        self.max_with(false)
    }

    /// Maximum, skipping NaN when `skip_nan` is set.
    pub fn max_with(&self, skip_nan: bool) -> Arc<dyn Aggregator> {
        self.get_or_build(AggregatorKey::Max { skip_nan }, || {
            Arc::new(TwoStepAggregator::preserving(MaxKernel { skip_nan }))
        })
    }

    /// Sum of numbers. Big numbers are accepted when not mixed with other kinds.
    pub fn sum(&self) -> Arc<dyn Aggregator> {
        self.sum_with(false)
    }

    /// Sum, skipping NaN when `skip_nan` is set.
    pub fn sum_with(&self, skip_nan: bool) -> Arc<dyn Aggregator> {
        self.get_or_build(AggregatorKey::Sum { skip_nan }, || {
            Arc::new(NumbersUnifyingAggregator::with_options(
                SumKernel { skip_nan },
                UnifyOptions::Default,
            ))
        })
    }

    /// Mean of primitive numbers. Across columns, the mean of column means.
    pub fn mean(&self, skip_nan: bool) -> Arc<dyn Aggregator> {
        self.get_or_build(AggregatorKey::Mean { skip_nan }, || {
            Arc::new(NumbersUnifyingAggregator::new(MeanKernel { skip_nan }))
        })
    }

    /// Standard deviation over the values of all columns together.
    pub fn std(&self, skip_nan: bool, ddof: usize) -> Arc<dyn Aggregator> {
        self.get_or_build(AggregatorKey::Std { skip_nan, ddof }, || {
            Arc::new(FlatteningAggregator::new(StdKernel { skip_nan, ddof }, false))
        })
    }

    /// Median over the values of all columns together, propagating NaN.
    pub fn median(&self) -> Arc<dyn Aggregator> {
        self.median_with(false)
    }

    /// Median, skipping NaN when `skip_nan` is set.
    pub fn median_with(&self, skip_nan: bool) -> Arc<dyn Aggregator> {
        self.get_or_build(AggregatorKey::Median { skip_nan }, || {
            Arc::new(FlatteningAggregator::new(MedianKernel { skip_nan }, false))
        })
    }

    /// Percentile in `[0, 100]` with the default estimation methods.
    ///
    /// Every distinct `percentile` value is cached under its own key and
    /// entries are only dropped by [`Self::clear`]. Callers passing arbitrary,
    /// unbounded sets of percentiles grow the cache without limit.
    pub fn percentile(&self, percentile: f64) -> Result<Arc<dyn Aggregator>> {
        self.percentile_with(percentile, false, PercentileKernel::new(percentile)?)
    }

    fn percentile_with(
        &self,
        percentile: f64,
        skip_nan: bool,
        kernel: PercentileKernel,
    ) -> Result<Arc<dyn Aggregator>> {
        let kernel = kernel.with_skip_nan(skip_nan);
        let key = AggregatorKey::Percentile {
            percentile_bits: percentile.to_bits(),
            skip_nan,
            numeric: kernel.numeric_method,
            comparable: kernel.comparable_method,
        };
        Ok(self.get_or_build(key, || Arc::new(FlatteningAggregator::new(kernel, false))))
    }

    /// [`Self::min_with`] with the configured `skip_nan`.
    pub fn default_min(&self) -> Arc<dyn Aggregator> {
        self.min_with(self.config.skip_nan)
    }

    /// [`Self::max_with`] with the configured `skip_nan`.
    pub fn default_max(&self) -> Arc<dyn Aggregator> {
        self.max_with(self.config.skip_nan)
    }

    /// [`Self::sum_with`] with the configured `skip_nan`.
    pub fn default_sum(&self) -> Arc<dyn Aggregator> {
        self.sum_with(self.config.skip_nan)
    }

    /// [`Self::mean`] with the configured `skip_nan`.
    pub fn default_mean(&self) -> Arc<dyn Aggregator> {
        self.mean(self.config.skip_nan)
    }

    /// [`Self::std`] with the configured `skip_nan` and `ddof`.
    pub fn default_std(&self) -> Arc<dyn Aggregator> {
        self.std(self.config.skip_nan, self.config.ddof)
    }

    /// [`Self::median_with`] with the configured `skip_nan`.
    pub fn default_median(&self) -> Arc<dyn Aggregator> {
        self.median_with(self.config.skip_nan)
    }

    /// Percentile, skipping and estimation methods taken from the configuration.
    pub fn default_percentile(&self) -> Result<Arc<dyn Aggregator>> {
        let config = &self.config;
        let kernel = PercentileKernel::new(config.percentile)?.with_methods(
            config.numeric_quantile_method,
            config.comparable_quantile_method,
        );
        self.percentile_with(config.percentile, config.skip_nan, kernel)
    }
}
