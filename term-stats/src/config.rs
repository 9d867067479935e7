//! Default aggregation parameters.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::math::QuantileEstimationMethod;

/// Environment variable overriding [`StatsConfig::skip_nan`].
pub const ENV_SKIP_NAN: &str = "TERM_STATS_SKIP_NAN";
/// Environment variable overriding [`StatsConfig::ddof`].
pub const ENV_DDOF: &str = "TERM_STATS_DDOF";
/// Environment variable overriding [`StatsConfig::percentile`].
pub const ENV_PERCENTILE: &str = "TERM_STATS_PERCENTILE";

/// Parameters used by the `default_*` accessors of
/// [`AggregatorRegistry`](crate::aggregators::AggregatorRegistry).
///
/// # Example
///
/// ```rust
/// use term_stats::config::StatsConfig;
///
/// let config = StatsConfig::from_json(r#"{"skip_nan": true, "percentile": 90.0}"#).unwrap();
/// assert!(config.skip_nan);
/// assert_eq!(config.ddof, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Drop NaN values instead of propagating them.
    pub skip_nan: bool,
    /// Delta degrees of freedom for variance and standard deviation.
    pub ddof: usize,
    /// Percentile in `[0, 100]`.
    pub percentile: f64,
    /// Estimation method for primitive numbers.
    pub numeric_quantile_method: QuantileEstimationMethod,
    /// Estimation method for other self-comparable kinds; must select.
    pub comparable_quantile_method: QuantileEstimationMethod,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            skip_nan: false,
            ddof: 1,
            percentile: 50.0,
            numeric_quantile_method: QuantileEstimationMethod::R8,
            comparable_quantile_method: QuantileEstimationMethod::R3,
        }
    }
}

impl StatsConfig {
    /// Parses and validates a JSON configuration. Missing fields take their
    /// default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the default configuration with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides looked up by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_SKIP_NAN) {
            self.skip_nan = parse_bool(ENV_SKIP_NAN, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DDOF) {
            self.ddof = raw.trim().parse().map_err(|_| {
                StatsError::configuration(format!("{ENV_DDOF} must be a non-negative integer, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup(ENV_PERCENTILE) {
            self.percentile = raw.trim().parse().map_err(|_| {
                StatsError::configuration(format!("{ENV_PERCENTILE} must be a number, got '{raw}'"))
            })?;
        }
        self.validate()?;
        debug!(config = ?self, "loaded statistics configuration");
        Ok(self)
    }

    /// Sets whether NaN values are skipped by the default aggregators.
    pub fn with_skip_nan(mut self, skip_nan: bool) -> Self {
        self.skip_nan = skip_nan;
        self
    }

    /// Sets the delta degrees of freedom of the default standard deviation.
    pub fn with_ddof(mut self, ddof: usize) -> Self {
        self.ddof = ddof;
        self
    }

    /// Sets the default percentile, checked by [`Self::validate`].
    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = percentile;
        self
    }

    /// Checks that the configuration describes valid aggregations.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(StatsError::configuration(format!(
                "percentile must be in range [0, 100], got {}",
                self.percentile
            )));
        }
        if !self.comparable_quantile_method.is_selecting() {
            return Err(StatsError::configuration(format!(
                "comparable_quantile_method must select an existing element, got {}",
                self.comparable_quantile_method
            )));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(StatsError::configuration(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
    }
}
