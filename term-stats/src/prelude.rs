//! Prelude for commonly used types and traits in term-stats.

pub use crate::aggregators::{global_registry, Aggregator, AggregatorRegistry, Kernel};
pub use crate::column::Column;
pub use crate::config::StatsConfig;
pub use crate::error::{Result, StatsError};
pub use crate::lattice::{NumericKind, UnifyOptions};
pub use crate::logging::LogConfig;
pub use crate::math::QuantileEstimationMethod;
pub use crate::types::{Value, ValueKind, ValueType};
