//! Aggregation strategies.
//!
//! An [`Aggregator`] applies one or two [`Kernel`]s to one or several
//! collections. The strategies differ in how several collections are combined:
//!
//! - [`FlatteningAggregator`] concatenates all collections and runs the kernel
//!   once. Needed for statistics that depend on the whole distribution
//!   (median, percentile, standard deviation).
//! - [`TwoStepAggregator`] runs a kernel per collection, then a second kernel
//!   over the per-collection results (min, max).
//! - [`NumbersUnifyingAggregator`] is a two-step strategy for numbers that
//!   first converts mixed numeric kinds to their unified kind (sum, mean).
//!
//! Aggregators are immutable. The [`AggregatorRegistry`] memoizes them per
//! parameter combination.
//!
//! ## Example
//!
//! ```rust
//! use term_stats::aggregators::{Aggregator, AggregatorRegistry};
//! use term_stats::column::Column;
//! use term_stats::types::{Value, ValueKind, ValueType};
//!
//! let registry = AggregatorRegistry::new();
//! let a = Column::from_values("a", [1, 2, 7], ValueType::of(ValueKind::Int)).unwrap();
//! let b = Column::from_values("b", [4, 6, 7], ValueType::of(ValueKind::Int)).unwrap();
//!
//! let median = registry.median().aggregate_columns(&[a, b]).unwrap();
//! assert_eq!(median, Some(Value::Double(5.0)));
//! ```

pub mod flattening;
pub mod kernels;
pub mod numbers;
pub mod registry;
pub mod traits;
pub mod two_step;

pub use flattening::FlatteningAggregator;
pub use kernels::{
    MaxKernel, MeanKernel, MedianKernel, MinKernel, PercentileKernel, StdKernel, SumKernel,
};
pub use numbers::NumbersUnifyingAggregator;
pub use registry::{global_registry, AggregatorKey, AggregatorRegistry};
pub use traits::{Aggregator, Kernel};
pub use two_step::TwoStepAggregator;

use tracing::{debug, warn};

use crate::error::Result;
use crate::lattice::{
    convert_all, kinds_of, unify, unify_value_types, widens_long_to_floating, NumericKind,
    UnifyOptions,
};
use crate::types::{Value, ValueKind, ValueType};

/// Common non-nullable type of several declared types.
///
/// Concrete numeric kinds go through the lattice; everything else uses the
/// generic common-supertype rule.
pub(crate) fn common_type(types: &[ValueType], options: UnifyOptions) -> Result<ValueType> {
    let non_null: Vec<ValueType> = types.iter().map(|ty| ty.non_null()).collect();
    match unify_value_types(&non_null, options)? {
        Some(unified) => Ok(unified),
        None => Ok(ValueType::common(non_null)),
    }
}

/// Brings non-null `values` to `value_type`.
///
/// Numbers are converted to the target kind. The generic `Number` kind is
/// first resolved by inspecting the values.
pub(crate) fn conform(
    values: Vec<Value>,
    value_type: ValueType,
    options: UnifyOptions,
) -> Result<(Vec<Value>, ValueType)> {
    let target = match value_type.kind {
        ValueKind::Number => {
            let kinds = kinds_of(&values)?;
            let unified = unify(kinds.iter().copied(), options)?;
            debug!(unified = %unified, "resolved mixed numbers at runtime");
            unified
        }
        kind => match kind.numeric() {
            Some(NumericKind::Nothing) | None => return Ok((values, value_type.non_null())),
            Some(numeric) => numeric,
        },
    };

    if values.iter().all(|v| v.kind().numeric() == Some(target)) {
        return Ok((values, ValueType::of(target.into())));
    }

    let kinds = kinds_of(&values)?;
    if widens_long_to_floating(&kinds, target) {
        warn!(
            target_kind = %target,
            "Number unification of Long -> {target} happened during aggregation. Loss of precision may have occurred"
        );
    }
    let converted = convert_all(&values, target)?;
    Ok((converted, ValueType::of(target.into())))
}
