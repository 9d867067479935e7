//! # term-stats - Type-directed statistical aggregation
//!
//! term-stats computes descriptive statistics over columns of heterogeneous,
//! nullable values. Every value carries a kind (`Int`, `Double`, `BigDecimal`,
//! `String`, `Date`, ...) and every column a declared [`ValueType`]. The
//! declared type decides which kernel runs, what the result type is, and
//! whether mixed numeric kinds must first be unified.
//!
//! ## Quick Start
//!
//! ```rust
//! use term_stats::prelude::*;
//!
//! # fn main() -> term_stats::Result<()> {
//! let registry = AggregatorRegistry::new();
//!
//! let prices = Column::from_values("price", [10, 20, 60], ValueType::of(ValueKind::Int))?;
//! let discounts = Column::new(
//!     "discount",
//!     vec![Some(Value::Double(2.5)), None],
//!     ValueType::nullable_of(ValueKind::Double),
//! )?;
//!
//! // Mixed Int and Double columns are unified before summing.
//! let total = registry.sum().aggregate_columns(&[prices.clone(), discounts])?;
//! assert_eq!(total, Some(Value::Double(92.5)));
//!
//! // Quantiles see the values of all columns together.
//! let median = registry.median().aggregate_column(&prices)?;
//! assert_eq!(median, Some(Value::Double(20.0)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: value kinds, values and declared types
//! - [`lattice`]: unification of numeric kinds
//! - [`math`]: statistical kernels over homogeneous values, and quickselect
//! - [`aggregators`]: flattening, two-step and number-unifying strategies plus
//!   the memoizing [`AggregatorRegistry`](aggregators::AggregatorRegistry)
//! - [`sources`]: conversion of Apache Arrow arrays into [`Column`](column::Column)s
//! - [`config`] and [`logging`]: defaults and tracing setup
//!
//! ## Errors
//!
//! All operations return [`Result`]. Rejected types surface as
//! [`StatsError::UnsupportedType`], bad parameters as
//! [`StatsError::OutOfDomain`], and broken caller preconditions as
//! [`StatsError::InvariantViolation`].

pub mod aggregators;
pub mod column;
pub mod config;
pub mod error;
pub mod lattice;
pub mod logging;
pub mod math;
pub mod prelude;
pub mod sources;
pub mod types;

pub use error::{Result, StatsError};
