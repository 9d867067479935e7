//! Conversions from external columnar formats into [`Column`](crate::column::Column)s.

pub mod arrow;

pub use self::arrow::{from_arrow, from_record_batch};
