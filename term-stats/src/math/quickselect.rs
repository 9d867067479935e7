//! Order-statistic selection without sorting.

use rand::Rng;
use std::cmp::Ordering;

use crate::error::{Result, StatsError};

/// Returns the `k`-th smallest element (0-based) of `data`.
///
/// Uses quickselect with a random pivot and a three-way partition, so inputs
/// with many duplicates finish as soon as the pivot's rank range covers `k`.
/// The caller's slice is never reordered; the partitions live in internal
/// buffers. Average time is O(n).
///
/// # Errors
///
/// Returns [`StatsError::IndexOutOfBounds`] when `k >= data.len()`.
///
/// # Example
///
/// ```rust
/// use term_stats::math::quickselect::quickselect;
///
/// let data = [5, 1, 4, 1, 3];
/// assert_eq!(quickselect(&data, 0).unwrap(), 1);
/// assert_eq!(quickselect(&data, 4).unwrap(), 5);
/// ```
pub fn quickselect<T>(data: &[T], k: usize) -> Result<T>
where
    T: Ord + Clone,
{
    quickselect_by(data, k, T::cmp)
}

/// Like [`quickselect`], ordering elements with `compare`.
pub fn quickselect_by<T, F>(data: &[T], k: usize, compare: F) -> Result<T>
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    quickselect_by_with_rng(data, k, compare, &mut rand::rng())
}

/// Like [`quickselect_by`], drawing pivots from `rng`.
pub fn quickselect_by_with_rng<T, F, R>(data: &[T], k: usize, mut compare: F, rng: &mut R) -> Result<T>
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
    R: Rng + ?Sized,
{
    if k >= data.len() {
        return Err(StatsError::IndexOutOfBounds {
            index: k,
            len: data.len(),
        });
    }

    let mut k = k;
    let mut list: Vec<T> = data.to_vec();
    let mut less: Vec<T> = Vec::new();
    let mut greater: Vec<T> = Vec::new();

    while list.len() > 1 {
        let pivot = list[rng.random_range(0..list.len())].clone();
        less.clear();
        greater.clear();
        let mut equal = 0usize;

        for value in list.drain(..) {
            match compare(&value, &pivot) {
                Ordering::Less => less.push(value),
                Ordering::Greater => greater.push(value),
                Ordering::Equal => equal += 1,
            }
        }

        if k < less.len() {
            std::mem::swap(&mut list, &mut less);
        } else if k < less.len() + equal {
            return Ok(pivot);
        } else {
            k -= less.len() + equal;
            std::mem::swap(&mut list, &mut greater);
        }
    }

    list.pop()
        .ok_or(StatsError::IndexOutOfBounds { index: k, len: 0 })
}

/// Selects the `k`-th smallest `f64`, ordering NaN after every number.
pub fn quickselect_f64(data: &[f64], k: usize) -> Result<f64> {
    quickselect_by(data, k, |a, b| a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b)))
}
