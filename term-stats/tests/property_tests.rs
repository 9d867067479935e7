//! Property-based tests for the kernels and aggregators.
//!
//! ## Properties
//!
//! - quickselect agrees with sorting for every rank
//! - min <= mean <= max for finite samples
//! - quantiles are monotone in `p`
//! - numeric kind unification does not depend on the input order
//! - flattening several columns equals aggregating their concatenation
//! - the cumulative sum ends with the total sum

use proptest::prelude::*;
use term_stats::aggregators::AggregatorRegistry;
use term_stats::lattice::{unify, NumericKind, UnifyOptions};
use term_stats::math::{self, quickselect, QuantileEstimationMethod};
use term_stats::prelude::*;

fn numeric_kind() -> impl Strategy<Value = NumericKind> {
    prop_oneof![
        Just(NumericKind::Byte),
        Just(NumericKind::Short),
        Just(NumericKind::Int),
        Just(NumericKind::Long),
        Just(NumericKind::Float),
        Just(NumericKind::Double),
    ]
}

fn doubles(values: &[f64]) -> Vec<Value> {
    values.iter().copied().map(Value::Double).collect()
}

proptest! {
    #[test]
    fn test_quickselect_matches_sorting(
        data in prop::collection::vec(-50i64..50, 1..200),
        seed in any::<prop::sample::Index>(),
    ) {
        let k = seed.index(data.len());
        let mut sorted = data.clone();
        sorted.sort_unstable();

        prop_assert_eq!(quickselect(&data, k).unwrap(), sorted[k]);
    }

    #[test]
    fn test_quickselect_rejects_out_of_range(data in prop::collection::vec(any::<i32>(), 0..20)) {
        prop_assert!(quickselect(&data, data.len()).is_err());
    }
}

proptest! {
    #[test]
    fn test_mean_is_between_min_and_max(values in prop::collection::vec(-1e6f64..1e6, 1..100)) {
        let data = doubles(&values);
        let ty = ValueType::of(ValueKind::Double);

        let min = math::min(&data, ty, false).unwrap().and_then(|v| v.as_f64()).unwrap();
        let max = math::max(&data, ty, false).unwrap().and_then(|v| v.as_f64()).unwrap();
        let mean = math::mean(&data, ty, false).unwrap();

        prop_assert!(min <= mean + 1e-6, "min {} > mean {}", min, mean);
        prop_assert!(mean <= max + 1e-6, "mean {} > max {}", mean, max);
    }

    #[test]
    fn test_quantiles_are_monotone(
        values in prop::collection::vec(-1000f64..1000f64, 1..100),
        p1 in 0.0f64..=1.0,
        p2 in 0.0f64..=1.0,
    ) {
        let (low, high) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
        let data = doubles(&values);
        let ty = ValueType::of(ValueKind::Double);

        for method in [
            QuantileEstimationMethod::R1,
            QuantileEstimationMethod::R3,
            QuantileEstimationMethod::R7,
            QuantileEstimationMethod::R8,
        ] {
            let q_low = math::quantile(&data, ty, low, false, method).unwrap().and_then(|v| v.as_f64()).unwrap();
            let q_high = math::quantile(&data, ty, high, false, method).unwrap().and_then(|v| v.as_f64()).unwrap();
            prop_assert!(q_low <= q_high + 1e-9, "{}: q({}) = {} > q({}) = {}", method, low, q_low, high, q_high);
        }
    }
}

proptest! {
    #[test]
    fn test_unify_is_order_independent(kinds in prop::collection::vec(numeric_kind(), 1..8)) {
        let forward = unify(kinds.iter().copied(), UnifyOptions::Default).unwrap();
        let backward = unify(kinds.iter().rev().copied(), UnifyOptions::Default).unwrap();
        prop_assert_eq!(forward, backward);

        let widest = kinds.iter().copied().max().unwrap();
        prop_assert!(forward >= widest);
    }

    #[test]
    fn test_flattening_equals_concatenation(
        left in prop::collection::vec(-1000i32..1000, 0..50),
        right in prop::collection::vec(-1000i32..1000, 0..50),
    ) {
        let registry = AggregatorRegistry::new();
        let ty = ValueType::of(ValueKind::Int);
        let columns = [
            Column::from_values("left", left.iter().copied(), ty).unwrap(),
            Column::from_values("right", right.iter().copied(), ty).unwrap(),
        ];
        let joined = Column::from_values("all", left.iter().chain(&right).copied(), ty).unwrap();

        for aggregator in [registry.median(), registry.std(false, 1), registry.percentile(90.0).unwrap()] {
            let split = aggregator.aggregate_columns(&columns).unwrap().and_then(|v| v.as_f64());
            let whole = aggregator.aggregate_column(&joined).unwrap().and_then(|v| v.as_f64());
            match (split, whole) {
                (Some(a), Some(b)) if a.is_nan() => prop_assert!(b.is_nan()),
                (Some(a), Some(b)) => prop_assert!((a - b).abs() < 1e-9, "{}: {} != {}", aggregator.name(), a, b),
                (a, b) => prop_assert_eq!(a, b),
            }
        }
    }

    #[test]
    fn test_cumulative_sum_ends_with_total(values in prop::collection::vec(-1000i64..1000, 1..100)) {
        let column = Column::from_values("a", values.iter().copied(), ValueType::of(ValueKind::Long)).unwrap();
        let running = column.cum_sum(false).unwrap();
        let total: i64 = values.iter().sum();
        prop_assert_eq!(running.values().last().cloned().flatten(), Some(Value::Long(total)));
    }
}
