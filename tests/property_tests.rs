//! Property-based tests for trial statistics
//!
//! - Test mathematical invariants of the aggregator
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use trainer_bench::stats::{aggregate, RunningStats};
use trainer_bench::{BenchmarkRun, Metric, MetricVector, Result, TrialOrchestrator};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Plausible metric vector: up to an hour, 64 GiB, 64 cores.
fn arb_metric_vector() -> impl Strategy<Value = MetricVector> {
    (0.0f64..3600.0, 0.0f64..67_108_864.0, 0.0f64..6400.0)
        .prop_map(|(t, m, c)| MetricVector::new(t, m, c))
}

fn arb_series() -> impl Strategy<Value = Vec<MetricVector>> {
    proptest::collection::vec(arb_metric_vector(), 1..40)
}

fn tolerance(scale: f64) -> f64 {
    1e-9 * scale.abs().max(1.0)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: mean lies within [min, max] of the trials
    #[test]
    fn prop_mean_within_range(series in arb_series()) {
        let stats = aggregate(&series).unwrap();
        for metric in Metric::ALL {
            let values: Vec<f64> = series.iter().map(|v| v.get(metric)).collect();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = stats.mean().get(metric);
            prop_assert!(
                mean >= min && mean <= max,
                "{:?}: {} not in [{}, {}]",
                metric,
                mean,
                min,
                max
            );
        }
    }

    /// Property: standard deviation is non-negative
    #[test]
    fn prop_std_non_negative(series in arb_series()) {
        let stats = aggregate(&series).unwrap();
        for metric in Metric::ALL {
            prop_assert!(stats.std_dev().get(metric) >= 0.0);
        }
    }

    /// Property: std is zero iff every trial value is identical
    #[test]
    fn prop_std_zero_iff_constant(series in arb_series()) {
        let stats = aggregate(&series).unwrap();
        for metric in Metric::ALL {
            let first = series[0].get(metric);
            let constant = series.iter().all(|v| v.get(metric).to_bits() == first.to_bits());
            let zero = stats.std_dev().get(metric) == 0.0;
            prop_assert_eq!(constant, zero, "{:?}", metric);
        }
    }

    /// Property: a repeated vector has itself as mean and zero spread
    #[test]
    fn prop_repeated_vector(v in arb_metric_vector(), n in 1usize..20) {
        let stats = aggregate(&vec![v; n]).unwrap();
        prop_assert_eq!(stats.mean(), v);
        prop_assert_eq!(stats.std_dev(), MetricVector::default());
    }

    /// Property: Welford and two-pass agree
    #[test]
    fn prop_running_matches_two_pass(series in arb_series()) {
        let mut running = RunningStats::new();
        for v in &series {
            running.push(v);
        }
        let a = aggregate(&series).unwrap();
        let b = running.stats().unwrap();
        for metric in Metric::ALL {
            let (ma, mb) = (a.mean().get(metric), b.mean().get(metric));
            prop_assert!((ma - mb).abs() <= tolerance(ma), "mean {:?}: {} vs {}", metric, ma, mb);
            let (sa, sb) = (a.std_dev().get(metric), b.std_dev().get(metric));
            prop_assert!(
                (sa - sb).abs() <= 1e-6 * ma.abs().max(1.0),
                "std {:?}: {} vs {}",
                metric,
                sa,
                sb
            );
        }
    }

    /// Property: orchestrator output equals aggregating its own trials
    #[test]
    fn prop_orchestrator_matches_aggregate(series in arb_series()) {
        let mut run = BenchmarkRun::builder("prop", "cmd", "p")
            .trials(series.len())
            .build()
            .unwrap();
        let mut replay = series.clone().into_iter();
        let sampler = move |_: &str, _: &str| -> Result<MetricVector> {
            Ok(replay.next().unwrap_or_default())
        };
        let outcome = TrialOrchestrator::new(sampler).run(&mut run).unwrap();
        prop_assert_eq!(outcome.trials(), series.as_slice());
        prop_assert_eq!(*outcome.stats(), aggregate(&series).unwrap());
    }
}
