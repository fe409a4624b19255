//! Trial statistics
//!
//! **Problem**: average N trials per metric and report spread, with
//! population standard deviation (divide by N, not N-1).
//!
//! **Solution**: two interchangeable estimators
//! - [`aggregate`]: two passes over a retained `TrialSeries`. The first pass
//!   accumulates `mean += x / N`, the second `var += (x - mean)^2 / N`.
//! - [`RunningStats`]: Welford's online update for callers that do not
//!   retain trials.
//!
//! Both pin the result to the observed range: a constant series has mean
//! exactly equal to its value and standard deviation exactly zero, and
//! the mean never leaves `[min, max]` through rounding.
//!
//! References:
//! - Welford (1962), "Note on a method for calculating corrected sums of
//!   squares and products"

use crate::metrics::{AggregateStats, MetricVector};
use crate::{Error, Result};

/// Aggregate a retained series with the two-pass scheme.
///
/// # Errors
///
/// Returns `InvalidConfiguration` for an empty series.
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(trials: &[MetricVector]) -> Result<AggregateStats> {
    if trials.is_empty() {
        return Err(Error::InvalidConfiguration(
            "cannot aggregate zero trials (trial count must be >= 1)".to_string(),
        ));
    }

    let n = trials.len() as f64;
    let mut mean = [0.0_f64; 3];
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];

    for trial in trials {
        for (i, value) in trial.to_array().into_iter().enumerate() {
            mean[i] += value / n;
            min[i] = min[i].min(value);
            max[i] = max[i].max(value);
        }
    }

    let mut var = [0.0_f64; 3];
    for trial in trials {
        for (i, value) in trial.to_array().into_iter().enumerate() {
            var[i] += (value - mean[i]).powi(2) / n;
        }
    }

    Ok(finish(mean, var, min, max))
}

/// Online mean / variance accumulator (Welford).
#[derive(Debug, Clone)]
pub struct RunningStats {
    count: u64,
    mean: [f64; 3],
    m2: [f64; 3],
    min: [f64; 3],
    max: [f64; 3],
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    /// Create an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: [0.0; 3],
            m2: [0.0; 3],
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    /// Fold one trial into the running estimate.
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, trial: &MetricVector) {
        self.count += 1;
        let k = self.count as f64;
        for (i, value) in trial.to_array().into_iter().enumerate() {
            let delta = value - self.mean[i];
            self.mean[i] += delta / k;
            self.m2[i] += delta * (value - self.mean[i]);
            self.min[i] = self.min[i].min(value);
            self.max[i] = self.max[i].max(value);
        }
    }

    /// Number of trials folded in so far.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Current statistics.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if no trial has been pushed.
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> Result<AggregateStats> {
        if self.count == 0 {
            return Err(Error::InvalidConfiguration(
                "cannot aggregate zero trials (trial count must be >= 1)".to_string(),
            ));
        }
        let n = self.count as f64;
        let var = self.m2.map(|m2| m2 / n);
        Ok(finish(self.mean, var, self.min, self.max))
    }
}

#[allow(clippy::float_cmp, clippy::needless_range_loop)]
fn finish(mean: [f64; 3], var: [f64; 3], min: [f64; 3], max: [f64; 3]) -> AggregateStats {
    let mut mean_out = [0.0_f64; 3];
    let mut std_out = [0.0_f64; 3];
    for i in 0..3 {
        if min[i] == max[i] {
            mean_out[i] = min[i];
            std_out[i] = 0.0;
        } else {
            mean_out[i] = mean[i].clamp(min[i], max[i]);
            std_out[i] = var[i].max(0.0).sqrt();
        }
    }
    AggregateStats::new(
        MetricVector::from_array(mean_out),
        MetricVector::from_array(std_out),
    )
}
