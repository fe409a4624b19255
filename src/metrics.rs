//! Metric vectors - the per-trial measurement and its aggregate
//!
//! ## Data Model
//!
//! ```text
//! BenchmarkRun ──< trial (N) ──> MetricVector
//!                                   │
//!        TrialSeries = [MetricVector; N]
//!                                   │
//!                                   └──> AggregateStats (mean, std_dev)
//! ```
//!
//! All three metrics are non-negative by construction and aggregated
//! independently (no cross-metric weighting).

use serde::{Deserialize, Serialize};

/// One of the three sampled quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Wall-clock seconds from launch to exit.
    Elapsed,
    /// Peak resident set size in KiB.
    PeakMemory,
    /// Peak CPU utilization in percent (may exceed 100 on multi-core).
    PeakCpu,
}

impl Metric {
    /// All metrics in vector order.
    pub const ALL: [Self; 3] = [Self::Elapsed, Self::PeakMemory, Self::PeakCpu];

    /// Position of the metric inside a `MetricVector`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Elapsed => 0,
            Self::PeakMemory => 1,
            Self::PeakCpu => 2,
        }
    }

    /// Human-readable unit label.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Elapsed => "seconds",
            Self::PeakMemory => "KiB",
            Self::PeakCpu => "CPU %",
        }
    }
}

/// Resource usage of one completed process run.
///
/// Immutable once produced: fields are private and only readable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricVector {
    elapsed_secs: f64,
    peak_memory_kib: f64,
    peak_cpu_percent: f64,
}

impl MetricVector {
    /// Create a metric vector.
    ///
    /// Negative or NaN inputs are floored to zero so the non-negativity
    /// invariant holds for every vector in circulation.
    #[must_use]
    pub fn new(elapsed_secs: f64, peak_memory_kib: f64, peak_cpu_percent: f64) -> Self {
        Self {
            elapsed_secs: non_negative(elapsed_secs),
            peak_memory_kib: non_negative(peak_memory_kib),
            peak_cpu_percent: non_negative(peak_cpu_percent),
        }
    }

    /// Build from components in `Metric::ALL` order.
    #[must_use]
    pub fn from_array(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    /// Wall-clock duration in seconds.
    #[must_use]
    pub const fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Peak resident memory in KiB.
    #[must_use]
    pub const fn peak_memory_kib(&self) -> f64 {
        self.peak_memory_kib
    }

    /// Peak CPU utilization in percent.
    #[must_use]
    pub const fn peak_cpu_percent(&self) -> f64 {
        self.peak_cpu_percent
    }

    /// Value of a single metric.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Elapsed => self.elapsed_secs,
            Metric::PeakMemory => self.peak_memory_kib,
            Metric::PeakCpu => self.peak_cpu_percent,
        }
    }

    /// Components in `Metric::ALL` order.
    #[must_use]
    pub const fn to_array(&self) -> [f64; 3] {
        [self.elapsed_secs, self.peak_memory_kib, self.peak_cpu_percent]
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Ordered per-trial measurements, one entry per trial.
pub type TrialSeries = Vec<MetricVector>;

/// Population mean and standard deviation of a trial series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    mean: MetricVector,
    std_dev: MetricVector,
}

impl AggregateStats {
    /// Pair a mean vector with its standard deviation vector.
    #[must_use]
    pub const fn new(mean: MetricVector, std_dev: MetricVector) -> Self {
        Self { mean, std_dev }
    }

    /// Per-metric mean.
    #[must_use]
    pub const fn mean(&self) -> MetricVector {
        self.mean
    }

    /// Per-metric population standard deviation.
    #[must_use]
    pub const fn std_dev(&self) -> MetricVector {
        self.std_dev
    }
}
