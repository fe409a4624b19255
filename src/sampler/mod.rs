//! Resource sampling of one external process, launch to exit
//!
//! A trial launches a command line through the platform shell and polls the
//! process table at a fixed interval while the child runs. Each poll reads
//! resident memory and CPU utilization; the trial keeps the maximum of each
//! (peak, not average) plus the wall-clock time from launch to exit.
//!
//! ## Seams
//!
//! - [`ProcessLocator`]: "find running process by name", polymorphic over the
//!   platform process table. [`SysinfoLocator`] is the `sysinfo` implementation.
//! - [`ResourceSampler`]: "run this command once and measure it". The
//!   orchestrator only depends on this trait, so tests substitute stubs.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use trainer_bench::sampler::{ProcessSampler, ResourceSampler, SamplerConfig};
//!
//! let mut sampler = ProcessSampler::new(
//!     SamplerConfig::default().with_poll_interval(Duration::from_millis(50)),
//! );
//! let metrics = sampler.sample("sleep 1", "sleep")?;
//! println!("{:.2}s, {:.0} KiB peak", metrics.elapsed_secs(), metrics.peak_memory_kib());
//! # Ok::<(), trainer_bench::Error>(())
//! ```

mod locator;
mod process;

pub use locator::{ProcessLocator, ProcessSnapshot, SysinfoLocator};
pub use process::ProcessSampler;

use crate::metrics::MetricVector;
use crate::Result;
use std::time::Duration;

/// Default polling interval between process-table samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Smallest accepted polling interval; shorter values are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Measures one run of a command.
pub trait ResourceSampler {
    /// Launch `command`, sample the process named `process_name` until the
    /// command exits, and return its metric vector.
    ///
    /// # Errors
    ///
    /// Returns `Launch` if the command cannot be started, `Timeout` if a
    /// configured limit expires, or `Io` on process-handle failures.
    ///
    /// [`ProcessSampler`] runs commands through a shell and treats shell
    /// exit codes 126 and 127 as `Launch` errors. A benchmarked program that
    /// itself exits with 126 or 127 is therefore reported as `Launch` too;
    /// other non-zero exits are logged and the trial is still measured.
    fn sample(&mut self, command: &str, process_name: &str) -> Result<MetricVector>;
}

impl<F> ResourceSampler for F
where
    F: FnMut(&str, &str) -> Result<MetricVector>,
{
    fn sample(&mut self, command: &str, process_name: &str) -> Result<MetricVector> {
        self(command, process_name)
    }
}

/// Sampler settings, passed explicitly instead of module-level constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    poll_interval: Duration,
    timeout: Option<Duration>,
    quiet: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            quiet: false,
        }
    }
}

impl SamplerConfig {
    /// Set the polling interval (floored at [`MIN_POLL_INTERVAL`]).
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Bound each trial; the child is killed when the limit expires.
    ///
    /// Without a timeout a hung child blocks the benchmark indefinitely.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Discard the child's stdout and stderr.
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Interval between samples.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Per-trial limit, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether child output is discarded.
    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SamplerConfig::default();
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert!(config.timeout().is_none());
        assert!(!config.is_quiet());
    }

    #[test]
    fn test_poll_interval_is_floored() {
        let config = SamplerConfig::default().with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval(), MIN_POLL_INTERVAL);
    }

    #[test]
    fn test_closure_is_a_sampler() {
        let mut calls = 0;
        let mut stub = |_: &str, _: &str| -> Result<MetricVector> {
            calls += 1;
            Ok(MetricVector::new(1.0, 2.0, 3.0))
        };
        let v = stub.sample("cmd", "proc").unwrap();
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0]);
        assert_eq!(calls, 1);
    }
}
