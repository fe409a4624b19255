//! Trial orchestration: N sequential trials of one command, folded into
//! mean / standard deviation
//!
//! ## Trial loop
//!
//! ```text
//! for trial in 0..N:
//!     pre-trial hook (runs to completion)   ← controls cold vs warm cache
//!     sampler.sample(command, process_name) → MetricVector
//! aggregate(TrialSeries) → AggregateStats
//! ```
//!
//! Trials never overlap: concurrent subprocesses would contend for CPU and
//! memory and corrupt each other's measurements. A failed trial aborts the
//! whole run; averaging over fewer trials than configured would bias the
//! comparison.
//!
//! ## Usage
//!
//! ```rust
//! use trainer_bench::metrics::MetricVector;
//! use trainer_bench::orchestrator::{BenchmarkRun, TrialOrchestrator};
//!
//! let mut run = BenchmarkRun::builder("fw train", "fw --data train.vw.gz", "fw")
//!     .trials(3)
//!     .build()?;
//!
//! let mut elapsed = [1.0, 3.0, 2.0].into_iter();
//! let stub = move |_: &str, _: &str| -> trainer_bench::Result<MetricVector> {
//!     Ok(MetricVector::new(elapsed.next().unwrap_or_default(), 100.0, 10.0))
//! };
//!
//! let outcome = TrialOrchestrator::new(stub).run(&mut run)?;
//! assert!((outcome.stats().mean().elapsed_secs() - 2.0).abs() < 1e-9);
//! # Ok::<(), trainer_bench::Error>(())
//! ```

use crate::metrics::{AggregateStats, TrialSeries};
use crate::sampler::ResourceSampler;
use crate::stats;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Zero-argument side-effecting action run before every trial.
pub type PreTrialHook = Box<dyn FnMut()>;

/// One benchmark invocation: command, process to sample, trial count, hook.
pub struct BenchmarkRun {
    name: String,
    command: String,
    process_name: String,
    trials: usize,
    pre_trial: Option<PreTrialHook>,
}

impl std::fmt::Debug for BenchmarkRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkRun")
            .field("name", &self.name)
            .field("command", &self.command)
            .field("process_name", &self.process_name)
            .field("trials", &self.trials)
            .field("pre_trial", &self.pre_trial.is_some())
            .finish()
    }
}

impl BenchmarkRun {
    /// Create a builder with the required fields.
    #[must_use]
    pub fn builder(
        name: impl Into<String>,
        command: impl Into<String>,
        process_name: impl Into<String>,
    ) -> BenchmarkRunBuilder {
        BenchmarkRunBuilder::new(name, command, process_name)
    }

    /// Display name (e.g. "fw train, no cache").
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command line handed to the shell.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Executable name looked up in the process table.
    #[must_use]
    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Configured number of trials (always >= 1).
    #[must_use]
    pub const fn trials(&self) -> usize {
        self.trials
    }

    /// Whether a pre-trial hook is configured.
    #[must_use]
    pub const fn has_pre_trial_hook(&self) -> bool {
        self.pre_trial.is_some()
    }
}

/// Builder for `BenchmarkRun`.
pub struct BenchmarkRunBuilder {
    name: String,
    command: String,
    process_name: String,
    trials: usize,
    pre_trial: Option<PreTrialHook>,
}

impl BenchmarkRunBuilder {
    /// Default trial count.
    pub const DEFAULT_TRIALS: usize = 5;

    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        process_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            process_name: process_name.into(),
            trials: Self::DEFAULT_TRIALS,
            pre_trial: None,
        }
    }

    /// Set the number of trials.
    #[must_use]
    pub const fn trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Run `hook` before every trial (e.g. delete a cache file).
    #[must_use]
    pub fn pre_trial(mut self, hook: impl FnMut() + 'static) -> Self {
        self.pre_trial = Some(Box::new(hook));
        self
    }

    /// Attach an already boxed hook, or clear it with `None`.
    #[must_use]
    pub fn pre_trial_hook(mut self, hook: Option<PreTrialHook>) -> Self {
        self.pre_trial = hook;
        self
    }

    /// Validate and build the `BenchmarkRun`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the trial count is zero or the
    /// command / process name is blank.
    pub fn build(self) -> Result<BenchmarkRun> {
        if self.trials == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "benchmark `{}`: trial count must be >= 1",
                self.name
            )));
        }
        if self.command.trim().is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "benchmark `{}`: command is empty",
                self.name
            )));
        }
        if self.process_name.trim().is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "benchmark `{}`: process name is empty",
                self.name
            )));
        }
        Ok(BenchmarkRun {
            name: self.name,
            command: self.command,
            process_name: self.process_name,
            trials: self.trials,
            pre_trial: self.pre_trial,
        })
    }
}

/// Result of one benchmark: aggregate statistics plus the raw trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkOutcome {
    name: String,
    stats: AggregateStats,
    trials: TrialSeries,
}

impl BenchmarkOutcome {
    /// Benchmark name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mean and population standard deviation per metric.
    #[must_use]
    pub const fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    /// Per-trial vectors in trial order.
    #[must_use]
    pub fn trials(&self) -> &[crate::metrics::MetricVector] {
        &self.trials
    }
}

/// Runs benchmarks one trial at a time through a `ResourceSampler`.
#[derive(Debug)]
pub struct TrialOrchestrator<S> {
    sampler: S,
}

impl<S: ResourceSampler> TrialOrchestrator<S> {
    /// Wrap a sampler.
    #[must_use]
    pub const fn new(sampler: S) -> Self {
        Self { sampler }
    }

    /// Mutable access to the sampler.
    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    /// Unwrap the sampler.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.sampler
    }

    /// Run every trial of `run` and aggregate.
    ///
    /// # Errors
    ///
    /// Returns `TrialFailed` naming the benchmark and trial index if any
    /// trial fails; no partial statistics are produced.
    pub fn run(&mut self, run: &mut BenchmarkRun) -> Result<BenchmarkOutcome> {
        info!(
            benchmark = %run.name,
            trials = run.trials,
            cold = run.pre_trial.is_some(),
            "starting benchmark"
        );

        let mut series = TrialSeries::with_capacity(run.trials);
        for trial in 0..run.trials {
            if let Some(hook) = run.pre_trial.as_mut() {
                hook();
            }

            let metrics = self
                .sampler
                .sample(&run.command, &run.process_name)
                .map_err(|source| Error::TrialFailed {
                    benchmark: run.name.clone(),
                    trial,
                    source: Box::new(source),
                })?;

            debug!(
                benchmark = %run.name,
                trial,
                elapsed_secs = metrics.elapsed_secs(),
                peak_memory_kib = metrics.peak_memory_kib(),
                peak_cpu_percent = metrics.peak_cpu_percent(),
                "trial complete"
            );
            series.push(metrics);
        }

        let stats = stats::aggregate(&series)?;
        info!(
            benchmark = %run.name,
            mean_secs = stats.mean().elapsed_secs(),
            std_secs = stats.std_dev().elapsed_secs(),
            "benchmark complete"
        );

        Ok(BenchmarkOutcome {
            name: run.name.clone(),
            stats,
            trials: series,
        })
    }
}
