//! # trainer-bench: Repeated-Trial Resource Benchmarking
//!
//! **Version**: 0.1.0
//!
//! trainer-bench compares competing command-line trainers by launching each
//! one as a subprocess several times, sampling its wall time, peak resident
//! memory and peak CPU utilization, and folding the trials into population
//! mean / standard deviation. A cross-entropy check over each trainer's
//! predictions confirms the two reach comparable predictive quality.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Genchi Genbutsu**: measure the real process, not a model of it
//! - **Jidoka**: one failed trial stops the run; no partial averages
//! - **Poka-Yoke**: `trials == 0` is rejected before anything launches
//! - **Heijunka**: trials run strictly one at a time so they never contend
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trainer_bench::hooks::remove_files_hook;
//! use trainer_bench::orchestrator::{BenchmarkRun, TrialOrchestrator};
//! use trainer_bench::report::format_metrics;
//! use trainer_bench::sampler::{ProcessSampler, SamplerConfig};
//!
//! let mut cold = BenchmarkRun::builder("fw train, no cache", "fw --data train.vw.gz -c", "fw")
//!     .trials(5)
//!     .pre_trial_hook(Some(remove_files_hook(vec!["train.vw.gz.fwcache".into()])))
//!     .build()?;
//!
//! let mut orchestrator = TrialOrchestrator::new(ProcessSampler::new(SamplerConfig::default()));
//! let outcome = orchestrator.run(&mut cold)?;
//! println!("{}", format_metrics(cold.trials(), outcome.stats()));
//! # Ok::<(), trainer_bench::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod hooks;
pub mod loss;
pub mod metrics;
pub mod orchestrator;
pub mod report;
pub mod sampler;
pub mod stats;
pub mod system_info;

pub use error::{Error, Result};
pub use loss::{LossEvaluator, LossResult, ProbabilityPolicy};
pub use metrics::{AggregateStats, Metric, MetricVector, TrialSeries};
pub use orchestrator::{BenchmarkOutcome, BenchmarkRun, TrialOrchestrator};
pub use sampler::{ProcessLocator, ProcessSampler, ResourceSampler, SamplerConfig};
