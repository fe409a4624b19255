//! Configuration: runtime knobs from the environment and benchmark suites
//! from JSON
//!
//! The suite file is where callers decide which trainer commands run; the
//! crate itself never hard-codes them.
//!
//! ```json
//! {
//!   "cleanup": ["train.vw.gz.cache", "train.vw.gz.fwcache"],
//!   "benchmarks": [
//!     {
//!       "name": "fw",
//!       "phase": "train, no cache",
//!       "command": "fw --data train.vw.gz -c ...",
//!       "process_name": "fw",
//!       "clear_before_each_trial": ["train.vw.gz.fwcache"]
//!     },
//!     {
//!       "name": "fw",
//!       "phase": "predict",
//!       "command": "fw --data easy.vw -t -p fw_preds.out ...",
//!       "process_name": "fw",
//!       "loss": { "predictions": "fw_preds.out", "labels": "easy.vw" }
//!     }
//!   ]
//! }
//! ```

use crate::hooks::remove_files_hook;
use crate::orchestrator::BenchmarkRun;
use crate::sampler::SamplerConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Environment variable prefix for runtime overrides.
pub const ENV_PREFIX: &str = "TRAINER_BENCH_";

/// Runtime settings shared by every benchmark in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Trials per benchmark
    pub trials: usize,
    /// Milliseconds between process-table samples
    pub poll_interval_ms: u64,
    /// Optional per-trial limit in seconds
    pub timeout_secs: Option<u64>,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
    /// Discard the benchmarked programs' stdout/stderr
    pub quiet: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            trials: 5,
            poll_interval_ms: 100,
            timeout_secs: None,
            log_level: "info".to_string(),
            quiet: false,
        }
    }
}

impl BenchConfig {
    /// Defaults overlaid with `TRAINER_BENCH_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`BenchConfig::from_env`] with an injectable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(val) = var("TRIALS") {
            match val.parse() {
                Ok(trials) => config.trials = trials,
                Err(_) => warn!(value = %val, "ignoring invalid TRAINER_BENCH_TRIALS"),
            }
        }

        if let Some(val) = var("POLL_MS") {
            match val.parse() {
                Ok(ms) => config.poll_interval_ms = ms,
                Err(_) => warn!(value = %val, "ignoring invalid TRAINER_BENCH_POLL_MS"),
            }
        }

        if let Some(val) = var("TIMEOUT_SECS") {
            match val.parse() {
                Ok(secs) => config.timeout_secs = Some(secs),
                Err(_) => warn!(value = %val, "ignoring invalid TRAINER_BENCH_TIMEOUT_SECS"),
            }
        }

        if let Some(val) = var("LOG_LEVEL") {
            config.log_level = val;
        }

        if let Some(val) = var("QUIET") {
            config.quiet = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        config
    }

    /// Sampler settings derived from this configuration.
    #[must_use]
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig::default()
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_timeout(self.timeout_secs.map(Duration::from_secs))
            .quiet(self.quiet)
    }
}

/// Files to score after a predict benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossCheck {
    /// One probability per line, written by the trainer
    pub predictions: PathBuf,
    /// Labelled input the predictions were made on
    pub labels: PathBuf,
}

/// One benchmarked command in one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteEntry {
    /// Program label (e.g. "fw", "vw")
    pub name: String,
    /// Phase label (e.g. "train, no cache")
    pub phase: String,
    /// Full command line
    pub command: String,
    /// Executable name as the process table reports it
    pub process_name: String,
    /// Files deleted before every trial (cold-cache runs)
    #[serde(default)]
    pub clear_before_each_trial: Vec<PathBuf>,
    /// Loss check to run after the benchmark
    #[serde(default)]
    pub loss: Option<LossCheck>,
}

impl SuiteEntry {
    /// Label used in logs and errors: "`name` `phase`".
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.phase)
    }

    /// Build a validated `BenchmarkRun` with a cache-clearing hook if needed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for zero trials or blank fields.
    pub fn to_benchmark_run(&self, trials: usize) -> Result<BenchmarkRun> {
        let hook = if self.clear_before_each_trial.is_empty() {
            None
        } else {
            Some(remove_files_hook(self.clear_before_each_trial.clone()))
        };
        BenchmarkRun::builder(self.label(), &self.command, &self.process_name)
            .trials(trials)
            .pre_trial_hook(hook)
            .build()
    }
}

/// A list of benchmarks plus files removed by the `cleanup` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    /// Files removed on cleanup
    #[serde(default)]
    pub cleanup: Vec<PathBuf>,
    /// Benchmarks in execution order
    pub benchmarks: Vec<SuiteEntry>,
}

impl Suite {
    /// Parse a suite from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `Json` on malformed input, `InvalidConfiguration` if empty.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let suite: Self = serde_json::from_str(json)?;
        if suite.benchmarks.is_empty() {
            return Err(Error::InvalidConfiguration(
                "suite defines no benchmarks".to_string(),
            ));
        }
        Ok(suite)
    }

    /// Load a suite file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, plus parse errors.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Keep only entries whose program name is in `names` (all if empty).
    #[must_use]
    pub fn select(mut self, names: &[String]) -> Self {
        if !names.is_empty() {
            self.benchmarks.retain(|entry| names.contains(&entry.name));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SUITE: &str = r#"{
        "cleanup": ["a.cache"],
        "benchmarks": [
            {"name": "vw", "phase": "train", "command": "vw -d x", "process_name": "vw",
             "clear_before_each_trial": ["x.cache"]},
            {"name": "fw", "phase": "predict", "command": "fw -t", "process_name": "fw",
             "loss": {"predictions": "fw.out", "labels": "easy.vw"}}
        ]
    }"#;

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TRAINER_BENCH_TRIALS", "3"),
            ("TRAINER_BENCH_POLL_MS", "25"),
            ("TRAINER_BENCH_TIMEOUT_SECS", "oops"),
            ("TRAINER_BENCH_QUIET", "true"),
        ]
        .into_iter()
        .collect();
        let config = BenchConfig::from_lookup(|k| vars.get(k).map(ToString::to_string));

        assert_eq!(config.trials, 3);
        assert_eq!(config.poll_interval_ms, 25);
        assert_eq!(config.timeout_secs, None);
        assert!(config.quiet);
        assert_eq!(config.sampler_config().poll_interval(), Duration::from_millis(25));
    }

    #[test]
    fn test_parse_suite() {
        let suite = Suite::from_json_str(SUITE).unwrap();
        assert_eq!(suite.benchmarks.len(), 2);
        assert_eq!(suite.cleanup, vec![PathBuf::from("a.cache")]);
        assert!(suite.benchmarks[0].loss.is_none());
        assert!(suite.benchmarks[1].clear_before_each_trial.is_empty());
    }

    #[test]
    fn test_entry_to_run_attaches_hook() {
        let suite = Suite::from_json_str(SUITE).unwrap();
        let cold = suite.benchmarks[0].to_benchmark_run(2).unwrap();
        let warm = suite.benchmarks[1].to_benchmark_run(2).unwrap();
        assert!(cold.has_pre_trial_hook());
        assert!(!warm.has_pre_trial_hook());
        assert_eq!(cold.name(), "vw train");
    }

    #[test]
    fn test_select_by_name() {
        let suite = Suite::from_json_str(SUITE).unwrap().select(&["fw".to_string()]);
        assert_eq!(suite.benchmarks.len(), 1);
        assert_eq!(suite.benchmarks[0].name, "fw");
    }

    #[test]
    fn test_empty_suite_rejected() {
        assert!(matches!(
            Suite::from_json_str(r#"{"benchmarks": []}"#),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
