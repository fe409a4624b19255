//! Benchmark results as plain data
//!
//! Collects per-phase outcomes and loss values, formats one-line summaries,
//! and exposes the per-program series a chart renderer needs. Rendering
//! itself happens elsewhere; this module only shapes the data.
//!
//! ## Layout
//!
//! ```text
//! ComparisonReport ──< PhaseReport (program, phase, outcome, loss?)
//!        │
//!        └── series(metric) → [ChartSeries { program, values per phase }]
//! ```

use crate::config::SuiteEntry;
use crate::loss::{LossEvaluator, LossResult};
use crate::metrics::{AggregateStats, Metric};
use crate::orchestrator::{BenchmarkOutcome, TrialOrchestrator};
use crate::sampler::ResourceSampler;
use crate::system_info::SystemInfo;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

const KIB_PER_MB: f64 = 1024.0;

/// One-line human summary of an aggregate, memory shown in MB.
///
/// `"12.31 ± 0.20 seconds, 512 ± 3.10 MB, 99.70 ± 0.10% CPU (5 runs)"`
#[must_use]
pub fn format_metrics(trials: usize, stats: &AggregateStats) -> String {
    let mean = stats.mean();
    let std = stats.std_dev();
    format!(
        "{:.2} ± {:.2} seconds, {:.0} ± {:.2} MB, {:.2} ± {:.2}% CPU ({trials} runs)",
        mean.elapsed_secs(),
        std.elapsed_secs(),
        mean.peak_memory_kib() / KIB_PER_MB,
        std.peak_memory_kib() / KIB_PER_MB,
        mean.peak_cpu_percent(),
        std.peak_cpu_percent(),
    )
}

/// Display value of a metric mean (memory in MB, others unchanged).
#[must_use]
pub fn display_value(metric: Metric, stats: &AggregateStats) -> f64 {
    let value = stats.mean().get(metric);
    match metric {
        Metric::PeakMemory => value / KIB_PER_MB,
        Metric::Elapsed | Metric::PeakCpu => value,
    }
}

/// Result of one program in one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    program: String,
    phase: String,
    outcome: BenchmarkOutcome,
    loss: Option<LossResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    loss_error: Option<String>,
}

impl PhaseReport {
    /// Create a phase report.
    #[must_use]
    pub fn new(
        program: impl Into<String>,
        phase: impl Into<String>,
        outcome: BenchmarkOutcome,
        loss: Option<LossResult>,
    ) -> Self {
        Self {
            program: program.into(),
            phase: phase.into(),
            outcome,
            loss,
            loss_error: None,
        }
    }

    /// Benchmark one suite entry, then run its loss check if it has one.
    ///
    /// A failed loss check does not discard the timings: the failure is
    /// logged and kept in [`PhaseReport::loss_error`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for an invalid entry and
    /// `TrialFailed` if any trial fails.
    pub fn measure<S: ResourceSampler>(
        entry: &SuiteEntry,
        trials: usize,
        orchestrator: &mut TrialOrchestrator<S>,
        evaluator: &LossEvaluator,
    ) -> Result<Self> {
        let mut run = entry.to_benchmark_run(trials)?;
        let outcome = orchestrator.run(&mut run)?;
        let mut phase = Self::new(&entry.name, &entry.phase, outcome, None);

        if let Some(check) = &entry.loss {
            match evaluator.evaluate_files(&check.predictions, &check.labels) {
                Ok(loss) => phase.loss = Some(loss),
                Err(e) => {
                    warn!(benchmark = %entry.label(), error = %e, "loss check failed");
                    phase.loss_error = Some(e.to_string());
                }
            }
        }
        Ok(phase)
    }

    /// Record why the loss check failed.
    #[must_use]
    pub fn with_loss_error(mut self, message: impl Into<String>) -> Self {
        self.loss_error = Some(message.into());
        self
    }

    /// Program label.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Phase label.
    #[must_use]
    pub fn phase(&self) -> &str {
        &self.phase
    }

    /// Benchmark outcome.
    #[must_use]
    pub const fn outcome(&self) -> &BenchmarkOutcome {
        &self.outcome
    }

    /// Loss check, if one ran.
    #[must_use]
    pub const fn loss(&self) -> Option<LossResult> {
        self.loss
    }

    /// Loss check failure message, if the check ran and failed.
    #[must_use]
    pub fn loss_error(&self) -> Option<&str> {
        self.loss_error.as_deref()
    }

    /// `"fw train, no cache: <format_metrics>"`
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "{} {}: {}",
            self.program,
            self.phase,
            format_metrics(self.outcome.trials().len(), self.outcome.stats())
        )
    }
}

/// One bar group: a program's mean values across phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Program label
    pub program: String,
    /// One value per phase label, `None` where the program skipped a phase
    pub values: Vec<Option<f64>>,
}

/// All phases of a benchmark session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    generated_at: DateTime<Utc>,
    system: Option<SystemInfo>,
    phases: Vec<PhaseReport>,
}

impl ComparisonReport {
    /// Start an empty report stamped with the current time.
    #[must_use]
    pub fn new(system: Option<SystemInfo>) -> Self {
        Self {
            generated_at: Utc::now(),
            system,
            phases: Vec::new(),
        }
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Host description, if collected.
    #[must_use]
    pub const fn system(&self) -> Option<&SystemInfo> {
        self.system.as_ref()
    }

    /// Append a phase result.
    pub fn add(&mut self, phase: PhaseReport) {
        self.phases.push(phase);
    }

    /// Phase results in insertion order.
    #[must_use]
    pub fn phases(&self) -> &[PhaseReport] {
        &self.phases
    }

    /// Check if the report has no phases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Distinct phase labels in first-seen order (chart x axis).
    #[must_use]
    pub fn phase_labels(&self) -> Vec<String> {
        distinct(self.phases.iter().map(PhaseReport::phase))
    }

    /// Distinct program labels in first-seen order (chart legend).
    #[must_use]
    pub fn programs(&self) -> Vec<String> {
        distinct(self.phases.iter().map(PhaseReport::program))
    }

    /// Mean of `metric` per program, aligned to [`ComparisonReport::phase_labels`].
    ///
    /// If a program ran the same phase twice, the later run wins.
    #[must_use]
    pub fn series(&self, metric: Metric) -> Vec<ChartSeries> {
        let labels = self.phase_labels();
        self.programs()
            .into_iter()
            .map(|program| {
                let values = labels
                    .iter()
                    .map(|label| {
                        self.phases
                            .iter()
                            .rev()
                            .find(|p| p.program == program && &p.phase == label)
                            .map(|p| display_value(metric, p.outcome.stats()))
                    })
                    .collect();
                ChartSeries { program, values }
            })
            .collect()
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty JSON to `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Json` on failure.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

fn distinct<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.iter().any(|seen| seen == item) {
            out.push(item.to_string());
        }
    }
    out
}
