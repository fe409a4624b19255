//! trainer-bench CLI: benchmark competing trainers from a JSON suite.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trainer_bench::config::{BenchConfig, Suite};
use trainer_bench::hooks::remove_all_quietly;
use trainer_bench::report::{ComparisonReport, PhaseReport};
use trainer_bench::system_info::SystemInfo;
use trainer_bench::{LossEvaluator, ProbabilityPolicy, ProcessSampler, TrialOrchestrator};

#[derive(Parser)]
#[command(name = "trainer-bench")]
#[command(about = "Benchmark trainer binaries: wall time, peak memory, peak CPU, log-loss")]
#[command(version)]
struct Cli {
    /// Log level when RUST_LOG is unset (overrides TRAINER_BENCH_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every benchmark in a suite file
    Run {
        /// Suite file (JSON)
        #[arg(short, long)]
        suite: PathBuf,

        /// Trials per benchmark
        #[arg(short, long)]
        trials: Option<usize>,

        /// Milliseconds between samples
        #[arg(long)]
        poll_ms: Option<u64>,

        /// Kill a trial after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Only run these programs (repeatable)
        #[arg(long)]
        only: Vec<String>,

        /// Write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Clamp predictions to [eps, 1 - eps] in loss checks
        #[arg(long, value_parser = parse_epsilon)]
        clamp: Option<f64>,

        /// Discard the benchmarked programs' output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Compute mean cross-entropy of a predictions file
    Loss {
        /// One probability per line
        #[arg(short, long)]
        predictions: PathBuf,

        /// Labelled input (label before the first `|`)
        #[arg(short, long)]
        labels: PathBuf,

        /// Clamp predictions to [eps, 1 - eps]
        #[arg(long, value_parser = parse_epsilon)]
        clamp: Option<f64>,
    },

    /// Remove the files listed under `cleanup` in a suite
    Cleanup {
        /// Suite file (JSON)
        #[arg(short, long)]
        suite: PathBuf,
    },

    /// Print CPU and OS information
    Sysinfo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = BenchConfig::from_env();
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_logging(&config.log_level);

    match cli.command {
        Commands::Run {
            suite,
            trials,
            poll_ms,
            timeout_secs,
            only,
            output,
            clamp,
            quiet,
        } => {
            if let Some(trials) = trials {
                config.trials = trials;
            }
            if let Some(ms) = poll_ms {
                config.poll_interval_ms = ms;
            }
            if timeout_secs.is_some() {
                config.timeout_secs = timeout_secs;
            }
            config.quiet |= quiet;
            run_suite(&config, &suite, &only, output.as_deref(), policy(clamp))
        }
        Commands::Loss {
            predictions,
            labels,
            clamp,
        } => {
            let result = LossEvaluator::new(policy(clamp))
                .evaluate_files(&predictions, &labels)
                .with_context(|| format!("scoring {}", predictions.display()))?;
            println!(
                "loss: {:.6} over {} predictions",
                result.mean_loss(),
                result.pairs()
            );
            Ok(())
        }
        Commands::Cleanup { suite } => {
            let suite = Suite::from_path(&suite)
                .with_context(|| format!("loading suite {}", suite.display()))?;
            remove_all_quietly(&suite.cleanup);
            info!(files = suite.cleanup.len(), "cleanup done");
            Ok(())
        }
        Commands::Sysinfo => {
            println!("{}", SystemInfo::collect());
            Ok(())
        }
    }
}

fn run_suite(
    config: &BenchConfig,
    suite_path: &std::path::Path,
    only: &[String],
    output: Option<&std::path::Path>,
    policy: ProbabilityPolicy,
) -> Result<()> {
    let suite = Suite::from_path(suite_path)
        .with_context(|| format!("loading suite {}", suite_path.display()))?
        .select(only);
    if suite.benchmarks.is_empty() {
        warn!(?only, "no benchmarks selected");
        return Ok(());
    }

    let system = SystemInfo::collect();
    println!("{system}");

    let mut orchestrator = TrialOrchestrator::new(ProcessSampler::new(config.sampler_config()));
    let evaluator = LossEvaluator::new(policy);
    let mut report = ComparisonReport::new(Some(system));
    let started = Instant::now();

    for entry in &suite.benchmarks {
        let phase = PhaseReport::measure(entry, config.trials, &mut orchestrator, &evaluator)
            .with_context(|| format!("benchmarking `{}`", entry.label()))?;
        println!("{}", phase.summary_line());
        report.add(phase);
    }

    for phase in report.phases() {
        if let Some(loss) = phase.loss() {
            println!("{} predictions loss: {}", phase.program(), loss.mean_loss());
        } else if let Some(error) = phase.loss_error() {
            println!("{} predictions loss: failed ({error})", phase.program());
        }
    }

    info!(
        benchmarks = report.phases().len(),
        total_secs = started.elapsed().as_secs_f64(),
        "suite complete"
    );

    if let Some(path) = output {
        report
            .write_json(path)
            .with_context(|| format!("writing report {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn policy(clamp: Option<f64>) -> ProbabilityPolicy {
    clamp.map_or(ProbabilityPolicy::Strict, ProbabilityPolicy::Clamp)
}

/// Clap parser for `--clamp`: a finite epsilon in [0, 0.5).
fn parse_epsilon(text: &str) -> std::result::Result<f64, String> {
    let eps: f64 = text.parse().map_err(|e| format!("`{text}`: {e}"))?;
    ProbabilityPolicy::Clamp(eps)
        .validate()
        .map(|_| eps)
        .map_err(|e| e.to_string())
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Logs on stderr; stdout carries the report.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
