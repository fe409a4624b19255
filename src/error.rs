//! Error types for trainer-bench
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trainer-bench error types
#[derive(Error, Debug)]
pub enum Error {
    /// Subprocess could not be started (missing executable, permission denied)
    #[error("Failed to launch `{command}`: {reason}")]
    Launch {
        /// Command line that failed
        command: String,
        /// Why the launch failed
        reason: String,
    },

    /// Benchmark configuration rejected before any trial ran
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Degenerate numeric input (e.g. log of zero in the loss computation)
    #[error("Numeric error: {0}")]
    Numeric(String),

    /// Malformed line in a predictions or labels source
    #[error("Parse error in {source_name} at line {line}: {message}")]
    Parse {
        /// Which input the line came from
        source_name: String,
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// Per-trial timeout expired and the child was killed
    #[error("`{command}` exceeded the {timeout_secs:.1}s trial timeout and was killed")]
    Timeout {
        /// Command line that hung
        command: String,
        /// Configured limit in seconds
        timeout_secs: f64,
    },

    /// A trial failed, which invalidates the whole benchmark (no partial averaging)
    #[error("Benchmark `{benchmark}` failed at trial {trial}: {source}")]
    TrialFailed {
        /// Benchmark name
        benchmark: String,
        /// 0-based trial index
        trial: usize,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
