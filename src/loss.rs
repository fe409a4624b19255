//! Cross-entropy loss over a predictions file and its labelled input
//!
//! Sanity check that two competing trainers reach comparable predictive
//! quality. Both sources are consumed lazily, line for line, in lockstep:
//!
//! ```text
//! predictions:  0.73          labels:  1 |A a b |B c
//!               0.12                   0 |A d   |B e
//! ```
//!
//! The label is the text before the first `|`, trimmed, parsed as a float.
//!
//! **Alignment is not validated.** Sources of different length are
//! silently truncated to the shorter one, and a reordered file simply
//! produces a wrong number. `LossResult::pairs` exposes how many pairs
//! were actually consumed so callers can compare it to what they expect.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Binary cross-entropy of one prediction: `-ln(y_hat)` for `y == 1`,
/// `-ln(1 - y_hat)` otherwise.
///
/// Labels other than exactly `1` count as the negative class. No clamping:
/// `y_hat` of 0 or 1 on the wrong side yields `+inf`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn cross_entropy(y_hat: f64, y: f64) -> f64 {
    if y == 1.0 {
        -y_hat.ln()
    } else {
        -(1.0 - y_hat).ln()
    }
}

/// What to do with probabilities that make the logarithm diverge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ProbabilityPolicy {
    /// Fail with `Numeric` on any non-finite term or out-of-range input.
    #[default]
    Strict,
    /// Clamp predictions into `[eps, 1 - eps]` before taking the log.
    ///
    /// Hides miscalibration; opt-in only. `eps` must be finite and in
    /// `[0, 0.5)`.
    Clamp(f64),
}

impl ProbabilityPolicy {
    /// Check the policy's parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for a `Clamp` epsilon that is not
    /// finite or lies outside `[0, 0.5)`.
    pub fn validate(self) -> Result<Self> {
        match self {
            Self::Clamp(eps) if !eps.is_finite() || !(0.0..0.5).contains(&eps) => {
                Err(Error::InvalidConfiguration(format!(
                    "clamp epsilon must be finite and in [0, 0.5), got {eps}"
                )))
            }
            policy => Ok(policy),
        }
    }
}

/// Mean cross-entropy over aligned pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossResult {
    mean_loss: f64,
    pairs: usize,
}

impl LossResult {
    /// Mean loss (0 = perfectly confident and correct, unbounded above).
    #[must_use]
    pub const fn mean_loss(&self) -> f64 {
        self.mean_loss
    }

    /// Number of (prediction, label) pairs consumed.
    #[must_use]
    pub const fn pairs(&self) -> usize {
        self.pairs
    }
}

/// Computes mean cross-entropy from two line-oriented sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct LossEvaluator {
    policy: ProbabilityPolicy,
}

impl LossEvaluator {
    /// Create an evaluator with the given probability policy.
    #[must_use]
    pub const fn new(policy: ProbabilityPolicy) -> Self {
        Self { policy }
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> ProbabilityPolicy {
        self.policy
    }

    /// Open both files and evaluate.
    ///
    /// # Errors
    ///
    /// Returns `Io` if either file cannot be opened, plus everything
    /// [`LossEvaluator::evaluate`] returns.
    pub fn evaluate_files(
        &self,
        predictions: impl AsRef<Path>,
        labels: impl AsRef<Path>,
    ) -> Result<LossResult> {
        let predictions = BufReader::new(File::open(predictions.as_ref())?);
        let labels = BufReader::new(File::open(labels.as_ref())?);
        self.evaluate(predictions, labels)
    }

    /// Walk both sources in lockstep and average the per-line loss.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` for an invalid clamp epsilon
    /// - `Parse` for a prediction or label that is not a number
    /// - `Numeric` if no pair was read, a prediction is NaN, or a term is
    ///   not finite under [`ProbabilityPolicy::Strict`]
    /// - `Io` on read failures
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn evaluate(&self, predictions: impl BufRead, labels: impl BufRead) -> Result<LossResult> {
        self.policy.validate()?;
        let mut total = 0.0_f64;
        let mut pairs = 0_usize;
        let mut warned_label = false;

        for (index, (prediction, record)) in predictions.lines().zip(labels.lines()).enumerate() {
            let line = index + 1;
            let (prediction, record) = (prediction?, record?);

            let y_hat = parse_field(prediction.trim(), "predictions", line)?;
            let y = parse_field(label_of(&record), "labels", line)?;

            if !warned_label && y != 0.0 && y != 1.0 {
                warn!(line, label = y, "label is neither 0 nor 1, treating as negative");
                warned_label = true;
            }

            total += self.term(y_hat, y, line)?;
            pairs += 1;
        }

        if pairs == 0 {
            return Err(Error::Numeric(
                "no aligned (prediction, label) pairs; mean loss is undefined".to_string(),
            ));
        }

        Ok(LossResult {
            mean_loss: total / pairs as f64,
            pairs,
        })
    }

    fn term(&self, y_hat: f64, y: f64, line: usize) -> Result<f64> {
        if y_hat.is_nan() {
            return Err(Error::Numeric(format!("line {line}: prediction is NaN")));
        }
        match self.policy {
            // eps was validated in `evaluate`
            ProbabilityPolicy::Clamp(eps) => Ok(cross_entropy(y_hat.clamp(eps, 1.0 - eps), y)),
            ProbabilityPolicy::Strict => {
                if !(0.0..=1.0).contains(&y_hat) {
                    return Err(Error::Numeric(format!(
                        "line {line}: prediction {y_hat} is not a probability"
                    )));
                }
                let loss = cross_entropy(y_hat, y);
                if loss.is_finite() {
                    Ok(loss)
                } else {
                    Err(Error::Numeric(format!(
                        "line {line}: prediction {y_hat} for label {y} gives infinite loss"
                    )))
                }
            }
        }
    }
}

/// Label field of a labelled input record: text before the first `|`.
fn label_of(record: &str) -> &str {
    record.split('|').next().unwrap_or_default().trim()
}

fn parse_field(text: &str, source_name: &str, line: usize) -> Result<f64> {
    text.parse::<f64>().map_err(|e| Error::Parse {
        source_name: source_name.to_string(),
        line,
        message: format!("`{text}`: {e}"),
    })
}
