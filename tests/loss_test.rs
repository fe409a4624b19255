//! Loss evaluator against files on disk

use std::io::Write;
use std::path::Path;
use trainer_bench::loss::cross_entropy;
use trainer_bench::{Error, LossEvaluator, ProbabilityPolicy};

fn write_lines(path: &Path, lines: &[&str]) {
    let mut file = std::fs::File::create(path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
}

#[test]
fn test_half_predictions_alternating_labels_give_ln2() {
    let dir = tempfile::tempdir().unwrap();
    let preds = dir.path().join("fw_preds.out");
    let labels = dir.path().join("easy.vw");

    write_lines(&preds, &["0.5"; 100]);
    let records: Vec<&str> = (0..100)
        .map(|i| if i % 2 == 0 { "1 |A a0 |B b0" } else { "0 |A a1 |B b1" })
        .collect();
    write_lines(&labels, &records);

    let result = LossEvaluator::default()
        .evaluate_files(&preds, &labels)
        .unwrap();
    assert_eq!(result.pairs(), 100);
    assert!((result.mean_loss() - std::f64::consts::LN_2).abs() < 1e-12);
}

#[test]
fn test_single_confident_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let preds = dir.path().join("preds");
    let labels = dir.path().join("labels");
    write_lines(&preds, &["0.9"]);
    write_lines(&labels, &["1 |A x"]);

    let result = LossEvaluator::default()
        .evaluate_files(&preds, &labels)
        .unwrap();
    assert!((result.mean_loss() - 0.1054).abs() < 1e-4);
}

#[test]
fn test_length_mismatch_truncates_silently() {
    // Known gap: alignment is not validated, the shorter source wins.
    let result = LossEvaluator::default()
        .evaluate("0.9\n0.8\n0.7\n".as_bytes(), "1 |A\n".as_bytes())
        .unwrap();
    assert_eq!(result.pairs(), 1);
    assert!((result.mean_loss() - cross_entropy(0.9, 1.0)).abs() < 1e-12);

    let result = LossEvaluator::default()
        .evaluate("0.9\n".as_bytes(), "1 |A\n0 |A\n0 |A\n".as_bytes())
        .unwrap();
    assert_eq!(result.pairs(), 1);
}

#[test]
fn test_whitespace_around_values() {
    let result = LossEvaluator::default()
        .evaluate("  0.25 \n".as_bytes(), "   0   | features\n".as_bytes())
        .unwrap();
    assert!((result.mean_loss() - cross_entropy(0.25, 0.0)).abs() < 1e-12);
}

#[test]
fn test_non_binary_label_counts_as_negative() {
    let result = LossEvaluator::default()
        .evaluate("0.25\n".as_bytes(), "-1 |A\n".as_bytes())
        .unwrap();
    assert!((result.mean_loss() - (-(0.75_f64).ln())).abs() < 1e-12);
}

#[test]
fn test_degenerate_probability_strict_vs_clamp() {
    let strict = LossEvaluator::default().evaluate("1\n".as_bytes(), "0 |A\n".as_bytes());
    assert!(matches!(strict, Err(Error::Numeric(_))));

    let clamped = LossEvaluator::new(ProbabilityPolicy::Clamp(1e-7))
        .evaluate("1\n".as_bytes(), "0 |A\n".as_bytes())
        .unwrap();
    assert!((clamped.mean_loss() - (-(1e-7_f64).ln())).abs() < 1e-6);
}

#[test]
fn test_bad_prediction_reports_source_and_line() {
    let err = LossEvaluator::default()
        .evaluate("0.5\nnot-a-number\n".as_bytes(), "1 |A\n0 |A\n".as_bytes())
        .unwrap_err();
    match err {
        Error::Parse { source_name, line, .. } => {
            assert_eq!(source_name, "predictions");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = LossEvaluator::default()
        .evaluate_files(dir.path().join("missing"), dir.path().join("also-missing"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
