//! Tests for error types

use std::error::Error as _;
use trainer_bench::Error;

#[test]
fn test_launch_error() {
    let error = Error::Launch {
        command: "vw --data train.vw.gz".to_string(),
        reason: "No such file or directory".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Failed to launch"));
    assert!(error_str.contains("vw --data train.vw.gz"));
    assert!(error_str.contains("No such file"));
}

#[test]
fn test_invalid_configuration_error() {
    let error = Error::InvalidConfiguration("trial count must be >= 1".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid configuration"));
    assert!(error_str.contains("trial count"));
}

#[test]
fn test_numeric_error() {
    let error = Error::Numeric("prediction 0 for label 1 gives infinite loss".to_string());
    assert!(format!("{error}").contains("Numeric error"));
}

#[test]
fn test_parse_error() {
    let error = Error::Parse {
        source_name: "labels".to_string(),
        line: 7,
        message: "`x`: invalid float literal".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("labels"));
    assert!(error_str.contains("line 7"));
}

#[test]
fn test_timeout_error() {
    let error = Error::Timeout {
        command: "sleep 100".to_string(),
        timeout_secs: 2.0,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("sleep 100"));
    assert!(error_str.contains("2.0s"));
}

#[test]
fn test_trial_failed_names_benchmark_and_trial() {
    let error = Error::TrialFailed {
        benchmark: "fw train".to_string(),
        trial: 3,
        source: Box::new(Error::Launch {
            command: "fw".to_string(),
            reason: "permission denied".to_string(),
        }),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("fw train"));
    assert!(error_str.contains("trial 3"));
    assert!(error_str.contains("permission denied"));
    assert!(error.source().is_some());
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "preds.out");
    let error: Error = io_error.into();
    assert!(format!("{error}").contains("IO error"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}
