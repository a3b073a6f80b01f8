// Comparison Report Tests
//
// Builds aggregated reports from in-memory per-language results and checks
// the matrix, agreement accounting, and on-disk round trip.

use std::time::Duration;

use comparison_core::exec::{results_path, RunMode, RunOutcome};
use comparison_core::model::{
    BenchmarkReport, ComparisonReport, RunStatus, TestReport, TestStatus,
};
use comparison_core::report::{build_report, write_report, REPORT_FILE};
use pretty_assertions::assert_eq;

fn test_report(language: &str, statuses: &[(&str, &str, f64)]) -> TestReport {
    let tests: Vec<serde_json::Value> = statuses
        .iter()
        .map(|(name, status, time)| {
            serde_json::json!({
                "name": name,
                "expression": "Patient.name",
                "status": status,
                "execution_time_ms": time,
            })
        })
        .collect();
    let mut report: TestReport = serde_json::from_value(serde_json::json!({
        "language": language,
        "timestamp": 1722945600.0,
        "tests": tests,
    }))
    .unwrap();
    report.summary = comparison_core::model::TestSummary::from_results(&report.tests);
    report
}

fn outcome(language: &str, status: RunStatus) -> RunOutcome {
    RunOutcome {
        language: language.to_string(),
        status,
        exit_code: Some(if status == RunStatus::Completed { 0 } else { 1 }),
        duration: Duration::from_millis(1200),
        stderr_tail: None,
        results_path: results_path(std::path::Path::new("results"), language, RunMode::Test),
    }
}

#[test]
fn matrix_unions_tests_across_languages() {
    let python = test_report(
        "python",
        &[("alpha", "passed", 1.0), ("beta", "failed", 2.0)],
    );
    let rust = test_report(
        "rust",
        &[("alpha", "passed", 0.1), ("gamma", "passed", 0.2)],
    );

    let report = build_report(&[python, rust], &[], &[]);

    assert_eq!(report.languages, vec!["python", "rust"]);
    assert_eq!(report.summary.tests, 3);

    let names: Vec<&str> = report.matrix.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);

    let alpha = &report.matrix[0];
    assert_eq!(alpha.statuses.len(), 2);
    assert!(alpha.agreement);

    // beta and gamma only exist in one language each.
    assert_eq!(report.matrix[1].statuses.len(), 1);
    assert_eq!(report.summary.unanimous_passes, 1); // only alpha passed everywhere
}

#[test]
fn disagreement_is_detected() {
    let python = test_report("python", &[("alpha", "passed", 1.0)]);
    let java = test_report("java", &[("alpha", "failed", 3.0)]);

    let report = build_report(&[python, java], &[], &[]);
    assert!(!report.matrix[0].agreement);
    assert_eq!(report.summary.unanimous_passes, 0);
    assert_eq!(report.summary.agreement_rate, 0.0);
}

#[test]
fn pass_rate_ignores_skipped_tests() {
    let js = test_report(
        "javascript",
        &[
            ("alpha", "passed", 1.0),
            ("beta", "skipped", 0.0),
            ("gamma", "failed", 2.0),
        ],
    );

    let report = build_report(&[js], &[], &[]);
    let summary = &report.language_summaries["javascript"];
    assert_eq!(summary.total, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.pass_rate, 0.5);
}

#[test]
fn failed_run_still_appears_in_report() {
    let python = test_report("python", &[("alpha", "passed", 1.0)]);
    let outcomes = vec![
        outcome("python", RunStatus::Completed),
        outcome("java", RunStatus::TimedOut),
    ];

    let report = build_report(&[python], &[], &outcomes);

    assert_eq!(report.languages, vec!["java", "python"]);
    let java = &report.language_summaries["java"];
    assert_eq!(java.total, 0);
    assert_eq!(java.run_status, Some(RunStatus::TimedOut));
    assert_eq!(java.pass_rate, 0.0);
    assert!(!report.timings.contains_key("java"));
    assert!(report.timings.contains_key("python"));
}

#[test]
fn timings_summarize_executed_tests_only() {
    let rust = test_report(
        "rust",
        &[
            ("alpha", "passed", 1.0),
            ("beta", "passed", 3.0),
            ("gamma", "skipped", 0.0),
        ],
    );

    let report = build_report(&[rust], &[], &[]);
    let timing = &report.timings["rust"];
    assert_eq!(timing.samples, 2);
    assert_eq!(timing.mean_ms, 2.0);
}

#[test]
fn benchmarks_are_grouped_by_language() {
    let go: BenchmarkReport = serde_json::from_value(serde_json::json!({
        "language": "go",
        "timestamp": 1722945700.0,
        "benchmarks": [{
            "name": "simple path",
            "expression": "Patient.name",
            "iterations": 1000,
            "avg_time_ms": 0.1,
            "min_time_ms": 0.05,
            "max_time_ms": 0.9,
            "ops_per_second": 10000.0
        }]
    }))
    .unwrap();

    let report = build_report(&[], &[go], &[]);
    assert_eq!(report.benchmarks["go"].len(), 1);
    assert!(report.languages.contains(&"go".to_string()));
}

#[test]
fn report_round_trips_through_disk() {
    let python = test_report("python", &[("alpha", "passed", 1.0)]);
    let report = build_report(&[python], &[], &[outcome("python", RunStatus::Completed)]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join(REPORT_FILE);
    write_report(&report, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let loaded: ComparisonReport = serde_json::from_str(&content).unwrap();
    assert_eq!(loaded.schema_version, report.schema_version);
    assert_eq!(loaded.languages, report.languages);
    assert_eq!(loaded.matrix.len(), 1);
    assert_eq!(loaded.matrix[0].statuses["python"], TestStatus::Passed);
}
