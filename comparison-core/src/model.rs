// Comparison Interchange Model
//
// This module defines the JSON shapes shared between the orchestrator, the
// per-language runners, and the dashboard: test suites, per-language result
// files, benchmark results, and the aggregated comparison report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stats::TimingStats;

/// Schema version stamped into every comparison report
pub const REPORT_SCHEMA_VERSION: &str = "1";

/// A test suite containing multiple test cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuite {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub tests: Vec<TestCase>,
}

/// A single test case within a test suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub expression: String,

    /// Inline input resource, used when no `inputfile` is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,

    /// Input fixture filename, resolved against `<tests_dir>/input/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputfile: Option<String>,

    /// Expected output values (a JSON array of scalars/structs)
    #[serde(default)]
    pub expected: Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Disabled tests are skipped by every runner
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,

    /// Marks expressions expected to fail to parse or evaluate.
    /// Older suites spell this `invalid`.
    #[serde(default, alias = "invalid", skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Outcome of a single test case in one language.
///
/// Deserialization accepts the spelling variants the runners actually emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[serde(alias = "pass", alias = "ok")]
    Passed,
    #[serde(alias = "fail")]
    Failed,
    #[serde(alias = "errored")]
    Error,
    #[serde(alias = "skip", alias = "disabled")]
    Skipped,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Error => "error",
            TestStatus::Skipped => "skipped",
        }
    }
}

/// Result of one test case as reported by a language runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub expression: String,
    pub status: TestStatus,

    #[serde(default, alias = "executionTimeMs", alias = "execution_time")]
    pub execution_time_ms: f64,

    #[serde(default)]
    pub expected: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Pass/fail counters for one language's run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub errors: u32,
    #[serde(default)]
    pub skipped: u32,
}

impl TestSummary {
    /// Recompute the counters from a result list
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = TestSummary {
            total: results.len() as u32,
            ..Default::default()
        };
        for result in results {
            match result.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::Error => summary.errors += 1,
                TestStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

/// One language's conformance results, as written to `<lang>_test_results.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    #[serde(default)]
    pub language: String,
    /// Unix timestamp (seconds) of the run
    #[serde(default)]
    pub timestamp: f64,
    pub tests: Vec<TestResult>,
    #[serde(default)]
    pub summary: TestSummary,
}

/// Result of one benchmark expression in one language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub expression: String,
    pub iterations: u32,
    #[serde(alias = "avgTimeMs")]
    pub avg_time_ms: f64,
    #[serde(alias = "minTimeMs")]
    pub min_time_ms: f64,
    #[serde(alias = "maxTimeMs")]
    pub max_time_ms: f64,
    #[serde(default, alias = "opsPerSecond")]
    pub ops_per_second: f64,
}

/// Free-form host/runtime details attached to benchmark results.
///
/// Every language reports different keys (`rust_version`, `python_version`,
/// ...), so everything beyond the platform is kept as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(flatten)]
    pub details: BTreeMap<String, Value>,
}

/// One language's benchmark results, as written to `<lang>_benchmark_results.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub timestamp: f64,
    pub benchmarks: Vec<BenchmarkResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_info: Option<SystemInfo>,
}

/// How a language runner's process finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Process exited zero and left a readable result file
    Completed,
    /// Process exited non-zero
    Failed,
    /// Process exceeded its timeout and was killed
    TimedOut,
    /// Process exited zero but the expected result file is absent or unreadable
    MissingResults,
}

/// Aggregate counters for one language inside the comparison report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSummary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub errors: u32,
    pub skipped: u32,
    /// Passed over executed (non-skipped) tests, 0.0 when nothing ran
    pub pass_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_status: Option<RunStatus>,
}

/// Status of one test across every reporting language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestMatrixRow {
    pub name: String,
    pub statuses: BTreeMap<String, TestStatus>,
    /// True when every reporting language returned the same status
    pub agreement: bool,
}

/// Roll-up counters across the whole comparison
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub languages: u32,
    pub tests: u32,
    /// Tests every reporting language passed
    pub unanimous_passes: u32,
    /// Share of matrix rows where all languages agree
    pub agreement_rate: f64,
}

/// The aggregated cross-language report consumed by the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub schema_version: String,
    /// Unix timestamp (seconds) of report generation
    pub generated_at: f64,
    pub languages: Vec<String>,
    pub summary: ComparisonSummary,
    pub language_summaries: BTreeMap<String, LanguageSummary>,
    pub matrix: Vec<TestMatrixRow>,
    /// Timing statistics over per-test execution times, per language
    pub timings: BTreeMap<String, TimingStats>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub benchmarks: BTreeMap<String, Vec<BenchmarkResult>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_accepts_runner_spellings() {
        let status: TestStatus = serde_json::from_str("\"pass\"").unwrap();
        assert_eq!(status, TestStatus::Passed);
        let status: TestStatus = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(status, TestStatus::Skipped);
        let status: TestStatus = serde_json::from_str("\"errored\"").unwrap();
        assert_eq!(status, TestStatus::Error);
    }

    #[test]
    fn test_case_accepts_legacy_invalid_flag() {
        let case: TestCase = serde_json::from_str(
            r#"{"name": "bad syntax", "expression": "name.", "invalid": true}"#,
        )
        .unwrap();
        assert!(case.error);
        assert!(!case.disabled);
    }

    #[test]
    fn test_result_accepts_camel_case_timing() {
        let result: TestResult = serde_json::from_str(
            r#"{
                "name": "path",
                "expression": "Patient.name",
                "status": "passed",
                "executionTimeMs": 1.5
            }"#,
        )
        .unwrap();
        assert_eq!(result.execution_time_ms, 1.5);
    }

    #[test]
    fn summary_recomputed_from_results() {
        let tests: Vec<TestResult> = serde_json::from_str(
            r#"[
                {"name": "a", "expression": "x", "status": "passed", "execution_time_ms": 1.0},
                {"name": "b", "expression": "y", "status": "failed", "execution_time_ms": 1.0},
                {"name": "c", "expression": "z", "status": "error", "execution_time_ms": 0.0},
                {"name": "d", "expression": "w", "status": "skipped", "execution_time_ms": 0.0}
            ]"#,
        )
        .unwrap();

        let summary = TestSummary::from_results(&tests);
        assert_eq!(
            summary,
            TestSummary {
                total: 4,
                passed: 1,
                failed: 1,
                errors: 1,
                skipped: 1,
            }
        );
    }
}
