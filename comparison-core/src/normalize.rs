// Result Normalization
//
// Reads the per-language result files and normalizes them into the unified
// model. The runners were written independently in seven languages, so
// ingestion is deliberately lenient: field-name aliases, status spelling
// variants, recomputed summaries, and derived fields.

use std::fs;
use std::path::Path;

use log::warn;

use crate::errors::HarnessError;
use crate::exec::{results_path, RunMode};
use crate::model::{BenchmarkReport, TestReport, TestSummary};

/// Read and normalize one language's test result file
pub fn read_test_report(path: &Path) -> Result<TestReport, HarnessError> {
    let content = fs::read_to_string(path).map_err(|e| {
        HarnessError::ReportError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let mut report: TestReport = serde_json::from_str(&content).map_err(|e| {
        HarnessError::ReportError(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    if report.language.is_empty() {
        if let Some(language) = language_from_filename(path) {
            report.language = language;
        }
    }

    // Never trust a runner's own accounting.
    let recomputed = TestSummary::from_results(&report.tests);
    if report.summary != TestSummary::default() && report.summary != recomputed {
        warn!(
            "[{}] runner summary {:?} disagrees with its own test list, recomputing",
            report.language, report.summary
        );
    }
    report.summary = recomputed;

    Ok(report)
}

/// Read and normalize one language's benchmark result file
pub fn read_benchmark_report(path: &Path) -> Result<BenchmarkReport, HarnessError> {
    let content = fs::read_to_string(path).map_err(|e| {
        HarnessError::ReportError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let mut report: BenchmarkReport = serde_json::from_str(&content).map_err(|e| {
        HarnessError::ReportError(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    if report.language.is_empty() {
        if let Some(language) = language_from_filename(path) {
            report.language = language;
        }
    }

    for benchmark in &mut report.benchmarks {
        if benchmark.ops_per_second == 0.0 && benchmark.avg_time_ms > 0.0 {
            benchmark.ops_per_second = 1000.0 / benchmark.avg_time_ms;
        }
    }

    Ok(report)
}

/// Load every present test result file for the given languages.
///
/// A language whose file is absent or unreadable is skipped with a warning;
/// the report module still surfaces it through the run outcomes.
pub fn collect_test_reports(results_dir: &Path, languages: &[String]) -> Vec<TestReport> {
    let mut reports = Vec::new();
    for language in languages {
        let path = results_path(results_dir, language, RunMode::Test);
        if !path.is_file() {
            warn!("[{language}] no test results at {}", path.display());
            continue;
        }
        match read_test_report(&path) {
            Ok(report) => reports.push(report),
            Err(e) => warn!("[{language}] skipping unreadable test results: {e}"),
        }
    }
    reports
}

/// Load every present benchmark result file for the given languages
pub fn collect_benchmark_reports(results_dir: &Path, languages: &[String]) -> Vec<BenchmarkReport> {
    let mut reports = Vec::new();
    for language in languages {
        let path = results_path(results_dir, language, RunMode::Benchmark);
        if !path.is_file() {
            warn!("[{language}] no benchmark results at {}", path.display());
            continue;
        }
        match read_benchmark_report(&path) {
            Ok(report) => reports.push(report),
            Err(e) => warn!("[{language}] skipping unreadable benchmark results: {e}"),
        }
    }
    reports
}

/// Recover the language from the `<lang>_test_results.json` convention
fn language_from_filename(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    stem.strip_suffix("_test_results")
        .or_else(|| stem.strip_suffix("_benchmark_results"))
        .map(|lang| lang.to_string())
}
