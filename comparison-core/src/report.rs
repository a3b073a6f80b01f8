// Comparison Report Assembly
//
// Merges the normalized per-language results into the single
// comparison_report.json consumed by the dashboard: per-language summaries,
// a per-test status matrix, timing statistics, and benchmark tables.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::Utc;
use log::info;

use crate::errors::HarnessError;
use crate::exec::RunOutcome;
use crate::model::{
    BenchmarkReport, ComparisonReport, ComparisonSummary, LanguageSummary, TestMatrixRow,
    TestReport, TestStatus, REPORT_SCHEMA_VERSION,
};
use crate::stats;

/// Conventional filename of the aggregated report
pub const REPORT_FILE: &str = "comparison_report.json";

/// Build the aggregated cross-language report.
///
/// Languages that ran but produced no readable results still appear, carrying
/// their run status and zeroed counts, so the dashboard shows the failure
/// instead of silently dropping the column.
pub fn build_report(
    test_reports: &[TestReport],
    benchmark_reports: &[BenchmarkReport],
    outcomes: &[RunOutcome],
) -> ComparisonReport {
    let mut languages: BTreeSet<String> = BTreeSet::new();
    for report in test_reports {
        languages.insert(report.language.clone());
    }
    for report in benchmark_reports {
        languages.insert(report.language.clone());
    }
    for outcome in outcomes {
        languages.insert(outcome.language.clone());
    }

    let mut language_summaries = BTreeMap::new();
    let mut timings = BTreeMap::new();
    for language in &languages {
        let run_status = outcomes
            .iter()
            .find(|o| &o.language == language)
            .map(|o| o.status);
        let report = test_reports.iter().find(|r| &r.language == language);

        let summary = match report {
            Some(report) => {
                let executed = report.summary.total - report.summary.skipped;
                LanguageSummary {
                    total: report.summary.total,
                    passed: report.summary.passed,
                    failed: report.summary.failed,
                    errors: report.summary.errors,
                    skipped: report.summary.skipped,
                    pass_rate: if executed > 0 {
                        f64::from(report.summary.passed) / f64::from(executed)
                    } else {
                        0.0
                    },
                    run_status,
                }
            }
            None => LanguageSummary {
                total: 0,
                passed: 0,
                failed: 0,
                errors: 0,
                skipped: 0,
                pass_rate: 0.0,
                run_status,
            },
        };
        language_summaries.insert(language.clone(), summary);

        if let Some(report) = report {
            let samples: Vec<f64> = report
                .tests
                .iter()
                .filter(|t| t.status != TestStatus::Skipped)
                .map(|t| t.execution_time_ms)
                .collect();
            if let Some(summary) = stats::summarize(&samples) {
                timings.insert(language.clone(), summary);
            }
        }
    }

    // Union of test names across every reporting language.
    let mut rows: BTreeMap<String, BTreeMap<String, TestStatus>> = BTreeMap::new();
    for report in test_reports {
        for test in &report.tests {
            rows.entry(test.name.clone())
                .or_default()
                .insert(report.language.clone(), test.status);
        }
    }

    let reporting: usize = test_reports.len();
    let mut unanimous_passes = 0;
    let mut agreeing_rows = 0;
    let matrix: Vec<TestMatrixRow> = rows
        .into_iter()
        .map(|(name, statuses)| {
            let mut values = statuses.values();
            let first = values.next().copied();
            let agreement = match first {
                Some(first) => values.all(|&s| s == first),
                None => false,
            };
            if agreement {
                agreeing_rows += 1;
            }
            if statuses.len() == reporting && statuses.values().all(|&s| s == TestStatus::Passed) {
                unanimous_passes += 1;
            }
            TestMatrixRow {
                name,
                statuses,
                agreement,
            }
        })
        .collect();

    let benchmarks: BTreeMap<String, _> = benchmark_reports
        .iter()
        .map(|r| (r.language.clone(), r.benchmarks.clone()))
        .collect();

    let summary = ComparisonSummary {
        languages: languages.len() as u32,
        tests: matrix.len() as u32,
        unanimous_passes,
        agreement_rate: if matrix.is_empty() {
            0.0
        } else {
            agreeing_rows as f64 / matrix.len() as f64
        },
    };

    ComparisonReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        generated_at: Utc::now().timestamp_millis() as f64 / 1000.0,
        languages: languages.into_iter().collect(),
        summary,
        language_summaries,
        matrix,
        timings,
        benchmarks,
    }
}

/// Write the report as pretty JSON, creating parent directories
pub fn write_report(report: &ComparisonReport, path: &Path) -> Result<(), HarnessError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    info!("Wrote comparison report to {}", path.display());
    Ok(())
}
