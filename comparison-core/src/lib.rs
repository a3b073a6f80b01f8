// FHIRPath Comparison Core
//
// This crate provides the orchestration core of the cross-language FHIRPath
// comparison harness: the shared interchange model, corpus discovery,
// runner subprocess execution, result normalization, statistics, and the
// aggregated comparison report.
//
// The FHIRPath evaluators themselves live in external per-language
// libraries; this crate only invokes their runner wrappers and compares
// what they report.

pub mod config;
pub mod discovery;
pub mod errors;
pub mod exec;
pub mod model;
pub mod normalize;
pub mod report;
pub mod stats;
pub mod validate;

pub use config::HarnessConfig;
pub use errors::HarnessError;
pub use exec::{Executor, RunMode, RunOutcome};
pub use model::{ComparisonReport, TestReport, TestStatus};

/// Aggregate whatever result files exist for the configured languages into
/// a comparison report.
///
/// `outcomes` may be empty (the `compare` path, which aggregates without
/// executing); languages are then taken from the configuration.
pub fn aggregate_results(
    config: &HarnessConfig,
    outcomes: &[RunOutcome],
) -> ComparisonReport {
    let languages: Vec<String> = if outcomes.is_empty() {
        config.languages.iter().map(|l| l.name.clone()).collect()
    } else {
        outcomes.iter().map(|o| o.language.clone()).collect()
    };

    let test_reports = normalize::collect_test_reports(&config.results_dir, &languages);
    let benchmark_reports = normalize::collect_benchmark_reports(&config.results_dir, &languages);
    report::build_report(&test_reports, &benchmark_reports, outcomes)
}
