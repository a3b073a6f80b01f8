// Runner Execution Tests
//
// Drives the executor against shell one-liners standing in for language
// runners: a clean run writing its result file, a crashing runner, a
// hanging runner that must be timed out, and a runner that "forgets" to
// write results.

use std::collections::BTreeMap;
use std::path::PathBuf;

use comparison_core::config::{HarnessConfig, LanguageConfig};
use comparison_core::errors::HarnessError;
use comparison_core::exec::{Executor, RunMode};
use comparison_core::model::RunStatus;
use pretty_assertions::assert_eq;

const FAKE_RESULTS: &str = r#"{"language": "fake", "timestamp": 0, "tests": [
    {"name": "alpha", "expression": "Patient.name", "status": "passed", "execution_time_ms": 0.5}
]}"#;

fn shell_language(name: &str, script: String) -> LanguageConfig {
    LanguageConfig {
        name: name.to_string(),
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script],
        working_dir: None,
        timeout_secs: None,
        env: BTreeMap::new(),
        enabled: true,
    }
}

fn config_with(results_dir: PathBuf, languages: Vec<LanguageConfig>) -> HarnessConfig {
    HarnessConfig {
        tests_dir: PathBuf::from("tests/fixtures/corpus"),
        results_dir,
        timeout_secs: 30,
        benchmark_iterations: 100,
        languages,
    }
}

#[tokio::test]
async fn clean_run_is_completed() {
    let dir = tempfile::tempdir().unwrap();
    let script = format!("printf '%s' '{FAKE_RESULTS}' > {{results_dir}}/fake_test_results.json");
    let config = config_with(dir.path().to_path_buf(), vec![shell_language("fake", script)]);

    let outcomes = Executor::new(&config)
        .run_all(RunMode::Test, &[])
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.language, "fake");
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.succeeded());
    assert!(outcome.results_path.is_file());
}

#[tokio::test]
async fn non_zero_exit_is_failed() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with(
        dir.path().to_path_buf(),
        vec![shell_language("crashy", "echo boom >&2; exit 3".to_string())],
    );

    let outcomes = Executor::new(&config)
        .run_all(RunMode::Test, &[])
        .await
        .unwrap();

    let outcome = &outcomes[0];
    assert_eq!(outcome.status, RunStatus::Failed);
    assert_eq!(outcome.exit_code, Some(3));
    assert!(outcome.stderr_tail.as_deref().unwrap().contains("boom"));
}

#[tokio::test]
async fn hanging_runner_is_timed_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut language = shell_language("sleepy", "sleep 30".to_string());
    language.timeout_secs = Some(1);
    let config = config_with(dir.path().to_path_buf(), vec![language]);

    let outcomes = Executor::new(&config)
        .run_all(RunMode::Test, &[])
        .await
        .unwrap();

    let outcome = &outcomes[0];
    assert_eq!(outcome.status, RunStatus::TimedOut);
    assert!(outcome.duration.as_secs_f64() >= 1.0);
    assert!(outcome.duration.as_secs_f64() < 10.0);
}

#[tokio::test]
async fn clean_exit_without_results_is_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with(
        dir.path().to_path_buf(),
        vec![shell_language("forgetful", "true".to_string())],
    );

    let outcomes = Executor::new(&config)
        .run_all(RunMode::Test, &[])
        .await
        .unwrap();

    assert_eq!(outcomes[0].status, RunStatus::MissingResults);
}

#[tokio::test]
async fn benchmark_mode_expects_benchmark_results() {
    let dir = tempfile::tempdir().unwrap();
    let script = format!(
        "printf '%s' '{}' > {{results_dir}}/fake_benchmark_results.json",
        r#"{"language": "fake", "timestamp": 0, "benchmarks": []}"#
    );
    let config = config_with(dir.path().to_path_buf(), vec![shell_language("fake", script)]);

    let outcomes = Executor::new(&config)
        .with_iterations(10)
        .run_all(RunMode::Benchmark, &[])
        .await
        .unwrap();

    assert_eq!(outcomes[0].status, RunStatus::Completed);
    assert!(outcomes[0]
        .results_path
        .to_string_lossy()
        .ends_with("fake_benchmark_results.json"));
}

#[tokio::test]
async fn placeholders_are_substituted() {
    let dir = tempfile::tempdir().unwrap();
    let script =
        "printf '%s %s' {mode} {iterations} > {results_dir}/echoed.txt; \
         printf '%s' '{\"tests\": []}' > {results_dir}/fake_test_results.json"
            .to_string();
    let config = config_with(dir.path().to_path_buf(), vec![shell_language("fake", script)]);

    Executor::new(&config)
        .with_iterations(25)
        .run_all(RunMode::Test, &[])
        .await
        .unwrap();

    let echoed = std::fs::read_to_string(dir.path().join("echoed.txt")).unwrap();
    assert_eq!(echoed, "test 25");
}

#[tokio::test]
async fn selection_narrows_the_run_and_rejects_unknown_names() {
    let dir = tempfile::tempdir().unwrap();
    let script_a =
        format!("printf '%s' '{FAKE_RESULTS}' > {{results_dir}}/alpha_test_results.json");
    let config = config_with(
        dir.path().to_path_buf(),
        vec![
            shell_language("alpha", script_a),
            shell_language("beta", "exit 1".to_string()),
        ],
    );

    let outcomes = Executor::new(&config)
        .run_all(RunMode::Test, &["alpha".to_string()])
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].language, "alpha");

    let err = Executor::new(&config)
        .run_all(RunMode::Test, &["cobol".to_string()])
        .await;
    assert!(matches!(err, Err(HarnessError::RunnerError(_))));
}

#[tokio::test]
async fn disabled_languages_are_not_spawned() {
    let dir = tempfile::tempdir().unwrap();
    let mut disabled = shell_language("off", "exit 1".to_string());
    disabled.enabled = false;
    let script = format!("printf '%s' '{FAKE_RESULTS}' > {{results_dir}}/on_test_results.json");
    let config = config_with(
        dir.path().to_path_buf(),
        vec![disabled, shell_language("on", script)],
    );

    let outcomes = Executor::new(&config)
        .run_all(RunMode::Test, &[])
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].language, "on");
}

#[tokio::test]
async fn no_enabled_runners_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with(dir.path().to_path_buf(), vec![]);
    let err = Executor::new(&config).run_all(RunMode::Test, &[]).await;
    assert!(matches!(err, Err(HarnessError::RunnerError(_))));
}
