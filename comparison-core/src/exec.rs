// Runner Execution
//
// Spawns one subprocess per language runner, enforces per-run timeouts, and
// collects the outcomes. Runners are fully isolated OS processes: there is
// no shared state, no retry, and no ordering guarantee beyond collecting
// every outcome before returning.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use log::{info, warn};
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::{HarnessConfig, LanguageConfig};
use crate::errors::HarnessError;
use crate::model::RunStatus;

/// Keep only the last part of a runner's stderr for diagnostics
const STDERR_TAIL_CHARS: usize = 2048;

/// What a runner is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Test,
    Benchmark,
}

impl RunMode {
    /// Value substituted for the `{mode}` placeholder
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Test => "test",
            RunMode::Benchmark => "benchmark",
        }
    }

    fn results_file_suffix(&self) -> &'static str {
        match self {
            RunMode::Test => "test_results.json",
            RunMode::Benchmark => "benchmark_results.json",
        }
    }
}

/// Conventional result file location for one language and mode
pub fn results_path(results_dir: &Path, language: &str, mode: RunMode) -> PathBuf {
    results_dir.join(format!("{}_{}", language, mode.results_file_suffix()))
}

/// Outcome of one language runner's process
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub language: String,
    pub status: RunStatus,
    pub exit_code: Option<i32>,
    pub duration: Duration,
    /// Trailing stderr, kept for the failure summary
    pub stderr_tail: Option<String>,
    pub results_path: PathBuf,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Fans runner processes out across languages and collects their outcomes
pub struct Executor {
    config: HarnessConfig,
    /// Corpus directory the runners should read; differs from the config
    /// value when a filtered selection was staged
    tests_dir: PathBuf,
    iterations: u32,
}

impl Executor {
    pub fn new(config: &HarnessConfig) -> Self {
        Executor {
            tests_dir: config.tests_dir.clone(),
            iterations: config.benchmark_iterations,
            config: config.clone(),
        }
    }

    /// Point the runners at a staged corpus instead of the configured one
    pub fn with_tests_dir(mut self, tests_dir: PathBuf) -> Self {
        self.tests_dir = tests_dir;
        self
    }

    /// Override the benchmark iteration count
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Run every enabled (and selected) language runner concurrently.
    ///
    /// `selection` narrows the run to the named languages; an unknown name
    /// is an error. Outcomes are sorted by language name.
    pub async fn run_all(
        &self,
        mode: RunMode,
        selection: &[String],
    ) -> Result<Vec<RunOutcome>, HarnessError> {
        for name in selection {
            if self.config.language(name).is_none() {
                return Err(HarnessError::RunnerError(format!(
                    "unknown language '{name}' in selection"
                )));
            }
        }

        let targets: Vec<LanguageConfig> = self
            .config
            .enabled_languages()
            .filter(|l| selection.is_empty() || selection.contains(&l.name))
            .cloned()
            .collect();

        if targets.is_empty() {
            return Err(HarnessError::RunnerError(
                "no enabled language runners selected".to_string(),
            ));
        }

        fs::create_dir_all(&self.config.results_dir)?;
        // Runners may run with their own working directory, so hand them
        // absolute paths.
        let results_dir = fs::canonicalize(&self.config.results_dir)?;
        let tests_dir = fs::canonicalize(&self.tests_dir)?;

        info!(
            "Running {} runner(s) in {} mode",
            targets.len(),
            mode.as_str()
        );

        let mut handles = Vec::with_capacity(targets.len());
        for language in targets {
            let timeout_dur = self.config.timeout_for(&language);
            let ctx = SubstitutionContext {
                mode,
                tests_dir: tests_dir.clone(),
                results_dir: results_dir.clone(),
                iterations: self.iterations,
            };
            let name = language.name.clone();
            let handle = tokio::spawn(run_language(language, ctx, timeout_dur));
            handles.push((name, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                // A panicked task must not abort the whole comparison.
                Err(e) => {
                    warn!("runner task for '{name}' panicked: {e}");
                    outcomes.push(RunOutcome {
                        language: name.clone(),
                        status: RunStatus::Failed,
                        exit_code: None,
                        duration: Duration::ZERO,
                        stderr_tail: Some(format!("runner task panicked: {e}")),
                        results_path: results_path(&results_dir, &name, mode),
                    });
                }
            }
        }

        outcomes.sort_by(|a, b| a.language.cmp(&b.language));
        Ok(outcomes)
    }
}

#[derive(Debug, Clone)]
struct SubstitutionContext {
    mode: RunMode,
    tests_dir: PathBuf,
    results_dir: PathBuf,
    iterations: u32,
}

impl SubstitutionContext {
    fn substitute(&self, arg: &str) -> String {
        arg.replace("{mode}", self.mode.as_str())
            .replace("{tests_dir}", &self.tests_dir.to_string_lossy())
            .replace("{results_dir}", &self.results_dir.to_string_lossy())
            .replace("{iterations}", &self.iterations.to_string())
    }
}

async fn run_language(
    language: LanguageConfig,
    ctx: SubstitutionContext,
    timeout_dur: Duration,
) -> RunOutcome {
    let expected_results = results_path(&ctx.results_dir, &language.name, ctx.mode);
    let args: Vec<String> = language.args.iter().map(|a| ctx.substitute(a)).collect();

    info!(
        "[{}] spawning: {} {}",
        language.name,
        language.command,
        args.join(" ")
    );

    let mut command = Command::new(&language.command);
    command
        .args(&args)
        .envs(&language.env)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .kill_on_drop(true);
    if let Some(dir) = &language.working_dir {
        command.current_dir(dir);
    }

    let start = Instant::now();
    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("[{}] failed to spawn runner: {e}", language.name);
            return RunOutcome {
                language: language.name,
                status: RunStatus::Failed,
                exit_code: None,
                duration: start.elapsed(),
                stderr_tail: Some(format!("failed to spawn '{}': {e}", language.command)),
                results_path: expected_results,
            };
        }
    };

    let output = match timeout(timeout_dur, child.wait_with_output()).await {
        Err(_) => {
            warn!(
                "[{}] timed out after {}s, killing",
                language.name,
                timeout_dur.as_secs()
            );
            return RunOutcome {
                language: language.name,
                status: RunStatus::TimedOut,
                exit_code: None,
                duration: start.elapsed(),
                stderr_tail: None,
                results_path: expected_results,
            };
        }
        Ok(Err(e)) => {
            return RunOutcome {
                language: language.name,
                status: RunStatus::Failed,
                exit_code: None,
                duration: start.elapsed(),
                stderr_tail: Some(format!("failed to collect runner output: {e}")),
                results_path: expected_results,
            };
        }
        Ok(Ok(output)) => output,
    };

    let duration = start.elapsed();
    let stderr_tail = tail_of(&output.stderr);

    if !output.status.success() {
        warn!(
            "[{}] runner exited with {:?}",
            language.name,
            output.status.code()
        );
        return RunOutcome {
            language: language.name,
            status: RunStatus::Failed,
            exit_code: output.status.code(),
            duration,
            stderr_tail,
            results_path: expected_results,
        };
    }

    if !expected_results.is_file() {
        warn!(
            "[{}] runner exited cleanly but left no result file at {}",
            language.name,
            expected_results.display()
        );
        return RunOutcome {
            language: language.name,
            status: RunStatus::MissingResults,
            exit_code: output.status.code(),
            duration,
            stderr_tail,
            results_path: expected_results,
        };
    }

    info!(
        "[{}] completed in {:.1}s",
        language.name,
        duration.as_secs_f64()
    );
    RunOutcome {
        language: language.name,
        status: RunStatus::Completed,
        exit_code: output.status.code(),
        duration,
        stderr_tail,
        results_path: expected_results,
    }
}

fn tail_of(stderr: &[u8]) -> Option<String> {
    if stderr.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(stderr);
    let tail: String = text
        .chars()
        .rev()
        .take(STDERR_TAIL_CHARS)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    Some(tail)
}
