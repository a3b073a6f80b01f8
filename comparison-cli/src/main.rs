// FHIRPath Comparison CLI
//
// Command-line interface for orchestrating cross-language FHIRPath
// conformance and benchmark runs and aggregating their results.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use comparison_core::aggregate_results;
use comparison_core::config::HarnessConfig;
use comparison_core::discovery::{discover_suites, stage_suites, SuiteFilter};
use comparison_core::exec::{Executor, RunMode, RunOutcome};
use comparison_core::model::{ComparisonReport, RunStatus};
use comparison_core::report::{write_report, REPORT_FILE};
use comparison_core::validate::{has_errors, validate_corpus, Severity};

#[derive(Parser)]
#[command(name = "fhirpath-comparison")]
#[command(about = "Cross-language FHIRPath conformance and benchmark harness", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the harness configuration (defaults to comparison.config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the conformance tests across the language runners
    Run {
        /// Only run the named languages (repeatable)
        #[arg(short, long)]
        language: Vec<String>,

        /// Only run tests whose name contains one of these substrings (repeatable)
        #[arg(short, long)]
        filter: Vec<String>,

        /// Only run tests carrying all of these tags (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Also run tests marked as disabled
        #[arg(long)]
        include_disabled: bool,

        /// Override the per-runner timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip writing the aggregated comparison report
        #[arg(long)]
        no_report: bool,
    },

    /// Run the benchmarks across the language runners
    Benchmark {
        /// Only run the named languages (repeatable)
        #[arg(short, long)]
        language: Vec<String>,

        /// Override the benchmark iteration count
        #[arg(short, long)]
        iterations: Option<u32>,

        /// Override the per-runner timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip writing the aggregated comparison report
        #[arg(long)]
        no_report: bool,
    },

    /// Aggregate existing result files into a comparison report
    Compare {
        /// Where to write the report (defaults to <results_dir>/comparison_report.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate the test corpus without running anything
    Validate {
        /// Corpus directory (defaults to the configured tests_dir)
        #[arg(long)]
        tests_dir: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            ref language,
            ref filter,
            ref tag,
            include_disabled,
            timeout,
            no_report,
        } => {
            let config = load_config(&cli, timeout)?;
            let suite_filter = SuiteFilter {
                name_filters: filter.clone(),
                tags: tag.clone(),
                include_disabled,
            };
            handle_run(config, RunMode::Test, language, &suite_filter, None, no_report).await
        }
        Commands::Benchmark {
            ref language,
            iterations,
            timeout,
            no_report,
        } => {
            let config = load_config(&cli, timeout)?;
            handle_run(
                config,
                RunMode::Benchmark,
                language,
                &SuiteFilter::default(),
                iterations,
                no_report,
            )
            .await
        }
        Commands::Compare { ref output, json } => {
            let config = load_config(&cli, None)?;
            let report = aggregate_results(&config, &[]);
            let path = output
                .clone()
                .unwrap_or_else(|| config.results_dir.join(REPORT_FILE));
            write_report(&report, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} {}", "Report:".green().bold(), path.display());
                print_summary(&report);
            }
            Ok(())
        }
        Commands::Validate { ref tests_dir } => {
            let config = load_config(&cli, None)?;
            let dir = tests_dir.clone().unwrap_or(config.tests_dir);
            handle_validate(&dir)
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "fhirpath-comparison", &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli, timeout: Option<u64>) -> Result<HarnessConfig> {
    let mut config = HarnessConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load harness configuration")?;
    if let Some(timeout) = timeout {
        config.timeout_secs = timeout;
        config.validate().context("Invalid timeout override")?;
    }
    Ok(config)
}

async fn handle_run(
    config: HarnessConfig,
    mode: RunMode,
    languages: &[String],
    filter: &SuiteFilter,
    iterations: Option<u32>,
    no_report: bool,
) -> Result<()> {
    let suites = discover_suites(&config.tests_dir)
        .with_context(|| format!("Failed to discover suites in {}", config.tests_dir.display()))?;
    let selected: usize = suites
        .iter()
        .map(|s| filter.apply(&s.suite).0.tests.len())
        .sum();

    println!("{} {}", "Suites:".green().bold(), suites.len());
    println!("{} {}", "Tests:".green().bold(), selected);

    let mut executor = Executor::new(&config);
    if let Some(iterations) = iterations {
        executor = executor.with_iterations(iterations);
    }
    if !filter.is_empty() {
        if selected == 0 {
            bail!("the filter matched no tests");
        }
        let staging = config.results_dir.join("staged_tests");
        stage_suites(&suites, filter, &staging, &config.tests_dir)
            .context("Failed to stage the filtered corpus")?;
        println!("{} {}", "Staged:".green().bold(), staging.display());
        executor = executor.with_tests_dir(staging);
    }

    let outcomes = executor.run_all(mode, languages).await?;
    log::debug!("collected {} runner outcome(s)", outcomes.len());
    for outcome in &outcomes {
        print_outcome(outcome);
    }

    if !no_report {
        let report = aggregate_results(&config, &outcomes);
        let path = config.results_dir.join(REPORT_FILE);
        write_report(&report, &path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("{} {}", "Report:".green().bold(), path.display());
        print_summary(&report);
    }

    let failures = outcomes.iter().filter(|o| !o.succeeded()).count();
    if failures > 0 {
        bail!("{failures} runner(s) did not complete");
    }
    Ok(())
}

fn handle_validate(tests_dir: &std::path::Path) -> Result<()> {
    println!("{} {}", "Validating:".green().bold(), tests_dir.display());
    let issues = validate_corpus(tests_dir)
        .with_context(|| format!("Failed to validate {}", tests_dir.display()))?;

    if issues.is_empty() {
        println!("{} {}", "Result:".green().bold(), "corpus is clean");
        return Ok(());
    }

    for issue in &issues {
        let line = issue.to_string();
        match issue.severity {
            Severity::Error => println!("{}", line.red()),
            Severity::Warning => println!("{}", line.yellow()),
        }
    }
    println!(
        "{} {} issue(s) found",
        "Result:".red().bold(),
        issues.len()
    );

    if has_errors(&issues) {
        bail!("corpus validation failed");
    }
    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    let seconds = outcome.duration.as_secs_f64();
    match outcome.status {
        RunStatus::Completed => {
            println!("✅ {} ({seconds:.1}s)", outcome.language);
        }
        RunStatus::Failed => {
            println!(
                "❌ {} ({seconds:.1}s, exit {})",
                outcome.language,
                outcome
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "?".to_string())
            );
            if let Some(stderr) = &outcome.stderr_tail {
                println!("   {}", stderr.trim_end().red());
            }
        }
        RunStatus::TimedOut => {
            println!("⚠️  {} timed out after {seconds:.1}s", outcome.language);
        }
        RunStatus::MissingResults => {
            println!(
                "⚠️  {} exited cleanly but wrote no results to {}",
                outcome.language,
                outcome.results_path.display()
            );
        }
    }
}

fn print_summary(report: &ComparisonReport) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Language", "Total", "Passed", "Failed", "Errors", "Skipped", "Pass rate", "Mean ms",
    ]);

    for (language, summary) in &report.language_summaries {
        let mean = report
            .timings
            .get(language)
            .map(|t| format!("{:.3}", t.mean_ms))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            language.clone(),
            summary.total.to_string(),
            summary.passed.to_string(),
            summary.failed.to_string(),
            summary.errors.to_string(),
            summary.skipped.to_string(),
            format!("{:.1}%", summary.pass_rate * 100.0),
            mean,
        ]);
    }
    println!("{table}");

    println!(
        "{} {} test(s) across {} language(s), {} unanimous pass(es), {:.1}% agreement",
        "Summary:".green().bold(),
        report.summary.tests,
        report.summary.languages,
        report.summary.unanimous_passes,
        report.summary.agreement_rate * 100.0
    );
}
