// Corpus Validation
//
// Best-effort checks over the shared test corpus. Problems are accumulated
// as issues rather than failing fast: the corpus is shared by seven
// independent runners and a maintainer wants the full list in one pass.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use glob::glob;
use log::info;

use crate::discovery::load_suite;
use crate::errors::HarnessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One problem found in the corpus
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub suite: String,
    pub test: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    fn error(suite: &str, test: Option<&str>, message: String) -> Self {
        ValidationIssue {
            severity: Severity::Error,
            suite: suite.to_string(),
            test: test.map(|t| t.to_string()),
            message,
        }
    }

    fn warning(suite: &str, test: Option<&str>, message: String) -> Self {
        ValidationIssue {
            severity: Severity::Warning,
            suite: suite.to_string(),
            test: test.map(|t| t.to_string()),
            message,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.test {
            Some(test) => write!(f, "[{}] {} / {}: {}", self.severity, self.suite, test, self.message),
            None => write!(f, "[{}] {}: {}", self.severity, self.suite, self.message),
        }
    }
}

/// Validate every suite file under `tests_dir`.
///
/// Unlike discovery, an unparseable suite is reported as an issue instead of
/// aborting, so one broken file does not hide problems in the others.
pub fn validate_corpus(tests_dir: &Path) -> Result<Vec<ValidationIssue>, HarnessError> {
    if !tests_dir.is_dir() {
        return Err(HarnessError::SuiteError(format!(
            "tests directory {} does not exist",
            tests_dir.display()
        )));
    }

    let pattern = tests_dir.join("*.json");
    let pattern = pattern.to_str().ok_or_else(|| {
        HarnessError::SuiteError(format!("non-UTF-8 tests directory {}", tests_dir.display()))
    })?;
    let mut paths: Vec<_> = glob(pattern)
        .map_err(|e| HarnessError::SuiteError(format!("bad glob pattern: {e}")))?
        .filter_map(Result::ok)
        .collect();
    paths.sort();

    let input_dir = tests_dir.join("input");
    let mut issues = Vec::new();
    // Test name -> first suite that used it, for cross-suite duplicates.
    let mut names_seen: BTreeMap<String, String> = BTreeMap::new();

    for path in &paths {
        let file_label = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let suite = match load_suite(path) {
            Ok(suite) => suite,
            Err(e) => {
                issues.push(ValidationIssue::error(&file_label, None, e.to_string()));
                continue;
            }
        };

        if suite.tests.is_empty() {
            issues.push(ValidationIssue::warning(
                &suite.name,
                None,
                "suite contains no tests".to_string(),
            ));
        }

        let mut local_names = BTreeMap::new();
        for test in &suite.tests {
            if let Some(count) = local_names.get_mut(&test.name) {
                *count += 1;
            } else {
                local_names.insert(test.name.clone(), 1usize);
            }

            if test.expression.trim().is_empty() {
                issues.push(ValidationIssue::error(
                    &suite.name,
                    Some(&test.name),
                    "empty expression".to_string(),
                ));
            }

            if test.input.is_some() && test.inputfile.is_some() {
                issues.push(ValidationIssue::warning(
                    &suite.name,
                    Some(&test.name),
                    "both inline input and inputfile are set; inputfile wins".to_string(),
                ));
            }

            if let Some(inputfile) = &test.inputfile {
                if !input_dir.join(inputfile).is_file() {
                    issues.push(ValidationIssue::error(
                        &suite.name,
                        Some(&test.name),
                        format!("inputfile '{inputfile}' not found under {}", input_dir.display()),
                    ));
                }
            }

            if test.error && !expected_is_empty(&test.expected) {
                issues.push(ValidationIssue::warning(
                    &suite.name,
                    Some(&test.name),
                    "error-flagged test also declares expected output".to_string(),
                ));
            }

            match names_seen.get(&test.name) {
                Some(other) if other != &suite.name => {
                    issues.push(ValidationIssue::warning(
                        &suite.name,
                        Some(&test.name),
                        format!("test name also used in suite '{other}'"),
                    ));
                }
                Some(_) => {}
                None => {
                    names_seen.insert(test.name.clone(), suite.name.clone());
                }
            }
        }

        for (name, count) in local_names {
            if count > 1 {
                issues.push(ValidationIssue::error(
                    &suite.name,
                    Some(&name),
                    format!("test name appears {count} times in this suite"),
                ));
            }
        }
    }

    info!(
        "Validated {} suite files: {} issue(s)",
        paths.len(),
        issues.len()
    );
    Ok(issues)
}

/// True when any Error-severity issue is present
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

fn expected_is_empty(expected: &serde_json::Value) -> bool {
    match expected {
        serde_json::Value::Null => true,
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
