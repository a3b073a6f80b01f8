// Harness Configuration
//
// Configuration for a comparison run: where the corpus and results live,
// and how to invoke each language runner. Loaded from a JSON file so the
// dashboard tooling can read the same document.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::HarnessError;

/// Default configuration filename at the repository root
pub const DEFAULT_CONFIG_FILE: &str = "comparison.config.json";

/// The language runners shipped with the comparison project
pub const KNOWN_LANGUAGES: [&str; 7] = [
    "clojure",
    "csharp",
    "go",
    "java",
    "javascript",
    "python",
    "rust",
];

fn default_tests_dir() -> PathBuf {
    PathBuf::from("specs/fhirpath/tests")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("comparison/results")
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_iterations() -> u32 {
    1000
}

fn default_enabled() -> bool {
    true
}

/// How to invoke one language's runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub name: String,

    /// Executable to spawn
    pub command: String,

    /// Arguments, with `{mode}`, `{tests_dir}`, `{results_dir}` and
    /// `{iterations}` substituted at spawn time
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Per-language override of the global timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl LanguageConfig {
    /// Runner invocation for one of the stock `implementations/<lang>/run.sh`
    /// wrappers
    fn stock(name: &str) -> Self {
        LanguageConfig {
            name: name.to_string(),
            command: "bash".to_string(),
            args: vec![
                format!("implementations/{name}/run.sh"),
                "{mode}".to_string(),
                "{tests_dir}".to_string(),
                "{results_dir}".to_string(),
            ],
            working_dir: None,
            timeout_secs: None,
            env: BTreeMap::new(),
            enabled: true,
        }
    }
}

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default = "default_tests_dir")]
    pub tests_dir: PathBuf,

    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Global per-runner timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_iterations")]
    pub benchmark_iterations: u32,

    #[serde(default)]
    pub languages: Vec<LanguageConfig>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            tests_dir: default_tests_dir(),
            results_dir: default_results_dir(),
            timeout_secs: default_timeout_secs(),
            benchmark_iterations: default_iterations(),
            languages: KNOWN_LANGUAGES.iter().map(|name| LanguageConfig::stock(name)).collect(),
        }
    }
}

impl HarnessConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let content = fs::read_to_string(path).map_err(|e| {
            HarnessError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: HarnessConfig = serde_json::from_str(&content).map_err(|e| {
            HarnessError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise try [`DEFAULT_CONFIG_FILE`] and fall
    /// back to the built-in defaults when it does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, HarnessError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    warn!("{DEFAULT_CONFIG_FILE} not found, using built-in defaults");
                    Ok(HarnessConfig::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.timeout_secs == 0 {
            return Err(HarnessError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.benchmark_iterations == 0 {
            return Err(HarnessError::ConfigError(
                "benchmark_iterations must be greater than zero".to_string(),
            ));
        }

        let mut seen = std::collections::BTreeSet::new();
        for language in &self.languages {
            if language.name.trim().is_empty() {
                return Err(HarnessError::ConfigError(
                    "language entry with empty name".to_string(),
                ));
            }
            if language.command.trim().is_empty() {
                return Err(HarnessError::ConfigError(format!(
                    "language '{}' has an empty command",
                    language.name
                )));
            }
            if let Some(0) = language.timeout_secs {
                return Err(HarnessError::ConfigError(format!(
                    "language '{}' has a zero timeout",
                    language.name
                )));
            }
            if !seen.insert(language.name.clone()) {
                return Err(HarnessError::ConfigError(format!(
                    "duplicate language '{}'",
                    language.name
                )));
            }
        }
        Ok(())
    }

    pub fn language(&self, name: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|l| l.name == name)
    }

    pub fn enabled_languages(&self) -> impl Iterator<Item = &LanguageConfig> {
        self.languages.iter().filter(|l| l.enabled)
    }

    /// Effective timeout for one language
    pub fn timeout_for(&self, language: &LanguageConfig) -> Duration {
        Duration::from_secs(language.timeout_secs.unwrap_or(self.timeout_secs))
    }
}
