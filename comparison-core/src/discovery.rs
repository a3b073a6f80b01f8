// Corpus Discovery
//
// Finds and loads the shared JSON test suites, applies name/tag filters,
// and stages filtered selections for external runners. Suite files live
// directly under the tests directory; input fixtures live in its `input/`
// subdirectory and are not suites.

use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use log::{debug, info};

use crate::errors::HarnessError;
use crate::model::{TestCase, TestSuite};

/// A suite together with the file it came from
#[derive(Debug, Clone)]
pub struct DiscoveredSuite {
    pub path: PathBuf,
    pub suite: TestSuite,
}

/// Load a single suite file
pub fn load_suite(path: &Path) -> Result<TestSuite, HarnessError> {
    let content = fs::read_to_string(path).map_err(|e| {
        HarnessError::SuiteError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        HarnessError::SuiteError(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Discover every suite file under `tests_dir`, sorted by path.
///
/// A file that fails to parse is a hard error: the corpus is shared across
/// every runner, so a broken suite must not be silently dropped.
pub fn discover_suites(tests_dir: &Path) -> Result<Vec<DiscoveredSuite>, HarnessError> {
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

    let mut paths: Vec<PathBuf> = glob(pattern)
        .map_err(|e| HarnessError::SuiteError(format!("bad glob pattern: {e}")))?
        .filter_map(Result::ok)
        .collect();
    paths.sort();

    let mut suites = Vec::with_capacity(paths.len());
    for path in paths {
        let suite = load_suite(&path)?;
        debug!("Loaded suite '{}' ({} tests) from {}", suite.name, suite.tests.len(), path.display());
        suites.push(DiscoveredSuite { path, suite });
    }

    info!("Discovered {} suites under {}", suites.len(), tests_dir.display());
    Ok(suites)
}

/// Selection applied to a discovered corpus before a run
#[derive(Debug, Clone, Default)]
pub struct SuiteFilter {
    /// Case-insensitive substrings matched against test names; empty matches all
    pub name_filters: Vec<String>,
    /// Tags a test must carry (all of them); empty matches all
    pub tags: Vec<String>,
    /// Keep tests marked `disabled` instead of dropping them
    pub include_disabled: bool,
}

impl SuiteFilter {
    pub fn is_empty(&self) -> bool {
        self.name_filters.is_empty() && self.tags.is_empty() && !self.include_disabled
    }

    fn matches(&self, test: &TestCase) -> bool {
        if !self.name_filters.is_empty() {
            let name = test.name.to_lowercase();
            if !self.name_filters.iter().any(|f| name.contains(&f.to_lowercase())) {
                return false;
            }
        }
        self.tags.iter().all(|tag| test.tags.contains(tag))
    }

    /// Filtered copy of a suite plus the number of tests dropped as disabled
    pub fn apply(&self, suite: &TestSuite) -> (TestSuite, usize) {
        let mut disabled = 0;
        let tests: Vec<TestCase> = suite
            .tests
            .iter()
            .filter(|test| {
                if test.disabled && !self.include_disabled {
                    disabled += 1;
                    return false;
                }
                self.matches(test)
            })
            .cloned()
            .collect();

        let filtered = TestSuite {
            name: suite.name.clone(),
            description: suite.description.clone(),
            source: suite.source.clone(),
            tests,
        };
        (filtered, disabled)
    }
}

/// Materialize a filtered corpus for external runners.
///
/// Runners read the corpus themselves, so a filtered selection has to exist
/// on disk: suite files are rewritten into `staging_dir` and the `input/`
/// fixtures are copied alongside. Suites left empty by the filter are not
/// written. Returns the number of suites staged.
pub fn stage_suites(
    suites: &[DiscoveredSuite],
    filter: &SuiteFilter,
    staging_dir: &Path,
    source_tests_dir: &Path,
) -> Result<usize, HarnessError> {
    if staging_dir.exists() {
        fs::remove_dir_all(staging_dir)?;
    }
    fs::create_dir_all(staging_dir)?;

    let mut staged = 0;
    for discovered in suites {
        let (filtered, _) = filter.apply(&discovered.suite);
        if filtered.tests.is_empty() {
            continue;
        }
        let file_name = discovered.path.file_name().ok_or_else(|| {
            HarnessError::SuiteError(format!("suite path {} has no filename", discovered.path.display()))
        })?;
        let target = staging_dir.join(file_name);
        fs::write(&target, serde_json::to_string_pretty(&filtered)?)?;
        staged += 1;
    }

    let input_dir = source_tests_dir.join("input");
    if input_dir.is_dir() {
        let staged_input = staging_dir.join("input");
        fs::create_dir_all(&staged_input)?;
        for entry in fs::read_dir(&input_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::copy(entry.path(), staged_input.join(entry.file_name()))?;
            }
        }
    }

    info!("Staged {} filtered suites into {}", staged, staging_dir.display());
    Ok(staged)
}
