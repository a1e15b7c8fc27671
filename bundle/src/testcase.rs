//! Test case records from each run's `results.json`.
//!
//! Runs are processed in ascending order. Every run after the first is a
//! replay that repeats the previous results and appends new ones, so only
//! entries beyond the count already collected are taken from it.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use hwgrid_core::{CategoryTable, ISSUES_CATEGORY, Style, TestStatus, TestSummary};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::archive::Bundle;
use crate::docs::DocLookup;
use crate::error::{BundleError, Result};

/// Runner notice that older test suites append to every skip reason.
pub const DEPRECATED_SKIP_WARNING: &str =
    "[WARNING: self.skip() will be deprecated. Use 'self.cancel()' or the skip decorators]";

const RESULTS_FILE: &str = "results.json";

static NAME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*:").expect("static regex must compile"));
static NAME_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";.*").expect("static regex must compile"));
static TEST_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*/(?P<file>.*):(?P<class>.*)\.(?P<func>.*)").expect("static regex must compile")
});
static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\.\. title:: (?P<title>.*)$").expect("static regex must compile")
});
static CATEGORIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*:categories:\s*(?P<cats>\S+)\s*").expect("static regex must compile")
});

#[derive(Debug, Deserialize)]
struct RunResults {
    tests: Vec<RawTestEntry>,
}

/// One entry of a runner results document.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTestEntry {
    /// Runner test id, e.g. `1-/tests/battery.py:Battery.test_drain`.
    pub test: String,
    pub status: TestStatus,
    #[serde(default)]
    pub fail_reason: Option<String>,
    #[serde(default)]
    pub whiteboard: Option<String>,
}

/// A parsed test case. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseRecord {
    id: String,
    run: String,
    status: TestStatus,
    fail_reason: String,
    whiteboard: String,
    name: String,
    categories: BTreeSet<String>,
}

impl TestCaseRecord {
    /// Builds a record for `entry`, found in run directory `run`.
    pub fn new(entry: RawTestEntry, run: &str, docs: &dyn DocLookup) -> Self {
        let fail_reason = entry
            .fail_reason
            .unwrap_or_default()
            .replace(DEPRECATED_SKIP_WARNING, "")
            .trim()
            .to_string();
        let doc = lookup_doc(&entry.test, docs).unwrap_or_default();

        let name = doc_title(&doc).unwrap_or_else(|| display_name(&entry.test));

        Self {
            run: run.to_string(),
            status: entry.status,
            fail_reason,
            whiteboard: entry.whiteboard.unwrap_or_default(),
            name,
            categories: doc_categories(&doc),
            id: entry.test,
        }
    }

    /// Raw runner id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn run(&self) -> &str {
        &self.run
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> &TestStatus {
        &self.status
    }

    pub fn style(&self) -> Style {
        self.status.style()
    }

    /// Fail reason with the deprecation notice removed.
    pub fn fail_reason(&self) -> &str {
        &self.fail_reason
    }

    /// Categories this test reports on; never empty.
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// Archive directory holding this test's artifacts.
    pub fn artifact_dir(&self) -> String {
        format!("{}/test-results/{}", self.run, self.id.replace('/', "_"))
    }

    /// Folds this test's outcome into every category it reports on.
    pub fn mark_categories(&self, table: &mut CategoryTable) {
        for category in &self.categories {
            table.mark(category, &self.status);
        }
    }

    pub fn summary(&self) -> TestSummary {
        let whiteboard = if self.whiteboard.is_empty() {
            self.fail_reason.clone()
        } else {
            self.whiteboard.clone()
        };
        TestSummary {
            name: self.name.clone(),
            status: self.status.clone(),
            style: self.style(),
            whiteboard,
            dir: self.artifact_dir(),
        }
    }
}

/// Strips the `module:` prefix (through the last colon) and any `;variant`
/// suffix from a runner id.
pub fn display_name(id: &str) -> String {
    let name = NAME_PREFIX.replace_all(id, "");
    NAME_SUFFIX.replace_all(&name, "").into_owned()
}

fn lookup_doc(id: &str, docs: &dyn DocLookup) -> Option<String> {
    let Some(caps) = TEST_LOCATION.captures(id) else {
        debug!(id, "Test id has no file:class location");
        return None;
    };
    docs.class_doc(&caps["file"], &caps["class"])
}

/// Non-empty `.. title::` directive payload.
pub fn doc_title(doc: &str) -> Option<String> {
    TITLE
        .captures(doc)
        .map(|caps| caps["title"].to_string())
        .filter(|title| !title.is_empty())
}

/// Union of all `:categories:` directives, defaulting to the issues
/// category when none names anything.
pub fn doc_categories(doc: &str) -> BTreeSet<String> {
    let mut categories: BTreeSet<String> = CATEGORIES
        .captures_iter(doc)
        .flat_map(|caps| {
            caps["cats"]
                .split(',')
                .map(|cat| cat.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|cat| !cat.is_empty())
        .collect();

    if categories.is_empty() {
        categories.insert(ISSUES_CATEGORY.to_string());
    }
    categories
}

fn read_results(bundle: &Bundle, run: &str) -> Result<Vec<RawTestEntry>> {
    let path = format!("{run}/{RESULTS_FILE}");
    let bytes = bundle.read_bytes(&path)?;
    let results: RunResults =
        serde_json::from_slice(&bytes).map_err(|source| BundleError::Json { path, source })?;
    Ok(results.tests)
}

/// Parses the test cases of every run and folds their outcomes into
/// `table`.
///
/// # Errors
///
/// Returns [`BundleError::MissingEntry`] when a run has no results
/// document and [`BundleError::Json`] when one is malformed.
pub fn parse_test_cases(
    bundle: &Bundle,
    docs: &dyn DocLookup,
    table: &mut CategoryTable,
) -> Result<Vec<TestCaseRecord>> {
    let mut records: Vec<TestCaseRecord> = Vec::new();

    for run in bundle.runs() {
        let entries = read_results(bundle, run)?;
        let seen = records.len();
        if entries.len() < seen {
            debug!(run, entries = entries.len(), seen, "Replay is shorter than previous runs");
        }

        for entry in entries.into_iter().skip(seen) {
            let record = TestCaseRecord::new(entry, run, docs);
            record.mark_categories(table);
            records.push(record);
        }
    }

    Ok(records)
}
