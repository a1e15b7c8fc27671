//! Report type definitions for hardware test bundles.
//!
//! This module defines the serialized shape of a bundle report. The field
//! names are consumed verbatim by the report viewer, so they are part of the
//! external contract and must not be renamed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Version of the report document format.
///
/// Bump whenever parsing or the serialized shape changes; cached reports
/// carrying any other version are regenerated from the archive.
pub const REPORT_FORMAT_VERSION: u32 = 12;

/// System information fields extracted from command captures, keyed by
/// display name (`Manufacturer`, `Product Name`, `CPU`, `Kernel`, ...).
pub type SysinfoMap = BTreeMap<String, String>;

/// Display style shared by category rows and test summaries.
///
/// # Examples
///
/// ```
/// use hwgrid_core::Style;
///
/// assert_eq!(serde_json::to_string(&Style::Bad).unwrap(), "\"BAD\"");
/// assert_eq!(Style::Info.to_string(), "INFO");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Style {
    Good,
    Bad,
    Warn,
    Info,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Bad => "BAD",
            Self::Warn => "WARN",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome recorded by the test runner for one test entry.
///
/// Unknown values are preserved in [`TestStatus::Other`] so the raw status
/// survives a serialization round trip.
///
/// # Examples
///
/// ```
/// use hwgrid_core::{Style, TestStatus};
///
/// assert_eq!(TestStatus::from("CANCELLED").style(), Style::Info);
/// assert_eq!(TestStatus::from("ERROR").style(), Style::Warn);
/// assert_eq!(TestStatus::from("ERROR").as_str(), "ERROR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TestStatus {
    Pass,
    Fail,
    Warn,
    Skip,
    Cancelled,
    Other(String),
}

impl TestStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Warn => "WARN",
            Self::Skip => "SKIP",
            Self::Cancelled => "CANCELLED",
            Self::Other(raw) => raw,
        }
    }

    /// Maps the runner outcome onto a display style. Anything unrecognized
    /// is shown as a warning.
    pub fn style(&self) -> Style {
        match self {
            Self::Warn => Style::Warn,
            Self::Skip | Self::Cancelled => Style::Info,
            Self::Fail => Style::Bad,
            Self::Pass => Style::Good,
            Self::Other(_) => Style::Warn,
        }
    }
}

impl From<String> for TestStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PASS" => Self::Pass,
            "FAIL" => Self::Fail,
            "WARN" => Self::Warn,
            "SKIP" => Self::Skip,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for TestStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<TestStatus> for String {
    fn from(status: TestStatus) -> Self {
        match status {
            TestStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the hardware table as rendered in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Human-readable category name (e.g. "Wireless LAN").
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Style,
    /// Description text; may contain HTML fragments for the viewer.
    pub text: String,
}

/// Summary of one executed test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub name: String,
    pub status: TestStatus,
    pub style: Style,
    /// Whiteboard text, or the cleaned fail reason when the whiteboard is empty.
    pub whiteboard: String,
    /// Archive path of the test's artifact directory.
    pub dir: String,
}

/// Canonical report produced for one bundle.
///
/// # Examples
///
/// ```
/// use hwgrid_core::{REPORT_FORMAT_VERSION, Report, is_up_to_date};
///
/// let report = Report::empty();
/// let value = serde_json::to_value(&report).unwrap();
/// assert_eq!(report.version, REPORT_FORMAT_VERSION);
/// assert!(is_up_to_date(Some(&value)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub version: u32,
    pub sysinfo: SysinfoMap,
    pub hwtable: BTreeMap<String, CategoryEntry>,
    pub testruns: Vec<String>,
    /// PCI listing reduced to device header lines.
    pub lspci: String,
    /// USB listing reduced to bus lines.
    pub lsusb: String,
    pub tests: Vec<TestSummary>,
}

impl Report {
    /// Creates a report with the current format version and no content.
    pub fn empty() -> Self {
        Self {
            version: REPORT_FORMAT_VERSION,
            sysinfo: SysinfoMap::new(),
            hwtable: BTreeMap::new(),
            testruns: Vec::new(),
            lspci: String::new(),
            lsusb: String::new(),
            tests: Vec::new(),
        }
    }
}

/// Returns `true` if a previously stored report document can be reused
/// without re-parsing the bundle.
///
/// Only the `version` field is inspected: it must be a number equal to
/// [`REPORT_FORMAT_VERSION`], so `12.0` matches `12`. A missing document, a
/// missing or `null` version, or any other value means the report is stale.
pub fn is_up_to_date(cached: Option<&serde_json::Value>) -> bool {
    let Some(version) = cached.and_then(|doc| doc.get("version")) else {
        return false;
    };
    version.as_f64() == Some(f64::from(REPORT_FORMAT_VERSION))
}
