//! Report assembly.

use hwgrid_core::{CategoryTable, REPORT_FORMAT_VERSION, Report, SysinfoMap};

use crate::testcase::TestCaseRecord;

/// Reduces `lspci -vvnn` output to its device header lines.
///
/// Indented detail lines and blank lines are dropped. A final line without
/// a trailing newline is kept as-is.
pub fn filter_lspci(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !(line.ends_with('\n') && (line == &"\n" || line.starts_with('\t'))))
        .collect()
}

/// Reduces `lsusb -v` output to its `Bus ...` lines.
///
/// A final line without a trailing newline is kept as-is.
pub fn filter_lsusb(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !line.ends_with('\n') || line.starts_with("Bus"))
        .collect()
}

/// Everything a report is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct ReportParts<'a> {
    pub sysinfo: &'a SysinfoMap,
    pub table: &'a CategoryTable,
    pub runs: &'a [String],
    pub lspci: &'a str,
    pub lsusb: &'a str,
    pub tests: &'a [TestCaseRecord],
}

/// Snapshots the parse results into a versioned report.
pub fn build_report(parts: ReportParts<'_>) -> Report {
    Report {
        version: REPORT_FORMAT_VERSION,
        sysinfo: parts.sysinfo.clone(),
        hwtable: parts.table.to_entries(),
        testruns: parts.runs.to_vec(),
        lspci: filter_lspci(parts.lspci),
        lsusb: filter_lsusb(parts.lsusb),
        tests: parts.tests.iter().map(TestCaseRecord::summary).collect(),
    }
}
