//! Parser for laptop hardware test bundles.
//!
//! A bundle is a zip archive with one directory per test run, holding raw
//! command captures, benchmark power profiles and the test runner's
//! results. [`parse_bundle`] turns it into a versioned [`Report`]:
//!
//! 1. [`Bundle::open`] validates the archive and lists its runs.
//! 2. System information is extracted from DMI, CPU and OS captures.
//! 3. Power profiles are parsed; bad documents are logged and skipped.
//! 4. Hardware resolvers fill the category table.
//! 5. Test cases are parsed and fold their outcomes into the table.
//! 6. The report snapshots everything.
//!
//! [`report_for`] adds version-gated reuse of cached reports on top.
//!
//! # Example
//!
//! ```no_run
//! use hwgrid_bundle::{NoDocs, OutputFormat, format_report, parse_bundle};
//!
//! let bytes = std::fs::read("bundle.zip").unwrap();
//! let report = parse_bundle(&bytes, &NoDocs).unwrap();
//! println!("{}", format_report(&report, OutputFormat::Markdown).unwrap());
//! ```

use std::path::Path;

use hwgrid_core::{CategoryTable, Report};
use tracing::info;

pub mod archive;
pub mod cache;
pub mod docs;
pub mod error;
pub mod output;
pub mod power;
pub mod report;
pub mod resolvers;
pub mod sysinfo;
pub mod testcase;

pub use archive::{Bundle, CapturePhase};
pub use cache::{MemoryCache, ReportCache, report_for};
pub use docs::{DocLookup, NoDocs, SourceTreeDocs};
pub use error::{BundleError, Result};
pub use output::{OutputFormat, format_report};
pub use power::{PowerSample, find_power_samples, parse_power_profile};
pub use testcase::TestCaseRecord;

/// Parses raw bundle bytes into a report.
///
/// # Errors
///
/// Fails on a corrupt or empty archive, a missing required capture or
/// results document, or a malformed results document.
pub fn parse_bundle(bytes: &[u8], docs: &dyn DocLookup) -> Result<Report> {
    let bundle = Bundle::open(bytes)?;

    let sysinfo = sysinfo::extract_sysinfo(&bundle)?;
    let captures = resolvers::Captures::read(&bundle)?;
    let samples = power::find_power_samples(&bundle);
    let bus_dump = resolvers::fingerprint::load_bus_dump(&bundle);

    let mut table = CategoryTable::with_hardware_categories();
    let input = resolvers::ResolveInput {
        sysinfo: &sysinfo,
        samples: &samples,
        captures: &captures,
        bus_dump: bus_dump.as_ref(),
    };
    resolvers::resolve_hardware(&input, &mut table);

    let tests = testcase::parse_test_cases(&bundle, docs, &mut table)?;

    let report = report::build_report(report::ReportParts {
        sysinfo: &sysinfo,
        table: &table,
        runs: bundle.runs(),
        lspci: &captures.lspci,
        lsusb: &captures.lsusb,
        tests: &tests,
    });

    info!(
        main_run = bundle.main_run(),
        runs = bundle.runs().len(),
        samples = samples.len(),
        tests = tests.len(),
        "Parsed bundle"
    );
    Ok(report)
}

/// Reads a bundle file from disk and parses it.
///
/// # Errors
///
/// Returns [`BundleError::Io`] if the file cannot be read, otherwise the
/// errors of [`parse_bundle`].
pub fn parse_bundle_file(path: &Path, docs: &dyn DocLookup) -> Result<Report> {
    let bytes = std::fs::read(path)?;
    parse_bundle(&bytes, docs)
}
