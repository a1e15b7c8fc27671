//! Output formatting for reports.

use hwgrid_core::Report;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// The canonical report document, pretty-printed.
    #[default]
    Json,
    Yaml,
    Markdown,
}

/// Formats a report in the requested output format.
pub fn format_report(report: &Report, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(report_to_markdown(report)),
    }
}

// Category texts carry HTML fragments; they stay inline, only line breaks
// and pipes would break the table.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn report_to_markdown(report: &Report) -> String {
    let mut out = String::new();

    let title = match (report.sysinfo.get("Manufacturer"), report.sysinfo.get("Product Name")) {
        (Some(vendor), Some(product)) => format!("{vendor} {product}"),
        (Some(vendor), None) => vendor.clone(),
        _ => "Hardware report".to_string(),
    };
    out.push_str(&format!("# {title}\n\n"));
    out.push_str(&format!("**Report version:** {}\n\n", report.version));
    if !report.testruns.is_empty() {
        out.push_str(&format!("**Runs:** {}\n\n", report.testruns.join(", ")));
    }

    if !report.sysinfo.is_empty() {
        out.push_str("## System\n\n");
        out.push_str("| Field | Value |\n");
        out.push_str("|-------|-------|\n");
        for (field, value) in &report.sysinfo {
            out.push_str(&format!("| {field} | {} |\n", cell(value)));
        }
        out.push('\n');
    }

    out.push_str("## Hardware\n\n");
    out.push_str("| Category | Status | Details |\n");
    out.push_str("|----------|--------|---------|\n");
    for entry in report.hwtable.values() {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            entry.kind,
            entry.status,
            cell(&entry.text)
        ));
    }
    out.push('\n');

    if !report.tests.is_empty() {
        out.push_str("## Tests\n\n");
        out.push_str("| Test | Status | Notes |\n");
        out.push_str("|------|--------|-------|\n");
        for test in &report.tests {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                cell(&test.name),
                test.status,
                cell(&test.whiteboard)
            ));
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwgrid_core::{CategoryEntry, Style, TestStatus, TestSummary};

    fn sample_report() -> Report {
        let mut report = Report::empty();
        report
            .sysinfo
            .insert("Manufacturer".to_string(), "Acme".to_string());
        report
            .sysinfo
            .insert("Product Name".to_string(), "Widget".to_string());
        report.hwtable.insert(
            "usb".to_string(),
            CategoryEntry {
                kind: "USB".to_string(),
                status: Style::Good,
                text: "2.0, 3.0".to_string(),
            },
        );
        report.tests.push(TestSummary {
            name: "Suspend".to_string(),
            status: TestStatus::Fail,
            style: Style::Bad,
            whiteboard: "resume|failed\nafter 3 cycles".to_string(),
            dir: "run1/test-results/x".to_string(),
        });
        report
    }

    #[test]
    fn test_json_is_canonical_document() {
        let text = format_report(&sample_report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["hwtable"]["usb"]["type"], "USB");
        assert_eq!(value["tests"][0]["style"], "BAD");
    }

    #[test]
    fn test_yaml_parses_back() {
        let text = format_report(&sample_report(), OutputFormat::Yaml).unwrap();
        let parsed: Report = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed, sample_report());
    }

    #[test]
    fn test_markdown_tables() {
        let text = format_report(&sample_report(), OutputFormat::Markdown).unwrap();
        assert!(text.starts_with("# Acme Widget\n"));
        assert!(text.contains("| USB | GOOD | 2.0, 3.0 |"));
        assert!(text.contains("| Suspend | FAIL | resume\\|failed after 3 cycles |"));
    }
}
