//! System information extraction from command captures.

use std::sync::LazyLock;

use hwgrid_core::SysinfoMap;
use regex::Regex;
use tracing::debug;

use crate::archive::{Bundle, CapturePhase};
use crate::error::Result;

/// DMI fields copied from the "System Information" block.
pub const DMI_SYSTEM_FIELDS: &[&str] = &[
    "Manufacturer",
    "Product Name",
    "Version",
    "Family",
    "SKU Number",
];

const DMI_CAPTURE: &str = "dmidecode";
const CPU_CAPTURE: &str = "lscpu";
const OS_PROBE_CAPTURE: &str = "gbb_info_--json";
const UNAME_CAPTURE: &str = "uname_-a";

static CPU_MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Model name:\s+(?P<model>.*)$").expect("static regex must compile")
});

/// Extracts the system information map from the main run's captures.
///
/// # Errors
///
/// Returns [`MissingEntry`](crate::BundleError::MissingEntry) if the DMI or
/// CPU capture is absent. The kernel and OS sources are optional.
pub fn extract_sysinfo(bundle: &Bundle) -> Result<SysinfoMap> {
    let mut sysinfo = parse_dmi_system(&bundle.read_capture(DMI_CAPTURE, CapturePhase::Pre)?);

    let lscpu = bundle.read_capture(CPU_CAPTURE, CapturePhase::Pre)?;
    if let Some(model) = parse_cpu_model(&lscpu) {
        sysinfo.insert("CPU".to_string(), model);
    }

    let probe = bundle
        .optional_capture(OS_PROBE_CAPTURE, CapturePhase::Pre)
        .and_then(|text| parse_os_probe(&text));
    match probe {
        Some(probe) => {
            sysinfo.insert("Kernel".to_string(), probe.kernel);
            if let Some(os) = probe.os {
                sysinfo.insert("OS".to_string(), os);
            }
        }
        None => {
            debug!("OS probe unavailable, falling back to uname");
            if let Some(kernel) = bundle
                .optional_capture(UNAME_CAPTURE, CapturePhase::Pre)
                .and_then(|text| kernel_from_uname(&text))
            {
                sysinfo.insert("Kernel".to_string(), kernel);
            }
        }
    }

    Ok(sysinfo)
}

/// Collects [`DMI_SYSTEM_FIELDS`] from a `dmidecode` listing.
///
/// Collection is active from a line reading exactly `System Information`
/// up to the next line starting with `Handle`.
///
/// # Examples
///
/// ```
/// use hwgrid_bundle::sysinfo::parse_dmi_system;
///
/// let dmi = "Handle 0x0001, DMI type 1, 27 bytes\n\
///            System Information\n\
///            \tManufacturer: Acme\n\
///            \tProduct Name: Widget\n\
///            \tUUID: 1234\n\
///            Handle 0x0002, DMI type 2\n\
///            \tManufacturer: Board Vendor\n";
/// let info = parse_dmi_system(dmi);
/// assert_eq!(info["Manufacturer"], "Acme");
/// assert_eq!(info["Product Name"], "Widget");
/// assert!(!info.contains_key("UUID"));
/// ```
pub fn parse_dmi_system(text: &str) -> SysinfoMap {
    let mut fields = SysinfoMap::new();
    let mut active = false;

    for line in text.split('\n') {
        if line.starts_with("Handle") {
            active = false;
        }
        if line == "System Information" {
            active = true;
        }
        if !active {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if DMI_SYSTEM_FIELDS.contains(&key) {
            fields.insert(key.to_string(), value.trim().to_string());
        }
    }

    fields
}

/// Returns the first `Model name:` value of an `lscpu` listing.
pub fn parse_cpu_model(text: &str) -> Option<String> {
    CPU_MODEL
        .captures(text)
        .map(|caps| caps["model"].to_string())
}

/// Kernel and OS reported by the JSON system probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsProbe {
    pub kernel: String,
    pub os: Option<String>,
}

/// Parses the JSON system probe, tolerating tool chatter before the
/// document. Returns `None` on any failure so callers can fall back.
pub fn parse_os_probe(text: &str) -> Option<OsProbe> {
    let start = text.find("{\n").unwrap_or(0);
    let data: serde_json::Value = match serde_json::from_str(&text[start..]) {
        Ok(data) => data,
        Err(e) => {
            debug!(error = %e, "OS probe is not valid JSON");
            return None;
        }
    };

    let kernel = data.pointer("/software/os/kernel")?.as_str()?.to_string();
    let os = data
        .pointer("/software/os/type")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Some(OsProbe { kernel, os })
}

/// Returns the kernel release (third field) of a `uname -a` line.
pub fn kernel_from_uname(text: &str) -> Option<String> {
    text.split_whitespace().nth(2).map(str::to_string)
}
