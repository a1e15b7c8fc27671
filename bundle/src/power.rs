//! Power profile parsing for battery benchmark documents.
//!
//! Each benchmark run leaves a `gbb.json` document behind. Two generations of
//! that document exist: current documents report the power draw and the
//! estimated battery life directly, legacy documents (no `format-version`, or
//! version `[1, 0, 0]`) only carry an energy log from which both values are
//! derived.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::archive::Bundle;

/// File name of a benchmark power profile inside a run directory.
pub const POWER_PROFILE_FILE: &str = "gbb.json";

const LEGACY_FORMAT_VERSION: [u64; 3] = [1, 0, 0];

/// Why a single power profile document was rejected.
#[derive(Debug, Error)]
pub enum PowerProfileError {
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("current-format document has no power value")]
    MissingPower,

    #[error("energy log needs at least 2 samples, found {0}")]
    ShortLog(usize),

    #[error("first log sample has no energy-full-design")]
    MissingFullDesign,

    #[error("energy log spans no time")]
    ZeroInterval,

    #[error("energy log shows no drain")]
    ZeroDrain,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScreenInfo {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Physical width in millimetres.
    pub width: i64,
    /// Physical height in millimetres.
    pub height: i64,
    pub refresh: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GpuInfo {
    #[serde(default)]
    pub vendor: Option<u32>,
    #[serde(default)]
    pub device: Option<u32>,
    #[serde(rename = "vendor-name", default)]
    pub vendor_name: Option<String>,
    #[serde(rename = "device-name", default)]
    pub device_name: Option<String>,
    #[serde(default = "gpu_enabled_default")]
    pub enabled: bool,
}

fn gpu_enabled_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatteryInfo {
    /// Design capacity in Wh.
    #[serde(rename = "energy-full-design")]
    pub energy_full_design: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BiosInfo {
    pub version: String,
    pub date: String,
    pub vendor: String,
}

/// Hardware descriptor recorded by the benchmark tool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HardwareInfo {
    #[serde(default)]
    pub screen: Option<ScreenInfo>,
    pub gpus: Vec<GpuInfo>,
    #[serde(default)]
    pub batteries: Vec<BatteryInfo>,
    #[serde(default)]
    pub bios: Option<BiosInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OsInfo {
    pub kernel: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoftwareInfo {
    pub os: OsInfo,
}

/// One parsed benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSample {
    /// Archive path of the source document.
    pub source: String,
    pub name: String,
    pub description: String,
    pub duration_seconds: f64,
    /// Screen brightness in percent.
    pub brightness: f64,
    pub hardware: HardwareInfo,
    pub software: SoftwareInfo,
    /// Average power draw in W.
    pub watt: f64,
    /// Estimated battery life in seconds, `-1` when unknown.
    pub estimated_life: f64,
}

#[derive(Debug, Deserialize)]
struct LogEntry {
    energy: f64,
    #[serde(rename = "time-ms")]
    time_ms: f64,
    #[serde(rename = "energy-full-design", default)]
    energy_full_design: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SystemInfo {
    #[serde(rename = "format-version", default)]
    format_version: Option<Value>,
    hardware: HardwareInfo,
    software: SoftwareInfo,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(rename = "screen-brightness")]
    brightness: f64,
    #[serde(rename = "test-name")]
    name: String,
    #[serde(rename = "test-description")]
    description: String,
    #[serde(rename = "duration-seconds")]
    duration_seconds: f64,
    #[serde(rename = "system-info")]
    system: SystemInfo,
    #[serde(default)]
    power: Option<f64>,
    #[serde(rename = "estimated-life-design", default)]
    estimated_life: Option<f64>,
    #[serde(default)]
    log: Vec<LogEntry>,
}

/// Document generation, selected once per document.
#[derive(Debug)]
enum PowerSchema<'a> {
    Current {
        power: Option<f64>,
        estimated_life: Option<f64>,
    },
    Legacy {
        log: &'a [LogEntry],
    },
}

impl<'a> PowerSchema<'a> {
    fn select(raw: &'a RawProfile) -> Self {
        let legacy = match &raw.system.format_version {
            None => true,
            Some(version) => is_legacy_version(version),
        };
        if legacy {
            Self::Legacy { log: &raw.log }
        } else {
            Self::Current {
                power: raw.power,
                estimated_life: raw.estimated_life,
            }
        }
    }

    /// Returns `(watt, estimated_life_seconds)`.
    fn compute(&self) -> Result<(f64, f64), PowerProfileError> {
        match self {
            Self::Current {
                power,
                estimated_life,
            } => {
                let watt = power.ok_or(PowerProfileError::MissingPower)?;
                Ok((watt, estimated_life.unwrap_or(-1.0)))
            }
            Self::Legacy { log } => legacy_estimate(log),
        }
    }
}

fn is_legacy_version(version: &Value) -> bool {
    version.as_array().is_some_and(|parts| {
        parts.len() == LEGACY_FORMAT_VERSION.len()
            && parts
                .iter()
                .zip(LEGACY_FORMAT_VERSION)
                .all(|(part, expected)| part.as_u64() == Some(expected))
    })
}

/// Derives power and life from the energy log.
///
/// The second sample is used as start point because the first is taken
/// before the system settles. The life estimate still divides the first
/// sample's design capacity, so it is known to be rough.
fn legacy_estimate(log: &[LogEntry]) -> Result<(f64, f64), PowerProfileError> {
    if log.len() < 2 {
        return Err(PowerProfileError::ShortLog(log.len()));
    }
    let first = &log[1];
    let last = &log[log.len() - 1];

    let interval_ms = last.time_ms - first.time_ms;
    if interval_ms == 0.0 {
        return Err(PowerProfileError::ZeroInterval);
    }
    let energy_per_ms = (first.energy - last.energy) / interval_ms;
    let watt = energy_per_ms * 3.6;

    let full_design = log[0]
        .energy_full_design
        .ok_or(PowerProfileError::MissingFullDesign)?;
    if energy_per_ms == 0.0 {
        return Err(PowerProfileError::ZeroDrain);
    }
    let estimated_life = full_design / energy_per_ms / 1000.0;

    Ok((watt, estimated_life))
}

/// Parses one power profile document.
pub fn parse_power_profile(source: &str, text: &str) -> Result<PowerSample, PowerProfileError> {
    let raw: RawProfile = serde_json::from_str(text)?;
    let (watt, estimated_life) = PowerSchema::select(&raw).compute()?;

    Ok(PowerSample {
        source: source.to_string(),
        name: raw.name,
        description: raw.description,
        duration_seconds: raw.duration_seconds,
        brightness: raw.brightness,
        hardware: raw.system.hardware,
        software: raw.system.software,
        watt,
        estimated_life,
    })
}

/// Parses every power profile in the bundle, in archive order.
///
/// A document that fails to parse is logged and skipped; it never fails
/// the bundle.
pub fn find_power_samples(bundle: &Bundle) -> Vec<PowerSample> {
    let suffix = format!("/{POWER_PROFILE_FILE}");
    let mut samples = Vec::new();

    for name in bundle.entry_names().filter(|name| name.ends_with(&suffix)) {
        let parsed = bundle
            .read_text(name)
            .map_err(|e| e.to_string())
            .and_then(|text| parse_power_profile(name, &text).map_err(|e| e.to_string()));
        match parsed {
            Ok(sample) => samples.push(sample),
            Err(error) => warn!(file = name, %error, "Ignoring unparseable power profile"),
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(system_extra: Value, top_extra: Value) -> String {
        let mut system = json!({
            "hardware": {
                "gpus": [{"vendor": 32902, "device": 22807, "enabled": true}],
                "batteries": [{"energy-full-design": 57.0}]
            },
            "software": {"os": {"kernel": "4.16.3", "type": "Fedora 28"}}
        });
        for (k, v) in system_extra.as_object().unwrap() {
            system[k] = v.clone();
        }
        let mut doc = json!({
            "screen-brightness": 50.0,
            "test-name": "idle",
            "test-description": "Idle desktop",
            "duration-seconds": 3600.0,
            "system-info": system,
        });
        for (k, v) in top_extra.as_object().unwrap() {
            doc[k] = v.clone();
        }
        doc.to_string()
    }

    #[test]
    fn test_current_schema_uses_reported_values() {
        let text = document(
            json!({"format-version": [2, 0, 0]}),
            json!({"power": 7.25, "estimated-life-design": 28000.0}),
        );
        let sample = parse_power_profile("run1/bench/gbb.json", &text).unwrap();
        assert_eq!(sample.watt, 7.25);
        assert_eq!(sample.estimated_life, 28000.0);
        assert_eq!(sample.name, "idle");
        assert_eq!(sample.software.os.kind, "Fedora 28");
    }

    #[test]
    fn test_current_schema_without_life_is_minus_one() {
        let text = document(json!({"format-version": [1, 1, 0]}), json!({"power": 5.0}));
        let sample = parse_power_profile("gbb.json", &text).unwrap();
        assert_eq!(sample.estimated_life, -1.0);
    }

    #[test]
    fn test_legacy_schema_computes_from_log() {
        let log = json!([
            {"energy": 57.0, "time-ms": 0.0, "energy-full-design": 57.0},
            {"energy": 50.0, "time-ms": 1000.0},
            {"energy": 45.0, "time-ms": 2000.0},
            {"energy": 40.0, "time-ms": 3000.0}
        ]);
        let text = document(json!({}), json!({"power": 99.0, "log": log}));
        let sample = parse_power_profile("gbb.json", &text).unwrap();

        let per_ms = (50.0 - 40.0) / (3000.0 - 1000.0);
        assert_eq!(sample.watt, per_ms * 3.6);
        assert_eq!(sample.estimated_life, 57.0 / per_ms / 1000.0);
    }

    #[test]
    fn test_version_one_is_legacy() {
        let log = json!([
            {"energy": 10.0, "time-ms": 0.0, "energy-full-design": 20.0},
            {"energy": 9.0, "time-ms": 100.0},
            {"energy": 8.0, "time-ms": 200.0}
        ]);
        let text = document(json!({"format-version": [1, 0, 0]}), json!({"log": log}));
        let sample = parse_power_profile("gbb.json", &text).unwrap();
        assert_eq!(sample.watt, (9.0 - 8.0) / (200.0 - 100.0) * 3.6);
    }

    #[test]
    fn test_legacy_rejects_degenerate_logs() {
        let short = document(json!({}), json!({"log": [{"energy": 1.0, "time-ms": 0.0}]}));
        assert!(matches!(
            parse_power_profile("gbb.json", &short),
            Err(PowerProfileError::ShortLog(1))
        ));

        let flat = json!([
            {"energy": 10.0, "time-ms": 0.0, "energy-full-design": 20.0},
            {"energy": 9.0, "time-ms": 100.0},
            {"energy": 8.0, "time-ms": 100.0}
        ]);
        let text = document(json!({}), json!({"log": flat}));
        assert!(matches!(
            parse_power_profile("gbb.json", &text),
            Err(PowerProfileError::ZeroInterval)
        ));
    }

    #[test]
    fn test_current_schema_requires_power() {
        let text = document(json!({"format-version": [2, 0, 0]}), json!({}));
        assert!(matches!(
            parse_power_profile("gbb.json", &text),
            Err(PowerProfileError::MissingPower)
        ));
    }

    #[test]
    fn test_malformed_document_is_json_error() {
        assert!(matches!(
            parse_power_profile("gbb.json", "{\"test-name\": 1}"),
            Err(PowerProfileError::Json(_))
        ));
    }
}
