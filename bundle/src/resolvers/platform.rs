//! Screen, graphics, battery and firmware rows from power samples.
//!
//! The benchmark tool records a hardware descriptor with every run; the
//! first sample's descriptor stands for the machine.

use hwgrid_core::CategoryTable;

use super::{ResolveInput, Resolver};
use crate::power::{GpuInfo, PowerSample, ScreenInfo};

/// Renders `value` like C's `%.{precision}g`: `precision` significant
/// digits, scientific notation for very large or small magnitudes, and no
/// trailing zeros.
///
/// # Examples
///
/// ```
/// use hwgrid_bundle::resolvers::platform::format_significant;
///
/// assert_eq!(format_significant(59.95, 2), "60");
/// assert_eq!(format_significant(48.0, 2), "48");
/// assert_eq!(format_significant(144.0, 2), "1.4e+02");
/// ```
pub fn format_significant(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }

    let scientific = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// `"<w>x<h>px (<w>x<h>mm, <refresh> Hz)"`, pixel size scaled by the
/// reported scale factor.
pub fn describe_screen(screen: &ScreenInfo) -> String {
    let x = (screen.x * screen.scale) as i64;
    let y = (screen.y * screen.scale) as i64;
    format!(
        "{x}x{y}px ({}x{}mm, {} Hz)",
        screen.width,
        screen.height,
        format_significant(screen.refresh, 2)
    )
}

fn pci_id_label(name: Option<&str>, id: Option<u32>) -> String {
    match (name, id) {
        (Some(name), _) => name.to_string(),
        (None, Some(id)) => format!("0x{id:X}"),
        (None, None) => "Unknown".to_string(),
    }
}

/// HTML list with one `vendor &mdash; device` item per GPU.
pub fn describe_gpus(gpus: &[GpuInfo]) -> String {
    let mut text = String::from("<ul>\n");
    for gpu in gpus {
        let vendor = pci_id_label(gpu.vendor_name.as_deref(), gpu.vendor);
        let device = pci_id_label(gpu.device_name.as_deref(), gpu.device);
        let note = if gpu.enabled { "" } else { " (disabled)" };
        text.push_str(&format!("<li>{vendor} &mdash; {device}{note}</li>"));
    }
    text.push_str("</ul>");
    text
}

/// `hh:mm` rendering of an estimated life in seconds, `unknown` when the
/// estimate is unavailable.
pub fn format_life(seconds: f64) -> String {
    if seconds < 0.0 {
        return "unknown".to_string();
    }
    let hours = (seconds / 3600.0).trunc() as i64;
    let minutes = (seconds / 60.0).rem_euclid(60.0).trunc() as i64;
    format!("{hours:02}:{minutes:02}h")
}

/// Battery design capacities of the first sample, then one estimated life
/// line per sample ordered by benchmark name.
pub fn describe_battery(samples: &[PowerSample]) -> Option<String> {
    let first = samples.first()?;

    let mut text = String::from("Battery Design Power:\n<ul>");
    for battery in &first.hardware.batteries {
        text.push_str(&format!("<li>{:.2} Wh</li>\n", battery.energy_full_design));
    }
    text.push_str("</ul>Estimated Life:\n<ul>");

    let mut ordered: Vec<&PowerSample> = samples.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));
    for sample in ordered {
        text.push_str(&format!(
            "<li><strong>{}</strong>: {} ({:.2}W) <br/>(screen brightness: {:.0}%, test duration: {:.0}min)</li>\n",
            sample.name,
            format_life(sample.estimated_life),
            sample.watt,
            sample.brightness,
            sample.duration_seconds / 60.0,
        ));
    }
    text.push_str("</ul>");
    Some(text)
}

/// Resolves screen, graphics, battery and firmware rows.
pub struct PlatformResolver;

impl Resolver for PlatformResolver {
    fn name(&self) -> &'static str {
        "platform"
    }

    fn resolve(&self, input: &ResolveInput<'_>, table: &mut CategoryTable) {
        let Some(sample) = input.samples.first() else {
            return;
        };
        let hardware = &sample.hardware;

        if let Some(screen) = &hardware.screen {
            table.entry("screen").resolve(describe_screen(screen));
        }

        table.entry("graphics").resolve(describe_gpus(&hardware.gpus));

        if let Some(text) = describe_battery(input.samples) {
            table.entry("battery").resolve(text);
        }

        if let Some(bios) = &hardware.bios {
            table.entry("firmware").resolve(format!(
                "BIOS: {}, date: {}, vendor: {}",
                bios.version, bios.date, bios.vendor
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power::{BatteryInfo, BiosInfo, HardwareInfo, OsInfo, SoftwareInfo};
    use crate::resolvers::Captures;
    use hwgrid_core::{Style, SysinfoMap};

    fn sample(name: &str, life: f64, watt: f64) -> PowerSample {
        PowerSample {
            source: format!("run1/{name}/gbb.json"),
            name: name.to_string(),
            description: String::new(),
            duration_seconds: 1800.0,
            brightness: 50.0,
            hardware: HardwareInfo {
                screen: Some(ScreenInfo {
                    x: 1280.0,
                    y: 720.0,
                    scale: 1.5,
                    width: 310,
                    height: 174,
                    refresh: 59.95,
                }),
                gpus: vec![
                    GpuInfo {
                        vendor: Some(0x8086),
                        device: Some(0x5916),
                        vendor_name: Some("Intel Corporation".to_string()),
                        device_name: None,
                        enabled: true,
                    },
                    GpuInfo {
                        vendor: Some(0x10de),
                        device: Some(0x134d),
                        vendor_name: None,
                        device_name: Some("GM108M".to_string()),
                        enabled: false,
                    },
                ],
                batteries: vec![BatteryInfo {
                    energy_full_design: 57.0,
                }],
                bios: Some(BiosInfo {
                    version: "N1MET37W (1.22 )".to_string(),
                    date: "07/04/2017".to_string(),
                    vendor: "LENOVO".to_string(),
                }),
            },
            software: SoftwareInfo {
                os: OsInfo {
                    kernel: "4.16.3".to_string(),
                    kind: "Fedora 28".to_string(),
                },
            },
            watt,
            estimated_life: life,
        }
    }

    #[test]
    fn test_format_significant_matches_printf() {
        assert_eq!(format_significant(60.0, 2), "60");
        assert_eq!(format_significant(59.94, 2), "60");
        assert_eq!(format_significant(6.5, 2), "6.5");
        assert_eq!(format_significant(0.00001234, 2), "1.2e-05");
        assert_eq!(format_significant(0.0, 2), "0");
    }

    #[test]
    fn test_describe_screen_scales_pixels() {
        let s = sample("idle", 3600.0, 5.0);
        let screen = s.hardware.screen.as_ref().unwrap();
        assert_eq!(describe_screen(screen), "1920x1080px (310x174mm, 60 Hz)");
    }

    #[test]
    fn test_describe_gpus_with_hex_fallback() {
        let s = sample("idle", 3600.0, 5.0);
        assert_eq!(
            describe_gpus(&s.hardware.gpus),
            "<ul>\n<li>Intel Corporation &mdash; 0x5916</li><li>0x10DE &mdash; GM108M (disabled)</li></ul>"
        );
    }

    #[test]
    fn test_format_life() {
        assert_eq!(format_life(5.0 * 3600.0 + 7.0 * 60.0 + 30.0), "05:07h");
        assert_eq!(format_life(-1.0), "unknown");
    }

    #[test]
    fn test_battery_lines_sorted_by_name() {
        let samples = [sample("web", 14400.0, 6.0), sample("idle", 28800.0, 3.0)];
        let text = describe_battery(&samples).unwrap();
        assert!(text.starts_with("Battery Design Power:\n<ul><li>57.00 Wh</li>\n</ul>Estimated Life:\n<ul>"));
        let idle = text.find("<strong>idle</strong>: 08:00h (3.00W)").unwrap();
        let web = text.find("<strong>web</strong>: 04:00h (6.00W)").unwrap();
        assert!(idle < web);
        assert!(text.contains("(screen brightness: 50%, test duration: 30min)"));
        assert!(text.ends_with("</ul>"));
    }

    #[test]
    fn test_platform_resolver_without_samples_leaves_rows_unresolved() {
        let sysinfo = SysinfoMap::new();
        let captures = Captures::default();
        let input = ResolveInput {
            sysinfo: &sysinfo,
            samples: &[],
            captures: &captures,
            bus_dump: None,
        };
        let mut table = CategoryTable::with_hardware_categories();
        PlatformResolver.resolve(&input, &mut table);
        for key in ["screen", "graphics", "battery", "firmware"] {
            assert_eq!(table.get(key).unwrap().status(), Style::Warn, "{key}");
        }
    }

    #[test]
    fn test_platform_resolver_uses_first_sample() {
        let sysinfo = SysinfoMap::new();
        let captures = Captures::default();
        let mut second = sample("web", 100.0, 1.0);
        second.hardware.bios = None;
        let samples = [sample("idle", 3600.0, 5.0), second];
        let input = ResolveInput {
            sysinfo: &sysinfo,
            samples: &samples,
            captures: &captures,
            bus_dump: None,
        };
        let mut table = CategoryTable::with_hardware_categories();
        PlatformResolver.resolve(&input, &mut table);

        assert_eq!(
            table.get("firmware").unwrap().text(),
            "BIOS: N1MET37W (1.22 ), date: 07/04/2017, vendor: LENOVO"
        );
        for key in ["screen", "graphics", "battery", "firmware"] {
            assert_eq!(table.get(key).unwrap().status(), Style::Good, "{key}");
        }
    }
}
