//! Wireless and wired network adapters.
//!
//! PCI adapters are matched by class id in `lspci -vvnn` output. Wireless
//! radios are additionally described from the `iw phy` capability dump,
//! one summary per band.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use hwgrid_core::CategoryTable;
use regex::Regex;

use super::{ResolveInput, Resolver};

/// PCI class of network controllers (wireless).
pub const PCI_CLASS_WIRELESS: &str = "0280";
/// PCI class of ethernet controllers.
pub const PCI_CLASS_ETHERNET: &str = "0200";

const NO_ETHERNET_TEXT: &str = "No PCI Adapter found";

static PCI_WIRELESS: LazyLock<Regex> = LazyLock::new(|| pci_class_pattern(PCI_CLASS_WIRELESS));
static PCI_ETHERNET: LazyLock<Regex> = LazyLock::new(|| pci_class_pattern(PCI_CLASS_ETHERNET));

static WIPHY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Wiphy (?P<phy>\S*)\n").expect("static regex must compile")
});
static BAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\tBand [0-9]+:\n").expect("static regex must compile"));
static STREAMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<streams>[1-8]) streams: (?P<mcs>MCS [0-9]+-[0-9]+)")
        .expect("static regex must compile")
});
static VHT_CAPABILITIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\tVHT Capabilities \((?P<cap>0x[a-fA-F0-9]*)\)").expect("static regex must compile")
});

fn pci_class_pattern(class: &str) -> Regex {
    Regex::new(&format!(r"[^:\n]*\[{class}\]:\s+(?P<device>.*)"))
        .expect("static regex must compile")
}

fn pci_devices(pattern: &Regex, lspci: &str) -> Vec<String> {
    pattern
        .captures_iter(lspci)
        .map(|caps| caps["device"].to_string())
        .collect()
}

/// Device descriptions of wireless PCI adapters.
pub fn pci_wireless_devices(lspci: &str) -> Vec<String> {
    pci_devices(&PCI_WIRELESS, lspci)
}

/// Device descriptions of ethernet PCI adapters.
pub fn pci_ethernet_devices(lspci: &str) -> Vec<String> {
    pci_devices(&PCI_ETHERNET, lspci)
}

/// Summarizes one band of a radio: 802.11n width (or g-only), and the
/// 802.11ac tier when VHT capabilities are advertised.
pub fn describe_band(band: &str) -> Vec<String> {
    let mut infos = Vec::new();
    if band.contains("\tHT20/HT40\n") {
        infos.push("802.11n (40MHz)".to_string());
    } else if band.contains("\tHT20\n") {
        infos.push("802.11n (20MHz)".to_string());
    } else {
        infos.push("802.11g only".to_string());
    }

    let mut streams: i32 = -1;
    let mut mcs = "unresolved".to_string();
    for caps in STREAMS.captures_iter(band) {
        let count: i32 = caps["streams"].parse().unwrap_or(-1);
        if count > streams {
            streams = count;
            mcs = caps["mcs"].to_string();
        }
    }

    let vht = VHT_CAPABILITIES
        .captures(band)
        .and_then(|caps| u32::from_str_radix(caps["cap"].trim_start_matches("0x"), 16).ok());
    if let Some(cap) = vht {
        let info = match (cap >> 2) & 3 {
            0 => format!("802.11ac (80MHz, {streams} streams {mcs})"),
            1 => format!("802.11ac (160MHz, {streams} streams {mcs})"),
            2 => format!("802.11ac (160/80+80 MHz, {streams} streams {mcs})"),
            _ => format!("802.11ac ({streams} streams {mcs})"),
        };
        infos.push(info);
    }

    infos
}

/// Splits an `iw phy` dump per radio and renders each radio's bands as an
/// HTML list, keyed by radio name.
pub fn describe_radios(iw_phy: &str) -> BTreeMap<String, String> {
    let headers: Vec<_> = WIPHY.captures_iter(iw_phy).collect();
    let mut radios = BTreeMap::new();

    for (idx, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(phy)) = (caps.get(0), caps.name("phy")) else {
            continue;
        };
        let end = headers
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(iw_phy.len(), |m| m.start());
        let body = &iw_phy[whole.end()..end];

        let mut text = format!("{} Bands:<ul>", phy.as_str());
        for band in BAND.split(body).skip(1) {
            text.push_str("<li>");
            text.push_str(&describe_band(band).join(", "));
            text.push_str("</li>\n");
        }
        text.push_str("</ul>");
        radios.insert(phy.as_str().to_string(), text);
    }

    radios
}

/// Resolves the `wifi` row from PCI adapters and radio capabilities.
pub struct WifiResolver;

impl Resolver for WifiResolver {
    fn name(&self) -> &'static str {
        "wifi"
    }

    fn resolve(&self, input: &ResolveInput<'_>, table: &mut CategoryTable) {
        let mut text = String::new();
        let adapters = pci_wireless_devices(&input.captures.lspci);
        if !adapters.is_empty() {
            text.push_str(&adapters.join("<br/>\n"));
            text.push_str("<br/>");
        }
        for radio in describe_radios(&input.captures.iw_phy).values() {
            text.push_str(radio);
        }
        table.entry("wifi").resolve(text);
    }
}

/// Resolves the `ethernet` row from PCI adapters.
pub struct EthernetResolver;

impl Resolver for EthernetResolver {
    fn name(&self) -> &'static str {
        "ethernet"
    }

    fn resolve(&self, input: &ResolveInput<'_>, table: &mut CategoryTable) {
        let adapters = pci_ethernet_devices(&input.captures.lspci);
        let ethernet = table.entry("ethernet");
        if adapters.is_empty() {
            ethernet.describe(NO_ETHERNET_TEXT);
        } else {
            ethernet.resolve(adapters.join("\n"));
        }
    }
}
