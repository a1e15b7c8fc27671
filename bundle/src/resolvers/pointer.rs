//! Pointer devices from `libinput list-devices`.

use std::collections::BTreeMap;

use hwgrid_core::CategoryTable;
use tracing::debug;

use super::{ResolveInput, Resolver};

/// One device block: lower-cased keys mapped to trimmed values.
pub type InputDevice = BTreeMap<String, String>;

/// Splits a device listing into blank-line separated key/value blocks.
///
/// Parsing stops at the first line that is not `key: value`; blocks
/// completed before that line are kept, the block in progress and anything
/// after it are dropped. Blocks without a `device` key are ignored.
pub fn parse_input_devices(text: &str) -> Vec<InputDevice> {
    let mut devices = Vec::new();
    let mut device = InputDevice::new();

    for line in text.split('\n') {
        if line.is_empty() {
            if device.contains_key("device") {
                devices.push(std::mem::take(&mut device));
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            debug!(line, "Malformed input device line, stopping");
            return devices;
        };
        device.insert(key.to_lowercase(), value.trim().to_string());
    }

    if device.contains_key("device") {
        devices.push(device);
    }
    devices
}

/// Resolves the `pointer` row with the names of pointer-capable devices.
pub struct PointerResolver;

impl Resolver for PointerResolver {
    fn name(&self) -> &'static str {
        "pointer"
    }

    fn resolve(&self, input: &ResolveInput<'_>, table: &mut CategoryTable) {
        let pointers: Vec<String> = parse_input_devices(&input.captures.input_devices)
            .into_iter()
            .filter(|dev| {
                dev.get("capabilities")
                    .is_some_and(|caps| caps.contains("pointer"))
            })
            .filter_map(|mut dev| dev.remove("device"))
            .collect();

        if !pointers.is_empty() {
            table.entry("pointer").resolve(pointers.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Device:           Power Button
Kernel:           /dev/input/event2
Capabilities:     keyboard

Device:           SynPS/2 Synaptics TouchPad
Kernel:           /dev/input/event5
Capabilities:     pointer gesture
Tap-to-click:     disabled

Device:           TPPS/2 IBM TrackPoint
Capabilities:     pointer
";

    #[test]
    fn test_parse_blocks() {
        let devices = parse_input_devices(LISTING);
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[1]["device"], "SynPS/2 Synaptics TouchPad");
        assert_eq!(devices[1]["tap-to-click"], "disabled");
        assert_eq!(devices[2]["capabilities"], "pointer");
    }

    #[test]
    fn test_malformed_line_keeps_completed_blocks_only() {
        let text = "\
Device: Keyboard
Capabilities: keyboard

Device: Touchpad
garbage without separator
Capabilities: pointer

Device: Mouse
Capabilities: pointer
";
        let devices = parse_input_devices(text);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0]["device"], "Keyboard");
    }

    #[test]
    fn test_blocks_without_device_are_ignored() {
        let devices = parse_input_devices("Kernel: /dev/input/event0\n\nDevice: Pen\n");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0]["device"], "Pen");
    }
}
