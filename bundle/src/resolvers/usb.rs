//! USB root hub generations from `lsusb -v`.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use hwgrid_core::CategoryTable;
use regex::Regex;

use super::{ResolveInput, Resolver};

// Root hubs are registered under the Linux Foundation vendor id 1d6b.
// TODO: USB 3.1 (USB-C) controllers report the same "3.0 root hub" string,
// so the newest generation is not told apart yet.
static ROOT_HUB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Bus[^:]*: ID 1d6b:.* Linux Foundation (?P<version>.*) root hub")
        .expect("static regex must compile")
});

/// Returns the distinct root hub versions, sorted.
pub fn root_hub_versions(lsusb: &str) -> BTreeSet<String> {
    ROOT_HUB
        .captures_iter(lsusb)
        .map(|caps| caps["version"].to_string())
        .collect()
}

/// Resolves the `usb` row from the root hubs present.
pub struct UsbResolver;

impl Resolver for UsbResolver {
    fn name(&self) -> &'static str {
        "usb"
    }

    fn resolve(&self, input: &ResolveInput<'_>, table: &mut CategoryTable) {
        let hubs = root_hub_versions(&input.captures.lsusb);
        if !hubs.is_empty() {
            let text = hubs.into_iter().collect::<Vec<_>>().join(", ");
            table.entry("usb").resolve(text);
        }
    }
}
