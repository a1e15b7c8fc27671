//! Fingerprint readers from the bus introspection dump.
//!
//! The dump maps each bus service to its exported objects, keyed by object
//! path. Reader objects live under the fprintd device prefix.

use std::collections::BTreeMap;

use hwgrid_core::CategoryTable;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ResolveInput, Resolver};
use crate::archive::Bundle;

const BUS_DUMP_MARKER: &str = "pre/fed-dbus-dump.py";
const READER_PREFIX: &str = "/net/reactivated/Fprint/Device/";
const READER_INTERFACE: &str = "net.reactivated.Fprint.Device";
const NO_READER_TEXT: &str = "No fingerprint reader was detected";

/// Loads the first bus dump found in the archive.
///
/// A dump that is missing or not valid JSON yields `None`; fingerprint
/// detection then reports no readers.
pub fn load_bus_dump(bundle: &Bundle) -> Option<Value> {
    let name = bundle
        .entry_names()
        .find(|name| name.contains(BUS_DUMP_MARKER))?;
    let text = match bundle.read_text(name) {
        Ok(text) => text,
        Err(error) => {
            debug!(file = name, %error, "Bus dump entry unreadable");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(dump) => Some(dump),
        Err(error) => {
            warn!(file = name, %error, "Ignoring malformed bus dump");
            None
        }
    }
}

/// Collects every object whose path starts with `prefix`, across all
/// services. Later services win when two export the same path.
pub fn find_bus_objects<'a>(dump: &'a Value, prefix: &str) -> BTreeMap<&'a str, &'a Value> {
    let mut found = BTreeMap::new();
    let Some(services) = dump.as_object() else {
        return found;
    };

    for objects in services.values().filter_map(Value::as_object) {
        for (path, object) in objects {
            if path.starts_with(prefix) {
                found.insert(path.as_str(), object);
            }
        }
    }
    found
}

fn reader_label(object: &Value) -> Option<String> {
    let props = object
        .get("interfaces")?
        .get(READER_INTERFACE)?
        .get("props")?;
    let name = props.get("name")?.as_str()?;
    let scan_type = props.get("scan-type")?.as_str()?;
    Some(format!("<li>{name} (scan type: {scan_type})</li>"))
}

/// Resolves the `fingerprint` row from fprintd device objects.
pub struct FingerprintResolver;

impl Resolver for FingerprintResolver {
    fn name(&self) -> &'static str {
        "fingerprint"
    }

    fn resolve(&self, input: &ResolveInput<'_>, table: &mut CategoryTable) {
        let readers = input
            .bus_dump
            .map(|dump| find_bus_objects(dump, READER_PREFIX))
            .unwrap_or_default();

        let row = table.entry("fingerprint");
        if readers.is_empty() {
            row.describe(NO_READER_TEXT);
            return;
        }

        let mut text = String::from("Available fingerprint readers:<ul>");
        for (path, object) in readers {
            match reader_label(object) {
                Some(label) => text.push_str(&label),
                None => debug!(path, "Reader object lacks name or scan type"),
            }
        }
        text.push_str("</ul>");
        row.resolve(text);
    }
}
