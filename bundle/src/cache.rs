//! Version-gated report reuse.
//!
//! Reports are cached per bundle identifier. A cached document is reused
//! only while its `version` matches [`REPORT_FORMAT_VERSION`]; anything else
//! triggers a full re-parse of the archive.
//!
//! [`REPORT_FORMAT_VERSION`]: hwgrid_core::REPORT_FORMAT_VERSION

use std::collections::HashMap;
use std::sync::Mutex;

use hwgrid_core::{Report, is_up_to_date};
use serde_json::Value;
use tracing::{debug, warn};

use crate::docs::DocLookup;
use crate::error::BundleError;

/// Storage for the last report produced per bundle.
///
/// Both operations are best effort: a cache that cannot be read behaves as
/// empty, and a failed store is logged by the implementation.
pub trait ReportCache: Send + Sync {
    /// Returns the stored document for `id`, if any.
    fn load(&self, id: &str) -> Option<Value>;

    /// Replaces the stored document for `id`.
    fn store(&self, id: &str, report: &Report);
}

/// Process-local cache, mostly useful in tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw document, bypassing report serialization.
    pub fn insert_raw(&self, id: &str, document: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(id.to_string(), document);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportCache for MemoryCache {
    fn load(&self, id: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(id).cloned()
    }

    fn store(&self, id: &str, report: &Report) {
        match serde_json::to_value(report) {
            Ok(document) => self.insert_raw(id, document),
            Err(error) => warn!(id, %error, "Failed to serialize report"),
        }
    }
}

/// Returns the cached report for `id` when it is current, otherwise parses
/// the bundle from `load_bytes`, caches the result and returns it.
///
/// `force` skips the cache lookup. A cached document that passes the
/// version check but no longer deserializes is treated as stale.
///
/// # Errors
///
/// Fails when the archive cannot be loaded or parsed.
pub fn report_for<F, E>(
    cache: &dyn ReportCache,
    id: &str,
    load_bytes: F,
    docs: &dyn DocLookup,
    force: bool,
) -> Result<Report, E>
where
    F: FnOnce() -> Result<Vec<u8>, E>,
    E: From<BundleError>,
{
    if !force {
        let cached = cache.load(id);
        if is_up_to_date(cached.as_ref()) {
            match cached.map(serde_json::from_value::<Report>) {
                Some(Ok(report)) => {
                    debug!(id, "Using cached report");
                    return Ok(report);
                }
                Some(Err(error)) => warn!(id, %error, "Cached report unreadable, regenerating"),
                None => {}
            }
        } else {
            debug!(id, "Cached report missing or stale");
        }
    }

    let bytes = load_bytes()?;
    let report = crate::parse_bundle(&bytes, docs)?;
    cache.store(id, &report);
    Ok(report)
}
