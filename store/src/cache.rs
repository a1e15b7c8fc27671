//! File-backed report cache, one `<id>.json` document per bundle.

use std::fs;
use std::path::PathBuf;

use hwgrid_bundle::ReportCache;
use hwgrid_core::Report;
use serde_json::Value;
use tracing::{debug, warn};

/// Report cache stored as pretty-printed JSON files in one directory.
#[derive(Debug, Clone)]
pub struct DirReportCache {
    cache_dir: PathBuf,
}

impl DirReportCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.cache_dir.join(format!("{id}.json"))
    }

    /// Drops the cached report for `id`, if any.
    pub fn invalidate(&self, id: &str) {
        if let Err(error) = fs::remove_file(self.entry_path(id)) {
            debug!(id, %error, "No cached report removed");
        }
    }
}

impl ReportCache for DirReportCache {
    fn load(&self, id: &str) -> Option<Value> {
        let raw = fs::read_to_string(self.entry_path(id)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(document) => Some(document),
            Err(error) => {
                debug!(id, %error, "Cached report is not valid JSON");
                None
            }
        }
    }

    fn store(&self, id: &str, report: &Report) {
        if let Err(error) = fs::create_dir_all(&self.cache_dir) {
            warn!(dir = %self.cache_dir.display(), %error, "Cannot create cache directory");
            return;
        }
        let json = match serde_json::to_string_pretty(report) {
            Ok(json) => json,
            Err(error) => {
                warn!(id, %error, "Failed to serialize report");
                return;
            }
        };
        if let Err(error) = fs::write(self.entry_path(id), json) {
            warn!(id, %error, "Failed to write cached report");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwgrid_core::is_up_to_date;

    #[test]
    fn test_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DirReportCache::new(dir.path().join("cache"));
        assert!(cache.load("b1").is_none());

        let mut report = Report::empty();
        report.testruns.push("run1".to_string());
        cache.store("b1", &report);

        let document = cache.load("b1").unwrap();
        assert!(is_up_to_date(Some(&document)));
        let loaded: Report = serde_json::from_value(document).unwrap();
        assert_eq!(loaded, report);

        cache.invalidate("b1");
        assert!(cache.load("b1").is_none());
    }

    #[test]
    fn test_garbage_file_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b1.json"), "{ not json").unwrap();
        let cache = DirReportCache::new(dir.path());
        assert!(cache.load("b1").is_none());
    }
}
