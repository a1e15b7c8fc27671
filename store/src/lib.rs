//! Storage layer for hwgrid: ingested bundle archives, cached reports and
//! the YAML configuration tying them together.
//!
//! # Quick start
//!
//! ```no_run
//! use hwgrid_bundle::{NoDocs, report_for};
//! use hwgrid_store::{BundleStore, DirReportCache, GridConfig, StoreError};
//!
//! let config = GridConfig::load("hwgrid.yaml").unwrap();
//! let store = BundleStore::open(&config.storage.bundles_dir).unwrap();
//! let cache = DirReportCache::new(&config.storage.cache_dir);
//!
//! for stored in store.list().unwrap() {
//!     let report = report_for::<_, StoreError>(&cache, &stored.id, || store.read(&stored.id), &NoDocs, false)
//!         .unwrap();
//!     println!("{}: {} tests", stored.id, report.tests.len());
//! }
//! ```

mod bundles;
mod cache;
mod config;
mod error;

pub use bundles::{BundleStore, StoredBundle, storage_id};
pub use cache::DirReportCache;
pub use config::{GridConfig, ParseConfig, StorageConfig};
pub use error::{Result, StoreError};
