//! Report data model for laptop hardware test bundles.
//!
//! This crate defines the plain values shared by the bundle parser, the
//! storage layer and the command-line tool:
//!
//! - [`Report`]: the versioned document produced for one bundle.
//! - [`CategoryTable`]: accumulator of per-category findings, folded by
//!   hardware resolvers and test cases.
//! - [`Style`] and [`TestStatus`]: display style and raw runner outcome.
//! - [`BundleIdentity`]: listing metadata derived from system information.
//!
//! Cache reuse is decided by [`is_up_to_date`], which compares a stored
//! document's `version` with [`REPORT_FORMAT_VERSION`].
//!
//! # Example
//!
//! ```
//! use hwgrid_core::*;
//!
//! let mut table = CategoryTable::with_hardware_categories();
//! table.get_mut("cpu").unwrap().resolve("Intel(R) Core(TM) i7-8550U");
//! table.mark(ISSUES_CATEGORY, &TestStatus::Fail);
//!
//! let entries = table.to_entries();
//! assert_eq!(entries["cpu"].status, Style::Good);
//! assert_eq!(entries["issues"].kind, "Issues");
//! ```

mod category;
mod identity;
mod types;

pub use category::{
    CategoryStatus, CategoryTable, HARDWARE_CATEGORIES, ISSUES_CATEGORY, UNRESOLVED_TEXT,
    derive_status,
};
pub use identity::BundleIdentity;
pub use types::*;
