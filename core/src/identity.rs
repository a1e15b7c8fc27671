//! Identity of an ingested bundle, derived from its system information.

use serde::{Deserialize, Serialize};

use crate::types::SysinfoMap;

const UNKNOWN_OS: &str = "Unknown OS";

/// Listing metadata for one stored bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleIdentity {
    pub manufacturer: String,
    pub product: String,
    pub os: String,
    /// Name of the bundle's main run directory.
    pub unique_identifier: String,
}

impl BundleIdentity {
    /// Builds the identity from extracted system information.
    ///
    /// The product prefers the DMI `Version` field (laptop vendors often put
    /// the marketing name there) and falls back to `Product Name`. Returns
    /// `None` when the manufacturer or both product fields are missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwgrid_core::{BundleIdentity, SysinfoMap};
    ///
    /// let mut sysinfo = SysinfoMap::new();
    /// sysinfo.insert("Manufacturer".into(), "LENOVO".into());
    /// sysinfo.insert("Product Name".into(), "20HRCTO1WW".into());
    /// sysinfo.insert("Version".into(), "ThinkPad X1 Carbon".into());
    ///
    /// let identity = BundleIdentity::from_sysinfo(&sysinfo, "run2").unwrap();
    /// assert_eq!(identity.product, "ThinkPad X1 Carbon");
    /// assert_eq!(identity.os, "Unknown OS");
    /// ```
    pub fn from_sysinfo(sysinfo: &SysinfoMap, unique_identifier: &str) -> Option<Self> {
        let manufacturer = sysinfo.get("Manufacturer")?.clone();
        let product = sysinfo
            .get("Version")
            .or_else(|| sysinfo.get("Product Name"))?
            .clone();
        let os = sysinfo
            .get("OS")
            .cloned()
            .unwrap_or_else(|| UNKNOWN_OS.to_string());

        Some(Self {
            manufacturer,
            product,
            os,
            unique_identifier: unique_identifier.to_string(),
        })
    }
}
