//! Hardware category resolvers.
//!
//! Each resolver fills one or more rows of the [`CategoryTable`] from system
//! captures and power samples. Resolvers are independent of each other and
//! run exactly once per bundle, after system information and power profiles
//! have been extracted.

pub mod fingerprint;
pub mod network;
pub mod platform;
pub mod pointer;
pub mod usb;

use hwgrid_core::{CategoryTable, SysinfoMap};
use serde_json::Value;
use tracing::debug;

use crate::archive::{Bundle, CapturePhase};
use crate::error::Result;
use crate::power::PowerSample;

/// Raw command captures consumed by the resolvers.
#[derive(Debug, Clone, Default)]
pub struct Captures {
    /// `libinput list-devices` output.
    pub input_devices: String,
    /// `lsusb -v` output.
    pub lsusb: String,
    /// `lspci -vvnn` output.
    pub lspci: String,
    /// `iw phy` output.
    pub iw_phy: String,
}

impl Captures {
    /// Reads the required captures from the main run.
    ///
    /// # Errors
    ///
    /// Returns [`MissingEntry`](crate::BundleError::MissingEntry) for the
    /// first capture that is absent.
    pub fn read(bundle: &Bundle) -> Result<Self> {
        Ok(Self {
            input_devices: bundle.read_capture("libinput-list-devices", CapturePhase::Pre)?,
            lsusb: bundle.read_capture("lsusb_-v", CapturePhase::Pre)?,
            lspci: bundle.read_capture("lspci_-vvnn", CapturePhase::Pre)?,
            iw_phy: bundle.read_capture("iw_phy", CapturePhase::Pre)?,
        })
    }
}

/// Everything a resolver may look at.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    pub sysinfo: &'a SysinfoMap,
    pub samples: &'a [PowerSample],
    pub captures: &'a Captures,
    /// Parsed bus introspection dump, when the bundle has a usable one.
    pub bus_dump: Option<&'a Value>,
}

/// One independent routine writing findings into the category table.
pub trait Resolver {
    fn name(&self) -> &'static str;
    fn resolve(&self, input: &ResolveInput<'_>, table: &mut CategoryTable);
}

/// Resolves the `cpu` row from the extracted CPU model.
pub struct CpuResolver;

impl Resolver for CpuResolver {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn resolve(&self, input: &ResolveInput<'_>, table: &mut CategoryTable) {
        if let Some(model) = input.sysinfo.get("CPU") {
            table.entry("cpu").resolve(model.clone());
        }
    }
}

/// Runs every resolver once, in a fixed order.
pub fn resolve_hardware(input: &ResolveInput<'_>, table: &mut CategoryTable) {
    let resolvers: [&dyn Resolver; 7] = [
        &CpuResolver,
        &pointer::PointerResolver,
        &usb::UsbResolver,
        &network::WifiResolver,
        &network::EthernetResolver,
        &platform::PlatformResolver,
        &fingerprint::FingerprintResolver,
    ];

    for resolver in resolvers {
        debug!(resolver = resolver.name(), "Running hardware resolver");
        resolver.resolve(input, table);
    }
}
