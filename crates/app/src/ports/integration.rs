//! Integration port: a plugin that contributes live devices.
//!
//! An integration bridges an external transport (radio, mesh, IP, virtual)
//! into the hub. Its devices implement [`Device`] and carry their own
//! executor; the hub only attaches them.

use std::sync::Arc;

use crate::device::Device;

/// A pluggable device integration.
///
/// Implementations live in adapter crates (e.g. `adapter_virtual`).
pub trait Integration {
    /// Unique name identifying this integration (e.g. `"virtual"`).
    fn name(&self) -> &'static str;

    /// The live devices this integration currently provides.
    ///
    /// Devices are attached in order, so a device a later one refers to by
    /// handle is already registered when the later one attaches.
    fn devices(&self) -> Vec<Arc<dyn Device>>;
}
