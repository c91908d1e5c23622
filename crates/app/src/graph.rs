//! Containing-device graph: groups and the devices they stand for.

use std::collections::HashSet;
use std::sync::Arc;

use crate::device::{Device, DeviceRef};

impl dyn Device + '_ {
    /// Every device reachable through [`containing_devices`](Device::containing_devices),
    /// recursively, each exactly once and never `self`.
    ///
    /// Integer references are resolved through the manager; ones that do not
    /// resolve are skipped. Cycles terminate.
    #[must_use]
    pub fn flatten_containing_devices(&self) -> Vec<Arc<dyn Device>> {
        let manager = self.manager();
        let mut pending = self.containing_devices();
        let mut seen = HashSet::new();
        let mut flattened = Vec::new();

        while let Some(reference) = pending.pop() {
            let device = match reference {
                DeviceRef::Handle(device) => device,
                DeviceRef::Id(id) => {
                    let Some(device) = manager.as_ref().and_then(|m| m.device(id)) else {
                        tracing::debug!(device_id = %self.id(), contained = %id, "unresolved containing device");
                        continue;
                    };
                    device
                }
            };
            if std::ptr::addr_eq(Arc::as_ptr(&device), std::ptr::from_ref(self)) {
                continue;
            }
            if !seen.insert(device.id()) {
                continue;
            }
            pending.extend(device.containing_devices());
            flattened.push(device);
        }
        flattened
    }
}
