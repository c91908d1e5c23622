//! Device registry: the in-process [`Manager`].
//!
//! Holds every registered device by id, hands devices a non-owning
//! back-reference to itself and turns their notifications into
//! [`DeviceEvent`]s on an [`EventPublisher`].
//!
//! Cached placeholders are registered first; when a live device with the
//! same type string and local id attaches it takes the placeholder's place
//! and identity.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use devicehub_domain::command::FailureReason;
use devicehub_domain::event::DeviceEvent;
use devicehub_domain::id::DeviceId;
use devicehub_domain::method::Method;
use devicehub_domain::sensor::{Scale, SensorValueType};
use devicehub_domain::settings::DeviceSettings;
use devicehub_domain::state::StateValue;

use crate::cached_device::CachedDevice;
use crate::command::{Command, IgnoreSet};
use crate::device::Device;
use crate::ports::{EventPublisher, Integration, Manager};

/// Registered devices plus the publisher their notifications go to.
pub struct DeviceRegistry<P> {
    devices: RwLock<BTreeMap<DeviceId, Arc<dyn Device>>>,
    publisher: P,
    this: Weak<Self>,
}

impl<P> DeviceRegistry<P>
where
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create an empty registry publishing to `publisher`.
    pub fn new(publisher: P) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            devices: RwLock::new(BTreeMap::new()),
            publisher,
            this: this.clone(),
        })
    }

    /// Register cached placeholders from persisted records.
    ///
    /// Records that carry an id are registered first, so a record without
    /// one never takes an id a later record owns. Records that do not
    /// parse, or whose id is already taken, are logged and skipped. Returns
    /// how many placeholders were registered.
    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub fn load_cached(&self, records: Vec<serde_json::Value>) -> usize {
        let (identified, anonymous): (Vec<_>, Vec<_>) = records
            .into_iter()
            .filter_map(|record| match DeviceSettings::from_value(record) {
                Ok(settings) => Some(settings),
                Err(error) => {
                    tracing::warn!(%error, "skipping malformed cached device");
                    None
                }
            })
            .partition(|settings| settings.id.is_assigned());
        let restored = identified
            .into_iter()
            .chain(anonymous)
            .map(|settings| self.restore(settings))
            .filter(|registered| *registered)
            .count();
        tracing::info!(restored, "cached devices loaded");
        restored
    }

    /// Register one cached placeholder. Returns whether it was registered.
    pub fn restore(&self, settings: DeviceSettings) -> bool {
        let id = settings.id;
        let cached: Arc<dyn Device> = match CachedDevice::from_settings(settings) {
            Ok(cached) => Arc::new(cached),
            Err(error) => {
                tracing::warn!(device_id = %id, %error, "skipping invalid cached device");
                return false;
            }
        };

        let mut devices = self.write();
        let id = if id.is_assigned() {
            if devices.contains_key(&id) {
                tracing::warn!(device_id = %id, "cached device id already taken, skipping");
                return false;
            }
            id
        } else {
            let Some(id) = next_free_id(&devices) else {
                tracing::error!("no free device id left, skipping cached device");
                return false;
            };
            cached.set_id(id);
            id
        };
        cached.set_manager(self.manager_ref());
        devices.insert(id, cached);
        true
    }

    /// Register a live device.
    ///
    /// An unconfirmed placeholder with the same type string and local id is
    /// merged into `device` and replaced by it. Otherwise the device keeps
    /// the id it already carries or gets the next free one.
    ///
    /// Returns `None`, leaving the registry untouched, when every id is
    /// taken.
    #[tracing::instrument(skip_all, fields(type_string = device.type_string(), local_id = %device.local_id()))]
    pub fn add_device(&self, device: Arc<dyn Device>) -> Option<DeviceId> {
        let id = {
            let mut devices = self.write();
            let type_string = device.type_string();
            let local_id = device.local_id();
            let placeholder = devices
                .values()
                .find(|d| {
                    !d.confirmed() && d.type_string() == type_string && d.local_id() == local_id
                })
                .cloned();

            if let Some(old) = placeholder {
                device.load_cached(old.as_ref());
                tracing::debug!(device_id = %old.id(), "live device replaces cached device");
            } else if !device.id().is_assigned() || devices.contains_key(&device.id()) {
                let Some(id) = next_free_id(&devices) else {
                    tracing::error!("no free device id left, refusing device");
                    return None;
                };
                device.set_id(id);
            }
            let id = device.id();
            device.set_manager(self.manager_ref());
            devices.insert(id, Arc::clone(&device));
            id
        };
        tracing::info!(device_id = %id, name = %device.name(), "device added");
        self.save();
        Some(id)
    }

    /// Register every device of `integration`, in order. Returns the ids of
    /// the devices that were registered.
    #[tracing::instrument(skip_all, fields(integration = integration.name()))]
    pub fn attach(&self, integration: &impl Integration) -> Vec<DeviceId> {
        integration
            .devices()
            .into_iter()
            .filter_map(|device| self.add_device(device))
            .collect()
    }

    /// Every registered device, ordered by id.
    #[must_use]
    pub fn devices(&self) -> Vec<Arc<dyn Device>> {
        self.read().values().cloned().collect()
    }

    /// The persisted form of every registered device, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DeviceSettings> {
        self.devices().iter().map(|d| d.to_settings()).collect()
    }

    /// Run `command` on the device with `id`. Returns `false` when there is
    /// no such device.
    pub fn command(&self, id: DeviceId, command: Command) -> bool {
        let Some(device) = self.device(id) else {
            tracing::warn!(device_id = %id, "command for unknown device");
            return false;
        };
        device.command(command, &mut IgnoreSet::new());
        true
    }

    fn manager_ref(&self) -> Weak<dyn Manager> {
        self.this.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<DeviceId, Arc<dyn Device>>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<DeviceId, Arc<dyn Device>>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The id after the highest one in use or, once that is exhausted, the
/// lowest unused id.
fn next_free_id(devices: &BTreeMap<DeviceId, Arc<dyn Device>>) -> Option<DeviceId> {
    let last = devices
        .keys()
        .next_back()
        .copied()
        .unwrap_or(DeviceId::UNASSIGNED);
    if last.get() < u32::MAX {
        return Some(last.next());
    }
    (1..=u32::MAX)
        .map(DeviceId::new)
        .find(|id| !devices.contains_key(id))
}

impl<P> Manager for DeviceRegistry<P>
where
    P: EventPublisher + Send + Sync + 'static,
{
    fn device(&self, id: DeviceId) -> Option<Arc<dyn Device>> {
        self.read().get(&id).cloned()
    }

    fn save(&self) {
        self.publisher.publish(DeviceEvent::SaveRequested);
    }

    fn state_updated(&self, device: &dyn Device, ack: Option<u64>, origin: Option<&str>) {
        let (state, state_value) = device.state();
        self.publisher.publish(DeviceEvent::StateChanged {
            device_id: device.id(),
            state,
            state_value,
            ack,
            origin: origin.map(str::to_string),
        });
    }

    fn state_updated_fail(
        &self,
        device: &dyn Device,
        state: Method,
        state_value: &StateValue,
        reason: FailureReason,
        origin: Option<&str>,
    ) {
        self.publisher.publish(DeviceEvent::StateFailed {
            device_id: device.id(),
            state,
            state_value: state_value.clone(),
            reason,
            origin: origin.map(str::to_string),
        });
    }

    fn sensor_value_updated(
        &self,
        device: &dyn Device,
        value_type: SensorValueType,
        value: &str,
        scale: Scale,
    ) {
        self.publisher.publish(DeviceEvent::SensorValueUpdated {
            device_id: device.id(),
            value_type,
            value: value.to_string(),
            scale,
        });
    }

    fn device_param_updated(&self, device: &dyn Device, param: &str) {
        self.publisher.publish(DeviceEvent::ParamUpdated {
            device_id: device.id(),
            param: param.to_string(),
        });
    }
}
