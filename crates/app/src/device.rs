//! Device: the base every transport plugin specializes.
//!
//! A plugin implements [`Device`] for its own type: it describes what the
//! device is (type string, capabilities, parameters) and how a resolved
//! command reaches the hardware ([`Device::execute`]). Identity, state,
//! sensor readings and the manager back-reference live in a [`DeviceCore`]
//! the plugin embeds and exposes through [`Device::core`].
//!
//! Behaviour common to all devices is implemented on `dyn Device` so plugins
//! cannot override it: see [`store`](crate::store), [`graph`](crate::graph),
//! [`command`](crate::command) and [`cached_device`](crate::cached_device).

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use devicehub_domain::battery::Battery;
use devicehub_domain::command::{CommandValue, FailureReason};
use devicehub_domain::device_type::DeviceType;
use devicehub_domain::error::ExecuteError;
use devicehub_domain::id::DeviceId;
use devicehub_domain::method::Method;
use devicehub_domain::sensor::{Scale, SensorReading, SensorTable, SensorValueType};
use devicehub_domain::settings::{LocalId, Params};
use devicehub_domain::state::{DeviceState, StateValue};
use devicehub_domain::time::Timestamp;

use crate::command::{Completion, IgnoreSet};
use crate::ports::Manager;

/// A reference to a containing device: a handle, or an id resolved through
/// the manager.
#[derive(Clone)]
pub enum DeviceRef {
    Handle(Arc<dyn Device>),
    Id(DeviceId),
}

impl From<Arc<dyn Device>> for DeviceRef {
    fn from(device: Arc<dyn Device>) -> Self {
        Self::Handle(device)
    }
}

impl From<DeviceId> for DeviceRef {
    fn from(id: DeviceId) -> Self {
        Self::Id(id)
    }
}

impl std::fmt::Debug for DeviceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handle(device) => f.debug_tuple("Handle").field(&device.id()).finish(),
            Self::Id(id) => f.debug_tuple("Id").field(id).finish(),
        }
    }
}

/// The extension point every plugin implements.
///
/// Only [`core`](Self::core) is required; every other method has the
/// behaviour of a device that can do nothing.
pub trait Device: Send + Sync {
    /// Shared identity, state and sensor storage.
    fn core(&self) -> &DeviceCore;

    /// Transport type of the device. All devices of one plugin share it.
    fn type_string(&self) -> &str {
        ""
    }

    /// Identifier unique within the plugin's [`type_string`](Self::type_string).
    fn local_id(&self) -> LocalId {
        LocalId::default()
    }

    /// Supported methods, OR-ed together.
    fn methods(&self) -> Method {
        Method::NONE
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Unknown
    }

    fn model(&self) -> &str {
        "n/a"
    }

    fn protocol(&self) -> &str {
        self.type_string()
    }

    fn is_sensor(&self) -> bool {
        false
    }

    fn is_device(&self) -> bool {
        !self.is_sensor()
    }

    fn battery(&self) -> Option<Battery> {
        None
    }

    /// Static parameters describing the device, never its current state.
    fn parameters(&self) -> Params {
        Params::new()
    }

    /// Parameters stored with the device and restored from the cache.
    fn params(&self) -> Params {
        Params::new()
    }

    fn set_params(&self, _params: Params) {}

    /// Values set by the user about this device.
    fn metadata(&self) -> Params {
        Params::new()
    }

    /// Whether the hub gave up on this device ever coming back.
    fn declared_dead(&self) -> Option<bool> {
        None
    }

    /// Devices this one groups or represents.
    fn containing_devices(&self) -> Vec<DeviceRef> {
        Vec::new()
    }

    /// Carry out a resolved command.
    ///
    /// Implementations must resolve `completion` exactly once, inline or
    /// later from any thread. Devices that forward the command to others
    /// pass `ignore` along unchanged. Returning an error counts as a failure
    /// with an unspecified reason. A panic is not contained: it unwinds into
    /// the caller of [`command`](crate::command).
    ///
    /// # Errors
    ///
    /// Returns an [`ExecuteError`] when the command could not be handed to
    /// the transport.
    fn execute(
        &self,
        _method: Method,
        _value: CommandValue,
        completion: Completion,
        _ignore: &mut IgnoreSet,
    ) -> Result<(), ExecuteError> {
        completion.fail(FailureReason::UNSPECIFIED);
        Ok(())
    }
}

/// Mutable data shared by every device.
#[derive(Debug, Clone)]
pub(crate) struct CoreData {
    pub(crate) id: DeviceId,
    pub(crate) name: Option<String>,
    pub(crate) state: DeviceState,
    pub(crate) ignored: Option<bool>,
    pub(crate) confirmed: bool,
    pub(crate) load_count: u32,
    pub(crate) sensors: SensorTable,
}

/// Identity, state, sensor readings and manager back-reference of a device.
pub struct DeviceCore {
    data: Mutex<CoreData>,
    manager: OnceLock<Weak<dyn Manager>>,
}

impl Default for DeviceCore {
    fn default() -> Self {
        Self::with_confirmed(true)
    }
}

impl DeviceCore {
    /// Core of a live device, confirmed by its transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Core of a live device that already has a display name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let core = Self::default();
        core.lock().name = Some(name.into());
        core
    }

    pub(crate) fn with_confirmed(confirmed: bool) -> Self {
        Self {
            data: Mutex::new(CoreData {
                id: DeviceId::UNASSIGNED,
                name: None,
                state: DeviceState::default(),
                ignored: None,
                confirmed,
                load_count: 0,
                sensors: SensorTable::default(),
            }),
            manager: OnceLock::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, CoreData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn manager(&self) -> Option<Arc<dyn Manager>> {
        self.manager.get().and_then(Weak::upgrade)
    }

    pub(crate) fn set_manager(&self, manager: Weak<dyn Manager>) -> bool {
        self.manager.set(manager).is_ok()
    }
}

impl std::fmt::Debug for DeviceCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCore")
            .field("data", &*self.lock())
            .field("has_manager", &self.manager.get().is_some())
            .finish()
    }
}

impl dyn Device + '_ {
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.core().lock().id
    }

    pub fn set_id(&self, id: DeviceId) {
        self.core().lock().id = id;
    }

    /// Display name, or a label synthesized from the id when none was set.
    #[must_use]
    pub fn name(&self) -> String {
        let (id, name) = {
            let data = self.core().lock();
            (data.id, data.name.clone())
        };
        name.unwrap_or_else(|| {
            let kind = if self.is_sensor() { "Sensor" } else { "Device" };
            format!("{kind} {id}")
        })
    }

    /// Current `(state, state_value)`.
    #[must_use]
    pub fn state(&self) -> (Method, StateValue) {
        let data = self.core().lock();
        (data.state.state, data.state.state_value.clone())
    }

    /// When a state change was last accepted.
    #[must_use]
    pub fn last_updated(&self) -> Option<Timestamp> {
        self.core().lock().state.last_updated
    }

    #[must_use]
    pub fn ignored(&self) -> Option<bool> {
        self.core().lock().ignored
    }

    /// Whether the transport acknowledges this device exists.
    #[must_use]
    pub fn confirmed(&self) -> bool {
        self.core().lock().confirmed
    }

    /// How many times this device was reloaded from the cache without its
    /// live counterpart attaching.
    #[must_use]
    pub fn load_count(&self) -> u32 {
        self.core().lock().load_count
    }

    /// Numeric value of a reading; `None` when there is no such reading.
    #[must_use]
    pub fn sensor_value(&self, value_type: SensorValueType, scale: Scale) -> Option<f64> {
        self.core().lock().sensors.value(value_type, scale)
    }

    #[must_use]
    pub fn sensor_reading(&self, value_type: SensorValueType, scale: Scale) -> Option<SensorReading> {
        self.core().lock().sensors.get(value_type, scale).cloned()
    }

    /// Copy of every reading this device has received.
    #[must_use]
    pub fn sensor_values(&self) -> SensorTable {
        self.core().lock().sensors.clone()
    }

    /// [`parameters`](Device::parameters) plus the device type.
    #[must_use]
    pub fn all_parameters(&self) -> Params {
        let mut params = self.parameters();
        params.insert(
            "devicetype".to_string(),
            serde_json::Value::from(self.device_type().as_str()),
        );
        params
    }

    /// The manager this device reports to, if it is registered and alive.
    #[must_use]
    pub fn manager(&self) -> Option<Arc<dyn Manager>> {
        self.core().manager()
    }

    /// Attach the device to its manager. Only the first call has an effect.
    pub fn set_manager(&self, manager: Weak<dyn Manager>) {
        if !self.core().set_manager(manager) {
            tracing::warn!(device_id = %self.id(), "device already has a manager");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A plain device with the default behaviour.
    #[derive(Default)]
    pub(crate) struct PlainDevice {
        pub(crate) core: DeviceCore,
    }

    impl Device for PlainDevice {
        fn core(&self) -> &DeviceCore {
            &self.core
        }
    }

    /// A device that only reports readings.
    #[derive(Default)]
    struct PlainSensor {
        core: DeviceCore,
    }

    impl Device for PlainSensor {
        fn core(&self) -> &DeviceCore {
            &self.core
        }

        fn is_sensor(&self) -> bool {
            true
        }
    }

    #[test]
    fn should_synthesize_name_from_id_when_unset() {
        let device: Arc<dyn Device> = Arc::new(PlainDevice::default());
        device.set_id(DeviceId::new(5));
        assert_eq!(device.name(), "Device 5");
    }

    #[test]
    fn should_synthesize_sensor_label_for_sensors() {
        let sensor: Arc<dyn Device> = Arc::new(PlainSensor::default());
        sensor.set_id(DeviceId::new(8));
        assert_eq!(sensor.name(), "Sensor 8");
        assert!(!sensor.is_device());
    }

    #[test]
    fn should_start_confirmed_and_off() {
        let device: Arc<dyn Device> = Arc::new(PlainDevice::default());
        assert!(device.confirmed());
        assert_eq!(device.state(), (Method::TURNOFF, StateValue::default()));
        assert_eq!(device.ignored(), None);
        assert_eq!(device.load_count(), 0);
        assert!(device.manager().is_none());
    }

    #[test]
    fn should_add_device_type_to_all_parameters() {
        let device: Arc<dyn Device> = Arc::new(PlainDevice::default());
        let params = device.all_parameters();
        assert_eq!(
            params["devicetype"],
            serde_json::json!(DeviceType::Unknown.as_str())
        );
    }

    #[test]
    fn should_use_defaults_for_descriptive_queries() {
        let device: Arc<dyn Device> = Arc::new(PlainDevice::default());
        assert_eq!(device.type_string(), "");
        assert_eq!(device.protocol(), "");
        assert_eq!(device.model(), "n/a");
        assert_eq!(device.methods(), Method::NONE);
        assert_eq!(device.local_id(), LocalId::Number(0));
        assert!(device.battery().is_none());
        assert!(device.containing_devices().is_empty());
    }
}
