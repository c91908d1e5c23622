//! Manager port: the hub-side collaborator every device reports to.
//!
//! A device holds a non-owning reference to its manager, set once when it is
//! registered. The manager resolves integer device references and receives
//! notifications; all calls are expected to return promptly.

use std::sync::Arc;

use devicehub_domain::command::FailureReason;
use devicehub_domain::id::DeviceId;
use devicehub_domain::method::Method;
use devicehub_domain::sensor::{Scale, SensorValueType};
use devicehub_domain::state::StateValue;

use crate::device::Device;

/// Hub-side collaborator of a device.
pub trait Manager: Send + Sync {
    /// Resolve an integer reference to a registered device.
    fn device(&self, id: DeviceId) -> Option<Arc<dyn Device>>;

    /// Persist current state. Fire-and-forget.
    fn save(&self);

    /// A new state was accepted by `device`.
    fn state_updated(&self, device: &dyn Device, ack: Option<u64>, origin: Option<&str>);

    /// A state transition of `device` failed.
    fn state_updated_fail(
        &self,
        device: &dyn Device,
        state: Method,
        state_value: &StateValue,
        reason: FailureReason,
        origin: Option<&str>,
    );

    /// A sensor reading of `device` was accepted.
    fn sensor_value_updated(
        &self,
        device: &dyn Device,
        value_type: SensorValueType,
        value: &str,
        scale: Scale,
    );

    /// A descriptive parameter of `device` changed.
    fn device_param_updated(&self, device: &dyn Device, param: &str);
}
