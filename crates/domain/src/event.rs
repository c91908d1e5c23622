//! Event: a record of something a device reported to its manager.

use serde::Serialize;

use crate::command::FailureReason;
use crate::id::DeviceId;
use crate::method::Method;
use crate::sensor::{Scale, SensorValueType};
use crate::state::StateValue;

/// Notification emitted by the hub when a device reports to its manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// A new state was accepted.
    StateChanged {
        device_id: DeviceId,
        state: Method,
        state_value: StateValue,
        #[serde(skip_serializing_if = "Option::is_none")]
        ack: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
    },
    /// A state transition was attempted and failed.
    StateFailed {
        device_id: DeviceId,
        state: Method,
        state_value: StateValue,
        reason: FailureReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
    },
    /// A sensor reading was accepted.
    SensorValueUpdated {
        device_id: DeviceId,
        value_type: SensorValueType,
        value: String,
        scale: Scale,
    },
    /// A descriptive parameter (such as the name) changed.
    ParamUpdated { device_id: DeviceId, param: String },
    /// Something changed that should be persisted.
    SaveRequested,
}

impl DeviceEvent {
    /// Device the event is about, if any.
    #[must_use]
    pub fn device_id(&self) -> Option<DeviceId> {
        match self {
            Self::StateChanged { device_id, .. }
            | Self::StateFailed { device_id, .. }
            | Self::SensorValueUpdated { device_id, .. }
            | Self::ParamUpdated { device_id, .. } => Some(*device_id),
            Self::SaveRequested => None,
        }
    }
}

impl std::fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StateChanged {
                device_id, state, ..
            } => write!(f, "state_changed({device_id}, {state})"),
            Self::StateFailed {
                device_id, reason, ..
            } => write!(f, "state_failed({device_id}, reason {reason})"),
            Self::SensorValueUpdated {
                device_id,
                value_type,
                value,
                ..
            } => write!(f, "sensor_value_updated({device_id}, {value_type}={value})"),
            Self::ParamUpdated { device_id, param } => {
                write!(f, "param_updated({device_id}, {param})")
            }
            Self::SaveRequested => f.write_str("save_requested"),
        }
    }
}
