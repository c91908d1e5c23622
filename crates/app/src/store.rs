//! State and sensor store: accepted changes reach the manager, duplicate
//! retransmissions do not.
//!
//! Every time-dependent operation has an `_at` variant taking the clock
//! explicitly; the plain variant uses [`now`].


use devicehub_domain::command::FailureReason;
use devicehub_domain::method::Method;
use devicehub_domain::sensor::{Scale, SensorValueType};
use devicehub_domain::state::StateValue;
use devicehub_domain::time::{Timestamp, now};

use crate::device::Device;

impl dyn Device + '_ {
    /// Record a new state and tell the manager, unless the same state was
    /// already accepted less than a second ago.
    pub fn set_state(
        &self,
        state: Method,
        state_value: StateValue,
        ack: Option<u64>,
        origin: Option<&str>,
    ) {
        self.set_state_at(state, state_value, ack, origin, now());
    }

    pub fn set_state_at(
        &self,
        state: Method,
        state_value: StateValue,
        ack: Option<u64>,
        origin: Option<&str>,
        at: Timestamp,
    ) {
        let accepted = self.core().lock().state.apply(state, state_value, at);
        if !accepted {
            tracing::debug!(device_id = %self.id(), %state, "duplicate state report ignored");
            return;
        }
        if let Some(manager) = self.manager() {
            manager.state_updated(self, ack, origin);
        }
    }

    /// Tell the manager a transition failed. Local state is left untouched.
    pub fn set_state_failed(
        &self,
        state: Method,
        state_value: &StateValue,
        reason: FailureReason,
        origin: Option<&str>,
    ) {
        if let Some(manager) = self.manager() {
            manager.state_updated_fail(self, state, state_value, reason, origin);
        }
    }

    /// Record a sensor reading; accepted readings are reported and saved.
    ///
    /// `value` is stored as given, so pass the reading's original text
    /// (`"21.0"` stays `"21.0"`).
    pub fn set_sensor_value(
        &self,
        value_type: SensorValueType,
        value: impl Into<String>,
        scale: Scale,
    ) {
        self.set_sensor_value_at(value_type, value, scale, now());
    }

    pub fn set_sensor_value_at(
        &self,
        value_type: SensorValueType,
        value: impl Into<String>,
        scale: Scale,
        at: Timestamp,
    ) {
        let value = value.into();
        let update = self
            .core()
            .lock()
            .sensors
            .record(value_type, &value, scale, at);
        if !update.is_accepted() {
            tracing::debug!(
                device_id = %self.id(),
                %value_type,
                %scale,
                "duplicate sensor value ignored"
            );
            return;
        }
        if let Some(manager) = self.manager() {
            manager.sensor_value_updated(self, value_type, &value, scale);
            manager.save();
        }
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.core().lock().name = Some(name.into());
        self.param_updated("name");
    }

    pub fn set_ignored(&self, ignored: bool) {
        self.core().lock().ignored = Some(ignored);
        if let Some(manager) = self.manager() {
            manager.save();
        }
    }

    /// Tell the manager a descriptive parameter changed.
    pub fn param_updated(&self, param: &str) {
        if let Some(manager) = self.manager() {
            manager.device_param_updated(self, param);
        }
    }
}
