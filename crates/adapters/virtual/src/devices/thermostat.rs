//! Virtual thermostat: accepts setpoint payloads and reports a temperature.

use std::sync::{Mutex, PoisonError};

use devicehub_app::command::{Completion, IgnoreSet};
use devicehub_app::device::{Device, DeviceCore};
use devicehub_domain::command::CommandValue;
use devicehub_domain::device_type::DeviceType;
use devicehub_domain::error::ExecuteError;
use devicehub_domain::method::Method;
use devicehub_domain::sensor::{Scale, SensorValueType};
use devicehub_domain::settings::{LocalId, Params};
use serde_json::json;

use crate::VIRTUAL_TYPE;
use crate::error::VirtualError;

/// A simulated thermostat.
#[derive(Debug)]
pub struct VirtualThermostat {
    core: DeviceCore,
    local_id: i64,
    setpoint: Mutex<serde_json::Value>,
}

impl VirtualThermostat {
    pub fn new(local_id: i64, name: &str) -> Self {
        Self {
            core: DeviceCore::named(name),
            local_id,
            setpoint: Mutex::new(serde_json::Value::Null),
        }
    }

    /// Last payload the thermostat accepted.
    #[must_use]
    pub fn setpoint(&self) -> serde_json::Value {
        self.setpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Report a room temperature in degrees Celsius, to one decimal.
    pub fn report_temperature(&self, celsius: f64) {
        let this: &dyn Device = self;
        this.set_sensor_value(
            SensorValueType::TEMPERATURE,
            format!("{celsius:.1}"),
            Scale::TEMPERATURE_CELSIUS,
        );
    }
}

impl Device for VirtualThermostat {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn type_string(&self) -> &str {
        VIRTUAL_TYPE
    }

    fn local_id(&self) -> LocalId {
        LocalId::Number(self.local_id)
    }

    fn methods(&self) -> Method {
        Method::THERMOSTAT
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Thermostat
    }

    fn model(&self) -> &str {
        "VThermostat-1"
    }

    fn parameters(&self) -> Params {
        let mut params = Params::new();
        params.insert(
            "thermostat".to_string(),
            json!({"modes": ["heat", "cool", "off"], "setpoints": {"heat": [5, 30]}}),
        );
        params
    }

    fn execute(
        &self,
        method: Method,
        value: CommandValue,
        completion: Completion,
        _ignore: &mut IgnoreSet,
    ) -> Result<(), ExecuteError> {
        let CommandValue::Thermostat(payload) = value else {
            return Err(VirtualError::Unsupported(method).into());
        };
        *self.setpoint.lock().unwrap_or_else(PoisonError::into_inner) = payload;
        completion.succeed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use devicehub_app::command::Command;

    use super::*;

    #[test]
    fn should_store_thermostat_payload() {
        let thermostat = Arc::new(VirtualThermostat::new(3, "Radiator"));
        let handle: Arc<dyn Device> = Arc::clone(&thermostat) as Arc<dyn Device>;
        let payload = json!({"mode": "heat", "setpoint": {"heat": 21}});

        handle.command(
            Command::new("thermostat").value(payload.clone()),
            &mut IgnoreSet::new(),
        );

        assert_eq!(thermostat.setpoint(), payload);
        assert_eq!(handle.state().0, Method::THERMOSTAT);
    }

    #[test]
    fn should_reject_other_methods() {
        let thermostat = Arc::new(VirtualThermostat::new(3, "Radiator"));
        let handle: Arc<dyn Device> = Arc::clone(&thermostat) as Arc<dyn Device>;

        handle.command(Command::new("turnon"), &mut IgnoreSet::new());

        assert_eq!(thermostat.setpoint(), serde_json::Value::Null);
        assert_eq!(handle.state().0, Method::TURNOFF);
    }

    #[test]
    fn should_keep_reported_temperature() {
        let thermostat = VirtualThermostat::new(3, "Radiator");
        thermostat.report_temperature(19.5);

        let handle: &dyn Device = &thermostat;
        assert_eq!(
            handle.sensor_value(SensorValueType::TEMPERATURE, Scale::TEMPERATURE_CELSIUS),
            Some(19.5)
        );
    }

    #[test]
    fn should_expose_thermostat_parameters_with_device_type() {
        let thermostat = VirtualThermostat::new(3, "Radiator");
        let handle: &dyn Device = &thermostat;

        let params = handle.all_parameters();

        assert!(params.contains_key("thermostat"));
        assert_eq!(params["devicetype"], json!(DeviceType::Thermostat.as_str()));
    }
}
