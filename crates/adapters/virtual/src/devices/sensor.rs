//! Virtual climate sensor: only reports readings, never takes commands.

use std::sync::{Mutex, PoisonError};

use devicehub_app::device::{Device, DeviceCore};
use devicehub_domain::battery::Battery;
use devicehub_domain::device_type::DeviceType;
use devicehub_domain::sensor::{Scale, SensorValueType};
use devicehub_domain::settings::LocalId;

use crate::VIRTUAL_TYPE;

/// A simulated battery-powered sensor.
#[derive(Debug)]
pub struct VirtualSensor {
    core: DeviceCore,
    local_id: i64,
    battery: Mutex<Battery>,
}

impl VirtualSensor {
    pub fn new(local_id: i64, name: &str) -> Self {
        Self {
            core: DeviceCore::named(name),
            local_id,
            battery: Mutex::new(Battery::Ok),
        }
    }

    /// Report a reading as if it had arrived over the air.
    pub fn report(&self, value_type: SensorValueType, value: impl Into<String>, scale: Scale) {
        let this: &dyn Device = self;
        this.set_sensor_value(value_type, value, scale);
    }

    pub fn set_battery(&self, battery: Battery) {
        *self.battery.lock().unwrap_or_else(PoisonError::into_inner) = battery;
        let this: &dyn Device = self;
        this.param_updated("battery");
    }
}

impl Device for VirtualSensor {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn type_string(&self) -> &str {
        VIRTUAL_TYPE
    }

    fn local_id(&self) -> LocalId {
        LocalId::Number(self.local_id)
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Sensor
    }

    fn model(&self) -> &str {
        "VSensor-1"
    }

    fn is_sensor(&self) -> bool {
        true
    }

    fn battery(&self) -> Option<Battery> {
        Some(*self.battery.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
