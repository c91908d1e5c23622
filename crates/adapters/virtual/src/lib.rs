//! # devicehub-adapter-virtual
//!
//! Virtual/demo integration that provides simulated devices for testing and
//! demonstration purposes.
//!
//! ## Provided devices
//!
//! | Device | Local id | Behaviour |
//! |--------|----------|-----------|
//! | Living room lamp | `1` | `turnon` / `turnoff` / `dim` / `rgb` |
//! | Hall switch | `2` | `turnon` / `turnoff` |
//! | Radiator | `3` | `thermostat`, reports temperature |
//! | Garden sensor | `4` | Reports temperature and humidity |
//! | All lights | `5` | Group of the lamp and the switch |
//!
//! ## Dependency rule
//!
//! Depends on `devicehub-app` (port traits) and `devicehub-domain` only.

mod devices;
pub mod error;

use std::sync::Arc;

use devicehub_app::device::{Device, DeviceRef};
use devicehub_app::ports::Integration;
use devicehub_domain::method::Method;

pub use devices::{VirtualGroup, VirtualLight, VirtualSensor, VirtualThermostat};

/// Type string shared by every virtual device.
pub const VIRTUAL_TYPE: &str = "virtual";

/// Virtual integration that creates simulated devices.
pub struct VirtualIntegration {
    lamp: Arc<VirtualLight>,
    switch: Arc<VirtualLight>,
    thermostat: Arc<VirtualThermostat>,
    sensor: Arc<VirtualSensor>,
    group: Arc<VirtualGroup>,
}

impl Default for VirtualIntegration {
    fn default() -> Self {
        let lamp = Arc::new(VirtualLight::dimmable(1, "Living room lamp"));
        let switch = Arc::new(VirtualLight::new(
            2,
            "Hall switch",
            Method::TURNON | Method::TURNOFF,
        ));
        let thermostat = Arc::new(VirtualThermostat::new(3, "Radiator"));
        let sensor = Arc::new(VirtualSensor::new(4, "Garden sensor"));
        let group = Arc::new(VirtualGroup::new(
            5,
            "All lights",
            vec![
                DeviceRef::Handle(Arc::clone(&lamp) as Arc<dyn Device>),
                DeviceRef::Handle(Arc::clone(&switch) as Arc<dyn Device>),
            ],
        ));

        Self {
            lamp,
            switch,
            thermostat,
            sensor,
            group,
        }
    }
}

impl VirtualIntegration {
    #[must_use]
    pub fn lamp(&self) -> &Arc<VirtualLight> {
        &self.lamp
    }

    #[must_use]
    pub fn switch(&self) -> &Arc<VirtualLight> {
        &self.switch
    }

    #[must_use]
    pub fn thermostat(&self) -> &Arc<VirtualThermostat> {
        &self.thermostat
    }

    #[must_use]
    pub fn sensor(&self) -> &Arc<VirtualSensor> {
        &self.sensor
    }

    #[must_use]
    pub fn group(&self) -> &Arc<VirtualGroup> {
        &self.group
    }
}

impl Integration for VirtualIntegration {
    fn name(&self) -> &'static str {
        "virtual"
    }

    fn devices(&self) -> Vec<Arc<dyn Device>> {
        vec![
            Arc::clone(&self.lamp) as Arc<dyn Device>,
            Arc::clone(&self.switch) as Arc<dyn Device>,
            Arc::clone(&self.thermostat) as Arc<dyn Device>,
            Arc::clone(&self.sensor) as Arc<dyn Device>,
            Arc::clone(&self.group) as Arc<dyn Device>,
        ]
    }
}

#[cfg(test)]
mod tests {
    use devicehub_domain::settings::LocalId;

    use super::*;

    #[test]
    fn should_provide_five_devices() {
        let integration = VirtualIntegration::default();
        assert_eq!(integration.devices().len(), 5);
    }

    #[test]
    fn should_return_virtual_as_name() {
        let integration = VirtualIntegration::default();
        assert_eq!(integration.name(), "virtual");
    }

    #[test]
    fn should_give_every_device_a_distinct_local_id() {
        let integration = VirtualIntegration::default();
        let ids: Vec<LocalId> = integration.devices().iter().map(|d| d.local_id()).collect();
        assert_eq!(ids, (1..=5).map(LocalId::Number).collect::<Vec<_>>());
        assert!(integration.devices().iter().all(|d| d.type_string() == VIRTUAL_TYPE));
    }

    #[test]
    fn should_group_both_lights() {
        let integration = VirtualIntegration::default();
        let group: &dyn Device = &**integration.group();
        assert_eq!(group.containing_devices().len(), 2);
    }

    #[test]
    fn should_name_devices() {
        let integration = VirtualIntegration::default();
        let names: Vec<String> = integration.devices().iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            vec![
                "Living room lamp",
                "Hall switch",
                "Radiator",
                "Garden sensor",
                "All lights"
            ]
        );
    }
}
