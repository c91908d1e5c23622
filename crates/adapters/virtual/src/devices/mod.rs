//! Virtual device implementations: lights, thermostat, sensor, group.
//!
//! Every virtual device carries a fixed local id so cached state follows it
//! across restarts of the hub.

mod group;
mod light;
mod sensor;
mod thermostat;

pub use group::VirtualGroup;
pub use light::VirtualLight;
pub use sensor::VirtualSensor;
pub use thermostat::VirtualThermostat;
