//! Persisted settings record: what the hub stores per device so it can
//! bring the device back as a cached placeholder after a restart.
//!
//! Every key is optional in the stored JSON; missing keys take the defaults
//! below. Validation that cannot be expressed in the schema (sensor value
//! type keys) happens in [`DeviceSettings::sensor_table`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battery::Battery;
use crate::error::SettingsError;
use crate::id::DeviceId;
use crate::method::Method;
use crate::sensor::{Scale, SensorReading, SensorTable, SensorValueType};
use crate::state::{StateValue, lenient_text};
use crate::time::Timestamp;

/// Descriptive plugin parameters stored alongside a device.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Identifier of a device inside its own plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalId {
    Number(i64),
    Text(String),
}

impl Default for LocalId {
    fn default() -> Self {
        Self::Number(0)
    }
}

impl From<i64> for LocalId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for LocalId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => id.fmt(f),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// One stored sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedReading {
    #[serde(deserialize_with = "lenient_text")]
    pub value: String,
    #[serde(default)]
    pub scale: Scale,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<Timestamp>,
}

/// The stored form of a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceSettings {
    pub id: DeviceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub params: Params,
    pub local_id: LocalId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_count: Option<u32>,
    /// Transport type string of the device this record belongs to.
    #[serde(rename = "type")]
    pub type_string: String,
    pub methods: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Method>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_value: Option<StateValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<Battery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<bool>,
    /// Readings keyed by the decimal sensor value type.
    pub sensor_values: BTreeMap<String, Vec<PersistedReading>>,
    pub is_sensor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_dead: Option<bool>,
}

impl DeviceSettings {
    /// Parse one record.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Json`] when the value does not fit the schema.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SettingsError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Build the sensor table described by this record, without change
    /// tracking. Readings with no stored timestamp get `at`.
    ///
    /// A second reading for the same scale inside one category replaces the
    /// first and is logged.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidValueType`] when a category key is not
    /// an integer.
    pub fn sensor_table(&self, at: Timestamp) -> Result<SensorTable, SettingsError> {
        let mut table = SensorTable::default();
        for (key, readings) in &self.sensor_values {
            let value_type = key
                .trim()
                .parse()
                .map(SensorValueType::new)
                .map_err(|_| SettingsError::InvalidValueType(key.clone()))?;
            for stored in readings {
                let reading = SensorReading {
                    value: stored.value.clone(),
                    scale: stored.scale,
                    last_updated: stored.last_updated.unwrap_or(at),
                };
                if table.restore(value_type, reading) {
                    tracing::warn!(
                        device_id = %self.id,
                        %value_type,
                        scale = %stored.scale,
                        "duplicate cached sensor scale, keeping the later reading"
                    );
                }
            }
        }
        Ok(table)
    }

    /// Store the readings of `table` in this record.
    pub fn set_sensor_table(&mut self, table: &SensorTable) {
        self.sensor_values = table
            .readings()
            .iter()
            .filter(|(_, readings)| !readings.is_empty())
            .map(|(value_type, readings)| {
                let stored = readings
                    .iter()
                    .map(|reading| PersistedReading {
                        value: reading.value.clone(),
                        scale: reading.scale,
                        last_updated: Some(reading.last_updated),
                    })
                    .collect();
                (value_type.to_string(), stored)
            })
            .collect();
    }
}
