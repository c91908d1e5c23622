//! Sensor readings and the debounced per-device sensor table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::{Timestamp, within_duplicate_window};

/// Category of a sensor reading (temperature, humidity, …).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SensorValueType(u32);

impl SensorValueType {
    pub const UNKNOWN: Self = Self(0);
    pub const TEMPERATURE: Self = Self(1);
    pub const HUMIDITY: Self = Self(2);
    pub const RAINRATE: Self = Self(4);
    pub const RAINTOTAL: Self = Self(8);
    pub const WINDDIRECTION: Self = Self(16);
    pub const WINDAVERAGE: Self = Self(32);
    pub const WINDGUST: Self = Self(64);
    pub const UV: Self = Self(128);
    pub const WATT: Self = Self(256);
    pub const LUMINANCE: Self = Self(512);
    pub const DEW_POINT: Self = Self(1024);
    pub const BAROMETRIC_PRESSURE: Self = Self(2048);

    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Short name used by clients, `"unknown"` for anything unlisted.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TEMPERATURE => "temp",
            Self::HUMIDITY => "humidity",
            Self::RAINRATE => "rrate",
            Self::RAINTOTAL => "rtot",
            Self::WINDDIRECTION => "wdir",
            Self::WINDAVERAGE => "wavg",
            Self::WINDGUST => "wgust",
            Self::UV => "uv",
            Self::WATT => "watt",
            Self::LUMINANCE => "lum",
            Self::DEW_POINT => "dewp",
            Self::BAROMETRIC_PRESSURE => "barpress",
            _ => "unknown",
        }
    }
}

impl fmt::Display for SensorValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unit variant of a reading inside its category.
///
/// Scales are only meaningful together with a [`SensorValueType`]: `0` is
/// Celsius for temperature but kWh for power.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Scale(u32);

impl Scale {
    pub const DEFAULT: Self = Self(0);
    pub const TEMPERATURE_CELSIUS: Self = Self(0);
    pub const TEMPERATURE_FAHRENHEIT: Self = Self(1);
    pub const HUMIDITY_PERCENT: Self = Self(0);
    pub const POWER_KWH: Self = Self(0);
    pub const POWER_WATT: Self = Self(2);
    pub const LUMINANCE_PERCENT: Self = Self(0);
    pub const LUMINANCE_LUX: Self = Self(1);

    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One reading of a category at a given scale.
///
/// The value is kept as text so it is reported back exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub value: String,
    pub scale: Scale,
    pub last_updated: Timestamp,
}

impl SensorReading {
    /// The value parsed as a number, if it is one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

/// Outcome of [`SensorTable::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorUpdate {
    /// First reading for this `(type, scale)`.
    Appended,
    /// The value changed.
    Changed,
    /// Same value, older than the duplicate window: only the timestamp moved.
    Heartbeat,
    /// Same value inside the duplicate window: nothing happened.
    Duplicate,
}

impl SensorUpdate {
    /// Whether the manager should hear about this update.
    #[must_use]
    pub fn is_accepted(self) -> bool {
        !matches!(self, Self::Duplicate)
    }
}

/// All readings of a device, at most one per `(type, scale)`, plus the time
/// each category last genuinely changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorTable {
    readings: BTreeMap<SensorValueType, Vec<SensorReading>>,
    changed_at: HashMap<SensorValueType, Timestamp>,
}

impl SensorTable {
    /// Record a live report.
    pub fn record(
        &mut self,
        value_type: SensorValueType,
        value: &str,
        scale: Scale,
        at: Timestamp,
    ) -> SensorUpdate {
        let readings = self.readings.entry(value_type).or_default();
        let Some(reading) = readings.iter_mut().find(|r| r.scale == scale) else {
            readings.push(SensorReading {
                value: value.to_string(),
                scale,
                last_updated: at,
            });
            self.changed_at.insert(value_type, at);
            return SensorUpdate::Appended;
        };

        let update = if reading.value != value || !self.changed_at.contains_key(&value_type) {
            self.changed_at.insert(value_type, at);
            SensorUpdate::Changed
        } else if within_duplicate_window(reading.last_updated, at) {
            return SensorUpdate::Duplicate;
        } else {
            SensorUpdate::Heartbeat
        };
        value.clone_into(&mut reading.value);
        reading.last_updated = at;
        update
    }

    /// Fill in a reading without any change tracking, as when restoring a
    /// cache. A reading already present for the same scale is replaced.
    ///
    /// Returns `true` when a reading was replaced.
    pub fn restore(&mut self, value_type: SensorValueType, reading: SensorReading) -> bool {
        let readings = self.readings.entry(value_type).or_default();
        if let Some(existing) = readings.iter_mut().find(|r| r.scale == reading.scale) {
            *existing = reading;
            return true;
        }
        readings.push(reading);
        false
    }

    /// Take over the readings of `other`, leaving change times untouched.
    pub fn adopt_readings(&mut self, other: &Self) {
        self.readings.clone_from(&other.readings);
    }

    #[must_use]
    pub fn get(&self, value_type: SensorValueType, scale: Scale) -> Option<&SensorReading> {
        self.readings
            .get(&value_type)?
            .iter()
            .find(|r| r.scale == scale)
    }

    /// Numeric value of a reading; `None` when absent or not a number.
    #[must_use]
    pub fn value(&self, value_type: SensorValueType, scale: Scale) -> Option<f64> {
        self.get(value_type, scale).and_then(SensorReading::as_f64)
    }

    #[must_use]
    pub fn readings(&self) -> &BTreeMap<SensorValueType, Vec<SensorReading>> {
        &self.readings
    }

    /// When the category last genuinely changed value.
    #[must_use]
    pub fn changed_at(&self, value_type: SensorValueType) -> Option<Timestamp> {
        self.changed_at.get(&value_type).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;
    use chrono::TimeDelta;

    #[test]
    fn should_append_when_type_and_scale_are_new() {
        let mut table = SensorTable::default();
        let at = now();

        let update = table.record(SensorValueType::TEMPERATURE, "21.5", Scale::DEFAULT, at);

        assert_eq!(update, SensorUpdate::Appended);
        assert_eq!(table.value(SensorValueType::TEMPERATURE, Scale::DEFAULT), Some(21.5));
        assert_eq!(table.changed_at(SensorValueType::TEMPERATURE), Some(at));
    }

    #[test]
    fn should_keep_one_entry_per_scale() {
        let mut table = SensorTable::default();
        let at = now();
        table.record(SensorValueType::TEMPERATURE, "21.5", Scale::TEMPERATURE_CELSIUS, at);
        table.record(SensorValueType::TEMPERATURE, "70.7", Scale::TEMPERATURE_FAHRENHEIT, at);
        table.record(
            SensorValueType::TEMPERATURE,
            "22.0",
            Scale::TEMPERATURE_CELSIUS,
            at + TimeDelta::seconds(5),
        );

        let readings = &table.readings()[&SensorValueType::TEMPERATURE];
        assert_eq!(readings.len(), 2);
        assert_eq!(
            table
                .get(SensorValueType::TEMPERATURE, Scale::TEMPERATURE_CELSIUS)
                .map(|r| r.value.as_str()),
            Some("22.0")
        );
    }

    #[test]
    fn should_ignore_identical_value_inside_window() {
        let mut table = SensorTable::default();
        let at = now();
        table.record(SensorValueType::HUMIDITY, "40", Scale::HUMIDITY_PERCENT, at);

        let update = table.record(
            SensorValueType::HUMIDITY,
            "40",
            Scale::HUMIDITY_PERCENT,
            at + TimeDelta::milliseconds(500),
        );

        assert_eq!(update, SensorUpdate::Duplicate);
        let reading = table
            .get(SensorValueType::HUMIDITY, Scale::HUMIDITY_PERCENT)
            .unwrap();
        assert_eq!(reading.last_updated, at);
    }

    #[test]
    fn should_refresh_timestamp_only_for_heartbeat() {
        let mut table = SensorTable::default();
        let first = now();
        let later = first + TimeDelta::seconds(30);
        table.record(SensorValueType::HUMIDITY, "40", Scale::HUMIDITY_PERCENT, first);

        let update = table.record(SensorValueType::HUMIDITY, "40", Scale::HUMIDITY_PERCENT, later);

        assert_eq!(update, SensorUpdate::Heartbeat);
        assert_eq!(table.changed_at(SensorValueType::HUMIDITY), Some(first));
        let reading = table
            .get(SensorValueType::HUMIDITY, Scale::HUMIDITY_PERCENT)
            .unwrap();
        assert_eq!(reading.last_updated, later);
    }

    #[test]
    fn should_accept_identical_value_exactly_one_second_later() {
        let mut table = SensorTable::default();
        let first = now();
        table.record(SensorValueType::UV, "3", Scale::DEFAULT, first);

        let update = table.record(
            SensorValueType::UV,
            "3",
            Scale::DEFAULT,
            first + TimeDelta::seconds(1),
        );

        assert_eq!(update, SensorUpdate::Heartbeat);
    }

    #[test]
    fn should_record_change_time_when_value_differs_inside_window() {
        let mut table = SensorTable::default();
        let first = now();
        let second = first + TimeDelta::milliseconds(100);
        table.record(SensorValueType::WATT, "10", Scale::POWER_WATT, first);

        let update = table.record(SensorValueType::WATT, "12", Scale::POWER_WATT, second);

        assert_eq!(update, SensorUpdate::Changed);
        assert_eq!(table.changed_at(SensorValueType::WATT), Some(second));
    }

    #[test]
    fn should_treat_restored_value_as_changed_on_first_report() {
        let mut table = SensorTable::default();
        let restored_at = now();
        table.restore(
            SensorValueType::TEMPERATURE,
            SensorReading {
                value: "19".to_string(),
                scale: Scale::DEFAULT,
                last_updated: restored_at,
            },
        );
        assert_eq!(table.changed_at(SensorValueType::TEMPERATURE), None);

        let update = table.record(
            SensorValueType::TEMPERATURE,
            "19",
            Scale::DEFAULT,
            restored_at + TimeDelta::milliseconds(10),
        );

        assert_eq!(update, SensorUpdate::Changed);
    }

    #[test]
    fn should_replace_same_scale_when_restoring() {
        let mut table = SensorTable::default();
        let at = now();
        let reading = |value: &str| SensorReading {
            value: value.to_string(),
            scale: Scale::DEFAULT,
            last_updated: at,
        };

        assert!(!table.restore(SensorValueType::LUMINANCE, reading("10")));
        assert!(table.restore(SensorValueType::LUMINANCE, reading("11")));
        assert_eq!(table.readings()[&SensorValueType::LUMINANCE].len(), 1);
        assert_eq!(table.value(SensorValueType::LUMINANCE, Scale::DEFAULT), Some(11.0));
    }

    #[test]
    fn should_return_none_for_missing_or_non_numeric_value() {
        let mut table = SensorTable::default();
        table.record(SensorValueType::WINDDIRECTION, "NNE", Scale::DEFAULT, now());

        assert_eq!(table.value(SensorValueType::WINDDIRECTION, Scale::DEFAULT), None);
        assert!(table.get(SensorValueType::WINDDIRECTION, Scale::DEFAULT).is_some());
        assert!(table.get(SensorValueType::RAINRATE, Scale::DEFAULT).is_none());
    }

    #[test]
    fn should_map_value_types_to_short_names() {
        assert_eq!(SensorValueType::TEMPERATURE.as_str(), "temp");
        assert_eq!(SensorValueType::BAROMETRIC_PRESSURE.as_str(), "barpress");
        assert_eq!(SensorValueType::new(4096).as_str(), "unknown");
    }
}
