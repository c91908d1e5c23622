//! Battery level as reported by battery-powered devices.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Either a percentage or one of the status codes used when the transport
/// cannot report a percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Battery {
    Percent(u8),
    Ok,
    #[default]
    Unknown,
    Low,
}

impl Battery {
    const OK_CODE: u8 = 253;
    const UNKNOWN_CODE: u8 = 254;
    const LOW_CODE: u8 = 255;
}

impl TryFrom<u8> for Battery {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0..=100 => Ok(Self::Percent(code)),
            Self::OK_CODE => Ok(Self::Ok),
            Self::UNKNOWN_CODE => Ok(Self::Unknown),
            Self::LOW_CODE => Ok(Self::Low),
            other => Err(ValidationError::BatteryOutOfRange(other)),
        }
    }
}

impl From<Battery> for u8 {
    fn from(battery: Battery) -> Self {
        match battery {
            Battery::Percent(level) => level,
            Battery::Ok => Battery::OK_CODE,
            Battery::Unknown => Battery::UNKNOWN_CODE,
            Battery::Low => Battery::LOW_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_unknown() {
        assert_eq!(Battery::default(), Battery::Unknown);
    }

    #[test]
    fn should_decode_status_codes() {
        assert_eq!(Battery::try_from(253), Ok(Battery::Ok));
        assert_eq!(Battery::try_from(254), Ok(Battery::Unknown));
        assert_eq!(Battery::try_from(255), Ok(Battery::Low));
        assert_eq!(Battery::try_from(87), Ok(Battery::Percent(87)));
    }

    #[test]
    fn should_reject_codes_between_percent_and_status() {
        assert_eq!(
            Battery::try_from(150),
            Err(ValidationError::BatteryOutOfRange(150))
        );
    }

    #[test]
    fn should_serialize_as_code() {
        assert_eq!(serde_json::to_string(&Battery::Low).unwrap(), "255");
        let parsed: Battery = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, Battery::Percent(42));
    }
}
