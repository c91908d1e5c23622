//! Command vocabulary: actions, normalized values, resolutions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::method::Method;
use crate::state::StateValue;

/// The action a caller asks for: a mnemonic or an already resolved method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Mnemonic(String),
    Method(Method),
}

impl Action {
    /// Resolve to a single method; unknown mnemonics give [`Method::NONE`].
    #[must_use]
    pub fn resolve(&self) -> Method {
        match self {
            Self::Mnemonic(mnemonic) => Method::from_mnemonic(mnemonic),
            Self::Method(method) => *method,
        }
    }

    /// Whether the caller used the deprecated `rgbw` spelling, whose value
    /// carries a trailing white channel.
    #[must_use]
    pub fn is_rgbw(&self) -> bool {
        matches!(self, Self::Mnemonic(mnemonic) if mnemonic == "rgbw")
    }
}

impl From<&str> for Action {
    fn from(mnemonic: &str) -> Self {
        Self::Mnemonic(mnemonic.to_string())
    }
}

impl From<String> for Action {
    fn from(mnemonic: String) -> Self {
        Self::Mnemonic(mnemonic)
    }
}

impl From<Method> for Action {
    fn from(method: Method) -> Self {
        Self::Method(method)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mnemonic(mnemonic) => f.write_str(mnemonic),
            Self::Method(method) => method.fmt(f),
        }
    }
}

/// A command value after normalization for its method.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CommandValue {
    /// Pure trigger, no payload.
    #[default]
    None,
    /// Dim level.
    Level(i64),
    /// 24-bit RGB color.
    Color(u32),
    /// Structured thermostat payload, passed through untouched.
    Thermostat(serde_json::Value),
}

impl CommandValue {
    /// Normalize a raw caller value for `method`.
    ///
    /// Malformed input never fails: it becomes `0` and is logged.
    #[must_use]
    pub fn normalize(action: &Action, method: Method, raw: Option<serde_json::Value>) -> Self {
        match method {
            Method::DIM => Self::Level(coerce_level(raw.as_ref())),
            Method::RGB => {
                let color = coerce_color(raw.as_ref());
                if action.is_rgbw() {
                    Self::Color(color >> 8)
                } else {
                    Self::Color(color)
                }
            }
            Method::THERMOSTAT => Self::Thermostat(raw.unwrap_or_default()),
            _ => Self::None,
        }
    }

    #[must_use]
    pub fn as_level(&self) -> Option<i64> {
        match self {
            Self::Level(level) => Some(*level),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_color(&self) -> Option<u32> {
        match self {
            Self::Color(color) => Some(*color),
            _ => None,
        }
    }

    /// The raw form of this value, suitable for issuing the same command to
    /// another device.
    #[must_use]
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Self::None => None,
            Self::Level(level) => Some(serde_json::Value::from(*level)),
            Self::Color(color) => Some(serde_json::Value::from(*color)),
            Self::Thermostat(payload) => Some(payload.clone()),
        }
    }

    /// The state value recorded when a command with this value succeeds.
    #[must_use]
    pub fn to_state_value(&self) -> StateValue {
        match self {
            Self::None | Self::Thermostat(serde_json::Value::Null) => StateValue::default(),
            Self::Level(level) => StateValue::new(level.to_string()),
            Self::Color(color) => StateValue::new(color.to_string()),
            Self::Thermostat(serde_json::Value::String(text)) => StateValue::new(text.clone()),
            Self::Thermostat(payload) => StateValue::new(payload.to_string()),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn coerce_level(raw: Option<&serde_json::Value>) -> i64 {
    let level = match raw {
        Some(serde_json::Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
        Some(serde_json::Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    };
    level.unwrap_or_else(|| {
        tracing::warn!(value = ?raw, "dim level is not an integer, using 0");
        0
    })
}

fn coerce_color(raw: Option<&serde_json::Value>) -> u32 {
    let color = match raw {
        Some(serde_json::Value::String(text)) => {
            let text = text.trim();
            let digits = text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .unwrap_or(text);
            u32::from_str_radix(digits, 16).ok()
        }
        Some(serde_json::Value::Number(number)) => {
            number.as_u64().and_then(|value| u32::try_from(value).ok())
        }
        _ => None,
    };
    color.unwrap_or_else(|| {
        tracing::warn!(value = ?raw, "color is not a valid integer, using 0");
        0
    })
}

/// What a caller's continuation callback wants to happen next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flow {
    /// Carry on with the remaining side effects of the resolution.
    #[default]
    Continue,
    /// Stop here: skip any state update that would follow.
    Abort,
}

/// Why a command failed. Codes are defined by transports; the core only ever
/// produces [`FailureReason::UNSPECIFIED`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureReason(u32);

impl FailureReason {
    pub const UNSPECIFIED: Self = Self(0);
    pub const RETRIES_FAILED: Self = Self(1);
    pub const NO_REPLY: Self = Self(2);
    pub const TIMED_OUT: Self = Self(3);
    pub const NOT_CONFIRMED: Self = Self(4);
    pub const UNKNOWN: Self = Self(5);

    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
