//! Device state: the last commanded or observed method plus its payload.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::method::Method;
use crate::time::{Timestamp, within_duplicate_window};

/// Free-form payload attached to a state (a dim level, a color, a setpoint).
///
/// Always held as text. Persisted records may carry numbers here; those are
/// read back as their decimal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StateValue(String);

impl StateValue {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_text(deserializer).map(Self)
    }
}

/// Read a JSON scalar as text: strings verbatim, numbers and booleans in
/// their JSON spelling, `null` as the empty string.
///
/// # Errors
///
/// Returns the deserializer's error when the input is not valid JSON.
pub fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Current state of a device and when it was last accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    pub state: Method,
    pub state_value: StateValue,
    pub last_updated: Option<Timestamp>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            state: Method::TURNOFF,
            state_value: StateValue::default(),
            last_updated: None,
        }
    }
}

impl DeviceState {
    /// Apply a state report at `at`.
    ///
    /// An identical `(state, state_value)` pair reported inside the duplicate
    /// window is a retransmission and leaves everything untouched. Returns
    /// whether the report was accepted.
    pub fn apply(&mut self, state: Method, state_value: StateValue, at: Timestamp) -> bool {
        let duplicate = self.state == state
            && self.state_value == state_value
            && self
                .last_updated
                .is_some_and(|last| within_duplicate_window(last, at));
        if duplicate {
            return false;
        }
        self.last_updated = Some(at);
        self.state = state;
        self.state_value = state_value;
        true
    }
}
