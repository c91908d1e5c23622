//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`DeviceHubError`] via `#[from]`.

use crate::method::Method;

/// Top-level error for the device core.
#[derive(Debug, thiserror::Error)]
pub enum DeviceHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("invalid cached device settings")]
    Settings(#[from] SettingsError),

    #[error("device command failed")]
    Execute(#[from] ExecuteError),
}

/// A value violated a domain invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("did not understand device method {0:?}")]
    UnknownMethod(String),

    #[error("battery level {0} is neither a percentage nor a status code")]
    BatteryOutOfRange(u8),
}

/// A persisted settings record could not be turned into a device.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("malformed settings record")]
    Json(#[from] serde_json::Error),

    #[error("sensor value type {0:?} is not an integer")]
    InvalidValueType(String),
}

/// Fault raised by a device-specific executor.
///
/// The command protocol never hands this back to the caller: it is logged and
/// turned into a failure resolution with an unspecified reason.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("method {0} is not supported by this device")]
    Unsupported(Method),

    #[error("device is not reachable")]
    NotConnected,

    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}
