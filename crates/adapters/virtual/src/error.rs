//! Virtual adapter error types.

use devicehub_domain::error::{DeviceHubError, ExecuteError};
use devicehub_domain::method::Method;
use devicehub_domain::settings::LocalId;

/// Errors specific to the virtual adapter.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// The simulated device was switched offline.
    #[error("virtual device {0} is offline")]
    Offline(LocalId),

    /// The simulated device does not implement the method.
    #[error("virtual device does not support {0}")]
    Unsupported(Method),
}

impl From<VirtualError> for ExecuteError {
    fn from(err: VirtualError) -> Self {
        match err {
            VirtualError::Unsupported(method) => Self::Unsupported(method),
            other => Self::Transport(Box::new(other)),
        }
    }
}

impl From<VirtualError> for DeviceHubError {
    fn from(err: VirtualError) -> Self {
        Self::Execute(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_offline_error() {
        let err = VirtualError::Offline(LocalId::Number(2));
        assert_eq!(err.to_string(), "virtual device 2 is offline");
    }

    #[test]
    fn should_convert_unsupported_to_execute_unsupported() {
        let err: ExecuteError = VirtualError::Unsupported(Method::BELL).into();
        assert!(matches!(err, ExecuteError::Unsupported(Method::BELL)));
    }

    #[test]
    fn should_convert_offline_to_transport_error() {
        let err: DeviceHubError = VirtualError::Offline(LocalId::Number(1)).into();
        assert!(matches!(err, DeviceHubError::Execute(ExecuteError::Transport(_))));
    }
}
