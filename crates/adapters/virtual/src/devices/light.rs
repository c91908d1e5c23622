//! Virtual light: on/off, and dim/color when built with those methods.

use std::sync::atomic::{AtomicBool, Ordering};

use devicehub_app::command::{Completion, IgnoreSet};
use devicehub_app::device::{Device, DeviceCore};
use devicehub_domain::command::CommandValue;
use devicehub_domain::device_type::DeviceType;
use devicehub_domain::error::ExecuteError;
use devicehub_domain::method::Method;
use devicehub_domain::settings::LocalId;
use devicehub_domain::state::StateValue;

use crate::VIRTUAL_TYPE;
use crate::error::VirtualError;

/// A simulated light. Answers every supported command inline.
#[derive(Debug)]
pub struct VirtualLight {
    core: DeviceCore,
    local_id: i64,
    methods: Method,
    online: AtomicBool,
}

impl VirtualLight {
    /// A light supporting exactly `methods`.
    pub fn new(local_id: i64, name: &str, methods: Method) -> Self {
        Self {
            core: DeviceCore::named(name),
            local_id,
            methods,
            online: AtomicBool::new(true),
        }
    }

    /// A light that can be dimmed and colored.
    pub fn dimmable(local_id: i64, name: &str) -> Self {
        Self::new(
            local_id,
            name,
            Method::TURNON | Method::TURNOFF | Method::DIM | Method::RGB,
        )
    }

    /// Simulate the light dropping off the network.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Device for VirtualLight {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn type_string(&self) -> &str {
        VIRTUAL_TYPE
    }

    fn local_id(&self) -> LocalId {
        LocalId::Number(self.local_id)
    }

    fn methods(&self) -> Method {
        self.methods
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Light
    }

    fn model(&self) -> &str {
        "VLight-1"
    }

    fn execute(
        &self,
        method: Method,
        value: CommandValue,
        completion: Completion,
        _ignore: &mut IgnoreSet,
    ) -> Result<(), ExecuteError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(VirtualError::Offline(self.local_id()).into());
        }
        if !self.methods.contains(method) {
            return Err(VirtualError::Unsupported(method).into());
        }
        if value.as_level() == Some(0) {
            completion.succeed_with(Some(Method::TURNOFF), Some(StateValue::default()));
        } else {
            completion.succeed();
        }
        Ok(())
    }
}
