//! Virtual group: forwards every command to its members.

use std::sync::Arc;

use devicehub_app::command::{Command, Completion, IgnoreSet};
use devicehub_app::device::{Device, DeviceCore, DeviceRef};
use devicehub_domain::command::CommandValue;
use devicehub_domain::device_type::DeviceType;
use devicehub_domain::error::ExecuteError;
use devicehub_domain::method::Method;
use devicehub_domain::settings::LocalId;

use crate::VIRTUAL_TYPE;

/// A group of devices commanded together.
///
/// Members may be other groups; a member reached twice within one command,
/// or a group containing itself, is commanded once.
#[derive(Debug)]
pub struct VirtualGroup {
    core: DeviceCore,
    local_id: i64,
    members: Vec<DeviceRef>,
}

impl VirtualGroup {
    pub fn new(local_id: i64, name: &str, members: Vec<DeviceRef>) -> Self {
        Self {
            core: DeviceCore::named(name),
            local_id,
            members,
        }
    }

    fn resolve(&self, member: &DeviceRef) -> Option<Arc<dyn Device>> {
        match member {
            DeviceRef::Handle(device) => Some(Arc::clone(device)),
            DeviceRef::Id(id) => {
                let this: &dyn Device = self;
                this.manager().and_then(|manager| manager.device(*id))
            }
        }
    }
}

impl Device for VirtualGroup {
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
        Method::TURNON | Method::TURNOFF | Method::DIM | Method::UP | Method::DOWN
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Container
    }

    fn model(&self) -> &str {
        "VGroup-1"
    }

    fn containing_devices(&self) -> Vec<DeviceRef> {
        self.members.clone()
    }

    fn execute(
        &self,
        method: Method,
        value: CommandValue,
        completion: Completion,
        ignore: &mut IgnoreSet,
    ) -> Result<(), ExecuteError> {
        for member in &self.members {
            let Some(device) = self.resolve(member) else {
                tracing::warn!(group = self.local_id, ?member, "group member not found");
                continue;
            };
            let Some(forwarded) = method.fallback_for(device.methods()) else {
                tracing::debug!(member = %device.id(), %method, "group member cannot do method");
                continue;
            };
            let mut command = Command::new(forwarded).maybe_value(value.to_json());
            if let Some(origin) = completion.origin() {
                command = command.origin(origin);
            }
            device.command(command, ignore);
        }
        completion.succeed();
        Ok(())
    }
}
