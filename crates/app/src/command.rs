//! Command execution protocol.
//!
//! A [`Command`] names an action, an optional raw value and the caller's
//! continuations. [`command`](Device::command) gates it through the ignore
//! set, resolves and normalizes it, hands it to the device's executor and
//! turns the executor's answer into state changes through a one-shot
//! [`Completion`].

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use devicehub_domain::command::{Action, CommandValue, FailureReason, Flow};
use devicehub_domain::id::DeviceId;
use devicehub_domain::method::Method;
use devicehub_domain::state::StateValue;

use crate::device::Device;

/// Called with the state and value the device ended up in.
pub type SuccessCallback = Box<dyn FnOnce(Method, &StateValue) -> Flow + Send>;

/// Called with the transport's failure reason.
pub type FailureCallback = Box<dyn FnOnce(FailureReason) -> Flow + Send>;

/// Devices already visited by one logical command.
///
/// Owned by the top-level call and shared by `&mut` with every device the
/// command propagates to, so a cycle of groups commands each member once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet(HashSet<DeviceId>);

impl IgnoreSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: DeviceId) -> bool {
        self.0.contains(&id)
    }

    /// Returns `false` when `id` was already present.
    pub fn insert(&mut self, id: DeviceId) -> bool {
        self.0.insert(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<DeviceId> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = DeviceId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A request to make a device do something.
pub struct Command {
    action: Action,
    value: Option<serde_json::Value>,
    origin: Option<String>,
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl Command {
    pub fn new(action: impl Into<Action>) -> Self {
        Self {
            action: action.into(),
            value: None,
            origin: None,
            on_success: None,
            on_failure: None,
        }
    }

    /// Raw value, normalized for the resolved method before execution.
    #[must_use]
    pub fn value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Optional raw value; `None` leaves the command without one.
    #[must_use]
    pub fn maybe_value(mut self, value: Option<serde_json::Value>) -> Self {
        self.value = value;
        self
    }

    /// Who asked, forwarded to the state notification.
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    #[must_use]
    pub fn on_success(
        mut self,
        callback: impl FnOnce(Method, &StateValue) -> Flow + Send + 'static,
    ) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_failure(mut self, callback: impl FnOnce(FailureReason) -> Flow + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("action", &self.action)
            .field("value", &self.value)
            .field("origin", &self.origin)
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

struct Callbacks {
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

struct Resolution {
    device: Arc<dyn Device>,
    method: Method,
    value: CommandValue,
    origin: Option<String>,
    callbacks: Mutex<Option<Callbacks>>,
}

/// The pair of continuations an executor resolves a command with.
///
/// Cloneable and `Send`, so an executor may keep it and resolve later from
/// another thread. Only the first resolution has an effect.
#[derive(Clone)]
pub struct Completion {
    inner: Arc<Resolution>,
}

impl Completion {
    fn new(
        device: Arc<dyn Device>,
        method: Method,
        value: CommandValue,
        origin: Option<String>,
        callbacks: Callbacks,
    ) -> Self {
        Self {
            inner: Arc::new(Resolution {
                device,
                method,
                value,
                origin,
                callbacks: Mutex::new(Some(callbacks)),
            }),
        }
    }

    /// The resolved method the command was issued with.
    #[must_use]
    pub fn method(&self) -> Method {
        self.inner.method
    }

    #[must_use]
    pub fn value(&self) -> &CommandValue {
        &self.inner.value
    }

    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.inner.origin.as_deref()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.inner
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// The command did what it was asked.
    pub fn succeed(&self) {
        self.succeed_with(None, None);
    }

    /// The command succeeded, leaving the device in `state`/`state_value`
    /// when given instead of the commanded method and value.
    pub fn succeed_with(&self, state: Option<Method>, state_value: Option<StateValue>) {
        let Some(callbacks) = self.take("success") else {
            return;
        };
        let state = state.unwrap_or(self.inner.method);
        let state_value = state_value.unwrap_or_else(|| self.inner.value.to_state_value());
        if let Some(on_success) = callbacks.on_success
            && on_success(state, &state_value) == Flow::Abort
        {
            tracing::debug!(device_id = %self.inner.device.id(), "success callback aborted state update");
            return;
        }
        self.inner
            .device
            .set_state(state, state_value, None, self.inner.origin.as_deref());
    }

    /// The command failed. Device state is left untouched.
    pub fn fail(&self, reason: FailureReason) {
        let Some(callbacks) = self.take("failure") else {
            return;
        };
        tracing::debug!(device_id = %self.inner.device.id(), %reason, "command failed");
        if let Some(on_failure) = callbacks.on_failure {
            // Nothing follows a failure for an abort to skip.
            on_failure(reason);
        }
    }

    fn take(&self, outcome: &str) -> Option<Callbacks> {
        let callbacks = self
            .inner
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if callbacks.is_none() {
            tracing::warn!(
                device_id = %self.inner.device.id(),
                method = %self.inner.method,
                outcome,
                "command already resolved, ignoring"
            );
        }
        callbacks
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("device_id", &self.inner.device.id())
            .field("method", &self.inner.method)
            .field("value", &self.inner.value)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl dyn Device {
    /// Execute `command` on this device.
    ///
    /// A device already in `ignore` is skipped silently; otherwise it is
    /// added before anything else happens. Unknown actions fail with
    /// [`FailureReason::UNSPECIFIED`], as do executor errors, which are
    /// logged and never reach the caller.
    #[tracing::instrument(skip_all, fields(device_id = %self.id(), action = %command.action))]
    pub fn command(self: &Arc<Self>, command: Command, ignore: &mut IgnoreSet) {
        if !ignore.insert(self.id()) {
            tracing::debug!("device already commanded in this call, skipping");
            return;
        }
        let Command {
            action,
            value,
            origin,
            on_success,
            on_failure,
        } = command;

        let method = action.resolve();
        let value = CommandValue::normalize(&action, method, value);
        let completion = Completion::new(
            Arc::clone(self),
            method,
            value.clone(),
            origin,
            Callbacks {
                on_success,
                on_failure,
            },
        );

        if method.is_none() {
            completion.fail(FailureReason::UNSPECIFIED);
            return;
        }

        if let Err(error) = self.execute(method, value, completion.clone(), ignore) {
            tracing::error!(%method, %error, "device executor failed");
            if !completion.is_resolved() {
                completion.fail(FailureReason::UNSPECIFIED);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use devicehub_domain::error::ExecuteError;
    use serde_json::json;

    use super::*;
    use crate::device::DeviceCore;
    use crate::store::tests::{Call, RecordingManager};

    /// How a [`Scripted`] device answers.
    #[derive(Clone, Copy)]
    enum Script {
        Succeed,
        SucceedAs(Method),
        Fail(FailureReason),
        Error,
        SucceedThenError,
        SucceedTwice,
        Keep,
    }

    struct Scripted {
        core: DeviceCore,
        script: Script,
        executed: Mutex<Vec<(Method, CommandValue)>>,
        kept: Mutex<Option<Completion>>,
    }

    impl Scripted {
        fn new(script: Script) -> Self {
            Self {
                core: DeviceCore::new(),
                script,
                executed: Mutex::new(Vec::new()),
                kept: Mutex::new(None),
            }
        }
    }

    impl Device for Scripted {
        fn core(&self) -> &DeviceCore {
            &self.core
        }

        fn methods(&self) -> Method {
            Method::TURNON | Method::TURNOFF | Method::DIM | Method::RGB
        }

        fn execute(
            &self,
            method: Method,
            value: CommandValue,
            completion: Completion,
            _ignore: &mut IgnoreSet,
        ) -> Result<(), ExecuteError> {
            self.executed.lock().unwrap().push((method, value));
            match self.script {
                Script::Succeed => completion.succeed(),
                Script::SucceedAs(state) => completion.succeed_with(Some(state), None),
                Script::Fail(reason) => completion.fail(reason),
                Script::Error => return Err(ExecuteError::NotConnected),
                Script::SucceedThenError => {
                    completion.succeed();
                    return Err(ExecuteError::NotConnected);
                }
                Script::SucceedTwice => {
                    completion.succeed();
                    completion.succeed();
                }
                Script::Keep => *self.kept.lock().unwrap() = Some(completion),
            }
            Ok(())
        }
    }

    fn scripted(script: Script) -> (Arc<RecordingManager>, Arc<Scripted>, Arc<dyn Device>) {
        let manager = Arc::new(RecordingManager::default());
        let device = Arc::new(Scripted::new(script));
        let handle: Arc<dyn Device> = Arc::clone(&device) as Arc<dyn Device>;
        handle.set_id(DeviceId::new(1));
        manager.attach(Arc::clone(&handle));
        (manager, device, handle)
    }

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (Arc::clone(&count), count)
    }

    #[test]
    fn should_do_nothing_when_device_is_in_ignore_set() {
        let (manager, device, handle) = scripted(Script::Succeed);
        let (successes, seen) = counter();
        let mut ignore: IgnoreSet = [DeviceId::new(1)].into_iter().collect();

        handle.command(
            Command::new("turnon").on_success(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Flow::Continue
            }),
            &mut ignore,
        );

        assert!(device.executed.lock().unwrap().is_empty());
        assert_eq!(successes.load(Ordering::SeqCst), 0);
        assert!(manager.calls().is_empty());
    }

    #[test]
    fn should_add_own_id_to_ignore_set() {
        let (_manager, _device, handle) = scripted(Script::Succeed);
        let mut ignore = IgnoreSet::new();

        handle.command(Command::new("turnon"), &mut ignore);

        assert!(ignore.contains(DeviceId::new(1)));
    }

    #[test]
    fn should_set_state_and_notify_after_success() {
        let (manager, device, handle) = scripted(Script::Succeed);

        handle.command(
            Command::new("dim").value(json!("40")).origin("api"),
            &mut IgnoreSet::new(),
        );

        assert_eq!(
            *device.executed.lock().unwrap(),
            vec![(Method::DIM, CommandValue::Level(40))]
        );
        assert_eq!(
            manager.calls(),
            vec![Call::StateUpdated(
                DeviceId::new(1),
                Method::DIM,
                StateValue::new("40"),
                None,
                Some("api".to_string())
            )]
        );
    }

    #[test]
    fn should_pass_final_state_to_success_callback() {
        let (_manager, _device, handle) = scripted(Script::SucceedAs(Method::TURNOFF));
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        handle.command(
            Command::new(Method::DIM).value(0).on_success(move |state, value| {
                *sink.lock().unwrap() = Some((state, value.clone()));
                Flow::Continue
            }),
            &mut IgnoreSet::new(),
        );

        assert_eq!(
            *seen.lock().unwrap(),
            Some((Method::TURNOFF, StateValue::new("0")))
        );
        assert_eq!(handle.state().0, Method::TURNOFF);
    }

    #[test]
    fn should_skip_state_update_when_success_callback_aborts() {
        let (manager, _device, handle) = scripted(Script::Succeed);

        handle.command(
            Command::new("turnon").on_success(|_, _| Flow::Abort),
            &mut IgnoreSet::new(),
        );

        assert_eq!(handle.state().0, Method::TURNOFF);
        assert!(manager.calls().is_empty());
    }

    #[test]
    fn should_fail_with_unspecified_reason_for_unknown_action() {
        let (_manager, device, handle) = scripted(Script::Succeed);
        let reason = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&reason);

        handle.command(
            Command::new("explode").on_failure(move |r| {
                *sink.lock().unwrap() = Some(r);
                Flow::Continue
            }),
            &mut IgnoreSet::new(),
        );

        assert!(device.executed.lock().unwrap().is_empty());
        assert_eq!(*reason.lock().unwrap(), Some(FailureReason::UNSPECIFIED));
    }

    #[test]
    fn should_forward_transport_failure_reason_without_state_change() {
        let (manager, _device, handle) = scripted(Script::Fail(FailureReason::NO_REPLY));
        let reason = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&reason);

        handle.command(
            Command::new("turnon").on_failure(move |r| {
                *sink.lock().unwrap() = Some(r);
                Flow::Abort
            }),
            &mut IgnoreSet::new(),
        );

        assert_eq!(*reason.lock().unwrap(), Some(FailureReason::NO_REPLY));
        assert_eq!(handle.state().0, Method::TURNOFF);
        assert!(manager.calls().is_empty());
    }

    #[test]
    fn should_turn_executor_error_into_failure() {
        let (_manager, _device, handle) = scripted(Script::Error);
        let reason = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&reason);

        handle.command(
            Command::new("turnon").on_failure(move |r| {
                *sink.lock().unwrap() = Some(r);
                Flow::Continue
            }),
            &mut IgnoreSet::new(),
        );

        assert_eq!(*reason.lock().unwrap(), Some(FailureReason::UNSPECIFIED));
    }

    #[test]
    fn should_not_fail_after_executor_already_succeeded() {
        let (_manager, _device, handle) = scripted(Script::SucceedThenError);
        let (failures, seen) = counter();

        handle.command(
            Command::new("turnon").on_failure(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                Flow::Continue
            }),
            &mut IgnoreSet::new(),
        );

        assert_eq!(failures.load(Ordering::SeqCst), 0);
        assert_eq!(handle.state().0, Method::TURNON);
    }

    #[test]
    fn should_resolve_only_once() {
        let (_manager, _device, handle) = scripted(Script::SucceedTwice);
        let (successes, seen) = counter();

        handle.command(
            Command::new("turnon").on_success(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Flow::Continue
            }),
            &mut IgnoreSet::new(),
        );

        assert_eq!(successes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_resolve_later_from_another_thread() {
        let (manager, device, handle) = scripted(Script::Keep);

        handle.command(Command::new("rgbw").value(0x1122_33FF_u32), &mut IgnoreSet::new());

        let completion = device.kept.lock().unwrap().take().unwrap();
        assert!(!completion.is_resolved());
        assert_eq!(completion.method(), Method::RGB);
        assert_eq!(completion.value(), &CommandValue::Color(0x0011_2233));
        std::thread::spawn(move || completion.succeed())
            .join()
            .unwrap();

        assert_eq!(
            handle.state(),
            (Method::RGB, StateValue::new(0x0011_2233_u32.to_string()))
        );
        assert_eq!(manager.calls().len(), 1);
    }
}
