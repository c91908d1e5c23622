//! Cached devices: placeholders rebuilt from persisted settings that stand
//! in for a device until its live counterpart attaches.

use std::sync::{Mutex, PoisonError};

use devicehub_domain::battery::Battery;
use devicehub_domain::error::SettingsError;
use devicehub_domain::method::Method;
use devicehub_domain::settings::{DeviceSettings, LocalId, Params};
use devicehub_domain::time::{Timestamp, now};

use crate::device::{Device, DeviceCore};

/// A device restored from the cache. Never confirmed by a transport; it
/// cannot execute commands.
#[derive(Debug)]
pub struct CachedDevice {
    core: DeviceCore,
    params: Mutex<Params>,
    local_id: LocalId,
    mimik_type: String,
    stored_methods: Method,
    battery: Option<Battery>,
    is_sensor: bool,
    declared_dead: Option<bool>,
}

impl CachedDevice {
    /// Rebuild a placeholder from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the stored sensor values are invalid.
    pub fn from_settings(settings: DeviceSettings) -> Result<Self, SettingsError> {
        Self::from_settings_at(settings, now())
    }

    /// Like [`from_settings`](Self::from_settings); readings stored without a
    /// timestamp get `at`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the stored sensor values are invalid.
    pub fn from_settings_at(settings: DeviceSettings, at: Timestamp) -> Result<Self, SettingsError> {
        let sensors = settings.sensor_table(at)?;
        let core = DeviceCore::with_confirmed(false);
        {
            let mut data = core.lock();
            data.id = settings.id;
            data.name = settings.name;
            data.load_count = settings.load_count.map_or(0, |count| count.saturating_add(1));
            data.ignored = settings.ignored;
            if let Some(state) = settings.state {
                data.state.state = state;
            }
            if let Some(state_value) = settings.state_value {
                data.state.state_value = state_value;
            }
            data.sensors = sensors;
        }
        Ok(Self {
            core,
            params: Mutex::new(settings.params),
            local_id: settings.local_id,
            mimik_type: settings.type_string,
            stored_methods: settings.methods,
            battery: settings.battery,
            is_sensor: settings.is_sensor,
            declared_dead: settings.declared_dead,
        })
    }
}

impl Device for CachedDevice {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn type_string(&self) -> &str {
        &self.mimik_type
    }

    fn local_id(&self) -> LocalId {
        self.local_id.clone()
    }

    fn methods(&self) -> Method {
        self.stored_methods
    }

    fn is_sensor(&self) -> bool {
        self.is_sensor
    }

    fn battery(&self) -> Option<Battery> {
        self.battery
    }

    fn params(&self) -> Params {
        self.params
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_params(&self, params: Params) {
        *self.params.lock().unwrap_or_else(PoisonError::into_inner) = params;
    }

    fn declared_dead(&self) -> Option<bool> {
        self.declared_dead
    }
}

impl dyn Device + '_ {
    /// Adopt what the hub knew about `old`, typically a [`CachedDevice`]
    /// this live device replaces: id, name, parameters, state, ignored flag
    /// and sensor readings. The load count starts over.
    pub fn load_cached(&self, old: &dyn Device) {
        let params = old.params();
        let adopted = old.core().lock().clone();
        {
            let mut data = self.core().lock();
            data.id = adopted.id;
            data.name = adopted.name;
            data.state.state = adopted.state.state;
            data.state.state_value = adopted.state.state_value;
            data.ignored = adopted.ignored;
            data.sensors.adopt_readings(&adopted.sensors);
            data.load_count = 0;
        }
        self.set_params(params);
    }

    /// The persisted form of this device.
    #[must_use]
    pub fn to_settings(&self) -> DeviceSettings {
        let data = self.core().lock().clone();
        let mut settings = DeviceSettings {
            id: data.id,
            name: data.name,
            params: self.params(),
            local_id: self.local_id(),
            load_count: Some(data.load_count),
            type_string: self.type_string().to_string(),
            methods: self.methods(),
            state: Some(data.state.state),
            state_value: Some(data.state.state_value),
            battery: self.battery(),
            ignored: data.ignored,
            is_sensor: self.is_sensor(),
            declared_dead: self.declared_dead(),
            ..DeviceSettings::default()
        };
        settings.set_sensor_table(&data.sensors);
        settings
    }
}
