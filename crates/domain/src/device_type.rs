//! Device type catalogue.

use std::fmt;

/// What kind of thing a device is, independent of its transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeviceType {
    #[default]
    Unknown,
    AlarmSensor,
    Container,
    Controller,
    DoorWindow,
    Light,
    Lock,
    Media,
    Meter,
    Motion,
    OnOffSensor,
    Person,
    RemoteControl,
    Sensor,
    SmokeSensor,
    Speaker,
    SwitchOutlet,
    Thermostat,
    Virtual,
    WindowCovering,
    ProjectorScreen,
}

impl DeviceType {
    /// Stable identifier clients use to pick an icon or a widget.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "0000000-0001-1000-2005-ACCA54000000",
            Self::AlarmSensor => "0000001-0001-1000-2005-ACCA54000000",
            Self::Container => "0000002-0001-1000-2005-ACCA54000000",
            Self::Controller => "0000003-0001-1000-2005-ACCA54000000",
            Self::DoorWindow => "0000004-0001-1000-2005-ACCA54000000",
            Self::Light => "0000005-0001-1000-2005-ACCA54000000",
            Self::Lock => "0000006-0001-1000-2005-ACCA54000000",
            Self::Media => "0000007-0001-1000-2005-ACCA54000000",
            Self::Meter => "0000008-0001-1000-2005-ACCA54000000",
            Self::Motion => "0000009-0001-1000-2005-ACCA54000000",
            Self::OnOffSensor => "000000A-0001-1000-2005-ACCA54000000",
            Self::Person => "000000B-0001-1000-2005-ACCA54000000",
            Self::RemoteControl => "000000C-0001-1000-2005-ACCA54000000",
            Self::Sensor => "000000D-0001-1000-2005-ACCA54000000",
            Self::SmokeSensor => "000000E-0001-1000-2005-ACCA54000000",
            Self::Speaker => "000000F-0001-1000-2005-ACCA54000000",
            Self::SwitchOutlet => "0000010-0001-1000-2005-ACCA54000000",
            Self::Thermostat => "0000011-0001-1000-2005-ACCA54000000",
            Self::Virtual => "0000012-0001-1000-2005-ACCA54000000",
            Self::WindowCovering => "0000013-0001-1000-2005-ACCA54000000",
            Self::ProjectorScreen => "0000014-0001-1000-2005-ACCA54000000",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
