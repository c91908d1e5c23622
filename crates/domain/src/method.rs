//! Method codec: the capability bitmask every device advertises.
//!
//! Each supported action is one bit. A device's capability set is the OR of
//! its flags, and a command resolves to exactly one flag (or
//! [`Method::NONE`] when it was not understood).

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A set of device method flags.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Method(u32);

impl Method {
    /// Sentinel for "no method"; also the result of an unknown mnemonic.
    pub const NONE: Self = Self(0);
    pub const TURNON: Self = Self(1);
    pub const TURNOFF: Self = Self(2);
    pub const BELL: Self = Self(4);
    pub const TOGGLE: Self = Self(8);
    pub const DIM: Self = Self(16);
    pub const LEARN: Self = Self(32);
    pub const EXECUTE: Self = Self(64);
    pub const UP: Self = Self(128);
    pub const DOWN: Self = Self(256);
    pub const STOP: Self = Self(512);
    pub const RGB: Self = Self(1024);
    /// Deprecated alias of [`RGB`](Self::RGB).
    pub const RGBW: Self = Self::RGB;
    pub const THERMOSTAT: Self = Self(2048);

    const NAMES: [(Self, &'static str); 12] = [
        (Self::TURNON, "turnon"),
        (Self::TURNOFF, "turnoff"),
        (Self::BELL, "bell"),
        (Self::TOGGLE, "toggle"),
        (Self::DIM, "dim"),
        (Self::LEARN, "learn"),
        (Self::EXECUTE, "execute"),
        (Self::UP, "up"),
        (Self::DOWN, "down"),
        (Self::STOP, "stop"),
        (Self::RGB, "rgb"),
        (Self::THERMOSTAT, "thermostat"),
    ];

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Whether every flag of `other` is set in `self`. Always false for
    /// [`NONE`](Self::NONE).
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Resolve a mnemonic, logging and returning [`NONE`](Self::NONE) when it
    /// is not part of the vocabulary.
    #[must_use]
    pub fn from_mnemonic(mnemonic: &str) -> Self {
        match mnemonic.parse() {
            Ok(method) => method,
            Err(err) => {
                tracing::warn!(%err, "unresolved device method");
                Self::NONE
            }
        }
    }

    /// Name of a single flag. Composite sets and unknown bits have none.
    #[must_use]
    pub fn mnemonic(self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(method, _)| *method == self)
            .map(|(_, name)| *name)
    }

    /// Degrade `self` against what a device supports.
    ///
    /// An unsupported `UP` adds `TURNOFF`, an unsupported `DOWN` adds `TURNON`,
    /// then everything outside `supported` is dropped.
    #[must_use]
    pub fn mask_unsupported(self, supported: Self) -> Self {
        let mut methods = self;
        if methods.contains(Self::UP) && !supported.contains(Self::UP) {
            methods |= Self::TURNOFF;
        }
        if methods.contains(Self::DOWN) && !supported.contains(Self::DOWN) {
            methods |= Self::TURNON;
        }
        methods & supported
    }

    /// The single method to send to a device supporting `supported` in place
    /// of `self`, if any.
    #[must_use]
    pub fn fallback_for(self, supported: Self) -> Option<Self> {
        let masked = self.mask_unsupported(supported);
        if masked.contains(self) {
            return Some(self);
        }
        match self {
            Self::UP if masked.contains(Self::TURNOFF) => Some(Self::TURNOFF),
            Self::DOWN if masked.contains(Self::TURNON) => Some(Self::TURNON),
            _ => None,
        }
    }

    /// Iterate over the individual flags set in `self`, lowest bit first.
    pub fn iter(self) -> impl Iterator<Item = Self> {
        (0..u32::BITS)
            .map(|bit| Self(1 << bit))
            .filter(move |flag| self.contains(*flag))
    }
}

impl BitOr for Method {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Method {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Method {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl FromStr for Method {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "turnon" => Ok(Self::TURNON),
            "turnoff" => Ok(Self::TURNOFF),
            "dim" => Ok(Self::DIM),
            "bell" => Ok(Self::BELL),
            "learn" => Ok(Self::LEARN),
            "up" => Ok(Self::UP),
            "down" => Ok(Self::DOWN),
            "stop" => Ok(Self::STOP),
            "rgb" | "rgbw" => Ok(Self::RGB),
            "thermostat" => Ok(Self::THERMOSTAT),
            other => Err(ValidationError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        for (idx, flag) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str("|")?;
            }
            match flag.mnemonic() {
                Some(name) => f.write_str(name)?,
                None => write!(f, "{}", flag.0)?,
            }
        }
        Ok(())
    }
}
