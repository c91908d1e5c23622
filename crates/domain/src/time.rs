//! Time and timestamp helpers.

use chrono::{DateTime, TimeDelta, Utc};

/// UTC timestamp used for `last_updated`, value change times, events, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whether `previous` lies strictly inside the one-second window before `at`.
///
/// An identical report inside this window is a retransmission, not a change.
/// A report exactly one second later is outside the window.
#[must_use]
pub fn within_duplicate_window(previous: Timestamp, at: Timestamp) -> bool {
    previous > at - TimeDelta::seconds(1)
}
