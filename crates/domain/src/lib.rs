//! # devicehub-domain
//!
//! Pure domain model for the devicehub device-abstraction core.
//!
//! ## Responsibilities
//! - Foundational types: device identifiers, error conventions, timestamps
//! - The **method codec** (capability bitmask, mnemonics, graceful fallbacks)
//! - **Sensor readings** and the debounced sensor table
//! - **Device state** and its duplicate-suppression rule
//! - **Command values** and their normalization per method
//! - The **persisted settings** record used to rehydrate cached devices
//! - **Events** emitted when a device reports something to its manager
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod battery;
pub mod command;
pub mod device_type;
pub mod event;
pub mod method;
pub mod sensor;
pub mod settings;
pub mod state;
