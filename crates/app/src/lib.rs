//! # devicehub-app
//!
//! Application layer: the device extension point, the command protocol and
//! **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the [`Device`](device::Device) trait every transport plugin
//!   implements, and the shared [`DeviceCore`](device::DeviceCore) it embeds
//! - Run commands: capability gating, value normalization, loop-safe
//!   propagation through groups, one-shot success/failure resolution
//! - Keep state and sensor readings, notifying the manager of accepted changes
//! - Flatten the containing-device graph
//! - Rehydrate cached devices and merge them into live ones
//! - Define **port traits**:
//!   - `Manager`: the hub-side collaborator every device reports to
//!   - `EventPublisher`: where manager notifications go
//!   - `Integration`: a source of live devices
//! - Provide **in-process infrastructure** (device registry, event bus)
//!
//! ## Dependency rule
//! Depends on `devicehub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod cached_device;
pub mod command;
pub mod device;
pub mod event_bus;
pub mod graph;
pub mod ports;
pub mod registry;
pub mod store;
