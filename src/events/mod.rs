//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to publish and
//! subscribe to events emitted while the lifecycle runs.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Coordinator`, `Connector`, `EventMonitor`, `ScriptRunner`,
//!   `Lifecycle` (OS signals, completion), `HostHandle` (force quit),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `Lifecycle::subscriber_listener()` (fans out to `SubscriberSet`), tests.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
