//! # Lifecycle event bus.
//!
//! [`Bus`] wraps a [`tokio::sync::broadcast`] sender. Every component that reports
//! progress holds a clone and publishes without waiting:
//!
//! ```text
//! Coordinator, Connector, EventMonitor, ScriptRunner, HostHandle, Lifecycle
//!        │ publish(Event)
//!        ▼
//!       Bus ──► Lifecycle listener ──► SubscriberSet
//!        └────► test receivers (subscribe before the lifecycle starts)
//! ```
//!
//! The channel is a single ring of `capacity` events shared by all receivers. A receiver
//! that falls behind gets `RecvError::Lagged(n)` and loses the `n` oldest events; events
//! published while nobody is subscribed are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle for publishing and observing lifecycle events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus retaining up to `capacity` unread events (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Sends `ev` to every current receiver. Never blocks; no receivers means no-op.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// New receiver seeing only events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
