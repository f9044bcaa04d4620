//! # Shared lifecycle signals.
//!
//! The foreground host shell and the background worker share exactly three set-once
//! primitives, bundled in [`Signals`]:
//!
//! | Signal      | Written by                          | Read by     |
//! |-------------|-------------------------------------|-------------|
//! | `ready`     | host shell                          | coordinator |
//! | `connected` | coordinator (after `Connector`)     | coordinator |
//! | `cancel`    | host shell, coordinator, monitor, OS signal watcher | everyone |
//!
//! [`HostHandle`] is the host shell's restricted view: it can raise `ready` and cancel,
//! but never touches `connected`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::latch::Latch;
use crate::events::{Bus, Event, EventKind};

/// Set-once signals shared between the host shell and the coordinator.
#[derive(Clone, Debug, Default)]
pub struct Signals {
    ready: Arc<Latch>,
    connected: Arc<Latch>,
    cancel: CancellationToken,
}

impl Signals {
    /// Creates a fresh, all-unset bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the ready signal. Returns `true` on the first call.
    pub fn mark_ready(&self) -> bool {
        self.ready.set()
    }

    /// Returns `true` once the host shell finished its initial setup.
    pub fn is_ready(&self) -> bool {
        self.ready.is_set()
    }

    /// Raises the connected signal. Returns `true` on the first call.
    pub fn mark_connected(&self) -> bool {
        self.connected.set()
    }

    /// Returns `true` once a runtime session was established.
    pub fn is_connected(&self) -> bool {
        self.connected.is_set()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once cancellation was requested by anyone.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Process-wide cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Waits until the ready signal is raised.
    pub async fn ready(&self) {
        self.ready.wait().await
    }

    /// Restricted view handed to the host shell.
    pub fn host_handle(&self, bus: Bus) -> HostHandle {
        HostHandle {
            ready: Arc::clone(&self.ready),
            cancel: self.cancel.clone(),
            bus,
        }
    }
}

/// Host shell side of the signals: raise ready, force quit.
#[derive(Clone, Debug)]
pub struct HostHandle {
    ready: Arc<Latch>,
    cancel: CancellationToken,
    bus: Bus,
}

impl HostHandle {
    /// Raises the ready signal once initial setup (first-run prompt, if any) completed.
    pub fn mark_ready(&self) -> bool {
        self.ready.set()
    }

    /// Ends the lifecycle early. Only the first call publishes `ForceQuitRequested`.
    pub fn force_quit(&self) {
        if !self.cancel.is_cancelled() {
            self.bus.publish(Event::new(EventKind::ForceQuitRequested));
        }
        self.cancel.cancel();
    }

    /// Returns `true` once cancellation was requested by anyone.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes when cancellation is requested by anyone.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}
