//! # Lifecycle events emitted by the coordinator and its collaborators.
//!
//! The [`EventKind`] enum classifies event types across five categories:
//! - **State events**: coordinator state transitions
//! - **Script events**: phase start/finish and per-script launch results
//! - **Session events**: connection attempts and one-time registration steps
//! - **Shutdown events**: quit notifications, force quit, OS signals, release, completion
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, phase,
//! file paths, attempt numbers and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use vrscripts::{Event, EventKind, ScriptPhase};
//!
//! let ev = Event::new(EventKind::ScriptLaunchFailed)
//!     .with_phase(ScriptPhase::Start)
//!     .with_path("start/a.cmd")
//!     .with_reason("access denied");
//!
//! assert_eq!(ev.kind, EventKind::ScriptLaunchFailed);
//! assert_eq!(ev.phase, Some(ScriptPhase::Start));
//! assert_eq!(ev.path.as_deref(), Some("start/a.cmd"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::LifecycleState;
use crate::scripts::ScriptPhase;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === State events ===
    /// Coordinator entered a new state.
    ///
    /// Sets: `state`
    StateChanged,

    // === Script events ===
    /// A phase directory is about to be scanned.
    ///
    /// Sets: `phase`
    PhaseStarting,

    /// A script was spawned.
    ///
    /// Sets: `phase`, `path`
    ScriptLaunched,

    /// A script could not be spawned; the phase continues.
    ///
    /// Sets: `phase`, `path`, `reason`
    ScriptLaunchFailed,

    /// A phase directory could not be created or listed; treated as empty.
    ///
    /// Sets: `phase`, `reason`
    ScriptListFailed,

    /// A phase finished launching.
    ///
    /// Sets: `phase`, `count` (matching files found)
    PhaseFinished,

    // === Session events ===
    /// Connection attempt failed; retried on the next tick.
    ///
    /// Sets: `attempt`, `reason`
    ConnectFailed,

    /// Session established.
    ///
    /// Sets: `attempt`
    Connected,

    /// Application was already registered with the runtime.
    ///
    /// Sets: `reason` (application key)
    AlreadyRegistered,

    /// A manifest file was generated because none existed.
    ///
    /// Sets: `path`
    ManifestWritten,

    /// Manifest registered with the runtime.
    ///
    /// Sets: `path`
    ManifestRegistered,

    /// Manifest could not be generated or registered.
    ///
    /// Sets: `path`, `reason`
    ManifestFailed,

    /// Auto-launch enabled for the application.
    ///
    /// Sets: `reason` (application key)
    AutoLaunchEnabled,

    /// Auto-launch could not be enabled.
    ///
    /// Sets: `reason`
    AutoLaunchFailed,

    // === Shutdown events ===
    /// Stop scripts are present; polling the runtime for a quit notification.
    WaitingForQuit,

    /// Draining the runtime event queue failed; the wait continues.
    ///
    /// Sets: `reason`
    DrainFailed,

    /// Runtime asked to quit; acknowledged and cancellation raised.
    ///
    /// Sets: `count` (events in the batch that carried the notification)
    QuitRequested,

    /// Host shell forced the lifecycle to end.
    ForceQuitRequested,

    /// OS termination signal observed.
    ShutdownRequested,

    /// Runtime session was shut down.
    SessionReleased,

    /// Worker finished; nothing else will be published by it.
    ///
    /// Sets: `reason` (`completed` or `cancelled`)
    LifecycleCompleted,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `path` (subscriber name), `reason` (panic message)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `path` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Script phase, if applicable.
    pub phase: Option<ScriptPhase>,
    /// Coordinator state (only for `StateChanged`).
    pub state: Option<LifecycleState>,
    /// File path or subscriber name.
    pub path: Option<Arc<str>>,
    /// Connection attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Counter payload (scripts found, batch size).
    pub count: Option<u32>,
    /// Human-readable reason (errors, keys, details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            phase: None,
            state: None,
            path: None,
            attempt: None,
            count: None,
            reason: None,
        }
    }

    /// Attaches a script phase.
    #[inline]
    pub fn with_phase(mut self, phase: ScriptPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a coordinator state.
    #[inline]
    pub fn with_state(mut self, state: LifecycleState) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a path (or subscriber name).
    #[inline]
    pub fn with_path(mut self, path: impl Into<Arc<str>>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a counter, saturating at `u32::MAX`.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_path(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_path(subscriber)
            .with_reason(info)
    }

    /// Returns `true` for events produced by subscriber workers themselves.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
