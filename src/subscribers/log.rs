//! # LogWriter: lifecycle events as `tracing` records
//!
//! Renders every [`Event`] through the `tracing` macros with structured fields, so the
//! same line reaches both the console and the log buffer flushed at shutdown.
//!
//! ## Example output
//! ```text
//! INFO vrscripts: phase starting phase=boot
//! INFO vrscripts: script launched phase=start path=./start/a.cmd
//! DEBUG vrscripts: connect failed attempt=3 reason=init failed (121): ...
//! INFO vrscripts: connected attempt=4
//! INFO vrscripts: quit requested batch=2
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let phase = e.phase.map(|p| p.dir_name()).unwrap_or("-");
        let path = e.path.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::StateChanged => {
                debug!(target: "vrscripts", state = e.state.map(|s| s.as_str()), "state changed");
            }
            EventKind::PhaseStarting => {
                info!(target: "vrscripts", phase, "phase starting");
            }
            EventKind::ScriptLaunched => {
                info!(target: "vrscripts", phase, path, "script launched");
            }
            EventKind::ScriptLaunchFailed => {
                warn!(target: "vrscripts", phase, path, reason, "script launch failed");
            }
            EventKind::ScriptListFailed => {
                warn!(target: "vrscripts", phase, reason, "script listing failed");
            }
            EventKind::PhaseFinished => {
                info!(target: "vrscripts", phase, scripts = e.count.unwrap_or(0), "phase finished");
            }
            EventKind::ConnectFailed => {
                debug!(target: "vrscripts", attempt = e.attempt, reason, "connect failed");
            }
            EventKind::Connected => {
                info!(target: "vrscripts", attempt = e.attempt, "connected");
            }
            EventKind::AlreadyRegistered => {
                info!(target: "vrscripts", app_key = reason, "already registered");
            }
            EventKind::ManifestWritten => {
                info!(target: "vrscripts", path, "manifest written");
            }
            EventKind::ManifestRegistered => {
                info!(target: "vrscripts", path, "manifest registered");
            }
            EventKind::ManifestFailed => {
                warn!(target: "vrscripts", path, reason, "manifest registration failed");
            }
            EventKind::AutoLaunchEnabled => {
                info!(target: "vrscripts", app_key = reason, "auto-launch enabled");
            }
            EventKind::AutoLaunchFailed => {
                warn!(target: "vrscripts", reason, "auto-launch failed");
            }
            EventKind::WaitingForQuit => {
                info!(target: "vrscripts", "waiting for runtime quit");
            }
            EventKind::DrainFailed => {
                warn!(target: "vrscripts", reason, "event drain failed");
            }
            EventKind::QuitRequested => {
                info!(target: "vrscripts", batch = e.count.unwrap_or(0), "quit requested");
            }
            EventKind::ForceQuitRequested => {
                info!(target: "vrscripts", "force quit requested");
            }
            EventKind::ShutdownRequested => {
                info!(target: "vrscripts", signal = reason, "shutdown signal received");
            }
            EventKind::SessionReleased => {
                info!(target: "vrscripts", "session released");
            }
            EventKind::LifecycleCompleted => {
                info!(target: "vrscripts", outcome = reason, "lifecycle completed");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "vrscripts", subscriber = path, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: "vrscripts", subscriber = path, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
