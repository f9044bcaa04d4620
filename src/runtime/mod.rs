//! # External VR runtime boundary.
//!
//! [`VrRuntime`] is everything the lifecycle needs from the runtime it attaches to:
//! session init/shutdown, manifest registration, and a pull-style event queue.
//!
//! ## Contents
//! - [`VrRuntime`] - session trait (implemented by [`OpenVr`] and by test fakes)
//! - [`RuntimeEvent`] - the only distinction the lifecycle cares about: quit or not
//! - [`AppManifest`] - generated application manifest for first registration
//!
//! All methods are synchronous: each call returns quickly with a result from the runtime,
//! and the coordinator decides when to call again.

pub(crate) mod manifest;
mod openvr;

#[cfg(test)]
pub(crate) mod fake;

use std::path::Path;

use crate::error::SessionError;

pub use manifest::AppManifest;
pub use openvr::OpenVr;

/// Event pulled from the runtime queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// Runtime is shutting down and expects an acknowledgement.
    Quit,
    /// Any other event, identified by its raw type.
    Other(u32),
}

impl RuntimeEvent {
    /// Returns `true` for quit-type notifications.
    #[inline]
    pub fn is_quit(&self) -> bool {
        matches!(self, RuntimeEvent::Quit)
    }
}

/// Session with the external VR runtime.
///
/// Methods other than [`init`](VrRuntime::init) are only meaningful after a successful
/// `init`; implementations return [`SessionError::NotConnected`] (or `false`) otherwise.
pub trait VrRuntime: Send + 'static {
    /// Establishes the session. Failure is expected while the runtime is not up yet.
    fn init(&mut self) -> Result<(), SessionError>;

    /// Returns `true` if `app_key` is already known to the runtime's manifest system.
    fn is_application_installed(&mut self, app_key: &str) -> bool;

    /// Registers the manifest at `path` (absolute) permanently.
    fn add_application_manifest(&mut self, path: &Path) -> Result<(), SessionError>;

    /// Enables or disables launching `app_key` whenever the runtime starts.
    fn set_auto_launch(&mut self, app_key: &str, enabled: bool) -> Result<(), SessionError>;

    /// Pulls the next queued event, `Ok(None)` when the queue is empty.
    fn poll_next_event(&mut self) -> Result<Option<RuntimeEvent>, SessionError>;

    /// Tells the runtime this process is exiting in response to a quit event.
    fn acknowledge_quit(&mut self);

    /// Releases the session. Safe to call when not connected.
    fn shutdown(&mut self);
}
