//! In-memory [`VrRuntime`] used by unit tests.

use std::{collections::VecDeque, path::Path, path::PathBuf};

use crate::{
    error::SessionError,
    runtime::{RuntimeEvent, VrRuntime},
};

/// Scripted runtime: fails `init` a fixed number of times, then serves queued batches.
#[derive(Default)]
pub(crate) struct FakeRuntime {
    pub init_failures: u32,
    pub init_calls: u32,
    pub connected: bool,
    pub installed: bool,
    pub manifest_error: bool,
    pub auto_launch_error: bool,
    pub manifests: Vec<PathBuf>,
    pub auto_launch: Vec<(String, bool)>,
    /// One entry per drain; `Err` makes the first poll of that drain fail.
    pub batches: VecDeque<Result<Vec<RuntimeEvent>, SessionError>>,
    pub current: VecDeque<RuntimeEvent>,
    pub in_batch: bool,
    pub drains: u32,
    pub acks: u32,
    pub shutdowns: u32,
}

impl VrRuntime for FakeRuntime {
    fn init(&mut self) -> Result<(), SessionError> {
        self.init_calls += 1;
        if self.init_calls <= self.init_failures {
            return Err(SessionError::Init {
                code: 121,
                reason: "not running".into(),
            });
        }
        self.connected = true;
        Ok(())
    }

    fn is_application_installed(&mut self, _app_key: &str) -> bool {
        self.installed
    }

    fn add_application_manifest(&mut self, path: &Path) -> Result<(), SessionError> {
        self.manifests.push(path.to_path_buf());
        if self.manifest_error {
            return Err(SessionError::Manifest {
                reason: "rejected".into(),
            });
        }
        Ok(())
    }

    fn set_auto_launch(&mut self, app_key: &str, enabled: bool) -> Result<(), SessionError> {
        self.auto_launch.push((app_key.to_string(), enabled));
        if self.auto_launch_error {
            return Err(SessionError::AutoLaunch {
                reason: "unknown app".into(),
            });
        }
        Ok(())
    }

    fn poll_next_event(&mut self) -> Result<Option<RuntimeEvent>, SessionError> {
        if !self.in_batch {
            self.drains += 1;
            match self.batches.pop_front() {
                Some(Ok(batch)) => {
                    self.current = batch.into();
                    self.in_batch = true;
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(None),
            }
        }
        match self.current.pop_front() {
            Some(ev) => Ok(Some(ev)),
            None => {
                self.in_batch = false;
                Ok(None)
            }
        }
    }

    fn acknowledge_quit(&mut self) {
        self.acks += 1;
    }

    fn shutdown(&mut self) {
        self.shutdowns += 1;
        self.connected = false;
    }
}
