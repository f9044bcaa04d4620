//! # Connector: session establishment and one-time registration.
//!
//! [`Connector::try_connect`] performs one connection attempt. On success it makes sure
//! the application is registered with the runtime:
//!
//! ```text
//! try_connect(attempt)
//!   ├─ init() Err ─► ConnectFailed{attempt, reason} ─► Err (retried next tick)
//!   └─ init() Ok  ─► Connected{attempt}
//!                    └─► ensure_registered()
//!                          ├─ installed      ─► AlreadyRegistered
//!                          └─ not installed  ─► write manifest if missing
//!                                               ├─► add_application_manifest ─► ManifestRegistered | ManifestFailed
//!                                               └─► set_auto_launch          ─► AutoLaunchEnabled  | AutoLaunchFailed
//! ```
//!
//! Registration steps are best-effort: a failure is published and the next step still runs.
//! Idempotence across attempts is the caller's job (the coordinator stops calling once
//! the connected signal is set).

use std::path::{Path, PathBuf};

use crate::{
    config::Config,
    error::SessionError,
    events::{Bus, Event, EventKind},
    runtime::{AppManifest, VrRuntime, manifest},
};

/// What [`Connector::ensure_registered`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registration {
    /// The runtime already knew the application; nothing else was attempted.
    pub already_installed: bool,
    /// Manifest was accepted by the runtime.
    pub manifest_registered: bool,
    /// Auto-launch was enabled.
    pub auto_launch_enabled: bool,
}

/// Establishes the runtime session and registers the application.
#[derive(Debug, Clone)]
pub struct Connector {
    app_key: String,
    app_name: String,
    manifest_path: PathBuf,
    auto_launch: bool,
}

impl Connector {
    /// Creates a connector registering `app_key` from the manifest at `manifest_path`.
    pub fn new(app_key: impl Into<String>, manifest_path: impl Into<PathBuf>) -> Self {
        let app_key = app_key.into();
        Self {
            app_name: app_key.clone(),
            app_key,
            manifest_path: manifest_path.into(),
            auto_launch: true,
        }
    }

    /// Creates a connector from the configured key, name, manifest and auto-launch flag.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.app_key.clone(), cfg.manifest_path())
            .with_app_name(cfg.app_name.clone())
            .with_auto_launch(cfg.auto_launch)
    }

    /// Display name used when a manifest has to be generated.
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Whether registration enables auto-launch.
    pub fn with_auto_launch(mut self, enabled: bool) -> Self {
        self.auto_launch = enabled;
        self
    }

    /// One connection attempt; registration runs only when it succeeds.
    pub fn try_connect<R: VrRuntime + ?Sized>(
        &self,
        runtime: &mut R,
        attempt: u32,
        bus: &Bus,
    ) -> Result<Registration, SessionError> {
        if let Err(e) = runtime.init() {
            bus.publish(
                Event::new(EventKind::ConnectFailed)
                    .with_attempt(attempt)
                    .with_reason(e.to_string()),
            );
            return Err(e);
        }
        bus.publish(Event::new(EventKind::Connected).with_attempt(attempt));
        Ok(self.ensure_registered(runtime, bus))
    }

    /// Registers the manifest and auto-launch unless the runtime already knows the app.
    pub fn ensure_registered<R: VrRuntime + ?Sized>(
        &self,
        runtime: &mut R,
        bus: &Bus,
    ) -> Registration {
        if runtime.is_application_installed(&self.app_key) {
            bus.publish(Event::new(EventKind::AlreadyRegistered).with_reason(self.app_key.as_str()));
            return Registration {
                already_installed: true,
                ..Registration::default()
            };
        }

        let mut reg = Registration::default();
        match self.manifest_for_registration(bus) {
            Ok(path) => match runtime.add_application_manifest(&path) {
                Ok(()) => {
                    reg.manifest_registered = true;
                    bus.publish(
                        Event::new(EventKind::ManifestRegistered).with_path(path.display().to_string()),
                    );
                }
                Err(e) => publish_manifest_failed(bus, &path, &e.to_string()),
            },
            Err(reason) => publish_manifest_failed(bus, &self.manifest_path, &reason),
        }

        if self.auto_launch {
            match runtime.set_auto_launch(&self.app_key, true) {
                Ok(()) => {
                    reg.auto_launch_enabled = true;
                    bus.publish(
                        Event::new(EventKind::AutoLaunchEnabled).with_reason(self.app_key.as_str()),
                    );
                }
                Err(e) => bus.publish(
                    Event::new(EventKind::AutoLaunchFailed).with_reason(e.to_string()),
                ),
            }
        }
        reg
    }

    /// Writes the manifest when missing and returns its absolute path.
    fn manifest_for_registration(&self, bus: &Bus) -> Result<PathBuf, String> {
        if !self.manifest_path.exists() {
            let m = AppManifest::for_current_exe(&self.app_key, &self.app_name)
                .map_err(|e| e.to_string())?;
            m.write(&self.manifest_path).map_err(|e| e.to_string())?;
            bus.publish(
                Event::new(EventKind::ManifestWritten)
                    .with_path(self.manifest_path.display().to_string()),
            );
        }
        manifest::absolute(&self.manifest_path).map_err(|e| e.to_string())
    }
}

fn publish_manifest_failed(bus: &Bus, path: &Path, reason: &str) {
    bus.publish(
        Event::new(EventKind::ManifestFailed)
            .with_path(path.display().to_string())
            .with_reason(reason),
    );
}
