//! # Runtime configuration.
//!
//! Provides [`Config`], the centralized settings for the lifecycle runtime and the host shell.
//!
//! Config is loaded once at startup:
//! 1. **Explicit file**: `--config <FILE>` on the command line
//! 2. **Implicit file**: [`DEFAULT_CONFIG_FILE`] in the working directory, when present
//! 3. **Defaults**: [`Config::default`] otherwise
//!
//! Missing keys in a file fall back to their defaults.
//!
//! ## Example file
//! ```toml
//! script_pattern = "*.cmd"
//! poll_interval_ms = 100
//! log_max_lines = 500
//! openvr_library = "C:/tools/openvr_api.dll"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{error::ConfigError, scripts::ScriptPhase};

/// File name looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "vrscripts.toml";

/// Script glob used when none is configured or the configured one is rejected.
pub const DEFAULT_SCRIPT_PATTERN: &str = "*.cmd";

/// Global configuration for the lifecycle runtime.
///
/// ## Field semantics
/// - `base_dir`: root for phase directories, log file and manifest (relative paths resolve here)
/// - `poll_interval_ms`: connection/readiness poll tick (`0` is clamped to 1ms)
/// - `event_poll_interval_ms`: event-queue drain tick while waiting for quit
/// - `force_quit_grace_ms`: delay before the host shell offers the force-quit prompt
/// - `log_max_lines`: log buffer cap; oldest lines are dropped first (min 1)
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory containing `boot/`, `start/` and `stop/`.
    pub base_dir: PathBuf,
    /// Glob matched against file names inside each phase directory.
    pub script_pattern: String,
    /// Main loop tick in milliseconds.
    pub poll_interval_ms: u64,
    /// Wait-for-quit tick in milliseconds.
    pub event_poll_interval_ms: u64,
    /// Delay before the force-quit prompt, in milliseconds.
    pub force_quit_grace_ms: u64,
    /// Log file written at shutdown. Its absence marks the first run.
    pub log_file: PathBuf,
    /// Maximum number of buffered log lines.
    pub log_max_lines: usize,
    /// Application key registered with the runtime.
    pub app_key: String,
    /// Display name placed in a generated manifest.
    pub app_name: String,
    /// Application manifest registered with the runtime.
    pub manifest_file: PathBuf,
    /// Whether to enable auto-launch when registering.
    pub auto_launch: bool,
    /// Explicit path to the runtime client library.
    pub openvr_library: Option<PathBuf>,
    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - scripts matched by `*.cmd` under `./boot`, `./start`, `./stop`
    /// - `100ms` poll tick, `1s` event tick, `2s` force-quit grace
    /// - `vrscripts.log` capped at 1000 lines
    /// - auto-launch enabled for `vrscripts.lifecycle`
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            script_pattern: DEFAULT_SCRIPT_PATTERN.to_string(),
            poll_interval_ms: 100,
            event_poll_interval_ms: 1000,
            force_quit_grace_ms: 2000,
            log_file: PathBuf::from("vrscripts.log"),
            log_max_lines: 1000,
            app_key: "vrscripts.lifecycle".to_string(),
            app_name: "VR Scripts".to_string(),
            manifest_file: PathBuf::from("vrscripts.vrmanifest"),
            auto_launch: true,
            openvr_library: None,
            bus_capacity: 1024,
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists.
    ///
    /// Returns defaults when no path is given and no default file is present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Self::from_file(implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Like [`load`](Self::load), but a rejected file yields defaults plus the error.
    ///
    /// A broken configuration file must not keep the scripts from running.
    pub fn load_or_default(path: Option<&Path>) -> (Self, Option<ConfigError>) {
        match Self::load(path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Parses a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Main loop tick.
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Event-queue drain tick.
    #[inline]
    pub fn event_poll_interval(&self) -> Duration {
        Duration::from_millis(self.event_poll_interval_ms.max(1))
    }

    /// Delay before the force-quit prompt.
    #[inline]
    pub fn force_quit_grace(&self) -> Duration {
        Duration::from_millis(self.force_quit_grace_ms)
    }

    /// Directory scanned for the given phase.
    pub fn phase_dir(&self, phase: ScriptPhase) -> PathBuf {
        self.base_dir.join(phase.dir_name())
    }

    /// Log file path resolved against `base_dir`.
    pub fn log_path(&self) -> PathBuf {
        self.resolve(&self.log_file)
    }

    /// Manifest path resolved against `base_dir`.
    pub fn manifest_path(&self) -> PathBuf {
        self.resolve(&self.manifest_file)
    }

    /// Log buffer cap clamped to a minimum of 1.
    #[inline]
    pub fn log_max_lines_clamped(&self) -> usize {
        self.log_max_lines.max(1)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }
}
