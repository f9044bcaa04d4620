//! Error types used by the lifecycle runtime and its collaborators.
//!
//! This module defines three error enums:
//!
//! - [`SessionError`]: failures talking to the external VR runtime.
//! - [`ScriptError`]: failures discovering or launching phase scripts.
//! - [`ConfigError`]: failures loading the configuration file.
//!
//! None of them is fatal to the lifecycle: every error is logged and the surrounding
//! operation proceeds as if it had produced an empty result. All types provide
//! `as_label` for logs.

use std::{io, path::PathBuf};
use thiserror::Error;

/// # Errors produced at the external runtime boundary.
///
/// A failed [`init`](crate::VrRuntime::init) is the expected state while the runtime is not
/// up yet; the coordinator retries it on the next poll tick.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Runtime client library could not be loaded or lacks an entry point.
    #[error("runtime library unavailable: {reason}")]
    Library {
        /// Loader diagnostic.
        reason: String,
    },

    /// Session initialisation was refused.
    #[error("init failed ({code}): {reason}")]
    Init {
        /// Runtime error code.
        code: i32,
        /// Runtime-provided description.
        reason: String,
    },

    /// A required runtime interface is not exposed by this runtime version.
    #[error("interface {name} unavailable ({code})")]
    Interface {
        /// Interface version string.
        name: &'static str,
        /// Runtime error code.
        code: i32,
    },

    /// Application manifest could not be written or registered.
    #[error("manifest registration failed: {reason}")]
    Manifest {
        /// Diagnostic message.
        reason: String,
    },

    /// Auto-launch flag could not be changed.
    #[error("auto-launch update failed: {reason}")]
    AutoLaunch {
        /// Diagnostic message.
        reason: String,
    },

    /// Operation needs an established session.
    #[error("not connected")]
    NotConnected,

    /// Event queue could not be read.
    #[error("event poll failed: {reason}")]
    Poll {
        /// Diagnostic message.
        reason: String,
    },
}

impl SessionError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use vrscripts::SessionError;
    ///
    /// let err = SessionError::Init { code: 121, reason: "not running".into() };
    /// assert_eq!(err.as_label(), "session_init");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionError::Library { .. } => "session_library",
            SessionError::Init { .. } => "session_init",
            SessionError::Interface { .. } => "session_interface",
            SessionError::Manifest { .. } => "session_manifest",
            SessionError::AutoLaunch { .. } => "session_auto_launch",
            SessionError::NotConnected => "session_not_connected",
            SessionError::Poll { .. } => "session_poll",
        }
    }
}

/// # Errors produced while discovering or launching scripts.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Phase directory could not be created.
    #[error("cannot create {dir:?}: {source}")]
    CreateDir {
        /// Directory path.
        dir: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Phase directory could not be listed.
    #[error("cannot list {dir:?}: {source}")]
    ReadDir {
        /// Directory path.
        dir: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Child process could not be started.
    #[error("cannot launch {script:?}: {source}")]
    Launch {
        /// Script path.
        script: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Script pattern is not a valid glob.
    #[error("invalid script pattern {pattern:?}: {source}")]
    Pattern {
        /// Offending pattern.
        pattern: String,
        /// Glob compiler error.
        source: globset::Error,
    },
}

impl ScriptError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ScriptError::CreateDir { .. } => "script_create_dir",
            ScriptError::ReadDir { .. } => "script_read_dir",
            ScriptError::Launch { .. } => "script_launch",
            ScriptError::Pattern { .. } => "script_pattern",
        }
    }
}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("cannot read config {path:?}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Configuration file is not valid TOML for [`Config`](crate::Config).
    #[error("cannot parse config {path:?}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// TOML decoder error.
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse { .. } => "config_parse",
        }
    }
}
