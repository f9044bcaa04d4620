//! # Phase scripts: discovery and fire-and-forget launch.
//!
//! This module provides the script side of the lifecycle:
//! - [`ScriptPhase`] - which directory is scanned (`boot/`, `start/`, `stop/`)
//! - [`Launch`] - how a single script file is started (trait, swappable in tests)
//! - [`ShellLauncher`] - the platform command interpreter launcher
//! - [`ScriptRunner`] - lists matching files of a phase and launches each of them
//!
//! ## Rules
//! - Phase directories are created on first query (side effect, not an error)
//! - Listing is non-recursive; only regular files whose name matches the pattern count
//! - Launches never wait for the child and never retain its handle

mod launcher;
mod phase;
mod runner;

pub use launcher::{Launch, ShellLauncher};
pub use phase::ScriptPhase;
pub use runner::ScriptRunner;
