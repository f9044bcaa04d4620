//! # Phase script runner.
//!
//! [`ScriptRunner`] resolves a phase directory, lists the files matching the configured
//! glob, and hands each one to a [`Launch`] implementation.
//!
//! ## Event flow
//! ```text
//! run(phase)
//!   ├─► PhaseStarting{phase}
//!   ├─► list(phase) ──Err──► ScriptListFailed{phase} ─► PhaseFinished{count=0}
//!   ├─► for each match:
//!   │     ├─ Ok  ─► ScriptLaunched{phase, path}
//!   │     └─ Err ─► ScriptLaunchFailed{phase, path, reason}
//!   └─► PhaseFinished{phase, count=matches}
//! ```
//!
//! ## Rules
//! - A launch failure never stops the remaining launches of the phase
//! - The returned count is the number of matching files, so `N` files mean `N` attempts

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use globset::{GlobBuilder, GlobMatcher};

use crate::{
    config::{Config, DEFAULT_SCRIPT_PATTERN},
    error::ScriptError,
    events::{Bus, Event, EventKind},
    scripts::{Launch, ScriptPhase},
};

/// Discovers and launches phase scripts.
pub struct ScriptRunner {
    base_dir: PathBuf,
    pattern: String,
    matcher: GlobMatcher,
    launcher: Arc<dyn Launch>,
}

impl ScriptRunner {
    /// Creates a runner rooted at `base_dir`, matching file names against `pattern`.
    ///
    /// Matching is case-insensitive on Windows.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        pattern: &str,
        launcher: Arc<dyn Launch>,
    ) -> Result<Self, ScriptError> {
        let matcher = GlobBuilder::new(pattern)
            .case_insensitive(cfg!(windows))
            .literal_separator(true)
            .build()
            .map_err(|source| ScriptError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();

        Ok(Self {
            base_dir: base_dir.into(),
            pattern: pattern.to_string(),
            matcher,
            launcher,
        })
    }

    /// Creates a runner from the configured base directory and pattern.
    pub fn from_config(cfg: &Config, launcher: Arc<dyn Launch>) -> Result<Self, ScriptError> {
        Self::new(&cfg.base_dir, &cfg.script_pattern, launcher)
    }

    /// Like [`from_config`](Self::from_config), but a rejected pattern is replaced by
    /// [`DEFAULT_SCRIPT_PATTERN`]; the rejection is returned next to the runner.
    pub fn from_config_or_default(
        cfg: &Config,
        launcher: Arc<dyn Launch>,
    ) -> Result<(Self, Option<ScriptError>), ScriptError> {
        match Self::from_config(cfg, Arc::clone(&launcher)) {
            Ok(runner) => Ok((runner, None)),
            Err(e) => {
                let runner = Self::new(&cfg.base_dir, DEFAULT_SCRIPT_PATTERN, launcher)?;
                Ok((runner, Some(e)))
            }
        }
    }

    /// Glob used to select scripts.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Directory scanned for `phase`.
    pub fn dir(&self, phase: ScriptPhase) -> PathBuf {
        self.base_dir.join(phase.dir_name())
    }

    /// Lists matching scripts of `phase`, sorted by file name.
    ///
    /// Creates the phase directory when it is missing.
    pub fn list(&self, phase: ScriptPhase) -> Result<Vec<PathBuf>, ScriptError> {
        let dir = self.dir(phase);
        fs::create_dir_all(&dir).map_err(|source| ScriptError::CreateDir {
            dir: dir.clone(),
            source,
        })?;

        let entries = fs::read_dir(&dir).map_err(|source| ScriptError::ReadDir {
            dir: dir.clone(),
            source,
        })?;

        let mut scripts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ScriptError::ReadDir {
                dir: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && self.matches(&path) {
                scripts.push(path);
            }
        }
        scripts.sort();
        Ok(scripts)
    }

    /// Returns `true` if `phase` currently has at least one matching script.
    ///
    /// A listing failure counts as "no scripts" and is reported on the bus.
    pub fn has_scripts(&self, phase: ScriptPhase, bus: &Bus) -> bool {
        match self.list(phase) {
            Ok(scripts) => !scripts.is_empty(),
            Err(e) => {
                publish_list_failed(bus, phase, &e);
                false
            }
        }
    }

    /// Launches every matching script of `phase` and returns how many were found.
    ///
    /// Never waits for the launched processes.
    pub fn run(&self, phase: ScriptPhase, bus: &Bus) -> usize {
        bus.publish(Event::new(EventKind::PhaseStarting).with_phase(phase));

        let scripts = match self.list(phase) {
            Ok(s) => s,
            Err(e) => {
                publish_list_failed(bus, phase, &e);
                publish_finished(bus, phase, 0);
                return 0;
            }
        };

        for script in &scripts {
            match self.launcher.launch(script) {
                Ok(()) => bus.publish(
                    Event::new(EventKind::ScriptLaunched)
                        .with_phase(phase)
                        .with_path(script.display().to_string()),
                ),
                Err(source) => {
                    let err = ScriptError::Launch {
                        script: script.clone(),
                        source,
                    };
                    bus.publish(
                        Event::new(EventKind::ScriptLaunchFailed)
                            .with_phase(phase)
                            .with_path(script.display().to_string())
                            .with_reason(err.to_string()),
                    );
                }
            }
        }

        publish_finished(bus, phase, scripts.len());
        scripts.len()
    }

    fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.matcher.is_match(Path::new(name)))
    }
}

fn publish_list_failed(bus: &Bus, phase: ScriptPhase, err: &ScriptError) {
    bus.publish(
        Event::new(EventKind::ScriptListFailed)
            .with_phase(phase)
            .with_reason(err.to_string()),
    );
}

fn publish_finished(bus: &Bus, phase: ScriptPhase, count: usize) {
    bus.publish(
        Event::new(EventKind::PhaseFinished)
            .with_phase(phase)
            .with_count(count),
    );
}
