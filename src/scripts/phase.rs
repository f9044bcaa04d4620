use std::fmt;

/// Lifecycle point at which a script directory is scanned and executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptPhase {
    /// Process launch, before any connection attempt.
    Boot,
    /// Runtime connected and host ready.
    Start,
    /// Runtime quitting, or cancellation after start.
    Stop,
}

impl ScriptPhase {
    /// All phases in lifecycle order.
    pub const ALL: [ScriptPhase; 3] = [ScriptPhase::Boot, ScriptPhase::Start, ScriptPhase::Stop];

    /// Directory name relative to the configured base directory.
    pub fn dir_name(self) -> &'static str {
        match self {
            ScriptPhase::Boot => "boot",
            ScriptPhase::Start => "start",
            ScriptPhase::Stop => "stop",
        }
    }
}

impl fmt::Display for ScriptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
