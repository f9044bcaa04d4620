//! # Script launchers.
//!
//! [`Launch`] is the seam between script discovery and process creation. The runner only
//! needs "start this file and forget about it"; [`ShellLauncher`] does that through the
//! platform command interpreter:
//!
//! ```text
//! Windows: cmd /C "<script>"   (CREATE_NO_WINDOW)
//! Others:  sh <script>
//! ```
//!
//! The spawned child is dropped right away: no exit status is collected and no output is
//! captured.

use std::{io, path::Path, process::Command};

/// Starts one script without waiting for it.
pub trait Launch: Send + Sync + 'static {
    /// Launches `script`. Returns once the child has been spawned.
    fn launch(&self, script: &Path) -> io::Result<()>;
}

/// Launches scripts through the platform command interpreter.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellLauncher;

impl Launch for ShellLauncher {
    fn launch(&self, script: &Path) -> io::Result<()> {
        command_for(script).spawn().map(drop)
    }
}

#[cfg(windows)]
fn command_for(script: &Path) -> Command {
    use std::os::windows::process::CommandExt;
    use windows_sys::Win32::System::Threading::CREATE_NO_WINDOW;

    let mut cmd = Command::new("cmd");
    cmd.arg("/C")
        .raw_arg(format!("\"{}\"", script.display()))
        .creation_flags(CREATE_NO_WINDOW);
    cmd
}

#[cfg(not(windows))]
fn command_for(script: &Path) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg(script);
    cmd
}
