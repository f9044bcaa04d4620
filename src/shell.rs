//! # Host shell: the console side of the process.
//!
//! ```text
//! first run (log file absent)?
//!   └─ yes ─► print guidance ─► wait for Enter
//! mark_ready ─► minimize console ─► sleep(grace)
//! print "press Enter to force quit"
//! select!
//!   ├─ worker done     ─► return
//!   └─ Enter           ─► force_quit ─► await worker
//! ```
//!
//! Every wait races against the worker so a lifecycle that ends on its own (or on an OS
//! signal) never leaves the shell stuck on input. End of input is not a force quit.

use std::{future::Future, path::Path, time::Duration};

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    select, time,
};

use crate::{
    config::Config,
    core::HostHandle,
    scripts::ScriptPhase::{Boot, Start, Stop},
};

/// Console flow around the background worker.
pub struct HostShell {
    handle: HostHandle,
    grace: Duration,
    first_run: bool,
    guidance: String,
}

impl HostShell {
    pub fn new(handle: HostHandle, grace: Duration, first_run: bool, guidance: String) -> Self {
        Self {
            handle,
            grace,
            first_run,
            guidance,
        }
    }

    /// First run is detected from the absence of the log file.
    pub fn from_config(cfg: &Config, handle: HostHandle) -> Self {
        Self::new(
            handle,
            cfg.force_quit_grace(),
            is_first_run(&cfg.log_path()),
            guidance(cfg),
        )
    }

    /// Runs the console flow on stdin until `done` completes.
    pub async fn run<F: Future>(self, done: F) -> F::Output {
        self.run_with(BufReader::new(tokio::io::stdin()), done).await
    }

    /// Same as [`run`](Self::run) with an explicit input source.
    pub async fn run_with<I, F>(self, input: I, done: F) -> F::Output
    where
        I: AsyncBufRead + Unpin,
        F: Future,
    {
        tokio::pin!(done);
        let mut lines = input.lines();

        if self.first_run {
            println!("{}", self.guidance);
            println!("Press Enter to continue...");
            select! {
                biased;
                out = &mut done => return out,
                _ = lines.next_line() => {}
            }
        }

        self.handle.mark_ready();
        minimize_console();

        select! {
            biased;
            out = &mut done => return out,
            _ = time::sleep(self.grace) => {}
        }

        println!("Press Enter to force quit.");
        select! {
            biased;
            out = &mut done => return out,
            line = lines.next_line() => {
                if let Ok(Some(_)) = line {
                    self.handle.force_quit();
                }
            }
        }
        done.await
    }
}

/// `true` when no log file has been written yet.
pub fn is_first_run(log_path: &Path) -> bool {
    !log_path.exists()
}

/// Text shown on first run.
pub fn guidance(cfg: &Config) -> String {
    let dir = |p| cfg.phase_dir(p).display().to_string();
    format!(
        "{name} runs your scripts around the VR session.\n\
         \n\
         Put files matching {pattern} into:\n\
         \x20 {boot}\n\
         \x20   run as soon as this program starts\n\
         \x20 {start}\n\
         \x20   run once the VR runtime is up\n\
         \x20 {stop}\n\
         \x20   run when the VR runtime quits\n\
         \n\
         The folders are created if missing. The program registers itself to start with\n\
         the VR runtime; this message is shown only once.",
        name = cfg.app_name,
        pattern = cfg.script_pattern,
        boot = dir(Boot),
        start = dir(Start),
        stop = dir(Stop),
    )
}

/// Minimizes the console window this process is attached to.
#[cfg(windows)]
pub fn minimize_console() {
    use windows_sys::Win32::{
        System::Console::GetConsoleWindow,
        UI::WindowsAndMessaging::{SW_MINIMIZE, ShowWindow},
    };

    // SAFETY: both calls accept any window handle; a null handle is skipped.
    unsafe {
        let hwnd = GetConsoleWindow();
        if !hwnd.is_null() {
            ShowWindow(hwnd, SW_MINIMIZE);
        }
    }
}

/// Minimizes the console window this process is attached to.
#[cfg(not(windows))]
pub fn minimize_console() {}
