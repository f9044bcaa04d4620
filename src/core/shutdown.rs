//! # OS termination signals.
//!
//! [`wait_for_termination`] resolves with the name of the first termination signal the
//! process receives. The lifecycle driver treats it like a force quit.
//!
//! | Platform | Signals                          |
//! |----------|----------------------------------|
//! | Unix     | `SIGINT`, `SIGTERM`, `SIGQUIT`   |
//! | Windows  | Ctrl-C, Ctrl-Break, console close |

/// Waits for a termination signal and returns its name.
///
/// Fails only if a listener cannot be registered.
#[cfg(unix)]
pub async fn wait_for_termination() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for a termination signal and returns its name.
///
/// Fails only if a listener cannot be registered.
#[cfg(windows)]
pub async fn wait_for_termination() -> std::io::Result<&'static str> {
    use tokio::signal::windows;

    let mut ctrl_c = windows::ctrl_c()?;
    let mut ctrl_break = windows::ctrl_break()?;
    let mut close = windows::ctrl_close()?;

    let name = tokio::select! {
        _ = ctrl_c.recv()     => "CTRL_C",
        _ = ctrl_break.recv() => "CTRL_BREAK",
        _ = close.recv()      => "CTRL_CLOSE",
    };
    Ok(name)
}

/// Waits for a termination signal and returns its name.
#[cfg(not(any(unix, windows)))]
pub async fn wait_for_termination() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("CTRL_C")
}
