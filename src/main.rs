//! `vrscripts` binary: the host shell.
//!
//! Loads configuration, installs logging, starts the lifecycle and drives the console
//! until the worker is done. A rejected configuration file or script pattern is logged
//! and replaced by defaults. The process always exits with code 0 after the log buffer
//! has been written; a pending console read cannot be cancelled, so exit is explicit.

use std::{path::PathBuf, process, sync::Arc};

use clap::Parser;
use tracing::{error, info};

use vrscripts::{
    Config, HostShell, Lifecycle, LogBuffer, LogWriter, OpenVr, ScriptRunner, ShellLauncher,
    Subscribe, init_logging,
};

#[derive(Parser, Debug)]
#[command(name = "vrscripts", version)]
#[command(about = "Runs boot, start and stop scripts around the VR runtime session")]
struct Cli {
    /// Configuration file (default: vrscripts.toml in the working directory, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding boot/, start/ and stop/ (overrides the config file)
    #[arg(long)]
    base_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let (mut cfg, cfg_err) = Config::load_or_default(cli.config.as_deref());
    if let Some(dir) = cli.base_dir {
        cfg.base_dir = dir;
    }

    let buffer = LogBuffer::new(cfg.log_max_lines_clamped());
    if let Err(e) = init_logging(buffer.clone()) {
        eprintln!("logging unavailable: {e}");
    }

    if let Some(e) = cfg_err {
        error!(label = e.as_label(), error = %e, "configuration rejected, using defaults");
    }

    let scripts = match ScriptRunner::from_config_or_default(&cfg, Arc::new(ShellLauncher)) {
        Ok((scripts, rejected)) => {
            if let Some(e) = rejected {
                error!(label = e.as_label(), error = %e, "script pattern rejected, using default");
            }
            scripts
        }
        Err(e) => {
            error!(label = e.as_label(), error = %e, "script runner unavailable");
            exit(&buffer, &cfg);
        }
    };

    info!(
        base_dir = %cfg.base_dir.display(),
        pattern = scripts.pattern(),
        "starting"
    );

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let lifecycle = Lifecycle::new(cfg.clone(), subs);
    let shell = HostShell::from_config(&cfg, lifecycle.host());
    let runtime = OpenVr::new(cfg.openvr_library.clone());

    match shell.run(lifecycle.run(runtime, scripts)).await {
        Ok(report) => info!(
            exit = report.exit.as_str(),
            connect_attempts = report.connect_attempts,
            connected = report.connected,
            boot = report.boot_scripts,
            start = ?report.start_scripts,
            stop = ?report.stop_scripts,
            "finished"
        ),
        Err(e) => error!(error = %e, "lifecycle worker failed"),
    }

    exit(&buffer, &cfg);
}

/// Writes the log buffer and terminates the process.
fn exit(buffer: &LogBuffer, cfg: &Config) -> ! {
    let path = cfg.log_path();
    if let Err(e) = buffer.flush_to(&path) {
        eprintln!("cannot write {}: {e}", path.display());
    }
    process::exit(0)
}
