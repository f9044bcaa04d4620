//! # vrscripts
//!
//! **vrscripts** runs user scripts around the lifetime of a VR runtime session: when the
//! program starts (`boot/`), once the runtime is reachable (`start/`), and when the
//! runtime quits (`stop/`).
//!
//! It is a companion process: it never runs inside the runtime, it attaches to it as a
//! background application, registers itself for auto-launch, and exits once the session
//! is over.
//!
//! ## Architecture
//! ```text
//!   main (host shell)                        Lifecycle::run
//!  ┌────────────────────────┐               ┌──────────────────────────────────────┐
//!  │ first-run guidance     │   HostHandle  │  spawn Coordinator (worker)          │
//!  │ mark_ready ────────────┼──────────────►│    ├─ ScriptRunner  (boot/start/stop)│
//!  │ Enter ─► force_quit ───┼──────────────►│    ├─ Connector     (init, register) │
//!  │ await worker           │               │    └─ EventMonitor  (quit polling)   │
//!  │ flush LogBuffer, exit 0│               │  OS signal ─► cancel                 │
//!  └────────────────────────┘               └──────────────┬───────────────────────┘
//!                                                          │ publish(Event)
//!                                                          ▼
//!                                              Bus ─► SubscriberSet ─► LogWriter ─► tracing
//!                                                                                ├─► stderr
//!                                                                                └─► LogBuffer
//! ```
//!
//! ### Coordinator
//! ```text
//! Booting ─► Connecting ⇄ AwaitingReady ─► RunningStart ─┬─────────────────────────────┐
//!                                                        └─► WaitingForQuit ─► RunningStop
//!                                                                                      │
//!                                                                        ShuttingDown ◄┘
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                      |
//! |-------------------|-------------------------------------------------------------|-----------------------------------------|
//! | **Lifecycle**     | Worker spawn, OS signals, subscriber drain                  | [`Lifecycle`], [`Coordinator`]          |
//! | **Signals**       | Set-once ready / connected flags and cancellation           | [`Latch`], [`Signals`], [`HostHandle`]  |
//! | **Runtime**       | External session boundary and the OpenVR adapter            | [`VrRuntime`], [`OpenVr`]               |
//! | **Scripts**       | Phase directories, glob matching, fire-and-forget launch    | [`ScriptRunner`], [`Launch`]            |
//! | **Events**        | Every lifecycle step as an [`Event`] on a broadcast [`Bus`] | [`Subscribe`], [`LogWriter`]            |
//! | **Configuration** | TOML file with defaults for every field                     | [`Config`]                              |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use vrscripts::{Config, Lifecycle, LogWriter, OpenVr, ScriptRunner, ShellLauncher, Subscribe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
//!     let scripts = ScriptRunner::from_config(&cfg, Arc::new(ShellLauncher))?;
//!     let runtime = OpenVr::new(cfg.openvr_library.clone());
//!
//!     let lifecycle = Lifecycle::new(cfg, subs);
//!     lifecycle.host().mark_ready();
//!     let report = lifecycle.run(runtime, scripts).await?;
//!     println!("{report:?}");
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod logbuf;
mod runtime;
mod scripts;
mod shell;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_SCRIPT_PATTERN};
pub use crate::core::{
    Connector, Coordinator, EventMonitor, ExitReason, HostHandle, Latch, Lifecycle,
    LifecycleState, Registration, Report, Signals,
};
pub use error::{ConfigError, ScriptError, SessionError};
pub use events::{Bus, Event, EventKind};
pub use logbuf::{LineWriter, LogBuffer, init_logging};
pub use runtime::{AppManifest, OpenVr, RuntimeEvent, VrRuntime};
pub use scripts::{Launch, ScriptPhase, ScriptRunner, ShellLauncher};
pub use shell::{HostShell, guidance, is_first_run, minimize_console};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
