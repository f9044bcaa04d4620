//! Lifecycle core: signals, session handling, and the coordinator state machine.
//!
//! Public entry point is [`Lifecycle`], which spawns the [`Coordinator`] as the background
//! worker and handles OS signals and event delivery around it.
//!
//! Internal modules:
//! - [`latch`]: set-once flag with async wait;
//! - [`signals`]: ready / connected / cancel bundle and the host shell's [`HostHandle`];
//! - [`connector`]: one connection attempt plus one-time registration;
//! - [`monitor`]: polls the runtime event queue for a quit notification;
//! - [`coordinator`]: boot, connect, start, wait, stop;
//! - [`lifecycle`]: worker spawn, subscriber fan-out, OS signal handling;
//! - [`shutdown`]: cross-platform termination signals.

mod connector;
mod coordinator;
mod latch;
mod lifecycle;
mod monitor;
mod shutdown;
mod signals;

pub use connector::{Connector, Registration};
pub use coordinator::{Coordinator, ExitReason, LifecycleState, Report};
pub use latch::Latch;
pub use lifecycle::Lifecycle;
pub use monitor::EventMonitor;
pub use signals::{HostHandle, Signals};
