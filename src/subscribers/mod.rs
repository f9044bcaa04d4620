//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out, and the
//! built-in [`LogWriter`] that renders lifecycle events through `tracing`.
//!
//! ## Architecture
//! ```text
//! Coordinator ── publish(Event) ──► Bus ──► Lifecycle listener ──► SubscriberSet
//!                                                                     │
//!                                                              ┌──────┴──────┐
//!                                                              ▼             ▼
//!                                                          LogWriter      custom ...
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
