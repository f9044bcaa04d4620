//! # Set-once latch.
//!
//! [`Latch`] is a boolean that can go from unset to set exactly once and never back.
//! Readers either poll [`Latch::is_set`] or await [`Latch::wait`]; setting wakes every
//! pending waiter.
//!
//! ```text
//! unset ──set()──► set      (further set() calls return false)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Single-assignment, broadcast-on-set flag.
#[derive(Debug, Default)]
pub struct Latch {
    set: AtomicBool,
    notify: Notify,
}

impl Latch {
    /// Creates an unset latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latch. Returns `true` only for the call that actually flipped it.
    pub fn set(&self) -> bool {
        let first = !self.set.swap(true, Ordering::AcqRel);
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    /// Returns `true` once the latch has been set.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Waits until the latch is set (returns immediately if it already is).
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent `set` cannot be missed.
            notified.as_mut().enable();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}
