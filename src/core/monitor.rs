//! # Event monitor: wait for the runtime to quit.
//!
//! The runtime only exposes a pull-style event queue, so waiting for its shutdown is a
//! timed poll:
//!
//! ```text
//! loop {
//!   ├─► cancelled? ─► return
//!   ├─► drain(): poll_next_event() until None (bounded by MAX_DRAIN)
//!   │      └─ Err ─► DrainFailed, keep what was drained so far
//!   ├─► quit in batch? ─► acknowledge_quit() ─► QuitRequested ─► cancel ─► return
//!   └─► sleep(interval) | cancelled ─► return
//! }
//! ```
//!
//! ## Rules
//! - The only exit is cancellation (raised here on quit, or from outside)
//! - A batch with several quit notifications acknowledges and cancels once
//! - No event is drained after cancellation was observed

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    events::{Bus, Event, EventKind},
    runtime::{RuntimeEvent, VrRuntime},
};

/// Upper bound of events pulled in one drain; the rest waits for the next tick.
const MAX_DRAIN: usize = 1024;

/// Polls the runtime event queue until a quit notification or cancellation.
#[derive(Debug, Clone, Copy)]
pub struct EventMonitor {
    interval: Duration,
}

impl EventMonitor {
    /// Creates a monitor draining the queue every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Drain interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks the caller until `token` is cancelled.
    ///
    /// Cancels `token` itself when the runtime asks to quit, after acknowledging it.
    pub async fn wait_for_quit<R: VrRuntime + ?Sized>(
        &self,
        runtime: &mut R,
        token: &CancellationToken,
        bus: &Bus,
    ) {
        bus.publish(Event::new(EventKind::WaitingForQuit));

        loop {
            if token.is_cancelled() {
                return;
            }

            let batch = drain(runtime, bus);
            if batch.iter().any(RuntimeEvent::is_quit) {
                runtime.acknowledge_quit();
                bus.publish(Event::new(EventKind::QuitRequested).with_count(batch.len()));
                token.cancel();
                return;
            }

            let sleep = time::sleep(self.interval);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => return,
            }
        }
    }
}

/// Pulls every queued event. A poll failure ends the drain early and is reported.
fn drain<R: VrRuntime + ?Sized>(runtime: &mut R, bus: &Bus) -> Vec<RuntimeEvent> {
    let mut batch = Vec::new();
    while batch.len() < MAX_DRAIN {
        match runtime.poll_next_event() {
            Ok(Some(ev)) => batch.push(ev),
            Ok(None) => break,
            Err(e) => {
                bus.publish(Event::new(EventKind::DrainFailed).with_reason(e.to_string()));
                break;
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::SessionError, runtime::fake::FakeRuntime};
    use std::time::Instant;

    const TICK: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn test_quit_acknowledged_and_cancels_once() {
        let mut rt = FakeRuntime::default();
        rt.batches.push_back(Ok(vec![RuntimeEvent::Other(100)]));
        rt.batches.push_back(Ok(vec![
            RuntimeEvent::Quit,
            RuntimeEvent::Other(3),
            RuntimeEvent::Quit,
        ]));
        rt.batches.push_back(Ok(vec![RuntimeEvent::Quit]));
        let token = CancellationToken::new();
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();

        EventMonitor::new(TICK).wait_for_quit(&mut rt, &token, &bus).await;

        assert!(token.is_cancelled());
        assert_eq!(rt.acks, 1);
        assert_eq!(rt.drains, 2);
        assert_eq!(rt.batches.len(), 1);

        let mut quits = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::QuitRequested {
                quits += 1;
                assert_eq!(ev.count, Some(3));
            }
        }
        assert_eq!(quits, 1);
    }

    #[tokio::test]
    async fn test_drain_failure_keeps_waiting() {
        let mut rt = FakeRuntime::default();
        rt.batches.push_back(Err(SessionError::Poll {
            reason: "session lost".into(),
        }));
        rt.batches.push_back(Ok(vec![RuntimeEvent::Quit]));
        let token = CancellationToken::new();
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();

        EventMonitor::new(TICK).wait_for_quit(&mut rt, &token, &bus).await;

        assert_eq!(rt.acks, 1);
        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [
                EventKind::WaitingForQuit,
                EventKind::DrainFailed,
                EventKind::QuitRequested
            ]
        );
    }

    #[tokio::test]
    async fn test_external_cancel_exits_without_draining_again() {
        let mut rt = FakeRuntime::default();
        let token = CancellationToken::new();
        let bus = Bus::new(16);
        let monitor = EventMonitor::new(Duration::from_secs(1));

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(50)).await;
                token.cancel();
            })
        };

        let started = Instant::now();
        monitor.wait_for_quit(&mut rt, &token, &bus).await;
        canceller.await.unwrap();

        assert!(started.elapsed() < monitor.interval());
        assert_eq!(rt.drains, 1);
        assert_eq!(rt.acks, 0);
    }

    #[tokio::test]
    async fn test_already_cancelled_never_drains() {
        let mut rt = FakeRuntime::default();
        let token = CancellationToken::new();
        token.cancel();

        EventMonitor::new(TICK)
            .wait_for_quit(&mut rt, &token, &Bus::new(4))
            .await;

        assert_eq!(rt.drains, 0);
    }
}
