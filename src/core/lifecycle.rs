//! # Lifecycle: wires the worker, event delivery, and OS signals together.
//!
//! [`Lifecycle`] owns the [`Bus`], the [`SubscriberSet`] and the shared [`Signals`]. The
//! binary keeps a [`HostHandle`] for the console side and hands everything else to
//! [`Lifecycle::run`].
//!
//! ## Architecture
//! ```text
//! Lifecycle::run(runtime, scripts)
//!   ├─► subscriber_listener: Bus ─► SubscriberSet::emit ─► [queue] ─► worker ─► on_event
//!   ├─► spawn Coordinator::run()                      (the background worker)
//!   ├─► select!
//!   │     ├─ worker finished                          ─► report
//!   │     └─ wait_for_termination() ─► ShutdownRequested ─► cancel ─► await worker
//!   ├─► LifecycleCompleted{reason}
//!   ├─► stop listener (drains what the bus still holds)
//!   ├─► SubscriberSet::shutdown()                     (every queued event delivered)
//!   └─► subscriber failures raised during the drain ─► warn!
//! ```
//!
//! When `run` returns, every event the worker published has reached every subscriber, so
//! the log buffer can be flushed.

use std::sync::Arc;

use tokio::{
    select,
    sync::broadcast::{
        Receiver,
        error::{RecvError, TryRecvError},
    },
    task::{JoinError, JoinHandle},
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    config::Config,
    core::{Coordinator, HostHandle, Report, Signals, shutdown},
    events::{Bus, Event, EventKind},
    runtime::VrRuntime,
    scripts::ScriptRunner,
    subscribers::{Subscribe, SubscriberSet},
};

/// Top-level driver for one process lifetime.
pub struct Lifecycle {
    cfg: Config,
    bus: Bus,
    signals: Signals,
    subs: Arc<SubscriberSet>,
}

impl Lifecycle {
    /// Creates the bus and spawns one worker per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
        Self {
            cfg,
            bus,
            signals: Signals::new(),
            subs,
        }
    }

    /// Event bus shared with the worker.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Shared signals (tests and embedders may drive them directly).
    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    /// Restricted handle for the console side.
    pub fn host(&self) -> HostHandle {
        self.signals.host_handle(self.bus.clone())
    }

    /// Runs the coordinator until it finishes, then drains every subscriber.
    ///
    /// Returns an error only if the worker task panicked.
    pub async fn run<R: VrRuntime>(
        self,
        runtime: R,
        scripts: ScriptRunner,
    ) -> Result<Report, JoinError> {
        let stop_listener = CancellationToken::new();
        let listener = self.subscriber_listener(stop_listener.clone());

        let mut coordinator = Coordinator::from_config(
            &self.cfg,
            runtime,
            self.signals.clone(),
            scripts,
            self.bus.clone(),
        );
        let worker = tokio::spawn(async move { coordinator.run().await });
        let result = self.drive(worker).await;

        let reason = match &result {
            Ok(report) => report.exit.as_str(),
            Err(_) => "worker_failed",
        };
        self.bus
            .publish(Event::new(EventKind::LifecycleCompleted).with_reason(reason));

        // Workers report panics and overflows on the bus while draining.
        let mut late = self.bus.subscribe();
        stop_listener.cancel();
        let forwarded = match listener.await {
            Ok(last) => last,
            Err(e) => {
                warn!(target: "vrscripts", error = %e, "event listener failed, log may be incomplete");
                None
            }
        };

        match Arc::try_unwrap(self.subs) {
            Ok(subs) => subs.shutdown().await,
            Err(_) => {
                warn!(target: "vrscripts", "subscriber set still shared, queued events not drained")
            }
        }
        report_late_events(&mut late, forwarded);
        result
    }

    /// Waits for the worker; an OS termination signal cancels it first.
    async fn drive(&self, worker: JoinHandle<Report>) -> Result<Report, JoinError> {
        tokio::pin!(worker);
        let signal = async {
            match shutdown::wait_for_termination().await {
                Ok(name) => name,
                Err(e) => {
                    warn!(target: "vrscripts", error = %e, "signal handlers unavailable");
                    std::future::pending().await
                }
            }
        };

        select! {
            res = &mut worker => res,
            name = signal => {
                self.bus.publish(Event::new(EventKind::ShutdownRequested).with_reason(name));
                self.signals.cancel();
                worker.await
            }
        }
    }

    /// Forwards bus events to the subscriber set until `stop`, then drains the backlog.
    ///
    /// Resolves to the `seq` of the last forwarded event.
    fn subscriber_listener(&self, stop: CancellationToken) -> JoinHandle<Option<u64>> {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            let mut last = None;
            loop {
                select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => {
                            last = Some(ev.seq);
                            set.emit(Arc::new(ev));
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => return last,
                    },
                    _ = stop.cancelled() => break,
                }
            }
            loop {
                match rx.try_recv() {
                    Ok(ev) => {
                        last = Some(ev.seq);
                        set.emit(Arc::new(ev));
                    }
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => return last,
                }
            }
        })
    }
}

/// Logs subscriber failures the listener no longer forwarded (`seq` past `forwarded`).
fn report_late_events(rx: &mut Receiver<Event>, forwarded: Option<u64>) {
    loop {
        match rx.try_recv() {
            Ok(ev) if ev.is_subscriber_event() && forwarded.is_none_or(|s| ev.seq > s) => warn!(
                target: "vrscripts",
                kind = ?ev.kind,
                subscriber = ev.path.as_deref().unwrap_or("-"),
                reason = ev.reason.as_deref().unwrap_or("-"),
                "subscriber failed during drain"
            ),
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return,
        }
    }
}
