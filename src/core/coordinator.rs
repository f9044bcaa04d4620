//! # Coordinator: the lifecycle state machine.
//!
//! Runs on the background worker and owns the runtime session for its whole life.
//!
//! ## Architecture
//! ```text
//! Booting ─► run(Boot)
//!
//! loop (every poll_interval) {
//!   ├─► cancelled?                       ─► break (Cancelled)
//!   ├─► !connected ─► try_connect(attempt) ─Ok─► mark_connected
//!   ├─► connected && ready:
//!   │     ├─► RunningStart ─► run(Start)
//!   │     ├─► has_scripts(Stop)?  (checked once, right after Start)
//!   │     │     └─ yes ─► WaitingForQuit ─► monitor.wait_for_quit()
//!   │     │               └─► RunningStop ─► run(Stop)
//!   │     └─► cancel ─► break (Completed)
//!   └─► sleep(poll_interval) | ready (once connected) | cancelled
//! }
//!
//! ShuttingDown ─► connected? runtime.shutdown() ─► SessionReleased
//! ```
//!
//! ## Rules
//! - Boot scripts run once, before the first connection attempt
//! - Start scripts run at most once and only with both `ready` and `connected` set
//! - Stop scripts run at most once, after Start, and only if the stop directory had
//!   matches when Start finished
//! - Connection failures are retried every tick with no limit
//! - The session is released only if it was ever established

use std::time::Duration;

use tokio::{select, time};

use crate::{
    config::Config,
    core::{EventMonitor, Connector, Signals},
    events::{Bus, Event, EventKind},
    runtime::VrRuntime,
    scripts::{ScriptPhase, ScriptRunner},
};

/// Coordinator state, published as `StateChanged` on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Running boot scripts.
    Booting,
    /// Trying to establish the runtime session.
    Connecting,
    /// Connected; waiting for the host shell to raise ready.
    AwaitingReady,
    /// Running start scripts.
    RunningStart,
    /// Polling the runtime for a quit notification.
    WaitingForQuit,
    /// Running stop scripts.
    RunningStop,
    /// Releasing the session.
    ShuttingDown,
}

impl LifecycleState {
    /// Stable lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Booting => "booting",
            LifecycleState::Connecting => "connecting",
            LifecycleState::AwaitingReady => "awaiting_ready",
            LifecycleState::RunningStart => "running_start",
            LifecycleState::WaitingForQuit => "waiting_for_quit",
            LifecycleState::RunningStop => "running_stop",
            LifecycleState::ShuttingDown => "shutting_down",
        }
    }
}

/// Why the coordinator loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Start (and possibly stop) phase ran to the end.
    Completed,
    /// Cancelled before the start phase (force quit or OS signal).
    Cancelled,
}

impl ExitReason {
    /// Stable lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Completed => "completed",
            ExitReason::Cancelled => "cancelled",
        }
    }
}

/// Summary of one coordinator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub exit: ExitReason,
    /// Number of `try_connect` calls made.
    pub connect_attempts: u32,
    /// Whether a session was ever established.
    pub connected: bool,
    pub boot_scripts: usize,
    /// `None` when the start phase never ran.
    pub start_scripts: Option<usize>,
    /// `None` when the stop phase never ran.
    pub stop_scripts: Option<usize>,
}

/// Drives boot, connection, start, the optional quit wait, and stop.
pub struct Coordinator<R: VrRuntime> {
    runtime: R,
    signals: Signals,
    connector: Connector,
    scripts: ScriptRunner,
    monitor: EventMonitor,
    poll_interval: Duration,
    bus: Bus,
    state: Option<LifecycleState>,
}

impl<R: VrRuntime> Coordinator<R> {
    pub fn new(
        runtime: R,
        signals: Signals,
        connector: Connector,
        scripts: ScriptRunner,
        monitor: EventMonitor,
        poll_interval: Duration,
        bus: Bus,
    ) -> Self {
        Self {
            runtime,
            signals,
            connector,
            scripts,
            monitor,
            poll_interval,
            bus,
            state: None,
        }
    }

    /// Builds a coordinator with the configured intervals and registration settings.
    pub fn from_config(
        cfg: &Config,
        runtime: R,
        signals: Signals,
        scripts: ScriptRunner,
        bus: Bus,
    ) -> Self {
        Self::new(
            runtime,
            signals,
            Connector::from_config(cfg),
            scripts,
            EventMonitor::new(cfg.event_poll_interval()),
            cfg.poll_interval(),
            bus,
        )
    }

    /// The runtime session this coordinator drives.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Last state entered, `None` before [`run`](Self::run).
    pub fn state(&self) -> Option<LifecycleState> {
        self.state
    }

    /// Runs the lifecycle to its end. Always leaves the cancellation token set.
    pub async fn run(&mut self) -> Report {
        let token = self.signals.token().clone();

        self.enter(LifecycleState::Booting);
        let mut report = Report {
            exit: ExitReason::Cancelled,
            connect_attempts: 0,
            connected: false,
            boot_scripts: self.scripts.run(ScriptPhase::Boot, &self.bus),
            start_scripts: None,
            stop_scripts: None,
        };

        while !token.is_cancelled() {
            if !self.signals.is_connected() {
                self.enter(LifecycleState::Connecting);
                report.connect_attempts = report.connect_attempts.saturating_add(1);
                let attempt = report.connect_attempts;
                if self
                    .connector
                    .try_connect(&mut self.runtime, attempt, &self.bus)
                    .is_ok()
                {
                    self.signals.mark_connected();
                }
            }

            let awaiting_ready = self.signals.is_connected();
            if awaiting_ready {
                if self.signals.is_ready() {
                    self.run_phases(&mut report).await;
                    report.exit = ExitReason::Completed;
                    token.cancel();
                    break;
                }
                self.enter(LifecycleState::AwaitingReady);
            }

            let sleep = time::sleep(self.poll_interval);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = self.signals.ready(), if awaiting_ready => {}
                _ = token.cancelled() => break,
            }
        }

        self.enter(LifecycleState::ShuttingDown);
        report.connected = self.signals.is_connected();
        if report.connected {
            self.runtime.shutdown();
            self.bus.publish(Event::new(EventKind::SessionReleased));
        }
        report
    }

    /// Start, then stop if the stop directory had scripts when start finished.
    async fn run_phases(&mut self, report: &mut Report) {
        self.enter(LifecycleState::RunningStart);
        report.start_scripts = Some(self.scripts.run(ScriptPhase::Start, &self.bus));

        if !self.scripts.has_scripts(ScriptPhase::Stop, &self.bus) {
            return;
        }

        self.enter(LifecycleState::WaitingForQuit);
        self.monitor
            .wait_for_quit(&mut self.runtime, self.signals.token(), &self.bus)
            .await;

        self.enter(LifecycleState::RunningStop);
        report.stop_scripts = Some(self.scripts.run(ScriptPhase::Stop, &self.bus));
    }

    fn enter(&mut self, state: LifecycleState) {
        if self.state == Some(state) {
            return;
        }
        self.state = Some(state);
        self.bus
            .publish(Event::new(EventKind::StateChanged).with_state(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        runtime::{RuntimeEvent, fake::FakeRuntime},
        scripts::Launch,
    };
    use std::{
        fs, io,
        path::{Path, PathBuf},
        sync::{Arc, Mutex},
    };

    const TICK: Duration = Duration::from_millis(5);

    #[derive(Default)]
    struct Recorder(Mutex<Vec<PathBuf>>);

    impl Launch for Recorder {
        fn launch(&self, script: &Path) -> io::Result<()> {
            self.0.lock().unwrap().push(script.to_path_buf());
            Ok(())
        }
    }

    fn coordinator(
        base: &Path,
        rt: FakeRuntime,
        signals: &Signals,
        rec: Arc<Recorder>,
    ) -> (Coordinator<FakeRuntime>, Bus) {
        let bus = Bus::new(256);
        let scripts = ScriptRunner::new(base, "*.cmd", rec).unwrap();
        let c = Coordinator::new(
            rt,
            signals.clone(),
            Connector::new("k", base.join("app.vrmanifest")),
            scripts,
            EventMonitor::new(TICK),
            TICK,
            bus.clone(),
        );
        (c, bus)
    }

    fn touch(base: &Path, phase: &str, name: &str) {
        let dir = base.join(phase);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), "").unwrap();
    }

    #[tokio::test]
    async fn test_completes_without_stop_scripts() {
        let base = tempfile::tempdir().unwrap();
        touch(base.path(), "start", "a.cmd");
        let signals = Signals::new();
        signals.mark_ready();
        let rec = Arc::new(Recorder::default());
        let (mut c, bus) = coordinator(base.path(), FakeRuntime::default(), &signals, rec.clone());
        let mut rx = bus.subscribe();

        let report = c.run().await;

        assert_eq!(report.exit, ExitReason::Completed);
        assert_eq!(report.start_scripts, Some(1));
        assert_eq!(report.stop_scripts, None);
        assert!(signals.is_cancelled());
        assert_eq!(c.state(), Some(LifecycleState::ShuttingDown));
        assert_eq!(c.runtime().shutdowns, 1);
        assert_eq!(c.runtime().drains, 0);
        for dir in ["boot", "start", "stop"] {
            assert!(base.path().join(dir).is_dir());
        }

        let mut states = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let Some(s) = ev.state {
                states.push(s);
            }
        }
        assert_eq!(
            states,
            [
                LifecycleState::Booting,
                LifecycleState::Connecting,
                LifecycleState::RunningStart,
                LifecycleState::ShuttingDown,
            ]
        );
    }

    #[tokio::test]
    async fn test_retries_connection_until_success() {
        let base = tempfile::tempdir().unwrap();
        let signals = Signals::new();
        signals.mark_ready();
        let rt = FakeRuntime {
            init_failures: 3,
            ..FakeRuntime::default()
        };
        let (mut c, _bus) = coordinator(base.path(), rt, &signals, Arc::default());

        let report = c.run().await;

        assert_eq!(report.connect_attempts, 4);
        assert_eq!(c.runtime().init_calls, 4);
        assert!(report.connected);
    }

    #[tokio::test]
    async fn test_waits_for_ready_after_connecting() {
        let base = tempfile::tempdir().unwrap();
        touch(base.path(), "start", "a.cmd");
        let signals = Signals::new();
        let rec = Arc::new(Recorder::default());
        let (mut c, _bus) = coordinator(base.path(), FakeRuntime::default(), &signals, rec.clone());

        let host = signals.clone();
        let rec2 = rec.clone();
        let raiser = tokio::spawn(async move {
            time::sleep(TICK * 6).await;
            assert!(rec2.0.lock().unwrap().is_empty());
            host.mark_ready();
        });

        let report = c.run().await;
        raiser.await.unwrap();

        assert_eq!(report.connect_attempts, 1);
        assert_eq!(rec.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_phase_runs_after_quit() {
        let base = tempfile::tempdir().unwrap();
        touch(base.path(), "start", "a.cmd");
        touch(base.path(), "stop", "b.cmd");
        let signals = Signals::new();
        signals.mark_ready();
        let mut rt = FakeRuntime::default();
        rt.batches.push_back(Ok(vec![]));
        rt.batches.push_back(Ok(vec![RuntimeEvent::Quit]));
        let rec = Arc::new(Recorder::default());
        let (mut c, _bus) = coordinator(base.path(), rt, &signals, rec.clone());

        let report = c.run().await;

        assert_eq!(report.exit, ExitReason::Completed);
        assert_eq!(report.stop_scripts, Some(1));
        assert_eq!(c.runtime().acks, 1);
        let launched = rec.0.lock().unwrap();
        assert!(launched[0].ends_with("start/a.cmd"));
        assert!(launched[1].ends_with("stop/b.cmd"));
    }

    #[tokio::test]
    async fn test_ready_wakes_connected_coordinator_before_next_tick() {
        let base = tempfile::tempdir().unwrap();
        let signals = Signals::new();
        let bus = Bus::new(64);
        let scripts = ScriptRunner::new(base.path(), "*.cmd", Arc::new(Recorder::default())).unwrap();
        let mut c = Coordinator::new(
            FakeRuntime::default(),
            signals.clone(),
            Connector::new("k", base.path().join("app.vrmanifest")),
            scripts,
            EventMonitor::new(TICK),
            Duration::from_secs(10),
            bus,
        );

        let host = signals.clone();
        tokio::spawn(async move {
            time::sleep(TICK * 4).await;
            host.mark_ready();
        });
        let report = time::timeout(Duration::from_secs(5), c.run()).await.unwrap();

        assert_eq!(report.exit, ExitReason::Completed);
        assert_eq!(report.start_scripts, Some(0));
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_quit_still_runs_stop() {
        let base = tempfile::tempdir().unwrap();
        touch(base.path(), "stop", "b.cmd");
        let signals = Signals::new();
        signals.mark_ready();
        let bus = Bus::new(256);
        let mut rx = bus.subscribe();
        let rec = Arc::new(Recorder::default());
        let scripts = ScriptRunner::new(base.path(), "*.cmd", rec.clone()).unwrap();
        let event_interval = Duration::from_secs(1);
        let mut c = Coordinator::new(
            FakeRuntime::default(),
            signals.clone(),
            Connector::new("k", base.path().join("app.vrmanifest")),
            scripts,
            EventMonitor::new(event_interval),
            TICK,
            bus.clone(),
        );

        let host = signals.host_handle(bus);
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(50)).await;
            host.force_quit();
        });
        let started = time::Instant::now();
        let report = c.run().await;

        assert!(started.elapsed() < event_interval);
        assert_eq!(report.exit, ExitReason::Completed);
        assert_eq!(report.stop_scripts, Some(1));
        assert_eq!(c.runtime().acks, 0);
        assert_eq!(c.runtime().shutdowns, 1);
        let launched = rec.0.lock().unwrap();
        assert_eq!(launched.len(), 1);
        assert!(launched[0].ends_with("stop/b.cmd"));

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        let waiting = events
            .iter()
            .position(|e| e.state == Some(LifecycleState::WaitingForQuit))
            .unwrap();
        let forced = events
            .iter()
            .position(|e| e.kind == EventKind::ForceQuitRequested)
            .unwrap();
        let stop = events
            .iter()
            .position(|e| e.state == Some(LifecycleState::RunningStop))
            .unwrap();
        assert!(waiting < forced && forced < stop);
        assert!(!events.iter().any(|e| e.kind == EventKind::QuitRequested));
    }

    #[tokio::test]
    async fn test_cancel_before_connect_skips_phases_and_release() {
        let base = tempfile::tempdir().unwrap();
        touch(base.path(), "start", "a.cmd");
        let signals = Signals::new();
        signals.mark_ready();
        let rt = FakeRuntime {
            init_failures: u32::MAX,
            ..FakeRuntime::default()
        };
        let rec = Arc::new(Recorder::default());
        let (mut c, _bus) = coordinator(base.path(), rt, &signals, rec.clone());

        let canceller = signals.clone();
        tokio::spawn(async move {
            time::sleep(TICK * 4).await;
            canceller.cancel();
        });
        let report = c.run().await;

        assert_eq!(report.exit, ExitReason::Cancelled);
        assert_eq!(report.start_scripts, None);
        assert!(!report.connected);
        assert_eq!(c.runtime().shutdowns, 0);
        assert!(rec.0.lock().unwrap().is_empty());
    }
}
