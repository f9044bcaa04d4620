//! End-to-end lifecycle scenarios against an in-memory runtime.

use std::{
    collections::VecDeque,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::broadcast::Receiver;
use vrscripts::{
    Config, Event, EventKind, ExitReason, Launch, Lifecycle, RuntimeEvent, ScriptPhase,
    ScriptRunner, SessionError, VrRuntime,
};

const TICK_MS: u64 = 5;

#[derive(Default)]
struct RuntimeState {
    init_failures: u32,
    init_calls: u32,
    batches: VecDeque<Vec<RuntimeEvent>>,
    current: VecDeque<RuntimeEvent>,
    in_batch: bool,
    drains: u32,
    acks: u32,
    shutdowns: u32,
}

/// Runtime whose state stays inspectable after the lifecycle consumed it.
#[derive(Clone, Default)]
struct FakeRuntime(Arc<Mutex<RuntimeState>>);

impl FakeRuntime {
    fn failing(n: u32) -> Self {
        let rt = Self::default();
        rt.0.lock().unwrap().init_failures = n;
        rt
    }

    fn with_batches(self, batches: Vec<Vec<RuntimeEvent>>) -> Self {
        self.0.lock().unwrap().batches = batches.into();
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RuntimeState> {
        self.0.lock().unwrap()
    }
}

impl VrRuntime for FakeRuntime {
    fn init(&mut self) -> Result<(), SessionError> {
        let mut s = self.state();
        s.init_calls += 1;
        if s.init_calls <= s.init_failures {
            return Err(SessionError::Init {
                code: 121,
                reason: "runtime not running".into(),
            });
        }
        Ok(())
    }

    fn is_application_installed(&mut self, _app_key: &str) -> bool {
        true
    }

    fn add_application_manifest(&mut self, _path: &Path) -> Result<(), SessionError> {
        Ok(())
    }

    fn set_auto_launch(&mut self, _app_key: &str, _enabled: bool) -> Result<(), SessionError> {
        Ok(())
    }

    fn poll_next_event(&mut self) -> Result<Option<RuntimeEvent>, SessionError> {
        let mut s = self.state();
        if !s.in_batch {
            s.drains += 1;
            let Some(batch) = s.batches.pop_front() else {
                return Ok(None);
            };
            s.current = batch.into();
            s.in_batch = true;
        }
        let next = s.current.pop_front();
        if next.is_none() {
            s.in_batch = false;
        }
        Ok(next)
    }

    fn acknowledge_quit(&mut self) {
        self.state().acks += 1;
    }

    fn shutdown(&mut self) {
        self.state().shutdowns += 1;
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<PathBuf>>);

impl Recorder {
    fn names(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }
}

impl Launch for Recorder {
    fn launch(&self, script: &Path) -> io::Result<()> {
        self.0.lock().unwrap().push(script.to_path_buf());
        Ok(())
    }
}

struct Fixture {
    base: tempfile::TempDir,
    recorder: Arc<Recorder>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            base: tempfile::tempdir().unwrap(),
            recorder: Arc::new(Recorder::default()),
        }
    }

    fn script(&self, phase: ScriptPhase, name: &str) -> &Self {
        let dir = self.base.path().join(phase.dir_name());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), "@echo off\n").unwrap();
        self
    }

    fn config(&self) -> Config {
        Config {
            base_dir: self.base.path().to_path_buf(),
            poll_interval_ms: TICK_MS,
            event_poll_interval_ms: TICK_MS,
            ..Config::default()
        }
    }

    fn scripts(&self) -> ScriptRunner {
        ScriptRunner::new(self.base.path(), "*.cmd", self.recorder.clone()).unwrap()
    }
}

fn collect(rx: &mut Receiver<Event>) -> Vec<Event> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

fn position(events: &[Event], pred: impl Fn(&Event) -> bool) -> usize {
    events
        .iter()
        .position(pred)
        .expect("event not found")
}

fn launched(events: &[Event], phase: ScriptPhase) -> Vec<&Event> {
    events
        .iter()
        .filter(|e| e.kind == EventKind::ScriptLaunched && e.phase == Some(phase))
        .collect()
}

#[tokio::test]
async fn test_empty_directories_connect_immediately() {
    let fx = Fixture::new();
    let rt = FakeRuntime::default();
    let lifecycle = Lifecycle::new(fx.config(), Vec::new());
    let mut rx = lifecycle.bus().subscribe();
    lifecycle.host().mark_ready();

    let report = lifecycle.run(rt.clone(), fx.scripts()).await.unwrap();

    assert_eq!(report.exit, ExitReason::Completed);
    assert_eq!(report.connect_attempts, 1);
    assert_eq!(report.boot_scripts, 0);
    assert_eq!(report.start_scripts, Some(0));
    assert_eq!(report.stop_scripts, None);
    for phase in ScriptPhase::ALL {
        assert!(fx.base.path().join(phase.dir_name()).is_dir());
    }

    let events = collect(&mut rx);
    assert!(!events.iter().any(|e| e.kind == EventKind::WaitingForQuit));
    assert_eq!(rt.state().drains, 0);
    assert_eq!(rt.state().shutdowns, 1);
    assert_eq!(events.last().map(|e| e.kind), Some(EventKind::LifecycleCompleted));
}

#[tokio::test]
async fn test_start_after_retries_then_stop_after_quit() {
    let fx = Fixture::new();
    fx.script(ScriptPhase::Start, "a.cmd")
        .script(ScriptPhase::Stop, "b.cmd");
    let rt = FakeRuntime::failing(3).with_batches(vec![
        vec![RuntimeEvent::Other(100)],
        vec![RuntimeEvent::Quit],
    ]);
    let lifecycle = Lifecycle::new(fx.config(), Vec::new());
    let mut rx = lifecycle.bus().subscribe();
    lifecycle.host().mark_ready();

    let report = lifecycle.run(rt.clone(), fx.scripts()).await.unwrap();

    assert_eq!(report.exit, ExitReason::Completed);
    assert_eq!(report.connect_attempts, 4);
    assert_eq!(report.start_scripts, Some(1));
    assert_eq!(report.stop_scripts, Some(1));
    assert_eq!(fx.recorder.names(), ["a.cmd", "b.cmd"]);
    {
        let s = rt.state();
        assert_eq!(s.init_calls, 4);
        assert_eq!(s.drains, 2);
        assert_eq!(s.acks, 1);
        assert_eq!(s.shutdowns, 1);
    }

    let events = collect(&mut rx);
    let boot_done = position(&events, |e| {
        e.kind == EventKind::PhaseFinished && e.phase == Some(ScriptPhase::Boot)
    });
    let first_attempt = position(&events, |e| e.kind == EventKind::ConnectFailed);
    let connected = position(&events, |e| e.kind == EventKind::Connected);
    let start = position(&events, |e| {
        e.kind == EventKind::ScriptLaunched && e.phase == Some(ScriptPhase::Start)
    });
    let quit = position(&events, |e| e.kind == EventKind::QuitRequested);
    let stop = position(&events, |e| {
        e.kind == EventKind::ScriptLaunched && e.phase == Some(ScriptPhase::Stop)
    });

    assert!(boot_done < first_attempt);
    assert_eq!(events[connected].attempt, Some(4));
    assert!(connected < start && start < quit && quit < stop);
    assert_eq!(
        events.iter().filter(|e| e.kind == EventKind::ConnectFailed).count(),
        3
    );
}

#[tokio::test]
async fn test_force_quit_before_connection() {
    let fx = Fixture::new();
    fx.script(ScriptPhase::Start, "a.cmd")
        .script(ScriptPhase::Stop, "b.cmd");
    let rt = FakeRuntime::failing(u32::MAX);
    let lifecycle = Lifecycle::new(fx.config(), Vec::new());
    let mut rx = lifecycle.bus().subscribe();
    let host = lifecycle.host();
    host.mark_ready();

    let quitter = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(TICK_MS * 6)).await;
        host.force_quit();
    });
    let report = lifecycle.run(rt.clone(), fx.scripts()).await.unwrap();
    quitter.await.unwrap();

    assert_eq!(report.exit, ExitReason::Cancelled);
    assert!(!report.connected);
    assert_eq!(report.start_scripts, None);
    assert_eq!(report.stop_scripts, None);
    assert!(fx.recorder.names().is_empty());
    assert_eq!(rt.state().shutdowns, 0);

    let events = collect(&mut rx);
    assert!(events.iter().any(|e| e.kind == EventKind::ForceQuitRequested));
    assert!(!events.iter().any(|e| e.kind == EventKind::SessionReleased));
    assert!(!events.iter().any(|e| e.phase == Some(ScriptPhase::Start)));
}

#[tokio::test]
async fn test_ready_first_still_waits_for_connection() {
    let fx = Fixture::new();
    fx.script(ScriptPhase::Start, "a.cmd");
    let rt = FakeRuntime::failing(5);
    let lifecycle = Lifecycle::new(fx.config(), Vec::new());
    let mut rx = lifecycle.bus().subscribe();
    lifecycle.host().mark_ready();

    lifecycle.run(rt, fx.scripts()).await.unwrap();

    let events = collect(&mut rx);
    let connected = position(&events, |e| e.kind == EventKind::Connected);
    let start = launched(&events, ScriptPhase::Start);
    assert_eq!(start.len(), 1);
    assert!(start[0].seq > events[connected].seq);
    assert_eq!(events[connected].attempt, Some(6));
}

#[tokio::test]
async fn test_connected_first_still_waits_for_ready() {
    let fx = Fixture::new();
    fx.script(ScriptPhase::Start, "a.cmd");
    let rt = FakeRuntime::default();
    let lifecycle = Lifecycle::new(fx.config(), Vec::new());
    let mut rx = lifecycle.bus().subscribe();
    let signals = lifecycle.signals().clone();
    let host = lifecycle.host();
    let recorder = fx.recorder.clone();

    let raiser = tokio::spawn(async move {
        while !signals.is_connected() {
            tokio::time::sleep(Duration::from_millis(TICK_MS)).await;
        }
        tokio::time::sleep(Duration::from_millis(TICK_MS * 6)).await;
        let before_ready = recorder.names().len();
        host.mark_ready();
        before_ready
    });
    let report = lifecycle.run(rt, fx.scripts()).await.unwrap();

    assert_eq!(raiser.await.unwrap(), 0);
    assert_eq!(report.connect_attempts, 1);
    assert_eq!(report.start_scripts, Some(1));

    let events = collect(&mut rx);
    let awaiting = position(&events, |e| {
        e.kind == EventKind::StateChanged && e.state == Some(vrscripts::LifecycleState::AwaitingReady)
    });
    assert!(launched(&events, ScriptPhase::Start)[0].seq > events[awaiting].seq);
}
