//! # Bounded log buffer and tracing setup.
//!
//! Log output goes to two places:
//! - stderr, compact and colored (the console print channel);
//! - a [`LogBuffer`] holding the most recent lines, written to the log file once at exit.
//!
//! The log file is never appended to while the process runs; [`LogBuffer::flush_to`]
//! replaces it with the buffered lines (oldest first).

use std::{
    collections::VecDeque,
    fs, io,
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use tracing_subscriber::{EnvFilter, fmt, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt};

/// Most recent log lines; the oldest line is dropped once `cap` is reached.
#[derive(Clone, Debug)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    cap: usize,
}

impl LogBuffer {
    /// Creates a buffer keeping at most `cap` lines (minimum 1).
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(cap.min(4096)))),
            cap,
        }
    }

    /// Appends one line, evicting the oldest when full.
    pub fn push(&self, line: impl Into<String>) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() >= self.cap {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    /// Copy of the buffered lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrites `path` with the buffered lines, creating parent directories.
    pub fn flush_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut out = String::new();
        for line in self.lines() {
            out.push_str(&line);
            out.push('\n');
        }
        fs::write(path, out)
    }
}

/// `io::Write` end handed to the fmt layer; splits writes into lines.
pub struct LineWriter {
    buffer: LogBuffer,
}

impl io::Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        for line in text.lines().filter(|l| !l.is_empty()) {
            self.buffer.push(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            buffer: self.clone(),
        }
    }
}

/// Installs the global subscriber: `RUST_LOG` filter (default `info`), stderr and `buffer`.
///
/// Fails if a global subscriber was already installed.
pub fn init_logging(buffer: LogBuffer) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let file = fmt::layer()
        .with_writer(buffer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
}
