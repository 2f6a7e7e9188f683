//! External engine subprocess speaking UCI over its stdin/stdout.
//!
//! Stdout is read on a helper thread and forwarded over a channel, which
//! gives the handshake a real deadline while in-game reads stay plain
//! blocking receives. Stderr is drained to the debug log so a chatty engine
//! cannot stall on a full pipe.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::UciEngine;
use crate::error::{ArenaError, Result};
use crate::protocol;
use crate::protocol_log::ProtocolLog;

/// Time an engine gets to honour `quit` before it is signalled.
pub const QUIT_GRACE: Duration = Duration::from_millis(200);
/// Time an engine gets to honour the terminate signal before it is killed.
pub const TERMINATE_GRACE: Duration = Duration::from_millis(200);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const EXIT_POLL_ATTEMPTS: u32 = 50;
const HELPER_JOIN_ATTEMPTS: u32 = 50;

/// How to launch one engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSpec {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineSpec {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// Engine named after the executable's file stem.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path,
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Startup and handshake deadlines, and the fixed options sent once the
/// engine is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeOptions {
    /// A process that exits this soon after spawning is dead on arrival
    pub startup_grace_ms: u64,
    /// Deadline for each `uciok` / `readyok` wait
    pub timeout_ms: u64,
    /// `Hash` option in MiB
    pub hash_mb: u32,
    /// `MultiPV` option
    pub multi_pv: u32,
}

impl Default for HandshakeOptions {
    fn default() -> Self {
        Self {
            startup_grace_ms: 50,
            timeout_ms: 10_000,
            hash_mb: 16,
            multi_pv: 1,
        }
    }
}

impl HandshakeOptions {
    fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }
}

enum Polled {
    Line(String),
    Closed,
    TimedOut,
}

/// One running engine and the pipes it was started with.
pub struct EngineProcess {
    name: String,
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    lines: Option<Receiver<io::Result<String>>>,
    reader: Option<JoinHandle<()>>,
    stderr_drain: Option<JoinHandle<()>>,
    helpers_joined: bool,
    log: Option<Arc<dyn ProtocolLog>>,
    options: HandshakeOptions,
    initialized: bool,
    reported_name: Option<String>,
    spin_options: HashMap<String, (i64, i64)>,
    shut_down: bool,
}

impl EngineProcess {
    /// Starts the executable at `path` with default handshake options.
    pub fn start(path: impl AsRef<Path>) -> Result<Self> {
        Self::spawn(
            &EngineSpec::from_path(path.as_ref()),
            HandshakeOptions::default(),
        )
    }

    pub fn spawn(spec: &EngineSpec, options: HandshakeOptions) -> Result<Self> {
        File::open(&spec.path).map_err(|source| ArenaError::InvalidExecutable {
            path: spec.path.clone(),
            source,
        })?;

        let start_failed = |source: io::Error| ArenaError::ProcessStartFailed {
            path: spec.path.clone(),
            source,
        };
        let missing_pipe = || {
            start_failed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "pipe not captured",
            ))
        };

        let mut child = Command::new(&spec.path)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(start_failed)?;

        let stdin = child.stdin.take().ok_or_else(missing_pipe)?;
        let stdout = child.stdout.take().ok_or_else(missing_pipe)?;
        let stderr = child.stderr.take().ok_or_else(missing_pipe)?;

        let (tx, rx) = mpsc::channel::<io::Result<String>>();
        let reader = thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });

        let drain_name = spec.name.clone();
        let stderr_drain = thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                debug!(engine = %drain_name, "stderr: {line}");
            }
        });

        let grace_end = Instant::now() + options.startup_grace();
        loop {
            if let Ok(Some(status)) = child.try_wait() {
                warn!(engine = %spec.name, %status, "engine exited during startup");
                return Err(ArenaError::ProcessTerminated {
                    engine: spec.name.clone(),
                });
            }
            if Instant::now() >= grace_end {
                break;
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }

        info!(engine = %spec.name, pid = child.id(), path = %spec.path.display(), "engine started");

        Ok(Self {
            name: spec.name.clone(),
            child,
            stdin: Some(BufWriter::new(stdin)),
            lines: Some(rx),
            reader: Some(reader),
            stderr_drain: Some(stderr_drain),
            helpers_joined: false,
            log: None,
            options,
            initialized: false,
            reported_name: None,
            spin_options: HashMap::new(),
            shut_down: false,
        })
    }

    /// Mirrors all traffic of this engine into `log`.
    pub fn with_log(mut self, log: Arc<dyn ProtocolLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Name from the engine's own `id name` line, once the handshake saw it.
    pub fn reported_name(&self) -> Option<&str> {
        self.reported_name.as_deref()
    }

    fn terminated(&self) -> ArenaError {
        ArenaError::ProcessTerminated {
            engine: self.name.clone(),
        }
    }

    fn has_exited(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }

    fn poll_line(&mut self, deadline: Instant) -> Result<Polled> {
        let Some(rx) = self.lines.as_ref() else {
            return Ok(Polled::Closed);
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Ok(line)) => {
                if let Some(log) = &self.log {
                    log.record(&self.name, false, &line);
                }
                Ok(Polled::Line(line))
            }
            Ok(Err(e)) => Err(ArenaError::Io(e)),
            Err(RecvTimeoutError::Timeout) => Ok(Polled::TimedOut),
            Err(RecvTimeoutError::Disconnected) => Ok(Polled::Closed),
        }
    }

    /// Reads until `expected` arrives or the handshake deadline passes.
    /// Identification and option lines seen on the way are recorded.
    fn wait_for(&mut self, expected: &'static str) -> Result<()> {
        let deadline = Instant::now() + self.options.timeout();
        loop {
            match self.poll_line(deadline)? {
                Polled::Line(line) if line.trim() == expected => return Ok(()),
                Polled::Line(line) => self.note_advertisement(&line),
                Polled::Closed | Polled::TimedOut => {
                    warn!(engine = %self.name, expected, "engine did not answer");
                    return Err(ArenaError::UciInitFailed {
                        engine: self.name.clone(),
                        expected,
                    });
                }
            }
        }
    }

    fn note_advertisement(&mut self, line: &str) {
        if let Some(name) = protocol::parse_id_name(line) {
            self.reported_name = Some(name.to_string());
        } else if let Some(opt) = protocol::parse_spin_option(line) {
            self.spin_options
                .insert(opt.name.to_ascii_lowercase(), (opt.min, opt.max));
        }
    }

    fn wait_exit(&mut self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        loop {
            if self.has_exited() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }

    #[cfg(unix)]
    fn signal_terminate(&mut self) {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        if let Ok(raw) = i32::try_from(self.child.id()) {
            if let Err(e) = signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
                debug!(engine = %self.name, "terminate signal failed: {e}");
            }
        }
    }

    #[cfg(not(unix))]
    fn signal_terminate(&mut self) {
        let _ = self.child.kill();
    }

    /// Waits a bounded time for the stderr drain, then the stdout reader.
    /// Returns false if either was still blocked on its pipe.
    fn join_helpers(&mut self) -> bool {
        let mut joined = true;
        for helper in [self.stderr_drain.take(), self.reader.take()]
            .into_iter()
            .flatten()
        {
            let mut attempts = 0;
            while !helper.is_finished() && attempts < HELPER_JOIN_ATTEMPTS {
                thread::sleep(EXIT_POLL_INTERVAL);
                attempts += 1;
            }
            if helper.is_finished() {
                let _ = helper.join();
            } else {
                warn!(engine = %self.name, "engine pipe still held open, detaching reader");
                joined = false;
            }
        }
        joined
    }

    /// Stops the engine: `quit`, then a terminate signal, then a kill.
    /// Never fails; safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let _ = self.send_line("quit");
        self.shut_down = true;

        if !self.wait_exit(QUIT_GRACE) {
            warn!(engine = %self.name, "engine ignored quit, sending terminate signal");
            self.signal_terminate();
            if !self.wait_exit(TERMINATE_GRACE) {
                warn!(engine = %self.name, "engine still alive, killing");
                let _ = self.child.kill();
            }
        }

        // The helper threads own the stdout and stderr pipes and close them
        // at EOF. A grandchild that inherited them can hold them open, so
        // the wait is bounded and stragglers are detached.
        self.lines.take();
        self.helpers_joined = self.join_helpers();
        self.stdin.take();

        for _ in 0..EXIT_POLL_ATTEMPTS {
            match self.child.try_wait() {
                Ok(None) => thread::sleep(EXIT_POLL_INTERVAL),
                _ => break,
            }
        }
        debug!(engine = %self.name, "engine shut down");
    }
}

impl UciEngine for EngineProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn handshake(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.send_line("uci")?;
        self.wait_for("uciok")?;
        self.send_line("isready")?;
        self.wait_for("readyok")?;

        let hash = self.options.hash_mb.to_string();
        let multi_pv = self.options.multi_pv.to_string();
        self.set_option("Hash", &hash)?;
        self.set_option("MultiPV", &multi_pv)?;
        self.send_line("ucinewgame")?;

        self.initialized = true;
        info!(
            engine = %self.name,
            reported = self.reported_name.as_deref().unwrap_or("?"),
            "handshake complete"
        );
        Ok(())
    }

    fn send_line(&mut self, line: &str) -> Result<()> {
        if self.shut_down || self.has_exited() {
            return Err(self.terminated());
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(self.terminated());
        };
        let written = stdin
            .write_all(line.as_bytes())
            .and_then(|_| stdin.write_all(b"\n"))
            .and_then(|_| stdin.flush());
        match written {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Err(self.terminated()),
            Err(e) => return Err(ArenaError::Io(e)),
        }
        if let Some(log) = &self.log {
            log.record(&self.name, true, line);
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let Some(rx) = self.lines.as_ref() else {
            return Ok(None);
        };
        match rx.recv() {
            Ok(Ok(line)) => {
                if let Some(log) = &self.log {
                    log.record(&self.name, false, &line);
                }
                Ok(Some(line))
            }
            Ok(Err(e)) => Err(ArenaError::Io(e)),
            Err(_) => Ok(None),
        }
    }

    fn spin_range(&self, name: &str) -> Option<(i64, i64)> {
        self.spin_options.get(&name.to_ascii_lowercase()).copied()
    }

    fn sync_ready(&mut self) -> Result<()> {
        self.send_line("isready")?;
        self.wait_for("readyok")
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "engine_process_tests.rs"]
mod engine_process_tests;
