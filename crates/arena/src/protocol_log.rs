//! Audit trail of raw protocol traffic
//!
//! Sinks are write-only: nothing read back from a log ever influences a
//! match. Engines hold an `Arc<dyn ProtocolLog>` so several participants
//! can share one file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;

use crate::error::Result;

/// Receives every line exchanged with an engine.
pub trait ProtocolLog: Send + Sync {
    fn record(&self, participant: &str, outbound: bool, line: &str);
}

/// Appends timestamped lines to a file.
pub struct FileProtocolLog {
    writer: Mutex<BufWriter<File>>,
}

impl FileProtocolLog {
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl ProtocolLog for FileProtocolLog {
    fn record(&self, participant: &str, outbound: bool, line: &str) {
        let arrow = if outbound { ">>" } else { "<<" };
        if let Ok(mut writer) = self.writer.lock() {
            // Write failures are dropped; the log never stops a match.
            let _ = writeln!(
                writer,
                "{} {participant} {arrow} {line}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
            );
            let _ = writer.flush();
        }
    }
}

/// One captured protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub participant: String,
    pub outbound: bool,
    pub line: String,
}

/// Keeps traffic in memory, for tests and post-mortems.
#[derive(Default)]
pub struct MemoryProtocolLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryProtocolLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Lines sent to or received from one participant, in order.
    pub fn lines(&self, participant: &str, outbound: bool) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.participant == participant && e.outbound == outbound)
            .map(|e| e.line)
            .collect()
    }
}

impl ProtocolLog for MemoryProtocolLog {
    fn record(&self, participant: &str, outbound: bool, line: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                participant: participant.to_string(),
                outbound,
                line: line.to_string(),
            });
        }
    }
}
