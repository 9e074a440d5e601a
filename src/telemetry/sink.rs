//! Audit sinks.
//!
//! A sink receives fully serialized records, one line per call. Every
//! implementation writes the line and its newline with a single `write_all`
//! while holding one lock, then flushes, so concurrent callers never
//! interleave partial lines and a tailing reader sees each record as soon as
//! the call returns.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::TelemetryError;
use super::events::AuditRecord;

/// Destination for serialized audit records.
pub trait AuditSink: Send + Sync {
    /// Write one record line (without trailing newline) and flush it.
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Write `line` plus newline in one call and flush.
fn write_flushed<W: Write + ?Sized>(writer: &mut W, line: &str) -> io::Result<()> {
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    writer.write_all(&buf)?;
    writer.flush()
}

fn lock<T>(mutex: &Mutex<T>) -> io::Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| io::Error::other("audit sink lock poisoned"))
}

/// Process standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl AuditSink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        write_flushed(&mut io::stdout().lock(), line)
    }
}

/// Any writer behind a mutex.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the inner writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .map_err(|_| io::Error::other("audit sink lock poisoned"))
    }
}

impl<W: Write + Send> AuditSink for WriterSink<W> {
    fn write_line(&self, line: &str) -> io::Result<()> {
        write_flushed(&mut *lock(&self.writer)?, line)
    }
}

/// Append-only audit log file.
pub type FileSink = WriterSink<File>;

impl WriterSink<File> {
    /// Open (or create) a file for appending.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, TelemetryError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| TelemetryError::SinkOpen {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self::new(file))
    }
}

/// In-memory sink for tests and embedding runtimes.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    ///
    /// Lines written before a panic in another holder are still returned.
    pub fn lines(&self) -> Vec<String> {
        self.buffer().clone()
    }

    /// Lines written so far, parsed back into records.
    pub fn records(&self) -> Result<Vec<AuditRecord>, serde_json::Error> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line))
            .collect()
    }

    /// Number of lines written so far.
    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuditSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        lock(&self.lines)?.push(line.to_string());
        Ok(())
    }
}
