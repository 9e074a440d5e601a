//! Audit recorder.
//!
//! Turns flow events into timestamped [`AuditRecord`]s and writes each one
//! to the configured [`AuditSink`] before returning. The timestamp is taken
//! when the record is emitted, so records appear in recording order.

use tracing::debug;

use super::error::TelemetryError;
use super::events::{AuditRecord, RecordKind, UNKNOWN_ERROR};
use super::sink::{AuditSink, StdoutSink};
use crate::policy::Decision;

/// Writes one audit record per call.
///
/// Shareable across threads; serialization of writes is the sink's job.
pub struct AuditRecorder {
    sink: Box<dyn AuditSink>,
}

impl AuditRecorder {
    /// Create a recorder writing to the given sink.
    pub fn new(sink: impl AuditSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }

    /// Create a recorder writing to standard output.
    pub fn stdout() -> Self {
        Self::new(StdoutSink)
    }

    /// Stamp, serialize and write a record.
    pub fn record(&self, kind: RecordKind) -> Result<(), TelemetryError> {
        let record = AuditRecord::now(kind);
        let line = serde_json::to_string(&record)?;
        self.sink.write_line(&line).map_err(TelemetryError::Sink)?;
        debug!("Recorded audit event: {}", line);
        Ok(())
    }

    /// Record an operational diagnostic.
    pub fn record_info(&self, message: impl Into<String>) -> Result<(), TelemetryError> {
        self.record(RecordKind::Info {
            message: message.into(),
        })
    }

    /// Record a CONNECT tunnel decision.
    pub fn record_connect(
        &self,
        host: &str,
        port: u16,
        decision: Decision,
    ) -> Result<(), TelemetryError> {
        self.record(RecordKind::Connect {
            host: host.to_string(),
            port,
            action: decision,
        })
    }

    /// Record a plain HTTP request decision.
    pub fn record_http_request(
        &self,
        method: &str,
        host: &str,
        port: u16,
        path: &str,
        decision: Decision,
    ) -> Result<(), TelemetryError> {
        self.record(RecordKind::Http {
            method: method.to_string(),
            host: host.to_string(),
            port,
            path: path.to_string(),
            status: None,
            action: Some(decision),
        })
    }

    /// Record a completed plain HTTP exchange with its response status.
    pub fn record_http_response(
        &self,
        method: &str,
        host: &str,
        port: u16,
        path: &str,
        status: u16,
    ) -> Result<(), TelemetryError> {
        self.record(RecordKind::Http {
            method: method.to_string(),
            host: host.to_string(),
            port,
            path: path.to_string(),
            status: Some(status),
            action: None,
        })
    }

    /// Record a flow error. A missing description is recorded as `"unknown"`.
    pub fn record_error(
        &self,
        host: &str,
        port: u16,
        error: Option<&str>,
    ) -> Result<(), TelemetryError> {
        self.record(RecordKind::Error {
            host: host.to_string(),
            port,
            error: error.unwrap_or(UNKNOWN_ERROR).to_string(),
        })
    }
}

impl std::fmt::Debug for AuditRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRecorder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{FileSink, MemorySink, WriterSink};
    use std::io::{self, Write};
    use std::sync::Arc;
    use std::thread;

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "no space"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_one_line_per_call() {
        let sink = MemorySink::new();
        let recorder = AuditRecorder::new(sink.clone());

        recorder.record_info("starting").unwrap();
        recorder.record_connect("bad.test", 443, Decision::Block).unwrap();
        recorder
            .record_http_request("GET", "example.org", 80, "/", Decision::Allow)
            .unwrap();
        recorder.record_error("example.org", 443, Some("timeout")).unwrap();

        let records = sink.records().unwrap();
        let types: Vec<_> = records.iter().map(AuditRecord::type_name).collect();
        assert_eq!(types, ["info", "connect", "http", "error"]);
    }

    #[test]
    fn test_connect_record_contents() {
        let sink = MemorySink::new();
        let recorder = AuditRecorder::new(sink.clone());

        recorder.record_connect("bad.test", 443, Decision::Block).unwrap();

        let records = sink.records().unwrap();
        assert_eq!(
            records[0].kind,
            RecordKind::Connect {
                host: "bad.test".to_string(),
                port: 443,
                action: Decision::Block,
            }
        );
    }

    #[test]
    fn test_http_response_record_has_status_not_action() {
        let sink = MemorySink::new();
        let recorder = AuditRecorder::new(sink.clone());

        recorder
            .record_http_response("POST", "example.org", 8080, "/api", 201)
            .unwrap();

        let line = &sink.lines()[0];
        assert!(line.contains("\"status\":201"));
        assert!(!line.contains("\"action\""));
    }

    #[test]
    fn test_missing_error_is_unknown() {
        let sink = MemorySink::new();
        let recorder = AuditRecorder::new(sink.clone());

        recorder.record_error("example.org", 443, None).unwrap();

        assert!(sink.lines()[0].contains("\"error\":\"unknown\""));
    }

    #[test]
    fn test_timestamps_follow_recording_order() {
        let sink = MemorySink::new();
        let recorder = AuditRecorder::new(sink.clone());

        for i in 0..10 {
            recorder.record_info(format!("message {i}")).unwrap();
        }

        let records = sink.records().unwrap();
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_sink_failure_is_returned() {
        let recorder = AuditRecorder::new(WriterSink::new(FullDisk));

        let err = recorder.record_info("lost").unwrap_err();
        assert!(matches!(err, TelemetryError::Sink(ref e) if e.kind() == io::ErrorKind::StorageFull));
    }

    #[test]
    fn test_concurrent_records_are_whole_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let recorder = Arc::new(AuditRecorder::new(FileSink::append(&path).unwrap()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let recorder = Arc::clone(&recorder);
                thread::spawn(move || {
                    for i in 0..50 {
                        let host = format!("host-{t}-{i}.example.com");
                        recorder.record_connect(&host, 443, Decision::Allow).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 400);
        for line in lines {
            let record: AuditRecord = serde_json::from_str(line).unwrap();
            assert_eq!(record.type_name(), "connect");
        }
    }
}
