//! Audit trail for proxy decisions.
//!
//! Every observed event (CONNECT tunnel, plain HTTP request, flow error,
//! startup diagnostic) produces exactly one JSON record on the audit sink.
//!
//! # Architecture
//!
//! - **Audit records** (sink): one JSON object per line, flushed per record,
//!   meant to be tailed live by external tooling
//! - **Debug logging** (tracing): development logs go to stderr via `tracing`
//! - These are completely separate concerns
//!
//! # Usage
//!
//! ```
//! use egress_policy::policy::Decision;
//! use egress_policy::telemetry::{AuditRecorder, MemorySink};
//!
//! let sink = MemorySink::new();
//! let recorder = AuditRecorder::new(sink.clone());
//!
//! recorder.record_connect("github.com", 443, Decision::Allow).unwrap();
//! assert_eq!(sink.len(), 1);
//! ```
//!
//! # Record Format
//!
//! ```json
//! {"timestamp":"2026-01-07T14:32:01.123456Z","type":"connect","host":"github.com","port":443,"action":"allowed"}
//! ```

mod error;
mod events;
mod recorder;
mod sink;

pub use error::TelemetryError;
pub use events::{AuditRecord, RecordKind, UNKNOWN_ERROR};
pub use recorder::AuditRecorder;
pub use sink::{AuditSink, FileSink, MemorySink, StdoutSink, WriterSink};
