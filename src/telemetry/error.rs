//! Telemetry error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while recording audit events.
///
/// All of these are fatal to the caller: an audit trail that cannot be
/// written does not uphold the proxy's guarantees.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to open the audit log file.
    #[error("Failed to open audit log {path}: {source}")]
    SinkOpen {
        /// Path that couldn't be opened.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write or flush a record to the sink.
    #[error("Failed to write audit record: {0}")]
    Sink(#[source] std::io::Error),

    /// Failed to serialize a record to JSON.
    #[error("Failed to serialize audit record: {0}")]
    SerializationError(#[from] serde_json::Error),
}
