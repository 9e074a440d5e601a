//! Audit record types.
//!
//! One record is emitted per observed event and written as a single JSON
//! line. Field presence depends on the record `type`:
//!
//! | type    | fields                                          |
//! |---------|-------------------------------------------------|
//! | info    | timestamp, type, message                        |
//! | connect | timestamp, type, host, port, action             |
//! | http    | timestamp, type, method, host, port, path, action or status |
//! | error   | timestamp, type, host, port, error              |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::Decision;

/// Placeholder used when an error event carries no description.
pub const UNKNOWN_ERROR: &str = "unknown";

/// Event-specific part of an audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordKind {
    /// Operational diagnostic (startup, policy warnings).
    Info {
        /// Human-readable message.
        message: String,
    },

    /// HTTPS CONNECT tunnel request.
    Connect {
        /// Tunnel target host.
        host: String,
        /// Tunnel target port.
        port: u16,
        /// Decision taken for the tunnel.
        action: Decision,
    },

    /// Plain HTTP request, or a completed response when `status` is set.
    Http {
        /// Request method.
        method: String,
        /// Request host.
        host: String,
        /// Request port.
        port: u16,
        /// Request path including query.
        path: String,
        /// Upstream response status (response records only).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        /// Decision taken for the request (request records only).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<Decision>,
    },

    /// Connection or protocol failure reported by the proxy runtime.
    Error {
        /// Host of the failed flow.
        host: String,
        /// Port of the failed flow.
        port: u16,
        /// Error description.
        error: String,
    },
}

/// A timestamped audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// RFC3339 UTC time at which the record was emitted.
    pub timestamp: DateTime<Utc>,

    /// The event itself (flattened into this struct).
    #[serde(flatten)]
    pub kind: RecordKind,
}

impl AuditRecord {
    /// Stamp a record with the current time.
    pub fn now(kind: RecordKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Wire name of the record type.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            RecordKind::Info { .. } => "info",
            RecordKind::Connect { .. } => "connect",
            RecordKind::Http { .. } => "http",
            RecordKind::Error { .. } => "error",
        }
    }

    /// The decision carried by this record, if any.
    pub fn action(&self) -> Option<Decision> {
        match &self.kind {
            RecordKind::Connect { action, .. } => Some(*action),
            RecordKind::Http { action, .. } => *action,
            _ => None,
        }
    }
}
