//! Flow events handed over by the proxy runtime, and the verdicts it gets back.

use http::StatusCode;
use serde::{Deserialize, Serialize, Serializer};

use crate::policy::Decision;

/// Prefix of the body sent back for blocked flows.
pub const BLOCK_BODY_PREFIX: &str = "Blocked by proxy policy: ";

/// An event observed by the proxy runtime.
///
/// Deserializable from JSON lines tagged by `"event"`, e.g.
/// `{"event":"connect","host":"github.com","port":443}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FlowEvent {
    /// HTTPS CONNECT tunnel request (only host and port are visible).
    Connect {
        /// Tunnel target host.
        host: String,
        /// Tunnel target port.
        port: u16,
    },

    /// Plain HTTP request.
    HttpRequest {
        /// Request method.
        method: String,
        /// Request host.
        host: String,
        /// Request port.
        port: u16,
        /// Request path.
        path: String,
    },

    /// Upstream response to a plain HTTP request.
    HttpResponse {
        /// Request method.
        method: String,
        /// Request host.
        host: String,
        /// Request port.
        port: u16,
        /// Request path.
        path: String,
        /// Response status code.
        status: u16,
    },

    /// Flow failure.
    Error {
        /// Host of the failed flow.
        host: String,
        /// Port of the failed flow.
        port: u16,
        /// Error description, if the runtime has one.
        #[serde(default)]
        error: Option<String>,
    },
}

impl FlowEvent {
    /// Host the event refers to.
    pub fn host(&self) -> &str {
        match self {
            FlowEvent::Connect { host, .. }
            | FlowEvent::HttpRequest { host, .. }
            | FlowEvent::HttpResponse { host, .. }
            | FlowEvent::Error { host, .. } => host,
        }
    }

    /// Port the event refers to.
    pub fn port(&self) -> u16 {
        match self {
            FlowEvent::Connect { port, .. }
            | FlowEvent::HttpRequest { port, .. }
            | FlowEvent::HttpResponse { port, .. }
            | FlowEvent::Error { port, .. } => *port,
        }
    }
}

/// Response the runtime must synthesize instead of forwarding a blocked flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockResponse {
    /// Always `403 Forbidden`.
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    /// Plain-text body naming the blocked host.
    pub body: String,
}

impl BlockResponse {
    /// The 403 response for a blocked host.
    pub fn forbidden(host: &str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            body: format!("{BLOCK_BODY_PREFIX}{host}"),
        }
    }
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

/// What the runtime must do with the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Forward (or keep) the flow untouched.
    Pass,
    /// Do not forward; answer with this response instead.
    Block(BlockResponse),
}

impl Verdict {
    /// Map a decision for `host` to a verdict.
    pub fn for_decision(decision: Decision, host: &str) -> Self {
        match decision {
            Decision::Allow => Verdict::Pass,
            Decision::Block => Verdict::Block(BlockResponse::forbidden(host)),
        }
    }

    /// Returns `true` if the flow must not be forwarded.
    pub fn is_block(&self) -> bool {
        matches!(self, Verdict::Block(_))
    }
}
