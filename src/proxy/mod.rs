//! Boundary between the proxy runtime and the policy core.
//!
//! The runtime (TLS termination, HTTP parsing, connection handling) lives
//! outside this crate. It reports each flow as a [`FlowEvent`] and applies
//! the returned [`Verdict`]:
//!
//! - `connect`: once per CONNECT tunnel
//! - `http_request`: once per plain HTTP request
//! - `http_response`: once per completed plain HTTP exchange
//! - `error`: once per failed flow
//!
//! A [`Verdict::Block`] carries the 403 response to send instead of
//! forwarding the flow.

pub mod enforcer;
pub mod error;
pub mod flow;

// Re-export main types for convenient access
pub use enforcer::{Enforcer, LOG_MODE_MESSAGE, parse_mode};
pub use error::{StartupError, StartupResult};
pub use flow::{BLOCK_BODY_PREFIX, BlockResponse, FlowEvent, Verdict};
