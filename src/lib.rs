//! egress-policy: Egress allowlist decisions for a forward proxy
//!
//! This crate decides whether a proxied HTTPS CONNECT tunnel or plain HTTP
//! request may leave a sandboxed or CI environment, and records every
//! decision as a JSON audit line.
//!
//! # Security Model
//!
//! In `enforce` mode the model is **fail-closed**: hosts not named by the
//! policy are blocked, and a missing policy document stops startup. In `log`
//! mode nothing is blocked but everything is still recorded.
//!
//! # Architecture
//!
//! - **Policy**: service catalog, domain patterns, compiled allowlist, decision engine
//! - **Config**: operating mode and policy document loading
//! - **Telemetry**: audit records and line-oriented sinks
//! - **Proxy**: flow events from the proxy runtime and the verdicts returned to it

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod policy;
pub mod proxy;
pub mod telemetry;
