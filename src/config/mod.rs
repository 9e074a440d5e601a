//! Configuration for egress-policy.
//!
//! # Sources
//!
//! - Mode: `--mode` flag or `PROXY_MODE` (`log` by default, `enforce`)
//! - Policy document: `--policy` flag or `PROXY_POLICY_PATH`
//!   (`/etc/mitmproxy/policy.yaml` by default)
//!
//! The policy document is only read in enforce mode, and its absence is
//! only an error there.

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::PolicyLoader;
pub use schema::{DEFAULT_POLICY_PATH, Mode, PolicyDocument, Settings};
