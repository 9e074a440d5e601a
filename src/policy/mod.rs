//! Host allowlist policy and decision engine.
//!
//! A policy document names services (expanded through the
//! [`ServiceCatalog`]) and raw domains. Both compile into a [`Policy`]: a set
//! of exact hosts plus a list of wildcard suffixes. The [`DecisionEngine`]
//! combines a policy with the operating [`Mode`](crate::config::Mode).
//!
//! # Pattern Matching
//!
//! - Exact match: `github.com`
//! - Wildcard match: `*.github.com` matches `api.github.com` and
//!   `raw.github.com` but NOT `github.com` itself

mod allowlist;
mod catalog;
mod engine;
mod pattern;

pub use allowlist::{CompiledPolicy, Policy};
pub use catalog::ServiceCatalog;
pub use engine::{Decision, DecisionEngine};
pub use pattern::{DomainPattern, WILDCARD_MARKER, WildcardMatching};
