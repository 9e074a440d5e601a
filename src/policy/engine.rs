//! Decision engine.
//!
//! # Evaluation
//!
//! - `log` mode: every host is allowed; the engine never consults the policy.
//! - `enforce` mode:
//!   1. Exact match (case-sensitive, no trailing-dot handling)
//!   2. Wildcard suffix match
//!   3. Otherwise blocked
//!
//! # Example
//!
//! ```
//! use egress_policy::config::Mode;
//! use egress_policy::policy::{Decision, DecisionEngine, Policy, ServiceCatalog};
//!
//! let compiled = Policy::build(&["github"], &[] as &[&str], &ServiceCatalog::builtin());
//! let engine = DecisionEngine::new(Mode::Enforce, compiled.policy);
//!
//! assert_eq!(engine.evaluate("api.github.com"), Decision::Allow);
//! assert_eq!(engine.evaluate("evil.com"), Decision::Block);
//! ```

use serde::{Deserialize, Serialize};

use super::allowlist::Policy;
use super::pattern::WildcardMatching;
use crate::config::Mode;

/// Outcome of evaluating a host.
///
/// Serialized as the `action` field of audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Let the flow through.
    #[serde(rename = "allowed")]
    Allow,
    /// Refuse the flow.
    #[serde(rename = "blocked")]
    Block,
}

impl Decision {
    /// Returns `true` for [`Decision::Allow`].
    pub fn is_allow(self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Wire name used in audit records.
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "allowed",
            Decision::Block => "blocked",
        }
    }
}

/// Immutable mode + policy pair.
///
/// Holds no interior mutability, so a shared reference (or `Arc`) can be
/// evaluated from any number of threads.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    mode: Mode,
    policy: Policy,
    matching: WildcardMatching,
}

impl DecisionEngine {
    /// Create an engine with loose suffix matching.
    pub fn new(mode: Mode, policy: Policy) -> Self {
        Self::with_matching(mode, policy, WildcardMatching::default())
    }

    /// Create an engine with an explicit wildcard matching rule.
    pub fn with_matching(mode: Mode, policy: Policy, matching: WildcardMatching) -> Self {
        Self {
            mode,
            policy,
            matching,
        }
    }

    /// Decide whether traffic to `host` may pass.
    ///
    /// Total over all inputs, including the empty string.
    pub fn evaluate(&self, host: &str) -> Decision {
        match self.mode {
            Mode::Log => Decision::Allow,
            Mode::Enforce if self.policy.allows(host, self.matching) => Decision::Allow,
            Mode::Enforce => Decision::Block,
        }
    }

    /// The operating mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The compiled policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The wildcard matching rule in effect.
    pub fn matching(&self) -> WildcardMatching {
        self.matching
    }
}
