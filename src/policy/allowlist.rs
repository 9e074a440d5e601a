//! Compiled allowlist: exact hosts plus wildcard suffixes.
//!
//! A [`Policy`] is built once at startup from the `services` and `domains`
//! lists of a policy document and is read-only afterwards.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::catalog::ServiceCatalog;
use super::pattern::{DomainPattern, WildcardMatching, matches_suffix};
use crate::config::PolicyDocument;

/// Exact-match set and ordered wildcard suffix list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    /// Hosts allowed by exact string equality.
    exact: HashSet<String>,
    /// Suffixes (leading `.` kept) in insertion order.
    wildcards: Vec<String>,
}

/// Result of [`Policy::build`].
#[derive(Debug, Clone)]
pub struct CompiledPolicy {
    /// The compiled allowlist.
    pub policy: Policy,
    /// Informational messages produced while compiling, in order.
    ///
    /// One entry per unknown service, followed by the load summary.
    pub diagnostics: Vec<String>,
}

impl Policy {
    /// Compile service names and raw domains into a policy.
    ///
    /// Unknown services are skipped with a diagnostic; this never fails.
    pub fn build<S, D>(services: &[S], domains: &[D], catalog: &ServiceCatalog) -> CompiledPolicy
    where
        S: AsRef<str>,
        D: AsRef<str>,
    {
        let mut policy = Policy::default();
        let mut diagnostics = Vec::new();

        for service in services {
            let service = service.as_ref();
            match catalog.resolve(service) {
                Some(patterns) => {
                    debug!("Service '{}' expands to {} patterns", service, patterns.len());
                    for pattern in patterns {
                        policy.add(DomainPattern::parse(pattern));
                    }
                }
                None => {
                    warn!("Unknown service '{}' in policy", service);
                    diagnostics.push(format!("Unknown service '{}' in policy, skipping", service));
                }
            }
        }

        for domain in domains {
            policy.add(DomainPattern::parse(domain.as_ref()));
        }

        diagnostics.push(format!(
            "Policy loaded: {} exact domains, {} wildcard patterns",
            policy.exact_count(),
            policy.wildcard_count()
        ));

        CompiledPolicy {
            policy,
            diagnostics,
        }
    }

    /// Compile the lists of a parsed policy document.
    pub fn from_document(document: &PolicyDocument, catalog: &ServiceCatalog) -> CompiledPolicy {
        Self::build(document.services(), document.domains(), catalog)
    }

    fn add(&mut self, pattern: DomainPattern) {
        match pattern {
            DomainPattern::Exact(host) => {
                self.exact.insert(host);
            }
            DomainPattern::WildcardSuffix(suffix) => self.wildcards.push(suffix),
        }
    }

    /// Check if a host is allowed by this policy.
    pub fn allows(&self, host: &str, matching: WildcardMatching) -> bool {
        self.exact.contains(host)
            || self
                .wildcards
                .iter()
                .any(|suffix| matches_suffix(suffix, host, matching))
    }

    /// Whether a host is in the exact-match set.
    pub fn contains_exact(&self, host: &str) -> bool {
        self.exact.contains(host)
    }

    /// Stored wildcard suffixes in insertion order.
    pub fn wildcards(&self) -> &[String] {
        &self.wildcards
    }

    /// Number of distinct exact hosts.
    pub fn exact_count(&self) -> usize {
        self.exact.len()
    }

    /// Number of wildcard suffixes, duplicates included.
    pub fn wildcard_count(&self) -> usize {
        self.wildcards.len()
    }

    /// True when nothing is allowed.
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcards.is_empty()
    }
}
