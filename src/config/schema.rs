//! Configuration schema definitions.
//!
//! Two inputs configure the engine:
//!
//! 1. The operating mode (`PROXY_MODE`): `log` (default) or `enforce`
//! 2. The policy document (`/etc/mitmproxy/policy.yaml` by default)
//!
//! ```yaml
//! services:
//!   - github
//! domains:
//!   - pypi.org
//!   - "*.pythonhosted.org"
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::policy::WildcardMatching;

/// Default location of the policy document.
pub const DEFAULT_POLICY_PATH: &str = "/etc/mitmproxy/policy.yaml";

/// Operating mode, fixed for the lifetime of the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Record everything, block nothing.
    #[default]
    Log,
    /// Record everything, block hosts not on the allowlist.
    Enforce,
}

impl Mode {
    /// Configuration value for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Log => "log",
            Mode::Enforce => "enforce",
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    /// Only the exact lowercase names are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log" => Ok(Mode::Log),
            "enforce" => Ok(Mode::Enforce),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative policy document.
///
/// Both lists are optional; `null` is treated the same as a missing key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PolicyDocument {
    /// Service names resolved through the service catalog.
    #[serde(default)]
    pub services: Option<Vec<String>>,

    /// Raw domains or `*.`-prefixed wildcard patterns.
    #[serde(default)]
    pub domains: Option<Vec<String>>,
}

impl PolicyDocument {
    /// Service names, empty when absent.
    pub fn services(&self) -> &[String] {
        self.services.as_deref().unwrap_or_default()
    }

    /// Raw domains, empty when absent.
    pub fn domains(&self) -> &[String] {
        self.domains.as_deref().unwrap_or_default()
    }
}

/// Resolved startup settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Operating mode.
    pub mode: Mode,
    /// Where the policy document is expected.
    pub policy_path: PathBuf,
    /// Wildcard comparison rule.
    pub wildcard_matching: WildcardMatching,
}

impl Settings {
    /// Settings for a given mode with the default policy path.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            policy_path: PathBuf::from(DEFAULT_POLICY_PATH),
            wildcard_matching: WildcardMatching::default(),
        }
    }

    /// Override the policy path.
    #[must_use]
    pub fn policy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_path = path.into();
        self
    }

    /// Override the wildcard comparison rule.
    #[must_use]
    pub fn wildcard_matching(mut self, matching: WildcardMatching) -> Self {
        self.wildcard_matching = matching;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("log".parse::<Mode>().unwrap(), Mode::Log);
        assert_eq!("enforce".parse::<Mode>().unwrap(), Mode::Enforce);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = "strict".parse::<Mode>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMode(ref v) if v == "strict"));

        // No case folding or trimming
        assert!("ENFORCE".parse::<Mode>().is_err());
        assert!(" log".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_default_is_log() {
        assert_eq!(Mode::default(), Mode::Log);
        assert_eq!(Settings::default().mode, Mode::Log);
    }

    #[test]
    fn test_document_null_lists() {
        let doc: PolicyDocument = serde_yaml::from_str("services: null\ndomains:\n").unwrap();
        assert!(doc.services().is_empty());
        assert!(doc.domains().is_empty());
    }

    #[test]
    fn test_document_lists() {
        let doc: PolicyDocument =
            serde_yaml::from_str("services: [github]\ndomains: ['*.pypi.org', example.org]\n")
                .unwrap();
        assert_eq!(doc.services(), ["github"]);
        assert_eq!(doc.domains(), ["*.pypi.org", "example.org"]);
    }

    #[test]
    fn test_settings_builder() {
        let settings = Settings::new(Mode::Enforce)
            .policy_path("/tmp/policy.yaml")
            .wildcard_matching(WildcardMatching::LabelBoundary);

        assert_eq!(settings.policy_path, PathBuf::from("/tmp/policy.yaml"));
        assert_eq!(settings.wildcard_matching, WildcardMatching::LabelBoundary);
    }
}
