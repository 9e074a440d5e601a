//! Command-line interface definitions for egress-policy.
//!
//! Uses clap's derive API for type-safe argument parsing. Every option can
//! also come from the environment the proxy container is started with.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DEFAULT_POLICY_PATH, Mode, Settings};
use crate::policy::WildcardMatching;

/// Default port for `check` targets without an explicit port.
pub const DEFAULT_CHECK_PORT: u16 = 443;

/// Egress allowlist decisions for a forward proxy.
///
/// Evaluates CONNECT and plain HTTP targets against a policy document and
/// records every decision as a JSON line.
#[derive(Parser, Debug)]
#[command(name = "egress-policy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// What to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Operating mode: `log` (record only) or `enforce`.
    ///
    /// Kept as a raw string so an unrecognized value can be reported on the
    /// audit stream before exiting.
    #[arg(long = "mode", env = "PROXY_MODE", default_value = "log", global = true)]
    pub mode: String,

    /// Path to the policy document (YAML, or TOML with a `.toml` extension).
    #[arg(
        long = "policy",
        env = "PROXY_POLICY_PATH",
        value_name = "PATH",
        default_value = DEFAULT_POLICY_PATH,
        global = true
    )]
    pub policy: PathBuf,

    /// Require a non-empty label in front of wildcard suffixes.
    ///
    /// By default `*.example.com` is a plain suffix test.
    #[arg(
        long = "strict-wildcards",
        env = "PROXY_STRICT_WILDCARDS",
        value_parser = clap::builder::FalseyValueParser::new(),
        global = true
    )]
    pub strict_wildcards: bool,

    /// Append audit records to this file instead of stdout.
    #[arg(long = "audit-log", value_name = "PATH", global = true)]
    pub audit_log: Option<PathBuf>,

    /// Increase log verbosity.
    ///
    /// Can be specified multiple times:
    /// -v    = info level
    /// -vv   = debug level
    /// -vvv  = trace level
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Subcommands for egress-policy.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load mode and policy, record the startup diagnostics, and exit.
    Validate,

    /// Evaluate targets as CONNECT requests.
    ///
    /// Exits non-zero if any target is blocked.
    Check {
        /// Targets as HOST, HOST:PORT, or [IPV6]:PORT.
        #[arg(required = true, value_name = "HOST[:PORT]")]
        targets: Vec<String>,
    },

    /// Read flow events as JSON lines on stdin and answer with one verdict
    /// line per event on stdout.
    ///
    /// Requires `--audit-log` so verdicts and audit records stay apart.
    Bridge,
}

impl Cli {
    /// Resolve startup settings for an already validated mode.
    pub fn settings(&self, mode: Mode) -> Settings {
        let matching = if self.strict_wildcards {
            WildcardMatching::LabelBoundary
        } else {
            WildcardMatching::Suffix
        };

        Settings::new(mode)
            .policy_path(&self.policy)
            .wildcard_matching(matching)
    }

    /// Parse a `check` target into (host, port).
    ///
    /// A target without a port uses [`DEFAULT_CHECK_PORT`]. IPv6 literals
    /// must be bracketed (`[::1]` or `[::1]:443`); the brackets are stripped
    /// from the returned host. Returns None if the host is empty, an IPv6
    /// literal is unbracketed, or the port is not a valid number.
    pub fn parse_target(target: &str) -> Option<(String, u16)> {
        let (host, port) = if let Some(rest) = target.strip_prefix('[') {
            let (host, rest) = rest.split_once(']')?;
            let port = match rest {
                "" => DEFAULT_CHECK_PORT,
                _ => rest.strip_prefix(':')?.parse().ok()?,
            };
            (host, port)
        } else {
            match target.split_once(':') {
                Some((_, port)) if port.contains(':') => return None,
                Some((host, port)) => (host, port.parse().ok()?),
                None => (target, DEFAULT_CHECK_PORT),
            }
        };

        if host.is_empty() {
            return None;
        }

        Some((host.to_string(), port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_valid() {
        assert_eq!(
            Cli::parse_target("github.com"),
            Some(("github.com".to_string(), 443))
        );
        assert_eq!(
            Cli::parse_target("example.org:80"),
            Some(("example.org".to_string(), 80))
        );
    }

    #[test]
    fn test_parse_target_invalid() {
        assert_eq!(Cli::parse_target(""), None);
        assert_eq!(Cli::parse_target(":443"), None);
        assert_eq!(Cli::parse_target("example.org:"), None);
        assert_eq!(Cli::parse_target("example.org:https"), None);
        assert_eq!(Cli::parse_target("example.org:70000"), None);
    }

    #[test]
    fn test_parse_target_ipv6() {
        assert_eq!(
            Cli::parse_target("[::1]:8443"),
            Some(("::1".to_string(), 8443))
        );
        assert_eq!(Cli::parse_target("[::1]"), Some(("::1".to_string(), 443)));

        // Unbracketed literals are ambiguous about where the port starts
        assert_eq!(Cli::parse_target("::1"), None);
        assert_eq!(Cli::parse_target("2001:db8::1:443"), None);
        assert_eq!(Cli::parse_target("[::1"), None);
        assert_eq!(Cli::parse_target("[::1]443"), None);
        assert_eq!(Cli::parse_target("[]:443"), None);
    }

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::parse_from([
            "egress-policy",
            "--mode",
            "enforce",
            "--policy",
            "/tmp/policy.yaml",
            "check",
            "github.com",
            "bad.test:8443",
        ]);

        assert_eq!(cli.mode, "enforce");
        assert_eq!(cli.policy, PathBuf::from("/tmp/policy.yaml"));
        match cli.command {
            Commands::Check { ref targets } => {
                assert_eq!(targets, &vec!["github.com".to_string(), "bad.test:8443".to_string()]);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_check_requires_targets() {
        assert!(Cli::try_parse_from(["egress-policy", "check"]).is_err());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "egress-policy",
            "bridge",
            "--audit-log",
            "/tmp/audit.log",
            "--strict-wildcards",
            "-vv",
        ]);

        assert!(matches!(cli.command, Commands::Bridge));
        assert_eq!(cli.audit_log, Some(PathBuf::from("/tmp/audit.log")));
        assert!(cli.strict_wildcards);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_unrecognized_mode_is_not_rejected_by_clap() {
        // Mode validation happens later so it can be recorded
        let cli = Cli::parse_from(["egress-policy", "--mode", "strict", "validate"]);
        assert_eq!(cli.mode, "strict");
    }

    #[test]
    fn test_settings() {
        let cli = Cli::parse_from([
            "egress-policy",
            "--policy",
            "/srv/policy.toml",
            "--strict-wildcards",
            "validate",
        ]);
        let settings = cli.settings(Mode::Enforce);

        assert_eq!(settings.mode, Mode::Enforce);
        assert_eq!(settings.policy_path, PathBuf::from("/srv/policy.toml"));
        assert_eq!(settings.wildcard_matching, WildcardMatching::LabelBoundary);
    }
}
