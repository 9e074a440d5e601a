//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Mode value is neither `log` nor `enforce`.
    #[error("Unknown PROXY_MODE '{0}'. Use 'enforce' or 'log'.")]
    UnknownMode(String),

    /// Failed to read the policy document.
    #[error("Failed to read policy file {path}: {source}")]
    ReadError {
        /// Path to the file that couldn't be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse a YAML policy document.
    #[error("Failed to parse policy file {path}: {source}")]
    ParseError {
        /// Path to the file that couldn't be parsed.
        path: PathBuf,
        /// The underlying YAML error.
        source: serde_yaml::Error,
    },

    /// Failed to parse a TOML policy document.
    #[error("Failed to parse policy file {path}: {source}")]
    TomlParseError {
        /// Path to the file that couldn't be parsed.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },
}
