//! Startup error types.
//!
//! Every variant is fatal: the process must not serve traffic in an
//! undefined enforcement posture. The binary turns these into a non-zero
//! exit; the library never exits on its own.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Unified error type for engine startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Mode or policy document is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Enforce mode was requested without a policy document.
    #[error("PROXY_MODE=enforce but no policy file at {}", path.display())]
    MissingPolicy {
        /// Where the document was expected.
        path: PathBuf,
    },

    /// The audit sink could not be written.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Result type for startup operations.
pub type StartupResult<T> = Result<T, StartupError>;
