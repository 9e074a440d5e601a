//! Policy document loading.
//!
//! The document is YAML unless the path ends in `.toml`. A missing file is
//! reported as `Ok(None)` so the caller can decide whether that is fatal
//! (it is only in enforce mode). Unreadable or malformed files are errors.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::ConfigError;
use super::schema::PolicyDocument;

/// Reads and parses the policy document from a fixed location.
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    path: PathBuf,
}

impl PolicyLoader {
    /// Create a loader for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this loader reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document.
    ///
    /// Returns `Ok(None)` when the file does not exist. An empty or
    /// comment-only file yields an empty document.
    pub fn load(&self) -> Result<Option<PolicyDocument>, ConfigError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No policy file at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let document = self.parse(&contents)?;
        debug!(
            "Loaded policy from {:?}: {} services, {} domains",
            self.path,
            document.services().len(),
            document.domains().len()
        );
        Ok(Some(document))
    }

    fn parse(&self, contents: &str) -> Result<PolicyDocument, ConfigError> {
        if self.is_toml() {
            return toml::from_str(contents).map_err(|e| ConfigError::TomlParseError {
                path: self.path.clone(),
                source: e,
            });
        }

        if is_blank_yaml(contents) {
            return Ok(PolicyDocument::default());
        }

        // A bare `null` / `~` document parses as None
        let document: Option<PolicyDocument> =
            serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseError {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(document.unwrap_or_default())
    }

    fn is_toml(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
    }
}

/// True when a YAML document has no content besides comments and separators.
fn is_blank_yaml(contents: &str) -> bool {
    contents.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}
