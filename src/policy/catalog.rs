//! Static service catalog.
//!
//! Maps a logical service name used in policy documents (`services: [github]`)
//! to the domain patterns that service needs. The table is compiled into the
//! binary and never changes at runtime.

use std::collections::BTreeMap;

/// Built-in service definitions.
const BUILTIN_SERVICES: &[(&str, &[&str])] = &[(
    "github",
    &[
        "github.com",
        "*.github.com",
        "githubusercontent.com",
        "*.githubusercontent.com",
    ],
)];

/// Immutable mapping from service name to pattern source strings.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: BTreeMap<String, Vec<String>>,
}

impl ServiceCatalog {
    /// The catalog shipped with the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_SERVICES.iter().map(|(name, patterns)| {
            (
                (*name).to_string(),
                patterns.iter().map(|p| (*p).to_string()).collect(),
            )
        }))
    }

    /// Build a catalog from arbitrary entries (for embedding and tests).
    ///
    /// A later entry with the same name replaces an earlier one.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            services: entries.into_iter().collect(),
        }
    }

    /// Look up the pattern sources for a service.
    ///
    /// Returns `None` for unknown names; reporting is up to the caller.
    pub fn resolve(&self, name: &str) -> Option<&[String]> {
        self.services.get(name).map(Vec::as_slice)
    }

    /// Whether the catalog knows this service.
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Known service names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
