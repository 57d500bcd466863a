//! Catalog backends.
//!
//! A catalog is anything that can answer "which packages match this name for
//! this runtime". The resolver holds a collection of [`Searchable`] trait
//! objects and never inspects which kind of backend it is talking to.

mod factory;
mod listing;
mod rpc;
mod xmlrpc;

use async_trait::async_trait;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::PygetError;
use crate::fastpath::FastPath;
use crate::target::RuntimeTarget;

pub use factory::{BackendFailure, build_catalogs};
pub use listing::{ListingEntry, ScrapedListingCatalog, deobfuscate};
pub use rpc::RemoteProcedureCatalog;

/// A package found in a catalog.
///
/// Two packages are the same package when their fast paths are equal; the
/// other fields are descriptive.
#[derive(Debug, Clone)]
pub struct Package {
    pub fast_path: String,
    pub name: String,
    pub version: String,
    pub version_scheme: Option<String>,
    pub summary: Option<String>,
    pub source: String,
}

impl Package {
    /// Build a package whose fast path is derived from its parts.
    pub fn new(source: &str, name: &str, version: &str, download_uri: Option<&str>) -> Self {
        Self {
            fast_path: FastPath::encode(source, name, version, download_uri),
            name: name.to_string(),
            version: version.to_string(),
            version_scheme: None,
            summary: None,
            source: source.to_string(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        self.summary = if summary.is_empty() { None } else { Some(summary) };
        self
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.fast_path == other.fast_path
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fast_path.hash(state);
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{} ({})", self.name, self.version, self.source)
    }
}

/// A catalog that can be searched by package name.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Searchable: Send + Sync {
    /// Name of the source this catalog was built from.
    fn source_name(&self) -> &str;

    /// Find packages whose name matches `name` and that suit `target`.
    async fn search(
        &self,
        name: &str,
        target: &RuntimeTarget,
    ) -> Result<Vec<Package>, PygetError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_package_fast_path() {
        let package = Package::new("pypi", "requests", "2.31.0", None);
        assert_eq!(package.fast_path, "pypi/requests/2.31.0");
        assert_eq!(package.source, "pypi");
        assert_eq!(package.version_scheme, None);
    }

    #[test]
    fn test_package_identity_is_fast_path() {
        let a = Package::new("pypi", "requests", "2.31.0", None).with_summary("HTTP");
        let mut b = Package::new("pypi", "requests", "2.31.0", None);
        b.name = "Requests".into();
        assert_eq!(a, b);

        let c = Package::new("mirror", "requests", "2.31.0", None);
        assert_ne!(a, c);

        let set: HashSet<Package> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_package_empty_summary_is_none() {
        let package = Package::new("pypi", "x", "1", None).with_summary("");
        assert_eq!(package.summary, None);
    }

    #[test]
    fn test_package_display() {
        let package = Package::new("pypi", "requests", "2.31.0", None);
        assert_eq!(package.to_string(), "requests v2.31.0 (pypi)");
    }
}
