//! Package source descriptors and the registry that stores them.
//!
//! The resolver only ever sees a snapshot (`Vec<Source>`) taken from a
//! [`SourceStore`]; it never holds the store itself.

mod store;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use store::{JsonSourceStore, default_sources};

/// Kind of catalog a source points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// An index answering structured search calls.
    #[default]
    Pypi,
    /// An HTML page of prebuilt installers.
    Listing,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Pypi => write!(f, "pypi"),
            SourceKind::Listing => write!(f, "listing"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pypi" | "rpc" => Ok(SourceKind::Pypi),
            "listing" | "wheel-listing" | "wheellisting" => Ok(SourceKind::Listing),
            _ => anyhow::bail!("Unknown source kind: {}. Expected pypi or listing.", s),
        }
    }
}

/// A registered package source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub trusted: bool,
    #[serde(default)]
    pub kind: SourceKind,
}

impl Source {
    pub fn new(name: &str, location: &str, trusted: bool, kind: SourceKind) -> Self {
        Self {
            name: name.to_string(),
            location: location.to_string(),
            trusted,
            kind,
        }
    }
}

// Sources are identified by name.
impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Source {}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}]{}",
            self.name,
            self.location,
            self.kind,
            if self.trusted { " (trusted)" } else { "" }
        )
    }
}

/// Storage for registered sources.
pub trait SourceStore {
    /// Sources in definition order, optionally only the trusted ones.
    fn list_sources(&self, trusted_only: bool) -> Result<Vec<Source>>;

    /// Look up a source by name, ignoring case.
    fn get(&self, name: &str) -> Result<Option<Source>>;

    /// Add a source, replacing any source with the same name (ignoring case).
    fn add(&mut self, source: Source) -> Result<()>;

    /// Remove the source with exactly this name. Returns whether one was removed.
    fn remove(&mut self, name: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("pypi".parse::<SourceKind>().unwrap(), SourceKind::Pypi);
        assert_eq!("PyPI".parse::<SourceKind>().unwrap(), SourceKind::Pypi);
        assert_eq!("listing".parse::<SourceKind>().unwrap(), SourceKind::Listing);
        assert_eq!(
            "WheelListing".parse::<SourceKind>().unwrap(),
            SourceKind::Listing
        );
        assert!("git".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::Pypi.to_string(), "pypi");
        assert_eq!(SourceKind::Listing.to_string(), "listing");
    }

    #[test]
    fn test_source_equality_by_name() {
        let a = Source::new("pypi", "https://a", true, SourceKind::Pypi);
        let b = Source::new("pypi", "https://b", false, SourceKind::Listing);
        let c = Source::new("PyPI", "https://a", true, SourceKind::Pypi);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_source_serde_defaults() {
        let source: Source =
            serde_json::from_str(r#"{"name": "x", "location": "https://x"}"#).unwrap();
        assert!(!source.trusted);
        assert_eq!(source.kind, SourceKind::Pypi);

        let json = serde_json::to_string(&Source::new("l", "https://l", true, SourceKind::Listing))
            .unwrap();
        assert!(json.contains(r#""kind":"listing""#));
    }

    #[test]
    fn test_source_display() {
        let source = Source::new("pypi", "https://pypi.org/pypi", true, SourceKind::Pypi);
        assert_eq!(
            source.to_string(),
            "pypi https://pypi.org/pypi [pypi] (trusted)"
        );
    }
}
