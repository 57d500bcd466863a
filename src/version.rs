//! Version parsing and constraint matching.
//!
//! Versions published by package catalogs are only loosely semantic
//! ("2.7", "1.9.0rc1", "v3"). Parsing is best-effort: anything that cannot
//! be read as `major[.minor[.patch]]` yields `None`, and callers drop such
//! candidates from constraint matching instead of failing.

use std::cmp::Ordering;
use std::fmt;

use semver::Version;

use crate::error::PygetError;

/// Parse a version string, padding missing minor/patch components with zero.
pub fn parse(text: &str) -> Option<Version> {
    let text = text.trim();
    let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
    if text.is_empty() {
        return None;
    }

    if let Ok(version) = Version::parse(text) {
        return Some(version);
    }

    // Split off "-pre" / "+build" and pad the numeric core.
    let suffix_at = text.find(['-', '+']).unwrap_or(text.len());
    let (core, suffix) = text.split_at(suffix_at);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }

    let mut padded: Vec<&str> = parts;
    while padded.len() < 3 {
        padded.push("0");
    }
    Version::parse(&format!("{}{}", padded.join("."), suffix)).ok()
}

/// Parse a version that the caller requires to be valid.
pub fn parse_required(text: &str) -> Result<Version, PygetError> {
    parse(text).ok_or_else(|| PygetError::Format(format!("'{}' is not a valid version", text)))
}

/// The smallest representable version, 0.0.0.
pub fn min_version() -> Version {
    Version::new(0, 0, 0)
}

/// The largest representable version, used as an open upper bound.
pub fn max_version() -> Version {
    Version::new(u64::MAX, u64::MAX, u64::MAX)
}

/// Order two version strings. `None` if either does not parse.
pub fn compare(a: &str, b: &str) -> Option<Ordering> {
    Some(parse(a)?.cmp(&parse(b)?))
}

/// Version constraint for selecting a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// Match this version only.
    Exact(Version),
    /// Match any version in the inclusive range.
    Range { min: Version, max: Version },
}

impl Default for VersionConstraint {
    fn default() -> Self {
        VersionConstraint::Range {
            min: min_version(),
            max: max_version(),
        }
    }
}

impl VersionConstraint {
    /// Build a constraint from the optional bounds a caller supplies.
    ///
    /// An exact version cannot be combined with a range bound.
    pub fn from_bounds(
        required: Option<&str>,
        minimum: Option<&str>,
        maximum: Option<&str>,
    ) -> Result<Self, PygetError> {
        if let Some(required) = required {
            if minimum.is_some() || maximum.is_some() {
                return Err(PygetError::Format(
                    "an exact version cannot be combined with a minimum or maximum".into(),
                ));
            }
            return Ok(VersionConstraint::Exact(parse_required(required)?));
        }

        Ok(VersionConstraint::Range {
            min: minimum.map(parse_required).transpose()?.unwrap_or_else(min_version),
            max: maximum.map(parse_required).transpose()?.unwrap_or_else(max_version),
        })
    }

    pub fn exact(version: &str) -> Result<Self, PygetError> {
        Self::from_bounds(Some(version), None, None)
    }

    pub fn range(minimum: Option<&str>, maximum: Option<&str>) -> Result<Self, PygetError> {
        Self::from_bounds(None, minimum, maximum)
    }

    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionConstraint::Exact(exact) => version == exact,
            VersionConstraint::Range { min, max } => version >= min && version <= max,
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Exact(v) => write!(f, "=={}", v),
            VersionConstraint::Range { min, max } if *max == max_version() => {
                write!(f, ">={}", min)
            }
            VersionConstraint::Range { min, max } => write!(f, ">={}, <={}", min, max),
        }
    }
}

/// Test a version string against a constraint. Unparsable versions never match.
pub fn matches(version: &str, constraint: &VersionConstraint) -> bool {
    parse(version).is_some_and(|v| constraint.matches(&v))
}
