//! Runtime target description: the interpreter version and word size that
//! catalog candidates have to match.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};

/// Word size of a target architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bitness {
    X86,
    X64,
}

impl fmt::Display for Bitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bitness::X86 => write!(f, "32-bit"),
            Bitness::X64 => write!(f, "64-bit"),
        }
    }
}

impl FromStr for Bitness {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "32" | "32-bit" | "x86" | "win32" => Ok(Bitness::X86),
            "64" | "64-bit" | "x64" | "amd64" => Ok(Bitness::X64),
            _ => anyhow::bail!("Unknown bitness: {}. Expected 32 or 64.", s),
        }
    }
}

/// The consumer environment candidates are matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeTarget {
    pub version: Version,
    pub bitness: Bitness,
}

impl RuntimeTarget {
    pub fn new(version: Version, bitness: Bitness) -> Self {
        Self { version, bitness }
    }

    /// Whether a runtime version published by a catalog names this target.
    ///
    /// Catalogs publish the release line only ("py2.7"), so the comparison
    /// covers major and minor.
    pub fn accepts_runtime(&self, published: &Version) -> bool {
        self.version.major == published.major && self.version.minor == published.minor
    }
}

impl fmt::Display for RuntimeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Python {} ({})", self.version, self.bitness)
    }
}
