//! Error taxonomy for package resolution.
//!
//! Codec and header errors are fatal to the operation that raised them.
//! `RemoteUnavailable` and `DataCorruption` are recovered locally by the
//! resolver and the listing scanner respectively.

use thiserror::Error;

/// Errors raised by the identifier codec, the catalog backends and the
/// binary header inspector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PygetError {
    /// A fast-path token or version string could not be parsed.
    #[error("Malformed input: {0}")]
    Format(String),

    /// A source descriptor failed a precondition at backend construction.
    #[error("Invalid source '{source_name}': {reason}")]
    InvalidSource { source_name: String, reason: String },

    /// Network or protocol failure while talking to a catalog.
    #[error("Source '{source_name}' is unavailable: {reason}")]
    RemoteUnavailable { source_name: String, reason: String },

    /// The executable header carries a machine type we do not map.
    #[error("Unrecognized executable format: machine type {machine:#06x}")]
    UnrecognizedFormat { machine: u16 },

    /// A listing entry references data that is not there.
    #[error("Corrupt listing entry: {0}")]
    DataCorruption(String),
}

impl PygetError {
    pub fn remote(source_name: &str, reason: impl std::fmt::Display) -> Self {
        PygetError::RemoteUnavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_source(source_name: &str, reason: impl Into<String>) -> Self {
        PygetError::InvalidSource {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}
