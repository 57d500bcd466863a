//! Catalog factory: turns source descriptors into searchable backends.

use std::fmt;
use std::sync::Arc;

use log::warn;

use super::{RemoteProcedureCatalog, ScrapedListingCatalog, Searchable};
use crate::error::PygetError;
use crate::http::HttpClient;
use crate::source::{Source, SourceKind};

/// A source that contributed nothing, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub source: String,
    pub error: PygetError,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// Create one catalog per source.
///
/// Sources that cannot be turned into a catalog are reported and skipped.
pub fn build_catalogs(
    sources: &[Source],
    http_client: &HttpClient,
) -> (Vec<Arc<dyn Searchable>>, Vec<BackendFailure>) {
    let mut catalogs: Vec<Arc<dyn Searchable>> = Vec::with_capacity(sources.len());
    let mut failures = Vec::new();

    for source in sources {
        match create_catalog(source, http_client) {
            Ok(catalog) => catalogs.push(catalog),
            Err(error) => {
                warn!("Skipping source {}: {}", source.name, error);
                failures.push(BackendFailure {
                    source: source.name.clone(),
                    error,
                });
            }
        }
    }

    (catalogs, failures)
}

fn create_catalog(
    source: &Source,
    http_client: &HttpClient,
) -> Result<Arc<dyn Searchable>, PygetError> {
    Ok(match source.kind {
        SourceKind::Pypi => Arc::new(RemoteProcedureCatalog::new(
            &source.name,
            &source.location,
            http_client.clone(),
        )),
        SourceKind::Listing => Arc::new(ScrapedListingCatalog::new(
            &source.name,
            &source.location,
            http_client.clone(),
        )?),
    })
}
