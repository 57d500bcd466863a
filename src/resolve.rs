//! Resolution engine: fan a search out over every catalog, keep the
//! candidates that satisfy the version constraint and reduce each
//! (name, source) pair to its highest version.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use log::{debug, warn};
use semver::Version;

use crate::catalog::{BackendFailure, Package, Searchable};
use crate::error::PygetError;
use crate::target::RuntimeTarget;
use crate::version::{self, VersionConstraint};

/// Outcome of a resolution: the selected packages plus the catalogs that
/// could not be consulted.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub packages: Vec<Package>,
    pub failures: Vec<BackendFailure>,
}

/// Search request shared by every catalog.
#[derive(Debug, Clone)]
pub struct Query {
    pub name: String,
    pub constraint: VersionConstraint,
    pub target: RuntimeTarget,
    /// Per-catalog deadline; a catalog that has not answered in time
    /// contributes nothing.
    pub deadline: Option<Duration>,
}

impl Query {
    pub fn new(name: &str, constraint: VersionConstraint, target: RuntimeTarget) -> Self {
        Self {
            name: name.to_string(),
            constraint,
            target,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Query every catalog concurrently and select the best match per
/// (name, source).
///
/// A failing catalog never fails the resolution: its error is logged and
/// returned in [`Resolution::failures`].
#[tracing::instrument(skip(catalogs), fields(catalogs = catalogs.len()))]
pub async fn resolve(query: &Query, catalogs: &[Arc<dyn Searchable>]) -> Resolution {
    let searches = catalogs.iter().map(|catalog| search_one(catalog.as_ref(), query));
    let outcomes = join_all(searches).await;

    let mut candidates = Vec::new();
    let mut failures = Vec::new();
    for (catalog, outcome) in catalogs.iter().zip(outcomes) {
        match outcome {
            Ok(packages) => {
                debug!(
                    "{} returned {} candidate(s)",
                    catalog.source_name(),
                    packages.len()
                );
                candidates.extend(packages);
            }
            Err(error) => {
                warn!("Skipping {}: {}", catalog.source_name(), error);
                failures.push(BackendFailure {
                    source: catalog.source_name().to_string(),
                    error,
                });
            }
        }
    }

    Resolution {
        packages: select_best(candidates, &query.constraint),
        failures,
    }
}

async fn search_one(catalog: &dyn Searchable, query: &Query) -> Result<Vec<Package>, PygetError> {
    let search = catalog.search(&query.name, &query.target);
    match query.deadline {
        None => search.await,
        Some(deadline) => tokio::time::timeout(deadline, search)
            .await
            .unwrap_or_else(|_| {
                Err(PygetError::remote(
                    catalog.source_name(),
                    format!("no answer within {:?}", deadline),
                ))
            }),
    }
}

/// Keep candidates whose version parses and satisfies `constraint`, then
/// reduce each (name, source) group to its highest version.
///
/// Groups are returned in the order they first appear in `candidates`;
/// within a group the first of equal versions wins.
pub fn select_best(candidates: Vec<Package>, constraint: &VersionConstraint) -> Vec<Package> {
    let mut selected: Vec<(Package, Version)> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for candidate in candidates {
        let Some(parsed) = version::parse(&candidate.version) else {
            debug!(
                "Ignoring {} from {}: unparsable version '{}'",
                candidate.name, candidate.source, candidate.version
            );
            continue;
        };
        if !constraint.matches(&parsed) {
            continue;
        }

        let key = (candidate.name.clone(), candidate.source.clone());
        match index.get(&key) {
            Some(&slot) => {
                if parsed > selected[slot].1 {
                    selected[slot] = (candidate, parsed);
                }
            }
            None => {
                index.insert(key, selected.len());
                selected.push((candidate, parsed));
            }
        }
    }

    selected.into_iter().map(|(package, _)| package).collect()
}
