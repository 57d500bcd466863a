use anyhow::Result;
use log::{debug, info};
use semver::Version;
use std::path::PathBuf;

use crate::{
    catalog::{Package, build_catalogs},
    config::Config,
    python::PythonInstallation,
    resolve::{Query, Resolution, resolve},
    runtime::Runtime,
    source::{JsonSourceStore, SourceStore},
    target::{Bitness, RuntimeTarget},
    version::{self, VersionConstraint},
};

/// What to search for and for which interpreter.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub name: String,
    pub required_version: Option<String>,
    pub minimum_version: Option<String>,
    pub maximum_version: Option<String>,
    pub python: Option<PathBuf>,
    pub python_version: Option<String>,
    pub bitness: Option<Bitness>,
    pub trusted_only: bool,
}

/// Search every registered source and print the best match per
/// (name, source).
#[tracing::instrument(skip(config))]
pub async fn find<R: Runtime>(config: Config<R>, options: &FindOptions) -> Result<Resolution> {
    let constraint = VersionConstraint::from_bounds(
        options.required_version.as_deref(),
        options.minimum_version.as_deref(),
        options.maximum_version.as_deref(),
    )?;
    let target = runtime_target(&config.runtime, options)?;
    info!("Searching for {} {} on {}", options.name, constraint, target);

    let store = JsonSourceStore::load(config.runtime, &config.sources_path)?;
    let sources = store.list_sources(options.trusted_only)?;
    debug!("Searching {} source(s)", sources.len());

    let (catalogs, mut failures) = build_catalogs(&sources, &config.http_client);
    let query = Query::new(&options.name, constraint, target).with_deadline(config.deadline);
    let mut resolution = resolve(&query, &catalogs).await;
    failures.append(&mut resolution.failures);
    resolution.failures = failures;

    for failure in &resolution.failures {
        eprintln!("warning: {}", failure);
    }
    if resolution.packages.is_empty() {
        println!("No packages found.");
    }
    for package in &resolution.packages {
        println!("{}", format_package(package));
    }

    Ok(resolution)
}

/// The interpreter to match against: explicit version and bitness bypass
/// discovery entirely.
fn runtime_target<R: Runtime>(runtime: &R, options: &FindOptions) -> Result<RuntimeTarget> {
    if let (None, Some(text), Some(bitness)) =
        (&options.python, &options.python_version, options.bitness)
    {
        let version: Version = version::parse_required(text)?;
        return Ok(RuntimeTarget::new(version, bitness));
    }

    let python = PythonInstallation::locate(
        runtime,
        options.python.as_deref(),
        options.python_version.as_deref(),
    )?;
    python.target(runtime, options.bitness)
}

/// `<name> <version> (<source>) <fast-path>`
pub fn format_package(package: &Package) -> String {
    format!(
        "{} {} ({}) {}",
        package.name, package.version, package.source, package.fast_path
    )
}
