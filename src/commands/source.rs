use anyhow::{Context, Result};
use log::info;
use reqwest::Url;
use std::path::Path;

use crate::{
    runtime::Runtime,
    source::{JsonSourceStore, Source, SourceKind, SourceStore},
};

/// Print every registered source.
#[tracing::instrument(skip(runtime))]
pub fn source_list<R: Runtime>(runtime: R, sources_path: &Path) -> Result<()> {
    let store = JsonSourceStore::load(runtime, sources_path)?;
    let sources = store.list_sources(false)?;
    if sources.is_empty() {
        println!("No sources registered.");
    }
    for source in sources {
        println!("{}", source);
    }
    Ok(())
}

/// Register a source, replacing one with the same name.
#[tracing::instrument(skip(runtime))]
pub fn source_add<R: Runtime>(
    runtime: R,
    sources_path: &Path,
    name: &str,
    location: &str,
    kind: SourceKind,
    trusted: bool,
) -> Result<()> {
    validate_location(location)?;

    let mut store = JsonSourceStore::load(runtime, sources_path)?;
    let replaced = store.get(name)?.is_some();
    store.add(Source::new(name, location, trusted, kind))?;

    if replaced {
        info!("Replaced source {}", name);
    }
    println!("Added source {} ({})", name, location);
    Ok(())
}

/// Remove a source by its exact name.
#[tracing::instrument(skip(runtime))]
pub fn source_remove<R: Runtime>(runtime: R, sources_path: &Path, name: &str) -> Result<()> {
    let mut store = JsonSourceStore::load(runtime, sources_path)?;
    if !store.remove(name)? {
        anyhow::bail!("Source {} is not registered", name);
    }
    println!("Removed source {}", name);
    Ok(())
}

fn validate_location(location: &str) -> Result<()> {
    let url = Url::parse(location).with_context(|| format!("'{}' is not a URL", location))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => anyhow::bail!("Unsupported scheme '{}': only http and https are allowed", other),
    }
}
