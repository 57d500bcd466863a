//! JSON file-backed source store.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{Source, SourceKind, SourceStore};
use crate::runtime::Runtime;

/// On-disk layout of the sources file.
#[derive(Serialize, Deserialize, Debug, Default)]
struct SourcesFile {
    #[serde(default)]
    sources: Vec<Source>,
}

/// Sources written to a fresh configuration.
pub fn default_sources() -> Vec<Source> {
    vec![Source::new(
        "pypi",
        "https://pypi.python.org/pypi",
        true,
        SourceKind::Pypi,
    )]
}

/// Source store persisted as JSON at a fixed path.
pub struct JsonSourceStore<R: Runtime> {
    runtime: R,
    path: PathBuf,
    sources: Vec<Source>,
}

impl<R: Runtime> JsonSourceStore<R> {
    /// Load the store, seeding it with [`default_sources`] if the file does not exist.
    #[tracing::instrument(skip(runtime))]
    pub fn load(runtime: R, path: &Path) -> Result<Self> {
        let sources = if runtime.exists(path) {
            let content = runtime
                .read_to_string(path)
                .with_context(|| format!("Failed to read sources from {:?}", path))?;
            let file: SourcesFile = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse sources file {:?}", path))?;
            file.sources
        } else {
            debug!("No sources file at {:?}, using defaults", path);
            default_sources()
        };

        let store = Self {
            runtime,
            path: path.to_path_buf(),
            sources,
        };
        if !store.runtime.exists(path) {
            store.save()?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !self.runtime.exists(parent) {
                self.runtime.create_dir_all(parent)?;
            }
        }
        let file = SourcesFile {
            sources: self.sources.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        self.runtime
            .write(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to write sources to {:?}", self.path))?;
        debug!("Saved {} source(s) to {:?}", self.sources.len(), self.path);
        Ok(())
    }
}

impl<R: Runtime> SourceStore for JsonSourceStore<R> {
    fn list_sources(&self, trusted_only: bool) -> Result<Vec<Source>> {
        Ok(self
            .sources
            .iter()
            .filter(|s| !trusted_only || s.trusted)
            .cloned()
            .collect())
    }

    fn get(&self, name: &str) -> Result<Option<Source>> {
        Ok(self
            .sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn add(&mut self, source: Source) -> Result<()> {
        self.sources
            .retain(|s| !s.name.eq_ignore_ascii_case(&source.name));
        self.sources.push(source);
        self.save()
    }

    fn remove(&mut self, name: &str) -> Result<bool> {
        let before = self.sources.len();
        self.sources.retain(|s| s.name != name);
        if self.sources.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}
