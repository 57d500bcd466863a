use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

use crate::http::{HttpClient, RetryPolicy};
use crate::runtime::Runtime;

/// Per-catalog deadline used when none is given.
pub const DEFAULT_DEADLINE_SECS: u64 = 30;

pub const USER_AGENT: &str = "pyget-cli";

/// Everything a command needs to talk to the host and to remote catalogs.
pub struct Config<R: Runtime> {
    pub runtime: R,
    pub http_client: HttpClient,
    pub sources_path: PathBuf,
    pub deadline: Duration,
}

impl<R: Runtime> Config<R> {
    pub fn new(
        runtime: R,
        explicit_sources: Option<PathBuf>,
        timeout_secs: Option<u64>,
        retries: Option<usize>,
    ) -> Result<Self> {
        let sources_path = sources_path(&runtime, explicit_sources)?;
        let deadline = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_DEADLINE_SECS));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(deadline)
            .build()?;
        let retry = match retries {
            Some(attempts) => RetryPolicy::with_attempts(attempts),
            None => RetryPolicy::default(),
        };
        debug!(
            "Using sources {:?}, deadline {:?}, {} attempt(s) per request",
            sources_path, deadline, retry.attempts
        );

        Ok(Self {
            runtime,
            http_client: HttpClient::with_retry_policy(client, retry),
            sources_path,
            deadline,
        })
    }
}

/// `<config_dir>/pyget/sources.json`
#[tracing::instrument(skip(runtime))]
pub fn default_sources_path<R: Runtime + ?Sized>(runtime: &R) -> Result<PathBuf> {
    let config_dir = runtime
        .config_dir()
        .context("Could not find the user configuration directory")?;
    Ok(config_dir.join("pyget").join("sources.json"))
}

/// Explicit path if given, else [`default_sources_path`].
pub fn sources_path<R: Runtime + ?Sized>(runtime: &R, explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => default_sources_path(runtime),
    }
}
