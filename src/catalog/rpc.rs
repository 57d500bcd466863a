//! Remote-procedure catalog: a package index answering XML-RPC `search`
//! calls, as PyPI's legacy `/pypi` endpoint does.

use async_trait::async_trait;
use log::debug;

use super::xmlrpc::{self, Value};
use super::{Package, Searchable};
use crate::error::PygetError;
use crate::http::HttpClient;
use crate::target::RuntimeTarget;

const CONTENT_TYPE: &str = "text/xml";

/// One record of a `search` answer.
#[derive(Debug, Clone, PartialEq)]
struct SearchHit {
    name: String,
    version: String,
    summary: Option<String>,
}

impl SearchHit {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            name: value.member("name")?.as_str()?.to_string(),
            version: value.member("version")?.as_str()?.to_string(),
            summary: value
                .member("summary")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Catalog backed by a structured search endpoint at the source location.
pub struct RemoteProcedureCatalog {
    source_name: String,
    url: String,
    http_client: HttpClient,
}

impl RemoteProcedureCatalog {
    pub fn new(source_name: &str, url: &str, http_client: HttpClient) -> Self {
        Self {
            source_name: source_name.to_string(),
            url: url.to_string(),
            http_client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call_search(&self, name: &str) -> Result<Vec<SearchHit>, PygetError> {
        let request = xmlrpc::method_call(
            "search",
            &[Value::Struct(vec![(
                "name".to_string(),
                Value::String(name.to_string()),
            )])],
        );

        debug!("Searching {} for '{}'...", self.url, name);
        let body = self
            .http_client
            .post_text(&self.url, CONTENT_TYPE, request)
            .await
            .map_err(|e| PygetError::remote(&self.source_name, format!("{:#}", e)))?;

        let result = xmlrpc::parse_response(&body)
            .map_err(|e| PygetError::remote(&self.source_name, format!("search failed: {}", e)))?;

        let items = result.as_array().ok_or_else(|| {
            PygetError::remote(&self.source_name, "search did not return an array")
        })?;
        items
            .iter()
            .map(|item| {
                SearchHit::from_value(item).ok_or_else(|| {
                    PygetError::remote(&self.source_name, "search result lacks a name or version")
                })
            })
            .collect()
    }
}

#[async_trait]
impl Searchable for RemoteProcedureCatalog {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    #[tracing::instrument(skip(self, _target), fields(source = %self.source_name))]
    async fn search(
        &self,
        name: &str,
        _target: &RuntimeTarget,
    ) -> Result<Vec<Package>, PygetError> {
        let hits = self.call_search(name).await?;
        debug!("{} returned {} result(s)", self.source_name, hits.len());

        Ok(hits
            .into_iter()
            .map(|hit| {
                Package::new(&self.source_name, &hit.name, &hit.version, None)
                    .with_summary(hit.summary.unwrap_or_default())
            })
            .collect())
    }
}
