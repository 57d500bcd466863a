//! Scraped-listing catalog.
//!
//! Reads an HTML index of prebuilt Windows installers where each entry looks
//! like
//!
//! ```text
//! <li><a href='javascript:;' onclick='javascript:dl([104,116,...], "1032...")'
//!     title='...'>name&#8209;1.0.win&#8209;amd64&#8209;py2.7.exe</a></li>
//! ```
//!
//! The publisher scrambles each download path: the integer array holds the
//! character codes and the quoted key lists, one character per position,
//! which array index comes next (character code minus 48).

use std::sync::LazyLock;

use async_trait::async_trait;
use log::{debug, warn};
use regex::{Captures, Regex};
use reqwest::Url;
use semver::Version;

use super::{Package, Searchable};
use crate::error::PygetError;
use crate::http::HttpClient;
use crate::target::{Bitness, RuntimeTarget};
use crate::version;

static ENTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)<li><a href='javascript:;' onclick='javascript:dl\(\[(?P<encoded>[^\]]*)\], "(?P<key>[^"]*)"\)' title='[^']*'>"#,
        r"(?P<name>\w+)&#8209;(?P<version>(?:\w|\.)+)\.win(?P<bitness>32|&#8209;amd64)&#8209;py(?P<python>(?:\w|\.)+)\.exe</a></li>",
    ))
    .expect("listing entry pattern is valid")
});

/// Offset subtracted from each key character to obtain an array index.
const KEY_BASE: u32 = 48;

/// Reassemble a scrambled string: each key character selects, in order, the
/// array entry at `char - 48`.
pub fn deobfuscate(encoded: &[u32], key: &str) -> Result<String, PygetError> {
    key.chars()
        .map(|k| {
            let index = (k as u32).checked_sub(KEY_BASE).ok_or_else(|| {
                PygetError::DataCorruption(format!("key character {:?} is below the index base", k))
            })? as usize;
            let code = encoded.get(index).ok_or_else(|| {
                PygetError::DataCorruption(format!(
                    "key index {} is out of range for {} encoded characters",
                    index,
                    encoded.len()
                ))
            })?;
            char::from_u32(*code).ok_or_else(|| {
                PygetError::DataCorruption(format!("{} is not a character code", code))
            })
        })
        .collect()
}

/// One installer advertised by the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingEntry {
    pub name: String,
    /// Version as published.
    pub version: String,
    pub python_version: Version,
    pub bitness: Bitness,
    pub download_uri: String,
}

impl ListingEntry {
    /// Parse a listing line. `None` when the line is not an entry,
    /// `Some(Err)` when it is an entry that cannot be decoded.
    pub fn parse_line(base: &Url, line: &str) -> Option<Result<Self, PygetError>> {
        let captures = ENTRY_PATTERN.captures(line)?;
        Some(Self::from_captures(base, &captures))
    }

    fn from_captures(base: &Url, captures: &Captures<'_>) -> Result<Self, PygetError> {
        let encoded = captures["encoded"]
            .split(',')
            .map(|n| {
                n.trim().parse::<u32>().map_err(|_| {
                    PygetError::DataCorruption(format!("'{}' is not a character code", n.trim()))
                })
            })
            .collect::<Result<Vec<u32>, _>>()?;
        let suffix = deobfuscate(&encoded, &captures["key"])?;

        // Versions the comparator cannot order ("1.9.0rc1") are kept; the
        // resolver drops them when it selects.
        let version_text = &captures["version"];
        let python_version = version::parse(&captures["python"]).ok_or_else(|| {
            PygetError::DataCorruption(format!(
                "'{}' is not a Python version",
                &captures["python"]
            ))
        })?;

        let bitness = if &captures["bitness"] == "32" {
            Bitness::X86
        } else {
            Bitness::X64
        };

        Ok(Self {
            name: captures["name"].to_string(),
            version: version_text.to_string(),
            python_version,
            bitness,
            download_uri: join_uri(base, &suffix),
        })
    }

    fn suits(&self, name: &str, target: &RuntimeTarget) -> bool {
        target.accepts_runtime(&self.python_version)
            && self.bitness == target.bitness
            && self.name.to_lowercase().contains(&name.to_lowercase())
    }
}

/// Join the listing location and a download suffix with exactly one slash.
fn join_uri(base: &Url, suffix: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        suffix.trim_start_matches('/')
    )
}

/// Catalog backed by a scraped installer listing page.
pub struct ScrapedListingCatalog {
    source_name: String,
    url: Url,
    http_client: HttpClient,
}

impl ScrapedListingCatalog {
    /// Create a listing catalog. The location must be an http or https URL.
    pub fn new(source_name: &str, location: &str, http_client: HttpClient) -> Result<Self, PygetError> {
        let url = Url::parse(location).map_err(|e| {
            PygetError::invalid_source(source_name, format!("'{}' is not a URL: {}", location, e))
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(PygetError::invalid_source(
                    source_name,
                    format!("scheme '{}' is not http or https", other),
                ));
            }
        }

        Ok(Self {
            source_name: source_name.to_string(),
            url,
            http_client,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch the listing and decode every well-formed entry.
    pub async fn entries(&self) -> Result<Vec<ListingEntry>, PygetError> {
        debug!("Fetching listing from {}...", self.url);
        let page = self
            .http_client
            .get_text(self.url.as_str())
            .await
            .map_err(|e| PygetError::remote(&self.source_name, format!("{:#}", e)))?;

        Ok(self.scan(&page))
    }

    fn scan(&self, page: &str) -> Vec<ListingEntry> {
        let mut entries = Vec::new();
        for (number, line) in page.lines().enumerate() {
            match ListingEntry::parse_line(&self.url, line) {
                None => {}
                Some(Ok(entry)) => entries.push(entry),
                Some(Err(e)) => {
                    warn!(
                        "{}: skipping listing line {}: {}",
                        self.source_name,
                        number + 1,
                        e
                    );
                }
            }
        }
        debug!("{}: decoded {} entries", self.source_name, entries.len());
        entries
    }
}

#[async_trait]
impl Searchable for ScrapedListingCatalog {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    #[tracing::instrument(skip(self), fields(source = %self.source_name))]
    async fn search(
        &self,
        name: &str,
        target: &RuntimeTarget,
    ) -> Result<Vec<Package>, PygetError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .filter(|entry| entry.suits(name, target))
            .map(|entry| {
                Package::new(
                    &self.source_name,
                    &entry.name,
                    &entry.version,
                    Some(&entry.download_uri),
                )
            })
            .collect())
    }
}
