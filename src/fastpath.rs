//! Fast-path package identifiers.
//!
//! A fast path packs a package's source, name, version and optional download
//! location into one token of the form `source/package/version[/uri]`.
//! Backslashes and slashes inside each field are escaped with a backslash,
//! so the token can be split back into its parts without any other state.

use std::fmt;
use std::str::FromStr;

use crate::error::PygetError;

/// A package identified by source, name, version and optional download URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FastPath {
    pub source: String,
    pub package: String,
    pub version: String,
    pub download_uri: Option<String>,
}

impl FastPath {
    pub fn new(source: &str, package: &str, version: &str) -> Self {
        Self {
            source: source.to_string(),
            package: package.to_string(),
            version: version.to_string(),
            download_uri: None,
        }
    }

    pub fn with_download_uri(mut self, uri: impl Into<String>) -> Self {
        self.download_uri = Some(uri.into());
        self
    }

    /// Encode the parts into a fast-path token.
    pub fn encode(
        source: &str,
        package: &str,
        version: &str,
        download_uri: Option<&str>,
    ) -> String {
        let mut token = format!(
            "{}/{}/{}",
            escape(source),
            escape(package),
            escape(version)
        );
        if let Some(uri) = download_uri {
            token.push('/');
            token.push_str(&escape(uri));
        }
        token
    }

    /// Decode a fast-path token.
    ///
    /// The first three fields each end at the first slash that is not
    /// escaped. Anything after the third separator is the download URI;
    /// an empty remainder means there is none.
    pub fn decode(token: &str) -> Result<Self, PygetError> {
        let (source, rest) = split_field(token).ok_or_else(|| {
            PygetError::Format(format!("'{}' has no source separator", token))
        })?;
        let (package, rest) = split_field(rest).ok_or_else(|| {
            PygetError::Format(format!("'{}' has no package separator", token))
        })?;
        let (version, uri) = match split_field(rest) {
            Some((version, uri)) => (version, uri),
            None => (rest, ""),
        };

        Ok(Self {
            source: unescape(source),
            package: unescape(package),
            version: unescape(version),
            download_uri: if uri.is_empty() {
                None
            } else {
                Some(unescape(uri))
            },
        })
    }
}

impl fmt::Display for FastPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(
            &self.source,
            &self.package,
            &self.version,
            self.download_uri.as_deref(),
        ))
    }
}

impl FromStr for FastPath {
    type Err = PygetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

fn escape(field: &str) -> String {
    field.replace('\\', "\\\\").replace('/', "\\/")
}

fn unescape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('\\' | '/')) => out.push(next),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split at the first slash preceded by an even number of backslashes.
/// Returns the raw (still escaped) field and the text after the separator.
fn split_field(s: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '/' {
            return Some((&s[..i], &s[i + 1..]));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(source: &str, package: &str, version: &str, uri: Option<&str>) {
        let token = FastPath::encode(source, package, version, uri);
        let decoded = FastPath::decode(&token).unwrap();
        assert_eq!(decoded.source, source, "token: {}", token);
        assert_eq!(decoded.package, package, "token: {}", token);
        assert_eq!(decoded.version, version, "token: {}", token);
        assert_eq!(decoded.download_uri.as_deref(), uri, "token: {}", token);
    }

    #[test]
    fn test_encode_plain() {
        assert_eq!(
            FastPath::encode("pypi", "requests", "2.31.0", None),
            "pypi/requests/2.31.0"
        );
    }

    #[test]
    fn test_encode_escapes_slashes_and_backslashes() {
        assert_eq!(
            FastPath::encode("a/b", "c\\d", "1.0", None),
            "a\\/b/c\\\\d/1.0"
        );
    }

    #[test]
    fn test_encode_with_uri() {
        assert_eq!(
            FastPath::encode("gohlke", "numpy", "1.9.0", Some("http://x/y.exe")),
            "gohlke/numpy/1.9.0/http:\\/\\/x\\/y.exe"
        );
    }

    #[test]
    fn test_roundtrip_plain() {
        roundtrip("pypi", "requests", "2.31.0", None);
    }

    #[test]
    fn test_roundtrip_with_separators_in_fields() {
        roundtrip("my/source", "pkg\\name", "1.0/beta", None);
        roundtrip("\\", "/", "\\/", None);
        roundtrip("ends\\", "\\\\", "//", None);
        roundtrip("", "", "", None);
    }

    #[test]
    fn test_roundtrip_with_uri() {
        roundtrip(
            "gohlke",
            "numpy",
            "1.9.0",
            Some("http://www.example.org/pythonlibs/abc/numpy-1.9.0.win32-py2.7.exe"),
        );
        roundtrip("s\\/x", "n/", "v\\", Some("file:///C:\\temp\\a b.whl"));
    }

    #[test]
    fn test_decode_accepts_unescaped_uri() {
        let fp = FastPath::decode("pypi/foo/1.0/https://host/path/foo.whl").unwrap();
        assert_eq!(fp.version, "1.0");
        assert_eq!(
            fp.download_uri.as_deref(),
            Some("https://host/path/foo.whl")
        );
    }

    #[test]
    fn test_decode_trailing_separator_means_no_uri() {
        let fp = FastPath::decode("pypi/foo/1.0/").unwrap();
        assert_eq!(fp.version, "1.0");
        assert_eq!(fp.download_uri, None);
    }

    #[test]
    fn test_decode_missing_separators() {
        assert!(matches!(
            FastPath::decode("pypi"),
            Err(PygetError::Format(_))
        ));
        assert!(matches!(
            FastPath::decode("pypi/foo"),
            Err(PygetError::Format(_))
        ));
        // The only slash is escaped.
        assert!(matches!(
            FastPath::decode("pypi\\/foo"),
            Err(PygetError::Format(_))
        ));
    }

    #[test]
    fn test_decode_odd_and_even_backslashes() {
        // "a\\" followed by a real separator.
        let fp = FastPath::decode("a\\\\/b/c").unwrap();
        assert_eq!(fp.source, "a\\");
        assert_eq!(fp.package, "b");
        // "a\/b" is one field.
        let fp = FastPath::decode("a\\/b/c/d").unwrap();
        assert_eq!(fp.source, "a/b");
        assert_eq!(fp.package, "c");
        assert_eq!(fp.version, "d");
    }

    #[test]
    fn test_display_and_from_str() {
        let fp = FastPath::new("pypi", "a/b", "1.0").with_download_uri("http://x/y");
        let token = fp.to_string();
        let parsed: FastPath = token.parse().unwrap();
        assert_eq!(parsed, fp);
    }
}
