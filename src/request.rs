//! Request descriptors, cache keys, and response snapshots

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// How the page issued a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page navigation
    Navigate,
    /// Subresource restricted to the page origin
    SameOrigin,
    /// Cross-origin request with CORS
    Cors,
    /// Cross-origin request without CORS
    NoCors,
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Navigate => "navigate",
            Self::SameOrigin => "same-origin",
            Self::Cors => "cors",
            Self::NoCors => "no-cors",
        };
        write!(f, "{}", name)
    }
}

/// An outgoing request made by a controlled page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method, upper-cased
    pub method: String,
    /// Absolute request URL
    pub url: Url,
    /// Request mode
    pub mode: RequestMode,
    /// Request headers
    pub headers: BTreeMap<String, String>,
}

impl Request {
    /// Create a request with an explicit method and mode
    pub fn new(method: &str, url: Url, mode: RequestMode) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url,
            mode,
            headers: BTreeMap::new(),
        }
    }

    /// A plain GET for a subresource
    pub fn get(url: Url) -> Self {
        Self::new("GET", url, RequestMode::NoCors)
    }

    /// A page navigation
    pub fn navigate(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Navigate)
    }

    /// Attach a header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Whether this request is a top-level navigation
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Whether this is a plain content read
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Normalized cache key for this request
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Normalized request descriptor used to address cache entries
///
/// Method is upper-cased and the URL fragment is dropped, so
/// `/app.js#v` and `/app.js` share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A fully buffered, independently owned copy of a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase
    #[serde(default)]
    pub status_text: String,
    /// Response headers (lower-cased names)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl Snapshot {
    /// Create a snapshot with a status and body
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Attach a header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Content type header, if present
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}
