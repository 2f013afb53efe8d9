//! Network access
//!
//! The manager never talks to the network directly; it goes through a
//! [`Fetcher`] so strategies can be exercised against a scripted fake.

mod http;

pub use http::HttpFetcher;

use crate::error::ShellResult;
use crate::request::{Request, Snapshot};
use async_trait::async_trait;
use std::fmt;

/// Cross-origin policy for an outgoing fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Only the page origin may be contacted
    SameOrigin,
    /// Cross-origin fetch announcing the page origin
    Cors,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameOrigin => write!(f, "same-origin"),
            Self::Cors => write!(f, "cors"),
        }
    }
}

/// Issues live network requests
///
/// Any HTTP response, whatever its status, is `Ok`. Transport failures
/// (DNS, refused connection, reset, blocked by mode) are
/// [`ShellError::Network`](crate::error::ShellError::Network).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request, mode: FetchMode) -> ShellResult<Snapshot>;
}
