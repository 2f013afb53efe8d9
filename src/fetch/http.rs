//! HTTP fetcher backed by ureq

use super::{FetchMode, Fetcher};
use crate::error::{ShellError, ShellResult};
use crate::request::{Request, Snapshot};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;
use url::{Origin, Url};

/// Fetches over HTTP(S) on the blocking thread pool
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    origin: Origin,
}

impl HttpFetcher {
    /// Create a fetcher acting on behalf of pages at `origin`
    pub fn new(origin: &Url) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            origin: origin.origin(),
        }
    }
}

fn fetch_blocking(
    agent: &ureq::Agent,
    request: &Request,
    origin_header: Option<String>,
) -> ShellResult<Snapshot> {
    let url = request.url.as_str();
    if !request.is_get() {
        return Err(ShellError::network(
            url,
            format!("method {} is not fetched", request.method),
        ));
    }

    let mut builder = agent.get(url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(origin) = origin_header {
        builder = builder.header("origin", origin.as_str());
    }

    let mut response = builder
        .call()
        .map_err(|e| ShellError::network(url, e.to_string()))?;

    let status = response.status();
    let mut headers = BTreeMap::new();
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_string(), value.to_string());
        }
    }

    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| ShellError::network(url, format!("reading body: {}", e)))?;

    Ok(Snapshot {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        headers,
        body,
    })
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request, mode: FetchMode) -> ShellResult<Snapshot> {
        let origin_header = match mode {
            FetchMode::SameOrigin => {
                if request.url.origin() != self.origin {
                    return Err(ShellError::network(
                        request.url.as_str(),
                        "cross-origin request blocked in same-origin mode",
                    ));
                }
                None
            }
            FetchMode::Cors => Some(self.origin.ascii_serialization()),
        };

        debug!("Fetching {} ({})", request.key(), mode);

        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &request, origin_header))
            .await
            .map_err(|e| ShellError::Internal(format!("fetch task failed: {}", e)))?
    }
}
