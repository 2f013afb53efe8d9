//! Fetch interception: routing and the two caching strategies
//!
//! | Request | Strategy | Writes to |
//! |---------|----------|-----------|
//! | non-GET, non-http(s) | passthrough | - |
//! | same origin | network-first | static partition |
//! | cross origin | cache-first + background refresh | dynamic partition |

use super::revalidate::{self, Revalidation};
use crate::error::ShellResult;
use crate::fetch::{FetchMode, Fetcher};
use crate::request::{Request, RequestKey, Snapshot};
use crate::store::CacheStore;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use url::{Origin, Url};

/// How an intercepted request is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; the host performs the request itself
    Passthrough,
    NetworkFirst,
    CacheFirst,
}

/// Decide how to handle a request from a page at `origin`
pub fn route(request: &Request, origin: &Origin) -> Route {
    if !request.is_get() {
        return Route::Passthrough;
    }
    if !matches!(request.url.scheme(), "http" | "https") {
        return Route::Passthrough;
    }
    if request.url.origin() == *origin {
        Route::NetworkFirst
    } else {
        Route::CacheFirst
    }
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    /// Root document substituted for an uncached navigation
    Shell,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Cache => write!(f, "cache"),
            Self::Shell => write!(f, "shell"),
        }
    }
}

/// Response handed back to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub snapshot: Snapshot,
    pub source: ResponseSource,
}

/// Result of a fetch event
#[derive(Debug)]
pub enum FetchOutcome {
    /// The request was not intercepted
    Passthrough,
    /// The manager answered; a background refresh may still be running
    Respond {
        response: Response,
        revalidation: Option<Revalidation>,
    },
}

impl FetchOutcome {
    /// The response, if the request was intercepted
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Passthrough => None,
            Self::Respond { response, .. } => Some(response),
        }
    }
}

/// Runs the caching strategies against a store and fetcher
#[derive(Clone)]
pub struct Interceptor {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    origin: Origin,
    static_partition: String,
    dynamic_partition: String,
    shell: RequestKey,
}

impl Interceptor {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        origin: &Url,
        static_partition: &str,
        dynamic_partition: &str,
        shell: &Url,
    ) -> Self {
        Self {
            store,
            fetcher,
            origin: origin.origin(),
            static_partition: static_partition.to_string(),
            dynamic_partition: dynamic_partition.to_string(),
            shell: RequestKey::new("GET", shell),
        }
    }

    /// Route and answer one request
    pub async fn handle(&self, request: &Request) -> ShellResult<FetchOutcome> {
        match route(request, &self.origin) {
            Route::Passthrough => {
                debug!("Passing through {} ({})", request.key(), request.url.scheme());
                Ok(FetchOutcome::Passthrough)
            }
            Route::NetworkFirst => Ok(FetchOutcome::Respond {
                response: self.network_first(request).await?,
                revalidation: None,
            }),
            Route::CacheFirst => {
                let (response, revalidation) = self.cache_first(request).await?;
                Ok(FetchOutcome::Respond {
                    response,
                    revalidation,
                })
            }
        }
    }

    /// Prefer the live network; fall back to any cached copy, then to
    /// the shell document for navigations.
    ///
    /// Successful network responses are written to the static partition,
    /// even for resources first cached elsewhere.
    pub async fn network_first(&self, request: &Request) -> ShellResult<Response> {
        let key = request.key();

        let err = match self.fetcher.fetch(request, FetchMode::SameOrigin).await {
            Ok(snapshot) => {
                if snapshot.is_success() {
                    if let Err(e) = self.store.put(&self.static_partition, &key, &snapshot).await {
                        warn!("Failed to cache {}: {}", key, e);
                    }
                }
                return Ok(Response {
                    snapshot,
                    source: ResponseSource::Network,
                });
            }
            Err(e) if e.is_network() => e,
            Err(e) => return Err(e),
        };

        debug!("Network failed for {}: {}", key, err);

        if let Some(snapshot) = self.store.match_any(&key).await? {
            return Ok(Response {
                snapshot,
                source: ResponseSource::Cache,
            });
        }

        if request.is_navigation() {
            if let Some(snapshot) = self.store.match_any(&self.shell).await? {
                debug!("Serving shell {} for {}", self.shell, key);
                return Ok(Response {
                    snapshot,
                    source: ResponseSource::Shell,
                });
            }
        }

        Err(err)
    }

    /// Serve a cached copy immediately and refresh it in the background;
    /// on a miss, fetch with CORS and cache into the dynamic partition.
    pub async fn cache_first(
        &self,
        request: &Request,
    ) -> ShellResult<(Response, Option<Revalidation>)> {
        let key = request.key();

        if let Some(snapshot) = self.store.match_any(&key).await? {
            let revalidation = revalidate::spawn(
                self.store.clone(),
                self.fetcher.clone(),
                self.dynamic_partition.clone(),
                request.clone(),
            );
            return Ok((
                Response {
                    snapshot,
                    source: ResponseSource::Cache,
                },
                Some(revalidation),
            ));
        }

        let snapshot = self.fetcher.fetch(request, FetchMode::Cors).await?;
        if snapshot.is_success() {
            if let Err(e) = self.store.put(&self.dynamic_partition, &key, &snapshot).await {
                warn!("Failed to cache {}: {}", key, e);
            }
        }

        Ok((
            Response {
                snapshot,
                source: ResponseSource::Network,
            },
            None,
        ))
    }
}
