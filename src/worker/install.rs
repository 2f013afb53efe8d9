//! Install handler: precache the manifest and external resources

use super::lifecycle::HostSignal;
use crate::config::WorkerConfig;
use crate::error::{ShellError, ShellResult};
use crate::fetch::{FetchMode, Fetcher};
use crate::request::{Request, RequestKey, RequestMode};
use crate::store::CacheStore;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

/// What install will fetch and where it goes
#[derive(Debug, Clone)]
pub struct InstallPlan {
    /// Partition for mandatory resources
    pub static_partition: String,
    /// Resources that must all succeed
    pub mandatory: Vec<Request>,
    /// Partition for optional resources
    pub dynamic_partition: String,
    /// Resources fetched best-effort with CORS
    pub optional: Vec<Request>,
}

/// Build the install plan for a configuration
pub fn plan(config: &WorkerConfig) -> InstallPlan {
    InstallPlan {
        static_partition: config.versions.static_partition.clone(),
        mandatory: config
            .manifest
            .iter()
            .map(|url| Request::new("GET", url.clone(), RequestMode::SameOrigin))
            .collect(),
        dynamic_partition: config.versions.dynamic_partition.clone(),
        optional: config
            .external
            .iter()
            .map(|url| Request::new("GET", url.clone(), RequestMode::Cors))
            .collect(),
    }
}

/// A resource that could not be precached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedResource {
    pub url: String,
    pub reason: String,
}

/// Outcome of a successful install
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub static_partition: String,
    /// Entries written to the static partition
    pub cached: Vec<RequestKey>,
    pub dynamic_partition: String,
    /// Entries written to the dynamic partition
    pub external_cached: Vec<RequestKey>,
    /// Optional resources that failed and were left out
    pub external_failed: Vec<SkippedResource>,
    /// Signals for the host
    pub signals: Vec<HostSignal>,
}

/// Outcome of a best-effort precache pass
#[derive(Debug, Clone, Default)]
pub struct OptionalReport {
    pub cached: Vec<RequestKey>,
    pub failed: Vec<SkippedResource>,
}

/// Run an install plan to completion
///
/// Fails with [`ShellError::PrecacheFailed`] if any mandatory resource
/// cannot be fetched or answers with a non-2xx status. In that case
/// nothing from this attempt is written to the static partition.
pub async fn execute(
    plan: &InstallPlan,
    store: &dyn CacheStore,
    fetcher: &dyn Fetcher,
) -> ShellResult<InstallReport> {
    store.open(&plan.static_partition).await?;

    let results = join_all(
        plan.mandatory
            .iter()
            .map(|request| fetcher.fetch(request, FetchMode::SameOrigin)),
    )
    .await;

    let mut fetched = Vec::with_capacity(results.len());
    for (request, result) in plan.mandatory.iter().zip(results) {
        let snapshot = result.map_err(|e| ShellError::PrecacheFailed {
            url: request.url.to_string(),
            reason: e.to_string(),
        })?;

        if !snapshot.is_success() {
            return Err(ShellError::PrecacheFailed {
                url: request.url.to_string(),
                reason: format!("status {}", snapshot.status),
            });
        }
        fetched.push((request.key(), snapshot));
    }

    let mut cached = Vec::with_capacity(fetched.len());
    for (key, snapshot) in fetched {
        store.put(&plan.static_partition, &key, &snapshot).await?;
        cached.push(key);
    }
    info!(
        "Precached {} resource(s) into {}",
        cached.len(),
        plan.static_partition
    );

    let optional = precache_optional(&plan.dynamic_partition, &plan.optional, store, fetcher).await?;

    Ok(InstallReport {
        static_partition: plan.static_partition.clone(),
        cached,
        dynamic_partition: plan.dynamic_partition.clone(),
        external_cached: optional.cached,
        external_failed: optional.failed,
        signals: vec![HostSignal::SkipWaiting],
    })
}

/// Fetch optional resources into a partition, tolerating per-item failure
pub async fn precache_optional(
    partition: &str,
    requests: &[Request],
    store: &dyn CacheStore,
    fetcher: &dyn Fetcher,
) -> ShellResult<OptionalReport> {
    store.open(partition).await?;

    let results = join_all(
        requests
            .iter()
            .map(|request| fetcher.fetch(request, FetchMode::Cors)),
    )
    .await;

    let mut report = OptionalReport::default();
    for (request, result) in requests.iter().zip(results) {
        let reason = match result {
            Ok(snapshot) if snapshot.is_success() => {
                let key = request.key();
                store.put(partition, &key, &snapshot).await?;
                debug!("Cached external resource {}", request.url);
                report.cached.push(key);
                continue;
            }
            Ok(snapshot) => format!("status {}", snapshot.status),
            Err(e) => e.to_string(),
        };

        warn!("Failed to cache {}: {}", request.url, reason);
        report.failed.push(SkippedResource {
            url: request.url.to_string(),
            reason,
        });
    }

    Ok(report)
}
