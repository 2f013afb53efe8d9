//! Activate handler: evict partitions from other versions

use super::lifecycle::HostSignal;
use crate::config::VersionSet;
use crate::error::ShellResult;
use crate::store::CacheStore;
use tracing::{info, warn};

/// Partitions to delete on activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlan {
    pub doomed: Vec<String>,
}

/// Every existing partition not in the retained set is doomed
pub fn plan(versions: &VersionSet, existing: &[String]) -> DeletePlan {
    DeletePlan {
        doomed: existing
            .iter()
            .filter(|name| !versions.retains(name))
            .cloned()
            .collect(),
    }
}

/// A partition that could not be deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelete {
    pub partition: String,
    pub reason: String,
}

/// Outcome of activation
#[derive(Debug, Clone)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    /// Orphans left behind after a failed delete
    pub failed: Vec<FailedDelete>,
    pub signals: Vec<HostSignal>,
}

/// Enumerate partitions and delete the stale ones
///
/// A failed delete only leaves an orphan partition behind, so it is
/// logged and skipped.
pub async fn execute(versions: &VersionSet, store: &dyn CacheStore) -> ShellResult<ActivateReport> {
    let existing = store.names().await?;
    let plan = plan(versions, &existing);

    let mut deleted = vec![];
    let mut failed = vec![];
    for name in plan.doomed {
        match store.delete(&name).await {
            Ok(_) => {
                info!("Deleted stale partition {}", name);
                deleted.push(name);
            }
            Err(e) => {
                warn!("Failed to delete partition {}: {}", name, e);
                failed.push(FailedDelete {
                    partition: name,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(ActivateReport {
        deleted,
        failed,
        signals: vec![HostSignal::ClaimClients],
    })
}
