//! Detached background revalidation
//!
//! Errors inside the task are discarded: by the time it runs, the caller
//! already has its response.

use crate::fetch::{FetchMode, Fetcher};
use crate::request::Request;
use crate::store::CacheStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to a running revalidation
///
/// Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct Revalidation {
    handle: JoinHandle<()>,
}

impl Revalidation {
    /// Wait for the refresh to settle, whatever its outcome
    pub async fn finished(self) {
        let _ = self.handle.await;
    }

    /// Whether the task has already settled
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Refetch `request` and overwrite its entry in `partition` on success
pub fn spawn(
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    partition: String,
    request: Request,
) -> Revalidation {
    let handle = tokio::spawn(async move {
        let key = request.key();
        match fetcher.fetch(&request, FetchMode::Cors).await {
            Ok(snapshot) if snapshot.is_success() => {
                match store.put(&partition, &key, &snapshot).await {
                    Ok(()) => debug!("Revalidated {}", key),
                    Err(e) => debug!("Revalidation of {} not stored: {}", key, e),
                }
            }
            Ok(snapshot) => debug!("Revalidation of {} got status {}", key, snapshot.status),
            Err(e) => debug!("Revalidation of {} failed: {}", key, e),
        }
    });

    Revalidation { handle }
}
