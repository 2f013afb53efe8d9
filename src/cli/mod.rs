//! Command-line host
//!
//! Plays the role of the runtime hosting the worker: it owns a disk-backed
//! store, an HTTP fetcher, and the persisted lifecycle state, and turns
//! subcommands into worker events.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use crate::config::{Config, ConfigManager, WorkerConfig};
use crate::error::ShellResult;
use crate::fetch::HttpFetcher;
use crate::store::DiskStore;
use crate::worker::{OfflineCacheManager, Registration};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Worker host backed by the state directory
pub struct Host {
    manager: OfflineCacheManager,
    fetcher: Arc<HttpFetcher>,
    state_path: PathBuf,
}

impl Host {
    /// Build the manager and resume its lifecycle state
    pub async fn open(config: &Config, state_dir: &Path) -> ShellResult<Self> {
        let worker = WorkerConfig::from_config(config)?;
        let store = Arc::new(DiskStore::new(ConfigManager::partitions_dir(state_dir)));
        let fetcher = Arc::new(HttpFetcher::new(&worker.origin));

        let state_path = ConfigManager::worker_state_path(state_dir);
        let registration = Registration::load(&state_path).await?;
        debug!("Resuming from {}", state_path.display());

        let manager =
            OfflineCacheManager::new(worker, store, fetcher.clone()).with_state(registration);
        Ok(Self {
            manager,
            fetcher,
            state_path,
        })
    }

    pub fn manager(&self) -> &OfflineCacheManager {
        &self.manager
    }

    /// Fetcher for requests the manager passes through
    pub fn fetcher(&self) -> &HttpFetcher {
        &self.fetcher
    }

    /// Write the lifecycle state back to disk
    pub async fn persist(&self) -> ShellResult<()> {
        self.manager.registration().save(&self.state_path).await
    }
}
