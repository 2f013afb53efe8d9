//! In-process cache store

use super::{validate_partition_name, CacheStore};
use crate::error::ShellResult;
use crate::request::{RequestKey, Snapshot};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Cache store kept entirely in memory
///
/// Partitions are kept in creation order, which is the order
/// `match_any` searches them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<Vec<(String, HashMap<RequestKey, Snapshot>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, partition: &str) -> ShellResult<()> {
        validate_partition_name(partition)?;
        let mut partitions = self.partitions.write().await;
        if !partitions.iter().any(|(name, _)| name == partition) {
            partitions.push((partition.to_string(), HashMap::new()));
        }
        Ok(())
    }

    async fn put(&self, partition: &str, key: &RequestKey, snapshot: &Snapshot) -> ShellResult<()> {
        validate_partition_name(partition)?;
        let mut partitions = self.partitions.write().await;
        match partitions.iter_mut().find(|(name, _)| name == partition) {
            Some((_, entries)) => {
                entries.insert(key.clone(), snapshot.clone());
            }
            None => {
                let mut entries = HashMap::new();
                entries.insert(key.clone(), snapshot.clone());
                partitions.push((partition.to_string(), entries));
            }
        }
        Ok(())
    }

    async fn match_in(&self, partition: &str, key: &RequestKey) -> ShellResult<Option<Snapshot>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|(name, _)| name == partition)
            .and_then(|(_, entries)| entries.get(key).cloned()))
    }

    async fn delete(&self, partition: &str) -> ShellResult<bool> {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|(name, _)| name != partition);
        Ok(partitions.len() != before)
    }

    async fn names(&self) -> ShellResult<Vec<String>> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn keys(&self, partition: &str) -> ShellResult<Vec<RequestKey>> {
        let partitions = self.partitions.read().await;
        let mut keys: Vec<RequestKey> = partitions
            .iter()
            .find(|(name, _)| name == partition)
            .map(|(_, entries)| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}
