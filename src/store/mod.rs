//! Partitioned response cache
//!
//! A store holds named partitions, each a key→snapshot map. Partition
//! names embed the version tag; bulk invalidation is done by deleting
//! whole partitions, never individual entries.
//!
//! | Backend | Persistence | `names()` order |
//! |---------|-------------|-----------------|
//! | [`MemoryStore`] | process lifetime | creation order |
//! | [`DiskStore`] | directory tree | lexicographic |

pub mod disk;
pub mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::error::{ShellError, ShellResult};
use crate::request::{RequestKey, Snapshot};
use async_trait::async_trait;

/// Key/response cache store with named partitions
///
/// Writes to one key are last-write-wins. Every snapshot handed out is
/// an owned copy; mutating it never affects the stored entry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open a partition, creating it if absent
    async fn open(&self, partition: &str) -> ShellResult<()>;

    /// Store a snapshot, creating the partition if absent
    async fn put(&self, partition: &str, key: &RequestKey, snapshot: &Snapshot) -> ShellResult<()>;

    /// Look up a key in one partition
    async fn match_in(&self, partition: &str, key: &RequestKey) -> ShellResult<Option<Snapshot>>;

    /// Delete a partition, returning whether it existed
    async fn delete(&self, partition: &str) -> ShellResult<bool>;

    /// Names of all existing partitions
    async fn names(&self) -> ShellResult<Vec<String>>;

    /// Keys stored in a partition (empty if the partition is absent)
    async fn keys(&self, partition: &str) -> ShellResult<Vec<RequestKey>>;

    /// Look up a key across all partitions, first hit in `names()` order
    async fn match_any(&self, key: &RequestKey) -> ShellResult<Option<Snapshot>> {
        for name in self.names().await? {
            if let Some(snapshot) = self.match_in(&name, key).await? {
                return Ok(Some(snapshot));
            }
        }
        Ok(None)
    }
}

/// Reject partition names that cannot be used as a directory name
pub fn validate_partition_name(name: &str) -> ShellResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.starts_with('.');

    if invalid {
        return Err(ShellError::InvalidPartitionName(name.to_string()));
    }
    Ok(())
}
