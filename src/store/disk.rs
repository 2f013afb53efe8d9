//! Directory-backed cache store
//!
//! Layout: `<root>/<partition>/<hash>.entry`, where `<hash>` is the first
//! 16 hex chars of the SHA-256 of the normalized request key. An entry
//! file is one line of JSON metadata followed by the raw body bytes.
//! Entries are written to a unique temporary file and renamed into place,
//! so concurrent writers to one key resolve as last-write-wins.

use super::{validate_partition_name, CacheStore};
use crate::error::{ShellError, ShellResult};
use crate::request::{RequestKey, Snapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const ENTRY_EXT: &str = "entry";

/// Metadata line at the head of every entry file
#[derive(Debug, Serialize, Deserialize)]
struct EntryHeader {
    key: RequestKey,
    snapshot: Snapshot,
    body_len: usize,
    stored_at: DateTime<Utc>,
}

/// Cache store persisted under a root directory
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Create a store rooted at `root` (created lazily)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn partition_dir(&self, partition: &str) -> ShellResult<PathBuf> {
        validate_partition_name(partition)?;
        Ok(self.root.join(partition))
    }

    fn entry_path(&self, partition: &str, key: &RequestKey) -> ShellResult<PathBuf> {
        Ok(self
            .partition_dir(partition)?
            .join(format!("{}.{}", entry_hash(key), ENTRY_EXT)))
    }
}

/// Hash a request key, returning first 16 hex chars
fn entry_hash(key: &RequestKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.to_string().as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

fn encode_entry(key: &RequestKey, snapshot: &Snapshot) -> ShellResult<Vec<u8>> {
    let header = EntryHeader {
        key: key.clone(),
        snapshot: snapshot.clone(),
        body_len: snapshot.body.len(),
        stored_at: Utc::now(),
    };

    let mut bytes = serde_json::to_vec(&header)?;
    bytes.push(b'\n');
    bytes.extend_from_slice(&snapshot.body);
    Ok(bytes)
}

fn decode_entry(path: &Path, bytes: &[u8]) -> ShellResult<(RequestKey, Snapshot)> {
    let corrupt = |reason: &str| ShellError::StoreCorrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let split = bytes
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| corrupt("missing header line"))?;

    let header: EntryHeader =
        serde_json::from_slice(&bytes[..split]).map_err(|e| corrupt(&e.to_string()))?;

    let body = &bytes[split + 1..];
    if body.len() != header.body_len {
        return Err(corrupt(&format!(
            "body is {} bytes, header says {}",
            body.len(),
            header.body_len
        )));
    }

    let mut snapshot = header.snapshot;
    snapshot.body = body.to_vec();
    Ok((header.key, snapshot))
}

async fn read_entry(path: &Path) -> ShellResult<Option<(RequestKey, Snapshot)>> {
    match fs::read(path).await {
        Ok(bytes) => decode_entry(path, &bytes).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ShellError::io(
            format!("reading cache entry {}", path.display()),
            e,
        )),
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn open(&self, partition: &str) -> ShellResult<()> {
        let dir = self.partition_dir(partition)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShellError::io(format!("creating partition {}", dir.display()), e))
    }

    async fn put(&self, partition: &str, key: &RequestKey, snapshot: &Snapshot) -> ShellResult<()> {
        self.open(partition).await?;

        let path = self.entry_path(partition, key)?;
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let bytes = encode_entry(key, snapshot)?;

        fs::write(&tmp, bytes)
            .await
            .map_err(|e| ShellError::io(format!("writing cache entry {}", tmp.display()), e))?;

        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ShellError::io(
                format!("replacing cache entry {}", path.display()),
                e,
            ));
        }

        debug!("Stored {} in {}", key, partition);
        Ok(())
    }

    async fn match_in(&self, partition: &str, key: &RequestKey) -> ShellResult<Option<Snapshot>> {
        let path = self.entry_path(partition, key)?;
        match read_entry(&path).await? {
            Some((stored_key, snapshot)) if stored_key == *key => Ok(Some(snapshot)),
            Some((stored_key, _)) => {
                debug!("Hash collision at {}: {} != {}", path.display(), stored_key, key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, partition: &str) -> ShellResult<bool> {
        let dir = self.partition_dir(partition)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ShellError::io(
                format!("deleting partition {}", dir.display()),
                e,
            )),
        }
    }

    async fn names(&self) -> ShellResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(ShellError::io(
                    format!("reading store directory {}", self.root.display()),
                    e,
                ))
            }
        };

        let mut names = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellError::io("reading store entry", e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_partition_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn keys(&self, partition: &str) -> ShellResult<Vec<RequestKey>> {
        let dir = self.partition_dir(partition)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(ShellError::io(
                    format!("reading partition {}", dir.display()),
                    e,
                ))
            }
        };

        let mut keys = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellError::io("reading partition entry", e))?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != ENTRY_EXT) {
                continue;
            }
            match read_entry(&path).await {
                Ok(Some((key, _))) => keys.push(key),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable cache entry: {}", e),
            }
        }

        keys.sort();
        Ok(keys)
    }
}
