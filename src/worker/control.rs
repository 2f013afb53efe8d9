//! Control messages from controlling pages

use crate::error::ShellResult;
use crate::store::CacheStore;
use std::fmt;
use tracing::info;

/// Recognized message payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Activate now instead of waiting for old-version pages to close
    SkipWaiting,
    /// Delete every partition, retained or not
    ClearCache,
}

impl ControlCommand {
    /// Parse a payload; anything unrecognized is `None`
    pub fn parse(payload: &str) -> Option<Self> {
        match payload {
            "skipWaiting" => Some(Self::SkipWaiting),
            "clearCache" => Some(Self::ClearCache),
            _ => None,
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkipWaiting => write!(f, "skipWaiting"),
            Self::ClearCache => write!(f, "clearCache"),
        }
    }
}

/// Delete every partition in the store
pub async fn clear_all(store: &dyn CacheStore) -> ShellResult<Vec<String>> {
    let names = store.names().await?;
    for name in &names {
        store.delete(name).await?;
    }
    info!("Cleared {} partition(s)", names.len());
    Ok(names)
}
