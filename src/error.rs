//! Error types for shellcache
//!
//! All modules use `ShellResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shellcache operations
pub type ShellResult<T> = Result<T, ShellError>;

/// All errors that can occur in shellcache
#[derive(Error, Debug)]
pub enum ShellError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Network errors
    #[error("Network request failed for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Failed to precache {url}: {reason}")]
    PrecacheFailed { url: String, reason: String },

    // Lifecycle errors
    #[error("Version {0} is not installed")]
    NotInstalled(String),

    // Store errors
    #[error("Invalid partition name: {0:?}")]
    InvalidPartitionName(String),

    #[error("Corrupt cache entry {path}: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShellError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the network rather than the store.
    ///
    /// Strategies fall back to cached data only for these.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Run: shellcache config init --force"),
            Self::Network { .. } => Some("The resource is not cached; retry once online"),
            Self::PrecacheFailed { .. } => {
                Some("Every manifest entry must be reachable; the previous version stays active")
            }
            Self::NotInstalled(_) => Some("Run: shellcache install"),
            Self::StoreCorrupt { .. } => Some("Run: shellcache message clearCache"),
            _ => None,
        }
    }
}
