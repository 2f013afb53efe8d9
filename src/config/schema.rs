//! Configuration schema for shellcache
//!
//! Configuration is stored at `~/.config/shellcache/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Controlled page settings
    pub worker: WorkerSection,

    /// Partition naming and retention
    pub versions: VersionsConfig,

    /// Install-time resources
    pub precache: PrecacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Controlled page settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    /// Origin of the controlling page
    pub origin: String,

    /// Base URL that relative manifest paths resolve against
    pub scope: String,

    /// Root document served to navigations when offline
    pub shell: String,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            scope: "http://localhost:8080/".to_string(),
            shell: "./index.html".to_string(),
        }
    }
}

/// Partition naming
///
/// Bumping `tag` is the only way to invalidate cached entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    /// Application name used as partition prefix
    pub name: String,

    /// Current version tag
    pub tag: String,

    /// Extra partition names kept on activation
    pub legacy: Vec<String>,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        Self {
            name: "badminton".to_string(),
            tag: "v3".to_string(),
            legacy: vec!["badminton-v3".to_string()],
        }
    }
}

/// Resources fetched at install time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecacheConfig {
    /// Mandatory same-origin paths, relative to the scope
    pub manifest: Vec<String>,

    /// Optional absolute cross-origin URLs
    pub external: Vec<String>,
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            manifest: vec![
                "./".to_string(),
                "./index.html".to_string(),
                "./manifest.json".to_string(),
            ],
            external: vec![],
        }
    }
}
