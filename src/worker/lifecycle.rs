//! Worker lifecycle state persistence

use crate::error::{ShellError, ShellResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Lifecycle phase of one worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerPhase {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

/// Requests a handler makes of its host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostSignal {
    /// Activate without waiting for old-version pages to close
    SkipWaiting,
    /// Take control of all open pages without a reload
    ClaimClients,
}

/// Lifecycle record for the current version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerState {
    /// Version tag this record belongs to
    pub version: String,

    /// Current phase
    pub phase: WorkerPhase,

    /// Skip-waiting was signalled for this version
    pub skip_waiting: bool,

    /// Open pages have been claimed
    pub clients_claimed: bool,

    /// When install last completed
    pub installed_at: Option<DateTime<Utc>>,

    /// When activation last completed
    pub activated_at: Option<DateTime<Utc>>,

    /// When the record last changed
    pub updated_at: DateTime<Utc>,
}

impl WorkerState {
    /// Fresh state for a newly seen version
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            phase: WorkerPhase::Parsed,
            skip_waiting: false,
            clients_claimed: false,
            installed_at: None,
            activated_at: None,
            updated_at: Utc::now(),
        }
    }

    /// Keep a persisted record only if it belongs to `version`
    pub fn for_version(persisted: Option<Self>, version: &str) -> Self {
        match persisted {
            Some(state) if state.version == version => state,
            Some(state) => {
                info!(
                    "Version changed from {} to {}, starting fresh",
                    state.version, version
                );
                Self::new(version)
            }
            None => Self::new(version),
        }
    }

    /// Whether fetch events are routed through the manager
    pub fn is_active(&self) -> bool {
        self.phase == WorkerPhase::Activated
    }

    pub(crate) fn transition(&mut self, phase: WorkerPhase) {
        debug!("Worker {} {} -> {}", self.version, self.phase, phase);
        self.phase = phase;
        self.updated_at = Utc::now();
        match phase {
            WorkerPhase::Installed => self.installed_at = Some(self.updated_at),
            WorkerPhase::Activated => self.activated_at = Some(self.updated_at),
            _ => {}
        }
    }
}

/// Persisted lifecycle of every version the host knows about
///
/// The active version keeps answering fetches while a newer version
/// installs; it is only replaced once the newer version activates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registration {
    /// Version controlling pages, if any
    pub active: Option<WorkerState>,

    /// Most recently configured version
    pub current: Option<WorkerState>,
}

impl Registration {
    /// Load the registration, empty if the file is absent
    pub async fn load(path: &Path) -> ShellResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            ShellError::io(format!("reading worker state {}", path.display()), e)
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Save the registration to file
    pub async fn save(&self, path: &Path) -> ShellResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShellError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await.map_err(|e| {
            ShellError::io(format!("writing worker state {}", path.display()), e)
        })?;

        Ok(())
    }
}
