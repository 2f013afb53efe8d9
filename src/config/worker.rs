//! Validated worker configuration
//!
//! Turns the raw TOML schema into parsed URLs and concrete partition
//! names. The manager only ever sees this form.

use super::schema::Config;
use crate::error::{ShellError, ShellResult};
use url::Url;

/// The partition names that belong to the current version
///
/// Everything outside this set is deleted on activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSet {
    /// Application name used as partition prefix
    pub name: String,
    /// Version tag the names were derived from
    pub tag: String,
    /// Partition for mandatory same-origin resources
    pub static_partition: String,
    /// Partition for cross-origin resources
    pub dynamic_partition: String,
    /// Umbrella names retained for backward compatibility
    pub legacy: Vec<String>,
}

impl VersionSet {
    /// Derive partition names from an application name and tag
    pub fn new(name: &str, tag: &str, legacy: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
            static_partition: format!("{}-static-{}", name, tag),
            dynamic_partition: format!("{}-dynamic-{}", name, tag),
            legacy,
        }
    }

    /// Partition names of another version of the same application
    pub fn for_tag(&self, tag: &str) -> Self {
        Self::new(&self.name, tag, self.legacy.clone())
    }

    /// All retained partition names
    pub fn retained(&self) -> Vec<&str> {
        let mut names = vec![
            self.static_partition.as_str(),
            self.dynamic_partition.as_str(),
        ];
        names.extend(self.legacy.iter().map(String::as_str));
        names
    }

    /// Whether a partition belongs to the current version
    pub fn retains(&self, name: &str) -> bool {
        self.retained().contains(&name)
    }
}

/// Everything the manager needs to know about its deployment
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Controlling page origin
    pub origin: Url,
    /// Base URL for manifest paths
    pub scope: Url,
    /// Absolute URL of the offline navigation fallback
    pub shell: Url,
    /// Retained partition names
    pub versions: VersionSet,
    /// Mandatory resources, resolved against the scope
    pub manifest: Vec<Url>,
    /// Optional cross-origin resources
    pub external: Vec<Url>,
}

fn parse_url(raw: &str) -> ShellResult<Url> {
    Url::parse(raw).map_err(|e| ShellError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

fn join_url(base: &Url, raw: &str) -> ShellResult<Url> {
    base.join(raw).map_err(|e| ShellError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

impl WorkerConfig {
    /// Validate a loaded configuration
    pub fn from_config(config: &Config) -> ShellResult<Self> {
        let origin = parse_url(&config.worker.origin)?;
        let scope = parse_url(&config.worker.scope)?;
        let shell = join_url(&scope, &config.worker.shell)?;

        let manifest = config
            .precache
            .manifest
            .iter()
            .map(|path| join_url(&scope, path))
            .collect::<ShellResult<Vec<_>>>()?;

        let external = config
            .precache
            .external
            .iter()
            .map(|raw| parse_url(raw))
            .collect::<ShellResult<Vec<_>>>()?;

        let versions = VersionSet::new(
            &config.versions.name,
            &config.versions.tag,
            config.versions.legacy.clone(),
        );

        Ok(Self {
            origin,
            scope,
            shell,
            versions,
            manifest,
            external,
        })
    }
}
