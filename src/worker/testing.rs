//! Test doubles for worker tests

use crate::config::{Config, WorkerConfig};
use crate::error::{ShellError, ShellResult};
use crate::fetch::{FetchMode, Fetcher};
use crate::request::{Request, Snapshot};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use url::Url;

pub(crate) fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// Deployment with three manifest entries and two external resources
pub(crate) fn test_config() -> WorkerConfig {
    let mut config = Config::default();
    config.worker.origin = "https://app.example".to_string();
    config.worker.scope = "https://app.example/".to_string();
    config.versions.name = "app".to_string();
    config.versions.tag = "v1".to_string();
    config.versions.legacy = vec!["app-v1".to_string()];
    config.precache.external = vec![
        "https://cdn.example/lib.js".to_string(),
        "https://fonts.example/font.woff2".to_string(),
    ];
    WorkerConfig::from_config(&config).unwrap()
}

/// Fetcher answering from a script; unknown URLs are unreachable
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    responses: Mutex<HashMap<String, Snapshot>>,
    calls: Mutex<Vec<(String, FetchMode)>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, snapshot: Snapshot) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), snapshot);
    }

    pub(crate) fn go_offline(&self) {
        self.responses.lock().unwrap().clear();
    }

    /// Hold fetches of `url` until a permit is added to the returned gate
    pub(crate) fn hold(&self, url: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(url.to_string(), gate.clone());
        gate
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.modes_for(url).len()
    }

    pub(crate) fn modes_for(&self, url: &str) -> Vec<FetchMode> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == url)
            .map(|(_, mode)| *mode)
            .collect()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request, mode: FetchMode) -> ShellResult<Snapshot> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push((url.clone(), mode));

        let gate = self.gates.lock().unwrap().get(&url).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        let response = self.responses.lock().unwrap().get(&url).cloned();
        response.ok_or_else(|| ShellError::network(url, "unreachable"))
    }
}
