//! Offline cache manager
//!
//! Handles the worker lifecycle events against a [`CacheStore`] and a
//! [`Fetcher`]:
//!
//! 1. **Install**: precache the manifest (mandatory) and external
//!    resources (best-effort), then ask to skip waiting
//! 2. **Activate**: delete partitions from other versions, then claim pages
//! 3. **Fetch**: network-first for the page origin, cache-first with a
//!    background refresh for everything else
//! 4. **Message**: `skipWaiting` and `clearCache`
//! 5. **Sync**: `refresh-external` refetches the external resources
//!
//! Each handler has a pure planning half (`install::plan`,
//! `activate::plan`, `intercept::route`, `ControlCommand::parse`,
//! `SyncTask::parse`) that can be inspected without a store or network.

pub mod activate;
pub mod control;
pub mod install;
pub mod intercept;
pub mod lifecycle;
pub mod revalidate;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use activate::{ActivateReport, DeletePlan};
pub use control::ControlCommand;
pub use install::{InstallPlan, InstallReport, OptionalReport};
pub use intercept::{FetchOutcome, Interceptor, Response, ResponseSource, Route};
pub use lifecycle::{HostSignal, Registration, WorkerPhase, WorkerState};
pub use revalidate::Revalidation;
pub use sync::SyncTask;

use crate::config::WorkerConfig;
use crate::error::{ShellError, ShellResult};
use crate::fetch::Fetcher;
use crate::request::Request;
use crate::store::CacheStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Lifecycle and interception events delivered by the host
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message(String),
    Sync(String),
}

/// What handling an event produced
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetch(FetchOutcome),
    Message(MessageOutcome),
    Sync(SyncOutcome),
}

/// Result of a control message
#[derive(Debug)]
pub enum MessageOutcome {
    /// Payload not recognized
    Ignored,
    /// Skip-waiting recorded; carries the activation it triggered, if any
    SkipWaiting { activation: Option<ActivateReport> },
    /// Every partition was deleted
    Cleared { partitions: Vec<String> },
}

/// Result of a background sync event
#[derive(Debug)]
pub enum SyncOutcome {
    /// Tag not recognized
    Ignored,
    Refreshed(OptionalReport),
}

/// Offline cache manager for one deployed version
///
/// A previously activated version keeps answering fetches until this
/// version activates, so a failed update never leaves pages uncontrolled.
pub struct OfflineCacheManager {
    config: WorkerConfig,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    interceptor: Interceptor,
    state: Mutex<WorkerState>,
    active: Mutex<Option<WorkerState>>,
}

impl OfflineCacheManager {
    /// Create a manager for a freshly parsed version
    pub fn new(config: WorkerConfig, store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        let interceptor = Interceptor::new(
            store.clone(),
            fetcher.clone(),
            &config.origin,
            &config.versions.static_partition,
            &config.versions.dynamic_partition,
            &config.shell,
        );
        let state = WorkerState::new(&config.versions.tag);

        Self {
            config,
            store,
            fetcher,
            interceptor,
            state: Mutex::new(state),
            active: Mutex::new(None),
        }
    }

    /// Resume from a persisted registration
    ///
    /// The configured version's record is kept only if it belongs to this
    /// version; the active version is kept regardless.
    pub fn with_state(self, registration: Registration) -> Self {
        let state = WorkerState::for_version(registration.current, &self.config.versions.tag);
        *self.lock_state() = state;
        *self.lock_active() = registration.active.filter(WorkerState::is_active);
        self
    }

    /// Snapshot of the configured version's lifecycle state
    pub fn state(&self) -> WorkerState {
        self.lock_state().clone()
    }

    /// Snapshot of the version currently controlling pages
    pub fn active(&self) -> Option<WorkerState> {
        self.lock_active().clone()
    }

    /// Everything the host needs to persist
    pub fn registration(&self) -> Registration {
        Registration {
            active: self.active(),
            current: Some(self.state()),
        }
    }

    /// Validated configuration
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Underlying cache store
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<WorkerState>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle any event
    pub async fn dispatch(&self, event: Event) -> ShellResult<EventOutcome> {
        match event {
            Event::Install => self.install().await.map(EventOutcome::Installed),
            Event::Activate => self.activate().await.map(EventOutcome::Activated),
            Event::Fetch(request) => self.handle_fetch(&request).await.map(EventOutcome::Fetch),
            Event::Message(payload) => self
                .handle_message(&payload)
                .await
                .map(EventOutcome::Message),
            Event::Sync(tag) => self.handle_sync(&tag).await.map(EventOutcome::Sync),
        }
    }

    /// Install event
    ///
    /// On failure this attempt becomes redundant; whatever version was
    /// active before keeps its partitions and keeps serving.
    pub async fn install(&self) -> ShellResult<InstallReport> {
        self.lock_state().transition(WorkerPhase::Installing);

        let plan = install::plan(&self.config);
        match install::execute(&plan, self.store.as_ref(), self.fetcher.as_ref()).await {
            Ok(report) => {
                {
                    let mut state = self.lock_state();
                    state.skip_waiting |= report.signals.contains(&HostSignal::SkipWaiting);
                    state.transition(WorkerPhase::Installed);
                }
                info!(
                    "Installed {} ({} precached, {} external, {} skipped)",
                    self.config.versions.tag,
                    report.cached.len(),
                    report.external_cached.len(),
                    report.external_failed.len()
                );
                Ok(report)
            }
            Err(e) => {
                warn!("Install of {} failed: {}", self.config.versions.tag, e);
                self.lock_state().transition(WorkerPhase::Redundant);
                Err(e)
            }
        }
    }

    /// Activate event
    pub async fn activate(&self) -> ShellResult<ActivateReport> {
        let previous = {
            let mut state = self.lock_state();
            let previous = state.phase;
            if matches!(previous, WorkerPhase::Parsed | WorkerPhase::Redundant) {
                return Err(ShellError::NotInstalled(state.version.clone()));
            }
            state.transition(WorkerPhase::Activating);
            previous
        };

        let report = match activate::execute(&self.config.versions, self.store.as_ref()).await {
            Ok(report) => report,
            Err(e) => {
                self.lock_state().transition(previous);
                return Err(e);
            }
        };

        let activated = {
            let mut state = self.lock_state();
            state.clients_claimed |= report.signals.contains(&HostSignal::ClaimClients);
            state.transition(WorkerPhase::Activated);
            state.clone()
        };
        if let Some(previous) = self.lock_active().replace(activated) {
            if previous.version != self.config.versions.tag {
                info!("Version {} is now redundant", previous.version);
            }
        }
        info!(
            "Activated {} ({} stale partition(s) removed)",
            self.config.versions.tag,
            report.deleted.len()
        );
        Ok(report)
    }

    /// Fetch event, answered by whichever version is active
    pub async fn handle_fetch(&self, request: &Request) -> ShellResult<FetchOutcome> {
        let Some(active) = self.lock_active().as_ref().map(|s| s.version.clone()) else {
            debug!("No active version, passing through {}", request.key());
            return Ok(FetchOutcome::Passthrough);
        };

        if active == self.config.versions.tag {
            self.interceptor.handle(request).await
        } else {
            self.interceptor_for(&active).handle(request).await
        }
    }

    /// Interceptor over another version's partitions
    fn interceptor_for(&self, tag: &str) -> Interceptor {
        let versions = self.config.versions.for_tag(tag);
        Interceptor::new(
            self.store.clone(),
            self.fetcher.clone(),
            &self.config.origin,
            &versions.static_partition,
            &versions.dynamic_partition,
            &self.config.shell,
        )
    }

    /// Message event
    pub async fn handle_message(&self, payload: &str) -> ShellResult<MessageOutcome> {
        let Some(command) = ControlCommand::parse(payload) else {
            debug!("Ignoring message {:?}", payload);
            return Ok(MessageOutcome::Ignored);
        };

        info!("Received {}", command);
        match command {
            ControlCommand::SkipWaiting => {
                let waiting = {
                    let mut state = self.lock_state();
                    state.skip_waiting = true;
                    state.phase == WorkerPhase::Installed
                };
                let activation = if waiting {
                    Some(self.activate().await?)
                } else {
                    None
                };
                Ok(MessageOutcome::SkipWaiting { activation })
            }
            ControlCommand::ClearCache => {
                let partitions = control::clear_all(self.store.as_ref()).await?;
                Ok(MessageOutcome::Cleared { partitions })
            }
        }
    }

    /// Background sync event
    pub async fn handle_sync(&self, tag: &str) -> ShellResult<SyncOutcome> {
        let Some(task) = SyncTask::parse(tag) else {
            debug!("Ignoring sync tag {:?}", tag);
            return Ok(SyncOutcome::Ignored);
        };

        match task {
            SyncTask::RefreshExternal => {
                let plan = install::plan(&self.config);
                let report = install::precache_optional(
                    &plan.dynamic_partition,
                    &plan.optional,
                    self.store.as_ref(),
                    self.fetcher.as_ref(),
                )
                .await?;
                info!(
                    "Refreshed {} external resource(s), {} failed",
                    report.cached.len(),
                    report.failed.len()
                );
                Ok(SyncOutcome::Refreshed(report))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{RequestKey, Snapshot};
    use crate::store::MemoryStore;
    use super::testing::{test_config, url, ScriptedFetcher};

    fn online_fetcher() -> Arc<ScriptedFetcher> {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("https://app.example/", Snapshot::new(200, "<root>"));
        fetcher.respond("https://app.example/index.html", Snapshot::new(200, "<shell>"));
        fetcher.respond("https://app.example/manifest.json", Snapshot::new(200, "{}"));
        fetcher.respond("https://cdn.example/lib.js", Snapshot::new(200, "lib"));
        fetcher.respond("https://fonts.example/font.woff2", Snapshot::new(200, "font"));
        fetcher
    }

    fn manager(store: Arc<MemoryStore>, fetcher: Arc<ScriptedFetcher>) -> OfflineCacheManager {
        OfflineCacheManager::new(test_config(), store, fetcher)
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let store = Arc::new(MemoryStore::new());
        store.open("app-static-v0").await.unwrap();
        let fetcher = online_fetcher();
        let manager = manager(store.clone(), fetcher.clone());

        let outcome = manager.dispatch(Event::Install).await.unwrap();
        assert!(matches!(outcome, EventOutcome::Installed(_)));
        assert_eq!(manager.state().phase, WorkerPhase::Installed);
        assert!(manager.state().skip_waiting);

        manager.dispatch(Event::Activate).await.unwrap();
        let state = manager.state();
        assert_eq!(state.phase, WorkerPhase::Activated);
        assert!(state.clients_claimed);

        let mut names = store.names().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["app-dynamic-v1", "app-static-v1"]);

        fetcher.go_offline();
        let nav = Request::navigate(url("https://app.example/scores"));
        let outcome = manager.handle_fetch(&nav).await.unwrap();
        let response = outcome.response().unwrap();
        assert_eq!(response.source, ResponseSource::Shell);
        assert_eq!(response.snapshot.body, b"<shell>");
    }

    #[tokio::test]
    async fn fetch_passes_through_until_activated() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = online_fetcher();
        let manager = manager(store, fetcher.clone());

        let request = Request::get(url("https://app.example/index.html"));
        let outcome = manager.handle_fetch(&request).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::Passthrough));
        assert_eq!(fetcher.calls_to("https://app.example/index.html"), 0);
    }

    #[tokio::test]
    async fn failed_install_is_redundant_and_keeps_old_partitions() {
        let store = Arc::new(MemoryStore::new());
        let old_key = RequestKey::new("GET", &url("https://app.example/"));
        store
            .put("app-static-v0", &old_key, &Snapshot::new(200, "old"))
            .await
            .unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        let manager = manager(store.clone(), fetcher);

        let err = manager.install().await.unwrap_err();
        assert!(matches!(err, ShellError::PrecacheFailed { .. }));
        assert_eq!(manager.state().phase, WorkerPhase::Redundant);
        assert!(store.match_in("app-static-v0", &old_key).await.unwrap().is_some());

        let err = manager.activate().await.unwrap_err();
        assert!(matches!(err, ShellError::NotInstalled(_)));
    }

    #[tokio::test]
    async fn skip_waiting_message_activates_installed_version() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(store, online_fetcher());
        manager.install().await.unwrap();

        let outcome = manager.handle_message("skipWaiting").await.unwrap();

        match outcome {
            MessageOutcome::SkipWaiting { activation } => assert!(activation.is_some()),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(manager.state().is_active());

        // Already active: nothing further to activate
        match manager.handle_message("skipWaiting").await.unwrap() {
            MessageOutcome::SkipWaiting { activation } => assert!(activation.is_none()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn clear_cache_message_removes_everything() {
        let store = Arc::new(MemoryStore::new());
        store.open("someone-elses").await.unwrap();
        let manager = manager(store.clone(), online_fetcher());
        manager.install().await.unwrap();
        manager.activate().await.unwrap();

        let outcome = manager
            .dispatch(Event::Message("clearCache".to_string()))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            EventOutcome::Message(MessageOutcome::Cleared { .. })
        ));
        assert!(store.names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_message_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.open("keep").await.unwrap();
        let manager = manager(store.clone(), online_fetcher());

        let outcome = manager.handle_message("reload").await.unwrap();

        assert!(matches!(outcome, MessageOutcome::Ignored));
        assert_eq!(store.names().await.unwrap(), vec!["keep"]);
    }

    #[tokio::test]
    async fn refresh_external_sync() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = online_fetcher();
        let manager = manager(store.clone(), fetcher.clone());
        manager.install().await.unwrap();
        fetcher.respond("https://cdn.example/lib.js", Snapshot::new(200, "lib v2"));

        let outcome = manager.handle_sync("refresh-external").await.unwrap();

        match outcome {
            SyncOutcome::Refreshed(report) => assert_eq!(report.cached.len(), 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let key = RequestKey::new("GET", &url("https://cdn.example/lib.js"));
        let hit = store.match_in("app-dynamic-v1", &key).await.unwrap().unwrap();
        assert_eq!(hit.body, b"lib v2");

        assert!(matches!(
            manager.handle_sync("outbox").await.unwrap(),
            SyncOutcome::Ignored
        ));
    }

    #[tokio::test]
    async fn persisted_state_is_resumed_only_for_same_version() {
        let store = Arc::new(MemoryStore::new());
        let mut active = WorkerState::new("v1");
        active.transition(WorkerPhase::Activated);
        let registration = Registration {
            active: Some(active.clone()),
            current: Some(active.clone()),
        };

        let resumed = manager(store.clone(), online_fetcher()).with_state(registration);
        assert!(resumed.state().is_active());
        assert_eq!(resumed.active().unwrap().version, "v1");

        active.version = "v0".to_string();
        let registration = Registration {
            active: Some(active.clone()),
            current: Some(active),
        };
        let fresh = manager(store, online_fetcher()).with_state(registration);
        assert_eq!(fresh.state().phase, WorkerPhase::Parsed);
        assert_eq!(fresh.active().unwrap().version, "v0");
    }

    fn next_version() -> WorkerConfig {
        let mut config = test_config();
        config.versions = config.versions.for_tag("v2");
        config
    }

    async fn activated_v1(store: Arc<MemoryStore>, fetcher: Arc<ScriptedFetcher>) -> Registration {
        let v1 = manager(store, fetcher);
        v1.install().await.unwrap();
        v1.activate().await.unwrap();
        v1.registration()
    }

    #[tokio::test]
    async fn failed_update_keeps_previous_version_serving() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = online_fetcher();
        let registration = activated_v1(store.clone(), fetcher.clone()).await;

        fetcher.go_offline();
        let v2 = OfflineCacheManager::new(next_version(), store.clone(), fetcher.clone())
            .with_state(registration);
        assert_eq!(v2.state().phase, WorkerPhase::Parsed);

        let err = v2.install().await.unwrap_err();
        assert!(matches!(err, ShellError::PrecacheFailed { .. }));
        assert_eq!(v2.state().phase, WorkerPhase::Redundant);
        assert_eq!(v2.active().unwrap().version, "v1");

        let nav = Request::navigate(url("https://app.example/scores"));
        let outcome = v2.handle_fetch(&nav).await.unwrap();
        let response = outcome.response().unwrap();
        assert_eq!(response.source, ResponseSource::Shell);
        assert_eq!(response.snapshot.body, b"<shell>");

        let lib = Request::get(url("https://cdn.example/lib.js"));
        let outcome = v2.handle_fetch(&lib).await.unwrap();
        assert_eq!(outcome.response().unwrap().source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn failed_reinstall_keeps_version_serving() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = online_fetcher();
        let manager = manager(store, fetcher.clone());
        manager.install().await.unwrap();
        manager.activate().await.unwrap();

        fetcher.go_offline();
        manager.install().await.unwrap_err();
        assert_eq!(manager.state().phase, WorkerPhase::Redundant);
        assert!(manager.active().is_some());

        let nav = Request::navigate(url("https://app.example/scores"));
        let outcome = manager.handle_fetch(&nav).await.unwrap();
        assert_eq!(outcome.response().unwrap().source, ResponseSource::Shell);
    }

    #[tokio::test]
    async fn update_takes_over_only_on_activation() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = online_fetcher();
        let registration = activated_v1(store.clone(), fetcher.clone()).await;

        let v2 = OfflineCacheManager::new(next_version(), store.clone(), fetcher.clone())
            .with_state(registration);
        v2.install().await.unwrap();

        // Still answered by v1, so the network copy lands in v1's partition
        fetcher.respond("https://app.example/app.css", Snapshot::new(200, "css"));
        let css = Request::get(url("https://app.example/app.css"));
        v2.handle_fetch(&css).await.unwrap();
        assert!(store.match_in("app-static-v1", &css.key()).await.unwrap().is_some());
        assert!(store.match_in("app-static-v2", &css.key()).await.unwrap().is_none());

        v2.activate().await.unwrap();
        assert_eq!(v2.active().unwrap().version, "v2");
        let mut names = store.names().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["app-dynamic-v2", "app-static-v2"]);

        v2.handle_fetch(&css).await.unwrap();
        assert!(store.match_in("app-static-v2", &css.key()).await.unwrap().is_some());
    }
}
