//! HTTP fetcher and manager tests against a mock origin

use shellcache::config::{Config, WorkerConfig};
use shellcache::fetch::{FetchMode, Fetcher, HttpFetcher};
use shellcache::request::{Request, RequestKey};
use shellcache::store::{CacheStore, DiskStore};
use shellcache::worker::{ResponseSource, WorkerPhase};
use shellcache::OfflineCacheManager;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[tokio::test]
async fn non_success_status_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.js"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&url(&server.uri()));
    let request = Request::get(url(&format!("{}/missing.js", server.uri())));
    let snapshot = fetcher
        .fetch(&request, FetchMode::SameOrigin)
        .await
        .expect("404 is not a network error");

    assert_eq!(snapshot.status, 404);
    assert_eq!(snapshot.status_text, "Not Found");
    assert_eq!(snapshot.body, b"nope");
    assert!(!snapshot.is_success());
}

#[tokio::test]
async fn cors_mode_sends_origin_and_keeps_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lib.js"))
        .and(header("origin", "https://app.example"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("lib", "text/javascript")
                .insert_header("etag", "\"lib-1\""),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&url("https://app.example/"));
    let request = Request::get(url(&format!("{}/lib.js", server.uri())));
    let snapshot = fetcher.fetch(&request, FetchMode::Cors).await.unwrap();

    assert_eq!(snapshot.status, 200);
    assert_eq!(snapshot.content_type(), Some("text/javascript"));
    assert_eq!(
        snapshot.headers.get("etag").map(String::as_str),
        Some("\"lib-1\"")
    );
    assert_eq!(snapshot.body, b"lib");
}

#[tokio::test]
async fn disk_backed_manager_lifecycle() {
    let server = MockServer::start().await;
    for (route, status, body) in [
        ("/", 200, "<root>"),
        ("/index.html", 200, "<shell>"),
        ("/data.json", 200, "[1,2,3]"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
    }

    let mut config = Config::default();
    config.worker.origin = server.uri();
    config.worker.scope = format!("{}/", server.uri());
    config.versions.name = "demo".to_string();
    config.versions.tag = "v1".to_string();
    config.versions.legacy = vec![];
    config.precache.manifest = vec!["./".to_string(), "./index.html".to_string()];
    let worker = WorkerConfig::from_config(&config).unwrap();

    let dir = TempDir::new().unwrap();
    let store = Arc::new(DiskStore::new(dir.path()));
    let fetcher = Arc::new(HttpFetcher::new(&worker.origin));
    let manager = OfflineCacheManager::new(worker, store.clone(), fetcher);

    manager.install().await.unwrap();
    manager.activate().await.unwrap();
    assert_eq!(manager.state().phase, WorkerPhase::Activated);

    let shell_key = RequestKey::new("GET", &url(&format!("{}/index.html", server.uri())));
    let cached = store.match_in("demo-static-v1", &shell_key).await.unwrap();
    assert_eq!(cached.unwrap().body, b"<shell>");

    let request = Request::get(url(&format!("{}/data.json", server.uri())));
    let outcome = manager.handle_fetch(&request).await.unwrap();
    let response = outcome.response().unwrap();
    assert_eq!(response.source, ResponseSource::Network);
    assert_eq!(response.snapshot.body, b"[1,2,3]");

    // Network-first writes same-origin responses to the static partition
    let hit = store
        .match_in("demo-static-v1", &request.key())
        .await
        .unwrap();
    assert!(hit.is_some());
}
