//! Integration tests for shellcache

mod http;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Command isolated to a temporary config and state directory
    fn shellcache(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("shellcache");
        cmd.arg("--config")
            .arg(dir.join("config.toml"))
            .arg("--state-dir")
            .arg(dir.join("state"))
            .env_remove("SHELLCACHE_CONFIG")
            .env_remove("SHELLCACHE_STATE_DIR");
        cmd
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        shellcache(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline response cache manager"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        shellcache(dir.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shellcache"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        shellcache(dir.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        shellcache(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[versions]"))
            .stdout(predicate::str::contains("badminton"));
    }

    #[test]
    fn config_init_writes_file_once() {
        let dir = TempDir::new().unwrap();
        shellcache(dir.path())
            .args(["config", "init"])
            .assert()
            .success();
        assert!(dir.path().join("config.toml").exists());

        shellcache(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--force"));
    }

    #[test]
    fn status_of_fresh_state() {
        let dir = TempDir::new().unwrap();
        shellcache(dir.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("parsed"));
    }

    #[test]
    fn list_empty() {
        let dir = TempDir::new().unwrap();
        shellcache(dir.path())
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn unknown_message_is_ignored() {
        let dir = TempDir::new().unwrap();
        shellcache(dir.path())
            .args(["message", "reload"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Ignored"));
    }

    #[test]
    fn activate_before_install_fails() {
        let dir = TempDir::new().unwrap();
        shellcache(dir.path())
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("not installed"))
            .stderr(predicate::str::contains("shellcache install"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn fetch_passes_through_before_activation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<live>"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let uri = server.uri();
        let config = format!("[worker]\norigin = \"{uri}\"\nscope = \"{uri}/\"\n");
        std::fs::write(dir.path().join("config.toml"), config).unwrap();

        shellcache(dir.path())
            .args(["fetch", &format!("{}/index.html", uri)])
            .assert()
            .success()
            .stdout("<live>")
            .stderr(predicate::str::contains("not intercepted"));

        shellcache(dir.path())
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn invalid_config_reports_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[versions\nname = ").unwrap();
        shellcache(dir.path())
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("config.toml"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn install_then_serve_offline() {
        // Not pooled, so dropping it really takes the origin offline
        let server = MockServer::builder().start().await;
        let uri = server.uri();
        for (route, body) in [
            ("/", "<root>"),
            ("/index.html", "<shell>"),
            ("/app.css", "body {}"),
        ] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .mount(&server)
                .await;
        }

        let dir = TempDir::new().unwrap();
        let config = format!(
            r#"
[worker]
origin = "{uri}"
scope = "{uri}/"
shell = "./index.html"

[versions]
name = "demo"
tag = "v2"
legacy = []

[precache]
manifest = ["./", "./index.html"]
"#
        );
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        std::fs::create_dir_all(dir.path().join("state/partitions/demo-static-v1")).unwrap();

        shellcache(dir.path())
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("Precached 2 resource(s)"))
            .stdout(predicate::str::contains("Deleted demo-static-v1"));

        shellcache(dir.path())
            .args(["fetch", &format!("{}/app.css", uri)])
            .assert()
            .success()
            .stdout("body {}")
            .stderr(predicate::str::contains("[network]"));

        drop(server);
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        shellcache(dir.path())
            .args(["fetch", "--navigate", &format!("{}/scores", uri)])
            .assert()
            .success()
            .stdout("<shell>")
            .stderr(predicate::str::contains("[shell]"));

        shellcache(dir.path())
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("demo-static-v2"))
            .stdout(predicate::str::contains("demo-dynamic-v2"))
            .stdout(predicate::str::contains("demo-static-v1").not());
    }
}
