use chrono::{Duration, TimeZone, Utc};
use lliurex_state::fetcher::Fetcher;
use lliurex_state::prober::Prober;
use lliurex_state::update::{update_packages, update_status, ReleaseUpdate};
use lliurex_state::{Config, Store, Vantage, WriteOutcome};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JAMMY_PACKAGES: &str = "\
Package: lliurex-up
Version: 8.2.4
Architecture: all
Size: 48212

Package: zero-center
Version: 1.10
Architecture: all
Size: 1300
";

fn config_for(server: &MockServer) -> Config {
    Config::from_toml_str(&format!(
        r#"
[mirror]
base_url = "{}"
releases = ["jammy", "noble"]
architectures = ["all"]

[probe]
timeout_secs = 2
history_limit = 5
"#,
        server.uri()
    ))
    .unwrap()
}

async fn serve_packages(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/jammy/dists/jammy/main/binary-all/Packages"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_second_identical_fetch_writes_nothing() {
    let server = MockServer::start().await;
    serve_packages(&server, JAMMY_PACKAGES).await;
    let config = config_for(&server);
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path());
    let fetcher = Fetcher::new(&config).unwrap();
    let t0 = Utc.with_ymd_and_hms(2026, 10, 11, 2, 0, 0).unwrap();

    let first = update_packages(&fetcher, &store, &config.mirror.releases, t0)
        .await
        .unwrap();
    assert!(first.wrote_anything());
    assert_eq!(first.failed(), 1);

    let second = update_packages(
        &fetcher,
        &store,
        &config.mirror.releases,
        t0 + Duration::days(7),
    )
    .await
    .unwrap();
    assert!(!second.wrote_anything());
    assert_eq!(second.index, WriteOutcome::Unchanged);

    let index = store.load_index().unwrap();
    assert_eq!(index.get("jammy", "lliurex-up"), Some(t0));
}

#[tokio::test]
async fn test_failed_release_keeps_previous_state() {
    let server = MockServer::start().await;
    serve_packages(&server, JAMMY_PACKAGES).await;
    let config = config_for(&server);
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path());
    let t0 = Utc.with_ymd_and_hms(2026, 10, 11, 2, 0, 0).unwrap();

    let fetcher = Fetcher::new(&config).unwrap();
    update_packages(&fetcher, &store, &["jammy".to_string()], t0)
        .await
        .unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let summary = update_packages(
        &fetcher,
        &store,
        &["jammy".to_string()],
        t0 + Duration::days(1),
    )
    .await
    .unwrap();

    assert!(matches!(summary.releases[0].1, ReleaseUpdate::Failed { .. }));
    assert_eq!(store.load_snapshot("jammy").unwrap().len(), 2);
    assert_eq!(store.load_index().unwrap().get("jammy", "zero-center"), Some(t0));
}

#[tokio::test]
async fn test_upgrade_moves_only_that_timestamp() {
    let server = MockServer::start().await;
    serve_packages(&server, JAMMY_PACKAGES).await;
    let config = config_for(&server);
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path());
    let fetcher = Fetcher::new(&config).unwrap();
    let t0 = Utc.with_ymd_and_hms(2026, 10, 11, 2, 0, 0).unwrap();
    let t1 = t0 + Duration::days(7);

    update_packages(&fetcher, &store, &["jammy".to_string()], t0)
        .await
        .unwrap();

    server.reset().await;
    serve_packages(&server, &JAMMY_PACKAGES.replace("8.2.4", "8.2.5")).await;

    let summary = update_packages(&fetcher, &store, &["jammy".to_string()], t1)
        .await
        .unwrap();
    assert_eq!(
        summary.releases[0].1,
        ReleaseUpdate::Updated {
            added: 0,
            changed: 1,
            removed: 0,
            snapshot: WriteOutcome::Written,
        }
    );

    let index = store.load_index().unwrap();
    assert_eq!(index.get("jammy", "lliurex-up"), Some(t1));
    assert_eq!(index.get("jammy", "zero-center"), Some(t0));
}

async fn serve_release(server: &MockServer, release: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/{0}/dists/{0}/main/binary-all/Packages",
            release
        )))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_store_failure_writes_nothing_and_loses_no_change() {
    let server = MockServer::start().await;
    serve_release(&server, "jammy", JAMMY_PACKAGES).await;
    serve_release(&server, "noble", JAMMY_PACKAGES).await;
    let config = config_for(&server);
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path());
    let fetcher = Fetcher::new(&config).unwrap();
    let t0 = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
    let t1 = t0 + Duration::days(1);
    let t2 = t0 + Duration::days(2);

    let first = update_packages(&fetcher, &store, &config.mirror.releases, t0)
        .await
        .unwrap();
    assert_eq!(first.failed(), 0);

    // noble's snapshot can no longer be read.
    let noble = store.snapshot_path("noble");
    std::fs::remove_file(&noble).unwrap();
    std::fs::create_dir(&noble).unwrap();

    server.reset().await;
    serve_release(&server, "jammy", &JAMMY_PACKAGES.replace("8.2.4", "8.2.5")).await;
    serve_release(&server, "noble", JAMMY_PACKAGES).await;

    let result = update_packages(&fetcher, &store, &config.mirror.releases, t1).await;
    assert!(result.is_err());

    let jammy = store.load_snapshot("jammy").unwrap();
    assert_eq!(jammy.get("lliurex-up").unwrap().version, "8.2.4");
    assert_eq!(store.load_index().unwrap().get("jammy", "lliurex-up"), Some(t0));

    std::fs::remove_dir(&noble).unwrap();
    let third = update_packages(&fetcher, &store, &config.mirror.releases, t2)
        .await
        .unwrap();
    assert_eq!(third.failed(), 0);

    let jammy = store.load_snapshot("jammy").unwrap();
    assert_eq!(jammy.get("lliurex-up").unwrap().version, "8.2.5");
    let index = store.load_index().unwrap();
    assert_eq!(index.get("jammy", "lliurex-up"), Some(t2));
    assert_eq!(index.get("jammy", "zero-center"), Some(t0));
}

#[tokio::test]
async fn test_unconfigured_release_timestamps_are_dropped() {
    let server = MockServer::start().await;
    serve_release(&server, "jammy", JAMMY_PACKAGES).await;
    serve_release(&server, "noble", JAMMY_PACKAGES).await;
    let config = config_for(&server);
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path());
    let fetcher = Fetcher::new(&config).unwrap();
    let t0 = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();

    update_packages(&fetcher, &store, &config.mirror.releases, t0)
        .await
        .unwrap();
    assert_eq!(store.load_index().unwrap().len(), 4);

    let summary = update_packages(&fetcher, &store, &["noble".to_string()], t0)
        .await
        .unwrap();
    assert_eq!(summary.index, WriteOutcome::Written);

    let index = store.load_index().unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.get("jammy", "lliurex-up"), None);
    assert_eq!(index.get("noble", "lliurex-up"), Some(t0));
    assert_eq!(store.load_snapshot("jammy").unwrap().len(), 2);
}

#[tokio::test]
async fn test_probe_records_once_per_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jammy/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let config = config_for(&server);
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path());
    let prober = Prober::new(&config, Vantage::External).unwrap();

    let first = update_status(&prober, &store, config.probe.history_limit)
        .await
        .unwrap();
    assert!(first.changed());

    let second = update_status(&prober, &store, config.probe.history_limit)
        .await
        .unwrap();
    assert!(!second.changed());

    let status = store.load_status(Vantage::External).unwrap().unwrap();
    assert!(status.repos["jammy"].is_online());
    assert_eq!(status.repos["noble"].http_code, Some(404));
    assert_eq!(store.load_history(Vantage::External).unwrap().len(), 1);
}
