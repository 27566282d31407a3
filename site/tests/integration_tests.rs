use chrono::{Duration, TimeZone, Utc};
use lliurex_site::{write_pages, Renderer, SiteData};
use lliurex_state::store::write_if_changed;
use lliurex_state::{
    ChangeTimestampIndex, Config, MirrorState, MirrorStatus, PackageRecord, ReleaseSnapshot,
    StatusReport, Store, Vantage, WriteOutcome,
};
use tempfile::TempDir;

fn config_for(dir: &TempDir) -> Config {
    Config::from_toml_str(&format!(
        r#"
[mirror]
base_url = "http://lliurex.net"
releases = ["focal", "jammy", "noble"]

[paths]
data_dir = "{data}"
site_dir = "{site}"
readme = "{readme}"
"#,
        data = dir.path().join("data").display(),
        site = dir.path().join("public").display(),
        readme = dir.path().join("README.md").display(),
    ))
    .unwrap()
}

fn populate(store: &Store) {
    let t0 = Utc.with_ymd_and_hms(2026, 10, 11, 2, 0, 0).unwrap();

    let mut snapshot = ReleaseSnapshot::new();
    snapshot.insert(
        "lliurex-up",
        PackageRecord {
            version: "8.2.4".to_string(),
            size: 48212,
            last_modified: Some(t0),
            component: "main".to_string(),
            architecture: "all".to_string(),
        },
    );
    store.save_snapshot("jammy", &snapshot).unwrap();

    let mut index = ChangeTimestampIndex::new();
    index.insert("jammy", "lliurex-up", t0);
    store.save_index(&index).unwrap();

    let checked_at = t0 + Duration::days(3);
    let report = StatusReport {
        vantage: Vantage::Local,
        hostname: Some("server.lliurex.lan".to_string()),
        checked_at,
        repos: ["focal", "jammy"]
            .into_iter()
            .map(|release| {
                (
                    release.to_string(),
                    MirrorStatus {
                        release: release.to_string(),
                        status: if release == "focal" {
                            MirrorState::Offline
                        } else {
                            MirrorState::Online
                        },
                        url: format!("http://mirror.lliurex.lan/{}/", release),
                        http_code: if release == "focal" { Some(404) } else { Some(200) },
                        repo_last_updated: None,
                        indexes: None,
                        error: None,
                        checked_at,
                    },
                )
            })
            .collect(),
    };
    store.save_status(&report).unwrap();
}

#[test]
fn test_rerender_of_same_state_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let store = Store::new(&config.paths.data_dir);
    populate(&store);

    let renderer = Renderer::new().unwrap();
    let data = SiteData::load(&config, &store).unwrap();

    let pages = renderer.render_site(&data).unwrap();
    assert_eq!(pages.len(), 4);
    let first = write_pages(&config.paths.site_dir, &pages).unwrap();
    assert!(first.iter().all(|(_, outcome)| outcome.is_written()));

    let data = SiteData::load(&config, &store).unwrap();
    let pages = renderer.render_site(&data).unwrap();
    let second = write_pages(&config.paths.site_dir, &pages).unwrap();
    assert!(second
        .iter()
        .all(|(_, outcome)| *outcome == WriteOutcome::Unchanged));

    let readme = renderer.render_readme(&data).unwrap();
    assert!(write_if_changed(&config.paths.readme, readme.as_bytes())
        .unwrap()
        .is_written());
    assert!(!write_if_changed(&config.paths.readme, readme.as_bytes())
        .unwrap()
        .is_written());
}

#[test]
fn test_local_only_state() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let store = Store::new(&config.paths.data_dir);
    populate(&store);

    let data = SiteData::load(&config, &store).unwrap();
    assert!(data.external.is_none());

    let renderer = Renderer::new().unwrap();
    let readme = renderer.render_readme(&data).unwrap();
    assert!(readme.contains("No external check data available"));
    assert!(readme.contains("**Host:** server.lliurex.lan"));
    assert!(readme.contains("| Ubuntu 20.04 LTS (focal) | ❌ offline |"));

    let jammy = renderer.render_release(&data, "jammy").unwrap();
    assert!(jammy.contains("3 days ago"));
    assert!(jammy.contains("Jammy Jellyfish"));
}

#[test]
fn test_empty_store_renders() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let store = Store::new(&config.paths.data_dir);

    let data = SiteData::load(&config, &store).unwrap();
    let pages = Renderer::new().unwrap().render_site(&data).unwrap();
    assert_eq!(pages.len(), 4);
    assert!(pages[0].contents.contains("0 packages"));
}
