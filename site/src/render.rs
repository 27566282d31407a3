//! Rendering of the status pages and the README.
//!
//! Rendering is a pure function of the stored state: relative times are
//! computed against [`SiteData::reference_time`], never the wall clock, so
//! the same state always renders to the same bytes.

use chrono::{DateTime, Utc};
use lliurex_state::store::{write_if_changed, Store, StoreError, WriteOutcome};
use lliurex_state::{ChangeTimestampIndex, Config, MirrorStatus, ReleaseSnapshot, StatusReport, Vantage};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use tracing::debug;

use crate::releases::ReleaseInfo;
use crate::templates::setup_templates;

/// Entries in the "recently changed" table of a release page.
pub const RECENT_LIMIT: usize = 20;

/// Entries in the "largest packages" table of a release page.
pub const LARGEST_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where the README points readers for the rendered pages.
///
/// `paths.site_url` wins. Otherwise an `owner/repo` GitHub repository maps
/// to its GitHub Pages address, and failing that the link is the local
/// `index.html` under `paths.site_dir`.
pub fn site_link(config: &Config, github_repository: Option<&str>) -> String {
    if let Some(url) = &config.paths.site_url {
        return url.to_string();
    }
    match github_repository.and_then(|repository| repository.split_once('/')) {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
            format!("https://{}.github.io/{}/", owner.to_lowercase(), repo)
        }
        _ => config.paths.site_dir.join("index.html").display().to_string(),
    }
}

/// Everything the pages are rendered from.
#[derive(Debug, Clone, Default)]
pub struct SiteData {
    /// Release codenames in display order.
    pub releases: Vec<String>,
    pub snapshots: BTreeMap<String, ReleaseSnapshot>,
    pub index: ChangeTimestampIndex,
    pub external: Option<StatusReport>,
    pub local: Option<StatusReport>,
    /// Link to the rendered pages, used by the README.
    pub site_link: String,
}

impl SiteData {
    /// Read the state of every configured release from `store`.
    pub fn load(config: &Config, store: &Store) -> Result<Self, StoreError> {
        let mut snapshots = BTreeMap::new();
        for release in &config.mirror.releases {
            snapshots.insert(release.clone(), store.load_snapshot(release)?);
        }

        Ok(Self {
            releases: config.mirror.releases.clone(),
            snapshots,
            index: store.load_index()?,
            external: store.load_status(Vantage::External)?,
            local: store.load_status(Vantage::Local)?,
            site_link: site_link(config, std::env::var("GITHUB_REPOSITORY").ok().as_deref()),
        })
    }

    /// The instant relative times are measured from: the newest change
    /// timestamp or status check in the data, or the epoch if there is none.
    pub fn reference_time(&self) -> DateTime<Utc> {
        let statuses = [&self.external, &self.local]
            .into_iter()
            .flatten()
            .flat_map(|report| {
                std::iter::once(report.checked_at)
                    .chain(report.repos.values().map(|status| status.checked_at))
            });

        self.index
            .latest()
            .into_iter()
            .chain(statuses)
            .max()
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    fn status(&self, vantage: Vantage, release: &str) -> Option<&MirrorStatus> {
        let report = match vantage {
            Vantage::External => self.external.as_ref(),
            Vantage::Local => self.local.as_ref(),
        };
        report.and_then(|report| report.repos.get(release))
    }
}

#[derive(Debug, Serialize)]
struct StatusView<'a> {
    online: bool,
    status: &'a str,
    http_code: Option<u16>,
    url: &'a str,
    repo_last_updated: Option<DateTime<Utc>>,
    checked_at: DateTime<Utc>,
    error: Option<&'a str>,
}

impl<'a> From<&'a MirrorStatus> for StatusView<'a> {
    fn from(status: &'a MirrorStatus) -> Self {
        Self {
            online: status.is_online(),
            status: status.status.as_str(),
            http_code: status.http_code,
            url: &status.url,
            repo_last_updated: status.repo_last_updated,
            checked_at: status.checked_at,
            error: status.error.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReleaseCard<'a> {
    info: ReleaseInfo,
    page: String,
    external: Option<StatusView<'a>>,
    local: Option<StatusView<'a>>,
    package_count: usize,
    total_size: u64,
    last_change: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
struct PackageRow<'a> {
    name: &'a str,
    version: &'a str,
    component: &'a str,
    architecture: &'a str,
    size: u64,
    changed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct StatusSection<'a> {
    checked_at: DateTime<Utc>,
    hostname: Option<&'a str>,
    rows: Vec<StatusRow<'a>>,
}

#[derive(Debug, Serialize)]
struct StatusRow<'a> {
    info: ReleaseInfo,
    status: StatusView<'a>,
}

/// File name of the page of `release`.
pub fn release_page(release: &str) -> String {
    format!("{}.html", release)
}

/// A rendered page, with its path relative to the site directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: PathBuf,
    pub contents: String,
}

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        Ok(Self {
            tera: setup_templates()?,
        })
    }

    fn base_context(&self, data: &SiteData) -> Context {
        let mut context = Context::new();
        context.insert("app_name", "LliureX Repository Status");
        context.insert("version", env!("CARGO_PKG_VERSION"));
        context.insert("now", &data.reference_time());
        context
    }

    pub fn render_index(&self, data: &SiteData) -> Result<String, RenderError> {
        let cards: Vec<ReleaseCard> = data
            .releases
            .iter()
            .map(|release| {
                let snapshot = data.snapshots.get(release);
                ReleaseCard {
                    info: ReleaseInfo::for_codename(release),
                    page: release_page(release),
                    external: data.status(Vantage::External, release).map(StatusView::from),
                    local: data.status(Vantage::Local, release).map(StatusView::from),
                    package_count: snapshot.map_or(0, |s| s.len()),
                    total_size: snapshot.map_or(0, |s| s.total_size()),
                    last_change: data.index.for_release(release).map(|(_, ts)| ts).max(),
                }
            })
            .collect();

        let mut context = self.base_context(data);
        context.insert("releases", &cards);
        context.insert("has_local", &data.local.is_some());
        Ok(self.tera.render("index.html", &context)?)
    }

    pub fn render_release(&self, data: &SiteData, release: &str) -> Result<String, RenderError> {
        let empty = ReleaseSnapshot::new();
        let snapshot = data.snapshots.get(release).unwrap_or(&empty);

        let packages: Vec<PackageRow> = snapshot
            .iter()
            .map(|(name, record)| PackageRow {
                name,
                version: &record.version,
                component: &record.component,
                architecture: &record.architecture,
                size: record.size,
                changed_at: data.index.get(release, name),
            })
            .collect();

        let mut recent: Vec<PackageRow> = packages
            .iter()
            .filter(|row| row.changed_at.is_some())
            .cloned()
            .collect();
        // Newest first; names break ties so the order is stable.
        recent.sort_by(|a, b| b.changed_at.cmp(&a.changed_at).then(a.name.cmp(b.name)));
        recent.truncate(RECENT_LIMIT);

        let mut largest = packages.clone();
        largest.sort_by(|a, b| b.size.cmp(&a.size).then(a.name.cmp(b.name)));
        largest.truncate(LARGEST_LIMIT);

        let mut context = self.base_context(data);
        context.insert("info", &ReleaseInfo::for_codename(release));
        context.insert(
            "external",
            &data.status(Vantage::External, release).map(StatusView::from),
        );
        context.insert(
            "local",
            &data.status(Vantage::Local, release).map(StatusView::from),
        );
        context.insert("package_count", &snapshot.len());
        context.insert("total_size", &snapshot.total_size());
        context.insert("recent", &recent);
        context.insert("largest", &largest);
        context.insert("packages", &packages);
        Ok(self.tera.render("release.html", &context)?)
    }

    pub fn render_readme(&self, data: &SiteData) -> Result<String, RenderError> {
        let mut context = self.base_context(data);
        context.insert("external", &status_section(data, data.external.as_ref()));
        context.insert("local", &status_section(data, data.local.as_ref()));
        context.insert("site_link", &data.site_link);
        context.insert(
            "releases",
            &data
                .releases
                .iter()
                .map(|release| ReleaseInfo::for_codename(release))
                .collect::<Vec<_>>(),
        );
        Ok(self.tera.render("README.md", &context)?)
    }

    /// The overview page and one page per release.
    pub fn render_site(&self, data: &SiteData) -> Result<Vec<Page>, RenderError> {
        let mut pages = vec![Page {
            path: PathBuf::from("index.html"),
            contents: self.render_index(data)?,
        }];
        for release in &data.releases {
            pages.push(Page {
                path: PathBuf::from(release_page(release)),
                contents: self.render_release(data, release)?,
            });
        }
        Ok(pages)
    }
}

fn status_section<'a>(
    data: &SiteData,
    report: Option<&'a StatusReport>,
) -> Option<StatusSection<'a>> {
    let report = report?;
    // Configured releases first, in order, then anything else the report has.
    let mut order: Vec<&String> = data
        .releases
        .iter()
        .filter(|release| report.repos.contains_key(*release))
        .collect();
    order.extend(
        report
            .repos
            .keys()
            .filter(|release| !data.releases.contains(release)),
    );

    Some(StatusSection {
        checked_at: report.checked_at,
        hostname: report.hostname.as_deref(),
        rows: order
            .into_iter()
            .filter_map(|release| {
                report.repos.get(release).map(|status| StatusRow {
                    info: ReleaseInfo::for_codename(release),
                    status: StatusView::from(status),
                })
            })
            .collect(),
    })
}

/// Write `pages` below `dir`, skipping files whose contents are unchanged.
pub fn write_pages(dir: &Path, pages: &[Page]) -> Result<Vec<(PathBuf, WriteOutcome)>, StoreError> {
    pages
        .iter()
        .map(|page| {
            let path = dir.join(&page.path);
            let outcome = write_if_changed(&path, page.contents.as_bytes())?;
            debug!("{}: {:?}", path.display(), outcome);
            Ok((path, outcome))
        })
        .collect()
}
