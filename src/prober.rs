//! Reachability probing of the mirror releases.
//!
//! A probe never fails: whatever goes wrong is recorded in the
//! [`MirrorStatus`] of the affected release.

use apt_index::Release;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::header::LAST_MODIFIED;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::NetworkError;
use crate::model::{MirrorState, MirrorStatus, StatusReport, Vantage};
use crate::utils::{hostname, http_client, join_url, now};

/// What the Release file of a reachable release told us.
#[derive(Debug, Default)]
struct ReleaseMetadata {
    date: Option<DateTime<Utc>>,
    indexes: Option<usize>,
}

/// Probes every release configured for one vantage point.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
    base_url: Url,
    releases: Vec<String>,
    vantage: Vantage,
}

impl Prober {
    pub fn new(config: &Config, vantage: Vantage) -> Result<Self, NetworkError> {
        let client = http_client(config.probe_timeout()).map_err(NetworkError::Client)?;
        Ok(Self::with_client(
            client,
            config.base_url_for(vantage).clone(),
            config.releases_for(vantage).to_vec(),
            vantage,
        ))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: Url,
        releases: Vec<String>,
        vantage: Vantage,
    ) -> Self {
        Self {
            client,
            base_url,
            releases,
            vantage,
        }
    }

    pub fn vantage(&self) -> Vantage {
        self.vantage
    }

    pub async fn probe_release(&self, release: &str) -> MirrorStatus {
        let checked_at = now();
        let mut status = MirrorStatus {
            release: release.to_string(),
            status: MirrorState::Offline,
            url: String::new(),
            http_code: None,
            repo_last_updated: None,
            indexes: None,
            error: None,
            checked_at,
        };

        let url = match join_url(&self.base_url, &format!("{}/", release)) {
            Ok(url) => url,
            Err(e) => {
                status.error = Some(format!("invalid URL for release: {}", e));
                return status;
            }
        };
        status.url = url.to_string();

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let err = NetworkError::from_reqwest(&url, e);
                warn!("{}: {} offline: {}", self.vantage, release, err);
                status.error = Some(err.to_string());
                return status;
            }
        };

        let code = response.status();
        status.http_code = Some(code.as_u16());
        if !code.is_success() {
            warn!("{}: {} answered HTTP {}", self.vantage, release, code.as_u16());
            status.error = Some(format!("HTTP {}", code.as_u16()));
            return status;
        }

        status.status = MirrorState::Online;
        let metadata = self.release_metadata(release).await;
        status.repo_last_updated = metadata.date;
        status.indexes = metadata.indexes;
        debug!("{}: {} online", self.vantage, release);
        status
    }

    /// Read the publication date from the release's `Release` file.
    ///
    /// Falls back to the `Last-Modified` header when the file has no usable
    /// `Date:` field.
    async fn release_metadata(&self, release: &str) -> ReleaseMetadata {
        let path = format!("{release}/dists/{release}/{}", apt_index::RELEASE_FILE);
        let url = match join_url(&self.base_url, &path) {
            Ok(url) => url,
            Err(_) => return ReleaseMetadata::default(),
        };

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!("{} returned HTTP {}", url, response.status().as_u16());
                return ReleaseMetadata::default();
            }
            Err(e) => {
                debug!("{}", NetworkError::from_reqwest(&url, e));
                return ReleaseMetadata::default();
            }
        };

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(apt_index::parse_date);

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!("{}", NetworkError::from_reqwest(&url, e));
                return ReleaseMetadata {
                    date: last_modified,
                    indexes: None,
                };
            }
        };

        match Release::from_str(&text) {
            Ok(parsed) => ReleaseMetadata {
                date: Some(parsed.date),
                indexes: Some(count_indexes(&parsed)),
            },
            Err(e) => {
                debug!("{}: {}, using Last-Modified", url, e);
                ReleaseMetadata {
                    date: last_modified,
                    indexes: None,
                }
            }
        }
    }

    /// Probe every release concurrently.
    pub async fn probe_all(&self) -> StatusReport {
        let checked_at = now();
        let statuses = join_all(
            self.releases
                .iter()
                .map(|release| self.probe_release(release)),
        )
        .await;

        let repos: BTreeMap<String, MirrorStatus> = statuses
            .into_iter()
            .map(|status| (status.release.clone(), status))
            .collect();

        let report = StatusReport {
            vantage: self.vantage,
            hostname: match self.vantage {
                Vantage::Local => hostname(),
                Vantage::External => None,
            },
            checked_at,
            repos,
        };
        info!(
            "{}: {}/{} releases online",
            self.vantage,
            report.online_count(),
            report.repos.len()
        );
        report
    }
}

/// Number of distinct (component, architecture) Packages indexes, whatever
/// compressions each is offered in.
fn count_indexes(release: &Release) -> usize {
    release
        .packages_indexes()
        .map(|entry| entry.path.rsplit_once('/').map_or("", |(dir, _)| dir))
        .collect::<BTreeSet<_>>()
        .len()
}
