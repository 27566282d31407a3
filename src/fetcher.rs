//! Retrieval of the binary package indexes of a release.

use apt_index::{compare_versions, Compression, PackageIndex, PackageStanza};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::header::LAST_MODIFIED;
use reqwest::StatusCode;
use std::cmp::Ordering;
use tracing::{debug, info};
use url::Url;

use crate::config::{Config, MirrorConfig};
use crate::error::{FetchError, NetworkError, ParseError};
use crate::model::{PackageRecord, ReleaseSnapshot};
use crate::utils::{http_client, join_url};

/// One parsed `Packages` index.
struct FetchedIndex {
    component: String,
    architecture: String,
    last_modified: Option<DateTime<Utc>>,
    packages: Vec<PackageStanza>,
}

/// Fetches release snapshots from the mirror.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    mirror: MirrorConfig,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, NetworkError> {
        let client = http_client(config.fetch_timeout()).map_err(NetworkError::Client)?;
        Ok(Self::with_client(client, config.mirror.clone()))
    }

    pub fn with_client(client: reqwest::Client, mirror: MirrorConfig) -> Self {
        Self { client, mirror }
    }

    /// URL of one variant of a `Packages` index.
    pub fn index_url(
        &self,
        release: &str,
        component: &str,
        architecture: &str,
        compression: Compression,
    ) -> Result<Url, NetworkError> {
        let path = format!(
            "{release}/dists/{release}/{component}/binary-{architecture}/{}{}",
            apt_index::PACKAGES_INDEX,
            compression.extension()
        );
        join_url(&self.mirror.base_url, &path)
            .map_err(|source| NetworkError::InvalidUrl { path, source })
    }

    /// Try each compression variant of an index in turn.
    ///
    /// Returns `None` when the mirror has no variant of it at all.
    async fn fetch_index(
        &self,
        release: &str,
        component: &str,
        architecture: &str,
    ) -> Result<Option<FetchedIndex>, FetchError> {
        for compression in Compression::preferred_order() {
            let url = self.index_url(release, component, architecture, *compression)?;
            debug!("Fetching {}", url);

            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| NetworkError::from_reqwest(&url, e))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                debug!("{} not found, trying next variant", url);
                continue;
            }
            if !status.is_success() {
                return Err(NetworkError::Status {
                    url,
                    status: status.as_u16(),
                }
                .into());
            }

            let last_modified = response
                .headers()
                .get(LAST_MODIFIED)
                .and_then(|value| value.to_str().ok())
                .and_then(apt_index::parse_date);

            let body = response
                .bytes()
                .await
                .map_err(|e| NetworkError::from_reqwest(&url, e))?;

            let parse_error = |source: apt_index::AptIndexError| ParseError {
                url: url.clone(),
                source,
            };
            let text = compression.decode_text(&body).map_err(parse_error)?;
            let index = PackageIndex::from_str(&text).map_err(parse_error)?;
            if index.skipped() > 0 {
                debug!(
                    "{}: skipped {} stanzas without a package name",
                    url,
                    index.skipped()
                );
            }

            return Ok(Some(FetchedIndex {
                component: component.to_string(),
                architecture: architecture.to_string(),
                last_modified,
                packages: index.into_packages(),
            }));
        }

        debug!(
            "No Packages index for {}/{}/binary-{}",
            release, component, architecture
        );
        Ok(None)
    }

    /// Fetch every configured index of `release` and merge them.
    pub async fn fetch_release(&self, release: &str) -> Result<ReleaseSnapshot, FetchError> {
        let slices: Vec<(&str, &str)> = self
            .mirror
            .components
            .iter()
            .flat_map(|component| {
                self.mirror
                    .architectures
                    .iter()
                    .map(move |arch| (component.as_str(), arch.as_str()))
            })
            .collect();

        let results = join_all(
            slices
                .iter()
                .map(|(component, arch)| self.fetch_index(release, component, arch)),
        )
        .await;

        let mut indexes = Vec::new();
        for result in results {
            if let Some(index) = result? {
                indexes.push(index);
            }
        }

        if indexes.is_empty() {
            return Err(NetworkError::NoIndex {
                release: release.to_string(),
            }
            .into());
        }

        let snapshot = collapse(indexes);
        info!("{}: {} packages", release, snapshot.len());
        Ok(snapshot)
    }

    /// Fetch several releases concurrently. Results keep the input order.
    pub async fn fetch_all(
        &self,
        releases: &[String],
    ) -> Vec<(String, Result<ReleaseSnapshot, FetchError>)> {
        join_all(releases.iter().map(|release| async move {
            (release.clone(), self.fetch_release(release).await)
        }))
        .await
    }
}

/// Merge indexes into one record per package name.
///
/// The highest version wins; on a tie the entry seen first stays.
fn collapse(indexes: Vec<FetchedIndex>) -> ReleaseSnapshot {
    let mut snapshot = ReleaseSnapshot::new();
    for index in indexes {
        for stanza in index.packages {
            let keep_existing = snapshot.get(&stanza.package).is_some_and(|existing| {
                compare_versions(&existing.version, &stanza.version) != Ordering::Less
            });
            if keep_existing {
                continue;
            }

            let architecture = if stanza.architecture.is_empty() {
                index.architecture.clone()
            } else {
                stanza.architecture
            };
            snapshot.insert(
                stanza.package,
                PackageRecord {
                    version: stanza.version,
                    size: stanza.size,
                    last_modified: index.last_modified,
                    component: index.component.clone(),
                    architecture,
                },
            );
        }
    }
    snapshot
}
