//! The records persisted between runs.
//!
//! All maps are `BTreeMap`s so that serializing the same state twice gives
//! the same bytes, which keeps the published files free of spurious diffs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Network position a status probe runs from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Vantage {
    /// The public internet.
    External,
    /// Inside the LliureX network.
    Local,
}

impl Vantage {
    pub fn all() -> &'static [Vantage] {
        &[Vantage::External, Vantage::Local]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Vantage::External => "external",
            Vantage::Local => "local",
        }
    }
}

impl fmt::Display for Vantage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one package as last seen on the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub version: String,

    /// Size of the .deb in bytes.
    pub size: u64,

    /// `Last-Modified` of the index that listed the package.
    pub last_modified: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub component: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,
}

impl PackageRecord {
    /// Whether the fields that define a package change are equal.
    pub fn same_content(&self, other: &PackageRecord) -> bool {
        self.version == other.version && self.size == other.size
    }
}

/// All packages observed for one release, keyed by package name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseSnapshot {
    packages: BTreeMap<String, PackageRecord>,
}

impl ReleaseSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, record: PackageRecord) {
        self.packages.insert(name.into(), record);
    }

    pub fn get(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Packages ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PackageRecord)> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Sum of all package sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.packages.values().map(|record| record.size).sum()
    }
}

impl FromIterator<(String, PackageRecord)> for ReleaseSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, PackageRecord)>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().collect(),
        }
    }
}

/// When each package last changed, keyed by `"<release>/<package>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeTimestampIndex {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl ChangeTimestampIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flat key a (release, package) pair is stored under.
    pub fn key(release: &str, package: &str) -> String {
        format!("{}/{}", release, package)
    }

    pub fn get(&self, release: &str, package: &str) -> Option<DateTime<Utc>> {
        self.entries.get(&Self::key(release, package)).copied()
    }

    pub fn insert(&mut self, release: &str, package: &str, changed_at: DateTime<Utc>) {
        self.entries.insert(Self::key(release, package), changed_at);
    }

    /// Entries of one release as (package, timestamp), ordered by package.
    pub fn for_release<'a>(
        &'a self,
        release: &str,
    ) -> impl Iterator<Item = (&'a str, DateTime<Utc>)> + 'a {
        let prefix = format!("{}/", release);
        self.entries
            .range(prefix.clone()..)
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .map(|(key, changed_at)| {
                let package = key.split_once('/').map_or("", |(_, package)| package);
                (package, *changed_at)
            })
    }

    /// Replace every entry of `release` with `entries`.
    pub fn replace_release(
        &mut self,
        release: &str,
        entries: impl IntoIterator<Item = (String, DateTime<Utc>)>,
    ) {
        let prefix = format!("{}/", release);
        self.entries.retain(|key, _| !key.starts_with(&prefix));
        for (package, changed_at) in entries {
            self.insert(release, &package, changed_at);
        }
    }

    /// Drop the entries of every release not in `releases`, returning how
    /// many were removed.
    pub fn retain_releases(&mut self, releases: &[String]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| {
            key.split_once('/')
                .is_some_and(|(release, _)| releases.iter().any(|r| r == release))
        });
        before - self.entries.len()
    }

    /// Newest timestamp in the index.
    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.entries.values().max().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reachability of a mirror release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorState {
    Online,
    Offline,
}

impl MirrorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MirrorState::Online => "online",
            MirrorState::Offline => "offline",
        }
    }
}

impl fmt::Display for MirrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of probing one release of a mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorStatus {
    pub release: String,
    pub status: MirrorState,
    /// The URL that was probed.
    pub url: String,
    pub http_code: Option<u16>,
    /// Publication date of the release on the mirror.
    pub repo_last_updated: Option<DateTime<Utc>>,
    /// Number of binary Packages indexes listed in the Release file.
    pub indexes: Option<usize>,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl MirrorStatus {
    pub fn is_online(&self) -> bool {
        self.status == MirrorState::Online
    }

    /// Whether two observations describe the same mirror state, ignoring
    /// when they were made and how a failure was worded.
    pub fn same_state(&self, other: &MirrorStatus) -> bool {
        self.status == other.status
            && self.http_code == other.http_code
            && self.repo_last_updated == other.repo_last_updated
    }
}

/// Everything one probe run observed from one vantage point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub vantage: Vantage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub checked_at: DateTime<Utc>,
    pub repos: BTreeMap<String, MirrorStatus>,
}

impl StatusReport {
    pub fn online_count(&self) -> usize {
        self.repos.values().filter(|status| status.is_online()).count()
    }
}
