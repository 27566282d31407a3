//! Release file parsing.

use crate::control;
use crate::{AptIndexError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An index file listed in a Release file's SHA256 section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Path relative to the `dists/<suite>/` directory.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// SHA256 checksum, hex encoded.
    pub sha256: String,
}

/// The parts of a Release file the status prober reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Origin of the repository.
    pub origin: Option<String>,
    /// Label for the repository.
    pub label: Option<String>,
    /// Suite name.
    pub suite: Option<String>,
    /// Codename.
    pub codename: Option<String>,
    /// Version.
    pub version: Option<String>,
    /// Date the archive was last published.
    pub date: DateTime<Utc>,
    /// Supported architectures.
    pub architectures: Vec<String>,
    /// Repository components.
    pub components: Vec<String>,
    /// Index files listed in the SHA256 section.
    pub files: Vec<IndexEntry>,
}

impl Release {
    /// Parse a Release file from a string.
    pub fn from_str(content: &str) -> Result<Self> {
        // Release files are a single paragraph.
        let paragraph = control::paragraphs(content)
            .into_iter()
            .next()
            .unwrap_or_default();
        let mut fields = control::parse_fields(&paragraph, true)?;

        let date_str = fields
            .remove("date")
            .ok_or_else(|| AptIndexError::missing_field("Date"))?;
        let date = parse_date(&date_str)
            .ok_or_else(|| AptIndexError::invalid_field("Date", date_str.as_str()))?;

        let architectures = fields
            .remove("architectures")
            .map(|s| s.split_whitespace().map(|s| s.to_string()).collect())
            .unwrap_or_default();

        let components = fields
            .remove("components")
            .map(|s| s.split_whitespace().map(|s| s.to_string()).collect())
            .unwrap_or_default();

        let files = match fields.remove("sha256") {
            Some(list) => Self::parse_file_list(&list)?,
            None => Vec::new(),
        };

        Ok(Self {
            origin: fields.remove("origin"),
            label: fields.remove("label"),
            suite: fields.remove("suite"),
            codename: fields.remove("codename"),
            version: fields.remove("version"),
            date,
            architectures,
            components,
            files,
        })
    }

    /// Binary Packages indexes listed in this release, any compression.
    pub fn packages_indexes(&self) -> impl Iterator<Item = &IndexEntry> {
        self.files.iter().filter(|entry| {
            entry
                .path
                .rsplit('/')
                .next()
                .is_some_and(|name| name.starts_with(crate::PACKAGES_INDEX))
                && entry.path.contains("/binary-")
        })
    }

    /// Parse a checksum file list.
    fn parse_file_list(content: &str) -> Result<Vec<IndexEntry>> {
        let mut files = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(AptIndexError::invalid_package(format!(
                    "Invalid file list line: {}",
                    line
                )));
            }

            let size = parts[1]
                .parse::<u64>()
                .map_err(|_| AptIndexError::invalid_field("Size", parts[1]))?;

            files.push(IndexEntry {
                path: parts[2].to_string(),
                size,
                sha256: parts[0].to_string(),
            });
        }

        Ok(files)
    }
}

/// Parse the RFC 2822 style dates found in Release files and HTTP headers.
///
/// Archive tooling writes the zone as `UTC`, which not every RFC 2822
/// parser accepts, so that spelling is normalised first.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let normalised = match value.strip_suffix(" UTC") {
        Some(prefix) => format!("{} +0000", prefix),
        None => value.to_string(),
    };
    DateTime::parse_from_rfc2822(&normalised)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
