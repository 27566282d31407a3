//! Packages index parsing.

use crate::control;
use crate::{AptIndexError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A binary package entry in a Packages index.
///
/// Only `Package` is required. Mirrors in the wild publish stanzas with
/// missing or garbled optional fields, so those fall back to empty values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageStanza {
    /// Package name.
    pub package: String,
    /// Package version, empty when absent.
    pub version: String,
    /// Architecture, empty when absent.
    pub architecture: String,
    /// Size of the .deb in bytes, zero when absent or unparseable.
    pub size: u64,
    /// Filename relative to the archive root.
    pub filename: Option<String>,
    /// Package section.
    pub section: Option<String>,
    /// Short description.
    pub description: Option<String>,
    /// Remaining fields, keyed by lowercased name.
    pub additional_fields: HashMap<String, String>,
}

impl PackageStanza {
    /// Create a stanza with the fields the tracker cares about.
    pub fn new<S: Into<String>>(package: S, version: S, architecture: S, size: u64) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            architecture: architecture.into(),
            size,
            filename: None,
            section: None,
            description: None,
            additional_fields: HashMap::new(),
        }
    }

    /// Parse a package from a control file paragraph.
    pub fn from_paragraph(paragraph: &str) -> Result<Self> {
        let mut fields = control::parse_fields(paragraph, false)?;

        let package = fields
            .remove("package")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AptIndexError::missing_field("Package"))?;

        let size = fields
            .remove("size")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        // Only the synopsis is kept; the extended description is noise here.
        let description = fields
            .remove("description")
            .map(|desc| desc.lines().next().unwrap_or_default().to_string());

        Ok(Self {
            package,
            version: fields.remove("version").unwrap_or_default(),
            architecture: fields.remove("architecture").unwrap_or_default(),
            size,
            filename: fields.remove("filename"),
            section: fields.remove("section"),
            description,
            additional_fields: fields,
        })
    }
}

/// The parsed contents of one Packages index.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    packages: Vec<PackageStanza>,
    skipped: usize,
}

impl PackageIndex {
    /// Parse a Packages index from a string.
    ///
    /// Stanzas without a `Package` field are skipped and counted in
    /// [`PackageIndex::skipped`]. A malformed line anywhere fails the whole
    /// index.
    pub fn from_str(content: &str) -> Result<Self> {
        let mut packages = Vec::new();
        let mut skipped = 0;

        for paragraph in control::paragraphs(content) {
            match PackageStanza::from_paragraph(&paragraph) {
                Ok(package) => packages.push(package),
                Err(AptIndexError::MissingField(_)) => skipped += 1,
                Err(e) => return Err(e),
            }
        }

        Ok(Self { packages, skipped })
    }

    /// Get all packages, in index order.
    pub fn packages(&self) -> &[PackageStanza] {
        &self.packages
    }

    /// Consume the index, yielding its packages.
    pub fn into_packages(self) -> Vec<PackageStanza> {
        self.packages
    }

    /// Number of stanzas that were dropped for lacking a package name.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Get the number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Compare two version strings using Debian version ordering.
///
/// Falls back to plain string ordering when either side is not a valid
/// Debian version, which keeps the comparison total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (
        a.parse::<debversion::Version>(),
        b.parse::<debversion::Version>(),
    ) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}
