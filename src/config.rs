//! Configuration for the mirror tracker.
//!
//! The configuration is a TOML file, by default `lliurex-state.toml` in the
//! working directory. Only the `[mirror]` table is required; every other
//! table falls back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::model::Vantage;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "lliurex-state.toml";

/// Configuration errors. All of them abort a run before any network activity.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("I/O error reading config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`Config`].
    #[error("Failed to parse config file '{path}': {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A field has an invalid value.
    #[error("Invalid value for field '{field}': {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Top level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The mirror being tracked.
    pub mirror: MirrorConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

/// The APT mirror and the slices of it that are tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Base URL; release `foo` lives under `<base_url>/foo/`.
    pub base_url: Url,

    /// Release codenames, in display order.
    pub releases: Vec<String>,

    #[serde(default = "defaults::components")]
    pub components: Vec<String>,

    #[serde(default = "defaults::architectures")]
    pub architectures: Vec<String>,
}

/// Package index fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "defaults::fetch_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::fetch_timeout_secs(),
        }
    }
}

/// Reachability probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "defaults::probe_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of reports kept in each vantage point's history.
    #[serde(default = "defaults::history_limit")]
    pub history_limit: usize,

    #[serde(default)]
    pub external: VantageConfig,

    #[serde(default)]
    pub local: VantageConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::probe_timeout_secs(),
            history_limit: defaults::history_limit(),
            external: VantageConfig::default(),
            local: VantageConfig::default(),
        }
    }
}

/// Per vantage point overrides of the mirror settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VantageConfig {
    /// Mirror base URL as seen from this vantage point.
    pub base_url: Option<Url>,

    /// Subset of releases probed from this vantage point.
    pub releases: Option<Vec<String>>,
}

/// Where state, pages and logs live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "defaults::site_dir")]
    pub site_dir: PathBuf,

    #[serde(default = "defaults::readme")]
    pub readme: PathBuf,

    #[serde(default = "defaults::log_file")]
    pub log_file: PathBuf,

    /// Public URL of the rendered pages, linked from the README.
    pub site_url: Option<Url>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
            site_dir: defaults::site_dir(),
            readme: defaults::readme(),
            log_file: defaults::log_file(),
            site_url: None,
        }
    }
}

/// Committing and pushing changed files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "defaults::remote")]
    pub remote: String,

    /// Branch to push; the current branch when unset.
    pub branch: Option<String>,

    #[serde(default = "defaults::default_true")]
    pub push: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            remote: defaults::remote(),
            branch: None,
            push: true,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn components() -> Vec<String> {
        vec!["main".to_string(), "import".to_string(), "testing".to_string()]
    }

    pub fn architectures() -> Vec<String> {
        vec!["amd64".to_string(), "i386".to_string(), "all".to_string()]
    }

    pub fn fetch_timeout_secs() -> u64 {
        30
    }

    pub fn probe_timeout_secs() -> u64 {
        10
    }

    pub fn history_limit() -> usize {
        30
    }

    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }

    pub fn site_dir() -> PathBuf {
        PathBuf::from("public")
    }

    pub fn readme() -> PathBuf {
        PathBuf::from("README.md")
    }

    pub fn log_file() -> PathBuf {
        PathBuf::from("logs/lliurex-state.log")
    }

    pub fn remote() -> String {
        "origin".to_string()
    }

    pub fn default_true() -> bool {
        true
    }
}

impl Config {
    /// Read and validate a configuration file.
    pub fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: PathBuf::from("<string>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("mirror.base_url", &self.mirror.base_url)?;
        validate_releases("mirror.releases", &self.mirror.releases)?;

        if self.mirror.components.is_empty() {
            return Err(ConfigError::invalid("mirror.components", "must not be empty"));
        }
        if self.mirror.architectures.is_empty() {
            return Err(ConfigError::invalid(
                "mirror.architectures",
                "must not be empty",
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::invalid("fetch.timeout_secs", "must be positive"));
        }
        if self.probe.timeout_secs == 0 {
            return Err(ConfigError::invalid("probe.timeout_secs", "must be positive"));
        }
        if self.probe.history_limit == 0 {
            return Err(ConfigError::invalid("probe.history_limit", "must be positive"));
        }

        for vantage in Vantage::all() {
            let overrides = self.probe.vantage(*vantage);
            if let Some(url) = &overrides.base_url {
                validate_base_url(&format!("probe.{}.base_url", vantage), url)?;
            }
            if let Some(releases) = &overrides.releases {
                validate_releases(&format!("probe.{}.releases", vantage), releases)?;
            }
        }

        Ok(())
    }

    /// Mirror base URL as seen from `vantage`.
    pub fn base_url_for(&self, vantage: Vantage) -> &Url {
        self.probe
            .vantage(vantage)
            .base_url
            .as_ref()
            .unwrap_or(&self.mirror.base_url)
    }

    /// Releases probed from `vantage`.
    pub fn releases_for(&self, vantage: Vantage) -> &[String] {
        self.probe
            .vantage(vantage)
            .releases
            .as_deref()
            .unwrap_or(&self.mirror.releases)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_secs)
    }
}

impl ProbeConfig {
    /// Overrides for a vantage point.
    pub fn vantage(&self, vantage: Vantage) -> &VantageConfig {
        match vantage {
            Vantage::External => &self.external,
            Vantage::Local => &self.local,
        }
    }
}

fn validate_base_url(field: &str, url: &Url) -> Result<(), ConfigError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            field,
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(ConfigError::invalid(field, "must be an absolute URL with a host"));
    }
    Ok(())
}

fn validate_releases(field: &str, releases: &[String]) -> Result<(), ConfigError> {
    if releases.is_empty() {
        return Err(ConfigError::invalid(field, "must list at least one release"));
    }
    for release in releases {
        if release.is_empty() || release.contains('/') || release.contains(char::is_whitespace) {
            return Err(ConfigError::invalid(
                field,
                format!("'{}' is not a valid release codename", release),
            ));
        }
    }
    Ok(())
}
