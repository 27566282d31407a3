//! File-backed state: snapshots, change timestamps and status reports.
//!
//! Layout under the data directory:
//!
//! ```text
//! snapshots/<release>.json
//! change_timestamps.json
//! status/<vantage>.json
//! history/<vantage>.json
//! ```
//!
//! Every file is replaced whole through a temporary file in the same
//! directory, and left untouched when its contents would not change.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::{ChangeTimestampIndex, ReleaseSnapshot, StatusReport, Vantage};

/// Errors reading or writing the state files.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' does not contain valid state: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a write did to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written)
    }
}

/// Replace `path` with `contents` unless it already holds exactly those bytes.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> Result<WriteOutcome, StoreError> {
    match std::fs::read(path) {
        Ok(existing) if existing == contents => {
            debug!("{} unchanged", path.display());
            return Ok(WriteOutcome::Unchanged);
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(StoreError::io(path, e)),
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;

    debug!("wrote {}", path.display());
    Ok(WriteOutcome::Written)
}

/// Serialize `value` the way every state file is laid out on disk.
pub fn to_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<WriteOutcome, StoreError> {
    write_if_changed(path, &to_json_bytes(value)?)
}

/// The state directory.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self, release: &str) -> PathBuf {
        self.root.join("snapshots").join(format!("{}.json", release))
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("change_timestamps.json")
    }

    pub fn status_path(&self, vantage: Vantage) -> PathBuf {
        self.root.join("status").join(format!("{}.json", vantage))
    }

    pub fn history_path(&self, vantage: Vantage) -> PathBuf {
        self.root.join("history").join(format!("{}.json", vantage))
    }

    /// The stored snapshot of `release`; empty if none was ever stored.
    pub fn load_snapshot(&self, release: &str) -> Result<ReleaseSnapshot, StoreError> {
        Ok(read_json(&self.snapshot_path(release))?.unwrap_or_default())
    }

    pub fn save_snapshot(
        &self,
        release: &str,
        snapshot: &ReleaseSnapshot,
    ) -> Result<WriteOutcome, StoreError> {
        write_json(&self.snapshot_path(release), snapshot)
    }

    pub fn load_index(&self) -> Result<ChangeTimestampIndex, StoreError> {
        Ok(read_json(&self.index_path())?.unwrap_or_default())
    }

    pub fn save_index(&self, index: &ChangeTimestampIndex) -> Result<WriteOutcome, StoreError> {
        write_json(&self.index_path(), index)
    }

    pub fn load_status(&self, vantage: Vantage) -> Result<Option<StatusReport>, StoreError> {
        read_json(&self.status_path(vantage))
    }

    pub fn save_status(&self, report: &StatusReport) -> Result<WriteOutcome, StoreError> {
        write_json(&self.status_path(report.vantage), report)
    }

    /// Past reports of `vantage`, oldest first.
    pub fn load_history(&self, vantage: Vantage) -> Result<Vec<StatusReport>, StoreError> {
        Ok(read_json(&self.history_path(vantage))?.unwrap_or_default())
    }

    pub fn save_history(
        &self,
        vantage: Vantage,
        history: &[StatusReport],
    ) -> Result<WriteOutcome, StoreError> {
        write_json(&self.history_path(vantage), &history)
    }
}
