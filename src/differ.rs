//! Change tracking between two snapshots of a release.
//!
//! A package's change timestamp moves only when its version or size
//! differs from the previous snapshot, so the recorded time reflects when
//! the mirror changed rather than when it was last fetched.
//!
//! Packages that disappear from the mirror are dropped from the index
//! outright; no tombstone is kept.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::model::{ChangeTimestampIndex, ReleaseSnapshot};

/// The outcome of comparing a fresh snapshot with the stored one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    /// Change timestamps for every package of the new snapshot.
    pub timestamps: BTreeMap<String, DateTime<Utc>>,
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: usize,
}

impl DiffOutcome {
    /// Whether the release differs from the stored snapshot at all.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.changed.is_empty() || !self.removed.is_empty()
    }
}

/// Compute the change timestamps of `release` after observing `new`.
///
/// `now` is the time the new snapshot was fetched.
pub fn diff_release(
    release: &str,
    old: &ReleaseSnapshot,
    new: &ReleaseSnapshot,
    index: &ChangeTimestampIndex,
    now: DateTime<Utc>,
) -> DiffOutcome {
    let mut outcome = DiffOutcome::default();

    for (name, record) in new.iter() {
        let changed_at = match old.get(name) {
            None => {
                outcome.added.push(name.clone());
                now
            }
            Some(previous) if !previous.same_content(record) => {
                outcome.changed.push(name.clone());
                now
            }
            Some(_) => {
                outcome.unchanged += 1;
                // A lost index entry restarts the clock for that package.
                index.get(release, name).unwrap_or(now)
            }
        };
        outcome.timestamps.insert(name.clone(), changed_at);
    }

    outcome.removed = old
        .iter()
        .filter(|(name, _)| !new.contains(name))
        .map(|(name, _)| name.clone())
        .collect();

    outcome
}

/// Diff `release` and fold the result into `index`, replacing every entry
/// of that release.
pub fn apply(
    release: &str,
    old: &ReleaseSnapshot,
    new: &ReleaseSnapshot,
    index: &mut ChangeTimestampIndex,
    now: DateTime<Utc>,
) -> DiffOutcome {
    let outcome = diff_release(release, old, new, index, now);
    index.replace_release(
        release,
        outcome
            .timestamps
            .iter()
            .map(|(name, changed_at)| (name.clone(), *changed_at)),
    );
    outcome
}
