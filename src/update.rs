//! One run of each scheduled job, minus the command line.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::differ;
use crate::fetcher::Fetcher;
use crate::history::{self, RecordOutcome};
use crate::prober::Prober;
use crate::store::{Store, StoreError, WriteOutcome};

/// Per release result of [`update_packages`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseUpdate {
    Updated {
        added: usize,
        changed: usize,
        removed: usize,
        snapshot: WriteOutcome,
    },
    /// The fetch failed; the stored snapshot and timestamps were kept.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSummary {
    pub releases: Vec<(String, ReleaseUpdate)>,
    pub index: WriteOutcome,
}

impl UpdateSummary {
    pub fn failed(&self) -> usize {
        self.releases
            .iter()
            .filter(|(_, update)| matches!(update, ReleaseUpdate::Failed { .. }))
            .count()
    }

    /// Whether any file in the store was rewritten.
    pub fn wrote_anything(&self) -> bool {
        self.index.is_written()
            || self.releases.iter().any(|(_, update)| {
                matches!(update, ReleaseUpdate::Updated { snapshot, .. } if snapshot.is_written())
            })
    }
}

/// Fetch every release, track package changes and persist the result.
///
/// All fetches, snapshot loads and diffs complete before anything is
/// written. A release that fails to fetch keeps its previous snapshot and
/// change timestamps. The index is saved before the snapshots: a write that
/// fails later leaves an old snapshot behind, which makes the next run
/// detect the change again instead of losing it.
///
/// Index entries of releases not in `releases` are dropped. Their snapshot
/// files are left in place.
pub async fn update_packages(
    fetcher: &Fetcher,
    store: &Store,
    releases: &[String],
    now: DateTime<Utc>,
) -> Result<UpdateSummary, StoreError> {
    let mut index = store.load_index()?;
    let results = fetcher.fetch_all(releases).await;

    let mut fetched = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for (release, result) in results {
        match result {
            Ok(snapshot) => {
                let old = store.load_snapshot(&release)?;
                fetched.push((release, old, snapshot));
            }
            Err(e) => {
                warn!(
                    "{}: {} error, keeping previous snapshot: {}",
                    release,
                    e.kind(),
                    e
                );
                failed.push((release, e.to_string()));
            }
        }
    }

    let dropped = index.retain_releases(releases);
    if dropped > 0 {
        info!("Dropped {} timestamps of unconfigured releases", dropped);
    }

    let outcomes: Vec<_> = fetched
        .into_iter()
        .map(|(release, old, snapshot)| {
            let outcome = differ::apply(&release, &old, &snapshot, &mut index, now);
            info!(
                "{}: {} added, {} changed, {} removed, {} unchanged",
                release,
                outcome.added.len(),
                outcome.changed.len(),
                outcome.removed.len(),
                outcome.unchanged
            );
            (release, snapshot, outcome)
        })
        .collect();

    let index = store.save_index(&index)?;

    let mut updates = BTreeMap::new();
    for (release, snapshot, outcome) in outcomes {
        let written = store.save_snapshot(&release, &snapshot)?;
        updates.insert(
            release,
            ReleaseUpdate::Updated {
                added: outcome.added.len(),
                changed: outcome.changed.len(),
                removed: outcome.removed.len(),
                snapshot: written,
            },
        );
    }
    for (release, error) in failed {
        updates.insert(release, ReleaseUpdate::Failed { error });
    }

    let summary = releases
        .iter()
        .filter_map(|release| updates.remove_entry(release))
        .collect();
    Ok(UpdateSummary {
        releases: summary,
        index,
    })
}

/// Probe the mirror from one vantage point and record meaningful changes.
pub async fn update_status(
    prober: &Prober,
    store: &Store,
    history_limit: usize,
) -> Result<RecordOutcome, StoreError> {
    let report = prober.probe_all().await;
    history::record(store, &report, history_limit)
}
