//! Status change detection and the per vantage point report history.

use tracing::info;

use crate::model::StatusReport;
use crate::store::{Store, StoreError, WriteOutcome};

/// Describe how `current` differs from `previous`, one line per change.
///
/// Only the reachability state, the HTTP code and the repository update
/// time count; `checked_at` and error wording do not. An empty result
/// means nothing worth recording happened.
pub fn changes(previous: Option<&StatusReport>, current: &StatusReport) -> Vec<String> {
    let Some(previous) = previous else {
        return current
            .repos
            .keys()
            .map(|release| format!("{}: first observation", release))
            .collect();
    };

    let mut lines = Vec::new();
    for (release, now) in &current.repos {
        let Some(before) = previous.repos.get(release) else {
            lines.push(format!("{}: new repository", release));
            continue;
        };
        if before.same_state(now) {
            continue;
        }
        if before.status != now.status {
            lines.push(format!(
                "{}: status changed from {} to {}",
                release, before.status, now.status
            ));
        }
        if before.http_code != now.http_code {
            lines.push(format!(
                "{}: HTTP code changed from {} to {}",
                release,
                display_code(before.http_code),
                display_code(now.http_code)
            ));
        }
        if before.repo_last_updated != now.repo_last_updated {
            lines.push(format!("{}: repository updated", release));
        }
    }

    for release in previous.repos.keys() {
        if !current.repos.contains_key(release) {
            lines.push(format!("{}: repository removed", release));
        }
    }

    lines
}

fn display_code(code: Option<u16>) -> String {
    code.map_or_else(|| "none".to_string(), |code| code.to_string())
}

/// What [`record`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub changes: Vec<String>,
    pub status: WriteOutcome,
    pub history: WriteOutcome,
}

impl RecordOutcome {
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Persist `report` if it differs meaningfully from the stored one.
///
/// On a change the status file is replaced and the report appended to the
/// history, which is then trimmed to its newest `limit` entries. Otherwise
/// nothing is written.
pub fn record(
    store: &Store,
    report: &StatusReport,
    limit: usize,
) -> Result<RecordOutcome, StoreError> {
    let previous = store.load_status(report.vantage)?;
    let changes = changes(previous.as_ref(), report);

    if changes.is_empty() {
        info!("{}: no state changes", report.vantage);
        return Ok(RecordOutcome {
            changes,
            status: WriteOutcome::Unchanged,
            history: WriteOutcome::Unchanged,
        });
    }

    for line in &changes {
        info!("{}: {}", report.vantage, line);
    }

    let mut history = store.load_history(report.vantage)?;
    history.push(report.clone());
    trim(&mut history, limit);

    let status = store.save_status(report)?;
    let history = store.save_history(report.vantage, &history)?;
    Ok(RecordOutcome {
        changes,
        status,
        history,
    })
}

/// Keep only the newest `limit` reports.
pub fn trim(history: &mut Vec<StatusReport>, limit: usize) {
    if history.len() > limit {
        history.drain(..history.len() - limit);
    }
}
