//! Archived end-of-day task snapshots keyed by calendar date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::tasks::Task;

/// Days kept in the history map when nothing else is configured.
pub const DEFAULT_RETENTION_DAYS: usize = 7;

/// Full task-list snapshot per archived day. Ordered by date so that pruning
/// and chart lookups never depend on string formatting.
pub type HistoryMap = BTreeMap<NaiveDate, Vec<Task>>;

/// Store a deep copy of `tasks` under `date` and drop the oldest days beyond
/// `retain`. An existing snapshot for the same date is replaced.
pub fn archive(history: &mut HistoryMap, date: NaiveDate, tasks: &[Task], retain: usize) {
    history.insert(date, tasks.to_vec());
    prune(history, retain);
}

/// Keep only the `retain` most recent dates.
pub fn prune(history: &mut HistoryMap, retain: usize) {
    while history.len() > retain {
        history.pop_first();
    }
}
