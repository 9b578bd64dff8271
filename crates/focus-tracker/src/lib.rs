//! Stateful controller for a day of focus tracking.
//!
//! [`Tracker`] owns today's tasks, the single running timer, the daily target
//! and the archived history. Every mutation goes through its methods and is
//! written through to a [`KeyValueStore`] before the method returns.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use focus_core::{
    clock::Clock,
    history::{HistoryMap, DEFAULT_RETENTION_DAYS},
    stats::{self, GoalStatus, TrailingWindow},
    storage::KeyValueStore,
    tasks::Task,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub mod persist;
pub mod rollover;
pub mod timer;

pub use persist::{parse_budget_minutes, parse_target_hours, DEFAULT_TARGET_HOURS};
pub use rollover::RolloverOutcome;
pub use timer::TimerState;

/// Tunables that do not live in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Number of archived days to keep.
    pub retention_days: usize,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

/// Task list, timer, target and history backed by a `KeyValueStore`.
pub struct Tracker<S: KeyValueStore, C: Clock> {
    store: Arc<S>,
    clock: C,
    settings: TrackerSettings,
    tasks: Vec<Task>,
    history: HistoryMap,
    target_hours: f64,
    last_seen: Option<NaiveDate>,
    timer: TimerState,
}

impl<S: KeyValueStore, C: Clock> Tracker<S, C> {
    /// Load persisted state. Missing or malformed entries come back as
    /// defaults; only store I/O failures are errors.
    ///
    /// Callers should follow up with [`Tracker::rollover`] before using the
    /// task list.
    #[instrument(skip_all)]
    pub async fn open(store: S, clock: C, settings: TrackerSettings) -> Result<Self> {
        let store = Arc::new(store);
        let mut tasks = persist::load_tasks(&*store).await?;
        let history = persist::load_history(&*store).await?;
        let target_hours = persist::load_target(&*store).await?;
        let last_seen = persist::load_last_seen(&*store).await?;
        let timer = timer::recover(&mut tasks);

        debug!(
            tasks = tasks.len(),
            history_days = history.len(),
            target_hours,
            ?timer,
            "tracker state loaded"
        );

        Ok(Self {
            store,
            clock,
            settings,
            tasks,
            history,
            target_hours,
            last_seen,
            timer,
        })
    }

    /// Today's calendar date according to the tracker's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Create a task for today. Blank names are ignored and yield `None`.
    #[instrument(skip(self, description))]
    pub async fn add(
        &mut self,
        name: &str,
        description: Option<&str>,
        budget_minutes: u32,
    ) -> Result<Option<Task>> {
        let name = name.trim();
        if name.is_empty() {
            debug!("ignoring task with empty name");
            return Ok(None);
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let task = Task::new(
            name.to_string(),
            description,
            budget_minutes,
            self.clock.now(),
        );
        self.tasks.push(task.clone());
        self.save_tasks().await?;
        info!(id = %task.id, "task added");
        Ok(Some(task))
    }

    /// Delete a task, stopping its timer first if it is running. Returns
    /// `false` for unknown ids.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, id: Uuid) -> Result<bool> {
        let Some(index) = self.index_of(id) else {
            debug!("ignoring removal of unknown task");
            return Ok(false);
        };
        if self.timer.active() == Some(id) {
            self.halt();
        }
        self.tasks.remove(index);
        self.save_tasks().await?;
        info!("task removed");
        Ok(true)
    }

    /// Today's tasks, newest first.
    pub fn list(&self) -> Vec<&Task> {
        let mut sorted: Vec<&Task> = self.tasks.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        sorted
    }

    /// Today's tasks in storage order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Resolve a full id or a unique id prefix (as printed by the CLI).
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&Task> {
        let needle = prefix.trim().to_ascii_lowercase().replace('-', "");
        if needle.is_empty() {
            return None;
        }
        let mut matches = self
            .tasks
            .iter()
            .filter(|t| t.id.simple().to_string().starts_with(&needle));
        let first = matches.next()?;
        matches.next().is_none().then_some(first)
    }

    pub fn history(&self) -> &HistoryMap {
        &self.history
    }

    /// Tasks for `date`: the live list for today, the archived snapshot for
    /// earlier days, empty otherwise.
    pub fn day_tasks(&self, date: NaiveDate) -> &[Task] {
        if date == self.today() {
            &self.tasks
        } else {
            self.history.get(&date).map(Vec::as_slice).unwrap_or(&[])
        }
    }

    pub fn target_hours(&self) -> f64 {
        self.target_hours
    }

    /// Replace the daily target. Unusable values fall back to the default.
    /// Returns the value that was stored.
    #[instrument(skip(self))]
    pub async fn set_target_hours(&mut self, hours: f64) -> Result<f64> {
        self.target_hours = persist::sanitize_target_hours(hours);
        persist::save_target(&*self.store, self.target_hours).await?;
        info!(target_hours = self.target_hours, "daily target updated");
        Ok(self.target_hours)
    }

    pub fn total_today(&self) -> u64 {
        stats::total_elapsed(&self.tasks)
    }

    pub fn progress(&self) -> Option<f64> {
        stats::progress_fraction(self.total_today(), self.target_hours)
    }

    pub fn goal_status(&self) -> GoalStatus {
        stats::remaining(self.total_today(), self.target_hours)
    }

    /// Per-day totals for the `days` days ending today.
    pub fn window(&self, days: usize) -> TrailingWindow<'_> {
        stats::trailing_window(self.today(), days, &self.tasks, &self.history)
    }

    fn index_of(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    async fn save_tasks(&self) -> Result<()> {
        persist::save_tasks(&*self.store, &self.tasks).await
    }
}


#[cfg(test)]
mod tests {
    use chrono::Duration;
    use focus_core::{format::format_duration, storage::InMemoryStore};

    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn add_rejects_blank_names() {
        let store = InMemoryStore::new();
        let (mut tracker, _) = tracker_at(store.clone(), morning()).await;

        assert!(tracker.add("   ", None, 10).await.expect("add").is_none());
        assert!(tracker.tasks().is_empty());
        assert!(store.get(persist::TASKS_KEY).await.is_err());
    }

    #[tokio::test]
    async fn add_trims_and_persists() {
        let store = InMemoryStore::new();
        let (mut tracker, _) = tracker_at(store.clone(), morning()).await;

        let task = tracker
            .add("  Read  ", Some("  "), 30)
            .await
            .expect("add")
            .expect("task created");
        assert_eq!(task.name, "Read");
        assert_eq!(task.description, None);
        assert_eq!(task.elapsed_ms, 0);
        assert_eq!(task.created_at, morning());

        let stored = persist::load_tasks(&store).await.expect("load");
        assert_eq!(stored, vec![task]);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (mut tracker, clock) = tracker_at(InMemoryStore::new(), morning()).await;
        for name in ["first", "second", "third"] {
            tracker.add(name, None, 0).await.expect("add");
            clock.advance(Duration::seconds(1));
        }

        let names: Vec<&str> = tracker.list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn remove_unknown_is_noop() {
        let (mut tracker, _) = tracker_at(InMemoryStore::new(), morning()).await;
        tracker.add("Keep", None, 0).await.expect("add");

        assert!(!tracker.remove(Uuid::new_v4()).await.expect("remove"));
        assert_eq!(tracker.tasks().len(), 1);
    }

    #[tokio::test]
    async fn removing_running_task_stops_timer() {
        let (mut tracker, clock) = tracker_at(InMemoryStore::new(), morning()).await;
        let task = tracker.add("Drop me", None, 0).await.expect("add").unwrap();
        tracker.start(task.id).await.expect("start");
        clock.advance(Duration::seconds(5));

        assert!(tracker.remove(task.id).await.expect("remove"));
        assert_eq!(tracker.timer(), TimerState::Idle);
        assert!(tracker.active_task().is_none());
        assert!(tracker.tasks().is_empty());
    }

    #[tokio::test]
    async fn prefix_lookup_requires_unique_match() {
        let (mut tracker, _) = tracker_at(InMemoryStore::new(), morning()).await;
        let task = tracker.add("Find", None, 0).await.expect("add").unwrap();

        assert_eq!(
            tracker.find_by_prefix(&task.short_id()).map(|t| t.id),
            Some(task.id)
        );
        assert_eq!(
            tracker.find_by_prefix(&task.id.to_string()).map(|t| t.id),
            Some(task.id)
        );
        assert!(tracker.find_by_prefix("").is_none());
        assert!(tracker.find_by_prefix("zzzz").is_none());
    }

    #[tokio::test]
    async fn target_defaults_and_persists() {
        let store = InMemoryStore::new();
        let (mut tracker, _) = tracker_at(store.clone(), morning()).await;
        assert_eq!(tracker.target_hours(), DEFAULT_TARGET_HOURS);

        assert_eq!(tracker.set_target_hours(6.0).await.expect("set"), 6.0);
        assert_eq!(tracker.set_target_hours(0.0).await.expect("set"), 4.0);
        assert_eq!(tracker.set_target_hours(2.5).await.expect("set"), 2.5);

        let (reopened, _) = tracker_at(store, morning()).await;
        assert_eq!(reopened.target_hours(), 2.5);
    }

    #[tokio::test]
    async fn goal_remaining_and_achieved() {
        let (mut tracker, clock) = tracker_at(InMemoryStore::new(), morning()).await;
        let task = tracker.add("Deep work", None, 0).await.expect("add").unwrap();
        tracker.start(task.id).await.expect("start");
        clock.advance(Duration::hours(3));
        tracker.tick().await.expect("tick");

        assert_eq!(tracker.goal_status().to_string(), "01:00:00 left to hit goal");
        assert_eq!(tracker.progress(), Some(0.75));

        clock.advance(Duration::hours(2));
        tracker.stop().await.expect("stop");
        assert_eq!(tracker.goal_status(), GoalStatus::Achieved);
        assert_eq!(tracker.progress(), Some(1.0));
    }

    #[tokio::test]
    async fn read_scenario_ninety_seconds() {
        let (mut tracker, clock) = tracker_at(InMemoryStore::new(), morning()).await;
        let task = tracker.add("Read", None, 30).await.expect("add").unwrap();
        assert_eq!(task.elapsed_ms, 0);

        tracker.start(task.id).await.expect("start");
        for _ in 0..90 {
            clock.advance(Duration::seconds(1));
            tracker.tick().await.expect("tick");
        }

        let read = tracker.get(task.id).expect("task");
        assert_eq!(read.elapsed_ms, 90_000);
        assert_eq!(format_duration(read.elapsed_ms), "00:01:30");
        assert_eq!(stats::budget_progress(read), Some(0.05));
    }

    #[tokio::test]
    async fn day_tasks_reads_live_or_archived() {
        let (mut tracker, _) = tracker_at(InMemoryStore::new(), morning()).await;
        tracker.add("Live", None, 0).await.expect("add");
        let yesterday = tracker.today().pred_opt().unwrap();

        assert_eq!(tracker.day_tasks(tracker.today()).len(), 1);
        assert!(tracker.day_tasks(yesterday).is_empty());
    }
}
