//! Single-active-timer state machine.
//!
//! At most one task carries `last_started`, and that task is the one named by
//! [`TimerState::Running`]. Starting a task while another runs stops the other
//! first, so callers cannot break the invariant.

use anyhow::Result;
use chrono::{DateTime, Utc};
use focus_core::{clock::Clock, storage::KeyValueStore, tasks::Task};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::Tracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running {
        task_id: Uuid,
    },
}

impl TimerState {
    pub fn active(&self) -> Option<Uuid> {
        match self {
            TimerState::Idle => None,
            TimerState::Running { task_id } => Some(*task_id),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running { .. })
    }
}

/// Rebuild the timer state from persisted ownership markers. If more than one
/// task claims the timer, the most recently started one keeps it.
pub(crate) fn recover(tasks: &mut [Task]) -> TimerState {
    let owner = tasks
        .iter()
        .filter_map(|t| t.last_started.map(|at| (at, t.id)))
        .max()
        .map(|(_, id)| id);

    let Some(owner) = owner else {
        return TimerState::Idle;
    };
    for task in tasks.iter_mut().filter(|t| t.id != owner && t.is_running()) {
        warn!(id = %task.id, "clearing stale timer marker");
        task.last_started = None;
    }
    TimerState::Running { task_id: owner }
}

impl<S: KeyValueStore, C: Clock> Tracker<S, C> {
    pub fn timer(&self) -> TimerState {
        self.timer
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.timer.active().and_then(|id| self.get(id))
    }

    /// Run the timer for `id`, stopping whichever task was running. Unknown ids
    /// are ignored and return `false`.
    #[instrument(skip(self))]
    pub async fn start(&mut self, id: Uuid) -> Result<bool> {
        let Some(index) = self.index_of(id) else {
            debug!("ignoring start for unknown task");
            return Ok(false);
        };
        if self.timer.active() == Some(id) {
            return Ok(true);
        }

        self.halt();
        self.tasks[index].last_started = Some(self.clock.now());
        self.timer = TimerState::Running { task_id: id };
        self.save_tasks().await?;
        info!("timer started");
        Ok(true)
    }

    /// Stop the running timer with a final accrual. Returns `false` when the
    /// timer was already idle.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<bool> {
        let Some(id) = self.halt() else {
            return Ok(false);
        };
        self.save_tasks().await?;
        info!(%id, "timer stopped");
        Ok(true)
    }

    /// Fold wall-clock time since the last tick into the running task.
    /// Returns the accrued milliseconds; idle ticks do nothing.
    #[instrument(skip(self), level = "trace")]
    pub async fn tick(&mut self) -> Result<u64> {
        let Some(id) = self.timer.active() else {
            return Ok(0);
        };
        let now = self.accrual_now();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            self.timer = TimerState::Idle;
            return Ok(0);
        };
        let delta = task.accrue(now);
        self.save_tasks().await?;
        Ok(delta)
    }

    /// Final accrual and transition to idle, without persisting. Returns the
    /// task that was running.
    pub(crate) fn halt(&mut self) -> Option<Uuid> {
        let at = self.accrual_now();
        let id = flush(&mut self.tasks, self.timer, at);
        self.timer = TimerState::Idle;
        id
    }

    /// Latest instant that may be credited to the live task list. While a
    /// day change is waiting to be archived, accrual stops at the end of the
    /// last recorded day.
    pub(crate) fn accrual_now(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        match self.last_seen {
            Some(last) if last < self.clock.today() => now.min(self.clock.day_end(last)),
            _ => now,
        }
    }
}

/// Accrue the running task up to `at` and clear its marker. Returns the task
/// that was running.
pub(crate) fn flush(tasks: &mut [Task], timer: TimerState, at: DateTime<Utc>) -> Option<Uuid> {
    let id = timer.active()?;
    if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
        task.accrue(at);
        task.last_started = None;
    }
    Some(id)
}
