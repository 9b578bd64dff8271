use anyhow::Result;
use chrono::NaiveDate;
use focus_core::{clock::Clock, history, storage::KeyValueStore};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{persist, timer, TimerState, Tracker};

/// What a rollover check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverOutcome {
    /// No previous date was recorded; nothing archived.
    FirstRun,
    /// Still the same day as the last check.
    SameDay,
    /// The previous day was archived and daily progress reset.
    Archived {
        date: NaiveDate,
        /// Task whose running timer was flushed and stopped.
        stopped: Option<Uuid>,
    },
}

impl<S: KeyValueStore, C: Clock> Tracker<S, C> {
    /// Detect a change of calendar day since the last check.
    ///
    /// On a new day the running timer is flushed up to the end of the
    /// previous day and stopped, the task list is archived under the previous
    /// date, history is pruned to the retention window, and every task's
    /// elapsed time is reset. Tasks themselves are kept. Safe to call on
    /// every tick.
    ///
    /// The new state is built aside and only adopted once every write has
    /// succeeded, so a failed rollover leaves the tracker as it was and the
    /// next call starts over.
    #[instrument(skip(self))]
    pub async fn rollover(&mut self) -> Result<RolloverOutcome> {
        let today = self.clock.today();
        let last = match self.last_seen {
            Some(last) if last == today => return Ok(RolloverOutcome::SameDay),
            None => {
                persist::save_last_seen(&*self.store, today).await?;
                self.last_seen = Some(today);
                return Ok(RolloverOutcome::FirstRun);
            }
            Some(last) => last,
        };

        let mut tasks = self.tasks.clone();
        let stopped = timer::flush(&mut tasks, self.timer, self.accrual_now());
        let mut history = self.history.clone();
        history::archive(&mut history, last, &tasks, self.settings.retention_days);
        for task in &mut tasks {
            task.reset_day();
        }

        persist::save_history(&*self.store, &history).await?;
        persist::save_tasks(&*self.store, &tasks).await?;
        persist::save_last_seen(&*self.store, today).await?;

        self.tasks = tasks;
        self.history = history;
        self.timer = TimerState::Idle;
        self.last_seen = Some(today);
        info!(%last, %today, ?stopped, "archived previous day");
        Ok(RolloverOutcome::Archived {
            date: last,
            stopped,
        })
    }
}
