use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One focus activity tracked for the current day.
///
/// Every field carries a serde default so that partially written or older
/// records still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Target duration for the progress bar; 0 means no target.
    #[serde(default)]
    pub budget_minutes: u32,
    /// Accumulated active time in milliseconds.
    #[serde(default)]
    pub elapsed_ms: u64,
    /// Set only while this task owns the running timer.
    #[serde(default)]
    pub last_started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        name: String,
        description: Option<String>,
        budget_minutes: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            budget_minutes,
            elapsed_ms: 0,
            last_started: None,
            created_at: now,
        }
    }

    pub fn is_running(&self) -> bool {
        self.last_started.is_some()
    }

    /// Budget expressed in milliseconds, `None` when the task has no target.
    pub fn budget_ms(&self) -> Option<u64> {
        (self.budget_minutes > 0).then(|| u64::from(self.budget_minutes) * 60_000)
    }

    /// Fold the wall-clock time since `last_started` into `elapsed_ms` and move
    /// the anchor to `now`. Returns the accrued delta.
    ///
    /// A clock that stepped backwards accrues nothing, so `elapsed_ms` never
    /// decreases.
    pub fn accrue(&mut self, now: DateTime<Utc>) -> u64 {
        let Some(anchor) = self.last_started else {
            return 0;
        };
        let delta = u64::try_from((now - anchor).num_milliseconds()).unwrap_or(0);
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta);
        self.last_started = Some(now);
        delta
    }

    /// Clear per-day progress while keeping the task itself.
    pub fn reset_day(&mut self) {
        self.elapsed_ms = 0;
        self.last_started = None;
    }

    /// First eight characters of the id, enough to address a task from the CLI.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}
