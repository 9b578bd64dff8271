//! Read-only aggregates over live tasks and archived history.

use std::fmt;

use chrono::{Days, NaiveDate};

use crate::{format::format_duration, history::HistoryMap, tasks::Task};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Sum of `elapsed_ms` across a task list.
pub fn total_elapsed(tasks: &[Task]) -> u64 {
    tasks
        .iter()
        .fold(0u64, |acc, t| acc.saturating_add(t.elapsed_ms))
}

/// Share of the daily target reached, saturating at 1.0.
///
/// Returns `None` when the target is zero, negative or not finite.
pub fn progress_fraction(total_ms: u64, target_hours: f64) -> Option<f64> {
    target_ms(target_hours).map(|target| (total_ms as f64 / target).min(1.0))
}

/// Share of a task's own budget reached, `None` for tasks without a budget.
pub fn budget_progress(task: &Task) -> Option<f64> {
    task.budget_ms()
        .map(|budget| (task.elapsed_ms as f64 / budget as f64).min(1.0))
}

/// Distance to the daily target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    /// Milliseconds still to go.
    Remaining(u64),
    Achieved,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::Remaining(ms) => write!(f, "{} left to hit goal", format_duration(*ms)),
            GoalStatus::Achieved => f.write_str("Daily goal achieved!"),
        }
    }
}

/// How far `total_ms` is from the target. A missing target counts as achieved.
pub fn remaining(total_ms: u64, target_hours: f64) -> GoalStatus {
    let Some(target) = target_ms(target_hours) else {
        return GoalStatus::Achieved;
    };
    let left = target - total_ms as f64;
    if left > 0.0 {
        GoalStatus::Remaining(left.ceil() as u64)
    } else {
        GoalStatus::Achieved
    }
}

fn target_ms(target_hours: f64) -> Option<f64> {
    (target_hours.is_finite() && target_hours > 0.0).then(|| target_hours * MS_PER_HOUR)
}

/// One bar of the trailing-window chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total_ms: u64,
    pub is_today: bool,
}

/// Lazy sequence of `len` consecutive days ending at `today`, oldest first.
/// Clone it to iterate again from the start.
#[derive(Debug, Clone)]
pub struct TrailingWindow<'a> {
    today: NaiveDate,
    live: &'a [Task],
    history: &'a HistoryMap,
    len: usize,
    pos: usize,
}

/// Build the chart window. Today's total comes from `live`, earlier days from
/// `history`, and days with no snapshot count as zero.
pub fn trailing_window<'a>(
    today: NaiveDate,
    len: usize,
    live: &'a [Task],
    history: &'a HistoryMap,
) -> TrailingWindow<'a> {
    TrailingWindow {
        today,
        live,
        history,
        len,
        pos: 0,
    }
}

impl Iterator for TrailingWindow<'_> {
    type Item = DayTotal;

    fn next(&mut self) -> Option<DayTotal> {
        if self.pos >= self.len {
            return None;
        }
        let back = (self.len - 1 - self.pos) as u64;
        self.pos += 1;

        let date = self.today.checked_sub_days(Days::new(back))?;
        let is_today = date == self.today;
        let total_ms = if is_today {
            total_elapsed(self.live)
        } else {
            self.history
                .get(&date)
                .map(|snapshot| total_elapsed(snapshot))
                .unwrap_or(0)
        };
        Some(DayTotal {
            date,
            total_ms,
            is_today,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.pos;
        (left, Some(left))
    }
}

impl ExactSizeIterator for TrailingWindow<'_> {}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn task(elapsed_ms: u64) -> Task {
        let mut t = Task::new(
            "t".into(),
            None,
            0,
            Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
        );
        t.elapsed_ms = elapsed_ms;
        t
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn total_is_sum_of_elapsed() {
        let tasks = vec![task(1_000), task(2_500), task(0)];
        assert_eq!(total_elapsed(&tasks), 3_500);
        assert_eq!(total_elapsed(&[]), 0);
    }

    #[test]
    fn adding_an_empty_task_keeps_total() {
        let mut tasks = vec![task(42_000)];
        let before = total_elapsed(&tasks);
        tasks.push(task(0));
        assert_eq!(total_elapsed(&tasks), before);
    }

    #[test]
    fn progress_saturates_at_one() {
        assert_eq!(progress_fraction(5 * 3_600_000, 4.0), Some(1.0));
        assert_eq!(progress_fraction(3_600_000, 4.0), Some(0.25));
    }

    #[test]
    fn zero_or_invalid_target_has_no_fraction() {
        assert_eq!(progress_fraction(1_000, 0.0), None);
        assert_eq!(progress_fraction(1_000, -2.0), None);
        assert_eq!(progress_fraction(1_000, f64::NAN), None);
    }

    #[test]
    fn budget_progress_against_thirty_minutes() {
        let mut read = task(90_000);
        read.budget_minutes = 30;
        assert_eq!(budget_progress(&read), Some(0.05));

        read.elapsed_ms = 45 * 60_000;
        assert_eq!(budget_progress(&read), Some(1.0));

        read.budget_minutes = 0;
        assert_eq!(budget_progress(&read), None);
    }

    #[test]
    fn one_hour_left_of_four() {
        let status = remaining(3 * 3_600_000, 4.0);
        assert_eq!(status, GoalStatus::Remaining(3_600_000));
        assert_eq!(status.to_string(), "01:00:00 left to hit goal");
    }

    #[test]
    fn overshoot_reports_achieved_not_negative() {
        assert_eq!(remaining(5 * 3_600_000, 4.0), GoalStatus::Achieved);
        assert_eq!(remaining(4 * 3_600_000, 4.0), GoalStatus::Achieved);
        assert_eq!(remaining(0, 0.0), GoalStatus::Achieved);
    }

    #[test]
    fn window_is_oldest_first_and_mixes_sources() {
        let live = vec![task(7_000)];
        let mut history = HistoryMap::new();
        history.insert(date(8), vec![task(1_000), task(2_000)]);
        history.insert(date(2), vec![task(99_000)]);

        let bars: Vec<DayTotal> = trailing_window(date(10), 7, &live, &history).collect();

        assert_eq!(bars.len(), 7);
        assert_eq!(bars[0].date, date(4));
        assert_eq!(bars[6].date, date(10));
        assert!(bars[6].is_today);
        assert_eq!(bars[6].total_ms, 7_000);
        assert_eq!(bars[4].total_ms, 3_000);
        assert!(bars[..6].iter().all(|b| !b.is_today));
        assert_eq!(bars.iter().map(|b| b.total_ms).sum::<u64>(), 10_000);
    }

    #[test]
    fn window_is_restartable_and_sized() {
        let history = HistoryMap::new();
        let window = trailing_window(date(30), 30, &[], &history);
        assert_eq!(window.len(), 30);

        let first: Vec<NaiveDate> = window.clone().map(|b| b.date).collect();
        let second: Vec<NaiveDate> = window.map(|b| b.date).collect();
        assert_eq!(first, second);
        assert_eq!(first[0], date(1));
    }

    #[test]
    fn empty_window_yields_nothing() {
        let history = HistoryMap::new();
        assert_eq!(trailing_window(date(1), 0, &[], &history).count(), 0);
    }
}
