use std::fmt::Write as _;

use chrono::NaiveDate;
use color_eyre::Result;
use focus_core::{
    clock::Clock,
    format::{format_duration, format_hours},
    stats::{progress_fraction, total_elapsed, DayTotal},
    storage::KeyValueStore,
};
use focus_tracker::{parse_target_hours, Tracker};

use crate::{cli::TargetCommand, config::Config, storage, tasks::render_task, to_eyre};

const BAR_WIDTH: usize = 24;

pub async fn status(config: &Config) -> Result<()> {
    let tracker = storage::open_tracker(config).await?;
    print!("{}", render_status(&tracker));
    Ok(())
}

pub async fn target(action: Option<TargetCommand>, config: &Config) -> Result<()> {
    let mut tracker = storage::open_tracker(config).await?;
    match action.unwrap_or(TargetCommand::Show) {
        TargetCommand::Show => println!("Daily target: {}h", tracker.target_hours()),
        TargetCommand::Set { hours } => {
            let stored = tracker
                .set_target_hours(parse_target_hours(&hours))
                .await
                .map_err(to_eyre)?;
            println!("Daily target set to {stored}h");
        }
    }
    Ok(())
}

pub async fn history(days: Option<usize>, date: Option<NaiveDate>, config: &Config) -> Result<()> {
    let tracker = storage::open_tracker(config).await?;
    match date {
        Some(date) => print!("{}", render_day(&tracker, date)),
        None => print!(
            "{}",
            render_window(&tracker, days.unwrap_or(config.tracker.chart_days))
        ),
    }
    Ok(())
}

/// Today's total against the target plus the running timer.
pub fn render_status<S: KeyValueStore, C: Clock>(tracker: &Tracker<S, C>) -> String {
    let total = tracker.total_today();
    let mut out = String::new();
    let _ = writeln!(out, "Today ({})", tracker.today());
    let _ = write!(
        out,
        "Total {} of {}h",
        format_duration(total),
        tracker.target_hours()
    );
    if let Some(progress) = tracker.progress() {
        let _ = write!(out, " ({:.0}%)", progress * 100.0);
    }
    out.push('\n');
    let _ = writeln!(out, "{}", tracker.goal_status());
    match tracker.active_task() {
        Some(task) => {
            let _ = writeln!(
                out,
                "Running: {} ({})",
                task.name,
                format_duration(task.elapsed_ms)
            );
        }
        None => out.push_str("No timer running.\n"),
    }
    out
}

/// Text bar chart of per-day totals, oldest first.
pub fn render_window<S: KeyValueStore, C: Clock>(tracker: &Tracker<S, C>, days: usize) -> String {
    let target = tracker.target_hours();
    let mut out = String::new();
    for day in tracker.window(days) {
        let _ = writeln!(out, "{}", bar_line(&day, target));
    }
    out
}

fn bar_line(day: &DayTotal, target_hours: f64) -> String {
    let fraction = progress_fraction(day.total_ms, target_hours).unwrap_or(0.0);
    let mut filled = (fraction * BAR_WIDTH as f64).round() as usize;
    if day.total_ms > 0 {
        filled = filled.max(1);
    }
    let bar: String = "█".repeat(filled) + &"░".repeat(BAR_WIDTH - filled);
    let marker = if day.is_today { " ◀ today" } else { "" };
    format!(
        "{} {}  {bar} {:>6}{marker}",
        day.date.format("%a"),
        day.date,
        format_hours(day.total_ms)
    )
}

/// Tasks recorded for one date: live for today, archived otherwise.
pub fn render_day<S: KeyValueStore, C: Clock>(tracker: &Tracker<S, C>, date: NaiveDate) -> String {
    let tasks = tracker.day_tasks(date);
    if tasks.is_empty() {
        return format!("No tasks recorded for {date}.\n");
    }
    let mut sorted: Vec<_> = tasks.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut out = String::new();
    let label = if date == tracker.today() {
        "Today".to_string()
    } else {
        date.to_string()
    };
    let _ = writeln!(
        out,
        "{label}: {} total",
        format_duration(total_elapsed(tasks))
    );
    for task in sorted {
        render_task(&mut out, task);
    }
    out
}
