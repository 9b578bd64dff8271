use std::io::Write as _;

use color_eyre::Result;
use focus_core::{clock::Clock, format::format_duration, storage::KeyValueStore};
use focus_tracker::{RolloverOutcome, Tracker};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{config::Config, storage, to_eyre};

/// Tick the running timer every `tick_secs` until Ctrl-C, printing a live line.
pub async fn run(config: &Config) -> Result<()> {
    let mut tracker = storage::open_tracker(config).await?;
    let mut ticker = interval(config.tracker.tick_interval());
    // Accrual is wall-clock based, so late ticks never need to be replayed.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    println!("Watching the timer. Press Ctrl-C to leave (the timer keeps running).");
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                match step(&mut tracker).await {
                    Ok(RolloverOutcome::Archived { date, .. }) => {
                        println!("\nNew day: {date} archived.");
                    }
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "timer update failed; retrying next tick"),
                }
                print!("\r{}", live_line(&tracker));
                if let Err(err) = std::io::stdout().flush() {
                    debug!(error = %err, "failed to flush live line");
                }
            }
        }
    }

    println!();
    if let Some(task) = tracker.active_task() {
        println!(
            "{} is still running. Stop it with `focus task stop`.",
            task.name
        );
    }
    Ok(())
}

/// One scheduler beat: check for a new day, then accrue the running timer.
/// The tick runs even when the rollover fails; the caller decides how to
/// surface the error and simply tries again on the next beat.
pub async fn step<S: KeyValueStore, C: Clock>(
    tracker: &mut Tracker<S, C>,
) -> Result<RolloverOutcome> {
    let rolled = tracker.rollover().await;
    let ticked = tracker.tick().await;
    let outcome = rolled.map_err(to_eyre)?;
    ticked.map_err(to_eyre)?;
    if let RolloverOutcome::Archived { date, .. } = outcome {
        info!(%date, "day rolled over while watching");
    }
    Ok(outcome)
}

/// Single-line summary refreshed on every tick.
pub fn live_line<S: KeyValueStore, C: Clock>(tracker: &Tracker<S, C>) -> String {
    let total = format_duration(tracker.total_today());
    match tracker.active_task() {
        Some(task) => format!(
            "▶ {} {}  | today {total} | {}",
            task.name,
            format_duration(task.elapsed_ms),
            tracker.goal_status()
        ),
        None => format!("⏸ idle  | today {total} | {}", tracker.goal_status()),
    }
}
