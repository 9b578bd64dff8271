use color_eyre::Result;
use focus_core::breathing::{BreathStep, BreathingOutcome, BreathingPlan};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Run the guided exercise in the terminal; Ctrl-C ends it early.
pub async fn run(cycles: u32) -> Result<()> {
    let plan = BreathingPlan::default().with_cycles(cycles.max(1));
    let cancel = CancellationToken::new();

    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    println!(
        "4-7-8 breathing: {} breaths, about {}s. Ctrl-C to stop.",
        plan.cycles,
        plan.total().as_secs()
    );
    let outcome = run_plan(&plan, &cancel, |step| {
        println!(
            "[{}/{}] {} for {}s",
            step.cycle + 1,
            plan.cycles,
            step.phase,
            step.duration.as_secs()
        );
    })
    .await;
    watcher.abort();

    match outcome {
        BreathingOutcome::Completed => println!("Done. Nice work."),
        BreathingOutcome::Cancelled { .. } => println!("\nStopped early."),
    }
    Ok(())
}

/// Walk the plan, announcing each step and waiting out its duration, until it
/// finishes or `cancel` fires.
pub async fn run_plan<F>(
    plan: &BreathingPlan,
    cancel: &CancellationToken,
    mut announce: F,
) -> BreathingOutcome
where
    F: FnMut(&BreathStep),
{
    for (completed, step) in plan.steps().enumerate() {
        if cancel.is_cancelled() {
            return BreathingOutcome::Cancelled { completed };
        }
        announce(&step);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(completed, "breathing exercise cancelled");
                return BreathingOutcome::Cancelled { completed };
            }
            _ = tokio::time::sleep(step.duration) => {}
        }
    }
    BreathingOutcome::Completed
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use focus_core::breathing::BreathPhase;
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn full_run_takes_plan_total() {
        let plan = BreathingPlan::default().with_cycles(2);
        let cancel = CancellationToken::new();
        let mut phases = Vec::new();
        let started = Instant::now();

        let outcome = run_plan(&plan, &cancel, |step| phases.push(step.phase)).await;

        assert_eq!(outcome, BreathingOutcome::Completed);
        assert_eq!(phases.len(), 6);
        assert_eq!(phases[2], BreathPhase::Exhale);
        assert_eq!(started.elapsed(), Duration::from_secs(38));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_announces_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut announced = 0;

        let outcome = run_plan(&BreathingPlan::default(), &cancel, |_| announced += 1).await;

        assert_eq!(outcome, BreathingOutcome::Cancelled { completed: 0 });
        assert_eq!(announced, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_hold_stops_promptly() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });
        let started = Instant::now();

        let outcome = run_plan(&BreathingPlan::default(), &cancel, |_| {}).await;

        assert_eq!(outcome, BreathingOutcome::Cancelled { completed: 1 });
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }
}
