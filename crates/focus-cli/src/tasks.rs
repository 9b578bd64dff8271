use std::fmt::Write as _;

use color_eyre::Result;
use focus_core::{
    clock::Clock, format::format_duration, stats::budget_progress, storage::KeyValueStore,
    tasks::Task,
};
use focus_tracker::{parse_budget_minutes, Tracker};
use uuid::Uuid;

use crate::{cli::TaskCommand, config, storage, to_eyre};

/// Execute a task subcommand against the configured store.
pub async fn handle(cmd: TaskCommand, config: &config::Config) -> Result<()> {
    let mut tracker = storage::open_tracker(config).await?;
    let out = apply(cmd, &mut tracker).await?;
    print!("{out}");
    Ok(())
}

/// Run a task subcommand and return what should be shown to the user.
pub async fn apply<S: KeyValueStore, C: Clock>(
    cmd: TaskCommand,
    tracker: &mut Tracker<S, C>,
) -> Result<String> {
    let out = match cmd {
        TaskCommand::List => render_list(tracker),
        TaskCommand::Add {
            name,
            description,
            budget,
        } => {
            let budget = budget.as_deref().map(parse_budget_minutes).unwrap_or(0);
            match tracker
                .add(&name, description.as_deref(), budget)
                .await
                .map_err(to_eyre)?
            {
                Some(task) => format!("Created task {}: {}\n", task.short_id(), task.name),
                None => "Task name cannot be empty; nothing added.\n".to_string(),
            }
        }
        TaskCommand::Remove { id } => match resolve(tracker, &id) {
            Some((uuid, name)) => {
                tracker.remove(uuid).await.map_err(to_eyre)?;
                format!("Removed: {name}\n")
            }
            None => no_match(&id),
        },
        TaskCommand::Start { id } => match resolve(tracker, &id) {
            Some((uuid, name)) => {
                let previous = tracker.active_task().map(|t| t.name.clone());
                tracker.start(uuid).await.map_err(to_eyre)?;
                match previous {
                    Some(prev) if prev != name => format!("Paused {prev}; started {name}\n"),
                    _ => format!("Started: {name}\n"),
                }
            }
            None => no_match(&id),
        },
        TaskCommand::Stop => match tracker.active_task().map(|t| t.id) {
            Some(id) => {
                tracker.stop().await.map_err(to_eyre)?;
                match tracker.get(id) {
                    Some(task) => format!(
                        "Paused {} at {}\n",
                        task.name,
                        format_duration(task.elapsed_ms)
                    ),
                    None => "Timer stopped.\n".to_string(),
                }
            }
            None => "No timer running.\n".to_string(),
        },
    };
    Ok(out)
}

fn resolve<S: KeyValueStore, C: Clock>(
    tracker: &Tracker<S, C>,
    id: &str,
) -> Option<(Uuid, String)> {
    tracker.find_by_prefix(id).map(|t| (t.id, t.name.clone()))
}

fn no_match(id: &str) -> String {
    format!("No task matches `{id}`. Run `focus task list` to see ids.\n")
}

/// Today's tasks, newest first, one block per task.
pub fn render_list<S: KeyValueStore, C: Clock>(tracker: &Tracker<S, C>) -> String {
    let tasks = tracker.list();
    if tasks.is_empty() {
        return "No tasks yet. Add one with `focus task add <name>`.\n".to_string();
    }
    let mut out = String::new();
    for task in tasks {
        render_task(&mut out, task);
    }
    out
}

pub fn render_task(out: &mut String, task: &Task) {
    let marker = if task.is_running() { "▶" } else { " " };
    let _ = write!(
        out,
        "{} {marker} {}  {}",
        task.short_id(),
        task.name,
        format_duration(task.elapsed_ms)
    );
    if let Some(progress) = budget_progress(task) {
        let _ = write!(
            out,
            " / {}m ({:.0}%)",
            task.budget_minutes,
            progress * 100.0
        );
    }
    out.push('\n');
    if let Some(desc) = &task.description {
        let _ = writeln!(out, "           {desc}");
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::storage::test_support::test_tracker;

    fn add(name: &str, budget: Option<&str>) -> TaskCommand {
        TaskCommand::Add {
            name: name.into(),
            description: None,
            budget: budget.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn add_then_list() {
        let (mut tracker, _) = test_tracker().await;
        let out = apply(add("Read", Some("30")), &mut tracker)
            .await
            .expect("add");
        assert!(out.starts_with("Created task "));

        let listed = apply(TaskCommand::List, &mut tracker).await.expect("list");
        assert!(listed.contains("Read  00:00:00 / 30m (0%)"), "{listed}");
    }

    #[tokio::test]
    async fn unparsable_budget_means_none() {
        let (mut tracker, _) = test_tracker().await;
        apply(add("Loose", Some("soon")), &mut tracker)
            .await
            .expect("add");
        assert_eq!(tracker.tasks()[0].budget_minutes, 0);
    }

    #[tokio::test]
    async fn blank_name_is_reported_not_added() {
        let (mut tracker, _) = test_tracker().await;
        let out = apply(add("  ", None), &mut tracker).await.expect("add");
        assert!(out.contains("cannot be empty"));
        assert!(tracker.tasks().is_empty());
    }

    #[tokio::test]
    async fn start_switch_and_stop() {
        let (mut tracker, clock) = test_tracker().await;
        apply(add("A", None), &mut tracker).await.expect("add");
        apply(add("B", None), &mut tracker).await.expect("add");
        let a = tracker.tasks()[0].short_id();
        let b = tracker.tasks()[1].short_id();

        let out = apply(TaskCommand::Start { id: a }, &mut tracker)
            .await
            .expect("start");
        assert_eq!(out, "Started: A\n");

        clock.advance(Duration::seconds(90));
        let out = apply(TaskCommand::Start { id: b }, &mut tracker)
            .await
            .expect("switch");
        assert_eq!(out, "Paused A; started B\n");

        clock.advance(Duration::seconds(5));
        let out = apply(TaskCommand::Stop, &mut tracker).await.expect("stop");
        assert_eq!(out, "Paused B at 00:00:05\n");

        let out = apply(TaskCommand::Stop, &mut tracker).await.expect("stop");
        assert_eq!(out, "No timer running.\n");
        assert_eq!(tracker.tasks()[0].elapsed_ms, 90_000);
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let (mut tracker, _) = test_tracker().await;
        let out = apply(TaskCommand::Remove { id: "ffff".into() }, &mut tracker)
            .await
            .expect("remove");
        assert!(out.starts_with("No task matches `ffff`"));
    }

    #[tokio::test]
    async fn empty_list_has_hint() {
        let (mut tracker, _) = test_tracker().await;
        let out = apply(TaskCommand::List, &mut tracker).await.expect("list");
        assert!(out.contains("focus task add"));
    }
}
