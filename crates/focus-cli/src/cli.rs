use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "focus",
    about = "Daily study timer with goal tracking and history",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Optional subcommand; defaults to launching the dashboard when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Launch the interactive dashboard (press q or Esc to exit).
    Tui,
    /// Print version and exit.
    Version,
    /// Check that the data directory is readable and writable.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage today's tasks and the timer.
    #[command(subcommand)]
    Task(TaskCommand),
    /// Show today's total, goal progress and the running timer.
    Status,
    /// Show or change the daily target in hours.
    Target {
        #[command(subcommand)]
        action: Option<TargetCommand>,
    },
    /// Per-day totals for recent days, or the archived tasks of one day.
    History {
        /// Number of days in the chart (defaults to the configured window).
        #[arg(long)]
        days: Option<usize>,
        /// Show the tasks recorded on this date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Keep the running timer ticking in the foreground until Ctrl-C.
    Watch,
    /// Guided 4-7-8 breathing exercise.
    Breathe {
        /// Number of breaths (defaults to the configured count).
        #[arg(long)]
        cycles: Option<u32>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    /// List today's tasks, newest first.
    List,
    /// Add a task for today.
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Target minutes for the task's progress bar.
        #[arg(short, long)]
        budget: Option<String>,
    },
    /// Delete a task (stops its timer if running).
    Remove { id: String },
    /// Start the timer for a task, stopping any other.
    Start { id: String },
    /// Stop the running timer.
    Stop,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TargetCommand {
    /// Print the current daily target.
    Show,
    /// Set the daily target; unusable values reset it to 4 hours.
    Set { hours: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_dashboard_when_missing_subcommand() {
        let cli = Cli::try_parse_from(["focus"]).expect("parse should succeed");
        assert_eq!(cli.command, None);
    }

    #[test]
    fn parses_task_add_with_options() {
        let cli = Cli::try_parse_from(["focus", "task", "add", "Read", "-d", "ch. 4", "-b", "30"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Some(Command::Task(TaskCommand::Add {
                name: "Read".into(),
                description: Some("ch. 4".into()),
                budget: Some("30".into()),
            }))
        );
    }

    #[test]
    fn parses_task_start_by_prefix() {
        let cli = Cli::try_parse_from(["focus", "task", "start", "1a2b"]).expect("parse");
        assert_eq!(
            cli.command,
            Some(Command::Task(TaskCommand::Start { id: "1a2b".into() }))
        );
    }

    #[test]
    fn parses_target_set() {
        let cli = Cli::try_parse_from(["focus", "target", "set", "5.5"]).expect("parse");
        assert_eq!(
            cli.command,
            Some(Command::Target {
                action: Some(TargetCommand::Set {
                    hours: "5.5".into()
                })
            })
        );
    }

    #[test]
    fn parses_history_date() {
        let cli = Cli::try_parse_from(["focus", "history", "--date", "2026-10-18", "--days", "30"])
            .expect("parse");
        assert_eq!(
            cli.command,
            Some(Command::History {
                days: Some(30),
                date: NaiveDate::from_ymd_opt(2026, 10, 18),
            })
        );
    }

    #[test]
    fn rejects_non_iso_history_date() {
        assert!(Cli::try_parse_from(["focus", "history", "--date", "10/18/2026"]).is_err());
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli = Cli::try_parse_from(["focus", "config", "init"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Config(ConfigCommand::Init)));
    }
}
