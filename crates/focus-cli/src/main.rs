mod breathe;
mod cli;
mod config;
mod report;
mod storage;
mod tasks;
mod tui;
mod watch;

use crate::cli::{Command, ConfigCommand};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use focus_core::storage::KeyValueStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the tracker and the dashboard.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            let tracker = storage::open_tracker(&config).await?;
            tui::launch(
                tracker,
                config.tracker.chart_days,
                config.tracker.tick_interval(),
            )
            .await?
        }
        Command::Version => print_version(),
        Command::Health => run_health_check(&config).await?,
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
        Command::Task(cmd) => tasks::handle(cmd, &config).await?,
        Command::Status => report::status(&config).await?,
        Command::Target { action } => report::target(action, &config).await?,
        Command::History { days, date } => report::history(days, date, &config).await?,
        Command::Watch => watch::run(&config).await?,
        Command::Breathe { cycles } => {
            breathe::run(cycles.unwrap_or(config.breathing.cycles)).await?
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters; default to warn and keep stdout for command output.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Library errors are `anyhow`; keep the full context chain in the report.
pub fn to_eyre(err: anyhow::Error) -> color_eyre::Report {
    eyre!("{err:#}")
}

fn print_version() {
    println!("focus {}", env!("CARGO_PKG_VERSION"));
}

/// Runs a quick read/write check of the data directory.
async fn run_health_check(config: &config::Config) -> Result<()> {
    let store = storage::store_from_config(config)?;
    run_store_health(&store).await?;
    println!("Storage: ok ({})", store.root().display());
    Ok(())
}

async fn run_store_health<S: KeyValueStore>(store: &S) -> Result<()> {
    let probe_key = "focus/health/probe";
    let payload = b"ok";
    store
        .put(probe_key, payload)
        .await
        .map_err(|e| eyre!(e.to_string()))?;
    let round_trip = store
        .get(probe_key)
        .await
        .map_err(|e| eyre!(e.to_string()))?;
    store
        .delete(probe_key)
        .await
        .map_err(|e| eyre!(e.to_string()))?;

    if round_trip != payload {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
