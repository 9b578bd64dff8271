use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::Result;
use dirs::config_dir;
use focus_core::{breathing::BreathingPlan, history::DEFAULT_RETENTION_DAYS};
use focus_tracker::TrackerSettings;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/focus/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the data directory holding persisted state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub breathing: BreathingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Archived days kept in history.
    pub retention_days: usize,
    /// Days shown in the history chart (7 for a week, 30 for a month).
    pub chart_days: usize,
    /// Seconds between timer ticks in `watch` and the dashboard.
    pub tick_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            chart_days: 7,
            tick_secs: 1,
        }
    }
}

impl TrackerConfig {
    pub fn settings(&self) -> TrackerSettings {
        TrackerSettings {
            retention_days: self.retention_days.max(1),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct BreathingConfig {
    pub cycles: u32,
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            cycles: BreathingPlan::default().cycles,
        }
    }
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("focus").join("config.toml"))
}

/// Write the given config to the default path unless a file already exists.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    let path = default_path()?;
    write_to_path_if_missing(config, &path)
}

fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}
