//! Serialized layout of tracker state in the key/value store.
//!
//! Each collection lives under its own version-qualified key and is rewritten
//! whole on every save. Absent or malformed entries load as defaults.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use focus_core::{
    history::HistoryMap,
    storage::{KeyValueStore, StoreError},
    tasks::Task,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{instrument, warn};

pub const TARGET_KEY: &str = "focus/v1/target";
pub const TASKS_KEY: &str = "focus/v1/tasks";
pub const HISTORY_KEY: &str = "focus/v1/history";
pub const LAST_SEEN_KEY: &str = "focus/v1/last_seen";

/// Daily target used when none is stored or the stored value is unusable.
pub const DEFAULT_TARGET_HOURS: f64 = 4.0;

/// Parse a user-entered target in hours, falling back to the default for
/// anything that is not a positive number.
pub fn parse_target_hours(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .map(sanitize_target_hours)
        .unwrap_or(DEFAULT_TARGET_HOURS)
}

pub fn sanitize_target_hours(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        DEFAULT_TARGET_HOURS
    }
}

/// Parse a user-entered budget in minutes; unparsable input means no budget.
pub fn parse_budget_minutes(text: &str) -> u32 {
    text.trim().parse().unwrap_or(0)
}

/// Raw bytes for `key`, `None` when nothing has been stored yet.
async fn read<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<Option<Vec<u8>>> {
    match store.get(key).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(StoreError::NotFound { .. }) => Ok(None),
        Err(err) => Err(anyhow::anyhow!("reading {key}: {err}")),
    }
}

async fn write<S: KeyValueStore + ?Sized>(store: &S, key: &str, bytes: &[u8]) -> Result<()> {
    store
        .put(key, bytes)
        .await
        .map_err(|err| anyhow::anyhow!("writing {key}: {err}"))
}

async fn load_json<S, T>(store: &S, key: &str) -> Result<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned + Default,
{
    let Some(bytes) = read(store, key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(key, error = %err, "discarding malformed stored value");
            Ok(T::default())
        }
    }
}

async fn save_json<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec(value).with_context(|| format!("encoding {key}"))?;
    write(store, key, &bytes).await
}

#[instrument(skip_all)]
pub async fn load_tasks<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Task>> {
    load_json(store, TASKS_KEY).await
}

#[instrument(skip_all, fields(count = tasks.len()))]
pub async fn save_tasks<S: KeyValueStore + ?Sized>(store: &S, tasks: &[Task]) -> Result<()> {
    save_json(store, TASKS_KEY, tasks).await
}

#[instrument(skip_all)]
pub async fn load_history<S: KeyValueStore + ?Sized>(store: &S) -> Result<HistoryMap> {
    load_json(store, HISTORY_KEY).await
}

#[instrument(skip_all, fields(days = history.len()))]
pub async fn save_history<S: KeyValueStore + ?Sized>(store: &S, history: &HistoryMap) -> Result<()> {
    save_json(store, HISTORY_KEY, history).await
}

#[instrument(skip_all)]
pub async fn load_target<S: KeyValueStore + ?Sized>(store: &S) -> Result<f64> {
    let Some(bytes) = read(store, TARGET_KEY).await? else {
        return Ok(DEFAULT_TARGET_HOURS);
    };
    Ok(parse_target_hours(&String::from_utf8_lossy(&bytes)))
}

#[instrument(skip(store))]
pub async fn save_target<S: KeyValueStore + ?Sized>(store: &S, hours: f64) -> Result<()> {
    write(store, TARGET_KEY, hours.to_string().as_bytes()).await
}

#[instrument(skip_all)]
pub async fn load_last_seen<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<NaiveDate>> {
    let Some(bytes) = read(store, LAST_SEEN_KEY).await? else {
        return Ok(None);
    };
    let text = String::from_utf8_lossy(&bytes);
    match text.trim().parse::<NaiveDate>() {
        Ok(date) => Ok(Some(date)),
        Err(err) => {
            warn!(value = %text, error = %err, "ignoring unreadable last-seen date");
            Ok(None)
        }
    }
}

#[instrument(skip(store))]
pub async fn save_last_seen<S: KeyValueStore + ?Sized>(store: &S, date: NaiveDate) -> Result<()> {
    write(store, LAST_SEEN_KEY, date.to_string().as_bytes()).await
}
