use std::path::PathBuf;

use color_eyre::Result;
use dirs::data_dir;
use focus_core::{
    clock::{Clock, SystemClock},
    storage::KeyValueStore,
};
use focus_storage::FileStore;
use focus_tracker::{RolloverOutcome, Tracker, TrackerSettings};
use tracing::{debug, info};

use crate::{config::Config, to_eyre};

pub type AppTracker = Tracker<FileStore, SystemClock>;

/// Resolve the default data directory for Focus.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("focus"))
}

/// Build the file store, honouring a `data_dir` override from config.
pub fn store_from_config(config: &Config) -> Result<FileStore> {
    let root = match &config.data_dir {
        Some(root) => root.clone(),
        None => default_data_dir()?,
    };
    debug!(?root, "initializing file store");
    Ok(FileStore::new(root))
}

/// Open the tracker on the configured store with the system clock.
pub async fn open_tracker(config: &Config) -> Result<AppTracker> {
    let store = store_from_config(config)?;
    open_with(store, SystemClock, config.tracker.settings()).await
}

/// Load state and run the session-entry steps: day rollover, then catch the
/// running timer up to now.
pub async fn open_with<S, C>(store: S, clock: C, settings: TrackerSettings) -> Result<Tracker<S, C>>
where
    S: KeyValueStore,
    C: Clock,
{
    let mut tracker = Tracker::open(store, clock, settings)
        .await
        .map_err(to_eyre)?;
    if let RolloverOutcome::Archived { date, stopped } = tracker.rollover().await.map_err(to_eyre)? {
        info!(%date, ?stopped, "new day: previous tasks archived");
        if stopped.is_some() {
            println!("New day: the running timer was stopped and {date} archived.");
        }
    }
    tracker.tick().await.map_err(to_eyre)?;
    Ok(tracker)
}

#[cfg(test)]
pub mod test_support {
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use focus_core::{
        clock::ManualClock,
        storage::{InMemoryStore, StoreError},
    };

    use super::*;

    /// Reads work, writes fail: simulates a full disk mid-session.
    #[derive(Clone, Default)]
    pub struct ReadOnlyStore(InMemoryStore);

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn put(&self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Storage {
                reason: "quota exceeded".into(),
            })
        }

        async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
            self.0.get(key).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.0.delete(key).await
        }
    }

    pub fn morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    /// In-memory tracker pinned to a manual clock.
    pub async fn test_tracker() -> (Tracker<InMemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(morning());
        let tracker = open_with(InMemoryStore::new(), clock.clone(), TrackerSettings::default())
            .await
            .expect("open tracker");
        (tracker, clock)
    }
}
