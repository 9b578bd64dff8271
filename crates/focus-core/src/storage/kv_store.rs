use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a [`KeyValueStore`].
///
/// `NotFound` is part of normal operation: the tracker reads it as "nothing
/// saved yet" and falls back to defaults. Only `Storage` is a real failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("entry not found for key: {key}")]
    NotFound { key: String },
    #[error("storage failure: {reason}")]
    Storage { reason: String },
}

/// Durable home for tracker state.
///
/// Each key (`focus/v1/tasks`, `focus/v1/history`, ...) holds one whole
/// serialized collection, and every save rewrites it completely. Stores do
/// not merge or append, so a `put` must replace the previous value as a unit.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Replace the value stored under `key`.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Last value written under `key`, or [`StoreError::NotFound`].
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Drop `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store for tests and throwaway sessions. Clones share the
/// same entries.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // Map operations cannot leave it half-written, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.entries()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}
