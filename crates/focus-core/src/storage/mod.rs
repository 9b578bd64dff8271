//! Key/value persistence contract shared by the tracker and concrete stores.

mod kv_store;

pub use kv_store::{InMemoryStore, KeyValueStore, StoreError};
