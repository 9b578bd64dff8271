//! Durable storage for Focus: a plain file-per-key implementation of
//! [`focus_core::storage::KeyValueStore`].

pub mod file_store;

pub use file_store::FileStore;
