//! Core types for Focus: tasks, time, aggregates and the storage contract.
//! No I/O lives here; concrete stores and the tracker build on top.

pub mod breathing;
pub mod clock;
pub mod format;
pub mod history;
pub mod stats;
pub mod storage;
pub mod tasks;
