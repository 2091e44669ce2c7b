//! # runsheet-sync
//!
//! Store-backed incremental sync of crawled runs.
//!
//! Build a [`SyncConfig`], pick a [`TabularStore`] backend ([`SheetsStore`]
//! for Google Sheets, [`MemoryStore`] in process) and drive a [`SyncEngine`]
//! with [`SyncEngine::initial_push`] or [`SyncEngine::update`].

pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod retry;
pub mod sheets;
pub mod store;

pub use config::SyncConfig;
pub use engine::{PushOutcome, SyncCursor, SyncEngine, SyncMode, SyncReport};
pub use error::{StoreError, SyncError};
pub use memory::{MemorySheet, MemoryStore};
pub use retry::{Backoff, RetryPolicy};
pub use sheets::{SheetsStore, SheetsWorksheet};
pub use store::{CellValue, TabularStore, Worksheet};
