//! Infrastructure layer: SQLite storage, audit trail, configuration.

pub mod config;
pub mod history;
pub mod store;

pub use config::{HistoryPolicy, StoreConfig};
pub use store::{
    InMemoryRecordStore, RecordStore, SqliteRecordStore, StoreError, StoreResult, UpsertOutcome,
};
