//! Storage Layer
//!
//! Append-only incident log (in-memory or SQLite), bounded scenario store,
//! and the recent-readings log with CSV export.

mod incident;
mod readings;
mod scenarios;
mod sqlite;

pub use incident::{actions, IncidentEntry, IncidentSink, MemoryIncidentSink};
pub use readings::{to_csv, ReadingLog, CSV_HEADER, DEFAULT_READING_RETENTION, MAX_EXPORT_ROWS};
pub use scenarios::{Scenario, ScenarioStore, DEFAULT_SCENARIO_RETENTION};
pub use sqlite::SqliteIncidentSink;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Record not found")]
    NotFound,
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<csv::Error> for StorageError {
    fn from(e: csv::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}
