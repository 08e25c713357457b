//! SQLite Incident Log

use crate::incident::{IncidentEntry, IncidentSink};
use crate::StorageError;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

type EntryRow = (String, String, i64, String, String, String);

/// Incident log persisted in SQLite
pub struct SqliteIncidentSink {
    pool: SqlitePool,
}

impl SqliteIncidentSink {
    /// Open (or create) the database at `url` and ensure the schema exists.
    ///
    /// A single connection is kept for the pool lifetime so `sqlite::memory:`
    /// databases survive between calls.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS incident_log (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                alert_id TEXT NOT NULL,
                timestamp_ms INTEGER NOT NULL,
                action TEXT NOT NULL,
                actor TEXT NOT NULL,
                notes TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_incident_alert ON incident_log (alert_id)")
            .execute(&pool)
            .await?;

        info!("Incident log opened at {}", url);
        Ok(Self { pool })
    }
}

fn from_row(row: EntryRow) -> Result<IncidentEntry, StorageError> {
    let (id, alert_id, timestamp_ms, action, actor, notes) = row;
    let id = Uuid::parse_str(&id).map_err(|e| StorageError::SerializationError(e.to_string()))?;
    let timestamp = Utc
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .ok_or_else(|| {
            StorageError::SerializationError(format!("invalid timestamp {}", timestamp_ms))
        })?;
    Ok(IncidentEntry {
        id,
        alert_id,
        timestamp,
        action,
        actor,
        notes,
    })
}

#[async_trait]
impl IncidentSink for SqliteIncidentSink {
    async fn append(&self, entry: IncidentEntry) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO incident_log (id, alert_id, timestamp_ms, action, actor, notes)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(&entry.alert_id)
        .bind(entry.timestamp.timestamp_millis())
        .bind(&entry.action)
        .bind(&entry.actor)
        .bind(&entry.notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query(&self, alert_id: &str) -> Result<Vec<IncidentEntry>, StorageError> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT id, alert_id, timestamp_ms, action, actor, notes FROM incident_log
             WHERE alert_id = ? ORDER BY timestamp_ms ASC, seq ASC",
        )
        .bind(alert_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(from_row).collect()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<IncidentEntry>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT id, alert_id, timestamp_ms, action, actor, notes FROM incident_log
             ORDER BY seq DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(from_row).collect()
    }
}
