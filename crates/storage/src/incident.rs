//! Incident Log

use crate::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Action labels written to the incident log
pub mod actions {
    pub const ALERT_RAISED: &str = "Alert Raised";
    pub const ALERT_ACKNOWLEDGED: &str = "Alert Acknowledged";
    pub const ALERT_RESOLVED: &str = "Alert Resolved";
}

/// One audit record of an alert state transition. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentEntry {
    pub id: Uuid,
    pub alert_id: String,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    pub notes: String,
}

impl IncidentEntry {
    /// New entry stamped now
    pub fn new(
        alert_id: impl Into<String>,
        action: impl Into<String>,
        actor: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            alert_id: alert_id.into(),
            timestamp: Utc::now(),
            action: action.into(),
            actor: actor.into(),
            notes: notes.into(),
        }
    }
}

/// Append/query contract of an incident log backend
#[async_trait]
pub trait IncidentSink: Send + Sync {
    /// Append one entry. Fails only when the backend is unavailable.
    async fn append(&self, entry: IncidentEntry) -> Result<(), StorageError>;

    /// Entries of one alert, oldest first
    async fn query(&self, alert_id: &str) -> Result<Vec<IncidentEntry>, StorageError>;

    /// Newest entries across all alerts, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<IncidentEntry>, StorageError>;
}

/// In-memory incident log
pub struct MemoryIncidentSink {
    entries: Mutex<Vec<IncidentEntry>>,
    available: AtomicBool,
}

impl MemoryIncidentSink {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backend going away (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Total stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("incident log offline".to_string()))
        }
    }
}

impl Default for MemoryIncidentSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IncidentSink for MemoryIncidentSink {
    async fn append(&self, entry: IncidentEntry) -> Result<(), StorageError> {
        self.check_available()?;
        let mut entries = self.entries.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;
        debug!("Incident logged: {} on {}", entry.action, entry.alert_id);
        entries.push(entry);
        Ok(())
    }

    async fn query(&self, alert_id: &str) -> Result<Vec<IncidentEntry>, StorageError> {
        self.check_available()?;
        let entries = self.entries.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        let mut found: Vec<_> = entries
            .iter()
            .filter(|e| e.alert_id == alert_id)
            .cloned()
            .collect();
        // stable: equal timestamps keep append order
        found.sort_by_key(|e| e.timestamp);
        Ok(found)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<IncidentEntry>, StorageError> {
        self.check_available()?;
        let entries = self.entries.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        Ok(entries.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_query_in_order() {
        let sink = MemoryIncidentSink::new();
        sink.append(IncidentEntry::new("a1", actions::ALERT_ACKNOWLEDGED, "eng1", "seen"))
            .await
            .unwrap();
        sink.append(IncidentEntry::new("a2", actions::ALERT_RAISED, "system", ""))
            .await
            .unwrap();
        sink.append(IncidentEntry::new("a1", actions::ALERT_RESOLVED, "eng1", "drained"))
            .await
            .unwrap();

        let log = sink.query("a1").await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, actions::ALERT_ACKNOWLEDGED);
        assert_eq!(log[1].action, actions::ALERT_RESOLVED);
        assert!(log[0].timestamp <= log[1].timestamp);
    }

    #[tokio::test]
    async fn test_recent_newest_first() {
        let sink = MemoryIncidentSink::new();
        for i in 0..5 {
            sink.append(IncidentEntry::new(format!("a{}", i), actions::ALERT_RAISED, "system", ""))
                .await
                .unwrap();
        }

        let recent = sink.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].alert_id, "a4");
        assert_eq!(recent[1].alert_id, "a3");
    }

    #[tokio::test]
    async fn test_unavailable_sink_fails() {
        let sink = MemoryIncidentSink::new();
        sink.set_available(false);

        let result = sink
            .append(IncidentEntry::new("a1", actions::ALERT_RAISED, "system", ""))
            .await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
        assert!(sink.is_empty());

        sink.set_available(true);
        assert!(sink.query("a1").await.unwrap().is_empty());
    }
}
