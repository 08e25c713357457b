//! Operator Notifications

use crate::alert::{Alert, AlertId, AlertType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Emitted once for every newly raised critical alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub severity: AlertType,
    pub zone: String,
    pub title: String,
    pub alert_id: AlertId,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Notification for `alert`, if its type warrants one
    pub fn for_alert(alert: &Alert) -> Option<Self> {
        (alert.alert_type == AlertType::Critical).then(|| Self {
            severity: alert.alert_type,
            zone: alert.zone.clone(),
            title: alert.title.clone(),
            alert_id: alert.id.clone(),
            timestamp: alert.timestamp,
        })
    }
}
