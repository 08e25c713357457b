//! Alert Engine Implementation

use crate::alert::{Alert, AlertId, AlertType, Category, NewAlert};
use crate::filter::{AlertFilter, AlertSummary};
use crate::notify::Notification;
use crate::AlertError;
use risk_scorer::{RiskClassification, Scope};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use storage::{actions, IncidentEntry, IncidentSink};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Actor recorded for alerts raised by the scorer
pub const SYSTEM_ACTOR: &str = "system";

/// Alert engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Upper bound on one incident log write (milliseconds, default: 2000)
    pub sink_timeout_ms: u64,
    /// Notifications buffered for subscribers and kept for polling (default: 64)
    pub notification_capacity: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sink_timeout_ms: 2000,
            notification_capacity: 64,
        }
    }
}

impl AlertConfig {
    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }
}

/// Outcome of the incident log write that follows a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum AuditStatus {
    Recorded,
    /// Nothing changed, nothing logged
    Skipped,
    /// Transition kept, log entry lost
    Failed(String),
}

/// Result of an acknowledge/resolve call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Alert state after the call
    pub alert: Alert,
    /// False for an idempotent repeat
    pub changed: bool,
    pub audit: AuditStatus,
}

/// Result of a raise call
#[derive(Debug, Clone, PartialEq)]
pub enum RaiseOutcome {
    Created(Alert),
    /// An unresolved alert already covers the zone and category
    Suppressed(Alert),
    /// Classification is normal
    NotAlerting,
}

impl RaiseOutcome {
    pub fn created(&self) -> Option<&Alert> {
        match self {
            RaiseOutcome::Created(alert) => Some(alert),
            _ => None,
        }
    }
}

struct Slot {
    seq: u64,
    alert: Arc<Mutex<Alert>>,
}

#[derive(Default)]
struct Store {
    slots: HashMap<AlertId, Slot>,
    next_seq: u64,
}

/// Owns every alert and applies the acknowledge/resolve state machine.
///
/// Each alert sits behind its own lock, so transitions on one alert serialize
/// while transitions on different alerts proceed independently.
pub struct AlertEngine {
    config: AlertConfig,
    store: RwLock<Store>,
    sink: Arc<dyn IncidentSink>,
    notifier: broadcast::Sender<Notification>,
    recent_notifications: Mutex<VecDeque<Notification>>,
}

impl AlertEngine {
    /// Create a new alert engine writing its audit trail to `sink`
    pub fn new(config: AlertConfig, sink: Arc<dyn IncidentSink>) -> Self {
        info!("Creating alert engine with config: {:?}", config);
        let capacity = config.notification_capacity.max(1);
        let (notifier, _) = broadcast::channel(capacity);
        Self {
            config,
            store: RwLock::new(Store::default()),
            sink,
            notifier,
            recent_notifications: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Receive a [`Notification`] for every new critical alert
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Raise an alert for a warning/critical classification.
    ///
    /// The category follows the metric that set the level. An unresolved alert
    /// for the same zone and category suppresses the new one and is left as is.
    pub async fn raise(&self, classification: &RiskClassification) -> RaiseOutcome {
        let Some(alert_type) = AlertType::from_level(classification.level) else {
            return RaiseOutcome::NotAlerting;
        };

        let metric = match classification.scope {
            Scope::Metric(metric) => Some(metric),
            Scope::Composite => classification.trigger,
        };
        let category = metric.map(Category::for_metric).unwrap_or(Category::Safety);
        let label = metric.map(|m| m.label()).unwrap_or("Zone");

        let (title, advice) = match alert_type {
            AlertType::Critical => (
                format!("Critical {} Level", label),
                "Immediate action required.",
            ),
            _ => (
                format!("{} Threshold Exceeded", label),
                "Monitor conditions closely.",
            ),
        };
        let message = format!(
            "{} reached {} level in {} (score {:.0}/100). {}",
            label, classification.level, classification.zone, classification.score, advice
        );

        let request = NewAlert {
            alert_type,
            zone: classification.zone.clone(),
            title,
            message,
            priority: None,
            category,
        };
        self.create(request, SYSTEM_ACTOR).await
    }

    /// Raise an operator or simulated alert, with the same dedup rule
    pub async fn raise_manual(
        &self,
        request: NewAlert,
        actor: &str,
    ) -> Result<RaiseOutcome, AlertError> {
        require("zone", &request.zone)?;
        require("title", &request.title)?;
        require("actor", actor)?;
        Ok(self.create(request, actor).await)
    }

    async fn create(&self, request: NewAlert, actor: &str) -> RaiseOutcome {
        let alert = {
            let mut store = self.store.write().await;
            for slot in store.slots.values() {
                let existing = slot.alert.lock().await;
                if existing.covers(&request.zone, request.category) {
                    debug!(
                        "Alert suppressed: {} already open for {}/{}",
                        existing.id,
                        request.zone,
                        request.category.as_str()
                    );
                    return RaiseOutcome::Suppressed(existing.clone());
                }
            }

            let alert = Alert::open(request);
            let seq = store.next_seq;
            store.next_seq += 1;
            store.slots.insert(
                alert.id.clone(),
                Slot {
                    seq,
                    alert: Arc::new(Mutex::new(alert.clone())),
                },
            );
            alert
        };

        info!(
            "Alert raised: {} [{}] {} - {}",
            alert.id,
            alert.alert_type.as_str(),
            alert.zone,
            alert.title
        );
        metrics::counter!("hazard_alerts_raised_total", "type" => alert.alert_type.as_str())
            .increment(1);

        if let Some(notification) = Notification::for_alert(&alert) {
            self.notify(notification).await;
        }

        self.record(IncidentEntry::new(
            alert.id.as_str(),
            actions::ALERT_RAISED,
            actor,
            alert.message.clone(),
        ))
        .await;

        RaiseOutcome::Created(alert)
    }

    /// Acknowledge an alert. Repeats are no-ops; the first acknowledger wins.
    pub async fn acknowledge(&self, id: &AlertId, actor: &str) -> Result<Transition, AlertError> {
        require("actor", actor)?;
        let slot = self.slot(id).await?;

        let alert = {
            let mut alert = slot.lock().await;
            if alert.resolved {
                return Err(AlertError::InvalidState {
                    id: id.clone(),
                    status: alert.status(),
                    action: "acknowledge",
                });
            }
            if alert.acknowledged {
                debug!("Alert {} already acknowledged", id);
                return Ok(Transition {
                    alert: alert.clone(),
                    changed: false,
                    audit: AuditStatus::Skipped,
                });
            }
            alert.acknowledged = true;
            alert.acknowledged_by = Some(actor.to_string());
            alert.acknowledged_at = Some(chrono::Utc::now());
            alert.clone()
        };

        info!("Alert acknowledged: {} by {}", id, actor);
        metrics::counter!("hazard_alert_transitions_total", "action" => "acknowledge").increment(1);

        let audit = self
            .record(IncidentEntry::new(
                id.as_str(),
                actions::ALERT_ACKNOWLEDGED,
                actor,
                "Alert acknowledged by operator",
            ))
            .await;

        Ok(Transition {
            alert,
            changed: true,
            audit,
        })
    }

    /// Resolve an alert with a note on the action taken. Prior acknowledgment is not required.
    pub async fn resolve(
        &self,
        id: &AlertId,
        actor: &str,
        note: &str,
    ) -> Result<Transition, AlertError> {
        require("resolution note", note)?;
        require("actor", actor)?;
        let slot = self.slot(id).await?;

        let alert = {
            let mut alert = slot.lock().await;
            if alert.resolved {
                return Err(AlertError::InvalidState {
                    id: id.clone(),
                    status: alert.status(),
                    action: "resolve",
                });
            }
            alert.resolved = true;
            alert.action_taken = Some(note.trim().to_string());
            alert.resolved_by = Some(actor.to_string());
            alert.resolved_at = Some(chrono::Utc::now());
            alert.clone()
        };

        info!("Alert resolved: {} by {}", id, actor);
        metrics::counter!("hazard_alert_transitions_total", "action" => "resolve").increment(1);

        let audit = self
            .record(IncidentEntry::new(
                id.as_str(),
                actions::ALERT_RESOLVED,
                actor,
                note.trim(),
            ))
            .await;

        Ok(Transition {
            alert,
            changed: true,
            audit,
        })
    }

    /// Snapshot of one alert
    pub async fn alert(&self, id: &AlertId) -> Result<Alert, AlertError> {
        let slot = self.slot(id).await?;
        let alert = slot.lock().await;
        Ok(alert.clone())
    }

    /// Snapshots matching `filter`, newest first
    pub async fn alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        let mut all = self.snapshot().await;
        all.retain(|(_, a)| filter.matches(a));
        all.into_iter()
            .map(|(_, a)| a)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Counters over every alert
    pub async fn summary(&self) -> AlertSummary {
        let all = self.snapshot().await;
        AlertSummary::from_alerts(all.iter().map(|(_, a)| a))
    }

    /// Number of stored alerts
    pub async fn len(&self) -> usize {
        self.store.read().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Incident log of one alert, oldest first
    pub async fn incidents(&self, id: &AlertId) -> Result<Vec<IncidentEntry>, AlertError> {
        self.slot(id).await?;
        let entries = tokio::time::timeout(self.config.sink_timeout(), self.sink.query(id.as_str()))
            .await
            .map_err(|_| AlertError::SinkTimeout(self.config.sink_timeout_ms))??;
        Ok(entries)
    }

    /// Newest incident entries across all alerts
    pub async fn recent_incidents(&self, limit: usize) -> Result<Vec<IncidentEntry>, AlertError> {
        let entries = tokio::time::timeout(self.config.sink_timeout(), self.sink.recent(limit))
            .await
            .map_err(|_| AlertError::SinkTimeout(self.config.sink_timeout_ms))??;
        Ok(entries)
    }

    /// Most recent notifications, newest first
    pub async fn recent_notifications(&self, limit: usize) -> Vec<Notification> {
        let recent = self.recent_notifications.lock().await;
        recent.iter().rev().take(limit).cloned().collect()
    }

    async fn slot(&self, id: &AlertId) -> Result<Arc<Mutex<Alert>>, AlertError> {
        let store = self.store.read().await;
        store
            .slots
            .get(id)
            .map(|slot| Arc::clone(&slot.alert))
            .ok_or_else(|| AlertError::NotFound(id.clone()))
    }

    /// Every alert, newest first
    async fn snapshot(&self) -> Vec<(u64, Alert)> {
        let store = self.store.read().await;
        let mut all = Vec::with_capacity(store.slots.len());
        for slot in store.slots.values() {
            all.push((slot.seq, slot.alert.lock().await.clone()));
        }
        all.sort_by(|a, b| b.0.cmp(&a.0));
        all
    }

    async fn notify(&self, notification: Notification) {
        warn!(
            "CRITICAL ALERT {}: {}",
            notification.zone, notification.title
        );
        {
            let mut recent = self.recent_notifications.lock().await;
            while recent.len() >= self.config.notification_capacity.max(1) {
                recent.pop_front();
            }
            recent.push_back(notification.clone());
        }
        // No subscribers is fine
        let _ = self.notifier.send(notification);
    }

    /// Best-effort audit write; never undoes the transition it follows
    async fn record(&self, entry: IncidentEntry) -> AuditStatus {
        let alert_id = entry.alert_id.clone();
        let failure = match tokio::time::timeout(self.config.sink_timeout(), self.sink.append(entry)).await {
            Ok(Ok(())) => return AuditStatus::Recorded,
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("incident log write timed out after {}ms", self.config.sink_timeout_ms),
        };

        warn!("Incident log write failed for alert {}: {}", alert_id, failure);
        metrics::counter!("hazard_incident_log_failures_total").increment(1);
        AuditStatus::Failed(failure)
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AlertError> {
    if value.trim().is_empty() {
        Err(AlertError::Validation(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}
