//! Alert Records

use chrono::{DateTime, Utc};
use risk_scorer::RiskLevel;
use sensor_feed::Metric;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque alert identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(String);

impl AlertId {
    /// Fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlertId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AlertId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Alert severity as shown to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Critical,
    Warning,
    Info,
}

impl AlertType {
    /// Alert type for an alerting risk level
    pub fn from_level(level: RiskLevel) -> Option<Self> {
        match level {
            RiskLevel::Critical => Some(AlertType::Critical),
            RiskLevel::Warning => Some(AlertType::Warning),
            RiskLevel::Normal => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Critical => "critical",
            AlertType::Warning => "warning",
            AlertType::Info => "info",
        }
    }

    /// Default priority for this type
    pub fn default_priority(&self) -> Priority {
        match self {
            AlertType::Critical => Priority::High,
            AlertType::Warning => Priority::Medium,
            AlertType::Info => Priority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Alert category; dedup is per zone and category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Safety,
    Equipment,
    Environmental,
    Maintenance,
}

impl Category {
    /// Category of an alert driven by `metric`
    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::Rainfall | Metric::Humidity | Metric::Temperature => Category::Environmental,
            Metric::Vibration | Metric::Seismic => Category::Safety,
            Metric::Pressure => Category::Equipment,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Safety => "safety",
            Category::Equipment => "equipment",
            Category::Environmental => "environmental",
            Category::Maintenance => "maintenance",
        }
    }
}

/// Lifecycle state: `Open -> Acknowledged -> Resolved`, or `Open -> Resolved`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Open,
    Acknowledged,
    Resolved,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertStatus::Open => "open",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        })
    }
}

/// Alert record. Mutated only by the alert engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub zone: String,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub priority: Priority,
    pub category: Category,
    pub acknowledged: bool,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved: bool,
    /// Resolution note
    pub action_taken: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Fresh open alert
    pub fn open(request: NewAlert) -> Self {
        Self {
            id: AlertId::generate(),
            priority: request
                .priority
                .unwrap_or_else(|| request.alert_type.default_priority()),
            alert_type: request.alert_type,
            zone: request.zone,
            title: request.title,
            message: request.message,
            timestamp: Utc::now(),
            category: request.category,
            acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
            resolved: false,
            action_taken: None,
            resolved_by: None,
            resolved_at: None,
        }
    }

    pub fn status(&self) -> AlertStatus {
        if self.resolved {
            AlertStatus::Resolved
        } else if self.acknowledged {
            AlertStatus::Acknowledged
        } else {
            AlertStatus::Open
        }
    }

    /// Whether this alert suppresses a new one for `zone`/`category`
    pub fn covers(&self, zone: &str, category: Category) -> bool {
        !self.resolved && self.zone == zone && self.category == category
    }
}

/// Request to raise an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub zone: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub category: Category,
}
