//! Alert Listing Filters

use crate::alert::{Alert, AlertType};
use serde::{Deserialize, Serialize};

/// Status filter of the alerts page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    /// Neither acknowledged nor resolved
    Active,
    /// Acknowledged, resolved or not
    Acknowledged,
    Resolved,
}

/// Alert query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertFilter {
    /// `None` matches every type
    pub alert_type: Option<AlertType>,
    pub status: StatusFilter,
    pub limit: Option<usize>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        if self.alert_type.is_some_and(|t| t != alert.alert_type) {
            return false;
        }
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Active => !alert.acknowledged && !alert.resolved,
            StatusFilter::Acknowledged => alert.acknowledged,
            StatusFilter::Resolved => alert.resolved,
        }
    }
}

/// Header counters of the alerts page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    pub total: usize,
    pub active: usize,
    /// Acknowledged and still unresolved
    pub acknowledged: usize,
    /// Critical and still unresolved
    pub critical: usize,
    pub resolved: usize,
}

impl AlertSummary {
    pub fn from_alerts<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Self {
        alerts.into_iter().fold(Self::default(), |mut s, a| {
            s.total += 1;
            if a.resolved {
                s.resolved += 1;
            } else {
                if a.acknowledged {
                    s.acknowledged += 1;
                } else {
                    s.active += 1;
                }
                if a.alert_type == AlertType::Critical {
                    s.critical += 1;
                }
            }
            s
        })
    }
}
