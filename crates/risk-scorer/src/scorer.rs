//! Risk Scorer
//!
//! Pure mapping from a zone reading to per-metric and composite classifications.

use crate::severity::RiskLevel;
use crate::thresholds::ThresholdTable;
use chrono::{DateTime, Utc};
use sensor_feed::{Metric, ZoneReading};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// What a classification describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "metric", rename_all = "lowercase")]
pub enum Scope {
    /// A single metric of the reading
    Metric(Metric),
    /// The whole zone
    Composite,
}

/// Classification of one metric or of a whole zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskClassification {
    pub zone: String,
    pub scope: Scope,
    pub level: RiskLevel,
    /// 0-100, share of the critical cutoff reached
    pub score: f64,
    /// Raw metric value (metric scope only)
    pub value: Option<f64>,
    /// Metric that set the composite level (composite scope, non-normal only)
    pub trigger: Option<Metric>,
}

impl RiskClassification {
    pub fn is_composite(&self) -> bool {
        self.scope == Scope::Composite
    }
}

/// Latest risk picture of one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRisk {
    pub zone: String,
    pub timestamp: DateTime<Utc>,
    pub composite: RiskClassification,
    pub metrics: Vec<RiskClassification>,
}

impl ZoneRisk {
    pub fn level(&self) -> RiskLevel {
        self.composite.level
    }
}

/// Classify a reading: one entry per sampled metric, then the zone composite last.
///
/// Metrics missing from `thresholds` classify as normal with score 0.
pub fn classify(reading: &ZoneReading, thresholds: &ThresholdTable) -> Vec<RiskClassification> {
    let mut out: Vec<RiskClassification> = reading
        .values()
        .map(|(metric, value)| classify_metric(reading.zone(), metric, value, thresholds))
        .collect();

    let composite = composite_of(reading.zone(), &out);
    trace!(
        zone = reading.zone(),
        level = %composite.level,
        score = composite.score,
        "Classified reading"
    );
    out.push(composite);
    out
}

/// Classify a reading into a [`ZoneRisk`]
pub fn assess(reading: &ZoneReading, thresholds: &ThresholdTable) -> ZoneRisk {
    let mut metrics = classify(reading, thresholds);
    // classify always appends the composite
    let composite = metrics.pop().unwrap_or_else(|| composite_of(reading.zone(), &[]));
    ZoneRisk {
        zone: reading.zone().to_string(),
        timestamp: reading.timestamp(),
        composite,
        metrics,
    }
}

fn classify_metric(
    zone: &str,
    metric: Metric,
    value: f64,
    thresholds: &ThresholdTable,
) -> RiskClassification {
    let (level, score) = match thresholds.get(metric) {
        Some(threshold) => (threshold.level(value), threshold.score(value)),
        None => (RiskLevel::Normal, 0.0),
    };
    RiskClassification {
        zone: zone.to_string(),
        scope: Scope::Metric(metric),
        level,
        score,
        value: Some(value),
        trigger: None,
    }
}

/// Severity-rank reduction; ties go to the higher score, then the earlier metric.
fn composite_of(zone: &str, metrics: &[RiskClassification]) -> RiskClassification {
    let level = RiskLevel::max_of(metrics.iter().map(|c| c.level));
    let score = metrics.iter().map(|c| c.score).fold(0.0, f64::max);

    let trigger = if level.is_alerting() {
        metrics
            .iter()
            .filter(|c| c.level == level)
            .fold(None::<&RiskClassification>, |best, c| match best {
                Some(b) if b.score >= c.score => Some(b),
                _ => Some(c),
            })
            .and_then(|c| match c.scope {
                Scope::Metric(m) => Some(m),
                Scope::Composite => None,
            })
    } else {
        None
    };

    RiskClassification {
        zone: zone.to_string(),
        scope: Scope::Composite,
        level,
        score,
        value: None,
        trigger,
    }
}
