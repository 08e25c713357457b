//! Threshold Table

use crate::error::ThresholdError;
use crate::severity::RiskLevel;
use sensor_feed::Metric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Warning/critical cutoffs for one metric.
///
/// Always satisfies `critical > warning >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThreshold")]
pub struct Threshold {
    warning: f64,
    critical: f64,
}

#[derive(Deserialize)]
struct RawThreshold {
    warning: f64,
    critical: f64,
}

impl TryFrom<RawThreshold> for Threshold {
    type Error = ThresholdError;

    fn try_from(raw: RawThreshold) -> Result<Self, Self::Error> {
        Threshold::new(raw.warning, raw.critical)
    }
}

impl Threshold {
    /// Create a threshold, rejecting non-finite, negative, or inverted cutoffs
    pub fn new(warning: f64, critical: f64) -> Result<Self, ThresholdError> {
        for (field, value) in [("warning", warning), ("critical", critical)] {
            if !value.is_finite() {
                return Err(ThresholdError::NotFinite { field, value });
            }
            if value < 0.0 {
                return Err(ThresholdError::Negative { field, value });
            }
        }
        if critical <= warning {
            return Err(ThresholdError::Inverted { warning, critical });
        }
        Ok(Self { warning, critical })
    }

    pub fn warning(&self) -> f64 {
        self.warning
    }

    pub fn critical(&self) -> f64 {
        self.critical
    }

    /// Classify a value. Both cutoffs are inclusive.
    pub fn level(&self, value: f64) -> RiskLevel {
        if !value.is_finite() {
            RiskLevel::Normal
        } else if value >= self.critical {
            RiskLevel::Critical
        } else if value >= self.warning {
            RiskLevel::Warning
        } else {
            RiskLevel::Normal
        }
    }

    /// Percentage of the critical cutoff, clamped to [0, 100]
    pub fn score(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        (value / self.critical * 100.0).clamp(0.0, 100.0)
    }
}

/// Per-metric threshold configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable {
    entries: BTreeMap<Metric, Threshold>,
}

impl ThresholdTable {
    /// Table with no entries; every metric classifies as normal
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace a metric's cutoffs
    pub fn with(
        mut self,
        metric: Metric,
        warning: f64,
        critical: f64,
    ) -> Result<Self, ThresholdError> {
        let threshold = Threshold::new(warning, critical).map_err(|e| ThresholdError::Metric {
            metric,
            source: Box::new(e),
        })?;
        self.entries.insert(metric, threshold);
        Ok(self)
    }

    pub fn get(&self, metric: Metric) -> Option<&Threshold> {
        self.entries.get(&metric)
    }

    /// Apply overrides on top of this table
    pub fn merged(mut self, overrides: &ThresholdTable) -> Self {
        for (metric, threshold) in &overrides.entries {
            self.entries.insert(*metric, *threshold);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ThresholdTable {
    /// Field cutoffs for the open-pit sensor set
    fn default() -> Self {
        let defaults = [
            (Metric::Rainfall, 60.0, 80.0),
            (Metric::Vibration, 50.0, 75.0),
            (Metric::Pressure, 70.0, 85.0),
            (Metric::Temperature, 35.0, 40.0),
            (Metric::Humidity, 80.0, 90.0),
            (Metric::Seismic, 60.0, 80.0),
        ];
        let entries = defaults
            .into_iter()
            .map(|(metric, warning, critical)| (metric, Threshold { warning, critical }))
            .collect();
        Self { entries }
    }
}
