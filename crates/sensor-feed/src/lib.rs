//! Sensor Feed
//!
//! Zone readings as produced by the field sensors, plus the `ReadingSource`
//! capability that supplies them (live feed, seeded simulator, or scripted replay).

mod source;

pub use source::{ReadingSource, ScriptedSource, SimulatedSource, DEFAULT_ZONES};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Monitored metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Rainfall,
    Vibration,
    Pressure,
    Temperature,
    Humidity,
    #[serde(alias = "seismic-activity")]
    Seismic,
}

impl Metric {
    /// All metrics in export column order
    pub const ALL: [Metric; 6] = [
        Metric::Rainfall,
        Metric::Vibration,
        Metric::Pressure,
        Metric::Temperature,
        Metric::Humidity,
        Metric::Seismic,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Rainfall => "rainfall",
            Metric::Vibration => "vibration",
            Metric::Pressure => "pressure",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Seismic => "seismic",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Rainfall => "Rainfall",
            Metric::Vibration => "Vibration",
            Metric::Pressure => "Pressure",
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::Seismic => "Seismic",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown metric name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rainfall" => Ok(Metric::Rainfall),
            "vibration" => Ok(Metric::Vibration),
            "pressure" => Ok(Metric::Pressure),
            "temperature" => Ok(Metric::Temperature),
            "humidity" => Ok(Metric::Humidity),
            "seismic" | "seismic-activity" | "seismic_activity" => Ok(Metric::Seismic),
            _ => Err(UnknownMetric(s.to_string())),
        }
    }
}

/// One sample for one zone. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReading {
    zone: String,
    timestamp: DateTime<Utc>,
    values: BTreeMap<Metric, f64>,
}

impl ZoneReading {
    /// Start a reading for `zone` taken at `timestamp`
    pub fn new(zone: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            zone: zone.into(),
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Add a metric value
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.values.insert(metric, value);
        self
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Value of a metric, if sampled
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    /// Iterate sampled metrics in metric order
    pub fn values(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }

    /// Number of sampled metrics
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parse() {
        assert_eq!("Rainfall".parse::<Metric>(), Ok(Metric::Rainfall));
        assert_eq!("seismic-activity".parse::<Metric>(), Ok(Metric::Seismic));
        assert!("wind".parse::<Metric>().is_err());
    }

    #[test]
    fn test_reading_builder() {
        let reading = ZoneReading::new("Zone B", Utc::now())
            .with(Metric::Rainfall, 90.0)
            .with(Metric::Vibration, 10.0);

        assert_eq!(reading.zone(), "Zone B");
        assert_eq!(reading.value(Metric::Rainfall), Some(90.0));
        assert_eq!(reading.value(Metric::Pressure), None);
        assert_eq!(reading.len(), 2);
    }

    #[test]
    fn test_reading_serializes_lowercase_metrics() {
        let reading = ZoneReading::new("Zone A", Utc::now()).with(Metric::Humidity, 42.0);
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["values"]["humidity"], 42.0);
    }

    #[test]
    fn test_seismic_activity_alias() {
        let metric: Metric = serde_json::from_str("\"seismic-activity\"").unwrap();
        assert_eq!(metric, Metric::Seismic);
        assert_eq!(serde_json::to_string(&metric).unwrap(), "\"seismic\"");

        let err = "wind".parse::<Metric>().unwrap_err();
        assert_eq!(err.to_string(), "unknown metric: wind");
    }
}
