//! Threshold Error Types

use sensor_feed::Metric;
use thiserror::Error;

/// Errors while building a threshold table
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    /// Cutoff is NaN or infinite
    #[error("{field} cutoff {value} is not a finite number")]
    NotFinite { field: &'static str, value: f64 },

    /// Cutoff below zero
    #[error("{field} cutoff {value} must not be negative")]
    Negative { field: &'static str, value: f64 },

    /// Critical cutoff does not sit above the warning cutoff
    #[error("critical cutoff {critical} must be greater than warning cutoff {warning}")]
    Inverted { warning: f64, critical: f64 },

    /// Invalid entry for a specific metric
    #[error("invalid threshold for {metric}: {source}")]
    Metric {
        metric: Metric,
        #[source]
        source: Box<ThresholdError>,
    },
}
