//! Recommended Actions

use serde::{Deserialize, Serialize};

/// Action suggested by the estimator's rule set, in rule evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Rainfall above 70
    Drainage,
    /// Vibration above 60
    ReduceBlasting,
    /// Slope angle above 40°
    Stabilization,
    /// Soil moisture above 80
    MonitorSaturation,
    /// Overall risk above 75
    Evacuate,
    /// No rule fired
    ContinueMonitoring,
}

impl Recommendation {
    /// Operator-facing text
    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::Drainage => "Implement drainage measures",
            Recommendation::ReduceBlasting => "Reduce blasting intensity",
            Recommendation::Stabilization => "Consider slope stabilization",
            Recommendation::MonitorSaturation => "Monitor soil saturation levels",
            Recommendation::Evacuate => "Evacuate workers immediately",
            Recommendation::ContinueMonitoring => "Continue normal monitoring",
        }
    }
}
