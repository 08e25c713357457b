//! Risk Scoring
//!
//! Threshold table, severity ranking, and the pure risk classifier for zone readings.

mod error;
mod scorer;
mod severity;
mod thresholds;

pub use error::ThresholdError;
pub use scorer::{assess, classify, RiskClassification, Scope, ZoneRisk};
pub use severity::RiskLevel;
pub use thresholds::{Threshold, ThresholdTable};
