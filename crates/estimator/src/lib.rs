//! Predictive Estimator
//!
//! Documented weighted composite over environmental, geological and operational
//! factors. Used for what-if exploration, independent of live readings.

mod confidence;
mod engine;
mod params;
mod recommendation;

pub use confidence::{
    ConfidenceSource, FixedConfidence, RandomConfidence, CONFIDENCE_MAX, CONFIDENCE_MIN,
};
pub use engine::{
    PredictionResult, PredictiveEstimator, RiskBand, RiskFactors, MAX_RISK, MIN_RISK,
    MIN_TIME_TO_EVENT_HOURS,
};
pub use params::SimulationParameters;
pub use recommendation::Recommendation;
