//! Predictive Estimator Implementation

use crate::confidence::{ConfidenceSource, RandomConfidence};
use crate::params::SimulationParameters;
use crate::recommendation::Recommendation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Lower clamp of the reported risk probability
pub const MIN_RISK: f64 = 5.0;
/// Upper clamp of the reported risk probability
pub const MAX_RISK: f64 = 95.0;
/// Time-to-event with negligible risk (hours)
pub const MAX_TIME_TO_EVENT_HOURS: f64 = 48.0;
/// Floor of the time-to-event estimate (hours)
pub const MIN_TIME_TO_EVENT_HOURS: f64 = 0.5;

/// Factor scores on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub environmental: f64,
    pub geological: f64,
    pub operational: f64,
}

/// Qualitative band of a risk probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskBand {
    /// Band for a probability in percent
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 80.0 {
            RiskBand::Critical
        } else if probability >= 60.0 {
            RiskBand::High
        } else if probability >= 40.0 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

/// Estimator output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Probability of failure in percent, within [5, 95]
    pub risk_probability: f64,
    /// Estimated hours until the event
    pub time_to_event_hours: f64,
    /// Confidence in percent, within [75, 95)
    pub confidence: f64,
    pub risk_band: RiskBand,
    pub factors: RiskFactors,
    /// Never empty
    pub recommendations: Vec<Recommendation>,
    /// Inputs after clamping
    pub parameters: SimulationParameters,
    pub computed_at: DateTime<Utc>,
}

impl PredictionResult {
    pub fn recommends(&self, action: Recommendation) -> bool {
        self.recommendations.contains(&action)
    }
}

/// Stateless weighted-composite estimator
#[derive(Clone)]
pub struct PredictiveEstimator {
    confidence: Arc<dyn ConfidenceSource>,
}

impl PredictiveEstimator {
    /// Estimator with random confidence draws
    pub fn new() -> Self {
        Self::with_confidence_source(Arc::new(RandomConfidence))
    }

    pub fn with_confidence_source(confidence: Arc<dyn ConfidenceSource>) -> Self {
        Self { confidence }
    }

    /// Run one estimate. Total: out-of-range inputs are clamped.
    pub fn estimate(&self, params: &SimulationParameters) -> PredictionResult {
        let params = params.clamped();

        let environmental = (params.rainfall * 0.4
            + params.soil_moisture * 0.3
            + params.temperature_percent() * 0.3)
            / 100.0;
        let geological = (params.slope_percent() * 0.6 + params.vibration * 0.4) / 100.0;
        let operational = params.blasting_activity / 100.0;

        let overall = (environmental * 0.4 + geological * 0.4 + operational * 0.2) * 100.0;
        let risk_probability = overall.clamp(MIN_RISK, MAX_RISK);
        let time_to_event_hours = time_to_event(overall);
        let recommendations = recommend(&params, overall);

        debug!(
            "Estimate: overall={:.1} ({:.1}h), {} recommendation(s)",
            overall,
            time_to_event_hours,
            recommendations.len()
        );

        PredictionResult {
            risk_probability,
            time_to_event_hours,
            confidence: self.confidence.draw(),
            risk_band: RiskBand::from_probability(risk_probability),
            factors: RiskFactors {
                environmental: environmental * 100.0,
                geological: geological * 100.0,
                operational: operational * 100.0,
            },
            recommendations,
            parameters: params,
            computed_at: Utc::now(),
        }
    }
}

impl Default for PredictiveEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Monotonically decreasing in `overall`, floored at 0.5h
fn time_to_event(overall: f64) -> f64 {
    (MAX_TIME_TO_EVENT_HOURS - (overall / 100.0) * 46.0).max(MIN_TIME_TO_EVENT_HOURS)
}

fn recommend(params: &SimulationParameters, overall: f64) -> Vec<Recommendation> {
    let rules = [
        (params.rainfall > 70.0, Recommendation::Drainage),
        (params.vibration > 60.0, Recommendation::ReduceBlasting),
        (params.slope_angle > 40.0, Recommendation::Stabilization),
        (params.soil_moisture > 80.0, Recommendation::MonitorSaturation),
        (overall > 75.0, Recommendation::Evacuate),
    ];

    let fired: Vec<_> = rules
        .into_iter()
        .filter_map(|(hit, action)| hit.then_some(action))
        .collect();

    if fired.is_empty() {
        vec![Recommendation::ContinueMonitoring]
    } else {
        fired
    }
}
