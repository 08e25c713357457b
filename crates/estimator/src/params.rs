//! Estimator Input Parameters

use serde::{Deserialize, Serialize};

/// Upper bound of the slope angle input (degrees)
pub const MAX_SLOPE_ANGLE: f64 = 60.0;
/// Upper bound of the temperature input (°C)
pub const MAX_TEMPERATURE: f64 = 50.0;
/// Upper bound of every percentage-like input
pub const MAX_PERCENT: f64 = 100.0;

/// Operator-supplied what-if inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationParameters {
    /// Rainfall (0-100)
    pub rainfall: f64,
    /// Vibration (0-100)
    pub vibration: f64,
    /// Slope angle in degrees (0-60)
    pub slope_angle: f64,
    /// Soil moisture (0-100)
    pub soil_moisture: f64,
    /// Temperature in °C (0-50)
    pub temperature: f64,
    /// Blasting activity (0-100)
    pub blasting_activity: f64,
}

impl Default for SimulationParameters {
    /// Starting values of the simulation form
    fn default() -> Self {
        Self {
            rainfall: 45.0,
            vibration: 30.0,
            slope_angle: 35.0,
            soil_moisture: 60.0,
            temperature: 25.0,
            blasting_activity: 20.0,
        }
    }
}

impl SimulationParameters {
    /// Clamp every input into its range. NaN maps to the lower bound.
    pub fn clamped(&self) -> Self {
        Self {
            rainfall: bounded(self.rainfall, MAX_PERCENT),
            vibration: bounded(self.vibration, MAX_PERCENT),
            slope_angle: bounded(self.slope_angle, MAX_SLOPE_ANGLE),
            soil_moisture: bounded(self.soil_moisture, MAX_PERCENT),
            temperature: bounded(self.temperature, MAX_TEMPERATURE),
            blasting_activity: bounded(self.blasting_activity, MAX_PERCENT),
        }
    }

    /// Slope angle rescaled to 0-100
    pub fn slope_percent(&self) -> f64 {
        bounded(self.slope_angle, MAX_SLOPE_ANGLE) / MAX_SLOPE_ANGLE * MAX_PERCENT
    }

    /// Temperature rescaled to 0-100
    pub fn temperature_percent(&self) -> f64 {
        bounded(self.temperature, MAX_TEMPERATURE) / MAX_TEMPERATURE * MAX_PERCENT
    }
}

fn bounded(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}
