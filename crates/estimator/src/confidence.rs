//! Confidence Sources
//!
//! The estimator's confidence figure is a noisy draw, not a computed quantity.
//! Sources are pluggable so tests can pin the value.

use rand::Rng;

/// Lower bound of a confidence draw (inclusive)
pub const CONFIDENCE_MIN: f64 = 75.0;
/// Upper bound of a confidence draw (exclusive)
pub const CONFIDENCE_MAX: f64 = 95.0;

/// Supplies a confidence value in `[75, 95)`
pub trait ConfidenceSource: Send + Sync {
    fn draw(&self) -> f64;
}

/// Uniform draw from the thread-local generator. Non-deterministic.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomConfidence;

impl ConfidenceSource for RandomConfidence {
    fn draw(&self) -> f64 {
        rand::rng().random_range(CONFIDENCE_MIN..CONFIDENCE_MAX)
    }
}

/// Always returns the same value, pulled into range
#[derive(Debug, Clone, Copy)]
pub struct FixedConfidence(f64);

impl FixedConfidence {
    pub fn new(value: f64) -> Self {
        let value = if value.is_nan() { CONFIDENCE_MIN } else { value };
        // keep the upper bound exclusive
        Self(value.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX - f64::EPSILON * CONFIDENCE_MAX))
    }
}

impl ConfidenceSource for FixedConfidence {
    fn draw(&self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_in_range() {
        let source = RandomConfidence;
        for _ in 0..1000 {
            let c = source.draw();
            assert!((CONFIDENCE_MIN..CONFIDENCE_MAX).contains(&c));
        }
    }

    #[test]
    fn test_fixed_is_pulled_into_range() {
        assert_eq!(FixedConfidence::new(80.0).draw(), 80.0);
        assert_eq!(FixedConfidence::new(10.0).draw(), CONFIDENCE_MIN);
        assert!(FixedConfidence::new(99.0).draw() < CONFIDENCE_MAX);
    }
}
