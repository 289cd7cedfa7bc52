//! Recency- and confidence-weighted temporal smoothing.
//!
//! `weight = confidence * recency(age)`, where age is measured in seconds
//! back from the newest point. Recency is 1 at age 0 and non-increasing, so
//! the newest point always carries weight whenever its confidence does.

use body_metrics_core::{mean, weighted_mean, MeasurementPoint};
use serde::{Deserialize, Serialize};

/// Recency decay curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecencyDecay {
    /// Every point counts the same regardless of age.
    None,
    /// Weight halves every `half_life_s` seconds.
    Exponential { half_life_s: f64 },
    /// Weight falls linearly to zero at `horizon_s` seconds.
    Linear { horizon_s: f64 },
}

impl Default for RecencyDecay {
    fn default() -> Self {
        RecencyDecay::Exponential { half_life_s: 2.0 }
    }
}

impl RecencyDecay {
    /// Recency weight in [0, 1] for a point `age_s` seconds older than the newest.
    pub fn weight(&self, age_s: f64) -> f64 {
        let age = if age_s.is_finite() { age_s.max(0.0) } else { 0.0 };
        match *self {
            RecencyDecay::None => 1.0,
            RecencyDecay::Exponential { half_life_s } if half_life_s > 0.0 => {
                0.5f64.powf(age / half_life_s)
            }
            RecencyDecay::Linear { horizon_s } if horizon_s > 0.0 => {
                (1.0 - age / horizon_s).max(0.0)
            }
            _ => 1.0,
        }
    }
}

/// Weighted estimate of already-corrected points; `None` only for empty input.
///
/// Falls back to the unweighted mean when every weight is zero.
pub fn smooth(points: &[MeasurementPoint], decay: &RecencyDecay) -> Option<f64> {
    let newest = points
        .iter()
        .map(|p| p.timestamp)
        .fold(f64::NEG_INFINITY, f64::max);
    if !newest.is_finite() {
        return None;
    }

    weighted_mean(
        points
            .iter()
            .map(|p| (p.value, p.confidence.max(0.0) * decay.weight(newest - p.timestamp))),
    )
    .or_else(|| {
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        mean(&values)
    })
}
