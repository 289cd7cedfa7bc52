//! Quality scoring.
//!
//! Four sub-scores on a 0–10 scale and a weighted overall score:
//! - sample: surviving sample count relative to `min_samples`, saturating;
//! - consistency: `10 - cv * cv_scale`, clamped;
//! - detection: `10 * mean confidence`;
//! - completeness: share of the six dimensions with a final value.

use body_metrics_core::MeasurementType;
use serde::{Deserialize, Serialize};

const MAX_SCORE: f64 = 10.0;

/// Relative weights of the four sub-scores; normalized by their sum when used.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub sample: f64,
    pub consistency: f64,
    pub detection: f64,
    pub completeness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            sample: 0.2,
            consistency: 0.3,
            detection: 0.3,
            completeness: 0.2,
        }
    }
}

impl ScoreWeights {
    fn combine(&self, parts: &[(f64, f64)]) -> f64 {
        let total: f64 = parts.iter().map(|(_, w)| w.max(0.0)).sum();
        if !(total > 0.0) {
            return 0.0;
        }
        let sum: f64 = parts.iter().map(|(s, w)| s * w.max(0.0)).sum();
        (sum / total).clamp(0.0, MAX_SCORE)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParams {
    /// Sample score reaches 10 at `sample_saturation * min_samples` points.
    pub sample_saturation: f64,
    /// Consistency loses `cv_scale` points per unit of coefficient of variation.
    pub cv_scale: f64,
    pub weights: ScoreWeights,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            sample_saturation: 2.0,
            cv_scale: 100.0,
            weights: ScoreWeights::default(),
        }
    }
}

/// Sample sufficiency: 0 at zero samples, 10 from `saturation * min_samples` on.
pub fn sample_score(n: usize, min_samples: usize, saturation: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let full = saturation.max(f64::EPSILON) * min_samples.max(1) as f64;
    (MAX_SCORE * n as f64 / full).min(MAX_SCORE)
}

/// Consistency from the coefficient of variation; 10 when `cv == 0`, 0 when unknown.
pub fn consistency_score(cv: Option<f64>, cv_scale: f64) -> f64 {
    match cv {
        Some(cv) if cv.is_finite() => (MAX_SCORE - cv.abs() * cv_scale).clamp(0.0, MAX_SCORE),
        _ => 0.0,
    }
}

/// Detection confidence mapped linearly onto 0–10.
pub fn detection_score(mean_confidence: f64) -> f64 {
    if !mean_confidence.is_finite() {
        return 0.0;
    }
    (MAX_SCORE * mean_confidence).clamp(0.0, MAX_SCORE)
}

/// Share of the six dimensions that produced a value.
pub fn completeness_score(present: usize) -> f64 {
    let present = present.min(MeasurementType::COUNT);
    MAX_SCORE * present as f64 / MeasurementType::COUNT as f64
}

/// Sub-scores of one measurement type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeQuality {
    pub sample_score: f64,
    pub consistency_score: f64,
    pub detection_score: f64,
    /// Weighted combination of the three per-type sub-scores.
    pub score: f64,
}

impl TypeQuality {
    pub fn new(
        surviving: usize,
        cv: Option<f64>,
        mean_confidence: f64,
        min_samples: usize,
        params: &QualityParams,
    ) -> Self {
        let sample = sample_score(surviving, min_samples, params.sample_saturation);
        let consistency = consistency_score(cv, params.cv_scale);
        let detection = if surviving == 0 {
            0.0
        } else {
            detection_score(mean_confidence)
        };
        let w = &params.weights;
        let score = w.combine(&[
            (sample, w.sample),
            (consistency, w.consistency),
            (detection, w.detection),
        ]);
        Self {
            sample_score: sample,
            consistency_score: consistency,
            detection_score: detection,
            score,
        }
    }
}

/// Session-level scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub sample: f64,
    pub consistency: f64,
    pub detection: f64,
    pub completeness: f64,
    /// Overall `calibration_quality`, in [0, 10].
    pub overall: f64,
}

impl QualityScores {
    /// Aggregate per-type results.
    ///
    /// Each entry is a type's sub-scores and whether it produced a value.
    /// Every sub-score averages over all six types; an absent type adds 0 to
    /// consistency and detection, so a type becoming present never lowers them.
    pub fn aggregate(
        per_type: &[(TypeQuality, bool); MeasurementType::COUNT],
        params: &QualityParams,
    ) -> Self {
        let avg = |f: fn(&TypeQuality) -> f64| {
            per_type
                .iter()
                .map(|(q, ok)| if *ok { f(q) } else { 0.0 })
                .sum::<f64>()
                / MeasurementType::COUNT as f64
        };
        let sample = per_type.iter().map(|(q, _)| q.sample_score).sum::<f64>()
            / MeasurementType::COUNT as f64;
        let consistency = avg(|q| q.consistency_score);
        let detection = avg(|q| q.detection_score);
        let present = per_type.iter().filter(|(_, ok)| *ok).count();
        let completeness = completeness_score(present);

        let w = &params.weights;
        let overall = w.combine(&[
            (sample, w.sample),
            (consistency, w.consistency),
            (detection, w.detection),
            (completeness, w.completeness),
        ]);
        Self {
            sample,
            consistency,
            detection,
            completeness,
            overall,
        }
    }
}

/// Recommendation band of the overall score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl Recommendation {
    pub fn from_score(score: f64) -> Self {
        if score >= 9.0 {
            Recommendation::Excellent
        } else if score >= 7.0 {
            Recommendation::Good
        } else if score >= 5.0 {
            Recommendation::Acceptable
        } else {
            Recommendation::Poor
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::Excellent => "excellent calibration",
            Recommendation::Good => "good calibration",
            Recommendation::Acceptable => "acceptable; re-scan recommended for critical use",
            Recommendation::Poor => "poor calibration; re-scan recommended",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sample_score_is_monotonic_and_saturates() {
        assert_eq!(sample_score(0, 5, 2.0), 0.0);
        let mut prev = 0.0;
        for n in 1..=30 {
            let s = sample_score(n, 5, 2.0);
            assert!(s >= prev);
            prev = s;
        }
        assert_relative_eq!(sample_score(5, 5, 2.0), 5.0);
        assert_eq!(sample_score(10, 5, 2.0), 10.0);
        assert_eq!(sample_score(1000, 5, 2.0), 10.0);
    }

    #[test]
    fn consistency_is_ten_at_zero_cv_and_clamped() {
        assert_eq!(consistency_score(Some(0.0), 100.0), 10.0);
        assert_relative_eq!(consistency_score(Some(0.02), 100.0), 8.0, epsilon = 1e-9);
        assert_eq!(consistency_score(Some(0.5), 100.0), 0.0);
        assert_eq!(consistency_score(None, 100.0), 0.0);
    }

    #[test]
    fn detection_and_completeness() {
        assert_relative_eq!(detection_score(0.9), 9.0, epsilon = 1e-9);
        assert_eq!(detection_score(1.5), 10.0);
        assert_eq!(completeness_score(0), 0.0);
        assert_eq!(completeness_score(3), 5.0);
        assert_eq!(completeness_score(6), 10.0);
    }

    #[test]
    fn overall_rises_with_samples_and_confidence() {
        let params = QualityParams::default();
        let overall = |n: usize, conf: f64| {
            let q = TypeQuality::new(n, Some(0.01), conf, 5, &params);
            QualityScores::aggregate(&[(q, n >= 5); MeasurementType::COUNT], &params).overall
        };
        let mut prev = 0.0;
        for n in 0..25 {
            let o = overall(n, 0.8);
            assert!(o >= prev && (0.0..=10.0).contains(&o));
            prev = o;
        }
        assert!(overall(10, 0.95) >= overall(10, 0.6));
    }

    #[test]
    fn noisy_type_turning_present_does_not_lower_overall() {
        let params = QualityParams::default();
        let steady = TypeQuality::new(10, Some(0.0), 1.0, 5, &params);
        let absent = TypeQuality::new(0, None, 0.0, 5, &params);
        let overall = |n: usize| {
            let noisy = TypeQuality::new(n, Some(0.1), 0.6, 5, &params);
            let mut per_type = [(absent, false); MeasurementType::COUNT];
            per_type[0] = (steady, true);
            per_type[1] = (noisy, n >= 5);
            QualityScores::aggregate(&per_type, &params).overall
        };
        let mut prev = overall(0);
        for n in 1..12 {
            let o = overall(n);
            assert!(o >= prev, "overall fell from {prev} to {o} at n = {n}");
            prev = o;
        }
    }

    #[test]
    fn perfect_session_is_excellent() {
        let params = QualityParams::default();
        let q = TypeQuality::new(10, Some(0.0), 1.0, 5, &params);
        let scores = QualityScores::aggregate(&[(q, true); MeasurementType::COUNT], &params);
        assert_relative_eq!(scores.overall, 10.0, epsilon = 1e-9);
        assert_eq!(Recommendation::from_score(scores.overall), Recommendation::Excellent);
        assert_eq!(Recommendation::from_score(7.5), Recommendation::Good);
        assert_eq!(Recommendation::from_score(5.0), Recommendation::Acceptable);
        assert_eq!(Recommendation::from_score(4.99), Recommendation::Poor);
    }

    #[test]
    fn empty_session_scores_zero() {
        let params = QualityParams::default();
        let q = TypeQuality::new(0, None, 0.0, 5, &params);
        let scores = QualityScores::aggregate(&[(q, false); MeasurementType::COUNT], &params);
        assert_eq!(scores.overall, 0.0);
        assert_eq!(scores.completeness, 0.0);
    }
}
