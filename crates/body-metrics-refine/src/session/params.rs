use serde::{Deserialize, Serialize};

use crate::quality::QualityParams;
use crate::smoothing::RecencyDecay;
use crate::validation::PlausibilityRanges;

/// Session refinement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParams {
    /// z-score cutoff of the second outlier pass.
    pub outlier_threshold: f64,
    /// IQR fence multiplier `k` of the first outlier pass.
    pub iqr_k: f64,
    /// Points below this confidence never reach the outlier filter.
    pub min_confidence: f64,
    /// Fewer surviving points leave a dimension without a value.
    pub min_samples: usize,
    /// Maximum buffered points per type; the oldest is evicted first.
    pub window_size: usize,
    /// Optional age bound (seconds) relative to the newest point of a type.
    pub max_age_s: Option<f64>,
    pub recency: RecencyDecay,
    pub quality: QualityParams,
    /// `None` disables plausibility checks.
    pub plausibility: Option<PlausibilityRanges>,
    /// Frames covered by [`current_estimates`](super::SessionProcessor::current_estimates).
    pub live_window_frames: u64,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            outlier_threshold: 2.5,
            iqr_k: 1.5,
            min_confidence: 0.5,
            min_samples: 5,
            window_size: 300,
            max_age_s: None,
            recency: RecencyDecay::default(),
            quality: QualityParams::default(),
            plausibility: Some(PlausibilityRanges::default()),
            live_window_frames: 10,
        }
    }
}
