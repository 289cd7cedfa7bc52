use body_metrics_core::BodyLandmark;
use serde::{Deserialize, Serialize};

/// Point moved to the origin during normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Midpoint of the two hips (pelvis centre).
    HipMidpoint,
    /// Midpoint of the two shoulders (chest).
    ShoulderMidpoint,
    /// Mean of every landmark that passes the confidence gate.
    Centroid,
    /// A single named landmark.
    Landmark(BodyLandmark),
}

/// Distance that is mapped to `target_scale`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleReference {
    ShoulderWidth,
    HipWidth,
    /// Vertical nose-to-lowest-ankle extent after tilt removal.
    BodyHeight,
}

/// Parameters of the per-frame landmark normalizer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerParams {
    pub anchor: Anchor,
    pub scale_reference: ScaleReference,
    /// Length of the scale reference after normalization.
    pub target_scale: f32,
    /// Landmarks required by the anchor, rotation or scale below this
    /// confidence make the frame unavailable.
    pub min_confidence: f32,
    /// Reference distances shorter than this (in input units) are degenerate.
    pub min_reference_distance: f32,
}

impl Default for NormalizerParams {
    fn default() -> Self {
        Self {
            anchor: Anchor::HipMidpoint,
            scale_reference: ScaleReference::ShoulderWidth,
            target_scale: 1.0,
            min_confidence: 0.5,
            min_reference_distance: 1e-6,
        }
    }
}
