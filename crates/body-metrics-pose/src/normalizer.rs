//! Per-frame landmark normalization.
//!
//! Three purely geometric steps, applied to every landmark of one frame:
//!
//! 1. translate so the configured anchor (hip midpoint by default) is the origin;
//! 2. rotate so the shoulder line is horizontal;
//! 3. divide by the reference distance so body size becomes `target_scale`.
//!
//! The result is comparable across frames and subjects regardless of where
//! the person stands in the image or how the camera is rolled. There is no
//! history dependency, so frames may be normalized in any order or in
//! parallel.
//!
//! A frame whose anchor/reference landmarks are missing or below
//! `min_confidence` is reported as unavailable (`None`).

use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, PI};

use body_metrics_core::{BodyLandmark, Landmark, PoseFrame};
use log::{debug, warn};
use nalgebra::{Point2, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::{Anchor, NormalizerParams, ScaleReference};

/// Landmarks of one frame expressed in the canonical body frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NormalizedPose {
    pub frame_index: u64,
    /// Same keys as the input frame, transformed positions and depths.
    pub landmarks: BTreeMap<BodyLandmark, Landmark>,
    /// Anchor position in input coordinates.
    pub anchor: Point2<f32>,
    /// Rotation applied to the centred coordinates (radians, counter-clockwise).
    pub rotation: f32,
    /// Input-unit length of the scale reference divided by `target_scale`.
    pub scale: f32,
}

impl NormalizedPose {
    #[inline]
    pub fn get(&self, id: BodyLandmark) -> Option<&Landmark> {
        self.landmarks.get(&id)
    }
}

/// Wrap a line direction into `(-π/2, π/2]`.
///
/// A landmark pair defines a line, not an arrow; folding the angle keeps the
/// body upright when the subject faces the camera (left shoulder on the image
/// right).
fn line_tilt(v: Vector2<f32>) -> f32 {
    let mut angle = v.y.atan2(v.x);
    if angle > FRAC_PI_2 {
        angle -= PI;
    } else if angle <= -FRAC_PI_2 {
        angle += PI;
    }
    angle
}

#[inline]
fn is_finite(p: Point2<f32>) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

struct Gate<'a> {
    frame: &'a PoseFrame,
    min_confidence: f32,
}

impl Gate<'_> {
    fn point(&self, id: BodyLandmark) -> Option<Point2<f32>> {
        match self.frame.get(id) {
            Some(lm) if lm.confidence >= self.min_confidence && is_finite(lm.position) => {
                Some(lm.position)
            }
            Some(lm) => {
                debug!(
                    "frame {}: {:?} below confidence gate ({:.2} < {:.2})",
                    self.frame.frame_index, id, lm.confidence, self.min_confidence
                );
                None
            }
            None => {
                debug!("frame {}: {:?} missing", self.frame.frame_index, id);
                None
            }
        }
    }

    fn midpoint(&self, a: BodyLandmark, b: BodyLandmark) -> Option<Point2<f32>> {
        let pa = self.point(a)?;
        let pb = self.point(b)?;
        Some(nalgebra::center(&pa, &pb))
    }

    fn centroid(&self) -> Option<Point2<f32>> {
        let mut sum = Vector2::zeros();
        let mut n = 0usize;
        for lm in self.frame.landmarks.values() {
            if lm.confidence >= self.min_confidence && is_finite(lm.position) {
                sum += lm.position.coords;
                n += 1;
            }
        }
        (n > 0).then(|| Point2::from(sum / n as f32))
    }

    fn anchor(&self, anchor: Anchor) -> Option<Point2<f32>> {
        match anchor {
            Anchor::HipMidpoint => self.midpoint(BodyLandmark::LeftHip, BodyLandmark::RightHip),
            Anchor::ShoulderMidpoint => {
                self.midpoint(BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder)
            }
            Anchor::Centroid => self.centroid(),
            Anchor::Landmark(id) => self.point(id),
        }
    }
}

/// Vertical extent from the nose to the lower ankle, in the rotated frame.
fn body_height(gate: &Gate<'_>, to_body: impl Fn(Point2<f32>) -> Point2<f32>) -> Option<f32> {
    let head = to_body(gate.point(BodyLandmark::Nose)?);
    let foot_y = [BodyLandmark::LeftAnkle, BodyLandmark::RightAnkle]
        .into_iter()
        .filter_map(|id| gate.point(id))
        .map(|p| to_body(p).y)
        .fold(None, |acc: Option<f32>, y| Some(acc.map_or(y, |a| a.max(y))))?;
    Some((head.y - foot_y).abs())
}

/// Normalize one frame; `None` when the frame cannot be normalized.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, params), fields(frame = frame.frame_index))
)]
pub fn normalize_pose(frame: &PoseFrame, params: &NormalizerParams) -> Option<NormalizedPose> {
    let pose = normalize_checked(frame, params);
    if pose.is_none() {
        warn!("frame {}: normalization unavailable", frame.frame_index);
    }
    pose
}

fn normalize_checked(frame: &PoseFrame, params: &NormalizerParams) -> Option<NormalizedPose> {
    if !(params.target_scale > 0.0) {
        debug!("non-positive target scale {}", params.target_scale);
        return None;
    }

    let gate = Gate {
        frame,
        min_confidence: params.min_confidence,
    };

    let anchor = gate.anchor(params.anchor)?;

    let left_shoulder = gate.point(BodyLandmark::LeftShoulder)?;
    let right_shoulder = gate.point(BodyLandmark::RightShoulder)?;
    let shoulder_line = right_shoulder - left_shoulder;
    if shoulder_line.norm() < params.min_reference_distance {
        debug!("frame {}: degenerate shoulder line", frame.frame_index);
        return None;
    }

    let rotation = -line_tilt(shoulder_line);
    let rot = Rotation2::new(rotation);
    let to_body = |p: Point2<f32>| Point2::from(rot * (p - anchor));

    let reference = match params.scale_reference {
        ScaleReference::ShoulderWidth => shoulder_line.norm(),
        ScaleReference::HipWidth => {
            let l = gate.point(BodyLandmark::LeftHip)?;
            let r = gate.point(BodyLandmark::RightHip)?;
            (r - l).norm()
        }
        ScaleReference::BodyHeight => body_height(&gate, to_body)?,
    };
    if !(reference >= params.min_reference_distance) {
        debug!(
            "frame {}: reference distance {reference} too small",
            frame.frame_index
        );
        return None;
    }

    let scale = reference / params.target_scale;
    let landmarks = frame
        .landmarks
        .iter()
        .map(|(&id, lm)| {
            let p = to_body(lm.position);
            let out = Landmark {
                position: Point2::new(p.x / scale, p.y / scale),
                depth: lm.depth.map(|d| d / scale),
                confidence: lm.confidence,
            };
            (id, out)
        })
        .collect();

    Some(NormalizedPose {
        frame_index: frame.frame_index,
        landmarks,
        anchor,
        rotation,
        scale,
    })
}

/// Normalize many frames independently, preserving input order.
///
/// Runs on the rayon thread pool when the `rayon` feature is enabled.
#[cfg(feature = "rayon")]
pub fn normalize_frames(
    frames: &[PoseFrame],
    params: &NormalizerParams,
) -> Vec<Option<NormalizedPose>> {
    frames
        .par_iter()
        .map(|frame| normalize_pose(frame, params))
        .collect()
}

/// Normalize many frames independently, preserving input order.
#[cfg(not(feature = "rayon"))]
pub fn normalize_frames(
    frames: &[PoseFrame],
    params: &NormalizerParams,
) -> Vec<Option<NormalizedPose>> {
    frames
        .iter()
        .map(|frame| normalize_pose(frame, params))
        .collect()
}
