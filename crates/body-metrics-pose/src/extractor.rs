//! Raw body measurements from one landmark frame.
//!
//! [`MeasurementExtractor`] is the seam between the pose model and the
//! refinement pipeline: anything that can turn a frame into typed
//! [`MeasurementPoint`]s can feed a session. [`SkeletonExtractor`] is the
//! default implementation working on raw image coordinates.

use body_metrics_core::{BodyLandmark, MeasurementPoint, MeasurementType, PoseFrame};
use nalgebra::Point2;

/// Converts one landmark frame into raw measurement points.
///
/// Implementations must be cheap relative to a frame interval and must not
/// block; one point per measurement type at most.
pub trait MeasurementExtractor {
    fn extract(&self, frame: &PoseFrame) -> Vec<MeasurementPoint>;
}

impl<F> MeasurementExtractor for F
where
    F: Fn(&PoseFrame) -> Vec<MeasurementPoint>,
{
    fn extract(&self, frame: &PoseFrame) -> Vec<MeasurementPoint> {
        self(frame)
    }
}

/// Skeleton-distance extractor in detector-native units (pixels).
///
/// A dimension is emitted only when every landmark it needs is present; for
/// bilateral limbs one visible side is enough. Confidence is the mean of the
/// contributing landmarks' confidences and depth is the frame's estimate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkeletonExtractor;

struct Acc {
    value: f64,
    conf_sum: f64,
    conf_n: usize,
}

impl Acc {
    fn confidence(&self) -> f64 {
        if self.conf_n == 0 {
            0.0
        } else {
            self.conf_sum / self.conf_n as f64
        }
    }
}

impl SkeletonExtractor {
    fn lm(frame: &PoseFrame, id: BodyLandmark) -> Option<(Point2<f64>, f64)> {
        let lm = frame.get(id)?;
        Some((lm.position.cast::<f64>(), lm.confidence as f64))
    }

    fn dist(frame: &PoseFrame, a: BodyLandmark, b: BodyLandmark) -> Option<Acc> {
        let (pa, ca) = Self::lm(frame, a)?;
        let (pb, cb) = Self::lm(frame, b)?;
        Some(Acc {
            value: (pb - pa).norm(),
            conf_sum: ca + cb,
            conf_n: 2,
        })
    }

    /// Two-segment chain length, e.g. shoulder -> elbow -> wrist.
    fn chain(frame: &PoseFrame, a: BodyLandmark, b: BodyLandmark, c: BodyLandmark) -> Option<Acc> {
        let (pa, ca) = Self::lm(frame, a)?;
        let (pb, cb) = Self::lm(frame, b)?;
        let (pc, cc) = Self::lm(frame, c)?;
        Some(Acc {
            value: (pb - pa).norm() + (pc - pb).norm(),
            conf_sum: ca + cb + cc,
            conf_n: 3,
        })
    }

    fn bilateral(left: Option<Acc>, right: Option<Acc>) -> Option<Acc> {
        match (left, right) {
            (Some(l), Some(r)) => Some(Acc {
                value: 0.5 * (l.value + r.value),
                conf_sum: l.conf_sum + r.conf_sum,
                conf_n: l.conf_n + r.conf_n,
            }),
            (Some(one), None) | (None, Some(one)) => Some(one),
            (None, None) => None,
        }
    }

    fn midpoint(frame: &PoseFrame, a: BodyLandmark, b: BodyLandmark) -> Option<(Point2<f64>, f64)> {
        let (pa, ca) = Self::lm(frame, a)?;
        let (pb, cb) = Self::lm(frame, b)?;
        Some((nalgebra::center(&pa, &pb), ca + cb))
    }

    fn measure(frame: &PoseFrame, ty: MeasurementType) -> Option<Acc> {
        use BodyLandmark::*;
        match ty {
            MeasurementType::Height => {
                let (nose, cn) = Self::lm(frame, Nose)?;
                let (ankles, ca) = Self::midpoint(frame, LeftAnkle, RightAnkle)?;
                Some(Acc {
                    value: (nose.y - ankles.y).abs(),
                    conf_sum: cn + ca,
                    conf_n: 3,
                })
            }
            MeasurementType::ShoulderWidth => Self::dist(frame, LeftShoulder, RightShoulder),
            MeasurementType::TorsoLength => {
                let (shoulders, cs) = Self::midpoint(frame, LeftShoulder, RightShoulder)?;
                let (hips, ch) = Self::midpoint(frame, LeftHip, RightHip)?;
                Some(Acc {
                    value: (shoulders.y - hips.y).abs(),
                    conf_sum: cs + ch,
                    conf_n: 4,
                })
            }
            MeasurementType::ArmLength => Self::bilateral(
                Self::chain(frame, LeftShoulder, LeftElbow, LeftWrist),
                Self::chain(frame, RightShoulder, RightElbow, RightWrist),
            ),
            MeasurementType::HipWidth => Self::dist(frame, LeftHip, RightHip),
            MeasurementType::LegLength => Self::bilateral(
                Self::chain(frame, LeftHip, LeftKnee, LeftAnkle),
                Self::chain(frame, RightHip, RightKnee, RightAnkle),
            ),
        }
    }
}

impl MeasurementExtractor for SkeletonExtractor {
    fn extract(&self, frame: &PoseFrame) -> Vec<MeasurementPoint> {
        MeasurementType::ALL
            .into_iter()
            .filter_map(|ty| {
                let acc = Self::measure(frame, ty)?;
                if !(acc.value > 0.0) {
                    return None;
                }
                Some(MeasurementPoint {
                    timestamp: frame.timestamp,
                    frame_index: frame.frame_index,
                    measurement_type: ty,
                    value: acc.value,
                    confidence: acc.confidence().clamp(0.0, 1.0),
                    depth_estimate: frame.depth_estimate,
                })
            })
            .collect()
    }
}
