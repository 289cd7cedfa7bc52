use std::collections::BTreeMap;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Named whole-body pose landmark.
///
/// The set and ordering follow the common 33-point body topology emitted by
/// off-the-shelf pose models, so `index()` matches the detector's output slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyLandmark {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl BodyLandmark {
    pub const COUNT: usize = 33;

    pub const ALL: [BodyLandmark; Self::COUNT] = [
        BodyLandmark::Nose,
        BodyLandmark::LeftEyeInner,
        BodyLandmark::LeftEye,
        BodyLandmark::LeftEyeOuter,
        BodyLandmark::RightEyeInner,
        BodyLandmark::RightEye,
        BodyLandmark::RightEyeOuter,
        BodyLandmark::LeftEar,
        BodyLandmark::RightEar,
        BodyLandmark::MouthLeft,
        BodyLandmark::MouthRight,
        BodyLandmark::LeftShoulder,
        BodyLandmark::RightShoulder,
        BodyLandmark::LeftElbow,
        BodyLandmark::RightElbow,
        BodyLandmark::LeftWrist,
        BodyLandmark::RightWrist,
        BodyLandmark::LeftPinky,
        BodyLandmark::RightPinky,
        BodyLandmark::LeftIndex,
        BodyLandmark::RightIndex,
        BodyLandmark::LeftThumb,
        BodyLandmark::RightThumb,
        BodyLandmark::LeftHip,
        BodyLandmark::RightHip,
        BodyLandmark::LeftKnee,
        BodyLandmark::RightKnee,
        BodyLandmark::LeftAnkle,
        BodyLandmark::RightAnkle,
        BodyLandmark::LeftHeel,
        BodyLandmark::RightHeel,
        BodyLandmark::LeftFootIndex,
        BodyLandmark::RightFootIndex,
    ];

    /// Slot of this landmark in the detector's flat output array.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`BodyLandmark::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// One detected landmark in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Position in detector-native units (usually pixels, y pointing down).
    pub position: Point2<f32>,
    /// Optional relative depth reported by the detector.
    #[serde(default)]
    pub depth: Option<f32>,
    /// Detection confidence / visibility in [0, 1].
    pub confidence: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self {
            position: Point2::new(x, y),
            depth: None,
            confidence,
        }
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = Some(depth);
        self
    }
}

/// Landmarks detected in one camera frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Strictly increasing within a session.
    pub frame_index: u64,
    /// Capture time in seconds on a monotonic clock.
    pub timestamp: f64,
    pub landmarks: BTreeMap<BodyLandmark, Landmark>,
    /// Camera-to-subject distance for this frame, when a depth source exists.
    #[serde(default)]
    pub depth_estimate: Option<f64>,
}

impl PoseFrame {
    pub fn new(frame_index: u64, timestamp: f64) -> Self {
        Self {
            frame_index,
            timestamp,
            landmarks: BTreeMap::new(),
            depth_estimate: None,
        }
    }

    /// Build a frame from the detector's flat 33-slot output.
    ///
    /// Entries beyond the known topology are ignored.
    pub fn from_slots(frame_index: u64, timestamp: f64, slots: &[Option<Landmark>]) -> Self {
        let landmarks = slots
            .iter()
            .enumerate()
            .filter_map(|(i, lm)| Some((BodyLandmark::from_index(i)?, (*lm)?)))
            .collect();
        Self {
            frame_index,
            timestamp,
            landmarks,
            depth_estimate: None,
        }
    }

    pub fn with_landmark(mut self, id: BodyLandmark, landmark: Landmark) -> Self {
        self.landmarks.insert(id, landmark);
        self
    }

    #[inline]
    pub fn get(&self, id: BodyLandmark) -> Option<&Landmark> {
        self.landmarks.get(&id)
    }
}
