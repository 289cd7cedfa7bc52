use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported body dimensions.
///
/// The set is closed; every per-type table in the workspace is indexed by
/// [`MeasurementType::index`] so adding a variant is a compile-visible change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementType {
    Height,
    ShoulderWidth,
    TorsoLength,
    ArmLength,
    HipWidth,
    LegLength,
}

impl MeasurementType {
    pub const COUNT: usize = 6;

    pub const ALL: [MeasurementType; Self::COUNT] = [
        MeasurementType::Height,
        MeasurementType::ShoulderWidth,
        MeasurementType::TorsoLength,
        MeasurementType::ArmLength,
        MeasurementType::HipWidth,
        MeasurementType::LegLength,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            MeasurementType::Height => 0,
            MeasurementType::ShoulderWidth => 1,
            MeasurementType::TorsoLength => 2,
            MeasurementType::ArmLength => 3,
            MeasurementType::HipWidth => 4,
            MeasurementType::LegLength => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MeasurementType::Height => "height",
            MeasurementType::ShoulderWidth => "shoulder_width",
            MeasurementType::TorsoLength => "torso_length",
            MeasurementType::ArmLength => "arm_length",
            MeasurementType::HipWidth => "hip_width",
            MeasurementType::LegLength => "leg_length",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One raw observation of a body dimension, produced once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    /// Capture time in seconds on a monotonic clock.
    pub timestamp: f64,
    pub frame_index: u64,
    pub measurement_type: MeasurementType,
    /// Raw value in detector-native units, before calibration.
    pub value: f64,
    /// Detection confidence in [0, 1].
    pub confidence: f64,
    /// Camera-relative distance; `None` means "at the calibration reference depth".
    #[serde(default)]
    pub depth_estimate: Option<f64>,
}

impl MeasurementPoint {
    pub fn new(
        measurement_type: MeasurementType,
        frame_index: u64,
        timestamp: f64,
        value: f64,
        confidence: f64,
    ) -> Self {
        Self {
            timestamp,
            frame_index,
            measurement_type,
            value,
            confidence,
            depth_estimate: None,
        }
    }

    pub fn with_depth(mut self, depth: f64) -> Self {
        self.depth_estimate = Some(depth);
        self
    }
}
