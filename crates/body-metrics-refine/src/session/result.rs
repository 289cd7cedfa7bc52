use std::collections::BTreeMap;
use std::fmt;

use body_metrics_core::MeasurementType;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationStatus;
use crate::quality::{QualityScores, Recommendation, TypeQuality};
use crate::validation::PlausibilityIssue;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Scanning,
    Finalizing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Idle => "idle",
            SessionState::Scanning => "scanning",
            SessionState::Finalizing => "finalizing",
        })
    }
}

/// Points accepted and refused for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementStatus {
    Measured,
    /// Too few points survived gating and outlier rejection.
    InsufficientData { surviving: usize, required: usize },
}

/// Per-type diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeReport {
    pub measurement_type: MeasurementType,
    /// Points in the buffer at session end.
    pub buffered: usize,
    /// Points refused at ingestion.
    pub invalid: usize,
    /// Points evicted by the window or age bound.
    pub evicted: usize,
    pub low_confidence: usize,
    pub iqr_rejected: usize,
    pub zscore_rejected: usize,
    pub outliers_rejected: usize,
    pub surviving: usize,
    /// Coefficient of variation of the corrected surviving values.
    pub cv: Option<f64>,
    pub mean_confidence: Option<f64>,
    pub status: MeasurementStatus,
    pub quality: TypeQuality,
}

/// Final calibrated body dimensions of one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyProfile {
    pub user_id: String,
    /// Types without enough data are absent.
    pub measurements: BTreeMap<MeasurementType, f64>,
    /// Overall quality score in [0, 10].
    pub calibration_quality: f64,
    pub type_quality: BTreeMap<MeasurementType, TypeQuality>,
    pub scale_factor_used: f64,
    pub calibration_version: String,
    pub units: String,
    /// Seconds since the UNIX epoch.
    pub created_at: f64,
}

impl BodyProfile {
    pub fn get(&self, ty: MeasurementType) -> Option<f64> {
        self.measurements.get(&ty).copied()
    }
}

/// Diagnostic companion of a [`BodyProfile`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub user_id: String,
    pub frames_processed: u64,
    pub frames_without_measurements: u64,
    /// One entry per type, in [`MeasurementType::ALL`] order.
    pub types: Vec<TypeReport>,
    pub scores: QualityScores,
    pub recommendation: Recommendation,
    pub calibration: CalibrationStatus,
    #[serde(default)]
    pub issues: Vec<PlausibilityIssue>,
}

impl SessionReport {
    pub fn type_report(&self, ty: MeasurementType) -> Option<&TypeReport> {
        self.types.iter().find(|r| r.measurement_type == ty)
    }

    /// Outliers rejected across all types.
    pub fn outliers_rejected(&self) -> usize {
        self.types.iter().map(|r| r.outliers_rejected).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionOutput {
    pub profile: BodyProfile,
    pub report: SessionReport,
}
