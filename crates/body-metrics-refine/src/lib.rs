//! Measurement refinement.
//!
//! Turns a noisy per-frame stream of raw [`MeasurementPoint`]s into one
//! calibrated value per body dimension plus a quality report:
//!
//! ```text
//! frame -> extractor -> per-type ring buffers -> (session end)
//!   -> confidence gate -> IQR + z-score outliers -> depth/scale correction
//!   -> recency-weighted smoothing -> quality scoring -> BodyProfile + SessionReport
//! ```
//!
//! Every stage except the [`SessionProcessor`] is a pure function and can be
//! used on its own.
//!
//! [`MeasurementPoint`]: body_metrics_core::MeasurementPoint

mod calibration;
mod correction;
mod io;
mod outlier;
mod quality;
mod session;
mod smoothing;
mod validation;

pub use calibration::{
    Calibration, CalibrationError, CalibrationStatus, CalibrationStore, DepthConvention,
    DEFAULT_REFERENCE_DEPTH,
};
pub use correction::DepthCorrector;
pub use io::{load_frames_json, IoError, SessionConfig};
pub use outlier::{filter_outliers, OutlierOutcome, OutlierReason};
pub use quality::{
    completeness_score, consistency_score, detection_score, sample_score, QualityParams,
    QualityScores, Recommendation, ScoreWeights, TypeQuality,
};
pub use session::{
    BodyProfile, FrameOutcome, IngestTally, InvalidMeasurement, MeasurementStatus, SessionError,
    SessionOutput, SessionParams, SessionProcessor, SessionReport, SessionState, TypeReport,
};
pub use smoothing::{smooth, RecencyDecay};
pub use validation::{PlausibilityIssue, PlausibilityRanges};
