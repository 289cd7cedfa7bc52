//! High-level facade crate for the `body-metrics-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the underlying crates
//! - an end-to-end [`replay`] helper that runs a recorded frame stream through
//!   a scanning session
//! - (feature `cli`) the `body-metrics` command-line tool
//!
//! ## Quickstart
//!
//! ```no_run
//! use body_metrics::refine::{CalibrationStore, SessionParams, SessionProcessor};
//! use body_metrics::replay::replay_frames;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frames = body_metrics::refine::load_frames_json("frames.json")?;
//! let calibration = CalibrationStore::load_json_or_fallback("calibration.json");
//! let mut processor = SessionProcessor::new(calibration, SessionParams::default());
//!
//! let out = replay_frames(&mut processor, &frames, "user-42")?;
//! println!(
//!     "quality {:.1}: {}",
//!     out.profile.calibration_quality,
//!     out.report.recommendation.message()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `body_metrics::core`: landmarks, measurement points, ring window, statistics.
//! - `body_metrics::pose`: landmark normalization and measurement extraction.
//! - `body_metrics::refine`: calibration, outlier rejection, smoothing, scoring, sessions.
//! - `body_metrics::replay`: offline replay of recorded frame streams.

pub use body_metrics_core as core;
pub use body_metrics_pose as pose;
pub use body_metrics_refine as refine;

pub use body_metrics_core::{MeasurementPoint, MeasurementType, PoseFrame};
pub use body_metrics_refine::{BodyProfile, SessionOutput, SessionProcessor, SessionReport};

pub mod replay;
