//! Pose-space utilities.
//!
//! Current focus:
//! - per-frame landmark normalization (anchor centering, tilt removal,
//!   canonical scale),
//! - conversion of a landmark frame into typed raw body measurements.
//!
//! Both stages are stateless per frame; history and refinement live in
//! `body-metrics-refine`.

mod extractor;
mod normalizer;
mod params;

pub use extractor::{MeasurementExtractor, SkeletonExtractor};
pub use normalizer::{normalize_frames, normalize_pose, NormalizedPose};
pub use params::{Anchor, NormalizerParams, ScaleReference};
