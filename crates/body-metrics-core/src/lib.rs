//! Core types and utilities for body-measurement refinement.
//!
//! This crate is intentionally small. It holds the landmark and measurement
//! data model, a fixed-capacity sliding window and the descriptive
//! statistics shared by the pose and refinement crates. It does *not*
//! depend on any concrete pose detector.

mod landmark;
mod logger;
mod measurement;
mod stats;
mod window;

pub use landmark::{BodyLandmark, Landmark, PoseFrame};
pub use measurement::{MeasurementPoint, MeasurementType};
pub use stats::{coefficient_of_variation, mean, quantile_sorted, std_dev, weighted_mean};
pub use window::RingWindow;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
