//! Scanning session: buffering during capture, refinement at the end.
//!
//! [`SessionProcessor`] owns one bounded buffer per [`MeasurementType`] and
//! walks `Idle -> Scanning -> Finalizing -> Idle`. Ingestion is O(1) per point;
//! all statistics run once, in [`SessionProcessor::end_scanning_session`].
//!
//! [`MeasurementType`]: body_metrics_core::MeasurementType

mod buffers;
mod error;
mod finalize;
mod params;
mod processor;
mod result;

pub use buffers::IngestTally;
pub use error::{InvalidMeasurement, SessionError};
pub use params::SessionParams;
pub use processor::SessionProcessor;
pub use result::{
    BodyProfile, FrameOutcome, MeasurementStatus, SessionOutput, SessionReport, SessionState,
    TypeReport,
};
