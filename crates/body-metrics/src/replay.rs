//! Offline replay of recorded frame streams.

use body_metrics_core::PoseFrame;
use body_metrics_pose::MeasurementExtractor;
use body_metrics_refine::{IoError, SessionConfig, SessionError, SessionOutput, SessionProcessor};
use log::{debug, info};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Run `frames` through one complete session on `processor`.
///
/// The processor must be idle; it is idle again afterwards.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(processor, frames), fields(frames = frames.len()))
)]
pub fn replay_frames<E: MeasurementExtractor>(
    processor: &mut SessionProcessor<E>,
    frames: &[PoseFrame],
    user_id: &str,
) -> Result<SessionOutput, ReplayError> {
    processor.start_scanning_session()?;
    let mut rejected = 0usize;
    for frame in frames {
        rejected += processor.process_frame(frame)?.rejected;
    }
    if rejected > 0 {
        debug!("{rejected} points rejected during replay");
    }
    Ok(processor.end_scanning_session(user_id)?)
}

/// Load everything a [`SessionConfig`] points at and replay it.
pub fn run_config(cfg: &SessionConfig) -> Result<SessionOutput, ReplayError> {
    let frames = cfg.load_frames()?;
    info!("replaying {} frames from {}", frames.len(), cfg.frames_path);
    let mut processor = cfg.build_processor();
    replay_frames(&mut processor, &frames, &cfg.user_id)
}
