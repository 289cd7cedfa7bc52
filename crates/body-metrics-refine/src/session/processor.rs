use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use body_metrics_core::{MeasurementPoint, MeasurementType, PoseFrame};
use body_metrics_pose::{MeasurementExtractor, SkeletonExtractor};
use log::info;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::buffers::SessionBuffers;
use super::error::SessionError;
use super::finalize::refine_type;
use super::params::SessionParams;
use super::result::{
    BodyProfile, FrameOutcome, SessionOutput, SessionReport, SessionState, TypeReport,
};
use crate::calibration::CalibrationStore;
use crate::correction::DepthCorrector;
use crate::quality::{QualityScores, Recommendation, TypeQuality};
use crate::smoothing::{smooth, RecencyDecay};

/// Stateful driver of one scanning session at a time.
///
/// Single-threaded by construction: every mutating call takes `&mut self`.
/// Calls made in the wrong state fail with
/// [`SessionError::InvalidSessionState`] and leave the state untouched.
pub struct SessionProcessor<E = SkeletonExtractor> {
    extractor: E,
    calibration: CalibrationStore,
    corrector: DepthCorrector,
    params: SessionParams,
    state: SessionState,
    buffers: SessionBuffers,
    frames_processed: u64,
    frames_without_measurements: u64,
}

impl SessionProcessor<SkeletonExtractor> {
    pub fn new(calibration: CalibrationStore, params: SessionParams) -> Self {
        Self::with_extractor(SkeletonExtractor, calibration, params)
    }
}

impl<E: MeasurementExtractor> SessionProcessor<E> {
    pub fn with_extractor(
        extractor: E,
        calibration: CalibrationStore,
        params: SessionParams,
    ) -> Self {
        let corrector = calibration.corrector();
        let buffers = SessionBuffers::new(params.window_size, params.max_age_s);
        Self {
            extractor,
            calibration,
            corrector,
            params,
            state: SessionState::Idle,
            buffers,
            frames_processed: 0,
            frames_without_measurements: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    #[inline]
    pub fn calibration(&self) -> &CalibrationStore {
        &self.calibration
    }

    fn require(
        &self,
        expected: SessionState,
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidSessionState {
                operation,
                state: self.state,
            })
        }
    }

    fn reset(&mut self) {
        self.buffers = SessionBuffers::new(self.params.window_size, self.params.max_age_s);
        self.frames_processed = 0;
        self.frames_without_measurements = 0;
    }

    /// `Idle -> Scanning`; clears every buffer.
    pub fn start_scanning_session(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Idle, "start_scanning_session")?;
        self.reset();
        self.state = SessionState::Scanning;
        info!("scanning session started");
        Ok(())
    }

    /// Extract and buffer the measurements of one frame.
    ///
    /// Invalid points are dropped and tallied; they never fail the call.
    pub fn process_frame(&mut self, frame: &PoseFrame) -> Result<FrameOutcome, SessionError> {
        self.require(SessionState::Scanning, "process_frame")?;
        self.frames_processed += 1;

        let points = self.extractor.extract(frame);
        if points.is_empty() {
            self.frames_without_measurements += 1;
        }
        let mut outcome = FrameOutcome::default();
        for point in points {
            match self.buffers.ingest(point) {
                Ok(()) => outcome.accepted += 1,
                Err(_) => outcome.rejected += 1,
            }
        }
        Ok(outcome)
    }

    /// Buffer one externally produced point.
    pub fn ingest_point(&mut self, point: MeasurementPoint) -> Result<(), SessionError> {
        self.require(SessionState::Scanning, "ingest_point")?;
        self.buffers.ingest(point)?;
        Ok(())
    }

    /// Buffered raw points of `ty`, oldest first.
    pub fn buffered_points(&self, ty: MeasurementType) -> Vec<MeasurementPoint> {
        self.buffers.get(ty).points().copied().collect()
    }

    pub fn buffered_len(&self, ty: MeasurementType) -> usize {
        self.buffers.get(ty).len()
    }

    /// Live, unfiltered estimate from the most recent frames.
    ///
    /// Confidence-weighted mean of the corrected values of points from the
    /// last `live_window_frames` frames. No outlier rejection is applied.
    pub fn current_estimates(&self) -> Result<BTreeMap<MeasurementType, f64>, SessionError> {
        self.require(SessionState::Scanning, "current_estimates")?;
        let Some(latest) = self.buffers.latest_frame() else {
            return Ok(BTreeMap::new());
        };
        let span = self.params.live_window_frames.max(1);
        let first = latest.saturating_sub(span - 1);

        let mut out = BTreeMap::new();
        for ty in MeasurementType::ALL {
            let recent: Vec<MeasurementPoint> = self
                .buffers
                .get(ty)
                .points()
                .rev()
                .take_while(|p| p.frame_index >= first)
                .map(|p| self.corrector.correct_point(p))
                .collect();
            if let Some(v) = smooth(&recent, &RecencyDecay::None) {
                out.insert(ty, v);
            }
        }
        Ok(out)
    }

    /// `Scanning -> Finalizing -> Idle`: refine every buffer into a profile and report.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self), fields(frames = self.frames_processed))
    )]
    pub fn end_scanning_session(&mut self, user_id: &str) -> Result<SessionOutput, SessionError> {
        self.require(SessionState::Scanning, "end_scanning_session")?;
        self.state = SessionState::Finalizing;

        let mut measurements = BTreeMap::new();
        let mut type_quality = BTreeMap::new();
        let mut reports: Vec<TypeReport> = Vec::with_capacity(MeasurementType::COUNT);
        let mut per_type = [(TypeQuality::default(), false); MeasurementType::COUNT];

        for ty in MeasurementType::ALL {
            let (value, report) =
                refine_type(ty, self.buffers.get(ty), &self.corrector, &self.params);
            if let Some(v) = value {
                measurements.insert(ty, v);
            }
            type_quality.insert(ty, report.quality);
            per_type[ty.index()] = (report.quality, value.is_some());
            reports.push(report);
        }

        let scores = QualityScores::aggregate(&per_type, &self.params.quality);
        let recommendation = Recommendation::from_score(scores.overall);
        let cal = self.calibration.calibration();

        let issues = match &self.params.plausibility {
            Some(ranges) if self.calibration.is_available() => {
                ranges.check(&measurements, &cal.units)
            }
            _ => Vec::new(),
        };

        let profile = BodyProfile {
            user_id: user_id.to_string(),
            measurements,
            calibration_quality: scores.overall,
            type_quality,
            scale_factor_used: cal.scale_factor,
            calibration_version: cal.version.clone(),
            units: cal.units.clone(),
            created_at: unix_now(),
        };
        let report = SessionReport {
            user_id: user_id.to_string(),
            frames_processed: self.frames_processed,
            frames_without_measurements: self.frames_without_measurements,
            types: reports,
            scores,
            recommendation,
            calibration: self.calibration.status().clone(),
            issues,
        };

        info!(
            "session for {user_id} finished: {} of {} dimensions, quality {:.1} ({})",
            profile.measurements.len(),
            MeasurementType::COUNT,
            scores.overall,
            recommendation.message()
        );

        self.reset();
        self.state = SessionState::Idle;
        Ok(SessionOutput { profile, report })
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
