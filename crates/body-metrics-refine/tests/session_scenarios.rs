use approx::assert_abs_diff_eq;
use body_metrics_core::{BodyLandmark, Landmark, MeasurementPoint, MeasurementType, PoseFrame};
use body_metrics_refine::{
    Calibration, CalibrationStatus, CalibrationStore, MeasurementStatus, Recommendation,
    SessionError, SessionOutput, SessionParams, SessionProcessor, SessionState,
};

fn calibrated() -> CalibrationStore {
    CalibrationStore::new(Calibration::new(1.0, 2.0))
}

fn started(calibration: CalibrationStore, params: SessionParams) -> SessionProcessor {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut processor = SessionProcessor::new(calibration, params);
    processor.start_scanning_session().expect("start");
    processor
}

fn point(ty: MeasurementType, frame: u64, value: f64) -> MeasurementPoint {
    MeasurementPoint::new(ty, frame, frame as f64 / 30.0, value, 0.9).with_depth(2.0)
}

/// Upright subject facing the camera, pixel coordinates with y down.
fn body_frame(frame: u64, nose_jitter: f32) -> PoseFrame {
    use BodyLandmark::*;
    let lm = |x, y| Landmark::new(x, y, 0.9);
    let mut f = PoseFrame::new(frame, frame as f64 / 30.0)
        .with_landmark(Nose, lm(200.0, 100.0 + nose_jitter))
        .with_landmark(LeftShoulder, lm(160.0, 160.0))
        .with_landmark(RightShoulder, lm(240.0, 160.0))
        .with_landmark(LeftElbow, lm(150.0, 220.0))
        .with_landmark(RightElbow, lm(250.0, 220.0))
        .with_landmark(LeftWrist, lm(150.0, 280.0))
        .with_landmark(RightWrist, lm(250.0, 280.0))
        .with_landmark(LeftHip, lm(170.0, 300.0))
        .with_landmark(RightHip, lm(230.0, 300.0))
        .with_landmark(LeftKnee, lm(170.0, 380.0))
        .with_landmark(RightKnee, lm(230.0, 380.0))
        .with_landmark(LeftAnkle, lm(170.0, 460.0))
        .with_landmark(RightAnkle, lm(230.0, 460.0));
    f.depth_estimate = Some(2.0);
    f
}

#[test]
fn constant_shoulder_width_is_reported_exactly() {
    let mut processor = started(calibrated(), SessionParams::default());
    for frame in 0..10 {
        processor
            .ingest_point(point(MeasurementType::ShoulderWidth, frame, 40.0))
            .unwrap();
    }
    let SessionOutput { profile, report } = processor.end_scanning_session("user-1").unwrap();

    let width = profile.get(MeasurementType::ShoulderWidth).unwrap();
    assert_abs_diff_eq!(width, 40.0, epsilon = 1e-9);

    let shoulders = report.type_report(MeasurementType::ShoulderWidth).unwrap();
    assert_eq!(shoulders.status, MeasurementStatus::Measured);
    assert_eq!(shoulders.surviving, 10);
    assert_eq!(shoulders.outliers_rejected, 0);
    assert_eq!(shoulders.cv, Some(0.0));
    assert_eq!(shoulders.quality.consistency_score, 10.0);
    assert_eq!(shoulders.quality.sample_score, 10.0);

    // Only one dimension was observed.
    assert_eq!(profile.measurements.len(), 1);
    assert_abs_diff_eq!(report.scores.completeness, 10.0 / 6.0, epsilon = 1e-9);
    assert!((0.0..=10.0).contains(&profile.calibration_quality));
    assert_eq!(report.calibration, CalibrationStatus::Loaded);
}

#[test]
fn extreme_outlier_is_rejected_and_counted() {
    let values = [39.8, 40.1, 40.0, 39.9, 400.0, 40.2, 40.0, 39.9, 40.1, 40.0];
    let mut processor = started(calibrated(), SessionParams::default());
    for (frame, &v) in values.iter().enumerate() {
        processor
            .ingest_point(point(MeasurementType::ShoulderWidth, frame as u64, v))
            .unwrap();
    }
    let out = processor.end_scanning_session("user-2").unwrap();

    let width = out.profile.get(MeasurementType::ShoulderWidth).unwrap();
    assert_abs_diff_eq!(width, 40.0, epsilon = 0.2);
    assert_eq!(out.report.outliers_rejected(), 1);
    let shoulders = out.report.type_report(MeasurementType::ShoulderWidth).unwrap();
    assert_eq!(shoulders.iqr_rejected, 1);
    assert_eq!(shoulders.surviving, 9);
}

#[test]
fn process_frame_while_idle_is_an_error() {
    let mut processor = SessionProcessor::new(calibrated(), SessionParams::default());
    let err = processor.process_frame(&body_frame(0, 0.0)).unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidSessionState {
            state: SessionState::Idle,
            ..
        }
    ));
    assert_eq!(processor.state(), SessionState::Idle);
    for ty in MeasurementType::ALL {
        assert_eq!(processor.buffered_len(ty), 0, "{ty}");
    }
}

#[test]
fn ending_twice_fails() {
    let mut processor = started(calibrated(), SessionParams::default());
    processor.end_scanning_session("u").unwrap();
    assert!(matches!(
        processor.end_scanning_session("u"),
        Err(SessionError::InvalidSessionState {
            operation: "end_scanning_session",
            state: SessionState::Idle
        })
    ));
}

#[test]
fn too_few_samples_leave_the_value_absent() {
    let mut processor = started(calibrated(), SessionParams::default());
    for frame in 0..3 {
        processor
            .ingest_point(point(MeasurementType::ArmLength, frame, 60.0))
            .unwrap();
    }
    let out = processor.end_scanning_session("u").unwrap();
    assert_eq!(out.profile.get(MeasurementType::ArmLength), None);
    let arm = out.report.type_report(MeasurementType::ArmLength).unwrap();
    assert_eq!(
        arm.status,
        MeasurementStatus::InsufficientData {
            surviving: 3,
            required: 5
        }
    );
    assert!(arm.quality.sample_score < 10.0);
    assert_eq!(out.report.scores.completeness, 0.0);
    assert_eq!(out.report.recommendation, Recommendation::Poor);
}

#[test]
fn window_is_bounded_and_fifo() {
    let params = SessionParams {
        window_size: 5,
        ..SessionParams::default()
    };
    let mut processor = started(calibrated(), params);
    for frame in 0..12 {
        processor
            .ingest_point(point(MeasurementType::HipWidth, frame, 30.0 + frame as f64 * 0.01))
            .unwrap();
    }
    let frames: Vec<u64> = processor
        .buffered_points(MeasurementType::HipWidth)
        .iter()
        .map(|p| p.frame_index)
        .collect();
    assert_eq!(frames, vec![7, 8, 9, 10, 11]);

    let out = processor.end_scanning_session("u").unwrap();
    let hips = out.report.type_report(MeasurementType::HipWidth).unwrap();
    assert_eq!(hips.buffered, 5);
    assert_eq!(hips.evicted, 7);
}

#[test]
fn invalid_points_are_dropped_and_tallied() {
    let mut processor = started(calibrated(), SessionParams::default());
    let ty = MeasurementType::TorsoLength;
    assert!(processor.ingest_point(point(ty, 0, -3.0)).is_err());
    processor.ingest_point(point(ty, 1, 60.0)).unwrap();
    assert!(processor.ingest_point(point(ty, 1, 60.0)).is_err());
    assert_eq!(processor.state(), SessionState::Scanning);

    let out = processor.end_scanning_session("u").unwrap();
    let torso = out.report.type_report(ty).unwrap();
    assert_eq!(torso.invalid, 2);
    assert_eq!(torso.buffered, 1);
}

#[test]
fn low_confidence_points_are_gated() {
    let mut processor = started(calibrated(), SessionParams::default());
    let ty = MeasurementType::LegLength;
    for frame in 0..12 {
        let mut p = point(ty, frame, 90.0);
        if frame % 3 == 0 {
            p.confidence = 0.2;
            p.value = 10.0;
        }
        processor.ingest_point(p).unwrap();
    }
    let out = processor.end_scanning_session("u").unwrap();
    let legs = out.report.type_report(ty).unwrap();
    assert_eq!(legs.low_confidence, 4);
    assert_eq!(legs.surviving, 8);
    assert_abs_diff_eq!(out.profile.get(ty).unwrap(), 90.0, epsilon = 1e-9);
}

#[test]
fn depth_correction_restores_distant_subject() {
    let mut processor = started(calibrated(), SessionParams::default());
    for frame in 0..10 {
        let ty = MeasurementType::ShoulderWidth;
        let p = MeasurementPoint::new(ty, frame, frame as f64, 20.0, 0.9).with_depth(4.0);
        processor.ingest_point(p).unwrap();
    }
    let out = processor.end_scanning_session("u").unwrap();
    let width = out.profile.get(MeasurementType::ShoulderWidth).unwrap();
    assert_abs_diff_eq!(width, 40.0, epsilon = 1e-9);
}

#[test]
fn missing_calibration_falls_back_to_raw_units() {
    let dir = tempfile::tempdir().unwrap();
    let store = CalibrationStore::load_json_or_fallback(dir.path().join("absent.json"));
    let mut processor = started(store, SessionParams::default());
    for frame in 0..10 {
        // Depth would double the value under a real calibration.
        let p = point(MeasurementType::Height, frame, 900.0).with_depth(4.0);
        processor.ingest_point(p).unwrap();
    }
    let out = processor.end_scanning_session("u").unwrap();

    let height = out.profile.get(MeasurementType::Height).unwrap();
    assert_abs_diff_eq!(height, 900.0, epsilon = 1e-9);
    assert_eq!(out.profile.scale_factor_used, 1.0);
    assert_eq!(out.profile.units, "px");
    assert!(matches!(
        out.report.calibration,
        CalibrationStatus::Unavailable { .. }
    ));
    // Raw pixels are never checked against centimetre ranges.
    assert!(out.report.issues.is_empty());
}

#[test]
fn implausible_values_are_flagged_not_altered() {
    let mut processor = started(calibrated(), SessionParams::default());
    for frame in 0..10 {
        processor
            .ingest_point(point(MeasurementType::Height, frame, 300.0))
            .unwrap();
    }
    let out = processor.end_scanning_session("u").unwrap();
    let height = out.profile.get(MeasurementType::Height).unwrap();
    assert_abs_diff_eq!(height, 300.0, epsilon = 1e-9);
    assert_eq!(out.report.issues.len(), 1);
    assert_eq!(out.report.issues[0].measurement_type, MeasurementType::Height);
}

#[test]
fn full_pipeline_from_landmark_frames() {
    let mut processor = started(
        CalibrationStore::new(Calibration::new(0.5, 2.0)),
        SessionParams::default(),
    );
    for frame in 0..30 {
        let jitter = if frame % 2 == 0 { 1.0 } else { -1.0 };
        let outcome = processor.process_frame(&body_frame(frame, jitter)).unwrap();
        assert_eq!(outcome.accepted, MeasurementType::COUNT);
    }
    let empty = PoseFrame::new(30, 1.0);
    assert_eq!(processor.process_frame(&empty).unwrap().accepted, 0);

    let live = processor.current_estimates().unwrap();
    assert_eq!(live.len(), MeasurementType::COUNT);

    let out = processor.end_scanning_session("full").unwrap();
    assert_eq!(out.profile.measurements.len(), MeasurementType::COUNT);
    let value = |ty| out.profile.get(ty).unwrap();
    assert_abs_diff_eq!(value(MeasurementType::Height), 180.0, epsilon = 0.6);
    assert_abs_diff_eq!(value(MeasurementType::ShoulderWidth), 40.0, epsilon = 1e-6);
    assert_abs_diff_eq!(value(MeasurementType::TorsoLength), 70.0, epsilon = 1e-6);
    assert_abs_diff_eq!(value(MeasurementType::HipWidth), 30.0, epsilon = 1e-6);
    assert_abs_diff_eq!(value(MeasurementType::LegLength), 80.0, epsilon = 1e-6);

    assert_eq!(out.report.frames_processed, 31);
    assert_eq!(out.report.frames_without_measurements, 1);
    assert_eq!(out.report.scores.completeness, 10.0);
    assert!(out.report.issues.is_empty());
    assert!(matches!(
        out.report.recommendation,
        Recommendation::Excellent | Recommendation::Good
    ));
    assert_eq!(out.profile.scale_factor_used, 0.5);
    assert_eq!(processor.state(), SessionState::Idle);
}

#[test]
fn session_output_persists_as_json() {
    let mut processor = started(calibrated(), SessionParams::default());
    for frame in 0..6 {
        processor
            .ingest_point(point(MeasurementType::ShoulderWidth, frame, 41.0))
            .unwrap();
    }
    let out = processor.end_scanning_session("persist").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    out.write_json(&path).unwrap();
    let loaded = SessionOutput::load_json(&path).unwrap();
    assert_eq!(loaded.profile.user_id, "persist");
    assert_eq!(loaded.report.types.len(), MeasurementType::COUNT);
    assert_eq!(loaded.report.recommendation, out.report.recommendation);
    assert_abs_diff_eq!(
        loaded.profile.get(MeasurementType::ShoulderWidth).unwrap(),
        out.profile.get(MeasurementType::ShoulderWidth).unwrap(),
        epsilon = 1e-9
    );
}

fn weighted_point(
    ty: MeasurementType,
    frame: u64,
    value: f64,
    confidence: f64,
) -> MeasurementPoint {
    MeasurementPoint::new(ty, frame, frame as f64 / 30.0, value, confidence).with_depth(2.0)
}

/// Overall quality of a session with a steady height track and `n` noisy
/// shoulder-width points (alternating 36/44, cv 0.1) at `confidence`.
fn quality_with_noisy_shoulders(n: u64, confidence: f64) -> f64 {
    let mut processor = started(calibrated(), SessionParams::default());
    for frame in 0..10 {
        processor
            .ingest_point(weighted_point(MeasurementType::Height, frame, 170.0, 1.0))
            .unwrap();
    }
    for i in 0..n {
        let value = if i % 2 == 0 { 36.0 } else { 44.0 };
        processor
            .ingest_point(weighted_point(
                MeasurementType::ShoulderWidth,
                10 + i,
                value,
                confidence,
            ))
            .unwrap();
    }
    let out = processor.end_scanning_session("u").unwrap();
    assert_eq!(out.profile.calibration_quality, out.report.scores.overall);
    out.profile.calibration_quality
}

#[test]
fn quality_never_drops_as_a_type_reaches_min_samples() {
    let min_samples = SessionParams::default().min_samples as u64;
    let mut prev = quality_with_noisy_shoulders(0, 0.6);
    for n in 1..=3 * min_samples {
        let q = quality_with_noisy_shoulders(n, 0.6);
        assert!(q >= prev, "quality fell from {prev} to {q} at {n} samples");
        prev = q;
    }
}

#[test]
fn quality_never_drops_as_confidence_crosses_the_gate() {
    let gate = SessionParams::default().min_confidence;
    let mut prev = quality_with_noisy_shoulders(6, 0.0);
    for step in 1..=20 {
        let confidence = step as f64 / 20.0;
        let q = quality_with_noisy_shoulders(6, confidence);
        assert!(
            q >= prev,
            "quality fell from {prev} to {q} at confidence {confidence} (gate {gate})"
        );
        prev = q;
    }
    let below = quality_with_noisy_shoulders(6, gate - 0.05);
    let above = quality_with_noisy_shoulders(6, gate + 0.05);
    assert!(above > below, "{below} -> {above}");
}
