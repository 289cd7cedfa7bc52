use body_metrics_core::{coefficient_of_variation, mean, MeasurementPoint, MeasurementType};
use log::debug;

use super::buffers::TypeBuffer;
use super::params::SessionParams;
use super::result::{MeasurementStatus, TypeReport};
use crate::correction::DepthCorrector;
use crate::outlier::{filter_outliers, OutlierReason};
use crate::quality::TypeQuality;
use crate::smoothing::smooth;

/// Refine one type's buffer into a final value and its diagnostics.
///
/// Pipeline: confidence gate, outlier filter on raw values, per-point
/// correction, smoothing. The value is `None` when fewer than
/// `min_samples` points survive.
pub(crate) fn refine_type(
    ty: MeasurementType,
    buffer: &TypeBuffer,
    corrector: &DepthCorrector,
    params: &SessionParams,
) -> (Option<f64>, TypeReport) {
    let tally = buffer.tally();
    let (gated, low): (Vec<MeasurementPoint>, Vec<MeasurementPoint>) = buffer
        .points()
        .copied()
        .partition(|p| p.confidence >= params.min_confidence);

    let outliers = filter_outliers(&gated, params.iqr_k, params.outlier_threshold);
    let corrected: Vec<MeasurementPoint> = outliers
        .kept
        .iter()
        .map(|p| corrector.correct_point(p))
        .collect();

    let values: Vec<f64> = corrected.iter().map(|p| p.value).collect();
    let confidences: Vec<f64> = corrected.iter().map(|p| p.confidence).collect();
    let cv = coefficient_of_variation(&values);
    let mean_confidence = mean(&confidences);
    let surviving = corrected.len();

    let (status, value) = if surviving >= params.min_samples.max(1) {
        (MeasurementStatus::Measured, smooth(&corrected, &params.recency))
    } else {
        debug!(
            "{ty}: {surviving} points survived, {} required",
            params.min_samples
        );
        (
            MeasurementStatus::InsufficientData {
                surviving,
                required: params.min_samples,
            },
            None,
        )
    };

    let quality = TypeQuality::new(
        surviving,
        cv,
        mean_confidence.unwrap_or(0.0),
        params.min_samples,
        &params.quality,
    );

    let report = TypeReport {
        measurement_type: ty,
        buffered: buffer.len(),
        invalid: tally.invalid,
        evicted: tally.evicted(),
        low_confidence: low.len(),
        iqr_rejected: outliers.rejected_by(OutlierReason::Iqr),
        zscore_rejected: outliers.rejected_by(OutlierReason::ZScore),
        outliers_rejected: outliers.rejected.len(),
        surviving,
        cv,
        mean_confidence,
        status,
        quality,
    };
    (value, report)
}
