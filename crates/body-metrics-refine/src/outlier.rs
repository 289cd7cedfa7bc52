//! Two-pass outlier rejection for one measurement type.
//!
//! 1. IQR fence: values outside `[Q1 - k*IQR, Q3 + k*IQR]` are rejected.
//! 2. z-score on the IQR survivors: `|v - mean| / std > threshold` is rejected.
//!
//! The z pass is skipped when the survivors have zero spread, so identical
//! values never divide by zero and are never rejected. Input order is kept.

use std::cmp::Ordering;

use body_metrics_core::{mean, quantile_sorted, std_dev, MeasurementPoint};
use log::debug;
use serde::{Deserialize, Serialize};

/// Which pass rejected a point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierReason {
    Iqr,
    ZScore,
}

/// Result of [`filter_outliers`].
#[derive(Clone, Debug, Default)]
pub struct OutlierOutcome {
    pub kept: Vec<MeasurementPoint>,
    pub rejected: Vec<(MeasurementPoint, OutlierReason)>,
}

impl OutlierOutcome {
    pub fn rejected_by(&self, reason: OutlierReason) -> usize {
        self.rejected.iter().filter(|(_, r)| *r == reason).count()
    }
}

fn iqr_fence(values: &[f64], k: f64) -> Option<(f64, f64)> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let q1 = quantile_sorted(&sorted, 0.25)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - k * iqr, q3 + k * iqr))
}

/// Split `points` into inliers and rejected outliers.
pub fn filter_outliers(
    points: &[MeasurementPoint],
    iqr_k: f64,
    z_threshold: f64,
) -> OutlierOutcome {
    let mut outcome = OutlierOutcome::default();
    if points.is_empty() {
        return outcome;
    }

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let mut survivors = Vec::with_capacity(points.len());
    match iqr_fence(&values, iqr_k) {
        Some((lo, hi)) => {
            for p in points {
                if p.value < lo || p.value > hi {
                    debug!(
                        "{} frame {}: IQR outlier {:.3} outside [{lo:.3}, {hi:.3}]",
                        p.measurement_type, p.frame_index, p.value
                    );
                    outcome.rejected.push((*p, OutlierReason::Iqr));
                } else {
                    survivors.push(*p);
                }
            }
        }
        None => survivors.extend_from_slice(points),
    }

    let values: Vec<f64> = survivors.iter().map(|p| p.value).collect();
    let (Some(m), Some(sd)) = (mean(&values), std_dev(&values)) else {
        outcome.kept = survivors;
        return outcome;
    };
    if !(sd > 0.0) {
        outcome.kept = survivors;
        return outcome;
    }

    for p in survivors {
        let z = (p.value - m) / sd;
        if z.abs() > z_threshold {
            debug!(
                "{} frame {}: z-score outlier {:.3} (z = {z:.2})",
                p.measurement_type, p.frame_index, p.value
            );
            outcome.rejected.push((p, OutlierReason::ZScore));
        } else {
            outcome.kept.push(p);
        }
    }
    outcome
}
