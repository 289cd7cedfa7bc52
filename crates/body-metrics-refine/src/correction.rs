use body_metrics_core::{MeasurementPoint, MeasurementType};

use crate::calibration::{Calibration, DepthConvention};

/// Per-point depth and scale correction.
///
/// Pure and order-independent: the corrected value depends only on the point
/// and the calibration it was built from.
#[derive(Clone, Debug)]
pub struct DepthCorrector {
    reference_depth: f64,
    convention: DepthConvention,
    scales: [f64; MeasurementType::COUNT],
}

impl DepthCorrector {
    pub fn from_calibration(cal: &Calibration) -> Self {
        Self {
            reference_depth: cal.reference_depth,
            convention: cal.depth_convention,
            scales: MeasurementType::ALL.map(|ty| cal.scale_for(ty)),
        }
    }

    /// Identity corrector: unit scale, depth ignored.
    pub fn identity() -> Self {
        Self {
            reference_depth: 1.0,
            convention: DepthConvention::Disabled,
            scales: [1.0; MeasurementType::COUNT],
        }
    }

    #[inline]
    pub fn scale_for(&self, ty: MeasurementType) -> f64 {
        self.scales[ty.index()]
    }

    /// Multiplier compensating for `depth`; unknown depth means reference depth.
    pub fn depth_ratio(&self, depth: Option<f64>) -> f64 {
        let Some(depth) = depth.filter(|d| d.is_finite() && *d > 0.0) else {
            return 1.0;
        };
        match self.convention {
            DepthConvention::Proportional => depth / self.reference_depth,
            DepthConvention::Inverse => self.reference_depth / depth,
            DepthConvention::Disabled => 1.0,
        }
    }

    /// Corrected real-world value of one point.
    pub fn correct(&self, point: &MeasurementPoint) -> f64 {
        point.value
            * self.depth_ratio(point.depth_estimate)
            * self.scale_for(point.measurement_type)
    }

    /// Copy of `point` carrying the corrected value.
    pub fn correct_point(&self, point: &MeasurementPoint) -> MeasurementPoint {
        MeasurementPoint {
            value: self.correct(point),
            ..*point
        }
    }
}
