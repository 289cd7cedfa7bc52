//! Calibration data: pixel-to-real-world scale and reference depth.
//!
//! A [`CalibrationStore`] is built once, handed to the session processor and
//! never mutated. Missing or corrupt calibration does not abort a session; the
//! store falls back to raw units (scale 1, no depth correction) and records why.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use body_metrics_core::MeasurementType;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::correction::DepthCorrector;

/// Reference depth (metres) assumed when calibration is unavailable.
pub const DEFAULT_REFERENCE_DEPTH: f64 = 2.0;

const UNCALIBRATED_VERSION: &str = "uncalibrated";

#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid calibration field `{field}` = {value}")]
    Invalid { field: String, value: f64 },
}

/// How the estimated camera depth rescales a raw measurement.
///
/// Apparent size falls off with distance, so a subject further away than the
/// reference depth looks smaller. Which direction restores true size depends
/// on how the `scale_factor` was measured, hence the explicit choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthConvention {
    /// `value * depth / reference_depth`.
    #[default]
    Proportional,
    /// `value * reference_depth / depth`.
    Inverse,
    /// Depth is ignored.
    Disabled,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_units() -> String {
    "cm".to_string()
}

/// Persisted calibration record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Real-world units per detector-native unit (e.g. cm per pixel).
    pub scale_factor: f64,
    /// Camera distance at which `scale_factor` was measured.
    pub reference_depth: f64,
    #[serde(default = "default_version")]
    pub version: String,
    /// Units produced by `scale_factor`.
    #[serde(default = "default_units")]
    pub units: String,
    /// Per-dimension scale factors that replace `scale_factor`.
    #[serde(default)]
    pub scale_overrides: BTreeMap<MeasurementType, f64>,
    #[serde(default)]
    pub depth_convention: DepthConvention,
}

impl Calibration {
    pub fn new(scale_factor: f64, reference_depth: f64) -> Self {
        Self {
            scale_factor,
            reference_depth,
            version: default_version(),
            units: default_units(),
            scale_overrides: BTreeMap::new(),
            depth_convention: DepthConvention::default(),
        }
    }

    /// Raw-unit calibration used when nothing trustworthy is available.
    pub fn uncalibrated() -> Self {
        Self {
            scale_factor: 1.0,
            reference_depth: DEFAULT_REFERENCE_DEPTH,
            version: UNCALIBRATED_VERSION.to_string(),
            units: "px".to_string(),
            scale_overrides: BTreeMap::new(),
            depth_convention: DepthConvention::Disabled,
        }
    }

    /// Check that every factor is finite and strictly positive.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let positive = |field: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(CalibrationError::Invalid {
                    field: field.to_string(),
                    value,
                })
            }
        };
        positive("scale_factor", self.scale_factor)?;
        positive("reference_depth", self.reference_depth)?;
        for (ty, &value) in &self.scale_overrides {
            positive(&format!("scale_overrides.{ty}"), value)?;
        }
        Ok(())
    }

    /// Scale factor applied to measurements of `ty`.
    pub fn scale_for(&self, ty: MeasurementType) -> f64 {
        self.scale_overrides
            .get(&ty)
            .copied()
            .unwrap_or(self.scale_factor)
    }

    /// Load and validate a JSON calibration record.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let raw = fs::read_to_string(path)?;
        let cal: Calibration = serde_json::from_str(&raw)?;
        cal.validate()?;
        Ok(cal)
    }

    /// Write this record as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CalibrationError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Whether the store holds real calibration data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CalibrationStatus {
    Loaded,
    Unavailable { reason: String },
}

/// Read-only calibration handed to a session.
#[derive(Clone, Debug)]
pub struct CalibrationStore {
    calibration: Calibration,
    status: CalibrationStatus,
}

impl CalibrationStore {
    /// Wrap a calibration record, falling back to raw units if it is invalid.
    pub fn new(calibration: Calibration) -> Self {
        match calibration.validate() {
            Ok(()) => Self {
                calibration,
                status: CalibrationStatus::Loaded,
            },
            Err(err) => Self::unavailable(err.to_string()),
        }
    }

    /// Raw-unit fallback.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("calibration unavailable ({reason}); reporting raw units");
        Self {
            calibration: Calibration::uncalibrated(),
            status: CalibrationStatus::Unavailable { reason },
        }
    }

    /// Load from JSON; any failure degrades to the raw-unit fallback.
    pub fn load_json_or_fallback(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Calibration::load_json(path) {
            Ok(cal) => Self {
                calibration: cal,
                status: CalibrationStatus::Loaded,
            },
            Err(err) => Self::unavailable(format!("{}: {err}", path.display())),
        }
    }

    #[inline]
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    #[inline]
    pub fn status(&self) -> &CalibrationStatus {
        &self.status
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.status == CalibrationStatus::Loaded
    }

    /// Per-point corrector configured from this calibration.
    pub fn corrector(&self) -> DepthCorrector {
        DepthCorrector::from_calibration(&self.calibration)
    }
}

impl Default for CalibrationStore {
    fn default() -> Self {
        Self::unavailable("no calibration provided")
    }
}
