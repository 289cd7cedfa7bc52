use std::collections::BTreeMap;

use body_metrics_core::MeasurementType;
use serde::{Deserialize, Serialize};

/// Advisory plausibility ranges for final values, in `units`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityRanges {
    pub units: String,
    /// Inclusive `[min, max]` per type; types without an entry are not checked.
    pub ranges: BTreeMap<MeasurementType, [f64; 2]>,
}

impl Default for PlausibilityRanges {
    fn default() -> Self {
        let ranges = BTreeMap::from([
            (MeasurementType::Height, [140.0, 220.0]),
            (MeasurementType::ShoulderWidth, [30.0, 70.0]),
            (MeasurementType::TorsoLength, [40.0, 80.0]),
            (MeasurementType::ArmLength, [50.0, 90.0]),
            (MeasurementType::HipWidth, [25.0, 60.0]),
            (MeasurementType::LegLength, [60.0, 120.0]),
        ]);
        Self {
            units: "cm".to_string(),
            ranges,
        }
    }
}

/// A final value outside its plausible range. Never alters the value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityIssue {
    pub measurement_type: MeasurementType,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl PlausibilityRanges {
    /// Issues for `values` expressed in `units`; empty when the units differ.
    pub fn check(
        &self,
        values: &BTreeMap<MeasurementType, f64>,
        units: &str,
    ) -> Vec<PlausibilityIssue> {
        if units != self.units {
            return Vec::new();
        }
        values
            .iter()
            .filter_map(|(&ty, &value)| {
                let [min, max] = *self.ranges.get(&ty)?;
                (value < min || value > max).then_some(PlausibilityIssue {
                    measurement_type: ty,
                    value,
                    min,
                    max,
                })
            })
            .collect()
    }
}
