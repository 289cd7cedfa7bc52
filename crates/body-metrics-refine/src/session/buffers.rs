use body_metrics_core::{MeasurementPoint, MeasurementType, RingWindow};
use log::debug;
use serde::{Deserialize, Serialize};

use super::error::InvalidMeasurement;

/// Ingestion counters of one measurement type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestTally {
    pub accepted: usize,
    pub invalid: usize,
    pub evicted_window: usize,
    pub evicted_age: usize,
}

impl IngestTally {
    pub fn evicted(&self) -> usize {
        self.evicted_window + self.evicted_age
    }
}

#[derive(Clone, Debug)]
pub(crate) struct TypeBuffer {
    window: RingWindow<MeasurementPoint>,
    tally: IngestTally,
    last_frame: Option<u64>,
    last_timestamp: Option<f64>,
}

impl TypeBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            window: RingWindow::with_capacity(capacity),
            tally: IngestTally::default(),
            last_frame: None,
            last_timestamp: None,
        }
    }

    fn check_order(&self, point: &MeasurementPoint) -> Result<(), InvalidMeasurement> {
        if let Some(last) = self.last_frame {
            if point.frame_index <= last {
                return Err(InvalidMeasurement::NonIncreasingFrame {
                    last,
                    got: point.frame_index,
                });
            }
        }
        if let Some(last) = self.last_timestamp {
            if point.timestamp < last {
                return Err(InvalidMeasurement::TimestampWentBackwards {
                    last,
                    got: point.timestamp,
                });
            }
        }
        Ok(())
    }

    fn push(&mut self, point: MeasurementPoint, max_age_s: Option<f64>) {
        self.last_frame = Some(point.frame_index);
        self.last_timestamp = Some(point.timestamp);
        self.tally.accepted += 1;

        if let Some(old) = self.window.push(point) {
            self.tally.evicted_window += 1;
            debug!("{}: window full, evicted frame {}", old.measurement_type, old.frame_index);
        }

        let Some(max_age) = max_age_s.filter(|a| a.is_finite() && *a >= 0.0) else {
            return;
        };
        let cutoff = point.timestamp - max_age;
        while self.window.front().is_some_and(|p| p.timestamp < cutoff) {
            if let Some(old) = self.window.pop_front() {
                self.tally.evicted_age += 1;
                debug!("{}: evicted stale frame {}", old.measurement_type, old.frame_index);
            }
        }
    }

    pub fn points(&self) -> impl DoubleEndedIterator<Item = &MeasurementPoint> + '_ {
        self.window.iter()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn tally(&self) -> IngestTally {
        self.tally
    }
}

/// Fixed-capacity buffers for all six measurement types.
#[derive(Clone, Debug)]
pub(crate) struct SessionBuffers {
    types: [TypeBuffer; MeasurementType::COUNT],
    max_age_s: Option<f64>,
    last_frame_index: Option<u64>,
}

fn validate_point(point: &MeasurementPoint) -> Result<(), InvalidMeasurement> {
    if !(point.value.is_finite() && point.value > 0.0) {
        return Err(InvalidMeasurement::NonPositiveValue { value: point.value });
    }
    if !(0.0..=1.0).contains(&point.confidence) {
        return Err(InvalidMeasurement::ConfidenceOutOfRange {
            confidence: point.confidence,
        });
    }
    if let Some(depth) = point.depth_estimate {
        if !(depth.is_finite() && depth > 0.0) {
            return Err(InvalidMeasurement::InvalidDepth { depth });
        }
    }
    if !point.timestamp.is_finite() {
        return Err(InvalidMeasurement::NonFiniteTimestamp);
    }
    Ok(())
}

impl SessionBuffers {
    pub fn new(window_size: usize, max_age_s: Option<f64>) -> Self {
        Self {
            types: std::array::from_fn(|_| TypeBuffer::new(window_size)),
            max_age_s,
            last_frame_index: None,
        }
    }

    /// Validate and append one point, applying window and age eviction.
    pub fn ingest(&mut self, point: MeasurementPoint) -> Result<(), InvalidMeasurement> {
        let result = validate_point(&point).and_then(|()| {
            match self.last_frame_index {
                Some(last) if point.frame_index < last => {
                    Err(InvalidMeasurement::NonIncreasingFrame {
                        last,
                        got: point.frame_index,
                    })
                }
                _ => self.types[point.measurement_type.index()].check_order(&point),
            }
        });

        let buffer = &mut self.types[point.measurement_type.index()];
        match result {
            Ok(()) => {
                buffer.push(point, self.max_age_s);
                self.last_frame_index = Some(point.frame_index);
                Ok(())
            }
            Err(err) => {
                buffer.tally.invalid += 1;
                debug!(
                    "{} frame {}: dropped invalid point: {err}",
                    point.measurement_type, point.frame_index
                );
                Err(err)
            }
        }
    }

    pub fn get(&self, ty: MeasurementType) -> &TypeBuffer {
        &self.types[ty.index()]
    }

    pub fn total_len(&self) -> usize {
        self.types.iter().map(TypeBuffer::len).sum()
    }

    /// Highest frame index accepted so far.
    pub fn latest_frame(&self) -> Option<u64> {
        self.last_frame_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(ty: MeasurementType, frame: u64, value: f64) -> MeasurementPoint {
        MeasurementPoint::new(ty, frame, frame as f64 / 30.0, value, 0.9)
    }

    #[test]
    fn window_keeps_newest_points_in_order() {
        let mut buffers = SessionBuffers::new(3, None);
        for frame in 0..5 {
            buffers.ingest(pt(MeasurementType::Height, frame, 170.0)).unwrap();
        }
        let buf = buffers.get(MeasurementType::Height);
        let frames: Vec<u64> = buf.points().map(|p| p.frame_index).collect();
        assert_eq!(frames, vec![2, 3, 4]);
        assert_eq!(buf.tally().accepted, 5);
        assert_eq!(buf.tally().evicted_window, 2);
        assert_eq!(buffers.total_len(), 3);
    }

    #[test]
    fn age_bound_evicts_stale_points() {
        let mut buffers = SessionBuffers::new(100, Some(1.0));
        for frame in 0..90 {
            buffers.ingest(pt(MeasurementType::HipWidth, frame, 35.0)).unwrap();
        }
        let buf = buffers.get(MeasurementType::HipWidth);
        // Newest timestamp 89/30 s; everything older than one second is gone.
        assert!(buf.points().all(|p| p.timestamp >= 89.0 / 30.0 - 1.0));
        assert_eq!(buf.len() + buf.tally().evicted_age, 90);
    }

    #[test]
    fn invalid_points_are_tallied_not_stored() {
        let mut buffers = SessionBuffers::new(10, None);
        let ty = MeasurementType::ShoulderWidth;
        assert!(matches!(
            buffers.ingest(pt(ty, 0, 0.0)),
            Err(InvalidMeasurement::NonPositiveValue { .. })
        ));
        let mut bad_conf = pt(ty, 1, 40.0);
        bad_conf.confidence = 1.2;
        assert!(matches!(
            buffers.ingest(bad_conf),
            Err(InvalidMeasurement::ConfidenceOutOfRange { .. })
        ));
        let bad_depth = pt(ty, 2, 40.0).with_depth(-1.0);
        assert!(matches!(
            buffers.ingest(bad_depth),
            Err(InvalidMeasurement::InvalidDepth { .. })
        ));
        buffers.ingest(pt(ty, 5, 40.0)).unwrap();
        assert_eq!(
            buffers.ingest(pt(ty, 5, 41.0)),
            Err(InvalidMeasurement::NonIncreasingFrame { last: 5, got: 5 })
        );
        assert_eq!(
            buffers.ingest(pt(MeasurementType::Height, 3, 170.0)),
            Err(InvalidMeasurement::NonIncreasingFrame { last: 5, got: 3 })
        );
        assert_eq!(buffers.get(ty).len(), 1);
        assert_eq!(buffers.get(ty).tally().invalid, 4);
    }

    #[test]
    fn types_share_a_frame_index() {
        let mut buffers = SessionBuffers::new(10, None);
        for ty in MeasurementType::ALL {
            buffers.ingest(pt(ty, 7, 50.0)).unwrap();
        }
        assert_eq!(buffers.total_len(), MeasurementType::COUNT);
        assert_eq!(buffers.latest_frame(), Some(7));
    }
}
