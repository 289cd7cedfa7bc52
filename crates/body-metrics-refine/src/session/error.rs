use super::result::SessionState;

/// Why a raw point was refused at ingestion. Never fatal to the session.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidMeasurement {
    #[error("value {value} is not a finite positive number")]
    NonPositiveValue { value: f64 },
    #[error("confidence {confidence} is outside [0, 1]")]
    ConfidenceOutOfRange { confidence: f64 },
    #[error("depth estimate {depth} is not a finite positive number")]
    InvalidDepth { depth: f64 },
    #[error("timestamp is not finite")]
    NonFiniteTimestamp,
    #[error("frame index {got} does not advance past {last}")]
    NonIncreasingFrame { last: u64, got: u64 },
    #[error("timestamp {got} is earlier than {last}")]
    TimestampWentBackwards { last: f64, got: f64 },
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The call is not allowed in the current state; the state is unchanged.
    #[error("`{operation}` is not valid while the session is {state}")]
    InvalidSessionState {
        operation: &'static str,
        state: SessionState,
    },
    #[error(transparent)]
    InvalidMeasurement(#[from] InvalidMeasurement),
}
