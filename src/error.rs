use thiserror::Error;

/// Failures that abort trajectory construction.
///
/// Single-point queries and range queries never fail: they return `None` or an
/// empty slice when the trajectory has nothing to offer.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("data length mismatch: time={time}, latlng={latlng}")]
    LengthMismatch { time: usize, latlng: usize },

    #[error("activity has no usable GPS data")]
    NoValidSamples,

    #[error("stream missing or empty: {0}")]
    MissingStream(String),

    #[error("stream is not an array: {0}")]
    MalformedStream(String),

    #[error("trajectory points out of order at index {index}")]
    OutOfOrder { index: usize },

    #[error("ingestion worker panicked")]
    WorkerPanicked,

    #[error("failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type for trajectory operations
pub type TrackResult<T> = Result<T, TrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = TrackError::LengthMismatch { time: 3, latlng: 2 };
        assert_eq!(err.to_string(), "data length mismatch: time=3, latlng=2");
        assert_eq!(
            TrackError::NoValidSamples.to_string(),
            "activity has no usable GPS data"
        );
    }

    #[test]
    fn test_decode_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: TrackError = parse_err.into();
        assert!(matches!(err, TrackError::Decode(_)));
    }
}
