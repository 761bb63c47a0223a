//! Samples to trajectory: parallel validation, then sequential derived values
//! and interpolation.

pub mod derive;
pub mod ingest;
pub mod interpolate;

use chrono::{DateTime, Utc};

use crate::error::TrackResult;
use crate::store::Trajectory;
use crate::streams::SampleColumns;

pub use derive::attach_derived_values;
pub use ingest::{ingest, validate_sample};
pub use interpolate::{interpolate, synthetic_count, MAX_SYNTHETIC_PER_GAP};

/// Run every stage over one activity's columns.
///
/// # Errors
/// `LengthMismatch` or `NoValidSamples` from ingestion; nothing later fails.
pub fn build_trajectory(
    columns: &SampleColumns,
    start: DateTime<Utc>,
    workers: usize,
) -> TrackResult<Trajectory> {
    let mut points = ingest(columns, start, workers)?;
    attach_derived_values(&mut points);
    let valid = points.len();

    let densified = interpolate(&points);
    log::info!(
        "Processed {} valid GPS points, {} after interpolation",
        valid,
        densified.len()
    );

    Ok(Trajectory::from_ordered(densified))
}
