use chrono::{DateTime, Duration, Utc};
use crossbeam::channel;

use crate::error::{TrackError, TrackResult};
use crate::streams::SampleColumns;
use crate::types::{is_valid_coordinate, RawSample, TrajectoryPoint};

// Offsets beyond ~31 000 years cannot come from a real activity
const MAX_OFFSET_MS: f64 = 1e15;

/// Validate one decoded sample and anchor it to the activity start.
///
/// Returns `None` for anything that cannot be placed on a map: non-finite
/// offsets, NaN or out-of-range coordinates and the (0, 0) placeholder.
/// Missing or NaN speed and altitude default to zero; negative speeds clamp
/// to zero.
pub fn validate_sample(sample: &RawSample, start: DateTime<Utc>) -> Option<TrajectoryPoint> {
    if !is_valid_coordinate(sample.latitude, sample.longitude) {
        return None;
    }

    let offset_ms = (sample.offset_secs * 1000.0).round();
    if !offset_ms.is_finite() || offset_ms.abs() > MAX_OFFSET_MS {
        return None;
    }
    let timestamp = start.checked_add_signed(Duration::milliseconds(offset_ms as i64))?;

    Some(TrajectoryPoint::new(
        timestamp,
        sample.latitude,
        sample.longitude,
        sample.velocity.filter(|v| !v.is_nan()).unwrap_or(0.0).max(0.0),
        sample.altitude.filter(|a| !a.is_nan()).unwrap_or(0.0),
    ))
}

/// Decode and validate every index on a pool of `workers` threads.
///
/// Each index is independent, so workers pull indices from a shared job
/// channel and push survivors to an unordered result channel. The output is
/// sorted by timestamp before it is returned; samples that land on the same
/// timestamp collapse to the one with the highest input index.
///
/// # Errors
/// * `LengthMismatch` before any work starts if time and position differ
/// * `NoValidSamples` if every index was rejected
pub fn ingest(
    columns: &SampleColumns,
    start: DateTime<Utc>,
    workers: usize,
) -> TrackResult<Vec<TrajectoryPoint>> {
    columns.check_lengths()?;

    let total = columns.len();
    let workers = workers.clamp(1, total.max(1));

    let (job_tx, job_rx) = channel::unbounded::<usize>();
    let (result_tx, result_rx) = channel::unbounded::<(usize, TrajectoryPoint)>();

    for index in 0..total {
        if job_tx.send(index).is_err() {
            break;
        }
    }
    drop(job_tx);

    crossbeam::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move |_| {
                for index in job_rx.iter() {
                    let point = columns
                        .sample(index)
                        .and_then(|sample| validate_sample(&sample, start));
                    if let Some(point) = point {
                        // receiver outlives the scope
                        let _ = result_tx.send((index, point));
                    }
                }
            });
        }
    })
    .map_err(|_| TrackError::WorkerPanicked)?;
    drop(result_tx);

    let mut indexed: Vec<(usize, TrajectoryPoint)> = result_rx.iter().collect();
    log::debug!(
        "Validated {} of {} samples on {} workers",
        indexed.len(),
        total,
        workers
    );

    if indexed.is_empty() {
        return Err(TrackError::NoValidSamples);
    }

    indexed.sort_by(|a, b| a.1.timestamp.cmp(&b.1.timestamp).then(a.0.cmp(&b.0)));

    let mut points: Vec<TrajectoryPoint> = Vec::with_capacity(indexed.len());
    for (_, point) in indexed {
        match points.last_mut() {
            Some(last) if last.timestamp == point.timestamp => *last = point,
            _ => points.push(point),
        }
    }

    let dropped = total - points.len();
    if dropped > 0 {
        log::debug!("Dropped {} invalid or duplicate samples", dropped);
    }

    Ok(points)
}
