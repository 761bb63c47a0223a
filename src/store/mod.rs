//! Immutable trajectory with time and coordinate lookups.

pub mod spatial_index;

use chrono::{DateTime, Duration, Utc};

use crate::error::{TrackError, TrackResult};
use crate::types::TrajectoryPoint;

pub use spatial_index::SpatialIndex;

/// Time-ordered, densified trajectory of one activity.
///
/// Built once and never mutated; every query is a read. Timestamps are
/// strictly increasing.
#[derive(Clone, Debug)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
    spatial: SpatialIndex,
}

impl Trajectory {
    /// Wrap already processed points, rejecting any that are not strictly
    /// increasing in time.
    pub fn new(points: Vec<TrajectoryPoint>) -> TrackResult<Self> {
        if let Some(index) = points
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(TrackError::OutOfOrder { index: index + 1 });
        }
        Ok(Self::from_ordered(points))
    }

    /// Pipeline output is sorted and deduplicated already.
    pub(crate) fn from_ordered(points: Vec<TrajectoryPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        let spatial = SpatialIndex::from_points(&points);
        Trajectory { points, spatial }
    }

    pub fn empty() -> Self {
        Self::from_ordered(Vec::new())
    }

    /// All points, sourced and synthetic, in time order.
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// Time between first and last point, zero when empty.
    pub fn duration(&self) -> Duration {
        match (self.start_time(), self.end_time()) {
            (Some(start), Some(end)) => end - start,
            _ => Duration::zero(),
        }
    }

    /// Points created by interpolation.
    pub fn synthetic_count(&self) -> usize {
        self.points.iter().filter(|p| p.synthetic).count()
    }

    /// Point closest in time to `target`.
    ///
    /// When `target` sits exactly halfway between two points the later one is
    /// returned. `None` only for an empty trajectory.
    pub fn point_for_time(&self, target: DateTime<Utc>) -> Option<&TrajectoryPoint> {
        let after = self.points.partition_point(|p| p.timestamp < target);

        if after == 0 {
            return self.points.first();
        }
        if after == self.points.len() {
            return self.points.last();
        }

        let before = &self.points[after - 1];
        let at_or_after = &self.points[after];
        if target - before.timestamp < at_or_after.timestamp - target {
            Some(before)
        } else {
            Some(at_or_after)
        }
    }

    /// Point with the smallest great-circle distance to (lat, lng); the
    /// earliest one wins when several are equally close.
    pub fn point_for_coords(&self, lat: f64, lng: f64) -> Option<&TrajectoryPoint> {
        self.spatial
            .nearest(&self.points, lat, lng)
            .and_then(|index| self.points.get(index))
    }

    /// Contiguous run from the first point at or after `start` through the
    /// first point at or after `end`, both included.
    ///
    /// Empty when either boundary has no point at or after it, or when the
    /// window is inverted.
    pub fn points_for_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> &[TrajectoryPoint] {
        let start_idx = self.points.partition_point(|p| p.timestamp < start);
        let end_idx = self.points.partition_point(|p| p.timestamp < end);

        if start_idx >= self.points.len() || end_idx >= self.points.len() || start_idx > end_idx {
            return &[];
        }
        &self.points[start_idx..=end_idx]
    }
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::empty()
    }
}
