use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::config::ProcessorConfig;
use crate::error::TrackResult;
use crate::pipeline::build_trajectory;
use crate::selection::DensityPreset;
use crate::store::Trajectory;
use crate::streams::{columns_from_json, SampleColumns};
use crate::types::TrajectoryPoint;

/// Shared holder for the current activity's trajectory.
///
/// Rebuilds construct a complete `Trajectory` off to the side and swap it in
/// under the write lock, so a reader sees either the previous trajectory or
/// the new one. A failed rebuild leaves the previous trajectory in place.
pub struct TrajectoryProcessor {
    config: ProcessorConfig,
    current: RwLock<Arc<Trajectory>>,
}

impl TrajectoryProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config,
            current: RwLock::new(Arc::new(Trajectory::empty())),
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Replace the trajectory with one built from `columns`.
    pub fn process_stream_data(
        &self,
        columns: &SampleColumns,
        start: DateTime<Utc>,
    ) -> TrackResult<Arc<Trajectory>> {
        let built = match build_trajectory(columns, start, self.config.effective_workers()) {
            Ok(trajectory) => Arc::new(trajectory),
            Err(e) => {
                log::warn!("Trajectory rebuild failed, keeping previous: {}", e);
                return Err(e);
            }
        };

        *self.write() = Arc::clone(&built);
        Ok(built)
    }

    /// Decode a raw streams payload and rebuild from it.
    pub fn process_stream_json(
        &self,
        payload: &str,
        start: DateTime<Utc>,
    ) -> TrackResult<Arc<Trajectory>> {
        let columns = columns_from_json(payload)?;
        self.process_stream_data(&columns, start)
    }

    /// Snapshot of the current trajectory; stays valid across later rebuilds.
    pub fn trajectory(&self) -> Arc<Trajectory> {
        Arc::clone(&self.read())
    }

    pub fn all_points(&self) -> Vec<TrajectoryPoint> {
        self.read().points().to_vec()
    }

    pub fn point_for_time(&self, target: DateTime<Utc>) -> Option<TrajectoryPoint> {
        self.read().point_for_time(target).copied()
    }

    pub fn point_for_coords(&self, lat: f64, lng: f64) -> Option<TrajectoryPoint> {
        self.read().point_for_coords(lat, lng).copied()
    }

    pub fn points_for_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<TrajectoryPoint> {
        self.read().points_for_time_range(start, end).to_vec()
    }

    /// Markers for the map at the requested density.
    pub fn select(&self, preset: DensityPreset) -> Vec<TrajectoryPoint> {
        let trajectory = self.trajectory();
        preset.select(trajectory.points(), &self.config.selection)
    }

    /// Like `select`, but takes the preset by name; unknown names mean medium.
    pub fn select_named(&self, preset: &str) -> Vec<TrajectoryPoint> {
        self.select(DensityPreset::from_name_or_default(preset))
    }

    // The guarded value is only ever replaced whole, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, Arc<Trajectory>> {
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<Trajectory>> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TrajectoryProcessor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}
