//! Downsampling of a full trajectory into sparse map markers.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::TrajectoryPoint;

/// The trailing point is dropped when it is within this many seconds of the
/// last kept point (fixed-interval policy).
const INTERVAL_TAIL_EXCLUSION_SECS: f64 = 5.0;

/// Keep the first point, then every point at least `interval` after the last
/// kept one. The final point is added when it is more than 5 s past the kept
/// tail.
pub fn select_by_interval(points: &[TrajectoryPoint], interval: Duration) -> Vec<TrajectoryPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut selected = vec![*first];
    let mut last_kept = *first;

    for point in &points[1..] {
        if point.timestamp - last_kept.timestamp >= interval {
            selected.push(*point);
            last_kept = *point;
        }
    }

    if points.len() > 1 {
        if let Some(last) = points.last() {
            if last.seconds_since(&last_kept) > INTERVAL_TAIL_EXCLUSION_SECS {
                selected.push(*last);
            }
        }
    }

    selected
}

/// Thresholds for the multi-criterion marker selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelligentSelection {
    /// Speed/distance criteria only apply after this much time (s)
    pub min_interval_secs: f64,
    /// Forced refresh regardless of activity (s)
    pub max_interval_secs: f64,
    pub min_speed_change_ms: f64,
    pub min_distance_m: f64,
    /// Below this the athlete counts as stopped (m/s)
    pub stop_speed_ms: f64,
    /// Above this the athlete counts as moving (m/s)
    pub moving_speed_ms: f64,
    pub peak_speed_ms: f64,
    pub tail_exclusion_secs: f64,
}

impl Default for IntelligentSelection {
    fn default() -> Self {
        Self {
            min_interval_secs: 30.0,
            max_interval_secs: 120.0,
            min_speed_change_ms: 5.0 * (1000.0 / 3600.0), // 5 km/h
            min_distance_m: 100.0,
            stop_speed_ms: 1.0,
            moving_speed_ms: 3.0,
            peak_speed_ms: 15.0, // 54 km/h
            tail_exclusion_secs: 10.0,
        }
    }
}

impl IntelligentSelection {
    /// Pick the points worth a marker.
    ///
    /// The first point is always kept. Interior points are kept when any of
    /// these holds against the last kept point:
    /// 1. `max_interval_secs` elapsed
    /// 2. `min_interval_secs` elapsed and speed changed by `min_speed_change_ms`
    /// 3. `min_interval_secs` elapsed and moved `min_distance_m`
    /// 4. came to a stop (below `stop_speed_ms` after being above `moving_speed_ms`)
    /// 5. started moving again (the reverse of 4)
    /// 6. speed peak above `peak_speed_ms` with the conditions of 2
    ///
    /// The final point is kept unless it falls within `tail_exclusion_secs` of
    /// the last kept point.
    pub fn select(&self, points: &[TrajectoryPoint]) -> Vec<TrajectoryPoint> {
        let Some(first) = points.first() else {
            return Vec::new();
        };

        let mut selected = vec![*first];
        let mut last_kept = *first;

        if points.len() > 2 {
            for point in &points[1..points.len() - 1] {
                if self.should_keep(point, &last_kept) {
                    selected.push(*point);
                    last_kept = *point;
                }
            }
        }

        if points.len() > 1 {
            if let Some(last) = points.last() {
                if last.seconds_since(&last_kept) > self.tail_exclusion_secs {
                    selected.push(*last);
                }
            }
        }

        log::debug!(
            "Intelligent selection kept {} of {} points",
            selected.len(),
            points.len()
        );
        selected
    }

    fn should_keep(&self, current: &TrajectoryPoint, last_kept: &TrajectoryPoint) -> bool {
        let elapsed = current.seconds_since(last_kept);
        let speed_change = (current.velocity - last_kept.velocity).abs();
        let distance = last_kept.distance_to(current);

        let settled = elapsed >= self.min_interval_secs;
        let speed_changed = speed_change >= self.min_speed_change_ms;

        let forced_refresh = elapsed >= self.max_interval_secs;
        let speed_shift = settled && speed_changed;
        let moved_far = settled && distance >= self.min_distance_m;
        let stopped =
            current.velocity < self.stop_speed_ms && last_kept.velocity > self.moving_speed_ms;
        let resumed =
            current.velocity > self.moving_speed_ms && last_kept.velocity < self.stop_speed_ms;
        let speed_peak = current.velocity > self.peak_speed_ms && settled && speed_changed;

        forced_refresh || speed_shift || moved_far || stopped || resumed || speed_peak
    }
}

/// Named marker density for the map view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityPreset {
    /// One marker per minute
    Low,
    /// Multi-criterion selection
    #[default]
    Medium,
    /// One marker every 15 seconds
    High,
    /// One marker every 5 seconds
    UltraHigh,
}

impl DensityPreset {
    /// Fixed interval for the interval-based presets, `None` for `Medium`.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            DensityPreset::Low => Some(Duration::seconds(60)),
            DensityPreset::Medium => None,
            DensityPreset::High => Some(Duration::seconds(15)),
            DensityPreset::UltraHigh => Some(Duration::seconds(5)),
        }
    }

    /// Apply this preset. `Medium` uses the given intelligent thresholds.
    pub fn select(
        &self,
        points: &[TrajectoryPoint],
        intelligent: &IntelligentSelection,
    ) -> Vec<TrajectoryPoint> {
        match self.interval() {
            Some(interval) => select_by_interval(points, interval),
            None => intelligent.select(points),
        }
    }

    /// Lenient parse used for user input: unknown names fall back to `Medium`.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            log::warn!("Unknown density preset '{}', using medium", name);
            DensityPreset::Medium
        })
    }
}

impl FromStr for DensityPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(DensityPreset::Low),
            "medium" => Ok(DensityPreset::Medium),
            "high" => Ok(DensityPreset::High),
            "ultra_high" | "ultra-high" | "ultrahigh" => Ok(DensityPreset::UltraHigh),
            other => Err(format!("unknown density preset: {}", other)),
        }
    }
}

impl Display for DensityPreset {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            DensityPreset::Low => write!(f, "low"),
            DensityPreset::Medium => write!(f, "medium"),
            DensityPreset::High => write!(f, "high"),
            DensityPreset::UltraHigh => write!(f, "ultra_high"),
        }
    }
}
