use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One decoded input record, before validation.
///
/// `velocity` and `altitude` are `None` when the source stream is absent,
/// shorter than the time stream, or holds a null at this index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawSample {
    pub offset_secs: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub velocity: Option<f64>,
    pub altitude: Option<f64>,
}

/// A single position on the finished trajectory.
///
/// Serializes with the field names the map and overlay front-end reads
/// (`time`, `lat`, `lng`, `gForce`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    #[serde(rename = "time")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    pub velocity: f64, // m/s
    pub altitude: f64, // m
    pub bearing: f64,  // degrees, [0, 360)
    #[serde(rename = "gForce")]
    pub g_force: f64,
    /// True when produced by interpolation rather than read from the stream
    #[serde(skip)]
    pub synthetic: bool,
}

impl TrajectoryPoint {
    /// Sourced point with no derived values yet.
    pub fn new(
        timestamp: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        velocity: f64,
        altitude: f64,
    ) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            velocity,
            altitude,
            bearing: 0.0,
            g_force: 0.0,
            synthetic: false,
        }
    }

    /// Signed seconds from `earlier` to `self`, millisecond resolution.
    pub fn seconds_since(&self, earlier: &TrajectoryPoint) -> f64 {
        (self.timestamp - earlier.timestamp).num_milliseconds() as f64 / 1000.0
    }

    /// Great-circle distance to another point in meters.
    pub fn distance_to(&self, other: &TrajectoryPoint) -> f64 {
        crate::geodesy::haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// True for a usable WGS84 position: in range, not NaN and not the (0, 0)
/// placeholder some devices report before a fix.
pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    !(lat == 0.0 && lng == 0.0)
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
        && !lat.is_nan()
        && !lng.is_nan()
}
