use crate::geodesy::{g_force, initial_bearing};
use crate::types::TrajectoryPoint;

/// Fill in `bearing` and `g_force` from each point's predecessor.
///
/// Must run on time-ordered points and cannot be parallelized: every value
/// depends on the point right before it. The first point has no predecessor
/// and copies the second point's values; a lone point keeps zeros.
pub fn attach_derived_values(points: &mut [TrajectoryPoint]) {
    for i in 1..points.len() {
        let prev = points[i - 1];
        let current = &mut points[i];

        current.bearing = initial_bearing(
            prev.latitude,
            prev.longitude,
            current.latitude,
            current.longitude,
        );
        current.g_force = g_force(prev.velocity, current.velocity, current.seconds_since(&prev));
    }

    if points.len() > 1 {
        points[0].bearing = points[1].bearing;
        points[0].g_force = points[1].g_force;
    }
}
