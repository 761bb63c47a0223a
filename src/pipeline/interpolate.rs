use chrono::Duration;

use crate::geodesy::{interpolate_bearing, lerp};
use crate::types::TrajectoryPoint;

/// Upper bound on synthetic points inserted into a single gap.
///
/// Long dropouts (tunnels, lost fix) would otherwise inflate the trajectory by
/// one point per missing second. Gaps longer than 61 s end up coarser than
/// 1 Hz; that is accepted in exchange for bounded memory and time.
pub const MAX_SYNTHETIC_PER_GAP: usize = 60;

/// Number of synthetic points for a gap of `gap_secs`: `min(floor(gap) - 1, 60)`,
/// zero for gaps of one second or less.
pub fn synthetic_count(gap_secs: f64) -> usize {
    if gap_secs.is_nan() || gap_secs <= 1.0 {
        return 0;
    }
    let whole_secs = gap_secs.floor() as usize;
    (whole_secs - 1).min(MAX_SYNTHETIC_PER_GAP)
}

/// Densify a time-ordered series with derived values already attached.
///
/// Every source point is kept. Between each pair, evenly spaced synthetic
/// points are inserted at ratios `j / (n + 1)`: scalars are interpolated
/// linearly and the bearing along the shorter arc.
pub fn interpolate(points: &[TrajectoryPoint]) -> Vec<TrajectoryPoint> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(points.len() * 2);

    for pair in points.windows(2) {
        let (p1, p2) = (&pair[0], &pair[1]);
        out.push(*p1);

        let gap_ms = (p2.timestamp - p1.timestamp).num_milliseconds();
        let count = synthetic_count(gap_ms as f64 / 1000.0);

        for j in 1..=count {
            let ratio = j as f64 / (count + 1) as f64;
            out.push(synthetic_between(p1, p2, gap_ms, ratio));
        }
    }

    if let Some(last) = points.last() {
        out.push(*last);
    }
    out
}

fn synthetic_between(
    p1: &TrajectoryPoint,
    p2: &TrajectoryPoint,
    gap_ms: i64,
    ratio: f64,
) -> TrajectoryPoint {
    let offset_ms = (gap_ms as f64 * ratio).round() as i64;
    TrajectoryPoint {
        timestamp: p1.timestamp + Duration::milliseconds(offset_ms),
        latitude: lerp(p1.latitude, p2.latitude, ratio),
        longitude: lerp(p1.longitude, p2.longitude, ratio),
        velocity: lerp(p1.velocity, p2.velocity, ratio),
        altitude: lerp(p1.altitude, p2.altitude, ratio),
        bearing: interpolate_bearing(p1.bearing, p2.bearing, ratio),
        g_force: lerp(p1.g_force, p2.g_force, ratio),
        synthetic: true,
    }
}
