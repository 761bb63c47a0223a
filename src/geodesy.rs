//! Spherical-earth helpers shared by every stage.
//!
//! All distances are meters on a sphere of radius `EARTH_RADIUS_M`. The nearest
//! point lookup and the density selector both go through `haversine_distance`.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const STANDARD_GRAVITY: f64 = 9.81; // m/s²

/// Great-circle distance in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from the first position to the second,
/// in degrees clockwise from true north, normalized into [0, 360).
pub fn initial_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let y = d_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * d_lon.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Wrap any angle in degrees into [0, 360).
pub fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid of a tiny negative rounds up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Interpolate between two bearings along the shorter arc.
///
/// `ratio` is 0.0 at `from` and 1.0 at `to`. 350° → 10° at 0.5 gives 0°, not 180°.
pub fn interpolate_bearing(from: f64, to: f64, ratio: f64) -> f64 {
    let mut diff = to - from;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    normalize_bearing(from + ratio * diff)
}

/// Longitudinal acceleration expressed in multiples of g.
///
/// Returns 0.0 when `dt_secs` is zero (two samples sharing a timestamp).
pub fn g_force(v_from: f64, v_to: f64, dt_secs: f64) -> f64 {
    if dt_secs == 0.0 {
        return 0.0;
    }
    let acceleration = (v_to - v_from) / dt_secs;
    acceleration / STANDARD_GRAVITY
}

/// Plain linear interpolation.
#[inline]
pub fn lerp(a: f64, b: f64, ratio: f64) -> f64 {
    a + ratio * (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_haversine_zero() {
        let d = haversine_distance(37.7749, -122.4194, 37.7749, -122.4194);
        assert_abs_diff_eq!(d, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_haversine_one_millidegree_latitude() {
        // 0.001° of latitude ≈ 111.19 m on a 6371 km sphere
        let d = haversine_distance(0.0, 10.0, 0.001, 10.0);
        assert_abs_diff_eq!(d, 111.19, epsilon = 0.01);
    }

    #[test]
    fn test_haversine_is_meters_not_km() {
        // Quarter meridian
        let d = haversine_distance(0.0, 0.0, 90.0, 0.0);
        assert_abs_diff_eq!(d, EARTH_RADIUS_M * std::f64::consts::FRAC_PI_2, epsilon = 1e-3);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        assert_abs_diff_eq!(initial_bearing(0.0, 0.0, 1.0, 0.0), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(initial_bearing(0.0, 0.0, 0.0, 1.0), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(initial_bearing(1.0, 0.0, 0.0, 0.0), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(initial_bearing(0.0, 1.0, 0.0, 0.0), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bearing_identical_points() {
        // atan2(0, 0) is 0, so a stationary pair reads as due north
        assert_eq!(initial_bearing(45.0, 7.0, 45.0, 7.0), 0.0);
    }

    #[test]
    fn test_normalize_bearing() {
        assert_eq!(normalize_bearing(0.0), 0.0);
        assert_eq!(normalize_bearing(360.0), 0.0);
        assert_eq!(normalize_bearing(-90.0), 270.0);
        assert_eq!(normalize_bearing(725.0), 5.0);
        let tiny = normalize_bearing(-1e-300);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_interpolate_bearing_wraparound() {
        assert_abs_diff_eq!(interpolate_bearing(350.0, 10.0, 0.5), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(interpolate_bearing(10.0, 350.0, 0.5), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(interpolate_bearing(350.0, 10.0, 0.25), 355.0, epsilon = 1e-9);
    }

    #[test]
    fn test_interpolate_bearing_plain() {
        assert_abs_diff_eq!(interpolate_bearing(90.0, 180.0, 0.5), 135.0, epsilon = 1e-9);
        assert_abs_diff_eq!(interpolate_bearing(90.0, 180.0, 0.0), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_g_force() {
        // 0 → 9.81 m/s over one second is exactly 1 g
        assert_abs_diff_eq!(g_force(0.0, 9.81, 1.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g_force(10.0, 0.19, 1.0), -1.0, epsilon = 1e-12);
        assert_eq!(g_force(3.0, 8.0, 0.0), 0.0);
    }
}
