use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::geodesy::haversine_distance;
use crate::types::TrajectoryPoint;

/// Position on the unit sphere tagged with its trajectory index
type IndexedPosition = GeomWithData<[f64; 3], usize>;

// Chord lengths this close to the best one are re-ranked by haversine
const TIE_RELATIVE: f64 = 1e-9;
const TIE_ABSOLUTE: f64 = 1e-18;

/// R-tree over trajectory positions for nearest-coordinate lookups.
///
/// Positions are stored as 3D unit vectors. Straight-line (chord) distance
/// between unit vectors grows monotonically with great-circle distance, so the
/// nearest neighbor in the tree is the nearest point on the globe. Candidates
/// whose chord is within rounding of the best are re-checked with haversine
/// and the lowest trajectory index wins, which keeps results identical to a
/// linear scan.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexedPosition>,
}

impl SpatialIndex {
    pub fn from_points(points: &[TrajectoryPoint]) -> Self {
        let positions: Vec<IndexedPosition> = points
            .iter()
            .enumerate()
            .map(|(index, p)| GeomWithData::new(unit_vector(p.latitude, p.longitude), index))
            .collect();

        SpatialIndex {
            tree: RTree::bulk_load(positions),
        }
    }

    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// Index of the point closest to (lat, lng), `None` only when empty.
    ///
    /// `points` must be the slice the index was built from.
    pub fn nearest(&self, points: &[TrajectoryPoint], lat: f64, lng: f64) -> Option<usize> {
        if self.tree.size() == 0 {
            return None;
        }
        if !lat.is_finite() || !lng.is_finite() {
            // Every distance is NaN; a linear scan never improves on the first
            return Some(0);
        }

        let query = unit_vector(lat, lng);
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_chord2) = candidates.next()?;
        let cutoff = best_chord2 * (1.0 + TIE_RELATIVE) + TIE_ABSOLUTE;

        let mut best = (surface_distance(points, first.data, lat, lng), first.data);
        for (candidate, chord2) in candidates {
            if chord2 > cutoff {
                break;
            }
            let distance = surface_distance(points, candidate.data, lat, lng);
            if distance < best.0 || (distance == best.0 && candidate.data < best.1) {
                best = (distance, candidate.data);
            }
        }

        Some(best.1)
    }
}

fn surface_distance(points: &[TrajectoryPoint], index: usize, lat: f64, lng: f64) -> f64 {
    points
        .get(index)
        .map(|p| haversine_distance(lat, lng, p.latitude, p.longitude))
        .unwrap_or(f64::INFINITY)
}

fn unit_vector(lat: f64, lng: f64) -> [f64; 3] {
    let (lat, lng) = (lat.to_radians(), lng.to_radians());
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn track(coords: &[(f64, f64)]) -> Vec<TrajectoryPoint> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        coords
            .iter()
            .enumerate()
            .map(|(i, &(lat, lng))| {
                TrajectoryPoint::new(t0 + Duration::seconds(i as i64), lat, lng, 0.0, 0.0)
            })
            .collect()
    }

    #[test]
    fn test_unit_vector() {
        let v = unit_vector(0.0, 90.0);
        assert_abs_diff_eq!(v[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v[2], 0.0, epsilon = 1e-12);
        let north = unit_vector(90.0, 45.0);
        assert_abs_diff_eq!(north[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::from_points(&[]);
        assert_eq!(index.size(), 0);
        assert_eq!(index.nearest(&[], 1.0, 1.0), None);
    }

    #[test]
    fn test_nearest_simple() {
        let points = track(&[(45.0, 7.0), (45.01, 7.0), (45.02, 7.0)]);
        let index = SpatialIndex::from_points(&points);
        assert_eq!(index.nearest(&points, 45.011, 7.0), Some(1));
        assert_eq!(index.nearest(&points, 50.0, 7.0), Some(2));
        assert_eq!(index.nearest(&points, f64::NAN, 7.0), Some(0));
    }

    #[test]
    fn test_across_antimeridian() {
        let points = track(&[(10.0, 179.9), (10.0, 170.0), (10.0, -170.0)]);
        let index = SpatialIndex::from_points(&points);
        assert_eq!(index.nearest(&points, 10.0, -179.95), Some(0));
    }

    #[test]
    fn test_duplicate_positions_prefer_earliest() {
        // loop that returns to the same spot
        let points = track(&[(45.0, 7.0), (45.001, 7.0), (45.002, 7.0), (45.0, 7.0)]);
        let index = SpatialIndex::from_points(&points);
        assert_eq!(index.nearest(&points, 45.0, 7.0), Some(0));
    }
}
