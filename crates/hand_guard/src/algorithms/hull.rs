use geo::ConvexHull;
use geo_types::{Coord, MultiPoint, Point};
use crate::{traits::HullBuilder, types::Hull};

/// Relative tolerance below which three consecutive vertices count as collinear
pub const HULL_COLLINEAR_EPSILON: f32 = 1e-6;

/// Convex hull builder using geo crate's implementation
#[derive(Debug, Clone)]
pub struct GeoHullBuilder {
    pub collinear_epsilon: f32,
}

impl Default for GeoHullBuilder {
    fn default() -> Self {
        Self {
            collinear_epsilon: HULL_COLLINEAR_EPSILON,
        }
    }
}

fn cross(o: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f32 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn squared_length(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    dx * dx + dy * dy
}

/// Shoelace area, positive for counter-clockwise rings
fn signed_area(ring: &[[f32; 2]]) -> f32 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a[0] * b[1] - b[0] * a[1]
        })
        .sum::<f32>()
        / 2.0
}

impl GeoHullBuilder {
    fn is_collinear(&self, prev: [f32; 2], cur: [f32; 2], next: [f32; 2]) -> bool {
        cross(prev, cur, next).abs() <= self.collinear_epsilon * squared_length(prev, next)
    }

    /// Drop vertices lying on the segment between their neighbours
    fn strip_collinear(&self, mut ring: Vec<[f32; 2]>) -> Vec<[f32; 2]> {
        let mut i = 0;
        while ring.len() > 3 && i < ring.len() {
            let n = ring.len();
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            if self.is_collinear(prev, ring[i], next) {
                ring.remove(i);
                i = i.saturating_sub(1);
            } else {
                i += 1;
            }
        }
        ring
    }

    /// The two points spanning a collinear set
    fn extremes(points: &[[f32; 2]]) -> Vec<[f32; 2]> {
        let by_xy = |a: &&[f32; 2], b: &&[f32; 2]| {
            a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1]))
        };
        match (points.iter().min_by(by_xy), points.iter().max_by(by_xy)) {
            (Some(&min), Some(&max)) if min != max => vec![min, max],
            (Some(&min), _) => vec![min],
            _ => Vec::new(),
        }
    }
}

impl HullBuilder for GeoHullBuilder {
    fn build(&self, points: &[[f32; 2]]) -> Hull {
        if points.len() < 3 {
            return Hull::new(points.to_vec());
        }

        let mut unique = points.to_vec();
        unique.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
        unique.dedup();
        if unique.len() < 3 {
            return Hull::new(unique);
        }

        let first = unique[0];
        let last = unique[unique.len() - 1];
        if unique.iter().all(|&p| self.is_collinear(first, p, last)) {
            return Hull::new(Self::extremes(&unique));
        }

        let multi_point: MultiPoint<f32> = unique
            .iter()
            .map(|&[x, y]| Point::from(Coord { x, y }))
            .collect();
        let polygon = multi_point.convex_hull();

        let mut ring: Vec<[f32; 2]> = polygon
            .exterior()
            .coords()
            .map(|coord| [coord.x, coord.y])
            .collect();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if signed_area(&ring) < 0.0 {
            ring.reverse();
        }

        Hull::new(self.strip_collinear(ring))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random points inside a box
    fn scattered_points(n: usize, seed: u32) -> Vec<[f32; 2]> {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 16) as f32 / 65_536.0
        };
        (0..n)
            .map(|_| [(next() * 300.0).floor(), (next() * 200.0).floor()])
            .collect()
    }

    fn assert_convex_and_contains(hull: &Hull, points: &[[f32; 2]]) {
        let ring = &hull.points;
        let n = ring.len();
        assert!(n >= 3);
        for i in 0..n {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            let c = ring[(i + 2) % n];
            assert!(cross(a, b, c) > 0.0, "hull must turn left at every vertex");
            for &p in points {
                assert!(cross(a, b, p) >= -1e-3, "point {p:?} outside edge {a:?}->{b:?}");
            }
        }
    }

    #[test]
    fn test_hull_of_square_with_interior_points() {
        let points = vec![
            [0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [10.0, 5.0], [10.0, 10.0],
            [5.0, 10.0], [0.0, 10.0], [0.0, 5.0], [5.0, 5.0], [3.0, 7.0],
        ];
        let hull = GeoHullBuilder::default().build(&points);

        assert_eq!(hull.len(), 4);
        for corner in [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]] {
            assert!(hull.points.contains(&corner));
        }
        assert_convex_and_contains(&hull, &points);
        assert_eq!(hull.area(), 100.0);
    }

    #[test]
    fn test_hull_properties_on_scattered_points() {
        for seed in [1, 7, 42, 1234] {
            let points = scattered_points(200, seed);
            let hull = GeoHullBuilder::default().build(&points);
            assert!(hull.len() <= points.len());
            assert_convex_and_contains(&hull, &points);
        }
    }

    #[test]
    fn test_hull_of_concave_boundary() {
        // L-shaped outline; the notch corner is not on the hull
        let points = vec![
            [0.0, 0.0], [20.0, 0.0], [20.0, 5.0], [5.0, 5.0], [5.0, 20.0], [0.0, 20.0],
        ];
        let hull = GeoHullBuilder::default().build(&points);
        assert!(!hull.points.contains(&[5.0, 5.0]));
        assert_eq!(hull.len(), 5);
        assert_convex_and_contains(&hull, &points);
    }

    #[test]
    fn test_degenerate_inputs_returned_as_is() {
        let builder = GeoHullBuilder::default();
        assert!(builder.build(&[]).is_empty());
        assert_eq!(builder.build(&[[3.0, 4.0]]).points, vec![[3.0, 4.0]]);
        assert_eq!(
            builder.build(&[[3.0, 4.0], [9.0, 1.0]]).points,
            vec![[3.0, 4.0], [9.0, 1.0]]
        );
    }

    #[test]
    fn test_collinear_input_collapses_to_segment() {
        let points = vec![[2.0, 2.0], [0.0, 0.0], [4.0, 4.0], [1.0, 1.0], [3.0, 3.0]];
        let hull = GeoHullBuilder::default().build(&points);
        assert_eq!(hull.points, vec![[0.0, 0.0], [4.0, 4.0]]);
        assert!(hull.is_degenerate());
    }

    #[test]
    fn test_repeated_point_collapses() {
        let hull = GeoHullBuilder::default().build(&[[1.0, 1.0]; 5]);
        assert_eq!(hull.points, vec![[1.0, 1.0]]);
    }
}
