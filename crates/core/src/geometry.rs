//! Planar geometry helpers for convex tile outlines.
//!
//! Tile outlines are small convex polygons stored as `(x, y)` tuples in
//! counter-clockwise order. Area, centroid and length computations delegate to
//! the `geo` crate; the remaining helpers are the handful of predicates the
//! tiling, routing and packing code share.

use geo::{Area, Centroid, Coord, Euclidean, Length, LineString, Polygon};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D point.
pub type Point2 = (f64, f64);

/// Absolute tolerance used when comparing tile coordinates.
pub const COORD_EPSILON: f64 = 1e-9;

/// Euclidean distance between two points.
#[inline]
pub fn point_distance(a: Point2, b: Point2) -> f64 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

/// Returns true if two points lie within `tolerance` of each other.
#[inline]
pub fn points_coincide(a: Point2, b: Point2, tolerance: f64) -> bool {
    point_distance(a, b) <= tolerance
}

/// Returns true if segments `a0-a1` and `b0-b1` are the same segment,
/// regardless of direction.
pub fn segments_coincide(a0: Point2, a1: Point2, b0: Point2, b1: Point2, tolerance: f64) -> bool {
    (points_coincide(a0, b0, tolerance) && points_coincide(a1, b1, tolerance))
        || (points_coincide(a0, b1, tolerance) && points_coincide(a1, b0, tolerance))
}

fn to_geo_polygon(points: &[Point2]) -> Polygon<f64> {
    let exterior: LineString<f64> = points.iter().map(|&(x, y)| Coord { x, y }).collect();
    Polygon::new(exterior, vec![])
}

/// Unsigned area of a simple polygon.
pub fn polygon_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    to_geo_polygon(points).unsigned_area()
}

/// Length of the closed ring through `points`.
pub fn polygon_perimeter(points: &[Point2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    to_geo_polygon(points).exterior().length::<Euclidean>()
}

/// Area centroid of a polygon, falling back to the vertex mean for
/// degenerate input.
pub fn polygon_centroid(points: &[Point2]) -> Point2 {
    if points.len() >= 3 {
        if let Some(c) = to_geo_polygon(points).centroid() {
            return (c.x(), c.y());
        }
    }
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    (sx / n, sy / n)
}

/// Rotates points counter-clockwise by `angle` radians around `center`.
pub fn rotate_about(points: &[Point2], center: Point2, angle: f64) -> Vec<Point2> {
    let (sin_a, cos_a) = angle.sin_cos();
    points
        .iter()
        .map(|&(x, y)| {
            let dx = x - center.0;
            let dy = y - center.1;
            (
                center.0 + dx * cos_a - dy * sin_a,
                center.1 + dx * sin_a + dy * cos_a,
            )
        })
        .collect()
}

/// Translates points by `(dx, dy)`.
pub fn translate(points: &[Point2], dx: f64, dy: f64) -> Vec<Point2> {
    points.iter().map(|&(x, y)| (x + dx, y + dy)).collect()
}

/// Samples `samples` evenly spaced points along the closed ring through
/// `points`, starting half a step after `points[0]` and walking in ring
/// order.
pub fn sample_closed_ring(points: &[Point2], samples: usize) -> Vec<Point2> {
    if samples == 0 || points.is_empty() {
        return Vec::new();
    }
    if points.len() == 1 {
        return vec![points[0]; samples];
    }

    // Cumulative arc length at each vertex, ring closed back to points[0].
    let n = points.len();
    let mut cumulative = Vec::with_capacity(n + 1);
    cumulative.push(0.0);
    for i in 0..n {
        let next = cumulative[i] + point_distance(points[i], points[(i + 1) % n]);
        cumulative.push(next);
    }
    let total = cumulative[n];
    let step = total / samples as f64;

    let mut result = Vec::with_capacity(samples);
    let mut edge = 0;
    for k in 0..samples {
        let t = (k as f64 + 0.5) * step;
        while edge + 1 < n && cumulative[edge + 1] < t {
            edge += 1;
        }
        let length = cumulative[edge + 1] - cumulative[edge];
        let a = points[edge];
        let b = points[(edge + 1) % n];
        let f = if length > 0.0 {
            (t - cumulative[edge]) / length
        } else {
            0.0
        };
        result.push((a.0 + (b.0 - a.0) * f, a.1 + (b.1 - a.1) * f));
    }
    result
}

/// Separating-axis overlap test for two convex polygons.
///
/// Polygons that only touch (overlap depth not exceeding `tolerance` along
/// some axis) are reported as non-overlapping.
pub fn convex_polygons_overlap(a: &[Point2], b: &[Point2], tolerance: f64) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    for polygon in [a, b] {
        let n = polygon.len();
        for i in 0..n {
            let p = polygon[i];
            let q = polygon[(i + 1) % n];
            let axis = (q.1 - p.1, p.0 - q.0);
            let norm = (axis.0 * axis.0 + axis.1 * axis.1).sqrt();
            if norm < COORD_EPSILON {
                continue;
            }
            let axis = (axis.0 / norm, axis.1 / norm);
            let (min_a, max_a) = project(a, axis);
            let (min_b, max_b) = project(b, axis);
            if max_a - min_b <= tolerance || max_b - min_a <= tolerance {
                return false;
            }
        }
    }
    true
}

fn project(points: &[Point2], axis: Point2) -> (f64, f64) {
    points
        .iter()
        .map(|&(x, y)| x * axis.0 + y * axis.1)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AABB2D {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl AABB2D {
    /// Creates a bounding box from its corners.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounding box of a point set, or `None` if it is empty.
    pub fn from_points(points: &[Point2]) -> Option<Self> {
        let (&first, rest) = points.split_first()?;
        let mut aabb = Self::new(first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            aabb.min_x = aabb.min_x.min(x);
            aabb.min_y = aabb.min_y.min(y);
            aabb.max_x = aabb.max_x.max(x);
            aabb.max_y = aabb.max_y.max(y);
        }
        Some(aabb)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Returns true if the interiors overlap by more than `tolerance`.
    pub fn intersects(&self, other: &Self, tolerance: f64) -> bool {
        self.min_x + tolerance < other.max_x
            && other.min_x + tolerance < self.max_x
            && self.min_y + tolerance < other.max_y
            && other.min_y + tolerance < self.max_y
    }

    /// Returns true if `other` lies inside this box, up to `tolerance`.
    pub fn contains(&self, other: &Self, tolerance: f64) -> bool {
        other.min_x >= self.min_x - tolerance
            && other.max_x <= self.max_x + tolerance
            && other.min_y >= self.min_y - tolerance
            && other.max_y <= self.max_y + tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Vec<Point2> {
        vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
    }

    #[test]
    fn test_area_perimeter_centroid() {
        let square = unit_square();
        assert_relative_eq!(polygon_area(&square), 1.0, epsilon = 1e-12);
        assert_relative_eq!(polygon_perimeter(&square), 4.0, epsilon = 1e-12);
        let (cx, cy) = polygon_centroid(&square);
        assert_relative_eq!(cx, 0.5, epsilon = 1e-12);
        assert_relative_eq!(cy, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_segments_coincide_either_direction() {
        assert!(segments_coincide(
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 0.0),
            (0.0, 0.0),
            1e-9
        ));
        assert!(!segments_coincide(
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            1e-9
        ));
    }

    #[test]
    fn test_sample_closed_ring() {
        let samples = sample_closed_ring(&unit_square(), 4);
        assert_eq!(samples.len(), 4);
        // One sample in the middle of each side.
        assert_relative_eq!(samples[0].0, 0.5, epsilon = 1e-12);
        assert_relative_eq!(samples[0].1, 0.0, epsilon = 1e-12);
        assert_relative_eq!(samples[1].0, 1.0, epsilon = 1e-12);
        assert_relative_eq!(samples[1].1, 0.5, epsilon = 1e-12);
        assert_relative_eq!(samples[3].0, 0.0, epsilon = 1e-12);
        assert_relative_eq!(samples[3].1, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_convex_overlap() {
        let a = unit_square();
        let touching = translate(&a, 1.0, 0.0);
        let overlapping = translate(&a, 0.5, 0.5);
        let apart = translate(&a, 3.0, 0.0);
        assert!(!convex_polygons_overlap(&a, &touching, 1e-9));
        assert!(convex_polygons_overlap(&a, &overlapping, 1e-9));
        assert!(!convex_polygons_overlap(&a, &apart, 1e-9));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let rotated = rotate_about(&[(1.0, 0.0)], (0.0, 0.0), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(rotated[0].0, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated[0].1, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_aabb() {
        let aabb = AABB2D::from_points(&[(1.0, 2.0), (-1.0, 5.0), (0.0, 0.0)]).unwrap();
        assert_relative_eq!(aabb.width(), 2.0);
        assert_relative_eq!(aabb.height(), 5.0);
        let other = AABB2D::new(1.0, 0.0, 2.0, 1.0);
        assert!(!aabb.intersects(&other, 1e-9));
        assert!(AABB2D::from_points(&[]).is_none());
    }
}
