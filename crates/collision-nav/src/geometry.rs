//! Ground-plane geometry helpers.
//!
//! Footprints are convex rings stored counter-clockwise without repeating
//! the first vertex.

use glam::DVec2;
use serde::Serialize;

/// Footprints with less area than this are dropped as degenerate.
pub const MIN_FOOTPRINT_AREA: f64 = 1e-9;

/// Axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb2 {
    pub min: DVec2,
    pub max: DVec2,
}

impl Aabb2 {
    /// Bounds of a point set. Empty input yields an inverted box.
    #[must_use]
    pub fn from_points(points: &[DVec2]) -> Self {
        points.iter().fold(
            Self {
                min: DVec2::splat(f64::INFINITY),
                max: DVec2::splat(f64::NEG_INFINITY),
            },
            |acc, &p| Self {
                min: acc.min.min(p),
                max: acc.max.max(p),
            },
        )
    }

    /// Distance from `point` to the rectangle; zero inside.
    #[must_use]
    pub fn distance_to(&self, point: DVec2) -> f64 {
        let outside = (self.min - point).max(point - self.max).max(DVec2::ZERO);
        outside.length()
    }

    #[must_use]
    pub fn extent(&self) -> DVec2 {
        self.max - self.min
    }
}

/// Z component of `(a - o) × (b - o)`; positive for a left turn.
#[must_use]
pub fn cross(o: DVec2, a: DVec2, b: DVec2) -> f64 {
    (a - o).perp_dot(b - o)
}

/// Convex hull by monotone chain, counter-clockwise.
///
/// Collinear and duplicate points are removed. Fewer than three
/// non-collinear points give an empty hull.
#[must_use]
pub fn convex_hull(points: &[DVec2]) -> Vec<DVec2> {
    let mut sorted: Vec<DVec2> = points.iter().copied().filter(|p| p.is_finite()).collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return Vec::new();
    }

    let mut lower = half_hull(sorted.iter().copied());
    let mut upper = half_hull(sorted.iter().rev().copied());
    // Each chain ends where the other begins.
    lower.pop();
    upper.pop();
    lower.extend(upper);

    if lower.len() < 3 {
        return Vec::new();
    }
    lower
}

fn half_hull(points: impl Iterator<Item = DVec2>) -> Vec<DVec2> {
    let mut chain: Vec<DVec2> = Vec::new();
    for p in points {
        while chain.len() >= 2 && cross(chain[chain.len() - 2], chain[chain.len() - 1], p) <= 0.0 {
            chain.pop();
        }
        chain.push(p);
    }
    chain
}

/// Signed area of a ring; positive when counter-clockwise.
#[must_use]
pub fn signed_area(ring: &[DVec2]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| ring[i].perp_dot(ring[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

/// Whether `point` lies inside or on a counter-clockwise convex ring.
#[must_use]
pub fn convex_contains(ring: &[DVec2], point: DVec2) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| cross(ring[i], ring[(i + 1) % n], point) >= 0.0)
}

/// Distance from `point` to the segment `a..b`.
#[must_use]
pub fn segment_distance(a: DVec2, b: DVec2, point: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

/// Distance from `point` to the boundary of a ring.
#[must_use]
pub fn boundary_distance(ring: &[DVec2], point: DVec2) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| segment_distance(ring[i], ring[(i + 1) % n], point))
        .fold(f64::INFINITY, f64::min)
}

/// Whether the open disc of `radius` around `point` overlaps a convex ring.
///
/// A disc that only touches the ring at exactly `radius` does not overlap.
/// With a zero radius this reduces to point containment.
#[must_use]
pub fn disc_overlaps(ring: &[DVec2], point: DVec2, radius: f64) -> bool {
    convex_contains(ring, point) || boundary_distance(ring, point) < radius
}
