//! Local-to-world sampling of collision primitives.
//!
//! Curved shapes are replaced by circumscribed polygons so the sampled
//! outline always contains the true surface.

use std::f64::consts::{PI, TAU};

use collision_decode::{GeometryPrimitive, Transform3D};
use glam::DVec3;

use crate::NavConfig;

/// Upper bound on the segment count of a sampled circle.
pub const MAX_CIRCLE_SEGMENTS: usize = 256;

/// Segment count for a circle of world-space `radius`.
///
/// Starts at `config.circle_segments` and doubles until the sagitta
/// `r * (1 - cos(pi / n))` is within `config.projection_tolerance`.
#[must_use]
pub fn segments_for_radius(radius: f64, config: &NavConfig) -> usize {
    let mut segments = config.circle_segments.max(3);
    while segments < MAX_CIRCLE_SEGMENTS && sagitta(radius, segments) > config.projection_tolerance
    {
        segments *= 2;
    }
    segments.min(MAX_CIRCLE_SEGMENTS)
}

#[allow(clippy::cast_precision_loss)]
fn sagitta(radius: f64, segments: usize) -> f64 {
    radius * (1.0 - (PI / segments as f64).cos())
}

/// Points of a circle of `radius` around the origin, in the plane spanned
/// by `u` and `v`, pushed out so every edge stays outside the circle.
#[allow(clippy::cast_precision_loss)]
fn ring(
    radius: f64,
    segments: usize,
    u: DVec3,
    v: DVec3,
    offset: DVec3,
) -> impl Iterator<Item = DVec3> {
    let circumscribed = radius / (PI / segments as f64).cos();
    (0..segments).map(move |i| {
        let angle = TAU * i as f64 / segments as f64;
        offset + (u * angle.cos() + v * angle.sin()) * circumscribed
    })
}

/// Sample points of `primitive` in its local space.
#[must_use]
pub fn local_points(
    primitive: &GeometryPrimitive,
    transform: &Transform3D,
    config: &NavConfig,
) -> Vec<DVec3> {
    match primitive {
        GeometryPrimitive::Box { half_extents } => {
            let h = *half_extents;
            (0..8)
                .map(|i| {
                    DVec3::new(
                        if i & 1 == 0 { -h.x } else { h.x },
                        if i & 2 == 0 { -h.y } else { h.y },
                        if i & 4 == 0 { -h.z } else { h.z },
                    )
                })
                .collect()
        }
        GeometryPrimitive::Sphere { radius } => {
            let n = segments_for_radius(radius * transform.max_scale(), config);
            let mut points = Vec::with_capacity(3 * n + 2);
            points.extend(ring(*radius, n, DVec3::X, DVec3::Y, DVec3::ZERO));
            points.extend(ring(*radius, n, DVec3::X, DVec3::Z, DVec3::ZERO));
            points.extend(ring(*radius, n, DVec3::Y, DVec3::Z, DVec3::ZERO));
            points.push(DVec3::Z * *radius);
            points.push(DVec3::NEG_Z * *radius);
            points
        }
        GeometryPrimitive::Cylinder { radius, height }
        | GeometryPrimitive::Tube { radius, height } => {
            let n = segments_for_radius(radius * transform.max_scale(), config);
            let half = DVec3::Z * (height * 0.5);
            ring(*radius, n, DVec3::X, DVec3::Y, half)
                .chain(ring(*radius, n, DVec3::X, DVec3::Y, -half))
                .collect()
        }
        GeometryPrimitive::Mesh { vertices, .. } => vertices.clone(),
        GeometryPrimitive::Other { .. } => Vec::new(),
    }
}

/// Sample points of `primitive` placed by `transform`, in world space.
///
/// Meshes yield exactly their declared vertices; unrecognised shapes
/// yield nothing.
#[must_use]
pub fn to_world(
    primitive: &GeometryPrimitive,
    transform: &Transform3D,
    config: &NavConfig,
) -> Vec<DVec3> {
    local_points(primitive, transform, config)
        .into_iter()
        .map(|p| transform.apply(p))
        .collect()
}
