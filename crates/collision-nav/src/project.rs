//! Flattening sampled primitives onto the ground plane.

use collision_decode::{CollisionFlagSet, CollisionObject, CollisionWorld, GeometryPrimitive};
use glam::{DVec2, DVec3};
use serde::Serialize;

use crate::geometry::{
    Aabb2, MIN_FOOTPRINT_AREA, convex_contains, convex_hull, disc_overlaps, signed_area,
};
use crate::{MeshProjection, NavConfig, sample};

/// Ground-plane footprint of one collision object, or of one triangle of a
/// mesh, with the vertical band it occupies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedPolygon {
    footprint: Vec<DVec2>,
    bounds: Aabb2,
    pub z_min: f64,
    pub z_max: f64,
    pub flags: CollisionFlagSet,
    /// Index of the object in its world. Extra obstacles supplied with a
    /// search are numbered after the world's objects.
    pub source_object_id: usize,
    pub dynamic: bool,
    /// Pieces that actually carry ground when the footprint is a hull over a
    /// concave walkable mesh. `None` means the whole footprint does.
    #[serde(skip)]
    support: Option<Vec<ProjectedPolygon>>,
}

impl ProjectedPolygon {
    /// Convex counter-clockwise ring, at least three vertices.
    #[must_use]
    pub fn footprint(&self) -> &[DVec2] {
        &self.footprint
    }

    #[must_use]
    pub fn bounds(&self) -> Aabb2 {
        self.bounds
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area(&self.footprint)
    }

    /// Whether the vertical band, widened by `tolerance`, contains `z`.
    #[must_use]
    pub fn band_contains(&self, z: f64, tolerance: f64) -> bool {
        self.z_min - tolerance <= z && z <= self.z_max + tolerance
    }

    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        convex_contains(&self.footprint, point)
    }

    /// Whether `point` has ground under it at height `z`.
    ///
    /// A hull with support pieces only counts the pieces, each matched
    /// against its own band.
    #[must_use]
    pub fn supports(&self, point: DVec2, z: f64, tolerance: f64) -> bool {
        match &self.support {
            Some(pieces) => pieces
                .iter()
                .any(|p| p.band_contains(z, tolerance) && p.contains(point)),
            None => self.contains(point),
        }
    }

    /// Whether an open disc at `point` overlaps the footprint.
    #[must_use]
    pub fn overlaps_disc(&self, point: DVec2, radius: f64) -> bool {
        self.bounds.distance_to(point) < radius.max(f64::MIN_POSITIVE)
            && disc_overlaps(&self.footprint, point, radius)
    }
}

/// Project world-space points to a polygon.
///
/// Returns `None` when the points have no finite coordinates or their
/// footprint has (almost) no area.
#[must_use]
pub fn project(
    points: &[DVec3],
    flags: CollisionFlagSet,
    is_dynamic: bool,
    source_object_id: usize,
) -> Option<ProjectedPolygon> {
    let flat: Vec<DVec2> = points.iter().map(|p| p.truncate()).collect();
    let footprint = convex_hull(&flat);
    if footprint.is_empty() || signed_area(&footprint) < MIN_FOOTPRINT_AREA {
        return None;
    }

    let (z_min, z_max) = points
        .iter()
        .filter(|p| p.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.z), hi.max(p.z))
        });

    Some(ProjectedPolygon {
        bounds: Aabb2::from_points(&footprint),
        footprint,
        z_min,
        z_max,
        flags,
        source_object_id,
        dynamic: is_dynamic,
        support: None,
    })
}

fn triangle_polygons(
    points: &[DVec3],
    indices: &[[u32; 3]],
    object: &CollisionObject,
    id: usize,
) -> Vec<ProjectedPolygon> {
    indices
        .iter()
        .filter_map(|tri| {
            let corners = [
                *points.get(tri[0] as usize)?,
                *points.get(tri[1] as usize)?,
                *points.get(tri[2] as usize)?,
            ];
            project(&corners, object.flags, object.is_dynamic, id)
        })
        .collect()
}

/// Project a single object. Meshes may yield several polygons; anything
/// degenerate or uninterpreted yields none.
///
/// A walkable mesh flattened to its hull keeps its triangles as support
/// pieces, so the hull blocks but only real triangles carry ground.
#[must_use]
pub fn project_object(
    object: &CollisionObject,
    id: usize,
    config: &NavConfig,
) -> Vec<ProjectedPolygon> {
    let points = sample::to_world(&object.primitive, &object.transform, config);

    match (&object.primitive, config.mesh_projection) {
        (GeometryPrimitive::Mesh { indices, .. }, MeshProjection::Triangles) => {
            triangle_polygons(&points, indices, object, id)
        }
        (GeometryPrimitive::Mesh { indices, .. }, MeshProjection::ConvexHull) => {
            let Some(mut hull) = project(&points, object.flags, object.is_dynamic, id) else {
                return Vec::new();
            };
            if object.flags.intersects(config.walkable) {
                hull.support = Some(triangle_polygons(&points, indices, object, id));
            }
            vec![hull]
        }
        _ => project(&points, object.flags, object.is_dynamic, id)
            .into_iter()
            .collect(),
    }
}

/// Project every object of a list, keyed by the id it should carry.
pub fn project_objects<'a>(
    objects: impl IntoIterator<Item = (usize, &'a CollisionObject)>,
    config: &NavConfig,
) -> Vec<ProjectedPolygon> {
    objects
        .into_iter()
        .flat_map(|(id, object)| project_object(object, id, config))
        .collect()
}

/// Polygons of a whole world, split by whether their object can move.
#[derive(Debug, Clone, Default)]
pub struct ProjectedWorld {
    pub static_polygons: Vec<ProjectedPolygon>,
    pub dynamic_polygons: Vec<ProjectedPolygon>,
}

impl ProjectedWorld {
    /// Every polygon, static first, in object order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectedPolygon> {
        self.static_polygons.iter().chain(&self.dynamic_polygons)
    }
}

/// Project every object of `world`.
#[must_use]
pub fn project_world(world: &CollisionWorld, config: &NavConfig) -> ProjectedWorld {
    let (dynamic, fixed): (Vec<_>, Vec<_>) = world.iter().partition(|(_, o)| o.is_dynamic);
    let projected = ProjectedWorld {
        static_polygons: project_objects(fixed, config),
        dynamic_polygons: project_objects(dynamic, config),
    };
    tracing::debug!(
        objects = world.len(),
        static_polygons = projected.static_polygons.len(),
        dynamic_polygons = projected.dynamic_polygons.len(),
        "Projected collision world"
    );
    projected
}
