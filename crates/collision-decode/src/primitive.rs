//! Collision primitive shapes.

use glam::DVec3;
use serde::Serialize;

/// Type tags as stored in the collision file.
pub mod tag {
    pub const BOX: u32 = 0;
    pub const RAY: u32 = 1;
    pub const SPHERE: u32 = 2;
    pub const CYLINDER: u32 = 3;
    pub const TUBE: u32 = 4;
    pub const PLANE: u32 = 5;
    pub const MESH: u32 = 6;
}

/// Shape of a collision object in its local space.
///
/// Cylinders and tubes stand along local +Z and are centred on the origin,
/// so they span `-height / 2 ..= height / 2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryPrimitive {
    /// Axis-aligned cuboid spanning `-half_extents ..= half_extents`.
    Box { half_extents: DVec3 },
    Sphere { radius: f64 },
    Cylinder { radius: f64, height: f64 },
    Tube { radius: f64, height: f64 },
    /// Triangle mesh. Every index refers into `vertices`.
    Mesh {
        vertices: Vec<DVec3>,
        indices: Vec<[u32; 3]>,
    },
    /// A shape this decoder does not interpret (rays, planes, future tags).
    ///
    /// The payload is kept verbatim and never treated as an obstacle.
    Other { tag: u32, raw_payload: Vec<u8> },
}

impl GeometryPrimitive {
    /// The type tag this primitive is stored under.
    #[must_use]
    pub fn tag(&self) -> u32 {
        match self {
            Self::Box { .. } => tag::BOX,
            Self::Sphere { .. } => tag::SPHERE,
            Self::Cylinder { .. } => tag::CYLINDER,
            Self::Tube { .. } => tag::TUBE,
            Self::Mesh { .. } => tag::MESH,
            Self::Other { tag, .. } => *tag,
        }
    }

    /// Short lowercase name for logs.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Cylinder { .. } => "cylinder",
            Self::Tube { .. } => "tube",
            Self::Mesh { .. } => "mesh",
            Self::Other { tag, .. } => match *tag {
                tag::RAY => "ray",
                tag::PLANE => "plane",
                _ => "other",
            },
        }
    }

    /// Check the numeric invariants of the shape.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant: a non-finite
    /// or negative dimension, a non-finite mesh vertex, or a mesh index that
    /// does not refer to a vertex.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Box { half_extents } => {
                if !half_extents.is_finite() || half_extents.min_element() < 0.0 {
                    return Err(format!("box half extents {half_extents} out of range"));
                }
            }
            Self::Sphere { radius } => check_dimension("sphere radius", *radius)?,
            Self::Cylinder { radius, height } | Self::Tube { radius, height } => {
                check_dimension("radius", *radius)?;
                check_dimension("height", *height)?;
            }
            Self::Mesh { vertices, indices } => {
                if let Some(i) = vertices.iter().position(|v| !v.is_finite()) {
                    return Err(format!("mesh vertex {i} is not finite"));
                }
                let len = vertices.len();
                for (t, triangle) in indices.iter().enumerate() {
                    if let Some(&index) = triangle.iter().find(|&&i| i as usize >= len) {
                        return Err(format!(
                            "mesh triangle {t} refers to vertex {index}, mesh has {len}"
                        ));
                    }
                }
            }
            Self::Other { .. } => {}
        }
        Ok(())
    }
}

fn check_dimension(what: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{what} {value} out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_match_kind() {
        let sphere = GeometryPrimitive::Sphere { radius: 1.0 };
        assert_eq!(sphere.tag(), tag::SPHERE);
        assert_eq!(sphere.kind_name(), "sphere");

        let plane = GeometryPrimitive::Other {
            tag: tag::PLANE,
            raw_payload: vec![0; 16],
        };
        assert_eq!(plane.tag(), tag::PLANE);
        assert_eq!(plane.kind_name(), "plane");
    }

    #[test]
    fn test_validate_rejects_bad_dimensions() {
        assert!(GeometryPrimitive::Sphere { radius: f64::NAN }.validate().is_err());
        assert!(
            GeometryPrimitive::Cylinder {
                radius: 1.0,
                height: -2.0
            }
            .validate()
            .is_err()
        );
        assert!(
            GeometryPrimitive::Box {
                half_extents: DVec3::new(1.0, f64::INFINITY, 1.0)
            }
            .validate()
            .is_err()
        );
        assert!(
            GeometryPrimitive::Tube {
                radius: 0.0,
                height: 0.0
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn test_validate_mesh_indices() {
        let mut mesh = GeometryPrimitive::Mesh {
            vertices: vec![DVec3::ZERO, DVec3::X, DVec3::Y],
            indices: vec![[0, 1, 2]],
        };
        assert!(mesh.validate().is_ok());

        if let GeometryPrimitive::Mesh { indices, .. } = &mut mesh {
            indices.push([0, 2, 3]);
        }
        let err = mesh.validate().unwrap_err();
        assert!(err.contains("vertex 3"), "{err}");
    }
}
