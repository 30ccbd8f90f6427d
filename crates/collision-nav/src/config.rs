//! Navigation tuning.

use collision_decode::CollisionFlagSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How mesh footprints are flattened.
///
/// In either mode a footprint with no area is dropped. A zero-thickness
/// vertical wall flattens to a segment and so never blocks, even though a
/// segment would still stop an agent disc of positive radius. Give walls
/// some thickness, or model them as boxes, when they must block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshProjection {
    /// One convex hull over every vertex. Over-approximates concave meshes,
    /// so as an obstacle it blocks more than the mesh does. Walkable meshes
    /// keep their triangles for ground support, so gaps inside the hull are
    /// never stood on.
    #[default]
    ConvexHull,
    /// Every non-degenerate triangle becomes its own footprint. The union of
    /// the set is the exact outline.
    Triangles,
}

/// Tuning for projection, indexing and the safe-point search.
///
/// Every field has a default, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Radius of the agent's footprint.
    pub agent_radius: f64,
    /// Vertical slack when matching polygons to the target height.
    pub height_tolerance: f64,
    /// Outermost ring the search will try.
    pub max_search_radius: f64,
    /// Distance between rings, and the target arc length between samples.
    pub ring_spacing: f64,
    pub min_ring_samples: usize,
    pub max_ring_samples: usize,
    /// Hard cap on candidates tested by a single search.
    pub max_candidates: usize,
    /// Added to the agent radius for the first proximity query.
    pub search_margin: f64,
    pub mesh_projection: MeshProjection,
    /// Base segment count for sphere, cylinder and tube rings.
    pub circle_segments: usize,
    /// Largest distance a ring polygon may stand off its true circle.
    pub projection_tolerance: f64,
    /// Side length of a spatial index cell.
    pub cell_size: f64,
    /// Categories that never block the agent.
    pub non_blocking: CollisionFlagSet,
    /// Categories the agent can stand on.
    pub walkable: CollisionFlagSet,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            agent_radius: 0.5,
            height_tolerance: 2.0,
            max_search_radius: 16.0,
            ring_spacing: 0.25,
            min_ring_samples: 8,
            max_ring_samples: 256,
            max_candidates: 200_000,
            search_margin: 0.5,
            mesh_projection: MeshProjection::ConvexHull,
            circle_segments: 16,
            projection_tolerance: 0.05,
            cell_size: 8.0,
            non_blocking: CollisionFlagSet::WALKABLE,
            walkable: CollisionFlagSet::WALKABLE,
        }
    }
}

impl NavConfig {
    /// Parse a JSON config. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the search cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("ring_spacing", self.ring_spacing),
            ("cell_size", self.cell_size),
            ("projection_tolerance", self.projection_tolerance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config {
                    message: format!("{name} must be positive, got {value}"),
                });
            }
        }
        let non_negative = [
            ("agent_radius", self.agent_radius),
            ("height_tolerance", self.height_tolerance),
            ("max_search_radius", self.max_search_radius),
            ("search_margin", self.search_margin),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::Config {
                    message: format!("{name} must be non-negative, got {value}"),
                });
            }
        }
        if self.circle_segments < 3 {
            return Err(Error::Config {
                message: format!(
                    "circle_segments must be at least 3, got {}",
                    self.circle_segments
                ),
            });
        }
        if self.min_ring_samples == 0 || self.min_ring_samples > self.max_ring_samples {
            return Err(Error::Config {
                message: format!(
                    "ring samples must satisfy 0 < min ({}) <= max ({})",
                    self.min_ring_samples, self.max_ring_samples
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = NavConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.agent_radius - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.circle_segments, 16);
        assert_eq!(config.mesh_projection, MeshProjection::ConvexHull);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            NavConfig::from_json(r#"{ "agent_radius": 1.25, "mesh_projection": "triangles" }"#)
                .unwrap();
        assert!((config.agent_radius - 1.25).abs() < f64::EPSILON);
        assert_eq!(config.mesh_projection, MeshProjection::Triangles);
        assert_eq!(config.max_ring_samples, NavConfig::default().max_ring_samples);
    }

    #[test]
    fn test_flags_from_json() {
        let config =
            NavConfig::from_json(r#"{ "non_blocking": "WALKABLE | TRIGGER | FOG" }"#).unwrap();
        assert!(config.non_blocking.contains(CollisionFlagSet::TRIGGER));
        assert!(config.non_blocking.contains(CollisionFlagSet::FOG));
        assert!(!config.non_blocking.contains(CollisionFlagSet::OBJECT));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            NavConfig::from_json(r#"{ "ring_spacing": 0.0 }"#),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            NavConfig::from_json(r#"{ "agent_radius": -1.0 }"#),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            NavConfig::from_json(r#"{ "min_ring_samples": 300 }"#),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            NavConfig::from_json("not json"),
            Err(Error::Config { .. })
        ));
    }
}
