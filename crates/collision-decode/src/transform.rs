//! Object placement in world space.

use glam::{DMat3, DVec3};
use serde::Serialize;

/// Largest deviation from orthonormality accepted for a stored rotation.
///
/// Rotations are stored as `f32`, so exact orthonormality is not expected.
pub const ROTATION_TOLERANCE: f64 = 1e-3;

/// Placement of a collision object: `position + rotation * (scale * local)`.
///
/// Scale is applied component-wise in local space, before rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform3D {
    pub position: DVec3,
    /// Proper rotation (orthonormal, determinant +1).
    pub rotation: DMat3,
    pub scale: DVec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform3D {
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        rotation: DMat3::IDENTITY,
        scale: DVec3::ONE,
    };

    /// Unrotated, unscaled placement at `position`.
    #[must_use]
    pub fn from_translation(position: DVec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Rotation about world +Z by `angle` radians.
    #[must_use]
    pub fn with_yaw(mut self, angle: f64) -> Self {
        self.rotation = DMat3::from_rotation_z(angle);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.scale = scale;
        self
    }

    /// Map a local-space point to world space.
    #[must_use]
    pub fn apply(&self, local: DVec3) -> DVec3 {
        self.position + self.rotation * (self.scale * local)
    }

    /// Largest absolute scale component; used to size curved samples.
    #[must_use]
    pub fn max_scale(&self) -> f64 {
        self.scale.abs().max_element()
    }

    /// Check that every component is finite and the rotation is proper.
    ///
    /// The rotation is rejected, never re-normalized, when its columns are
    /// not unit length, not mutually orthogonal, or form a reflection.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if !self.position.is_finite() {
            return Err(format!("position {} is not finite", self.position));
        }
        if !self.scale.is_finite() {
            return Err(format!("scale {} is not finite", self.scale));
        }
        if !self.rotation.is_finite() {
            return Err("rotation is not finite".to_string());
        }

        let cols = [
            self.rotation.x_axis,
            self.rotation.y_axis,
            self.rotation.z_axis,
        ];
        for (i, col) in cols.iter().enumerate() {
            let error = (col.length() - 1.0).abs();
            if error > ROTATION_TOLERANCE {
                return Err(format!(
                    "rotation column {i} has length {:.6}",
                    col.length()
                ));
            }
        }
        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            let dot = cols[a].dot(cols[b]);
            if dot.abs() > ROTATION_TOLERANCE {
                return Err(format!("rotation columns {a} and {b} have dot {dot:.6}"));
            }
        }
        let det = self.rotation.determinant();
        if (det - 1.0).abs() > ROTATION_TOLERANCE * 3.0 {
            return Err(format!("rotation determinant is {det:.6}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    fn assert_close(a: DVec3, b: DVec3) {
        assert!(a.abs_diff_eq(b, 1e-9), "{a} != {b}");
    }

    #[test]
    fn test_scale_applies_before_rotation() {
        // Stretch local X by 2, then yaw 90°: local +X lands on world +Y.
        let transform = Transform3D::from_translation(DVec3::new(10.0, 0.0, 5.0))
            .with_yaw(FRAC_PI_2)
            .with_scale(DVec3::new(2.0, 1.0, 1.0));

        assert_close(transform.apply(DVec3::X), DVec3::new(10.0, 2.0, 5.0));
        assert_close(transform.apply(DVec3::Y), DVec3::new(9.0, 0.0, 5.0));
        assert_close(transform.apply(DVec3::Z), DVec3::new(10.0, 0.0, 6.0));
    }

    #[test]
    fn test_identity_is_valid() {
        assert!(Transform3D::IDENTITY.validate().is_ok());
        assert!(Transform3D::default().with_yaw(1.2).validate().is_ok());
    }

    #[test]
    fn test_rejects_scaled_rotation() {
        let transform = Transform3D {
            rotation: DMat3::from_diagonal(DVec3::splat(2.0)),
            ..Transform3D::IDENTITY
        };
        let err = transform.validate().unwrap_err();
        assert!(err.contains("length"), "{err}");
    }

    #[test]
    fn test_rejects_skewed_rotation() {
        let transform = Transform3D {
            rotation: DMat3::from_cols(
                DVec3::X,
                DVec3::new(0.1, 0.995, 0.0),
                DVec3::Z,
            ),
            ..Transform3D::IDENTITY
        };
        let err = transform.validate().unwrap_err();
        assert!(err.contains("dot"), "{err}");
    }

    #[test]
    fn test_rejects_reflection() {
        let transform = Transform3D {
            rotation: DMat3::from_diagonal(DVec3::new(1.0, 1.0, -1.0)),
            ..Transform3D::IDENTITY
        };
        let err = transform.validate().unwrap_err();
        assert!(err.contains("determinant"), "{err}");
    }

    #[test]
    fn test_rejects_non_finite() {
        let transform = Transform3D::from_translation(DVec3::new(f64::NAN, 0.0, 0.0));
        assert!(transform.validate().is_err());
    }
}
