//! Collision file encoding.
//!
//! The inverse of [`parse`](crate::parse). Used to synthesize zone files for
//! tests and tooling.

use glam::DVec3;

use crate::parse::{FORMAT_VERSION, MAGIC};
use crate::{CollisionObject, CollisionWorld, GeometryPrimitive};

/// Encode a world into the binary collision format.
///
/// Floats are narrowed to `f32`, so only worlds whose values are exactly
/// representable in `f32` survive a round trip unchanged.
#[must_use]
pub fn encode(world: &CollisionWorld) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + world.len() * 96);
    out.extend_from_slice(&MAGIC);
    put_u32(&mut out, FORMAT_VERSION);
    put_len(&mut out, world.len());
    for object in world.objects() {
        encode_object(&mut out, object);
    }
    out
}

fn encode_object(out: &mut Vec<u8>, object: &CollisionObject) {
    put_u32(out, object.primitive.tag());

    // Stored row-major.
    for value in object.transform.rotation.transpose().to_cols_array() {
        put_f32(out, value);
    }
    put_vec3(out, object.transform.position);
    put_vec3(out, object.transform.scale);

    put_u32(out, object.flags.bits());
    put_u32(out, object.collide_with.bits());
    out.push(u8::from(object.is_dynamic));

    put_len(out, object.name.len());
    out.extend_from_slice(object.name.as_bytes());

    match &object.primitive {
        GeometryPrimitive::Box { half_extents } => put_vec3(out, *half_extents),
        GeometryPrimitive::Sphere { radius } => put_f32(out, *radius),
        GeometryPrimitive::Cylinder { radius, height }
        | GeometryPrimitive::Tube { radius, height } => {
            put_f32(out, *radius);
            put_f32(out, *height);
        }
        GeometryPrimitive::Mesh { vertices, indices } => {
            put_len(out, vertices.len());
            for vertex in vertices {
                put_vec3(out, *vertex);
            }
            put_len(out, indices.len());
            for triangle in indices {
                for index in triangle {
                    put_u32(out, *index);
                }
            }
        }
        GeometryPrimitive::Other { raw_payload, .. } => {
            put_len(out, raw_payload.len());
            out.extend_from_slice(raw_payload);
        }
    }
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[allow(clippy::cast_possible_truncation)]
fn put_len(out: &mut Vec<u8>, len: usize) {
    put_u32(out, len as u32);
}

#[allow(clippy::cast_possible_truncation)]
fn put_f32(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&(value as f32).to_le_bytes());
}

fn put_vec3(out: &mut Vec<u8>, value: DVec3) {
    put_f32(out, value.x);
    put_f32(out, value.y);
    put_f32(out, value.z);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollisionFlagSet, Transform3D};

    #[test]
    fn test_header_layout() {
        let world = CollisionWorld::new(vec![CollisionObject::new(
            GeometryPrimitive::Sphere { radius: 2.0 },
            Transform3D::IDENTITY,
            CollisionFlagSet::OBJECT,
        )]);
        let bytes = encode(&world);

        assert_eq!(&bytes[0..4], b"WCBD");
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        // tag, 9 + 3 + 3 floats, two masks, dynamic byte, empty name, radius.
        assert_eq!(bytes.len(), 12 + 4 + 60 + 8 + 1 + 4 + 4);
        assert_eq!(&bytes[12..16], &2u32.to_le_bytes());
    }

    #[test]
    fn test_rotation_is_row_major() {
        let world = CollisionWorld::new(vec![CollisionObject::new(
            GeometryPrimitive::Sphere { radius: 1.0 },
            Transform3D::IDENTITY.with_yaw(std::f64::consts::FRAC_PI_2),
            CollisionFlagSet::OBJECT,
        )]);
        let bytes = encode(&world);
        let float_at = |i: usize| {
            let start = 16 + i * 4;
            f32::from_le_bytes([bytes[start], bytes[start + 1], bytes[start + 2], bytes[start + 3]])
        };
        // Row 0 of a +90° yaw is (0, -1, 0).
        assert!(float_at(0).abs() < 1e-6);
        assert!((float_at(1) + 1.0).abs() < 1e-6);
        // Row 1 is (1, 0, 0).
        assert!((float_at(3) - 1.0).abs() < 1e-6);
    }
}
