//! Collision file parsing.

use glam::DMat3;

use crate::error::{ParseError, ParseResult};
use crate::primitive::tag;
use crate::reader::ByteReader;
use crate::{CollisionFlagSet, CollisionObject, CollisionWorld, GeometryPrimitive, Transform3D};

/// File magic.
pub const MAGIC: [u8; 4] = *b"WCBD";

/// The only format version this decoder understands.
pub const FORMAT_VERSION: u32 = 1;

/// Smallest possible object record: tag, 15 transform floats, two masks,
/// dynamic byte, empty name and a 4-byte payload.
const MIN_RECORD_SIZE: usize = 4 + 15 * 4 + 8 + 1 + 4 + 4;

/// Decode a zone collision file.
///
/// # Format
///
/// - Header: magic `WCBD`, `u32` version, `u32` object count (non-zero)
/// - Per object: `u32` type tag, 9 × `f32` row-major rotation, 3 × `f32`
///   position, 3 × `f32` scale, `u32` category mask, `u32` collide mask,
///   `u8` dynamic flag, `u32`-prefixed UTF-8 name, then the payload
/// - Payloads: box 3 × `f32` half extents; sphere `f32` radius; cylinder
///   and tube `f32` radius, `f32` height; mesh `u32` vertex count,
///   vertices as 3 × `f32`, `u32` triangle count, triangles as 3 × `u32`;
///   anything else a `u32` length and that many raw bytes
///
/// All values are little-endian. Bytes after the last object are ignored.
///
/// # Errors
///
/// - [`ParseError::BadHeader`] for a wrong magic or a zero object count
/// - [`ParseError::UnknownFormatVersion`] for any version but [`FORMAT_VERSION`]
/// - [`ParseError::Truncated`] when the buffer ends inside a field
/// - [`ParseError::InvalidGeometry`] when any object fails validation; the
///   whole world is rejected
pub fn parse(bytes: &[u8]) -> ParseResult<CollisionWorld> {
    parse_prefix(bytes).map(|(world, _)| world)
}

/// Like [`parse`], also returning how many bytes the world occupied.
///
/// Anything past that offset is trailing data.
pub fn parse_prefix(bytes: &[u8]) -> ParseResult<(CollisionWorld, usize)> {
    let mut reader = ByteReader::new(bytes);

    let magic = reader.read_array::<4>("header magic")?;
    if magic != MAGIC {
        return Err(ParseError::BadHeader {
            detail: format!("expected magic {MAGIC:02x?}, got {magic:02x?}"),
        });
    }

    let version = reader.read_u32("header version")?;
    if version != FORMAT_VERSION {
        return Err(ParseError::UnknownFormatVersion { version });
    }

    let count = reader.read_u32("header object count")? as usize;
    if count == 0 {
        return Err(ParseError::BadHeader {
            detail: "object count is zero".to_string(),
        });
    }

    let mut objects = Vec::with_capacity(reader.capacity_hint(count, MIN_RECORD_SIZE));
    for index in 0..count {
        objects.push(read_object(&mut reader, index)?);
    }

    Ok((CollisionWorld::new(objects), reader.offset()))
}

fn read_object(reader: &mut ByteReader<'_>, index: usize) -> ParseResult<CollisionObject> {
    let tag = reader.read_u32("object tag")?;

    let mut rows = [0.0; 9];
    for value in &mut rows {
        *value = reader.read_f32("object rotation")?;
    }
    let rotation = DMat3::from_cols_array(&rows).transpose();
    let position = reader.read_dvec3("object position")?;
    let scale = reader.read_dvec3("object scale")?;

    let flags = CollisionFlagSet::from_bits_retain(reader.read_u32("object category mask")?);
    let collide_with = CollisionFlagSet::from_bits_retain(reader.read_u32("object collide mask")?);
    let is_dynamic = match reader.read_u8("object dynamic flag")? {
        0 => false,
        1 => true,
        other => {
            return Err(invalid(index, format!("dynamic flag byte is {other}")));
        }
    };
    let name = reader.read_string("object name")?;
    let primitive = read_primitive(reader, tag)?;

    let transform = Transform3D {
        position,
        rotation,
        scale,
    };
    transform.validate().map_err(|detail| invalid(index, detail))?;
    primitive.validate().map_err(|detail| invalid(index, detail))?;

    Ok(CollisionObject {
        name,
        primitive,
        transform,
        flags,
        collide_with,
        is_dynamic,
    })
}

fn read_primitive(reader: &mut ByteReader<'_>, type_tag: u32) -> ParseResult<GeometryPrimitive> {
    let primitive = match type_tag {
        tag::BOX => GeometryPrimitive::Box {
            half_extents: reader.read_dvec3("box payload")?,
        },
        tag::SPHERE => GeometryPrimitive::Sphere {
            radius: reader.read_f32("sphere payload")?,
        },
        tag::CYLINDER => GeometryPrimitive::Cylinder {
            radius: reader.read_f32("cylinder payload")?,
            height: reader.read_f32("cylinder payload")?,
        },
        tag::TUBE => GeometryPrimitive::Tube {
            radius: reader.read_f32("tube payload")?,
            height: reader.read_f32("tube payload")?,
        },
        tag::MESH => read_mesh(reader)?,
        other => {
            let len = reader.read_u32("payload length")? as usize;
            GeometryPrimitive::Other {
                tag: other,
                raw_payload: reader.take(len, "raw payload")?.to_vec(),
            }
        }
    };
    Ok(primitive)
}

fn read_mesh(reader: &mut ByteReader<'_>) -> ParseResult<GeometryPrimitive> {
    let vertex_count = reader.read_u32("mesh vertex count")? as usize;
    let mut vertices = Vec::with_capacity(reader.capacity_hint(vertex_count, 12));
    for _ in 0..vertex_count {
        vertices.push(reader.read_dvec3("mesh vertices")?);
    }

    let triangle_count = reader.read_u32("mesh triangle count")? as usize;
    let mut indices = Vec::with_capacity(reader.capacity_hint(triangle_count, 12));
    for _ in 0..triangle_count {
        indices.push([
            reader.read_u32("mesh triangles")?,
            reader.read_u32("mesh triangles")?,
            reader.read_u32("mesh triangles")?,
        ]);
    }

    Ok(GeometryPrimitive::Mesh { vertices, indices })
}

fn invalid(object: usize, detail: String) -> ParseError {
    ParseError::InvalidGeometry { object, detail }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use proptest::prelude::*;

    use super::*;
    use crate::encode;

    fn sample_world() -> CollisionWorld {
        CollisionWorld::new(vec![
            CollisionObject::new(
                GeometryPrimitive::Box {
                    half_extents: DVec3::new(1.0, 2.0, 0.5),
                },
                Transform3D::from_translation(DVec3::new(10.0, -4.0, 2.0)),
                CollisionFlagSet::OBJECT,
            )
            .with_name("crate_01")
            .with_collide_with(CollisionFlagSet::LOCAL_PLAYER),
            CollisionObject::new(
                GeometryPrimitive::Sphere { radius: 3.0 },
                Transform3D::IDENTITY.with_scale(DVec3::splat(2.0)),
                CollisionFlagSet::OBJECT | CollisionFlagSet::HITSCAN,
            ),
            CollisionObject::new(
                GeometryPrimitive::Cylinder {
                    radius: 0.75,
                    height: 4.0,
                },
                Transform3D::from_translation(DVec3::new(-8.0, 8.0, 0.0)),
                CollisionFlagSet::OBJECT,
            )
            .dynamic(),
            CollisionObject::new(
                GeometryPrimitive::Tube {
                    radius: 0.5,
                    height: 6.0,
                },
                Transform3D::IDENTITY,
                CollisionFlagSet::TRIGGER,
            ),
            CollisionObject::new(
                GeometryPrimitive::Mesh {
                    vertices: vec![
                        DVec3::new(-20.0, -20.0, 0.0),
                        DVec3::new(20.0, -20.0, 0.0),
                        DVec3::new(20.0, 20.0, 0.0),
                        DVec3::new(-20.0, 20.0, 0.0),
                    ],
                    indices: vec![[0, 1, 2], [0, 2, 3]],
                },
                Transform3D::IDENTITY,
                CollisionFlagSet::WALKABLE,
            )
            .with_name("floor"),
            CollisionObject::new(
                GeometryPrimitive::Other {
                    tag: tag::PLANE,
                    raw_payload: vec![0, 0, 0, 0, 0, 0, 128, 63, 0, 0, 0, 0, 0, 0, 0, 0],
                },
                Transform3D::IDENTITY,
                CollisionFlagSet::OBJECT,
            ),
        ])
    }

    fn header(version: u32, count: u32) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes
    }

    /// Byte offset of the first object's rotation block.
    const FIRST_ROTATION: usize = 12 + 4;

    fn write_f32(bytes: &mut [u8], offset: usize, value: f32) {
        bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn test_round_trip_all_primitives() {
        let world = sample_world();
        let parsed = parse(&encode(&world)).unwrap();
        assert_eq!(parsed, world);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&sample_world());
        bytes[0] = b'X';
        assert!(matches!(parse(&bytes), Err(ParseError::BadHeader { .. })));
    }

    #[test]
    fn test_unknown_version() {
        let bytes = header(7, 1);
        assert_eq!(
            parse(&bytes),
            Err(ParseError::UnknownFormatVersion { version: 7 })
        );
    }

    #[test]
    fn test_zero_objects_rejected() {
        assert!(matches!(
            parse(&header(FORMAT_VERSION, 0)),
            Err(ParseError::BadHeader { .. })
        ));
    }

    #[test]
    fn test_huge_count_is_truncated_not_allocated() {
        let bytes = header(FORMAT_VERSION, u32::MAX);
        assert!(matches!(parse(&bytes), Err(ParseError::Truncated { .. })));
    }

    #[test]
    fn test_empty_buffer() {
        assert!(matches!(
            parse(&[]),
            Err(ParseError::Truncated {
                context: "header magic",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_tag_is_preserved() {
        let world = CollisionWorld::new(vec![CollisionObject::new(
            GeometryPrimitive::Other {
                tag: 99,
                raw_payload: vec![1, 2, 3],
            },
            Transform3D::IDENTITY,
            CollisionFlagSet::OBJECT,
        )]);
        let parsed = parse(&encode(&world)).unwrap();
        assert_eq!(
            parsed.objects()[0].primitive,
            GeometryPrimitive::Other {
                tag: 99,
                raw_payload: vec![1, 2, 3],
            }
        );
    }

    #[test]
    fn test_non_finite_rotation_fails_whole_world() {
        let mut bytes = encode(&sample_world());
        write_f32(&mut bytes, FIRST_ROTATION, f32::NAN);
        assert!(matches!(
            parse(&bytes),
            Err(ParseError::InvalidGeometry { object: 0, .. })
        ));
    }

    #[test]
    fn test_non_orthonormal_rotation_rejected() {
        let mut bytes = encode(&sample_world());
        // Scale the first row: no longer a rotation.
        write_f32(&mut bytes, FIRST_ROTATION, 1.5);
        let err = parse(&bytes).unwrap_err();
        assert!(
            matches!(err, ParseError::InvalidGeometry { object: 0, .. }),
            "{err}"
        );
    }

    #[test]
    fn test_non_finite_payload_rejected() {
        let world = CollisionWorld::new(vec![
            CollisionObject::new(
                GeometryPrimitive::Sphere { radius: 1.0 },
                Transform3D::IDENTITY,
                CollisionFlagSet::OBJECT,
            ),
            CollisionObject::new(
                GeometryPrimitive::Sphere {
                    radius: f64::INFINITY,
                },
                Transform3D::IDENTITY,
                CollisionFlagSet::OBJECT,
            ),
        ]);
        assert!(matches!(
            parse(&encode(&world)),
            Err(ParseError::InvalidGeometry { object: 1, .. })
        ));
    }

    #[test]
    fn test_mesh_index_out_of_range() {
        let world = CollisionWorld::new(vec![CollisionObject::new(
            GeometryPrimitive::Mesh {
                vertices: vec![DVec3::ZERO, DVec3::X, DVec3::Y],
                indices: vec![[0, 1, 3]],
            },
            Transform3D::IDENTITY,
            CollisionFlagSet::WALKABLE,
        )]);
        assert!(matches!(
            parse(&encode(&world)),
            Err(ParseError::InvalidGeometry { object: 0, .. })
        ));
    }

    #[test]
    fn test_bad_dynamic_byte() {
        let mut bytes = encode(&sample_world());
        // tag + 15 floats + two masks.
        let dynamic_offset = FIRST_ROTATION + 60 + 8;
        bytes[dynamic_offset] = 7;
        assert!(matches!(
            parse(&bytes),
            Err(ParseError::InvalidGeometry { object: 0, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bytes = encode(&sample_world());
        bytes.extend_from_slice(&[0xAA; 5]);
        assert_eq!(parse(&bytes).unwrap(), sample_world());
        let (_, consumed) = parse_prefix(&bytes).unwrap();
        assert_eq!(bytes.len() - consumed, 5);
    }

    #[test]
    fn test_every_prefix_is_truncated() {
        let bytes = encode(&sample_world());
        for len in 0..bytes.len() {
            let result = parse(&bytes[..len]);
            assert!(
                matches!(result, Err(ParseError::Truncated { .. })),
                "prefix of {len} bytes gave {result:?}"
            );
        }
    }

    fn finite_f32() -> impl Strategy<Value = f64> {
        (-1.0e4f32..1.0e4f32).prop_map(f64::from)
    }

    fn dimension() -> impl Strategy<Value = f64> {
        (0.0f32..100.0f32).prop_map(f64::from)
    }

    fn vec3() -> impl Strategy<Value = DVec3> {
        (finite_f32(), finite_f32(), finite_f32()).prop_map(|(x, y, z)| DVec3::new(x, y, z))
    }

    fn primitive() -> impl Strategy<Value = GeometryPrimitive> {
        prop_oneof![
            (dimension(), dimension(), dimension()).prop_map(|(x, y, z)| GeometryPrimitive::Box {
                half_extents: DVec3::new(x, y, z)
            }),
            dimension().prop_map(|radius| GeometryPrimitive::Sphere { radius }),
            (dimension(), dimension())
                .prop_map(|(radius, height)| GeometryPrimitive::Cylinder { radius, height }),
            (dimension(), dimension())
                .prop_map(|(radius, height)| GeometryPrimitive::Tube { radius, height }),
            prop::collection::vec(vec3(), 1..12).prop_flat_map(|vertices| {
                let len = vertices.len() as u32;
                prop::collection::vec([0..len, 0..len, 0..len], 0..8).prop_map(move |indices| {
                    GeometryPrimitive::Mesh {
                        vertices: vertices.clone(),
                        indices,
                    }
                })
            }),
            (7u32..1000, prop::collection::vec(any::<u8>(), 0..32))
                .prop_map(|(tag, raw_payload)| GeometryPrimitive::Other { tag, raw_payload }),
        ]
    }

    fn object() -> impl Strategy<Value = CollisionObject> {
        (
            primitive(),
            vec3(),
            // Quarter turns keep the f32-narrowed rotation exact.
            0u8..4,
            any::<u32>(),
            any::<u32>(),
            any::<bool>(),
            "[a-z_0-9]{0,12}",
        )
            .prop_map(|(primitive, position, quarter_turns, flags, collide, dynamic, name)| {
                let yaw = f64::from(quarter_turns) * std::f64::consts::FRAC_PI_2;
                let rotation = DMat3::from_rotation_z(yaw);
                // Snap the cos/sin noise so the encoded floats are exact.
                let rotation = DMat3::from_cols_array(&rotation.to_cols_array().map(f64::round));
                CollisionObject {
                    name,
                    primitive,
                    transform: Transform3D {
                        position,
                        rotation,
                        scale: DVec3::ONE,
                    },
                    flags: CollisionFlagSet::from_bits_retain(flags),
                    collide_with: CollisionFlagSet::from_bits_retain(collide),
                    is_dynamic: dynamic,
                }
            })
    }

    proptest! {
        #[test]
        fn prop_round_trip(objects in prop::collection::vec(object(), 1..6)) {
            let world = CollisionWorld::new(objects);
            prop_assert_eq!(parse(&encode(&world)).unwrap(), world);
        }

        #[test]
        fn prop_truncation_never_panics(
            objects in prop::collection::vec(object(), 1..4),
            cut in any::<prop::sample::Index>(),
        ) {
            let bytes = encode(&CollisionWorld::new(objects));
            let len = cut.index(bytes.len());
            let result = parse(&bytes[..len]);
            prop_assert!(matches!(result, Err(ParseError::Truncated { .. })), "expected Truncated, got {:?}", result);
        }

        #[test]
        fn prop_garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let mut data = header(FORMAT_VERSION, 3);
            data.extend_from_slice(&bytes);
            let _ = parse(&data);
        }
    }
}
