//! Decoded collision world.

use glam::DVec3;
use serde::Serialize;

use crate::{CollisionFlagSet, GeometryPrimitive, Transform3D};

/// One collision proxy placed in a zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionObject {
    /// Label from the file; may be empty.
    pub name: String,
    pub primitive: GeometryPrimitive,
    pub transform: Transform3D,
    /// Categories this object belongs to.
    pub flags: CollisionFlagSet,
    /// Categories this object collides with. Preserved, not interpreted.
    pub collide_with: CollisionFlagSet,
    /// Whether the object can move between searches.
    pub is_dynamic: bool,
}

impl CollisionObject {
    /// A static, unnamed object that collides with nothing in particular.
    #[must_use]
    pub fn new(
        primitive: GeometryPrimitive,
        transform: Transform3D,
        flags: CollisionFlagSet,
    ) -> Self {
        Self {
            name: String::new(),
            primitive,
            transform,
            flags,
            collide_with: CollisionFlagSet::empty(),
            is_dynamic: false,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_collide_with(mut self, collide_with: CollisionFlagSet) -> Self {
        self.collide_with = collide_with;
        self
    }

    /// A live entity modelled as an upright dynamic cylinder whose base
    /// sits at `feet`.
    #[must_use]
    pub fn entity(feet: DVec3, radius: f64, height: f64) -> Self {
        Self::new(
            GeometryPrimitive::Cylinder { radius, height },
            Transform3D::from_translation(feet + DVec3::Z * (height * 0.5)),
            CollisionFlagSet::OBJECT,
        )
        .with_name("entity")
        .dynamic()
    }

    /// Mark the object as dynamic.
    #[must_use]
    pub fn dynamic(mut self) -> Self {
        self.is_dynamic = true;
        self
    }
}

/// All collision objects of one zone, in file order.
///
/// A world produced by [`parse`](crate::parse) is never empty and every
/// object has passed geometry validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CollisionWorld {
    objects: Vec<CollisionObject>,
}

impl CollisionWorld {
    #[must_use]
    pub fn new(objects: Vec<CollisionObject>) -> Self {
        Self { objects }
    }

    #[must_use]
    pub fn objects(&self) -> &[CollisionObject] {
        &self.objects
    }

    /// Look up an object by its position in the file.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&CollisionObject> {
        self.objects.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects with their ids, in file order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &CollisionObject)> {
        self.objects.iter().enumerate()
    }

    /// Number of objects flagged dynamic.
    #[must_use]
    pub fn dynamic_count(&self) -> usize {
        self.objects.iter().filter(|o| o.is_dynamic).count()
    }
}
