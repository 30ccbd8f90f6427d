//! Collision category flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of collision categories attached to an object.
    ///
    /// Bit positions follow the game's collision categories. Bits without a
    /// name are retained as-is so that re-encoding a world reproduces the
    /// original mask. The parser assigns no meaning to any flag; the search
    /// decides which categories block movement.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionFlagSet: u32 {
        const OBJECT = 1 << 0;
        const WALKABLE = 1 << 1;
        const HITSCAN = 1 << 3;
        const LOCAL_PLAYER = 1 << 4;
        const WATER = 1 << 6;
        const CLIENT_OBJECT = 1 << 7;
        const TRIGGER = 1 << 8;
        const FOG = 1 << 9;
        const GOO = 1 << 10;
        const FISH = 1 << 11;
        const MUCK = 1 << 12;
        const TAR = 1 << 13;
        const DYNAMIC = 1 << 14;

        const _ = !0;
    }
}

/// Categories in the order used to pick a single label for a mixed mask.
const LABEL_PRIORITY: [(CollisionFlagSet, &str); 13] = [
    (CollisionFlagSet::WALKABLE, "walkable"),
    (CollisionFlagSet::WATER, "water"),
    (CollisionFlagSet::TRIGGER, "trigger"),
    (CollisionFlagSet::OBJECT, "object"),
    (CollisionFlagSet::LOCAL_PLAYER, "local_player"),
    (CollisionFlagSet::HITSCAN, "hitscan"),
    (CollisionFlagSet::FOG, "fog"),
    (CollisionFlagSet::CLIENT_OBJECT, "client_object"),
    (CollisionFlagSet::GOO, "goo"),
    (CollisionFlagSet::FISH, "fish"),
    (CollisionFlagSet::MUCK, "muck"),
    (CollisionFlagSet::TAR, "tar"),
    (CollisionFlagSet::DYNAMIC, "dynamic"),
];

impl CollisionFlagSet {
    /// A single descriptive label for the mask, for logs and debug exports.
    ///
    /// Walkable surfaces win over everything else, then water, triggers and
    /// plain objects. Masks with no named category report `"none"`.
    #[must_use]
    pub fn primary_label(self) -> &'static str {
        LABEL_PRIORITY
            .iter()
            .find(|(flag, _)| self.contains(*flag))
            .map_or("none", |(_, label)| label)
    }
}
