//! Per-zone navigation state and the generation-checked zone cache.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use collision_decode::{CollisionObject, CollisionWorld, parse_prefix};
use glam::DVec3;

use crate::error::{Error, Result};
use crate::project::{project_objects, project_world};
use crate::search::{SafePointSearch, SearchOutcome, SearchRequest, SearchTrace};
use crate::{NavConfig, ProjectedPolygon, SpatialIndex};

/// Everything needed to answer searches in one zone.
///
/// Static geometry is projected and indexed once; dynamic objects are
/// re-projected on every search.
#[derive(Debug)]
pub struct ZoneNav {
    world: CollisionWorld,
    index: SpatialIndex,
    dynamic_ids: Vec<usize>,
    config: NavConfig,
}

impl ZoneNav {
    /// Project and index `world`.
    #[must_use]
    pub fn build(world: CollisionWorld, config: NavConfig) -> Self {
        let started = Instant::now();
        let projected = project_world(&world, &config);
        let dynamic_ids: Vec<usize> = world
            .iter()
            .filter(|(_, o)| o.is_dynamic)
            .map(|(id, _)| id)
            .collect();
        let index = SpatialIndex::build(projected.static_polygons, config.cell_size);

        tracing::info!(
            "Built zone: {} objects, {} static polygons, {} dynamic objects in {:?}",
            world.len(),
            index.len(),
            dynamic_ids.len(),
            started.elapsed()
        );

        Self {
            world,
            index,
            dynamic_ids,
            config,
        }
    }

    /// Decode a collision file and build its zone.
    pub fn from_bytes(bytes: &[u8], config: NavConfig) -> Result<Self> {
        config.validate()?;
        let (world, consumed) = parse_prefix(bytes).inspect_err(|e| {
            tracing::warn!("Rejected collision file: {e}");
        })?;
        if consumed < bytes.len() {
            tracing::debug!(
                "Ignoring {} trailing bytes after {} objects",
                bytes.len() - consumed,
                world.len()
            );
        }
        Ok(Self::build(world, config))
    }

    #[must_use]
    pub fn world(&self) -> &CollisionWorld {
        &self.world
    }

    #[must_use]
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    #[must_use]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// A request using this zone's agent radius and height tolerance.
    #[must_use]
    pub fn request(&self, start: DVec3, target: DVec3) -> SearchRequest {
        SearchRequest::new(start, target, &self.config)
    }

    /// Current footprints of the world's dynamic objects followed by
    /// `extra`, whose ids continue after the world's last object.
    #[must_use]
    pub fn dynamic_polygons(&self, extra: &[CollisionObject]) -> Vec<ProjectedPolygon> {
        let world_dynamic = self
            .dynamic_ids
            .iter()
            .filter_map(|&id| self.world.get(id).map(|o| (id, o)));
        let offset = self.world.len();
        let extra = extra.iter().enumerate().map(|(i, o)| (offset + i, o));
        project_objects(world_dynamic.chain(extra), &self.config)
    }

    /// Static polygons followed by the current dynamic ones.
    #[must_use]
    pub fn all_polygons(&self) -> Vec<ProjectedPolygon> {
        let mut polygons = self.index.polygons().to_vec();
        polygons.extend(self.dynamic_polygons(&[]));
        polygons
    }

    /// Find a safe point, treating `extra_dynamic` as additional obstacles.
    pub fn find_safe_point(
        &self,
        request: &SearchRequest,
        extra_dynamic: &[CollisionObject],
    ) -> SearchOutcome {
        let dynamic = self.dynamic_polygons(extra_dynamic);
        let outcome = SafePointSearch::new(&self.index, &dynamic, &self.config)
            .find_safe_point(request);
        log_outcome(request, &outcome);
        outcome
    }

    pub fn find_safe_point_traced(
        &self,
        request: &SearchRequest,
        extra_dynamic: &[CollisionObject],
    ) -> (SearchOutcome, SearchTrace) {
        let dynamic = self.dynamic_polygons(extra_dynamic);
        let (outcome, trace) = SafePointSearch::new(&self.index, &dynamic, &self.config)
            .find_safe_point_traced(request);
        log_outcome(request, &outcome);
        (outcome, trace)
    }
}

fn log_outcome(request: &SearchRequest, outcome: &SearchOutcome) {
    match outcome {
        Ok(point) if point.relocated() => tracing::debug!(
            "Relocated {} to {} on ring {:?} after {} candidates",
            request.target,
            point.position,
            point.ring,
            point.candidates_tested
        ),
        Ok(_) => tracing::debug!("Target {} is already safe", request.target),
        Err(failure) => tracing::debug!("No safe point near {}: {failure}", request.target),
    }
}

/// A zone as seen at one cache generation.
#[derive(Debug, Clone)]
pub struct ZoneHandle {
    generation: u64,
    zone_id: String,
    zone: Arc<ZoneNav>,
}

impl ZoneHandle {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Identifier the zone was installed under.
    #[must_use]
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    /// The zone, valid for reading regardless of later cache changes.
    #[must_use]
    pub fn zone(&self) -> &Arc<ZoneNav> {
        &self.zone
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    active: Option<ZoneHandle>,
}

/// Holds the active zone, keyed by its identifier. Installing or
/// invalidating bumps the generation, and searches through an older handle
/// are rejected.
///
/// A replacement is built completely before it is swapped in, so readers
/// never see a half-built zone.
#[derive(Debug, Default)]
pub struct ZoneCache {
    slot: RwLock<Slot>,
}

impl ZoneCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `zone` the active zone under `zone_id`, replacing any other,
    /// including an older build of the same zone.
    pub fn install(&self, zone_id: impl Into<String>, zone: ZoneNav) -> ZoneHandle {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        let handle = ZoneHandle {
            generation: slot.generation,
            zone_id: zone_id.into(),
            zone: Arc::new(zone),
        };
        tracing::info!(
            "Installed zone {} as generation {}",
            handle.zone_id,
            handle.generation
        );
        slot.active = Some(handle.clone());
        handle
    }

    /// Return the active handle if it is for `zone_id`, otherwise build the
    /// zone with `build` and install it.
    ///
    /// `build` runs without holding the cache lock.
    pub fn get_or_install(
        &self,
        zone_id: &str,
        build: impl FnOnce() -> Result<ZoneNav>,
    ) -> Result<ZoneHandle> {
        if let Ok(handle) = self.current_for(zone_id) {
            tracing::debug!("Zone {zone_id} is already active");
            return Ok(handle);
        }
        Ok(self.install(zone_id, build()?))
    }

    /// Drop the active zone, e.g. on zone exit.
    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        if let Some(handle) = slot.active.take() {
            tracing::info!(
                "Invalidated zone {}, now at generation {}",
                handle.zone_id,
                slot.generation
            );
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Handle to the active zone, whichever it is.
    pub fn current(&self) -> Result<ZoneHandle> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .clone()
            .ok_or(Error::NoZone)
    }

    /// Handle to the active zone if it was installed under `zone_id`.
    /// Fails with [`Error::NoZone`] when another zone, or none, is active.
    pub fn current_for(&self, zone_id: &str) -> Result<ZoneHandle> {
        self.current()
            .ok()
            .filter(|handle| handle.zone_id == zone_id)
            .ok_or(Error::NoZone)
    }

    /// Fail with [`Error::StaleZone`] if `handle` predates the active zone.
    pub fn validate(&self, handle: &ZoneHandle) -> Result<()> {
        let current = self.generation();
        if handle.generation == current {
            Ok(())
        } else {
            Err(Error::StaleZone {
                held: handle.generation,
                current,
            })
        }
    }

    /// Search the zone behind `handle`, if it is still active.
    pub fn find_safe_point(
        &self,
        handle: &ZoneHandle,
        request: &SearchRequest,
        extra_dynamic: &[CollisionObject],
    ) -> Result<SearchOutcome> {
        self.validate(handle)?;
        Ok(handle.zone.find_safe_point(request, extra_dynamic))
    }
}

#[cfg(test)]
mod tests {
    use collision_decode::encode;

    use super::*;
    use crate::test_support::{blocked_world, floor};

    #[test]
    fn test_from_bytes_matches_build() {
        let world = blocked_world();
        let mut bytes = encode(&world);
        bytes.extend_from_slice(b"junk");
        let zone = ZoneNav::from_bytes(&bytes, NavConfig::default()).unwrap();
        assert_eq!(zone.world(), &world);
        assert_eq!(zone.index().len(), 2);
    }

    #[test]
    fn test_from_bytes_rejects_bad_input() {
        assert!(matches!(
            ZoneNav::from_bytes(b"nope", NavConfig::default()),
            Err(Error::Parse(_))
        ));
        let config = NavConfig {
            cell_size: 0.0,
            ..NavConfig::default()
        };
        assert!(matches!(
            ZoneNav::from_bytes(&encode(&blocked_world()), config),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_extra_obstacles_are_numbered_after_world() {
        let zone = ZoneNav::build(blocked_world(), NavConfig::default());
        let entity = CollisionObject::entity(DVec3::new(5.0, 5.0, 0.0), 0.5, 2.0);
        let polygons = zone.dynamic_polygons(&[entity]);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].source_object_id, 2);
        assert!(polygons[0].dynamic);
    }

    #[test]
    fn test_extra_obstacles_change_the_answer() {
        let zone = ZoneNav::build(blocked_world(), NavConfig::default());
        let request = zone.request(DVec3::new(5.0, 0.0, 0.0), DVec3::ZERO);
        let plain = zone.find_safe_point(&request, &[]).unwrap();
        assert!(plain.position.distance(DVec3::new(1.5, 0.0, 0.0)) < 1e-12);

        let entity = CollisionObject::entity(DVec3::new(1.5, 0.0, 0.0), 0.3, 2.0);
        let moved = zone.find_safe_point(&request, &[entity]).unwrap();
        assert_ne!(moved.position, plain.position);
        assert!(moved.candidates_tested > plain.candidates_tested);
    }

    #[test]
    fn test_world_dynamic_objects_are_not_indexed() {
        let mut objects = blocked_world().objects().to_vec();
        objects.push(CollisionObject::entity(DVec3::new(8.0, 8.0, 0.0), 0.5, 2.0));
        objects.push(floor(10.0, 50.0));
        let zone = ZoneNav::build(CollisionWorld::new(objects), NavConfig::default());
        assert_eq!(zone.index().len(), 3);
        assert_eq!(zone.dynamic_polygons(&[]).len(), 1);
        assert_eq!(zone.all_polygons().len(), 4);
    }

    #[test]
    fn test_cache_generations() {
        let cache = ZoneCache::new();
        assert!(matches!(cache.current(), Err(Error::NoZone)));
        assert_eq!(cache.generation(), 0);

        let first = cache.install("town", ZoneNav::build(blocked_world(), NavConfig::default()));
        assert_eq!(first.generation(), 1);
        assert_eq!(first.zone_id(), "town");
        assert!(cache.validate(&first).is_ok());
        assert_eq!(cache.current().unwrap().generation(), 1);

        let second = cache.install("town", ZoneNav::build(blocked_world(), NavConfig::default()));
        assert_eq!(second.generation(), 2);
        let request = second.zone().request(DVec3::ZERO, DVec3::new(10.0, 10.0, 0.0));
        assert!(matches!(
            cache.find_safe_point(&first, &request, &[]),
            Err(Error::StaleZone {
                held: 1,
                current: 2
            })
        ));
        assert!(cache.find_safe_point(&second, &request, &[]).unwrap().is_ok());

        cache.invalidate();
        assert!(matches!(cache.current(), Err(Error::NoZone)));
        assert!(matches!(
            cache.validate(&second),
            Err(Error::StaleZone { .. })
        ));
        // The stale handle still reads its own zone.
        assert_eq!(second.zone().world().len(), 2);
    }

    #[test]
    fn test_cache_is_keyed_by_zone_id() {
        let cache = ZoneCache::new();
        let build =
            || -> Result<ZoneNav> { Ok(ZoneNav::build(blocked_world(), NavConfig::default())) };
        assert!(matches!(cache.current_for("town"), Err(Error::NoZone)));

        let town = cache.get_or_install("town", build).unwrap();
        assert_eq!(town.generation(), 1);
        assert_eq!(cache.current_for("town").unwrap().generation(), 1);
        assert!(matches!(cache.current_for("sewers"), Err(Error::NoZone)));

        // Re-entering the same zone reuses the build.
        let again = cache
            .get_or_install("town", || panic!("zone was rebuilt"))
            .unwrap();
        assert_eq!(again.generation(), 1);
        assert!(Arc::ptr_eq(again.zone(), town.zone()));

        // Switching zones replaces it and retires the old handle.
        let sewers = cache.get_or_install("sewers", build).unwrap();
        assert_eq!(sewers.generation(), 2);
        assert_eq!(sewers.zone_id(), "sewers");
        assert!(matches!(cache.current_for("town"), Err(Error::NoZone)));
        assert!(matches!(
            cache.validate(&town),
            Err(Error::StaleZone {
                held: 1,
                current: 2
            })
        ));
        assert_eq!(cache.current().unwrap().zone_id(), "sewers");
    }

    #[test]
    fn test_failed_build_keeps_active_zone() {
        let cache = ZoneCache::new();
        let town = cache.install("town", ZoneNav::build(blocked_world(), NavConfig::default()));
        let result = cache.get_or_install("sewers", || {
            ZoneNav::from_bytes(b"nope", NavConfig::default())
        });
        assert!(matches!(result, Err(Error::Parse(_))));
        assert!(cache.validate(&town).is_ok());
        assert_eq!(cache.current().unwrap().zone_id(), "town");
    }
}
