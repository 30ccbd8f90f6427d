//! Async entry points.
//!
//! Parsing, indexing and searching are CPU-bound, so these run them on
//! tokio's blocking pool and await the result.

use std::sync::Arc;

use collision_decode::CollisionObject;

use crate::error::Result;
use crate::search::{SearchOutcome, SearchRequest, SearchTrace};
use crate::{NavConfig, ZoneCache, ZoneHandle, ZoneNav};

/// Decode and index a zone off the async runtime.
pub async fn load_zone(bytes: Vec<u8>, config: NavConfig) -> Result<ZoneNav> {
    tokio::task::spawn_blocking(move || ZoneNav::from_bytes(&bytes, config)).await?
}

/// Decode a zone and make it the active zone of `cache` under `zone_id`.
pub async fn load_into(
    cache: Arc<ZoneCache>,
    zone_id: String,
    bytes: Vec<u8>,
    config: NavConfig,
) -> Result<ZoneHandle> {
    let zone = load_zone(bytes, config).await?;
    Ok(cache.install(zone_id, zone))
}

/// Handle zone-entry detection: reuse the active zone when it is already
/// `zone_id`, otherwise decode `bytes` and install the result.
pub async fn enter_zone(
    cache: Arc<ZoneCache>,
    zone_id: String,
    bytes: Vec<u8>,
    config: NavConfig,
) -> Result<ZoneHandle> {
    tokio::task::spawn_blocking(move || {
        cache.get_or_install(&zone_id, || ZoneNav::from_bytes(&bytes, config))
    })
    .await?
}

/// Search `zone` off the async runtime.
pub async fn find_safe_point(
    zone: Arc<ZoneNav>,
    request: SearchRequest,
    extra_dynamic: Vec<CollisionObject>,
) -> Result<SearchOutcome> {
    let outcome =
        tokio::task::spawn_blocking(move || zone.find_safe_point(&request, &extra_dynamic))
            .await?;
    Ok(outcome)
}

pub async fn find_safe_point_traced(
    zone: Arc<ZoneNav>,
    request: SearchRequest,
    extra_dynamic: Vec<CollisionObject>,
) -> Result<(SearchOutcome, SearchTrace)> {
    let result = tokio::task::spawn_blocking(move || {
        zone.find_safe_point_traced(&request, &extra_dynamic)
    })
    .await?;
    Ok(result)
}

/// Search through a cache handle, rejecting it if a newer zone has been
/// installed by the time the search starts.
pub async fn find_safe_point_cached(
    cache: Arc<ZoneCache>,
    handle: ZoneHandle,
    request: SearchRequest,
    extra_dynamic: Vec<CollisionObject>,
) -> Result<SearchOutcome> {
    tokio::task::spawn_blocking(move || cache.find_safe_point(&handle, &request, &extra_dynamic))
        .await?
}
