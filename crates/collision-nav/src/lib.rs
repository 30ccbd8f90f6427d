//! Ground-plane navigation over decoded zone collision.
//!
//! A zone's [`CollisionWorld`](collision_decode::CollisionWorld) is
//! sampled into world space, flattened to convex footprints with a vertical
//! band each, and indexed on a uniform grid. [`SafePointSearch`] then
//! answers "where near this target can an agent of this radius stand?".
//!
//! # Layers
//!
//! - [`sample`]: primitive-to-world sampling
//! - [`project_world`]: footprint projection
//! - [`SpatialIndex`]: proximity queries
//! - [`SafePointSearch`]: the ring search itself
//! - [`ZoneNav`] / [`ZoneCache`]: per-zone state and generation checks
//! - [`dispatch`]: async wrappers running work on the blocking pool
//! - [`export`]: WKT and JSON output
//!
//! Everything below [`dispatch`] is synchronous and single-threaded.

mod config;
pub mod dispatch;
mod error;
pub mod export;
pub mod geometry;
mod index;
mod project;
pub mod sample;
mod search;
mod zone;

pub use config::{MeshProjection, NavConfig};
pub use error::{Error, Result};
pub use index::SpatialIndex;
pub use project::{
    ProjectedPolygon, ProjectedWorld, project, project_object, project_objects, project_world,
};
pub use search::{
    FailureReason, SafePoint, SafePointSearch, SearchFailure, SearchOutcome, SearchRequest,
    SearchTrace, TracedCandidate, Verdict,
};
pub use zone::{ZoneCache, ZoneHandle, ZoneNav};
