//! Safe-point search around a requested destination.
//!
//! The search first checks the target itself, then walks concentric rings
//! outwards. A candidate is safe when a disc of the agent's radius clears
//! every blocking polygon at the target's height and the candidate stands
//! on walkable ground.

use std::f64::consts::TAU;
use std::fmt;

use glam::{DVec2, DVec3};
use serde::Serialize;

use crate::{NavConfig, ProjectedPolygon, SpatialIndex};

/// A request to relocate `target` to somewhere the agent fits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchRequest {
    /// Where the agent is now. Only sets the bearing of the first sample on
    /// each ring.
    pub start: DVec3,
    pub target: DVec3,
    pub agent_radius: f64,
    pub height_tolerance: f64,
}

impl SearchRequest {
    /// A request using the agent radius and height tolerance of `config`.
    #[must_use]
    pub fn new(start: DVec3, target: DVec3, config: &NavConfig) -> Self {
        Self {
            start,
            target,
            agent_radius: config.agent_radius,
            height_tolerance: config.height_tolerance,
        }
    }

    fn is_valid(&self) -> bool {
        self.start.is_finite()
            && self.target.is_finite()
            && self.agent_radius.is_finite()
            && self.agent_radius >= 0.0
            && self.height_tolerance.is_finite()
            && self.height_tolerance >= 0.0
    }
}

/// A position the agent can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SafePoint {
    /// Always at the target's height.
    pub position: DVec3,
    /// Ring the point was found on, or `None` when the target was already
    /// safe and is returned unchanged.
    pub ring: Option<usize>,
    pub candidates_tested: usize,
}

impl SafePoint {
    /// Whether the point differs from the requested target.
    #[must_use]
    pub fn relocated(&self) -> bool {
        self.ring.is_some()
    }
}

/// Why no safe point was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Non-finite coordinates or a negative radius or tolerance.
    InvalidRequest,
    /// Every ring up to the search radius was tried.
    NoCandidate,
    /// The candidate budget ran out first.
    CandidateBudget,
}

/// The expected "nowhere to go" outcome of a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchFailure {
    pub reason: FailureReason,
    pub candidates_tested: usize,
    /// Radius of the last ring tried.
    pub searched_radius: f64,
}

impl fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            FailureReason::InvalidRequest => write!(f, "invalid search request"),
            FailureReason::NoCandidate => write!(
                f,
                "no safe point within {} after {} candidates",
                self.searched_radius, self.candidates_tested
            ),
            FailureReason::CandidateBudget => write!(
                f,
                "candidate budget of {} exhausted at radius {}",
                self.candidates_tested, self.searched_radius
            ),
        }
    }
}

pub type SearchOutcome = Result<SafePoint, SearchFailure>;

/// What happened to one tested position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum Verdict {
    Accepted,
    /// Overlaps the footprint of the given object.
    Blocked { by: usize },
    /// Clear, but not standing on walkable ground.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TracedCandidate {
    pub position: DVec2,
    /// Zero for the target itself.
    pub ring: usize,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Every candidate a search looked at, in test order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchTrace {
    pub candidates: Vec<TracedCandidate>,
}

impl SearchTrace {
    fn record(&mut self, position: DVec2, ring: usize, verdict: Verdict) {
        self.candidates.push(TracedCandidate {
            position,
            ring,
            verdict,
        });
    }
}

/// Polygons relevant at the target's height, split by role.
#[derive(Default)]
struct Scene<'a> {
    blocking: Vec<&'a ProjectedPolygon>,
    walkable: Vec<&'a ProjectedPolygon>,
    height: f64,
    tolerance: f64,
}

impl<'a> Scene<'a> {
    /// The part of this scene whose bounds come within `reach` of `center`.
    fn near(&self, center: DVec2, reach: f64) -> Scene<'a> {
        let close = |p: &&&'a ProjectedPolygon| p.bounds().distance_to(center) <= reach;
        Scene {
            blocking: self.blocking.iter().filter(close).copied().collect(),
            walkable: self.walkable.iter().filter(close).copied().collect(),
            height: self.height,
            tolerance: self.tolerance,
        }
    }

    fn blocker(&self, point: DVec2, radius: f64) -> Option<&'a ProjectedPolygon> {
        self.blocking
            .iter()
            .copied()
            .find(|p| p.overlaps_disc(point, radius))
    }

    fn judge(&self, point: DVec2, radius: f64) -> Verdict {
        if let Some(polygon) = self.blocker(point, radius) {
            Verdict::Blocked {
                by: polygon.source_object_id,
            }
        } else if self
            .walkable
            .iter()
            .any(|p| p.supports(point, self.height, self.tolerance))
        {
            Verdict::Accepted
        } else {
            Verdict::Unsupported
        }
    }
}

/// Safe-point search over one zone's static index plus the current dynamic
/// polygons.
#[derive(Debug, Clone, Copy)]
pub struct SafePointSearch<'a> {
    index: &'a SpatialIndex,
    dynamic: &'a [ProjectedPolygon],
    config: &'a NavConfig,
}

impl<'a> SafePointSearch<'a> {
    #[must_use]
    pub fn new(
        index: &'a SpatialIndex,
        dynamic: &'a [ProjectedPolygon],
        config: &'a NavConfig,
    ) -> Self {
        Self {
            index,
            dynamic,
            config,
        }
    }

    /// Find the nearest position to `request.target` the agent can occupy.
    ///
    /// Identical inputs always give identical results.
    pub fn find_safe_point(&self, request: &SearchRequest) -> SearchOutcome {
        self.run(request, None)
    }

    /// As [`find_safe_point`](Self::find_safe_point), also recording every
    /// tested candidate.
    pub fn find_safe_point_traced(
        &self,
        request: &SearchRequest,
    ) -> (SearchOutcome, SearchTrace) {
        let mut trace = SearchTrace::default();
        let outcome = self.run(request, Some(&mut trace));
        (outcome, trace)
    }

    fn scene(&self, center: DVec2, reach: f64, request: &SearchRequest) -> Scene<'a> {
        let nearby_dynamic = self
            .dynamic
            .iter()
            .filter(|p| p.bounds().distance_to(center) <= reach);

        let mut scene = Scene {
            height: request.target.z,
            tolerance: request.height_tolerance,
            ..Scene::default()
        };
        for polygon in self.index.query(center, reach).into_iter().chain(nearby_dynamic) {
            if !polygon.band_contains(request.target.z, request.height_tolerance) {
                continue;
            }
            if !polygon.flags.intersects(self.config.non_blocking) {
                scene.blocking.push(polygon);
            }
            if polygon.flags.intersects(self.config.walkable) {
                scene.walkable.push(polygon);
            }
        }
        scene
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn run(&self, request: &SearchRequest, mut trace: Option<&mut SearchTrace>) -> SearchOutcome {
        if !request.is_valid() {
            return Err(SearchFailure {
                reason: FailureReason::InvalidRequest,
                candidates_tested: 0,
                searched_radius: 0.0,
            });
        }

        let config = self.config;
        let radius = request.agent_radius;
        let target = request.target.truncate();

        // The target itself only has to be clear.
        let immediate = self.scene(target, radius + config.search_margin, request);
        let blocker = immediate.blocker(target, radius);
        if let Some(trace) = trace.as_deref_mut() {
            let verdict = blocker.map_or(Verdict::Accepted, |p| Verdict::Blocked {
                by: p.source_object_id,
            });
            trace.record(target, 0, verdict);
        }
        if blocker.is_none() {
            return Ok(SafePoint {
                position: request.target,
                ring: None,
                candidates_tested: 1,
            });
        }

        let toward_start = (request.start - request.target).truncate();
        let bearing = if toward_start.length_squared() > 0.0 {
            toward_start.y.atan2(toward_start.x)
        } else {
            0.0
        };

        let ring_count = (config.max_search_radius / config.ring_spacing + 1e-9).floor() as usize;
        let area = self.scene(
            target,
            config.max_search_radius + radius + config.search_margin,
            request,
        );

        let mut tested = 1;
        let mut searched_radius = 0.0;
        for ring in 1..=ring_count {
            let ring_radius = ring as f64 * config.ring_spacing;
            searched_radius = ring_radius;
            let local = area.near(target, ring_radius + radius + config.ring_spacing);
            let samples = ((TAU * ring_radius / config.ring_spacing).ceil() as usize)
                .clamp(config.min_ring_samples, config.max_ring_samples);

            for sample in 0..samples {
                if tested >= config.max_candidates {
                    return Err(SearchFailure {
                        reason: FailureReason::CandidateBudget,
                        candidates_tested: tested,
                        searched_radius,
                    });
                }
                tested += 1;

                let angle = bearing + TAU * sample as f64 / samples as f64;
                let candidate = target + DVec2::new(angle.cos(), angle.sin()) * ring_radius;
                let verdict = local.judge(candidate, radius);
                if let Some(trace) = trace.as_deref_mut() {
                    trace.record(candidate, ring, verdict);
                }
                if verdict == Verdict::Accepted {
                    return Ok(SafePoint {
                        position: candidate.extend(request.target.z),
                        ring: Some(ring),
                        candidates_tested: tested,
                    });
                }
            }
        }

        Err(SearchFailure {
            reason: FailureReason::NoCandidate,
            candidates_tested: tested,
            searched_radius,
        })
    }
}
