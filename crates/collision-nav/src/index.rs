//! Uniform-grid index over projected polygons.
//!
//! Polygons are bucketed by the grid cells their bounds touch. A polygon
//! touching too many cells is kept on an always-checked list instead, and
//! a query touching too many cells falls back to a linear scan, so memory
//! and query time stay bounded however large the geometry is.

use std::collections::HashMap;

use glam::DVec2;

use crate::ProjectedPolygon;

/// Polygons whose bounds cover more cells than this skip the grid.
pub const MAX_CELLS_PER_POLYGON: i64 = 1024;

/// Queries covering more cells than this scan every polygon.
pub const MAX_QUERY_CELLS: i64 = 4096;

type Cell = (i64, i64);

/// Inclusive range of cells covered by a rectangle, or `None` when its
/// coordinates are not finite.
#[derive(Debug, Clone, Copy)]
struct CellRange {
    min: Cell,
    max: Cell,
}

impl CellRange {
    #[allow(clippy::cast_possible_truncation)]
    fn covering(min: DVec2, max: DVec2, cell_size: f64) -> Option<Self> {
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }
        let lo = (min / cell_size).floor();
        let hi = (max / cell_size).floor();
        // Float-to-int casts saturate, which only ever widens the range.
        Some(Self {
            min: (lo.x as i64, lo.y as i64),
            max: (hi.x as i64, hi.y as i64),
        })
    }

    fn count(&self) -> i64 {
        let w = self.max.0.saturating_sub(self.min.0).saturating_add(1);
        let h = self.max.1.saturating_sub(self.min.1).saturating_add(1);
        w.saturating_mul(h)
    }

    fn cells(self) -> impl Iterator<Item = Cell> {
        (self.min.0..=self.max.0).flat_map(move |x| (self.min.1..=self.max.1).map(move |y| (x, y)))
    }
}

/// Static polygons of one zone, queryable by proximity.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    polygons: Vec<ProjectedPolygon>,
    cell_size: f64,
    cells: HashMap<Cell, Vec<usize>>,
    oversized: Vec<usize>,
}

impl SpatialIndex {
    /// Index `polygons`, keeping their order as the result order.
    ///
    /// A non-positive or non-finite `cell_size` puts every polygon on the
    /// oversized list.
    #[must_use]
    pub fn build(polygons: Vec<ProjectedPolygon>, cell_size: f64) -> Self {
        let mut cells: HashMap<Cell, Vec<usize>> = HashMap::new();
        let mut oversized = Vec::new();
        let usable = cell_size.is_finite() && cell_size > 0.0;

        for (i, polygon) in polygons.iter().enumerate() {
            let bounds = polygon.bounds();
            let range = usable
                .then(|| CellRange::covering(bounds.min, bounds.max, cell_size))
                .flatten()
                .filter(|range| range.count() <= MAX_CELLS_PER_POLYGON);
            match range {
                Some(range) => {
                    for cell in range.cells() {
                        cells.entry(cell).or_default().push(i);
                    }
                }
                None => oversized.push(i),
            }
        }

        tracing::debug!(
            polygons = polygons.len(),
            cells = cells.len(),
            oversized = oversized.len(),
            cell_size,
            "Built spatial index"
        );

        Self {
            polygons,
            cell_size,
            cells,
            oversized,
        }
    }

    /// Every polygon whose bounds come within `radius` of `point`, in index
    /// order.
    ///
    /// May return polygons that do not actually reach the disc, but never
    /// leaves one out. A non-finite query returns everything.
    #[must_use]
    pub fn query(&self, point: DVec2, radius: f64) -> Vec<&ProjectedPolygon> {
        if !(point.is_finite() && radius.is_finite()) {
            return self.polygons.iter().collect();
        }
        let radius = radius.max(0.0);

        let range = (self.cell_size.is_finite() && self.cell_size > 0.0)
            .then(|| CellRange::covering(point - radius, point + radius, self.cell_size))
            .flatten()
            .filter(|range| range.count() <= MAX_QUERY_CELLS);

        let Some(range) = range else {
            return self
                .polygons
                .iter()
                .filter(|p| p.bounds().distance_to(point) <= radius)
                .collect();
        };

        let mut hits: Vec<usize> = self.oversized.clone();
        for cell in range.cells() {
            if let Some(bucket) = self.cells.get(&cell) {
                hits.extend_from_slice(bucket);
            }
        }
        hits.sort_unstable();
        hits.dedup();

        hits.into_iter()
            .map(|i| &self.polygons[i])
            .filter(|p| p.bounds().distance_to(point) <= radius)
            .collect()
    }

    #[must_use]
    pub fn polygons(&self) -> &[ProjectedPolygon] {
        &self.polygons
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Number of polygons checked on every query.
    #[must_use]
    pub fn oversized_len(&self) -> usize {
        self.oversized.len()
    }
}
