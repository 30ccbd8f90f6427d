//! Writing projected polygons for inspection.
//!
//! Two formats are supported: one WKT `POLYGON` per line, and a JSON
//! document holding the polygons and, optionally, a search and its trace.
//! The decoded world itself can also be dumped as JSON, before projection.

use std::fmt::{self, Write as _};
use std::io::{self, Write};

use collision_decode::{CollisionObject, CollisionWorld};
use serde::Serialize;

use crate::ProjectedPolygon;
use crate::search::{SearchOutcome, SearchRequest, SearchTrace};

/// Result type for exports.
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Failure to write an export. Never affects navigation state.
#[derive(Debug)]
pub enum ExportError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "export I/O error: {e}"),
            ExportError::Json(e) => write!(f, "export JSON error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(e) => Some(e),
            ExportError::Json(e) => Some(e),
        }
    }
}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Json(e)
    }
}

/// WKT for one polygon, with the ring closed on its first vertex.
#[must_use]
pub fn polygon_wkt(polygon: &ProjectedPolygon) -> String {
    let ring = polygon.footprint();
    let mut wkt = String::from("POLYGON ((");
    for (i, p) in ring.iter().chain(ring.first()).enumerate() {
        if i > 0 {
            wkt.push_str(", ");
        }
        // Writing to a String cannot fail.
        let _ = write!(wkt, "{} {}", p.x, p.y);
    }
    wkt.push_str("))");
    wkt
}

/// Write one WKT polygon per line.
pub fn write_wkt<'a, W: Write>(
    mut writer: W,
    polygons: impl IntoIterator<Item = &'a ProjectedPolygon>,
) -> ExportResult<usize> {
    let mut written = 0;
    for polygon in polygons {
        writeln!(writer, "{}", polygon_wkt(polygon))?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// A search to include in a JSON export.
#[derive(Debug, Serialize)]
pub struct SearchReport<'a> {
    pub request: &'a SearchRequest,
    pub outcome: &'a SearchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<&'a SearchTrace>,
}

/// JSON export document.
#[derive(Debug, Serialize)]
pub struct CollisionMap<'a> {
    pub polygons: &'a [ProjectedPolygon],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchReport<'a>>,
}

impl<'a> CollisionMap<'a> {
    #[must_use]
    pub fn new(polygons: &'a [ProjectedPolygon]) -> Self {
        Self {
            polygons,
            search: None,
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: SearchReport<'a>) -> Self {
        self.search = Some(search);
        self
    }
}

/// Write `map` as pretty-printed JSON.
pub fn write_json<W: Write>(writer: W, map: &CollisionMap<'_>) -> ExportResult<()> {
    write_pretty(writer, map)
}

/// One decoded object, with its id and a single category label.
#[derive(Debug, Serialize)]
pub struct ObjectEntry<'a> {
    pub id: usize,
    pub category: &'static str,
    #[serde(flatten)]
    pub object: &'a CollisionObject,
}

/// Every object of a decoded world: shape parameters, placement and flags.
#[derive(Debug, Serialize)]
pub struct WorldDump<'a> {
    pub object_count: usize,
    pub dynamic_count: usize,
    pub objects: Vec<ObjectEntry<'a>>,
}

impl<'a> WorldDump<'a> {
    #[must_use]
    pub fn new(world: &'a CollisionWorld) -> Self {
        Self {
            object_count: world.len(),
            dynamic_count: world.dynamic_count(),
            objects: world
                .iter()
                .map(|(id, object)| ObjectEntry {
                    id,
                    category: object.flags.primary_label(),
                    object,
                })
                .collect(),
        }
    }
}

/// Write the decoded `world` as pretty-printed JSON.
pub fn write_world_json<W: Write>(writer: W, world: &CollisionWorld) -> ExportResult<()> {
    write_pretty(writer, &WorldDump::new(world))
}

fn write_pretty<W: Write, T: Serialize>(mut writer: W, value: &T) -> ExportResult<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
