//! Command-line parameters for the probe.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use collision_nav::{MeshProjection, NavConfig};
use glam::DVec3;

/// Mesh flattening mode as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MeshProjectionArg {
    ConvexHull,
    Triangles,
}

impl From<MeshProjectionArg> for MeshProjection {
    fn from(arg: MeshProjectionArg) -> Self {
        match arg {
            MeshProjectionArg::ConvexHull => MeshProjection::ConvexHull,
            MeshProjectionArg::Triangles => MeshProjection::Triangles,
        }
    }
}

/// Parse an `x,y,z` triple of finite numbers.
pub fn parse_point(s: &str) -> Result<DVec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z, got '{s}'"));
    }

    let mut coords = [0.0; 3];
    for (coord, (part, axis)) in coords.iter_mut().zip(parts.iter().zip(["x", "y", "z"])) {
        *coord = part
            .parse::<f64>()
            .map_err(|e| format!("invalid {axis}: {e}"))?;
        if !coord.is_finite() {
            return Err(format!("{axis} must be finite, got {part}"));
        }
    }
    Ok(DVec3::from_array(coords))
}

/// Load a zone collision file and find a safe point near a target.
#[derive(Parser, Debug)]
#[command(about = "Probe a zone collision file for safe destinations")]
pub struct CliArgs {
    /// Zone collision file.
    pub file: PathBuf,

    /// Desired destination (format: x,y,z).
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub target: DVec3,

    /// Current position; orients the search. Defaults to the target.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub start: Option<DVec3>,

    #[arg(long)]
    pub agent_radius: Option<f64>,

    #[arg(long)]
    pub height_tolerance: Option<f64>,

    #[arg(long)]
    pub max_search_radius: Option<f64>,

    #[arg(long, value_enum)]
    pub mesh_projection: Option<MeshProjectionArg>,

    /// JSON file with navigation settings; flags override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the projected polygons as WKT, one per line.
    #[arg(long)]
    pub wkt: Option<PathBuf>,

    /// Write the polygons and search result as JSON.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Write every decoded object, before projection, as JSON.
    #[arg(long)]
    pub world_json: Option<PathBuf>,

    /// Record every tested candidate in the JSON output.
    #[arg(long)]
    pub trace: bool,
}

impl CliArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, mut config: NavConfig) -> collision_nav::Result<NavConfig> {
        if let Some(radius) = self.agent_radius {
            config.agent_radius = radius;
        }
        if let Some(tolerance) = self.height_tolerance {
            config.height_tolerance = tolerance;
        }
        if let Some(radius) = self.max_search_radius {
            config.max_search_radius = radius;
        }
        if let Some(mode) = self.mesh_projection {
            config.mesh_projection = mode.into();
        }
        config.validate()?;
        Ok(config)
    }

    /// Start position, falling back to the target.
    #[must_use]
    pub fn start(&self) -> DVec3 {
        self.start.unwrap_or(self.target)
    }
}
