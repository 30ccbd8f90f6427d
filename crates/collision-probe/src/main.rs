//! Command-line probe for zone collision files.
//!
//! Loads one collision file, searches for a safe point near `--target`,
//! prints it, and optionally exports the decoded world and the projected
//! polygons. Exits with status 2 when no safe point exists.

mod params;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use collision_decode::CollisionWorld;
use collision_nav::export::{self, CollisionMap, SearchReport};
use collision_nav::{
    NavConfig, ProjectedPolygon, SearchOutcome, SearchRequest, SearchTrace, dispatch,
};
use params::CliArgs;

#[tokio::main]
async fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(CliArgs::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether a safe point was found.
async fn run(args: CliArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let base = match &args.config {
        Some(path) => NavConfig::from_json(&tokio::fs::read_to_string(path).await?)?,
        None => NavConfig::default(),
    };
    let config = args.apply(base)?;

    let bytes = tokio::fs::read(&args.file).await?;
    tracing::info!("Read {} bytes from {}", bytes.len(), args.file.display());
    let zone = Arc::new(dispatch::load_zone(bytes, config).await?);
    log_categories(zone.world());

    let request = zone.request(args.start(), args.target);
    let (outcome, trace) = if args.trace {
        let (outcome, trace) =
            dispatch::find_safe_point_traced(Arc::clone(&zone), request, Vec::new()).await?;
        (outcome, Some(trace))
    } else {
        let outcome = dispatch::find_safe_point(Arc::clone(&zone), request, Vec::new()).await?;
        (outcome, None)
    };

    match &outcome {
        Ok(point) => {
            let p = point.position;
            println!("{} {} {}", p.x, p.y, p.z);
            match point.ring {
                Some(ring) => tracing::info!(
                    "Moved {:.3} from target (ring {ring}, {} candidates)",
                    p.distance(args.target),
                    point.candidates_tested
                ),
                None => tracing::info!("Target is already safe"),
            }
        }
        Err(failure) => tracing::warn!("{failure}"),
    }

    // Export failures are reported but do not change the result.
    if let Some(path) = &args.world_json {
        report_export(path, save_world_json(path, zone.world()));
    }
    let polygons = zone.all_polygons();
    if let Some(path) = &args.wkt {
        report_export(path, save_wkt(path, &polygons));
    }
    if let Some(path) = &args.json {
        report_export(
            path,
            save_json(path, &polygons, &request, &outcome, trace.as_ref()),
        );
    }

    Ok(outcome.is_ok())
}

fn log_categories(world: &CollisionWorld) {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for (_, object) in world.iter() {
        *counts.entry(object.flags.primary_label()).or_default() += 1;
    }
    tracing::info!(
        "Zone has {} objects ({} dynamic): {counts:?}",
        world.len(),
        world.dynamic_count()
    );
}

fn report_export(path: &Path, result: export::ExportResult<()>) {
    if let Err(e) = result {
        tracing::warn!("Failed to write {}: {e}", path.display());
    }
}

fn save_wkt(path: &Path, polygons: &[ProjectedPolygon]) -> export::ExportResult<()> {
    let written = export::write_wkt(BufWriter::new(File::create(path)?), polygons)?;
    tracing::info!("Wrote {written} polygons to {}", path.display());
    Ok(())
}

fn save_world_json(path: &Path, world: &CollisionWorld) -> export::ExportResult<()> {
    export::write_world_json(BufWriter::new(File::create(path)?), world)?;
    tracing::info!("Wrote {} decoded objects to {}", world.len(), path.display());
    Ok(())
}

fn save_json(
    path: &Path,
    polygons: &[ProjectedPolygon],
    request: &SearchRequest,
    outcome: &SearchOutcome,
    trace: Option<&SearchTrace>,
) -> export::ExportResult<()> {
    let map = CollisionMap::new(polygons).with_search(SearchReport {
        request,
        outcome,
        trace,
    });
    export::write_json(BufWriter::new(File::create(path)?), &map)?;
    tracing::info!("Wrote collision map to {}", path.display());
    Ok(())
}
