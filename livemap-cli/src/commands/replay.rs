//! Replay command - drive a scripted engine session over a headless surface.
//!
//! A scenario is a JSON document naming the starting basemap and a list of
//! steps. Each step maps onto one engine entry point (style completion,
//! basemap switch, overlay patch, location update, follow toggle, surface
//! event, destroy). The command executes the steps in order, printing the
//! engine events each one produces, and closes with a session summary.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use geojson::FeatureCollection;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use livemap::basemap::{BasemapCatalog, BasemapKind, DEFAULT_BASEMAP_ID};
use livemap::engine::MapEngine;
use livemap::overlay::{OverlayKey, OverlayPatch};
use livemap::surface::{
    HeadlessSurface, LayerKind, SourceDataKind, SourceKind, StyleContents, SurfaceEvent,
};
use livemap::{LngLat, LocationFix};

use super::common::load_catalog;
use crate::error::CliError;

/// Scenario shipped with the binary, used when no file is given.
const BUNDLED_SCENARIO: &str = include_str!("../../scenarios/parma-tour.json");

/// Arguments for the replay command.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Scenario file to replay (defaults to the bundled Parma tour)
    pub scenario: Option<PathBuf>,

    /// Basemap catalog file to use instead of the builtin set
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Print every surface operation as it is recorded
    #[arg(long)]
    pub ops: bool,
}

/// A scripted engine session.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Display name, printed in the banner.
    pub name: String,
    /// Catalog id of the basemap the session starts on.
    #[serde(default)]
    pub initial_basemap: Option<String>,
    /// Steps executed in order.
    pub steps: Vec<ScenarioStep>,
}

/// One scripted action.
///
/// Steps are tagged by an `action` field in kebab-case, so a scenario reads
/// as `{ "action": "set-basemap", "id": "osm-streets" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ScenarioStep {
    /// The surface finished loading the pending style.
    StyleLoaded,
    /// Switch to a catalog basemap.
    SetBasemap {
        /// Catalog id to switch to.
        id: String,
    },
    /// Patch overlay families. A family that is absent stays untouched;
    /// an explicit `null` clears it.
    SetOverlays {
        #[serde(default, deserialize_with = "double_option")]
        areas: Option<Option<FeatureCollection>>,
        #[serde(default, deserialize_with = "double_option")]
        heat: Option<Option<FeatureCollection>>,
        #[serde(default, deserialize_with = "double_option")]
        markers: Option<Option<FeatureCollection>>,
    },
    /// Report a position fix.
    SetLocation {
        lng: f64,
        lat: f64,
        #[serde(default)]
        accuracy: Option<f64>,
        #[serde(default)]
        heading: Option<f64>,
    },
    /// Drop the position fix.
    ClearLocation,
    /// Toggle follow mode.
    SetFollow { enabled: bool },
    /// The user grabbed the map.
    DragStart,
    /// The zoom level changed.
    Zoom { level: f64 },
    /// A source tile finished loading.
    TileLoaded,
    /// The location provider reported a failure.
    LocationError { message: String },
    /// Tear the session down.
    Destroy,
}

impl fmt::Display for ScenarioStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioStep::StyleLoaded => write!(f, "style-loaded"),
            ScenarioStep::SetBasemap { id } => write!(f, "set-basemap {id}"),
            ScenarioStep::SetOverlays {
                areas,
                heat,
                markers,
            } => {
                write!(f, "set-overlays")?;
                for (name, entry) in [("areas", areas), ("heat", heat), ("markers", markers)] {
                    match entry {
                        None => {}
                        Some(None) => write!(f, " {name}=clear")?,
                        Some(Some(data)) => {
                            write!(f, " {name}={} feature(s)", data.features.len())?;
                        }
                    }
                }
                Ok(())
            }
            ScenarioStep::SetLocation { lng, lat, .. } => {
                write!(f, "set-location ({lng:.4}, {lat:.4})")
            }
            ScenarioStep::ClearLocation => write!(f, "clear-location"),
            ScenarioStep::SetFollow { enabled } => {
                write!(f, "set-follow {}", if *enabled { "on" } else { "off" })
            }
            ScenarioStep::DragStart => write!(f, "drag-start"),
            ScenarioStep::Zoom { level } => write!(f, "zoom {level}"),
            ScenarioStep::LocationError { message } => write!(f, "location-error \"{message}\""),
            ScenarioStep::TileLoaded => write!(f, "tile-loaded"),
            ScenarioStep::Destroy => write!(f, "destroy"),
        }
    }
}

/// Run the replay command.
pub fn run(args: ReplayArgs) -> Result<(), CliError> {
    let scenario = load_scenario(args.scenario.as_deref())?;
    let catalog = load_catalog(args.catalog.as_deref())?;
    let surface = surface_for_catalog(&catalog);

    let initial = scenario
        .initial_basemap
        .as_deref()
        .unwrap_or(DEFAULT_BASEMAP_ID);
    let style_ref = match catalog.get(initial) {
        Some(basemap) => basemap.style_ref.clone(),
        None => return Err(CliError::UnknownBasemap(initial.to_string())),
    };

    let title = format!("Replaying: {}", scenario.name);
    println!("{title}");
    println!("{}", "=".repeat(title.len()));
    println!("Initial basemap: {initial} ({style_ref})");

    let mut engine = MapEngine::new(catalog);
    engine.init(surface, &style_ref, Some(initial));
    report(&mut engine, args.ops);

    for (index, step) in scenario.steps.iter().enumerate() {
        println!();
        println!("[{:>2}] {step}", index + 1);
        apply_step(&mut engine, step)?;
        report(&mut engine, args.ops);
    }

    print_summary(&engine);
    Ok(())
}

/// Parse the scenario file, or the bundled one when no path is given.
fn load_scenario(path: Option<&Path>) -> Result<Scenario, CliError> {
    let raw = match path {
        Some(path) => fs::read_to_string(path)?,
        None => BUNDLED_SCENARIO.to_string(),
    };
    Ok(serde_json::from_str(&raw)?)
}

/// Build a headless surface with a synthetic style registered for every
/// catalog entry, so any `set-basemap` step can complete its load.
fn surface_for_catalog(catalog: &BasemapCatalog) -> HeadlessSurface {
    let mut surface = HeadlessSurface::new();
    for basemap in catalog.iter() {
        let contents = match basemap.kind {
            BasemapKind::Vector => vector_contents(),
            BasemapKind::Raster => raster_contents(),
        };
        surface.register_style(basemap.style_ref.as_str(), contents);
    }
    surface
}

/// Baseline contents of a vector style: an OpenMapTiles-style source plus a
/// handful of layers ending in a label layer.
fn vector_contents() -> StyleContents {
    StyleContents::new()
        .with_source("openmaptiles", SourceKind::Vector)
        .with_layer("background", LayerKind::Background, None)
        .with_layer("water", LayerKind::Fill, Some("openmaptiles"))
        .with_layer("roads", LayerKind::Line, Some("openmaptiles"))
        .with_layer("label-roads", LayerKind::Symbol, Some("openmaptiles"))
}

/// Baseline contents of a raster style: imagery only, no vector substrate.
fn raster_contents() -> StyleContents {
    StyleContents::new()
        .with_source("imagery", SourceKind::Raster)
        .with_layer("imagery", LayerKind::Raster, Some("imagery"))
}

/// Feed one step into the engine.
fn apply_step(
    engine: &mut MapEngine<HeadlessSurface>,
    step: &ScenarioStep,
) -> Result<(), CliError> {
    debug!(step = %step, "Applying scenario step");
    match step {
        ScenarioStep::StyleLoaded => {
            let surface = engine.surface_mut().ok_or(CliError::SessionClosed)?;
            surface.complete_style_load()?;
            engine.handle_event(SurfaceEvent::StyleLoaded);
        }
        ScenarioStep::SetBasemap { id } => engine.set_basemap(id),
        ScenarioStep::SetOverlays {
            areas,
            heat,
            markers,
        } => {
            let mut patch = OverlayPatch::new();
            let entries = [
                (OverlayKey::Areas, areas),
                (OverlayKey::Heat, heat),
                (OverlayKey::Markers, markers),
            ];
            for (key, entry) in entries {
                match entry {
                    None => {}
                    Some(None) => patch = patch.clear(key),
                    Some(Some(data)) => patch = patch.set(key, data.clone()),
                }
            }
            engine.set_overlays(patch);
        }
        ScenarioStep::SetLocation {
            lng,
            lat,
            accuracy,
            heading,
        } => {
            let mut fix = LocationFix::new(LngLat::new(*lng, *lat));
            if let Some(accuracy) = accuracy {
                fix = fix.with_accuracy(*accuracy);
            }
            if let Some(heading) = heading {
                fix = fix.with_heading(*heading);
            }
            engine.set_user_location(Some(fix));
        }
        ScenarioStep::ClearLocation => engine.set_user_location(None),
        ScenarioStep::SetFollow { enabled } => engine.set_follow_mode(*enabled),
        ScenarioStep::DragStart => engine.handle_event(SurfaceEvent::DragStart),
        ScenarioStep::Zoom { level } => engine.handle_event(SurfaceEvent::Zoom { zoom: *level }),
        ScenarioStep::TileLoaded => engine.handle_event(SurfaceEvent::SourceData {
            kind: SourceDataKind::Tile,
        }),
        ScenarioStep::LocationError { message } => engine.report_location_error(message.clone()),
        ScenarioStep::Destroy => engine.destroy(),
    }
    Ok(())
}

/// Print what the last step produced: recorded surface operations when
/// requested, then the queued engine events.
fn report(engine: &mut MapEngine<HeadlessSurface>, show_ops: bool) {
    if show_ops {
        if let Some(surface) = engine.surface_mut() {
            for op in surface.ops() {
                println!("     op: {op}");
            }
            surface.clear_ops();
        }
    }
    for event in engine.poll_events() {
        println!("  event: {event}");
    }
}

/// Closing summary of the session state.
fn print_summary(engine: &MapEngine<HeadlessSurface>) {
    println!();
    println!("Session summary");
    println!("===============");
    println!("Lifecycle:      {}", engine.lifecycle());
    println!(
        "Basemap:        {}",
        engine.active_basemap().unwrap_or("none")
    );
    println!(
        "Follow mode:    {}",
        if engine.follow_mode() { "on" } else { "off" }
    );
    let metrics = engine.metrics();
    println!("Style switches: {}", metrics.style_switches);
    println!("Tile loads:     {}", metrics.tile_loads);
    match engine.surface() {
        Some(surface) => {
            let camera = surface.camera();
            println!(
                "Camera:         center=({:.4}, {:.4}) zoom={:.1} pitch={:.0}",
                camera.center.lng, camera.center.lat, camera.zoom, camera.pitch
            );
            println!("Sources:        {}", surface.source_ids().join(", "));
            println!("Layers:         {}", surface.layer_ids().join(", "));
        }
        None => println!("Surface:        released"),
    }
}

/// Distinguishes an absent field from an explicit `null`: absent stays
/// `None` through `#[serde(default)]`, while any present value (including
/// `null`) lands in `Some`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
