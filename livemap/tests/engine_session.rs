//! Integration tests for a complete map engine session.
//!
//! These tests drive the public API end to end over a `HeadlessSurface`:
//! - init → style load → overlays → location → follow → basemap switch
//! - re-application of session state after every style swap
//! - follow-mode camera gating across a realistic fix timeline
//! - terminal destroy behavior and session metrics
//!
//! Run with: `cargo test --test engine_session`

use std::time::Duration;

use geojson::{Feature, FeatureCollection, Geometry, Value};

use livemap::basemap::BasemapCatalog;
use livemap::engine::{enhance, EngineConfig, EngineEvent, Lifecycle, MapEngine};
use livemap::geo::{destination_point, haversine_distance_m};
use livemap::location::{FollowConfig, FOLLOW_RECENTER_DISTANCE_M};
use livemap::overlay::{areas, markers, user_location};
use livemap::surface::{
    HeadlessSurface, LayerKind, MapSurface, SourceKind, StyleContents, SurfaceEvent, SurfaceOp,
};
use livemap::{LngLat, LocationFix, OverlayKey, OverlayPatch};

// ============================================================================
// Helper Functions
// ============================================================================

const OSM_3D_STYLE: &str = "/styles/osm-3d.json";
const OSM_STREETS_STYLE: &str = "/styles/osm-streets.json";
const SATELLITE_STYLE: &str = "/styles/satellite-hybrid.json";

/// Piazza Garibaldi, Parma: the default camera center.
const PARMA: LngLat = LngLat::new(10.3278, 44.8062);

/// A vector baseline in OpenMapTiles shape: one vector source, fills and
/// lines beneath a symbol label layer.
fn vector_contents() -> StyleContents {
    StyleContents::new()
        .with_source("openmaptiles", SourceKind::Vector)
        .with_layer("background", LayerKind::Background, None)
        .with_layer("water", LayerKind::Fill, Some("openmaptiles"))
        .with_layer("roads", LayerKind::Line, Some("openmaptiles"))
        .with_layer("label-roads", LayerKind::Symbol, Some("openmaptiles"))
}

/// A raster baseline: imagery only, no vector source, no labels.
fn raster_contents() -> StyleContents {
    StyleContents::new()
        .with_source("imagery", SourceKind::Raster)
        .with_layer("imagery", LayerKind::Raster, Some("imagery"))
}

/// A surface with every builtin style this suite switches between.
fn session_surface() -> HeadlessSurface {
    HeadlessSurface::new()
        .with_style(OSM_3D_STYLE, vector_contents())
        .with_style(OSM_STREETS_STYLE, vector_contents())
        .with_style(SATELLITE_STYLE, raster_contents())
}

/// Completes the pending style load and reports it, as a host would.
fn complete_load(engine: &mut MapEngine<HeadlessSurface>) {
    engine
        .surface_mut()
        .expect("surface must be bound")
        .complete_style_load()
        .expect("requested style must be registered");
    engine.handle_event(SurfaceEvent::StyleLoaded);
}

/// An engine over the builtin catalog with the osm-3d style live.
fn ready_engine() -> MapEngine<HeadlessSurface> {
    let mut engine = MapEngine::new(BasemapCatalog::builtin());
    engine.init(session_surface(), OSM_3D_STYLE, Some("osm-3d"));
    complete_load(&mut engine);
    engine
}

fn feature(geometry: Value, properties: serde_json::Value) -> Feature {
    let properties = match properties {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties,
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// One highlighted area: a rough quadrilateral over the Parco Ducale.
fn parco_ducale_areas() -> FeatureCollection {
    collection(vec![feature(
        Value::Polygon(vec![vec![
            vec![10.3185, 44.8065],
            vec![10.3250, 44.8065],
            vec![10.3250, 44.8105],
            vec![10.3185, 44.8105],
            vec![10.3185, 44.8065],
        ]]),
        serde_json::json!({ "name": "Parco Ducale" }),
    )])
}

/// Two point markers in central Parma.
fn parma_markers() -> FeatureCollection {
    collection(vec![
        feature(
            Value::Point(vec![10.3278, 44.8062]),
            serde_json::json!({ "name": "Piazza Garibaldi" }),
        ),
        feature(
            Value::Point(vec![10.3312, 44.8107]),
            serde_json::json!({ "name": "Stazione", "color": "#d62828" }),
        ),
    ])
}

/// The `role` property of every feature in a collection, in order.
fn feature_roles(data: &FeatureCollection) -> Vec<String> {
    data.features
        .iter()
        .map(|f| {
            f.properties
                .as_ref()
                .and_then(|p| p.get("role"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        })
        .collect()
}

/// A fix displaced `meters` from `from` along `bearing_deg`.
fn displaced_fix(from: LngLat, meters: f64, bearing_deg: f64) -> LocationFix {
    LocationFix::new(destination_point(from, meters, bearing_deg)).with_accuracy(15.0)
}

fn ease_ops(surface: &HeadlessSurface) -> Vec<&SurfaceOp> {
    surface
        .ops()
        .iter()
        .filter(|op| matches!(op, SurfaceOp::EaseTo { .. }))
        .collect()
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Drives one full session the way an application would.
///
/// 1. Construct over the builtin catalog and init with osm-3d
/// 2. Complete the first style load and verify enhancements
/// 3. Submit overlays, a location fix, follow mode
/// 4. Switch basemap and verify everything survives on the new style
/// 5. Destroy and verify the engine went inert
#[test]
fn test_full_session_flow() {
    let mut engine = MapEngine::new(BasemapCatalog::builtin());

    // 1. Bind the surface; camera lands on the configured center
    engine.init(session_surface(), OSM_3D_STYLE, Some("osm-3d"));
    assert_eq!(engine.lifecycle(), Lifecycle::Initializing);
    let surface = engine.surface().expect("surface bound");
    assert_eq!(surface.camera().center, PARMA);
    assert_eq!(surface.pending_style_ref(), Some(OSM_3D_STYLE));

    // 2. First load: ready, enhancement layers injected, preferred pitch
    complete_load(&mut engine);
    assert_eq!(engine.lifecycle(), Lifecycle::Ready);
    assert_eq!(engine.poll_events(), vec![EngineEvent::Ready]);
    let surface = engine.surface().expect("surface bound");
    assert!(surface.has_layer(enhance::BUILDINGS_LAYER_ID));
    assert!(surface.has_layer(enhance::HOUSENUMBERS_LAYER_ID));
    assert_eq!(surface.camera().pitch, 55.0, "osm-3d prefers 55 degrees");

    // 3a. Overlays land beneath the first symbol layer
    engine.set_overlays(
        OverlayPatch::new()
            .set(OverlayKey::Areas, parco_ducale_areas())
            .set(OverlayKey::Markers, parma_markers()),
    );
    let surface = engine.surface().expect("surface bound");
    let first_symbol = surface
        .layer_index(enhance::HOUSENUMBERS_LAYER_ID)
        .expect("housenumbers injected");
    assert!(surface.layer_index(areas::AREAS_FILL_LAYER_ID).unwrap() < first_symbol);
    assert!(surface.layer_index(markers::MARKERS_LAYER_ID).unwrap() < first_symbol);
    assert_eq!(
        surface
            .geojson_data(markers::MARKERS_SOURCE_ID)
            .unwrap()
            .features
            .len(),
        2
    );

    // 3b. A full fix renders ring, ray and dot from one source
    engine.set_user_location(Some(
        LocationFix::new(PARMA).with_accuracy(18.0).with_heading(45.0),
    ));
    let surface = engine.surface().expect("surface bound");
    let data = surface
        .geojson_data(user_location::USER_LOCATION_SOURCE_ID)
        .expect("location overlay applied");
    assert_eq!(feature_roles(data), vec!["accuracy", "heading", "position"]);

    // 3c. Enabling follow jumps to the fix at the basemap's pitch
    engine.set_follow_mode(true);
    assert_eq!(
        engine.poll_events(),
        vec![EngineEvent::FollowModeChanged { enabled: true }]
    );
    let surface = engine.surface().expect("surface bound");
    assert_eq!(surface.camera().center, PARMA);
    assert_eq!(surface.camera().pitch, 55.0);

    // 4. Basemap switch: the new style gets the same session state back
    engine.set_basemap("osm-streets");
    assert_eq!(engine.lifecycle(), Lifecycle::StyleLoading);
    complete_load(&mut engine);

    let surface = engine.surface().expect("surface bound");
    assert_eq!(surface.live_style_ref(), Some(OSM_STREETS_STYLE));
    assert!(surface.has_source(areas::AREAS_SOURCE_ID), "Areas survive");
    assert!(surface.has_source(markers::MARKERS_SOURCE_ID), "Markers survive");
    assert!(
        surface.has_source(user_location::USER_LOCATION_SOURCE_ID),
        "Location overlay survives"
    );
    assert_eq!(surface.camera().pitch, 0.0, "osm-streets prefers a flat view");
    assert_eq!(engine.metrics().style_switches, 1);
    assert!(
        !engine.poll_events().contains(&EngineEvent::Ready),
        "Ready is emitted once per session"
    );

    // 5. Destroy: terminal and inert
    engine.destroy();
    assert_eq!(engine.lifecycle(), Lifecycle::Destroyed);
    assert!(engine.surface().is_none());
    engine.set_basemap("osm-3d");
    engine.handle_event(SurfaceEvent::StyleLoaded);
    assert_eq!(engine.lifecycle(), Lifecycle::Destroyed);
    assert!(engine.poll_events().is_empty());
}

/// Switching to a raster basemap keeps overlays but skips the enhancement
/// layers, and switching back restores them.
#[test]
fn test_raster_round_trip_keeps_overlays() {
    let mut engine = ready_engine();
    engine.set_overlays(OverlayPatch::new().set(OverlayKey::Markers, parma_markers()));
    engine.set_user_location(Some(LocationFix::new(PARMA).with_accuracy(20.0)));

    engine.set_basemap("satellite-hybrid");
    complete_load(&mut engine);

    let surface = engine.surface().expect("surface bound");
    assert!(surface.has_source(markers::MARKERS_SOURCE_ID));
    assert!(surface.has_source(user_location::USER_LOCATION_SOURCE_ID));
    assert!(
        !surface.has_layer(enhance::BUILDINGS_LAYER_ID),
        "Raster styles get no enhancement layers"
    );
    // No symbol layers in the raster style: overlays append on top
    assert!(surface.has_layer(markers::MARKERS_LAYER_ID));

    engine.set_basemap("osm-3d");
    complete_load(&mut engine);

    let surface = engine.surface().expect("surface bound");
    assert!(surface.has_layer(enhance::BUILDINGS_LAYER_ID), "3D is back");
    assert!(surface.has_source(markers::MARKERS_SOURCE_ID));
    assert_eq!(engine.metrics().style_switches, 2);
}

/// A realistic fix timeline against the recenter gate.
///
/// The pause window is set to zero so the test exercises the displacement
/// rule deterministically; the interval rule is covered by the unit tests
/// with explicit clocks.
#[test]
fn test_follow_timeline_gates_recenters() {
    let follow = FollowConfig::default().with_recenter_interval(Duration::ZERO);
    let mut engine = MapEngine::with_config(
        BasemapCatalog::builtin(),
        EngineConfig::default().with_follow(follow),
    );
    engine.init(session_surface(), OSM_3D_STYLE, Some("osm-3d"));
    complete_load(&mut engine);

    // Fix arrives before follow: overlay only, no camera movement
    engine.set_user_location(Some(LocationFix::new(PARMA).with_accuracy(15.0)));
    assert!(ease_ops(engine.surface().unwrap()).is_empty());

    // Enabling follow performs the immediate jump
    engine.set_follow_mode(true);
    engine.surface_mut().unwrap().clear_ops();

    // A 5 m drift is beneath the displacement floor
    let drift = displaced_fix(PARMA, 5.0, 90.0);
    engine.set_user_location(Some(drift));
    assert!(
        ease_ops(engine.surface().unwrap()).is_empty(),
        "Small drift must not move the camera"
    );

    // A 30 m move from the previous fix recenters with the eased animation
    let walk = displaced_fix(drift.coordinates, 30.0, 90.0);
    engine.set_user_location(Some(walk));
    let surface = engine.surface().unwrap();
    let eases = ease_ops(surface);
    assert_eq!(eases.len(), 1, "Exactly one recenter for the 30 m move");
    match eases[0] {
        SurfaceOp::EaseTo { camera } => {
            assert_eq!(camera.center, Some(walk.coordinates));
            assert_eq!(camera.duration, Some(Duration::from_millis(600)));
        }
        other => panic!("expected an ease, got {other:?}"),
    }

    // Dragging hands the camera back to the user
    engine.handle_event(SurfaceEvent::DragStart);
    assert!(!engine.follow_mode());
    engine.surface_mut().unwrap().clear_ops();

    let far = displaced_fix(walk.coordinates, 100.0, 90.0);
    engine.set_user_location(Some(far));
    assert!(
        ease_ops(engine.surface().unwrap()).is_empty(),
        "With follow off fixes must not move the camera"
    );
}

/// A fix rejected by the displacement rule still becomes the reference for
/// the next comparison: displacement is measured between consecutive fixes,
/// so slow drift keeps resetting the baseline instead of accumulating
/// against the spot the camera last recentered on.
#[test]
fn test_gated_fix_advances_displacement_reference() {
    let follow = FollowConfig::default().with_recenter_interval(Duration::ZERO);
    let mut engine = MapEngine::with_config(
        BasemapCatalog::builtin(),
        EngineConfig::default().with_follow(follow),
    );
    engine.init(session_surface(), OSM_3D_STYLE, Some("osm-3d"));
    complete_load(&mut engine);

    engine.set_user_location(Some(LocationFix::new(PARMA).with_accuracy(15.0)));
    engine.set_follow_mode(true);
    engine.surface_mut().unwrap().clear_ops();

    // 5 m east: below the 12 m floor, no recenter, but recorded
    let creep = displaced_fix(PARMA, 5.0, 90.0);
    engine.set_user_location(Some(creep));
    assert!(ease_ops(engine.surface().unwrap()).is_empty());

    // Another 10 m east: past the floor relative to the recentered spot,
    // under it relative to the recorded fix
    let next = displaced_fix(creep.coordinates, 10.0, 90.0);
    assert!(haversine_distance_m(PARMA, next.coordinates) > FOLLOW_RECENTER_DISTANCE_M);
    assert!(
        haversine_distance_m(creep.coordinates, next.coordinates) < FOLLOW_RECENTER_DISTANCE_M
    );
    engine.set_user_location(Some(next));
    assert!(
        ease_ops(engine.surface().unwrap()).is_empty(),
        "Displacement must be measured from the latest fix, not the last recenter"
    );

    // A real 20 m step from the latest fix does recenter
    let step = displaced_fix(next.coordinates, 20.0, 90.0);
    engine.set_user_location(Some(step));
    let eases = ease_ops(engine.surface().unwrap());
    assert_eq!(eases.len(), 1, "A step past the floor recenters once");
}

/// Re-fired style loads and repeated patches converge to a single instance
/// of every source and layer.
#[test]
fn test_duplicate_application_converges() {
    let mut engine = ready_engine();
    engine.set_overlays(OverlayPatch::new().set(OverlayKey::Areas, parco_ducale_areas()));
    engine.set_overlays(OverlayPatch::new().set(OverlayKey::Areas, parco_ducale_areas()));
    engine.set_user_location(Some(LocationFix::new(PARMA).with_accuracy(10.0)));

    // Some renderers re-fire the load notification for the live style
    engine.handle_event(SurfaceEvent::StyleLoaded);
    engine.handle_event(SurfaceEvent::StyleLoaded);

    let surface = engine.surface().expect("surface bound");
    let layer_ids = surface.layer_ids();
    for id in [
        areas::AREAS_FILL_LAYER_ID,
        areas::AREAS_OUTLINE_LAYER_ID,
        areas::AREAS_LABEL_LAYER_ID,
        user_location::USER_LOCATION_DOT_LAYER_ID,
        enhance::BUILDINGS_LAYER_ID,
    ] {
        let count = layer_ids.iter().filter(|have| **have == id).count();
        assert_eq!(count, 1, "layer {id} must exist exactly once");
    }
    assert_eq!(
        surface
            .source_ids()
            .iter()
            .filter(|id| **id == areas::AREAS_SOURCE_ID)
            .count(),
        1
    );
}

/// The event queue preserves the order things happened in.
#[test]
fn test_event_stream_is_fifo() {
    let mut engine = ready_engine();
    // Ready from the initial load is still queued

    engine.handle_event(SurfaceEvent::Zoom { zoom: 15.2 });
    engine.set_follow_mode(true);
    engine.report_location_error("GPS signal lost");
    engine.handle_event(SurfaceEvent::DragStart);

    assert_eq!(
        engine.poll_events(),
        vec![
            EngineEvent::Ready,
            EngineEvent::ZoomChanged { zoom: 15.2 },
            EngineEvent::FollowModeChanged { enabled: true },
            EngineEvent::LocationError {
                message: "GPS signal lost".to_string()
            },
            EngineEvent::FollowModeChanged { enabled: false },
        ]
    );
    assert!(engine.poll_events().is_empty());
}

/// Session counters: accepted switches and tile notifications only.
#[test]
fn test_metrics_track_switches_and_tiles() {
    let mut engine = ready_engine();

    engine.set_basemap("osm-streets");
    complete_load(&mut engine);
    engine.set_basemap("osm-streets"); // already active: not counted
    engine.set_basemap("missing-basemap"); // unknown: not counted
    engine.set_basemap("satellite-hybrid");
    complete_load(&mut engine);

    engine.handle_event(SurfaceEvent::SourceData {
        kind: livemap::surface::SourceDataKind::Tile,
    });
    engine.handle_event(SurfaceEvent::SourceData {
        kind: livemap::surface::SourceDataKind::Metadata,
    });
    engine.handle_event(SurfaceEvent::SourceData {
        kind: livemap::surface::SourceDataKind::Tile,
    });

    let metrics = engine.metrics();
    assert_eq!(metrics.style_switches, 2);
    assert_eq!(metrics.tile_loads, 2);
}
