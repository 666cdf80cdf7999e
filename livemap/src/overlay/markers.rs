//! Point markers overlay.
//!
//! Expects point features; a feature-level `color` property overrides the
//! default marker color.

use geojson::FeatureCollection;
use serde_json::json;

use super::reconcile::{ensure_geojson_source, ensure_layer};
use super::{OverlayContext, OverlayDef};
use crate::surface::{LayerKind, LayerSpec, MapSurface, SurfaceError};

/// Source feeding the marker layer.
pub const MARKERS_SOURCE_ID: &str = "markers-source";

/// The marker circles.
pub const MARKERS_LAYER_ID: &str = "markers-layer";

/// The markers overlay family.
pub static MARKERS_OVERLAY: OverlayDef = OverlayDef {
    id: "markers",
    source_id: MARKERS_SOURCE_ID,
    layer_ids: &[MARKERS_LAYER_ID],
    apply: apply_markers,
};

fn apply_markers(
    surface: &mut dyn MapSurface,
    data: &FeatureCollection,
    context: &OverlayContext,
) -> Result<(), SurfaceError> {
    ensure_geojson_source(surface, MARKERS_SOURCE_ID, data)?;

    let markers = LayerSpec::new(MARKERS_LAYER_ID, LayerKind::Circle, MARKERS_SOURCE_ID)
        .with_paint(json!({
            "circle-radius": 6,
            "circle-color": ["coalesce", ["get", "color"], "#1f4fdd"],
            "circle-stroke-color": "#ffffff",
            "circle-stroke-width": 1.5,
        }));
    ensure_layer(surface, &markers, context.before_id)
}
