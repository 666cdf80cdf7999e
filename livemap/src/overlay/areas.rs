//! Highlighted areas overlay: translucent fills, outlines and name labels.
//!
//! Expects polygon features; labels read the `name` property.

use geojson::FeatureCollection;
use serde_json::json;

use super::reconcile::{ensure_geojson_source, ensure_layer};
use super::{OverlayContext, OverlayDef};
use crate::surface::{LayerKind, LayerSpec, MapSurface, SurfaceError};

/// Source feeding every areas layer.
pub const AREAS_SOURCE_ID: &str = "areas-source";

/// Translucent polygon body.
pub const AREAS_FILL_LAYER_ID: &str = "areas-fill";

/// Polygon outline stroke.
pub const AREAS_OUTLINE_LAYER_ID: &str = "areas-outline";

/// Name label anchored at the polygon.
pub const AREAS_LABEL_LAYER_ID: &str = "areas-label";

/// The areas overlay family.
pub static AREAS_OVERLAY: OverlayDef = OverlayDef {
    id: "areas",
    source_id: AREAS_SOURCE_ID,
    layer_ids: &[
        AREAS_FILL_LAYER_ID,
        AREAS_OUTLINE_LAYER_ID,
        AREAS_LABEL_LAYER_ID,
    ],
    apply: apply_areas,
};

fn apply_areas(
    surface: &mut dyn MapSurface,
    data: &FeatureCollection,
    context: &OverlayContext,
) -> Result<(), SurfaceError> {
    ensure_geojson_source(surface, AREAS_SOURCE_ID, data)?;

    let fill = LayerSpec::new(AREAS_FILL_LAYER_ID, LayerKind::Fill, AREAS_SOURCE_ID).with_paint(
        json!({
            "fill-color": "#2f6bff",
            "fill-opacity": 0.18,
            "fill-antialias": false,
        }),
    );
    ensure_layer(surface, &fill, context.before_id)?;

    let outline = LayerSpec::new(AREAS_OUTLINE_LAYER_ID, LayerKind::Line, AREAS_SOURCE_ID)
        .with_layout(json!({
            "line-cap": "round",
            "line-join": "round",
        }))
        .with_paint(json!({
            "line-color": "#1f4fdd",
            "line-width": 2.5,
        }));
    ensure_layer(surface, &outline, context.before_id)?;

    let label = LayerSpec::new(AREAS_LABEL_LAYER_ID, LayerKind::Symbol, AREAS_SOURCE_ID)
        .with_layout(json!({
            "text-field": ["get", "name"],
            "text-size": 14,
            "text-font": ["Noto Sans Regular", "Open Sans Regular"],
            "text-offset": [0, 0.6],
            "text-anchor": "top",
            "text-allow-overlap": false,
        }))
        .with_paint(json!({
            "text-color": "#1f4fdd",
            "text-halo-color": "#ffffff",
            "text-halo-width": 1,
        }));
    ensure_layer(surface, &label, context.before_id)
}
