//! User location overlay: accuracy ring, heading ray and position dot.
//!
//! All three layers draw from one source filtered by the `role` property the
//! geometry builder writes (see
//! [`location::geometry`](crate::location::geometry)), so replacing the
//! source data on each fix updates every layer at once.

use geojson::FeatureCollection;
use serde_json::json;

use super::reconcile::{ensure_geojson_source, ensure_layer};
use super::{OverlayContext, OverlayDef};
use crate::location::geometry::{FeatureRole, ROLE_PROPERTY};
use crate::surface::{LayerKind, LayerSpec, MapSurface, SurfaceError};

/// Source carrying the location feature collection.
pub const USER_LOCATION_SOURCE_ID: &str = "user-location-source";

/// Accuracy circle fill.
pub const USER_LOCATION_ACCURACY_LAYER_ID: &str = "user-location-accuracy";

/// Travel heading ray.
pub const USER_LOCATION_HEADING_LAYER_ID: &str = "user-location-heading";

/// Position dot.
pub const USER_LOCATION_DOT_LAYER_ID: &str = "user-location-dot";

/// The user location overlay.
///
/// Not part of the keyed registry: its data comes from location fixes via
/// the geometry builder, not from overlay patches.
pub static USER_LOCATION_OVERLAY: OverlayDef = OverlayDef {
    id: "user-location",
    source_id: USER_LOCATION_SOURCE_ID,
    layer_ids: &[
        USER_LOCATION_ACCURACY_LAYER_ID,
        USER_LOCATION_HEADING_LAYER_ID,
        USER_LOCATION_DOT_LAYER_ID,
    ],
    apply: apply_user_location,
};

fn role_filter(role: FeatureRole) -> serde_json::Value {
    json!(["==", ["get", ROLE_PROPERTY], role.as_str()])
}

fn apply_user_location(
    surface: &mut dyn MapSurface,
    data: &FeatureCollection,
    context: &OverlayContext,
) -> Result<(), SurfaceError> {
    ensure_geojson_source(surface, USER_LOCATION_SOURCE_ID, data)?;

    let accuracy = LayerSpec::new(
        USER_LOCATION_ACCURACY_LAYER_ID,
        LayerKind::Fill,
        USER_LOCATION_SOURCE_ID,
    )
    .with_filter(role_filter(FeatureRole::Accuracy))
    .with_paint(json!({
        "fill-color": "rgba(49, 130, 255, 0.18)",
        "fill-outline-color": "rgba(49, 130, 255, 0.4)",
    }));
    ensure_layer(surface, &accuracy, context.before_id)?;

    let heading = LayerSpec::new(
        USER_LOCATION_HEADING_LAYER_ID,
        LayerKind::Line,
        USER_LOCATION_SOURCE_ID,
    )
    .with_filter(role_filter(FeatureRole::Heading))
    .with_paint(json!({
        "line-color": "rgba(49, 130, 255, 0.75)",
        "line-width": 2.5,
        "line-opacity": 0.9,
    }));
    ensure_layer(surface, &heading, context.before_id)?;

    let dot = LayerSpec::new(
        USER_LOCATION_DOT_LAYER_ID,
        LayerKind::Circle,
        USER_LOCATION_SOURCE_ID,
    )
    .with_filter(role_filter(FeatureRole::Position))
    .with_paint(json!({
        "circle-radius": 6,
        "circle-color": "#1f65ff",
        "circle-stroke-color": "#ffffff",
        "circle-stroke-width": 2,
    }));
    ensure_layer(surface, &dot, context.before_id)
}
