//! Density heatmap overlay with close-zoom sample points.
//!
//! Expects point features weighted by an `intensity` property. The heatmap
//! fades out toward its max zoom while discrete sample circles fade in, so
//! zooming all the way in shows the underlying data points.

use geojson::FeatureCollection;
use serde_json::json;

use super::reconcile::{ensure_geojson_source, ensure_layer};
use super::{OverlayContext, OverlayDef};
use crate::surface::{LayerKind, LayerSpec, MapSurface, SurfaceError};

/// Source feeding both heat layers.
pub const HEAT_SOURCE_ID: &str = "heat-source";

/// The density surface.
pub const HEAT_LAYER_ID: &str = "heatmap-layer";

/// Discrete sample points, visible only close up.
pub const HEAT_POINTS_LAYER_ID: &str = "heatmap-points";

/// The heat overlay family.
pub static HEAT_OVERLAY: OverlayDef = OverlayDef {
    id: "heat",
    source_id: HEAT_SOURCE_ID,
    layer_ids: &[HEAT_LAYER_ID, HEAT_POINTS_LAYER_ID],
    apply: apply_heat,
};

fn apply_heat(
    surface: &mut dyn MapSurface,
    data: &FeatureCollection,
    context: &OverlayContext,
) -> Result<(), SurfaceError> {
    ensure_geojson_source(surface, HEAT_SOURCE_ID, data)?;

    let heatmap = LayerSpec::new(HEAT_LAYER_ID, LayerKind::Heatmap, HEAT_SOURCE_ID)
        .with_maxzoom(18.0)
        .with_paint(json!({
            "heatmap-weight": ["get", "intensity"],
            "heatmap-intensity": ["interpolate", ["linear"], ["zoom"], 12, 0.6, 18, 1.4],
            "heatmap-color": [
                "interpolate",
                ["linear"],
                ["heatmap-density"],
                0, "rgba(33, 102, 172, 0)",
                0.2, "rgba(103, 169, 207, 0.6)",
                0.4, "rgba(209, 229, 240, 0.7)",
                0.6, "rgba(253, 219, 199, 0.8)",
                0.8, "rgba(239, 138, 98, 0.9)",
                1, "rgba(178, 24, 43, 0.95)",
            ],
            "heatmap-radius": ["interpolate", ["linear"], ["zoom"], 12, 14, 18, 26],
            "heatmap-opacity": ["interpolate", ["linear"], ["zoom"], 14, 0.9, 18, 0.65],
        }));
    ensure_layer(surface, &heatmap, context.before_id)?;

    let points = LayerSpec::new(HEAT_POINTS_LAYER_ID, LayerKind::Circle, HEAT_SOURCE_ID)
        .with_minzoom(17.5)
        .with_paint(json!({
            "circle-radius": ["interpolate", ["linear"], ["zoom"], 17.5, 4, 19, 8],
            "circle-color": "rgba(240, 110, 60, 0.9)",
            "circle-stroke-color": "#ffffff",
            "circle-stroke-width": 1,
        }));
    ensure_layer(surface, &points, context.before_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::tests::{point_collection, vector_surface};
    use crate::surface::SurfaceOp;

    #[test]
    fn test_apply_builds_surface_and_points() {
        let mut surface = vector_surface();
        let data = point_collection(10.33, 44.81, serde_json::json!({ "intensity": 0.8 }));
        let context = OverlayContext {
            before_id: Some("label-roads"),
        };

        (HEAT_OVERLAY.apply)(&mut surface, &data, &context).unwrap();

        assert!(surface.has_layer(HEAT_LAYER_ID));
        assert!(surface.has_layer(HEAT_POINTS_LAYER_ID));
        assert_eq!(
            surface.geojson_data(HEAT_SOURCE_ID).unwrap().features.len(),
            1
        );
    }

    #[test]
    fn test_zoom_windows_partition_the_layers() {
        let mut surface = vector_surface();
        let context = OverlayContext::default();
        let data = point_collection(10.33, 44.81, serde_json::json!({ "intensity": 1.0 }));

        (HEAT_OVERLAY.apply)(&mut surface, &data, &context).unwrap();

        let spec_of = |id: &str| {
            surface
                .ops()
                .iter()
                .find_map(|op| match op {
                    SurfaceOp::AddLayer { spec, .. } if spec.id == id => Some(spec.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("{id} not added"))
        };

        assert_eq!(spec_of(HEAT_LAYER_ID).maxzoom, Some(18.0));
        assert_eq!(spec_of(HEAT_POINTS_LAYER_ID).minzoom, Some(17.5));
    }
}
