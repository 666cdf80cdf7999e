//! Basemap enhancement injection.
//!
//! Vector basemaps ship more data than their stock styles render. When the
//! active catalog entry declares the capability, the engine injects two
//! layers into the freshly loaded style:
//!
//! - [`BUILDINGS_LAYER_ID`] — extruded 3D buildings from the `building`
//!   source layer, fading in above zoom 15
//! - [`HOUSENUMBERS_LAYER_ID`] — house-number labels from the `housenumber`
//!   source layer, visible above zoom 17
//!
//! Injection is conservative: a style that already renders the concern under
//! its own layer id is left alone, and a style without a recognizable vector
//! source gets no enhancement at all. Skipping is never an error; the
//! basemap simply renders unenhanced.
//!
//! # Heuristics
//!
//! Styles do not declare which source carries the map data or where labels
//! begin, so two documented heuristics decide:
//!
//! - [`find_primary_vector_source`] — the first vector source in
//!   registration order. Single-vector-source styles (the common case) make
//!   this exact; composite styles should disable the capability flags on
//!   their catalog entry instead.
//! - [`find_first_symbol_layer`] — the first symbol layer in draw order,
//!   used as the anchor so injected geometry renders beneath every label.
//!   Styles without symbol layers anchor nothing and additions land on top.

use serde_json::json;
use tracing::debug;

use crate::basemap::{BasemapDefinition, BasemapKind};
use crate::surface::{LayerKind, LayerSpec, MapSurface, SourceKind, StyleSnapshot, SurfaceError};

/// Id of the injected 3D buildings layer.
pub const BUILDINGS_LAYER_ID: &str = "livemap-buildings-3d";

/// Id of the injected house-number label layer.
pub const HOUSENUMBERS_LAYER_ID: &str = "livemap-housenumbers";

/// Layer id under which stock styles render their own 3D buildings.
const STYLE_BUILDINGS_LAYER_ID: &str = "building-3d";

/// Layer id under which stock styles render their own house numbers.
const STYLE_HOUSENUMBERS_LAYER_ID: &str = "housenumber";

/// First vector source in registration order, if any.
pub fn find_primary_vector_source(snapshot: &StyleSnapshot) -> Option<&str> {
    snapshot
        .sources
        .iter()
        .find(|source| source.kind == SourceKind::Vector)
        .map(|source| source.id.as_str())
}

/// First symbol layer in draw order, if any.
pub fn find_first_symbol_layer(snapshot: &StyleSnapshot) -> Option<&str> {
    snapshot
        .layers
        .iter()
        .find(|layer| layer.kind == LayerKind::Symbol)
        .map(|layer| layer.id.as_str())
}

/// Applies the basemap's preferred pitch and injects the enhancement layers
/// its capability flags call for.
pub fn apply_enhancements<S: MapSurface + ?Sized>(
    surface: &mut S,
    basemap: &BasemapDefinition,
) -> Result<(), SurfaceError> {
    if let Some(pitch) = basemap.preferred_pitch {
        surface.set_pitch(pitch);
    }

    if basemap.kind != BasemapKind::Vector {
        debug!(basemap = %basemap.id, "Raster basemap, no enhancement layers");
        return Ok(());
    }

    let snapshot = surface.style_snapshot();
    let Some(vector_source) = find_primary_vector_source(&snapshot).map(str::to_string) else {
        debug!(basemap = %basemap.id, "No vector source in style, skipping enhancements");
        return Ok(());
    };
    let before_id = find_first_symbol_layer(&snapshot).map(str::to_string);

    if basemap.supports_3d {
        ensure_buildings_3d(surface, &vector_source, before_id.as_deref())?;
    }
    if basemap.supports_house_numbers {
        ensure_house_numbers(surface, &vector_source, before_id.as_deref())?;
    }
    Ok(())
}

fn ensure_buildings_3d<S: MapSurface + ?Sized>(
    surface: &mut S,
    vector_source: &str,
    before_id: Option<&str>,
) -> Result<(), SurfaceError> {
    // The style rendering its own buildings wins over injection
    if surface.has_layer(STYLE_BUILDINGS_LAYER_ID) || surface.has_layer(BUILDINGS_LAYER_ID) {
        return Ok(());
    }

    let spec = LayerSpec::new(BUILDINGS_LAYER_ID, LayerKind::FillExtrusion, vector_source)
        .with_source_layer("building")
        .with_minzoom(15.0)
        .with_paint(json!({
            "fill-extrusion-color": "#c8c8c8",
            "fill-extrusion-height": ["coalesce", ["get", "render_height"], 6],
            "fill-extrusion-base": ["coalesce", ["get", "render_min_height"], 0],
            "fill-extrusion-opacity": [
                "interpolate", ["linear"], ["zoom"],
                14.5, 0,
                15.5, 0.4,
                16.8, 0.75,
                19, 0.75,
            ],
        }));
    surface.add_layer(&spec, before_id)
}

fn ensure_house_numbers<S: MapSurface + ?Sized>(
    surface: &mut S,
    vector_source: &str,
    before_id: Option<&str>,
) -> Result<(), SurfaceError> {
    if surface.has_layer(STYLE_HOUSENUMBERS_LAYER_ID) || surface.has_layer(HOUSENUMBERS_LAYER_ID) {
        return Ok(());
    }

    let spec = LayerSpec::new(HOUSENUMBERS_LAYER_ID, LayerKind::Symbol, vector_source)
        .with_source_layer("housenumber")
        .with_minzoom(17.0)
        .with_layout(json!({
            "text-field": ["get", "housenumber"],
            "text-size": ["interpolate", ["linear"], ["zoom"], 17, 11, 19, 14],
            "text-font": ["Noto Sans Regular", "Open Sans Regular"],
            "text-allow-overlap": false,
            "text-ignore-placement": false,
            "text-anchor": "center",
            "text-padding": 1,
        }))
        .with_paint(json!({
            "text-color": "#202020",
            "text-halo-color": "#ffffff",
            "text-halo-width": 1.2,
        }));
    surface.add_layer(&spec, before_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessSurface, LayerEntry, SourceEntry, StyleContents, SurfaceOp};

    fn vector_basemap() -> BasemapDefinition {
        BasemapDefinition::new(
            "test-vector",
            "Test Vector",
            "test://vector",
            BasemapKind::Vector,
            "© Test",
        )
        .with_3d()
        .with_house_numbers()
        .with_preferred_pitch(55.0)
    }

    fn vector_style() -> StyleContents {
        StyleContents::new()
            .with_source("openmaptiles", SourceKind::Vector)
            .with_layer("background", LayerKind::Background, None)
            .with_layer("water", LayerKind::Fill, Some("openmaptiles"))
            .with_layer("label-roads", LayerKind::Symbol, Some("openmaptiles"))
    }

    fn live(style: StyleContents) -> HeadlessSurface {
        let mut surface = HeadlessSurface::new().with_style("test://style", style);
        surface.set_style("test://style");
        surface.complete_style_load().unwrap();
        surface
    }

    #[test]
    fn test_find_primary_vector_source_takes_first_in_order() {
        let snapshot = StyleSnapshot {
            sources: vec![
                SourceEntry {
                    id: "hillshade".to_string(),
                    kind: SourceKind::Raster,
                },
                SourceEntry {
                    id: "basetiles".to_string(),
                    kind: SourceKind::Vector,
                },
                SourceEntry {
                    id: "pois".to_string(),
                    kind: SourceKind::Vector,
                },
            ],
            layers: vec![],
        };

        assert_eq!(find_primary_vector_source(&snapshot), Some("basetiles"));
    }

    #[test]
    fn test_find_first_symbol_layer_by_draw_order() {
        let snapshot = StyleSnapshot {
            sources: vec![],
            layers: vec![
                LayerEntry {
                    id: "water".to_string(),
                    kind: LayerKind::Fill,
                    source: Some("s".to_string()),
                },
                LayerEntry {
                    id: "place-labels".to_string(),
                    kind: LayerKind::Symbol,
                    source: Some("s".to_string()),
                },
                LayerEntry {
                    id: "poi-labels".to_string(),
                    kind: LayerKind::Symbol,
                    source: Some("s".to_string()),
                },
            ],
        };

        assert_eq!(find_first_symbol_layer(&snapshot), Some("place-labels"));
        assert_eq!(
            find_first_symbol_layer(&StyleSnapshot::default()),
            None,
            "No symbol layers means no anchor"
        );
    }

    #[test]
    fn test_vector_basemap_gets_both_layers_below_labels() {
        let mut surface = live(vector_style());

        apply_enhancements(&mut surface, &vector_basemap()).unwrap();

        let labels = surface.layer_index("label-roads").unwrap();
        assert!(surface.layer_index(BUILDINGS_LAYER_ID).unwrap() < labels);
        assert!(surface.layer_index(HOUSENUMBERS_LAYER_ID).unwrap() < labels);
        assert_eq!(surface.camera().pitch, 55.0, "Preferred pitch applied");

        let buildings = surface
            .ops()
            .iter()
            .find_map(|op| match op {
                SurfaceOp::AddLayer { spec, .. } if spec.id == BUILDINGS_LAYER_ID => {
                    Some(spec.clone())
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(buildings.source, "openmaptiles");
        assert_eq!(buildings.source_layer.as_deref(), Some("building"));
        assert_eq!(buildings.minzoom, Some(15.0));
    }

    #[test]
    fn test_raster_basemap_gets_pitch_but_no_layers() {
        let raster_style = StyleContents::new()
            .with_source("imagery", SourceKind::Raster)
            .with_layer("imagery", LayerKind::Raster, Some("imagery"));
        let mut surface = live(raster_style);

        let basemap = BasemapDefinition::new(
            "sat",
            "Satellite",
            "test://style",
            BasemapKind::Raster,
            "© Sat",
        )
        .with_preferred_pitch(0.0);
        apply_enhancements(&mut surface, &basemap).unwrap();

        assert!(!surface.has_layer(BUILDINGS_LAYER_ID));
        assert!(!surface.has_layer(HOUSENUMBERS_LAYER_ID));
        assert!(surface
            .ops()
            .iter()
            .any(|op| matches!(op, SurfaceOp::SetPitch { pitch } if *pitch == 0.0)));
    }

    #[test]
    fn test_no_pitch_when_basemap_declares_none() {
        let mut surface = live(vector_style());
        let mut basemap = vector_basemap();
        basemap.preferred_pitch = None;

        apply_enhancements(&mut surface, &basemap).unwrap();

        assert!(
            !surface
                .ops()
                .iter()
                .any(|op| matches!(op, SurfaceOp::SetPitch { .. })),
            "Without a declared preference the pitch is left alone"
        );
    }

    #[test]
    fn test_style_with_own_buildings_not_doubled() {
        let style = vector_style().with_layer(
            STYLE_BUILDINGS_LAYER_ID,
            LayerKind::FillExtrusion,
            Some("openmaptiles"),
        );
        let mut surface = live(style);

        apply_enhancements(&mut surface, &vector_basemap()).unwrap();

        assert!(
            !surface.has_layer(BUILDINGS_LAYER_ID),
            "Style's own 3D buildings suppress injection"
        );
        assert!(
            surface.has_layer(HOUSENUMBERS_LAYER_ID),
            "The other enhancement still applies"
        );
    }

    #[test]
    fn test_reapplication_does_not_duplicate() {
        let mut surface = live(vector_style());

        apply_enhancements(&mut surface, &vector_basemap()).unwrap();
        apply_enhancements(&mut surface, &vector_basemap()).unwrap();

        let additions = surface
            .ops()
            .iter()
            .filter(|op| matches!(op, SurfaceOp::AddLayer { .. }))
            .count();
        assert_eq!(additions, 2, "One buildings layer and one labels layer");
    }

    #[test]
    fn test_vector_flags_without_vector_source_skip_silently() {
        // A mislabeled catalog entry: vector kind, but the style is raster
        let raster_only = StyleContents::new()
            .with_source("imagery", SourceKind::Raster)
            .with_layer("imagery", LayerKind::Raster, Some("imagery"));
        let mut surface = live(raster_only);

        apply_enhancements(&mut surface, &vector_basemap()).unwrap();

        assert!(!surface.has_layer(BUILDINGS_LAYER_ID));
        assert!(!surface.has_layer(HOUSENUMBERS_LAYER_ID));
    }

    #[test]
    fn test_style_without_symbols_appends_on_top() {
        let no_labels = StyleContents::new()
            .with_source("openmaptiles", SourceKind::Vector)
            .with_layer("water", LayerKind::Fill, Some("openmaptiles"));
        let mut surface = live(no_labels);

        apply_enhancements(&mut surface, &vector_basemap()).unwrap();

        let last = surface.layer_ids().len() - 1;
        assert_eq!(surface.layer_index(HOUSENUMBERS_LAYER_ID), Some(last));
    }
}
