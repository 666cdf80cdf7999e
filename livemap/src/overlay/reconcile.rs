//! Idempotent surface reconciliation helpers.
//!
//! Every overlay mutation goes through these functions. They bring the
//! surface to the desired state from whatever state it is in: applying the
//! same overlay twice converges to one source and one set of layers, and
//! tearing down something never applied is a no-op. That discipline is what
//! lets the engine blindly re-apply persisted state after each style load.

use geojson::FeatureCollection;

use crate::surface::{LayerSpec, MapSurface, SurfaceError};

/// Ensures a GeoJSON source with this id carries `data`.
///
/// Replaces the data in place when the source exists, creates the source
/// otherwise. Layers keep drawing from a replaced source without being
/// touched.
pub fn ensure_geojson_source<S: MapSurface + ?Sized>(
    surface: &mut S,
    id: &str,
    data: &FeatureCollection,
) -> Result<(), SurfaceError> {
    if surface.has_source(id) {
        surface.set_geojson_data(id, data)
    } else {
        surface.add_geojson_source(id, data)
    }
}

/// Ensures a layer matching `spec` exists, positioned before `before_id`.
///
/// The anchor is honored only when it names a different, existing layer;
/// otherwise the layer is appended to the top (a missing anchor is expected
/// on label-free styles, not an error). An existing layer is reordered to
/// the anchor rather than recreated, so repeated application converges.
pub fn ensure_layer<S: MapSurface + ?Sized>(
    surface: &mut S,
    spec: &LayerSpec,
    before_id: Option<&str>,
) -> Result<(), SurfaceError> {
    let anchor = before_id.filter(|id| *id != spec.id && surface.has_layer(id));

    if surface.has_layer(&spec.id) {
        if let Some(anchor) = anchor {
            surface.move_layer(&spec.id, Some(anchor))?;
        }
        return Ok(());
    }

    surface.add_layer(spec, anchor)
}

/// Removes a layer if it is present.
pub fn remove_layer_if_exists<S: MapSurface + ?Sized>(
    surface: &mut S,
    id: &str,
) -> Result<(), SurfaceError> {
    if surface.has_layer(id) {
        surface.remove_layer(id)?;
    }
    Ok(())
}

/// Removes a source if it is registered.
pub fn remove_source_if_exists<S: MapSurface + ?Sized>(
    surface: &mut S,
    id: &str,
) -> Result<(), SurfaceError> {
    if surface.has_source(id) {
        surface.remove_source(id)?;
    }
    Ok(())
}

/// Tears down an overlay family: every layer first, then the source.
///
/// The ordering is load-bearing. A source cannot be removed while layers
/// still draw from it, so layers always go first; each removal checks
/// existence so partial teardowns and repeated teardowns both converge.
pub fn remove_overlay<S: MapSurface + ?Sized>(
    surface: &mut S,
    layer_ids: &[&str],
    source_id: &str,
) -> Result<(), SurfaceError> {
    for layer_id in layer_ids {
        remove_layer_if_exists(surface, layer_id)?;
    }
    remove_source_if_exists(surface, source_id)
}
