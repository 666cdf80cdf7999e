//! Rendering surface abstraction
//!
//! The engine never talks to a concrete renderer. It drives a [`MapSurface`]:
//! the minimal capability a style-based map renderer offers for mutating
//! sources and layers, swapping styles, and moving the camera.
//!
//! # Design
//!
//! - Mutations are synchronous calls returning `Result`; the only
//!   asynchronous edge is the style swap, whose completion the host reports
//!   back as [`SurfaceEvent::StyleLoaded`].
//! - [`MapSurface::style_snapshot`] exposes the live style's structure
//!   (ordered sources and layers) so placement heuristics stay pure functions
//!   over data instead of renderer queries.
//! - The surface never calls back into the engine. Host-side renderer events
//!   are pumped in as [`SurfaceEvent`] values, which keeps the control flow
//!   single-threaded and replayable.
//!
//! [`HeadlessSurface`] is the bundled implementation: an in-memory style
//! model that enforces the same structural rules a real renderer does and
//! records every call for inspection.

mod headless;
mod types;

pub use headless::{CameraState, HeadlessSurface, StyleContents, SurfaceOp};
pub use types::{
    CameraUpdate, LayerEntry, LayerKind, LayerSpec, SourceDataKind, SourceEntry, SourceKind,
    StyleSnapshot, SurfaceError, SurfaceEvent,
};

use geojson::FeatureCollection;

/// Capability contract between the engine and a map renderer.
///
/// Implementations must reject structurally invalid calls (duplicate ids,
/// unknown ids, mutations while no style is live) with [`SurfaceError`]
/// rather than panicking, and must preserve source registration order and
/// layer draw order in [`style_snapshot`](MapSurface::style_snapshot).
pub trait MapSurface {
    /// Registers a new GeoJSON source carrying `data`.
    ///
    /// Fails with [`SurfaceError::DuplicateSource`] if the id is taken.
    fn add_geojson_source(
        &mut self,
        id: &str,
        data: &FeatureCollection,
    ) -> Result<(), SurfaceError>;

    /// Replaces the data of an existing GeoJSON source in place.
    ///
    /// Fails with [`SurfaceError::UnknownSource`] if the id is not
    /// registered, or [`SurfaceError::NotGeoJson`] if it is not a GeoJSON
    /// source.
    fn set_geojson_data(&mut self, id: &str, data: &FeatureCollection)
        -> Result<(), SurfaceError>;

    /// Returns whether a source with this id is registered.
    fn has_source(&self, id: &str) -> bool;

    /// Removes a source.
    ///
    /// Fails with [`SurfaceError::SourceInUse`] while any layer still draws
    /// from it; layers must be removed first.
    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError>;

    /// Adds a layer, positioned before `before_id` when given, appended on
    /// top otherwise.
    ///
    /// Fails with [`SurfaceError::DuplicateLayer`], with
    /// [`SurfaceError::UnknownLayer`] if `before_id` does not exist, or with
    /// [`SurfaceError::MissingLayerSource`] if the layer draws from an
    /// unregistered source.
    fn add_layer(&mut self, spec: &LayerSpec, before_id: Option<&str>) -> Result<(), SurfaceError>;

    /// Returns whether a layer with this id is present.
    fn has_layer(&self, id: &str) -> bool;

    /// Moves an existing layer before `before_id`, or to the top when `None`.
    fn move_layer(&mut self, id: &str, before_id: Option<&str>) -> Result<(), SurfaceError>;

    /// Removes a layer.
    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError>;

    /// Requests a switch to a new style.
    ///
    /// The swap is asynchronous: the current style's sources and layers are
    /// discarded immediately, and the new style's contents become visible
    /// only once the host reports [`SurfaceEvent::StyleLoaded`].
    fn set_style(&mut self, style_ref: &str);

    /// Returns the structure of the live style.
    ///
    /// Empty while no style is live (before the first load completes, or
    /// mid-swap).
    fn style_snapshot(&self) -> StyleSnapshot;

    /// Sets the camera pitch immediately.
    fn set_pitch(&mut self, pitch: f64);

    /// Moves the camera instantly.
    fn jump_to(&mut self, camera: &CameraUpdate);

    /// Moves the camera with an animated transition.
    fn ease_to(&mut self, camera: &CameraUpdate);
}
