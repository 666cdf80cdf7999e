//! Value types shared by every rendering surface implementation.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geo::LngLat;

/// Errors raised by a rendering surface.
///
/// A surface rejects structurally invalid calls the way a real style engine
/// does: duplicate ids, references to ids that do not exist, and mutations
/// while no style is live. Callers that follow the check-then-act discipline
/// (`has_source` / `has_layer` before mutating) never see these.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// A source with this id is already registered.
    DuplicateSource(String),

    /// No source with this id is registered.
    UnknownSource(String),

    /// The source exists but does not carry GeoJSON data.
    NotGeoJson(String),

    /// A layer with this id is already present.
    DuplicateLayer(String),

    /// No layer with this id is present.
    UnknownLayer(String),

    /// A layer was added referencing a source that is not registered.
    MissingLayerSource {
        /// Id of the rejected layer.
        layer: String,
        /// Id of the missing source.
        source: String,
    },

    /// A source removal was rejected because a layer still draws from it.
    SourceInUse {
        /// Id of the source that could not be removed.
        source: String,
        /// Id of a layer still referencing it.
        layer: String,
    },

    /// A style mutation arrived while no style is live (e.g. mid-swap).
    NoStyle,

    /// `complete_style_load` was called with no swap in progress.
    NoPendingStyle,

    /// The pending style reference is not known to the surface.
    UnknownStyle(String),
}

// Display and Error are implemented by hand rather than derived with
// thiserror: the `source` fields here are style source ids, but thiserror
// unconditionally treats any field named `source` as the error's cause and
// requires it to implement `std::error::Error`, which `String` does not.
impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::DuplicateSource(id) => write!(f, "source '{id}' already exists"),
            SurfaceError::UnknownSource(id) => write!(f, "source '{id}' does not exist"),
            SurfaceError::NotGeoJson(id) => write!(f, "source '{id}' is not a GeoJSON source"),
            SurfaceError::DuplicateLayer(id) => write!(f, "layer '{id}' already exists"),
            SurfaceError::UnknownLayer(id) => write!(f, "layer '{id}' does not exist"),
            SurfaceError::MissingLayerSource { layer, source } => {
                write!(f, "layer '{layer}' references missing source '{source}'")
            }
            SurfaceError::SourceInUse { source, layer } => {
                write!(f, "source '{source}' is still in use by layer '{layer}'")
            }
            SurfaceError::NoStyle => write!(f, "no style is currently loaded"),
            SurfaceError::NoPendingStyle => write!(f, "no style load is pending"),
            SurfaceError::UnknownStyle(style) => write!(f, "style '{style}' is not registered"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// The data variant behind a style source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Tiled vector data (the substrate for basemap enhancement layers).
    Vector,
    /// Tiled raster imagery.
    Raster,
    /// Inline GeoJSON data, replaceable in place.
    Geojson,
}

impl SourceKind {
    /// Returns the style-spec string form of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Vector => "vector",
            SourceKind::Raster => "raster",
            SourceKind::Geojson => "geojson",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The rendering variant of a style layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    /// Filled polygons.
    Fill,
    /// Stroked lines.
    Line,
    /// Text and icon placement (labels); overlays anchor below the first of
    /// these so labels stay readable.
    Symbol,
    /// Screen-space circles.
    Circle,
    /// Density surface.
    Heatmap,
    /// Extruded polygons (3D buildings).
    FillExtrusion,
    /// Raster imagery.
    Raster,
    /// Full-canvas background.
    Background,
}

impl LayerKind {
    /// Returns the style-spec string form of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Fill => "fill",
            LayerKind::Line => "line",
            LayerKind::Symbol => "symbol",
            LayerKind::Circle => "circle",
            LayerKind::Heatmap => "heatmap",
            LayerKind::FillExtrusion => "fill-extrusion",
            LayerKind::Raster => "raster",
            LayerKind::Background => "background",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declarative description of a layer to add to the surface.
///
/// Paint, layout and filter bodies are carried as style-spec JSON expression
/// documents rather than a typed AST; the surface hands them to the renderer
/// verbatim, so the full expression language stays available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Unique layer id.
    pub id: String,

    /// Rendering variant.
    pub kind: LayerKind,

    /// Id of the source this layer draws from.
    pub source: String,

    /// Named layer within a vector source, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,

    /// Minimum zoom at which the layer renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<f64>,

    /// Maximum zoom at which the layer renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<f64>,

    /// Feature filter expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,

    /// Layout property document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<serde_json::Value>,

    /// Paint property document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paint: Option<serde_json::Value>,
}

impl LayerSpec {
    /// Creates a spec with the required fields; everything else unset.
    pub fn new(id: impl Into<String>, kind: LayerKind, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
            source_layer: None,
            minzoom: None,
            maxzoom: None,
            filter: None,
            layout: None,
            paint: None,
        }
    }

    /// Sets the named vector source layer.
    pub fn with_source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    /// Sets the minimum render zoom.
    pub fn with_minzoom(mut self, minzoom: f64) -> Self {
        self.minzoom = Some(minzoom);
        self
    }

    /// Sets the maximum render zoom.
    pub fn with_maxzoom(mut self, maxzoom: f64) -> Self {
        self.maxzoom = Some(maxzoom);
        self
    }

    /// Sets the feature filter expression.
    pub fn with_filter(mut self, filter: serde_json::Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the layout property document.
    pub fn with_layout(mut self, layout: serde_json::Value) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Sets the paint property document.
    pub fn with_paint(mut self, paint: serde_json::Value) -> Self {
        self.paint = Some(paint);
        self
    }
}

/// A camera movement request.
///
/// Unset fields keep their current value. `duration` selects animation length
/// for eased movements and is ignored by jumps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraUpdate {
    /// Target center coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LngLat>,

    /// Target zoom level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,

    /// Target pitch in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,

    /// Target bearing in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,

    /// Animation duration for eased movements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
}

impl CameraUpdate {
    /// Creates an empty update (all fields kept).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target center.
    pub fn with_center(mut self, center: LngLat) -> Self {
        self.center = Some(center);
        self
    }

    /// Sets the target zoom.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    /// Sets the target pitch.
    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    /// Sets the target bearing.
    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    /// Sets the animation duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// A source as seen in a style snapshot, in registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    /// Source id.
    pub id: String,
    /// Data variant.
    pub kind: SourceKind,
}

/// A layer as seen in a style snapshot, in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEntry {
    /// Layer id.
    pub id: String,
    /// Rendering variant.
    pub kind: LayerKind,
    /// Source the layer draws from; `None` for background layers.
    pub source: Option<String>,
}

/// Point-in-time view of the live style's structure.
///
/// `sources` preserves registration order and `layers` preserves draw order,
/// which is what the placement heuristics key off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSnapshot {
    /// Registered sources in registration order.
    pub sources: Vec<SourceEntry>,
    /// Present layers in draw order (first renders underneath).
    pub layers: Vec<LayerEntry>,
}

/// Progress detail of a source-data notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceDataKind {
    /// A tile finished loading.
    Tile,
    /// Source metadata became available.
    Metadata,
    /// Non-tile content changed.
    Content,
    /// Visibility toggled.
    Visibility,
}

/// Notifications delivered by the host's render loop to the engine.
///
/// The surface itself never calls back into the engine; the host observes its
/// renderer and pumps these in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// A requested style finished loading and is live.
    StyleLoaded,
    /// The user started dragging the map.
    DragStart,
    /// The zoom level changed.
    Zoom {
        /// New zoom level.
        zoom: f64,
    },
    /// A source reported data progress.
    SourceData {
        /// What kind of data arrived.
        kind: SourceDataKind,
    },
}
