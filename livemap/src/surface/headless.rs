//! In-memory rendering surface.
//!
//! [`HeadlessSurface`] models the structural half of a style renderer:
//! registered sources, layers in draw order, the camera, and the asynchronous
//! style-swap handshake. It enforces the same id and ordering rules a real
//! renderer enforces and records every mutating call, which makes it both the
//! deterministic test double for the engine and the backend of the replay
//! tool.
//!
//! # Style swap handshake
//!
//! ```text
//!   set_style(ref)          complete_style_load()
//!  ───────────────▶ pending ─────────────────────▶ live (baseline contents)
//!        live style discarded          host then reports StyleLoaded
//! ```
//!
//! Styles are registered up front as [`StyleContents`] fixtures keyed by
//! style reference; completing a load installs that baseline. Between
//! `set_style` and `complete_style_load` there is no live style and every
//! structural call fails with [`SurfaceError::NoStyle`], mirroring a renderer
//! mid-swap.

use std::collections::HashMap;
use std::fmt;

use geojson::FeatureCollection;
use tracing::debug;

use super::types::{
    CameraUpdate, LayerEntry, LayerKind, LayerSpec, SourceEntry, SourceKind, StyleSnapshot,
    SurfaceError,
};
use super::MapSurface;
use crate::geo::LngLat;

/// Baseline contents a style brings with it when its load completes.
#[derive(Debug, Clone, Default)]
pub struct StyleContents {
    sources: Vec<SourceEntry>,
    layers: Vec<LayerEntry>,
}

impl StyleContents {
    /// Creates an empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source to the baseline, in registration order.
    pub fn with_source(mut self, id: impl Into<String>, kind: SourceKind) -> Self {
        self.sources.push(SourceEntry {
            id: id.into(),
            kind,
        });
        self
    }

    /// Adds a layer to the baseline, in draw order. `source` is `None` for
    /// background layers.
    pub fn with_layer(
        mut self,
        id: impl Into<String>,
        kind: LayerKind,
        source: Option<&str>,
    ) -> Self {
        self.layers.push(LayerEntry {
            id: id.into(),
            kind,
            source: source.map(str::to_string),
        });
        self
    }
}

/// Camera pose of the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Current center coordinate.
    pub center: LngLat,
    /// Current zoom level.
    pub zoom: f64,
    /// Current pitch in degrees.
    pub pitch: f64,
    /// Current bearing in degrees.
    pub bearing: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            center: LngLat::new(0.0, 0.0),
            zoom: 0.0,
            pitch: 0.0,
            bearing: 0.0,
        }
    }
}

/// One recorded surface mutation.
///
/// The log records calls as requested; camera state separately reflects the
/// clamped effect.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    /// A source was registered.
    AddSource {
        /// Source id.
        id: String,
        /// Data variant.
        kind: SourceKind,
    },
    /// A GeoJSON source's data was replaced.
    SetSourceData {
        /// Source id.
        id: String,
        /// Number of features in the new collection.
        feature_count: usize,
    },
    /// A source was removed.
    RemoveSource {
        /// Source id.
        id: String,
    },
    /// A layer was added.
    AddLayer {
        /// Full spec of the added layer.
        spec: LayerSpec,
        /// Anchor layer it was positioned before, if any.
        before: Option<String>,
    },
    /// A layer was reordered.
    MoveLayer {
        /// Layer id.
        id: String,
        /// Anchor layer it was moved before, if any.
        before: Option<String>,
    },
    /// A layer was removed.
    RemoveLayer {
        /// Layer id.
        id: String,
    },
    /// A style swap was requested.
    SetStyle {
        /// Requested style reference.
        style_ref: String,
    },
    /// The pitch was set directly.
    SetPitch {
        /// Requested pitch in degrees.
        pitch: f64,
    },
    /// The camera jumped.
    JumpTo {
        /// Requested update.
        camera: CameraUpdate,
    },
    /// The camera eased.
    EaseTo {
        /// Requested update.
        camera: CameraUpdate,
    },
}

impl fmt::Display for SurfaceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceOp::AddSource { id, kind } => write!(f, "add-source {id} ({kind})"),
            SurfaceOp::SetSourceData { id, feature_count } => {
                write!(f, "set-source-data {id} ({feature_count} features)")
            }
            SurfaceOp::RemoveSource { id } => write!(f, "remove-source {id}"),
            SurfaceOp::AddLayer { spec, before } => match before {
                Some(anchor) => write!(f, "add-layer {} before {anchor}", spec.id),
                None => write!(f, "add-layer {} (top)", spec.id),
            },
            SurfaceOp::MoveLayer { id, before } => match before {
                Some(anchor) => write!(f, "move-layer {id} before {anchor}"),
                None => write!(f, "move-layer {id} (top)"),
            },
            SurfaceOp::RemoveLayer { id } => write!(f, "remove-layer {id}"),
            SurfaceOp::SetStyle { style_ref } => write!(f, "set-style {style_ref}"),
            SurfaceOp::SetPitch { pitch } => write!(f, "set-pitch {pitch}"),
            SurfaceOp::JumpTo { camera } => write!(f, "jump-to {}", describe_camera(camera)),
            SurfaceOp::EaseTo { camera } => write!(f, "ease-to {}", describe_camera(camera)),
        }
    }
}

fn describe_camera(camera: &CameraUpdate) -> String {
    let mut parts = Vec::new();
    if let Some(center) = camera.center {
        parts.push(format!("center=({:.4},{:.4})", center.lng, center.lat));
    }
    if let Some(zoom) = camera.zoom {
        parts.push(format!("zoom={zoom}"));
    }
    if let Some(pitch) = camera.pitch {
        parts.push(format!("pitch={pitch}"));
    }
    if let Some(bearing) = camera.bearing {
        parts.push(format!("bearing={bearing}"));
    }
    if let Some(duration) = camera.duration {
        parts.push(format!("duration={}ms", duration.as_millis()));
    }
    if parts.is_empty() {
        "(no-op)".to_string()
    } else {
        parts.join(" ")
    }
}

/// In-memory [`MapSurface`] implementation with a recorded operation log.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    /// Registered style fixtures by style reference.
    styles: HashMap<String, StyleContents>,
    /// Reference of the live style, if one is loaded.
    live_style_ref: Option<String>,
    /// Reference of a requested style whose load has not completed.
    pending_style_ref: Option<String>,
    /// Live sources in registration order. Empty while no style is live.
    sources: Vec<SourceEntry>,
    /// Live layers in draw order. Empty while no style is live.
    layers: Vec<LayerEntry>,
    /// Data payloads of live GeoJSON sources.
    geojson_data: HashMap<String, FeatureCollection>,
    camera: CameraState,
    ops: Vec<SurfaceOp>,
}

impl HeadlessSurface {
    /// Maximum camera pitch in degrees; updates beyond it are clamped.
    pub const MAX_PITCH: f64 = 70.0;

    /// Maximum zoom level; updates beyond it are clamped.
    pub const MAX_ZOOM: f64 = 20.0;

    /// Creates a surface with no registered styles and no live style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a style fixture the surface can load.
    pub fn register_style(&mut self, style_ref: impl Into<String>, contents: StyleContents) {
        self.styles.insert(style_ref.into(), contents);
    }

    /// Builder form of [`register_style`](Self::register_style).
    pub fn with_style(mut self, style_ref: impl Into<String>, contents: StyleContents) -> Self {
        self.register_style(style_ref, contents);
        self
    }

    /// Completes the pending style load, installing the registered baseline.
    ///
    /// The host should follow up by delivering
    /// [`SurfaceEvent::StyleLoaded`](super::SurfaceEvent::StyleLoaded) to the
    /// engine, as a renderer's load notification would.
    pub fn complete_style_load(&mut self) -> Result<(), SurfaceError> {
        let style_ref = self
            .pending_style_ref
            .take()
            .ok_or(SurfaceError::NoPendingStyle)?;
        let contents = self
            .styles
            .get(&style_ref)
            .ok_or_else(|| SurfaceError::UnknownStyle(style_ref.clone()))?
            .clone();

        debug!(style_ref = %style_ref, "Style load complete");
        self.sources = contents.sources;
        self.layers = contents.layers;
        self.geojson_data.clear();
        self.live_style_ref = Some(style_ref);
        Ok(())
    }

    /// Reference of the live style, if any.
    pub fn live_style_ref(&self) -> Option<&str> {
        self.live_style_ref.as_deref()
    }

    /// Reference of the style whose load is pending, if any.
    pub fn pending_style_ref(&self) -> Option<&str> {
        self.pending_style_ref.as_deref()
    }

    /// Current camera pose.
    pub fn camera(&self) -> CameraState {
        self.camera
    }

    /// Recorded operations since construction or the last
    /// [`clear_ops`](Self::clear_ops).
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Clears the operation log.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Current data of a live GeoJSON source.
    pub fn geojson_data(&self, id: &str) -> Option<&FeatureCollection> {
        self.geojson_data.get(id)
    }

    /// Ids of live sources in registration order.
    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id.as_str()).collect()
    }

    /// Ids of live layers in draw order.
    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    /// Draw-order index of a live layer.
    pub fn layer_index(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    fn require_live(&self) -> Result<(), SurfaceError> {
        if self.live_style_ref.is_some() {
            Ok(())
        } else {
            Err(SurfaceError::NoStyle)
        }
    }

    fn source_kind(&self, id: &str) -> Option<SourceKind> {
        self.sources.iter().find(|s| s.id == id).map(|s| s.kind)
    }

    fn apply_camera(&mut self, camera: &CameraUpdate) {
        if let Some(center) = camera.center {
            self.camera.center = center;
        }
        if let Some(zoom) = camera.zoom {
            self.camera.zoom = zoom.clamp(0.0, Self::MAX_ZOOM);
        }
        if let Some(pitch) = camera.pitch {
            self.camera.pitch = pitch.clamp(0.0, Self::MAX_PITCH);
        }
        if let Some(bearing) = camera.bearing {
            self.camera.bearing = bearing;
        }
    }
}

impl MapSurface for HeadlessSurface {
    fn add_geojson_source(
        &mut self,
        id: &str,
        data: &FeatureCollection,
    ) -> Result<(), SurfaceError> {
        self.require_live()?;
        if self.has_source(id) {
            return Err(SurfaceError::DuplicateSource(id.to_string()));
        }

        self.sources.push(SourceEntry {
            id: id.to_string(),
            kind: SourceKind::Geojson,
        });
        self.geojson_data.insert(id.to_string(), data.clone());
        self.ops.push(SurfaceOp::AddSource {
            id: id.to_string(),
            kind: SourceKind::Geojson,
        });
        Ok(())
    }

    fn set_geojson_data(
        &mut self,
        id: &str,
        data: &FeatureCollection,
    ) -> Result<(), SurfaceError> {
        self.require_live()?;
        match self.source_kind(id) {
            None => return Err(SurfaceError::UnknownSource(id.to_string())),
            Some(SourceKind::Geojson) => {}
            Some(_) => return Err(SurfaceError::NotGeoJson(id.to_string())),
        }

        self.geojson_data.insert(id.to_string(), data.clone());
        self.ops.push(SurfaceOp::SetSourceData {
            id: id.to_string(),
            feature_count: data.features.len(),
        });
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|s| s.id == id)
    }

    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.require_live()?;
        let position = self
            .sources
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| SurfaceError::UnknownSource(id.to_string()))?;

        if let Some(layer) = self.layers.iter().find(|l| l.source.as_deref() == Some(id)) {
            return Err(SurfaceError::SourceInUse {
                source: id.to_string(),
                layer: layer.id.clone(),
            });
        }

        self.sources.remove(position);
        self.geojson_data.remove(id);
        self.ops.push(SurfaceOp::RemoveSource { id: id.to_string() });
        Ok(())
    }

    fn add_layer(&mut self, spec: &LayerSpec, before_id: Option<&str>) -> Result<(), SurfaceError> {
        self.require_live()?;
        if self.has_layer(&spec.id) {
            return Err(SurfaceError::DuplicateLayer(spec.id.clone()));
        }
        if !self.has_source(&spec.source) {
            return Err(SurfaceError::MissingLayerSource {
                layer: spec.id.clone(),
                source: spec.source.clone(),
            });
        }

        let entry = LayerEntry {
            id: spec.id.clone(),
            kind: spec.kind,
            source: Some(spec.source.clone()),
        };
        match before_id {
            Some(before) => {
                let position = self
                    .layers
                    .iter()
                    .position(|l| l.id == before)
                    .ok_or_else(|| SurfaceError::UnknownLayer(before.to_string()))?;
                self.layers.insert(position, entry);
            }
            None => self.layers.push(entry),
        }

        self.ops.push(SurfaceOp::AddLayer {
            spec: spec.clone(),
            before: before_id.map(str::to_string),
        });
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn move_layer(&mut self, id: &str, before_id: Option<&str>) -> Result<(), SurfaceError> {
        self.require_live()?;
        // Moving a layer before itself is a degenerate no-op
        if before_id == Some(id) {
            return Ok(());
        }

        let position = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| SurfaceError::UnknownLayer(id.to_string()))?;
        if let Some(before) = before_id {
            if !self.has_layer(before) {
                return Err(SurfaceError::UnknownLayer(before.to_string()));
            }
        }

        let entry = self.layers.remove(position);
        match before_id {
            Some(before) => {
                // Recompute after removal; the anchor may have shifted down
                let target = self
                    .layers
                    .iter()
                    .position(|l| l.id == before)
                    .unwrap_or(self.layers.len());
                self.layers.insert(target, entry);
            }
            None => self.layers.push(entry),
        }

        self.ops.push(SurfaceOp::MoveLayer {
            id: id.to_string(),
            before: before_id.map(str::to_string),
        });
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.require_live()?;
        let position = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| SurfaceError::UnknownLayer(id.to_string()))?;

        self.layers.remove(position);
        self.ops.push(SurfaceOp::RemoveLayer { id: id.to_string() });
        Ok(())
    }

    fn set_style(&mut self, style_ref: &str) {
        debug!(style_ref, "Style swap requested");
        self.live_style_ref = None;
        self.sources.clear();
        self.layers.clear();
        self.geojson_data.clear();
        self.pending_style_ref = Some(style_ref.to_string());
        self.ops.push(SurfaceOp::SetStyle {
            style_ref: style_ref.to_string(),
        });
    }

    fn style_snapshot(&self) -> StyleSnapshot {
        StyleSnapshot {
            sources: self.sources.clone(),
            layers: self.layers.clone(),
        }
    }

    fn set_pitch(&mut self, pitch: f64) {
        self.camera.pitch = pitch.clamp(0.0, Self::MAX_PITCH);
        self.ops.push(SurfaceOp::SetPitch { pitch });
    }

    fn jump_to(&mut self, camera: &CameraUpdate) {
        self.apply_camera(camera);
        self.ops.push(SurfaceOp::JumpTo {
            camera: camera.clone(),
        });
    }

    fn ease_to(&mut self, camera: &CameraUpdate) {
        self.apply_camera(camera);
        self.ops.push(SurfaceOp::EaseTo {
            camera: camera.clone(),
        });
    }
}
