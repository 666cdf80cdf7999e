//! LiveMap - renderer-agnostic interactive map orchestration
//!
//! This library owns the state of an interactive map session - active
//! basemap, data overlays, user location, follow mode - and reconciles it
//! onto any style-based map renderer through the [`surface::MapSurface`]
//! trait. The renderer binding stays thin: it forwards structural calls and
//! pumps its notifications back as [`surface::SurfaceEvent`]s.
//!
//! # Architecture
//!
//! ```text
//!            set_basemap / set_overlays / set_user_location / ...
//! Host ────────────────────────────────────────────────▶ MapEngine
//!   ▲                                                       │
//!   │ poll_events (EngineEvent)              MapSurface calls│
//!   │                                                        ▼
//!   └── SurfaceEvent (style loaded, drag, zoom, ...) ◀── renderer
//! ```
//!
//! Everything is single-threaded and synchronous except style loads, whose
//! completion the host reports back; the engine then re-applies basemap
//! enhancements, overlays and the location overlay onto the fresh style.
//!
//! # Example
//!
//! ```ignore
//! use livemap::basemap::BasemapCatalog;
//! use livemap::engine::MapEngine;
//! use livemap::overlay::{OverlayKey, OverlayPatch};
//! use livemap::surface::SurfaceEvent;
//!
//! let mut engine = MapEngine::new(BasemapCatalog::builtin());
//! engine.init(renderer, "/styles/osm-3d.json", Some("osm-3d"));
//!
//! // ... once the renderer reports the style load:
//! engine.handle_event(SurfaceEvent::StyleLoaded);
//!
//! engine.set_overlays(OverlayPatch::new().set(OverlayKey::Markers, markers));
//! engine.set_follow_mode(true);
//! for event in engine.poll_events() {
//!     println!("{event}");
//! }
//! ```

pub mod basemap;
pub mod engine;
pub mod geo;
pub mod location;
pub mod overlay;
pub mod surface;

pub use basemap::{BasemapCatalog, BasemapDefinition, BasemapKind};
pub use engine::{EngineConfig, EngineEvent, EngineMetrics, Lifecycle, MapEngine};
pub use geo::LngLat;
pub use location::{FollowConfig, LocationFix};
pub use overlay::{OverlayKey, OverlayPatch};
pub use surface::{HeadlessSurface, MapSurface, SurfaceError, SurfaceEvent};
