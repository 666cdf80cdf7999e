//! Map engine orchestration
//!
//! [`MapEngine`] owns the interactive map session: which basemap is active,
//! which overlays are desired, where the user is, and whether the camera
//! follows them. It drives a [`MapSurface`] and never touches a renderer
//! directly, so the same engine runs against a real renderer binding or the
//! bundled [`HeadlessSurface`](crate::surface::HeadlessSurface).
//!
//! # Lifecycle
//!
//! ```text
//!                init()                 StyleLoaded
//! Uninitialized ───────▶ Initializing ─────────────▶ Ready ◀────┐
//!                                                     │         │
//!                                          set_basemap()    StyleLoaded
//!                                                     ▼         │
//!                                                 StyleLoading ─┘
//!
//!              destroy() from any state ───▶ Destroyed (terminal)
//! ```
//!
//! Style loads are the only asynchronous edge: a swap discards the live
//! style, and the host reports completion by pumping
//! [`SurfaceEvent::StyleLoaded`] into [`MapEngine::handle_event`]. Each
//! completed load triggers the same application pass, in a fixed order:
//! basemap enhancements, then overlays, then the user location overlay. The
//! pass is idempotent, so overlays and location survive every basemap switch
//! without the host resubmitting them.
//!
//! # Design
//!
//! - Single-threaded by construction. Nothing is `Send`-bound, there are no
//!   locks, and every entry point runs to completion before the next; hosts
//!   with their own event loop pump [`SurfaceEvent`]s in and drain
//!   [`EngineEvent`]s out via [`MapEngine::poll_events`].
//! - Invalid references are ignored, not errors: an unknown basemap id, a
//!   repeated id, or a call before `init` logs and returns. Hosts wire UI
//!   controls straight to these methods without pre-validating.
//! - State submitted while not ready (overlays, location) is stored and
//!   applied by the next completed style load.
//! - Surface failures during an application pass are logged and dropped.
//!   One malformed overlay must not take down the session; the remaining
//!   families still apply.

pub mod enhance;

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::basemap::BasemapCatalog;
use crate::geo::LngLat;
use crate::location::{location_features, FollowConfig, FollowGate, LocationFix};
use crate::overlay::{
    overlay_for, reconcile, MapOverlays, OverlayContext, OverlayKey, OverlayPatch,
    USER_LOCATION_OVERLAY,
};
use crate::surface::{CameraUpdate, MapSurface, SourceDataKind, SurfaceEvent};

/// Camera center at startup: Parma, Italy.
pub const MAP_DEFAULT_CENTER: LngLat = LngLat::new(10.3278, 44.8062);

/// Zoom level at startup.
pub const MAP_DEFAULT_ZOOM: f64 = 14.5;

/// Camera pitch used when the active basemap declares no preference.
pub const MAP_DEFAULT_PITCH: f64 = 0.0;

/// Where the engine is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// No surface bound yet.
    #[default]
    Uninitialized,
    /// Surface bound, first style load in flight.
    Initializing,
    /// A basemap switch is in flight; the previous style is gone.
    StyleLoading,
    /// A style is live and the surface is mutable.
    Ready,
    /// Torn down. Terminal.
    Destroyed,
}

impl Lifecycle {
    /// Returns whether a style is live and the surface accepts mutations.
    pub fn is_ready(&self) -> bool {
        matches!(self, Lifecycle::Ready)
    }

    /// Returns whether the engine has been torn down.
    pub fn is_destroyed(&self) -> bool {
        matches!(self, Lifecycle::Destroyed)
    }

    /// Short human-readable account of the state.
    pub fn description(&self) -> &'static str {
        match self {
            Lifecycle::Uninitialized => "no surface bound",
            Lifecycle::Initializing => "first style load in progress",
            Lifecycle::StyleLoading => "basemap switch in progress",
            Lifecycle::Ready => "style live",
            Lifecycle::Destroyed => "torn down",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Initializing => "initializing",
            Lifecycle::StyleLoading => "style-loading",
            Lifecycle::Ready => "ready",
            Lifecycle::Destroyed => "destroyed",
        };
        write!(f, "{name}")
    }
}

/// Running counters of a session. Cheap to copy, read via
/// [`MapEngine::metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineMetrics {
    /// Accepted basemap switch requests. The initial style does not count.
    pub style_switches: u64,

    /// Tile-typed source-data notifications, cache hits included.
    pub tile_loads: u64,
}

/// Notifications the engine queues for its host.
///
/// Drained in FIFO order by [`MapEngine::poll_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The first style finished loading; the map is usable. Emitted once per
    /// session.
    Ready,
    /// The zoom level changed.
    ZoomChanged {
        /// New zoom level.
        zoom: f64,
    },
    /// Follow mode was switched on or off, by the host or by a drag.
    FollowModeChanged {
        /// New follow state.
        enabled: bool,
    },
    /// The positioning source reported an error.
    LocationError {
        /// Human-readable account of the failure.
        message: String,
    },
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::Ready => write!(f, "ready"),
            EngineEvent::ZoomChanged { zoom } => write!(f, "zoom-changed {zoom}"),
            EngineEvent::FollowModeChanged { enabled } => {
                write!(f, "follow-mode {}", if *enabled { "on" } else { "off" })
            }
            EngineEvent::LocationError { message } => write!(f, "location-error: {message}"),
        }
    }
}

/// Engine tuning, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Camera center before any location fix arrives.
    pub initial_center: LngLat,

    /// Zoom level at startup.
    pub initial_zoom: f64,

    /// Follow-mode recenter tuning.
    pub follow: FollowConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_center: MAP_DEFAULT_CENTER,
            initial_zoom: MAP_DEFAULT_ZOOM,
            follow: FollowConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Sets the startup camera center.
    pub fn with_initial_center(mut self, center: LngLat) -> Self {
        self.initial_center = center;
        self
    }

    /// Sets the startup zoom level.
    pub fn with_initial_zoom(mut self, zoom: f64) -> Self {
        self.initial_zoom = zoom;
        self
    }

    /// Sets the follow-mode tuning.
    pub fn with_follow(mut self, follow: FollowConfig) -> Self {
        self.follow = follow;
        self
    }
}

/// Orchestrator of one interactive map session.
///
/// Construction injects the immutable [`BasemapCatalog`];
/// [`init`](MapEngine::init) binds the surface and requests the first style.
/// From then on the host calls the `set_*` methods as its UI demands and
/// pumps renderer notifications through
/// [`handle_event`](MapEngine::handle_event).
///
/// The surface is present exactly while the lifecycle is `Initializing`,
/// `StyleLoading` or `Ready`; it is dropped on [`destroy`](MapEngine::destroy).
pub struct MapEngine<S> {
    config: EngineConfig,
    catalog: BasemapCatalog,
    surface: Option<S>,
    lifecycle: Lifecycle,
    /// Id of the basemap whose style is live or loading, when it came from
    /// the catalog.
    active_basemap: Option<String>,
    /// Desired overlay state; survives style swaps.
    overlays: MapOverlays,
    /// Most recent location fix; survives style swaps.
    user_location: Option<LocationFix>,
    follow_mode: bool,
    follow_gate: FollowGate,
    /// Whether [`EngineEvent::Ready`] was already emitted.
    ready_emitted: bool,
    metrics: EngineMetrics,
    events: VecDeque<EngineEvent>,
}

impl<S: MapSurface> MapEngine<S> {
    /// Creates an engine over `catalog` with default tuning.
    pub fn new(catalog: BasemapCatalog) -> Self {
        Self::with_config(catalog, EngineConfig::default())
    }

    /// Creates an engine over `catalog` with explicit tuning.
    pub fn with_config(catalog: BasemapCatalog, config: EngineConfig) -> Self {
        Self {
            follow_gate: FollowGate::new(config.follow),
            config,
            catalog,
            surface: None,
            lifecycle: Lifecycle::Uninitialized,
            active_basemap: None,
            overlays: MapOverlays::new(),
            user_location: None,
            follow_mode: false,
            ready_emitted: false,
            metrics: EngineMetrics::default(),
            events: VecDeque::new(),
        }
    }

    /// Binds a surface, positions the camera and requests the first style.
    ///
    /// `initial_basemap_id` names the catalog entry `initial_style_ref`
    /// belongs to; pass `None` when bootstrapping with a style outside the
    /// catalog (such a session gets no basemap enhancements until
    /// [`set_basemap`](Self::set_basemap) activates a catalog entry).
    ///
    /// Calling again once a surface is bound, or after
    /// [`destroy`](Self::destroy), is ignored.
    pub fn init(
        &mut self,
        mut surface: S,
        initial_style_ref: &str,
        initial_basemap_id: Option<&str>,
    ) {
        if self.surface.is_some() || self.lifecycle.is_destroyed() {
            debug!("Surface already bound or engine destroyed, ignoring init");
            return;
        }

        if let Some(id) = initial_basemap_id {
            if !self.catalog.contains(id) {
                warn!(basemap = id, "Initial basemap id is not in the catalog");
            }
        }
        self.active_basemap = initial_basemap_id.map(str::to_string);

        surface.jump_to(
            &CameraUpdate::new()
                .with_center(self.config.initial_center)
                .with_zoom(self.config.initial_zoom)
                .with_pitch(MAP_DEFAULT_PITCH),
        );
        surface.set_style(initial_style_ref);
        self.surface = Some(surface);
        self.lifecycle = Lifecycle::Initializing;
        info!(
            style_ref = initial_style_ref,
            basemap = self.active_basemap.as_deref().unwrap_or("none"),
            "Map engine initializing"
        );
    }

    /// Feeds one renderer notification into the engine.
    ///
    /// Ignored after [`destroy`](Self::destroy).
    pub fn handle_event(&mut self, event: SurfaceEvent) {
        if self.lifecycle.is_destroyed() {
            return;
        }

        match event {
            SurfaceEvent::StyleLoaded => self.on_style_loaded(),
            SurfaceEvent::DragStart => {
                // The user taking the camera wins over following
                if self.follow_mode {
                    self.set_follow_mode(false);
                }
            }
            SurfaceEvent::Zoom { zoom } => {
                self.events.push_back(EngineEvent::ZoomChanged { zoom });
            }
            SurfaceEvent::SourceData { kind } => {
                if kind == SourceDataKind::Tile {
                    self.metrics.tile_loads += 1;
                }
            }
        }
    }

    /// Switches to another catalog basemap.
    ///
    /// Ignored when no surface is bound, when `basemap_id` is not in the
    /// catalog, or when it is already active. An accepted switch may arrive
    /// while a previous one is still loading; the newer request wins.
    pub fn set_basemap(&mut self, basemap_id: &str) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        if self.surface.is_none() {
            debug!(basemap = basemap_id, "No surface bound, ignoring basemap switch");
            return;
        }
        let Some(basemap) = self.catalog.get(basemap_id) else {
            warn!(basemap = basemap_id, "Unknown basemap id, ignoring");
            return;
        };
        if self.active_basemap.as_deref() == Some(basemap_id) {
            debug!(basemap = basemap_id, "Basemap already active, ignoring");
            return;
        }

        let style_ref = basemap.style_ref.clone();
        info!(basemap = basemap_id, style_ref = %style_ref, "Switching basemap");
        self.active_basemap = Some(basemap_id.to_string());
        self.lifecycle = Lifecycle::StyleLoading;
        self.metrics.style_switches += 1;
        if let Some(surface) = self.surface.as_mut() {
            surface.set_style(&style_ref);
        }
    }

    /// Merges an overlay patch into the desired state.
    ///
    /// Families the patch does not touch are left alone. While a style is
    /// live the touched families are applied (or removed) immediately;
    /// otherwise the merged state waits for the next completed style load.
    pub fn set_overlays(&mut self, patch: OverlayPatch) {
        if self.lifecycle.is_destroyed() {
            return;
        }

        let entries = patch.into_entries();
        let touched: Vec<OverlayKey> = entries.iter().map(|(key, _)| *key).collect();
        for (key, data) in entries {
            self.overlays.set(key, data);
        }

        if !self.lifecycle.is_ready() {
            debug!(families = touched.len(), "Style not live, overlay patch deferred");
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        let snapshot = surface.style_snapshot();
        let context = OverlayContext {
            before_id: enhance::find_first_symbol_layer(&snapshot),
        };
        for key in touched {
            let def = overlay_for(key);
            match self.overlays.get(key) {
                Some(data) => {
                    if let Err(error) = (def.apply)(surface, data, &context) {
                        warn!(overlay = def.id, %error, "Overlay application failed");
                    }
                }
                None => {
                    if let Err(error) =
                        reconcile::remove_overlay(surface, def.layer_ids, def.source_id)
                    {
                        warn!(overlay = def.id, %error, "Overlay removal failed");
                    }
                }
            }
        }
    }

    /// Stores the latest location fix and updates the location overlay.
    ///
    /// `None` clears the stored fix and tears the overlay down. While not
    /// ready only the stored fix changes; the next completed style load
    /// renders it. A new fix may recenter the camera when follow mode is on,
    /// subject to the recenter gate.
    pub fn set_user_location(&mut self, location: Option<LocationFix>) {
        if self.lifecycle.is_destroyed() {
            return;
        }

        let previous = self.user_location;
        self.user_location = location;

        if !self.lifecycle.is_ready() {
            return;
        }

        match location {
            None => {
                if let Some(surface) = self.surface.as_mut() {
                    if let Err(error) = reconcile::remove_overlay(
                        surface,
                        USER_LOCATION_OVERLAY.layer_ids,
                        USER_LOCATION_OVERLAY.source_id,
                    ) {
                        warn!(%error, "Location overlay removal failed");
                    }
                }
            }
            Some(fix) => {
                self.apply_user_location();
                if self.follow_mode {
                    let now = Instant::now();
                    if self.follow_gate.should_recenter(previous.as_ref(), &fix, now) {
                        self.center_on_user(false, now);
                    }
                }
            }
        }
    }

    /// Switches follow mode on or off.
    ///
    /// Works before `init` too; the state simply drives future fixes. A
    /// repeated value is ignored. Enabling with a stored fix recenters
    /// immediately and restarts the recenter pause window.
    pub fn set_follow_mode(&mut self, enabled: bool) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        if self.follow_mode == enabled {
            return;
        }

        self.follow_mode = enabled;
        info!(enabled, "Follow mode changed");
        self.events
            .push_back(EngineEvent::FollowModeChanged { enabled });

        if enabled && self.user_location.is_some() {
            self.center_on_user(true, Instant::now());
        }
    }

    /// Queues a [`EngineEvent::LocationError`] for the host.
    ///
    /// The engine does not interpret the message; positioning failures never
    /// change map state.
    pub fn report_location_error(&mut self, message: impl Into<String>) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        let message = message.into();
        warn!(error = %message, "Location source reported an error");
        self.events.push_back(EngineEvent::LocationError { message });
    }

    /// Tears the session down, dropping the surface and discarding any
    /// queued events. Terminal: every later call on the engine is ignored.
    pub fn destroy(&mut self) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        self.surface = None;
        self.events.clear();
        self.lifecycle = Lifecycle::Destroyed;
        info!("Map engine destroyed");
    }

    /// Drains the queued engine events in FIFO order.
    pub fn poll_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    /// The bound surface, while one is bound.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Mutable access to the bound surface.
    ///
    /// Hosts use this to complete style loads on a
    /// [`HeadlessSurface`](crate::surface::HeadlessSurface) or to reach
    /// renderer-specific extras; engine-managed state should go through the
    /// engine methods.
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Snapshot of the session counters.
    pub fn metrics(&self) -> EngineMetrics {
        self.metrics
    }

    /// Id of the active (or loading) catalog basemap, if any.
    pub fn active_basemap(&self) -> Option<&str> {
        self.active_basemap.as_deref()
    }

    /// Whether follow mode is on.
    pub fn follow_mode(&self) -> bool {
        self.follow_mode
    }

    /// The most recent location fix, if one is stored.
    pub fn user_location(&self) -> Option<&LocationFix> {
        self.user_location.as_ref()
    }

    /// The injected basemap catalog.
    pub fn catalog(&self) -> &BasemapCatalog {
        &self.catalog
    }

    /// The engine tuning.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A completed style load: run the full application pass.
    fn on_style_loaded(&mut self) {
        if self.surface.is_none() {
            debug!("Style load reported with no surface bound, ignoring");
            return;
        }

        self.lifecycle = Lifecycle::Ready;
        info!(
            basemap = self.active_basemap.as_deref().unwrap_or("none"),
            "Style live, applying session state"
        );

        self.apply_basemap_enhancements();
        self.apply_overlays();
        self.apply_user_location();

        if !self.ready_emitted {
            self.ready_emitted = true;
            self.events.push_back(EngineEvent::Ready);
        }
    }

    fn apply_basemap_enhancements(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let Some(basemap) = self
            .active_basemap
            .as_deref()
            .and_then(|id| self.catalog.get(id))
        else {
            debug!("Active style has no catalog entry, skipping enhancements");
            return;
        };

        if let Err(error) = enhance::apply_enhancements(surface, basemap) {
            warn!(basemap = %basemap.id, %error, "Enhancement injection failed");
        }
    }

    fn apply_overlays(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let snapshot = surface.style_snapshot();
        let context = OverlayContext {
            before_id: enhance::find_first_symbol_layer(&snapshot),
        };

        for key in OverlayKey::ALL {
            let Some(data) = self.overlays.get(key) else {
                continue;
            };
            let def = overlay_for(key);
            if let Err(error) = (def.apply)(surface, data, &context) {
                warn!(overlay = def.id, %error, "Overlay application failed");
            }
        }
    }

    fn apply_user_location(&mut self) {
        let Some(fix) = self.user_location else {
            return;
        };
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        let snapshot = surface.style_snapshot();
        let context = OverlayContext {
            before_id: enhance::find_first_symbol_layer(&snapshot),
        };
        let data = location_features(&fix);
        if let Err(error) = (USER_LOCATION_OVERLAY.apply)(surface, &data, &context) {
            warn!(%error, "Location overlay application failed");
        }
    }

    /// Recenters the camera on the stored fix at the active basemap's
    /// preferred pitch, restarting the recenter pause window.
    fn center_on_user(&mut self, immediate: bool, now: Instant) {
        let Some(fix) = self.user_location else {
            return;
        };
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        let pitch = self
            .active_basemap
            .as_deref()
            .and_then(|id| self.catalog.get(id))
            .and_then(|basemap| basemap.preferred_pitch)
            .unwrap_or(MAP_DEFAULT_PITCH);

        self.follow_gate.mark_recentered(now);
        let camera = CameraUpdate::new()
            .with_center(fix.coordinates)
            .with_pitch(pitch);
        if immediate {
            surface.jump_to(&camera);
        } else {
            surface.ease_to(&camera.with_duration(self.follow_gate.config().ease_duration));
        }
    }
}
