//! Data overlay module
//!
//! Overlays are the engine-managed GeoJSON layers drawn on top of whatever
//! basemap is active: highlighted areas, a density heatmap, point markers,
//! and the user location indicator. Each family is described by a static
//! [`OverlayDef`] owning its source id, its layer ids (the teardown
//! authority) and an `apply` function that reconciles the family onto a
//! surface.
//!
//! # Design
//!
//! - The registry is a fixed table over the closed [`OverlayKey`] set; there
//!   is no runtime registration. The user-location overlay has its own
//!   definition outside the keyed registry because it is driven by location
//!   fixes, not overlay patches.
//! - Desired state lives in [`MapOverlays`] and survives style swaps; hosts
//!   submit changes as an [`OverlayPatch`] that touches only the keys it
//!   names.
//! - `apply` functions are idempotent: they route every mutation through the
//!   [`reconcile`] helpers, so re-applying after a style load converges
//!   instead of erroring.

pub mod reconcile;

pub mod areas;
pub mod heat;
pub mod markers;
pub mod user_location;

pub use user_location::USER_LOCATION_OVERLAY;

use std::fmt;

use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

use crate::surface::{MapSurface, SurfaceError};

/// The closed set of patchable overlay families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKey {
    /// Highlighted polygon areas with outlines and labels.
    Areas,
    /// Density heatmap with close-zoom sample points.
    Heat,
    /// Point markers.
    Markers,
}

impl OverlayKey {
    /// Every overlay key, in the order style loads re-apply them.
    pub const ALL: [OverlayKey; 3] = [OverlayKey::Areas, OverlayKey::Heat, OverlayKey::Markers];

    /// Returns the stable string form of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKey::Areas => "areas",
            OverlayKey::Heat => "heat",
            OverlayKey::Markers => "markers",
        }
    }
}

impl fmt::Display for OverlayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Placement context handed to overlay `apply` functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayContext<'a> {
    /// Layer to anchor overlay layers before, so they render underneath
    /// basemap labels. `None` appends on top.
    pub before_id: Option<&'a str>,
}

/// Static description of one overlay family.
pub struct OverlayDef {
    /// Family name, used in logs.
    pub id: &'static str,

    /// The single GeoJSON source the family draws from.
    pub source_id: &'static str,

    /// Every layer the family may create. Teardown removes exactly these,
    /// in order, before the source.
    pub layer_ids: &'static [&'static str],

    /// Reconciles the family onto a surface for the given data.
    pub apply:
        fn(&mut dyn MapSurface, &FeatureCollection, &OverlayContext) -> Result<(), SurfaceError>,
}

impl fmt::Debug for OverlayDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayDef")
            .field("id", &self.id)
            .field("source_id", &self.source_id)
            .field("layer_ids", &self.layer_ids)
            .finish()
    }
}

/// Looks up the static definition for a keyed overlay family.
pub fn overlay_for(key: OverlayKey) -> &'static OverlayDef {
    match key {
        OverlayKey::Areas => &areas::AREAS_OVERLAY,
        OverlayKey::Heat => &heat::HEAT_OVERLAY,
        OverlayKey::Markers => &markers::MARKERS_OVERLAY,
    }
}

/// Desired overlay state, one optional collection per family.
///
/// This is what the engine persists across style swaps; it never touches a
/// surface itself.
#[derive(Debug, Clone, Default)]
pub struct MapOverlays {
    areas: Option<FeatureCollection>,
    heat: Option<FeatureCollection>,
    markers: Option<FeatureCollection>,
}

impl MapOverlays {
    /// Creates an empty state with no overlay data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current data for a family.
    pub fn get(&self, key: OverlayKey) -> Option<&FeatureCollection> {
        self.slot(key).as_ref()
    }

    /// Replaces a family's data; `None` clears it.
    pub fn set(&mut self, key: OverlayKey, data: Option<FeatureCollection>) {
        *self.slot_mut(key) = data;
    }

    /// Returns whether no family has data.
    pub fn is_empty(&self) -> bool {
        OverlayKey::ALL.iter().all(|key| self.get(*key).is_none())
    }

    fn slot(&self, key: OverlayKey) -> &Option<FeatureCollection> {
        match key {
            OverlayKey::Areas => &self.areas,
            OverlayKey::Heat => &self.heat,
            OverlayKey::Markers => &self.markers,
        }
    }

    fn slot_mut(&mut self, key: OverlayKey) -> &mut Option<FeatureCollection> {
        match key {
            OverlayKey::Areas => &mut self.areas,
            OverlayKey::Heat => &mut self.heat,
            OverlayKey::Markers => &mut self.markers,
        }
    }
}

/// A partial overlay update.
///
/// Only the families a patch names are touched: `set` replaces a family's
/// data, `clear` removes it, and everything else is left alone. Naming the
/// same family twice keeps the later entry.
#[derive(Debug, Clone, Default)]
pub struct OverlayPatch {
    entries: Vec<(OverlayKey, Option<FeatureCollection>)>,
}

impl OverlayPatch {
    /// Creates a patch touching nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces `key`'s data with `data`.
    pub fn set(mut self, key: OverlayKey, data: FeatureCollection) -> Self {
        self.put(key, Some(data));
        self
    }

    /// Clears `key`'s data, removing the family from the map.
    pub fn clear(mut self, key: OverlayKey) -> Self {
        self.put(key, None);
        self
    }

    /// Returns whether the patch touches no family.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The touched families and their new data, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (OverlayKey, Option<&FeatureCollection>)> {
        self.entries.iter().map(|(key, data)| (*key, data.as_ref()))
    }

    /// Consumes the patch into its entries.
    pub fn into_entries(self) -> Vec<(OverlayKey, Option<FeatureCollection>)> {
        self.entries
    }

    fn put(&mut self, key: OverlayKey, data: Option<FeatureCollection>) {
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = data;
        } else {
            self.entries.push((key, data));
        }
    }
}
