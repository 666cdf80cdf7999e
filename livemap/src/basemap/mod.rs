//! Basemap catalog module
//!
//! The set of selectable basemaps is data, not code: an immutable
//! [`BasemapCatalog`] injected into the engine at construction. Each entry
//! declares its style reference, substrate kind, attribution, capability
//! flags for the enhancement layers, and an optional preferred camera pitch.
//!
//! Catalogs come from [`BasemapCatalog::builtin`] (the stock set) or from a
//! JSON document via [`BasemapCatalog::from_json`], so deployments can swap
//! the selection without touching engine code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Id of the basemap selected when nothing else is configured.
pub const DEFAULT_BASEMAP_ID: &str = "osm-3d";

/// Errors raised while loading or assembling a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog document failed to decode.
    #[error("catalog JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two entries share an id.
    #[error("duplicate basemap id '{0}'")]
    DuplicateId(String),

    /// An entry has an empty id or style reference.
    #[error("basemap entry {index} is missing {field}")]
    MissingField {
        /// Position of the offending entry.
        index: usize,
        /// Which required field is empty.
        field: &'static str,
    },
}

/// Substrate type of a basemap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BasemapKind {
    /// Tiled vector data; eligible for enhancement layers.
    Vector,
    /// Tiled raster imagery; never enhanced.
    Raster,
}

impl BasemapKind {
    /// Returns the string form of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            BasemapKind::Vector => "vector",
            BasemapKind::Raster => "raster",
        }
    }
}

impl std::fmt::Display for BasemapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One selectable basemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasemapDefinition {
    /// Stable identifier used by [`set_basemap`](crate::engine::MapEngine::set_basemap).
    pub id: String,

    /// Human-readable name for pickers.
    pub label: String,

    /// Style document reference handed to the surface on activation.
    pub style_ref: String,

    /// Substrate kind.
    pub kind: BasemapKind,

    /// Attribution line shown with this basemap.
    pub attribution: String,

    /// Whether the style's vector data supports the 3D buildings layer.
    #[serde(default)]
    pub supports_3d: bool,

    /// Whether the style's vector data supports the house-number layer.
    #[serde(default)]
    pub supports_house_numbers: bool,

    /// Camera pitch applied when this basemap becomes active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_pitch: Option<f64>,

    /// Whether the entry is offered to users. Defaults to `true`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl BasemapDefinition {
    /// Creates a raster entry with no capabilities.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        style_ref: impl Into<String>,
        kind: BasemapKind,
        attribution: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            style_ref: style_ref.into(),
            kind,
            attribution: attribution.into(),
            supports_3d: false,
            supports_house_numbers: false,
            preferred_pitch: None,
            enabled: true,
        }
    }

    /// Marks the entry's vector data as supporting 3D buildings.
    pub fn with_3d(mut self) -> Self {
        self.supports_3d = true;
        self
    }

    /// Marks the entry's vector data as supporting house numbers.
    pub fn with_house_numbers(mut self) -> Self {
        self.supports_house_numbers = true;
        self
    }

    /// Sets the preferred camera pitch.
    pub fn with_preferred_pitch(mut self, pitch: f64) -> Self {
        self.preferred_pitch = Some(pitch);
        self
    }

    /// Withholds the entry from pickers while keeping it addressable.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Immutable table of selectable basemaps.
///
/// Serializes as a plain JSON array of entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasemapCatalog {
    basemaps: Vec<BasemapDefinition>,
}

impl BasemapCatalog {
    /// Assembles a catalog, rejecting duplicate ids and empty required
    /// fields.
    pub fn from_definitions(basemaps: Vec<BasemapDefinition>) -> Result<Self, CatalogError> {
        let catalog = Self { basemaps };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Decodes a catalog from a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// The stock catalog: three OpenMapTiles street styles, a satellite
    /// hybrid, and a HERE street style.
    pub fn builtin() -> Self {
        let osm_attribution = "© OpenMapTiles © OpenStreetMap contributors";
        Self {
            basemaps: vec![
                BasemapDefinition::new(
                    "osm-streets",
                    "OSM Streets",
                    "/styles/osm-streets.json",
                    BasemapKind::Vector,
                    osm_attribution,
                )
                .with_3d()
                .with_house_numbers()
                .with_preferred_pitch(0.0),
                BasemapDefinition::new(
                    "osm-3d",
                    "OSM 3D",
                    "/styles/osm-3d.json",
                    BasemapKind::Vector,
                    osm_attribution,
                )
                .with_3d()
                .with_house_numbers()
                .with_preferred_pitch(55.0),
                BasemapDefinition::new(
                    "osm-night",
                    "OSM Night",
                    "/styles/osm-night.json",
                    BasemapKind::Vector,
                    osm_attribution,
                )
                .with_3d()
                .with_house_numbers()
                .with_preferred_pitch(0.0),
                BasemapDefinition::new(
                    "satellite-hybrid",
                    "Satellite",
                    "/styles/satellite-hybrid.json",
                    BasemapKind::Raster,
                    "© Esri, Maxar, Earthstar Geographics",
                )
                .with_preferred_pitch(0.0),
                BasemapDefinition::new(
                    "here-streets",
                    "HERE Streets",
                    "/styles/here-streets.json",
                    BasemapKind::Vector,
                    "© HERE",
                )
                .with_3d()
                .with_house_numbers()
                .with_preferred_pitch(0.0),
            ],
        }
    }

    /// Looks up an entry by id.
    pub fn get(&self, id: &str) -> Option<&BasemapDefinition> {
        self.basemaps.iter().find(|b| b.id == id)
    }

    /// Returns whether an entry with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterates all entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &BasemapDefinition> {
        self.basemaps.iter()
    }

    /// Iterates entries offered to users, in catalog order.
    pub fn enabled(&self) -> impl Iterator<Item = &BasemapDefinition> {
        self.basemaps.iter().filter(|b| b.enabled)
    }

    /// Number of entries, including disabled ones.
    pub fn len(&self) -> usize {
        self.basemaps.len()
    }

    /// Returns whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.basemaps.is_empty()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = std::collections::HashSet::new();
        for (index, basemap) in self.basemaps.iter().enumerate() {
            if basemap.id.is_empty() {
                return Err(CatalogError::MissingField { index, field: "id" });
            }
            if basemap.style_ref.is_empty() {
                return Err(CatalogError::MissingField {
                    index,
                    field: "style_ref",
                });
            }
            if !seen.insert(basemap.id.as_str()) {
                return Err(CatalogError::DuplicateId(basemap.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_entries() {
        let catalog = BasemapCatalog::builtin();

        assert_eq!(catalog.len(), 5);
        assert!(catalog.contains(DEFAULT_BASEMAP_ID));

        let osm_3d = catalog.get("osm-3d").expect("osm-3d should exist");
        assert_eq!(osm_3d.kind, BasemapKind::Vector);
        assert_eq!(osm_3d.preferred_pitch, Some(55.0));
        assert!(osm_3d.supports_3d);
        assert!(osm_3d.supports_house_numbers);

        let satellite = catalog.get("satellite-hybrid").expect("satellite should exist");
        assert_eq!(satellite.kind, BasemapKind::Raster);
        assert!(!satellite.supports_3d);
        assert!(!satellite.supports_house_numbers);
    }

    #[test]
    fn test_get_unknown_id_returns_none() {
        let catalog = BasemapCatalog::builtin();
        assert!(catalog.get("not-a-basemap").is_none());
        assert!(!catalog.contains("not-a-basemap"));
    }

    #[test]
    fn test_enabled_filter_skips_disabled_entries() {
        let catalog = BasemapCatalog::from_definitions(vec![
            BasemapDefinition::new("a", "A", "/styles/a.json", BasemapKind::Vector, "© A"),
            BasemapDefinition::new("b", "B", "/styles/b.json", BasemapKind::Raster, "© B")
                .disabled(),
        ])
        .unwrap();

        let enabled: Vec<&str> = catalog.enabled().map(|b| b.id.as_str()).collect();
        assert_eq!(enabled, vec!["a"]);

        // Disabled entries stay addressable by id
        assert!(catalog.contains("b"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = BasemapCatalog::from_definitions(vec![
            BasemapDefinition::new("a", "A", "/styles/a.json", BasemapKind::Vector, "© A"),
            BasemapDefinition::new("a", "A again", "/styles/a2.json", BasemapKind::Vector, "© A"),
        ]);

        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_empty_style_ref_rejected() {
        let result = BasemapCatalog::from_definitions(vec![BasemapDefinition::new(
            "a",
            "A",
            "",
            BasemapKind::Vector,
            "© A",
        )]);

        assert!(matches!(
            result,
            Err(CatalogError::MissingField {
                index: 0,
                field: "style_ref"
            })
        ));
    }

    #[test]
    fn test_from_json_roundtrip() {
        let catalog = BasemapCatalog::builtin();
        let json = serde_json::to_string(&catalog).unwrap();

        let decoded = BasemapCatalog::from_json(&json).unwrap();
        assert_eq!(decoded.len(), catalog.len());
        assert_eq!(
            decoded.get("osm-3d").unwrap().preferred_pitch,
            Some(55.0)
        );
    }

    #[test]
    fn test_from_json_defaults() {
        // Minimal entry: capability flags default off, enabled defaults on
        let json = r#"[{
            "id": "plain",
            "label": "Plain",
            "style_ref": "/styles/plain.json",
            "kind": "raster",
            "attribution": "© Plain"
        }]"#;

        let catalog = BasemapCatalog::from_json(json).unwrap();
        let entry = catalog.get("plain").unwrap();
        assert!(entry.enabled);
        assert!(!entry.supports_3d);
        assert!(entry.preferred_pitch.is_none());
    }

    #[test]
    fn test_from_json_invalid_kind_fails() {
        let json = r#"[{
            "id": "x",
            "label": "X",
            "style_ref": "/styles/x.json",
            "kind": "hologram",
            "attribution": "© X"
        }]"#;

        assert!(matches!(
            BasemapCatalog::from_json(json),
            Err(CatalogError::Parse(_))
        ));
    }
}
