//! Location overlay geometry builder.
//!
//! Turns a [`LocationFix`] into the GeoJSON feature collection behind the
//! location overlay. Every feature carries a `role` property so one source
//! can feed the ring, ray and dot layers through per-layer filters:
//!
//! - `accuracy` — a closed polygon approximating the accuracy circle, built
//!   only for reported accuracies greater than zero
//! - `heading` — a two-point ray from the position along the travel heading,
//!   built only for finite headings
//! - `position` — the position point itself, always present and always last

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

use super::LocationFix;
use crate::geo::{destination_point, LngLat};

/// Number of segments in the accuracy ring polygon. The ring closes back on
/// its first vertex, so it carries one more position than segments.
pub const ACCURACY_RING_STEPS: usize = 48;

/// Shortest heading ray, in meters.
pub const HEADING_RAY_MIN_M: f64 = 15.0;

/// Heading ray length assumed when the fix reports no accuracy, in meters.
pub const HEADING_RAY_DEFAULT_M: f64 = 25.0;

/// Longest heading ray, in meters.
pub const HEADING_RAY_MAX_M: f64 = 35.0;

/// Name of the property that tags each feature with its role.
pub const ROLE_PROPERTY: &str = "role";

/// Role of one feature within the location overlay collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureRole {
    /// The accuracy circle polygon.
    Accuracy,
    /// The travel heading ray.
    Heading,
    /// The position point.
    Position,
}

impl FeatureRole {
    /// Returns the property value written into the feature.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureRole::Accuracy => "accuracy",
            FeatureRole::Heading => "heading",
            FeatureRole::Position => "position",
        }
    }
}

impl std::fmt::Display for FeatureRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Length of the heading ray for a reported accuracy.
///
/// The ray scales with the accuracy radius so it stays visible inside the
/// ring, clamped to [`HEADING_RAY_MIN_M`]..=[`HEADING_RAY_MAX_M`]; an absent
/// accuracy falls back to [`HEADING_RAY_DEFAULT_M`] before clamping.
pub fn heading_ray_length_m(accuracy: Option<f64>) -> f64 {
    accuracy
        .unwrap_or(HEADING_RAY_DEFAULT_M)
        .min(HEADING_RAY_MAX_M)
        .max(HEADING_RAY_MIN_M)
}

/// Builds the location overlay feature collection for a fix.
pub fn location_features(fix: &LocationFix) -> FeatureCollection {
    let mut features = Vec::with_capacity(3);
    let center = fix.coordinates;

    if let Some(accuracy) = fix.accuracy {
        if accuracy > 0.0 {
            features.push(role_feature(
                FeatureRole::Accuracy,
                Value::Polygon(vec![accuracy_ring(center, accuracy)]),
            ));
        }
    }

    if let Some(heading) = fix.heading {
        if heading.is_finite() {
            let length = heading_ray_length_m(fix.accuracy);
            let tip = destination_point(center, length, heading);
            features.push(role_feature(
                FeatureRole::Heading,
                Value::LineString(vec![center.to_position(), tip.to_position()]),
            ));
        }
    }

    features.push(role_feature(
        FeatureRole::Position,
        Value::Point(center.to_position()),
    ));

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Closed ring of [`ACCURACY_RING_STEPS`] + 1 positions approximating the
/// circle of `radius_m` meters around `center`.
fn accuracy_ring(center: LngLat, radius_m: f64) -> Vec<Vec<f64>> {
    let mut ring = Vec::with_capacity(ACCURACY_RING_STEPS + 1);
    for step in 0..ACCURACY_RING_STEPS {
        let bearing = 360.0 * step as f64 / ACCURACY_RING_STEPS as f64;
        ring.push(destination_point(center, radius_m, bearing).to_position());
    }
    // Exact closure keeps the polygon valid GeoJSON
    let first = ring[0].clone();
    ring.push(first);
    ring
}

fn role_feature(role: FeatureRole, value: Value) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(
        ROLE_PROPERTY.to_string(),
        serde_json::Value::String(role.as_str().to_string()),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
