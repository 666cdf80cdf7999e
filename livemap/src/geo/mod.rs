//! Spherical geometry module
//!
//! Provides the great-circle distance and destination-point math used by the
//! location overlay builder and the follow-mode controller. Distances are
//! measured on the mean-radius sphere; screen-facing geometry (accuracy ring,
//! heading ray) is projected on the WGS84 equatorial sphere so it lines up
//! with Web Mercator basemap rendering.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used for great-circle distance measurement.
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 equatorial radius in meters, used when projecting overlay geometry
/// onto Web Mercator basemaps.
pub const EARTH_EQUATORIAL_RADIUS_M: f64 = 6_378_137.0;

/// A longitude/latitude pair in degrees, GeoJSON axis order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude in degrees (-180.0 to 180.0).
    pub lng: f64,
    /// Latitude in degrees (-90.0 to 90.0).
    pub lat: f64,
}

impl LngLat {
    /// Creates a coordinate from longitude and latitude in degrees.
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Returns the coordinate as a GeoJSON position (`[lng, lat]`).
    #[inline]
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }
}

/// Computes the great-circle distance between two coordinates in meters.
///
/// Haversine formula on the mean-radius sphere. Accuracy is well within a
/// meter at the few-hundred-meter scale the recenter threshold operates on.
///
/// # Arguments
///
/// * `a` - First coordinate
/// * `b` - Second coordinate
///
/// # Returns
///
/// Distance in meters along the great circle through both points.
#[inline]
pub fn haversine_distance_m(a: LngLat, b: LngLat) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_MEAN_RADIUS_M * h.sqrt().asin()
}

/// Computes the point reached by travelling `distance_m` meters from `origin`
/// along `bearing_deg` (clockwise from true north).
///
/// Spherical forward solution on the WGS84 equatorial sphere. The resulting
/// longitude is normalized into [-180, 180), so geometry built near the
/// antimeridian stays in range.
///
/// # Arguments
///
/// * `origin` - Starting coordinate
/// * `distance_m` - Distance to travel in meters
/// * `bearing_deg` - Initial bearing in degrees, clockwise from north
#[inline]
pub fn destination_point(origin: LngLat, distance_m: f64, bearing_deg: f64) -> LngLat {
    let angular = distance_m / EARTH_EQUATORIAL_RADIUS_M;
    let bearing = bearing_deg.to_radians();
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lng2 = lng1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    LngLat::new(normalize_lng(lng2.to_degrees()), lat2.to_degrees())
}

/// Wraps a longitude in degrees into the range [-180, 180).
#[inline]
pub fn normalize_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}
