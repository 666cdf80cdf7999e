//! User location module
//!
//! Carries the immutable [`LocationFix`] snapshot delivered by the host's
//! positioning source, the geometry builder that turns a fix into the
//! role-tagged location overlay ([`geometry`]), and the recenter gate that
//! decides when follow mode moves the camera ([`follow`]).

mod follow;
pub mod geometry;

pub use follow::{
    FollowConfig, FollowGate, FOLLOW_ANIMATION, FOLLOW_RECENTER_DISTANCE_M,
    FOLLOW_RECENTER_INTERVAL,
};
pub use geometry::{location_features, FeatureRole};

use serde::{Deserialize, Serialize};

use crate::geo::LngLat;

/// One positioning readout.
///
/// Fixes are value snapshots: a new readout replaces the previous fix rather
/// than mutating it, so the recenter gate can compare the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Position of the fix.
    pub coordinates: LngLat,

    /// Horizontal accuracy radius in meters, when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    /// Travel heading in degrees clockwise from north, when moving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,

    /// Source timestamp in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl LocationFix {
    /// Creates a bare fix with only a position.
    pub fn new(coordinates: LngLat) -> Self {
        Self {
            coordinates,
            accuracy: None,
            heading: None,
            timestamp: None,
        }
    }

    /// Sets the accuracy radius in meters.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Sets the heading in degrees clockwise from north.
    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    /// Sets the source timestamp in epoch milliseconds.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
