//! Follow-mode recenter gating.
//!
//! When follow mode is on, every location fix is a candidate for moving the
//! camera. Recentering on each fix would fight the renderer's animations and
//! make the map feel jittery, so [`FollowGate`] applies one policy:
//!
//! - at most one recenter per [`FollowConfig::recenter_interval`], and
//! - only when the fix moved at least [`FollowConfig::min_displacement_m`]
//!   from the previous one (a first fix always qualifies).
//!
//! The decision is pure: callers ask [`FollowGate::should_recenter`] with an
//! explicit `now` and report performed recenters through
//! [`FollowGate::mark_recentered`]. Explicit timestamps keep the gate fully
//! deterministic under test.

use std::time::{Duration, Instant};

use super::LocationFix;
use crate::geo::haversine_distance_m;

/// Minimum pause between two follow recenters.
pub const FOLLOW_RECENTER_INTERVAL: Duration = Duration::from_millis(900);

/// Minimum displacement that justifies a follow recenter, in meters.
pub const FOLLOW_RECENTER_DISTANCE_M: f64 = 12.0;

/// Animation length of an eased follow recenter.
pub const FOLLOW_ANIMATION: Duration = Duration::from_millis(600);

/// Tuning for the follow-mode recenter gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowConfig {
    /// Minimum pause between recenters.
    pub recenter_interval: Duration,

    /// Minimum displacement from the previous fix, in meters.
    pub min_displacement_m: f64,

    /// Animation length used for eased recenters.
    pub ease_duration: Duration,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            recenter_interval: FOLLOW_RECENTER_INTERVAL,
            min_displacement_m: FOLLOW_RECENTER_DISTANCE_M,
            ease_duration: FOLLOW_ANIMATION,
        }
    }
}

impl FollowConfig {
    /// Sets the minimum pause between recenters.
    pub fn with_recenter_interval(mut self, interval: Duration) -> Self {
        self.recenter_interval = interval;
        self
    }

    /// Sets the minimum displacement in meters.
    pub fn with_min_displacement_m(mut self, meters: f64) -> Self {
        self.min_displacement_m = meters;
        self
    }

    /// Sets the ease animation length.
    pub fn with_ease_duration(mut self, duration: Duration) -> Self {
        self.ease_duration = duration;
        self
    }
}

/// Rate- and displacement-gate for follow-mode recentering.
#[derive(Debug)]
pub struct FollowGate {
    config: FollowConfig,
    /// When the camera last recentered on the user; `None` until the first
    /// recenter, which therefore passes the interval check.
    last_recenter: Option<Instant>,
}

impl FollowGate {
    /// Creates a gate that has never recentered.
    pub fn new(config: FollowConfig) -> Self {
        Self {
            config,
            last_recenter: None,
        }
    }

    /// The gate's tuning.
    pub fn config(&self) -> &FollowConfig {
        &self.config
    }

    /// When the camera last recentered, if ever.
    pub fn last_recenter(&self) -> Option<Instant> {
        self.last_recenter
    }

    /// Decides whether a fix justifies recentering the camera.
    ///
    /// Returns `false` inside the pause window regardless of displacement.
    /// Outside it, a fix with no predecessor always qualifies; otherwise the
    /// displacement from `previous` must reach the configured minimum.
    pub fn should_recenter(
        &self,
        previous: Option<&LocationFix>,
        next: &LocationFix,
        now: Instant,
    ) -> bool {
        if let Some(last) = self.last_recenter {
            if now.duration_since(last) < self.config.recenter_interval {
                return false;
            }
        }

        let Some(previous) = previous else {
            return true;
        };

        let displacement = haversine_distance_m(previous.coordinates, next.coordinates);
        displacement >= self.config.min_displacement_m
    }

    /// Records that the camera recentered, restarting the pause window.
    ///
    /// Every recenter counts, including immediate jumps performed when
    /// follow mode is switched on.
    pub fn mark_recentered(&mut self, now: Instant) {
        self.last_recenter = Some(now);
    }
}

impl Default for FollowGate {
    fn default() -> Self {
        Self::new(FollowConfig::default())
    }
}
