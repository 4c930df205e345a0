//! Feed controller configuration.

use std::time::Duration;

use super::debounce::DEFAULT_DEBOUNCE;
use super::deviation::DEFAULT_DEVIATION_THRESHOLD_KM;
use crate::repository::DEFAULT_NEARBY_RADIUS_KM;

/// Default capacity of the controller's command channel.
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;

/// Default capacity of the feed event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Quiet period after the last region change before fetching.
    pub debounce: Duration,

    /// Distance from the user beyond which the view counts as deviated.
    pub deviation_threshold_km: f64,

    /// Download previews of fetched photos in the background.
    pub prewarm_images: bool,

    /// Radius for "photos near me" queries.
    pub nearby_radius_km: f64,

    pub command_capacity: usize,
    pub event_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            deviation_threshold_km: DEFAULT_DEVIATION_THRESHOLD_KM,
            prewarm_images: true,
            nearby_radius_km: DEFAULT_NEARBY_RADIUS_KM,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl FeedConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_deviation_threshold_km(mut self, km: f64) -> Self {
        self.deviation_threshold_km = km;
        self
    }

    pub fn with_prewarm_images(mut self, enabled: bool) -> Self {
        self.prewarm_images = enabled;
        self
    }

    pub fn with_nearby_radius_km(mut self, km: f64) -> Self {
        self.nearby_radius_km = km;
        self
    }
}
