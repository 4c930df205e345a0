//! Location deviation monitoring.
//!
//! Tracks how far the viewed region's center is from the user's real
//! location and signals when a "return to my location" affordance should be
//! shown or hidden. Runs on every region change, undebounced.

use std::fmt;

use tracing::debug;

use super::state::DeviationState;
use crate::geo::{distance_km, Coordinate, ViewportRegion};

/// Default distance beyond which the view counts as deviated.
pub const DEFAULT_DEVIATION_THRESHOLD_KM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviationSignal {
    ShowReturnButton,
    HideReturnButton,
}

impl fmt::Display for DeviationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviationSignal::ShowReturnButton => write!(f, "show return button"),
            DeviationSignal::HideReturnButton => write!(f, "hide return button"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationDeviationMonitor {
    threshold_km: f64,
    state: DeviationState,
}

impl LocationDeviationMonitor {
    pub fn new(threshold_km: f64) -> Self {
        Self {
            threshold_km,
            state: DeviationState::default(),
        }
    }

    pub fn threshold_km(&self) -> f64 {
        self.threshold_km
    }

    pub fn state(&self) -> DeviationState {
        self.state
    }

    /// Store the device's most recent true location.
    pub fn update_user_location(&mut self, location: Coordinate) {
        self.state.user_location = Some(location);
    }

    /// Compare `region`'s center against the user's location.
    ///
    /// Emits a signal only on a transition. Strictly greater than the
    /// threshold counts as deviated; exactly at the threshold does not.
    pub fn evaluate_region(&mut self, region: &ViewportRegion) -> Option<DeviationSignal> {
        let user = self.state.user_location?;
        let distance = distance_km(region.center(), user);
        let deviated = distance > self.threshold_km;

        if deviated == self.state.is_deviated {
            return None;
        }
        self.state.is_deviated = deviated;
        debug!(distance_km = distance, deviated, "Deviation changed");

        Some(if deviated {
            DeviationSignal::ShowReturnButton
        } else {
            DeviationSignal::HideReturnButton
        })
    }

    /// Where the map should re-center, if the user's location is known.
    pub fn return_to_user_location(&self) -> Option<Coordinate> {
        self.state.user_location
    }

    pub fn reset(&mut self) {
        self.state = DeviationState::default();
    }
}

impl Default for LocationDeviationMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_DEVIATION_THRESHOLD_KM)
    }
}
