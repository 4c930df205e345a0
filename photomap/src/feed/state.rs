//! Observable feed state.

use std::collections::HashSet;
use std::fmt;

use crate::geo::{Coordinate, ViewportRegion};
use crate::photo::Photo;

/// Where the controller is in its fetch cycle.
///
/// ```text
/// Idle ──region──► PendingDebounce ──deadline──► Fetching ──done──► Idle
///                        ▲                           │
///                        └────────region─────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    PendingDebounce,
    Fetching,
}

impl FetchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchPhase::Idle => "idle",
            FetchPhase::PendingDebounce => "pending_debounce",
            FetchPhase::Fetching => "fetching",
        }
    }
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of one feed, owned by the controller and read by observers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    /// Region of the most recently started fetch (`None` for a global fetch).
    pub current_region: Option<ViewportRegion>,
    /// Photos of the last successful fetch, unique by id.
    pub photos: Vec<Photo>,
    pub is_loading: bool,
    /// A region change is waiting out the debounce delay.
    pub is_fetch_pending: bool,
    /// Incremented each time `photos` actually changes.
    pub revision: u64,
}

impl FeedState {
    pub fn phase(&self) -> FetchPhase {
        if self.is_loading {
            FetchPhase::Fetching
        } else if self.is_fetch_pending {
            FetchPhase::PendingDebounce
        } else {
            FetchPhase::Idle
        }
    }

    /// Replace the photo set with `photos`, deduplicated by id.
    ///
    /// Returns `false` and leaves the state untouched when the new set is
    /// identical to the current one.
    pub fn apply_photos(&mut self, photos: Vec<Photo>) -> bool {
        let mut seen = HashSet::with_capacity(photos.len());
        let photos: Vec<Photo> = photos
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .collect();

        if photos == self.photos {
            return false;
        }
        self.photos = photos;
        self.revision += 1;
        true
    }

    /// Image URLs worth pre-warming: one preview per photo.
    pub fn preview_urls(&self) -> Vec<String> {
        self.photos
            .iter()
            .filter_map(|p| p.preview_url())
            .map(str::to_string)
            .collect()
    }
}

/// Whether the viewed region has wandered away from the user.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeviationState {
    pub user_location: Option<Coordinate>,
    pub is_deviated: bool,
}
