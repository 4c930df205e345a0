//! Region-driven photo feed.
//!
//! A feed follows the visible map region: region changes are debounced,
//! fetched through the [`PhotoRepository`](crate::repository::PhotoRepository)
//! one at a time, and published as a [`FeedState`] snapshot. Alongside it, a
//! [`LocationDeviationMonitor`] reports when the view has wandered away from
//! the user.

mod config;
mod controller;
mod debounce;
mod deviation;
mod events;
mod handle;
mod state;

pub use config::{FeedConfig, DEFAULT_COMMAND_CAPACITY, DEFAULT_EVENT_CAPACITY};
pub use controller::RegionFetchController;
pub use debounce::{RegionDebouncer, DEFAULT_DEBOUNCE};
pub use deviation::{DeviationSignal, LocationDeviationMonitor, DEFAULT_DEVIATION_THRESHOLD_KM};
pub use events::FeedEvent;
pub use handle::{FeedClosed, FeedHandle};
pub use state::{DeviationState, FeedState, FetchPhase};
