//! PhotoMap - region-aware photo feed for a map of geotagged photos.
//!
//! The library decides when to (re)fetch photos as a map viewport moves,
//! deduplicates redundant fetches, pre-warms a local image cache for the
//! returned thumbnails and tells the presentation layer when the viewport has
//! wandered far from the user's real position.
//!
//! # Architecture
//!
//! ```text
//! region change ──► FeedHandle ──► RegionFetchController (actor)
//!                                     │        │          │
//!                                     │        │          └──► LocationDeviationMonitor
//!                                     │        ▼
//!                                     │   PhotoRepository ──► PhotoBackend (memory / REST)
//!                                     ▼
//!                                 ImageCache ──► ImageFetcher (HTTP) ──► flat cache dir
//! ```
//!
//! [`app::PhotoMapApp`] is the composition root that wires these together
//! from an [`app::AppConfig`].

pub mod app;
pub mod cache;
pub mod config;
pub mod feed;
pub mod geo;
pub mod logging;
pub mod photo;
pub mod repository;

/// Crate version, used in the HTTP user agent and log banners.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
