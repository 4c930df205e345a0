//! Application bootstrap and lifecycle.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 PhotoMapApp                   │
//! │                                               │
//! │  BackendConfig ──► MemoryBackend | RestBackend│
//! │                        └──► PhotoRepository ──┼──┐
//! │  CacheConfig ────► ImageCache (ReqwestFetcher)┼──┤
//! │                                               │  ▼
//! │  FeedConfig ─────────────────────────► open_feed() ─► FeedHandle
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use photomap::app::{AppConfig, PhotoMapApp};
//!
//! let app = PhotoMapApp::start(AppConfig::default()).await?;
//! let feed = app.open_feed();
//! feed.fetch_now(None).await?;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::PhotoMapApp;
pub use config::{AppConfig, BackendConfig, CacheConfig};
pub use error::AppError;
