//! Local image cache.
//!
//! Maps remote image URLs to files in a single cache directory, downloading
//! each at most once no matter how many callers ask for it concurrently.

mod entry;
mod error;
pub(crate) mod fetcher;
mod image_cache;
mod key;

pub use entry::{CacheEntry, CacheStats, EntryState};
pub use error::{CacheError, CacheFailure};
pub use fetcher::{ImageFetcher, ReqwestFetcher};
pub use image_cache::{DiskUsage, ImageCache, DEFAULT_DOWNLOAD_CONCURRENCY};
pub use key::cache_key;
