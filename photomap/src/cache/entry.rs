//! Cache entry bookkeeping.

use std::fmt;
use std::path::PathBuf;

/// Lifecycle of a cached URL.
///
/// `Pending -> Ready` on a successful download, `Pending -> Failed` on error.
/// `Failed` is terminal until someone asks for the URL again, which moves it
/// back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Ready,
    Failed,
}

impl EntryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryState::Pending => "pending",
            EntryState::Ready => "ready",
            EntryState::Failed => "failed",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One remote image and where it lives locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_url: String,
    pub local_path: PathBuf,
    pub state: EntryState,
}

/// Point-in-time counts of cache entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub ready: usize,
    pub pending: usize,
    pub failed: usize,
    /// Downloads started since the cache was opened.
    pub downloads: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ready, {} pending, {} failed ({} downloads)",
            self.ready, self.pending, self.failed, self.downloads
        )
    }
}
