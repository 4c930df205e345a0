//! Content-addressed image cache with single-flight downloads.
//!
//! Files live flat in one directory, named by [`cache_key`]. At most one
//! download per URL is in flight at a time: the first caller becomes the
//! leader and performs the download, later callers subscribe to the leader's
//! broadcast and receive the same outcome.
//!
//! ```text
//! ensure_cached(url)
//!        │
//!        ▼
//!   Ready entry? ──yes──► path (no I/O)
//!        │ no
//!        ▼
//!   in flight? ──yes──► wait for leader's outcome
//!        │ no
//!        ▼
//!   register as leader ─► adopt file on disk, or download ─► temp file ─► rename
//! ```

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::{broadcast, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::entry::{CacheEntry, CacheStats, EntryState};
use super::error::{CacheError, CacheFailure};
use super::fetcher::ImageFetcher;
use super::key::cache_key;

type CacheOutcome = Result<PathBuf, CacheError>;

/// Default cap on simultaneous background downloads, also the default
/// concurrency for [`ImageCache::ensure_cached_stream`].
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 4;

/// Local disk cache of remote images.
///
/// Cheap to clone; clones share the same entries and in-flight table.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<Inner>,
}

struct Inner {
    directory: PathBuf,
    fetcher: Arc<dyn ImageFetcher>,
    entries: DashMap<String, CacheEntry>,
    in_flight: DashMap<String, broadcast::Sender<CacheOutcome>>,
    downloads: AtomicU64,
    /// Permits for pre-warm tasks; `ensure_cached` callers are not limited.
    prewarm_permits: Semaphore,
    prewarm_concurrency: usize,
}

/// File count and total size of the cache directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskUsage {
    pub files: u64,
    pub bytes: u64,
}

impl ImageCache {
    /// Open (creating if needed) a cache rooted at `directory`.
    pub async fn open(
        directory: impl Into<PathBuf>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> io::Result<Self> {
        Self::open_with_concurrency(directory, fetcher, DEFAULT_DOWNLOAD_CONCURRENCY).await
    }

    /// Open a cache whose background pre-warm runs at most `concurrency`
    /// downloads at once (minimum 1).
    pub async fn open_with_concurrency(
        directory: impl Into<PathBuf>,
        fetcher: Arc<dyn ImageFetcher>,
        concurrency: usize,
    ) -> io::Result<Self> {
        let directory = directory.into();
        let concurrency = concurrency.max(1);
        tokio::fs::create_dir_all(&directory).await?;
        info!(directory = %directory.display(), concurrency, "Image cache opened");

        Ok(Self {
            inner: Arc::new(Inner {
                directory,
                fetcher,
                entries: DashMap::new(),
                in_flight: DashMap::new(),
                downloads: AtomicU64::new(0),
                prewarm_permits: Semaphore::new(concurrency),
                prewarm_concurrency: concurrency,
            }),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.inner.directory
    }

    /// Maximum number of pre-warm downloads running at once.
    pub fn prewarm_concurrency(&self) -> usize {
        self.inner.prewarm_concurrency
    }

    /// Where `url` is (or would be) stored.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.inner.directory.join(cache_key(url))
    }

    /// Current bookkeeping for `url`, if it has ever been requested.
    pub fn entry(&self, url: &str) -> Option<CacheEntry> {
        self.inner
            .entries
            .get(&cache_key(url))
            .map(|e| e.value().clone())
    }

    pub fn is_ready(&self, url: &str) -> bool {
        self.ready_path(&cache_key(url)).is_some()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            downloads: self.inner.downloads.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        for entry in self.inner.entries.iter() {
            match entry.state {
                EntryState::Ready => stats.ready += 1,
                EntryState::Pending => stats.pending += 1,
                EntryState::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Make sure `url` is on disk and return its local path.
    ///
    /// A `Ready` entry returns immediately without touching the network or
    /// the filesystem. Concurrent callers for the same URL share a single
    /// download. A failed URL is retried on the next call.
    pub async fn ensure_cached(&self, url: &str) -> Result<PathBuf, CacheError> {
        let key = cache_key(url);
        if let Some(path) = self.ready_path(&key) {
            return Ok(path);
        }

        let registration = match self.inner.in_flight.entry(key.clone()) {
            Entry::Occupied(slot) => Err(slot.get().subscribe()),
            Entry::Vacant(slot) => {
                let (sender, _) = broadcast::channel(1);
                slot.insert(sender.clone());
                Ok(sender)
            }
        };

        let sender = match registration {
            Ok(sender) => sender,
            Err(mut receiver) => {
                debug!(url, "Download coalesced - waiting for in-flight request");
                return match receiver.recv().await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(CacheError::new(url, CacheFailure::Interrupted)),
                };
            }
        };

        let leader = LeaderGuard {
            inner: &self.inner,
            key: &key,
            url,
            sender: Some(sender),
        };

        // A previous leader may have finished between the first check and
        // registration.
        let outcome = match self.ready_path(&key) {
            Some(path) => Ok(path),
            None => self.download(url, &key).await,
        };

        leader.complete(outcome.clone());
        outcome
    }

    /// Pre-warm `urls` in the background.
    ///
    /// Spawns one task per distinct URL not already `Ready` and returns the
    /// number spawned. Tasks queue for one of
    /// [`prewarm_concurrency`](Self::prewarm_concurrency) permits before
    /// downloading. Failures are logged and never surface to the caller.
    /// Cancelling `cancellation` abandons queued and running downloads.
    pub fn ensure_cached_batch<I, S>(&self, urls: I, cancellation: &CancellationToken) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut spawned = 0;

        for url in urls {
            let url = url.into();
            if !seen.insert(url.clone()) || self.is_ready(&url) {
                continue;
            }

            let cache = self.clone();
            let token = cancellation.clone();
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(url = %url, "Pre-warm download cancelled");
                    }
                    result = cache.prewarm_one(&url) => {
                        if let Err(e) = result {
                            warn!(url = %url, error = %e.cause, "Pre-warm download failed");
                        }
                    }
                }
            });
            spawned += 1;
        }

        if spawned > 0 {
            debug!(count = spawned, "Pre-warming images");
        }
        spawned
    }

    async fn prewarm_one(&self, url: &str) -> Result<PathBuf, CacheError> {
        let _permit = self
            .inner
            .prewarm_permits
            .acquire()
            .await
            .map_err(|_| CacheError::new(url, CacheFailure::Interrupted))?;
        self.ensure_cached(url).await
    }

    /// Cache `urls` with bounded concurrency, yielding each outcome as it
    /// completes.
    pub fn ensure_cached_stream(
        &self,
        urls: Vec<String>,
        concurrency: usize,
    ) -> impl Stream<Item = (String, Result<PathBuf, CacheError>)> + '_ {
        stream::iter(urls)
            .map(move |url| async move {
                let result = self.ensure_cached(&url).await;
                (url, result)
            })
            .buffer_unordered(concurrency.max(1))
    }

    /// Remove every cached file and forget finished entries.
    ///
    /// Downloads still in flight are left alone. Returns the number of files
    /// removed.
    pub async fn clear(&self) -> io::Result<usize> {
        let mut removed = 0;
        let mut dir = tokio::fs::read_dir(&self.inner.directory).await?;
        while let Some(item) = dir.next_entry().await? {
            if is_temp_file(&item.file_name()) || !item.file_type().await?.is_file() {
                continue;
            }
            tokio::fs::remove_file(item.path()).await?;
            removed += 1;
        }

        self.inner
            .entries
            .retain(|_, entry| entry.state == EntryState::Pending);
        info!(removed, "Image cache cleared");
        Ok(removed)
    }

    /// Count the files in the cache directory and their total size.
    pub async fn disk_usage(&self) -> io::Result<DiskUsage> {
        let mut usage = DiskUsage::default();
        let mut dir = tokio::fs::read_dir(&self.inner.directory).await?;
        while let Some(item) = dir.next_entry().await? {
            if is_temp_file(&item.file_name()) {
                continue;
            }
            let metadata = item.metadata().await?;
            if metadata.is_file() {
                usage.files += 1;
                usage.bytes += metadata.len();
            }
        }
        Ok(usage)
    }

    fn ready_path(&self, key: &str) -> Option<PathBuf> {
        self.inner
            .entries
            .get(key)
            .filter(|e| e.state == EntryState::Ready)
            .map(|e| e.local_path.clone())
    }

    fn set_state(&self, key: &str, url: &str, path: &Path, state: EntryState) {
        self.inner.entries.insert(
            key.to_string(),
            CacheEntry {
                source_url: url.to_string(),
                local_path: path.to_path_buf(),
                state,
            },
        );
    }

    async fn download(&self, url: &str, key: &str) -> CacheOutcome {
        let path = self.inner.directory.join(key);
        self.set_state(key, url, &path, EntryState::Pending);

        // Files written by an earlier run are adopted as-is.
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(url, path = %path.display(), "Adopted existing cache file");
            self.set_state(key, url, &path, EntryState::Ready);
            return Ok(path);
        }

        self.inner.downloads.fetch_add(1, Ordering::Relaxed);
        let result = async {
            let bytes = self.inner.fetcher.fetch(url).await?;
            self.write_atomically(key, &path, &bytes).await?;
            Ok::<usize, CacheFailure>(bytes.len())
        }
        .await;

        match result {
            Ok(size) => {
                debug!(url, path = %path.display(), size, "Image cached");
                self.set_state(key, url, &path, EntryState::Ready);
                Ok(path)
            }
            Err(cause) => {
                warn!(url, error = %cause, "Image download failed");
                self.set_state(key, url, &path, EntryState::Failed);
                Err(CacheError::new(url, cause))
            }
        }
    }

    /// Write to a uniquely named temp file and rename it into place, so the
    /// final path never holds a partial image.
    async fn write_atomically(&self, key: &str, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let temp = self
            .inner
            .directory
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));

        let written = async {
            tokio::fs::write(&temp, bytes).await?;
            tokio::fs::rename(&temp, path).await
        }
        .await;

        if written.is_err() {
            let _ = tokio::fs::remove_file(&temp).await;
        }
        written
    }
}

fn is_temp_file(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Owns the in-flight slot for one URL.
///
/// Dropping it without calling [`complete`](Self::complete) (the leader's
/// task was cancelled) releases the slot and marks the entry failed, so
/// waiters see `Interrupted` and the next caller starts a fresh download.
struct LeaderGuard<'a> {
    inner: &'a Inner,
    key: &'a str,
    url: &'a str,
    sender: Option<broadcast::Sender<CacheOutcome>>,
}

impl LeaderGuard<'_> {
    fn complete(mut self, outcome: CacheOutcome) {
        self.inner.in_flight.remove(self.key);
        if let Some(sender) = self.sender.take() {
            // No subscribers is fine.
            let _ = sender.send(outcome);
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        self.inner.in_flight.remove(self.key);
        if let Some(mut entry) = self.inner.entries.get_mut(self.key) {
            if entry.state == EntryState::Pending {
                entry.state = EntryState::Failed;
            }
        }
        debug!(url = self.url, "Download abandoned");
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("directory", &self.inner.directory)
            .field("entries", &self.inner.entries.len())
            .field("in_flight", &self.inner.in_flight.len())
            .field("prewarm_concurrency", &self.inner.prewarm_concurrency)
            .finish()
    }
}
