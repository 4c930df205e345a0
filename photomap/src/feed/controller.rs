//! Region fetch controller.
//!
//! One controller task owns one feed. Everything that changes its state
//! (region changes, the debounce deadline, fetch completions, user location
//! updates) arrives as a discrete wake-up in a single `select!` loop, so the
//! state needs no locking.
//!
//! # Architecture
//!
//! ```text
//!  FeedHandle ──commands──► ┌──────────────────────────────┐
//!                           │  RegionFetchController loop  │
//!                           │                              │
//!                           │  RegionDebouncer  ──deadline─┼──► start fetch
//!                           │  DeviationMonitor            │        │
//!                           │  in-flight fetch (≤ 1) ◄─────┼────────┘
//!                           └──────┬───────────────┬───────┘
//!                                  │               │
//!                     watch<FeedState>    broadcast<FeedEvent>
//!                                  │
//!                                  └──► ImageCache::ensure_cached_batch
//! ```
//!
//! At most one fetch is in flight. A region that becomes due while a fetch is
//! running is dropped rather than queued; the next live region change starts
//! a new cycle.

use std::future;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::FeedConfig;
use super::debounce::RegionDebouncer;
use super::deviation::LocationDeviationMonitor;
use super::events::{FeedCommand, FeedEvent};
use super::handle::FeedHandle;
use super::state::{DeviationState, FeedState};
use crate::cache::ImageCache;
use crate::geo::ViewportRegion;
use crate::photo::Photo;
use crate::repository::{PhotoRepository, RepositoryError, RepositoryResult};

/// The feed actor. Created and started with [`RegionFetchController::spawn`].
pub struct RegionFetchController {
    config: FeedConfig,
    repository: PhotoRepository,
    cache: Option<ImageCache>,

    commands: mpsc::Receiver<FeedCommand>,
    state: watch::Sender<FeedState>,
    deviation: watch::Sender<DeviationState>,
    events: broadcast::Sender<FeedEvent>,

    debouncer: RegionDebouncer,
    monitor: LocationDeviationMonitor,

    /// The single outstanding fetch, if any.
    in_flight: Option<InFlightFetch>,

    /// Sequence number of the most recently issued fetch.
    sequence: u64,

    shutdown: CancellationToken,
    /// Child of `shutdown`; cancels background image downloads.
    prewarm: CancellationToken,
}

struct InFlightFetch {
    sequence: u64,
    region: Option<ViewportRegion>,
    handle: JoinHandle<RepositoryResult<Vec<Photo>>>,
}

struct FetchCompletion {
    sequence: u64,
    region: Option<ViewportRegion>,
    joined: Result<RepositoryResult<Vec<Photo>>, JoinError>,
}

enum Wake {
    Shutdown,
    Command(Option<FeedCommand>),
    FetchFinished(FetchCompletion),
    DebounceElapsed,
}

impl RegionFetchController {
    /// Start a controller task and return a handle to it.
    ///
    /// Must be called from within a tokio runtime. `cache` is used for
    /// pre-warming previews when `config.prewarm_images` is set.
    pub fn spawn(
        config: FeedConfig,
        repository: PhotoRepository,
        cache: Option<ImageCache>,
    ) -> FeedHandle {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(FeedState::default());
        let (deviation_tx, deviation_rx) = watch::channel(DeviationState::default());
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let shutdown = CancellationToken::new();

        let controller = Self {
            debouncer: RegionDebouncer::new(config.debounce),
            monitor: LocationDeviationMonitor::new(config.deviation_threshold_km),
            config,
            repository,
            cache,
            commands: command_rx,
            state: state_tx,
            deviation: deviation_tx,
            events: event_tx.clone(),
            in_flight: None,
            sequence: 0,
            prewarm: shutdown.child_token(),
            shutdown: shutdown.clone(),
        };

        info!(
            backend = controller.repository.backend_name(),
            debounce_ms = controller.config.debounce.as_millis() as u64,
            prewarm = controller.config.prewarm_images && controller.cache.is_some(),
            "Feed controller started"
        );
        tokio::spawn(controller.run());

        FeedHandle::new(command_tx, state_rx, deviation_rx, event_tx, shutdown)
    }

    async fn run(mut self) {
        loop {
            let deadline = self.debouncer.deadline();

            let wake = tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => Wake::Shutdown,

                command = self.commands.recv() => Wake::Command(command),

                completion = wait_for_fetch(&mut self.in_flight) => Wake::FetchFinished(completion),

                _ = sleep_until_deadline(deadline) => Wake::DebounceElapsed,
            };

            match wake {
                Wake::Shutdown | Wake::Command(None) => break,
                Wake::Command(Some(command)) => self.handle_command(command),
                Wake::FetchFinished(completion) => self.finish_fetch(completion),
                Wake::DebounceElapsed => self.on_debounce_elapsed(),
            }
        }

        self.teardown();
    }

    fn handle_command(&mut self, command: FeedCommand) {
        match command {
            FeedCommand::RegionChanged(region) => self.on_region_changed(region),
            FeedCommand::FetchNow(region) => {
                if self.in_flight.is_some() {
                    self.suppress(region);
                } else {
                    self.start_fetch(region);
                }
            }
            FeedCommand::UserLocation(location) => {
                self.monitor.update_user_location(location);
                self.publish_deviation();
            }
            FeedCommand::ReturnToUser(reply) => {
                let _ = reply.send(self.monitor.return_to_user_location());
            }
            FeedCommand::Barrier(reply) => {
                let _ = reply.send(());
            }
        }
    }

    fn on_region_changed(&mut self, region: ViewportRegion) {
        // Deviation feedback is immediate; only fetching is debounced.
        if let Some(signal) = self.monitor.evaluate_region(&region) {
            self.publish_deviation();
            self.emit(FeedEvent::Deviation(signal));
        }

        let superseded = self.debouncer.record(region, Instant::now());
        debug!(
            lat = region.center().latitude,
            lon = region.center().longitude,
            superseded,
            "Region changed"
        );

        self.state.send_if_modified(|state| {
            let was_pending = state.is_fetch_pending;
            state.is_fetch_pending = true;
            !was_pending
        });
    }

    fn on_debounce_elapsed(&mut self) {
        let Some(region) = self.debouncer.take_due(Instant::now()) else {
            return;
        };

        if self.in_flight.is_some() {
            self.state.send_if_modified(|state| {
                let was_pending = state.is_fetch_pending;
                state.is_fetch_pending = false;
                was_pending
            });
            self.suppress(Some(region));
        } else {
            self.start_fetch(Some(region));
        }
    }

    fn suppress(&mut self, region: Option<ViewportRegion>) {
        debug!(
            in_flight = self.in_flight.as_ref().map(|f| f.sequence),
            "Fetch in flight, dropping request"
        );
        self.emit(FeedEvent::FetchSuppressed { region });
    }

    fn start_fetch(&mut self, region: Option<ViewportRegion>) {
        self.sequence += 1;
        let sequence = self.sequence;

        let repository = self.repository.clone();
        let handle = tokio::spawn(async move {
            match region {
                Some(region) => repository.fetch_by_region(&region).await,
                None => repository.fetch_all().await,
            }
        });
        self.in_flight = Some(InFlightFetch {
            sequence,
            region,
            handle,
        });

        // One update, so observers never see an idle gap between the
        // debounce ending and the fetch starting.
        let pending = self.debouncer.is_pending();
        self.state.send_modify(|state| {
            state.current_region = region;
            state.is_loading = true;
            state.is_fetch_pending = pending;
        });
        debug!(sequence, global = region.is_none(), "Fetch started");
        self.emit(FeedEvent::FetchStarted { sequence, region });
    }

    fn finish_fetch(&mut self, completion: FetchCompletion) {
        let FetchCompletion {
            sequence,
            region,
            joined,
        } = completion;

        let result = joined.unwrap_or_else(|e| {
            Err(RepositoryError::Backend(format!("Fetch task failed: {}", e)))
        });

        // A fetch only starts with the slot empty, so the completion always
        // belongs to the newest sequence.
        debug_assert_eq!(sequence, self.sequence);

        match result {
            Ok(photos) => {
                let count = photos.len();
                let mut changed = false;
                let mut revision = 0;
                self.state.send_if_modified(|state| {
                    let was_loading = std::mem::replace(&mut state.is_loading, false);
                    changed = state.apply_photos(photos);
                    revision = state.revision;
                    was_loading || changed
                });

                if changed {
                    info!(sequence, count, revision, "Feed updated");
                    self.emit(FeedEvent::PhotosUpdated { revision, count });
                } else {
                    debug!(sequence, count, "Fetch returned unchanged photos");
                }
                self.prewarm_previews();
            }
            Err(error) => {
                warn!(sequence, error = %error, "Photo fetch failed");
                self.state
                    .send_if_modified(|state| std::mem::replace(&mut state.is_loading, false));
                self.emit(FeedEvent::FetchFailed { region, error });
            }
        }
    }

    fn prewarm_previews(&self) {
        if !self.config.prewarm_images {
            return;
        }
        if let Some(cache) = &self.cache {
            let urls = self.state.borrow().preview_urls();
            cache.ensure_cached_batch(urls, &self.prewarm);
        }
    }

    fn publish_deviation(&self) {
        let next = self.monitor.state();
        self.deviation.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn emit(&self, event: FeedEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn teardown(&mut self) {
        self.shutdown.cancel();
        self.debouncer.cancel();
        if let Some(fetch) = self.in_flight.take() {
            debug!(sequence = fetch.sequence, "Aborting in-flight fetch");
            fetch.handle.abort();
        }
        self.monitor.reset();
        self.state.send_replace(FeedState::default());
        self.deviation.send_replace(DeviationState::default());
        info!("Feed controller stopped");
    }
}

/// Resolve when the in-flight fetch finishes, clearing the slot. Pending
/// forever when nothing is in flight.
async fn wait_for_fetch(slot: &mut Option<InFlightFetch>) -> FetchCompletion {
    let Some(fetch) = slot.as_mut() else {
        return future::pending().await;
    };
    let (sequence, region) = (fetch.sequence, fetch.region);
    let joined = (&mut fetch.handle).await;
    *slot = None;
    FetchCompletion {
        sequence,
        region,
        joined,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::fetcher::tests::StubFetcher;
    use crate::cache::{CacheFailure, EntryState};
    use crate::feed::{DeviationSignal, FetchPhase};
    use crate::geo::{Coordinate, GeoBounds, EARTH_RADIUS_KM};
    use crate::photo::{NewPhotoInput, Profile, ProfileUpdate};
    use crate::repository::{BoxFuture, MemoryBackend, PhotoBackend};
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    fn photo_at(id: &str, lat: f64, lon: f64) -> Photo {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        Photo {
            id: id.to_string(),
            owner_id: "u1".to_string(),
            title: id.to_string(),
            description: None,
            coordinate: Coordinate::new(lat, lon),
            location_name: String::new(),
            image_urls: vec![format!("https://cdn.example.com/{}.jpg", id)],
            thumbnail_url: None,
            metadata: None,
            owner: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn region_at(lat: f64, lon: f64) -> ViewportRegion {
        ViewportRegion::new(Coordinate::new(lat, lon), 1.0, 1.0)
    }

    /// Answers every list call with the next scripted result.
    struct ScriptedBackend {
        results: Mutex<VecDeque<RepositoryResult<Vec<Photo>>>>,
    }

    impl ScriptedBackend {
        fn new(results: Vec<RepositoryResult<Vec<Photo>>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
            }
        }

        fn next(&self) -> RepositoryResult<Vec<Photo>> {
            self.results
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    impl PhotoBackend for ScriptedBackend {
        fn list_all(&self) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
            Box::pin(async move { self.next() })
        }
        fn list_in_bounds(&self, _: GeoBounds) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
            Box::pin(async move { self.next() })
        }
        fn list_within_radius(
            &self,
            _: Coordinate,
            _: f64,
        ) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
            Box::pin(async move { self.next() })
        }
        fn list_by_owner<'a>(&'a self, _: &'a str) -> BoxFuture<'a, RepositoryResult<Vec<Photo>>> {
            Box::pin(async move { self.next() })
        }
        fn insert(&self, _: NewPhotoInput) -> BoxFuture<'_, RepositoryResult<Photo>> {
            Box::pin(async move { Err(RepositoryError::Backend("read-only".into())) })
        }
        fn get_profile<'a>(
            &'a self,
            _: &'a str,
        ) -> BoxFuture<'a, RepositoryResult<Option<Profile>>> {
            Box::pin(async move { Ok(None) })
        }
        fn upsert_profile(&self, _: ProfileUpdate) -> BoxFuture<'_, RepositoryResult<Profile>> {
            Box::pin(async move { Err(RepositoryError::Backend("read-only".into())) })
        }
        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn spawn_with(backend: Arc<dyn PhotoBackend>) -> FeedHandle {
        RegionFetchController::spawn(
            FeedConfig::default().with_prewarm_images(false),
            PhotoRepository::new(backend),
            None,
        )
    }

    async fn next_event(events: &mut broadcast::Receiver<FeedEvent>) -> FeedEvent {
        events.recv().await.unwrap()
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_fetch_now_bypasses_debounce() {
        let backend = Arc::new(MemoryBackend::with_photos(vec![photo_at("p1", 0.0, 0.0)]));
        let feed = spawn_with(backend);
        let mut events = feed.subscribe_events();
        let start = Instant::now();

        feed.fetch_now(None).await.unwrap();

        assert!(matches!(
            next_event(&mut events).await,
            FeedEvent::FetchStarted { sequence: 1, region: None }
        ));
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::PhotosUpdated { revision: 1, count: 1 }
        );
        assert!(start.elapsed() < Duration::from_millis(1000));

        let state = feed.state();
        assert_eq!(state.photos.len(), 1);
        assert!(!state.is_loading);
        assert!(state.current_region.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_region_change_fetches_after_debounce() {
        let backend = Arc::new(MemoryBackend::with_photos(vec![
            photo_at("inside", 10.0, 10.0),
            photo_at("outside", 40.0, 40.0),
        ]));
        let feed = spawn_with(backend);
        let mut events = feed.subscribe_events();
        let start = Instant::now();
        let region = region_at(10.0, 10.0);

        feed.on_region_changed(region).await.unwrap();

        let started = next_event(&mut events).await;
        assert_eq!(
            started,
            FeedEvent::FetchStarted {
                sequence: 1,
                region: Some(region)
            }
        );
        assert!(start.elapsed() >= Duration::from_millis(1000));

        next_event(&mut events).await;
        let state = feed.state();
        assert_eq!(state.current_region, Some(region));
        assert_eq!(state.photos.len(), 1);
        assert_eq!(state.photos[0].id, "inside");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_flag_tracks_debounce() {
        let feed = spawn_with(Arc::new(MemoryBackend::new()));
        let mut state = feed.subscribe_state();

        feed.on_region_changed(region_at(0.0, 0.0)).await.unwrap();
        state
            .wait_for(|s| s.phase() == FetchPhase::PendingDebounce)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!feed.state().is_fetch_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_photos() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(vec![photo_at("p1", 0.0, 0.0)]),
            Err(RepositoryError::Backend("connection reset".into())),
        ]));
        let feed = spawn_with(backend);
        let mut events = feed.subscribe_events();

        feed.fetch_now(None).await.unwrap();
        next_event(&mut events).await;
        next_event(&mut events).await;

        feed.fetch_now(None).await.unwrap();
        next_event(&mut events).await;
        let failed = next_event(&mut events).await;
        assert!(matches!(
            failed,
            FeedEvent::FetchFailed { error: RepositoryError::Backend(_), .. }
        ));

        let state = feed.state();
        assert_eq!(state.photos.len(), 1);
        assert_eq!(state.revision, 1);
        assert!(!state.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_now_while_in_flight_is_suppressed() {
        let backend = Arc::new(
            MemoryBackend::with_photos(vec![photo_at("p1", 0.0, 0.0)])
                .with_latency(Duration::from_millis(500)),
        );
        let feed = spawn_with(backend);
        let mut events = feed.subscribe_events();

        feed.fetch_now(None).await.unwrap();
        feed.fetch_now(None).await.unwrap();

        assert!(matches!(next_event(&mut events).await, FeedEvent::FetchStarted { .. }));
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::FetchSuppressed { region: None }
        );
        assert!(matches!(next_event(&mut events).await, FeedEvent::PhotosUpdated { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_fetches_each_apply() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(vec![photo_at("p1", 0.0, 0.0)]),
            Ok(vec![photo_at("p1", 0.0, 0.0), photo_at("p2", 0.1, 0.1)]),
        ]));
        let feed = spawn_with(backend);
        let mut events = feed.subscribe_events();

        for (sequence, count) in [(1, 1), (2, 2)] {
            feed.fetch_now(None).await.unwrap();
            assert!(matches!(
                next_event(&mut events).await,
                FeedEvent::FetchStarted { sequence: s, .. } if s == sequence
            ));
            assert_eq!(
                next_event(&mut events).await,
                FeedEvent::PhotosUpdated { revision: sequence, count }
            );
        }
        assert_eq!(feed.state().photos.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_result_only_clears_loading() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(vec![photo_at("p1", 0.0, 0.0)]),
            Ok(vec![photo_at("p1", 0.0, 0.0)]),
        ]));
        let feed = spawn_with(backend);
        let mut events = feed.subscribe_events();
        feed.fetch_now(None).await.unwrap();
        feed.settled().await.unwrap();

        let mut state = feed.subscribe_state();
        state.borrow_and_update();
        feed.fetch_now(None).await.unwrap();
        feed.settled().await.unwrap();

        // Woken for the loading flag, but the photo set and revision are
        // untouched.
        assert!(state.has_changed().unwrap());
        let current = state.borrow_and_update().clone();
        assert!(!current.is_loading);
        assert_eq!(current.revision, 1);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        let updates = seen
            .iter()
            .filter(|e| matches!(e, FeedEvent::PhotosUpdated { .. }))
            .count();
        assert_eq!(updates, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_waits_for_debounced_fetch() {
        let backend = Arc::new(
            MemoryBackend::with_photos(vec![photo_at("p1", 0.0, 0.0)])
                .with_latency(Duration::from_millis(300)),
        );
        let feed = spawn_with(backend);
        let start = Instant::now();

        feed.on_region_changed(region_at(0.0, 0.0)).await.unwrap();
        feed.settled().await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(1300));
        let state = feed.state();
        assert_eq!(state.phase(), FetchPhase::Idle);
        assert_eq!(state.photos.len(), 1);
    }

    // ========================================================================
    // Deviation
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_deviation_is_signalled_immediately() {
        let feed = spawn_with(Arc::new(MemoryBackend::new()));
        let mut events = feed.subscribe_events();
        let start = Instant::now();

        feed.update_user_location(Coordinate::new(0.0, 0.0))
            .await
            .unwrap();
        let far = (20.0 / EARTH_RADIUS_KM).to_degrees();
        feed.on_region_changed(region_at(far, 0.0)).await.unwrap();

        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::Deviation(DeviationSignal::ShowReturnButton)
        );
        assert!(start.elapsed() < Duration::from_millis(1000));
        assert!(feed.deviation().is_deviated);

        assert_eq!(
            feed.return_to_user_location().await.unwrap(),
            Some(Coordinate::new(0.0, 0.0))
        );
    }

    // ========================================================================
    // Pre-warming
    // ========================================================================

    #[tokio::test]
    async fn test_successful_fetch_prewarms_previews() {
        let dir = tempfile::TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::new().serve("https://cdn.example.com/p1.jpg", b"img"));
        let cache = ImageCache::open(dir.path(), fetcher).await.unwrap();
        let backend = Arc::new(MemoryBackend::with_photos(vec![photo_at("p1", 0.0, 0.0)]));
        let feed = RegionFetchController::spawn(
            FeedConfig::default(),
            PhotoRepository::new(backend),
            Some(cache.clone()),
        );
        let mut events = feed.subscribe_events();

        feed.fetch_now(None).await.unwrap();
        next_event(&mut events).await;
        next_event(&mut events).await;

        for _ in 0..200 {
            if cache.is_ready("https://cdn.example.com/p1.jpg") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(
            cache.entry("https://cdn.example.com/p1.jpg").map(|e| e.state),
            Some(EntryState::Ready)
        );
    }

    #[tokio::test]
    async fn test_uncacheable_preview_does_not_fail_fetch() {
        const THUMB: &str = "https://cdn.example.com/p1-thumb.jpg";
        let dir = tempfile::TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::new().fail(THUMB, CacheFailure::Http(500)));
        let cache = ImageCache::open(dir.path(), fetcher.clone()).await.unwrap();
        let mut photo = photo_at("p1", 0.0, 0.0);
        photo.thumbnail_url = Some(THUMB.to_string());
        let backend = Arc::new(MemoryBackend::with_photos(vec![photo]));
        let feed = RegionFetchController::spawn(
            FeedConfig::default(),
            PhotoRepository::new(backend),
            Some(cache.clone()),
        );
        let mut events = feed.subscribe_events();

        feed.fetch_now(None).await.unwrap();
        assert!(matches!(
            next_event(&mut events).await,
            FeedEvent::FetchStarted { .. }
        ));
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::PhotosUpdated { revision: 1, count: 1 }
        );

        for _ in 0..200 {
            if cache.entry(THUMB).map(|e| e.state) == Some(EntryState::Failed) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(cache.entry(THUMB).map(|e| e.state), Some(EntryState::Failed));
        assert_eq!(fetcher.calls(), 1);

        feed.settled().await.unwrap();
        let state = feed.state();
        assert_eq!(state.photos.len(), 1);
        assert_eq!(state.photos[0].id, "p1");
        assert!(!state.is_loading);
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_clears_state_and_closes_handle() {
        let backend = Arc::new(MemoryBackend::with_photos(vec![photo_at("p1", 0.0, 0.0)]));
        let feed = spawn_with(backend);
        let mut events = feed.subscribe_events();

        feed.fetch_now(None).await.unwrap();
        next_event(&mut events).await;
        next_event(&mut events).await;
        feed.on_region_changed(region_at(5.0, 5.0)).await.unwrap();

        feed.shutdown().await;

        assert_eq!(feed.state(), FeedState::default());
        assert!(feed.is_closed());
        assert_eq!(
            feed.fetch_now(None).await,
            Err(crate::feed::FeedClosed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_in_flight_fetch() {
        let backend = Arc::new(
            MemoryBackend::with_photos(vec![photo_at("p1", 0.0, 0.0)])
                .with_latency(Duration::from_secs(30)),
        );
        let feed = spawn_with(backend);
        let mut state = feed.subscribe_state();

        feed.fetch_now(None).await.unwrap();
        state.wait_for(|s| s.is_loading).await.unwrap();

        feed.shutdown().await;
        let state = feed.state();
        assert!(!state.is_loading);
        assert!(state.photos.is_empty());
    }
}
