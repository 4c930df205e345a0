//! Integration tests for the region feed.
//!
//! These tests drive a real `RegionFetchController` through its handle
//! against an in-memory backend, with tokio's clock paused so debounce and
//! backend latency are exercised deterministically:
//! - Debounce collapses bursts of region changes into one fetch
//! - At most one fetch is ever in flight
//! - Identical results do not produce a photo change
//! - Panning before the debounce expires never shows the old region's photos
//!
//! Run with: `cargo test --test feed_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use photomap::feed::{FeedConfig, FeedEvent, FeedHandle, RegionFetchController};
use photomap::geo::{Coordinate, GeoBounds, ViewportRegion};
use photomap::photo::{NewPhotoInput, Photo, Profile, ProfileUpdate};
use photomap::repository::{
    MemoryBackend, PhotoBackend, PhotoRepository, RepositoryResult,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn photo_at(id: &str, lat: f64, lon: f64) -> Photo {
    let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    Photo {
        id: id.to_string(),
        owner_id: "owner".to_string(),
        title: format!("Photo {}", id),
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
    ViewportRegion::new(Coordinate::new(lat, lon), 0.5, 0.5)
}

/// Backend that records every rectangle query and how many overlap.
struct RecordingBackend {
    inner: MemoryBackend,
    queries: Mutex<Vec<GeoBounds>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl RecordingBackend {
    fn new(inner: MemoryBackend) -> Arc<Self> {
        Arc::new(Self {
            inner,
            queries: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    fn queries(&self) -> Vec<GeoBounds> {
        self.queries.lock().clone()
    }

    fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl PhotoBackend for RecordingBackend {
    fn list_all(&self) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
        self.inner.list_all()
    }

    fn list_in_bounds(&self, bounds: GeoBounds) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
        Box::pin(async move {
            self.queries.lock().push(bounds);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);

            let result = self.inner.list_in_bounds(bounds).await;

            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }

    fn list_within_radius(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
        self.inner.list_within_radius(center, radius_km)
    }

    fn list_by_owner<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, RepositoryResult<Vec<Photo>>> {
        self.inner.list_by_owner(owner_id)
    }

    fn insert(&self, input: NewPhotoInput) -> BoxFuture<'_, RepositoryResult<Photo>> {
        self.inner.insert(input)
    }

    fn get_profile<'a>(
        &'a self,
        user_id: &'a str,
    ) -> BoxFuture<'a, RepositoryResult<Option<Profile>>> {
        self.inner.get_profile(user_id)
    }

    fn upsert_profile(&self, update: ProfileUpdate) -> BoxFuture<'_, RepositoryResult<Profile>> {
        self.inner.upsert_profile(update)
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn spawn_feed(backend: Arc<RecordingBackend>) -> FeedHandle {
    RegionFetchController::spawn(
        FeedConfig::default().with_prewarm_images(false),
        PhotoRepository::new(backend),
        None,
    )
}

/// Everything broadcast so far, without waiting.
fn drain(events: &mut broadcast::Receiver<FeedEvent>) -> Vec<FeedEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

fn count_started(events: &[FeedEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, FeedEvent::FetchStarted { .. }))
        .count()
}

// ============================================================================
// Debounce
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_burst_of_region_changes_fetches_last_region_once() {
    let backend = RecordingBackend::new(MemoryBackend::with_photos(vec![
        photo_at("first", 10.0, 10.0),
        photo_at("last", 10.4, 10.0),
    ]));
    let feed = spawn_feed(backend.clone());
    let mut events = feed.subscribe_events();

    let regions: Vec<_> = (0..5).map(|i| region_at(10.0 + 0.1 * i as f64, 10.0)).collect();
    for region in &regions {
        feed.on_region_changed(*region).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_secs(3)).await;

    let last = regions[regions.len() - 1];
    assert_eq!(backend.queries(), vec![last.bounds()]);
    assert_eq!(count_started(&drain(&mut events)), 1);
    assert_eq!(feed.state().current_region, Some(last));
}

#[tokio::test(start_paused = true)]
async fn test_changes_spaced_beyond_debounce_each_fetch() {
    let backend = RecordingBackend::new(MemoryBackend::new());
    let feed = spawn_feed(backend.clone());

    feed.on_region_changed(region_at(1.0, 1.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    feed.on_region_changed(region_at(2.0, 2.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(backend.queries().len(), 2);
}

// ============================================================================
// At most one fetch in flight
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_region_during_fetch_is_dropped() {
    let backend = RecordingBackend::new(
        MemoryBackend::with_photos(vec![
            photo_at("a", 20.0, 20.0),
            photo_at("b", 30.0, 30.0),
        ])
        .with_latency(Duration::from_secs(2)),
    );
    let feed = spawn_feed(backend.clone());
    let mut events = feed.subscribe_events();
    let region_a = region_at(20.0, 20.0);
    let region_b = region_at(30.0, 30.0);

    // A becomes due at 1s and its fetch runs until 3s.
    feed.on_region_changed(region_a).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(feed.state().is_loading);

    // B becomes due at 2.5s, while A is still in flight.
    feed.on_region_changed(region_b).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(backend.queries(), vec![region_a.bounds()]);
    assert_eq!(backend.max_active(), 1);

    let seen = drain(&mut events);
    assert_eq!(count_started(&seen), 1);
    assert!(seen.contains(&FeedEvent::FetchSuppressed {
        region: Some(region_b)
    }));
    let updates: Vec<_> = seen
        .iter()
        .filter(|e| matches!(e, FeedEvent::PhotosUpdated { .. }))
        .collect();
    assert_eq!(updates, vec![&FeedEvent::PhotosUpdated { revision: 1, count: 1 }]);

    let state = feed.state();
    assert_eq!(state.current_region, Some(region_a));
    assert_eq!(state.photos.len(), 1);
    assert_eq!(state.photos[0].id, "a");
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_live_region_after_fetch_starts_new_cycle() {
    let backend = RecordingBackend::new(
        MemoryBackend::with_photos(vec![photo_at("b", 30.0, 30.0)])
            .with_latency(Duration::from_millis(500)),
    );
    let feed = spawn_feed(backend.clone());

    feed.on_region_changed(region_at(20.0, 20.0)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    feed.on_region_changed(region_at(30.0, 30.0)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(backend.queries().len(), 2);
    assert_eq!(feed.state().photos[0].id, "b");
}

// ============================================================================
// Content-equality suppression
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_identical_results_do_not_change_photos() {
    let backend = RecordingBackend::new(MemoryBackend::with_photos(vec![
        photo_at("p1", 40.0, 40.0),
        photo_at("p2", 40.1, 40.1),
    ]));
    let feed = spawn_feed(backend.clone());
    let mut events = feed.subscribe_events();
    let region = region_at(40.0, 40.0);

    feed.fetch_now(Some(region)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let first = feed.state();
    assert_eq!(first.revision, 1);
    drain(&mut events);

    feed.fetch_now(Some(region)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(backend.queries().len(), 2);
    let seen = drain(&mut events);
    assert_eq!(count_started(&seen), 1);
    assert!(!seen
        .iter()
        .any(|e| matches!(e, FeedEvent::PhotosUpdated { .. })));
    assert_eq!(feed.state().revision, 1);
    assert_eq!(feed.state().photos, first.photos);
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_pan_before_debounce_never_shows_first_region() {
    let backend = RecordingBackend::new(MemoryBackend::with_photos(vec![
        photo_at("p1", 50.0, 50.0),
        photo_at("p2", 50.1, 50.1),
        photo_at("p3", -20.0, -60.0),
    ]));
    let feed = spawn_feed(backend.clone());
    let mut state_rx = feed.subscribe_state();
    let region_a = region_at(50.0, 50.0);
    let region_b = region_at(-20.0, -60.0);

    // Record every distinct photo set the feed publishes.
    let observer = tokio::spawn(async move {
        let mut seen: Vec<Vec<String>> = Vec::new();
        while state_rx.changed().await.is_ok() {
            let ids: Vec<String> = state_rx
                .borrow_and_update()
                .photos
                .iter()
                .map(|p| p.id.clone())
                .collect();
            if seen.last() != Some(&ids) {
                seen.push(ids);
            }
        }
        seen
    });

    feed.on_region_changed(region_a).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    feed.on_region_changed(region_b).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(backend.queries(), vec![region_b.bounds()]);
    let state = feed.state();
    assert_eq!(state.revision, 1);
    assert_eq!(state.photos.len(), 1);
    assert_eq!(state.photos[0].id, "p3");

    feed.shutdown().await;
    let seen = observer.await.unwrap();
    assert!(
        !seen.iter().any(|ids| ids.contains(&"p1".to_string())),
        "region A's photos were published: {:?}",
        seen
    );
    assert!(seen.contains(&vec!["p3".to_string()]));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_every_handle_stops_feed() {
    let backend = RecordingBackend::new(MemoryBackend::new());
    let feed = spawn_feed(backend.clone());
    let mut state_rx = feed.subscribe_state();

    feed.on_region_changed(region_at(0.0, 0.0)).await.unwrap();
    drop(feed);

    // The controller exits and drops its sender; the pending region is never fetched.
    while state_rx.changed().await.is_ok() {}
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(backend.queries().is_empty());
    assert!(!state_rx.borrow().is_fetch_pending);
}
