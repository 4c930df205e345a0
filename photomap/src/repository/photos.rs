//! The photo repository used by the feed, the upload flow and profile
//! editing.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::backend::PhotoBackend;
use super::error::{RepositoryError, RepositoryResult};
use crate::geo::{distance_km, Coordinate, ViewportRegion};
use crate::photo::{newest_first, NewPhotoInput, Photo, Profile, ProfileUpdate};

/// Default radius for nearby queries, in kilometers.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

/// Query and create photos through an injected [`PhotoBackend`].
///
/// The repository normalises what backends return: results are unique by
/// id, ordered deterministically, and rectangle/radius results are
/// re-checked against the query so a loose backend cannot leak photos from
/// outside the viewport. It never retries; a failed call is reported once.
#[derive(Clone)]
pub struct PhotoRepository {
    backend: Arc<dyn PhotoBackend>,
}

impl PhotoRepository {
    pub fn new(backend: Arc<dyn PhotoBackend>) -> Self {
        Self { backend }
    }

    /// Name of the underlying backend, for logs.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Every photo, newest first.
    pub async fn fetch_all(&self) -> RepositoryResult<Vec<Photo>> {
        let photos = self.backend.list_all().await.inspect_err(log_failure)?;
        Ok(normalize(photos))
    }

    /// Photos inside the region's bounding rectangle (inclusive).
    ///
    /// Ordered newest first, which is stable for a fixed backend state.
    pub async fn fetch_by_region(&self, region: &ViewportRegion) -> RepositoryResult<Vec<Photo>> {
        let bounds = region.bounds();
        let mut photos = self
            .backend
            .list_in_bounds(bounds)
            .await
            .inspect_err(log_failure)?;

        let returned = photos.len();
        photos.retain(|p| bounds.contains(&p.coordinate));
        if photos.len() != returned {
            debug!(
                returned,
                kept = photos.len(),
                "Dropped photos outside the requested bounds"
            );
        }

        Ok(normalize(photos))
    }

    /// Photos within `radius_km` of `center`, nearest first.
    pub async fn fetch_nearby(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> RepositoryResult<Vec<Photo>> {
        let photos = self
            .backend
            .list_within_radius(center, radius_km)
            .await
            .inspect_err(log_failure)?;

        let mut with_distance: Vec<(f64, Photo)> = dedupe(photos)
            .into_iter()
            .map(|p| (distance_km(center, p.coordinate), p))
            .filter(|(d, _)| *d <= radius_km)
            .collect();

        with_distance.sort_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| newest_first(a, b)));
        Ok(with_distance.into_iter().map(|(_, p)| p).collect())
    }

    /// Photos owned by `owner_id`, newest first.
    pub async fn fetch_by_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Photo>> {
        let mut photos = self
            .backend
            .list_by_owner(owner_id)
            .await
            .inspect_err(log_failure)?;
        photos.retain(|p| p.owner_id == owner_id);
        Ok(normalize(photos))
    }

    /// Validate `input` and store it as a photo owned by the signed-in user.
    pub async fn create(&self, input: NewPhotoInput) -> RepositoryResult<Photo> {
        input.validate()?;
        let photo = self.backend.insert(input).await.inspect_err(log_failure)?;
        debug!(photo_id = %photo.id, "Created photo");
        Ok(photo)
    }

    /// The profile of `user_id`; `None` when the user has not created one.
    pub async fn get_profile(&self, user_id: &str) -> RepositoryResult<Option<Profile>> {
        self.backend
            .get_profile(user_id)
            .await
            .inspect_err(log_failure)
    }

    /// Validate `update` and apply it to the signed-in user's profile.
    pub async fn update_profile(&self, update: ProfileUpdate) -> RepositoryResult<Profile> {
        let update = update.normalized()?;
        let profile = self
            .backend
            .upsert_profile(update)
            .await
            .inspect_err(log_failure)?;
        debug!(user = %profile.id, "Updated profile");
        Ok(profile)
    }
}

fn log_failure(error: &RepositoryError) {
    warn!(error = %error, "Photo backend call failed");
}

/// Keep the first occurrence of each id.
fn dedupe(photos: Vec<Photo>) -> Vec<Photo> {
    let mut seen = HashSet::with_capacity(photos.len());
    photos
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

fn normalize(photos: Vec<Photo>) -> Vec<Photo> {
    let mut photos = dedupe(photos);
    photos.sort_by(newest_first);
    photos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoBounds;
    use crate::photo::ValidationError;
    use crate::repository::{BoxFuture, MemoryBackend};
    use chrono::{TimeZone, Utc};

    fn photo_at(id: &str, lat: f64, lon: f64, created_secs: i64) -> Photo {
        let ts = Utc.timestamp_opt(created_secs, 0).unwrap();
        Photo {
            id: id.to_string(),
            owner_id: "alice".to_string(),
            title: id.to_string(),
            description: None,
            coordinate: Coordinate::new(lat, lon),
            location_name: String::new(),
            image_urls: vec![format!("https://img.example.com/{}.jpg", id)],
            thumbnail_url: None,
            metadata: None,
            owner: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    /// Backend that ignores the query and returns a fixed list.
    struct SloppyBackend {
        photos: Vec<Photo>,
    }

    impl PhotoBackend for SloppyBackend {
        fn list_all(&self) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
            Box::pin(async move { Ok(self.photos.clone()) })
        }
        fn list_in_bounds(&self, _: GeoBounds) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
            Box::pin(async move { Ok(self.photos.clone()) })
        }
        fn list_within_radius(
            &self,
            _: Coordinate,
            _: f64,
        ) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
            Box::pin(async move { Ok(self.photos.clone()) })
        }
        fn list_by_owner<'a>(&'a self, _: &'a str) -> BoxFuture<'a, RepositoryResult<Vec<Photo>>> {
            Box::pin(async move { Ok(self.photos.clone()) })
        }
        fn insert(&self, _: NewPhotoInput) -> BoxFuture<'_, RepositoryResult<Photo>> {
            Box::pin(async move { Err(RepositoryError::Backend("read-only".to_string())) })
        }
        fn get_profile<'a>(
            &'a self,
            _: &'a str,
        ) -> BoxFuture<'a, RepositoryResult<Option<Profile>>> {
            Box::pin(async move { Ok(None) })
        }
        fn upsert_profile(&self, _: ProfileUpdate) -> BoxFuture<'_, RepositoryResult<Profile>> {
            Box::pin(async move { Err(RepositoryError::Backend("read-only".to_string())) })
        }
        fn name(&self) -> &'static str {
            "sloppy"
        }
    }

    fn sloppy(photos: Vec<Photo>) -> PhotoRepository {
        PhotoRepository::new(Arc::new(SloppyBackend { photos }))
    }

    #[tokio::test]
    async fn test_fetch_by_region_filters_and_orders() {
        let repo = sloppy(vec![
            photo_at("inside-old", 0.5, 0.5, 10),
            photo_at("outside", 5.0, 5.0, 50),
            photo_at("edge", 1.0, 1.0, 30),
        ]);
        let region = ViewportRegion::new(Coordinate::new(0.0, 0.0), 2.0, 2.0);

        let photos = repo.fetch_by_region(&region).await.unwrap();
        let ids: Vec<_> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["edge", "inside-old"]);
    }

    #[tokio::test]
    async fn test_fetch_all_removes_duplicate_ids() {
        let repo = sloppy(vec![
            photo_at("a", 0.0, 0.0, 10),
            photo_at("a", 0.0, 0.0, 10),
            photo_at("b", 0.0, 0.0, 20),
        ]);

        let photos = repo.fetch_all().await.unwrap();
        let ids: Vec<_> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_fetch_nearby_orders_by_distance() {
        let repo = sloppy(vec![
            photo_at("far", 0.08, 0.0, 30),
            photo_at("near", 0.01, 0.0, 10),
            photo_at("outside", 1.0, 0.0, 50),
        ]);

        let photos = repo
            .fetch_nearby(Coordinate::new(0.0, 0.0), DEFAULT_NEARBY_RADIUS_KM)
            .await
            .unwrap();
        let ids: Vec<_> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
    }

    #[tokio::test]
    async fn test_fetch_by_owner_only_returns_owner() {
        let mut other = photo_at("other", 0.0, 0.0, 10);
        other.owner_id = "bob".to_string();
        let repo = sloppy(vec![photo_at("mine", 0.0, 0.0, 10), other]);

        let photos = repo.fetch_by_owner("alice").await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].id, "mine");
    }

    #[tokio::test]
    async fn test_create_validates_before_backend() {
        let backend = Arc::new(MemoryBackend::new());
        backend.sign_in("alice");
        let repo = PhotoRepository::new(backend.clone());

        let input = NewPhotoInput::new("", Coordinate::new(0.0, 0.0), vec![]);
        let result = repo.create(input).await;

        assert_eq!(
            result,
            Err(RepositoryError::Validation(ValidationError::EmptyTitle))
        );
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_create_without_session_is_auth_error() {
        let repo = PhotoRepository::new(Arc::new(MemoryBackend::new()));
        let input = NewPhotoInput::new(
            "Pier 39",
            Coordinate::new(37.8087, -122.4098),
            vec!["https://img.example.com/pier.jpg".to_string()],
        );

        let result = repo.create(input).await;
        assert!(matches!(result, Err(RepositoryError::Auth(_))));
    }

    #[tokio::test]
    async fn test_create_round_trips_through_memory_backend() {
        let backend = Arc::new(MemoryBackend::new());
        backend.sign_in("alice");
        let repo = PhotoRepository::new(backend);

        let input = NewPhotoInput::new(
            "Pier 39",
            Coordinate::new(37.8087, -122.4098),
            vec!["https://img.example.com/pier.jpg".to_string()],
        );
        let created = repo.create(input).await.unwrap();

        let mine = repo.fetch_by_owner("alice").await.unwrap();
        assert_eq!(mine, vec![created]);
    }

    #[tokio::test]
    async fn test_backend_errors_propagate_unchanged() {
        let repo = sloppy(vec![]);
        let input = NewPhotoInput::new(
            "x",
            Coordinate::new(0.0, 0.0),
            vec!["https://a/b.jpg".to_string()],
        );
        let result = repo.create(input).await;
        assert_eq!(result, Err(RepositoryError::Backend("read-only".to_string())));
    }

    #[tokio::test]
    async fn test_update_profile_validates_before_backend() {
        let backend = Arc::new(MemoryBackend::new());
        backend.sign_in("alice");
        let repo = PhotoRepository::new(backend);

        let result = repo.update_profile(ProfileUpdate::new("  al ")).await;
        assert_eq!(
            result,
            Err(RepositoryError::Validation(ValidationError::UsernameTooShort(3)))
        );
        assert_eq!(repo.get_profile("alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_profile_stores_normalized_fields() {
        let backend = Arc::new(MemoryBackend::new());
        backend.sign_in("alice");
        let repo = PhotoRepository::new(backend);

        let profile = repo
            .update_profile(ProfileUpdate::new(" alice ").with_full_name("  "))
            .await
            .unwrap();

        assert_eq!(profile.username.as_deref(), Some("alice"));
        assert_eq!(profile.full_name, None);
        assert_eq!(repo.get_profile("alice").await.unwrap(), Some(profile));
    }
}
