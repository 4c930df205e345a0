//! In-process photo backend.
//!
//! Holds photos in memory and mimics the hosted backend's behaviour closely
//! enough to run the feed without a network: inclusive rectangle queries,
//! radius queries, session-gated inserts and profile updates, and the owner
//! join on listings. Optional artificial latency makes the debounce and
//! single-fetch behaviour observable in demos.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::backend::{BoxFuture, PhotoBackend};
use super::error::{RepositoryError, RepositoryResult};
use crate::geo::{distance_km, Coordinate, GeoBounds};
use crate::photo::{
    newest_first, NewPhotoInput, Photo, Profile, ProfileUpdate, ValidationError,
};

/// Photo backend backed by a `Vec` behind a lock.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    photos: RwLock<Vec<Photo>>,
    profiles: RwLock<HashMap<String, Profile>>,
    session: RwLock<Option<String>>,
    latency: Option<Duration>,
}

impl MemoryBackend {
    /// Create an empty backend with no signed-in user.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with `photos`.
    pub fn with_photos(photos: Vec<Photo>) -> Self {
        Self {
            photos: RwLock::new(photos),
            ..Self::default()
        }
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Authenticate subsequent inserts as `user_id`.
    pub fn sign_in(&self, user_id: impl Into<String>) {
        *self.session.write() = Some(user_id.into());
    }

    pub fn sign_out(&self) {
        *self.session.write() = None;
    }

    pub fn session_user(&self) -> Option<String> {
        self.session.read().clone()
    }

    /// Store a fully formed photo, replacing any photo with the same id.
    pub fn put(&self, photo: Photo) {
        let mut photos = self.photos.write();
        photos.retain(|p| p.id != photo.id);
        photos.push(photo);
    }

    /// Store a profile, replacing any profile for the same user.
    pub fn put_profile(&self, profile: Profile) {
        self.profiles.write().insert(profile.id.clone(), profile);
    }

    pub fn len(&self) -> usize {
        self.photos.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.read().is_empty()
    }

    fn select(&self, predicate: impl Fn(&Photo) -> bool) -> Vec<Photo> {
        let profiles = self.profiles.read();
        let mut selected: Vec<Photo> = self
            .photos
            .read()
            .iter()
            .filter(|p| predicate(p))
            .cloned()
            .map(|mut photo| {
                if photo.owner.is_none() {
                    photo.owner = profiles.get(&photo.owner_id).map(Profile::summary);
                }
                photo
            })
            .collect();
        selected.sort_by(newest_first);
        selected
    }

    fn require_session(&self) -> RepositoryResult<String> {
        self.session_user()
            .ok_or_else(|| RepositoryError::Auth("no active session".to_string()))
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl PhotoBackend for MemoryBackend {
    fn list_all(&self) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
        Box::pin(async move {
            self.simulate_latency().await;
            Ok(self.select(|_| true))
        })
    }

    fn list_in_bounds(&self, bounds: GeoBounds) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
        Box::pin(async move {
            self.simulate_latency().await;
            Ok(self.select(|p| bounds.contains(&p.coordinate)))
        })
    }

    fn list_within_radius(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
        Box::pin(async move {
            self.simulate_latency().await;
            Ok(self.select(|p| distance_km(center, p.coordinate) <= radius_km))
        })
    }

    fn list_by_owner<'a>(
        &'a self,
        owner_id: &'a str,
    ) -> BoxFuture<'a, RepositoryResult<Vec<Photo>>> {
        Box::pin(async move {
            self.simulate_latency().await;
            Ok(self.select(|p| p.owner_id == owner_id))
        })
    }

    fn insert(&self, input: NewPhotoInput) -> BoxFuture<'_, RepositoryResult<Photo>> {
        Box::pin(async move {
            self.simulate_latency().await;

            let owner_id = self.require_session()?;

            let now = Utc::now();
            let photo = Photo {
                id: Uuid::new_v4().to_string(),
                owner_id,
                title: input.title,
                description: input.description,
                coordinate: input.coordinate,
                location_name: input.location_name,
                image_urls: input.image_urls,
                thumbnail_url: input.thumbnail_url,
                metadata: input.metadata,
                owner: None,
                created_at: now,
                updated_at: now,
            };

            debug!(photo_id = %photo.id, owner = %photo.owner_id, "Stored photo in memory backend");
            self.photos.write().push(photo.clone());
            Ok(photo)
        })
    }

    fn get_profile<'a>(
        &'a self,
        user_id: &'a str,
    ) -> BoxFuture<'a, RepositoryResult<Option<Profile>>> {
        Box::pin(async move {
            self.simulate_latency().await;
            Ok(self.profiles.read().get(user_id).cloned())
        })
    }

    fn upsert_profile(&self, update: ProfileUpdate) -> BoxFuture<'_, RepositoryResult<Profile>> {
        Box::pin(async move {
            self.simulate_latency().await;
            let user_id = self.require_session()?;

            let mut profiles = self.profiles.write();
            let taken = profiles
                .values()
                .any(|p| p.id != user_id && p.username.as_deref() == Some(update.username.as_str()));
            if taken {
                return Err(ValidationError::Rejected(format!(
                    "username '{}' is already taken",
                    update.username
                ))
                .into());
            }

            let now = Utc::now();
            let profile = profiles.entry(user_id.clone()).or_insert_with(|| Profile {
                id: user_id.clone(),
                email: None,
                username: None,
                full_name: None,
                bio: None,
                avatar_url: None,
                created_at: now,
                updated_at: now,
            });
            profile.username = Some(update.username);
            profile.full_name = update.full_name;
            profile.bio = update.bio;
            if update.avatar_url.is_some() {
                profile.avatar_url = update.avatar_url;
            }
            profile.updated_at = now;

            debug!(user = %user_id, "Stored profile in memory backend");
            Ok(profile.clone())
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
