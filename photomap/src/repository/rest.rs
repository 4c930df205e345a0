//! PostgREST-compatible HTTP backend.
//!
//! Talks to a hosted backend-as-a-service exposing the `photos` and
//! `profiles` tables and two geo RPC functions over PostgREST:
//!
//! | Operation | Request |
//! |---|---|
//! | all photos | `GET /rest/v1/photos?select=...&order=created_at.desc` |
//! | by owner | `GET /rest/v1/photos?...&user_id=eq.<id>` |
//! | in rectangle | `POST /rest/v1/rpc/get_photos_in_bounds` |
//! | within radius | `POST /rest/v1/rpc/get_photos_within_radius` |
//! | create | `POST /rest/v1/photos` with `Prefer: return=representation` |
//! | profile | `GET /rest/v1/profiles?id=eq.<id>` |
//! | update profile | `PATCH /rest/v1/profiles?id=eq.<id>`, `POST` when no row matched |

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::{BoxFuture, PhotoBackend};
use super::error::{RepositoryError, RepositoryResult};
use crate::geo::{Coordinate, GeoBounds};
use crate::photo::{
    NewPhotoInput, OwnerSummary, Photo, PhotoMetadata, Profile, ProfileUpdate, ValidationError,
};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Column selection joining the owner's public profile.
const PHOTO_SELECT: &str = "*,profiles:user_id(username,avatar_url)";

/// An authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
}

/// HTTP photo backend.
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    session: Option<Session>,
}

impl RestBackend {
    /// Create a backend for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> RepositoryResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a backend with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> RepositoryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("photomap/{}", crate::VERSION))
            .build()
            .map_err(|e| {
                RepositoryError::Backend(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            session: None,
        })
    }

    /// Send `key` as the project API key on every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Authenticate requests as the given session.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request.header("Accept", "application/json");
        if let Some(ref key) = self.api_key {
            request = request.header("apikey", key);
        }
        let bearer = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .or(self.api_key.as_deref());
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> RepositoryResult<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RepositoryError::Backend(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Backend request failed");
            return Err(classify_status(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RepositoryError::Backend(format!("Failed to decode response: {}", e)))
    }

    async fn fetch_rows(&self, request: RequestBuilder) -> RepositoryResult<Vec<Photo>> {
        let rows: Vec<PhotoRow> = self.send(request).await?;
        Ok(rows.into_iter().map(Photo::from).collect())
    }

    fn require_session(&self) -> RepositoryResult<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| RepositoryError::Auth("no active session".to_string()))
    }

    fn profile_filter(user_id: &str) -> [(&'static str, String); 2] {
        [("select", "*".to_string()), ("id", format!("eq.{}", user_id))]
    }

    fn photos_query(&self) -> RequestBuilder {
        self.client
            .get(self.endpoint("photos"))
            .query(&[("select", PHOTO_SELECT), ("order", "created_at.desc")])
    }
}

impl PhotoBackend for RestBackend {
    fn list_all(&self) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
        Box::pin(async move { self.fetch_rows(self.photos_query()).await })
    }

    fn list_in_bounds(&self, bounds: GeoBounds) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
        Box::pin(async move {
            debug!(?bounds, "Querying photos in bounds");
            let request = self
                .client
                .post(self.endpoint("rpc/get_photos_in_bounds"))
                .json(&BoundsParams::from(bounds));
            self.fetch_rows(request).await
        })
    }

    fn list_within_radius(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>> {
        Box::pin(async move {
            let request = self
                .client
                .post(self.endpoint("rpc/get_photos_within_radius"))
                .json(&RadiusParams {
                    lat: center.latitude,
                    lng: center.longitude,
                    radius_km,
                });
            self.fetch_rows(request).await
        })
    }

    fn list_by_owner<'a>(
        &'a self,
        owner_id: &'a str,
    ) -> BoxFuture<'a, RepositoryResult<Vec<Photo>>> {
        Box::pin(async move {
            let filter = format!("eq.{}", owner_id);
            let request = self.photos_query().query(&[("user_id", filter.as_str())]);
            self.fetch_rows(request).await
        })
    }

    fn insert(&self, input: NewPhotoInput) -> BoxFuture<'_, RepositoryResult<Photo>> {
        Box::pin(async move {
            let session = self.require_session()?;

            let request = self
                .client
                .post(self.endpoint("photos"))
                .header("Prefer", "return=representation")
                .json(&NewPhotoRow::new(&session.user_id, &input));

            let mut rows: Vec<PhotoRow> = self.send(request).await?;
            if rows.is_empty() {
                return Err(RepositoryError::Backend(
                    "Insert returned no representation".to_string(),
                ));
            }
            Ok(Photo::from(rows.swap_remove(0)))
        })
    }

    fn get_profile<'a>(
        &'a self,
        user_id: &'a str,
    ) -> BoxFuture<'a, RepositoryResult<Option<Profile>>> {
        Box::pin(async move {
            let request = self
                .client
                .get(self.endpoint("profiles"))
                .query(&Self::profile_filter(user_id));
            let rows: Vec<Profile> = self.send(request).await?;
            Ok(rows.into_iter().next())
        })
    }

    fn upsert_profile(&self, update: ProfileUpdate) -> BoxFuture<'_, RepositoryResult<Profile>> {
        Box::pin(async move {
            let session = self.require_session()?;

            let patch = self
                .client
                .patch(self.endpoint("profiles"))
                .query(&Self::profile_filter(&session.user_id))
                .header("Prefer", "return=representation")
                .json(&ProfileRow::changes(&update));
            let rows: Vec<Profile> = self.send(patch).await?;
            if let Some(profile) = rows.into_iter().next() {
                return Ok(profile);
            }

            debug!(user = %session.user_id, "No profile row yet, creating one");
            let insert = self
                .client
                .post(self.endpoint("profiles"))
                .header("Prefer", "return=representation")
                .json(&ProfileRow::create(&session.user_id, &update));
            let rows: Vec<Profile> = self.send(insert).await?;
            rows.into_iter().next().ok_or_else(|| {
                RepositoryError::Backend("Insert returned no representation".to_string())
            })
        })
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}

/// Map a non-success HTTP status to the repository error taxonomy.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> RepositoryError {
    let detail = extract_message(body).unwrap_or_else(|| format!("HTTP {}", status));
    match status.as_u16() {
        401 | 403 => RepositoryError::Auth(detail),
        400 | 409 | 422 => RepositoryError::Validation(ValidationError::Rejected(detail)),
        _ => RepositoryError::Backend(detail),
    }
}

/// PostgREST error bodies carry a `message` field.
fn extract_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct PhotoRow {
    id: String,
    user_id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    image_urls: Vec<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    location: LocationRow,
    #[serde(default)]
    metadata: Option<PhotoMetadata>,
    #[serde(default)]
    profiles: Option<OwnerSummary>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LocationRow {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: String,
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Photo {
            id: row.id,
            owner_id: row.user_id,
            title: row.title,
            description: row.description,
            coordinate: Coordinate::new(row.location.latitude, row.location.longitude),
            location_name: row.location.name,
            image_urls: row.image_urls,
            thumbnail_url: row.thumbnail_url,
            metadata: row.metadata.filter(|m| !m.is_empty()),
            owner: row.profiles,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewPhotoRow<'a> {
    user_id: &'a str,
    title: &'a str,
    description: Option<&'a str>,
    image_urls: &'a [String],
    thumbnail_url: Option<&'a str>,
    location: LocationRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a PhotoMetadata>,
}

impl<'a> NewPhotoRow<'a> {
    fn new(user_id: &'a str, input: &'a NewPhotoInput) -> Self {
        Self {
            user_id,
            title: &input.title,
            description: input.description.as_deref(),
            image_urls: &input.image_urls,
            thumbnail_url: input.thumbnail_url.as_deref(),
            location: LocationRow {
                latitude: input.coordinate.latitude,
                longitude: input.coordinate.longitude,
                name: input.location_name.clone(),
            },
            metadata: input.metadata.as_ref(),
        }
    }
}

/// Body of a profile insert or update.
#[derive(Debug, Serialize)]
struct ProfileRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    username: &'a str,
    full_name: Option<&'a str>,
    bio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
}

impl<'a> ProfileRow<'a> {
    fn changes(update: &'a ProfileUpdate) -> Self {
        Self {
            id: None,
            username: &update.username,
            full_name: update.full_name.as_deref(),
            bio: update.bio.as_deref(),
            avatar_url: update.avatar_url.as_deref(),
        }
    }

    fn create(user_id: &'a str, update: &'a ProfileUpdate) -> Self {
        Self {
            id: Some(user_id),
            ..Self::changes(update)
        }
    }
}

#[derive(Debug, Serialize)]
struct BoundsParams {
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl From<GeoBounds> for BoundsParams {
    fn from(b: GeoBounds) -> Self {
        Self {
            min_lat: b.min_lat,
            max_lat: b.max_lat,
            min_lng: b.min_lon,
            max_lng: b.max_lon,
        }
    }
}

#[derive(Debug, Serialize)]
struct RadiusParams {
    lat: f64,
    lng: f64,
    radius_km: f64,
}
