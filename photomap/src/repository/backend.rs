//! The backend collaborator seam.

pub use futures::future::BoxFuture;

use super::error::RepositoryResult;
use crate::geo::{Coordinate, GeoBounds};
use crate::photo::{NewPhotoInput, Photo, Profile, ProfileUpdate};

/// Storage and query service that owns photo records.
///
/// Implementations are injected into [`PhotoRepository`](super::PhotoRepository)
/// by the composition root; there is no ambient global client. Failures must
/// be reported as the matching [`RepositoryError`](super::RepositoryError)
/// variant so callers can tell auth, validation and transient errors apart.
///
/// Uses `Pin<Box<dyn Future>>` so backends can be held as `Arc<dyn PhotoBackend>`.
pub trait PhotoBackend: Send + Sync {
    /// Every photo.
    fn list_all(&self) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>>;

    /// Photos whose coordinate lies inside `bounds` (inclusive).
    fn list_in_bounds(&self, bounds: GeoBounds) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>>;

    /// Photos within `radius_km` of `center`.
    fn list_within_radius(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> BoxFuture<'_, RepositoryResult<Vec<Photo>>>;

    /// Photos owned by `owner_id`.
    fn list_by_owner<'a>(&'a self, owner_id: &'a str)
        -> BoxFuture<'a, RepositoryResult<Vec<Photo>>>;

    /// Store a new photo owned by the authenticated caller.
    fn insert(&self, input: NewPhotoInput) -> BoxFuture<'_, RepositoryResult<Photo>>;

    /// The profile of `user_id`, or `None` when the user has not set one up.
    fn get_profile<'a>(&'a self, user_id: &'a str)
        -> BoxFuture<'a, RepositoryResult<Option<Profile>>>;

    /// Apply `update` to the authenticated caller's profile, creating the
    /// profile if it does not exist yet.
    fn upsert_profile(&self, update: ProfileUpdate) -> BoxFuture<'_, RepositoryResult<Profile>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
