//! Repository error types.

use thiserror::Error;

use crate::photo::ValidationError;

/// Errors surfaced by [`PhotoRepository`](super::PhotoRepository) and the
/// backends behind it.
///
/// The three variants stay distinguishable all the way to the caller: bad
/// input is never retried, a missing session needs a sign-in, and only
/// backend failures are worth retrying. This layer itself never retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    /// Caller input failed validation locally or was rejected by the backend.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No authenticated session, or the session was refused.
    #[error("Not authenticated: {0}")]
    Auth(String),

    /// Transient network or service failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl RepositoryError {
    /// Whether retrying the same call later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepositoryError::Backend(_))
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
