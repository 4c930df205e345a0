//! User profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{OwnerSummary, ValidationError};

/// Shortest accepted username, counted in characters after trimming.
pub const MIN_USERNAME_LEN: usize = 3;

/// Longest accepted bio, in characters.
pub const MAX_BIO_LEN: usize = 160;

/// A user's profile row. `id` is the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// The public part shown next to a user's photos.
    pub fn summary(&self) -> OwnerSummary {
        OwnerSummary {
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Changes the signed-in user makes to their own profile.
///
/// `full_name` and `bio` are replaced as given, so `None` clears them.
/// `avatar_url` is only written when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            full_name: None,
            bio: None,
            avatar_url: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Trim every field and turn blank optional fields into `None`, then
    /// check the username and bio limits.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let blank_to_none = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let update = Self {
            username: self.username.trim().to_string(),
            full_name: blank_to_none(self.full_name),
            bio: blank_to_none(self.bio),
            avatar_url: blank_to_none(self.avatar_url),
        };

        if update.username.chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::UsernameTooShort(MIN_USERNAME_LEN));
        }
        if let Some(bio) = &update.bio {
            if bio.chars().count() > MAX_BIO_LEN {
                return Err(ValidationError::BioTooLong(MAX_BIO_LEN));
            }
        }
        Ok(update)
    }
}
