//! Photo records and the input used to create them.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::metadata::PhotoMetadata;
use crate::geo::{CoordError, Coordinate};

/// Public profile details of a photo's owner, when the backend joins them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// A geotagged photo as returned by the backend.
///
/// Identity is `id`. Records are read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub coordinate: Coordinate,
    pub location_name: String,
    /// Full-size image URLs, never empty.
    pub image_urls: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub metadata: Option<PhotoMetadata>,
    pub owner: Option<OwnerSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Photo {
    /// URL of the image shown on the map marker.
    ///
    /// The thumbnail when there is one, otherwise the first full image.
    pub fn preview_url(&self) -> Option<&str> {
        self.thumbnail_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| self.image_urls.first().map(String::as_str))
    }
}

/// Orders photos newest first, breaking ties by id so the order is stable.
pub fn newest_first(a: &Photo, b: &Photo) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Reasons a [`NewPhotoInput`] is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("At least one image URL is required")]
    NoImages,

    #[error("Image URL at position {0} is empty")]
    EmptyImageUrl(usize),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordError),

    #[error("Username must be at least {0} characters")]
    UsernameTooShort(usize),

    #[error("Bio must be at most {0} characters")]
    BioTooLong(usize),

    /// The backend refused the record (constraint or schema violation).
    #[error("Rejected by backend: {0}")]
    Rejected(String),
}

/// Everything needed to create a photo record.
///
/// The owner and timestamps are assigned by the backend from the
/// authenticated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPhotoInput {
    pub title: String,
    pub description: Option<String>,
    pub coordinate: Coordinate,
    pub location_name: String,
    pub image_urls: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub metadata: Option<PhotoMetadata>,
}

impl NewPhotoInput {
    pub fn new(title: impl Into<String>, coordinate: Coordinate, image_urls: Vec<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            coordinate,
            location_name: String::new(),
            image_urls,
            thumbnail_url: None,
            metadata: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location_name(mut self, name: impl Into<String>) -> Self {
        self.location_name = name.into();
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, metadata: PhotoMetadata) -> Self {
        self.metadata = (!metadata.is_empty()).then_some(metadata);
        self
    }

    /// Check the required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.image_urls.is_empty() {
            return Err(ValidationError::NoImages);
        }
        if let Some(index) = self.image_urls.iter().position(|u| u.trim().is_empty()) {
            return Err(ValidationError::EmptyImageUrl(index));
        }
        self.coordinate.validate()?;
        Ok(())
    }
}
