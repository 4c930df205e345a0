//! Photo and profile domain types.

mod metadata;
mod model;
mod profile;

pub use metadata::PhotoMetadata;
pub use model::{newest_first, NewPhotoInput, OwnerSummary, Photo, ValidationError};
pub use profile::{Profile, ProfileUpdate, MAX_BIO_LEN, MIN_USERNAME_LEN};
