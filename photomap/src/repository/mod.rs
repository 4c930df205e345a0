//! Photo persistence.
//!
//! [`PhotoRepository`] is the only entry point the rest of the crate uses.
//! It wraps a [`PhotoBackend`] collaborator chosen by the composition root:
//!
//! - [`MemoryBackend`] keeps photos in process (tests, demos, offline use)
//! - [`RestBackend`] talks to a hosted PostgREST backend over HTTP

mod backend;
mod error;
mod memory;
mod photos;
mod rest;

pub use backend::{BoxFuture, PhotoBackend};
pub use error::{RepositoryError, RepositoryResult};
pub use memory::MemoryBackend;
pub use photos::{PhotoRepository, DEFAULT_NEARBY_RADIUS_KM};
pub use rest::{RestBackend, Session, DEFAULT_TIMEOUT_SECS};
