//! Feed events and commands.

use std::fmt;

use tokio::sync::oneshot;

use super::deviation::DeviationSignal;
use crate::geo::{Coordinate, ViewportRegion};
use crate::repository::RepositoryError;

/// Notifications broadcast by a running feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A fetch was issued. `region` is `None` for a global fetch.
    FetchStarted {
        sequence: u64,
        region: Option<ViewportRegion>,
    },
    /// A fetch returned a photo set different from the current one.
    PhotosUpdated { revision: u64, count: usize },
    /// A fetch failed; the previous photos are kept.
    FetchFailed {
        region: Option<ViewportRegion>,
        error: RepositoryError,
    },
    /// A request arrived while a fetch was in flight and was dropped.
    FetchSuppressed { region: Option<ViewportRegion> },
    Deviation(DeviationSignal),
}

impl fmt::Display for FeedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedEvent::FetchStarted { sequence, region } => match region {
                Some(r) => write!(
                    f,
                    "fetch #{} started around ({:.4}, {:.4})",
                    sequence,
                    r.center().latitude,
                    r.center().longitude
                ),
                None => write!(f, "fetch #{} started (all photos)", sequence),
            },
            FeedEvent::PhotosUpdated { revision, count } => {
                write!(f, "photos updated: {} photos (revision {})", count, revision)
            }
            FeedEvent::FetchFailed { error, .. } => write!(f, "fetch failed: {}", error),
            FeedEvent::FetchSuppressed { .. } => write!(f, "fetch suppressed: another fetch is in flight"),
            FeedEvent::Deviation(signal) => write!(f, "deviation: {}", signal),
        }
    }
}

/// Messages from [`FeedHandle`](super::FeedHandle) to the controller task.
#[derive(Debug)]
pub(crate) enum FeedCommand {
    RegionChanged(ViewportRegion),
    FetchNow(Option<ViewportRegion>),
    UserLocation(Coordinate),
    ReturnToUser(oneshot::Sender<Option<Coordinate>>),
    /// Answered once every earlier command has been handled.
    Barrier(oneshot::Sender<()>),
}
