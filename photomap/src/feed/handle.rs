//! Caller-side API of a running feed.

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use super::events::{FeedCommand, FeedEvent};
use super::state::{DeviationState, FeedState, FetchPhase};
use crate::geo::{Coordinate, ViewportRegion};

/// The feed controller has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Feed controller has shut down")]
pub struct FeedClosed;

/// Handle to a [`RegionFetchController`](super::RegionFetchController) task.
///
/// Cheap to clone. The controller stops when [`shutdown`](Self::shutdown) is
/// called or every handle has been dropped.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    commands: mpsc::Sender<FeedCommand>,
    state: watch::Receiver<FeedState>,
    deviation: watch::Receiver<DeviationState>,
    events: broadcast::Sender<FeedEvent>,
    shutdown: CancellationToken,
}

impl FeedHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<FeedCommand>,
        state: watch::Receiver<FeedState>,
        deviation: watch::Receiver<DeviationState>,
        events: broadcast::Sender<FeedEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            commands,
            state,
            deviation,
            events,
            shutdown,
        }
    }

    /// Report a new visible map region. Debounced before fetching.
    pub async fn on_region_changed(&self, region: ViewportRegion) -> Result<(), FeedClosed> {
        self.send(FeedCommand::RegionChanged(region)).await
    }

    /// Fetch immediately, bypassing the debounce. `None` fetches every photo.
    pub async fn fetch_now(&self, region: Option<ViewportRegion>) -> Result<(), FeedClosed> {
        self.send(FeedCommand::FetchNow(region)).await
    }

    pub async fn update_user_location(&self, location: Coordinate) -> Result<(), FeedClosed> {
        self.send(FeedCommand::UserLocation(location)).await
    }

    /// The stored user location to re-center on, if known.
    pub async fn return_to_user_location(&self) -> Result<Option<Coordinate>, FeedClosed> {
        let (reply, response) = oneshot::channel();
        self.send(FeedCommand::ReturnToUser(reply)).await?;
        response.await.map_err(|_| FeedClosed)
    }

    /// Wait until every command sent so far has been handled and the feed
    /// has no debounce pending and no fetch in flight.
    pub async fn settled(&self) -> Result<(), FeedClosed> {
        let (reply, response) = oneshot::channel();
        self.send(FeedCommand::Barrier(reply)).await?;
        response.await.map_err(|_| FeedClosed)?;

        let mut state = self.state.clone();
        state
            .wait_for(|s| s.phase() == FetchPhase::Idle)
            .await
            .map(|_| ())
            .map_err(|_| FeedClosed)
    }

    /// Current snapshot of the feed.
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn deviation(&self) -> DeviationState {
        *self.deviation.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    pub fn subscribe_deviation(&self) -> watch::Receiver<DeviationState> {
        self.deviation.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Stop the controller and wait until it has torn down.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let mut state = self.state.clone();
        // Resolves with an error once the controller drops its sender.
        while state.changed().await.is_ok() {}
    }

    async fn send(&self, command: FeedCommand) -> Result<(), FeedClosed> {
        self.commands.send(command).await.map_err(|_| FeedClosed)
    }
}
