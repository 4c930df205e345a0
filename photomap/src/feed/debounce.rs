//! Region debouncing.
//!
//! Map gestures emit many region changes per second. The debouncer keeps only
//! the most recent region and a deadline one quiet period after it arrived;
//! each new region replaces the previous one and pushes the deadline out.
//! It holds no timer itself: the controller sleeps until [`deadline`] and then
//! calls [`take_due`].
//!
//! [`deadline`]: RegionDebouncer::deadline
//! [`take_due`]: RegionDebouncer::take_due

use std::time::Duration;

use tokio::time::Instant;

use crate::geo::ViewportRegion;

/// Default quiet period before a region is fetched.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct RegionDebouncer {
    delay: Duration,
    pending: Option<Pending>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    region: ViewportRegion,
    deadline: Instant,
}

impl RegionDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record `region` as the latest pending region and restart the delay.
    ///
    /// Returns `true` if an earlier pending region was superseded.
    pub fn record(&mut self, region: ViewportRegion, now: Instant) -> bool {
        self.pending
            .replace(Pending {
                region,
                deadline: now + self.delay,
            })
            .is_some()
    }

    /// When the pending region becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending region if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<ViewportRegion> {
        match self.pending {
            Some(p) if now >= p.deadline => {
                self.pending = None;
                Some(p.region)
            }
            _ => None,
        }
    }

    /// Drop the pending region without fetching it.
    pub fn cancel(&mut self) -> Option<ViewportRegion> {
        self.pending.take().map(|p| p.region)
    }
}

impl Default for RegionDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
