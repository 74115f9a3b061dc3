//! Global loading indicator, reference-counted over in-flight requests.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Counts concurrent non-silent requests and drives the global busy flag.
///
/// The counter clamps at zero: an unmatched [`hide`](Self::hide) (e.g. a
/// request that failed before its request-phase increment ran) leaves the
/// gauge idle instead of underflowing.
#[derive(Clone, Debug)]
pub struct LoadingGauge {
    active: Arc<Mutex<usize>>,
    busy: Arc<watch::Sender<bool>>,
}

impl LoadingGauge {
    /// Create an idle gauge.
    #[must_use]
    pub fn new() -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            active: Arc::new(Mutex::new(0)),
            busy: Arc::new(busy),
        }
    }

    /// Record a request entering flight.
    pub fn show(&self) {
        let mut active = self.lock();
        *active += 1;
        if *active == 1 {
            self.busy.send_replace(true);
        }
    }

    /// Record a request leaving flight. Clamped at zero.
    pub fn hide(&self) {
        let mut active = self.lock();
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.busy.send_replace(false);
        }
    }

    /// `true` while any non-silent request is in flight.
    #[must_use]
    pub fn busy(&self) -> bool {
        *self.lock() > 0
    }

    /// Number of requests currently in flight.
    #[must_use]
    pub fn active(&self) -> usize {
        *self.lock()
    }

    /// Subscribe to busy-flag transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, usize> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LoadingGauge {
    fn default() -> Self {
        Self::new()
    }
}
