//! Credential refresh coordination.
//!
//! Guarantees at most one in-flight refresh per client. Callers that arrive
//! while a refresh is pending join an explicit FIFO queue and are resolved,
//! in arrival order, with the outcome of that single refresh; nobody is
//! resolved before the refresh call itself completes.
//!
//! The `refreshing` flag and the queue are instance state, not ambient
//! globals, so coordinators can be tested in isolation.

use crate::error::{ApiError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// FIFO queue of continuations waiting on an in-flight refresh.
#[derive(Debug, Default)]
pub struct PendingQueue {
    waiters: VecDeque<oneshot::Sender<Result<String>>>,
}

impl PendingQueue {
    /// Append a waiter and hand back the receiving end.
    pub fn enqueue(&mut self) -> oneshot::Receiver<Result<String>> {
        let (sender, receiver) = oneshot::channel();
        self.waiters.push_back(sender);
        receiver
    }

    /// Resolve every waiter, in arrival order, with the new credential.
    pub fn drain_resolve(&mut self, credential: &str) {
        for waiter in self.waiters.drain(..) {
            // A dropped receiver just means the caller went away.
            let _ = waiter.send(Ok(credential.to_owned()));
        }
    }

    /// Reject every waiter, in arrival order, with the same error.
    pub fn drain_reject(&mut self, error: &ApiError) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(error.clone()));
        }
    }

    /// Number of queued waiters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// `true` when no waiter is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

#[derive(Debug, Default)]
struct CoordinatorInner {
    refreshing: bool,
    queue: PendingQueue,
}

/// Serializes credential refresh attempts for one client.
#[derive(Clone, Debug, Default)]
pub struct RefreshCoordinator {
    inner: Arc<Mutex<CoordinatorInner>>,
}

impl RefreshCoordinator {
    /// Create an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `refresh` unless one is already in flight, in which case the
    /// caller queues behind it and shares its outcome.
    ///
    /// The in-flight flag is reset whatever happens to the refresh future,
    /// including cancellation, in which case queued callers are rejected.
    ///
    /// # Errors
    ///
    /// Propagates the refresh failure, or `ApiError::SessionExpired` when the
    /// in-flight refresh was cancelled before resolving this caller.
    pub async fn run<F, Fut>(&self, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let waiter = {
            let mut inner = self.lock();
            if inner.refreshing {
                Some(inner.queue.enqueue())
            } else {
                inner.refreshing = true;
                None
            }
        };

        if let Some(receiver) = waiter {
            tracing::debug!("refresh already in flight, queueing caller");
            return match receiver.await {
                Ok(outcome) => outcome,
                Err(_) => Err(ApiError::SessionExpired),
            };
        }

        let guard = ResetGuard {
            inner: Arc::clone(&self.inner),
            armed: true,
        };
        let outcome = refresh().await;
        guard.complete(&outcome);
        outcome
    }

    /// `true` while a refresh call is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of callers queued behind the in-flight refresh.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CoordinatorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resets the in-flight flag and drains the queue exactly once, even when
/// the owning future is dropped mid-refresh.
struct ResetGuard {
    inner: Arc<Mutex<CoordinatorInner>>,
    armed: bool,
}

impl ResetGuard {
    fn complete(mut self, outcome: &Result<String>) {
        self.armed = false;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.refreshing = false;
        match outcome {
            Ok(credential) => inner.queue.drain_resolve(credential),
            Err(error) => inner.queue.drain_reject(error),
        }
    }
}

impl Drop for ResetGuard {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.refreshing = false;
            inner.queue.drain_reject(&ApiError::SessionExpired);
        }
    }
}
