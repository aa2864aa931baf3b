//! Per-offer auto-resolution timers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::debug;

use uephone_core::OfferId;

use super::resolver::OfferResolver;

/// What runs when an offer's timer elapses.
pub trait ResolveOnTimeout: Send + Sync + 'static {
    fn resolve_on_timeout(&self, id: OfferId) -> impl Future<Output = ()> + Send;
}

struct ScheduledTask {
    generation: u64,
    handle: AbortHandle,
}

type TaskMap = HashMap<OfferId, ScheduledTask>;

/// Keeps at most one timer task per pending offer.
///
/// Scheduling an offer that already has a timer replaces it. A timer removes
/// itself from the map before resolving, so cancelling after that point is a
/// no-op and the resolver's pending check decides the outcome.
pub struct OfferScheduler<R = OfferResolver> {
    resolver: Arc<R>,
    tasks: Arc<Mutex<TaskMap>>,
    next_generation: Arc<AtomicU64>,
}

impl<R> Clone for OfferScheduler<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            tasks: Arc::clone(&self.tasks),
            next_generation: Arc::clone(&self.next_generation),
        }
    }
}

impl<R> std::fmt::Debug for OfferScheduler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfferScheduler")
            .field("scheduled", &lock(&self.tasks).len())
            .finish_non_exhaustive()
    }
}

fn lock(tasks: &Mutex<TaskMap>) -> MutexGuard<'_, TaskMap> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R: ResolveOnTimeout> OfferScheduler<R> {
    #[must_use]
    pub fn new(resolver: Arc<R>) -> Self {
        Self {
            resolver,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Resolve `id` after `delay`, replacing any timer it already has.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(&self, id: OfferId, delay: Duration) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let resolver = Arc::clone(&self.resolver);
        let tasks = Arc::clone(&self.tasks);

        // Held across the spawn so the task cannot finish before it is registered.
        let mut map = lock(&self.tasks);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut map = lock(&tasks);
                if map.get(&id).is_some_and(|t| t.generation == generation) {
                    map.remove(&id);
                }
            }
            resolver.resolve_on_timeout(id).await;
        })
        .abort_handle();

        if let Some(previous) = map.insert(id, ScheduledTask { generation, handle }) {
            previous.handle.abort();
            debug!(offer_id = %id, "Replaced offer timer");
        }
        debug!(offer_id = %id, delay_secs = delay.as_secs(), "Scheduled offer timer");
    }

    /// Cancel `id`'s timer. Returns `false` if none was pending.
    pub fn cancel(&self, id: OfferId) -> bool {
        match lock(&self.tasks).remove(&id) {
            Some(task) => {
                task.handle.abort();
                debug!(offer_id = %id, "Cancelled offer timer");
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_scheduled(&self, id: OfferId) -> bool {
        lock(&self.tasks).contains_key(&id)
    }

    /// Number of timers still waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.tasks).len()
    }
}
