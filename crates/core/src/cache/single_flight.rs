use crate::error::{AnalysisError, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::runtime::Handle;

type SharedOutcome<V> = Shared<BoxFuture<'static, Result<V>>>;

/// Collapses concurrent computations for the same key into one.
///
/// The computation runs as its own task on `worker`, so it completes (and
/// can populate a cache) even if every waiter is dropped. Errors reach all
/// current waiters and are then forgotten.
pub struct SingleFlight<K, V> {
    in_flight: Arc<DashMap<K, SharedOutcome<V>>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Joins the computation for `key` or starts it.
    ///
    /// `lookup` runs while the key is locked, so a value stored by a flight
    /// that finished after the caller's own miss is picked up instead of
    /// being computed again. `compute` must store its value before returning
    /// for the same reason.
    pub async fn run<L, F, Fut>(&self, key: K, worker: &Handle, lookup: L, compute: F) -> Result<V>
    where
        L: FnOnce() -> Option<V>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let shared = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                if let Some(value) = lookup() {
                    return Ok(value);
                }
                let in_flight = Arc::clone(&self.in_flight);
                let fut = compute();
                let task = worker.spawn(async move {
                    let outcome = fut.await;
                    in_flight.remove(&key);
                    outcome
                });
                let shared = async move {
                    task.await.unwrap_or_else(|e| {
                        Err(AnalysisError::Internal(format!("computation task failed: {e}")))
                    })
                }
                .boxed()
                .shared();
                entry.insert(shared.clone());
                shared
            }
        };
        shared.await
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
