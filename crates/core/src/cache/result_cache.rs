use super::{HitCounter, SingleFlight};
use crate::error::Result;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use structscope_api::{CacheCounters, CodeElement, QueryKind, UnitKey};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultKey {
    pub unit: UnitKey,
    pub query_kind: QueryKind,
}

/// Extracted elements per (unit, query kind), bounded and expiring.
pub struct ResultCache {
    entries: Cache<ResultKey, Arc<Vec<CodeElement>>>,
    flights: SingleFlight<ResultKey, Arc<Vec<CodeElement>>>,
    counter: HitCounter,
    closed: CancellationToken,
}

impl ResultCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .time_to_live(ttl)
            .support_invalidation_closures()
            .eviction_listener(|key: Arc<ResultKey>, _elements, cause| {
                tracing::debug!(
                    "Result cache evicted {} {} for {} ({:?})",
                    key.query_kind,
                    key.unit.fingerprint,
                    key.unit.language,
                    cause
                );
            })
            .build();
        Self {
            entries,
            flights: SingleFlight::new(),
            counter: HitCounter::default(),
            closed: CancellationToken::new(),
        }
    }

    pub fn get(&self, key: &ResultKey) -> Option<Arc<Vec<CodeElement>>> {
        self.entries.get(key)
    }

    /// Returns the cached elements for `(unit, query_kind)` or runs `compute`
    /// once for all concurrent callers. Every caller receives its own copy.
    pub async fn get_or_compute<F, Fut>(
        &self,
        unit: &UnitKey,
        query_kind: &QueryKind,
        worker: &Handle,
        compute: F,
    ) -> Result<Vec<CodeElement>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<CodeElement>>> + Send + 'static,
    {
        let key = ResultKey {
            unit: unit.clone(),
            query_kind: query_kind.clone(),
        };
        if let Some(hit) = self.entries.get(&key) {
            self.counter.record(true);
            return Ok(hit.as_ref().clone());
        }
        self.counter.record(false);

        let entries = self.entries.clone();
        let insert_key = key.clone();
        let closed = self.closed.clone();
        let elements = self
            .flights
            .run(
                key.clone(),
                worker,
                || self.entries.get(&key),
                move || {
                    let fut = compute();
                    async move {
                        let elements = Arc::new(fut.await?);
                        if !closed.is_cancelled() {
                            entries.insert(insert_key.clone(), Arc::clone(&elements));
                            // Lost a race with `close`.
                            if closed.is_cancelled() {
                                entries.invalidate(&insert_key);
                            }
                        }
                        Ok(elements)
                    }
                },
            )
            .await?;
        Ok(elements.as_ref().clone())
    }

    /// Drops every query result computed for `unit`.
    pub fn invalidate(&self, unit: &UnitKey) {
        let unit = unit.clone();
        if let Err(e) = self
            .entries
            .invalidate_entries_if(move |key, _| key.unit == unit)
        {
            tracing::warn!("Result cache invalidation failed: {}", e);
        }
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// Clears the cache for good: computations still in flight hand their
    /// result to their waiters but no longer store it.
    pub fn close(&self) {
        self.closed.cancel();
        self.clear();
    }

    pub fn stats(&self) -> CacheCounters {
        self.entries.run_pending_tasks();
        self.counter.snapshot(self.entries.entry_count())
    }
}
