//! Fingerprint-keyed caches for syntax trees and query results.
//!
//! Both caches sit behind a [`SingleFlight`], so concurrent misses for the
//! same key compute once.

pub mod parse_cache;
pub mod result_cache;
pub mod single_flight;

pub use parse_cache::ParseCache;
pub use result_cache::{ResultCache, ResultKey};
pub use single_flight::SingleFlight;

use std::sync::atomic::{AtomicU64, Ordering};
use structscope_api::CacheCounters;

#[derive(Debug, Default)]
pub(crate) struct HitCounter {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HitCounter {
    pub(crate) fn record(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self, entries: u64) -> CacheCounters {
        CacheCounters {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
        }
    }
}
