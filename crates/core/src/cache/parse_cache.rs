use super::{HitCounter, SingleFlight};
use crate::error::{AnalysisError, Result, join_error};
use crate::parser::{SyntaxParser, SyntaxTree};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use structscope_api::{CacheCounters, SourceUnit, UnitKey};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Syntax trees by unit fingerprint, LRU-bounded.
pub struct ParseCache {
    trees: Cache<UnitKey, Arc<SyntaxTree>>,
    flights: SingleFlight<UnitKey, Arc<SyntaxTree>>,
    parser: Arc<dyn SyntaxParser>,
    counter: HitCounter,
    closed: CancellationToken,
}

impl ParseCache {
    pub fn new(capacity: u64, parser: Arc<dyn SyntaxParser>) -> Self {
        let trees = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(|key: Arc<UnitKey>, _tree, cause| {
                tracing::debug!("Parse cache evicted {} {} ({:?})", key.language, key.fingerprint, cause);
            })
            .build();
        Self {
            trees,
            flights: SingleFlight::new(),
            parser,
            counter: HitCounter::default(),
            closed: CancellationToken::new(),
        }
    }

    pub fn get(&self, key: &UnitKey) -> Option<Arc<SyntaxTree>> {
        self.trees.get(key)
    }

    /// Returns the tree for `unit`, parsing it at most once across
    /// concurrent callers. Parse errors and timeouts are not cached.
    pub async fn get_or_parse(
        &self,
        unit: &SourceUnit,
        grammar: tree_sitter::Language,
        worker: &Handle,
        timeout: Duration,
    ) -> Result<Arc<SyntaxTree>> {
        let key = unit.key();
        if let Some(tree) = self.trees.get(&key) {
            self.counter.record(true);
            return Ok(tree);
        }
        self.counter.record(false);

        let trees = self.trees.clone();
        let parser = Arc::clone(&self.parser);
        let language = unit.language().clone();
        let text = Arc::clone(unit.text());
        let insert_key = key.clone();
        let closed = self.closed.clone();

        self.flights
            .run(
                key.clone(),
                worker,
                || self.trees.get(&key),
                move || async move {
                    let started = std::time::Instant::now();
                    let lang = language.clone();
                    let task = tokio::task::spawn_blocking(move || {
                        parser.parse(&lang, &grammar, text.as_bytes())
                    });
                    let tree = match tokio::time::timeout(timeout, task).await {
                        Ok(joined) => joined.map_err(|e| join_error("parse", e))??,
                        Err(_) => {
                            return Err(AnalysisError::Timeout {
                                operation: format!("parsing {language} source"),
                                after_ms: timeout.as_millis() as u64,
                            });
                        }
                    };
                    tracing::debug!("Parsed {} source in {:?}", language, started.elapsed());
                    let tree = Arc::new(tree);
                    if !closed.is_cancelled() {
                        trees.insert(insert_key.clone(), Arc::clone(&tree));
                        // Lost a race with `close`.
                        if closed.is_cancelled() {
                            trees.invalidate(&insert_key);
                        }
                    }
                    Ok(tree)
                },
            )
            .await
    }

    pub fn invalidate(&self, key: &UnitKey) {
        self.trees.invalidate(key);
    }

    pub fn clear(&self) {
        self.trees.invalidate_all();
        self.trees.run_pending_tasks();
    }

    /// Clears the cache for good: parses still in flight hand their tree to
    /// their waiters but no longer store it.
    pub fn close(&self) {
        self.closed.cancel();
        self.clear();
    }

    pub fn stats(&self) -> CacheCounters {
        self.trees.run_pending_tasks();
        self.counter.snapshot(self.trees.entry_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TreeSitterParser;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use structscope_api::Language;
    use structscope_plugin::LanguagePlugin;

    struct CountingParser {
        calls: AtomicUsize,
    }

    impl SyntaxParser for CountingParser {
        fn parse(
            &self,
            language: &Language,
            grammar: &tree_sitter::Language,
            source: &[u8],
        ) -> Result<SyntaxTree> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            TreeSitterParser.parse(language, grammar, source)
        }
    }

    fn grammar() -> tree_sitter::Language {
        structscope_java::JavaPlugin::new().grammar()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parses_at_most_once_under_concurrency() {
        let parser = Arc::new(CountingParser {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(ParseCache::new(10, parser.clone()));
        let unit = SourceUnit::from_buffer(Language::JAVA, "class A { void m() {} }");

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = cache.clone();
            let unit = unit.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_parse(&unit, grammar(), &Handle::current(), Duration::from_secs(5))
                    .await
            }));
        }
        let trees: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert_eq!(parser.calls.load(Ordering::SeqCst), 1);
        assert!(trees.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert!(cache.get(&unit.key()).is_some());
    }

    #[tokio::test]
    async fn test_changed_content_is_a_new_key() {
        let parser = Arc::new(CountingParser {
            calls: AtomicUsize::new(0),
        });
        let cache = ParseCache::new(10, parser.clone());
        let a = SourceUnit::from_buffer(Language::JAVA, "class A {}");
        let b = SourceUnit::from_buffer(Language::JAVA, "class B {}");
        let worker = Handle::current();
        let t = Duration::from_secs(5);

        cache.get_or_parse(&a, grammar(), &worker, t).await.unwrap();
        cache.get_or_parse(&a, grammar(), &worker, t).await.unwrap();
        cache.get_or_parse(&b, grammar(), &worker, t).await.unwrap();
        assert_eq!(parser.calls.load(Ordering::SeqCst), 2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 2);

        cache.invalidate(&a.key());
        assert!(cache.get(&a.key()).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timeout_is_reported_and_not_cached() {
        struct SlowParser;
        impl SyntaxParser for SlowParser {
            fn parse(&self, l: &Language, g: &tree_sitter::Language, s: &[u8]) -> Result<SyntaxTree> {
                std::thread::sleep(Duration::from_millis(200));
                TreeSitterParser.parse(l, g, s)
            }
        }

        let cache = ParseCache::new(10, Arc::new(SlowParser));
        let unit = SourceUnit::from_buffer(Language::JAVA, "class Slow {}");
        let err = cache
            .get_or_parse(&unit, grammar(), &Handle::current(), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout { .. }));
        assert!(cache.get(&unit.key()).is_none());
    }

    #[tokio::test]
    async fn test_full_cache_keeps_the_most_recent_tree() {
        let parser = Arc::new(CountingParser {
            calls: AtomicUsize::new(0),
        });
        let cache = ParseCache::new(1, parser.clone());
        let a = SourceUnit::from_buffer(Language::JAVA, "class A {}");
        let b = SourceUnit::from_buffer(Language::JAVA, "class B {}");
        let worker = Handle::current();
        let t = Duration::from_secs(5);

        for _ in 0..3 {
            cache.get_or_parse(&a, grammar(), &worker, t).await.unwrap();
        }
        cache.get_or_parse(&b, grammar(), &worker, t).await.unwrap();
        cache.stats();

        assert!(cache.get(&b.key()).is_some());
        assert!(cache.get(&a.key()).is_none());
        cache.get_or_parse(&b, grammar(), &worker, t).await.unwrap();
        assert_eq!(parser.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parse_finishing_after_close_is_not_stored() {
        let parser = Arc::new(CountingParser {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(ParseCache::new(10, parser));
        let unit = SourceUnit::from_buffer(Language::JAVA, "class Late {}");

        let pending = {
            let cache = cache.clone();
            let unit = unit.clone();
            tokio::spawn(async move {
                cache
                    .get_or_parse(&unit, grammar(), &Handle::current(), Duration::from_secs(5))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.close();

        assert!(pending.await.unwrap().is_ok());
        assert!(cache.get(&unit.key()).is_none());
        assert_eq!(cache.stats().entries, 0);
    }
}
