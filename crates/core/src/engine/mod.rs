//! Analysis orchestrator: the single entry point front ends talk to.
//!
//! One engine exists per canonical project root. Every call follows the same
//! path: security check, language resolution, file read, then the result
//! cache, which on a miss asks the parse cache for a tree and runs the
//! plugin query. Parsing and querying run on the dedicated worker runtime;
//! async callers only await them and blocking callers go through [`bridge`].

pub mod bridge;
pub mod instances;

use crate::cache::{ParseCache, ResultCache};
use crate::config::EngineConfig;
use crate::error::{AnalysisError, Result, join_error};
use crate::parser::{SyntaxParser, SyntaxTree, TreeSitterParser};
use crate::query::QueryExecutionEngine;
use crate::registry::{LanguageRegistry, LoadedPlugin};
use crate::security::SecurityBoundary;
use crate::{scale, section};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::time::{Instant, SystemTime};
use structscope_api::{
    CacheStats, CodeElement, LanguageDescriptor, QueryKind, ScaleReport, SectionExtract,
    SourceUnit, StructureReport, UnitKey,
};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    Uninitialized = 0,
    Ready = 1,
    ShuttingDown = 2,
    Closed = 3,
}

impl EngineState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => EngineState::Ready,
            2 => EngineState::ShuttingDown,
            3 => EngineState::Closed,
            _ => EngineState::Uninitialized,
        }
    }
}

pub struct AnalysisEngine {
    boundary: SecurityBoundary,
    config: EngineConfig,
    registry: Arc<LanguageRegistry>,
    parse_cache: Arc<ParseCache>,
    result_cache: Arc<ResultCache>,
    query_engine: QueryExecutionEngine,
    worker: Handle,
    state: AtomicU8,
    active_calls: AtomicUsize,
    idle: Notify,
    cancel_token: CancellationToken,
    /// Last fingerprint read per file, to drop stale cache entries on edit.
    /// Bounded like the result cache; a forgotten path only means its old
    /// entries age out instead of being dropped eagerly.
    latest: Cache<PathBuf, UnitKey>,
}

pub struct AnalysisEngineBuilder {
    project_root: PathBuf,
    config: Option<EngineConfig>,
    registry: Option<Arc<LanguageRegistry>>,
    parser: Option<Arc<dyn SyntaxParser>>,
}

impl AnalysisEngineBuilder {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            config: None,
            registry: None,
            parser: None,
        }
    }

    /// Without this, configuration is loaded from the project root and
    /// the environment.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_registry(mut self, registry: Arc<LanguageRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn SyntaxParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Returns the live engine for this root, creating it if needed. When an
    /// engine is already open for the root, the builder's settings are
    /// ignored.
    pub fn open(self) -> Result<Arc<AnalysisEngine>> {
        let boundary = SecurityBoundary::new(&self.project_root)?;
        let root = boundary.root().to_path_buf();
        let Self {
            config,
            registry,
            parser,
            ..
        } = self;

        instances::get_or_create(&root, move || {
            let config = match config {
                Some(c) => {
                    c.validate()?;
                    c
                }
                None => EngineConfig::load(boundary.root())?,
            };
            AnalysisEngine::new(
                boundary,
                config,
                registry.unwrap_or_default(),
                parser.unwrap_or_else(|| Arc::new(TreeSitterParser)),
            )
        })
    }
}

struct CallGuard<'a>(&'a AnalysisEngine);

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if self.0.active_calls.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl AnalysisEngine {
    pub fn builder(project_root: impl Into<PathBuf>) -> AnalysisEngineBuilder {
        AnalysisEngineBuilder::new(project_root)
    }

    pub fn open(
        project_root: impl Into<PathBuf>,
        config: EngineConfig,
        registry: Arc<LanguageRegistry>,
    ) -> Result<Arc<Self>> {
        Self::builder(project_root)
            .with_config(config)
            .with_registry(registry)
            .open()
    }

    /// Like [`AnalysisEngine::open`] with a custom parser.
    pub fn open_with(
        project_root: impl Into<PathBuf>,
        config: EngineConfig,
        registry: Arc<LanguageRegistry>,
        parser: Arc<dyn SyntaxParser>,
    ) -> Result<Arc<Self>> {
        Self::builder(project_root)
            .with_config(config)
            .with_registry(registry)
            .with_parser(parser)
            .open()
    }

    fn new(
        boundary: SecurityBoundary,
        config: EngineConfig,
        registry: Arc<LanguageRegistry>,
        parser: Arc<dyn SyntaxParser>,
    ) -> Result<Self> {
        let worker = bridge::worker_handle()?;
        let latest = Cache::builder()
            .max_capacity(config.result_cache_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        let engine = Self {
            parse_cache: Arc::new(ParseCache::new(config.parse_cache_capacity, parser)),
            result_cache: Arc::new(ResultCache::new(
                config.result_cache_capacity,
                config.result_ttl(),
            )),
            boundary,
            config,
            registry,
            query_engine: QueryExecutionEngine::new(),
            worker,
            state: AtomicU8::new(EngineState::Uninitialized as u8),
            active_calls: AtomicUsize::new(0),
            idle: Notify::new(),
            cancel_token: CancellationToken::new(),
            latest,
        };
        engine
            .state
            .store(EngineState::Ready as u8, Ordering::SeqCst);
        Ok(engine)
    }

    pub fn root(&self) -> &Path {
        self.boundary.root()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<LanguageRegistry> {
        &self.registry
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn list_languages(&self) -> Vec<LanguageDescriptor> {
        self.registry.list_languages()
    }

    /// Number of files whose last fingerprint is remembered.
    pub fn tracked_files(&self) -> u64 {
        self.latest.run_pending_tasks();
        self.latest.entry_count()
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            parse: self.parse_cache.stats(),
            results: self.result_cache.stats(),
        }
    }

    // ---- Async API ----

    /// Elements of one query kind for a file under the project root.
    pub async fn analyze(&self, path: impl AsRef<Path>, kind: &QueryKind) -> Result<Vec<CodeElement>> {
        let _call = self.enter()?;
        let path = self.boundary.validate(path)?;
        let label = self.label(&path);
        let outcome = self
            .cancellable(async {
                let plugin = self.registry.resolve_path(&path)?;
                plugin.query(kind)?;
                let unit = self.load_unit(&path, &plugin).await?;
                self.run_query(&plugin, &unit, kind).await
            })
            .await;
        self.finish(outcome, &label, Some(kind))
    }

    /// Elements of every query kind the file's language supports, merged in
    /// source order.
    pub async fn analyze_all(&self, path: impl AsRef<Path>) -> Result<Vec<CodeElement>> {
        Ok(self.structure_report(path, None).await?.elements)
    }

    /// [`AnalysisEngine::analyze`] or [`AnalysisEngine::analyze_all`], packaged
    /// for formatters.
    pub async fn structure_report(
        &self,
        path: impl AsRef<Path>,
        kind: Option<&QueryKind>,
    ) -> Result<StructureReport> {
        let _call = self.enter()?;
        let path = self.boundary.validate(path)?;
        let label = self.label(&path);
        let outcome = self
            .cancellable(async {
                let plugin = self.registry.resolve_path(&path)?;
                if let Some(kind) = kind {
                    plugin.query(kind)?;
                }
                let unit = self.load_unit(&path, &plugin).await?;
                let elements = match kind {
                    Some(kind) => self.run_query(&plugin, &unit, kind).await?,
                    None => self.run_all(&plugin, &unit).await?,
                };
                Ok(StructureReport::new(
                    label.clone(),
                    plugin.language().clone(),
                    kind.cloned(),
                    elements,
                ))
            })
            .await;
        self.finish(outcome, &label, kind)
    }

    /// Analyzes in-memory text. No file is touched, so no path check applies.
    pub async fn analyze_buffer(
        &self,
        language: &str,
        text: impl Into<Arc<str>>,
        kind: &QueryKind,
    ) -> Result<Vec<CodeElement>> {
        let _call = self.enter()?;
        let text = text.into();
        self.check_size(text.len() as u64, "buffer")?;
        let plugin = self.registry.resolve(language)?;
        let unit = SourceUnit::from_buffer(plugin.language().clone(), text);
        let label = unit.label();
        let outcome = self
            .cancellable(async {
                plugin.query(kind)?;
                self.run_query(&plugin, &unit, kind).await
            })
            .await;
        self.finish(outcome, &label, Some(kind))
    }

    pub async fn check_scale(&self, path: impl AsRef<Path>) -> Result<ScaleReport> {
        let _call = self.enter()?;
        let path = self.boundary.validate(path)?;
        let label = self.label(&path);
        let outcome = self
            .cancellable(async {
                let plugin = self.registry.resolve_path(&path)?;
                let unit = self.load_unit(&path, &plugin).await?;
                let elements = self.run_all(&plugin, &unit).await?;
                let tree = self.parse(&plugin, &unit).await?;
                let large_file_lines = self.config.large_file_lines;
                let report_label = label.clone();
                self.worker
                    .spawn_blocking(move || {
                        scale::build_report(
                            &report_label,
                            &unit,
                            &tree,
                            plugin.plugin().comment_node_kinds(),
                            &elements,
                            large_file_lines,
                        )
                    })
                    .await
                    .map_err(|e| join_error("scale report", e))
            })
            .await;
        self.finish(outcome, &label, None)
    }

    /// Lines `start_line..=end_line` of a file; any readable file qualifies,
    /// supported language or not.
    pub async fn extract_section(
        &self,
        path: impl AsRef<Path>,
        start_line: usize,
        end_line: usize,
    ) -> Result<SectionExtract> {
        let _call = self.enter()?;
        let path = self.boundary.validate(path)?;
        let label = self.label(&path);
        let outcome = self
            .cancellable(async {
                let (text, _) = self.read_source(&path).await?;
                section::extract(&label, &text, start_line, end_line)
            })
            .await;
        self.finish(outcome, &label, None)
    }

    /// Stops accepting calls, aborts waiting ones, waits for running ones to
    /// leave, then drops all cached state and deregisters the engine.
    pub async fn shutdown(&self) {
        if self
            .state
            .compare_exchange(
                EngineState::Ready as u8,
                EngineState::ShuttingDown as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return;
        }
        tracing::info!("Shutting down analysis engine for {}", self.root().display());
        self.cancel_token.cancel();

        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.active_calls.load(Ordering::SeqCst) == 0 {
                break;
            }
            notified.await;
        }

        self.result_cache.close();
        self.parse_cache.close();
        self.latest.invalidate_all();
        self.state
            .store(EngineState::Closed as u8, Ordering::SeqCst);
        instances::remove(self.boundary.root(), self);
        tracing::info!("Analysis engine for {} closed", self.root().display());
    }

    // ---- Blocking API ----

    pub fn analyze_blocking(
        self: &Arc<Self>,
        path: impl AsRef<Path>,
        kind: &QueryKind,
    ) -> Result<Vec<CodeElement>> {
        let path = path.as_ref().to_path_buf();
        let kind = kind.clone();
        self.blocking(move |engine| async move { engine.analyze(&path, &kind).await })
    }

    pub fn analyze_all_blocking(self: &Arc<Self>, path: impl AsRef<Path>) -> Result<Vec<CodeElement>> {
        let path = path.as_ref().to_path_buf();
        self.blocking(move |engine| async move { engine.analyze_all(&path).await })
    }

    pub fn structure_report_blocking(
        self: &Arc<Self>,
        path: impl AsRef<Path>,
        kind: Option<&QueryKind>,
    ) -> Result<StructureReport> {
        let path = path.as_ref().to_path_buf();
        let kind = kind.cloned();
        self.blocking(move |engine| async move { engine.structure_report(&path, kind.as_ref()).await })
    }

    pub fn analyze_buffer_blocking(
        self: &Arc<Self>,
        language: &str,
        text: impl Into<Arc<str>>,
        kind: &QueryKind,
    ) -> Result<Vec<CodeElement>> {
        let language = language.to_string();
        let text = text.into();
        let kind = kind.clone();
        self.blocking(move |engine| async move { engine.analyze_buffer(&language, text, &kind).await })
    }

    pub fn check_scale_blocking(self: &Arc<Self>, path: impl AsRef<Path>) -> Result<ScaleReport> {
        let path = path.as_ref().to_path_buf();
        self.blocking(move |engine| async move { engine.check_scale(&path).await })
    }

    pub fn extract_section_blocking(
        self: &Arc<Self>,
        path: impl AsRef<Path>,
        start_line: usize,
        end_line: usize,
    ) -> Result<SectionExtract> {
        let path = path.as_ref().to_path_buf();
        self.blocking(move |engine| async move {
            engine.extract_section(&path, start_line, end_line).await
        })
    }

    pub fn shutdown_blocking(self: &Arc<Self>) -> Result<()> {
        self.blocking(|engine| async move {
            engine.shutdown().await;
            Ok(())
        })
    }

    fn blocking<T, F, Fut>(self: &Arc<Self>, op: F) -> Result<T>
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        bridge::block_on(op(Arc::clone(self)))?
    }

    // ---- Internals ----

    fn enter(&self) -> Result<CallGuard<'_>> {
        self.active_calls.fetch_add(1, Ordering::SeqCst);
        let guard = CallGuard(self);
        if self.state() != EngineState::Ready {
            return Err(AnalysisError::EngineShutdown);
        }
        Ok(guard)
    }

    async fn cancellable<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => Err(AnalysisError::EngineShutdown),
            outcome = fut => outcome,
        }
    }

    /// Passes known errors through and wraps anything else with the unit
    /// and query kind, logging it once.
    fn finish<T>(&self, outcome: Result<T>, unit: &str, kind: Option<&QueryKind>) -> Result<T> {
        outcome.map_err(|e| {
            if e.is_expected() {
                return e;
            }
            let message = match e {
                AnalysisError::Internal(m) => m,
                other => other.to_string(),
            };
            tracing::error!("Unexpected failure analyzing {}: {}", unit, message);
            AnalysisError::Unexpected {
                unit: unit.to_string(),
                query_kind: kind.cloned(),
                message,
            }
        })
    }

    fn label(&self, path: &Path) -> String {
        path.strip_prefix(self.boundary.root())
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn check_size(&self, len: u64, what: &str) -> Result<()> {
        if len > self.config.max_file_bytes {
            return Err(AnalysisError::InvalidArgument(format!(
                "{what} is {len} bytes, above the {} byte limit",
                self.config.max_file_bytes
            )));
        }
        Ok(())
    }

    async fn read_source(&self, path: &Path) -> Result<(String, Option<SystemTime>)> {
        let label = self.label(path);
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| AnalysisError::io(&label, &e))?;
        if !metadata.is_file() {
            return Err(AnalysisError::InvalidArgument(format!(
                "'{label}' is not a regular file"
            )));
        }
        self.check_size(metadata.len(), &label)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AnalysisError::io(&label, &e))?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("{} is not valid UTF-8, decoding lossily", label);
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        Ok((text, metadata.modified().ok()))
    }

    async fn load_unit(&self, path: &Path, plugin: &LoadedPlugin) -> Result<SourceUnit> {
        let (text, modified) = self.read_source(path).await?;
        let unit = SourceUnit::from_file(path.to_path_buf(), plugin.language().clone(), text, modified);

        let key = unit.key();
        let previous = self.latest.get(path);
        self.latest.insert(path.to_path_buf(), key.clone());
        if let Some(previous) = previous {
            if previous != key {
                tracing::debug!(
                    "{} changed ({} -> {}), dropping cached entries",
                    self.label(path),
                    previous.fingerprint,
                    key.fingerprint
                );
                self.parse_cache.invalidate(&previous);
                self.result_cache.invalidate(&previous);
            }
        }
        Ok(unit)
    }

    async fn parse(&self, plugin: &LoadedPlugin, unit: &SourceUnit) -> Result<Arc<SyntaxTree>> {
        self.parse_cache
            .get_or_parse(unit, plugin.grammar(), &self.worker, self.config.parse_timeout())
            .await
    }

    async fn run_query(
        &self,
        plugin: &Arc<LoadedPlugin>,
        unit: &SourceUnit,
        kind: &QueryKind,
    ) -> Result<Vec<CodeElement>> {
        let parse_cache = Arc::clone(&self.parse_cache);
        let worker = self.worker.clone();
        let plugin = Arc::clone(plugin);
        let task_unit = unit.clone();
        let task_kind = kind.clone();
        let query_engine = self.query_engine;
        let parse_timeout = self.config.parse_timeout();
        let query_timeout = self.config.query_timeout();

        self.result_cache
            .get_or_compute(&unit.key(), kind, &self.worker, move || async move {
                let tree = parse_cache
                    .get_or_parse(&task_unit, plugin.grammar(), &worker, parse_timeout)
                    .await?;
                let text = Arc::clone(task_unit.text());
                let deadline = Instant::now() + query_timeout;
                let operation = format!("'{task_kind}' query on {}", task_unit.label());
                let task = tokio::task::spawn_blocking(move || {
                    query_engine.run(&plugin, &tree, &task_kind, &text, Some(deadline))
                });
                match tokio::time::timeout(query_timeout, task).await {
                    Ok(joined) => joined.map_err(|e| join_error("query", e))?,
                    Err(_) => Err(AnalysisError::Timeout {
                        operation,
                        after_ms: query_timeout.as_millis() as u64,
                    }),
                }
            })
            .await
    }

    async fn run_all(&self, plugin: &Arc<LoadedPlugin>, unit: &SourceUnit) -> Result<Vec<CodeElement>> {
        let runs = plugin
            .descriptor()
            .query_kinds
            .iter()
            .map(|kind| self.run_query(plugin, unit, kind));
        let mut elements: Vec<CodeElement> = futures::future::try_join_all(runs)
            .await?
            .into_iter()
            .flatten()
            .collect();
        elements.sort_by_key(|e| (e.span.start_line, e.span.start_column));
        Ok(elements)
    }
}

impl std::fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("root", &self.boundary.root())
            .field("state", &self.state())
            .field("active_calls", &self.active_calls.load(Ordering::Relaxed))
            .finish()
    }
}
