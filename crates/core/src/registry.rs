use crate::error::{AnalysisError, Result};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use structscope_api::{Language, LanguageDescriptor, QueryKind};
use structscope_plugin::{CompiledQuery, LanguagePlugin, PluginFactory, PluginRegistration};

/// A constructed plugin with all of its queries compiled.
pub struct LoadedPlugin {
    descriptor: LanguageDescriptor,
    plugin: Arc<dyn LanguagePlugin>,
    queries: HashMap<QueryKind, Arc<CompiledQuery>>,
}

impl LoadedPlugin {
    /// Compiles every declared query kind. Fails if a kind has no definition
    /// or a pattern does not compile against the plugin grammar.
    pub fn load(descriptor: LanguageDescriptor, plugin: Arc<dyn LanguagePlugin>) -> Result<Self> {
        let init_err = |cause: String| AnalysisError::PluginInitialization {
            language: descriptor.language.to_string(),
            cause,
        };

        if plugin.language() != descriptor.language {
            return Err(init_err(format!(
                "plugin reports language '{}'",
                plugin.language()
            )));
        }

        let grammar = plugin.grammar();
        let definitions = plugin.query_definitions();
        let mut queries = HashMap::with_capacity(definitions.len());
        for kind in &descriptor.query_kinds {
            let definition = definitions
                .get(kind)
                .ok_or_else(|| init_err(format!("no query definition for '{kind}'")))?;
            let compiled = CompiledQuery::compile(&grammar, kind, definition)
                .map_err(|e| init_err(e.to_string()))?;
            queries.insert(kind.clone(), Arc::new(compiled));
        }

        Ok(Self {
            descriptor,
            plugin,
            queries,
        })
    }

    pub fn language(&self) -> &Language {
        &self.descriptor.language
    }

    pub fn descriptor(&self) -> &LanguageDescriptor {
        &self.descriptor
    }

    pub fn plugin(&self) -> &Arc<dyn LanguagePlugin> {
        &self.plugin
    }

    pub fn grammar(&self) -> tree_sitter::Language {
        self.plugin.grammar()
    }

    pub fn supports(&self, kind: &QueryKind) -> bool {
        self.queries.contains_key(kind)
    }

    pub fn query(&self, kind: &QueryKind) -> Result<&Arc<CompiledQuery>> {
        self.queries
            .get(kind)
            .ok_or_else(|| AnalysisError::UnsupportedQuery {
                language: self.descriptor.language.clone(),
                query_kind: kind.clone(),
            })
    }
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("language", &self.descriptor.language)
            .field("queries", &self.queries.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct RegistryEntry {
    descriptor: LanguageDescriptor,
    factory: PluginFactory,
    loaded: OnceCell<Arc<LoadedPlugin>>,
}

impl RegistryEntry {
    /// Concurrent callers share one construction; a failure is not stored,
    /// so the next call retries.
    fn get_or_load(&self) -> Result<Arc<LoadedPlugin>> {
        self.loaded
            .get_or_try_init(|| {
                let language = self.descriptor.language.clone();
                tracing::debug!("Constructing {} plugin", language);
                let plugin = (self.factory)().map_err(|e| AnalysisError::PluginInitialization {
                    language: language.to_string(),
                    cause: e.to_string(),
                })?;
                let loaded = LoadedPlugin::load(self.descriptor.clone(), plugin)?;
                tracing::info!("Loaded {} plugin ({} queries)", language, loaded.queries.len());
                Ok(Arc::new(loaded))
            })
            .cloned()
            .inspect_err(|e| tracing::warn!("{}", e))
    }
}

/// Languages known to the engine, constructed lazily on first use.
#[derive(Default)]
pub struct LanguageRegistry {
    entries: RwLock<Vec<Arc<RegistryEntry>>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a language. An existing entry for the same language is
    /// replaced and its constructed plugin discarded.
    pub fn register(&self, registration: PluginRegistration) {
        let PluginRegistration {
            descriptor,
            factory,
        } = registration;
        let entry = Arc::new(RegistryEntry {
            descriptor,
            factory,
            loaded: OnceCell::new(),
        });

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries
            .iter()
            .position(|e| e.descriptor.language == entry.descriptor.language)
        {
            Some(idx) => {
                tracing::info!("Replacing registration for {}", entry.descriptor.language);
                entries[idx] = entry;
            }
            None => entries.push(entry),
        }
    }

    pub fn with(self, registration: PluginRegistration) -> Self {
        self.register(registration);
        self
    }

    pub fn unregister(&self, language: &Language) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| e.descriptor.language != *language);
        entries.len() != before
    }

    /// Descriptors in registration order. Never constructs a plugin.
    pub fn list_languages(&self) -> Vec<LanguageDescriptor> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.descriptor.clone())
            .collect()
    }

    pub fn is_loaded(&self, language: &Language) -> bool {
        self.find(language.as_str())
            .is_some_and(|e| e.loaded.get().is_some())
    }

    /// Resolves a language name, alias or extension to its constructed plugin.
    pub fn resolve(&self, key: &str) -> Result<Arc<LoadedPlugin>> {
        self.find(key)
            .ok_or_else(|| AnalysisError::unsupported_language(key.trim()))?
            .get_or_load()
    }

    /// Resolves the plugin for a file by its extension.
    pub fn resolve_path(&self, path: &Path) -> Result<Arc<LoadedPlugin>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                AnalysisError::unsupported_language(format!(
                    "{} (no file extension)",
                    path.display()
                ))
            })?;

        let entry = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            entries
                .iter()
                .find(|e| e.descriptor.handles_extension(ext))
                .cloned()
        };
        entry
            .ok_or_else(|| AnalysisError::unsupported_language(format!(".{ext}")))?
            .get_or_load()
    }

    /// Exact language name wins over aliases and extensions.
    fn find(&self, key: &str) -> Option<Arc<RegistryEntry>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let wanted = key.trim().to_ascii_lowercase();
        entries
            .iter()
            .find(|e| e.descriptor.language.as_str() == wanted)
            .or_else(|| entries.iter().find(|e| e.descriptor.matches(&wanted)))
            .cloned()
    }
}

impl std::fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.list_languages().iter().map(|d| d.language.clone()))
            .finish()
    }
}
